//! # Warden Authorization Engine
//!
//! Embeddable RBAC engine with attribute-based conditions.
//!
//! ## Features
//!
//! - **Role inheritance** with lazy cycle detection
//! - **Conditional permissions** (AND within a permission, OR across permissions)
//! - **Pluggable condition types** through an explicit [`ConditionRegistry`]
//! - **Structured denials** listing every failed role, action and condition
//! - **Fail-fast or complete validation**, chosen per request
//! - **Policy administration** with presets and pluggable storage
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use warden_authz::{
//!     AccessManager, AccessRequest, BasicResource, BasicSubject, IsOwnerCondition,
//!     Permission, PolicyDefinition, Role,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let policy = PolicyDefinition::new().with_role(
//!         Role::new("User")
//!             .with_grant("Doc", Permission::new("read"))
//!             .with_grant(
//!                 "Doc",
//!                 Permission::new("update").with_condition(Arc::new(IsOwnerCondition::new())),
//!             ),
//!     );
//!     let manager = AccessManager::new(Arc::new(policy));
//!
//!     let alice = BasicSubject::new("alice").with_role("User");
//!     let doc = BasicResource::new("Doc").with_attribute("owner", "bob");
//!
//!     manager.authorize(&AccessRequest::new(&alice, &doc, ["read"]))?;
//!
//!     let denied = manager.authorize(&AccessRequest::new(&alice, &doc, ["update"]));
//!     assert!(denied.is_err());
//!
//!     Ok(())
//! }
//! ```

pub mod condition;
pub mod denial;
pub mod engine;
pub mod error;
pub mod policy;
pub mod request;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use condition::{
    Condition, ConditionFailure, ConditionRef, ConditionRegistry, Conditions, EmptyCondition,
    EqualCondition, IsOwnerCondition, NotEmptyCondition, NotEqualCondition,
};
pub use denial::{AccessDeniedError, ConditionError, ConditionErrors, PermissionError, PermissionErrors};
pub use engine::AccessManager;
pub use error::{AuthzError, Result};
pub use policy::{
    Permission, PermissionPreset, PolicyDefinition, PolicyDocument, PolicyManager,
    PolicyManagerConfig, Role, RoleProvider, StorageAdapter,
};
pub use request::AccessRequest;
pub use types::{lookup_field, BasicResource, BasicSubject, Context, Resource, RoleId, Subject};
pub use value::{ValueDescriptor, ValueSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
