//! Policy object model and storage seams
//!
//! A [`PolicyDefinition`] is the in-memory policy: permission presets plus a
//! map of roles, each granting permissions per resource type. The engine only
//! reads roles through a [`RoleProvider`]; persistence goes through a
//! [`StorageAdapter`].

pub mod document;
pub mod manager;

pub use document::{PermissionDocument, PolicyDocument, PresetDocument, RoleDocument};
pub use manager::{PolicyManager, PolicyManagerConfig};

use crate::condition::{ConditionRef, ConditionRegistry, Conditions};
use crate::error::{AuthzError, Result};
use crate::types::RoleId;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Grants of a role, keyed by resource type name
pub type GrantsMap = BTreeMap<String, Vec<Permission>>;

/// Permission presets, keyed by preset name
pub type PermissionPresets = BTreeMap<String, PermissionPreset>;

/// Roles, keyed by role identifier
pub type Roles = BTreeMap<RoleId, Arc<Role>>;

/// Grant of one action, optionally gated by conditions
#[derive(Debug, Clone, Default)]
pub struct Permission {
    /// Action allowed by this permission
    pub action: String,

    /// Conditions combined with AND semantics; empty means unconditional
    pub conditions: Conditions,

    /// Preset to materialize this permission from
    pub preset: Option<String>,

    /// Append the preset's conditions to our own instead of replacing them
    pub extend_preset_conditions: bool,
}

impl Permission {
    /// Create an unconditional permission
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Default::default()
        }
    }

    /// Create a permission materialized from a preset
    pub fn from_preset(preset: impl Into<String>) -> Self {
        Self {
            preset: Some(preset.into()),
            ..Default::default()
        }
    }

    /// Add a condition
    pub fn with_condition(mut self, condition: ConditionRef) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Keep own conditions when applying the preset
    pub fn extend_preset_conditions(mut self, extend: bool) -> Self {
        self.extend_preset_conditions = extend;
        self
    }

    /// Materialize the referenced preset, if any.
    ///
    /// The preset reference is cleared afterwards so re-applying is a no-op.
    pub fn apply_preset(&mut self, presets: &PermissionPresets) -> Result<()> {
        let Some(name) = &self.preset else {
            return Ok(());
        };

        let preset = presets
            .get(name)
            .ok_or_else(|| AuthzError::PermissionPresetNotFound(name.clone()))?;

        self.action = preset.action.clone();
        if self.extend_preset_conditions {
            self.conditions.extend(preset.conditions.iter().cloned());
        } else {
            self.conditions = preset.conditions.clone();
        }
        self.preset = None;

        Ok(())
    }
}

/// Reusable permission template
#[derive(Debug, Clone)]
pub struct PermissionPreset {
    /// Preset identifier
    pub name: String,

    /// Action granted by permissions using this preset
    pub action: String,

    /// Conditions copied into permissions using this preset
    pub conditions: Conditions,
}

impl PermissionPreset {
    /// Create an unconditional preset
    pub fn new(name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: action.into(),
            conditions: Conditions::new(),
        }
    }

    /// Add a condition
    pub fn with_condition(mut self, condition: ConditionRef) -> Self {
        self.conditions.push(condition);
        self
    }
}

/// Named bundle of permissions, optionally inheriting from parent roles
#[derive(Debug, Clone, Default)]
pub struct Role {
    /// Unique identifier
    pub id: RoleId,

    /// Optional human-readable description
    pub description: Option<String>,

    /// Permissions per resource type
    pub grants: GrantsMap,

    /// Roles this role inherits from, in lookup order
    pub parents: Vec<RoleId>,
}

impl Role {
    /// Create a role without grants or parents
    pub fn new(id: impl Into<RoleId>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Grant a permission on a resource type
    pub fn with_grant(mut self, resource_name: impl Into<String>, permission: Permission) -> Self {
        self.grants
            .entry(resource_name.into())
            .or_default()
            .push(permission);
        self
    }

    /// Add a parent role
    pub fn with_parent(mut self, parent: impl Into<RoleId>) -> Self {
        self.parents.push(parent.into());
        self
    }

    /// Permissions granted on a resource type, in policy order
    pub fn permissions_for(&self, resource_name: &str) -> &[Permission] {
        self.grants
            .get(resource_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Materialize every preset referenced by this role's permissions.
    pub fn apply_presets(&mut self, presets: &PermissionPresets) -> Result<()> {
        for permission in self.grants.values_mut().flatten() {
            permission.apply_preset(presets)?;
        }
        Ok(())
    }

    fn references_presets(&self) -> bool {
        self.grants
            .values()
            .flatten()
            .any(|permission| permission.preset.is_some())
    }
}

/// The complete policy: presets and roles
#[derive(Debug, Clone, Default)]
pub struct PolicyDefinition {
    /// Permission presets by name
    pub permission_presets: PermissionPresets,

    /// Roles by identifier
    pub roles: Roles,
}

impl PolicyDefinition {
    /// Create an empty policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a preset, replacing any preset of the same name
    pub fn with_preset(mut self, preset: PermissionPreset) -> Self {
        self.permission_presets.insert(preset.name.clone(), preset);
        self
    }

    /// Add a role, replacing any role of the same identifier
    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.insert(role.id.clone(), Arc::new(role));
        self
    }

    /// Materialize presets in every role.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::PermissionPresetNotFound`] if a permission
    /// references an unknown preset.
    pub fn apply_presets(&mut self) -> Result<()> {
        for role in self.roles.values_mut() {
            if role.references_presets() {
                Arc::make_mut(role).apply_presets(&self.permission_presets)?;
            }
        }
        Ok(())
    }

    /// Build a policy from its document form, decoding conditions through
    /// the given registry.
    pub fn from_document(document: PolicyDocument, registry: &ConditionRegistry) -> Result<Self> {
        document.into_definition(registry)
    }

    /// Convert to the document form
    pub fn to_document(&self) -> Result<PolicyDocument> {
        PolicyDocument::from_definition(self)
    }
}

/// Source of roles for the decision engine
///
/// Implementations must be safe to call from concurrent decisions.
pub trait RoleProvider: Send + Sync {
    /// Look up a role.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::RoleNotFound`] if no role has this identifier.
    fn get_role(&self, role_id: &str) -> Result<Arc<Role>>;
}

impl RoleProvider for PolicyDefinition {
    fn get_role(&self, role_id: &str) -> Result<Arc<Role>> {
        self.roles
            .get(role_id)
            .cloned()
            .ok_or_else(|| AuthzError::RoleNotFound(role_id.to_string()))
    }
}

impl<P: RoleProvider + ?Sized> RoleProvider for Arc<P> {
    fn get_role(&self, role_id: &str) -> Result<Arc<Role>> {
        (**self).get_role(role_id)
    }
}

/// Loads and persists a policy
pub trait StorageAdapter: Send + Sync {
    /// Load the stored policy
    fn load_policy(&self) -> Result<PolicyDefinition>;

    /// Persist the given policy
    fn save_policy(&self, policy: &PolicyDefinition) -> Result<()>;
}
