//! Authorization decision engine
//!
//! ```text
//! AccessManager → RoleResolver → match_action → Condition → ValueDescriptor
//!   (per role)     (parents)      (per action)   (AND)        (lookup)
//! ```
//!
//! Decisions are synchronous and only read the policy, so one
//! [`AccessManager`] can serve concurrent callers.

mod matcher;
mod resolver;

use crate::denial::{AccessDeniedError, PermissionErrors};
use crate::error::{AuthzError, Result};
use crate::policy::RoleProvider;
use crate::request::AccessRequest;
use resolver::RoleResolver;
use std::sync::Arc;
use tracing::debug;

/// Entry point for authorization decisions
#[derive(Clone)]
pub struct AccessManager {
    provider: Arc<dyn RoleProvider>,
}

impl AccessManager {
    /// Create an access manager reading roles from the given provider
    pub fn new(provider: Arc<dyn RoleProvider>) -> Self {
        Self { provider }
    }

    /// Decide whether the request is granted.
    ///
    /// The first of the subject's roles satisfying every requested action
    /// grants access; later roles are not evaluated.
    ///
    /// # Errors
    ///
    /// * [`AuthzError::RequestMalformed`] if the request is incomplete
    /// * [`AuthzError::AccessDenied`] if no role satisfies the request, with
    ///   reasons ordered by role, then action, then condition
    /// * any structural error (missing role, inheritance cycle, malformed
    ///   descriptor, condition fault) as soon as it is encountered
    pub fn authorize(&self, request: &AccessRequest<'_>) -> Result<()> {
        let (roles, resource_name) = request.validate()?;

        debug!(
            roles = ?roles,
            resource = resource_name,
            actions = ?request.actions,
            "Authorization request"
        );

        let resolver = RoleResolver::new(self.provider.as_ref());
        let mut reasons = PermissionErrors::new();

        for role_id in &roles {
            let mut chain = Vec::new();
            let errors = resolver.resolve(request, role_id, resource_name, &mut chain)?;

            if errors.is_empty() {
                debug!(role = %role_id, resource = resource_name, "Access granted");
                return Ok(());
            }

            reasons.extend(errors);
        }

        debug!(
            resource = resource_name,
            reasons = reasons.len(),
            "Access denied"
        );

        Err(AuthzError::AccessDenied(AccessDeniedError::new(
            resource_name,
            reasons,
        )))
    }

    /// Boolean form of [`authorize`](Self::authorize).
    ///
    /// Denials map to `Ok(false)`; malformed requests and structural errors
    /// are still returned as errors.
    pub fn is_granted(&self, request: &AccessRequest<'_>) -> Result<bool> {
        match self.authorize(request) {
            Ok(()) => Ok(true),
            Err(AuthzError::AccessDenied(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for AccessManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessManager").finish_non_exhaustive()
    }
}
