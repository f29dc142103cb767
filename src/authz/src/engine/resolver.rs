//! Role resolution with parent inheritance
//!
//! A role that cannot satisfy an action on its own asks its parents, in
//! order, with a single-action request. Ancestors are visited depth-first
//! from an explicit frame stack. The roles currently being traversed form
//! the chain; meeting one of them again as a parent is an inheritance
//! cycle. Detection is lazy: a cyclic edge is only reported if it is actually
//! followed, and traversal stops at the first parent that satisfies the
//! action.

use super::matcher::match_action;
use crate::denial::PermissionError;
use crate::error::{AuthzError, Result};
use crate::policy::{Role, RoleProvider};
use crate::request::AccessRequest;
use crate::types::RoleId;
use std::sync::Arc;
use tracing::{debug, trace, warn};

pub(crate) struct RoleResolver<'p> {
    provider: &'p dyn RoleProvider,
}

impl<'p> RoleResolver<'p> {
    pub(crate) fn new(provider: &'p dyn RoleProvider) -> Self {
        Self { provider }
    }

    /// Evaluate every requested action for one role.
    ///
    /// Returns the role's permission errors, empty when all actions are
    /// satisfied. Without complete validation, returns right after the first
    /// failing action.
    pub(crate) fn resolve(
        &self,
        request: &AccessRequest<'_>,
        role_id: &str,
        resource_name: &str,
        chain: &mut Vec<RoleId>,
    ) -> Result<Vec<PermissionError>> {
        let role = self.provider.get_role(role_id)?;
        let permissions = role.permissions_for(resource_name);
        let mut errors = Vec::new();

        for action in &request.actions {
            let mut action_errors = match_action(permissions, action, role_id, resource_name, request)?;

            if !action_errors.is_empty()
                && !role.parents.is_empty()
                && self.satisfied_by_parents(request, &role, action, resource_name, chain)?
            {
                action_errors.clear();
            }

            if action_errors.is_empty() {
                debug!(role = role_id, action = %action, resource = resource_name, "Action granted");
                continue;
            }

            debug!(role = role_id, action = %action, resource = resource_name, "Action not granted");
            errors.extend(action_errors);

            if !request.complete_validation {
                break;
            }
        }

        Ok(errors)
    }

    /// Walk the ancestors of `role` depth-first, in parent order, until one
    /// of them satisfies `action`.
    ///
    /// Uses an explicit frame stack so deep hierarchies do not grow the call
    /// stack. `chain` mirrors the frames: a role is pushed when its frame is
    /// entered and popped when the frame is exhausted.
    fn satisfied_by_parents(
        &self,
        request: &AccessRequest<'_>,
        role: &Arc<Role>,
        action: &str,
        resource_name: &str,
        chain: &mut Vec<RoleId>,
    ) -> Result<bool> {
        let parent_request = request.for_action(action);
        let depth = chain.len();

        chain.push(role.id.clone());
        let mut frames = vec![Frame::new(Arc::clone(role))];

        let satisfied = self.walk_parents(&parent_request, action, resource_name, &mut frames, chain);
        chain.truncate(depth);

        satisfied
    }

    fn walk_parents(
        &self,
        request: &AccessRequest<'_>,
        action: &str,
        resource_name: &str,
        frames: &mut Vec<Frame>,
        chain: &mut Vec<RoleId>,
    ) -> Result<bool> {
        while let Some(frame) = frames.last_mut() {
            let Some(parent) = frame.role.parents.get(frame.next_parent).cloned() else {
                frames.pop();
                chain.pop();
                continue;
            };
            frame.next_parent += 1;

            if chain.contains(&parent) {
                let mut cycle = chain.clone();
                cycle.push(parent);

                warn!("Role inheritance cycle detected: {}", cycle.join(" -> "));
                return Err(AuthzError::RoleInheritanceCycle(cycle));
            }

            trace!(role = %frame.role.id, parent = %parent, action, "Checking parent role");

            let parent_role = self.provider.get_role(&parent)?;
            let permissions = parent_role.permissions_for(resource_name);

            if match_action(permissions, action, &parent, resource_name, request)?.is_empty() {
                debug!(role = %parent, action, resource = resource_name, "Action granted by parent");
                return Ok(true);
            }

            if !parent_role.parents.is_empty() {
                chain.push(parent);
                frames.push(Frame::new(parent_role));
            }
        }

        Ok(false)
    }
}

/// A role whose parents are being visited
struct Frame {
    role: Arc<Role>,
    next_parent: usize,
}

impl Frame {
    fn new(role: Arc<Role>) -> Self {
        Self { role, next_parent: 0 }
    }
}
