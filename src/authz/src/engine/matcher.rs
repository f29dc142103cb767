//! Permission matching for a single role and action

use crate::condition::ConditionFailure;
use crate::denial::{ConditionError, ConditionErrors, PermissionError};
use crate::error::Result;
use crate::policy::Permission;
use crate::request::AccessRequest;
use tracing::trace;

/// Match one action against a role's permissions on a resource type.
///
/// Returns an empty list when some permission grants the action. Otherwise
/// returns one error per candidate permission whose conditions failed, or a
/// single error without condition errors when no permission offers the
/// action at all. Condition faults other than "not satisfied" are returned
/// as `Err`.
pub(crate) fn match_action(
    permissions: &[Permission],
    action: &str,
    role_name: &str,
    resource_name: &str,
    request: &AccessRequest<'_>,
) -> Result<Vec<PermissionError>> {
    let mut errors = Vec::new();
    let mut candidates = 0;

    for permission in permissions.iter().filter(|p| p.action == action) {
        candidates += 1;

        if permission.conditions.is_empty() || request.skip_conditions {
            return Ok(Vec::new());
        }

        let condition_errors = check_conditions(permission, request)?;
        if condition_errors.is_empty() {
            return Ok(Vec::new());
        }

        errors.push(PermissionError::new(
            action,
            role_name,
            resource_name,
            condition_errors,
        ));
    }

    if candidates == 0 {
        trace!(role = role_name, action, resource = resource_name, "No permission offers action");
        errors.push(PermissionError::new(action, role_name, resource_name, Vec::new()));
    }

    Ok(errors)
}

/// Evaluate a permission's conditions in order. Stops at the first failure
/// unless the request asks for complete validation.
fn check_conditions(permission: &Permission, request: &AccessRequest<'_>) -> Result<ConditionErrors> {
    let mut failed = ConditionErrors::new();

    for condition in &permission.conditions {
        match condition.check(request) {
            Ok(()) => {
                trace!(condition = condition.condition_type(), "Condition satisfied");
            }
            Err(ConditionFailure::NotSatisfied(reason)) => {
                trace!(condition = condition.condition_type(), %reason, "Condition not satisfied");
                failed.push(ConditionError::new(condition.clone(), reason));

                if !request.complete_validation {
                    break;
                }
            }
            Err(ConditionFailure::Error(err)) => return Err(err),
        }
    }

    Ok(failed)
}
