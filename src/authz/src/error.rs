//! Error types for the authorization engine

use crate::denial::AccessDeniedError;
use crate::value::ValueSource;
use thiserror::Error;

/// Authorization engine errors
///
/// Two families share this enum. Policy-denial outcomes (`RequestMalformed`,
/// `AccessDenied`) are the expected result of a decision. Every other variant
/// means the policy or configuration is broken and aborts the call in flight.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// The request is missing a subject, resource, role or action
    #[error("Request malformed: {0}")]
    RequestMalformed(String),

    /// No role of the subject satisfied the request
    #[error(transparent)]
    AccessDenied(#[from] AccessDeniedError),

    /// Role lookup failed
    #[error("Role with ID: \"{0}\" has not been found")]
    RoleNotFound(String),

    /// Role with the same ID is already defined
    #[error("Role with ID: \"{0}\" already exists")]
    RoleAlreadyExists(String),

    /// Parent traversal came back to a role already on the path
    #[error("Role inheritance cycle has been detected: {}", format_chain(.0))]
    RoleInheritanceCycle(Vec<String>),

    /// A value descriptor could not be resolved against the request
    #[error("ValueDescriptor for source {value_source} could not be resolved: {reason}")]
    MalformedDescriptor {
        /// Source the descriptor points at
        value_source: ValueSource,
        /// What went wrong
        reason: String,
    },

    /// Policy references a condition type nobody registered
    #[error("Condition type not found: \"{0}\"")]
    ConditionTypeNotFound(String),

    /// Condition type registered twice
    #[error("Condition type already exists: \"{0}\"")]
    ConditionTypeAlreadyExists(String),

    /// A condition failed for a reason other than "not satisfied"
    #[error("Condition \"{condition_type}\" failed: {message}")]
    ConditionFailed {
        /// Type identifier of the failing condition
        condition_type: String,
        /// Error reported by the condition
        message: String,
    },

    /// Permission references an undefined preset
    #[error("Permission preset: \"{0}\" has not been found")]
    PermissionPresetNotFound(String),

    /// Preset with the same name is already defined
    #[error("Permission preset with name: \"{0}\" already exists")]
    PermissionPresetAlreadyExists(String),

    /// Invalid policy definition
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    /// Condition encoding or decoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Policy storage error
    #[error("Storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AuthzError {
    /// Whether the error is an expected outcome of a decision rather than a
    /// broken policy or configuration.
    pub fn is_policy_denial(&self) -> bool {
        matches!(self, Self::RequestMalformed(_) | Self::AccessDenied(_))
    }

    /// Denial details, when access was denied.
    pub fn as_access_denied(&self) -> Option<&AccessDeniedError> {
        match self {
            Self::AccessDenied(denied) => Some(denied),
            _ => None,
        }
    }

    /// Wrap any storage-layer error.
    pub fn storage(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage(err.into())
    }
}

fn format_chain(chain: &[String]) -> String {
    chain
        .iter()
        .map(|role| format!("\"{}\"", role))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message() {
        let err = AuthzError::RoleInheritanceCycle(vec![
            "User".to_string(),
            "Admin".to_string(),
            "User".to_string(),
        ]);

        assert_eq!(
            err.to_string(),
            "Role inheritance cycle has been detected: \"User\" -> \"Admin\" -> \"User\""
        );
    }

    #[test]
    fn test_policy_denial_classification() {
        assert!(AuthzError::RequestMalformed("no subject".into()).is_policy_denial());
        assert!(!AuthzError::RoleNotFound("Ghost".into()).is_policy_denial());
        assert!(!AuthzError::RoleInheritanceCycle(vec![]).is_policy_denial());
        assert!(!AuthzError::MalformedDescriptor {
            value_source: ValueSource::ContextField,
            reason: "missing".into(),
        }
        .is_policy_denial());
    }
}
