//! Structured reasons for a denied request
//!
//! An [`AccessDeniedError`] holds one [`PermissionError`] per failing
//! (role, action, candidate permission), ordered by subject role, then by
//! requested action, then by permission order. Each carries the
//! [`ConditionError`]s of its failing conditions in evaluation order; an
//! empty list means no permission for the action was granted at all.

use crate::condition::ConditionRef;
use std::fmt;
use std::ops::Deref;
use thiserror::Error;

/// A condition that was not satisfied
#[derive(Debug, Clone, Error)]
#[error("Condition: \"{}\" was not satisfied, reason: {reason}", .condition.condition_type())]
pub struct ConditionError {
    /// The failing condition
    pub condition: ConditionRef,

    /// Why it failed
    pub reason: String,
}

impl ConditionError {
    /// Create a new condition error
    pub fn new(condition: ConditionRef, reason: impl Into<String>) -> Self {
        Self {
            condition,
            reason: reason.into(),
        }
    }
}

/// Failing conditions of one permission, in evaluation order
pub type ConditionErrors = Vec<ConditionError>;

/// A permission not granted to one role for one action
#[derive(Debug, Clone, Error)]
pub struct PermissionError {
    /// Requested action
    pub action: String,

    /// Role that was evaluated
    pub role_name: String,

    /// Resource type name
    pub resource_name: String,

    /// Failing conditions, empty when no permission matched the action
    pub condition_errors: ConditionErrors,
}

impl PermissionError {
    /// Create a new permission error
    pub fn new(
        action: impl Into<String>,
        role_name: impl Into<String>,
        resource_name: impl Into<String>,
        condition_errors: ConditionErrors,
    ) -> Self {
        Self {
            action: action.into(),
            role_name: role_name.into(),
            resource_name: resource_name.into(),
            condition_errors,
        }
    }

    /// Whether the action was granted but its conditions failed
    pub fn has_failed_conditions(&self) -> bool {
        !self.condition_errors.is_empty()
    }

    /// First failing condition
    pub fn first_condition_error(&self) -> Option<&ConditionError> {
        self.condition_errors.first()
    }
}

impl fmt::Display for PermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Permission for Action: \"{}\" is not granted for Resource: \"{}\"",
            self.action, self.resource_name
        )?;

        if self.has_failed_conditions() {
            f.write_str(" due to failed Conditions")?;
        }

        Ok(())
    }
}

/// Ordered collection of permission errors
#[derive(Debug, Clone, Default)]
pub struct PermissionErrors(Vec<PermissionError>);

impl PermissionErrors {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error
    pub fn push(&mut self, error: PermissionError) {
        self.0.push(error);
    }

    /// Errors produced for a given role
    pub fn by_role_name(&self, role_name: &str) -> Vec<&PermissionError> {
        self.0.iter().filter(|e| e.role_name == role_name).collect()
    }

    /// Errors produced for a given action
    pub fn by_action(&self, action: &str) -> Vec<&PermissionError> {
        self.0.iter().filter(|e| e.action == action).collect()
    }

    /// Distinct failed actions, in first-failure order
    pub fn failed_actions(&self) -> Vec<&str> {
        let mut actions: Vec<&str> = Vec::new();

        for error in &self.0 {
            if !actions.contains(&error.action.as_str()) {
                actions.push(&error.action);
            }
        }

        actions
    }

    /// Consume into the underlying vector
    pub fn into_inner(self) -> Vec<PermissionError> {
        self.0
    }
}

impl Deref for PermissionErrors {
    type Target = [PermissionError];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<PermissionError>> for PermissionErrors {
    fn from(errors: Vec<PermissionError>) -> Self {
        Self(errors)
    }
}

impl Extend<PermissionError> for PermissionErrors {
    fn extend<T: IntoIterator<Item = PermissionError>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl IntoIterator for PermissionErrors {
    type Item = PermissionError;
    type IntoIter = std::vec::IntoIter<PermissionError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PermissionErrors {
    type Item = &'a PermissionError;
    type IntoIter = std::slice::Iter<'a, PermissionError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// No role of the subject satisfied the request
#[derive(Debug, Clone, Error)]
pub struct AccessDeniedError {
    /// Resource type name of the denied request
    pub resource_name: String,

    /// Every reason the request was denied
    pub reasons: PermissionErrors,
}

impl AccessDeniedError {
    /// Create a new access denied error
    pub fn new(resource_name: impl Into<String>, reasons: impl Into<PermissionErrors>) -> Self {
        Self {
            resource_name: resource_name.into(),
            reasons: reasons.into(),
        }
    }

    /// First reason, the only one in fail-fast mode with a single role
    pub fn first_reason(&self) -> Option<&PermissionError> {
        self.reasons.first()
    }
}

impl fmt::Display for AccessDeniedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actions = self.reasons.failed_actions();
        let noun = if actions.len() > 1 { "Actions" } else { "Action" };
        let actions = actions
            .iter()
            .map(|action| format!("\"{}\"", action))
            .collect::<Vec<_>>()
            .join(", ");

        write!(
            f,
            "access denied for {}: {} on Resource: \"{}\"",
            noun, actions, self.resource_name
        )
    }
}
