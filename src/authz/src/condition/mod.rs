//! Conditions gating permissions
//!
//! A condition is a predicate over an [`AccessRequest`]. Built-in and custom
//! conditions implement the same [`Condition`] trait; custom types become
//! loadable from policy documents once registered in a [`ConditionRegistry`].

pub mod builtin;
pub mod registry;

pub use builtin::{
    EmptyCondition, EqualCondition, IsOwnerCondition, NotEmptyCondition, NotEqualCondition,
    EMPTY_CONDITION_TYPE, EQUAL_CONDITION_TYPE, IS_OWNER_CONDITION_TYPE,
    NOT_EMPTY_CONDITION_TYPE, NOT_EQUAL_CONDITION_TYPE,
};
pub use registry::{ConditionFactory, ConditionRegistry};

use crate::error::{AuthzError, Result};
use crate::request::AccessRequest;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a condition
pub type ConditionRef = Arc<dyn Condition>;

/// Ordered list of conditions, combined with AND semantics
pub type Conditions = Vec<ConditionRef>;

/// Why a condition check did not pass
#[derive(Debug)]
pub enum ConditionFailure {
    /// The request does not satisfy the condition
    NotSatisfied(String),

    /// The condition could not be evaluated; aborts the decision
    Error(AuthzError),
}

impl ConditionFailure {
    /// Not-satisfied outcome with a human-readable reason
    pub fn not_satisfied(reason: impl Into<String>) -> Self {
        Self::NotSatisfied(reason.into())
    }

    /// Evaluation fault raised by a condition implementation
    pub fn error(condition_type: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Error(AuthzError::ConditionFailed {
            condition_type: condition_type.into(),
            message: message.to_string(),
        })
    }
}

impl From<AuthzError> for ConditionFailure {
    fn from(err: AuthzError) -> Self {
        Self::Error(err)
    }
}

/// Predicate that must hold for a permission to be granted
///
/// Conditions are built once when a policy is loaded and are read-only during
/// decisions, so implementations must not depend on mutable state.
pub trait Condition: fmt::Debug + Send + Sync {
    /// Type identifier, the key used in the condition registry
    fn condition_type(&self) -> &str;

    /// Optional instance name, useful for identifying the failing condition
    fn name(&self) -> Option<&str> {
        None
    }

    /// Check the condition against a request
    fn check(&self, request: &AccessRequest<'_>) -> std::result::Result<(), ConditionFailure>;

    /// Parameters of this condition as a JSON object, without the `type` key
    fn encode(&self) -> Result<Value>;
}

/// Encode a condition for a policy document, tagging it with its type.
pub fn encode_condition(condition: &dyn Condition) -> Result<Value> {
    let mut encoded = match condition.encode()? {
        Value::Object(fields) => fields,
        Value::Null => serde_json::Map::new(),
        other => {
            return Err(AuthzError::InvalidPolicy(format!(
                "Condition \"{}\" must encode to an object, got: {}",
                condition.condition_type(),
                other
            )))
        }
    };

    encoded.insert(
        "type".to_string(),
        Value::String(condition.condition_type().to_string()),
    );

    Ok(Value::Object(encoded))
}

/// Deep equality for dynamic values, comparing numbers by value.
pub(crate) fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => {
            if let (Some(l), Some(r)) = (l.as_i64(), r.as_i64()) {
                return l == r;
            }
            if let (Some(l), Some(r)) = (l.as_u64(), r.as_u64()) {
                return l == r;
            }
            l.as_f64() == r.as_f64()
        }
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(l, r)| values_equal(l, r))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l.iter()
                    .all(|(key, l)| r.get(key).is_some_and(|r| values_equal(l, r)))
        }
        _ => left == right,
    }
}

/// Zero value of the dynamic type: null, false, 0, "", [] or {}.
pub(crate) fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}
