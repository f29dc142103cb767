//! Built-in conditions

use super::{is_empty_value, values_equal, Condition, ConditionFailure};
use crate::error::Result;
use crate::request::AccessRequest;
use crate::value::ValueDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// [`EqualCondition`] type identifier
pub const EQUAL_CONDITION_TYPE: &str = "EQUAL";
/// [`NotEqualCondition`] type identifier
pub const NOT_EQUAL_CONDITION_TYPE: &str = "NOT_EQUAL";
/// [`EmptyCondition`] type identifier
pub const EMPTY_CONDITION_TYPE: &str = "EMPTY";
/// [`NotEmptyCondition`] type identifier
pub const NOT_EMPTY_CONDITION_TYPE: &str = "NOT_EMPTY";
/// [`IsOwnerCondition`] type identifier
pub const IS_OWNER_CONDITION_TYPE: &str = "IS_OWNER";

type CheckResult = std::result::Result<(), ConditionFailure>;

/// Satisfied when both operands resolve to equal values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqualCondition {
    /// Instance name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Left operand
    pub value: ValueDescriptor,

    /// Right operand
    pub equals: ValueDescriptor,
}

impl EqualCondition {
    /// Create an equality check between two descriptors
    pub fn new(value: ValueDescriptor, equals: ValueDescriptor) -> Self {
        Self {
            name: None,
            value,
            equals,
        }
    }

    /// Name the condition
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Condition for EqualCondition {
    fn condition_type(&self) -> &str {
        EQUAL_CONDITION_TYPE
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn check(&self, request: &AccessRequest<'_>) -> CheckResult {
        let (left, right) = resolve_pair(&self.value, &self.equals, request)?;

        if !values_equal(&left, &right) {
            return Err(ConditionFailure::not_satisfied(format!(
                "Values \"{}\" and \"{}\" are not equal",
                left, right
            )));
        }

        Ok(())
    }

    fn encode(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Satisfied when the operands resolve to different values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotEqualCondition {
    /// Instance name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Left operand
    pub value: ValueDescriptor,

    /// Right operand
    pub equals: ValueDescriptor,
}

impl NotEqualCondition {
    /// Create an inequality check between two descriptors
    pub fn new(value: ValueDescriptor, equals: ValueDescriptor) -> Self {
        Self {
            name: None,
            value,
            equals,
        }
    }

    /// Name the condition
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Condition for NotEqualCondition {
    fn condition_type(&self) -> &str {
        NOT_EQUAL_CONDITION_TYPE
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn check(&self, request: &AccessRequest<'_>) -> CheckResult {
        let (left, right) = resolve_pair(&self.value, &self.equals, request)?;

        if values_equal(&left, &right) {
            return Err(ConditionFailure::not_satisfied(format!(
                "Values \"{}\" and \"{}\" are equal",
                left, right
            )));
        }

        Ok(())
    }

    fn encode(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Satisfied when the value is the zero value of its type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmptyCondition {
    /// Instance name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Value being checked
    pub value: ValueDescriptor,
}

impl EmptyCondition {
    /// Create an emptiness check
    pub fn new(value: ValueDescriptor) -> Self {
        Self { name: None, value }
    }

    /// Name the condition
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Condition for EmptyCondition {
    fn condition_type(&self) -> &str {
        EMPTY_CONDITION_TYPE
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn check(&self, request: &AccessRequest<'_>) -> CheckResult {
        let value = self.value.resolve(request)?;

        if !is_empty_value(&value) {
            return Err(ConditionFailure::not_satisfied(format!(
                "Value \"{}\" is not empty",
                value
            )));
        }

        Ok(())
    }

    fn encode(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Satisfied when the value is not the zero value of its type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotEmptyCondition {
    /// Instance name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Value being checked
    pub value: ValueDescriptor,
}

impl NotEmptyCondition {
    /// Create a non-emptiness check
    pub fn new(value: ValueDescriptor) -> Self {
        Self { name: None, value }
    }

    /// Name the condition
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Condition for NotEmptyCondition {
    fn condition_type(&self) -> &str {
        NOT_EMPTY_CONDITION_TYPE
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn check(&self, request: &AccessRequest<'_>) -> CheckResult {
        let value = self.value.resolve(request)?;

        if is_empty_value(&value) {
            return Err(ConditionFailure::not_satisfied(format!(
                "Value \"{}\" is empty",
                value
            )));
        }

        Ok(())
    }

    fn encode(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

fn default_subject_field() -> String {
    "id".to_string()
}

fn default_resource_field() -> String {
    "owner".to_string()
}

/// Satisfied when the subject's identity matches the resource's owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsOwnerCondition {
    /// Instance name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Subject field holding the identity
    #[serde(default = "default_subject_field")]
    pub subject_field: String,

    /// Resource field holding the owner's identity
    #[serde(default = "default_resource_field")]
    pub resource_field: String,
}

impl IsOwnerCondition {
    /// Compare subject `id` with resource `owner`
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare custom subject and resource fields
    pub fn with_fields(subject_field: impl Into<String>, resource_field: impl Into<String>) -> Self {
        Self {
            name: None,
            subject_field: subject_field.into(),
            resource_field: resource_field.into(),
        }
    }
}

impl Default for IsOwnerCondition {
    fn default() -> Self {
        Self {
            name: None,
            subject_field: default_subject_field(),
            resource_field: default_resource_field(),
        }
    }
}

impl Condition for IsOwnerCondition {
    fn condition_type(&self) -> &str {
        IS_OWNER_CONDITION_TYPE
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn check(&self, request: &AccessRequest<'_>) -> CheckResult {
        let identity = ValueDescriptor::subject(self.subject_field.as_str()).resolve(request)?;
        let owner = ValueDescriptor::resource(self.resource_field.as_str()).resolve(request)?;

        if owner.is_null() || !values_equal(&identity, &owner) {
            return Err(ConditionFailure::not_satisfied(format!(
                "Subject \"{}\" is not the owner of the resource (owner: \"{}\")",
                identity, owner
            )));
        }

        Ok(())
    }

    fn encode(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

fn resolve_pair(
    left: &ValueDescriptor,
    right: &ValueDescriptor,
    request: &AccessRequest<'_>,
) -> std::result::Result<(Value, Value), ConditionFailure> {
    Ok((left.resolve(request)?, right.resolve(request)?))
}
