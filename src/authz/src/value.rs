//! Value descriptors and their resolution against a request

use crate::error::{AuthzError, Result};
use crate::request::AccessRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Where a descriptor's value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueSource {
    /// Field of the request's subject
    SubjectField,
    /// Field of the request's resource
    ResourceField,
    /// Key of the request's context
    ContextField,
    /// Literal value stored in the descriptor
    Explicit,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SubjectField => "SubjectField",
            Self::ResourceField => "ResourceField",
            Self::ContextField => "ContextField",
            Self::Explicit => "Explicit",
        };
        f.write_str(name)
    }
}

/// Pointer to a value tested by a condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDescriptor {
    /// Source of the value
    pub source: ValueSource,

    /// Field name on the source, required unless the source is `Explicit`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub field: String,

    /// Literal value for `Explicit` descriptors
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
}

impl ValueDescriptor {
    /// Descriptor for a subject field
    pub fn subject(field: impl Into<String>) -> Self {
        Self::from_source(ValueSource::SubjectField, field)
    }

    /// Descriptor for a resource field
    pub fn resource(field: impl Into<String>) -> Self {
        Self::from_source(ValueSource::ResourceField, field)
    }

    /// Descriptor for a context key
    pub fn context(field: impl Into<String>) -> Self {
        Self::from_source(ValueSource::ContextField, field)
    }

    /// Descriptor for a literal value
    pub fn explicit(value: impl Into<Value>) -> Self {
        Self {
            source: ValueSource::Explicit,
            field: String::new(),
            value: value.into(),
        }
    }

    fn from_source(source: ValueSource, field: impl Into<String>) -> Self {
        Self {
            source,
            field: field.into(),
            value: Value::Null,
        }
    }

    /// Resolve the described value for the given request.
    ///
    /// Pure read. Fails with [`AuthzError::MalformedDescriptor`] when the
    /// field name is empty, the source is absent from the request, or the
    /// field does not exist on the source.
    pub fn resolve(&self, request: &AccessRequest<'_>) -> Result<Value> {
        let found = match self.source {
            ValueSource::Explicit => return Ok(self.value.clone()),
            _ if self.field.is_empty() => return Err(self.malformed("Field cannot be empty")),
            ValueSource::SubjectField => request
                .subject
                .ok_or_else(|| self.malformed("Subject is not defined"))?
                .field(&self.field),
            ValueSource::ResourceField => request
                .resource
                .ok_or_else(|| self.malformed("Resource is not defined"))?
                .field(&self.field),
            ValueSource::ContextField => request
                .context
                .ok_or_else(|| self.malformed("Context is not defined"))?
                .get(&self.field)
                .cloned(),
        };

        found.ok_or_else(|| {
            self.malformed(&format!(
                "Field \"{}\" does not exist on source \"{}\"",
                self.field, self.source
            ))
        })
    }

    fn malformed(&self, reason: &str) -> AuthzError {
        AuthzError::MalformedDescriptor {
            value_source: self.source,
            reason: reason.to_string(),
        }
    }
}
