//! Core authorization types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Unique role identifier
pub type RoleId = String;

/// Auxiliary request attributes
pub type Context = HashMap<String, Value>;

/// Entity requesting access
pub trait Subject: fmt::Debug + Send + Sync {
    /// Roles held by the subject, in evaluation order
    fn roles(&self) -> Vec<RoleId>;

    /// Value of a named field, `None` when the field does not exist
    fn field(&self, name: &str) -> Option<Value>;
}

/// Entity being accessed
pub trait Resource: fmt::Debug + Send + Sync {
    /// Resource type name, used as the key into a role's grants
    fn resource_name(&self) -> &str;

    /// Value of a named field, `None` when the field does not exist
    fn field(&self, name: &str) -> Option<Value>;
}

/// Structural field lookup through serde.
///
/// Lets any `Serialize` type answer [`Subject::field`] or [`Resource::field`]
/// by its serialized field names.
pub fn lookup_field<T: Serialize + ?Sized>(value: &T, name: &str) -> Option<Value> {
    match serde_json::to_value(value).ok()? {
        Value::Object(mut fields) => fields.remove(name),
        _ => None,
    }
}

/// Subject implementation for callers without their own user type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicSubject {
    /// Subject identifier
    #[serde(default)]
    pub id: String,

    /// Roles held by the subject
    #[serde(default)]
    pub roles: Vec<RoleId>,

    /// Additional attributes
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl BasicSubject {
    /// Create a new subject
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Add a role to the subject
    pub fn with_role(mut self, role: impl Into<RoleId>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Add an attribute to the subject
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl Subject for BasicSubject {
    fn roles(&self) -> Vec<RoleId> {
        self.roles.clone()
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.clone())),
            _ => self.attributes.get(name).cloned(),
        }
    }
}

/// Resource implementation for callers without their own resource type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicResource {
    /// Resource type name
    pub name: String,

    /// Additional attributes (owner, state, etc.)
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl BasicResource {
    /// Create a new resource of the given type
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Map::new(),
        }
    }

    /// Add an attribute to the resource
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl Resource for BasicResource {
    fn resource_name(&self) -> &str {
        &self.name
    }

    fn field(&self, name: &str) -> Option<Value> {
        self.attributes.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Serialize)]
    struct Document {
        id: String,
        created_by: String,
        tags: Vec<String>,
    }

    #[test]
    fn test_subject_creation() {
        let subject = BasicSubject::new("u1")
            .with_role("User")
            .with_role("Editor")
            .with_attribute("department", "engineering");

        assert_eq!(subject.roles(), vec!["User".to_string(), "Editor".to_string()]);
        assert_eq!(subject.field("id"), Some(json!("u1")));
        assert_eq!(subject.field("department"), Some(json!("engineering")));
        assert_eq!(subject.field("missing"), None);
    }

    #[test]
    fn test_resource_creation() {
        let resource = BasicResource::new("Doc").with_attribute("owner", "u1");

        assert_eq!(resource.resource_name(), "Doc");
        assert_eq!(resource.field("owner"), Some(json!("u1")));
    }

    #[test]
    fn test_lookup_field() {
        let doc = Document {
            id: "d1".to_string(),
            created_by: "u1".to_string(),
            tags: vec![],
        };

        assert_eq!(lookup_field(&doc, "created_by"), Some(json!("u1")));
        assert_eq!(lookup_field(&doc, "tags"), Some(json!([])));
        assert_eq!(lookup_field(&doc, "nope"), None);
        assert_eq!(lookup_field(&42, "id"), None);
    }
}
