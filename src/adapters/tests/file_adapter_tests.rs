//! File adapter integration tests

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use warden_adapters::{AdapterError, FileAdapter, FileType, InMemoryAdapter};
use warden_authz::{
    AccessManager, AccessRequest, AuthzError, BasicResource, BasicSubject, Condition,
    ConditionFailure, ConditionRegistry, Permission, PolicyManager, PolicyManagerConfig, Role,
    StorageAdapter, ValueDescriptor,
};

const POLICY_JSON: &str = r#"{
    "permissionPresets": {
        "updateOwn": {
            "name": "updateOwn",
            "action": "update",
            "conditions": [{ "type": "IS_OWNER" }]
        }
    },
    "roles": {
        "User": {
            "id": "User",
            "grants": {
                "Doc": [
                    { "action": "read" },
                    { "preset": "updateOwn" }
                ]
            }
        },
        "Admin": {
            "id": "Admin",
            "grants": {
                "Doc": [{ "action": "delete" }]
            },
            "parents": ["User"]
        }
    }
}"#;

const POLICY_YAML: &str = r#"
permissionPresets: {}
roles:
  User:
    grants:
      Doc:
        - action: read
        - action: delete
          conditions:
            - type: EMPTY
              name: deleteInactive
              value:
                source: ResourceField
                field: active
"#;

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_json_policy() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "policy.json", POLICY_JSON);

    let adapter = FileAdapter::from_path(&path).unwrap();
    let policy = adapter.load_policy().unwrap();

    assert_eq!(policy.roles.len(), 2);
    assert_eq!(policy.roles["Admin"].parents, vec!["User".to_string()]);
    assert_eq!(policy.permission_presets["updateOwn"].conditions.len(), 1);
}

#[test]
fn test_load_yaml_policy_and_authorize() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "policy.yaml", POLICY_YAML);

    let manager = PolicyManager::new(
        Arc::new(FileAdapter::from_path(&path).unwrap()),
        PolicyManagerConfig::default(),
    )
    .unwrap();
    let access = AccessManager::new(Arc::new(manager));

    let subject = BasicSubject::new("u1").with_role("User");
    let active = BasicResource::new("Doc").with_attribute("active", true);
    let inactive = BasicResource::new("Doc").with_attribute("active", false);

    assert!(access
        .authorize(&AccessRequest::new(&subject, &inactive, ["read", "delete"]))
        .is_ok());

    let err = access
        .authorize(&AccessRequest::new(&subject, &active, ["delete"]))
        .unwrap_err();
    let reason = err.as_access_denied().unwrap().first_reason().unwrap();
    assert_eq!(reason.condition_errors[0].condition.name(), Some("deleteInactive"));
}

#[test]
fn test_save_json_with_tab_indent() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "policy.json", POLICY_JSON);

    let adapter = Arc::new(FileAdapter::from_path(&path).unwrap());
    let manager = PolicyManager::new(adapter.clone(), PolicyManagerConfig::default()).unwrap();

    manager
        .add_role(Role::new("Guest").with_grant("Doc", Permission::new("read")))
        .unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("\n\t\"permissionPresets\""));

    let saved: Value = serde_json::from_str(&content).unwrap();
    assert_eq!(saved["roles"]["Guest"]["grants"]["Doc"][0]["action"], json!("read"));
    // Presets are materialized when the policy is loaded
    assert_eq!(saved["roles"]["User"]["grants"]["Doc"][1]["action"], json!("update"));
    assert_eq!(
        saved["roles"]["User"]["grants"]["Doc"][1]["conditions"][0]["type"],
        json!("IS_OWNER")
    );

    let reloaded = adapter.load_policy().unwrap();
    assert!(reloaded.roles.contains_key("Guest"));
}

#[test]
fn test_save_yaml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "policy.yml", POLICY_YAML);

    let adapter = FileAdapter::from_path(&path).unwrap();
    let policy = adapter.load_policy().unwrap();
    adapter.save_policy(&policy).unwrap();

    let reloaded = adapter.load_policy().unwrap();
    let conditions = &reloaded.roles["User"].grants["Doc"][1].conditions;
    assert_eq!(conditions[0].condition_type(), "EMPTY");
}

#[cfg(unix)]
#[test]
fn test_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("new-policy.json");

    let adapter = FileAdapter::new(&path, FileType::Json).with_file_mode(0o600);
    adapter.save_policy(&Default::default()).unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let adapter = FileAdapter::new(dir.path().join("absent.json"), FileType::Json);

    let err = adapter.load_policy().unwrap_err();
    let AuthzError::Storage(source) = err else {
        panic!("expected storage error, got {err:?}");
    };
    assert!(matches!(
        source.downcast_ref::<AdapterError>(),
        Some(AdapterError::Io { .. })
    ));
}

#[test]
fn test_invalid_content() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "policy.json", "{ not json");

    let err = FileAdapter::from_path(&path).unwrap().load_policy().unwrap_err();
    assert!(matches!(err, AuthzError::Storage(_)));
}

#[derive(Debug, Serialize, Deserialize)]
struct InListCondition {
    value: ValueDescriptor,
    list: Vec<Value>,
}

impl Condition for InListCondition {
    fn condition_type(&self) -> &str {
        "IN_LIST"
    }

    fn check(&self, request: &AccessRequest<'_>) -> Result<(), ConditionFailure> {
        let value = self.value.resolve(request)?;
        if self.list.contains(&value) {
            Ok(())
        } else {
            Err(ConditionFailure::not_satisfied(format!("{} is not listed", value)))
        }
    }

    fn encode(&self) -> warden_authz::Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[test]
fn test_custom_condition_registry() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "policy.json",
        r#"{
            "roles": {
                "User": {
                    "grants": {
                        "Doc": [{
                            "action": "read",
                            "conditions": [{
                                "type": "IN_LIST",
                                "value": { "source": "ContextField", "field": "region" },
                                "list": ["eu", "us"]
                            }]
                        }]
                    }
                }
            }
        }"#,
    );

    let plain = FileAdapter::from_path(&path).unwrap();
    assert!(matches!(
        plain.load_policy(),
        Err(AuthzError::ConditionTypeNotFound(name)) if name == "IN_LIST"
    ));

    let registry = ConditionRegistry::with_builtins();
    registry.register_type::<InListCondition>("IN_LIST").unwrap();
    let adapter = plain.with_registry(Arc::new(registry));

    let access = AccessManager::new(Arc::new(adapter.load_policy().unwrap()));
    let subject = BasicSubject::new("u1").with_role("User");
    let resource = BasicResource::new("Doc");

    let mut context = warden_authz::Context::new();
    context.insert("region".to_string(), json!("eu"));
    assert!(access
        .is_granted(&AccessRequest::new(&subject, &resource, ["read"]).with_context(&context))
        .unwrap());

    context.insert("region".to_string(), json!("apac"));
    assert!(!access
        .is_granted(&AccessRequest::new(&subject, &resource, ["read"]).with_context(&context))
        .unwrap());
}

#[test]
fn test_in_memory_adapter_with_manager() {
    let adapter = Arc::new(InMemoryAdapter::default());
    let manager = PolicyManager::new(adapter.clone(), PolicyManagerConfig::default()).unwrap();

    manager.add_role(Role::new("User")).unwrap();
    assert!(adapter.stored().roles.contains_key("User"));

    manager.disable_auto_update();
    manager.delete_role("User").unwrap();
    assert!(adapter.stored().roles.contains_key("User"));

    manager.save_policy().unwrap();
    assert!(adapter.stored().roles.is_empty());
}
