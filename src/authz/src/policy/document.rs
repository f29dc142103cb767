//! Serializable policy document
//!
//! The document mirrors [`PolicyDefinition`] with conditions kept as tagged
//! JSON objects (`{"type": "EQUAL", ...}`), so it can be read and written by
//! any serde format. Conditions are only decoded into live objects when the
//! document is converted into a definition.

use super::{Permission, PermissionPreset, PolicyDefinition, Role};
use crate::condition::{encode_condition, ConditionRegistry, Conditions};
use crate::error::{AuthzError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Document form of a [`PolicyDefinition`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
    /// Permission presets by name
    #[serde(default)]
    pub permission_presets: BTreeMap<String, PresetDocument>,

    /// Roles by identifier
    #[serde(default)]
    pub roles: BTreeMap<String, RoleDocument>,
}

/// Document form of a [`Role`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDocument {
    /// Role identifier, defaults to the key of the role in the policy
    #[serde(default)]
    pub id: String,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Permissions keyed by resource name
    #[serde(default)]
    pub grants: BTreeMap<String, Vec<PermissionDocument>>,

    /// Roles inherited from, checked in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

/// Document form of a [`Permission`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDocument {
    /// Granted action, may be left empty when a preset supplies it
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub action: String,

    /// Type-tagged conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Value>,

    /// Name of the preset to materialize
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,

    /// Append the preset's conditions to these instead of replacing them
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub extend_preset_conditions: bool,
}

/// Document form of a [`PermissionPreset`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetDocument {
    /// Preset name, defaults to the key of the preset in the policy
    #[serde(default)]
    pub name: String,

    /// Action given to permissions using the preset
    pub action: String,

    /// Type-tagged conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Value>,
}

impl PolicyDocument {
    /// Decode into a policy definition.
    ///
    /// Presets are not applied here; see [`PolicyDefinition::apply_presets`].
    pub fn into_definition(self, registry: &ConditionRegistry) -> Result<PolicyDefinition> {
        let mut policy = PolicyDefinition::new();

        for (key, preset) in self.permission_presets {
            let name = document_key(&key, preset.name, "Permission preset")?;
            let conditions = decode_conditions(preset.conditions, registry)?;

            policy.permission_presets.insert(
                key,
                PermissionPreset {
                    name,
                    action: preset.action,
                    conditions,
                },
            );
        }

        for (key, role) in self.roles {
            let id = document_key(&key, role.id, "Role")?;
            let mut grants = BTreeMap::new();

            for (resource_name, permissions) in role.grants {
                let permissions = permissions
                    .into_iter()
                    .map(|permission| decode_permission(permission, &id, &resource_name, registry))
                    .collect::<Result<Vec<_>>>()?;
                grants.insert(resource_name, permissions);
            }

            policy.roles.insert(
                key,
                Arc::new(Role {
                    id,
                    description: role.description,
                    grants,
                    parents: role.parents,
                }),
            );
        }

        Ok(policy)
    }

    /// Encode a policy definition
    pub fn from_definition(policy: &PolicyDefinition) -> Result<Self> {
        let mut document = Self::default();

        for (key, preset) in &policy.permission_presets {
            document.permission_presets.insert(
                key.clone(),
                PresetDocument {
                    name: preset.name.clone(),
                    action: preset.action.clone(),
                    conditions: encode_conditions(&preset.conditions)?,
                },
            );
        }

        for (key, role) in &policy.roles {
            let mut grants = BTreeMap::new();

            for (resource_name, permissions) in &role.grants {
                let permissions = permissions
                    .iter()
                    .map(|permission| {
                        Ok(PermissionDocument {
                            action: permission.action.clone(),
                            conditions: encode_conditions(&permission.conditions)?,
                            preset: permission.preset.clone(),
                            extend_preset_conditions: permission.extend_preset_conditions,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                grants.insert(resource_name.clone(), permissions);
            }

            document.roles.insert(
                key.clone(),
                RoleDocument {
                    id: role.id.clone(),
                    description: role.description.clone(),
                    grants,
                    parents: role.parents.clone(),
                },
            );
        }

        Ok(document)
    }
}

fn document_key(key: &str, declared: String, kind: &str) -> Result<String> {
    if declared.is_empty() || declared == key {
        return Ok(key.to_string());
    }

    Err(AuthzError::InvalidPolicy(format!(
        "{} \"{}\" is stored under a different key: \"{}\"",
        kind, declared, key
    )))
}

fn decode_permission(
    permission: PermissionDocument,
    role_id: &str,
    resource_name: &str,
    registry: &ConditionRegistry,
) -> Result<Permission> {
    if permission.action.is_empty() && permission.preset.is_none() {
        return Err(AuthzError::InvalidPolicy(format!(
            "Permission of role \"{}\" on \"{}\" has neither an action nor a preset",
            role_id, resource_name
        )));
    }

    Ok(Permission {
        action: permission.action,
        conditions: decode_conditions(permission.conditions, registry)?,
        preset: permission.preset,
        extend_preset_conditions: permission.extend_preset_conditions,
    })
}

fn decode_conditions(encoded: Vec<Value>, registry: &ConditionRegistry) -> Result<Conditions> {
    encoded
        .into_iter()
        .map(|condition| registry.decode(condition))
        .collect()
}

fn encode_conditions(conditions: &Conditions) -> Result<Vec<Value>> {
    conditions
        .iter()
        .map(|condition| encode_condition(condition.as_ref()))
        .collect()
}
