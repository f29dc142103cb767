//! Policy administration
//!
//! [`PolicyManager`] owns the in-memory policy behind a single reader/writer
//! lock. Decisions take the read side through [`RoleProvider`]; every
//! mutation takes the write side and, with auto-update enabled, persists the
//! new policy through the storage adapter before releasing it.

use super::{Permission, PermissionPreset, PolicyDefinition, Role, RoleProvider, StorageAdapter};
use crate::error::{AuthzError, Result};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Policy manager configuration
#[derive(Debug, Clone)]
pub struct PolicyManagerConfig {
    /// Persist the policy after every successful mutation
    pub auto_update: bool,
}

impl Default for PolicyManagerConfig {
    fn default() -> Self {
        Self { auto_update: true }
    }
}

/// Loads, edits and persists a policy
pub struct PolicyManager {
    adapter: Arc<dyn StorageAdapter>,
    auto_update: AtomicBool,
    policy: RwLock<PolicyDefinition>,
}

impl PolicyManager {
    /// Create a manager and load the policy from the adapter.
    ///
    /// # Errors
    ///
    /// Fails if the adapter cannot load the policy or a permission references
    /// an unknown preset.
    pub fn new(adapter: Arc<dyn StorageAdapter>, config: PolicyManagerConfig) -> Result<Self> {
        let policy = Self::read_policy(adapter.as_ref())?;

        info!(
            roles = policy.roles.len(),
            presets = policy.permission_presets.len(),
            auto_update = config.auto_update,
            "Policy manager initialized"
        );

        Ok(Self {
            adapter,
            auto_update: AtomicBool::new(config.auto_update),
            policy: RwLock::new(policy),
        })
    }

    /// Snapshot of the current policy
    pub fn policy(&self) -> PolicyDefinition {
        self.policy.read().clone()
    }

    /// Whether mutations are persisted automatically
    pub fn auto_update(&self) -> bool {
        self.auto_update.load(Ordering::Relaxed)
    }

    /// Persist after every mutation
    pub fn enable_auto_update(&self) {
        self.auto_update.store(true, Ordering::Relaxed);
    }

    /// Stop persisting after mutations; call [`save_policy`](Self::save_policy) manually
    pub fn disable_auto_update(&self) {
        self.auto_update.store(false, Ordering::Relaxed);
    }

    /// Replace the in-memory policy with the stored one
    pub fn load_policy(&self) -> Result<()> {
        let policy = Self::read_policy(self.adapter.as_ref())?;
        *self.policy.write() = policy;

        info!("Policy reloaded from storage");
        Ok(())
    }

    /// Persist the in-memory policy
    pub fn save_policy(&self) -> Result<()> {
        let policy = self.policy.read();
        self.adapter.save_policy(&policy)?;

        info!("Policy saved");
        Ok(())
    }

    /// Look up a role
    pub fn get_role(&self, role_id: &str) -> Result<Arc<Role>> {
        self.policy.read().get_role(role_id)
    }

    /// Add a new role.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::RoleAlreadyExists`] if the identifier is taken.
    pub fn add_role(&self, role: Role) -> Result<()> {
        self.mutate(|policy| {
            if policy.roles.contains_key(&role.id) {
                return Err(AuthzError::RoleAlreadyExists(role.id.clone()));
            }

            info!("Adding role: {}", role.id);
            insert_role(policy, role)
        })
    }

    /// Replace an existing role.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::RoleNotFound`] if no role has this identifier.
    pub fn update_role(&self, role: Role) -> Result<()> {
        self.mutate(|policy| {
            if !policy.roles.contains_key(&role.id) {
                return Err(AuthzError::RoleNotFound(role.id.clone()));
            }

            info!("Updating role: {}", role.id);
            insert_role(policy, role)
        })
    }

    /// Add or replace a role
    pub fn upsert_role(&self, role: Role) -> Result<()> {
        self.mutate(|policy| {
            info!("Upserting role: {}", role.id);
            insert_role(policy, role)
        })
    }

    /// Remove a role
    pub fn delete_role(&self, role_id: &str) -> Result<()> {
        self.mutate(|policy| {
            policy
                .roles
                .remove(role_id)
                .ok_or_else(|| AuthzError::RoleNotFound(role_id.to_string()))?;

            info!("Deleted role: {}", role_id);
            Ok(())
        })
    }

    /// Look up a permission preset
    pub fn get_permission_preset(&self, name: &str) -> Result<PermissionPreset> {
        self.policy
            .read()
            .permission_presets
            .get(name)
            .cloned()
            .ok_or_else(|| AuthzError::PermissionPresetNotFound(name.to_string()))
    }

    /// Add a new permission preset.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::PermissionPresetAlreadyExists`] if the name is taken.
    pub fn add_permission_preset(&self, preset: PermissionPreset) -> Result<()> {
        self.mutate(|policy| {
            if policy.permission_presets.contains_key(&preset.name) {
                return Err(AuthzError::PermissionPresetAlreadyExists(preset.name.clone()));
            }

            info!("Adding permission preset: {}", preset.name);
            policy.permission_presets.insert(preset.name.clone(), preset);
            Ok(())
        })
    }

    /// Replace an existing permission preset.
    ///
    /// Permissions already materialized from the old preset keep their
    /// conditions.
    pub fn update_permission_preset(&self, preset: PermissionPreset) -> Result<()> {
        self.mutate(|policy| {
            if !policy.permission_presets.contains_key(&preset.name) {
                return Err(AuthzError::PermissionPresetNotFound(preset.name.clone()));
            }

            info!("Updating permission preset: {}", preset.name);
            policy.permission_presets.insert(preset.name.clone(), preset);
            Ok(())
        })
    }

    /// Add or replace a permission preset
    pub fn upsert_permission_preset(&self, preset: PermissionPreset) -> Result<()> {
        self.mutate(|policy| {
            info!("Upserting permission preset: {}", preset.name);
            policy.permission_presets.insert(preset.name.clone(), preset);
            Ok(())
        })
    }

    /// Remove a permission preset
    pub fn delete_permission_preset(&self, name: &str) -> Result<()> {
        self.mutate(|policy| {
            policy
                .permission_presets
                .remove(name)
                .ok_or_else(|| AuthzError::PermissionPresetNotFound(name.to_string()))?;

            info!("Deleted permission preset: {}", name);
            Ok(())
        })
    }

    /// Grant a permission to a role on a resource type.
    ///
    /// A preset referenced by the permission is applied first.
    pub fn add_permission(
        &self,
        role_id: &str,
        resource_name: &str,
        mut permission: Permission,
    ) -> Result<()> {
        self.mutate(|policy| {
            let role = policy
                .roles
                .get_mut(role_id)
                .ok_or_else(|| AuthzError::RoleNotFound(role_id.to_string()))?;

            permission.apply_preset(&policy.permission_presets)?;

            info!(
                "Granting \"{}\" on \"{}\" to role: {}",
                permission.action, resource_name, role_id
            );
            Arc::make_mut(role)
                .grants
                .entry(resource_name.to_string())
                .or_default()
                .push(permission);
            Ok(())
        })
    }

    /// Remove every permission for an action from a role on a resource type.
    ///
    /// Removing an action the role was never granted is not an error.
    pub fn delete_permission(&self, role_id: &str, resource_name: &str, action: &str) -> Result<()> {
        self.mutate(|policy| {
            let role = policy
                .roles
                .get_mut(role_id)
                .ok_or_else(|| AuthzError::RoleNotFound(role_id.to_string()))?;

            if let Some(permissions) = Arc::make_mut(role).grants.get_mut(resource_name) {
                permissions.retain(|permission| permission.action != action);
            }

            info!(
                "Revoked \"{}\" on \"{}\" from role: {}",
                action, resource_name, role_id
            );
            Ok(())
        })
    }

    fn read_policy(adapter: &dyn StorageAdapter) -> Result<PolicyDefinition> {
        let mut policy = adapter.load_policy()?;
        policy.apply_presets()?;
        Ok(policy)
    }

    /// Apply a change under the write lock, persisting it when auto-update
    /// is on. A failed change leaves the policy untouched.
    fn mutate<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut PolicyDefinition) -> Result<()>,
    {
        let mut policy = self.policy.write();
        let mut updated = policy.clone();

        change(&mut updated)?;

        if self.auto_update() {
            debug!("Auto-update enabled, saving policy");
            self.adapter.save_policy(&updated)?;
        }

        *policy = updated;
        Ok(())
    }
}

impl RoleProvider for PolicyManager {
    fn get_role(&self, role_id: &str) -> Result<Arc<Role>> {
        PolicyManager::get_role(self, role_id)
    }
}

impl std::fmt::Debug for PolicyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyManager")
            .field("auto_update", &self.auto_update())
            .field("policy", &*self.policy.read())
            .finish()
    }
}

fn insert_role(policy: &mut PolicyDefinition, mut role: Role) -> Result<()> {
    role.apply_presets(&policy.permission_presets)?;
    policy.roles.insert(role.id.clone(), Arc::new(role));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct RecordingAdapter {
        policy: PolicyDefinition,
        saves: AtomicUsize,
        fail_saves: bool,
    }

    impl StorageAdapter for RecordingAdapter {
        fn load_policy(&self) -> Result<PolicyDefinition> {
            Ok(self.policy.clone())
        }

        fn save_policy(&self, _policy: &PolicyDefinition) -> Result<()> {
            if self.fail_saves {
                return Err(AuthzError::storage("disk full"));
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn basic_policy() -> PolicyDefinition {
        PolicyDefinition::new()
            .with_preset(PermissionPreset::new("readAll", "read"))
            .with_role(
                Role::new("User")
                    .with_grant("Doc", Permission::new("read"))
                    .with_grant("Doc", Permission::new("create")),
            )
    }

    fn manager(auto_update: bool) -> (Arc<RecordingAdapter>, PolicyManager) {
        let adapter = Arc::new(RecordingAdapter {
            policy: basic_policy(),
            ..Default::default()
        });
        let manager = PolicyManager::new(adapter.clone(), PolicyManagerConfig { auto_update }).unwrap();
        (adapter, manager)
    }

    #[test]
    fn test_default_config_enables_auto_update() {
        assert!(PolicyManagerConfig::default().auto_update);
    }

    #[test]
    fn test_new_applies_presets() {
        let policy = PolicyDefinition::new()
            .with_preset(PermissionPreset::new("readAll", "read"))
            .with_role(Role::new("User").with_grant("Doc", Permission::from_preset("readAll")));
        let adapter = Arc::new(RecordingAdapter {
            policy,
            ..Default::default()
        });

        let manager = PolicyManager::new(adapter, PolicyManagerConfig::default()).unwrap();
        let role = manager.get_role("User").unwrap();

        assert_eq!(role.grants["Doc"][0].action, "read");
    }

    #[test]
    fn test_new_fails_on_unknown_preset() {
        let policy = PolicyDefinition::new()
            .with_role(Role::new("User").with_grant("Doc", Permission::from_preset("missing")));
        let adapter = Arc::new(RecordingAdapter {
            policy,
            ..Default::default()
        });

        assert!(matches!(
            PolicyManager::new(adapter, PolicyManagerConfig::default()),
            Err(AuthzError::PermissionPresetNotFound(_))
        ));
    }

    #[test]
    fn test_role_crud() {
        let (adapter, manager) = manager(true);

        assert!(matches!(
            manager.add_role(Role::new("User")),
            Err(AuthzError::RoleAlreadyExists(_))
        ));
        assert!(matches!(
            manager.update_role(Role::new("Admin")),
            Err(AuthzError::RoleNotFound(_))
        ));
        assert_eq!(adapter.saves.load(Ordering::SeqCst), 0);

        manager.add_role(Role::new("Admin").with_parent("User")).unwrap();
        manager
            .update_role(Role::new("Admin").with_description("Administrator"))
            .unwrap();
        manager.upsert_role(Role::new("Guest")).unwrap();
        assert_eq!(adapter.saves.load(Ordering::SeqCst), 3);

        let admin = manager.get_role("Admin").unwrap();
        assert_eq!(admin.description.as_deref(), Some("Administrator"));
        assert!(admin.parents.is_empty());

        manager.delete_role("Guest").unwrap();
        assert!(matches!(
            manager.delete_role("Guest"),
            Err(AuthzError::RoleNotFound(_))
        ));
        assert!(manager.get_role("Guest").is_err());
    }

    #[test]
    fn test_add_permission() {
        let (adapter, manager) = manager(false);

        assert!(matches!(
            manager.add_permission("Nobody", "Doc", Permission::new("update")),
            Err(AuthzError::RoleNotFound(_))
        ));

        manager
            .add_permission("User", "Report", Permission::new("create"))
            .unwrap();
        assert_eq!(adapter.saves.load(Ordering::SeqCst), 0);

        manager.enable_auto_update();
        manager
            .add_permission("User", "Report", Permission::from_preset("readAll"))
            .unwrap();
        assert_eq!(adapter.saves.load(Ordering::SeqCst), 1);

        let role = manager.get_role("User").unwrap();
        let actions: Vec<&str> = role.grants["Report"].iter().map(|p| p.action.as_str()).collect();
        assert_eq!(actions, vec!["create", "read"]);

        assert!(matches!(
            manager.add_permission("User", "Report", Permission::from_preset("incorrect")),
            Err(AuthzError::PermissionPresetNotFound(_))
        ));
    }

    #[test]
    fn test_delete_permission() {
        let (adapter, manager) = manager(true);

        assert!(matches!(
            manager.delete_permission("Nobody", "Doc", "create"),
            Err(AuthzError::RoleNotFound(_))
        ));
        assert_eq!(adapter.saves.load(Ordering::SeqCst), 0);

        manager.delete_permission("User", "Doc", "create").unwrap();
        assert_eq!(manager.get_role("User").unwrap().grants["Doc"].len(), 1);

        manager.delete_permission("User", "Doc", "incorrect").unwrap();
        assert_eq!(manager.get_role("User").unwrap().grants["Doc"].len(), 1);
    }

    #[test]
    fn test_preset_crud() {
        let (_adapter, manager) = manager(false);

        assert!(matches!(
            manager.add_permission_preset(PermissionPreset::new("readAll", "read")),
            Err(AuthzError::PermissionPresetAlreadyExists(_))
        ));
        assert!(matches!(
            manager.update_permission_preset(PermissionPreset::new("missing", "read")),
            Err(AuthzError::PermissionPresetNotFound(_))
        ));

        manager
            .add_permission_preset(PermissionPreset::new("writeAll", "write"))
            .unwrap();
        manager
            .update_permission_preset(PermissionPreset::new("writeAll", "update"))
            .unwrap();
        manager
            .upsert_permission_preset(PermissionPreset::new("deleteAll", "delete"))
            .unwrap();

        assert_eq!(manager.get_permission_preset("writeAll").unwrap().action, "update");
        assert_eq!(manager.policy().permission_presets.len(), 3);

        manager.delete_permission_preset("deleteAll").unwrap();
        assert!(matches!(
            manager.get_permission_preset("deleteAll"),
            Err(AuthzError::PermissionPresetNotFound(_))
        ));
    }

    #[test]
    fn test_failed_save_keeps_policy() {
        let adapter = Arc::new(RecordingAdapter {
            policy: basic_policy(),
            fail_saves: true,
            ..Default::default()
        });
        let manager = PolicyManager::new(adapter, PolicyManagerConfig::default()).unwrap();

        assert!(matches!(
            manager.add_role(Role::new("Admin")),
            Err(AuthzError::Storage(_))
        ));
        assert!(manager.get_role("Admin").is_err());
        assert!(manager.save_policy().is_err());
    }

    #[test]
    fn test_toggle_auto_update() {
        let (_adapter, manager) = manager(true);

        assert!(manager.auto_update());
        manager.disable_auto_update();
        assert!(!manager.auto_update());
        manager.enable_auto_update();
        assert!(manager.auto_update());
    }
}
