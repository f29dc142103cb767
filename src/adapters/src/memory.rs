//! In-memory policy storage

use parking_lot::RwLock;
use tracing::debug;
use warden_authz::{PolicyDefinition, Result, StorageAdapter};

/// Keeps the policy in memory; saving replaces the stored copy
#[derive(Debug, Default)]
pub struct InMemoryAdapter {
    policy: RwLock<PolicyDefinition>,
}

impl InMemoryAdapter {
    /// Create an adapter holding the given policy
    pub fn new(policy: PolicyDefinition) -> Self {
        Self {
            policy: RwLock::new(policy),
        }
    }

    /// Copy of the stored policy
    pub fn stored(&self) -> PolicyDefinition {
        self.policy.read().clone()
    }
}

impl StorageAdapter for InMemoryAdapter {
    fn load_policy(&self) -> Result<PolicyDefinition> {
        Ok(self.policy.read().clone())
    }

    fn save_policy(&self, policy: &PolicyDefinition) -> Result<()> {
        debug!(roles = policy.roles.len(), "Storing policy in memory");
        *self.policy.write() = policy.clone();
        Ok(())
    }
}
