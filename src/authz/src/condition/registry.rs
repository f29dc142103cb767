//! Condition type registry
//!
//! Maps condition type identifiers to factories building conditions from
//! their encoded parameters. The registry is an explicit object handed to the
//! policy-loading code, so independent policies (and tests) never share state.

use super::builtin::{
    EmptyCondition, EqualCondition, IsOwnerCondition, NotEmptyCondition, NotEqualCondition,
    EMPTY_CONDITION_TYPE, EQUAL_CONDITION_TYPE, IS_OWNER_CONDITION_TYPE,
    NOT_EMPTY_CONDITION_TYPE, NOT_EQUAL_CONDITION_TYPE,
};
use super::{Condition, ConditionRef};
use crate::error::{AuthzError, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Builds a condition from its encoded parameters
pub type ConditionFactory = Arc<dyn Fn(Value) -> Result<ConditionRef> + Send + Sync>;

/// Registry of condition types, additive-only
pub struct ConditionRegistry {
    factories: DashMap<String, ConditionFactory>,
}

impl ConditionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: DashMap::new(),
        }
    }

    /// Create a registry holding the built-in condition types
    pub fn with_builtins() -> Self {
        let registry = Self::new();

        registry.insert(EQUAL_CONDITION_TYPE, typed_factory::<EqualCondition>());
        registry.insert(NOT_EQUAL_CONDITION_TYPE, typed_factory::<NotEqualCondition>());
        registry.insert(EMPTY_CONDITION_TYPE, typed_factory::<EmptyCondition>());
        registry.insert(NOT_EMPTY_CONDITION_TYPE, typed_factory::<NotEmptyCondition>());
        registry.insert(IS_OWNER_CONDITION_TYPE, typed_factory::<IsOwnerCondition>());

        registry
    }

    /// Register a factory under a new type identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::ConditionTypeAlreadyExists`] if the identifier is
    /// already taken.
    pub fn register<F>(&self, condition_type: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn(Value) -> Result<ConditionRef> + Send + Sync + 'static,
    {
        match self.factories.entry(condition_type.into()) {
            Entry::Occupied(entry) => Err(AuthzError::ConditionTypeAlreadyExists(entry.key().clone())),
            Entry::Vacant(entry) => {
                debug!("Registered condition type: {}", entry.key());
                entry.insert(Arc::new(factory));
                Ok(())
            }
        }
    }

    /// Register a deserializable condition type.
    pub fn register_type<C>(&self, condition_type: impl Into<String>) -> Result<()>
    where
        C: Condition + DeserializeOwned + 'static,
    {
        let factory = typed_factory::<C>();
        self.register(condition_type, move |params| factory(params))
    }

    /// Whether a type identifier is registered
    pub fn contains(&self, condition_type: &str) -> bool {
        self.factories.contains_key(condition_type)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no types are registered
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Build a condition of the given type from its parameters.
    pub fn build(&self, condition_type: &str, params: Value) -> Result<ConditionRef> {
        // Clone the factory out so the shard lock is released before calling it.
        let factory = self
            .factories
            .get(condition_type)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AuthzError::ConditionTypeNotFound(condition_type.to_string()))?;

        factory(params)
    }

    /// Decode a condition from its policy-document form: an object with a
    /// `type` key plus the condition's own parameters.
    pub fn decode(&self, encoded: Value) -> Result<ConditionRef> {
        let Value::Object(mut params) = encoded else {
            return Err(AuthzError::InvalidPolicy(
                "Condition must be an object".to_string(),
            ));
        };

        let condition_type = match params.remove("type") {
            Some(Value::String(condition_type)) => condition_type,
            _ => {
                return Err(AuthzError::InvalidPolicy(
                    "Condition is missing its \"type\"".to_string(),
                ))
            }
        };

        self.build(&condition_type, Value::Object(params))
    }

    fn insert(&self, condition_type: &str, factory: ConditionFactory) {
        self.factories.insert(condition_type.to_string(), factory);
    }
}

impl Default for ConditionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for ConditionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<String> = self.factories.iter().map(|entry| entry.key().clone()).collect();
        types.sort();

        f.debug_struct("ConditionRegistry").field("types", &types).finish()
    }
}

fn typed_factory<C>() -> ConditionFactory
where
    C: Condition + DeserializeOwned + 'static,
{
    Arc::new(|params: Value| -> Result<ConditionRef> {
        let condition: C = serde_json::from_value(params)?;
        Ok(Arc::new(condition))
    })
}
