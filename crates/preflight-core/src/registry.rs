//! Rule registry
//!
//! Provides [`RuleRegistry`], the mapping from `(namespace, name)` to rule
//! implementations. Registration happens once at startup; afterwards the
//! registry is only read, so a shared reference can be handed to any number
//! of concurrent validation passes.

use crate::error::RegistryError;
use crate::rule::Rule;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Registry key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleKey {
    /// Namespace the rule belongs to
    pub namespace: String,
    /// Rule name
    pub name: String,
}

impl RuleKey {
    /// Create key
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Registry of named rules
#[derive(Default, Clone)]
pub struct RuleRegistry {
    rules: BTreeMap<RuleKey, Arc<dyn Rule>>,
}

impl RuleRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// Register a rule under `(namespace, name)`
    ///
    /// # Errors
    /// Returns [`RegistryError::Conflict`] if the key is taken
    pub fn register<R>(&mut self, namespace: &str, name: &str, rule: R) -> Result<(), RegistryError>
    where
        R: Rule + 'static,
    {
        self.register_shared(namespace, name, Arc::new(rule))
    }

    /// Register an already shared rule
    ///
    /// # Errors
    /// Returns [`RegistryError::Conflict`] if the key is taken
    pub fn register_shared(
        &mut self,
        namespace: &str,
        name: &str,
        rule: Arc<dyn Rule>,
    ) -> Result<(), RegistryError> {
        let key = RuleKey::new(namespace, name);
        if self.rules.contains_key(&key) {
            return Err(RegistryError::conflict(namespace, name));
        }
        tracing::trace!(%key, "registered rule");
        self.rules.insert(key, rule);
        Ok(())
    }

    /// Look up a rule by exact key
    ///
    /// # Errors
    /// Returns [`RegistryError::NotFound`] if absent
    pub fn lookup(&self, namespace: &str, name: &str) -> Result<Arc<dyn Rule>, RegistryError> {
        self.rules
            .get(&RuleKey::new(namespace, name))
            .cloned()
            .ok_or_else(|| RegistryError::not_found(namespace, name))
    }

    /// Look up in `namespace`, then in `fallback`
    ///
    /// # Errors
    /// Returns [`RegistryError::NotFound`] naming the primary namespace if
    /// neither has the rule
    pub fn resolve(
        &self,
        namespace: &str,
        name: &str,
        fallback: &str,
    ) -> Result<Arc<dyn Rule>, RegistryError> {
        self.lookup(namespace, name)
            .or_else(|err| self.lookup(fallback, name).map_err(|_| err))
    }

    /// Check if key exists
    #[inline]
    #[must_use]
    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        self.rules.contains_key(&RuleKey::new(namespace, name))
    }

    /// All registered keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &RuleKey> {
        self.rules.keys()
    }

    /// Names registered in one namespace
    #[must_use]
    pub fn names_in(&self, namespace: &str) -> Vec<&str> {
        self.rules
            .keys()
            .filter(|k| k.namespace == namespace)
            .map(|k| k.name.as_str())
            .collect()
    }

    /// Get number of registered rules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rule_count", &self.rules.len())
            .field(
                "keys",
                &self.rules.keys().map(ToString::to_string).collect::<Vec<_>>(),
            )
            .finish()
    }
}
