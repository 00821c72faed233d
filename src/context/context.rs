//! Immutable per-subscription metadata
//!
//! A [`Context`] is supplied by the caller at subscribe time and may be retained
//! by a producer for the lifetime of the subscription (for admission, routing or
//! filtering decisions). Keys are non-empty strings and values are JSON values
//! other than `null`; both rules are enforced when the context is built, never
//! lazily at lookup time.

use crate::context::error::{ContextError, ContextResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Immutable key/value metadata attached to a subscription
///
/// Cloning is cheap: the underlying mapping is shared.
///
/// # Example
///
/// ```rust
/// use reactive::context::Context;
/// use serde_json::json;
///
/// let ctx = Context::from_pairs(&[("tenant", json!("acme")), ("limit", json!(10))]).unwrap();
/// assert_eq!(ctx.get("tenant").unwrap(), &json!("acme"));
/// assert!(ctx.get("missing").is_err());
/// ```
#[derive(Clone, Default, PartialEq)]
pub struct Context {
    entries: Arc<BTreeMap<String, Value>>,
}

impl Context {
    /// Context with no entries
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a context from a list of key/value pairs
    ///
    /// Duplicate keys are rejected rather than silently overwritten.
    pub fn from_pairs(pairs: &[(&str, Value)]) -> ContextResult<Self> {
        let mut entries = BTreeMap::new();
        for (key, value) in pairs {
            Self::validate(key, value)?;
            if entries.insert((*key).to_string(), value.clone()).is_some() {
                return Err(ContextError::invalid(format!(
                    "duplicate context key '{}'",
                    key
                )));
            }
        }
        Ok(Self {
            entries: Arc::new(entries),
        })
    }

    /// Build a context from an associative structure
    ///
    /// Any sequence of entries is accepted; a key seen twice is rejected as in
    /// [`from_pairs`](Self::from_pairs).
    pub fn from_map<I, K>(map: I) -> ContextResult<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut entries = BTreeMap::new();
        for (key, value) in map {
            let key = key.into();
            Self::validate(&key, &value)?;
            if entries.contains_key(&key) {
                return Err(ContextError::invalid(format!(
                    "duplicate context key '{}'",
                    key
                )));
            }
            entries.insert(key, value);
        }
        Ok(Self {
            entries: Arc::new(entries),
        })
    }

    fn validate(key: &str, value: &Value) -> ContextResult<()> {
        if key.is_empty() {
            return Err(ContextError::invalid("context keys must not be empty"));
        }
        if value.is_null() {
            return Err(ContextError::invalid(format!(
                "context value for '{}' must not be null",
                key
            )));
        }
        Ok(())
    }

    /// Look up the value associated with `key`
    ///
    /// Absent keys fail with [`ContextError::NotFound`].
    pub fn get(&self, key: &str) -> ContextResult<&Value> {
        self.entries
            .get(key)
            .ok_or_else(|| ContextError::NotFound {
                key: key.to_string(),
            })
    }

    /// Look up and decode the value associated with `key`
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> ContextResult<T> {
        let value = self.get(key)?;
        serde_json::from_value(value.clone()).map_err(|e| ContextError::Mismatch {
            key: key.to_string(),
            expected: std::any::type_name::<T>().to_string(),
            message: e.to_string(),
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl TryFrom<HashMap<String, Value>> for Context {
    type Error = ContextError;

    fn try_from(map: HashMap<String, Value>) -> ContextResult<Self> {
        Self::from_map(map)
    }
}

impl TryFrom<serde_json::Map<String, Value>> for Context {
    type Error = ContextError;

    fn try_from(map: serde_json::Map<String, Value>) -> ContextResult<Self> {
        Self::from_map(map)
    }
}
