//! Key/value state attached to a connection or a channel subscription.
//!
//! [`ChannelState`] remembers which keys were written since it was loaded,
//! so a reply only carries the delta. Values are JSON; on the way out each
//! changed value is encoded as a JSON string keyed by its name.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::CableError;

/// Mutable JSON key/value state with change tracking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelState {
    values: HashMap<String, serde_json::Value>,
    changed: BTreeSet<String>,
}

impl ChannelState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads state from its encoded form (each value a JSON string).
    ///
    /// Loaded keys are not considered changed.
    ///
    /// # Errors
    ///
    /// Returns [`CableError::State`] if a value is not valid JSON.
    pub fn decode(encoded: &HashMap<String, String>) -> Result<Self, CableError> {
        let mut values = HashMap::with_capacity(encoded.len());
        for (key, json) in encoded {
            let value = serde_json::from_str(json)
                .map_err(|e| CableError::State(format!("invalid value at key {key}: {e}")))?;
            values.insert(key.clone(), value);
        }
        Ok(Self {
            values,
            changed: BTreeSet::new(),
        })
    }

    /// Returns the value at `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// Writes `value` at `key` and marks it changed.
    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        let key = key.into();
        self.changed.insert(key.clone());
        self.values.insert(key, value);
    }

    /// Replaces the string at `key` with `f(current)`.
    ///
    /// # Errors
    ///
    /// Returns [`CableError::State`] if the key is missing or does not
    /// hold a string. The stored value is left untouched.
    pub fn update_string<F>(&mut self, key: &str, f: F) -> Result<(), CableError>
    where
        F: FnOnce(&str) -> String,
    {
        let current = self
            .values
            .get(key)
            .ok_or_else(|| CableError::State(format!("missing value for key: {key}")))?
            .as_str()
            .ok_or_else(|| CableError::State(format!("not a string: value at key: {key}")))?;
        let next = f(current);
        self.set(key, serde_json::Value::String(next));
        Ok(())
    }

    /// Replaces the number at `key` with `f(current)`.
    ///
    /// # Errors
    ///
    /// Returns [`CableError::State`] if the key is missing, does not hold
    /// a number, or `f` produces a non-finite value.
    pub fn update_f64<F>(&mut self, key: &str, f: F) -> Result<(), CableError>
    where
        F: FnOnce(f64) -> f64,
    {
        let current = self
            .values
            .get(key)
            .ok_or_else(|| CableError::State(format!("missing value for key: {key}")))?
            .as_f64()
            .ok_or_else(|| CableError::State(format!("not a number: value at key: {key}")))?;
        let next = serde_json::Number::from_f64(f(current))
            .ok_or_else(|| CableError::State(format!("non-finite result at key: {key}")))?;
        self.set(key, serde_json::Value::Number(next));
        Ok(())
    }

    /// Returns `true` if any key was written since load.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Encodes the changed keys only.
    ///
    /// # Errors
    ///
    /// Returns [`CableError::Serialization`] if a value cannot be encoded.
    pub fn changes(&self) -> Result<BTreeMap<String, String>, CableError> {
        let mut out = BTreeMap::new();
        for key in &self.changed {
            if let Some(value) = self.values.get(key) {
                out.insert(key.clone(), serde_json::to_string(value)?);
            }
        }
        Ok(out)
    }
}
