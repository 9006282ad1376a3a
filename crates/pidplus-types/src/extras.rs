//! [`Extras`] – the open attribute bag carried by the per-tick events.
//!
//! Handlers may attach arbitrary named values to a
//! [`BaseTerms`][crate::event::BaseTerms] event; the controller moves the bag
//! forward through [`ModifyTerms`][crate::event::ModifyTerms] and
//! [`CalculateU`][crate::event::CalculateU], so a value written at the start
//! of a tick is visible to every later stage of the same tick.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// String-keyed bag of extra event attributes.
///
/// Keys are ordered, so renderings and serializations are deterministic.
///
/// # Example
///
/// ```
/// use pidplus_types::Extras;
///
/// let mut extras = Extras::new();
/// extras.set("gain_schedule", 3);
/// assert_eq!(extras.get_f64("gain_schedule"), Some(3.0));
/// assert!(extras.get("unknown").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extras(BTreeMap<String, Value>);

impl Extras {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up `key` as a float, the most common payload in a control loop.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    /// `true` if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of stored attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when nothing has been attached.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut extras = Extras::new();
        extras.set("windup_hits", 2);
        extras.set("note", "saturated");
        assert_eq!(extras.get_f64("windup_hits"), Some(2.0));
        assert_eq!(extras.get("note").and_then(Value::as_str), Some("saturated"));
        assert_eq!(extras.len(), 2);
    }

    #[test]
    fn overwrite_replaces_value() {
        let mut extras = Extras::new();
        extras.set("phase", 1);
        extras.set("phase", 2);
        assert_eq!(extras.get_f64("phase"), Some(2.0));
        assert_eq!(extras.len(), 1);
    }

    #[test]
    fn missing_key_is_none() {
        let extras = Extras::new();
        assert!(extras.get("ghost").is_none());
        assert!(extras.get_f64("ghost").is_none());
        assert!(extras.is_empty());
    }

    #[test]
    fn iteration_is_key_ordered() {
        let mut extras = Extras::new();
        extras.set("b", 2);
        extras.set("a", 1);
        let keys: Vec<&str> = extras.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn serialization_roundtrip() {
        let mut extras = Extras::new();
        extras.set("scale", 0.5);
        let json = serde_json::to_string(&extras).unwrap();
        let back: Extras = serde_json::from_str(&json).unwrap();
        assert_eq!(extras, back);
    }
}
