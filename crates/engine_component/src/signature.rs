//! Flat string-keyed configuration maps.
//!
//! Scenes and entity types are both described by a [`Signature`]. Nested
//! documents are flattened into dotted keys (`x.speed`) before they get here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::eval::eval;
use crate::param::ParamValue;
use crate::selector::Selector;

/// Reserved entity key listing the selectors to attach.
pub const ATTACH_KEY: &str = "attach";

/// Reserved entity key holding the entity type name.
pub const NAME_KEY: &str = "name";

/// A flat `key -> raw value` map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature {
    entries: BTreeMap<String, String>,
}

impl Signature {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// The raw value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Evaluates `key` as `T`, falling back to `default` when the key is
    /// missing or does not parse.
    #[must_use]
    pub fn eval<T: ParamValue>(&self, key: &str, default: T) -> T {
        eval(self.get(key), default)
    }

    /// The ordered selectors of the `attach` key.
    #[must_use]
    pub fn attach(&self) -> Vec<Selector> {
        self.get(ATTACH_KEY).map(Selector::parse_list).unwrap_or_default()
    }

    /// The entity type name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.get(NAME_KEY)
    }

    /// Copies every entry of `defaults` whose key is not present yet.
    pub fn merge_defaults(&mut self, defaults: &Signature) {
        for (key, value) in &defaults.entries {
            self.entries
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Signature {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_parses_selectors_in_order() {
        let sig = Signature::new().with("attach", "spatial kinematics/kinematic2d");
        let attach = sig.attach();
        assert_eq!(attach.len(), 2);
        assert_eq!(attach[0], Selector::family_only("spatial"));
        assert_eq!(attach[1].kind(), "kinematic2d");
        assert!(Signature::new().attach().is_empty());
    }

    #[test]
    fn test_merge_defaults_keeps_own_keys() {
        let mut sig = Signature::new().with("x", "5");
        let globals = Signature::new().with("x", "1").with("gravity", "9.8");
        sig.merge_defaults(&globals);
        assert_eq!(sig.get("x"), Some("5"));
        assert_eq!(sig.get("gravity"), Some("9.8"));
    }

    #[test]
    fn test_eval_falls_back() {
        let sig: Signature = [("speed", "2.5"), ("bad", "fast")].into_iter().collect();
        assert_eq!(sig.eval("speed", 0.0f32), 2.5);
        assert_eq!(sig.eval("bad", 1.0f32), 1.0);
        assert_eq!(sig.eval("missing", 7i32), 7);
    }

    #[test]
    fn test_serde_is_a_plain_map() {
        let sig: Signature = serde_json::from_str(r#"{"attach":"spatial","x":"1"}"#).unwrap();
        assert_eq!(sig.len(), 2);
        assert_eq!(sig.name(), None);
        assert_eq!(serde_json::to_string(&sig).unwrap(), r#"{"attach":"spatial","x":"1"}"#);
    }
}
