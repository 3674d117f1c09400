//! Keyword sources and ordered layering
//!
//! Keyword precedence is expressed as an explicit ordered list of candidate
//! sources queried in sequence. The first source that *contains* a key wins;
//! only absence of the key falls through to the next source.

use std::collections::HashMap;

use crate::models::{ItemRecord, Value};

/// Owned keyword map
pub type KeywordMap = HashMap<String, Value>;

/// Anything that can answer a keyword lookup
pub trait KeywordSource {
    /// Value for `key`, or `None` when the key is absent
    fn lookup(&self, key: &str) -> Option<&Value>;
}

impl KeywordSource for HashMap<String, Value> {
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

impl KeywordSource for ItemRecord {
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

/// Ordered stack of keyword sources, first hit wins
#[derive(Default)]
pub struct KeywordLayers<'a> {
    layers: Vec<&'a dyn KeywordSource>,
}

impl<'a> KeywordLayers<'a> {
    /// Create an empty stack
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Append a source with lower precedence than every source already added
    pub fn with(mut self, source: &'a dyn KeywordSource) -> Self {
        self.layers.push(source);
        self
    }

    /// Append a source in place
    pub fn push(&mut self, source: &'a dyn KeywordSource) {
        self.layers.push(source);
    }

    /// Number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether there are no layers
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl KeywordSource for KeywordLayers<'_> {
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.layers.iter().find_map(|layer| layer.lookup(key))
    }
}

/// Merge `(key, value)` candidate lists so the first occurrence of each key wins
pub fn merge_first_wins<'a, I>(candidates: I) -> KeywordMap
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    let mut merged = KeywordMap::new();
    for (key, value) in candidates {
        merged.entry(key.clone()).or_insert_with(|| value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_layer_wins() {
        let mut high = KeywordMap::new();
        high.insert("x".to_string(), Value::Integer(0));
        let mut low = KeywordMap::new();
        low.insert("x".to_string(), Value::Integer(1));
        low.insert("y".to_string(), Value::Integer(2));

        let layers = KeywordLayers::new().with(&high).with(&low);
        // A falsy value still shadows lower layers
        assert_eq!(layers.lookup("x"), Some(&Value::Integer(0)));
        assert_eq!(layers.lookup("y"), Some(&Value::Integer(2)));
        assert_eq!(layers.lookup("z"), None);
    }

    #[test]
    fn test_merge_first_wins() {
        let a = ("k".to_string(), Value::from("first"));
        let b = ("k".to_string(), Value::from("second"));
        let merged = merge_first_wins([(&a.0, &a.1), (&b.0, &b.1)]);
        assert_eq!(merged.get("k"), Some(&Value::from("first")));
    }
}
