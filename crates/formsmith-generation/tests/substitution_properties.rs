//! Property-based tests for placeholder substitution
//!
//! Substitution rescans after every replacement and gives up after a fixed
//! number of replacements, so these properties pin down both the happy path
//! and the runaway bound.

use proptest::prelude::*;

use formsmith_generation::keywords::KeywordMap;
use formsmith_generation::{GenerationError, SubstitutionEngine, Value, MAX_REPLACEMENTS};

/// Strategy for keyword names
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,10}".prop_map(|s| s.to_string())
}

/// Strategy for plain text without placeholder glyphs
fn plain_text_strategy() -> impl Strategy<Value = String> {
    "[^§‡]{0,40}".prop_map(|s| s.to_string())
}

fn single(key: &str, value: Value) -> KeywordMap {
    let mut map = KeywordMap::new();
    map.insert(key.to_string(), value);
    map
}

proptest! {
    /// Property: text without placeholders is returned unchanged
    #[test]
    fn prop_plain_text_is_unchanged(text in plain_text_strategy()) {
        let engine = SubstitutionEngine::default();
        let result = engine.substitute(&text, &KeywordMap::new(), "prop").unwrap();
        prop_assert_eq!(result, text);
    }

    /// Property: a text keyword is inserted verbatim between its surroundings
    #[test]
    fn prop_text_values_are_inserted_verbatim(
        key in key_strategy(),
        value in plain_text_strategy(),
        before in plain_text_strategy(),
        after in plain_text_strategy(),
    ) {
        let engine = SubstitutionEngine::default();
        let map = single(&key, Value::Text(value.clone()));
        let text = format!("{}§{}§{}", before, key, after);
        let result = engine.substitute(&text, &map, "prop").unwrap();
        prop_assert_eq!(result, format!("{}{}{}", before, value, after));
    }

    /// Property: missing keywords never fail, they vanish
    #[test]
    fn prop_missing_keywords_vanish(key in key_strategy(), around in plain_text_strategy()) {
        let engine = SubstitutionEngine::default();
        let text = format!("{}§{}§{}", around, key, around);
        let result = engine.substitute(&text, &KeywordMap::new(), "prop").unwrap();
        prop_assert_eq!(result, format!("{}{}", around, around));
    }

    /// Property: a self-referencing keyword fails after exactly the bound
    #[test]
    fn prop_self_reference_is_runaway(key in key_strategy()) {
        let engine = SubstitutionEngine::default();
        let placeholder = format!("§{}§", key);
        let map = single(&key, Value::Text(placeholder.clone()));
        match engine.substitute(&placeholder, &map, "prop") {
            Err(GenerationError::RunawayExpansion { iterations, .. }) => {
                prop_assert_eq!(iterations, MAX_REPLACEMENTS);
            }
            other => prop_assert!(false, "expected runaway expansion, got {:?}", other),
        }
    }

    /// Property: up to the bound, every placeholder is replaced; beyond it the
    /// call fails
    #[test]
    fn prop_replacement_bound(count in 0usize..40, key in key_strategy()) {
        let engine = SubstitutionEngine::default();
        let map = single(&key, Value::Integer(7));
        let text = format!("§{}§ ", key).repeat(count);
        let result = engine.substitute(&text, &map, "prop");
        if count <= MAX_REPLACEMENTS {
            prop_assert_eq!(result.unwrap(), "7 ".repeat(count));
        } else {
            prop_assert!(result.is_err());
        }
    }

    /// Property: integers render with thousands separators by default
    #[test]
    fn prop_integers_are_grouped(n in 0i64..1_000_000_000_000) {
        let engine = SubstitutionEngine::default();
        let map = single("n", Value::Integer(n));
        let result = engine.substitute("§n§", &map, "prop").unwrap();
        prop_assert_eq!(result.replace(',', ""), n.to_string());
        prop_assert!(result.split(',').skip(1).all(|group| group.len() == 3));
    }
}

#[test]
fn test_documented_examples() {
    let engine = SubstitutionEngine::default();
    let map = single("total", Value::Integer(1234));
    assert_eq!(engine.substitute("§total§円", &map, "t").unwrap(), "1,234円");

    let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
    let map = single("d", Value::Date(date));
    assert_eq!(engine.substitute("§d‡%Y%m%d§", &map, "t").unwrap(), "20240105");
}
