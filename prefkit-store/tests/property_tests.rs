//! Property-based tests for prefkit-store
//!
//! Uses proptest to check that saved stores reopen with identical contents

use prefkit_store::{
    validate_name, EncryptionAlgorithm, EncryptionOptions, KdfParams, PreferenceValue, Preferences,
};
use proptest::prelude::*;
use std::collections::HashMap;
use tempfile::TempDir;

const FAST: EncryptionOptions = EncryptionOptions {
    kdf: KdfParams {
        memory_kib: 256,
        iterations: 1,
        lanes: 1,
    },
    algorithm: EncryptionAlgorithm::ChaCha20Poly1305,
};

// ============================================================================
// Strategies
// ============================================================================

fn value_strategy() -> impl Strategy<Value = PreferenceValue> {
    prop_oneof![
        any::<i32>().prop_map(PreferenceValue::Int32),
        any::<bool>().prop_map(PreferenceValue::Bool),
        ".{0,64}".prop_map(PreferenceValue::Str),
        prop::collection::vec(any::<u8>(), 0..256).prop_map(PreferenceValue::Bytes),
    ]
}

fn entries_strategy() -> impl Strategy<Value = HashMap<String, PreferenceValue>> {
    prop::collection::hash_map(".{0,24}", value_strategy(), 0..16)
}

// ============================================================================
// Persistence Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: a saved plain store reopens with the same entries
    #[test]
    fn prop_plain_store_round_trip(entries in entries_strategy()) {
        let dir = TempDir::new().unwrap();
        let mut prefs = Preferences::open_in(dir.path(), "prop").unwrap();
        for (key, value) in &entries {
            prefs.put(key, value.clone());
        }
        prefs.save().unwrap();
        drop(prefs);

        let reopened = Preferences::open_in(dir.path(), "prop").unwrap();
        prop_assert_eq!(reopened.len(), entries.len());
        for (key, value) in &entries {
            prop_assert_eq!(reopened.get(key), Some(value));
        }
    }

    /// Property: a saved encrypted store reopens with the same entries
    #[test]
    fn prop_encrypted_store_round_trip(
        entries in entries_strategy(),
        password in ".{0,32}",
    ) {
        let dir = TempDir::new().unwrap();
        let mut prefs = Preferences::open_encrypted_with(dir.path(), "prop", &password, FAST).unwrap();
        for (key, value) in &entries {
            prefs.put(key, value.clone());
        }
        prefs.save().unwrap();
        drop(prefs);

        let reopened = Preferences::open_encrypted_with(dir.path(), "prop", &password, FAST).unwrap();
        prop_assert_eq!(reopened.len(), entries.len());
        for (key, value) in &entries {
            prop_assert_eq!(reopened.get(key), Some(value));
        }
    }

    /// Property: the last write to a key wins, whatever its type
    #[test]
    fn prop_last_write_wins(values in prop::collection::vec(value_strategy(), 1..8)) {
        let dir = TempDir::new().unwrap();
        let mut prefs = Preferences::open_in(dir.path(), "prop").unwrap();
        for value in &values {
            prefs.put("key", value.clone());
        }
        prop_assert_eq!(prefs.len(), 1);
        prop_assert_eq!(prefs.get("key"), values.last());
    }
}

// ============================================================================
// Name Validation Properties
// ============================================================================

proptest! {
    /// Property: names drawn from the allowed alphabet are accepted
    #[test]
    fn prop_allowed_names_accepted(name in "[A-Za-z0-9_-]{1,40}") {
        prop_assert!(validate_name(&name).is_ok());
    }

    /// Property: any disallowed character rejects the name
    #[test]
    fn prop_disallowed_character_rejected(
        prefix in "[A-Za-z0-9_-]{0,10}",
        bad in "[^A-Za-z0-9_-]",
        suffix in "[A-Za-z0-9_-]{0,10}",
    ) {
        let name = format!("{prefix}{bad}{suffix}");
        prop_assert!(validate_name(&name).is_err());
    }
}
