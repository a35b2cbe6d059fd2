//! Property tests for the store's set algebra and persistence round-trip.

use std::collections::{BTreeMap, HashSet};

use proptest::prelude::*;
use resorg::{InvariantKey, MemorySink, ResourceEntry, ResourceFile, ResourceStore};
use tempfile::TempDir;

fn name_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z][A-Za-z0-9_]{0,12}").expect("valid name regex")
}

fn value_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9 _\\-\\.,!\\?]{0,20}").expect("valid value regex")
}

fn language_strategy() -> impl Strategy<Value = String> {
    prop_oneof![Just("fr".to_string()), Just("de".to_string()), Just("ja".to_string())]
}

// name -> (value, translations)
type FileSpec = BTreeMap<String, (String, BTreeMap<String, String>)>;

fn file_spec_strategy() -> impl Strategy<Value = FileSpec> {
    prop::collection::btree_map(
        name_strategy(),
        (
            value_strategy(),
            prop::collection::btree_map(language_strategy(), value_strategy(), 0..3),
        ),
        0..6,
    )
}

fn store_spec_strategy() -> impl Strategy<Value = BTreeMap<String, FileSpec>> {
    prop::collection::btree_map(
        proptest::string::string_regex("[a-z]{1,6}\\.resx").expect("valid path regex"),
        file_spec_strategy(),
        1..4,
    )
}

fn build_store(spec: &BTreeMap<String, FileSpec>) -> ResourceStore {
    let mut store = ResourceStore::new();
    for (path, entries) in spec {
        if entries.is_empty() {
            continue;
        }
        let entries = entries
            .iter()
            .map(|(name, (value, translations))| {
                let key = InvariantKey {
                    name: name.clone(),
                    file: Some(path.clone()),
                    resource_type: None,
                    value: value.clone(),
                    comment: None,
                };
                let mut entry = ResourceEntry::new(name.clone(), key);
                entry.localized_values = translations.clone();
                entry
            })
            .collect();
        store.insert(ResourceFile::from_entries(path.clone(), entries));
    }
    store
}

proptest! {
    #[test]
    fn add_to_self_changes_nothing(spec in store_spec_strategy()) {
        let store = build_store(&spec);
        prop_assert_eq!(store.add(&store), store);
    }

    #[test]
    fn add_is_idempotent_after_first_application(
        a in store_spec_strategy(),
        b in store_spec_strategy(),
    ) {
        let a = build_store(&a);
        let b = build_store(&b);
        let once = a.add(&b);
        prop_assert_eq!(once.add(&b), once);
    }

    #[test]
    fn subtract_self_empties_the_store(spec in store_spec_strategy()) {
        let store = build_store(&spec);
        prop_assert!(store.subtract(&store).is_empty());
    }

    #[test]
    fn intersect_key_sets_commute(
        a in store_spec_strategy(),
        b in store_spec_strategy(),
    ) {
        let a = build_store(&a);
        let b = build_store(&b);
        let ab: HashSet<_> = a.intersect(&b).all_keys().into_iter().collect();
        let ba: HashSet<_> = b.intersect(&a).all_keys().into_iter().collect();
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn intersect_never_exceeds_either_operand(
        a in store_spec_strategy(),
        b in store_spec_strategy(),
    ) {
        let a = build_store(&a);
        let b = build_store(&b);
        let keys: HashSet<_> = a.intersect(&b).all_keys().into_iter().collect();
        let a_keys: HashSet<_> = a.all_keys().into_iter().collect();
        let b_keys: HashSet<_> = b.all_keys().into_iter().collect();
        prop_assert!(keys.is_subset(&a_keys));
        prop_assert!(keys.is_subset(&b_keys));
    }

    #[test]
    fn database_round_trip_preserves_the_store(spec in store_spec_strategy()) {
        let store = build_store(&spec);
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resources.db");

        let mut sink = MemorySink::new();
        store.save_atomic(&path, &mut sink).unwrap();
        // Conflicts cannot arise: every key is file-scoped with one entry.
        prop_assert!(sink.is_empty());

        let decoded = ResourceStore::read_from(&path, &mut sink).unwrap();
        prop_assert_eq!(decoded, store);
    }
}
