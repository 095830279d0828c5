use deckgen::store::{AdjEntry, EntryTable, NounEntry, Registry, RegistryStore, SaveOptions};
use deckgen::error::ApiError;
use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;

fn arb_registry() -> impl Strategy<Value = Registry> {
    let nouns = prop::collection::vec(
        (
            "[a-z][a-z ]{0,10}",
            0u32..6,
            prop::collection::vec("avatar_[a-z0-9]{1,6}\\.png", 0..3),
        ),
        0..12,
    );
    let adjectives = prop::collection::vec(("[a-z]{1,10}", 0u32..6), 0..12);
    (nouns, adjectives).prop_map(|(nouns, adjectives)| {
        let nouns: EntryTable<NounEntry> = nouns
            .into_iter()
            .map(|(key, level, files)| {
                let mut entry = NounEntry::new(level);
                for file in files {
                    entry.add_avatar(format!("res://assets/sprites/avatars/{}", file));
                }
                (key, entry)
            })
            .collect();
        let adjectives: EntryTable<AdjEntry> = adjectives
            .into_iter()
            .map(|(key, level)| (key, AdjEntry::new(level)))
            .collect();
        Registry { nouns, adjectives }
    })
}

fn unsorted() -> SaveOptions {
    SaveOptions {
        backup: false,
        sort: false,
    }
}

proptest! {
    #[test]
    fn save_then_load_preserves_content_and_order(registry in arb_registry()) {
        let temp = TempDir::new().unwrap();
        let store = RegistryStore::new(temp.path().join("data.json"));
        store.save(&registry, unsorted()).unwrap();
        let loaded = store.load().unwrap();
        prop_assert_eq!(&loaded, &registry);
        prop_assert_eq!(
            loaded.nouns.keys().collect::<Vec<_>>(),
            registry.nouns.keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn sort_is_idempotent_and_strictly_ascending(registry in arb_registry()) {
        let once = registry.sorted();
        let twice = once.sorted();
        prop_assert_eq!(&once, &twice);

        let nouns: Vec<(u32, &str)> = once.nouns.iter().map(|(k, e)| (e.level, k)).collect();
        prop_assert!(nouns.windows(2).all(|w| w[0] < w[1]));
        let adjectives: Vec<(u32, &str)> =
            once.adjectives.iter().map(|(k, e)| (e.level, k)).collect();
        prop_assert!(adjectives.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn saved_file_uses_three_space_indent_and_canonical_order() {
    let temp = TempDir::new().unwrap();
    let store = RegistryStore::new(temp.path().join("data.json"));
    let mut registry = Registry::new();
    registry.nouns.insert("wolf".to_string(), NounEntry::new(2));
    registry.nouns.insert("fox".to_string(), NounEntry::new(1));
    registry.adjectives.insert("angry".to_string(), AdjEntry::new(0));

    store
        .save(
            &registry,
            SaveOptions {
                backup: false,
                sort: true,
            },
        )
        .unwrap();
    let text = fs::read_to_string(store.path()).unwrap();
    assert!(text.starts_with("{\n   \"nouns\": {\n      \"fox\": {"));
    assert!(text.ends_with("}\n"));
    assert!(text.find("\"fox\"").unwrap() < text.find("\"wolf\"").unwrap());
}

#[test]
fn load_tolerates_loose_documents() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data.json");
    fs::write(
        &path,
        r#"{
   "nouns": {
      "fox": {"level": "2", "avatars": ["res://a/x.png", "res://a/x.png"]},
      "owl": {"level": 1, "avatars": null}
   },
   "adjectives": {"angry": {"level": 0}}
}"#,
    )
    .unwrap();

    let registry = RegistryStore::new(&path).load().unwrap();
    let fox = registry.nouns.get("fox").unwrap();
    assert_eq!(fox.level, 2);
    assert_eq!(fox.avatars, vec!["res://a/x.png".to_string()]);
    assert!(registry.nouns.get("owl").unwrap().avatars.is_empty());
}

#[test]
fn load_errors_are_distinguished() {
    let temp = TempDir::new().unwrap();
    let missing = RegistryStore::new(temp.path().join("absent.json"));
    assert!(matches!(missing.load(), Err(ApiError::NotFound(_))));

    let path = temp.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        RegistryStore::new(&path).load(),
        Err(ApiError::Format { .. })
    ));

    fs::write(&path, r#"{"nouns": {"fox": {"level": -1}}, "adjectives": {}}"#).unwrap();
    assert!(matches!(
        RegistryStore::new(&path).load(),
        Err(ApiError::Format { .. })
    ));

    fs::write(&path, r#"{"nouns": {}}"#).unwrap();
    assert!(matches!(
        RegistryStore::new(&path).load(),
        Err(ApiError::Format { .. })
    ));
}
