use chrono::NaiveDate;
use deckgen::merge::add_entries;
use deckgen::store::{BackupManager, Registry, RegistryStore, SaveOptions};
use deckgen::types::EntryKind;
use std::fs;
use tempfile::TempDir;

fn store_in(temp: &TempDir, max_backups: usize) -> RegistryStore {
    RegistryStore::new(temp.path().join("decks/generator/data.json"))
        .with_backups(BackupManager::new(temp.path().join("backups"), max_backups))
}

#[test]
fn retention_keeps_exactly_the_newest_backups() {
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp, 3);
    let mut registry = Registry::new();

    // Save k writes k + 1 nouns; its backup holds the k nouns from the save before.
    for k in 0..8 {
        add_entries(&mut registry, EntryKind::Noun, &[format!("noun{}", k)], 0, false);
        store.save(&registry, SaveOptions::default()).unwrap();
    }

    let backups = store.backups().unwrap().list(store.path()).unwrap();
    assert_eq!(backups.len(), 3);
    let kept: Vec<usize> = backups
        .iter()
        .map(|b| {
            RegistryStore::new(&b.path)
                .load()
                .unwrap()
                .nouns
                .len()
        })
        .collect();
    assert_eq!(kept, vec![5, 6, 7]);
}

#[test]
fn first_save_without_existing_file_makes_no_backup() {
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp, 5);
    let outcome = store.save(&Registry::new(), SaveOptions::default()).unwrap();
    assert!(outcome.backup.is_none());
    assert!(store.backups().unwrap().list(store.path()).unwrap().is_empty());
}

#[test]
fn same_second_backups_never_overwrite() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("data.json");
    let manager = BackupManager::new(temp.path().join("backups"), 10);
    let at = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();

    let mut created = Vec::new();
    for i in 0..3 {
        fs::write(&source, format!("{{\"version\": {}}}", i)).unwrap();
        created.push(manager.backup_at(&source, at).unwrap().created);
    }

    let names: Vec<String> = created
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "data.20240301-120000.json".to_string(),
            "data.20240301-120000-1.json".to_string(),
            "data.20240301-120000-2.json".to_string(),
        ]
    );
    for (i, path) in created.iter().enumerate() {
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            format!("{{\"version\": {}}}", i)
        );
    }
}

#[test]
fn pruning_ignores_unrelated_files() {
    let temp = TempDir::new().unwrap();
    let backup_dir = temp.path().join("backups");
    fs::create_dir_all(&backup_dir).unwrap();
    let unrelated = [
        "notes.txt",
        "data.json",
        "data.old.json",
        "other.20240101-000000.json",
    ];
    for name in unrelated {
        fs::write(backup_dir.join(name), b"keep me").unwrap();
    }

    let store = RegistryStore::new(temp.path().join("data.json"))
        .with_backups(BackupManager::new(&backup_dir, 1));
    let mut registry = Registry::new();
    for k in 0..4 {
        add_entries(&mut registry, EntryKind::Adjective, &[format!("adj{}", k)], 1, false);
        store.save(&registry, SaveOptions::default()).unwrap();
    }

    assert_eq!(store.backups().unwrap().list(store.path()).unwrap().len(), 1);
    for name in unrelated {
        assert!(backup_dir.join(name).exists(), "{} was pruned", name);
    }
}

#[test]
fn no_backup_option_leaves_backup_dir_untouched() {
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp, 5);
    let options = SaveOptions {
        backup: false,
        sort: true,
    };
    store.save(&Registry::new(), options).unwrap();
    store.save(&Registry::new(), options).unwrap();
    assert!(!temp.path().join("backups").exists());
}
