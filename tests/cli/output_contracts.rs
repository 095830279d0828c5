use deckgen::avatar::{DanglingRef, OrphanFile, ReconcileReport, TopUpLine, TopUpReport};
use deckgen::merge::add_entries;
use deckgen::store::Registry;
use deckgen::tooling::format::{
    format_reconcile_report_text, format_registry_json, format_registry_text,
    format_top_up_report_text,
};
use deckgen::types::EntryKind;
use std::path::PathBuf;

fn sample_registry() -> Registry {
    let mut registry = Registry::new();
    add_entries(&mut registry, EntryKind::Noun, &["wolf", "fox"], 1, false);
    add_entries(&mut registry, EntryKind::Noun, &["dragon"], 5, false);
    add_entries(&mut registry, EntryKind::Adjective, &["angry", "sleepy"], 0, false);
    registry.sorted()
}

#[test]
fn print_json_contract() {
    let json = format_registry_json(&sample_registry()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "nouns": {"1": ["fox", "wolf"], "5": ["dragon"]},
            "adjectives": {"0": ["angry", "sleepy"]}
        })
    );
}

#[test]
fn print_text_contains_every_name_and_totals() {
    let text = format_registry_text(&sample_registry());
    for name in ["fox", "wolf", "dragon", "angry", "sleepy"] {
        assert!(text.contains(name), "missing {name}");
    }
    assert!(text.contains("3 nouns, 2 adjectives, 0 avatars"));
}

#[test]
fn clean_text_counts_removed_and_orphans() {
    let report = ReconcileReport {
        removed: vec![DanglingRef {
            noun: "fox".to_string(),
            reference: "res://assets/sprites/avatars/avatar_fox_3.png".to_string(),
        }],
        orphans: vec![OrphanFile {
            path: PathBuf::from("assets/sprites/avatars/avatar_stray.png"),
            reference: "res://assets/sprites/avatars/avatar_stray.png".to_string(),
        }],
    };
    let text = format_reconcile_report_text(&report);
    assert!(text.contains("avatar_fox_3.png"));
    assert!(text.contains("avatar_stray.png"));
    assert!(text.ends_with("1 removed, 1 orphans"));
}

#[test]
fn avatars_text_warns_about_unknown_creatures() {
    let report = TopUpReport {
        lines: vec![
            TopUpLine {
                noun: "fox".to_string(),
                generated: vec!["res://assets/sprites/avatars/avatar_fox_0.png".to_string()],
            },
            TopUpLine {
                noun: "owl".to_string(),
                generated: Vec::new(),
            },
        ],
        unknown: vec!["ghost".to_string()],
        failure: None,
    };
    let text = format_top_up_report_text(&report);
    assert!(text.contains("unknown creature ghost"));
    assert!(text.ends_with("1 avatars generated for 1 nouns"));

    let json: serde_json::Value =
        serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();
    assert!(json.get("failure").is_none());
    assert_eq!(json["unknown"], serde_json::json!(["ghost"]));
}
