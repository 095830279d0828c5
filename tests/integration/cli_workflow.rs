use crate::integration::support::{RecordingGenerator, TouchFormatter};
use deckgen::avatar::AvatarLayout;
use deckgen::config::DeckConfig;
use deckgen::error::ApiError;
use deckgen::tooling::cli::{CliContext, Commands};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn workspace() -> (CliContext, TempDir) {
    let temp = TempDir::new().unwrap();
    let mut config = DeckConfig::default();
    config.registry.backup_dir = Some(PathBuf::from(".backups"));
    config.registry.max_backups = 2;
    let ctx = CliContext::with_config(temp.path().to_path_buf(), config).unwrap();
    ctx.execute(&Commands::Init).unwrap();
    (ctx, temp)
}

fn add(kind: &str, value: &str, level: u32, force: bool) -> Commands {
    Commands::Add {
        kind: kind.to_string(),
        value: value.to_string(),
        level,
        force,
        format: "text".to_string(),
    }
}

fn layout(ctx: &CliContext) -> AvatarLayout {
    let paths = ctx.paths();
    AvatarLayout::new(
        &paths.avatar_dir,
        &paths.raw_dir,
        ctx.config().registry.resource_prefix.clone(),
    )
}

#[test]
fn duplicate_add_without_force_keeps_level() {
    let (ctx, _temp) = workspace();
    ctx.execute(&add("noun", "fox", 1, false)).unwrap();

    let temp_list = TempDir::new().unwrap();
    let list = temp_list.path().join("creatures.json");
    fs::write(&list, r#"["fox", "fox"]"#).unwrap();
    let output = ctx
        .execute(&Commands::Add {
            kind: "noun".to_string(),
            value: list.to_string_lossy().into_owned(),
            level: 2,
            force: false,
            format: "json".to_string(),
        })
        .unwrap();

    let report: serde_json::Value = serde_json::from_str(&output).unwrap();
    let lines = report["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    for line in lines {
        assert_eq!(
            line["outcome"],
            serde_json::json!({"skipped_exists": {"existing_level": 1}})
        );
    }
    let registry = ctx.store().load().unwrap();
    assert_eq!(registry.nouns.get("fox").unwrap().level, 1);
}

#[test]
fn force_changes_only_the_level() {
    let (ctx, _temp) = workspace();
    ctx.execute(&add("noun", "fox", 1, false)).unwrap();

    let mut registry = ctx.store().load().unwrap();
    registry
        .nouns
        .get_mut("fox")
        .unwrap()
        .add_avatar("res://assets/sprites/avatars/avatar_fox_0.png".to_string());
    ctx.store()
        .save(&registry, deckgen::store::SaveOptions::default())
        .unwrap();

    ctx.execute(&add("noun", "fox", 4, true)).unwrap();
    let fox = ctx.store().load().unwrap().nouns.get("fox").cloned().unwrap();
    assert_eq!(fox.level, 4);
    assert_eq!(fox.avatars.len(), 1);
}

#[test]
fn saves_rotate_backups_within_retention() {
    let (ctx, temp) = workspace();
    for (i, name) in ["fox", "owl", "bat", "elk"].iter().enumerate() {
        ctx.execute(&add("noun", name, i as u32, false)).unwrap();
    }
    let backups = ctx.execute(&Commands::Backups {
        format: "json".to_string(),
    });
    let rows: serde_json::Value = serde_json::from_str(&backups.unwrap()).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 2);
    assert!(temp.path().join(".backups").is_dir());
}

#[test]
fn no_backup_context_skips_backups() {
    let (ctx, temp) = workspace();
    let ctx = ctx.without_backups();
    ctx.execute(&add("adjective", "angry", 0, false)).unwrap();
    ctx.execute(&add("adjective", "sleepy", 0, false)).unwrap();
    assert!(!temp.path().join(".backups").exists());
}

#[test]
fn clean_removes_dangling_and_reports_orphans() {
    let (ctx, _temp) = workspace();
    ctx.execute(&add("noun", "fox", 1, false)).unwrap();
    let layout = layout(&ctx);
    fs::create_dir_all(&layout.avatar_dir).unwrap();
    fs::write(layout.avatar_dir.join("avatar_fox_0.png"), b"png").unwrap();
    fs::write(layout.avatar_dir.join("avatar_lost.png"), b"png").unwrap();

    let mut registry = ctx.store().load().unwrap();
    let fox = registry.nouns.get_mut("fox").unwrap();
    fox.add_avatar(layout.reference_for("avatar_fox_0.png"));
    fox.add_avatar(layout.reference_for("avatar_fox_9.png"));
    ctx.store()
        .save(&registry, deckgen::store::SaveOptions::default())
        .unwrap();

    let output = ctx
        .execute(&Commands::Clean {
            format: "json".to_string(),
        })
        .unwrap();
    let report: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(report["removed"].as_array().unwrap().len(), 1);
    assert_eq!(report["orphans"].as_array().unwrap().len(), 1);

    let cleaned = ctx.store().load().unwrap();
    assert_eq!(
        cleaned.nouns.get("fox").unwrap().avatars,
        vec![layout.reference_for("avatar_fox_0.png")]
    );

    let again = ctx
        .execute(&Commands::Clean {
            format: "text".to_string(),
        })
        .unwrap();
    assert!(again.contains("0 removed, 1 orphans"));
}

#[test]
fn top_up_saves_progress_before_reporting_failure() {
    let (ctx, _temp) = workspace();
    ctx.execute(&add("noun", "fox", 1, false)).unwrap();
    ctx.execute(&add("noun", "owl", 2, false)).unwrap();
    let layout = layout(&ctx);
    let generator = RecordingGenerator::new(&layout.raw_dir).fail_with(
        "owl",
        vec![ApiError::ProviderNotConfigured("no key".to_string())],
    );
    let formatter = TouchFormatter::new(layout.clone());

    let result = ctx.run_top_up(&[], 2, &generator, &formatter);
    assert!(matches!(result, Err(ApiError::ProviderNotConfigured(_))));

    let saved = ctx.store().load().unwrap();
    assert_eq!(saved.nouns.get("fox").unwrap().avatars.len(), 2);
    assert!(saved.nouns.get("owl").unwrap().avatars.is_empty());
}

#[test]
fn top_up_reports_unknown_creature_without_failing() {
    let (ctx, _temp) = workspace();
    ctx.execute(&add("noun", "fox", 1, false)).unwrap();
    let layout = layout(&ctx);
    let generator = RecordingGenerator::new(&layout.raw_dir);
    let formatter = TouchFormatter::new(layout.clone());

    let creatures = vec!["ghost".to_string(), "fox".to_string()];
    let report = ctx.run_top_up(&creatures, 1, &generator, &formatter).unwrap();
    assert_eq!(report.unknown, vec!["ghost".to_string()]);
    assert_eq!(report.generated(), 1);
    assert_eq!(generator.calls(), vec![("fox".to_string(), 1)]);
    assert_eq!(
        ctx.store().load().unwrap().nouns.get("fox").unwrap().avatars.len(),
        1
    );
}

#[test]
fn configured_prompt_file_must_exist() {
    let temp = TempDir::new().unwrap();
    let mut config = DeckConfig::default();
    config.registry.backup_dir = Some(PathBuf::from(".backups"));
    config.generation.prompt_path = Some(PathBuf::from("prompts/avatar.txt"));
    let ctx = CliContext::with_config(temp.path().to_path_buf(), config).unwrap();
    ctx.execute(&Commands::Init).unwrap();
    ctx.execute(&add("noun", "fox", 1, false)).unwrap();

    let layout = layout(&ctx);
    let generator = RecordingGenerator::new(&layout.raw_dir);
    let formatter = TouchFormatter::new(layout.clone());
    let result = ctx.run_top_up(&[], 1, &generator, &formatter);
    assert!(matches!(result, Err(ApiError::NotFound(_))));
    assert!(generator.calls().is_empty());
}
