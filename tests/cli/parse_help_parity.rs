use clap::{CommandFactory, Parser};
use deckgen::tooling::cli::{Cli, Commands};

#[test]
fn parse_valid_command_matrix() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["deckgen", "print"],
        vec!["deckgen", "print", "--format", "json"],
        vec!["deckgen", "add", "noun", "fox"],
        vec!["deckgen", "add", "adj", "lists/adjectives.txt", "--level", "3"],
        vec!["deckgen", "add", "adjective", "angry", "--force"],
        vec!["deckgen", "avatars"],
        vec!["deckgen", "avatars", "--creature", "fox", "--creature", "owl", "-n", "5"],
        vec!["deckgen", "avatars", "--count", "2", "--format", "json"],
        vec!["deckgen", "clean"],
        vec!["deckgen", "init"],
        vec!["deckgen", "backups", "--format", "json"],
        vec![
            "deckgen",
            "--workspace",
            "/tmp/game",
            "--config",
            "/tmp/game/deckgen.toml",
            "--log-level",
            "debug",
            "--log-format",
            "json",
            "--log-output",
            "stderr",
            "--no-backup",
            "clean",
        ],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_ok(), "expected valid parse for args: {args:?}");
    }
}

#[test]
fn parse_rejects_malformed_commands() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["deckgen"],
        vec!["deckgen", "add", "noun"],
        vec!["deckgen", "add", "noun", "fox", "--level", "-1"],
        vec!["deckgen", "add", "noun", "fox", "--level", "high"],
        vec!["deckgen", "avatars", "-n", "many"],
        vec!["deckgen", "frobnicate"],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_err(), "expected parse failure for args: {args:?}");
    }
}

#[test]
fn defaults_are_applied() {
    let cli = Cli::try_parse_from(["deckgen", "add", "noun", "fox"]).unwrap();
    assert_eq!(cli.workspace.to_str(), Some("."));
    assert!(cli.config.is_none());
    assert!(!cli.no_backup);
    match cli.command {
        Commands::Add {
            level,
            force,
            format,
            ..
        } => {
            assert_eq!(level, 0);
            assert!(!force);
            assert_eq!(format, "text");
        }
        _ => panic!("expected add"),
    }
}

#[test]
fn help_lists_every_subcommand() {
    let help = Cli::command().render_long_help().to_string();
    for name in ["print", "add", "avatars", "clean", "init", "backups"] {
        assert!(help.contains(name), "help is missing {name}");
    }
    for flag in ["--workspace", "--config", "--log-level", "--no-backup"] {
        assert!(help.contains(flag), "help is missing {flag}");
    }
}
