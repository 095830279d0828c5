//! CLI Tooling
//!
//! Command-line interface for the deck asset registry. Every command loads the
//! registry, runs one operation, and saves (with a backup) only when something
//! changed.

use crate::avatar::{reconcile, top_up, AvatarLayout, AvatarPipeline, TopUpReport};
use crate::config::{ConfigLoader, DeckConfig, ResolvedPaths, WORKSPACE_CONFIG_FILE};
use crate::error::{ApiError, StorageError};
use crate::logging::LoggingConfig;
use crate::merge::add_entries;
use crate::provider::{
    create_generator, resolve_prompt_path, AvatarGenerator, AvatarPostProcessor,
    PixelAvatarFormatter, PromptTemplate,
};
use crate::store::{BackupManager, Registry, RegistryStore, SaveOptions};
use crate::tooling::format::{
    format_backups_json, format_backups_text, format_merge_report_text,
    format_reconcile_report_text, format_registry_json, format_registry_text,
    format_top_up_report_text, to_pretty_json,
};
use crate::types::{EntryKind, Level};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Deckgen CLI - card game asset registry
#[derive(Parser)]
#[command(name = "deckgen")]
#[command(about = "Manage the deck generator's creature names, modifiers, and avatars")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging to stderr
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Save without backing up the previous registry file
    #[arg(long)]
    pub no_backup: bool,
}

impl Cli {
    /// Fold the logging flags over the configured logging section.
    pub fn logging_config(&self, base: &LoggingConfig) -> Result<LoggingConfig, ApiError> {
        base.clone().with_overrides(
            self.log_level.clone(),
            self.log_format.clone(),
            self.log_output.clone(),
            self.log_file.clone(),
            self.verbose,
        )
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print nouns and adjectives grouped by level
    Print {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Add nouns or adjectives from a value, a .txt list, or a .json array
    Add {
        /// Entry kind: noun, adj, or adjective
        kind: String,
        /// Literal name, or path to a .txt (one per line) or .json (array) file
        value: String,
        /// Level assigned to new entries
        #[arg(long, default_value_t = 0)]
        level: Level,
        /// Overwrite the level of existing entries
        #[arg(long)]
        force: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Generate avatars until each noun has the target count
    Avatars {
        /// Creature to top up (repeatable); all nouns when omitted
        #[arg(long = "creature")]
        creatures: Vec<String>,
        /// Target avatar count per noun
        #[arg(short = 'n', long = "count")]
        count: Option<usize>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Drop dangling avatar references and report orphan avatar files
    Clean {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Create an empty registry file and a default deckgen.toml
    Init,
    /// List registry backups, oldest first
    Backups {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

/// CLI context holding the loaded configuration and registry collaborators
pub struct CliContext {
    workspace_root: PathBuf,
    config: DeckConfig,
    paths: ResolvedPaths,
    store: RegistryStore,
    layout: AvatarLayout,
    backup_on_save: bool,
}

impl CliContext {
    /// Create a new CLI context
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(cfg_path) = &config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Self::with_config(workspace_root, config)
    }

    /// Create a context from an already loaded configuration.
    pub fn with_config(workspace_root: PathBuf, config: DeckConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let paths = config.registry.resolve_paths(&workspace_root)?;
        let store = RegistryStore::new(&paths.data_path).with_backups(BackupManager::new(
            &paths.backup_dir,
            config.registry.max_backups,
        ));
        let layout = AvatarLayout::new(
            &paths.avatar_dir,
            &paths.raw_dir,
            config.registry.resource_prefix.clone(),
        );
        Ok(Self {
            workspace_root,
            config,
            paths,
            store,
            layout,
            backup_on_save: true,
        })
    }

    /// Disable backups for saves made through this context.
    pub fn without_backups(mut self) -> Self {
        self.backup_on_save = false;
        self
    }

    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    pub fn paths(&self) -> &ResolvedPaths {
        &self.paths
    }

    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Print { format } => self.handle_print(format),
            Commands::Add {
                kind,
                value,
                level,
                force,
                format,
            } => self.handle_add(kind, value, *level, *force, format),
            Commands::Avatars {
                creatures,
                count,
                format,
            } => self.handle_avatars(creatures, *count, format),
            Commands::Clean { format } => self.handle_clean(format),
            Commands::Init => self.handle_init(),
            Commands::Backups { format } => self.handle_backups(format),
        }
    }

    fn save_options(&self) -> SaveOptions {
        SaveOptions {
            backup: self.backup_on_save,
            sort: true,
        }
    }

    fn save(&self, registry: &Registry) -> Result<(), ApiError> {
        let outcome = self.store.save(registry, self.save_options())?;
        if let Some(backup) = outcome.backup {
            info!(
                backup = %backup.created.display(),
                pruned = backup.pruned.len(),
                "Registry backed up"
            );
        }
        Ok(())
    }

    fn handle_print(&self, format: &str) -> Result<String, ApiError> {
        let registry = self.store.load()?.sorted();
        match parse_format(format)? {
            OutputFormat::Json => format_registry_json(&registry),
            OutputFormat::Text => Ok(format_registry_text(&registry)),
        }
    }

    fn handle_add(
        &self,
        kind: &str,
        value: &str,
        level: Level,
        force: bool,
        format: &str,
    ) -> Result<String, ApiError> {
        let kind = EntryKind::parse(kind)?;
        let format = parse_format(format)?;
        let values = load_values(value)?;
        let mut registry = self.store.load()?;

        let report = add_entries(&mut registry, kind, &values, level, force);
        if report.changed() {
            self.save(&registry)?;
        } else {
            info!(kind = %kind, "No entries changed, registry not saved");
        }

        match format {
            OutputFormat::Json => to_pretty_json(&report),
            OutputFormat::Text => Ok(format_merge_report_text(&report)),
        }
    }

    fn handle_clean(&self, format: &str) -> Result<String, ApiError> {
        let format = parse_format(format)?;
        let mut registry = self.store.load()?;
        let report = reconcile(&mut registry, &self.layout)?;
        self.save(&registry)?;
        match format {
            OutputFormat::Json => to_pretty_json(&report),
            OutputFormat::Text => Ok(format_reconcile_report_text(&report)),
        }
    }

    fn handle_init(&self) -> Result<String, ApiError> {
        self.store.init()?;
        let mut output = format!(
            "Initialized empty registry at {}",
            self.store.path().display()
        );
        let config_file = self.workspace_root.join(WORKSPACE_CONFIG_FILE);
        if ConfigLoader::write_default(&config_file)? {
            output.push_str(&format!("\nWrote default config to {}", config_file.display()));
        }
        Ok(output)
    }

    fn handle_backups(&self, format: &str) -> Result<String, ApiError> {
        let format = parse_format(format)?;
        let records = match self.store.backups() {
            Some(manager) => manager.list(self.store.path())?,
            None => Vec::new(),
        };
        match format {
            OutputFormat::Json => format_backups_json(&records),
            OutputFormat::Text => Ok(format_backups_text(&records)),
        }
    }

    fn handle_avatars(
        &self,
        creatures: &[String],
        count: Option<usize>,
        format: &str,
    ) -> Result<String, ApiError> {
        let format = parse_format(format)?;
        let target = count.unwrap_or(self.config.generation.default_avatar_count);
        let generator = create_generator(&self.config.generation.provider, &self.paths.raw_dir)?;
        let post_processor = PixelAvatarFormatter::new(self.layout.clone());

        let mut report =
            self.top_up_and_save(creatures, target, generator.as_ref(), &post_processor)?;
        let failure = report.failure.take();
        let rendered = match format {
            OutputFormat::Json => to_pretty_json(&report)?,
            OutputFormat::Text => format_top_up_report_text(&report),
        };
        match failure {
            Some((_, error)) => {
                // Partial progress was saved; show it before the error.
                eprintln!("{}", rendered);
                Err(error)
            }
            None => Ok(rendered),
        }
    }

    fn prompt_template(&self) -> Result<PromptTemplate, ApiError> {
        match &self.config.generation.prompt_path {
            Some(path) => PromptTemplate::load(&resolve_prompt_path(path, &self.workspace_root)?),
            None => Ok(PromptTemplate::default()),
        }
    }

    /// Top up avatars with the given collaborators and save any progress.
    ///
    /// When generation fails part-way, avatars produced for earlier nouns are
    /// saved before the failure is returned.
    pub fn run_top_up(
        &self,
        creatures: &[String],
        target: usize,
        generator: &dyn AvatarGenerator,
        post_processor: &dyn AvatarPostProcessor,
    ) -> Result<TopUpReport, ApiError> {
        let mut report = self.top_up_and_save(creatures, target, generator, post_processor)?;
        match report.failure.take() {
            Some((_, error)) => Err(error),
            None => Ok(report),
        }
    }

    /// Run the top-up and save the registry if anything was generated.
    ///
    /// A mid-batch failure stays in `report.failure` next to the nouns that
    /// were completed before it.
    fn top_up_and_save(
        &self,
        creatures: &[String],
        target: usize,
        generator: &dyn AvatarGenerator,
        post_processor: &dyn AvatarPostProcessor,
    ) -> Result<TopUpReport, ApiError> {
        let prompts = self.prompt_template()?;
        let mut registry = self.store.load()?;
        let pipeline = AvatarPipeline {
            generator,
            post_processor,
            prompts: &prompts,
            retry: self.config.generation.retry_policy(),
        };

        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ApiError::ConfigError(
                "Cannot run avatar generation from within an async runtime".to_string(),
            ));
        }
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::StorageError(StorageError::IoError(e)))?;
        let report = rt.block_on(top_up(&mut registry, creatures, target, &pipeline));

        if report.generated() > 0 {
            self.save(&registry)?;
        }
        if let Some((noun, error)) = &report.failure {
            warn!(
                noun = %noun,
                error = %error,
                saved = report.generated(),
                "Avatar generation stopped early"
            );
        }
        Ok(report)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_format(format: &str) -> Result<OutputFormat, ApiError> {
    match format {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(ApiError::ConfigError(format!(
            "Invalid format: {} (must be 'text' or 'json')",
            other
        ))),
    }
}

/// Normalize an `add` argument into entry names.
///
/// `*.json` files hold an array of strings, `*.txt` files one name per line;
/// anything else is a single literal name.
pub fn load_values(value: &str) -> Result<Vec<String>, ApiError> {
    let path = Path::new(value);
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("json") => {
            let content = read_value_file(path)?;
            serde_json::from_str::<Vec<String>>(&content).map_err(|e| ApiError::Format {
                path: path.to_path_buf(),
                message: format!("expected a JSON array of strings: {}", e),
            })
        }
        Some("txt") => {
            let content = read_value_file(path)?;
            Ok(content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect())
        }
        _ => Ok(vec![value.to_string()]),
    }
}

fn read_value_file(path: &Path) -> Result<String, ApiError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::NotFound(path.to_path_buf()))
        }
        Err(e) => Err(StorageError::at(path, e).into()),
    }
}
