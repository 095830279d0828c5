//! Built-in defaults that every load starts from.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with the defaults environment overrides are parsed against.
///
/// Everything else falls back to serde defaults on the config structs.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("registry.max_backups", 50)?
        .set_default("generation.max_retries", 3)?
        .set_default("generation.retry_delay_ms", 1000)?
        .set_default("logging.enabled", true)
}
