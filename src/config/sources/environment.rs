//! Environment variable source: DECKGEN_ prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

pub const ENV_PREFIX: &str = "DECKGEN";

/// Add environment variable overlay to builder.
/// Uses DECKGEN_ prefix and __ as separator for nested keys,
/// e.g. `DECKGEN__REGISTRY__MAX_BACKUPS=10`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );
    Ok(builder)
}
