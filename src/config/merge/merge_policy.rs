//! Merge rules: defaults, override order, environment overrides.

use crate::client::DEFAULT_MAX_BUFFER_SIZE;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Prefix for environment overrides, e.g. `BATCHMETRICS__PROVIDER__TOKEN`.
pub const ENV_PREFIX: &str = "BATCHMETRICS";

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder().set_default("client.max_buffer_size", DEFAULT_MAX_BUFFER_SIZE as i64)
}

/// Environment source; applied last so it wins over every file.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
