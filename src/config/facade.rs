//! Configuration loading: defaults, global file, project files, environment.

use super::merge::merge_policy;
use super::sources::{global_file, project_file};
use super::MetricsConfig;
use crate::error::MetricsError;
use config::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`MetricsConfig`] from its layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a project rooted at `project_root`.
    ///
    /// Later layers win: defaults, global file, `config/config.toml`,
    /// `config/{BATCHMETRICS_ENV}.toml`, then `BATCHMETRICS__*` variables.
    pub fn load(project_root: &Path) -> Result<MetricsConfig, MetricsError> {
        Self::load_layers(project_root, Self::global_config_path().as_deref())
    }

    /// Same as [`ConfigLoader::load`] with an explicit global file location.
    pub fn load_layers(
        project_root: &Path,
        global_path: Option<&Path>,
    ) -> Result<MetricsConfig, MetricsError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder, global_path)?;
        let builder = project_file::add_to_builder(builder, project_root)?;
        let config: MetricsConfig = builder
            .add_source(merge_policy::environment())
            .build()?
            .try_deserialize()?;

        debug!(
            project_root = %project_root.display(),
            provider = config.provider.as_ref().map(|p| p.backend_name()),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load configuration from a single file, still honouring environment
    /// overrides.
    pub fn load_from_file(path: &Path) -> Result<MetricsConfig, MetricsError> {
        let config = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .add_source(merge_policy::environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
