//! CLI error types.

use docgen_config::ConfigError;
use docgen_registry::RegistryError;
use docgen_site::BuildError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Registry(#[from] RegistryError),

    #[error("{0}")]
    Build(#[from] BuildError),
}
