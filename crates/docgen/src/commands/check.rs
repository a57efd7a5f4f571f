//! `docgen check` command implementation.

use std::path::PathBuf;

use clap::Args;
use docgen_config::{CliSettings, Config};
use docgen_registry::Registry;
use docgen_site::{BuildConfig, SiteBuilder};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Path to configuration file (default: auto-discover docgen.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Registry JSON file (overrides config).
    #[arg(short, long, env = "DOCGEN_REGISTRY")]
    registry: Option<PathBuf>,
}

impl CheckArgs {
    /// Execute the check command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or registry loading fails, a manifest
    /// reference is unknown, or a page spec has no placeholder left to fill.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            registry_path: self.registry,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let registry = Registry::load(&config.paths_resolved.registry_path)?;

        let report = SiteBuilder::new(&registry, BuildConfig::from_config(&config)).check()?;

        output.success(&format!(
            "Manifest OK: {} page specs ({} into templates, {} new), {} symbols",
            config.pages.len(),
            report.pages_inserted,
            report.pages_created,
            report.symbols
        ));
        Ok(())
    }
}
