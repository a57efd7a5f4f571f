//! `docgen build` command implementation.

use std::path::PathBuf;

use clap::Args;
use docgen_config::{CliSettings, Config};
use docgen_registry::Registry;
use docgen_site::{BuildConfig, SiteBuilder};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover docgen.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory for generated pages (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Template directory (overrides config).
    #[arg(short, long)]
    template_dir: Option<PathBuf>,

    /// Registry JSON file (overrides config).
    #[arg(short, long, env = "DOCGEN_REGISTRY")]
    registry: Option<PathBuf>,

    /// Enable verbose output (log every page written).
    #[arg(short, long)]
    pub verbose: bool,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or registry loading fails, a manifest
    /// reference is unknown, or a page cannot be written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            output_dir: self.output_dir,
            template_dir: self.template_dir,
            registry_path: self.registry,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let registry = Registry::load(&config.paths_resolved.registry_path)?;

        output.info(&format!(
            "Templates: {}",
            config.paths_resolved.template_dir.display()
        ));
        output.info(&format!(
            "Output: {}",
            config.paths_resolved.output_dir.display()
        ));

        let builder = SiteBuilder::new(&registry, BuildConfig::from_config(&config));
        let report = builder.build()?;

        output.success(&format!(
            "Generated {} symbols on {} pages ({} templates, {} assets) in {}",
            report.symbols,
            report.pages_inserted + report.pages_created,
            report.templates,
            report.assets,
            config.paths_resolved.output_dir.display()
        ));
        Ok(())
    }
}
