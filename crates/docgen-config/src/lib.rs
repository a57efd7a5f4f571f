//! Configuration management for docgen.
//!
//! Parses `docgen.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. The file holds both
//! the generator settings and the page manifest.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! Path values support `~`, `${VAR}` and `${VAR:-default}` expansion:
//!
//! - `paths.templates`
//! - `paths.output`
//! - `paths.registry`
//! - `paths.readme`
//! - `source.repository_url`

mod expand;
mod manifest;

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub use manifest::{ClassEntry, MethodSelection, PageSpec};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override template directory.
    pub template_dir: Option<PathBuf>,
    /// Override registry file.
    pub registry_path: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "docgen.toml";

/// Placeholder token replaced with generated content.
pub const PLACEHOLDER: &str = "{{autogenerated}}";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Symbol names never collected by module wildcards or `"*"` method selections.
    pub exclude: Vec<String>,
    /// Paths (relative strings from TOML).
    paths: PathsConfigRaw,
    /// Signature rendering configuration.
    pub signature: SignatureConfig,
    /// Source link configuration.
    pub source: SourceConfig,
    /// Static assets to copy (relative strings from TOML).
    assets: Vec<AssetConfigRaw>,
    /// Page manifest.
    pub pages: Vec<PageSpec>,

    /// Resolved paths (set after loading).
    #[serde(skip)]
    pub paths_resolved: PathsConfig,
    /// Resolved asset copies (set after loading).
    #[serde(skip)]
    pub assets_resolved: Vec<AssetCopy>,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw paths configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PathsConfigRaw {
    templates: Option<String>,
    output: Option<String>,
    registry: Option<String>,
    readme: Option<String>,
}

/// Resolved paths with absolute locations.
#[derive(Debug, Default)]
pub struct PathsConfig {
    /// Directory of Markdown templates.
    pub template_dir: PathBuf,
    /// Generated output directory. Deleted and recreated on every build.
    pub output_dir: PathBuf,
    /// Registry JSON file.
    pub registry_path: PathBuf,
    /// README injected into the home page.
    pub readme_path: Option<PathBuf>,
}

/// Signature rendering configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SignatureConfig {
    /// Second-level namespaces whose deep paths collapse to `pkg.namespace.Symbol`.
    pub canonical_namespaces: Vec<String>,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            canonical_namespaces: vec!["layers".to_owned(), "utils".to_owned()],
        }
    }
}

/// Source link configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the source tree, e.g. `https://github.com/org/repo/blob/master/`.
    ///
    /// Source links are omitted when unset.
    pub repository_url: Option<String>,
}

/// Raw asset entry as parsed from TOML.
#[derive(Debug, Deserialize)]
struct AssetConfigRaw {
    from: String,
    to: String,
}

/// A resolved static asset copy.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetCopy {
    /// Directory relative `from` values resolve against (the config file's directory).
    pub base_dir: PathBuf,
    /// Source file or glob pattern as configured.
    pub from: String,
    /// Destination relative to the output directory. A trailing `/` marks a directory.
    pub destination: String,
}

impl AssetCopy {
    /// Whether `from` contains glob metacharacters.
    ///
    /// Only the configured value is inspected, never `base_dir`.
    pub fn is_pattern(&self) -> bool {
        self.from.contains(['*', '?', '['])
    }

    /// Absolute source path (or pattern) of the asset.
    pub fn source(&self) -> PathBuf {
        self.base_dir.join(&self.from)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`paths.output`").
        field: String,
        /// Error message (e.g., "${`DOCS_OUT`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `docgen.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(output_dir) = &settings.output_dir {
            self.paths_resolved.output_dir.clone_from(output_dir);
        }
        if let Some(template_dir) = &settings.template_dir {
            self.paths_resolved.template_dir.clone_from(template_dir);
        }
        if let Some(registry_path) = &settings.registry_path {
            self.paths_resolved.registry_path.clone_from(registry_path);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            exclude: Vec::new(),
            paths: PathsConfigRaw::default(),
            signature: SignatureConfig::default(),
            source: SourceConfig::default(),
            assets: Vec::new(),
            pages: Vec::new(),
            paths_resolved: PathsConfig {
                template_dir: base.join("templates"),
                output_dir: base.join("sources"),
                registry_path: base.join("registry.json"),
                readme_path: None,
            },
            assets_resolved: Vec::new(),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        // Validate configuration after loading and resolution
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_source()?;
        self.validate_signature()?;
        self.validate_assets()?;
        self.validate_pages()?;
        Ok(())
    }

    fn validate_source(&self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.source.repository_url {
            require_non_empty(url, "source.repository_url")?;
            require_http_url(url, "source.repository_url")?;
        }
        Ok(())
    }

    fn validate_signature(&self) -> Result<(), ConfigError> {
        for namespace in &self.signature.canonical_namespaces {
            require_non_empty(namespace, "signature.canonical_namespaces")?;
            if namespace.contains('.') {
                return Err(ConfigError::Validation(format!(
                    "signature.canonical_namespaces entry '{namespace}' must be a single segment"
                )));
            }
        }
        Ok(())
    }

    fn validate_assets(&self) -> Result<(), ConfigError> {
        for asset in &self.assets {
            require_non_empty(&asset.from, "assets.from")?;
            require_non_empty(&asset.to, "assets.to")?;
            require_relative(&asset.to, "assets.to")?;
        }
        Ok(())
    }

    /// Page paths must stay inside the output directory.
    fn validate_pages(&self) -> Result<(), ConfigError> {
        for spec in &self.pages {
            require_non_empty(&spec.page, "pages.page")?;
            require_relative(&spec.page, "pages.page")?;
            for entry in &spec.classes {
                require_non_empty(entry.class(), "pages.classes")?;
            }
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let paths = &mut self.paths;
        for (value, field) in [
            (&mut paths.templates, "paths.templates"),
            (&mut paths.output, "paths.output"),
            (&mut paths.registry, "paths.registry"),
            (&mut paths.readme, "paths.readme"),
            (&mut self.source.repository_url, "source.repository_url"),
        ] {
            if let Some(raw) = value {
                *raw = expand::expand_env(raw, field)?;
            }
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.paths_resolved = PathsConfig {
            template_dir: resolve(self.paths.templates.as_deref(), "templates"),
            output_dir: resolve(self.paths.output.as_deref(), "sources"),
            registry_path: resolve(self.paths.registry.as_deref(), "registry.json"),
            readme_path: self.paths.readme.as_deref().map(|p| config_dir.join(p)),
        };

        self.assets_resolved = self
            .assets
            .iter()
            .map(|asset| AssetCopy {
                base_dir: config_dir.to_path_buf(),
                from: asset.from.clone(),
                destination: asset.to.clone(),
            })
            .collect();
    }
}

/// Require a path to be relative and free of `..` components.
fn require_relative(path: &str, field: &str) -> Result<(), ConfigError> {
    let p = Path::new(path);
    if p.is_absolute() || p.components().any(|c| c == std::path::Component::ParentDir) {
        return Err(ConfigError::Validation(format!(
            "{field} '{path}' must be a relative path inside the output directory"
        )));
    }
    Ok(())
}
