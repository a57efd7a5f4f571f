//! Site builder orchestrating a generation run.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use docgen_config::{AssetCopy, Config, PLACEHOLDER, PageSpec};
use docgen_registry::Registry;
use docgen_render::SignatureRenderer;

use crate::BuildError;
use crate::assembler::{PageAssembler, ResolvedPage};
use crate::materializer::{self, PageWrite};

/// Configuration for a generation run.
#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    /// Directory of Markdown templates.
    pub template_dir: PathBuf,
    /// Output directory. Deleted and recreated by [`SiteBuilder::build`].
    pub output_dir: PathBuf,
    /// README injected into `index.md`; the home page is skipped when unset.
    pub readme_path: Option<PathBuf>,
    /// Registry file the symbols were loaded from.
    pub registry_path: Option<PathBuf>,
    /// Configuration file the build was loaded from.
    pub config_path: Option<PathBuf>,
    /// Static assets copied after the pages.
    pub assets: Vec<AssetCopy>,
    /// Page manifest.
    pub pages: Vec<PageSpec>,
    /// Symbol names never collected by wildcards.
    pub exclude: HashSet<String>,
    /// Base URL for `[[source]]` links.
    pub repository_url: Option<String>,
    /// Namespaces collapsed by signature canonicalization.
    pub canonical_namespaces: Vec<String>,
}

impl BuildConfig {
    /// Build configuration from a loaded [`Config`].
    pub fn from_config(config: &Config) -> Self {
        Self {
            template_dir: config.paths_resolved.template_dir.clone(),
            output_dir: config.paths_resolved.output_dir.clone(),
            readme_path: config.paths_resolved.readme_path.clone(),
            registry_path: Some(config.paths_resolved.registry_path.clone()),
            config_path: config.config_path.clone(),
            assets: config.assets_resolved.clone(),
            pages: config.pages.clone(),
            exclude: config.exclude.iter().cloned().collect(),
            repository_url: config.source.repository_url.clone(),
            canonical_namespaces: config.signature.canonical_namespaces.clone(),
        }
    }
}

/// Summary of a build or check run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Templates copied into the output directory.
    pub templates: usize,
    /// Page specs substituted into an existing page.
    pub pages_inserted: usize,
    /// Page specs written as new pages.
    pub pages_created: usize,
    /// Top-level symbol blocks rendered.
    pub symbols: usize,
    /// Static asset files copied.
    pub assets: usize,
}

/// Generates the Markdown sources of an API reference site.
pub struct SiteBuilder<'r> {
    registry: &'r Registry,
    config: BuildConfig,
}

impl<'r> SiteBuilder<'r> {
    /// Create a builder over a registry.
    pub fn new(registry: &'r Registry, config: BuildConfig) -> Self {
        Self { registry, config }
    }

    fn assembler(&self) -> PageAssembler<'_> {
        PageAssembler::new(
            self.registry,
            SignatureRenderer::new(self.config.canonical_namespaces.clone()),
            &self.config.exclude,
            self.config.repository_url.as_deref(),
        )
    }

    /// Project inputs that must survive the output directory reset.
    fn inputs(&self) -> Vec<PathBuf> {
        let config = &self.config;
        let mut inputs = vec![config.template_dir.clone()];
        inputs.extend(config.readme_path.iter().cloned());
        inputs.extend(config.registry_path.iter().cloned());
        inputs.extend(config.config_path.iter().cloned());
        inputs.extend(config.assets.iter().map(materializer::asset_root));
        inputs
    }

    fn resolve_pages<'a>(
        &'a self,
        assembler: &PageAssembler<'a>,
    ) -> Result<Vec<(&'a PageSpec, ResolvedPage<'a>)>, BuildError> {
        self.config
            .pages
            .iter()
            .map(|spec| Ok((spec, assembler.resolve(spec)?)))
            .collect()
    }

    /// Run a full generation.
    ///
    /// Every manifest reference is resolved before the output directory is
    /// touched, so an unknown symbol leaves the previous output in place.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let assembler = self.assembler();
        let pages = self.resolve_pages(&assembler)?;
        let output_dir = &self.config.output_dir;
        materializer::ensure_output_dir_is_safe(output_dir, &self.inputs())?;
        let mut report = BuildReport::default();

        tracing::info!(path = %output_dir.display(), "Cleaning up existing output directory");
        materializer::reset_output_dir(output_dir)?;

        tracing::info!(path = %self.config.template_dir.display(), "Populating output directory with templates");
        report.templates = materializer::copy_templates(&self.config.template_dir, output_dir)?;

        if let Some(readme) = &self.config.readme_path {
            materializer::write_home_page(&self.config.template_dir, output_dir, readme)?;
        }

        for (spec, page) in &pages {
            let content = assembler.render(page);
            match materializer::write_page(output_dir, &spec.page, &content)? {
                PageWrite::Inserted => report.pages_inserted += 1,
                PageWrite::Created => report.pages_created += 1,
            }
            report.symbols += page.symbol_count();
        }

        report.assets = materializer::copy_assets(&self.config.assets, output_dir)?;

        Ok(report)
    }

    /// Validate the manifest without writing anything.
    ///
    /// Resolves every reference and checks that each page spec aimed at a
    /// template will find a placeholder left to fill.
    pub fn check(&self) -> Result<BuildReport, BuildError> {
        let assembler = self.assembler();
        let pages = self.resolve_pages(&assembler)?;
        materializer::ensure_output_dir_is_safe(&self.config.output_dir, &self.inputs())?;
        let mut report = BuildReport::default();

        let mut remaining = self.placeholder_counts()?;
        report.templates = remaining.len();

        for (spec, page) in &pages {
            let key = normalize_page(&spec.page);
            match remaining.get_mut(&key) {
                Some(0) => {
                    return Err(BuildError::MissingPlaceholder {
                        path: self.config.output_dir.join(&spec.page),
                    });
                }
                Some(count) => {
                    *count -= 1;
                    report.pages_inserted += 1;
                }
                None => {
                    remaining.insert(key, 0);
                    report.pages_created += 1;
                }
            }
            report.symbols += page.symbol_count();
        }

        Ok(report)
    }

    /// Placeholder count of every template, keyed by relative path.
    fn placeholder_counts(&self) -> Result<HashMap<PathBuf, usize>, BuildError> {
        let template_dir = &self.config.template_dir;
        let mut counts = HashMap::new();
        for rel_path in materializer::markdown_files(template_dir)? {
            let path = template_dir.join(&rel_path);
            let content = fs::read_to_string(&path).map_err(|source| BuildError::Io {
                path: path.clone(),
                source,
            })?;
            // The home page's placeholders are all taken by the README
            let count = if self.config.readme_path.is_some() && rel_path == PathBuf::from("index.md") {
                0
            } else {
                content.matches(PLACEHOLDER).count()
            };
            counts.insert(rel_path, count);
        }
        Ok(counts)
    }
}

/// Page path with `.` components dropped, as templates are keyed.
fn normalize_page(page: &str) -> PathBuf {
    Path::new(page)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
