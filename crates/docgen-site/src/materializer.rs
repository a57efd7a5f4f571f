//! Output directory population: templates, generated pages and static assets.

use std::fs;
use std::path::{Path, PathBuf};

use docgen_config::{AssetCopy, PLACEHOLDER};

use crate::BuildError;

/// How a generated page reached the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PageWrite {
    /// Substituted into the first remaining placeholder of an existing page.
    Inserted,
    /// Written as a new page.
    Created,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> BuildError + '_ {
    move |source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Refuse an output directory that is, or contains, one of the project inputs.
///
/// Paths are compared after canonicalization, so `.`, `..` and symlinks are
/// seen through. Inputs that don't exist are skipped.
pub(crate) fn ensure_output_dir_is_safe(
    output_dir: &Path,
    inputs: &[PathBuf],
) -> Result<(), BuildError> {
    let Ok(output) = fs::canonicalize(output_dir) else {
        return Ok(());
    };
    for input in inputs {
        if let Ok(canonical) = fs::canonicalize(input)
            && canonical.starts_with(&output)
        {
            return Err(BuildError::UnsafeOutputDir {
                output: output_dir.to_path_buf(),
                input: input.clone(),
            });
        }
    }
    Ok(())
}

/// Delete the output directory if it exists and create it empty.
pub(crate) fn reset_output_dir(output_dir: &Path) -> Result<(), BuildError> {
    if output_dir.exists() {
        fs::remove_dir_all(output_dir).map_err(io_error(output_dir))?;
    }
    fs::create_dir_all(output_dir).map_err(io_error(output_dir))
}

/// Copy every Markdown file under `template_dir` into `output_dir`.
///
/// Relative paths are preserved. Returns the number of files copied.
pub(crate) fn copy_templates(template_dir: &Path, output_dir: &Path) -> Result<usize, BuildError> {
    let mut copied = 0;
    for rel_path in markdown_files(template_dir)? {
        let source = template_dir.join(&rel_path);
        let target = output_dir.join(&rel_path);
        create_parent_dir(&target)?;
        fs::copy(&source, &target).map_err(io_error(&source))?;
        tracing::debug!(path = %rel_path.display(), "Copied template");
        copied += 1;
    }
    Ok(copied)
}

/// Relative paths of all `.md` files under `dir`, sorted.
///
/// A missing directory yields no files.
pub(crate) fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let mut files = Vec::new();
    if dir.exists() {
        collect_markdown_files(dir, Path::new(""), &mut files)?;
    }
    files.sort();
    Ok(files)
}

fn collect_markdown_files(
    dir: &Path,
    rel_prefix: &Path,
    files: &mut Vec<PathBuf>,
) -> Result<(), BuildError> {
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let path = entry.path();
        let rel_path = rel_prefix.join(entry.file_name());
        if entry.file_type().map_err(io_error(&path))?.is_dir() {
            collect_markdown_files(&path, &rel_path, files)?;
        } else if path.extension().is_some_and(|e| e == "md") {
            files.push(rel_path);
        }
    }
    Ok(())
}

/// Write `index.md` from the template with every placeholder replaced by the README.
pub(crate) fn write_home_page(
    template_dir: &Path,
    output_dir: &Path,
    readme_path: &Path,
) -> Result<(), BuildError> {
    let readme = fs::read_to_string(readme_path).map_err(io_error(readme_path))?;
    let template_path = template_dir.join("index.md");
    let template = fs::read_to_string(&template_path).map_err(io_error(&template_path))?;

    let target = output_dir.join("index.md");
    fs::write(&target, template.replace(PLACEHOLDER, &readme)).map_err(io_error(&target))
}

/// Place generated content for `page` in the output directory.
///
/// An existing page must still contain a placeholder; only the first one is
/// replaced. Otherwise a new page holding just `content` is created.
pub(crate) fn write_page(
    output_dir: &Path,
    page: &str,
    content: &str,
) -> Result<PageWrite, BuildError> {
    let path = output_dir.join(page);

    if path.exists() {
        let template = fs::read_to_string(&path).map_err(io_error(&path))?;
        if !template.contains(PLACEHOLDER) {
            return Err(BuildError::MissingPlaceholder { path });
        }
        fs::write(&path, template.replacen(PLACEHOLDER, content, 1)).map_err(io_error(&path))?;
        tracing::info!(path = %path.display(), "Inserting autogenerated content into template");
        Ok(PageWrite::Inserted)
    } else {
        create_parent_dir(&path)?;
        fs::write(&path, content).map_err(io_error(&path))?;
        tracing::info!(path = %path.display(), "Creating new page with autogenerated content");
        Ok(PageWrite::Created)
    }
}

/// Copy static assets into the output directory.
///
/// Sources containing glob metacharacters copy every matching file. A
/// destination ending in `/` is a directory that receives files under their
/// own names. Returns the number of files copied.
pub(crate) fn copy_assets(assets: &[AssetCopy], output_dir: &Path) -> Result<usize, BuildError> {
    let mut copied = 0;
    for asset in assets {
        let sources = expand_source(asset)?;
        if sources.is_empty() {
            tracing::warn!(pattern = %asset.from, "Asset pattern matched no files");
        }
        for source in sources {
            let target = asset_target(output_dir, &asset.destination, &source);
            create_parent_dir(&target)?;
            fs::copy(&source, &target).map_err(io_error(&source))?;
            tracing::debug!(from = %source.display(), to = %target.display(), "Copied asset");
            copied += 1;
        }
    }
    Ok(copied)
}

/// Longest leading part of an asset source free of glob metacharacters.
pub(crate) fn asset_root(asset: &AssetCopy) -> PathBuf {
    if !asset.is_pattern() {
        return asset.source();
    }
    let literal: PathBuf = Path::new(&asset.from)
        .components()
        .take_while(|c| !c.as_os_str().to_string_lossy().contains(['*', '?', '[']))
        .collect();
    asset.base_dir.join(literal)
}

fn expand_source(asset: &AssetCopy) -> Result<Vec<PathBuf>, BuildError> {
    if !asset.is_pattern() {
        return Ok(vec![asset.source()]);
    }

    let pattern = asset_pattern(asset);
    let paths = glob::glob(&pattern).map_err(|err| BuildError::Pattern {
        pattern: asset.from.clone(),
        source: err,
    })?;
    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| BuildError::Io {
            path: err.path().to_path_buf(),
            source: err.into_error(),
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Glob pattern for an asset, with the base directory matched literally.
fn asset_pattern(asset: &AssetCopy) -> String {
    if Path::new(&asset.from).is_absolute() {
        return asset.from.clone();
    }
    let base = glob::Pattern::escape(&asset.base_dir.to_string_lossy());
    format!("{}/{}", base.trim_end_matches('/'), asset.from)
}

fn asset_target(output_dir: &Path, destination: &str, source: &Path) -> PathBuf {
    if destination.ends_with('/') {
        let file_name = source.file_name().unwrap_or_default();
        output_dir.join(destination).join(file_name)
    } else {
        output_dir.join(destination)
    }
}

fn create_parent_dir(path: &Path) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    Ok(())
}
