//! API reference page generation for docgen.
//!
//! [`SiteBuilder`] drives a full run:
//! 1. Resolve every manifest page against the [`Registry`](docgen_registry::Registry)
//! 2. Reset the output directory and copy Markdown templates into it
//! 3. Write the home page with the README injected
//! 4. Render each page and substitute it into its template placeholder
//! 5. Copy static assets

mod assembler;
mod builder;
mod materializer;

use std::path::PathBuf;

pub use builder::{BuildConfig, BuildReport, SiteBuilder};

/// Error returned by the site builder.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Template found for {} but missing {{{{autogenerated}}}} tag", .path.display())]
    MissingPlaceholder { path: PathBuf },

    #[error(
        "Refusing to use {} as output directory: it contains {}",
        .output.display(),
        .input.display()
    )]
    UnsafeOutputDir { output: PathBuf, input: PathBuf },

    #[error("Unknown class '{0}'")]
    UnknownClass(String),

    #[error("Unknown method '{0}'")]
    UnknownMethod(String),

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid asset pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}
