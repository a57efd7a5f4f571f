//! Markdown rendering of Python API symbols.
//!
//! Two independent pieces:
//! - [`SignatureRenderer`] turns registry callables into `module.name(args)` strings
//! - [`process_docstring`] rewrites Keras-style docstrings into Markdown

mod docstring;
mod signature;

pub use docstring::process_docstring;
pub use signature::SignatureRenderer;
