//! Page manifest: which symbols are documented on which page.
//!
//! ```toml
//! [[pages]]
//! page = "layers/convolution.md"
//! classes = [
//!     "spektral.layers.GCNConv",
//!     { class = "spektral.data.Dataset", methods = "*" },
//!     { class = "spektral.data.Graph", methods = ["numpy", "get"] },
//! ]
//! functions = ["spektral.utils.convolution.degree_matrix"]
//! all_module_classes = ["spektral.transforms"]
//! ```

use serde::Deserialize;

/// One output page and the symbols rendered on it.
///
/// Several specs may name the same page; each fills the next placeholder.
#[derive(Debug, Clone, Deserialize)]
pub struct PageSpec {
    /// Output path relative to the output directory.
    pub page: String,
    /// Classes, optionally with methods.
    #[serde(default)]
    pub classes: Vec<ClassEntry>,
    /// Methods rendered standalone, as `<class path>.<method>`.
    #[serde(default)]
    pub methods: Vec<String>,
    /// Module-level functions.
    #[serde(default)]
    pub functions: Vec<String>,
    /// Modules whose public classes are all documented.
    #[serde(default)]
    pub all_module_classes: Vec<String>,
    /// Modules whose public functions are all documented.
    #[serde(default)]
    pub all_module_functions: Vec<String>,
}

/// A class reference with an optional method selection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ClassEntry {
    /// Document only the class.
    Class(String),
    /// Document the class and the selected methods.
    WithMethods {
        class: String,
        methods: MethodSelection,
    },
}

impl ClassEntry {
    /// Dotted path of the class.
    pub fn class(&self) -> &str {
        match self {
            Self::Class(class) | Self::WithMethods { class, .. } => class,
        }
    }

    /// Method selection, if any methods were requested.
    pub fn methods(&self) -> Option<&MethodSelection> {
        match self {
            Self::WithMethods { methods, .. } if !methods.is_empty() => Some(methods),
            _ => None,
        }
    }
}

/// Which methods of a class to document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "MethodSelectionRaw")]
pub enum MethodSelection {
    /// Every public method not excluded, written as `"*"`.
    All,
    /// Methods by bare name or by qualified path.
    Names(Vec<String>),
}

impl MethodSelection {
    fn is_empty(&self) -> bool {
        matches!(self, Self::Names(names) if names.is_empty())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MethodSelectionRaw {
    Wildcard(String),
    Names(Vec<String>),
}

impl TryFrom<MethodSelectionRaw> for MethodSelection {
    type Error = String;

    fn try_from(raw: MethodSelectionRaw) -> Result<Self, Self::Error> {
        match raw {
            MethodSelectionRaw::Wildcard(s) if s == "*" => Ok(Self::All),
            MethodSelectionRaw::Wildcard(s) => Err(format!(
                "methods must be \"*\" or a list of method names, got \"{s}\""
            )),
            MethodSelectionRaw::Names(names) => Ok(Self::Names(names)),
        }
    }
}
