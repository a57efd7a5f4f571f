//! Symbol registry for docgen.
//!
//! The registry is an explicit table of a Python library's public classes and
//! functions, dumped to JSON by whatever tool introspects the library. It stands
//! in for runtime reflection: lookups by dotted path and module member scans
//! both go through this table.
//!
//! # Example
//!
//! ```ignore
//! use docgen_registry::Registry;
//!
//! let registry = Registry::load(Path::new("registry.json"))?;
//! let class = registry.find_class("spektral.layers.GCNConv");
//! ```

mod symbol;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub use symbol::{ClassDef, Constructor, DefaultValue, FunctionDef, Param};

/// Error loading a registry file.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Failed to read registry {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse registry {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// All documented symbols of a library.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registry {
    /// Top-level package name.
    #[serde(default)]
    pub package: Option<String>,
    /// Classes in declaration order.
    #[serde(default)]
    pub classes: Vec<ClassDef>,
    /// Module-level functions in declaration order.
    #[serde(default)]
    pub functions: Vec<FunctionDef>,
}

impl Registry {
    /// Load a registry from a JSON file.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_json(&content).map_err(|source| RegistryError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(
            path = %path.display(),
            classes = registry.classes.len(),
            functions = registry.functions.len(),
            "Loaded registry"
        );
        Ok(registry)
    }

    /// Parse a registry from JSON text.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let mut registry: Self = serde_json::from_str(content)?;
        registry.fill_method_modules();
        Ok(registry)
    }

    /// Methods inherit their class's module unless recorded otherwise.
    fn fill_method_modules(&mut self) {
        for class in &mut self.classes {
            for method in &mut class.methods {
                if method.module.is_empty() {
                    method.module.clone_from(&class.module);
                }
            }
        }
    }

    /// Find a class by its definition path or any exported path.
    pub fn find_class(&self, path: &str) -> Option<&ClassDef> {
        self.classes.iter().find(|c| c.matches_path(path))
    }

    /// Find a module-level function by its definition path or any exported path.
    pub fn find_function(&self, path: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.matches_path(path))
    }

    /// Find a method by `<class path>.<method name>`.
    pub fn find_method(&self, path: &str) -> Option<(&ClassDef, &FunctionDef)> {
        let (class_path, method_name) = path.rsplit_once('.')?;
        let class = self.find_class(class_path)?;
        let method = class.methods.iter().find(|m| m.name == method_name)?;
        Some((class, method))
    }

    /// Public classes visible in `module` and owned by it or its submodules.
    pub fn module_classes(&self, module: &str, exclude: &HashSet<String>) -> Vec<&ClassDef> {
        self.classes
            .iter()
            .filter(|c| c.is_member_of(module) && !exclude.contains(&c.name))
            .collect()
    }

    /// Public functions visible in `module` and owned by it or its submodules.
    pub fn module_functions(&self, module: &str, exclude: &HashSet<String>) -> Vec<&FunctionDef> {
        self.functions
            .iter()
            .filter(|f| f.is_member_of(module) && !exclude.contains(&f.name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REGISTRY: &str = r#"{
        "package": "spektral",
        "classes": [
            {
                "name": "GCNConv",
                "module": "spektral.layers.convolution.gcn_conv",
                "doc": "A graph convolutional layer.",
                "line": 12,
                "exported_as": ["spektral.layers.GCNConv"],
                "init": {
                    "params": [
                        {"name": "self"},
                        {"name": "channels"},
                        {"name": "activation", "default": {"expr": "None"}}
                    ]
                },
                "methods": [
                    {"name": "call", "params": [{"name": "self"}, {"name": "inputs"}]},
                    {"name": "build", "params": [{"name": "self"}, {"name": "input_shape"}]},
                    {"name": "_helper", "params": [{"name": "self"}]}
                ]
            },
            {
                "name": "_Base",
                "module": "spektral.layers.convolution.conv",
                "exported_as": ["spektral.layers._Base"]
            },
            {
                "name": "ChebConv",
                "module": "spektral.layers.convolution.cheb_conv",
                "exported_as": ["spektral.layers.ChebConv"]
            }
        ],
        "functions": [
            {
                "name": "to_batch",
                "module": "spektral.data.utils",
                "params": [{"name": "x_list"}, {"name": "a_list", "default": {"expr": "None"}}]
            }
        ]
    }"#;

    fn registry() -> Registry {
        Registry::from_json(REGISTRY).unwrap()
    }

    #[test]
    fn test_parse_registry() {
        let registry = registry();
        assert_eq!(registry.package.as_deref(), Some("spektral"));
        assert_eq!(registry.classes.len(), 3);
        assert_eq!(registry.functions.len(), 1);
    }

    #[test]
    fn test_methods_inherit_class_module() {
        let registry = registry();
        let class = &registry.classes[0];
        assert_eq!(class.methods[0].module, "spektral.layers.convolution.gcn_conv");
    }

    #[test]
    fn test_find_class_by_definition_and_export() {
        let registry = registry();
        assert!(registry.find_class("spektral.layers.GCNConv").is_some());
        assert!(
            registry
                .find_class("spektral.layers.convolution.gcn_conv.GCNConv")
                .is_some()
        );
        assert!(registry.find_class("spektral.layers.Missing").is_none());
    }

    #[test]
    fn test_find_function() {
        let registry = registry();
        let function = registry.find_function("spektral.data.utils.to_batch").unwrap();
        assert_eq!(function.name, "to_batch");
    }

    #[test]
    fn test_find_method() {
        let registry = registry();
        let (class, method) = registry.find_method("spektral.layers.GCNConv.call").unwrap();
        assert_eq!(class.name, "GCNConv");
        assert_eq!(method.name, "call");
        assert!(registry.find_method("spektral.layers.GCNConv.fit").is_none());
    }

    #[test]
    fn test_class_method_lookup_accepts_qualified_name() {
        let registry = registry();
        let class = registry.find_class("spektral.layers.GCNConv").unwrap();
        assert_eq!(class.method("build").unwrap().name, "build");
        assert_eq!(
            class.method("spektral.layers.GCNConv.build").unwrap().name,
            "build"
        );
    }

    #[test]
    fn test_public_methods_sorted_and_filtered() {
        let registry = registry();
        let class = registry.find_class("spektral.layers.GCNConv").unwrap();

        let names: Vec<_> = class
            .public_methods(&HashSet::new())
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, vec!["build", "call"]);

        let exclude = HashSet::from(["call".to_owned()]);
        let names: Vec<_> = class
            .public_methods(&exclude)
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, vec!["build"]);
    }

    #[test]
    fn test_module_classes_skips_private_and_excluded() {
        let registry = registry();
        let names: Vec<_> = registry
            .module_classes("spektral.layers", &HashSet::new())
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["GCNConv", "ChebConv"]);

        let exclude = HashSet::from(["ChebConv".to_owned()]);
        let names: Vec<_> = registry
            .module_classes("spektral.layers", &exclude)
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["GCNConv"]);
    }

    #[test]
    fn test_module_functions() {
        let registry = registry();
        assert_eq!(
            registry
                .module_functions("spektral.data.utils", &HashSet::new())
                .len(),
            1
        );
        assert!(
            registry
                .module_functions("spektral.layers", &HashSet::new())
                .is_empty()
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Registry::load(&dir.path().join("registry.json")).unwrap_err();
        assert!(matches!(err, RegistryError::Io { .. }));
        assert!(err.to_string().contains("registry.json"));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Registry::load(&path).unwrap_err();
        assert!(matches!(err, RegistryError::Parse { .. }));
    }
}
