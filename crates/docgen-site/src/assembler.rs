//! Resolves manifest pages against the registry and renders them to Markdown.

use std::collections::HashSet;

use docgen_config::{MethodSelection, PageSpec};
use docgen_registry::{ClassDef, FunctionDef, Registry};
use docgen_render::{SignatureRenderer, process_docstring};

use crate::BuildError;

/// Separator between symbol blocks on a page.
const BLOCK_SEPARATOR: &str = "\n----\n\n";

/// Separator between methods inside a class block.
const METHOD_SEPARATOR: &str = "\n---\n";

/// A class with its selected methods.
#[derive(Debug)]
pub(crate) struct ResolvedClass<'r> {
    pub class: &'r ClassDef,
    /// Whether the manifest asked for methods, even if the selection came out empty.
    pub with_methods: bool,
    pub methods: Vec<&'r FunctionDef>,
}

/// A page with every manifest reference looked up.
#[derive(Debug, Default)]
pub(crate) struct ResolvedPage<'r> {
    pub classes: Vec<ResolvedClass<'r>>,
    pub methods: Vec<&'r FunctionDef>,
    pub functions: Vec<&'r FunctionDef>,
}

impl ResolvedPage<'_> {
    /// Number of top-level blocks the page renders.
    pub fn symbol_count(&self) -> usize {
        self.classes.len() + self.methods.len() + self.functions.len()
    }
}

/// Renders manifest pages.
pub(crate) struct PageAssembler<'r> {
    registry: &'r Registry,
    signatures: SignatureRenderer,
    exclude: &'r HashSet<String>,
    repository_url: Option<&'r str>,
}

impl<'r> PageAssembler<'r> {
    pub fn new(
        registry: &'r Registry,
        signatures: SignatureRenderer,
        exclude: &'r HashSet<String>,
        repository_url: Option<&'r str>,
    ) -> Self {
        Self {
            registry,
            signatures,
            exclude,
            repository_url,
        }
    }

    /// Look up every symbol a page spec names.
    ///
    /// Literal references come first, in manifest order, followed by module
    /// wildcard matches not already on the page.
    pub fn resolve(&self, spec: &PageSpec) -> Result<ResolvedPage<'r>, BuildError> {
        let mut page = ResolvedPage::default();

        for entry in &spec.classes {
            let class = self
                .registry
                .find_class(entry.class())
                .ok_or_else(|| BuildError::UnknownClass(entry.class().to_owned()))?;
            let methods = match entry.methods() {
                Some(selection) => self.select_methods(class, selection)?,
                None => Vec::new(),
            };
            page.classes.push(ResolvedClass {
                class,
                with_methods: entry.methods().is_some(),
                methods,
            });
        }
        for module in &spec.all_module_classes {
            for class in self.registry.module_classes(module, self.exclude) {
                if !page.classes.iter().any(|c| std::ptr::eq(c.class, class)) {
                    page.classes.push(ResolvedClass {
                        class,
                        with_methods: false,
                        methods: Vec::new(),
                    });
                }
            }
        }

        for path in &spec.methods {
            let (_, method) = self
                .registry
                .find_method(path)
                .ok_or_else(|| BuildError::UnknownMethod(path.clone()))?;
            page.methods.push(method);
        }

        for path in &spec.functions {
            let function = self
                .registry
                .find_function(path)
                .ok_or_else(|| BuildError::UnknownFunction(path.clone()))?;
            page.functions.push(function);
        }
        for module in &spec.all_module_functions {
            for function in self.registry.module_functions(module, self.exclude) {
                if !page.functions.iter().any(|f| std::ptr::eq(*f, function)) {
                    page.functions.push(function);
                }
            }
        }

        Ok(page)
    }

    fn select_methods(
        &self,
        class: &'r ClassDef,
        selection: &MethodSelection,
    ) -> Result<Vec<&'r FunctionDef>, BuildError> {
        match selection {
            MethodSelection::All => Ok(class.public_methods(self.exclude)),
            MethodSelection::Names(names) => names
                .iter()
                .map(|name| {
                    class.method(name).ok_or_else(|| {
                        BuildError::UnknownMethod(format!("{}.{name}", class.qualified_name()))
                    })
                })
                .collect(),
        }
    }

    /// Render a resolved page to Markdown.
    pub fn render(&self, page: &ResolvedPage<'_>) -> String {
        let classes = page.classes.iter().map(|c| self.render_class(c));
        let methods = page.methods.iter().map(|m| self.render_function(m, true));
        let functions = page.functions.iter().map(|f| self.render_function(f, false));

        classes
            .chain(methods)
            .chain(functions)
            .collect::<Vec<_>>()
            .join(BLOCK_SEPARATOR)
    }

    fn render_class(&self, resolved: &ResolvedClass<'_>) -> String {
        let class = resolved.class;
        let mut parts = Vec::new();

        if let Some(link) = self.source_link(class) {
            parts.push(format!("<span style=\"float:right;\">{link}</span>"));
        }
        if resolved.with_methods {
            parts.push(format!("## {} class\n", class.name));
        } else {
            parts.push(format!("### {}\n", class.name));
        }
        parts.push(code_snippet(&self.signatures.class(class)));
        if let Some(doc) = class.docstring() {
            parts.push(process_docstring(doc));
        }

        if !resolved.methods.is_empty() {
            parts.push("\n---".to_owned());
            parts.push(format!("## {} methods\n", class.name));
            parts.push(
                resolved
                    .methods
                    .iter()
                    .map(|m| self.render_function(m, true))
                    .collect::<Vec<_>>()
                    .join(METHOD_SEPARATOR),
            );
        }

        parts.join("\n")
    }

    fn render_function(&self, function: &FunctionDef, is_method: bool) -> String {
        let signature = if is_method {
            self.signatures.method(function)
        } else {
            self.signatures.function(function)
        };

        let mut parts = vec![format!("### {}\n", function.name), code_snippet(&signature)];
        if let Some(doc) = function.docstring() {
            parts.push(process_docstring(doc));
        }
        parts.join("\n\n")
    }

    /// `[[source]](url)` pointing at the class definition.
    fn source_link(&self, class: &ClassDef) -> Option<String> {
        let base = self.repository_url?;
        let mut url = format!("{base}{}.py", class.module.replace('.', "/"));
        if let Some(line) = class.line {
            url.push_str(&format!("#L{line}"));
        }
        Some(format!("[[source]]({url})"))
    }
}

fn code_snippet(signature: &str) -> String {
    format!("```python\n{signature}\n```\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgen_config::ClassEntry;
    use pretty_assertions::assert_eq;

    const REGISTRY: &str = r#"{
        "package": "spektral",
        "classes": [
            {
                "name": "GCNConv",
                "module": "spektral.layers.convolution.gcn_conv",
                "doc": "A graph convolutional layer.",
                "line": 10,
                "exported_as": ["spektral.layers.GCNConv"],
                "init": {
                    "params": [
                        {"name": "self"},
                        {"name": "channels"},
                        {"name": "activation", "default": {"expr": "None"}}
                    ]
                }
            },
            {
                "name": "Dataset",
                "module": "spektral.data.dataset",
                "doc": "A container for graphs.",
                "exported_as": ["spektral.data.Dataset"],
                "methods": [
                    {"name": "read", "params": [{"name": "self"}], "doc": "Returns a list of graphs."},
                    {"name": "download", "params": [{"name": "self"}]},
                    {"name": "_cache", "params": [{"name": "self"}]}
                ]
            },
            {
                "name": "Graph",
                "module": "spektral.data.graph",
                "exported_as": ["spektral.data.Graph"]
            }
        ],
        "functions": [
            {
                "name": "degree_matrix",
                "module": "spektral.utils.convolution",
                "params": [{"name": "A"}],
                "doc": "Computes the degree matrix."
            },
            {
                "name": "one_hot",
                "module": "spektral.utils.misc",
                "params": [{"name": "x"}, {"name": "depth"}]
            }
        ]
    }"#;

    fn registry() -> Registry {
        Registry::from_json(REGISTRY).unwrap()
    }

    fn spec() -> PageSpec {
        PageSpec {
            page: "page.md".to_owned(),
            classes: Vec::new(),
            methods: Vec::new(),
            functions: Vec::new(),
            all_module_classes: Vec::new(),
            all_module_functions: Vec::new(),
        }
    }

    fn render(registry: &Registry, spec: &PageSpec, repository_url: Option<&str>) -> String {
        let exclude = HashSet::new();
        let assembler = PageAssembler::new(
            registry,
            SignatureRenderer::new(vec!["layers".to_owned(), "utils".to_owned()]),
            &exclude,
            repository_url,
        );
        let page = assembler.resolve(spec).unwrap();
        assembler.render(&page)
    }

    #[test]
    fn test_render_class_block() {
        let registry = registry();
        let spec = PageSpec {
            classes: vec![ClassEntry::Class("spektral.layers.GCNConv".to_owned())],
            ..spec()
        };

        assert_eq!(
            render(
                &registry,
                &spec,
                Some("https://github.com/danielegrattarola/spektral/blob/master/")
            ),
            "<span style=\"float:right;\">[[source]](https://github.com/danielegrattarola/spektral/blob/master/spektral/layers/convolution/gcn_conv.py#L10)</span>\n\
             ### GCNConv\n\n\
             ```python\nspektral.layers.GCNConv(channels, activation=None)\n```\n\n\
             A graph convolutional layer."
        );
    }

    #[test]
    fn test_render_class_without_source_link() {
        let registry = registry();
        let spec = PageSpec {
            classes: vec![ClassEntry::Class("spektral.data.Graph".to_owned())],
            ..spec()
        };

        assert_eq!(
            render(&registry, &spec, None),
            "### Graph\n\n```python\nspektral.data.graph.Graph()\n```\n"
        );
    }

    #[test]
    fn test_render_class_with_all_methods() {
        let registry = registry();
        let spec = PageSpec {
            classes: vec![ClassEntry::WithMethods {
                class: "spektral.data.Dataset".to_owned(),
                methods: MethodSelection::All,
            }],
            ..spec()
        };

        assert_eq!(
            render(&registry, &spec, None),
            "## Dataset class\n\n\
             ```python\nspektral.data.dataset.Dataset()\n```\n\n\
             A container for graphs.\n\
             \n---\n\
             ## Dataset methods\n\n\
             ### download\n\n\n\
             ```python\ndownload()\n```\n\
             \n---\n\
             ### read\n\n\n\
             ```python\nread()\n```\n\n\n\
             Returns a list of graphs."
        );
    }

    #[test]
    fn test_named_methods_keep_manifest_order() {
        let registry = registry();
        let exclude = HashSet::new();
        let assembler = PageAssembler::new(
            &registry,
            SignatureRenderer::new(Vec::new()),
            &exclude,
            None,
        );
        let spec = PageSpec {
            classes: vec![ClassEntry::WithMethods {
                class: "spektral.data.Dataset".to_owned(),
                methods: MethodSelection::Names(vec![
                    "read".to_owned(),
                    "spektral.data.Dataset.download".to_owned(),
                ]),
            }],
            ..spec()
        };

        let page = assembler.resolve(&spec).unwrap();
        let names: Vec<_> = page.classes[0].methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["read", "download"]);
    }

    #[test]
    fn test_render_functions_joined_with_rule() {
        let registry = registry();
        let spec = PageSpec {
            functions: vec![
                "spektral.utils.convolution.degree_matrix".to_owned(),
                "spektral.utils.misc.one_hot".to_owned(),
            ],
            ..spec()
        };

        assert_eq!(
            render(&registry, &spec, None),
            "### degree_matrix\n\n\n\
             ```python\nspektral.utils.degree_matrix(A)\n```\n\n\n\
             Computes the degree matrix.\
             \n----\n\n\
             ### one_hot\n\n\n\
             ```python\nspektral.utils.one_hot(x, depth)\n```\n"
        );
    }

    #[test]
    fn test_page_methods_render_without_module() {
        let registry = registry();
        let spec = PageSpec {
            methods: vec!["spektral.data.Dataset.download".to_owned()],
            ..spec()
        };

        assert_eq!(
            render(&registry, &spec, None),
            "### download\n\n\n```python\ndownload()\n```\n"
        );
    }

    #[test]
    fn test_module_wildcard_skips_duplicates() {
        let registry = registry();
        let exclude = HashSet::new();
        let assembler = PageAssembler::new(
            &registry,
            SignatureRenderer::new(Vec::new()),
            &exclude,
            None,
        );
        let spec = PageSpec {
            classes: vec![ClassEntry::Class("spektral.data.Graph".to_owned())],
            all_module_classes: vec!["spektral.data".to_owned()],
            ..spec()
        };

        let page = assembler.resolve(&spec).unwrap();
        let names: Vec<_> = page.classes.iter().map(|c| c.class.name.as_str()).collect();
        assert_eq!(names, vec!["Graph", "Dataset"]);
        assert_eq!(page.symbol_count(), 2);
    }

    #[test]
    fn test_empty_page_renders_empty() {
        let registry = registry();
        assert_eq!(render(&registry, &spec(), None), "");
    }

    #[test]
    fn test_unknown_references_fail() {
        let registry = registry();
        let exclude = HashSet::new();
        let assembler = PageAssembler::new(
            &registry,
            SignatureRenderer::new(Vec::new()),
            &exclude,
            None,
        );

        let spec_class = PageSpec {
            classes: vec![ClassEntry::Class("spektral.layers.Nope".to_owned())],
            ..spec()
        };
        assert!(matches!(
            assembler.resolve(&spec_class),
            Err(BuildError::UnknownClass(path)) if path == "spektral.layers.Nope"
        ));

        let spec_method = PageSpec {
            classes: vec![ClassEntry::WithMethods {
                class: "spektral.data.Dataset".to_owned(),
                methods: MethodSelection::Names(vec!["fit".to_owned()]),
            }],
            ..spec()
        };
        assert!(matches!(
            assembler.resolve(&spec_method),
            Err(BuildError::UnknownMethod(path)) if path == "spektral.data.dataset.Dataset.fit"
        ));

        let spec_function = PageSpec {
            functions: vec!["spektral.utils.nope".to_owned()],
            ..spec()
        };
        assert!(matches!(
            assembler.resolve(&spec_function),
            Err(BuildError::UnknownFunction(_))
        ));
    }
}
