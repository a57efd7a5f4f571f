//! Call signature rendering.

use docgen_registry::{ClassDef, FunctionDef, Param};

/// Renders human-readable call signatures for registry callables.
#[derive(Debug, Clone)]
pub struct SignatureRenderer {
    /// Second-level namespaces whose deep paths collapse to `pkg.namespace.Symbol`.
    canonical_namespaces: Vec<String>,
}

impl SignatureRenderer {
    /// Create a renderer that canonicalizes paths under the given namespaces.
    pub fn new(canonical_namespaces: Vec<String>) -> Self {
        Self {
            canonical_namespaces,
        }
    }

    /// Signature of a module-level function: `module.name(args)`.
    pub fn function(&self, function: &FunctionDef) -> String {
        let signature = render_call(
            &function.qualified_name(),
            function.signature_params(),
            false,
        );
        self.canonicalize(&signature)
    }

    /// Signature of a method without its module prefix or receiver: `name(args)`.
    pub fn method(&self, method: &FunctionDef) -> String {
        render_call(&method.name, method.signature_params(), true)
    }

    /// Signature of a class constructor, named after the class.
    ///
    /// Falls back to an empty argument list when the class has no constructor.
    pub fn class(&self, class: &ClassDef) -> String {
        let signature = match &class.init {
            Some(init) => {
                let module = init.module.as_deref().unwrap_or(&class.module);
                let path = if module.is_empty() {
                    class.name.clone()
                } else {
                    format!("{module}.{}", class.name)
                };
                render_call(&path, init.signature_params(), true)
            }
            None => format!("{}()", class.qualified_name()),
        };
        self.canonicalize(&signature)
    }

    /// Collapse `pkg.namespace.sub.Symbol(...)` to `pkg.namespace.Symbol(...)`.
    ///
    /// Only the dotted path before the argument list is considered.
    pub fn canonicalize(&self, signature: &str) -> String {
        let (path, args) = signature
            .find('(')
            .map_or((signature, ""), |idx| signature.split_at(idx));
        let segments: Vec<&str> = path.split('.').collect();

        match segments.as_slice() {
            [package, namespace, .., symbol]
                if segments.len() >= 4
                    && self.canonical_namespaces.iter().any(|n| n == namespace) =>
            {
                format!("{package}.{namespace}.{symbol}{args}")
            }
            _ => signature.to_owned(),
        }
    }
}

/// Render `path(positional..., keyword=default...)`.
fn render_call(path: &str, params: &[Param], skip_receiver: bool) -> String {
    let params = if skip_receiver {
        params.get(1..).unwrap_or_default()
    } else {
        params
    };

    let positional = params
        .iter()
        .filter(|p| p.default.is_none())
        .map(|p| p.name.clone());
    let keyword = params
        .iter()
        .filter_map(|p| p.default.as_ref().map(|d| format!("{}={d}", p.name)));
    let args: Vec<String> = positional.chain(keyword).collect();

    format!("{path}({})", args.join(", "))
}
