//! Symbol definitions as recorded in the registry file.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Deserializer};

/// A single declared parameter of a callable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Param {
    /// Parameter name as declared.
    pub name: String,
    /// Default value, if the parameter has one.
    ///
    /// A JSON `null` default is Python's `None`; only a missing key means no default.
    #[serde(default, deserialize_with = "deserialize_default")]
    pub default: Option<DefaultValue>,
}

fn deserialize_default<'de, D>(deserializer: D) -> Result<Option<DefaultValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<DefaultValue>::deserialize(deserializer)?;
    Ok(Some(value.unwrap_or_else(|| DefaultValue::expr("None"))))
}

impl Param {
    /// Create a parameter without a default.
    pub fn positional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    /// Create a parameter with a default value.
    pub fn keyword(name: impl Into<String>, default: DefaultValue) -> Self {
        Self {
            name: name.into(),
            default: Some(default),
        }
    }
}

/// Default value of a parameter.
///
/// JSON scalars map onto Python literals. Anything else (`None`, `tf.float32`,
/// a lambda) is recorded as `{"expr": "..."}` and printed verbatim.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Expr { expr: String },
}

impl DefaultValue {
    /// Shorthand for a raw expression default.
    pub fn expr(expr: impl Into<String>) -> Self {
        Self::Expr { expr: expr.into() }
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => f.write_str(&python_float_repr(*value)),
            Self::Str(value) => write!(f, "'{value}'"),
            Self::Expr { expr } => f.write_str(expr),
        }
    }
}

/// Format a float the way Python's `repr` does.
///
/// Shortest round-trip digits, positional between `1e-4` and `1e16`, otherwise
/// scientific with a signed exponent of at least two digits.
fn python_float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_owned();
    }

    let scientific = format!("{value:e}");
    let (mantissa, exponent) = scientific
        .split_once('e')
        .map_or((scientific.as_str(), 0), |(m, e)| (m, e.parse::<i32>().unwrap_or(0)));

    if (-4..16).contains(&exponent) {
        let positional = format!("{value}");
        if positional.contains('.') {
            positional
        } else {
            format!("{positional}.0")
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
    }
}

/// A module-level function or a method.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionDef {
    /// Bare function name (`to_batch`, `fit`).
    pub name: String,
    /// Defining module. Filled from the owning class for methods.
    #[serde(default)]
    pub module: String,
    /// Declared parameters, including the receiver for methods.
    #[serde(default)]
    pub params: Vec<Param>,
    /// Parameters of the original callable when this one is a decorator wrapper.
    #[serde(default)]
    pub wrapped: Option<Vec<Param>>,
    /// Raw docstring.
    #[serde(default)]
    pub doc: Option<String>,
    /// First source line of the definition.
    #[serde(default)]
    pub line: Option<u32>,
    /// Public paths this function is re-exported under.
    #[serde(default)]
    pub exported_as: Vec<String>,
}

impl FunctionDef {
    /// Dotted path of the definition site.
    pub fn qualified_name(&self) -> String {
        qualify(&self.module, &self.name)
    }

    /// Parameters that describe the callable's true signature.
    pub fn signature_params(&self) -> &[Param] {
        self.wrapped.as_deref().unwrap_or(&self.params)
    }

    /// Docstring, if present and not blank.
    pub fn docstring(&self) -> Option<&str> {
        non_blank(self.doc.as_deref())
    }

    pub(crate) fn matches_path(&self, path: &str) -> bool {
        self.qualified_name() == path || self.exported_as.iter().any(|p| p == path)
    }

    pub(crate) fn is_member_of(&self, module: &str) -> bool {
        is_member_of(&self.module, &self.name, &self.exported_as, module)
    }
}

/// A class constructor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Constructor {
    /// Module defining the constructor when inherited from another module.
    #[serde(default)]
    pub module: Option<String>,
    /// Declared parameters including `self`.
    #[serde(default)]
    pub params: Vec<Param>,
    /// Parameters of the original callable when the constructor is wrapped.
    #[serde(default)]
    pub wrapped: Option<Vec<Param>>,
}

impl Constructor {
    /// Parameters that describe the constructor's true signature.
    pub fn signature_params(&self) -> &[Param] {
        self.wrapped.as_deref().unwrap_or(&self.params)
    }
}

/// A public class.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassDef {
    /// Class name.
    pub name: String,
    /// Defining module.
    pub module: String,
    /// Raw class docstring.
    #[serde(default)]
    pub doc: Option<String>,
    /// First source line of the class statement.
    #[serde(default)]
    pub line: Option<u32>,
    /// Explicit constructor, `None` when the class inherits `object.__init__`.
    #[serde(default)]
    pub init: Option<Constructor>,
    /// Methods in declaration order.
    #[serde(default)]
    pub methods: Vec<FunctionDef>,
    /// Public paths this class is re-exported under.
    #[serde(default)]
    pub exported_as: Vec<String>,
}

impl ClassDef {
    /// Dotted path of the definition site.
    pub fn qualified_name(&self) -> String {
        qualify(&self.module, &self.name)
    }

    /// Docstring, if present and not blank.
    pub fn docstring(&self) -> Option<&str> {
        non_blank(self.doc.as_deref())
    }

    /// Look up a method by bare name or by a dotted path ending in the method name.
    pub fn method(&self, name: &str) -> Option<&FunctionDef> {
        let bare = name.rsplit_once('.').map_or(name, |(_, last)| last);
        self.methods.iter().find(|m| m.name == bare)
    }

    /// Public methods sorted by name, skipping names in `exclude`.
    pub fn public_methods(&self, exclude: &HashSet<String>) -> Vec<&FunctionDef> {
        let mut methods: Vec<_> = self
            .methods
            .iter()
            .filter(|m| !m.name.starts_with('_') && !exclude.contains(&m.name))
            .collect();
        methods.sort_by(|a, b| a.name.cmp(&b.name));
        methods
    }

    pub(crate) fn matches_path(&self, path: &str) -> bool {
        self.qualified_name() == path || self.exported_as.iter().any(|p| p == path)
    }

    pub(crate) fn is_member_of(&self, module: &str) -> bool {
        is_member_of(&self.module, &self.name, &self.exported_as, module)
    }
}

fn qualify(module: &str, name: &str) -> String {
    if module.is_empty() {
        name.to_owned()
    } else {
        format!("{module}.{name}")
    }
}

fn non_blank(doc: Option<&str>) -> Option<&str> {
    doc.filter(|d| !d.trim().is_empty())
}

/// Whether a symbol is visible in `module` and owned by it or one of its submodules.
fn is_member_of(owner: &str, name: &str, exported_as: &[String], module: &str) -> bool {
    let visible = owner == module
        || exported_as
            .iter()
            .any(|path| path.rsplit_once('.').is_some_and(|(parent, _)| parent == module));
    let owned = owner == module
        || owner
            .strip_prefix(module)
            .is_some_and(|rest| rest.starts_with('.'));
    visible && owned && !name.starts_with('_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_value_display() {
        assert_eq!(DefaultValue::Bool(true).to_string(), "True");
        assert_eq!(DefaultValue::Bool(false).to_string(), "False");
        assert_eq!(DefaultValue::Int(-3).to_string(), "-3");
        assert_eq!(DefaultValue::Float(1.0).to_string(), "1.0");
        assert_eq!(DefaultValue::Float(0.25).to_string(), "0.25");
        assert_eq!(DefaultValue::Str("relu".to_owned()).to_string(), "'relu'");
        assert_eq!(DefaultValue::expr("None").to_string(), "None");
    }

    #[test]
    fn test_float_default_matches_python_repr() {
        let cases = [
            (1e-5, "1e-05"),
            (1e-7, "1e-07"),
            (1.5e-7, "1.5e-07"),
            (-2.5e-6, "-2.5e-06"),
            (1e-4, "0.0001"),
            (0.001, "0.001"),
            (0.0, "0.0"),
            (123.456, "123.456"),
            (1e15, "1000000000000000.0"),
            (1e16, "1e+16"),
            (2.5e20, "2.5e+20"),
            (1e100, "1e+100"),
            (f64::INFINITY, "inf"),
        ];
        for (value, expected) in cases {
            assert_eq!(DefaultValue::Float(value).to_string(), expected, "{value:?}");
        }
    }

    #[test]
    fn test_default_value_from_json() {
        let params: Vec<Param> = serde_json::from_str(
            r#"[
                {"name": "a"},
                {"name": "b", "default": 2},
                {"name": "c", "default": 0.5},
                {"name": "d", "default": "sum"},
                {"name": "e", "default": false},
                {"name": "f", "default": {"expr": "tf.float32"}}
            ]"#,
        )
        .unwrap();

        assert_eq!(params[0].default, None);
        assert_eq!(params[1].default, Some(DefaultValue::Int(2)));
        assert_eq!(params[2].default, Some(DefaultValue::Float(0.5)));
        assert_eq!(params[3].default, Some(DefaultValue::Str("sum".to_owned())));
        assert_eq!(params[4].default, Some(DefaultValue::Bool(false)));
        assert_eq!(params[5].default, Some(DefaultValue::expr("tf.float32")));
    }

    #[test]
    fn test_null_default_is_python_none() {
        let missing: Param = serde_json::from_str(r#"{"name": "y"}"#).unwrap();
        assert_eq!(missing.default, None);

        let null: Param = serde_json::from_str(r#"{"name": "y", "default": null}"#).unwrap();
        assert_eq!(null.default, Some(DefaultValue::expr("None")));
        assert_eq!(null.default.unwrap().to_string(), "None");
    }

    #[test]
    fn test_signature_params_prefers_wrapped() {
        let function = FunctionDef {
            name: "f".to_owned(),
            module: "pkg".to_owned(),
            params: vec![Param::positional("args"), Param::positional("kwargs")],
            wrapped: Some(vec![Param::positional("x")]),
            doc: None,
            line: None,
            exported_as: Vec::new(),
        };
        assert_eq!(function.signature_params(), &[Param::positional("x")]);
    }

    #[test]
    fn test_blank_docstring_is_none() {
        let class = ClassDef {
            name: "A".to_owned(),
            module: "pkg".to_owned(),
            doc: Some("   \n  ".to_owned()),
            line: None,
            init: None,
            methods: Vec::new(),
            exported_as: Vec::new(),
        };
        assert!(class.docstring().is_none());
    }

    #[test]
    fn test_is_member_of() {
        let exported = vec!["pkg.layers.GCNConv".to_owned()];
        assert!(is_member_of("pkg.layers.conv", "GCNConv", &exported, "pkg.layers"));
        assert!(is_member_of("pkg.layers.conv", "GCNConv", &exported, "pkg.layers.conv"));
        // Re-exported from a module it does not live under
        assert!(!is_member_of("vendor.conv", "GCNConv", &["pkg.GCNConv".to_owned()], "pkg"));
        assert!(!is_member_of("pkg.layersx", "X", &["pkg.layers.X".to_owned()], "pkg.layers"));
        assert!(!is_member_of("pkg.layers", "_Private", &[], "pkg.layers"));
    }
}
