use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════
//  Scalar Kind
// ════════════════════════════════════════════════════════════════

/// Scalar target categories. The dynamic type system has one integer
/// width (64-bit) and one float width (64-bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Nil,
    Boolean,
    Int,
    Float,
    String,
    /// Byte sequence.
    Bytes,
    /// Accepts any dynamic value.
    Any,
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarKind::Nil => write!(f, "nil"),
            ScalarKind::Boolean => write!(f, "boolean"),
            ScalarKind::Int => write!(f, "int"),
            ScalarKind::Float => write!(f, "float"),
            ScalarKind::String => write!(f, "string"),
            ScalarKind::Bytes => write!(f, "bytes"),
            ScalarKind::Any => write!(f, "any"),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Shape Category
// ════════════════════════════════════════════════════════════════

/// Structural category a converter requires from its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeCategory {
    Array,
    Map,
    Record,
    Scalar,
}

impl std::fmt::Display for ShapeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeCategory::Array => write!(f, "array"),
            ShapeCategory::Map => write!(f, "map"),
            ShapeCategory::Record => write!(f, "record"),
            ShapeCategory::Scalar => write!(f, "scalar"),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Wrapper
// ════════════════════════════════════════════════════════════════

/// How a wrapped target refers to its inner type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wrapper {
    /// Named reference to the inner type.
    Alias { name: String },
    /// Inner type or nil.
    Optional,
    /// Values produced for the inner type are frozen.
    ReadOnly,
    /// Logical intersection of the inner type with metadata.
    Intersection {
        #[serde(default)]
        read_only: bool,
    },
}

impl Wrapper {
    pub fn is_read_only(&self) -> bool {
        matches!(self, Wrapper::ReadOnly | Wrapper::Intersection { read_only: true })
    }
}

// ════════════════════════════════════════════════════════════════
//  Record Type
// ════════════════════════════════════════════════════════════════

/// One declared field of a record target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldType {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TargetType,
    /// Field may be left unset.
    #[serde(default)]
    pub optional: bool,
}

impl FieldType {
    pub fn new(name: impl Into<String>, ty: TargetType) -> Self {
        Self { name: name.into(), ty, optional: false }
    }

    /// Shortcut: optional field.
    pub fn optional(name: impl Into<String>, ty: TargetType) -> Self {
        Self { name: name.into(), ty, optional: true }
    }
}

/// Record target. Field order is declaration order.
///
/// `rest` is the type of undeclared fields, `None` means the record is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordType {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldType>,
    #[serde(default)]
    pub rest: Option<Box<TargetType>>,
}

impl RecordType {
    pub fn new(name: Option<String>, fields: Vec<FieldType>) -> Self {
        Self { name, fields, rest: None }
    }

    pub fn field(&self, name: &str) -> Option<&FieldType> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Target type for a field name: the declared field, else the rest type.
    pub fn field_type(&self, name: &str) -> Option<&TargetType> {
        self.field(name).map(|f| &f.ty).or(self.rest.as_deref())
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }
}

// ════════════════════════════════════════════════════════════════
//  Target Type
// ════════════════════════════════════════════════════════════════

/// Target type descriptor. Deserializable from JSON or TOML:
///
/// ```json
/// { "kind": "record", "name": "User", "fields": [
///     { "name": "name", "type": { "kind": "scalar", "scalar": "string" } },
///     { "name": "tags", "type": { "kind": "array",
///         "element": { "kind": "scalar", "scalar": "string" } } }
/// ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetType {
    Scalar { scalar: ScalarKind },
    Array { element: Box<TargetType> },
    Map { value: Box<TargetType> },
    Record(RecordType),
    Wrapped { wrapper: Wrapper, inner: Box<TargetType> },
}

impl TargetType {
    pub fn scalar(kind: ScalarKind) -> Self {
        TargetType::Scalar { scalar: kind }
    }

    pub fn nil() -> Self {
        Self::scalar(ScalarKind::Nil)
    }

    pub fn boolean() -> Self {
        Self::scalar(ScalarKind::Boolean)
    }

    pub fn int() -> Self {
        Self::scalar(ScalarKind::Int)
    }

    pub fn float() -> Self {
        Self::scalar(ScalarKind::Float)
    }

    pub fn string() -> Self {
        Self::scalar(ScalarKind::String)
    }

    pub fn bytes() -> Self {
        Self::scalar(ScalarKind::Bytes)
    }

    pub fn any() -> Self {
        Self::scalar(ScalarKind::Any)
    }

    pub fn array(element: TargetType) -> Self {
        TargetType::Array { element: Box::new(element) }
    }

    pub fn map(value: TargetType) -> Self {
        TargetType::Map { value: Box::new(value) }
    }

    pub fn record(name: impl Into<String>, fields: Vec<FieldType>) -> Self {
        TargetType::Record(RecordType::new(Some(name.into()), fields))
    }

    pub fn wrap(wrapper: Wrapper, inner: TargetType) -> Self {
        TargetType::Wrapped { wrapper, inner: Box::new(inner) }
    }

    pub fn alias(name: impl Into<String>, inner: TargetType) -> Self {
        Self::wrap(Wrapper::Alias { name: name.into() }, inner)
    }

    pub fn optional(inner: TargetType) -> Self {
        Self::wrap(Wrapper::Optional, inner)
    }

    pub fn read_only(inner: TargetType) -> Self {
        Self::wrap(Wrapper::ReadOnly, inner)
    }

    /// Structural category, `None` for wrapped types.
    pub fn category(&self) -> Option<ShapeCategory> {
        match self {
            TargetType::Scalar { .. } => Some(ShapeCategory::Scalar),
            TargetType::Array { .. } => Some(ShapeCategory::Array),
            TargetType::Map { .. } => Some(ShapeCategory::Map),
            TargetType::Record(_) => Some(ShapeCategory::Record),
            TargetType::Wrapped { .. } => None,
        }
    }

    /// Follow one wrapper link.
    pub fn unwrap_once(&self) -> Option<&TargetType> {
        match self {
            TargetType::Wrapped { inner, .. } => Some(inner),
            _ => None,
        }
    }

    /// First non-wrapped type, following at most `limit` wrapper links.
    pub fn innermost(&self, limit: usize) -> Option<&TargetType> {
        let mut current = self;
        for _ in 0..=limit {
            match current.unwrap_once() {
                Some(inner) => current = inner,
                None => return Some(current),
            }
        }
        None
    }

    /// `true` if any wrapper on the chain marks the type read-only.
    pub fn is_frozen(&self) -> bool {
        let mut current = self;
        while let TargetType::Wrapped { wrapper, inner } = current {
            if wrapper.is_read_only() {
                return true;
            }
            current = inner;
        }
        false
    }

    /// `true` if nil is a legal value for this type.
    pub fn admits_nil(&self) -> bool {
        match self {
            TargetType::Scalar { scalar } => matches!(scalar, ScalarKind::Nil | ScalarKind::Any),
            TargetType::Wrapped { wrapper: Wrapper::Optional, .. } => true,
            TargetType::Wrapped { inner, .. } => inner.admits_nil(),
            _ => false,
        }
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetType::Scalar { scalar } => write!(f, "{scalar}"),
            TargetType::Array { element } => write!(f, "array<{element}>"),
            TargetType::Map { value } => write!(f, "map<{value}>"),
            TargetType::Record(r) => write!(f, "record {}", r.display_name()),
            TargetType::Wrapped { wrapper, inner } => match wrapper {
                Wrapper::Alias { name } => write!(f, "{name}"),
                Wrapper::Optional => write!(f, "{inner}?"),
                Wrapper::ReadOnly => write!(f, "readonly<{inner}>"),
                Wrapper::Intersection { read_only: true } => write!(f, "readonly & {inner}"),
                Wrapper::Intersection { read_only: false } => write!(f, "intersection<{inner}>"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frozen_flag_found_behind_alias() {
        let ty = TargetType::alias("Frozen", TargetType::read_only(TargetType::map(TargetType::int())));
        assert!(ty.is_frozen());
        assert!(!TargetType::alias("Plain", TargetType::map(TargetType::int())).is_frozen());
    }

    #[test]
    fn innermost_respects_limit() {
        let ty = TargetType::optional(TargetType::alias("A", TargetType::string()));
        assert_eq!(ty.innermost(2), Some(&TargetType::string()));
        assert_eq!(ty.innermost(1), None);
    }

    #[test]
    fn parses_json_descriptor() {
        let json = r#"{
            "kind": "record", "name": "User",
            "fields": [
                { "name": "name", "type": { "kind": "scalar", "scalar": "string" } },
                { "name": "tags", "type": { "kind": "wrapped", "wrapper": "read_only",
                    "inner": { "kind": "array", "element": { "kind": "scalar", "scalar": "string" } } } }
            ]
        }"#;
        let ty: TargetType = serde_json::from_str(json).unwrap();
        let TargetType::Record(rec) = &ty else { panic!("expected record") };
        assert_eq!(rec.fields.len(), 2);
        assert!(rec.field("tags").unwrap().ty.is_frozen());
        assert_eq!(rec.field_type("missing"), None);
    }

    #[test]
    fn parses_toml_descriptor() {
        let src = r#"
            kind = "map"
            [value]
            kind = "wrapped"
            wrapper = { alias = { name = "Score" } }
            inner = { kind = "scalar", scalar = "float" }
        "#;
        let ty: TargetType = toml::from_str(src).unwrap();
        assert_eq!(ty.to_string(), "map<Score>");
    }

    #[test]
    fn optional_admits_nil() {
        assert!(TargetType::optional(TargetType::int()).admits_nil());
        assert!(TargetType::alias("Maybe", TargetType::optional(TargetType::int())).admits_nil());
        assert!(!TargetType::int().admits_nil());
        assert!(TargetType::any().admits_nil());
    }
}
