use materialize_api::ValueError;

use crate::shape::SchemaShape;

#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    #[error("type mismatch: expected {expected} target, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("unsupported primitive shape: {0}")]
    UnsupportedPrimitiveShape(SchemaShape),

    #[error("decoded value does not match {expected} schema: found {found}")]
    ValueShape { expected: SchemaShape, found: &'static str },

    #[error("field '{field}' is not declared by record {record}")]
    UndeclaredField { record: String, field: String },

    #[error("unresolved schema reference: {0}")]
    UnresolvedReference(String),

    #[error("recursion depth limit {limit} exceeded")]
    DepthExceeded { limit: usize },

    #[error("coercion failed: {0}")]
    Coercion(#[from] ValueError),

    #[error("config error: {0}")]
    Config(String),

    #[error("avro error: {0}")]
    Avro(#[from] apache_avro::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{path}: {source}")]
    At {
        path: String,
        source: Box<MaterializeError>,
    },
}

impl MaterializeError {
    pub(crate) fn mismatch(expected: impl std::fmt::Display, found: impl std::fmt::Display) -> Self {
        MaterializeError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Prefix a path segment (`"name"` or `"[3]"`) to the error.
    ///
    /// Nested calls build dotted paths: `user.tags[3]`.
    pub fn with_context(self, segment: impl std::fmt::Display) -> Self {
        let segment = segment.to_string();
        match self {
            MaterializeError::At { path, source } => {
                let path = if path.starts_with('[') {
                    format!("{segment}{path}")
                } else {
                    format!("{segment}.{path}")
                };
                MaterializeError::At { path, source }
            }
            other => MaterializeError::At {
                path: segment,
                source: Box::new(other),
            },
        }
    }

    /// The error without any path context.
    pub fn root_cause(&self) -> &MaterializeError {
        match self {
            MaterializeError::At { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Schema path where the error occurred, if known.
    pub fn path(&self) -> Option<&str> {
        match self {
            MaterializeError::At { path, .. } => Some(path),
            _ => None,
        }
    }
}
