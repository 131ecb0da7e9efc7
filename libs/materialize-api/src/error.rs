use std::fmt;

/// Error kind for value construction errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Value cannot be coerced into the requested target type.
    Coercion,
    /// Mutation attempted on a frozen container.
    Frozen,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Coercion => f.write_str("coercion"),
            ErrorKind::Frozen => f.write_str("frozen"),
        }
    }
}

/// Error returned by the value construction layer (builders, freezing, coercion).
#[derive(Debug, Clone, PartialEq)]
pub struct ValueError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ValueError {
    pub fn coercion(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Coercion, message: msg.into() }
    }

    pub fn frozen(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Frozen, message: msg.into() }
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ValueError {}
