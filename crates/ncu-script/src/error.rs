//! Script error types.

/// Errors raised while lexing, parsing or evaluating a config module.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScriptError {
    /// Source text is not valid for the supported module subset.
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// An identifier with no binding in scope.
    #[error("ReferenceError: {0} is not defined")]
    Reference(String),

    /// An operation applied to a value of the wrong kind.
    #[error("TypeError: {0}")]
    Type(String),

    /// A regex literal that cannot be compiled.
    #[error("invalid regular expression /{pattern}/{flags}: {message}")]
    Regex {
        pattern: String,
        flags: String,
        message: String,
    },

    /// The module never assigned `module.exports` or `export default`.
    #[error("module does not export a value")]
    NoExport,
}

impl ScriptError {
    pub(crate) fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        ScriptError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        ScriptError::Type(message.into())
    }
}
