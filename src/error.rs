//! Error taxonomy for expansion and rendering.

use thiserror::Error;

/// Errors surfaced by the expander and the rule dispatch core.
///
/// Every error aborts the whole render: callers never receive truncated
/// output alongside an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Input rejected before any processing began.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Dispatch table miss, reported only in strict mode.
    #[error("unknown token type `{0}`")]
    UnknownTokenType(String),

    /// Reflink followed by `{` with no closing `}`, reported only in strict mode.
    #[error("malformed reflink syntax at line {line}, column {column}: unclosed `{{`")]
    MalformedReflinkSyntax { line: usize, column: usize },

    /// comrak could not write the HTML document.
    #[error("HTML rendering failed: {0}")]
    Html(String),
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        // Arrange
        let invalid = Error::InvalidArgument("expected UTF8 text".to_string());
        let unknown = Error::UnknownTokenType("math".to_string());
        let malformed = Error::MalformedReflinkSyntax { line: 3, column: 7 };

        // Act & Assert
        assert_eq!(invalid.to_string(), "invalid argument: expected UTF8 text");
        assert_eq!(unknown.to_string(), "unknown token type `math`");
        assert_eq!(
            malformed.to_string(),
            "malformed reflink syntax at line 3, column 7: unclosed `{`"
        );
    }
}
