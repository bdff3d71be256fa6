//! Error types for the bingo service
//!
//! Errors are split into two families: client errors (the request itself is
//! unusable) and server errors (a backend the request depends on failed).
//! The daemon maps the first family to `400` and the second to `500`.

use thiserror::Error;

/// Result type alias for bingo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the bingo service
#[derive(Error, Debug)]
pub enum Error {
    /// Key-value store connectivity, authentication, protocol or timeout failure
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The number generator could not be reached or answered with a failure status
    #[error("Generator unreachable: {0}")]
    GeneratorUnreachable(String),

    /// The number generator answered, but not with an integer
    #[error("Generator response invalid: {0}")]
    GeneratorResponseInvalid(String),

    /// The request carries unusable input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    /// Create a generator transport error
    pub fn generator_unreachable(msg: impl Into<String>) -> Self {
        Self::GeneratorUnreachable(msg.into())
    }

    /// Create a generator payload error
    pub fn generator_response(msg: impl Into<String>) -> Self {
        Self::GeneratorResponseInvalid(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the caller caused this error
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Short, stable label for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::GeneratorUnreachable(_) => "generator_unreachable",
            Self::GeneratorResponseInvalid(_) => "generator_response_invalid",
            Self::InvalidInput(_) => "invalid_input",
            Self::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_invalid_input_is_client_error() {
        assert!(Error::invalid_input("bad guess").is_client_error());
        assert!(!Error::store("down").is_client_error());
        assert!(!Error::generator_unreachable("timeout").is_client_error());
        assert!(!Error::generator_response("abc").is_client_error());
    }

    #[test]
    fn test_generator_errors_have_distinct_kinds() {
        assert_ne!(
            Error::generator_unreachable("x").kind(),
            Error::generator_response("x").kind()
        );
        assert_eq!(Error::store("x").kind(), "store_unavailable");
    }
}
