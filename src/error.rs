//! Error types for the cursor layer
//!
//! The variants follow the DB-API exception classes the cursor surfaces:
//! interface errors for misuse of the driver itself, programming errors for
//! misuse of a cursor, and database errors passed through from the transport.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // DB-API Errors
    // ============================================================================
    /// Misuse of the driver interface (closed cursor, invalid identifiers, ...)
    #[error("Interface error: {message}")]
    Interface {
        /// What went wrong
        message: String,
    },

    /// Misuse of a cursor (fetching before execute, no result set, ...)
    #[error("Programming error: {message}")]
    Programming {
        /// What went wrong
        message: String,
    },

    /// Raised by the transport: SQL errors, connection loss
    #[error("Database error: {message}")]
    Database {
        /// Server or transport message
        message: String,
    },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    /// Invalid cursor settings
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Malformed YAML settings
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Malformed JSON settings
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    /// Unreadable bulk insert file
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Arrow array or batch construction failed
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    /// Filesystem access
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    /// An inner error wrapped with [`ResultExt`] context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an interface error
    pub fn interface(message: impl Into<String>) -> Self {
        Self::Interface {
            message: message.into(),
        }
    }

    /// Create a programming error
    pub fn programming(message: impl Into<String>) -> Self {
        Self::Programming {
            message: message.into(),
        }
    }

    /// Create a database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error belongs to the DB-API `InterfaceError` class
    pub fn is_interface(&self) -> bool {
        matches!(self, Error::Interface { .. })
    }

    /// Whether this error belongs to the DB-API `ProgrammingError` class
    pub fn is_programming(&self) -> bool {
        matches!(self, Error::Programming { .. })
    }
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::interface("Cursor closed");
        assert_eq!(err.to_string(), "Interface error: Cursor closed");

        let err = Error::programming("no result set");
        assert_eq!(err.to_string(), "Programming error: no result set");

        let err = Error::config("arraysize must be at least 1");
        assert_eq!(
            err.to_string(),
            "Configuration error: arraysize must be at least 1"
        );
    }

    #[test]
    fn test_error_class() {
        assert!(Error::interface("x").is_interface());
        assert!(!Error::interface("x").is_programming());
        assert!(Error::programming("x").is_programming());
        assert!(!Error::database("x").is_interface());
        assert!(!Error::database("x").is_programming());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::interface("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Interface error: inner"));
    }

    #[test]
    fn test_io_error_with_context() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = result.with_context(|| "Failed to open data.csv".to_string()).unwrap_err();
        assert!(matches!(err, Error::Other(_)));
        assert_eq!(err.to_string(), "Failed to open data.csv: IO error: gone");
    }
}
