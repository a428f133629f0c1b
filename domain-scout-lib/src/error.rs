//! Error handling for domain checking operations.
//!
//! Only request-level failures are represented here. Anything that goes wrong
//! while checking a single domain (timeouts, transport errors, DNS failures,
//! invalid labels) is recorded on that domain's `DomainResult` instead.

use std::fmt;

/// Main error type for domain checking operations.
///
/// Every variant aborts the whole check: nothing partial is returned.
#[derive(Debug, Clone)]
pub enum DomainScoutError {
    /// A requested TLD does not match the accepted syntax
    InvalidTld {
        tld: String,
    },

    /// The request shape or an option is out of range
    InvalidRequest {
        message: String,
    },

    /// The RDAP bootstrap registry could not be loaded and no fallback base is configured
    BootstrapError {
        message: String,
    },

    /// Configuration errors (bad TOML, unreadable config file, etc.)
    ConfigError {
        message: String,
    },

    /// File I/O errors (cache file, run log, input/output payloads)
    FileError {
        path: String,
        message: String,
    },

    /// JSON parsing errors
    ParseError {
        message: String,
    },

    /// Generic internal errors that don't fit other categories
    Internal {
        message: String,
    },
}

impl DomainScoutError {
    /// Create a new invalid TLD error.
    pub fn invalid_tld<T: Into<String>>(tld: T) -> Self {
        Self::InvalidTld { tld: tld.into() }
    }

    /// Create a new invalid request error.
    pub fn invalid_request<M: Into<String>>(message: M) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a new bootstrap error.
    pub fn bootstrap<M: Into<String>>(message: M) -> Self {
        Self::BootstrapError {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error comes from bad caller input rather than the environment.
    ///
    /// The CLI uses this to pick its exit code.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidTld { .. } | Self::InvalidRequest { .. } | Self::ConfigError { .. }
        )
    }
}

impl fmt::Display for DomainScoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTld { tld } => write!(f, "Invalid TLD: {}", tld),
            Self::InvalidRequest { message } => write!(f, "Invalid request: {}", message),
            Self::BootstrapError { message } => {
                write!(f, "RDAP bootstrap registry unavailable: {}", message)
            }
            Self::ConfigError { message } => write!(f, "Configuration error: {}", message),
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::ParseError { message } => write!(f, "Parse error: {}", message),
            Self::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for DomainScoutError {}

// Implement From conversions for common error types
impl From<reqwest::Error> for DomainScoutError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::bootstrap(format!("request timed out: {}", err))
        } else {
            Self::bootstrap(format!("HTTP request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for DomainScoutError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            message: format!("JSON parsing failed: {}", err),
        }
    }
}

impl From<toml::de::Error> for DomainScoutError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("Failed to parse TOML configuration: {}", err))
    }
}

impl From<std::io::Error> for DomainScoutError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}
