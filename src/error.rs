use std::fmt;
use std::io;
use std::path::PathBuf;

use http::Method;

/// Errors raised while building or composing static asset routes.
///
/// Per-request failures never surface here: handlers fold them into
/// [`Outcome::NotFound`](crate::handler::Outcome::NotFound).
#[derive(Debug)]
pub enum StaticError {
    /// The assets root does not exist or cannot be accessed
    AssetsNotFound {
        /// Configured assets root
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
    /// The assets root exists but is not a directory
    NotADirectory {
        /// Configured assets root
        path: PathBuf,
    },
    /// Recursive enumeration of the assets root failed
    Enumerate {
        /// Assets root being walked
        path: PathBuf,
        /// Description of the failure
        message: String,
    },
    /// A file could not be stat'ed or hashed while preparing static routes
    Prepare {
        /// File being prepared
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
    /// A configured response header has an invalid name or value
    InvalidHeader {
        /// Offending header name
        name: String,
    },
    /// An ignore pattern is not a valid regular expression
    InvalidPattern {
        /// Offending pattern
        pattern: String,
        /// Regex compiler message
        message: String,
    },
    /// A configuration file could not be read or parsed
    Config {
        /// Configuration file path
        path: PathBuf,
        /// Description of the failure
        message: String,
    },
    /// Two routes share the same method and path
    DuplicateRoute {
        /// HTTP method of the conflicting route
        method: Method,
        /// Path of the conflicting route
        path: String,
    },
}

impl StaticError {
    /// Whether this error was raised while initializing routes from the filesystem.
    #[must_use]
    pub fn is_initialization(&self) -> bool {
        matches!(
            self,
            StaticError::AssetsNotFound { .. }
                | StaticError::NotADirectory { .. }
                | StaticError::Enumerate { .. }
                | StaticError::Prepare { .. }
        )
    }
}

impl fmt::Display for StaticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaticError::AssetsNotFound { path, source } => {
                write!(f, "assets directory '{}' is not accessible: {}", path.display(), source)
            }
            StaticError::NotADirectory { path } => {
                write!(f, "assets path '{}' is not a directory", path.display())
            }
            StaticError::Enumerate { path, message } => {
                write!(f, "failed to enumerate assets under '{}': {}", path.display(), message)
            }
            StaticError::Prepare { path, source } => {
                write!(f, "failed to prepare asset '{}': {}", path.display(), source)
            }
            StaticError::InvalidHeader { name } => {
                write!(f, "invalid response header '{}'", name)
            }
            StaticError::InvalidPattern { pattern, message } => {
                write!(f, "invalid ignore pattern '{}': {}", pattern, message)
            }
            StaticError::Config { path, message } => {
                write!(f, "failed to load config '{}': {}", path.display(), message)
            }
            StaticError::DuplicateRoute { method, path } => {
                write!(f, "route {} {} is already registered", method, path)
            }
        }
    }
}

impl std::error::Error for StaticError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StaticError::AssetsNotFound { source, .. } | StaticError::Prepare { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, StaticError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialization_kinds() {
        let err = StaticError::NotADirectory {
            path: PathBuf::from("/srv/a.txt"),
        };
        assert!(err.is_initialization());
        assert_eq!(err.to_string(), "assets path '/srv/a.txt' is not a directory");

        let dup = StaticError::DuplicateRoute {
            method: Method::GET,
            path: "/public/*".to_string(),
        };
        assert!(!dup.is_initialization());
        assert_eq!(dup.to_string(), "route GET /public/* is already registered");
    }

    #[test]
    fn test_source_is_exposed() {
        use std::error::Error;
        let err = StaticError::AssetsNotFound {
            path: PathBuf::from("missing"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.source().is_some());
    }
}
