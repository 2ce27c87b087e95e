use thiserror::Error;
use tracing::{error, warn};

/// Domain-specific errors for the spotlight core
#[derive(Error, Debug)]
pub enum SpotlightError {
    #[error("Invalid filter name '{name}': filter names must start with a letter or underscore and contain only word characters")]
    InvalidFilterName { name: String },

    #[error("Keyword handler '{keyword}' failed: {source}")]
    KeywordHandler {
        keyword: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Default handler failed: {0}")]
    DefaultHandler(#[source] anyhow::Error),

    #[error("Filter predicate '{name}' failed: {source}")]
    FilterPredicate {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Navigation operation failed: {0}")]
    Navigation(#[source] anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SpotlightError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the user doesn't need to know.
///
/// Plugin handlers, filter predicates, and snapshot restores all go through
/// this: the failure is logged with file/line via `#[track_caller]` and the
/// caller continues with `None`.
///
/// # Examples
///
/// ```ignore
/// use graph_spotlight::error::ResultExt;
///
/// // A broken plugin contributes nothing instead of aborting the query
/// let items = invoke_handler(text).log_err().unwrap_or_default();
///
/// // Expected failures get the warning level
/// let restored = navigation.set_viewport(saved).warn_on_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_err_passes_through_ok() {
        let result: std::result::Result<u32, String> = Ok(7);
        assert_eq!(result.log_err(), Some(7));
    }

    #[test]
    fn log_err_swallows_err() {
        let result: std::result::Result<u32, String> = Err("boom".to_string());
        assert_eq!(result.log_err(), None);
    }

    #[test]
    fn warn_on_err_swallows_err() {
        let result: std::result::Result<(), &str> = Err("expected");
        assert_eq!(result.warn_on_err(), None);
    }

    #[test]
    fn invalid_filter_name_message_names_the_filter() {
        let err = SpotlightError::InvalidFilterName {
            name: "9bad".to_string(),
        };
        assert!(err.to_string().contains("9bad"));
    }
}
