//! Error handling for update-helper
//!
//! This module provides the error taxonomy shared by the caller-side
//! [`UpdateSession`](crate::session::UpdateSession) and the helper-side
//! [`ReplacementEngine`](crate::engine::ReplacementEngine), plus user-friendly
//! error reporting for the helper binary. The error system is designed around two
//! core principles:
//! 1. **Strongly-typed errors** so callers can tell a recoverable configuration
//!    mistake from an irreversible replacement failure
//! 2. **User-friendly messages** with actionable suggestions on the diagnostic stream
//!
//! # Error Categories
//!
//! - **Configuration**: [`UpdateError::Configuration`] - mandatory input missing, caught
//!   before any side effect
//! - **Transport**: [`UpdateError::Transport`] - the archive download failed
//! - **Payload**: [`UpdateError::Payload`] - the archive produced no usable helper binary
//! - **Permission**: [`UpdateError::PermissionDenied`] - source not readable or target
//!   not writable, checked before any destructive step
//! - **Replacement**: [`UpdateError::Replacement`] - a helper step failed after the
//!   point of no return
//!
//! # Best-effort operations
//!
//! Two spots are allowed to fail without failing their enclosing operation: applying
//! permissions to an extracted symlink, and removing the extraction directory during
//! cleanup. Those return a [`BestEffort`] value instead of a `Result`, so the swallowed
//! failure stays observable.
//!
//! # Examples
//!
//! ```rust,no_run
//! use update_helper::core::{UpdateError, user_friendly_error};
//!
//! let error = UpdateError::Configuration {
//!     message: "mandatory option 'source' missing".to_string(),
//! };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display(); // Shows colored error with suggestions
//! ```

use crate::engine::Step;
use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for update operations
///
/// Each variant corresponds to one failure category of the update protocol. The
/// helper process reports every variant with exit status `1`; the caller-side API
/// surfaces them through `anyhow::Error` so they can be recovered with
/// `downcast_ref::<UpdateError>()`.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// Mandatory input missing or malformed.
    ///
    /// Raised before any network or filesystem action; retrying with corrected
    /// input is always safe.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem
        message: String,
    },

    /// The archive download failed
    #[error("Failed to download update helper from {url}: {reason}")]
    Transport {
        /// URL that was requested
        url: String,
        /// Reason reported by the HTTP client or server
        reason: String,
    },

    /// The downloaded archive did not yield a usable helper binary
    ///
    /// This is terminal for the current `update()` call and is never retried.
    #[error("Update helper payload incomplete: {reason}")]
    Payload {
        /// What was wrong with the payload
        reason: String,
    },

    /// Source not readable or target not writable
    #[error("Permission denied: {operation} {path}")]
    PermissionDenied {
        /// The access that was checked (e.g. "read source", "write target")
        operation: String,
        /// Path that failed the check
        path: String,
    },

    /// A helper step failed after validation
    ///
    /// Everything after validation is irreversible, so the helper run is aborted and
    /// the filesystem is left as it is for the caller to inspect.
    #[error("Replacement failed during {step}: {reason}")]
    Replacement {
        /// The state machine step that failed
        step: Step,
        /// Reason for the failure
        reason: String,
    },

    /// The host platform has no packaged helper binary
    #[error("Current platform \"{platform}\" is not supported (no packaged update helper available)")]
    PlatformNotSupported {
        /// Platform name as reported by the standard library
        platform: String,
    },

    /// Invalid helper command line
    #[error("Usage error: {message}")]
    Usage {
        /// Parser message
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Archive container error
    #[error("Archive error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl Clone for UpdateError {
    fn clone(&self) -> Self {
        match self {
            Self::Configuration {
                message,
            } => Self::Configuration {
                message: message.clone(),
            },
            Self::Transport {
                url,
                reason,
            } => Self::Transport {
                url: url.clone(),
                reason: reason.clone(),
            },
            Self::Payload {
                reason,
            } => Self::Payload {
                reason: reason.clone(),
            },
            Self::PermissionDenied {
                operation,
                path,
            } => Self::PermissionDenied {
                operation: operation.clone(),
                path: path.clone(),
            },
            Self::Replacement {
                step,
                reason,
            } => Self::Replacement {
                step: *step,
                reason: reason.clone(),
            },
            Self::PlatformNotSupported {
                platform,
            } => Self::PlatformNotSupported {
                platform: platform.clone(),
            },
            Self::Usage {
                message,
            } => Self::Usage {
                message: message.clone(),
            },
            // io::Error and ZipError don't implement Clone
            Self::IoError(e) => Self::IoError(std::io::Error::new(e.kind(), e.to_string())),
            Self::ZipError(e) => Self::Other {
                message: format!("Archive error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

impl UpdateError {
    /// Shorthand for a [`UpdateError::Replacement`] failure.
    pub fn replacement(step: Step, reason: impl fmt::Display) -> Self {
        Self::Replacement {
            step,
            reason: reason.to_string(),
        }
    }

    /// Shorthand for a [`UpdateError::Configuration`] failure.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Outcome of an operation whose failure must not fail its caller
///
/// Used for symlink permission application during extraction and for directory
/// removal during cleanup. Unlike a discarded `Result`, the reason for an ignored
/// failure is kept so it can be logged and asserted on.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum BestEffort {
    /// The operation completed.
    Applied,
    /// The operation failed and the failure was deliberately ignored.
    Ignored {
        /// Why the operation did not complete
        reason: String,
    },
}

impl BestEffort {
    /// Fold a fallible result into a best-effort outcome.
    pub fn from_result<E: fmt::Display>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::Applied,
            Err(e) => Self::Ignored {
                reason: e.to_string(),
            },
        }
    }

    /// Returns `true` if the failure was swallowed.
    #[must_use]
    pub const fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored { .. })
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// Pairs an [`UpdateError`] with optional details and a suggestion. The helper binary
/// renders it on stderr right before exiting with status `1`.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: UpdateError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context without suggestion or details.
    #[must_use]
    pub const fn new(error: UpdateError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a user-friendly [`ErrorContext`]
///
/// Recognizes [`UpdateError`] and common [`std::io::Error`] kinds anywhere in the
/// error chain; everything else is reported with its full cause chain.
///
/// # Examples
///
/// ```rust,no_run
/// use update_helper::core::user_friendly_error;
///
/// let error = anyhow::anyhow!("Something went wrong");
/// user_friendly_error(error).display();
/// ```
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(update_error) = error.chain().find_map(|e| e.downcast_ref::<UpdateError>()) {
        return create_error_context(update_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(UpdateError::PermissionDenied {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Run the caller with permissions to modify the installation directory")
                .with_details(format!("{error:#}"));
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(UpdateError::Other {
                    message: format!("{error:#}"),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(UpdateError::Other {
        message,
    })
}

fn create_error_context(error: UpdateError) -> ErrorContext {
    let (suggestion, details): (Option<String>, Option<String>) = match &error {
        UpdateError::Configuration { .. } => (
            Some("Set both 'source' and 'target' on the update request".to_string()),
            Some("Nothing was downloaded or modified".to_string()),
        ),
        UpdateError::Transport { .. } => (
            Some("Check your internet connection and that the release asset exists for this version".to_string()),
            Some("Downloads are not retried automatically".to_string()),
        ),
        UpdateError::Payload { .. } => (
            Some("The release archive does not contain a helper binary for this platform".to_string()),
            Some("Only the temporary extraction directory was created".to_string()),
        ),
        UpdateError::PermissionDenied { path, .. } => (
            Some(format!("Check ownership and permissions of {path}")),
            Some("Access is verified before any file is modified".to_string()),
        ),
        UpdateError::Replacement { step, .. } => (
            Some("Inspect the target and re-run the update if needed".to_string()),
            Some(format!(
                "The helper stopped at step '{step}'; files changed by earlier steps were not rolled back"
            )),
        ),
        UpdateError::PlatformNotSupported { .. } => {
            (None, Some("Packaged helpers exist for Windows, macOS and Linux on x64".to_string()))
        }
        UpdateError::Usage { .. } => {
            (Some("Run 'update-helper-cli --help' for the list of options".to_string()), None)
        }
        _ => (None, None),
    };

    ErrorContext {
        error,
        suggestion,
        details,
    }
}
