//! Error types for service-manager operations.
//!
//! Errors are categorized so callers can decide whether an operation is
//! worth retrying and what to tell the user. Classification works from the
//! stderr text that `systemctl` and init scripts print.

use crate::types::{Provider, ServiceAction};
use thiserror::Error;

/// Categories of service-manager errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The unit is not known to the service manager
    NotFound,
    /// The caller lacks the privilege for the operation
    Permission,
    /// The service manager could not be reached (transient)
    ManagerUnavailable,
    /// The declared provider is not the one running on this host
    ProviderMismatch,
    /// The provider cannot perform the requested action
    Unsupported,
    /// The unit name is malformed
    InvalidName,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ManagerUnavailable)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "Service not found",
            Self::Permission => "Permission denied",
            Self::ManagerUnavailable => "Service manager unavailable",
            Self::ProviderMismatch => "Provider mismatch",
            Self::Unsupported => "Unsupported action",
            Self::InvalidName => "Invalid unit name",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::NotFound => "Check the service_name or install the unit on this host",
            Self::Permission => "Run as root or set [sudo] mode = \"auto\" in the manifest",
            Self::ManagerUnavailable => "Check that the service manager is running and reachable",
            Self::ProviderMismatch => "Set the provider that matches this host's init system",
            Self::Unsupported => "Use an action the provider supports",
            Self::InvalidName => "Use letters, digits and ':_.@-\\' only",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur while talking to a service manager.
#[derive(Debug, Error)]
pub enum Error {
    /// The unit does not exist
    #[error("service not found: {unit}")]
    NotFound { unit: String },

    /// Permission denied
    #[error("permission denied: {message}")]
    Permission { message: String },

    /// The service manager could not be reached
    #[error("service manager unavailable: {message}")]
    ManagerUnavailable { message: String },

    /// Declared provider does not match the host
    #[error("provider mismatch: declared {declared}, but {reason}")]
    ProviderMismatch { declared: Provider, reason: String },

    /// The provider cannot perform this action
    #[error("{provider} does not support '{action}'")]
    Unsupported {
        provider: Provider,
        action: ServiceAction,
    },

    /// Malformed unit name
    #[error("invalid unit name '{name}': {reason}")]
    InvalidUnitName { name: String, reason: String },

    /// Command execution failed
    #[error("command failed: {message}")]
    CommandFailed { message: String, stderr: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Permission { .. } => ErrorCategory::Permission,
            Error::ManagerUnavailable { .. } => ErrorCategory::ManagerUnavailable,
            Error::ProviderMismatch { .. } => ErrorCategory::ProviderMismatch,
            Error::Unsupported { .. } => ErrorCategory::Unsupported,
            Error::InvalidUnitName { .. } => ErrorCategory::InvalidName,
            _ => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Create an error from service-manager command output.
    ///
    /// Analyzes stderr to categorize the error appropriately.
    pub fn from_manager_output(stderr: &str, unit: &str) -> Self {
        let stderr_lower = stderr.to_lowercase();

        if stderr_lower.contains("not found")
            || stderr_lower.contains("could not be found")
            || stderr_lower.contains("not loaded")
            || stderr_lower.contains("no such file or directory")
            || stderr_lower.contains("does not exist")
            || stderr_lower.contains("unrecognized service")
        {
            return Error::NotFound {
                unit: unit.to_string(),
            };
        }

        if stderr_lower.contains("access denied")
            || stderr_lower.contains("permission denied")
            || stderr_lower.contains("interactive authentication required")
            || stderr_lower.contains("operation not permitted")
            || stderr_lower.contains("must be root")
        {
            return Error::Permission {
                message: stderr.trim().to_string(),
            };
        }

        if stderr_lower.contains("failed to connect to bus")
            || stderr_lower.contains("connection timed out")
            || stderr_lower.contains("transport endpoint is not connected")
            || stderr_lower.contains("system has not been booted with systemd")
            || stderr_lower.contains("no medium found")
        {
            return Error::ManagerUnavailable {
                message: stderr.trim().to_string(),
            };
        }

        Error::CommandFailed {
            message: format!("service manager failed for {unit}"),
            stderr: stderr.trim().to_string(),
        }
    }
}

/// Result type for service-manager operations.
pub type Result<T> = std::result::Result<T, Error>;
