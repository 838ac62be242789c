//! Error types for the provisioner.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for a convergence run.
///
/// Every variant is fatal: the runner stops at the first error and
/// surfaces it to the operator.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Configuration-related errors.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors.
    #[error("Validation error: {kind}")]
    Validation { kind: ValidationErrorKind },

    /// Release archive could not be fetched.
    #[error("Download of '{url}' failed: {message}")]
    Download { url: String, message: String },

    /// Release archive did not match its pinned checksum.
    #[error("Checksum mismatch for '{path}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// The distro repositories do not carry the requested package.
    #[error("Package '{package}' not found by {manager}")]
    PackageNotFound { package: String, manager: String },

    /// Building from source failed.
    #[error("Compilation of {name} failed: {message}")]
    Compile { name: String, message: String },

    /// Template loading or rendering failed.
    #[error("Template error: {message}")]
    TemplateRender { message: String },

    /// Host platform is not handled by the selected integration.
    #[error("Unsupported platform '{platform}' for {context}")]
    UnsupportedPlatform { platform: String, context: String },

    /// External command errors.
    #[error("Command error: {kind}")]
    Command { kind: CommandErrorKind },

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Validation error kinds.
#[derive(Error, Debug)]
pub enum ValidationErrorKind {
    #[error("Path must be absolute: {path}")]
    RelativePath { path: PathBuf },

    #[error("Path traversal detected in: {path}")]
    PathTraversal { path: PathBuf },

    #[error("Invalid user or group name: {name}")]
    InvalidName { name: String },

    #[error("Invalid version: {version}")]
    InvalidVersion { version: String },

    #[error("Invalid checksum for {target}: expected 64 hex characters")]
    InvalidChecksum { target: String },

    #[error("Invalid flag '{key}': {message}")]
    InvalidFlag { key: String, message: String },

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },
}

/// Command error kinds.
#[derive(Error, Debug)]
pub enum CommandErrorKind {
    #[error("Command execution failed: {message}")]
    ExecutionFailed { message: String },

    #[error("Command timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },
}

impl ProvisionError {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Shorthand for a failed external command.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Command {
            kind: CommandErrorKind::ExecutionFailed {
                message: message.into(),
            },
        }
    }

    /// Stable code recorded in the journal.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "CONFIG",
            Self::Validation { .. } => "VALIDATION",
            Self::Download { .. } => "DOWNLOAD",
            Self::ChecksumMismatch { .. } => "CHECKSUM_MISMATCH",
            Self::PackageNotFound { .. } => "PACKAGE_NOT_FOUND",
            Self::Compile { .. } => "COMPILE",
            Self::TemplateRender { .. } => "TEMPLATE_RENDER",
            Self::UnsupportedPlatform { .. } => "UNSUPPORTED_PLATFORM",
            Self::Command { .. } => "COMMAND",
            Self::Io(_) => "IO",
            Self::Serialization(_) => "SERIALIZATION",
        }
    }
}

/// Result type alias for provisioning operations.
pub type ProvisionResult<T> = Result<T, ProvisionError>;
