use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all grapple operations.
///
/// Only `InvalidManifest` ever aborts a resolution; the remaining variants
/// are either surfaced through events and degraded to "no dependencies"
/// during the graph walk, or returned from the download path.
#[derive(Debug, Error, Diagnostic)]
pub enum GrappleError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The project manifest (pom.xml or build.gradle) cannot be parsed.
    #[error("Invalid project manifest: {message}")]
    #[diagnostic(help("Check the project's pom.xml / build.gradle for syntax errors"))]
    InvalidManifest { message: String },

    /// The requested version does not exist in any configured repository.
    #[error("Version not found: {coordinate}")]
    VersionNotFound { coordinate: String },

    /// A POM was fetched but could not be parsed.
    #[error("Invalid POM for {coordinate}: {message}")]
    InvalidPom { coordinate: String, message: String },

    /// Network request or download failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type GrappleResult<T> = miette::Result<T>;
