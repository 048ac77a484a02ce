//! Resolution and download lifecycle events.

use crate::artifact::Artifact;

/// Observer for resolution and download lifecycle events.
///
/// The graph walker and the downloader invoke sinks from multiple
/// concurrent tasks; implementations must be thread-safe. All methods
/// default to no-ops so implementations override only what they observe.
pub trait EventSink: Send + Sync {
    /// A coordinate was skipped because its dependencies are already known
    /// (cache hit, revisited node, or dominated by a newer cached version).
    fn on_skipping_resolution(&self, _artifact: &Artifact) {}

    /// A coordinate's direct dependencies were resolved.
    fn on_resolution_complete(&self, _artifact: &Artifact) {}

    /// A coordinate resolved successfully but kept zero dependencies.
    fn on_dependencies_not_found(&self, _artifact: &Artifact) {}

    /// A POM was fetched but could not be parsed.
    fn on_invalid_pom(&self, _artifact: &Artifact, _reason: &str) {}

    /// No configured repository serves the requested version.
    fn on_version_not_found(&self, _artifact: &Artifact) {}

    fn on_download_start(&self, _artifact: &Artifact, _total_bytes: Option<u64>) {}

    /// Cumulative bytes written for an in-flight download.
    fn on_download_progress(&self, _artifact: &Artifact, _bytes: u64) {}

    fn on_download_end(&self, _artifact: &Artifact) {}

    fn on_download_error(&self, _artifact: &Artifact, _reason: &str) {}

    fn info(&self, _message: &str) {}

    fn warning(&self, _message: &str) {}

    fn error(&self, _message: &str) {}
}

/// Default sink forwarding every event to `tracing`.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn on_skipping_resolution(&self, artifact: &Artifact) {
        tracing::debug!("skipping resolution of {artifact}");
    }

    fn on_resolution_complete(&self, artifact: &Artifact) {
        tracing::debug!("resolved {artifact}");
    }

    fn on_dependencies_not_found(&self, artifact: &Artifact) {
        tracing::debug!("{artifact} has no dependencies");
    }

    fn on_invalid_pom(&self, artifact: &Artifact, reason: &str) {
        tracing::warn!("invalid POM for {artifact}: {reason}");
    }

    fn on_version_not_found(&self, artifact: &Artifact) {
        tracing::warn!("version not found for {artifact}");
    }

    fn on_download_start(&self, artifact: &Artifact, total_bytes: Option<u64>) {
        match total_bytes {
            Some(total) => tracing::info!("downloading {artifact} ({total} bytes)"),
            None => tracing::info!("downloading {artifact}"),
        }
    }

    fn on_download_end(&self, artifact: &Artifact) {
        tracing::info!("downloaded {artifact}");
    }

    fn on_download_error(&self, artifact: &Artifact, reason: &str) {
        tracing::error!("download failed for {artifact}: {reason}");
    }

    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }
}
