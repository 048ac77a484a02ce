//! Command: resolve, then download every artifact into a directory.

use std::path::Path;
use std::sync::{Arc, Mutex};

use indicatif::ProgressBar;
use miette::Result;

use grapple_core::artifact::Artifact;
use grapple_core::events::EventSink;
use grapple_resolver::DependencyResolver;
use grapple_util::progress;

/// Renders one progress bar per in-flight download (downloads run
/// sequentially) and a status line per outcome.
#[derive(Default)]
struct DownloadProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl EventSink for DownloadProgress {
    fn on_download_start(&self, artifact: &Artifact, total_bytes: Option<u64>) {
        if let Some(total) = total_bytes {
            let bar = progress::download_bar(total, &artifact.file_name());
            *self.bar.lock().expect("bar lock poisoned") = Some(bar);
        }
    }

    fn on_download_progress(&self, _artifact: &Artifact, bytes: u64) {
        if let Some(bar) = &*self.bar.lock().expect("bar lock poisoned") {
            bar.set_position(bytes);
        }
    }

    fn on_download_end(&self, artifact: &Artifact) {
        if let Some(bar) = self.bar.lock().expect("bar lock poisoned").take() {
            bar.finish_and_clear();
        }
        progress::status("Downloaded", &artifact.file_name());
    }

    fn on_download_error(&self, artifact: &Artifact, reason: &str) {
        if let Some(bar) = self.bar.lock().expect("bar lock poisoned").take() {
            bar.finish_and_clear();
        }
        progress::status_warn("Failed", &format!("{}: {reason}", artifact.file_name()));
    }
}

pub async fn exec(path: &Path, output: &Path, verbose: bool) -> Result<()> {
    let resolver = DependencyResolver::new()?.with_events(Arc::new(DownloadProgress::default()));
    let resolution = resolver.resolve_project(path).await?;

    if verbose && !resolution.conflicts.is_empty() {
        eprintln!("{}", resolution.conflicts);
    }

    progress::status(
        "Resolved",
        &format!("{} artifacts", resolution.artifacts.len()),
    );
    resolver.download(output, &resolution.artifacts).await?;
    progress::status("Fetched", &format!("into {}", output.display()));

    Ok(())
}
