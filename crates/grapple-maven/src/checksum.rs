//! Checksum verification for downloaded artifacts.
//!
//! Repositories publish sidecar files (`.sha256`, `.sha1`, `.md5`) next to
//! every artifact. Digests are folded over the download stream chunk by
//! chunk while the file is written to disk, so verification never holds
//! the artifact in memory; the finished digests are then compared against
//! the first sidecar the repository serves.

use md5::Md5;
use reqwest::Client;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use grapple_util::errors::GrappleError;

use crate::download;

/// Sidecar suffixes in trust order.
const SIDECARS: [&str; 3] = ["sha256", "sha1", "md5"];

/// Digest state fed incrementally from a download stream.
pub struct StreamDigest {
    sha256: Sha256,
    sha1: Sha1,
    md5: Md5,
}

impl StreamDigest {
    pub fn new() -> Self {
        Self {
            sha256: Sha256::new(),
            sha1: Sha1::new(),
            md5: Md5::new(),
        }
    }

    /// Fold one downloaded chunk into every digest.
    pub fn update(&mut self, chunk: &[u8]) {
        self.sha256.update(chunk);
        self.sha1.update(chunk);
        self.md5.update(chunk);
    }

    pub fn finish(self) -> DigestSummary {
        DigestSummary {
            sha256: format!("{:x}", self.sha256.finalize()),
            sha1: format!("{:x}", self.sha1.finalize()),
            md5: format!("{:x}", self.md5.finalize()),
        }
    }
}

impl Default for StreamDigest {
    fn default() -> Self {
        Self::new()
    }
}

/// Finished hex digests of one streamed file.
#[derive(Debug, Clone)]
pub struct DigestSummary {
    pub sha256: String,
    pub sha1: String,
    pub md5: String,
}

impl DigestSummary {
    fn for_sidecar(&self, suffix: &str) -> &str {
        match suffix {
            "sha256" => &self.sha256,
            "sha1" => &self.sha1,
            _ => &self.md5,
        }
    }
}

/// Compare a download's streamed digests against the repository's checksum
/// sidecars. The first sidecar that exists decides; a repository that
/// publishes none passes with a warning.
pub async fn verify(
    client: &Client,
    file_url: &str,
    digest: &DigestSummary,
) -> Result<(), GrappleError> {
    for suffix in SIDECARS {
        let sidecar_url = format!("{file_url}.{suffix}");
        let Some(sidecar) = download::fetch_text(client, &sidecar_url).await? else {
            continue;
        };
        // Sidecars carry either the bare hash or `hash  filename`.
        let published = sidecar.split_whitespace().next().unwrap_or("");
        let streamed = digest.for_sidecar(suffix);
        if streamed.eq_ignore_ascii_case(published) {
            tracing::debug!("{suffix} checksum ok for {file_url}");
            return Ok(());
        }
        return Err(GrappleError::Generic {
            message: format!(
                "{suffix} checksum mismatch for {file_url}: sidecar has {published}, \
                 stream hashed to {streamed}"
            ),
        });
    }

    tracing::warn!("no checksum sidecar found for {file_url}");
    Ok(())
}
