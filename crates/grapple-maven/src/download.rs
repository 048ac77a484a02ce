//! HTTP transfer against Maven repositories.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::{AsyncWriteExt, BufWriter};

use grapple_util::errors::GrappleError;

use crate::checksum::{DigestSummary, StreamDigest};

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Build the shared reqwest client used for every repository request.
pub fn build_client() -> Result<Client, GrappleError> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("grapple/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| GrappleError::Network {
            message: format!("failed to create HTTP client: {e}"),
        })
}

/// Fetch raw bytes from a URL, retrying transient failures.
///
/// Returns `Ok(None)` for 404 (not present in this repository); 5xx,
/// connect errors, and timeouts are retried with linear backoff before
/// giving up.
pub async fn fetch_bytes(client: &Client, url: &str) -> Result<Option<Vec<u8>>, GrappleError> {
    let mut last_err = String::new();

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            tokio::time::sleep(RETRY_DELAY * attempt).await;
        }

        match client.get(url).send().await {
            Ok(resp) => {
                let status = resp.status();
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if status.is_server_error() {
                    last_err = format!("HTTP {status} from {url}");
                    continue;
                }
                if !status.is_success() {
                    return Err(GrappleError::Network {
                        message: format!("HTTP {status} fetching {url}"),
                    });
                }

                let bytes = resp.bytes().await.map_err(|e| GrappleError::Network {
                    message: format!("failed to read response from {url}: {e}"),
                })?;
                return Ok(Some(bytes.to_vec()));
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                last_err = format!("{e}");
                continue;
            }
            Err(e) => {
                return Err(GrappleError::Network {
                    message: format!("request to {url} failed: {e}"),
                });
            }
        }
    }

    Err(GrappleError::Network {
        message: format!("failed after {MAX_RETRIES} retries for {url}: {last_err}"),
    })
}

/// Fetch a text file (POM, metadata, checksum sidecar).
pub async fn fetch_text(client: &Client, url: &str) -> Result<Option<String>, GrappleError> {
    match fetch_bytes(client, url).await? {
        Some(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).to_string())),
        None => Ok(None),
    }
}

/// A completed streaming download: bytes written plus the digests folded
/// over the stream, ready for sidecar verification without re-reading the
/// file.
#[derive(Debug)]
pub struct StreamedFile {
    pub bytes: u64,
    pub digest: DigestSummary,
}

/// Stream a URL into a file, reporting cumulative progress.
///
/// Returns `Ok(None)` for 404 without touching the destination, otherwise
/// the content length declared by the server (if any) is passed to
/// `on_start` and every written chunk updates `on_progress` with the total
/// bytes written so far. Each chunk is also folded into the returned
/// checksum digests as it is written.
pub async fn stream_to_file(
    client: &Client,
    url: &str,
    dest: &Path,
    on_start: impl FnOnce(Option<u64>),
    mut on_progress: impl FnMut(u64),
) -> Result<Option<StreamedFile>, GrappleError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| GrappleError::Network {
            message: format!("request to {url} failed: {e}"),
        })?;

    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !resp.status().is_success() {
        return Err(GrappleError::Network {
            message: format!("HTTP {} fetching {url}", resp.status()),
        });
    }

    on_start(resp.content_length());

    let file = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(dest)
        .await
        .map_err(GrappleError::Io)?;
    let mut writer = BufWriter::new(file);

    let mut written = 0u64;
    let mut digest = StreamDigest::new();
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| GrappleError::Network {
            message: format!("failed mid-stream reading {url}: {e}"),
        })?;
        writer.write_all(&chunk).await.map_err(GrappleError::Io)?;
        digest.update(&chunk);
        written += chunk.len() as u64;
        on_progress(written);
    }
    writer.flush().await.map_err(GrappleError::Io)?;

    Ok(Some(StreamedFile {
        bytes: written,
        digest: digest.finish(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetch_bytes_404_is_none() {
        let server = MockServer::start().await;
        let client = build_client().unwrap();
        let url = format!("{}/missing.pom", server.uri());
        assert!(fetch_bytes(&client, &url).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fetch_text_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/file.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;
        let client = build_client().unwrap();
        let url = format!("{}/file.txt", server.uri());
        assert_eq!(fetch_text(&client, &url).await.unwrap().unwrap(), "hello");
    }

    #[tokio::test]
    async fn stream_to_file_writes_and_reports() {
        let server = MockServer::start().await;
        let body = vec![7u8; 4096];
        Mock::given(method("GET"))
            .and(path("/blob.jar"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("blob.jar");
        let client = build_client().unwrap();
        let url = format!("{}/blob.jar", server.uri());

        let mut last = 0u64;
        let file = stream_to_file(&client, &url, &dest, |_| {}, |n| last = n)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(file.bytes, 4096);
        assert_eq!(last, 4096);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
        // Digests folded during streaming match the full payload.
        assert_eq!(
            file.digest.sha1,
            "208308a5d534a12f570ab985014f1769be76733f"
        );
        assert_eq!(
            file.digest.sha256,
            "c9ac7b0624824f844f6c7f3d50fab9741a8914e878467e8daaedca143a34d90b"
        );
    }

    #[tokio::test]
    async fn stream_to_file_404_leaves_no_file() {
        let server = MockServer::start().await;
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("gone.jar");
        let client = build_client().unwrap();
        let url = format!("{}/gone.jar", server.uri());

        let result = stream_to_file(&client, &url, &dest, |_| {}, |_| {})
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(!dest.exists());
    }
}
