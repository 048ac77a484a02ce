//! Download-batch behavior against a stub repository.

use std::sync::Mutex;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use grapple_core::artifact::Artifact;
use grapple_core::events::EventSink;
use grapple_core::repository::Repository;
use grapple_resolver::DependencyResolver;

#[derive(Default)]
struct DownloadLog {
    errors: Mutex<Vec<String>>,
    completed: Mutex<Vec<String>>,
}

impl EventSink for DownloadLog {
    fn on_download_end(&self, artifact: &Artifact) {
        self.completed.lock().unwrap().push(artifact.id_key());
    }
    fn on_download_error(&self, artifact: &Artifact, reason: &str) {
        self.errors
            .lock()
            .unwrap()
            .push(format!("{}: {reason}", artifact.id_key()));
    }
}

fn bound_artifact(server: &MockServer, group: &str, name: &str, version: &str) -> Artifact {
    let mut artifact = Artifact::new(group, name, version);
    artifact.repository = Some(Repository::new("stub", &server.uri()));
    artifact
}

async fn serve_jar(server: &MockServer, url_path: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(url_path.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn downloads_to_expected_file_name() {
    let server = MockServer::start().await;
    let payload = vec![0xCAu8; 2048];
    serve_jar(&server, "/com/acme/core/2.1/core-2.1.jar", &payload).await;

    let out = tempfile::tempdir().unwrap();
    let events = std::sync::Arc::new(DownloadLog::default());
    let resolver = DependencyResolver::new().unwrap().with_events(events.clone());
    let artifacts = vec![bound_artifact(&server, "com.acme", "core", "2.1")];

    resolver.download(out.path(), &artifacts).await.unwrap();

    let file = out.path().join("core-2.1.jar");
    assert_eq!(std::fs::read(&file).unwrap().len(), 2048);
    assert_eq!(events.completed.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn second_invocation_issues_zero_requests() {
    let server = MockServer::start().await;
    serve_jar(&server, "/com/acme/core/2.1/core-2.1.jar", b"bytes").await;

    let out = tempfile::tempdir().unwrap();
    let resolver = DependencyResolver::new().unwrap();
    let artifacts = vec![bound_artifact(&server, "com.acme", "core", "2.1")];

    resolver.download(out.path(), &artifacts).await.unwrap();
    let after_first = server.received_requests().await.unwrap().len();

    resolver.download(out.path(), &artifacts).await.unwrap();
    let after_second = server.received_requests().await.unwrap().len();

    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn per_artifact_failure_continues_batch() {
    let server = MockServer::start().await;
    serve_jar(&server, "/com/acme/good/1.0/good-1.0.jar", b"ok").await;
    // com.acme:gone:1.0 is never mounted.

    let out = tempfile::tempdir().unwrap();
    let events = std::sync::Arc::new(DownloadLog::default());
    let resolver = DependencyResolver::new().unwrap().with_events(events.clone());
    let artifacts = vec![
        bound_artifact(&server, "com.acme", "gone", "1.0"),
        bound_artifact(&server, "com.acme", "good", "1.0"),
    ];

    resolver.download(out.path(), &artifacts).await.unwrap();

    assert!(out.path().join("good-1.0.jar").is_file());
    assert!(!out.path().join("gone-1.0.jar").exists());
    let errors = events.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("com.acme:gone:1.0"));
}

#[tokio::test]
async fn classifier_in_file_name() {
    let server = MockServer::start().await;
    serve_jar(
        &server,
        "/org/lwjgl/lwjgl/3.3.3/lwjgl-3.3.3-natives-linux.jar",
        b"natives",
    )
    .await;

    let out = tempfile::tempdir().unwrap();
    let resolver = DependencyResolver::new().unwrap();
    let artifacts =
        vec![bound_artifact(&server, "org.lwjgl", "lwjgl", "3.3.3").with_classifier("natives-linux")];

    resolver.download(out.path(), &artifacts).await.unwrap();
    assert!(out.path().join("lwjgl-3.3.3-natives-linux.jar").is_file());
}

#[tokio::test]
async fn checksum_mismatch_removes_file_and_reports() {
    let server = MockServer::start().await;
    serve_jar(&server, "/com/acme/bad/1.0/bad-1.0.jar", b"payload").await;
    Mock::given(method("GET"))
        .and(path("/com/acme/bad/1.0/bad-1.0.jar.sha1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("deadbeef"))
        .mount(&server)
        .await;

    let out = tempfile::tempdir().unwrap();
    let events = std::sync::Arc::new(DownloadLog::default());
    let resolver = DependencyResolver::new().unwrap().with_events(events.clone());
    let artifacts = vec![bound_artifact(&server, "com.acme", "bad", "1.0")];

    resolver.download(out.path(), &artifacts).await.unwrap();

    assert!(!out.path().join("bad-1.0.jar").exists());
    assert_eq!(events.errors.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn pom_packaged_artifacts_are_not_downloaded() {
    let server = MockServer::start().await;
    let out = tempfile::tempdir().unwrap();
    let resolver = DependencyResolver::new().unwrap();

    let mut bom = bound_artifact(&server, "io.netty", "netty-bom", "4.1.100.Final");
    bom.packaging = "pom".to_string();

    resolver.download(out.path(), &[bom]).await.unwrap();
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
    assert!(std::fs::read_dir(out.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn unbound_artifact_reports_error() {
    let out = tempfile::tempdir().unwrap();
    let events = std::sync::Arc::new(DownloadLog::default());
    let resolver = DependencyResolver::new().unwrap().with_events(events.clone());

    let unbound = Artifact::new("com.acme", "loose", "1.0");
    resolver.download(out.path(), &[unbound]).await.unwrap();

    let errors = events.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("no repository bound"));
}
