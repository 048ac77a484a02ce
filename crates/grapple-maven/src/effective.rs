//! Effective-POM construction: remote fetch, parent-chain merge, and BOM
//! (`scope=import`, `type=pom`) dependency-management imports.

use std::collections::HashSet;

use reqwest::Client;

use grapple_core::artifact::Artifact;
use grapple_core::repository::Repository;
use grapple_util::errors::GrappleError;

use crate::download;
use crate::pom::{self, Pom};
use crate::registry::RepositoryRegistry;

/// Parent chains longer than this are cut off.
pub const MAX_PARENT_DEPTH: usize = 20;

/// At most this many BOM imports are chased per POM (nested imports count).
const MAX_BOM_IMPORTS: usize = 10;

/// Fetch the effective POM for an artifact: raw POM from its bound
/// repository (falling back to the registry), parents merged, BOM imports
/// applied, properties interpolated.
pub async fn fetch_effective_pom(
    client: &Client,
    registry: &RepositoryRegistry,
    artifact: &Artifact,
) -> Result<Pom, GrappleError> {
    let pom = fetch_raw_pom(
        client,
        registry,
        artifact.repository.as_ref(),
        &artifact.group_id,
        &artifact.artifact_id,
        &artifact.version,
    )
    .await?;
    expand_pom(client, registry, pom, false).await
}

/// Turn a parsed POM into an effective one.
///
/// With `lenient` set, a failed parent fetch logs a warning and the POM is
/// expanded from its local content (used for the project's root POM, whose
/// parent may be unreachable); otherwise the failure propagates. BOM
/// import failures are always skipped with a warning.
pub async fn expand_pom(
    client: &Client,
    registry: &RepositoryRegistry,
    mut pom: Pom,
    lenient: bool,
) -> Result<Pom, GrappleError> {
    chase_parents(client, registry, &mut pom, lenient).await?;
    pom.resolve_properties();
    import_boms(client, registry, &mut pom).await;
    pom.resolve_properties();
    Ok(pom)
}

/// Merge the POM's parent chain into it, bounded at [`MAX_PARENT_DEPTH`].
async fn chase_parents(
    client: &Client,
    registry: &RepositoryRegistry,
    pom: &mut Pom,
    lenient: bool,
) -> Result<(), GrappleError> {
    let mut depth = 0;
    let mut parent_ref = pom.parent.clone();

    while let Some(parent) = parent_ref {
        if depth >= MAX_PARENT_DEPTH {
            tracing::warn!(
                "parent chain of {}:{} exceeds {MAX_PARENT_DEPTH} levels, cutting off",
                pom.effective_group_id().unwrap_or("?"),
                pom.artifact_id.as_deref().unwrap_or("?"),
            );
            break;
        }
        match fetch_raw_pom(
            client,
            registry,
            None,
            &parent.group_id,
            &parent.artifact_id,
            &parent.version,
        )
        .await
        {
            Ok(parent_pom) => {
                pom.apply_parent(&parent_pom);
                parent_ref = parent_pom.parent;
            }
            Err(e) if lenient => {
                tracing::warn!(
                    "parent {}:{}:{} not reachable, continuing without it: {e}",
                    parent.group_id,
                    parent.artifact_id,
                    parent.version
                );
                break;
            }
            Err(e) => return Err(e),
        }
        depth += 1;
    }

    Ok(())
}

/// Resolve `scope=import`/`type=pom` management entries by fetching the
/// referenced POMs and merging their management sections in. Nested
/// imports are followed, bounded and deduplicated; failed imports are
/// skipped with a warning.
async fn import_boms(client: &Client, registry: &RepositoryRegistry, pom: &mut Pom) {
    let mut queue: Vec<(String, String, String)> = pending_imports(pom);
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    let mut remaining = MAX_BOM_IMPORTS;

    while let Some(import) = queue.pop() {
        if !seen.insert(import.clone()) {
            continue;
        }
        if remaining == 0 {
            tracing::warn!("more than {MAX_BOM_IMPORTS} BOM imports, ignoring the rest");
            break;
        }
        remaining -= 1;

        let (group, artifact, version) = &import;
        let mut bom = match fetch_raw_pom(client, registry, None, group, artifact, version).await {
            Ok(bom) => bom,
            Err(e) => {
                tracing::warn!("BOM import {group}:{artifact}:{version} failed, skipping: {e}");
                continue;
            }
        };
        if let Err(e) = chase_parents(client, registry, &mut bom, false).await {
            tracing::warn!("BOM import {group}:{artifact}:{version} failed, skipping: {e}");
            continue;
        }
        bom.resolve_properties();

        pom.merge_dependency_management(&bom.dependency_management);
        queue.extend(pending_imports(&bom));
    }
}

fn pending_imports(pom: &Pom) -> Vec<(String, String, String)> {
    pom.bom_imports()
        .into_iter()
        .filter_map(|d| {
            let version = d.version.clone()?;
            Some((d.group_id.clone(), d.artifact_id.clone(), version))
        })
        .collect()
}

/// Fetch and parse a single POM, preferred repository first, then every
/// registry repository in probe order.
///
/// A repository that does not carry the coordinate (404) or cannot be
/// reached is skipped; exhausting all repositories signals
/// `VersionNotFound`. A 2xx response with unparseable content signals
/// `InvalidPom` immediately.
async fn fetch_raw_pom(
    client: &Client,
    registry: &RepositoryRegistry,
    preferred: Option<&Repository>,
    group: &str,
    artifact: &str,
    version: &str,
) -> Result<Pom, GrappleError> {
    let mut candidates: Vec<Repository> = Vec::new();
    if let Some(repo) = preferred {
        candidates.push(repo.clone());
    }
    for repo in registry.repositories() {
        if !candidates.iter().any(|r| r.base_url == repo.base_url) {
            candidates.push(repo);
        }
    }

    for repo in &candidates {
        let url = repo.pom_url(group, artifact, version);
        match download::fetch_text(client, &url).await {
            Ok(Some(xml)) => return pom::parse_pom(&xml),
            Ok(None) => continue,
            Err(e) => {
                tracing::debug!("POM fetch from {} failed: {e}", repo.name);
                continue;
            }
        }
    }

    Err(GrappleError::VersionNotFound {
        coordinate: format!("{group}:{artifact}:{version}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve_pom(server: &MockServer, url_path: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(url_path.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
            .mount(server)
            .await;
    }

    fn stub_registry(server: &MockServer) -> RepositoryRegistry {
        RepositoryRegistry::new(vec![Repository::new("stub", &server.uri())])
    }

    #[tokio::test]
    async fn missing_everywhere_is_version_not_found() {
        let server = MockServer::start().await;
        let registry = stub_registry(&server);
        let client = download::build_client().unwrap();
        let artifact = Artifact::new("com.x", "gone", "1.0");

        let err = fetch_effective_pom(&client, &registry, &artifact)
            .await
            .unwrap_err();
        assert!(matches!(err, GrappleError::VersionNotFound { .. }));
    }

    #[tokio::test]
    async fn garbage_body_is_invalid_pom() {
        let server = MockServer::start().await;
        serve_pom(&server, "/com/x/bad/1.0/bad-1.0.pom", "<project><oops").await;
        let registry = stub_registry(&server);
        let client = download::build_client().unwrap();
        let artifact = Artifact::new("com.x", "bad", "1.0");

        let err = fetch_effective_pom(&client, &registry, &artifact)
            .await
            .unwrap_err();
        assert!(matches!(err, GrappleError::InvalidPom { .. }));
    }

    #[tokio::test]
    async fn parent_chain_merged() {
        let server = MockServer::start().await;
        serve_pom(
            &server,
            "/com/x/child/1.0/child-1.0.pom",
            r#"<project>
                <parent><groupId>com.x</groupId><artifactId>base</artifactId><version>3</version></parent>
                <artifactId>child</artifactId>
                <dependencies>
                    <dependency><groupId>g</groupId><artifactId>dep</artifactId><version>${dep.version}</version></dependency>
                </dependencies>
            </project>"#,
        )
        .await;
        serve_pom(
            &server,
            "/com/x/base/3/base-3.pom",
            r#"<project>
                <groupId>com.x</groupId><artifactId>base</artifactId><version>3</version>
                <properties><dep.version>7.7</dep.version></properties>
            </project>"#,
        )
        .await;

        let registry = stub_registry(&server);
        let client = download::build_client().unwrap();
        let artifact = Artifact::new("com.x", "child", "1.0");

        let pom = fetch_effective_pom(&client, &registry, &artifact)
            .await
            .unwrap();
        assert_eq!(pom.effective_group_id(), Some("com.x"));
        assert_eq!(pom.dependencies[0].version.as_deref(), Some("7.7"));
    }

    #[tokio::test]
    async fn bom_import_pins_managed_versions() {
        let server = MockServer::start().await;
        serve_pom(
            &server,
            "/com/x/app/1.0/app-1.0.pom",
            r#"<project>
                <groupId>com.x</groupId><artifactId>app</artifactId><version>1.0</version>
                <dependencyManagement>
                    <dependencies>
                        <dependency>
                            <groupId>io.netty</groupId><artifactId>netty-bom</artifactId>
                            <version>4.1.100.Final</version><type>pom</type><scope>import</scope>
                        </dependency>
                    </dependencies>
                </dependencyManagement>
                <dependencies>
                    <dependency><groupId>io.netty</groupId><artifactId>netty-handler</artifactId></dependency>
                </dependencies>
            </project>"#,
        )
        .await;
        serve_pom(
            &server,
            "/io/netty/netty-bom/4.1.100.Final/netty-bom-4.1.100.Final.pom",
            r#"<project>
                <groupId>io.netty</groupId><artifactId>netty-bom</artifactId><version>4.1.100.Final</version>
                <packaging>pom</packaging>
                <dependencyManagement>
                    <dependencies>
                        <dependency><groupId>io.netty</groupId><artifactId>netty-handler</artifactId><version>4.1.100.Final</version></dependency>
                    </dependencies>
                </dependencyManagement>
            </project>"#,
        )
        .await;

        let registry = stub_registry(&server);
        let client = download::build_client().unwrap();
        let artifact = Artifact::new("com.x", "app", "1.0");

        let pom = fetch_effective_pom(&client, &registry, &artifact)
            .await
            .unwrap();
        let deps = pom.direct_dependencies();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].version, "4.1.100.Final");
    }

    #[tokio::test]
    async fn lenient_expansion_survives_missing_parent() {
        let server = MockServer::start().await;
        let registry = stub_registry(&server);
        let client = download::build_client().unwrap();

        let pom = pom::parse_pom(
            r#"<project>
                <parent><groupId>com.gone</groupId><artifactId>parent</artifactId><version>1</version></parent>
                <artifactId>root</artifactId>
                <version>0.1</version>
                <dependencies>
                    <dependency><groupId>g</groupId><artifactId>dep</artifactId><version>1</version></dependency>
                </dependencies>
            </project>"#,
        )
        .unwrap();

        let expanded = expand_pom(&client, &registry, pom, true).await.unwrap();
        assert_eq!(expanded.direct_dependencies().len(), 1);
    }
}
