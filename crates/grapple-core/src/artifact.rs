//! Artifact coordinates and identity.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::repository::Repository;

/// Default file extension when a declaration does not specify one.
pub const DEFAULT_EXTENSION: &str = "jar";

/// A uniquely identified binary or POM at a Maven coordinate.
///
/// Identity (equality and hashing) covers the full tuple
/// `(group_id, artifact_id, version, classifier)`. The `version` may be
/// empty until a `LATEST`/`RELEASE`/range marker has been pinned against
/// repository metadata; the `repository` is bound by host discovery.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
    pub extension: String,
    /// Packaging from the POM; `"pom"` packaging has no jar to download.
    pub packaging: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<Repository>,
    /// `group:artifact` keys excluded from this artifact's subtree,
    /// unioned down the graph during the walk.
    #[serde(skip)]
    pub exclusions: HashSet<String>,
}

impl Artifact {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            classifier: None,
            extension: DEFAULT_EXTENSION.to_string(),
            packaging: DEFAULT_EXTENSION.to_string(),
            repository: None,
            exclusions: HashSet::new(),
        }
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Parse the shorthand notation `group:artifact:version[:classifier][@extension]`.
    pub fn parse(s: &str) -> Option<Self> {
        let (coords, extension) = match s.rsplit_once('@') {
            Some((c, ext)) if !ext.is_empty() => (c, Some(ext)),
            _ => (s, None),
        };
        let parts: Vec<&str> = coords.split(':').collect();
        if parts.len() < 3 || parts.len() > 4 || parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        let mut artifact = Artifact::new(parts[0], parts[1], parts[2]);
        if let Some(classifier) = parts.get(3) {
            artifact = artifact.with_classifier(*classifier);
        }
        if let Some(ext) = extension {
            artifact = artifact.with_extension(ext);
        }
        Some(artifact)
    }

    /// `group:artifact` — the cache and conflict-resolution key.
    ///
    /// The classifier is deliberately not part of this key: different
    /// classifiers of the same coordinate share transitive dependencies
    /// and reconcile as one.
    pub fn ga_key(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }

    /// Full identity `group:artifact:version[:classifier]`.
    pub fn id_key(&self) -> String {
        match &self.classifier {
            Some(c) => format!("{}:{}:{}:{c}", self.group_id, self.artifact_id, self.version),
            None => format!("{}:{}:{}", self.group_id, self.artifact_id, self.version),
        }
    }

    /// File name on disk: `artifactId-version[-classifier].extension`.
    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(c) => format!("{}-{}-{c}.{}", self.artifact_id, self.version, self.extension),
            None => format!("{}-{}.{}", self.artifact_id, self.version, self.extension),
        }
    }

    /// Download URL against the bound repository, if one has been bound.
    pub fn download_url(&self) -> Option<String> {
        let repo = self.repository.as_ref()?;
        Some(repo.file_url(
            &self.group_id,
            &self.artifact_id,
            &self.version,
            &self.file_name(),
        ))
    }

    pub fn has_version(&self) -> bool {
        !self.version.is_empty()
    }

    /// `pom`-packaged artifacts (BOMs, aggregators) participate in the
    /// graph but have no jar to download.
    pub fn is_pom_packaging(&self) -> bool {
        self.packaging == "pom"
    }

    /// Whether this artifact's exclusion set drops `other`, either by its
    /// `group:artifact` key or group-wide.
    pub fn excludes(&self, other: &Artifact) -> bool {
        self.exclusions.contains(&other.ga_key()) || self.exclusions.contains(&other.group_id)
    }
}

impl PartialEq for Artifact {
    fn eq(&self, other: &Self) -> bool {
        self.group_id == other.group_id
            && self.artifact_id == other.artifact_id
            && self.version == other.version
            && self.classifier == other.classifier
    }
}

impl Eq for Artifact {}

impl Hash for Artifact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.group_id.hash(state);
        self.artifact_id.hash(state);
        self.version.hash(state);
        self.classifier.hash(state);
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_three_parts() {
        let a = Artifact::parse("com.google.guava:guava:31.1-jre").unwrap();
        assert_eq!(a.group_id, "com.google.guava");
        assert_eq!(a.artifact_id, "guava");
        assert_eq!(a.version, "31.1-jre");
        assert_eq!(a.classifier, None);
        assert_eq!(a.extension, "jar");
    }

    #[test]
    fn parse_with_classifier_and_extension() {
        let a = Artifact::parse("com.x:y:1.0:sources@zip").unwrap();
        assert_eq!(a.classifier.as_deref(), Some("sources"));
        assert_eq!(a.extension, "zip");
    }

    #[test]
    fn parse_rejects_short_forms() {
        assert!(Artifact::parse("guava").is_none());
        assert!(Artifact::parse("com.google.guava:guava").is_none());
        assert!(Artifact::parse("com.x::1.0").is_none());
    }

    #[test]
    fn identity_includes_classifier() {
        let main = Artifact::new("com.x", "y", "1.0");
        let sources = Artifact::new("com.x", "y", "1.0").with_classifier("sources");
        assert_ne!(main, sources);
        assert_eq!(main.ga_key(), sources.ga_key());
    }

    #[test]
    fn download_url_round_trip() {
        let mut a = Artifact::new("com.x", "y", "1.0").with_classifier("sources");
        a.repository = Some(Repository::new("r", "https://r"));
        assert_eq!(
            a.download_url().unwrap(),
            "https://r/com/x/y/1.0/y-1.0-sources.jar"
        );
    }

    #[test]
    fn download_url_requires_bound_repository() {
        let a = Artifact::new("com.x", "y", "1.0");
        assert!(a.download_url().is_none());
    }

    #[test]
    fn file_name_without_classifier() {
        let a = Artifact::new("com.google.guava", "guava", "31.1-jre");
        assert_eq!(a.file_name(), "guava-31.1-jre.jar");
    }

    #[test]
    fn pom_packaging() {
        let mut a = Artifact::new("io.netty", "netty-bom", "4.1.100.Final");
        a.packaging = "pom".to_string();
        assert!(a.is_pom_packaging());
    }
}
