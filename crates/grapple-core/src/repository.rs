//! Maven repository URL layout.

use serde::Serialize;

/// Maven Central base URL.
pub const MAVEN_CENTRAL_URL: &str = "https://repo1.maven.org/maven2";

/// Google's Maven repository.
pub const GOOGLE_MAVEN_URL: &str = "https://maven.google.com";

/// Jitpack (GitHub-backed builds).
pub const JITPACK_URL: &str = "https://jitpack.io";

/// A remote Maven repository endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    pub name: String,
    pub base_url: String,
}

impl Repository {
    pub fn new(name: impl Into<String>, base_url: &str) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Construct the default Maven Central repository.
    pub fn maven_central() -> Self {
        Self::new("maven-central", MAVEN_CENTRAL_URL)
    }

    /// Construct the Google Maven repository.
    pub fn google() -> Self {
        Self::new("google", GOOGLE_MAVEN_URL)
    }

    /// Construct the Jitpack repository.
    pub fn jitpack() -> Self {
        Self::new("jitpack", JITPACK_URL)
    }

    /// Standard Maven layout path for a given coordinate.
    ///
    /// `com.google.guava:guava:31.1-jre` becomes
    /// `com/google/guava/guava/31.1-jre`
    pub fn coordinate_path(group: &str, artifact: &str, version: &str) -> String {
        format!("{}/{}/{}", group.replace('.', "/"), artifact, version)
    }

    /// Full URL to a specific file within the repository.
    pub fn file_url(&self, group: &str, artifact: &str, version: &str, filename: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            Self::coordinate_path(group, artifact, version),
            filename
        )
    }

    /// URL to the POM file for a given coordinate.
    pub fn pom_url(&self, group: &str, artifact: &str, version: &str) -> String {
        let filename = format!("{artifact}-{version}.pom");
        self.file_url(group, artifact, version, &filename)
    }

    /// URL to the `maven-metadata.xml` at the artifact level (version listing).
    pub fn metadata_url(&self, group: &str, artifact: &str) -> String {
        format!(
            "{}/{}/{}/maven-metadata.xml",
            self.base_url,
            group.replace('.', "/"),
            artifact
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_path_replaces_dots() {
        let path = Repository::coordinate_path("com.google.guava", "guava", "31.1-jre");
        assert_eq!(path, "com/google/guava/guava/31.1-jre");
    }

    #[test]
    fn pom_url_format() {
        let repo = Repository::maven_central();
        let url = repo.pom_url("com.google.guava", "guava", "31.1-jre");
        assert_eq!(
            url,
            "https://repo1.maven.org/maven2/com/google/guava/guava/31.1-jre/guava-31.1-jre.pom"
        );
    }

    #[test]
    fn metadata_url_format() {
        let repo = Repository::google();
        let url = repo.metadata_url("androidx.core", "core-ktx");
        assert_eq!(
            url,
            "https://maven.google.com/androidx/core/core-ktx/maven-metadata.xml"
        );
    }

    #[test]
    fn trailing_slash_trimmed() {
        let repo = Repository::new("test", "https://repo.example.com/maven/");
        assert_eq!(repo.base_url, "https://repo.example.com/maven");
    }
}
