//! `maven-metadata.xml` parsing for version discovery.

use quick_xml::events::Event;
use quick_xml::Reader;

use grapple_util::errors::GrappleError;

/// Artifact-level Maven metadata listing available versions.
///
/// Consulted when a coordinate carries a `LATEST`/`RELEASE`/range marker
/// (or no version at all) that must be pinned to a concrete version.
#[derive(Debug, Clone, Default)]
pub struct MavenMetadata {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub latest: Option<String>,
    pub release: Option<String>,
    pub versions: Vec<String>,
}

/// Parse an artifact-level `maven-metadata.xml`.
pub fn parse_metadata(xml: &str) -> Result<MavenMetadata, GrappleError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut meta = MavenMetadata::default();
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();

    loop {
        let event = reader.read_event().map_err(|e| GrappleError::Generic {
            message: format!("malformed maven-metadata.xml: {e}"),
        })?;
        match event {
            Event::Start(ref e) => {
                path.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
                text.clear();
            }
            Event::Text(ref e) => {
                text = e.unescape().unwrap_or_default().to_string();
            }
            Event::End(_) => {
                record_field(&mut meta, &path, &text);
                path.pop();
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(meta)
}

/// Store a closed element's text into the field its path addresses.
fn record_field(meta: &mut MavenMetadata, path: &[String], value: &str) {
    let segments: Vec<&str> = path.iter().map(String::as_str).collect();
    match segments.as_slice() {
        ["metadata", "groupId"] => meta.group_id = Some(value.to_string()),
        ["metadata", "artifactId"] => meta.artifact_id = Some(value.to_string()),
        ["metadata", "versioning", "latest"] => meta.latest = Some(value.to_string()),
        ["metadata", "versioning", "release"] => meta.release = Some(value.to_string()),
        ["metadata", "versioning", "versions", "version"] => {
            meta.versions.push(value.to_string());
        }
        _ => {}
    }
}
