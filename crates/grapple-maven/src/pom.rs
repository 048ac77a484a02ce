//! POM file parsing: dependency declarations, parent references, property
//! interpolation, dependency management, and the direct-dependency extractor.

use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use grapple_core::artifact::Artifact;
use grapple_util::errors::GrappleError;

/// Interpolation is iterated until a fixed point or this many passes, so
/// property-to-property references terminate.
const MAX_INTERPOLATION_PASSES: usize = 10;

/// A parsed POM (Project Object Model) file.
#[derive(Debug, Clone, Default)]
pub struct Pom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,

    pub parent: Option<ParentRef>,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<PomDependency>,
    pub dependency_management: Vec<PomDependency>,
    /// URLs declared under `<repositories>`.
    pub repositories: Vec<String>,
}

/// Reference to a parent POM.
#[derive(Debug, Clone)]
pub struct ParentRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

/// A dependency declared in a POM file.
#[derive(Debug, Clone, Default)]
pub struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub optional: bool,
    pub classifier: Option<String>,
    pub type_: Option<String>,
    pub exclusions: Vec<PomExclusion>,
}

/// An exclusion within a dependency declaration.
#[derive(Debug, Clone)]
pub struct PomExclusion {
    pub group_id: String,
    pub artifact_id: Option<String>,
}

impl PomExclusion {
    /// The key stored on the produced `Artifact`: `group:artifact`, or the
    /// bare group for group-wide (`*` or absent artifactId) exclusions.
    fn exclusion_key(&self) -> String {
        match self.artifact_id.as_deref() {
            Some("*") | None => self.group_id.clone(),
            Some(artifact) => format!("{}:{artifact}", self.group_id),
        }
    }
}

impl Pom {
    /// Effective group ID (falls back to parent).
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    /// Effective version (falls back to parent).
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.version.as_str()))
    }

    /// Resolve `${property}` references using the POM's property table and
    /// built-in project variables, iterated to a fixed point. Unresolvable
    /// references are kept literally.
    pub fn interpolate(&self, input: &str) -> String {
        let mut value = input.to_string();
        for _ in 0..MAX_INTERPOLATION_PASSES {
            let next = self.interpolate_once(&value);
            if next == value {
                break;
            }
            value = next;
        }
        value
    }

    fn interpolate_once(&self, input: &str) -> String {
        let mut out = String::new();
        let mut rest = input;
        while let Some(start) = rest.find("${") {
            let Some(end) = rest[start..].find('}') else {
                break;
            };
            let key = &rest[start + 2..start + end];
            out.push_str(&rest[..start]);
            match self.lookup_property(key) {
                Some(value) => out.push_str(&value),
                None => out.push_str(&rest[start..start + end + 1]),
            }
            rest = &rest[start + end + 1..];
        }
        out.push_str(rest);
        out
    }

    fn lookup_property(&self, key: &str) -> Option<String> {
        match key {
            "project.groupId" | "pom.groupId" => self.effective_group_id().map(str::to_string),
            "project.artifactId" | "pom.artifactId" => self.artifact_id.clone(),
            "project.version" | "pom.version" => self.effective_version().map(str::to_string),
            "project.packaging" | "pom.packaging" => self.packaging.clone(),
            "project.parent.groupId" => self.parent.as_ref().map(|p| p.group_id.clone()),
            "project.parent.version" => self.parent.as_ref().map(|p| p.version.clone()),
            _ => self.properties.get(key).cloned(),
        }
    }

    /// Interpolate property references in dependencies and dependency
    /// management entries.
    pub fn resolve_properties(&mut self) {
        let snapshot = self.clone();
        for dep in self
            .dependencies
            .iter_mut()
            .chain(self.dependency_management.iter_mut())
        {
            dep.group_id = snapshot.interpolate(&dep.group_id);
            dep.artifact_id = snapshot.interpolate(&dep.artifact_id);
            if let Some(ref v) = dep.version {
                dep.version = Some(snapshot.interpolate(v));
            }
        }
    }

    /// Merge a parent POM into this one. Child values win; `<dependencies>`
    /// and `<dependencyManagement>` are unioned, the child's entries taking
    /// precedence over parent entries for the same `(groupId, artifactId)`.
    pub fn apply_parent(&mut self, parent: &Pom) {
        for (k, v) in &parent.properties {
            self.properties
                .entry(k.clone())
                .or_insert_with(|| v.clone());
        }
        if self.group_id.is_none() {
            self.group_id = parent.effective_group_id().map(str::to_string);
        }
        if self.version.is_none() {
            self.version = parent.effective_version().map(str::to_string);
        }
        for dep in &parent.dependencies {
            let declared = self
                .dependencies
                .iter()
                .any(|d| d.group_id == dep.group_id && d.artifact_id == dep.artifact_id);
            if !declared {
                self.dependencies.push(dep.clone());
            }
        }
        self.merge_dependency_management(&parent.dependency_management);
        for url in &parent.repositories {
            if !self.repositories.contains(url) {
                self.repositories.push(url.clone());
            }
        }
    }

    /// Union foreign `dependencyManagement` entries in, keeping existing
    /// entries for the same `(groupId, artifactId)`.
    pub fn merge_dependency_management(&mut self, managed: &[PomDependency]) {
        for dm in managed {
            let dominated = self
                .dependency_management
                .iter()
                .any(|d| d.group_id == dm.group_id && d.artifact_id == dm.artifact_id);
            if !dominated {
                self.dependency_management.push(dm.clone());
            }
        }
    }

    /// Look up a pinned version from dependency management.
    pub fn managed_version(&self, group_id: &str, artifact_id: &str) -> Option<&str> {
        self.dependency_management
            .iter()
            .find(|d| d.group_id == group_id && d.artifact_id == artifact_id)
            .and_then(|d| d.version.as_deref())
    }

    /// BOM imports: dependency management entries with `scope = "import"`
    /// and `type = "pom"`.
    pub fn bom_imports(&self) -> Vec<&PomDependency> {
        self.dependency_management
            .iter()
            .filter(|d| {
                d.scope.as_deref() == Some("import") && d.type_.as_deref().unwrap_or("jar") == "pom"
            })
            .collect()
    }

    /// Extract the direct dependencies of this effective POM.
    ///
    /// Drops `optional` entries and `test`/`provided`/`system` scopes, keeps
    /// `compile` (the default) and `runtime`, pins missing versions from
    /// dependency management, and attaches declared exclusions to the
    /// produced artifacts. Entries whose version is still a bare property
    /// reference count as missing.
    pub fn direct_dependencies(&self) -> Vec<Artifact> {
        let mut out = Vec::new();
        for dep in &self.dependencies {
            if dep.optional {
                continue;
            }
            let scope = dep.scope.as_deref().unwrap_or("compile");
            if !matches!(scope, "compile" | "runtime") {
                continue;
            }

            let declared = dep
                .version
                .as_deref()
                .filter(|v| !v.is_empty() && !v.contains("${"));
            let version = declared
                .or_else(|| self.managed_version(&dep.group_id, &dep.artifact_id))
                .unwrap_or("")
                .to_string();

            let mut artifact = Artifact::new(&dep.group_id, &dep.artifact_id, version);
            if let Some(classifier) = &dep.classifier {
                artifact = artifact.with_classifier(classifier);
            }
            if let Some(type_) = &dep.type_ {
                artifact = artifact.with_extension(type_);
            }
            for exclusion in &dep.exclusions {
                artifact.exclusions.insert(exclusion.exclusion_key());
            }
            out.push(artifact);
        }
        out
    }
}

/// Parse a POM XML string.
pub fn parse_pom(xml: &str) -> Result<Pom, GrappleError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pom = Pom::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    let mut current_dep: Option<PomDependency> = None;
    let mut current_exclusion: Option<PomExclusion> = None;
    let mut current_parent: Option<ParentRef> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                path.push(tag);
                text_buf.clear();

                match path_context(&path).as_str() {
                    "project>dependencies>dependency"
                    | "project>dependencyManagement>dependencies>dependency" => {
                        current_dep = Some(PomDependency::default());
                    }
                    ctx if ctx.ends_with(">exclusions>exclusion") && current_dep.is_some() => {
                        current_exclusion = Some(PomExclusion {
                            group_id: String::new(),
                            artifact_id: None,
                        });
                    }
                    "project>parent" => {
                        current_parent = Some(ParentRef {
                            group_id: String::new(),
                            artifact_id: String::new(),
                            version: String::new(),
                        });
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::End(_)) => {
                let ctx = path_context(&path);
                let depth = path.len();
                let tag = path.last().map(String::as_str).unwrap_or("");

                // Properties: <project><properties><key>value</key>
                if depth == 3 && path.get(1).map(String::as_str) == Some("properties") {
                    pom.properties.insert(tag.to_string(), text_buf.clone());
                }

                if current_exclusion.is_some() {
                    if ctx.ends_with(">exclusions>exclusion") {
                        if let (Some(excl), Some(dep)) =
                            (current_exclusion.take(), current_dep.as_mut())
                        {
                            dep.exclusions.push(excl);
                        }
                    } else if let Some(ref mut excl) = current_exclusion {
                        match tag {
                            "groupId" => excl.group_id = text_buf.clone(),
                            "artifactId" => excl.artifact_id = Some(text_buf.clone()),
                            _ => {}
                        }
                    }
                } else if current_dep.is_some() {
                    if ctx == "project>dependencies>dependency" {
                        if let Some(dep) = current_dep.take() {
                            pom.dependencies.push(dep);
                        }
                    } else if ctx == "project>dependencyManagement>dependencies>dependency" {
                        if let Some(dep) = current_dep.take() {
                            pom.dependency_management.push(dep);
                        }
                    } else if let Some(ref mut dep) = current_dep {
                        if ctx.ends_with(">dependency>groupId") {
                            dep.group_id = text_buf.clone();
                        } else if ctx.ends_with(">dependency>artifactId") {
                            dep.artifact_id = text_buf.clone();
                        } else if ctx.ends_with(">dependency>version") {
                            dep.version = Some(text_buf.clone());
                        } else if ctx.ends_with(">dependency>scope") {
                            dep.scope = Some(text_buf.clone());
                        } else if ctx.ends_with(">dependency>optional") {
                            dep.optional = text_buf.trim() == "true";
                        } else if ctx.ends_with(">dependency>classifier") {
                            dep.classifier = Some(text_buf.clone());
                        } else if ctx.ends_with(">dependency>type") {
                            dep.type_ = Some(text_buf.clone());
                        }
                    }
                }

                if current_parent.is_some() {
                    if ctx == "project>parent" {
                        pom.parent = current_parent.take();
                    } else if let Some(ref mut parent) = current_parent {
                        match ctx.as_str() {
                            "project>parent>groupId" => parent.group_id = text_buf.clone(),
                            "project>parent>artifactId" => parent.artifact_id = text_buf.clone(),
                            "project>parent>version" => parent.version = text_buf.clone(),
                            _ => {}
                        }
                    }
                }

                // Top-level project fields
                if depth == 2 {
                    match tag {
                        "groupId" => pom.group_id = Some(text_buf.clone()),
                        "artifactId" => pom.artifact_id = Some(text_buf.clone()),
                        "version" => pom.version = Some(text_buf.clone()),
                        "packaging" => pom.packaging = Some(text_buf.clone()),
                        _ => {}
                    }
                }

                if ctx == "project>repositories>repository>url" && !text_buf.is_empty() {
                    pom.repositories.push(text_buf.clone());
                }

                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => {
                if !path.is_empty() {
                    return Err(GrappleError::InvalidPom {
                        coordinate: pom_identity(&pom),
                        message: format!("unclosed <{}> at end of document", path.join(">")),
                    });
                }
                break;
            }
            Err(e) => {
                return Err(GrappleError::InvalidPom {
                    coordinate: pom_identity(&pom),
                    message: format!("malformed POM XML: {e}"),
                });
            }
            _ => {}
        }
    }

    Ok(pom)
}

fn pom_identity(pom: &Pom) -> String {
    format!(
        "{}:{}",
        pom.effective_group_id().unwrap_or("?"),
        pom.artifact_id.as_deref().unwrap_or("?")
    )
}

/// Build a `>`-joined context string from the current XML path.
fn path_context(path: &[String]) -> String {
    path.join(">")
}
