//! Gradle build-script manifest adapter.
//!
//! Regex-based extraction of single-string dependency declarations from
//! `dependencies { … }` blocks in `build.gradle` / `build.gradle.kts`.
//! Plugin blocks, variants, and version catalogs are not interpreted.

use std::sync::OnceLock;

use regex::Regex;

use crate::artifact::Artifact;

/// Matches: implementation("group:artifact:version") or implementation('…')
static RE_WITH_PARENS: OnceLock<Regex> = OnceLock::new();
/// Matches: implementation 'group:artifact:version' or implementation "…"
static RE_WITHOUT_PARENS: OnceLock<Regex> = OnceLock::new();

fn re_with_parens() -> &'static Regex {
    RE_WITH_PARENS
        .get_or_init(|| Regex::new(r#"(\w+)\(\s*['"]([^'"]+)['"]\s*\)"#).expect("valid regex"))
}

fn re_without_parens() -> &'static Regex {
    RE_WITHOUT_PARENS
        .get_or_init(|| Regex::new(r#"(\w+)\s+['"]([^'"]+)['"]"#).expect("valid regex"))
}

/// Map a Gradle configuration name to a Maven scope, or `None` when the
/// configuration never reaches the runtime classpath.
fn scope_for(configuration: &str) -> Option<&'static str> {
    match configuration {
        "implementation" | "api" | "compile" => Some("compile"),
        "runtimeOnly" => Some("runtime"),
        // compileOnly maps to provided, test configurations to test;
        // both scopes are filtered from resolution.
        _ => None,
    }
}

/// Extract direct dependencies from a Gradle build script.
///
/// Recognizes `configuration "group:artifact:version[:classifier][@ext]"`
/// and the parenthesized Kotlin-DSL form. Declarations outside a
/// `dependencies { … }` block and unrecognized configurations are ignored.
pub fn parse_dependencies(content: &str) -> Vec<Artifact> {
    let mut artifacts = Vec::new();

    let mut brace_depth: i32 = 0;
    let mut in_dependencies_block = false;
    let mut deps_brace_depth: i32 = 0;

    for line in content.lines() {
        let trimmed = line.trim();

        if !in_dependencies_block && trimmed.starts_with("dependencies") && trimmed.contains('{') {
            in_dependencies_block = true;
            deps_brace_depth = brace_depth + 1;
        }

        let in_block_this_line = in_dependencies_block;

        for ch in line.chars() {
            match ch {
                '{' => brace_depth += 1,
                '}' => {
                    brace_depth -= 1;
                    if in_dependencies_block && brace_depth < deps_brace_depth {
                        in_dependencies_block = false;
                    }
                }
                _ => {}
            }
        }

        if !in_block_this_line {
            continue;
        }

        for caps in re_with_parens().captures_iter(line) {
            push_declaration(&mut artifacts, &caps[1], &caps[2]);
        }
        for caps in re_without_parens().captures_iter(line) {
            push_declaration(&mut artifacts, &caps[1], &caps[2]);
        }
    }

    artifacts
}

fn push_declaration(artifacts: &mut Vec<Artifact>, configuration: &str, notation: &str) {
    if scope_for(configuration).is_none() {
        return;
    }
    if let Some(artifact) = Artifact::parse(notation) {
        artifacts.push(artifact);
    } else {
        tracing::debug!("ignoring unparseable dependency notation {notation:?}");
    }
}
