//! Command: resolve the project's dependency closure and print it.

use std::path::Path;

use miette::{IntoDiagnostic, Result};

use grapple_resolver::DependencyResolver;
use grapple_util::progress;

pub async fn exec(path: &Path, json: bool, verbose: bool) -> Result<()> {
    let resolver = DependencyResolver::new()?;
    let spinner = progress::spinner("resolving dependency graph");
    let resolution = resolver.resolve_project(path).await;
    spinner.finish_and_clear();
    let resolution = resolution?;

    if verbose && !resolution.conflicts.is_empty() {
        eprintln!("{}", resolution.conflicts);
    }

    if json {
        let rendered = serde_json::to_string_pretty(&resolution.artifacts).into_diagnostic()?;
        println!("{rendered}");
    } else {
        for artifact in &resolution.artifacts {
            println!("{artifact}");
        }
        progress::status(
            "Resolved",
            &format!("{} artifacts", resolution.artifacts.len()),
        );
    }

    Ok(())
}
