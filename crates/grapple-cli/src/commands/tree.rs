//! Command: print the resolved dependency tree.

use std::path::Path;

use miette::Result;

use grapple_resolver::DependencyResolver;

pub async fn exec(path: &Path) -> Result<()> {
    let resolver = DependencyResolver::new()?;
    let resolution = resolver.resolve_project(path).await?;
    print!("{}", resolution.graph.print_tree());
    Ok(())
}
