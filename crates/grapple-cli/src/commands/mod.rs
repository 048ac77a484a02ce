//! Command dispatch and handler modules.

mod fetch;
mod resolve;
mod tree;

use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Resolve { path, json } => resolve::exec(&path, json, cli.verbose).await,
        Command::Fetch { path, output } => fetch::exec(&path, &output, cli.verbose).await,
        Command::Tree { path } => tree::exec(&path).await,
    }
}
