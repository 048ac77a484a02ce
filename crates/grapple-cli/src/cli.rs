//! CLI argument definitions for grapple.
//!
//! Uses `clap` derive macros; each command corresponds to a handler in the
//! [`super::commands`] module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "grapple",
    version,
    about = "Resolve and download the dependency closure of a JVM project",
    long_about = "grapple walks the transitive dependency graph of a Maven or Gradle \
                  project across remote repositories, settles version conflicts \
                  newest-wins, and downloads the winning artifacts."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the project's dependency closure and print it
    Resolve {
        /// Project directory containing pom.xml or build.gradle(.kts)
        #[arg(long, default_value = ".")]
        path: PathBuf,
        /// Print the resolved artifacts as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve, then download all artifacts into a directory
    Fetch {
        /// Project directory containing pom.xml or build.gradle(.kts)
        #[arg(long, default_value = ".")]
        path: PathBuf,
        /// Directory the artifacts are written to
        #[arg(short, long, default_value = "libs")]
        output: PathBuf,
    },

    /// Print the resolved dependency tree
    Tree {
        /// Project directory containing pom.xml or build.gradle(.kts)
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
