use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Substitutes GeckoView nightly dependencies with a locally built GeckoView.
#[derive(Debug, Parser)]
#[clap(version)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub cmd: Command,
    /// Project root directory, containing the local properties file
    #[clap(short, long, env = "GECKOVIEW_LOCAL_ROOT", default_value = ".")]
    pub root: PathBuf,
    /// Name of the local properties file, relative to the root
    #[clap(short, long)]
    pub properties_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Applies the substitutions to a project file and prints the resolved dependencies
    Apply {
        /// Project file, relative to the root
        #[clap(short = 'f', long, default_value = "project.toml")]
        project: PathBuf,
        /// Writes the report to this file instead of stdout
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Runs `mach environment` for the configured local GeckoView and prints what it found
    Environment,
    /// Prints the loaded local properties
    Properties,
}
