//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `dockeep`.
#[derive(Debug, Parser)]
#[command(name = "dockeep", version, about = "Keep per-declaration documentation in step with code")]
pub struct Cli {
    /// Repository root; defaults to the current directory.
    #[arg(long, global = true)]
    pub repo: Option<PathBuf>,
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the documentation record from the tracked sources.
    Init {
        /// Rebuild even if a record already exists.
        #[arg(long)]
        force: bool,
    },
    /// Document every declaration that has no documentation yet.
    Generate,
    /// Update documentation for the staged changes.
    Update,
    /// Summarize the documentation record.
    Status,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_init_with_force() {
        let cli = Cli::parse_from(["dockeep", "init", "--force"]);
        assert!(matches!(cli.command, Command::Init { force: true }));
        assert!(cli.repo.is_none());
    }

    #[test]
    fn repo_flag_is_accepted_after_the_subcommand() {
        let cli = Cli::parse_from(["dockeep", "update", "--repo", "/tmp/project"]);
        assert!(matches!(cli.command, Command::Update));
        assert_eq!(cli.repo.unwrap().to_str(), Some("/tmp/project"));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["dockeep"]).is_err());
    }
}
