//! Core library entry for the `dockeep` CLI.
//!
//! `dockeep` keeps a documentation record per declaration (function, method,
//! class) of a repository and, on each commit, regenerates only the entries
//! whose code changed.

pub mod adapters;
pub mod attribution;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod diff;
pub mod error;
pub mod generate;
pub mod meta;
pub mod ports;
pub mod reconcile;
pub mod render;
pub mod runner;
pub mod structure;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli)
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn run_errors_on_unknown_subcommand() {
        let result = run(["dockeep", "unknown"]);
        assert!(result.is_err());
    }
}
