//! `dockeep generate` command.

use super::block_on;
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::generate::GenerationReport;
use crate::runner::Runner;

/// Documents every declaration that has no documentation yet.
///
/// # Errors
///
/// Returns an error if the record cannot be loaded or written, or if any
/// declaration was left undocumented. Running the command again resumes.
pub fn run(ctx: &ServiceContext, settings: &Settings) -> Result<(), String> {
    let runner = Runner::new(ctx, settings);
    let mut tree = runner.load_or_init().map_err(|e| e.to_string())?;
    let report = block_on(runner.stop_handle(), runner.first_generate(&mut tree))?
        .map_err(|e| e.to_string())?;

    println!("{}", describe(&report));
    for (target, message) in &report.failures {
        eprintln!("  failed: {target}: {message}");
    }
    if report.is_complete() {
        println!("Documentation version is now {}", tree.version_tag());
        Ok(())
    } else {
        Err("Generation incomplete; run `dockeep generate` again to resume".to_string())
    }
}

pub(crate) fn describe(report: &GenerationReport) -> String {
    format!(
        "Generated {} doc(s), {} failed, {} not started",
        report.succeeded, report.failed, report.skipped
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_report_counts() {
        let report = GenerationReport { succeeded: 4, failed: 1, skipped: 2, failures: Vec::new() };
        assert_eq!(describe(&report), "Generated 4 doc(s), 1 failed, 2 not started");
    }
}
