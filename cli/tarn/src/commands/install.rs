//! `tarn install` — materialize every dependency in the manifest.

use std::io::Write;

use anyhow::{bail, Result};
use tarn_install::MaterializeReport;

/// Print one line per package and a summary.
///
/// Fails when any package failed, after everything has been printed.
pub fn report(report: &MaterializeReport, out: &mut impl Write) -> Result<()> {
    if report.outcomes.is_empty() {
        writeln!(out, "No dependencies to install.")?;
        return Ok(());
    }

    for outcome in &report.outcomes {
        let request = &outcome.request;
        match &outcome.result {
            Ok(path) => writeln!(
                out,
                "  installed {}@{} -> {}",
                request.name,
                request.selector,
                path.display()
            )?,
            Err(e) => writeln!(out, "  failed    {}@{}: {e}", request.name, request.selector)?,
        }
    }

    let installed = report.installed().count();
    let failed = report.failed().count();
    writeln!(out, "Installed {installed} of {} packages.", report.outcomes.len())?;

    if failed > 0 {
        bail!("{failed} package(s) failed to install");
    }
    Ok(())
}
