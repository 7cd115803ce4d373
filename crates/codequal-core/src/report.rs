use std::fmt::Write;

use crate::audit::ProjectReport;

/// Format styles supported by the default renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}

/// Render a finalized [`ProjectReport`] into a document string.
pub fn render_report(report: &ProjectReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Human => render_human(report),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(report)?),
    }
}

fn render_human(report: &ProjectReport) -> anyhow::Result<String> {
    let mut out = String::new();
    writeln!(out, "Software Quality Report")?;
    writeln!(out, "=======================")?;
    writeln!(
        out,
        "Files analysed: {} ({} failed)",
        report.files_attempted(),
        report.failures.len()
    )?;
    writeln!(out)?;

    writeln!(out, "Quality Ratings:")?;
    if report.files.is_empty() {
        writeln!(out, "  (no files)")?;
    }
    for (idx, path) in report.files.iter().enumerate() {
        writeln!(
            out,
            "  - {path}: {rating}/10",
            path = path.display(),
            rating = report.quality_ratings[idx]
        )?;
    }
    if let Some(mean) = report.mean_rating() {
        writeln!(out, "  Average: {mean:.1}/10")?;
    }
    writeln!(out)?;

    writeln!(out, "Tech Stack:")?;
    let names = report.tech_names();
    if names.is_empty() {
        writeln!(out, "  (no technologies detected)")?;
    } else {
        for name in names {
            writeln!(out, "  - {name}")?;
        }
    }
    writeln!(out)?;

    writeln!(out, "Structural Counts:")?;
    writeln!(out, "  Total Functions: {}", report.summed_functions())?;
    writeln!(out, "  Total Loops:     {}", report.summed_loops())?;
    writeln!(out, "  Total Classes:   {}", report.summed_classes())?;

    if !report.failures.is_empty() {
        writeln!(out)?;
        writeln!(out, "Failures:")?;
        for failure in &report.failures {
            writeln!(
                out,
                "  - {path} [{kind:?}] {detail}",
                path = failure.path.display(),
                kind = failure.kind,
                detail = failure.detail
            )?;
        }
    }

    Ok(out)
}
