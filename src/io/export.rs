//! CSV export for run reports.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::report::RunReport;

/// Column header for CSV report export.
const HEADER: [&str; 4] = ["model", "kind", "value", "unit"];

/// Exports a run report to a CSV file at the given path.
///
/// Writes a header row followed by one row per model summary, in model
/// registration order. Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(report: &RunReport, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(report, buf)
}

/// Writes a run report as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(report: &RunReport, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER)?;
    for s in &report.summaries {
        wtr.write_record([
            s.model.as_str(),
            s.kind.label(),
            format!("{:.6}", s.value).as_str(),
            s.kind.unit(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
