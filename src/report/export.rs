// Export adapter for memory reports
// Serializes reports to bytes; only write_report touches the filesystem

use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{Error, Result};
use super::model::MemoryReport;

/// Output format of an exported report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    /// Whole report, pretty-printed
    #[default]
    Json,
    /// Tensor table only, one row per temporary tensor
    Csv,
    /// Summary plus the three report views as tables
    Markdown,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "md",
        }
    }
}

const CSV_HEADER: [&str; 8] = [
    "graph",
    "tensor",
    "name",
    "size_bytes",
    "age",
    "generator",
    "generator_weight",
    "highlighted",
];

/// Export one report
pub fn export_report(report: &MemoryReport, format: ExportFormat) -> Result<Vec<u8>> {
    export_reports(std::slice::from_ref(report), format)
}

/// Export several reports into one document
///
/// JSON yields an array when more than one report is given; CSV shares a
/// single header and tells graphs apart by the `graph` column.
pub fn export_reports(reports: &[MemoryReport], format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Json => match reports {
            [report] => Ok(serde_json::to_vec_pretty(report)?),
            _ => Ok(serde_json::to_vec_pretty(reports)?),
        },
        ExportFormat::Csv => export_csv(reports),
        ExportFormat::Markdown => {
            let mut output = Vec::new();
            for (i, report) in reports.iter().enumerate() {
                if i > 0 {
                    writeln!(&mut output)?;
                }
                write_markdown(&mut output, report)?;
            }
            Ok(output)
        }
    }
}

/// Export a report and write it to `path`, creating parent directories
pub fn write_report(report: &MemoryReport, format: ExportFormat, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let bytes = export_report(report, format)?;
    let mut file = File::create(path)?;
    file.write_all(&bytes)?;

    info!(
        "Wrote {} memory report for {} to {}",
        format,
        report.graph_name,
        path.display()
    );
    Ok(())
}

fn export_csv(reports: &[MemoryReport]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for report in reports {
        for row in &report.tensor_table {
            writer.write_record(&[
                report.graph_name.clone(),
                row.tensor.0.to_string(),
                row.name.clone(),
                row.size_bytes.to_string(),
                row.age.to_string(),
                row.generator.clone(),
                row.generator_weight.to_string(),
                row.highlighted.to_string(),
            ])?;
        }
    }

    writer
        .into_inner()
        .map_err(|e| Error::IoError(e.into_error()))
}

fn write_markdown(output: &mut Vec<u8>, report: &MemoryReport) -> Result<()> {
    writeln!(output, "# Memory report: {}\n", report.graph_name)?;

    writeln!(output, "## Summary\n")?;
    match &report.peak_node {
        Some(peak) => writeln!(
            output,
            "- **Peak node**: {} (position {})",
            peak.name, peak.position
        )?,
        None => writeln!(output, "- **Peak node**: none")?,
    }
    writeln!(output, "- **Peak temporary footprint**: {} bytes", report.peak_footprint)?;
    writeln!(output, "- **Persistent footprint**: {} bytes", report.persistent_footprint)?;
    writeln!(
        output,
        "- **Temporary size without reuse**: {} bytes",
        report.naive_temporary_size
    )?;

    if !report.tensor_table.is_empty() {
        writeln!(output, "\n## Temporary Tensors\n")?;
        writeln!(output, "| Tensor | Size (bytes) | Age | Generator | Weight | Peak |")?;
        writeln!(output, "|--------|--------------|-----|-----------|--------|------|")?;
        for row in &report.tensor_table {
            writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} |",
                row.name,
                row.size_bytes,
                row.age,
                row.generator,
                row.generator_weight,
                if row.highlighted { "*" } else { "" }
            )?;
        }
    }

    if !report.weight_ranking.is_empty() {
        writeln!(output, "\n## Node Weights\n")?;
        writeln!(output, "| Position | Node | Weight (bytes) |")?;
        writeln!(output, "|----------|------|----------------|")?;
        for row in &report.weight_ranking {
            writeln!(output, "| {} | {} | {} |", row.position, row.name, row.weight)?;
        }
    }

    if !report.timeline.is_empty() {
        writeln!(output, "\n## Timeline\n")?;
        writeln!(output, "| Position | Node | Used | Footprint |")?;
        writeln!(output, "|----------|------|------|-----------|")?;
        for entry in &report.timeline {
            writeln!(
                output,
                "| {} | {} | {:.1}% | {:.1}% |",
                entry.position,
                entry.name,
                entry.used_fraction * 100.0,
                entry.footprint_fraction * 100.0
            )?;
        }
    }

    Ok(())
}
