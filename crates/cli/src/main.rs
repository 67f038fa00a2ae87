//! # sheetsense-cli
//!
//! Command-line interface for spreadsheet structure detection.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use sheetsense_core::{DetectionResult, DetectorConfig, StructureDetector};
use sheetsense_xlsx::{load_sheet, load_workbook, LoadedSheet, SheetSelector};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// sheetsense - infer the table structure of a spreadsheet
#[derive(Parser, Debug)]
#[command(name = "sheetsense")]
#[command(author, version, about = "Spreadsheet structure detection", long_about = None)]
struct Cli {
    /// Spreadsheet file (.xlsx, .xls, .xlsb, .ods, .csv, .tsv, .json)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Sheet to analyze, by name
    #[arg(short, long, conflicts_with_all = ["index", "all"])]
    sheet: Option<String>,

    /// Sheet to analyze, by zero-based position
    #[arg(long, conflicts_with = "all")]
    index: Option<usize>,

    /// Analyze every sheet concurrently
    #[arg(short, long)]
    all: bool,

    /// Detector configuration (YAML or JSON)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Output format (json, summary)
    #[arg(short = 'f', long = "format", default_value = "json")]
    format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(short, long)]
    pretty: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Output format for results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    /// Detection results as JSON (default)
    #[default]
    Json,
    /// Human-readable summary
    Summary,
}

/// One entry of the `--all` output.
#[derive(Serialize)]
struct SheetReport {
    sheet: String,
    result: DetectionResult,
}

impl Cli {
    fn selector(&self) -> SheetSelector {
        match (&self.sheet, self.index) {
            (Some(name), _) => SheetSelector::Name(name.clone()),
            (None, Some(index)) => SheetSelector::Index(index),
            (None, None) => SheetSelector::First,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .init();
    }

    let config = match &cli.config {
        Some(path) => DetectorConfig::from_path(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => DetectorConfig::default(),
    };
    let detector = Arc::new(StructureDetector::new(config).context("Invalid detector config")?);

    let reports = if cli.all {
        let sheets = load_workbook(&cli.file)
            .with_context(|| format!("Failed to read file: {}", cli.file.display()))?;
        detect_all(&detector, sheets).await?
    } else {
        let selector = cli.selector();
        let sheet = load_sheet(&cli.file, &selector)
            .with_context(|| format!("Failed to read {selector} of {}", cli.file.display()))?;
        let result = detector.detect(&sheet.grid, &sheet.merged_cells);
        vec![SheetReport {
            sheet: sheet.name,
            result,
        }]
    };
    tracing::info!(sheets = reports.len(), "detection finished");

    match cli.format {
        OutputFormat::Json => print_json(&reports, cli.all, cli.pretty)?,
        OutputFormat::Summary => {
            for report in &reports {
                print!("{}", render_summary(report));
            }
        }
    }

    Ok(())
}

/// Detect every sheet on the blocking pool, keeping workbook order.
async fn detect_all(
    detector: &Arc<StructureDetector>,
    sheets: Vec<LoadedSheet>,
) -> Result<Vec<SheetReport>> {
    let tasks: Vec<_> = sheets
        .into_iter()
        .map(|sheet| {
            let detector = Arc::clone(detector);
            let task = tokio::spawn(detector.detect_async(sheet.grid, sheet.merged_cells));
            (sheet.name, task)
        })
        .collect();

    let mut reports = Vec::with_capacity(tasks.len());
    for (sheet, task) in tasks {
        let result = task
            .await
            .with_context(|| format!("Detection task failed for sheet {sheet}"))?;
        reports.push(SheetReport { sheet, result });
    }
    Ok(reports)
}

fn print_json(reports: &[SheetReport], all: bool, pretty: bool) -> Result<()> {
    let json = if all {
        serde_json::to_value(reports)?
    } else {
        match reports.first() {
            Some(report) => serde_json::to_value(&report.result)?,
            None => serde_json::Value::Null,
        }
    };
    if pretty {
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("{json}");
    }
    Ok(())
}

fn render_summary(report: &SheetReport) -> String {
    let result = &report.result;
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "Sheet:".bold(), report.sheet);

    if !result.success {
        let error = result.error.as_deref().unwrap_or("unknown error");
        let _ = writeln!(out, "  {} {error}", "Failed:".red().bold());
        return out;
    }

    let confidence = format!("{:.2}", result.confidence);
    let confidence = if result.confidence >= 0.8 {
        confidence.green()
    } else if result.confidence >= 0.6 {
        confidence.yellow()
    } else {
        confidence.red()
    };
    let _ = writeln!(out, "  method:      {}", result.method.cyan());
    let _ = writeln!(out, "  confidence:  {confidence}");
    let _ = writeln!(
        out,
        "  layout:      data starts at row {}, {} header row(s), {} body row(s)",
        result.data_start_row, result.header_row_count, result.total_rows
    );
    let _ = writeln!(out, "  columns:");
    for column in &result.columns {
        let group = column
            .group_id
            .as_deref()
            .map(|id| format!(" [{id}]"))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "    {:>3}  {}{} ({})",
            column.index, column.name, group, column.inferred_kind
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetsense_core::Grid;

    #[test]
    fn test_selector_from_args() {
        let cli = Cli::try_parse_from(["sheetsense", "book.xlsx"]).unwrap();
        assert_eq!(cli.selector(), SheetSelector::First);

        let cli = Cli::try_parse_from(["sheetsense", "book.xlsx", "--sheet", "Q1"]).unwrap();
        assert_eq!(cli.selector(), SheetSelector::Name("Q1".into()));

        let cli = Cli::try_parse_from(["sheetsense", "book.xlsx", "--index", "2"]).unwrap();
        assert_eq!(cli.selector(), SheetSelector::Index(2));
    }

    #[test]
    fn test_conflicting_selectors_rejected() {
        assert!(Cli::try_parse_from(["sheetsense", "b.xlsx", "--sheet", "A", "--all"]).is_err());
        assert!(Cli::try_parse_from(["sheetsense", "b.xlsx", "--index", "1", "--all"]).is_err());
        assert!(Cli::try_parse_from(["sheetsense", "b.xlsx", "--sheet", "A", "--index", "1"]).is_err());
    }

    #[test]
    fn test_format_flag() {
        let cli = Cli::try_parse_from(["sheetsense", "b.csv", "-f", "summary"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Summary);
        assert!(Cli::try_parse_from(["sheetsense", "b.csv", "-f", "xml"]).is_err());
    }

    #[test]
    fn test_render_summary() {
        colored::control::set_override(false);
        let grid = Grid::parse_rows(vec![vec!["Name", "Qty"], vec!["Bolt", "4"]]);
        let report = SheetReport {
            sheet: "orders".to_string(),
            result: StructureDetector::default().detect(&grid, &[]),
        };

        let text = render_summary(&report);
        assert!(text.starts_with("Sheet: orders"));
        assert!(text.contains("method:      standard"));
        assert!(text.contains("Qty (number)"));
    }

    #[test]
    fn test_render_failed_summary() {
        colored::control::set_override(false);
        let report = SheetReport {
            sheet: "empty".to_string(),
            result: StructureDetector::default().detect(&Grid::default(), &[]),
        };

        assert!(render_summary(&report).contains("Failed: EMPTY_GRID"));
    }

    #[tokio::test]
    async fn test_detect_all_keeps_order() {
        let sheets: Vec<LoadedSheet> = ["first", "second", "third"]
            .iter()
            .map(|name| LoadedSheet {
                name: (*name).to_string(),
                grid: Grid::parse_rows(vec![vec!["Name", "Qty"], vec![*name, "1"]]),
                merged_cells: Vec::new(),
            })
            .collect();

        let reports = detect_all(&Arc::new(StructureDetector::default()), sheets)
            .await
            .unwrap();

        let names: Vec<&str> = reports.iter().map(|r| r.sheet.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert!(reports.iter().all(|r| r.result.success));
    }
}
