//! Structure inference for spreadsheet grids.
//!
//! Given the cells of a worksheet plus its merged-cell ranges, the
//! [`StructureDetector`] works out where the table starts, how many rows make
//! up the header, how columns should be named when merged cells group them,
//! and which layout the sheet follows:
//!
//! - `standard`: a plain list of records
//! - `pivot`: row categories against period columns (`Jan, Feb, ...`)
//! - `hierarchical`: nested category columns followed by figures
//! - `time_series`: an ordered date column with change-rate columns
//! - `budget_comparison`: budget, actual and variance side by side
//!
//! The result carries a confidence in `[0, 1]` so callers can decide when a
//! human should confirm the structure.
//!
//! # Example
//!
//! ```
//! use sheetsense_core::{Grid, MergedCellRange, StructureDetector};
//!
//! let grid = Grid::parse_rows(vec![
//!     vec!["", "H1", "", "", "H2", "", ""],
//!     vec!["Dept", "Q1", "Q2", "Subtotal", "Q3", "Q4", "Subtotal"],
//!     vec!["Sales", "1", "2", "3", "4", "5", "9"],
//!     vec!["Ops", "2", "2", "4", "1", "1", "2"],
//! ]);
//! let merged = [
//!     MergedCellRange::new(0, 0, 1, 3),
//!     MergedCellRange::new(0, 0, 4, 6),
//! ];
//!
//! let result = StructureDetector::default().detect(&grid, &merged);
//! assert!(result.success);
//! assert_eq!(result.header_row_count, 2);
//! assert_eq!(result.columns[1].name, "H1 / Q1");
//! assert!(result.method.ends_with("+merged_header"));
//! ```
//!
//! # Stages
//!
//! Each stage is also exposed on its own: [`find_data_start`],
//! [`classify_header`], [`resolve_columns`], [`ArchetypeClassifier`] and
//! [`score`].

mod archetype;
mod cell;
mod columns;
mod config;
mod detector;
mod error;
mod grid;
mod header;
mod periods;
mod scoring;
mod title;

/// Re-export archetype types.
pub use archetype::{Archetype, ArchetypeClassifier, Classification, STANDARD_SIGNAL};
/// Re-export cell types.
pub use cell::{Cell, CellValue, ValueKind};
/// Re-export column resolution.
pub use columns::{resolve_columns, Column};
/// Re-export configuration.
pub use config::{BudgetKeywords, DetectorConfig, ScoringConfig, DEFAULT_ARCHETYPE_THRESHOLD};
/// Re-export the detector and its result.
pub use detector::{DetectionResult, StructureDetector, FAILED_METHOD};
/// Re-export error types.
pub use error::{ConfigError, DetectError, Result};
/// Re-export grid types.
pub use grid::{Grid, MergedCellRange};
/// Re-export header classification.
pub use header::{classify_header, HeaderBlock};
/// Re-export scoring.
pub use scoring::{header_fit, score, Score, MERGED_HEADER_SUFFIX};
/// Re-export title skipping.
pub use title::find_data_start;
