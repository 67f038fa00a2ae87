//! The structure detector: composes title skipping, header classification,
//! column resolution, archetype classification and scoring.

use crate::archetype::{Archetype, ArchetypeClassifier};
use crate::columns::{resolve_columns, Column};
use crate::config::DetectorConfig;
use crate::error::{DetectError, Result};
use crate::grid::{sanitize_merges, Grid, MergedCellRange};
use crate::header::classify_header;
use crate::scoring::{header_fit, score};
use crate::title::find_data_start;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Method reported by failed detections.
pub const FAILED_METHOD: &str = "none";

/// Outcome of one detection, serialized in camelCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub success: bool,
    pub confidence: f64,
    pub method: String,
    pub archetype: Option<Archetype>,
    pub archetype_signal: f64,
    pub header_row_count: usize,
    pub data_start_row: usize,
    /// Body rows, excluding title block and header.
    pub total_rows: usize,
    pub total_cols: usize,
    pub columns: Vec<Column>,
    pub merged_cells: Vec<MergedCellRange>,
    /// `"<CODE>: <message>"` when `success` is false.
    pub error: Option<String>,
}

impl DetectionResult {
    fn failure(
        error: &DetectError,
        data_start_row: usize,
        header_row_count: usize,
        columns: Vec<Column>,
        merged_cells: Vec<MergedCellRange>,
    ) -> Self {
        Self {
            success: false,
            confidence: 0.0,
            method: FAILED_METHOD.to_string(),
            archetype: None,
            archetype_signal: 0.0,
            header_row_count,
            data_start_row,
            total_rows: 0,
            total_cols: columns.len(),
            columns,
            merged_cells,
            error: Some(format!("{}: {}", error.code(), error)),
        }
    }

    /// Machine-readable failure code, if any.
    pub fn error_code(&self) -> Option<&str> {
        self.error
            .as_deref()
            .and_then(|error| error.split_once(':'))
            .map(|(code, _)| code)
    }
}

/// Spreadsheet structure detector.
///
/// Built once from an immutable [`DetectorConfig`] and shared (by reference
/// or behind an [`Arc`]) across any number of concurrent detections.
///
/// # Example
///
/// ```
/// use sheetsense_core::{Grid, StructureDetector};
///
/// let detector = StructureDetector::default();
/// let grid = Grid::parse_rows(vec![
///     vec!["Department", "Jan", "Feb", "Mar"],
///     vec!["Sales", "10", "12", "9"],
///     vec!["Support", "4", "5", "6"],
/// ]);
/// let result = detector.detect(&grid, &[]);
/// assert!(result.success);
/// assert_eq!(result.method, "pivot");
/// ```
#[derive(Debug, Clone)]
pub struct StructureDetector {
    config: DetectorConfig,
    classifier: ArchetypeClassifier,
}

impl Default for StructureDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default()).expect("default detector config is valid")
    }
}

impl StructureDetector {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        let classifier = ArchetypeClassifier::new(&config)?;
        Ok(Self { config, classifier })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Infer the structure of `grid`.
    ///
    /// Never panics on odd input and never returns `Err`: empty grids and
    /// header-only grids yield a failed result, ambiguous layouts yield a
    /// best-effort classification with lower confidence.
    pub fn detect(&self, grid: &Grid, merged_cells: &[MergedCellRange]) -> DetectionResult {
        let span = tracing::debug_span!("detect", rows = grid.height(), cols = grid.width());
        let _enter = span.enter();

        if grid.is_empty() {
            let error = DetectError::EmptyGrid {
                rows: grid.height(),
                cols: grid.width(),
            };
            tracing::debug!(%error, "detection failed");
            let columns = (0..grid.width()).map(Column::placeholder).collect();
            return DetectionResult::failure(&error, 0, 0, columns, Vec::new());
        }

        let merged = sanitize_merges(grid, merged_cells);

        let data_start = find_data_start(grid, &merged, &self.config);
        tracing::trace!(data_start, "title skipped");

        let header = classify_header(grid, data_start, &merged, &self.config);
        tracing::trace!(?header, "header classified");

        let columns = resolve_columns(grid, data_start, header.row_count, &merged);
        tracing::trace!(columns = columns.len(), "columns resolved");

        let body_start = data_start + header.row_count;
        let total_rows = grid.content_height().saturating_sub(body_start);
        if total_rows == 0 {
            let error = DetectError::NoDataRows {
                data_start,
                header_rows: header.row_count,
            };
            tracing::debug!(%error, "detection failed");
            return DetectionResult::failure(&error, data_start, header.row_count, columns, merged);
        }

        let classification = self
            .classifier
            .classify(grid, header.row_count, data_start, &columns);
        tracing::trace!(?classification, "archetype classified");

        let merged_header = columns.iter().any(|column| column.group_id.is_some());
        let scored = score(
            &self.config.scoring,
            header_fit(&header, &self.config.scoring),
            &classification,
            merged_header,
        );
        tracing::debug!(
            method = %scored.method,
            confidence = scored.confidence,
            data_start,
            header_rows = header.row_count,
            total_rows,
            "detection complete"
        );

        DetectionResult {
            success: true,
            confidence: scored.confidence,
            method: scored.method,
            archetype: Some(classification.archetype),
            archetype_signal: classification.signal,
            header_row_count: header.row_count,
            data_start_row: data_start,
            total_rows,
            total_cols: grid.width(),
            columns,
            merged_cells: merged,
            error: None,
        }
    }

    /// Run [`detect`](Self::detect) on the blocking thread pool.
    ///
    /// The algorithm itself is synchronous; this only lets an async host run
    /// many detections without stalling its executor. Must be called from
    /// within a Tokio runtime.
    pub async fn detect_async(
        self: Arc<Self>,
        grid: Grid,
        merged_cells: Vec<MergedCellRange>,
    ) -> DetectionResult {
        let width = grid.width();
        let task = tokio::task::spawn_blocking(move || self.detect(&grid, &merged_cells));
        match task.await {
            Ok(result) => result,
            Err(join_error) => {
                let error = DetectError::Aborted(join_error.to_string());
                tracing::warn!(%error, "detection task failed");
                let columns = (0..width).map(Column::placeholder).collect();
                DetectionResult::failure(&error, 0, 0, columns, Vec::new())
            }
        }
    }
}
