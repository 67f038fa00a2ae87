//! Error types for sheetsense.

use thiserror::Error;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Terminal failures of a detection run.
///
/// These never escape `detect()` as `Err`; they are folded into a failed
/// [`DetectionResult`](crate::DetectionResult) so callers always receive a
/// value they can serialize.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectError {
    /// The grid has no rows, no columns, or no non-empty cells.
    #[error("grid is empty ({rows} rows, {cols} cols)")]
    EmptyGrid { rows: usize, cols: usize },

    /// Nothing is left below the title block and header.
    #[error("no data rows after header (data start {data_start}, {header_rows} header rows)")]
    NoDataRows {
        data_start: usize,
        header_rows: usize,
    },

    /// The detection task did not run to completion.
    #[error("detection aborted: {0}")]
    Aborted(String),
}

impl DetectError {
    /// Stable machine-readable code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            DetectError::EmptyGrid { .. } => "EMPTY_GRID",
            DetectError::NoDataRows { .. } => "NO_DATA_ROWS",
            DetectError::Aborted(_) => "DETECTION_ABORTED",
        }
    }
}

/// Errors raised while building or loading a detector configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("Invalid keyword pattern: {0}")]
    Keyword(#[from] regex::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_error_codes() {
        assert_eq!(
            DetectError::EmptyGrid { rows: 0, cols: 0 }.code(),
            "EMPTY_GRID"
        );
        assert_eq!(
            DetectError::NoDataRows {
                data_start: 0,
                header_rows: 1
            }
            .code(),
            "NO_DATA_ROWS"
        );
        assert_eq!(
            DetectError::Aborted("panicked".to_string()).code(),
            "DETECTION_ABORTED"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid("titleSparsity", "must be within [0, 1]");
        assert_eq!(
            err.to_string(),
            "Invalid value for titleSparsity: must be within [0, 1]"
        );
    }
}
