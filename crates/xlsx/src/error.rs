use thiserror::Error;

/// Errors that can occur while loading a grid
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Sheet not found: {name}")]
    SheetNotFound { name: String },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LoadError>;
