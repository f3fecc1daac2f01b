use thiserror::Error;

/// Fatal load/export surface. Only these abort a session; every field-level
/// problem (missing column, unparseable cell) degrades to an absent value
/// instead of an error.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open workbook {path}: {source}")]
    OpenWorkbook {
        path: String,
        #[source]
        source: calamine::Error,
    },

    #[error("sheet \"{0}\" not found in workbook")]
    SheetNotFound(String),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LoadError>;
