//! Error types for the space viewer.

use std::path::PathBuf;
use thiserror::Error;

/// Size limit enforced by the backend for uploads, as shown to the user.
pub const UPLOAD_LIMIT_MB: u32 = 100;

/// Errors raised by the backend service adapter.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response at all: backend down, DNS failure, refused connection.
    #[error("cannot reach backend at {url}: {message}")]
    Connection { url: String, message: String },

    /// HTTP 400.
    #[error("bad request{}", detail_suffix(.detail))]
    BadRequest { detail: Option<String> },

    /// HTTP 413.
    #[error("payload too large")]
    PayloadTooLarge,

    /// HTTP 500.
    #[error("server error{}", detail_suffix(.detail))]
    Server { detail: Option<String> },

    /// Any other non-success status.
    #[error("HTTP {status}{}", detail_suffix(.detail))]
    Status { status: u16, detail: Option<String> },

    /// The response body did not have the expected shape.
    #[error("unexpected response: {message}")]
    Decode { message: String },

    /// The file to upload could not be read.
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

impl ApiError {
    /// Classifies a non-success HTTP status.
    #[must_use]
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        match status {
            400 => Self::BadRequest { detail },
            413 => Self::PayloadTooLarge,
            500 => Self::Server { detail },
            _ => Self::Status { status, detail },
        }
    }

    /// True for failures where the backend never answered.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Message suitable for showing next to the control that failed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Connection { url, .. } => format!(
                "Cannot connect to the backend server at {url}. Check that the backend is running."
            ),
            Self::BadRequest { detail } => detail
                .clone()
                .unwrap_or_else(|| "The request was invalid.".to_string()),
            Self::PayloadTooLarge => format!(
                "The file is too large. Choose a file of {UPLOAD_LIMIT_MB} MB or less."
            ),
            Self::Server { detail } => detail.clone().unwrap_or_else(|| {
                "A server error occurred. Check the format of the IFC file.".to_string()
            }),
            Self::Status { status, detail } => detail
                .clone()
                .unwrap_or_else(|| format!("An error occurred (HTTP {status}).")),
            Self::Decode { message } => format!("The backend sent an unexpected response: {message}"),
            Self::FileRead { path, source } => {
                format!("Could not read '{}': {source}", path.display())
            }
        }
    }
}

/// Errors that can occur when reading an import file.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unsupported file format '{extension}' (expected .csv, .json, .xlsx or .xls)")]
    UnsupportedFormat { extension: String },

    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("the file contains no data rows")]
    Empty,

    #[error("JSON import must be an array of space records")]
    NotAnArray,

    #[error("invalid JSON: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid CSV: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    #[error("invalid spreadsheet: {message}")]
    Spreadsheet { message: String },

    #[error("no importable records were found")]
    NothingToImport,
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        Self::Spreadsheet {
            message: err.to_string(),
        }
    }
}

/// Errors that can occur when exporting data.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Nothing passed the current filters.
    #[error("there are no spaces to export")]
    NothingToExport,

    /// Failed to create the output file.
    #[error("failed to create file '{path}': {source}")]
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write data to the file.
    #[error("failed to write data: {message}")]
    WriteError { message: String },

    /// Failed to serialize data to JSON.
    #[error("JSON serialization failed: {source}")]
    JsonSerialize {
        #[from]
        source: serde_json::Error,
    },

    /// Failed to write CSV data.
    #[error("CSV write failed: {source}")]
    CsvWrite {
        #[from]
        source: csv::Error,
    },

    /// Failed to build or save the workbook.
    #[error("Excel write failed: {source}")]
    ExcelWrite {
        #[from]
        source: rust_xlsxwriter::XlsxError,
    },
}

/// Errors reported by the 3D scene.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// The rendering capability is missing; the viewer cannot start here.
    #[error("3D view unavailable: {reason}")]
    Unavailable { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn status_classification() {
        assert!(matches!(ApiError::from_status(400, None), ApiError::BadRequest { .. }));
        assert!(matches!(ApiError::from_status(413, None), ApiError::PayloadTooLarge));
        assert!(matches!(ApiError::from_status(500, None), ApiError::Server { .. }));
        assert!(matches!(
            ApiError::from_status(404, None),
            ApiError::Status { status: 404, .. }
        ));
    }

    #[test]
    fn detail_is_passed_through() {
        let err = ApiError::from_status(500, Some("IFC parse failed".into()));
        assert_eq!(err.user_message(), "IFC parse failed");
        let err = ApiError::from_status(502, None);
        assert_eq!(err.user_message(), "An error occurred (HTTP 502).");
    }

    #[test]
    fn payload_too_large_has_its_own_message() {
        let message = ApiError::PayloadTooLarge.user_message();
        assert!(message.contains("100 MB"));
        assert!(!ApiError::PayloadTooLarge.is_connectivity());
    }
}
