//! Import and export of space lists: CSV, JSON and Excel workbooks.

pub mod csv;
pub mod excel;
pub mod json;
pub mod record;

pub use crate::error::{ExportError, ImportError};
pub use record::{into_updates, Column, ImportRecord};

use crate::model::Space;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
    Excel,
}

impl Format {
    /// Format named by the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Result<Self, ImportError> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "xlsx" | "xls" => Ok(Self::Excel),
            _ => Err(ImportError::UnsupportedFormat { extension }),
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Json => "JSON",
            Self::Excel => "Excel",
        }
    }
}

/// Reads partial space records from `path`, picking the reader by extension.
pub fn import_file(path: &Path) -> Result<Vec<ImportRecord>, ImportError> {
    let format = Format::from_path(path)?;
    let records = match format {
        Format::Csv => csv::read_csv(path)?,
        Format::Json => json::read_json(path)?,
        Format::Excel => excel::read_excel(path)?,
    };
    info!(path = %path.display(), format = format.label(), records = records.len(), "imported records");
    Ok(records)
}

pub fn export_file(format: Format, spaces: &[&Space], path: &Path) -> Result<(), ExportError> {
    match format {
        Format::Csv => csv::export_csv(spaces, path)?,
        Format::Json => json::export_json(spaces, path)?,
        Format::Excel => excel::export_excel(spaces, path)?,
    }
    info!(path = %path.display(), format = format.label(), spaces = spaces.len(), "exported spaces");
    Ok(())
}
