use super::record::{property_keys, Column, ImportRecord};
use crate::error::{ExportError, ImportError};
use crate::model::property::display_value;
use crate::model::Space;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const BOM: &str = "\u{feff}";

pub fn export_csv<P: AsRef<Path>>(spaces: &[&Space], path: P) -> Result<(), ExportError> {
    if spaces.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let path_ref = path.as_ref();
    let file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;
    write_csv(spaces, file)
}

/// Writes the BOM, the header row and one row per space.
pub fn write_csv<W: Write>(spaces: &[&Space], mut out: W) -> Result<(), ExportError> {
    out.write_all(BOM.as_bytes())
        .map_err(|e| ExportError::WriteError {
            message: e.to_string(),
        })?;

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(out);

    let keys = property_keys(spaces);
    let header: Vec<&str> = Column::ALL
        .iter()
        .map(|c| c.csv_header())
        .chain(keys.iter().map(String::as_str))
        .collect();
    writer.write_record(&header)?;

    for space in spaces {
        let row: Vec<String> = Column::ALL
            .iter()
            .map(|c| c.text_of(space))
            .chain(
                keys.iter()
                    .map(|k| display_value(space.property(k)).unwrap_or_default()),
            )
            .collect();
        writer.write_record(&row)?;
    }

    writer.flush().map_err(|e| ExportError::WriteError {
        message: e.to_string(),
    })?;

    Ok(())
}

pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Vec<ImportRecord>, ImportError> {
    let path_ref = path.as_ref();
    let text = std::fs::read_to_string(path_ref).map_err(|source| ImportError::FileRead {
        path: path_ref.to_path_buf(),
        source,
    })?;
    parse_csv(&text)
}

/// Parses CSV text with a header row; a file without data rows is an error.
pub fn parse_csv(text: &str) -> Result<Vec<ImportRecord>, ImportError> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    if text.lines().filter(|l| !l.trim().is_empty()).count() < 2 {
        return Err(ImportError::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader.headers()?.iter().map(ToString::to_string).collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(ImportRecord::from_row(&headers, row.iter()));
    }
    Ok(records)
}
