use super::record::{property_keys, Column, ImportRecord};
use crate::error::{ExportError, ImportError};
use crate::model::property::format_number;
use crate::model::{PropertyValue, Space};
use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use std::path::Path;

pub const SHEET_NAME: &str = "Spaces";

pub fn export_excel<P: AsRef<Path>>(spaces: &[&Space], path: P) -> Result<(), ExportError> {
    if spaces.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    let keys = property_keys(spaces);
    let headers = Column::ALL
        .iter()
        .map(|c| c.sheet_header())
        .chain(keys.iter().map(String::as_str));
    for (col, header) in headers.enumerate() {
        sheet.write_string(0, col as u16, header)?;
    }

    for (i, space) in spaces.iter().enumerate() {
        let row = i as u32 + 1;
        write_fixed_columns(sheet, row, space)?;
        for (k, key) in keys.iter().enumerate() {
            let col = (Column::ALL.len() + k) as u16;
            match space.property(key) {
                Some(PropertyValue::Text(text)) => {
                    sheet.write_string(row, col, text)?;
                }
                Some(PropertyValue::Number(n)) => {
                    sheet.write_number(row, col, *n)?;
                }
                Some(PropertyValue::Bool(b)) => {
                    sheet.write_boolean(row, col, *b)?;
                }
                Some(PropertyValue::Null) | None => {}
            }
        }
    }

    workbook.save(path.as_ref())?;
    Ok(())
}

fn write_fixed_columns(sheet: &mut Worksheet, row: u32, space: &Space) -> Result<(), XlsxError> {
    for (col, column) in Column::ALL.iter().enumerate() {
        let col = col as u16;
        let number = match column {
            Column::Area => space.area,
            Column::Volume => space.volume,
            Column::Height => space.height,
            Column::Occupancy => space.occupancy.map(f64::from),
            _ => None,
        };
        if let Some(n) = number {
            sheet.write_number(row, col, n)?;
            continue;
        }
        let text = column.text_of(space);
        if !text.is_empty() {
            sheet.write_string(row, col, &text)?;
        }
    }
    Ok(())
}

/// Reads the first worksheet: a header row followed by data rows.
pub fn read_excel<P: AsRef<Path>>(path: P) -> Result<Vec<ImportRecord>, ImportError> {
    let mut workbook = open_workbook_auto(path.as_ref())?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::Empty)??;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(|c| cell_text(c).unwrap_or_default()).collect(),
        None => return Err(ImportError::Empty),
    };

    let records: Vec<ImportRecord> = rows
        .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|row| {
            let cells: Vec<String> = row.iter().map(|c| cell_text(c).unwrap_or_default()).collect();
            ImportRecord::from_row(&headers, cells.iter().map(String::as_str))
        })
        .collect();

    if records.is_empty() {
        return Err(ImportError::Empty);
    }
    Ok(records)
}

/// Formatted text of a cell, as a spreadsheet shows it.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(f) => Some(format_number(*f)),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        other => Some(other.to_string()),
    }
}
