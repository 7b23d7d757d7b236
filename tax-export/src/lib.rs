//! Spreadsheet export for computed tax records.
//!
//! A [`Spreadsheet`] is a directory of sheets, one CSV file per sheet.
//! [`TaxSheetExporter`] appends tax records to a sheet and looks recorded
//! amounts back up by id.

mod exporter;
mod spreadsheet;

pub use exporter::{SHEET_HEADER, SheetRow, TaxSheetExporter};
pub use spreadsheet::{ExportError, Spreadsheet};
