use std::sync::{Mutex, PoisonError};

use tax_core::{MonetaryAmount, TaxRecord};
use tracing::{debug, info};

use crate::spreadsheet::{ExportError, Spreadsheet};

/// Column names written as the first row of a new sheet.
pub const SHEET_HEADER: [&str; 5] = ["id", "annual_income", "rent", "investments", "tax_amount"];

/// One exported record as read back from a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub id: String,
    pub annual_income: String,
    pub rent: String,
    pub investments: String,
    pub tax_amount: MonetaryAmount,
}

/// Writes tax records to one sheet of a [`Spreadsheet`].
///
/// Appends from different threads are serialized so the header is written
/// exactly once.
#[derive(Debug)]
pub struct TaxSheetExporter {
    spreadsheet: Spreadsheet,
    sheet: String,
    write_lock: Mutex<()>,
}

impl TaxSheetExporter {
    pub fn new(
        spreadsheet: Spreadsheet,
        sheet: impl Into<String>,
    ) -> Self {
        Self {
            spreadsheet,
            sheet: sheet.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    pub fn spreadsheet(&self) -> &Spreadsheet {
        &self.spreadsheet
    }

    /// Appends one row per record, preceded by [`SHEET_HEADER`] when the
    /// sheet is new or empty. Returns the number of record rows written.
    pub fn append_records(
        &self,
        records: &[TaxRecord],
    ) -> Result<usize, ExportError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut rows = Vec::with_capacity(records.len() + 1);
        if self.spreadsheet.is_blank(&self.sheet)? {
            rows.push(SHEET_HEADER.iter().map(|c| c.to_string()).collect());
        }
        rows.extend(records.iter().map(record_row));

        self.spreadsheet.append_rows(&self.sheet, &rows)?;
        info!(sheet = %self.sheet, records = records.len(), "exported tax records");
        Ok(records.len())
    }

    /// Every exported row, header excluded. Fails on the first row that
    /// cannot be decoded or parsed.
    pub fn rows(&self) -> Result<Vec<SheetRow>, ExportError> {
        self.spreadsheet
            .read_sheet(&self.sheet)?
            .into_iter()
            .enumerate()
            .filter(|(i, cells)| !(*i == 0 && is_header(cells)))
            .map(|(i, cells)| parse_row(i + 1, cells))
            .collect()
    }

    /// Looks up the tax amount recorded for `id`. When the id was exported
    /// more than once the latest row wins.
    ///
    /// Only the matching row is parsed; malformed rows for other ids do not
    /// affect the result.
    pub fn lookup_tax_amount(
        &self,
        id: &str,
    ) -> Result<Option<MonetaryAmount>, ExportError> {
        let latest = self
            .spreadsheet
            .find_rows(&self.sheet, id)?
            .into_iter()
            .filter(|(row, cells)| !(*row == 1 && is_header(cells)))
            .next_back();

        let found = latest
            .map(|(row, cells)| parse_row(row, cells).map(|r| r.tax_amount))
            .transpose()?;
        debug!(id, found = found.is_some(), "sheet lookup");
        Ok(found)
    }
}

fn record_row(record: &TaxRecord) -> Vec<String> {
    vec![
        record.id.to_string(),
        record.annual_income.clone(),
        record.rent.clone(),
        record.investments.clone(),
        record.tax_amount.to_string(),
    ]
}

fn is_header(cells: &[String]) -> bool {
    cells.first().is_some_and(|c| c == SHEET_HEADER[0])
}

/// `row` is 1-based, matching what a spreadsheet program shows.
fn parse_row(
    row: usize,
    cells: Vec<String>,
) -> Result<SheetRow, ExportError> {
    let [id, annual_income, rent, investments, tax_amount]: [String; 5] =
        cells.try_into().map_err(|cells: Vec<String>| ExportError::ShortRow {
            row,
            expected: SHEET_HEADER.len(),
            found: cells.len(),
        })?;

    let tax_amount = tax_amount
        .parse::<MonetaryAmount>()
        .map_err(|_| ExportError::InvalidAmount {
            row,
            value: tax_amount.clone(),
        })?;

    Ok(SheetRow {
        id,
        annual_income,
        rent,
        investments,
        tax_amount,
    })
}
