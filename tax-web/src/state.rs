//! Shared state handed to every request handler.

use std::sync::Arc;

use tax_core::TaxRecordRepository;
use tax_core::calculations::IncomeTaxCalculator;
use tax_export::TaxSheetExporter;

pub struct AppState {
    /// Where computed records are stored.
    pub repo: Arc<dyn TaxRecordRepository>,

    pub calculator: IncomeTaxCalculator<'static>,

    /// Set when spreadsheet export is enabled.
    pub exporter: Option<Arc<TaxSheetExporter>>,
}

impl AppState {
    /// State with the standard bracket table and export disabled.
    pub fn new(repo: Arc<dyn TaxRecordRepository>) -> Self {
        Self {
            repo,
            calculator: IncomeTaxCalculator::default(),
            exporter: None,
        }
    }

    pub fn with_exporter(
        mut self,
        exporter: TaxSheetExporter,
    ) -> Self {
        self.exporter = Some(Arc::new(exporter));
        self
    }
}
