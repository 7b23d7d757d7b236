//! Request handlers.

use std::sync::Arc;

use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tax_core::{NewTaxRecord, TaxRecord};
use tax_export::TaxSheetExporter;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{WebError, WebResult};
use crate::state::AppState;
use crate::views;

/// Fields posted by the input form. Missing fields read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaxForm {
    #[serde(rename = "annualIncome")]
    pub annual_income: String,
    #[serde(rename = "rentAmount")]
    pub rent_amount: String,
    #[serde(rename = "businessExpense")]
    pub business_expense: String,
}

/// GET /
pub async fn show_form() -> Html<String> {
    Html(views::form_page(&TaxForm::default(), None))
}

/// GET /tax-calculator
pub async fn redirect_to_form() -> Redirect {
    Redirect::to("/")
}

/// POST /tax-calculator
///
/// Computes and stores the tax, then redirects to the stored result.
/// Invalid amounts re-render the form with a 400.
pub async fn calculate(
    State(state): State<Arc<AppState>>,
    Form(form): Form<TaxForm>,
) -> WebResult<Response> {
    let tax_amount = match state.calculator.compute(
        &form.annual_income,
        &form.rent_amount,
        &form.business_expense,
    ) {
        Ok(tax_amount) => tax_amount,
        Err(error) => {
            warn!(%error, "rejected tax form");
            let page = views::form_page(&form, Some(&error));
            return Ok((StatusCode::BAD_REQUEST, Html(page)).into_response());
        }
    };

    let record = state
        .repo
        .create_record(NewTaxRecord {
            annual_income: form.annual_income,
            rent: form.rent_amount,
            investments: form.business_expense,
            tax_amount,
        })
        .await?;
    info!(id = %record.id, %tax_amount, "tax amount calculated");

    if let Some(exporter) = &state.exporter {
        export_record(exporter.clone(), record.clone()).await;
    }

    Ok(Redirect::to(&format!("/tax/{}", record.id)).into_response())
}

/// Export failures are logged; the calculation itself already succeeded.
async fn export_record(
    exporter: Arc<TaxSheetExporter>,
    record: TaxRecord,
) {
    let id = record.id;
    let result =
        tokio::task::spawn_blocking(move || exporter.append_records(std::slice::from_ref(&record)))
            .await;

    match result {
        Ok(Ok(_)) => {}
        Ok(Err(error)) => warn!(%id, %error, "spreadsheet export failed"),
        Err(error) => warn!(%id, %error, "spreadsheet export task failed"),
    }
}

/// GET /tax/:id
pub async fn show_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> WebResult<Html<String>> {
    let id = Uuid::parse_str(&id).map_err(|_| WebError::NotFound)?;
    let record = state.repo.get_record(id).await?;
    Ok(Html(views::result_page(&record)))
}

/// Any unmatched route.
pub async fn not_found() -> WebError {
    WebError::NotFound
}
