//! HTML pages.

use tax_core::{TaxCalculationError, TaxRecord};

use crate::handlers::TaxForm;

/// Escapes text for use in element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(
    title: &str,
    body: &str,
) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn input(
    name: &str,
    label: &str,
    value: &str,
) -> String {
    format!(
        r#"<label for="{name}">{label}</label>
<input type="text" inputmode="numeric" id="{name}" name="{name}" value="{value}" placeholder="0">
"#,
        value = escape(value),
    )
}

/// The input form, optionally pre-filled and showing why the last
/// submission was rejected.
pub fn form_page(
    form: &TaxForm,
    error: Option<&TaxCalculationError>,
) -> String {
    let error_html = error
        .map(|e| {
            format!(
                r#"<p class="error" role="alert">{} must be a whole amount, optionally ending in .00 (got "{}").</p>
"#,
                e.field().label(),
                escape(raw_value(e)),
            )
        })
        .unwrap_or_default();

    let body = format!(
        r#"<h1>Income tax calculator</h1>
{error_html}<form method="post" action="/tax-calculator">
{income}{rent}{expenses}<button type="submit">Calculate</button>
</form>
"#,
        income = input("annualIncome", "Annual income", &form.annual_income),
        rent = input("rentAmount", "Rent paid", &form.rent_amount),
        expenses = input(
            "businessExpense",
            "Investments / business expenses",
            &form.business_expense
        ),
    );
    layout("Income tax calculator", &body)
}

fn raw_value(error: &TaxCalculationError) -> &str {
    match error {
        TaxCalculationError::Parse { raw, .. } => raw,
    }
}

fn or_zero(value: &str) -> &str {
    if value.is_empty() { "0" } else { value }
}

/// A stored calculation.
pub fn result_page(record: &TaxRecord) -> String {
    let body = format!(
        r#"<h1>Your tax</h1>
<dl>
<dt>Reference</dt><dd><code>{id}</code></dd>
<dt>Annual income</dt><dd>{income}</dd>
<dt>Rent paid</dt><dd>{rent}</dd>
<dt>Investments / business expenses</dt><dd>{investments}</dd>
<dt>Tax owed</dt><dd class="tax-amount">{tax}</dd>
</dl>
<p><a href="/">Calculate again</a></p>
"#,
        id = record.id,
        income = escape(or_zero(&record.annual_income)),
        rent = escape(or_zero(&record.rent)),
        investments = escape(or_zero(&record.investments)),
        tax = record.tax_amount.grouped(),
    );
    layout("Your tax", &body)
}

pub fn not_found_page() -> String {
    layout(
        "Not found",
        "<h1>Not found</h1>\n<p>No calculation with that reference.</p>\n<p><a href=\"/\">Start a new calculation</a></p>\n",
    )
}

pub fn error_page() -> String {
    layout(
        "Something went wrong",
        "<h1>Something went wrong</h1>\n<p>Please try again.</p>\n<p><a href=\"/\">Back</a></p>\n",
    )
}
