use std::borrow::Cow;
use std::fmt::Display;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header, StatusCode},
    response::Response,
};
use serde::Deserialize;

use marketlens_core::dataset::DashboardView;

use crate::{error::AppError, routes::query::ViewQuery, state::AppState};

const BUSINESS_HEADER: [&str; 5] = [
    "date",
    "order_count",
    "new_customers",
    "total_revenue",
    "gross_profit",
];

const MARKETING_HEADER: [&str; 13] = [
    "date",
    "platform",
    "tactic",
    "state",
    "campaign",
    "impressions",
    "clicks",
    "spend",
    "attributed_revenue",
    "ctr",
    "cpc",
    "cpm",
    "roas",
];

const COMBINED_HEADER: [&str; 17] = [
    "date",
    "order_count",
    "new_customers",
    "total_revenue",
    "gross_profit",
    "impressions",
    "clicks",
    "spend",
    "attributed_revenue",
    "ctr",
    "cpc",
    "cpm",
    "roas",
    "avg_order_value",
    "customer_acquisition_cost",
    "marketing_attribution_rate",
    "profit_margin",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTable {
    Business,
    Marketing,
    Combined,
}

impl ExportTable {
    fn as_str(&self) -> &'static str {
        match self {
            ExportTable::Business => "business",
            ExportTable::Marketing => "marketing",
            ExportTable::Combined => "combined",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub table: Option<String>,
}

/// `GET /api/export`: download one table of the filtered view as CSV.
///
/// `table` is `business`, `marketing`, or `combined` (default). Undefined
/// values are written as empty cells.
#[tracing::instrument(skip(state))]
pub async fn export_table(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ViewQuery>,
    Query(params): Query<ExportParams>,
) -> Result<Response, AppError> {
    let filter = q.to_filter()?;
    let table = match params.table.as_deref().map(str::trim) {
        None | Some("") | Some("combined") => ExportTable::Combined,
        Some("business") => ExportTable::Business,
        Some("marketing") => ExportTable::Marketing,
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "unsupported table: {other}; expected business, marketing, or combined"
            )))
        }
    };

    let view = state.dataset().await?.view(&filter);
    let csv_bytes = Bytes::from(build_csv(&view, table).map_err(AppError::Internal)?);
    tracing::debug!(table = table.as_str(), bytes = csv_bytes.len(), "Export built");

    build_csv_response(&format!("{}.csv", table.as_str()), csv_bytes)
}

/// Sanitize a CSV field value against formula injection.
///
/// Spreadsheet apps interpret values that begin with `=`, `+`, `-`, `@`, TAB,
/// or CR as formulas. Prepending a single quote keeps them literal. Only text
/// columns go through this; numbers are written as-is so negative values
/// stay numeric.
fn sanitize_csv_field(val: &str) -> Cow<'_, str> {
    if val.starts_with(['=', '+', '-', '@', '\t', '\r']) {
        Cow::Owned(format!("'{val}"))
    } else {
        Cow::Borrowed(val)
    }
}

fn cell<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn build_csv(view: &DashboardView, table: ExportTable) -> anyhow::Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    match table {
        ExportTable::Business => {
            wtr.write_record(BUSINESS_HEADER)?;
            for row in &view.business {
                wtr.write_record([
                    row.date.to_string(),
                    row.order_count.to_string(),
                    row.new_customers.to_string(),
                    row.total_revenue.to_string(),
                    row.gross_profit.to_string(),
                ])?;
            }
        }
        ExportTable::Marketing => {
            wtr.write_record(MARKETING_HEADER)?;
            for row in view.performance() {
                let ad = &row.record;
                wtr.write_record([
                    ad.date.to_string(),
                    ad.platform.to_string(),
                    sanitize_csv_field(&ad.tactic).into_owned(),
                    sanitize_csv_field(&ad.state).into_owned(),
                    sanitize_csv_field(&ad.campaign).into_owned(),
                    ad.impressions.to_string(),
                    ad.clicks.to_string(),
                    ad.spend.to_string(),
                    ad.attributed_revenue.to_string(),
                    cell(row.metrics.ctr),
                    cell(row.metrics.cpc),
                    cell(row.metrics.cpm),
                    cell(row.metrics.roas),
                ])?;
            }
        }
        ExportTable::Combined => {
            wtr.write_record(COMBINED_HEADER)?;
            for row in &view.combined {
                wtr.write_record([
                    row.date.to_string(),
                    row.order_count.to_string(),
                    row.new_customers.to_string(),
                    row.total_revenue.to_string(),
                    row.gross_profit.to_string(),
                    cell(row.impressions),
                    cell(row.clicks),
                    cell(row.spend),
                    cell(row.attributed_revenue),
                    cell(row.metrics.ctr),
                    cell(row.metrics.cpc),
                    cell(row.metrics.cpm),
                    cell(row.metrics.roas),
                    cell(row.avg_order_value),
                    cell(row.customer_acquisition_cost),
                    cell(row.marketing_attribution_rate),
                    cell(row.profit_margin),
                ])?;
            }
        }
    }

    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("csv flush failed: {e}"))
}

fn build_csv_response(filename: &str, csv_bytes: Bytes) -> Result<Response, AppError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from(csv_bytes))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to build response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_prefixes_are_neutralized() {
        assert_eq!(sanitize_csv_field("=SUM(A1)"), "'=SUM(A1)");
        assert_eq!(sanitize_csv_field("@cmd"), "'@cmd");
        assert_eq!(sanitize_csv_field("Retargeting"), "Retargeting");
    }

    #[test]
    fn undefined_values_become_empty_cells() {
        assert_eq!(cell::<f64>(None), "");
        assert_eq!(cell(Some(1.5)), "1.5");
    }
}
