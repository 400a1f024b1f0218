//! Campaign import handlers
//!
//! Accepts ad platform CSV exports (Meta Ads, Google Ads) uploaded as
//! multipart form data and inserts them as campaigns for one client.
//! Imports are idempotent: rows already present are counted as skipped.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::{get_user_email, AppError, AppState, MAX_UPLOAD_SIZE};
use vantage_core::import::{detect_format, import_hash, parse_csv, ImportFormat, ImportStats};

/// Response for the import endpoint
#[derive(Serialize)]
pub struct ImportResponse {
    pub stats: ImportStats,
    pub client_id: i64,
    pub client_name: String,
    /// Format that was used to parse the file (detected or explicit)
    pub format: String,
}

/// POST /api/import/campaigns - Import campaigns from an ad platform CSV
///
/// Expects multipart form with:
/// - file: CSV file (required, max 10MB)
/// - client_id: Client to attach the campaigns to (required)
/// - format: "meta" or "google" (optional, detected from the header if absent)
pub async fn import_campaigns(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, AppError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut client_id: Option<i64> = None;
    let mut format_override: Option<String> = None;
    let mut total_size: usize = 0;

    // Extract fields from multipart form
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::bad_request("Failed to read file data"))?;
                total_size += bytes.len();

                // Check file size limit
                if total_size > MAX_UPLOAD_SIZE {
                    return Err(AppError::bad_request(&format!(
                        "File too large. Maximum size is {} MB",
                        MAX_UPLOAD_SIZE / 1024 / 1024
                    )));
                }

                file_data = Some(bytes.to_vec());
            }
            "client_id" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| AppError::bad_request("Failed to read client_id"))?;
                client_id = Some(value.parse().map_err(|_| {
                    AppError::bad_request(&format!("Invalid client_id: {}", value))
                })?);
            }
            "format" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| AppError::bad_request("Failed to read format"))?;
                if !value.is_empty() {
                    format_override = Some(value);
                }
            }
            _ => {}
        }
    }

    // Validate required fields
    let file_data = file_data.ok_or_else(|| AppError::bad_request("Missing file field"))?;
    let client_id = client_id.ok_or_else(|| AppError::bad_request("Missing client_id field"))?;

    // Delegate to core import logic
    import_campaigns_core(
        &state,
        &headers,
        file_data,
        client_id,
        format_override.as_deref(),
    )
    .await
}

/// Core import logic - separated for testability
///
/// This function contains all the business logic for importing CSV data,
/// separated from multipart form parsing.
pub async fn import_campaigns_core(
    state: &AppState,
    headers: &HeaderMap,
    file_data: Vec<u8>,
    client_id: i64,
    format_override: Option<&str>,
) -> Result<Json<ImportResponse>, AppError> {
    let user_email = get_user_email(headers);
    let viewer = state.resolve_viewer(headers);

    // Verify the target client exists and is visible to the viewer
    let client = state
        .db
        .get_client(&viewer, client_id)?
        .ok_or_else(|| AppError::not_found(&format!("Client {} not found", client_id)))?;

    // Resolve the format: explicit field wins, otherwise sniff the header line
    let format = match format_override {
        Some(value) => value
            .parse::<ImportFormat>()
            .map_err(|e| AppError::bad_request(&e))?,
        None => {
            let file_str = String::from_utf8_lossy(&file_data);
            let header_line = file_str.lines().next().unwrap_or("");
            detect_format(header_line).ok_or_else(|| {
                AppError::bad_request(
                    "Unrecognized file format. Upload a Meta Ads or Google Ads campaign export",
                )
            })?
        }
    };

    // Parse the CSV
    let campaigns = parse_csv(file_data.as_slice(), format, client_id)?;

    // Insert rows, skipping ones already imported (same client, name, start date)
    let mut stats = ImportStats::default();
    for campaign in &campaigns {
        let hash = import_hash(client_id, &campaign.name, &campaign.start_date);
        match state.db.insert_imported_campaign(campaign, &hash)? {
            Some(_) => stats.imported += 1,
            None => stats.skipped += 1,
        }
    }

    info!(
        "Imported {} campaigns for client {} ({} skipped as duplicates)",
        stats.imported, client.name, stats.skipped
    );

    // Audit log
    state.db.log_audit(
        &user_email,
        "import",
        Some("campaign"),
        Some(client_id),
        Some(&format!(
            "format={}, imported={}, skipped={}",
            format, stats.imported, stats.skipped
        )),
    )?;

    Ok(Json(ImportResponse {
        stats,
        client_id,
        client_name: client.name,
        format: format.to_string(),
    }))
}
