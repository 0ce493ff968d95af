//! Thumbnail analysis endpoints.
//!
//! Single analysis validates strictly and fails loudly; batch analysis
//! skips anything that cannot be processed and reports only successes.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use crate::analyzer::AnalysisReport;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::config::Settings;

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub filename: String,
    pub analysis: AnalysisReport,
}

#[derive(Serialize)]
pub struct BatchResponse {
    pub success: bool,
    pub total_analyzed: usize,
    pub results: Vec<BatchItem>,
}

#[derive(Serialize)]
pub struct BatchItem {
    pub filename: String,
    pub analysis: AnalysisReport,
}

/// One decoded multipart upload.
struct Upload {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// POST /analyze
pub async fn single(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let upload = match next_upload(&mut multipart).await? {
        Some(upload) => upload,
        None => return Err(ApiError::BadRequest("No file field in request".into())),
    };
    validate_upload(&upload, &ctx.settings)?;

    let report = ctx.analyzer.analyze(&upload.bytes, &upload.filename)?;

    Ok(Json(AnalyzeResponse {
        success: true,
        filename: upload.filename,
        analysis: report,
    }))
}

/// POST /batch-analyze
///
/// Items that are not images, fail validation, or fail analysis are
/// skipped rather than failing the whole batch.
pub async fn batch(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<BatchResponse>, ApiError> {
    let mut results = Vec::new();

    while let Some(upload) = next_upload(&mut multipart).await? {
        if let Err(err) = validate_upload(&upload, &ctx.settings) {
            warn!(filename = %upload.filename, error = %err, "Skipping batch item");
            continue;
        }
        match ctx.analyzer.analyze(&upload.bytes, &upload.filename) {
            Ok(report) => results.push(BatchItem {
                filename: upload.filename,
                analysis: report,
            }),
            Err(err) => {
                warn!(filename = %upload.filename, error = %err, "Skipping failed batch item");
            }
        }
    }

    info!(total_analyzed = results.len(), "Batch analysis complete");

    Ok(Json(BatchResponse {
        success: true,
        total_analyzed: results.len(),
        results,
    }))
}

/// Pull the next file field out of the multipart stream.
async fn next_upload(multipart: &mut Multipart) -> Result<Option<Upload>, ApiError> {
    let field = match multipart.next_field().await? {
        Some(field) => field,
        None => return Ok(None),
    };

    let filename = field
        .file_name()
        .map(str::to_string)
        .unwrap_or_else(|| "upload".to_string());
    let content_type = field
        .content_type()
        .map(str::to_string)
        .unwrap_or_default();
    let bytes = field.bytes().await?.to_vec();

    Ok(Some(Upload {
        filename,
        content_type,
        bytes,
    }))
}

fn validate_upload(upload: &Upload, settings: &Settings) -> Result<(), ApiError> {
    if !upload.content_type.starts_with("image/") {
        return Err(ApiError::BadRequest(format!(
            "File must be an image, got '{}'",
            upload.content_type
        )));
    }
    if !settings.is_allowed_type(&upload.content_type) {
        return Err(ApiError::UnsupportedMediaType(format!(
            "'{}' is not an accepted image type",
            upload.content_type
        )));
    }
    if upload.bytes.len() > settings.max_image_bytes {
        return Err(ApiError::PayloadTooLarge(format!(
            "Image exceeds the {}-byte upload limit",
            settings.max_image_bytes
        )));
    }
    Ok(())
}
