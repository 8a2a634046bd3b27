use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::{multipart::MultipartError, ConnectInfo, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::cv::ParsedRecord;
use crate::parsing::pipeline::parse_decoded;
use crate::parsing::sections::SectionTag;
use crate::parsing::{DocumentKind, ParseError, ParseOutcome};
use crate::state::AppState;

const FILE_FIELDS: &[&str] = &["file", "resume"];
const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "docx", "txt"];

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub record: ParsedRecord,
    pub meta: ParseMeta,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseMeta {
    pub kind: DocumentKind,
    pub filename: Option<String>,
    pub text_length: usize,
    pub sections: Vec<SectionTag>,
    pub parsed_at: DateTime<Utc>,
}

impl ParseResponse {
    fn new(outcome: ParseOutcome, filename: Option<String>) -> Self {
        ParseResponse {
            meta: ParseMeta {
                kind: outcome.kind,
                filename,
                text_length: outcome.text_length,
                sections: outcome.sections,
                parsed_at: Utc::now(),
            },
            record: outcome.record,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ParseTextRequest {
    pub text: String,
}

/// One uploaded file plus the hints the client declared for it.
#[derive(Debug, Default)]
struct Upload {
    filename: Option<String>,
    media_type: Option<String>,
    bytes: Option<Bytes>,
}

/// POST /api/v1/cv/parse
pub async fn handle_parse_upload(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    mut multipart: Multipart,
) -> Result<Json<ParseResponse>, AppError> {
    let client = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "anonymous".to_string());
    state.rate_limiter.check(&client).map_err(|limited| {
        warn!(client = %client, "Upload rate limit exceeded");
        AppError::RateLimited {
            retry_after: limited.retry_after,
        }
    })?;

    let max_bytes = state.config.max_upload_bytes;
    let upload = read_upload(&mut multipart, max_bytes).await?;
    let bytes = validate_upload(&upload, max_bytes)?;

    info!(
        client = %client,
        filename = upload.filename.as_deref().unwrap_or("<none>"),
        bytes = bytes.len(),
        "Parsing uploaded CV"
    );

    let handle = state.parser.spawn_parse(
        bytes,
        upload.media_type.clone(),
        upload.filename.clone(),
    );
    let outcome = await_parse(handle, state.config.parse_timeout).await?;

    Ok(Json(ParseResponse::new(outcome, upload.filename)))
}

/// POST /api/v1/cv/parse-text
pub async fn handle_parse_text(
    State(state): State<AppState>,
    Json(req): Json<ParseTextRequest>,
) -> Result<Json<ParseResponse>, AppError> {
    let handle = tokio::task::spawn_blocking(move || parse_decoded(&req.text, DocumentKind::Txt));
    let outcome = await_parse(handle, state.config.parse_timeout).await?;
    Ok(Json(ParseResponse::new(outcome, None)))
}

/// Waits for a blocking parse. On expiry the task keeps running to completion
/// in the background, but the client gets its 504 straight away.
async fn await_parse(
    handle: JoinHandle<Result<ParseOutcome, ParseError>>,
    timeout: Duration,
) -> Result<ParseOutcome, AppError> {
    let joined = tokio::time::timeout(timeout, handle).await.map_err(|_| {
        warn!(timeout_ms = timeout.as_millis() as u64, "CV parse timed out");
        AppError::Timeout(timeout)
    })?;
    let outcome = joined
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in parse: {e}")))??;
    Ok(outcome)
}

/// Collects the file field and optional `filename` / `media_type` overrides.
async fn read_upload(multipart: &mut Multipart, max_bytes: usize) -> Result<Upload, AppError> {
    let mut upload = Upload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if FILE_FIELDS.contains(&name.as_str()) {
            if upload.filename.is_none() {
                upload.filename = field.file_name().map(String::from);
            }
            if upload.media_type.is_none() {
                upload.media_type = field.content_type().map(String::from);
            }
            upload.bytes = Some(field.bytes().await.map_err(|e| multipart_error(e, max_bytes))?);
        } else if name == "filename" || name == "media_type" {
            let value = field.text().await.map_err(|e| multipart_error(e, max_bytes))?;
            let value = value.trim();
            if !value.is_empty() {
                let slot = if name == "filename" {
                    &mut upload.filename
                } else {
                    &mut upload.media_type
                };
                *slot = Some(value.to_string());
            }
        }
    }

    Ok(upload)
}

fn multipart_error(e: MultipartError, max_bytes: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { limit: max_bytes }
    } else {
        AppError::Validation(format!("Invalid multipart body: {e}"))
    }
}

/// Caller-side checks the pipeline itself does not perform: presence, size,
/// and file extension.
fn validate_upload(upload: &Upload, max_bytes: usize) -> Result<Bytes, AppError> {
    let bytes = upload
        .bytes
        .clone()
        .ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;

    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    if bytes.len() > max_bytes {
        return Err(AppError::PayloadTooLarge { limit: max_bytes });
    }

    if let Some(filename) = upload.filename.as_deref() {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AppError::UnsupportedFile(format!(
                "'{filename}' is not a .pdf, .docx or .txt file"
            )));
        }
    }

    Ok(bytes)
}
