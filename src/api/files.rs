use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Path, Query, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;

use super::observability;
use super::session::AuthUser;
use super::validation::{parse_download_limit, parse_expiry_date};
use super::{
    ApiError, AppState, DownloadQuery, FileMetadataResponse, UploadResponse, UserFileResponse,
};
use crate::services::{FileError, UploadRequest};

/// Form fields of an upload, collected before any are validated.
#[derive(Debug, Default)]
struct UploadForm {
    content: Option<Bytes>,
    file_name: Option<String>,
    password: Option<String>,
    download_limit: Option<String>,
    expiry_date: Option<String>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                form.file_name = field.file_name().map(str::to_string);
                form.content = Some(field.bytes().await.map_err(multipart_error)?);
            }
            "password" => form.password = Some(field.text().await.map_err(multipart_error)?),
            "downloadLimit" => {
                form.download_limit = Some(field.text().await.map_err(multipart_error)?);
            }
            "expiryDate" => form.expiry_date = Some(field.text().await.map_err(multipart_error)?),
            other => tracing::debug!(field = other, "Ignoring unknown upload field"),
        }
    }

    Ok(form)
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("File exceeds the maximum upload size".to_string())
    } else {
        ApiError::validation(format!("Invalid multipart request: {}", err.body_text()))
    }
}

/// POST /files/upload
pub async fn upload(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let form = read_upload_form(multipart).await?;

    let content = form
        .content
        .ok_or_else(|| ApiError::validation("No file provided"))?;

    let request = UploadRequest {
        original_file_name: form.file_name.unwrap_or_default(),
        owner_user_id: identity.user_id,
        password: form.password.filter(|p| !p.is_empty()),
        download_limit: parse_download_limit(form.download_limit.as_deref())?,
        expiry_date: parse_expiry_date(form.expiry_date.as_deref())?,
        content: content.to_vec(),
    };

    let size = request.content.len();
    let file_id = state.file_service().upload(request).await?;
    observability::record_upload(size);

    Ok(Json(UploadResponse {
        file_id,
        message: "File uploaded successfully".to_string(),
    }))
}

/// GET /files/download/{file_id}?password=
/// Public; the access policy decides
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let file = match state
        .file_service()
        .download(&file_id, query.password.as_deref())
        .await
    {
        Ok(file) => file,
        Err(FileError::AccessDenied(reason)) => {
            observability::record_download_denied(reason);
            return Err(FileError::AccessDenied(reason).into());
        }
        Err(e) => return Err(e.into()),
    };

    observability::record_download_served();

    let disposition = content_disposition(&file.record.original_file_name);

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.content,
    ))
}

/// GET /files/{file_id}/metadata
pub async fn metadata(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Json<FileMetadataResponse>, ApiError> {
    let record = state.file_service().metadata(&file_id).await?;
    Ok(Json(record.into()))
}

/// GET /files/user
pub async fn list_user_files(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<UserFileResponse>>, ApiError> {
    let files = state
        .file_service()
        .list_for_owner(&identity.user_id)
        .await?;

    Ok(Json(files.into_iter().map(UserFileResponse::from).collect()))
}

/// Attachment header with an ASCII fallback and the exact name in `filename*`.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    )
}
