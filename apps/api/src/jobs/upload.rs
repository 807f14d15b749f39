//! PDF upload validation shared by the apply and resume Q&A endpoints.

use axum::extract::multipart::{Field, MultipartError};
use bytes::Bytes;

use crate::errors::AppError;

pub const MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;

/// Request body limit for multipart routes: one resume plus form fields.
pub const MULTIPART_BODY_LIMIT: usize = MAX_RESUME_BYTES + 1024 * 1024;

pub fn multipart_error(e: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {e}"))
}

/// Reads a file field and checks it is a non-empty PDF within the size limit.
pub async fn read_pdf(field: Field<'_>) -> Result<Bytes, AppError> {
    let file_name = field.file_name().unwrap_or_default().to_lowercase();
    let content_type = field.content_type().unwrap_or_default().to_lowercase();
    let data = field.bytes().await.map_err(multipart_error)?;
    validate_pdf(&file_name, &content_type, &data)?;
    Ok(data)
}

pub fn validate_pdf(file_name: &str, content_type: &str, data: &[u8]) -> Result<(), AppError> {
    if data.is_empty() {
        return Err(AppError::Validation("Resume file is empty".to_string()));
    }
    if data.len() > MAX_RESUME_BYTES {
        return Err(AppError::Validation(
            "File too large. Maximum size is 10MB".to_string(),
        ));
    }
    if !(file_name.ends_with(".pdf") || content_type == "application/pdf") {
        return Err(AppError::Validation(
            "Invalid file type. Only PDF files are allowed".to_string(),
        ));
    }
    Ok(())
}
