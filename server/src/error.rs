use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use thiserror::Error;

use crate::flash::Flash;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Destination URL, Preview Title, and Preview Image are required!")]
    MissingField(&'static str),

    #[error("Invalid image format! Allowed formats: PNG, JPG, JPEG, GIF")]
    DisallowedFileType(String),

    #[error("Destination URL must start with http:// or https://")]
    InvalidLink(String),

    #[error("Preview image is too large!")]
    UploadTooLarge { limit: usize },

    #[error("Malformed form submission")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Whether the error is the submitter's fault and belongs in a flash
    /// message on the form.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::MissingField(_)
                | AppError::DisallowedFileType(_)
                | AppError::InvalidLink(_)
                | AppError::UploadTooLarge { .. }
                | AppError::Multipart(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_user_facing() {
            tracing::info!("Rejected submission: {:?}", self);
            let flash = Flash::danger(self.to_string());
            let mut headers = HeaderMap::new();
            if let Ok(cookie) = HeaderValue::from_str(&flash.to_cookie()) {
                headers.insert(header::SET_COOKIE, cookie);
            }
            return (headers, Redirect::to("/")).into_response();
        }

        tracing::error!("Request failed: {}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_redirect_home_with_flash() {
        let response = AppError::MissingField("link").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("cardlink_flash="));
    }

    #[test]
    fn storage_errors_are_internal() {
        let err = AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert!(!err.is_user_facing());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }
}
