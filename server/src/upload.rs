use std::path::Path;

use tokio::fs;

use crate::error::{AppError, AppResult};

/// Image types accepted for preview cards.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// An image file pulled out of the submitted form.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Checks the text after the last dot against the allow-list, ignoring case.
pub fn is_allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Reduces a client-supplied filename to a single safe path component.
///
/// Non-ASCII characters are dropped, path separators become word breaks,
/// whitespace runs become `_`, anything outside `[A-Za-z0-9_.-]` is removed
/// and leading/trailing dots and underscores are stripped. May return an
/// empty string.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Validates and writes the image into the flat upload directory, returning
/// the name it was saved under. An existing file with that name is replaced.
pub async fn save_upload(upload_dir: &Path, image: &UploadedImage) -> AppResult<String> {
    if !is_allowed_file(&image.filename) {
        return Err(AppError::DisallowedFileType(image.filename.clone()));
    }

    let filename = secure_filename(&image.filename);
    if filename.is_empty() || !is_allowed_file(&filename) {
        return Err(AppError::DisallowedFileType(image.filename.clone()));
    }

    fs::create_dir_all(upload_dir).await?;
    let path = upload_dir.join(&filename);
    fs::write(&path, &image.data).await?;

    tracing::info!(
        "Saved upload {} ({} bytes) as {}",
        image.filename,
        image.data.len(),
        path.display()
    );
    Ok(filename)
}

/// Absolute URL under which a saved upload is served.
pub fn public_url(base_url: &str, filename: &str) -> String {
    format!(
        "{}/uploads/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(filename)
    )
}
