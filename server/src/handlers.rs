use std::sync::Arc;

use askama::Template;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path as AxumPath, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use qrcode::render::svg::Color;
use qrcode::QrCode;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::flash::{take_flash, CLEAR_FLASH_COOKIE};
use crate::store::{PreviewRecord, RecordStore};
use crate::templates::{CreateTemplate, RedirectTemplate, SuccessTemplate};
use crate::upload::{self, UploadedImage};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<RecordStore>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = RecordStore::new(config.data_file.clone());
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
        }
    }

    /// Origin for absolute links: the configured base URL, or whatever host
    /// the request came in on.
    fn base_url(&self, headers: &HeaderMap) -> String {
        if let Some(base) = &self.config.base_url {
            return base.clone();
        }
        let host = headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("localhost");
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("http");
        format!("{}://{}", scheme, host)
    }
}

/// Fields of the create form, as submitted.
#[derive(Debug, Default)]
pub struct CreateForm {
    pub link: Option<String>,
    pub preview_text: Option<String>,
    pub preview_description: Option<String>,
    pub preview_image_file: Option<UploadedImage>,
}

/// A form that passed validation.
#[derive(Debug)]
pub struct ValidCreateForm {
    pub link: String,
    pub preview_text: String,
    pub preview_description: String,
    pub image: UploadedImage,
}

impl CreateForm {
    pub async fn from_multipart(mut multipart: Multipart, max_upload_bytes: usize) -> AppResult<Self> {
        let mut form = CreateForm::default();
        let map_err = body_error(max_upload_bytes);

        while let Some(mut field) = multipart.next_field().await.map_err(&map_err)? {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "link" => form.link = Some(field.text().await.map_err(&map_err)?),
                "preview_text" => form.preview_text = Some(field.text().await.map_err(&map_err)?),
                "preview_description" => {
                    form.preview_description = Some(field.text().await.map_err(&map_err)?)
                }
                "preview_image_file" => {
                    // Browsers send an empty filename when no file was picked
                    let filename = field.file_name().unwrap_or("").to_string();
                    if filename.is_empty() {
                        continue;
                    }
                    let mut data = Vec::new();
                    while let Some(chunk) = field.chunk().await.map_err(&map_err)? {
                        if data.len().saturating_add(chunk.len()) > max_upload_bytes {
                            return Err(AppError::UploadTooLarge { limit: max_upload_bytes });
                        }
                        data.extend_from_slice(&chunk);
                    }
                    form.preview_image_file = Some(UploadedImage { filename, data });
                }
                _ => {}
            }
        }

        Ok(form)
    }

    pub fn validate(self) -> AppResult<ValidCreateForm> {
        let link = required(self.link, "link")?;
        let preview_text = required(self.preview_text, "preview_text")?;
        let image = self
            .preview_image_file
            .ok_or(AppError::MissingField("preview_image_file"))?;

        if !upload::is_allowed_file(&image.filename) {
            return Err(AppError::DisallowedFileType(image.filename));
        }

        match url::Url::parse(&link) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => return Err(AppError::InvalidLink(link)),
        }

        Ok(ValidCreateForm {
            link,
            preview_text,
            preview_description: self.preview_description.unwrap_or_default(),
            image,
        })
    }
}

// Bodies cut off by the request size limit surface as multipart errors.
fn body_error(limit: usize) -> impl Fn(MultipartError) -> AppError {
    move |e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::UploadTooLarge { limit }
        } else {
            AppError::Multipart(e)
        }
    }
}

fn required(value: Option<String>, field: &'static str) -> AppResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::MissingField(field)),
    }
}

fn render<T: Template>(template: &T) -> AppResult<Html<String>> {
    Ok(Html(template.render()?))
}

fn qr_svg(target: &str) -> Option<String> {
    QrCode::new(target.as_bytes())
        .map(|c| {
            c.render::<Color>()
                .min_dimensions(240, 240)
                .quiet_zone(true)
                .dark_color(Color("#000000"))
                .light_color(Color("#ffffff"))
                .build()
        })
        .ok()
}

/// `GET /`: the create form, with any pending flash message.
pub async fn index_handler(headers: HeaderMap) -> AppResult<Response> {
    let flash = take_flash(&headers);
    let had_flash = flash.is_some();
    let page = render(&CreateTemplate { flash })?;

    let mut response = page.into_response();
    if had_flash {
        response
            .headers_mut()
            .insert(header::SET_COOKIE, HeaderValue::from_static(CLEAR_FLASH_COOKIE));
    }
    Ok(response)
}

/// `POST /`: validate, store the image, create the record.
pub async fn create_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<Redirect> {
    let form = CreateForm::from_multipart(multipart, state.config.max_upload_bytes)
        .await?
        .validate()?;

    let filename = upload::save_upload(&state.config.upload_dir, &form.image).await?;
    let preview_image = upload::public_url(&state.base_url(&headers), &filename);

    let record = PreviewRecord {
        link: form.link,
        preview_image,
        preview_text: form.preview_text,
        preview_description: form.preview_description,
    };
    let short_id = state.store.create(record).await?;

    tracing::info!("Short link {} created", short_id);
    Ok(Redirect::to(&format!("/success/{}", short_id)))
}

/// `GET /success/{short_id}`: shows the shareable link.
pub async fn success_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(short_id): AxumPath<String>,
) -> AppResult<Response> {
    if !state.store.contains(&short_id).await {
        return Ok(Redirect::to("/").into_response());
    }

    let shortlink = format!("{}/s/{}", state.base_url(&headers), short_id);
    let qr_svg = qr_svg(&shortlink);
    let page = render(&SuccessTemplate {
        short_id,
        shortlink,
        qr_svg,
    })?;
    Ok(page.into_response())
}

/// `GET /s/{short_id}`: preview card page that forwards to the destination.
pub async fn short_redirect_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(short_id): AxumPath<String>,
) -> AppResult<Response> {
    let Some(preview) = state.store.get(&short_id).await else {
        tracing::debug!("Unknown short id {}", short_id);
        return Ok(Redirect::to("/").into_response());
    };

    let page_url = format!("{}/s/{}", state.base_url(&headers), short_id);
    let page = render(&RedirectTemplate {
        link: preview.link,
        title: preview.preview_text,
        description: preview.preview_description,
        image_url: preview.preview_image,
        page_url,
    })?;
    Ok(page.into_response())
}
