//! One-shot status messages carried across a redirect in a cookie.

use axum::http::{header, HeaderMap};

pub const FLASH_COOKIE: &str = "cardlink_flash";

/// Header value that removes a pending flash from the browser.
pub const CLEAR_FLASH_COOKIE: &str = "cardlink_flash=; Max-Age=0; Path=/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    /// CSS-ish category, e.g. `danger`.
    pub category: String,
    pub message: String,
}

impl Flash {
    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            category: "danger".to_string(),
            message: message.into(),
        }
    }

    pub fn to_cookie(&self) -> String {
        let payload = format!("{}|{}", self.category, self.message);
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age=300",
            FLASH_COOKIE,
            urlencoding::encode(&payload)
        )
    }

    fn from_cookie_value(value: &str) -> Option<Self> {
        let decoded = urlencoding::decode(value).ok()?;
        let (category, message) = decoded.split_once('|')?;
        if message.is_empty() {
            return None;
        }
        Some(Self {
            category: category.to_string(),
            message: message.to_string(),
        })
    }
}

/// Reads the pending flash, if any, from the request cookies.
pub fn take_flash(headers: &HeaderMap) -> Option<Flash> {
    let prefix = format!("{FLASH_COOKIE}=");
    for cookie_header in headers.get_all(header::COOKIE) {
        let Ok(cookie_header) = cookie_header.to_str() else {
            continue;
        };
        for part in cookie_header.split(';') {
            if let Some(value) = part.trim().strip_prefix(prefix.as_str()) {
                return Flash::from_cookie_value(value);
            }
        }
    }
    None
}
