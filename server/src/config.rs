use std::net::SocketAddr;
use std::path::PathBuf;

// Environment variable names
pub const CARDLINK_HOST: &str = "CARDLINK_HOST";
pub const CARDLINK_PORT: &str = "CARDLINK_PORT";
pub const BASE_URL: &str = "BASE_URL";
pub const CARDLINK_DATA_FILE: &str = "CARDLINK_DATA_FILE";
pub const CARDLINK_UPLOAD_DIR: &str = "CARDLINK_UPLOAD_DIR";
pub const CARDLINK_SRC_DIR: &str = "CARDLINK_SRC_DIR";
pub const CARDLINK_MAX_UPLOAD_BYTES: &str = "CARDLINK_MAX_UPLOAD_BYTES";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 2000;
pub const DEFAULT_DATA_FILE: &str = "link_previews.json";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_SRC_DIR: &str = "src";
// 16 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Runtime settings, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Public origin used for absolute links. When unset, it is derived from
    /// the `Host` header of each request.
    pub base_url: Option<String>,
    pub data_file: PathBuf,
    pub upload_dir: PathBuf,
    pub src_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            base_url: None,
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            src_dir: PathBuf::from(DEFAULT_SRC_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Builds the config from the process environment, falling back to the
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty(CARDLINK_HOST).unwrap_or(defaults.host),
            port: parse_or(CARDLINK_PORT, non_empty(CARDLINK_PORT), defaults.port),
            base_url: non_empty(BASE_URL).map(|v| v.trim_end_matches('/').to_string()),
            data_file: non_empty(CARDLINK_DATA_FILE)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file),
            upload_dir: non_empty(CARDLINK_UPLOAD_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            src_dir: non_empty(CARDLINK_SRC_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.src_dir),
            max_upload_bytes: parse_or(
                CARDLINK_MAX_UPLOAD_BYTES,
                non_empty(CARDLINK_MAX_UPLOAD_BYTES),
                defaults.max_upload_bytes,
            ),
        }
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|e| anyhow::anyhow!("invalid bind address {addr}: {e}"))
    }
}

fn parse_or<T: std::str::FromStr + Copy + std::fmt::Display>(
    key: &str,
    raw: Option<String>,
    default: T,
) -> T {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
            default
        }),
    }
}
