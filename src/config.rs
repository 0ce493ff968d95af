//! Environment-driven service settings.
//!
//! All knobs are read once at startup from `THUMBSCORE_*` variables.
//! Unparseable values fall back to the documented default with a warning
//! rather than aborting startup.

use std::env;
use std::path::PathBuf;

use tracing::warn;

/// Application-level constants
pub const SERVICE_NAME: &str = "ThumbScore";
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind host.
const DEFAULT_HOST: &str = "0.0.0.0";
/// Default bind port.
const DEFAULT_PORT: u16 = 8000;
/// Default maximum upload size: 5 MiB.
const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
/// Default model parameter file.
const DEFAULT_MODEL_PATH: &str = "models/score_predictor.json";
/// Default cache TTL in seconds (reserved; the pipeline does not cache yet).
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
/// Default log filter.
const DEFAULT_LOG_LEVEL: &str = "info";

/// Service configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Uploads larger than this are rejected before preprocessing.
    pub max_image_bytes: usize,
    /// MIME types accepted by the upload validator.
    pub allowed_image_types: Vec<String>,
    /// Where the trained score predictor is persisted.
    pub model_path: PathBuf,
    /// Reserved for a response cache; carried in config for parity with
    /// deployment environments that already set it.
    pub cache_ttl_secs: u64,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            allowed_image_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
            ],
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Settings {
    /// Read settings from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an injectable lookup. `from_env` delegates
    /// here; tests supply a closure instead of mutating the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("THUMBSCORE_HOST").unwrap_or(defaults.host);
        let port = parse_or(
            "THUMBSCORE_PORT",
            lookup("THUMBSCORE_PORT"),
            defaults.port,
        );
        let max_image_bytes = parse_or(
            "THUMBSCORE_MAX_IMAGE_BYTES",
            lookup("THUMBSCORE_MAX_IMAGE_BYTES"),
            defaults.max_image_bytes,
        );
        let allowed_image_types = lookup("THUMBSCORE_ALLOWED_IMAGE_TYPES")
            .map(|raw| parse_type_list(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.allowed_image_types);
        let model_path = lookup("THUMBSCORE_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);
        let cache_ttl_secs = parse_or(
            "THUMBSCORE_CACHE_TTL_SECS",
            lookup("THUMBSCORE_CACHE_TTL_SECS"),
            defaults.cache_ttl_secs,
        );
        let log_level = lookup("THUMBSCORE_LOG_LEVEL").unwrap_or(defaults.log_level);

        Self {
            host,
            port,
            max_image_bytes,
            allowed_image_types,
            model_path,
            cache_ttl_secs,
            log_level,
        }
    }

    /// Whether a multipart content type is accepted by configuration.
    pub fn is_allowed_type(&self, content_type: &str) -> bool {
        self.allowed_image_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(content_type))
    }

    /// Socket address string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a value, falling back to `default` (with a warning) on bad input.
fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(s) => match s.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(key, value = %s, "Unparseable setting, using default");
                default
            }
        },
    }
}

/// Split a comma-separated MIME list, dropping empty entries.
fn parse_type_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
