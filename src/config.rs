use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ID_BACKEND: &str = "https://azizbekid-backend.vercel.app";
pub const DEFAULT_APP_ORIGIN: &str = "http://localhost";
pub const DEFAULT_APP_NAME: &str = "NutrAI";
const DEFAULT_CAMERA_READY_TIMEOUT_MS: u64 = 5000;

/// Startup configuration. Read once, never changed at runtime.
///
/// Required values may be empty here; the capture flow reports them when the
/// user tries to submit.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub backend_url: String,
    pub id_backend_url: String,
    pub app_origin: String,
    pub app_name: String,
    pub camera_front_source: Option<PathBuf>,
    pub camera_back_source: Option<PathBuf>,
    pub camera_ready_timeout: Duration,
    pub max_image_bytes: Option<u64>,
    pub auth_required: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            backend_url: String::new(),
            id_backend_url: DEFAULT_ID_BACKEND.to_string(),
            app_origin: DEFAULT_APP_ORIGIN.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            camera_front_source: None,
            camera_back_source: None,
            camera_ready_timeout: Duration::from_millis(DEFAULT_CAMERA_READY_TIMEOUT_MS),
            max_image_bytes: None,
            auth_required: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = lookup("GEMINI_API_KEY").unwrap_or_default();
        let backend_url = lookup("BACKEND_URL").unwrap_or_default();

        if api_key.trim().is_empty() {
            log::warn!("⚠️ GEMINI_API_KEY not set, analysis will be unavailable");
        }
        if backend_url.trim().is_empty() {
            log::warn!("⚠️ BACKEND_URL not set, analysis will be unavailable");
        }

        let camera_ready_timeout = match non_empty("CAMERA_READY_TIMEOUT_MS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(_) => {
                    log::warn!("⚠️ Invalid CAMERA_READY_TIMEOUT_MS '{}', using default", raw);
                    defaults.camera_ready_timeout
                }
            },
            None => defaults.camera_ready_timeout,
        };

        let max_image_bytes = non_empty("MAX_IMAGE_BYTES").and_then(|raw| match raw.parse::<u64>() {
            Ok(limit) => Some(limit),
            Err(_) => {
                log::warn!("⚠️ Invalid MAX_IMAGE_BYTES '{}', upload size is not limited", raw);
                None
            }
        });

        let auth_required = match non_empty("AUTH_REQUIRED").map(|v| v.to_lowercase()) {
            Some(v) if v == "false" || v == "0" || v == "no" => false,
            _ => true,
        };

        Self {
            api_key,
            backend_url,
            id_backend_url: non_empty("ID_BACKEND_URL").unwrap_or(defaults.id_backend_url),
            app_origin: non_empty("APP_ORIGIN").unwrap_or(defaults.app_origin),
            app_name: non_empty("APP_NAME").unwrap_or(defaults.app_name),
            camera_front_source: non_empty("CAMERA_FRONT_SOURCE").map(PathBuf::from),
            camera_back_source: non_empty("CAMERA_BACK_SOURCE").map(PathBuf::from),
            camera_ready_timeout,
            max_image_bytes,
            auth_required,
        }
    }
}
