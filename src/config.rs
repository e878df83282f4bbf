//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; components receive the parsed
//! `Config` through the [`Backend`](crate::Backend) handle.

use std::env;
use std::time::Duration;

const DEFAULT_IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";
const DEFAULT_DEVICE_BASE_URL: &str = "https://iot3team-hls.dotsys.org";
const DEFAULT_STREAM_PATH: &str = "/hls/test.m3u8";
const DEFAULT_STATUS_POLL_INTERVAL_MS: u64 = 3000;
const DEFAULT_SPLASH_DELAY_MS: u64 = 1500;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Backend-as-a-service ---
    /// Web API key of the Firebase project
    pub firebase_api_key: String,
    /// Firebase/GCP project ID (Firestore database owner)
    pub firebase_project_id: String,
    /// Identity Toolkit REST base URL
    pub identity_toolkit_url: String,
    /// Secure Token REST base URL (ID token refresh)
    pub secure_token_url: String,

    // --- Device service ---
    /// Base URL of the camera/status HTTP service
    pub device_base_url: String,
    /// Path of the HLS manifest on the device service
    pub stream_path: String,

    // --- Timing ---
    /// Interval between connectivity polls
    pub status_poll_interval: Duration,
    /// How long the splash screen stays up before routing
    pub splash_delay: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            firebase_api_key: "test-api-key".to_string(),
            firebase_project_id: "test-project".to_string(),
            identity_toolkit_url: DEFAULT_IDENTITY_TOOLKIT_URL.to_string(),
            secure_token_url: DEFAULT_SECURE_TOKEN_URL.to_string(),
            device_base_url: "http://127.0.0.1:8080".to_string(),
            stream_path: DEFAULT_STREAM_PATH.to_string(),
            status_poll_interval: Duration::from_millis(DEFAULT_STATUS_POLL_INTERVAL_MS),
            splash_delay: Duration::from_millis(DEFAULT_SPLASH_DELAY_MS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honoured for local runs.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            firebase_project_id: env::var("FIREBASE_PROJECT_ID")
                .map_err(|_| ConfigError::Missing("FIREBASE_PROJECT_ID"))?,
            identity_toolkit_url: url_var("IDENTITY_TOOLKIT_URL", DEFAULT_IDENTITY_TOOLKIT_URL),
            secure_token_url: url_var("SECURE_TOKEN_URL", DEFAULT_SECURE_TOKEN_URL),
            device_base_url: url_var("DEVICE_BASE_URL", DEFAULT_DEVICE_BASE_URL),
            stream_path: env::var("STREAM_PATH").unwrap_or_else(|_| DEFAULT_STREAM_PATH.to_string()),
            status_poll_interval: millis_var(
                "STATUS_POLL_INTERVAL_MS",
                DEFAULT_STATUS_POLL_INTERVAL_MS,
            )?,
            splash_delay: millis_var("SPLASH_DELAY_MS", DEFAULT_SPLASH_DELAY_MS)?,
        })
    }
}

fn url_var(name: &str, default: &str) -> String {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

fn millis_var(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .ok_or(ConfigError::Invalid(name, raw)),
        Err(_) => Ok(Duration::from_millis(default)),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
