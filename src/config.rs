use std::{path::PathBuf, time::Duration};

pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:5000";
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).map(Duration::from_millis)
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend root. Empty means same origin as `origin`.
    pub base_url: String,
    pub origin: String,
    pub probe_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), origin: DEFAULT_ORIGIN.to_string(), probe_timeout: DEFAULT_PROBE_TIMEOUT }
    }

    pub fn from_env() -> Self {
        let mut config = Self::new(env_or("CAPTION_STUDIO_API_BASE", ""));
        config.origin = env_or("CAPTION_STUDIO_ORIGIN", DEFAULT_ORIGIN);
        if let Some(timeout) = env_millis("CAPTION_STUDIO_PROBE_TIMEOUT_MS") {
            config.probe_timeout = timeout;
        }
        config
    }

    /// Root that request paths are appended to.
    pub fn api_root(&self) -> &str {
        let base = self.base_url.trim();
        let root = if base.is_empty() { self.origin.as_str() } else { base };
        root.trim_end_matches('/')
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_root(), path.trim_start_matches('/'))
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub upload_dir: PathBuf,
    pub static_dir: PathBuf,
    pub latency: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(5000),
            upload_dir: env_or("UPLOAD_DIR", "uploads").into(),
            static_dir: env_or("STATIC_DIR", "static").into(),
            latency: env_millis("DEMO_LATENCY_MS").unwrap_or(Duration::ZERO),
        }
    }
}
