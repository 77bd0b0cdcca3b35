/*!
 * Application Configuration
 * Everything the server reads from the environment, resolved once at startup
 * and handed to the router through `AppState`.
 */
use axum::http::HeaderValue;
use std::path::{Path, PathBuf};

use crate::db::DbConfig;
use crate::logging::config::{LogConfig, LogLevel};

/// Default request body cap (2 MB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Names and hosts stamped into generated documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branding {
    pub platform_name: String,
    pub platform_domain: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            platform_name: "KatikaNaMe".to_string(),
            platform_domain: "katikaname.com".to_string(),
        }
    }
}

impl Branding {
    /// Public URL a generated microsite is served under.
    pub fn live_url(&self, domain: &str) -> String {
        format!("https://{}.{}", domain, self.platform_domain)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub upload_root: PathBuf,
    pub allowed_origins: Vec<HeaderValue>,
    pub max_body_bytes: usize,
    pub branding: Branding,
    pub log: LogConfig,
    pub db: Option<DbConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            host: "127.0.0.1".to_string(),
            port: 5000,
            upload_root: PathBuf::from("uploads"),
            allowed_origins: default_origins(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            branding: Branding::default(),
            log: LogConfig::default(),
            db: None,
        }
    }
}

impl AppConfig {
    /// Build the configuration from environment variables (call `dotenvy::dotenv()` first).
    pub fn from_env() -> Self {
        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let is_production = environment == "production";

        let level = std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|s| s.parse::<LogLevel>().ok())
            .unwrap_or(if is_production {
                LogLevel::Info
            } else {
                LogLevel::Debug
            });

        let defaults = Branding::default();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5000),
            upload_root: std::env::var("UPLOAD_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            allowed_origins: origins_from_env(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),
            branding: Branding {
                platform_name: std::env::var("PLATFORM_NAME").unwrap_or(defaults.platform_name),
                platform_domain: std::env::var("PLATFORM_DOMAIN")
                    .unwrap_or(defaults.platform_domain),
            },
            log: LogConfig {
                level,
                directory: std::env::var("LOG_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("logs")),
                json: is_production,
            },
            db: std::env::var("DATABASE_URL").ok().map(|_| DbConfig::default()),
            environment,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Directory PDF renders are written to.
    pub fn pdf_dir(&self) -> PathBuf {
        self.upload_root.join("portfolios")
    }

    /// Directory HTML microsites are written to.
    pub fn web_dir(&self) -> PathBuf {
        self.upload_root.join("web-portfolios")
    }

    pub fn upload_root(&self) -> &Path {
        &self.upload_root
    }
}

/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN.
fn origins_from_env() -> Vec<HeaderValue> {
    std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(default_origins)
}

fn default_origins() -> Vec<HeaderValue> {
    vec![
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ]
}
