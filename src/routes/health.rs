/**
 * Health Routes
 * Liveness report with store counts, storage and memory, plus readiness
 */
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::state::AppState;

// Track server start time for uptime calculation
lazy_static::lazy_static! {
    static ref SERVER_START: Instant = Instant::now();
}

/// Initialize the server start time
pub fn init_start_time() {
    lazy_static::initialize(&SERVER_START);
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHealth {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    pub artists: i64,
    pub portfolios: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageHealth {
    pub uploads_directory: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MemoryHealth {
    pub used: String,
}

/// GET /health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub environment: String,
    pub version: String,
    pub database: DatabaseHealth,
    pub storage: StorageHealth,
    pub memory: MemoryHealth,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Ready check response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Resident set size from a /proc status file ("VmRSS:  1234 kB" -> "1.21 MB").
fn resident_memory(status: &str) -> Option<String> {
    let kb: f64 = status
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))?
        .split_whitespace()
        .next()?
        .parse()
        .ok()?;
    Some(format!("{:.2} MB", kb / 1024.0))
}

async fn memory_used() -> String {
    tokio::fs::read_to_string("/proc/self/status")
        .await
        .ok()
        .and_then(|s| resident_memory(&s))
        .unwrap_or_else(|| "unknown".to_string())
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Response {
    let uptime = SERVER_START.elapsed().as_secs();

    let ping = state.store.ping().await;
    let counts = match state.store.counts().await {
        Ok(counts) => counts,
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            let body = HealthErrorResponse {
                status: "ERROR".to_string(),
                message: "Health check failed".to_string(),
                timestamp: Utc::now(),
            };
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
        }
    };

    let uploads_directory = tokio::fs::metadata(state.config.upload_root())
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);

    let response = HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now(),
        uptime,
        environment: state.config.environment.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: DatabaseHealth {
            status: if ping.is_ok() { "connected" } else { "disconnected" }.to_string(),
            backend: state.store.backend().to_string(),
            response_time: ping.ok().map(|d| d.as_millis() as u64),
            artists: counts.active_artists,
            portfolios: counts.portfolios,
        },
        storage: StorageHealth { uploads_directory },
        memory: MemoryHealth {
            used: memory_used().await,
        },
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// GET /health/ready
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = SERVER_START.elapsed().as_secs();

    let (status, database, reason) = match state.store.ping().await {
        Ok(_) => (StatusCode::OK, "healthy", None),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "unhealthy",
                Some("Database is not reachable".to_string()),
            )
        }
    };

    let response = ReadyResponse {
        status: if reason.is_none() { "ready" } else { "not ready" }.to_string(),
        timestamp: Utc::now(),
        uptime,
        database: database.to_string(),
        reason,
    };

    (status, Json(response))
}
