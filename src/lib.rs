//! Artist Portfolio Backend - library for app logic and testing

pub mod config;
pub mod customization;
pub mod db;
pub mod directory;
pub mod logging;
pub mod render;
pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use config::AppConfig;
use db::{PgStore, Store};
use state::AppState;

/// CORS for the configured frontend origins.
pub fn configure_cors(config: &AppConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(config.allowed_origins.clone())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors(&state.config);
    let max_body = state.config.max_body_bytes;

    Router::new()
        .route("/api/artists", post(routes::artists::create_artist))
        .route("/api/artists/directory", get(routes::artists::directory))
        .route("/api/artists/stats", get(routes::artists::stats))
        .route("/api/portfolios", post(routes::portfolios::create_portfolio))
        .route("/api/portfolios/public", get(routes::portfolios::list_public))
        .route("/api/portfolios/{id}", get(routes::portfolios::get_portfolio))
        .route(
            "/api/portfolios/{id}/analytics",
            get(routes::portfolios::analytics),
        )
        .route(
            "/api/portfolios/{id}/generate-pdf",
            post(routes::portfolios::generate_pdf),
        )
        .route(
            "/api/portfolios/{id}/generate-web",
            post(routes::portfolios::generate_web),
        )
        .route("/health", get(routes::health::health))
        .route("/health/ready", get(routes::health::health_ready))
        .nest_service("/uploads", routes::uploads::router(state.config.upload_root()))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body))
        // Must wrap the limit layer so its 413s are rewritten too
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::error::payload_too_large,
        ))
        .layer(cors)
        .with_state(state)
}

/// Postgres when configured and reachable, otherwise the in-memory store.
async fn connect_store(config: &AppConfig) -> Store {
    let Some(db_config) = config.db.as_ref() else {
        tracing::info!("DATABASE_URL not set. Using in-memory store.");
        return Store::memory();
    };

    let pool = match db::init_pool(db_config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to initialize database pool. Using in-memory store.");
            return Store::memory();
        }
    };

    if let Err(e) = db::run_migrations(&pool).await {
        tracing::warn!(error = %e, "Failed to run database migrations. Using in-memory store.");
        return Store::memory();
    }

    Store::Postgres(PgStore::new(pool))
}

/// Run the server (used by main).
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env();

    // Dropping these early stops the background log writers.
    let _log_guards = logging::init(&config.log);

    routes::health::init_start_time();

    let store = connect_store(&config).await;
    tracing::info!(backend = store.backend(), "Store ready");

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let app = create_app(AppState::new(config, store));

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app(max_body_bytes: usize) -> (Router, TempDir) {
        let uploads = TempDir::new().unwrap();
        let config = AppConfig {
            upload_root: uploads.path().to_path_buf(),
            max_body_bytes,
            ..Default::default()
        };
        (create_app(AppState::new(config, Store::memory())), uploads)
    }

    #[tokio::test]
    async fn test_health_is_routed() {
        let (app, _uploads) = app(1024);
        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_oversized_body_becomes_bad_request_with_hint() {
        let (app, _uploads) = app(2 * 1024 * 1024);
        let title = "x".repeat(3 * 1024 * 1024);
        let body = serde_json::json!({ "artistId": uuid::Uuid::new_v4(), "title": title });
        let res = app
            .oneshot(
                Request::post("/api/portfolios")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: routes::ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "Request body too large");
        assert_eq!(
            body.details.unwrap()[0],
            "Maximum request size is 2097152 bytes (2 MB)"
        );
    }

    #[tokio::test]
    async fn test_pdf_round_trip_through_uploads() {
        let (app, _uploads) = app(1024 * 1024);

        let create = |uri: &str, body: serde_json::Value| {
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        };
        let json = |bytes: &[u8]| serde_json::from_slice::<serde_json::Value>(bytes).unwrap();

        let res = app
            .clone()
            .oneshot(create(
                "/api/artists",
                serde_json::json!({ "name": "Juma", "email": "juma@example.com", "category": "musician" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let artist = json(&axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap());

        let res = app
            .clone()
            .oneshot(create(
                "/api/portfolios",
                serde_json::json!({ "artistId": artist["artist"]["id"], "title": "Live" }),
            ))
            .await
            .unwrap();
        let portfolio = json(&axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap());
        let id = portfolio["portfolio"]["id"].as_str().unwrap();

        let res = app
            .clone()
            .oneshot(
                Request::post(format!("/api/portfolios/{}/generate-pdf", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let generated = json(&axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap());

        let res = app
            .oneshot(
                Request::get(generated["downloadUrl"].as_str().unwrap())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["content-type"], "application/pdf");
    }
}
