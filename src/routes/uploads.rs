/**
 * Upload Routes
 * Static serving of generated documents under /uploads
 */
use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::{self, Next},
    response::Response,
    Router,
};
use std::path::Path;
use tower_http::services::ServeDir;

/// Reject path traversal and separator characters in a single path component.
pub fn is_safe_file_component(name: &str) -> bool {
    !name.contains("..") && !name.contains('/') && !name.contains('\\') && !name.contains('\0')
}

fn extension(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Per-extension response headers: PDFs open inline, images are cached for a
/// day, microsites are served as HTML.
pub async fn file_headers(req: Request, next: Next) -> Response {
    let ext = extension(req.uri().path());
    let mut response = next.run(req).await;
    if !response.status().is_success() {
        return response;
    }

    let headers = response.headers_mut();
    match ext.as_deref() {
        Some("pdf") => {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
            headers.insert(header::CONTENT_DISPOSITION, HeaderValue::from_static("inline"));
        }
        Some("jpg" | "jpeg" | "png" | "gif") => {
            headers.insert(
                header::CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=86400"),
            );
        }
        Some("html") => {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            );
        }
        _ => {}
    }

    response
}

/// Service for files under `root`; mount it with `Router::nest_service("/uploads", ..)`.
pub fn router(root: &Path) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(root))
        .layer(middleware::from_fn(file_headers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn fetch(root: &Path, uri: &str) -> Response {
        let app: Router = Router::new().nest_service("/uploads", router(root));
        app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[test]
    fn test_safe_file_component() {
        assert!(is_safe_file_component("amani-otieno"));
        assert!(!is_safe_file_component(".."));
        assert!(!is_safe_file_component("a/b"));
        assert!(!is_safe_file_component("a\\b"));
        assert!(!is_safe_file_component("a\0b"));
    }

    #[tokio::test]
    async fn test_pdf_is_served_inline() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("portfolios")).unwrap();
        std::fs::write(dir.path().join("portfolios/a.pdf"), b"%PDF-1.5").unwrap();

        let res = fetch(dir.path(), "/uploads/portfolios/a.pdf").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(res.headers()[header::CONTENT_DISPOSITION], "inline");
    }

    #[tokio::test]
    async fn test_images_are_cached_and_html_typed() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("cover.PNG"), [0x89, 0x50, 0x4E, 0x47]).unwrap();
        std::fs::write(dir.path().join("site.html"), "<html></html>").unwrap();

        let res = fetch(dir.path(), "/uploads/cover.PNG").await;
        assert_eq!(res.headers()[header::CACHE_CONTROL], "public, max-age=86400");

        let res = fetch(dir.path(), "/uploads/site.html").await;
        assert!(res.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let res = fetch(dir.path(), "/uploads/portfolios/missing.pdf").await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(res.headers().get(header::CONTENT_DISPOSITION).is_none());
    }
}
