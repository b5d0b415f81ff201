//! Landing page server

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing::info;

struct PageState {
    public_dir: PathBuf,
}

/// Router serving `index.html` on `/` and static files from `public_dir`
pub fn router(public_dir: impl Into<PathBuf>) -> Router {
    let public_dir = public_dir.into();
    let state = Arc::new(PageState {
        public_dir: public_dir.clone(),
    });

    Router::new()
        .route("/", get(index))
        .fallback_service(ServeDir::new(public_dir))
        .with_state(state)
}

/// Serve the landing page on `0.0.0.0:port`
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server fails.
pub async fn serve(port: u16, public_dir: impl Into<PathBuf>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Landing page listening on port {}", port);

    axum::serve(listener, router(public_dir)).await?;
    Ok(())
}

/// `index.html`, or a bare 200 when the page is missing
async fn index(State(state): State<Arc<PageState>>) -> Response {
    match tokio::fs::read_to_string(state.public_dir.join("index.html")).await {
        Ok(page) => Html(page).into_response(),
        Err(_) => StatusCode::OK.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn get_body(
        app: Router,
        uri: &str,
    ) -> Result<(StatusCode, String), Box<dyn std::error::Error>> {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty())?)
            .await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        Ok((status, String::from_utf8(bytes.to_vec())?))
    }

    #[tokio::test]
    async fn test_index_is_served() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("index.html"), "<h1>Album Bot</h1>")?;
        std::fs::write(dir.path().join("style.css"), "body {}")?;

        let (status, body) = get_body(router(dir.path()), "/").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>Album Bot</h1>");

        let (status, body) = get_body(router(dir.path()), "/style.css").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "body {}");
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_index_still_answers_ok() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;

        let (status, body) = get_body(router(dir.path()), "/").await?;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        Ok(())
    }
}
