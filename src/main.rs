use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

mod config;
mod estimate;
mod extract;
mod fetch;
mod models;

use config::Config;
use fetch::{FetchError, ListingFetcher};
use models::{EstimateRequest, ListingImagesResponse, ListingQuery};

#[derive(Clone)]
struct AppState {
    fetcher: ListingFetcher,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let state = AppState {
        fetcher: ListingFetcher::new(&config)?,
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/listing-images", get(listing_images))
        .route("/api/estimate", post(estimate_endpoint))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({"error": message.into()}))).into_response()
}

async fn listing_images(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Response {
    let raw_url = match query.url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url,
        _ => return error_response(StatusCode::BAD_REQUEST, "Missing url parameter."),
    };

    let listing_url = match fetch::parse_listing_url(raw_url) {
        Ok(url) => url,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let html = match state.fetcher.fetch(&listing_url).await {
        Ok(html) => html,
        Err(e) => {
            match &e {
                FetchError::Upstream(status) => {
                    tracing::warn!(url = %listing_url, %status, "listing page returned an error")
                }
                other => tracing::warn!(url = %listing_url, error = %other, "listing fetch failed"),
            }
            return error_response(StatusCode::BAD_GATEWAY, "Unable to fetch listing page.");
        }
    };

    let hostname = fetch::listing_hostname(&listing_url);
    let extracted =
        tokio::task::spawn_blocking(move || extract::extract_listing_images(&html, &hostname))
            .await;

    match extracted {
        Ok(images) => {
            tracing::info!(url = %listing_url, count = images.len(), "listing images extracted");
            (StatusCode::OK, Json(ListingImagesResponse { images })).into_response()
        }
        Err(e) => {
            tracing::error!(url = %listing_url, error = %e, "listing image extraction task failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to parse listing images.",
            )
        }
    }
}

async fn estimate_endpoint(Json(req): Json<EstimateRequest>) -> Response {
    let estimate = estimate::estimate_listing(&req.images, req.design_style.as_deref());
    (StatusCode::OK, Json(estimate)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let fetcher = ListingFetcher::new(&Config::default()).unwrap();
        app(AppState { fetcher })
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = test_app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = send(get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn missing_url_is_a_client_error() {
        let (status, body) = send(get("/api/listing-images")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Missing url parameter."}));

        let (status, _) = send(get("/api/listing-images?url=%20")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_http_url_is_a_client_error() {
        let (status, body) = send(get("/api/listing-images?url=ftp%3A%2F%2Fexample.com%2Fa")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("http"));
    }

    #[tokio::test]
    async fn estimate_labels_posted_images() {
        let payload = json!({
            "images": [
                {"url": "https://cdn.example.com/kitchen-1.jpg"},
                {"url": "https://cdn.example.com/2.jpg", "title": "44 Bay Rd primary bath"}
            ],
            "design_style": "Warm minimalist"
        });
        let request = Request::builder()
            .method("POST")
            .uri("/api/estimate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["design_style"], "Warm minimalist");
        assert_eq!(body["rooms"][0]["room_label"], "Kitchen");
        assert_eq!(body["rooms"][1]["room_label"], "Bathroom");
        assert_eq!(body["total_low"], 20_000);
        assert_eq!(body["total_high"], 57_000);
    }
}
