//! Router construction and server host for the API.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    middleware,
    http::{Method, Request, header::CONTENT_TYPE},
    routing::{delete, get, post},
};
use tokio::net::TcpListener;
use torrpeddo_telemetry::{Metrics, build_sha};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{Span, info};

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::constants::HEADER_REQUEST_ID;
use crate::http::health::{health, metrics};
use crate::http::telemetry::count_requests;
use crate::http::transfers::{
    add_magnet, cancel_transfer, delete_transfer, get_config, list_status, open_folder,
    pause_transfer, remove_transfer, resume_transfer, set_config, upload_metainfo,
};
use crate::state::{ApiState, TransferHandles};

/// Axum router wrapper that hosts the Torrpeddo HTTP API.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Wire the routes, middleware and shared state.
    #[must_use]
    pub fn new(transfers: TransferHandles, telemetry: Metrics) -> Self {
        let state = Arc::new(ApiState::new(transfers, telemetry));
        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE]);
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(HEADER_REQUEST_ID)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                tracing::info_span!(
                    "http.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    request_id = %request_id,
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        // The id must be set before it can be propagated, so the setter is outermost.
        let request_ids = ServiceBuilder::new()
            .layer(torrpeddo_telemetry::set_request_id_layer())
            .layer(torrpeddo_telemetry::propagate_request_id_layer());
        let observed = ServiceBuilder::new()
            .layer(trace_layer)
            .layer(middleware::from_fn_with_state(
                Arc::clone(&state),
                count_requests,
            ));

        let router = Self::routes()
            .route_layer(observed)
            .layer(cors_layer)
            .layer(request_ids)
            .with_state(state);
        Self { router }
    }

    fn routes() -> Router<Arc<ApiState>> {
        Router::new()
            .route("/health", get(health))
            .route("/metrics", get(metrics))
            .route("/api/status", get(list_status))
            .route("/api/add-magnet", post(add_magnet))
            .route("/api/upload-torrent", post(upload_metainfo))
            .route("/api/config", get(get_config).post(set_config))
            .route("/api/remove/{info_hash}", delete(remove_transfer))
            .route("/api/delete/{info_hash}", delete(delete_transfer))
            .route("/api/pause/{info_hash}", post(pause_transfer))
            .route("/api/resume/{info_hash}", post(resume_transfer))
            .route("/api/cancel/{info_hash}", post(cancel_transfer))
            .route("/api/open-folder", post(open_folder))
    }

    /// The assembled router, for embedding or in-process testing.
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind or the server terminates unexpectedly.
    pub async fn serve<F>(self, addr: SocketAddr, shutdown: F) -> ApiServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        info!(%addr, "http front-end listening");
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| ApiServerError::Serve { source })
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use axum::body::{Body, to_bytes};
    use axum::http::StatusCode;
    use axum::response::Response;
    use base64::{Engine as _, engine::general_purpose};
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use torrpeddo_core::{TransferId, parse_metainfo};

    use super::*;
    use crate::testing::StubCoordinator;

    fn server() -> Result<(Router, Arc<StubCoordinator>)> {
        let (handles, stub) = StubCoordinator::handles();
        Ok((ApiServer::new(handles, Metrics::new()?).into_router(), stub))
    }

    async fn send(
        router: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Result<Response> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&value)?)
            }
            None => Body::empty(),
        };
        Ok(router.clone().oneshot(builder.body(body)?).await?)
    }

    async fn json_body(response: Response) -> Result<Value> {
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    #[tokio::test]
    async fn add_magnet_returns_lowercase_identifier() -> Result<()> {
        let (router, _stub) = server()?;
        let magnet = format!("magnet:?xt=urn:btih:{}", "C".repeat(40));
        let response = send(
            &router,
            Method::POST,
            "/api/add-magnet",
            Some(json!({ "magnet_url": magnet })),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await?;
        assert_eq!(body["success"], true);
        assert_eq!(body["info_hash"], "c".repeat(40));
        assert!(response_has_request_id(&router).await?);
        Ok(())
    }

    async fn response_has_request_id(router: &Router) -> Result<bool> {
        let response = send(router, Method::GET, "/api/status", None).await?;
        Ok(response.headers().contains_key(HEADER_REQUEST_ID))
    }

    #[tokio::test]
    async fn request_ids_are_generated_or_echoed() -> Result<()> {
        let (router, _stub) = server()?;
        let generated = send(&router, Method::GET, "/health", None).await?;
        let id = generated
            .headers()
            .get(HEADER_REQUEST_ID)
            .expect("generated request id");
        assert!(!id.is_empty());

        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/status")
            .header(HEADER_REQUEST_ID, "cli-trace-7")
            .body(Body::empty())?;
        let echoed = router.clone().oneshot(request).await?;
        assert_eq!(
            echoed.headers().get(HEADER_REQUEST_ID).map(|value| value.as_bytes()),
            Some(b"cli-trace-7".as_slice())
        );

        let missing = send(&router, Method::GET, "/no-such-route", None).await?;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert!(missing.headers().contains_key(HEADER_REQUEST_ID));
        Ok(())
    }

    #[tokio::test]
    async fn malformed_or_missing_magnet_is_bad_request() -> Result<()> {
        let (router, _stub) = server()?;
        for body in [json!({}), json!({ "magnet_url": "magnet:?dn=x" })] {
            let response = send(&router, Method::POST, "/api/add-magnet", Some(body)).await?;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let problem = json_body(response).await?;
            assert_eq!(problem["status"], 400);
            assert_eq!(problem["type"], crate::http::constants::PROBLEM_BAD_REQUEST);
        }
        Ok(())
    }

    #[tokio::test]
    async fn upload_accepts_base64_metainfo() -> Result<()> {
        let (router, _stub) = server()?;
        let mut document =
            b"d4:infod6:lengthi8e4:name4:file12:piece lengthi16384e6:pieces20:".to_vec();
        document.extend_from_slice(&[0x44; 20]);
        document.extend_from_slice(b"ee");
        let expected = parse_metainfo(&document)?.id;

        let encoded = general_purpose::STANDARD.encode(&document);
        let response = send(
            &router,
            Method::POST,
            "/api/upload-torrent",
            Some(json!({ "metainfo": encoded })),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await?["info_hash"], expected.to_hex());

        let response = send(
            &router,
            Method::POST,
            "/api/upload-torrent",
            Some(json!({ "metainfo": "***" })),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn lifecycle_routes_map_unknown_and_conflict() -> Result<()> {
        let (router, stub) = server()?;
        let unknown = "f".repeat(40);
        for (method, route) in [
            (Method::POST, "pause"),
            (Method::POST, "resume"),
            (Method::POST, "cancel"),
            (Method::DELETE, "remove"),
            (Method::DELETE, "delete"),
        ] {
            let uri = format!("/api/{route}/{unknown}");
            let response = send(&router, method.clone(), &uri, None).await?;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
            let garbage_uri = format!("/api/{route}/not-a-hash");
            let garbage = send(&router, method, &garbage_uri, None).await?;
            assert_eq!(garbage.status(), StatusCode::NOT_FOUND);
        }

        let failed = TransferId::from_bytes([9; 20]);
        stub.track(failed, false);
        let uri = format!("/api/pause/{failed}");
        let response = send(&router, Method::POST, &uri, None).await?;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let live = TransferId::from_bytes([8; 20]);
        stub.track(live, true);
        let uri = format!("/api/remove/{live}");
        let response = send(&router, Method::DELETE, &uri, None).await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await?, json!({ "success": true }));
        Ok(())
    }

    #[tokio::test]
    async fn config_round_trip_and_invalid_directory() -> Result<()> {
        let (router, _stub) = server()?;
        let dir = tempfile::tempdir()?;
        let response = send(
            &router,
            Method::POST,
            "/api/config",
            Some(json!({ "download_dir": dir.path() })),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&router, Method::GET, "/api/config", None).await?;
        assert_eq!(
            json_body(response).await?["download_dir"],
            dir.path().display().to_string()
        );

        let response = send(
            &router,
            Method::POST,
            "/api/config",
            Some(json!({ "download_dir": "/nonexistent/torrpeddo" })),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await?["detail"], "Invalid directory");
        Ok(())
    }

    #[tokio::test]
    async fn open_folder_falls_back_to_unsupported() -> Result<()> {
        let (router, stub) = server()?;
        let id = TransferId::from_bytes([5; 20]);
        stub.track(id, true);
        let response = send(
            &router,
            Method::POST,
            "/api/open-folder",
            Some(json!({ "info_hash": "zz" })),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            &router,
            Method::POST,
            "/api/open-folder",
            Some(json!({ "info_hash": id.to_hex() })),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    }

    #[tokio::test]
    async fn health_and_metrics_are_public() -> Result<()> {
        let (router, _stub) = server()?;
        let response = send(&router, Method::GET, "/health", None).await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await?["status"], "ok");

        let response = send(&router, Method::GET, "/metrics", None).await?;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let text = String::from_utf8(bytes.to_vec())?;
        assert!(text.contains("http_requests_total"));
        Ok(())
    }
}
