//! Request counting middleware.

use std::sync::Arc;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::state::ApiState;

/// Count every answered request under its route template and status code.
pub(crate) async fn count_requests(
    State(state): State<Arc<ApiState>>,
    request: Request,
    next: Next,
) -> Response {
    let route = request.extensions().get::<MatchedPath>().map_or_else(
        || request.uri().path().to_owned(),
        |matched| matched.as_str().to_owned(),
    );
    let response = next.run(request).await;
    state
        .telemetry
        .inc_http_request(&route, response.status().as_u16());
    response
}
