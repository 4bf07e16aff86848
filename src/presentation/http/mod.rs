use axum::{
    Router,
    extract::{DefaultBodyLimit, MatchedPath},
};
use tower_http::trace::TraceLayer;

use crate::bootstrap::app_context::AppContext;

pub mod error;
pub mod flash;
pub mod health;
pub mod multipart;
pub mod uploads;

// Room for multipart framing around a file of the maximum size.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// All HTTP routes with body limit and request tracing applied.
pub fn router(ctx: AppContext) -> Router {
    let body_limit = ctx
        .cfg
        .upload_max_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    Router::new()
        .merge(uploads::routes(ctx.clone()))
        .nest("/api", health::routes(ctx))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                let matched = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                tracing::info_span!("http", %method, %uri, matched_path = %matched)
            }),
        )
}
