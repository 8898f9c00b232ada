//! Filter Middleware.
//! Admits or rejects each request before it reaches the next stage.

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::filter::{ContextOptions, Decision, FilterEngine, RejectStatus, RequestContext};
use crate::http::request::RequestIdExt;
use crate::observability::metrics;

/// State required by the filter middleware.
#[derive(Clone)]
pub struct FilterState {
    engine: Arc<ArcSwap<FilterEngine>>,
    options: Arc<ContextOptions>,
}

impl FilterState {
    pub fn new(engine: FilterEngine, options: ContextOptions) -> Self {
        Self {
            engine: Arc::new(ArcSwap::from_pointee(engine)),
            options: Arc::new(options),
        }
    }

    /// Replace the active engine. In-flight requests finish on the old one.
    pub fn swap(&self, engine: FilterEngine) {
        self.engine.store(Arc::new(engine));
    }
}

pub async fn filter_middleware(
    State(state): State<FilterState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ctx = RequestContext::from_request(&req, &state.options);
    let decision = state.engine.load().evaluate(&ctx);

    match decision {
        Decision::Continue => {
            metrics::record_decision("continue", "none");
            next.run(req).await
        }
        Decision::Reject(rejection) => {
            match rejection.status {
                RejectStatus::Forbidden => tracing::debug!(
                    request_id = %req.request_id(),
                    client = %ctx.source_address,
                    reason = %rejection.reason,
                    "Request filtered"
                ),
                RejectStatus::BadConfiguration => tracing::warn!(
                    request_id = %req.request_id(),
                    reason = %rejection.reason,
                    "Filter rule failed to compile"
                ),
            }
            metrics::record_decision("rejected", rejection.reason.label());
            rejection.into_response()
        }
    }
}
