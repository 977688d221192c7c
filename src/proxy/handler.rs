//! Terminal pipeline stage: resolve the target, fetch it, relay the body.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::http::response::text_response;
use crate::observability::metrics;
use crate::proxy::forwarder::Forwarder;
use crate::proxy::target::TargetRequest;

/// State injected into the proxy handler.
#[derive(Debug, Clone)]
pub struct ProxyState {
    pub forwarder: Arc<Forwarder>,
    pub strict_validation: bool,
    pub relay_status: bool,
}

/// Main proxy handler.
pub async fn proxy_handler(State(state): State<ProxyState>, uri: Uri) -> Response {
    let target = TargetRequest::from_uri(&uri);

    let url = match target.validate(state.strict_validation) {
        Ok(url) => url,
        Err(err) => {
            tracing::debug!(path = %target.raw_path, "Rejected request without target URL");
            metrics::record_outcome(err.outcome());
            return err.into_response();
        }
    };

    tracing::debug!(url = %url, "Forwarding request");

    match state.forwarder.fetch(url).await {
        Ok(relayed) => {
            metrics::record_outcome("relayed");
            let status = if state.relay_status {
                relayed.status
            } else {
                StatusCode::OK
            };
            text_response(status, relayed.body)
        }
        Err(err) => {
            tracing::warn!(url = %url, error = %err, "Upstream fetch failed");
            metrics::record_outcome(err.outcome());
            err.into_response()
        }
    }
}
