//! This module contains the [PreimageServer], which exposes the oracle to
//! the client over a local HTTP listener.

use crate::backend::{BackendError, HintRouter, PreimageFetcher};
use alloy_primitives::hex;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use stele_preimage::{Hint, PreimageKey, PreimageKeyType};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// The [PreimageServer] is responsible for waiting for incoming preimage
/// requests and serving them to the client.
#[derive(Debug)]
pub struct PreimageServer<B> {
    /// The listener to serve requests on.
    listener: TcpListener,
    /// The backend that routes hints and resolves preimages.
    backend: Arc<B>,
}

impl<B> PreimageServer<B>
where
    B: HintRouter + PreimageFetcher + Send + Sync + 'static,
{
    /// Create a new [PreimageServer] serving the given backend on the given
    /// listener.
    pub const fn new(listener: TcpListener, backend: Arc<B>) -> Self {
        Self { listener, backend }
    }

    /// Builds the HTTP router for the oracle endpoints.
    pub fn router(backend: Arc<B>) -> Router {
        Router::new()
            .route("/dehash/{key}", get(Self::dehash))
            .route("/hint/{hint}", get(Self::hint))
            .with_state(backend)
    }

    /// Starts the [PreimageServer] and serves requests until the process
    /// receives a shutdown signal.
    pub async fn start(self) -> anyhow::Result<()> {
        info!(
            target: "preimage-server",
            "Serving preimage requests on {}",
            self.listener.local_addr()?
        );
        axum::serve(self.listener, Self::router(self.backend))
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
            .map_err(Into::into)
    }

    /// Serves the preimage for a hex-encoded key.
    ///
    /// This endpoint is keccak256-only by contract: the type byte of the
    /// received key is rewritten before lookup.
    async fn dehash(State(backend): State<Arc<B>>, Path(key): Path<String>) -> Response {
        let Ok(raw) = hex::decode(&key) else {
            return StatusCode::BAD_REQUEST.into_response();
        };
        let Ok(mut raw) = <[u8; 32]>::try_from(raw.as_slice()) else {
            return StatusCode::BAD_REQUEST.into_response();
        };
        raw[0] = PreimageKeyType::Keccak256 as u8;
        let key = PreimageKey::new(raw, PreimageKeyType::Keccak256);

        match backend.get_preimage(key).await {
            Ok(value) => {
                ([(header::CONTENT_TYPE, "application/octet-stream")], value).into_response()
            }
            Err(BackendError::NotFound) => {
                debug!(target: "preimage-server", "Pre-image not found for key {key}");
                StatusCode::NOT_FOUND.into_response()
            }
            Err(e) => {
                error!(target: "preimage-server", "Failed to serve pre-image for key {key}: {e}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }

    /// Records a fetch hint for upcoming preimage reads.
    ///
    /// The hint is validated against the recognised grammar before it is
    /// handed to the backend.
    async fn hint(State(backend): State<Arc<B>>, Path(hint): Path<String>) -> Response {
        let parsed = match hint.parse::<Hint>() {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(target: "preimage-server", "Rejecting hint {hint}: {e}");
                return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
            }
        };
        if let Some(expected) = parsed.hint_type.payload_len() {
            if parsed.hint_data.len() != expected {
                debug!(target: "preimage-server", "Rejecting hint {hint}: bad payload length");
                return (
                    StatusCode::BAD_REQUEST,
                    format!(
                        "invalid {} hint payload length: {}",
                        parsed.hint_type,
                        parsed.hint_data.len()
                    ),
                )
                    .into_response();
            }
        }

        match backend.route_hint(hint).await {
            Ok(()) => {
                ([(header::CONTENT_TYPE, "application/octet-stream")], "ok").into_response()
            }
            Err(e) => {
                error!(target: "preimage-server", "Failed to route hint: {e}");
                (StatusCode::BAD_REQUEST, e.to_string()).into_response()
            }
        }
    }
}
