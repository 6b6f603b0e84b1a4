// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! HTTP Error Mapping
//!
//! Rejections from the protocol pipeline become JSON error responses. All
//! per-request rejections map to 400; only `UpstreamUnavailable` (which a
//! meter or fog client never triggers directly) maps to 502.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::protocol::ProtocolError;

/// JSON body returned for rejected requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
}

/// Wrapper giving [`ProtocolError`] an HTTP rendering.
pub struct Rejection(pub ProtocolError);

impl Rejection {
    fn error_type(&self) -> &'static str {
        match self.0 {
            ProtocolError::InvalidPeerKey(_) => "invalid_peer_key",
            ProtocolError::DecryptionFailed(_) => "decryption_failed",
            ProtocolError::InvalidSignature(_) => "invalid_signature",
            ProtocolError::StaleOrFutureTimestamp { .. } => "stale_or_future_timestamp",
            ProtocolError::ReplayDetected => "replay_detected",
            ProtocolError::MalformedEnvelope { .. } => "malformed_envelope",
            ProtocolError::UpstreamUnavailable(_) => "upstream_unavailable",
        }
    }

    fn status(&self) -> StatusCode {
        match self.0 {
            ProtocolError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<ProtocolError> for Rejection {
    fn from(err: ProtocolError) -> Self {
        Self(err)
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error_type: self.error_type().to_string(),
            message: self.0.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
