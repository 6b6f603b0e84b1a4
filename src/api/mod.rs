// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! HTTP Transport Layer
//!
//! Thin axum surfaces over the relay and sink endpoints. The protocol is
//! transport-agnostic; these routers only decode JSON bodies and translate
//! pipeline rejections into status codes.

pub mod cloud_server;
pub mod errors;
pub mod fog_server;

pub use cloud_server::{cloud_router, serve_cloud};
pub use errors::{ErrorResponse, Rejection};
pub use fog_server::{fog_router, serve_fog};
