// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Success bodies.
//!
//! Most endpoints wrap their payload as `{"success": true, "data": ..}` and
//! listings add a `meta` page summary. Login and health answer with bare
//! bodies that clients consume directly.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::extractors::PaginationParams;

/// Enveloped success body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

impl<T> ApiResponse<T> {
    /// Wraps a single payload.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// Wraps one page of a listing of `total` records.
    pub fn page(items: Vec<T>, total: u64, params: &PaginationParams) -> Self {
        Self {
            success: true,
            data: items,
            meta: Some(ResponseMeta::new(total, params.page, params.per_page)),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Page summary attached to listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub total: u64,
    /// 1-based.
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u64,
}

impl ResponseMeta {
    pub fn new(total: u64, page: u32, per_page: u32) -> Self {
        let total_pages = match per_page {
            0 => 0,
            size => total.div_ceil(u64::from(size)),
        };
        Self {
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "ok",
            version: crate::VERSION,
        }
    }
}

/// Body of a successful login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    /// Seconds until the token expires.
    pub expires_in: i64,
}

impl TokenResponse {
    pub fn bearer(token: String, expires_in: i64) -> Self {
        Self {
            token,
            token_type: "Bearer",
            expires_in,
        }
    }
}
