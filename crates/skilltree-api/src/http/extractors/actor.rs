//! Caller identity extractor.
//!
//! Reads the optional `X-Actor` header. The value is recorded as
//! `created_by` on new skills; nothing is authenticated here.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::state::AppState;

/// Header carrying the caller identity.
pub const ACTOR_HEADER: &str = "x-actor";

/// Caller identity, `None` when the header is absent, blank, or not UTF-8.
pub struct Actor(pub Option<String>);

impl FromRequestParts<AppState> for Actor {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let actor = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        Ok(Actor(actor))
    }
}
