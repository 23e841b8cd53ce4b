//! Sales statistics route handler.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use chrono::Utc;
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::middleware::BearerToken;
use crate::models::StatsWindow;
use crate::services::StatsRange;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub range: Option<String>,
}

/// `GET /stats?range=24h|7d|30d|90d|all`
///
/// An unrecognised range, or a query string that does not decode, falls back
/// to all time. When a stats token is configured the request must carry it as
/// a bearer credential.
pub async fn show(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    query: std::result::Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Json<StatsWindow>> {
    if let Some(expected) = state.stats_token() {
        let presented = token.as_deref().unwrap_or_default();
        if !constant_time_compare(expected.expose_secret(), presented) {
            return Err(AppError::Unauthenticated(
                "Stats token required".to_string(),
            ));
        }
    }

    let query = query.map(|Query(q)| q).unwrap_or_else(|rejection| {
        tracing::debug!(error = %rejection, "Ignoring undecodable stats query");
        StatsQuery::default()
    });

    let range = query
        .range
        .as_deref()
        .map_or(Ok(StatsRange::All), str::parse)
        .unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Falling back to all-time stats");
            StatsRange::All
        });

    let window = state.stats().compute(range, Utc::now()).await?;
    Ok(Json(window))
}

/// Compare two strings without an early exit on the first differing byte.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
