//! Plan catalog handler.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use rl_accounts_core::Plan;
use rl_accounts_store::DEFAULT_PLAN_PAGE_SIZE;

use crate::error::ApiError;
use crate::state::AppState;

/// Plan list query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPlansQuery {
    /// Id of the last plan of the previous page.
    pub start_key: Option<String>,
    /// Page size (default and maximum: 100).
    pub limit: Option<usize>,
}

/// A page of plans.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPage {
    /// Whether more plans follow this page.
    pub has_more: bool,
    /// Key to pass as `startKey` for the next page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<String>,
    /// The plans.
    pub data: Vec<Plan>,
}

/// List plans ordered by id.
pub async fn list_plans(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListPlansQuery>,
) -> Result<Json<PlanPage>, ApiError> {
    let limit = match query.limit {
        Some(0) => return Err(ApiError::BadRequest("limit must be positive".into())),
        Some(n) => n.min(DEFAULT_PLAN_PAGE_SIZE),
        None => DEFAULT_PLAN_PAGE_SIZE,
    };

    let mut data = state
        .plans
        .list_plans(query.start_key.as_deref(), limit + 1)?;

    let has_more = data.len() > limit;
    data.truncate(limit);
    let last_evaluated_key = if has_more {
        data.last().map(|p| p.id.clone())
    } else {
        None
    };

    Ok(Json(PlanPage {
        has_more,
        last_evaluated_key,
        data,
    }))
}
