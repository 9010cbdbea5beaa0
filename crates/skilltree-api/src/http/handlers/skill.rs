//! Skill hierarchy handlers for the REST API.

use std::time::Instant;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};

use skilltree_types::error::{NotFoundKind, SkillError};
use skilltree_types::skill::{
    CreateSkillRequest, SkillDetail, SkillId, SkillNode, SkillView, UpdateSkillRequest,
};

use crate::http::error::AppError;
use crate::http::extractors::actor::Actor;
use crate::http::extractors::query::SkillListQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Payload of `GET /api/v1/skills`.
#[derive(Debug, serde::Serialize)]
pub struct ForestPayload {
    pub skills: Vec<SkillNode>,
}

/// Payload of `DELETE /api/v1/skills/{id}`.
#[derive(Debug, serde::Serialize)]
pub struct DeletedPayload {
    pub deleted: usize,
}

/// Malformed ids are indistinguishable from unknown ones.
fn parse_id(raw: &str) -> Result<SkillId, AppError> {
    raw.parse()
        .map_err(|_| AppError::Skill(SkillError::NotFound(NotFoundKind::Skill)))
}

fn self_link(id: &SkillId) -> String {
    format!("/api/v1/skills/{id}")
}

/// POST /api/v1/skills - Create a skill, optionally under a parent.
pub async fn create_skill(
    State(state): State<AppState>,
    Actor(actor): Actor,
    body: Result<Json<CreateSkillRequest>, JsonRejection>,
) -> Result<ApiResponse<SkillView>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();
    let Json(body) = body?;

    let view = state.hierarchy.create(body, actor).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let link = self_link(&view.skill.id);
    Ok(ApiResponse::created(view, request_id, elapsed).with_link("self", &link))
}

/// GET /api/v1/skills - The whole forest, optionally filtered by `search`.
pub async fn list_skills(
    State(state): State<AppState>,
    Query(query): Query<SkillListQuery>,
) -> Result<ApiResponse<ForestPayload>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let skills = state.hierarchy.list_forest(query.search.as_deref()).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(ApiResponse::success(ForestPayload { skills }, request_id, elapsed)
        .with_link("self", "/api/v1/skills"))
}

/// GET /api/v1/skills/{id} - A skill with ancestors, children and stats.
pub async fn get_skill(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<SkillDetail>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();
    let id = parse_id(&id)?;

    let detail = state.hierarchy.get(&id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let mut resp = ApiResponse::success(detail, request_id, elapsed)
        .with_link("self", &self_link(&id))
        .with_link("forest", "/api/v1/skills");
    if let Some(parent) = resp.data.as_ref().and_then(|d| d.skill.parent_id) {
        resp = resp.with_link("parent", &self_link(&parent));
    }

    Ok(resp)
}

/// PUT /api/v1/skills/{id} - Edit fields and/or reparent.
pub async fn update_skill(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateSkillRequest>, JsonRejection>,
) -> Result<ApiResponse<SkillView>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();
    let id = parse_id(&id)?;
    let Json(body) = body?;

    let view = state.hierarchy.update(&id, body).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(ApiResponse::success(view, request_id, elapsed).with_link("self", &self_link(&id)))
}

/// DELETE /api/v1/skills/{id} - Remove a skill and its subtree.
pub async fn delete_skill(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<DeletedPayload>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();
    let id = parse_id(&id)?;

    let deleted = state.hierarchy.delete(&id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(ApiResponse::success(DeletedPayload { deleted }, request_id, elapsed))
}
