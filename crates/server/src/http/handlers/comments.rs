use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::{EntityScope, NewComment, RequestContext};
use serde::Deserialize;
use serde_json::{json, Value};
use storage::{ListOptions, ThreadPage, ThreadQuery};

use super::reply_err;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
    pub parent_id: Option<i64>,
    pub related_to: Option<String>,
    // 宿主应用代为传入的身份信息
    pub author_id: i64,
    pub author_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Deserialize)]
pub struct EditCommentRequest {
    pub content: String,
    pub author_id: i64,
}

fn parse_scope(entity: String, entity_id: i64) -> Result<EntityScope, (StatusCode, String)> {
    EntityScope::new(entity, entity_id).map_err(|e| (StatusCode::BAD_REQUEST, e))
}

pub async fn list_thread(
    State(state): State<AppState>,
    Path((entity, entity_id)): Path<(String, i64)>,
    Query(params): Query<ListParams>,
) -> Result<Json<ThreadPage>, (StatusCode, String)> {
    let scope = parse_scope(entity, entity_id)?;

    let q = ThreadQuery {
        max_level: state.listing.max_level,
        include_deleted: state.listing.show_deleted,
        per_page: state.listing.per_page,
        page: params.page.unwrap_or(0),
        ..ThreadQuery::new(scope)
    };
    let page = state.db.list_thread(&q).await.map_err(reply_err)?;
    Ok(Json(page))
}

pub async fn post_comment(
    State(state): State<AppState>,
    Path((entity, entity_id)): Path<(String, i64)>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<domain::Comment>), (StatusCode, String)> {
    let scope = parse_scope(entity, entity_id)?;

    state
        .db
        .upsert_author(
            payload.author_id,
            &payload.author_name,
            payload.avatar_url.as_deref(),
        )
        .await
        .map_err(reply_err)?;

    let ctx = RequestContext {
        user_id: payload.author_id,
    };
    let new = NewComment {
        scope,
        parent_id: payload.parent_id,
        content: payload.content,
        related_to: payload.related_to,
    };
    let comment = state.db.create_comment(&ctx, &new).await.map_err(reply_err)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn edit_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<EditCommentRequest>,
) -> Result<Json<domain::Comment>, (StatusCode, String)> {
    let ctx = RequestContext {
        user_id: payload.author_id,
    };
    let comment = state
        .db
        .update_content(&ctx, id, &payload.content)
        .await
        .map_err(reply_err)?;
    Ok(Json(comment))
}

pub async fn count_comments(
    State(state): State<AppState>,
    Path((entity, entity_id)): Path<(String, i64)>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let scope = parse_scope(entity, entity_id)?;
    let count = state
        .db
        .count_comments(&scope, state.listing.show_deleted)
        .await
        .map_err(reply_err)?;
    Ok(Json(json!({ "count": count })))
}

pub async fn last_comment(
    State(state): State<AppState>,
    Path((entity, entity_id)): Path<(String, i64)>,
) -> Result<Json<Option<domain::Comment>>, (StatusCode, String)> {
    let scope = parse_scope(entity, entity_id)?;
    let opts = ListOptions {
        max_level: state.listing.max_level,
        include_deleted: state.listing.show_deleted,
        ..Default::default()
    };
    let comment = state.db.last_comment(&scope, &opts).await.map_err(reply_err)?;
    Ok(Json(comment))
}
