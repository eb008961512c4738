use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use domain::RequestContext;

use super::reply_err;
use crate::state::AppState;

pub async fn delete_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(comment_id): Path<i64>,
) -> Result<Json<&'static str>, (StatusCode, String)> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing Authorization header".into(),
        ))?;
    let expected_token = format!("Bearer {}", state.admin_token);
    if auth_header != expected_token {
        return Err((StatusCode::FORBIDDEN, "Invalid Admin Token".into()));
    }

    // 删除人记到 updatedBy；宿主可通过 X-User-Id 带上操作者
    let acting_user = headers
        .get("X-User-Id")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(0);
    let ctx = RequestContext {
        user_id: acting_user,
    };

    let deleted = state
        .db
        .soft_delete_comment(&ctx, comment_id)
        .await
        .map_err(reply_err)?;

    if deleted {
        Ok(Json("Deleted"))
    } else {
        Err((
            StatusCode::NOT_FOUND,
            "Comment not found or already deleted".into(),
        ))
    }
}
