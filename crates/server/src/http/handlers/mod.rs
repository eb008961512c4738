pub mod admin;
pub mod comments;

use axum::http::StatusCode;
use domain::CommentError;

pub(crate) fn reply_err(e: CommentError) -> (StatusCode, String) {
    let status = match &e {
        CommentError::Validation(_) => StatusCode::BAD_REQUEST,
        CommentError::NotFound(_) => StatusCode::NOT_FOUND,
        CommentError::Storage(inner) => {
            tracing::error!("storage failure: {:?}", inner);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}
