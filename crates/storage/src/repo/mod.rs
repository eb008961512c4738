pub mod authors;
pub mod comments;
pub mod thread;

use domain::CommentError;

pub(crate) fn into_storage(e: sqlx::Error) -> CommentError {
    CommentError::Storage(e.into())
}
