use axum::extract::FromRef;
use storage::Db;

use crate::config::CommentSettings;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub listing: CommentSettings,
    pub admin_token: String,
}

impl FromRef<AppState> for Db {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
