use chrono::NaiveDateTime;
use domain::{Author, Comment, CommentStatus};
use sqlx::FromRow;

#[derive(FromRow)]
pub struct SqlComment {
    pub id: i64,
    pub entity: String,
    pub entity_id: i64,
    pub parent_id: i64,
    pub content: String,
    pub created_by: i64,
    pub updated_by: i64,
    pub related_to: String,
    pub status: i64,
    pub level: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,

    // Join 字段 (来自 authors 表)
    pub author_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<SqlComment> for Comment {
    fn from(sql: SqlComment) -> Self {
        Comment {
            id: sql.id,
            entity: sql.entity,
            entity_id: sql.entity_id,
            // 库里根评论存 0，对外暴露成 None
            parent_id: (sql.parent_id > 0).then_some(sql.parent_id),
            content: sql.content,
            created_by: sql.created_by,
            updated_by: sql.updated_by,
            related_to: sql.related_to,
            status: CommentStatus::from_i64(sql.status),
            level: sql.level,
            created_at: sql.created_at,
            updated_at: sql.updated_at,
            author: sql.author_name.map(|display_name| Author {
                display_name,
                avatar_url: sql.avatar_url,
            }),
        }
    }
}
