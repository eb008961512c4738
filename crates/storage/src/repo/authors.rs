use crate::repo::into_storage;
use crate::Db;
use chrono::Utc;
use domain::CommentError;

impl Db {
    // 宿主应用在发评论前同步作者展示信息（身份提供方的本地缓存）
    pub async fn upsert_author(
        &self,
        id: i64,
        display_name: &str,
        avatar_url: Option<&str>,
    ) -> Result<(), CommentError> {
        sqlx::query(
            r#"
            INSERT INTO authors (id, display_name, avatar_url, last_updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                display_name = excluded.display_name,
                avatar_url = excluded.avatar_url,
                last_updated_at = excluded.last_updated_at
            "#,
        )
        .bind(id)
        .bind(display_name)
        .bind(avatar_url)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await
        .map_err(into_storage)?;

        Ok(())
    }
}
