use crate::repo::into_storage;
use crate::{models::SqlComment, Db};
use chrono::Utc;
use domain::{
    sanitize::sanitize_html, Comment, CommentError, CommentStatus, EntityScope, NewComment,
    RequestContext, ROOT_PARENT,
};
use sqlx::Row;

// 所有读查询都带作者联查，展示数据随行返回
const SELECT_COLUMNS: &str = "\
    c.id, c.entity, c.entity_id, c.parent_id, c.content, \
    c.created_by, c.updated_by, c.related_to, c.status, c.level, \
    c.created_at, c.updated_at, \
    a.display_name AS author_name, a.avatar_url";

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub max_level: Option<i64>,
    pub include_deleted: bool,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl Db {
    /// 校验字段与父引用、推算 level、净化内容后落库，返回带 id 的完整行。
    pub async fn create_comment(
        &self,
        ctx: &RequestContext,
        new: &NewComment,
    ) -> Result<Comment, CommentError> {
        new.validate()?;

        // 父引用必须指向同一作用域内仍然有效的评论，level = 父级 + 1
        let level = match new.parent() {
            Some(parent_id) => {
                let row = sqlx::query(
                    "SELECT level FROM comments WHERE id = ? AND entity = ? AND entity_id = ? AND status = ?",
                )
                .bind(parent_id)
                .bind(new.scope.entity())
                .bind(new.scope.entity_id())
                .bind(CommentStatus::Active.as_i64())
                .fetch_optional(&self.pool)
                .await
                .map_err(into_storage)?;

                match row {
                    Some(r) => r.get::<i64, _>(0) + 1,
                    None => {
                        return Err(CommentError::validation(
                            "Parent comment does not exist in this thread.",
                        ))
                    }
                }
            }
            None => 0,
        };

        let content = sanitize_html(&new.content);
        let related_to = new.related_to_or_default();
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            INSERT INTO comments (
                entity, entity_id, parent_id, content,
                created_by, updated_by, related_to,
                status, level, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.scope.entity())
        .bind(new.scope.entity_id())
        .bind(new.parent().unwrap_or(ROOT_PARENT))
        .bind(&content)
        .bind(ctx.user_id)
        .bind(ctx.user_id)
        .bind(&related_to)
        .bind(CommentStatus::Active.as_i64())
        .bind(level)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(into_storage)?;

        let id = result.last_insert_rowid();
        self.get_comment(id).await?.ok_or(CommentError::NotFound(id))
    }

    /// 编辑评论内容，重新净化。只更新 content / updatedBy / updatedAt。
    pub async fn update_content(
        &self,
        ctx: &RequestContext,
        id: i64,
        content: &str,
    ) -> Result<Comment, CommentError> {
        if content.trim().is_empty() {
            return Err(CommentError::validation("Comment content cannot be empty."));
        }
        let content = sanitize_html(content);

        let result = sqlx::query(
            "UPDATE comments SET content = ?, updated_by = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(&content)
        .bind(ctx.user_id)
        .bind(Utc::now().naive_utc())
        .bind(id)
        .bind(CommentStatus::Active.as_i64())
        .execute(&self.pool)
        .await
        .map_err(into_storage)?;

        if result.rows_affected() == 0 {
            return Err(CommentError::NotFound(id));
        }
        self.get_comment(id).await?.ok_or(CommentError::NotFound(id))
    }

    /// 逻辑删除：只动 status / updatedBy / updatedAt 三列，绝不整行重写。
    /// 子评论不受影响。返回是否有行被更新。
    pub async fn soft_delete_comment(
        &self,
        ctx: &RequestContext,
        id: i64,
    ) -> Result<bool, CommentError> {
        let result = sqlx::query(
            "UPDATE comments SET status = ?, updated_by = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(CommentStatus::Deleted.as_i64())
        .bind(ctx.user_id)
        .bind(Utc::now().naive_utc())
        .bind(id)
        .bind(CommentStatus::Active.as_i64())
        .execute(&self.pool)
        .await
        .map_err(into_storage)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_comment(&self, id: i64) -> Result<Option<Comment>, CommentError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM comments c \
             LEFT JOIN authors a ON a.id = c.created_by WHERE c.id = ?"
        );
        let row = sqlx::query_as::<_, SqlComment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(into_storage)?;
        Ok(row.map(Into::into))
    }

    /// 作用域内的平铺列表。排序先按 parentId 升序（同一父节点的孩子连续），
    /// 再按 createdAt 降序（新回复在前），树构建依赖这个顺序。
    pub async fn list_by_scope(
        &self,
        scope: &EntityScope,
        opts: &ListOptions,
    ) -> Result<Vec<Comment>, CommentError> {
        let sql = format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM comments c
            LEFT JOIN authors a ON a.id = c.created_by
            WHERE c.entity = ? AND c.entity_id = ?
              AND (? IS NULL OR c.level <= ?)
              AND (? OR c.status = ?)
            ORDER BY c.parent_id ASC, c.created_at DESC
            LIMIT ? OFFSET ?
            "#
        );
        let rows = sqlx::query_as::<_, SqlComment>(&sql)
            .bind(scope.entity())
            .bind(scope.entity_id())
            .bind(opts.max_level)
            .bind(opts.max_level)
            .bind(opts.include_deleted)
            .bind(CommentStatus::Active.as_i64())
            // SQLite 里 LIMIT -1 表示不限
            .bind(opts.limit.unwrap_or(-1))
            .bind(opts.offset.unwrap_or(0))
            .fetch_all(&self.pool)
            .await
            .map_err(into_storage)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// 作用域内的行数，只受可见性过滤影响（不看 level）。
    pub async fn count_comments(
        &self,
        scope: &EntityScope,
        include_deleted: bool,
    ) -> Result<i64, CommentError> {
        let row = sqlx::query(
            "SELECT COUNT(*) FROM comments WHERE entity = ? AND entity_id = ? AND (? OR status = ?)",
        )
        .bind(scope.entity())
        .bind(scope.entity_id())
        .bind(include_deleted)
        .bind(CommentStatus::Active.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(into_storage)?;

        Ok(row.get(0))
    }

    /// "最新评论"挂件用的查询：规范排序下的第一行。
    pub async fn last_comment(
        &self,
        scope: &EntityScope,
        opts: &ListOptions,
    ) -> Result<Option<Comment>, CommentError> {
        let opts = ListOptions {
            limit: Some(1),
            offset: Some(0),
            ..opts.clone()
        };
        Ok(self.list_by_scope(scope, &opts).await?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    async fn test_db() -> Db {
        Db::new("sqlite::memory:").await.unwrap()
    }

    fn scope(entity: &str, entity_id: i64) -> EntityScope {
        EntityScope::new(entity, entity_id).unwrap()
    }

    fn new_comment(scope: &EntityScope, parent_id: Option<i64>, content: &str) -> NewComment {
        NewComment {
            scope: scope.clone(),
            parent_id,
            content: content.into(),
            related_to: None,
        }
    }

    async fn pin_created_at(db: &Db, id: i64, ts: i64) {
        let when = DateTime::from_timestamp(ts, 0).unwrap().naive_utc();
        sqlx::query("UPDATE comments SET created_at = ? WHERE id = ?")
            .bind(when)
            .bind(id)
            .execute(&db.pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_computes_level_and_defaults() {
        let db = test_db().await;
        let ctx = RequestContext { user_id: 7 };
        let s = scope("post", 42);

        let root = db.create_comment(&ctx, &new_comment(&s, None, "root")).await.unwrap();
        assert_eq!(root.level, 0);
        assert_eq!(root.parent_id, None);
        assert_eq!(root.status, CommentStatus::Active);
        assert_eq!(root.created_by, 7);
        assert_eq!(root.related_to, "post:42");

        let reply = db
            .create_comment(&ctx, &new_comment(&s, Some(root.id), "reply"))
            .await
            .unwrap();
        assert_eq!(reply.level, 1);
        assert_eq!(reply.parent_id, Some(root.id));

        let deep = db
            .create_comment(&ctx, &new_comment(&s, Some(reply.id), "deeper"))
            .await
            .unwrap();
        assert_eq!(deep.level, 2);
    }

    #[tokio::test]
    async fn zero_parent_is_treated_as_root() {
        let db = test_db().await;
        let ctx = RequestContext { user_id: 1 };
        let s = scope("post", 1);

        let c = db.create_comment(&ctx, &new_comment(&s, Some(0), "hi")).await.unwrap();
        assert_eq!(c.level, 0);
        assert_eq!(c.parent_id, None);
    }

    #[tokio::test]
    async fn empty_content_is_rejected() {
        let db = test_db().await;
        let ctx = RequestContext { user_id: 1 };
        let s = scope("post", 1);

        let err = db.create_comment(&ctx, &new_comment(&s, None, "   ")).await.unwrap_err();
        assert!(matches!(err, CommentError::Validation(_)));
    }

    #[tokio::test]
    async fn parent_must_exist() {
        let db = test_db().await;
        let ctx = RequestContext { user_id: 1 };
        let s = scope("post", 1);

        let err = db
            .create_comment(&ctx, &new_comment(&s, Some(999), "orphan"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::Validation(_)));
    }

    #[tokio::test]
    async fn parent_in_other_scope_is_rejected() {
        let db = test_db().await;
        let ctx = RequestContext { user_id: 1 };
        let s1 = scope("post", 42);
        let s2 = scope("product", 42);

        let a = db.create_comment(&ctx, &new_comment(&s1, None, "a")).await.unwrap();
        let err = db
            .create_comment(&ctx, &new_comment(&s2, Some(a.id), "cross"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::Validation(_)));

        // 同一 entity、不同 entityId 也算另一个作用域
        let s3 = scope("post", 43);
        let err = db
            .create_comment(&ctx, &new_comment(&s3, Some(a.id), "cross"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::Validation(_)));
    }

    #[tokio::test]
    async fn deleted_parent_is_rejected() {
        let db = test_db().await;
        let ctx = RequestContext { user_id: 1 };
        let s = scope("post", 1);

        let a = db.create_comment(&ctx, &new_comment(&s, None, "a")).await.unwrap();
        assert!(db.soft_delete_comment(&ctx, a.id).await.unwrap());

        let err = db
            .create_comment(&ctx, &new_comment(&s, Some(a.id), "reply"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::Validation(_)));
    }

    #[tokio::test]
    async fn soft_delete_touches_only_blame_fields() {
        let db = test_db().await;
        let author = RequestContext { user_id: 1 };
        let moderator = RequestContext { user_id: 99 };
        let s = scope("post", 1);

        let before = db
            .create_comment(&author, &new_comment(&s, None, "<b>keep me</b>"))
            .await
            .unwrap();

        assert!(db.soft_delete_comment(&moderator, before.id).await.unwrap());
        let after = db.get_comment(before.id).await.unwrap().unwrap();

        assert_eq!(after.status, CommentStatus::Deleted);
        assert_eq!(after.updated_by, 99);
        assert_eq!(after.content, before.content);
        assert_eq!(after.created_by, before.created_by);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.level, before.level);
        assert_eq!(after.related_to, before.related_to);

        // 已删除的行再删一次不算命中
        assert!(!db.soft_delete_comment(&moderator, before.id).await.unwrap());
        // 不存在的 id 同理
        assert!(!db.soft_delete_comment(&moderator, 424242).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_parent_leaves_children_active() {
        let db = test_db().await;
        let ctx = RequestContext { user_id: 1 };
        let s = scope("post", 42);

        let a = db.create_comment(&ctx, &new_comment(&s, None, "a")).await.unwrap();
        let b = db.create_comment(&ctx, &new_comment(&s, Some(a.id), "b")).await.unwrap();

        assert!(db.soft_delete_comment(&ctx, a.id).await.unwrap());

        let b_after = db.get_comment(b.id).await.unwrap().unwrap();
        assert_eq!(b_after.status, CommentStatus::Active);
        assert_eq!(b_after.level, 1);
    }

    #[tokio::test]
    async fn count_respects_visibility() {
        let db = test_db().await;
        let ctx = RequestContext { user_id: 1 };
        let s = scope("post", 1);

        let a = db.create_comment(&ctx, &new_comment(&s, None, "a")).await.unwrap();
        db.create_comment(&ctx, &new_comment(&s, None, "b")).await.unwrap();
        db.create_comment(&ctx, &new_comment(&s, None, "c")).await.unwrap();
        db.soft_delete_comment(&ctx, a.id).await.unwrap();

        assert_eq!(db.count_comments(&s, false).await.unwrap(), 2);
        assert_eq!(db.count_comments(&s, true).await.unwrap(), 3);

        // 其他作用域不受影响
        let other = scope("post", 2);
        assert_eq!(db.count_comments(&other, true).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_orders_siblings_newest_first() {
        let db = test_db().await;
        let ctx = RequestContext { user_id: 1 };
        let s = scope("post", 1);

        let c1 = db.create_comment(&ctx, &new_comment(&s, None, "t1")).await.unwrap();
        let c2 = db.create_comment(&ctx, &new_comment(&s, None, "t2")).await.unwrap();
        let c3 = db.create_comment(&ctx, &new_comment(&s, None, "t3")).await.unwrap();
        pin_created_at(&db, c1.id, 1_000).await;
        pin_created_at(&db, c2.id, 2_000).await;
        pin_created_at(&db, c3.id, 3_000).await;

        let rows = db.list_by_scope(&s, &ListOptions::default()).await.unwrap();
        let order: Vec<i64> = rows.iter().map(|c| c.id).collect();
        assert_eq!(order, vec![c3.id, c2.id, c1.id]);
    }

    #[tokio::test]
    async fn list_groups_by_parent_before_recency() {
        let db = test_db().await;
        let ctx = RequestContext { user_id: 1 };
        let s = scope("post", 1);

        let root = db.create_comment(&ctx, &new_comment(&s, None, "root")).await.unwrap();
        let r1 = db.create_comment(&ctx, &new_comment(&s, Some(root.id), "r1")).await.unwrap();
        let r2 = db.create_comment(&ctx, &new_comment(&s, Some(root.id), "r2")).await.unwrap();
        pin_created_at(&db, root.id, 1_000).await;
        pin_created_at(&db, r1.id, 2_000).await;
        pin_created_at(&db, r2.id, 3_000).await;

        let rows = db.list_by_scope(&s, &ListOptions::default()).await.unwrap();
        let order: Vec<i64> = rows.iter().map(|c| c.id).collect();
        // 根分组在前，随后是 root 的孩子（新的在前）
        assert_eq!(order, vec![root.id, r2.id, r1.id]);
    }

    #[tokio::test]
    async fn max_level_filters_deep_rows() {
        let db = test_db().await;
        let ctx = RequestContext { user_id: 1 };
        let s = scope("post", 1);

        let l0 = db.create_comment(&ctx, &new_comment(&s, None, "l0")).await.unwrap();
        let l1 = db.create_comment(&ctx, &new_comment(&s, Some(l0.id), "l1")).await.unwrap();
        db.create_comment(&ctx, &new_comment(&s, Some(l1.id), "l2")).await.unwrap();

        let opts = ListOptions {
            max_level: Some(1),
            ..Default::default()
        };
        let rows = db.list_by_scope(&s, &opts).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|c| c.level <= 1));
    }

    #[tokio::test]
    async fn list_hides_deleted_unless_asked() {
        let db = test_db().await;
        let ctx = RequestContext { user_id: 1 };
        let s = scope("post", 1);

        let a = db.create_comment(&ctx, &new_comment(&s, None, "a")).await.unwrap();
        db.create_comment(&ctx, &new_comment(&s, None, "b")).await.unwrap();
        db.soft_delete_comment(&ctx, a.id).await.unwrap();

        let visible = db.list_by_scope(&s, &ListOptions::default()).await.unwrap();
        assert_eq!(visible.len(), 1);

        let all = db
            .list_by_scope(&s, &ListOptions { include_deleted: true, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        let deleted = all.iter().find(|c| c.id == a.id).unwrap();
        assert_eq!(deleted.display_content("Comment was deleted."), "Comment was deleted.");
    }

    #[tokio::test]
    async fn content_is_sanitized_on_create_and_edit() {
        let db = test_db().await;
        let ctx = RequestContext { user_id: 1 };
        let s = scope("post", 1);

        let c = db
            .create_comment(&ctx, &new_comment(&s, None, "<script>x</script>"))
            .await
            .unwrap();
        assert_eq!(c.content, "&lt;script&gt;x&lt;/script&gt;");

        let edited = db.update_content(&ctx, c.id, "<i>edit</i>").await.unwrap();
        assert_eq!(edited.content, "&lt;i&gt;edit&lt;/i&gt;");
        assert_eq!(edited.created_at, c.created_at);

        let err = db.update_content(&ctx, 999, "nope").await.unwrap_err();
        assert!(matches!(err, CommentError::NotFound(999)));
    }

    #[tokio::test]
    async fn author_display_data_is_attached() {
        let db = test_db().await;
        let ctx = RequestContext { user_id: 5 };
        let s = scope("post", 1);

        db.upsert_author(5, "alice", Some("https://cdn.example/a.png")).await.unwrap();
        let c = db.create_comment(&ctx, &new_comment(&s, None, "hi")).await.unwrap();

        let author = c.author.as_ref().unwrap();
        assert_eq!(author.display_name, "alice");
        assert_eq!(c.author_avatar(), "https://cdn.example/a.png");

        // 没有头像时回落到占位图
        db.upsert_author(5, "alice", None).await.unwrap();
        let c = db.get_comment(c.id).await.unwrap().unwrap();
        assert_eq!(c.author_avatar(), domain::PLACEHOLDER_AVATAR);
    }

    #[tokio::test]
    async fn last_comment_is_first_row_of_canonical_order() {
        let db = test_db().await;
        let ctx = RequestContext { user_id: 1 };
        let s = scope("post", 1);

        assert!(db.last_comment(&s, &ListOptions::default()).await.unwrap().is_none());

        let c1 = db.create_comment(&ctx, &new_comment(&s, None, "old")).await.unwrap();
        let c2 = db.create_comment(&ctx, &new_comment(&s, None, "new")).await.unwrap();
        pin_created_at(&db, c1.id, 1_000).await;
        pin_created_at(&db, c2.id, 2_000).await;

        let last = db.last_comment(&s, &ListOptions::default()).await.unwrap().unwrap();
        assert_eq!(last.id, c2.id);
    }
}
