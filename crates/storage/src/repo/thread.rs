use crate::repo::comments::ListOptions;
use crate::Db;
use domain::pagination::{PageInfo, Pagination};
use domain::{build_tree, CommentError, EntityScope, TreeNode, ROOT_PARENT};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct ThreadQuery {
    pub scope: EntityScope,
    pub max_level: Option<i64>,
    pub include_deleted: bool,
    pub per_page: Option<i64>,
    pub page: i64,
}

impl ThreadQuery {
    pub fn new(scope: EntityScope) -> Self {
        Self {
            scope,
            max_level: None,
            include_deleted: false,
            per_page: None,
            page: 0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ThreadPage {
    pub roots: Vec<TreeNode>,
    pub total_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageInfo>,
}

impl Db {
    /// 评论列表的查询计划：count → 分页窗口 → 取行 → 组树。
    ///
    /// 分页作用在平铺的规范排序上，而不是组好的树上：父评论落在其他页
    /// 时，其子评论在本页以根位节点呈现（见 build_tree 的孤儿提升）。
    /// 这是有意保留的既有行为，树感知分页不在范围内。
    pub async fn list_thread(&self, q: &ThreadQuery) -> Result<ThreadPage, CommentError> {
        let total_count = self.count_comments(&q.scope, q.include_deleted).await?;
        tracing::debug!(scope = %q.scope, total = total_count, "listing comment thread");

        let mut opts = ListOptions {
            max_level: q.max_level,
            include_deleted: q.include_deleted,
            offset: None,
            limit: None,
        };
        let page = q.per_page.map(|per_page| {
            let pagination = Pagination::new(total_count, per_page);
            let window = pagination.window(q.page);
            opts.offset = Some(window.offset);
            opts.limit = Some(window.limit);
            pagination.info(window.page)
        });

        let rows = self.list_by_scope(&q.scope, &opts).await?;
        let roots = build_tree(rows, ROOT_PARENT);

        Ok(ThreadPage {
            roots,
            total_count,
            page,
        })
    }
}
