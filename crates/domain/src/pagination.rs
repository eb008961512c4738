use serde::Serialize;

/// 把总数 + 每页条数换算成 (offset, limit) 窗口。
/// 对查询计划器而言这只是一个不透明的窗口提供者。
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    total_count: i64,
    per_page: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: i64,
    pub limit: i64,
    pub page: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
    pub total_count: i64,
    pub per_page: i64,
    pub page_count: i64,
    pub current_page: i64,
}

impl Pagination {
    pub fn new(total_count: i64, per_page: i64) -> Self {
        Self {
            total_count: total_count.max(0),
            per_page: per_page.max(1),
        }
    }

    pub fn page_count(&self) -> i64 {
        if self.total_count == 0 {
            0
        } else {
            (self.total_count + self.per_page - 1) / self.per_page
        }
    }

    /// 页码从 0 起，越界的请求收拢到有效区间。
    pub fn window(&self, page: i64) -> PageWindow {
        let last = (self.page_count() - 1).max(0);
        let page = page.clamp(0, last);
        PageWindow {
            offset: page * self.per_page,
            limit: self.per_page,
            page,
        }
    }

    pub fn info(&self, current_page: i64) -> PageInfo {
        let window = self.window(current_page);
        PageInfo {
            total_count: self.total_count,
            per_page: self.per_page,
            page_count: self.page_count(),
            current_page: window.page,
        }
    }
}
