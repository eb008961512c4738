use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::errors::CommentError;

// 头像缺失时的占位图（确定性 URL，不算错误路径）
pub const PLACEHOLDER_AVATAR: &str =
    "https://www.gravatar.com/avatar/00000000000000000000000000000000?d=mm&f=y&s=50";

/// 从宿主对象的类型名派生出稳定的实体标签（短十六进制串，按类型稳定）。
pub fn entity_tag(kind: &str) -> String {
    let digest = Sha256::digest(kind.as_bytes());
    hex::encode(&digest[..4])
}

// 只能通过 new 构造，标签校验不可绕过
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityScope {
    entity: String,
    entity_id: i64,
}

impl EntityScope {
    pub fn new(entity: impl Into<String>, entity_id: i64) -> Result<Self, String> {
        let entity = entity.into();
        if entity.is_empty() {
            return Err("Entity tag cannot be empty.".to_string());
        }
        if !entity
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
        {
            return Err("Entity tag contains invalid characters.".to_string());
        }
        if entity.len() > 64 {
            return Err("Entity tag is too long (max 64 chars).".to_string());
        }
        if entity_id <= 0 {
            return Err("Entity id must be positive.".to_string());
        }
        Ok(Self { entity, entity_id })
    }

    pub fn for_kind(kind: &str, entity_id: i64) -> Result<Self, String> {
        Self::new(entity_tag(kind), entity_id)
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn entity_id(&self) -> i64 {
        self.entity_id
    }
}

impl fmt::Display for EntityScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity, self.entity_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    Active,
    Deleted,
}

impl CommentStatus {
    // 持久化用的整数值，沿用原表约定
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Active => 1,
            Self::Deleted => 2,
        }
    }

    pub fn from_i64(v: i64) -> Self {
        // 表上有 CHECK 约束，落到这里只可能是 1 或 2
        if v == 2 {
            Self::Deleted
        } else {
            Self::Active
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl Author {
    pub fn avatar_or_placeholder(&self) -> &str {
        self.avatar_url.as_deref().unwrap_or(PLACEHOLDER_AVATAR)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub entity: String,
    pub entity_id: i64,
    pub parent_id: Option<i64>,
    pub content: String,
    pub created_by: i64,
    pub updated_by: i64,
    pub related_to: String,
    pub status: CommentStatus,
    pub level: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    // 读取时由作者表联查填充，不落库
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
}

impl Comment {
    pub fn is_active(&self) -> bool {
        self.status == CommentStatus::Active
    }

    pub fn is_deleted(&self) -> bool {
        self.status == CommentStatus::Deleted
    }

    /// 已删除的评论以占位文案展示，子评论不受影响。
    pub fn display_content<'a>(&'a self, deleted_text: &'a str) -> &'a str {
        if self.is_deleted() {
            deleted_text
        } else {
            &self.content
        }
    }

    pub fn author_avatar(&self) -> &str {
        self.author
            .as_ref()
            .map(Author::avatar_or_placeholder)
            .unwrap_or(PLACEHOLDER_AVATAR)
    }
}

/// 每个写操作都显式携带操作者，不依赖任何全局"当前用户"。
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub user_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub scope: EntityScope,
    pub parent_id: Option<i64>,
    pub content: String,
    pub related_to: Option<String>,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), CommentError> {
        if self.content.trim().is_empty() {
            return Err(CommentError::validation("Comment content cannot be empty."));
        }
        Ok(())
    }

    /// parentId 为 0 与缺省等价，都表示根评论。
    pub fn parent(&self) -> Option<i64> {
        self.parent_id.filter(|&p| p > 0)
    }

    pub fn related_to_or_default(&self) -> String {
        match &self.related_to {
            Some(s) if !s.is_empty() => s.clone(),
            _ => self.scope.to_string(),
        }
    }
}
