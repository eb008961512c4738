use serde::Serialize;
use std::collections::HashMap;

use crate::models::Comment;

/// parentId 为 0（或缺省）的行视为根评论。
pub const ROOT_PARENT: i64 = 0;

/// 树节点是独立的包装类型：持久化的 Comment 本身永远不带 children。
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// 本节点及其全部后代的行数。
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }
}

/// 把按 (parentId ASC, createdAt DESC) 排好的平铺结果组装成嵌套树。
///
/// 单次 O(n) 按 parentId 分桶，再从 root_id 出发递归取桶。每一行在整个
/// 构建过程中恰好被消费一次；兄弟间保持输入顺序。父节点不在输入里的行
/// （典型场景：父评论落在另一页的窗口里）按首次出现顺序提升为根位节点，
/// 子树不丢。桶被取走即删除，所以畸形的环状输入也不会死循环。
pub fn build_tree(rows: Vec<Comment>, root_id: i64) -> Vec<TreeNode> {
    let mut first_seen: Vec<i64> = Vec::new();
    let mut buckets: HashMap<i64, Vec<Comment>> = HashMap::new();
    for row in rows {
        let key = row.parent_id.unwrap_or(ROOT_PARENT);
        if !buckets.contains_key(&key) {
            first_seen.push(key);
        }
        buckets.entry(key).or_default().push(row);
    }

    let mut tree = assemble(&mut buckets, root_id);

    for key in first_seen {
        if buckets.contains_key(&key) {
            tree.extend(assemble(&mut buckets, key));
        }
    }

    tree
}

fn assemble(buckets: &mut HashMap<i64, Vec<Comment>>, parent: i64) -> Vec<TreeNode> {
    let Some(bucket) = buckets.remove(&parent) else {
        return Vec::new();
    };
    bucket
        .into_iter()
        .map(|comment| {
            let id = comment.id;
            TreeNode {
                children: assemble(buckets, id),
                comment,
            }
        })
        .collect()
}
