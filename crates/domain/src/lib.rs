mod errors;
mod models;
pub mod pagination;
pub mod sanitize;
pub mod tree;

pub use errors::CommentError;
pub use models::{
    entity_tag, Author, Comment, CommentStatus, EntityScope, NewComment, RequestContext,
    PLACEHOLDER_AVATAR,
};
pub use tree::{build_tree, TreeNode, ROOT_PARENT};
