use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommentError {
    // 输入不合法（缺字段、父评论引用错误等），原样返回给调用方展示
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("comment {0} not found")]
    NotFound(i64),

    // 底层存储故障，向上传播，不在本层重试
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl CommentError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
