//! Library Store Port - 故事书库持久化抽象

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::story::Story;

/// 持久化错误
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Corrupt library data: {0}")]
    Corrupt(String),
}

/// Library Store Port
///
/// 整个书库作为一个有序集合读写，最新的故事在最前面
#[async_trait]
pub trait LibraryStorePort: Send + Sync {
    /// 读取整个书库；尚未保存过时返回空集合
    async fn load_library(&self) -> Result<Vec<Story>, PersistenceError>;

    /// 覆盖保存整个书库
    async fn save_library(&self, stories: &[Story]) -> Result<(), PersistenceError>;
}
