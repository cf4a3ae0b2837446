//! Reading Session Port - 阅读会话生命周期管理
//!
//! 具体实现在 infrastructure/memory 层

use std::sync::Arc;

use crate::application::playback::ReadingSession;
use crate::domain::story::Story;

use super::PlaybackError;

/// Reading Session Port
///
/// 同一时间只有一个打开的阅读会话；打开新会话会先退出旧会话并释放其音频设备
pub trait ReadingSessionsPort: Send + Sync {
    /// 为故事打开阅读会话（获取音频设备）
    fn open(&self, story: Arc<Story>) -> Result<Arc<ReadingSession>, PlaybackError>;

    fn get(&self, id: &str) -> Option<Arc<ReadingSession>>;

    /// 退出会话：停止音频并释放设备
    fn close(&self, id: &str) -> Option<Arc<ReadingSession>>;

    fn active_count(&self) -> usize;
}
