//! Reading Commands - 阅读会话命令

use crate::application::playback::{NavigationDirection, ReadingPosition};
use crate::domain::story::StoryId;

/// 打开阅读会话；未指定故事时打开最近生成的故事
#[derive(Debug, Clone)]
pub struct OpenReading {
    pub story_id: Option<StoryId>,
}

/// 翻页
#[derive(Debug, Clone)]
pub struct Navigate {
    pub session_id: String,
    pub direction: NavigationDirection,
}

/// 播放当前页旁白
#[derive(Debug, Clone)]
pub struct PlayPageAudio {
    pub session_id: String,
}

/// 播放响应
#[derive(Debug, Clone)]
pub struct PlayPageAudioResponse {
    /// 当前页没有旁白时为 false
    pub played: bool,
    pub position: ReadingPosition,
}

#[derive(Debug, Clone)]
pub struct StopPageAudio {
    pub session_id: String,
}

/// 退出阅读，释放音频设备
#[derive(Debug, Clone)]
pub struct ExitReading {
    pub session_id: String,
}

/// 小游戏作答
#[derive(Debug, Clone)]
pub struct AnswerMiniGame {
    pub session_id: String,
    pub option_index: usize,
}
