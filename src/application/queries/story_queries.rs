//! Story Queries - 生成状态、故事与书库查询

use crate::domain::story::{NarrationAudio, StoryId};

/// 查询当前生成状态
#[derive(Debug, Clone, Default)]
pub struct GetGenerationStatus;

/// 查询最近一次生成的故事（含进行中的快照）
#[derive(Debug, Clone, Default)]
pub struct GetCurrentStory;

/// 列出书库
#[derive(Debug, Clone, Default)]
pub struct ListLibrary;

/// 按 id 查询故事
#[derive(Debug, Clone)]
pub struct GetStory {
    pub story_id: StoryId,
}

/// 查询某一页的旁白音频
#[derive(Debug, Clone)]
pub struct GetPageAudio {
    pub story_id: StoryId,
    /// 从 1 开始
    pub page_number: u32,
}

#[derive(Debug, Clone)]
pub struct GetPageAudioResponse {
    pub story_id: StoryId,
    pub page_number: u32,
    pub audio: NarrationAudio,
}
