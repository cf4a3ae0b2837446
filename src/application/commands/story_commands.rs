//! Story Commands - 故事生成命令

use crate::application::ports::GenerationStatus;
use crate::domain::story::{Language, Subject};

/// 创建故事命令
#[derive(Debug, Clone)]
pub struct CreateStory {
    pub character: String,
    pub setting: String,
    pub theme: String,
    pub subject: Subject,
    pub language: Language,
    pub custom_prompt: Option<String>,
}

/// 创建故事响应（生成在后台进行）
#[derive(Debug, Clone)]
pub struct CreateStoryResponse {
    pub status: GenerationStatus,
    pub message: String,
}
