//! Story Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoryError {
    #[error("缺少必填参数: {0}")]
    MissingParameter(&'static str),

    #[error("无效的故事计划: {0}")]
    InvalidPlan(String),

    #[error("无效的页面: {0}")]
    InvalidPage(String),

    #[error("无效的小游戏: {0}")]
    InvalidGame(String),

    #[error("页数不匹配: 期望 {expected}, 实际 {actual}")]
    PageCountMismatch { expected: usize, actual: usize },

    #[error("页面索引越界: {0}")]
    PageOutOfRange(usize),

    #[error("答案索引越界: {0}")]
    AnswerOutOfRange(usize),
}
