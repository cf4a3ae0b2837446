//! Generation Tracker Port - 生成状态与进行中故事的快照
//!
//! 具体实现在 infrastructure/memory 层

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::domain::story::{Language, Story};

/// 生成状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Idle,
    Writing,
    Illustrating,
    Ready,
    Error,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Writing => "writing",
            Self::Illustrating => "illustrating",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "writing" => Some(Self::Writing),
            "illustrating" => Some(Self::Illustrating),
            "ready" => Some(Self::Ready),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// 正在生成中（writing / illustrating）
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Writing | Self::Illustrating)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }

    /// 状态机：
    /// idle → writing → illustrating → ready；writing/illustrating → error；
    /// ready/error → idle（新一轮尝试）
    pub fn can_transition_to(&self, next: GenerationStatus) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Writing)
                | (Self::Writing, Self::Illustrating)
                | (Self::Writing, Self::Error)
                | (Self::Illustrating, Self::Ready)
                | (Self::Illustrating, Self::Error)
                | (Self::Ready, Self::Idle)
                | (Self::Error, Self::Idle)
        )
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracker 错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Generation already in progress: {0}")]
    Busy(GenerationStatus),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition {
        from: GenerationStatus,
        to: GenerationStatus,
    },
}

/// 当前状态及用户可见的进度消息
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub status: GenerationStatus,
    pub message: String,
    pub language: Option<Language>,
    pub updated_at: DateTime<Utc>,
}

impl StatusUpdate {
    pub fn idle() -> Self {
        Self {
            status: GenerationStatus::Idle,
            message: String::new(),
            language: None,
            updated_at: Utc::now(),
        }
    }
}

/// 进行中故事的一个版本；每次整页替换后版本号递增
#[derive(Debug, Clone)]
pub struct StorySnapshot {
    pub version: u64,
    pub story: Arc<Story>,
}

/// Generation Tracker Port
pub trait GenerationTrackerPort: Send + Sync {
    /// 开始新一轮生成：清空上一次的故事快照并进入 writing
    ///
    /// 已有生成在进行时返回 Busy
    fn begin(&self, language: Language, message: String) -> Result<(), TrackerError>;

    /// 按状态机迁移
    fn transition(&self, next: GenerationStatus, message: String) -> Result<(), TrackerError>;

    /// 只更新进度消息
    fn set_message(&self, message: String);

    fn status(&self) -> StatusUpdate;

    /// 发布一个新的故事快照，返回版本号
    fn publish_story(&self, story: Story) -> u64;

    fn snapshot(&self) -> Option<StorySnapshot>;

    fn subscribe_status(&self) -> watch::Receiver<StatusUpdate>;

    fn subscribe_story(&self) -> watch::Receiver<Option<StorySnapshot>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use GenerationStatus::*;

        assert!(Idle.can_transition_to(Writing));
        assert!(Writing.can_transition_to(Illustrating));
        assert!(Illustrating.can_transition_to(Ready));
        assert!(Writing.can_transition_to(Error));
        assert!(Ready.can_transition_to(Idle));
        assert!(Error.can_transition_to(Idle));

        assert!(!Idle.can_transition_to(Ready));
        assert!(!Writing.can_transition_to(Ready));
        assert!(!Ready.can_transition_to(Writing));
        assert!(!Illustrating.can_transition_to(Writing));
    }

    #[test]
    fn test_status_round_trip_names() {
        for status in [
            GenerationStatus::Idle,
            GenerationStatus::Writing,
            GenerationStatus::Illustrating,
            GenerationStatus::Ready,
            GenerationStatus::Error,
        ] {
            assert_eq!(GenerationStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(GenerationStatus::from_str("narrating"), None);
    }
}
