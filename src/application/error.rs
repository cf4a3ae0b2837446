//! 应用层错误定义
//!
//! - ApplicationError: 命令/查询统一错误
//! - GenerationError: 故事生成管线错误

use thiserror::Error;

use crate::application::ports::{PersistenceError, PlaybackError, ServiceError, TrackerError};
use crate::domain::story::StoryError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 业务规则违反
    #[error("Business rule violation: {0}")]
    BusinessRuleViolation(String),

    /// 状态无效
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 音频播放错误
    #[error("Playback error: {0}")]
    PlaybackError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<StoryError> for ApplicationError {
    fn from(err: StoryError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<TrackerError> for ApplicationError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::Busy(_) => Self::BusinessRuleViolation(err.to_string()),
            TrackerError::InvalidTransition { .. } => Self::InvalidState(err.to_string()),
        }
    }
}

impl From<PlaybackError> for ApplicationError {
    fn from(err: PlaybackError) -> Self {
        Self::PlaybackError(err.to_string())
    }
}

impl From<PersistenceError> for ApplicationError {
    fn from(err: PersistenceError) -> Self {
        Self::StorageError(err.to_string())
    }
}

/// 故事生成错误
///
/// 任一阶段失败都会终止本轮生成，书库保持不变
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Planning failed: {0}")]
    PlanningFailure(String),

    #[error("Writing failed: {0}")]
    WritingFailure(String),

    #[error("Game design failed: {0}")]
    GameFailure(String),

    #[error("Media failed: {0}")]
    MediaFailure(String),

    #[error("Service unavailable: {0}")]
    ServiceFailure(ServiceError),

    #[error("Persistence failed: {0}")]
    PersistenceFailure(String),

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

impl From<PersistenceError> for GenerationError {
    fn from(err: PersistenceError) -> Self {
        Self::PersistenceFailure(err.to_string())
    }
}

impl GenerationError {
    /// 将服务错误归类：内容不可用归到阶段失败，传输失败归到 ServiceFailure
    pub fn from_service(err: ServiceError, stage: fn(String) -> GenerationError) -> Self {
        if err.is_content_error() {
            stage(err.to_string())
        } else {
            Self::ServiceFailure(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::GenerationStatus;

    #[test]
    fn test_service_error_classification() {
        let err = GenerationError::from_service(
            ServiceError::EmptyResponse,
            GenerationError::PlanningFailure,
        );
        assert!(matches!(err, GenerationError::PlanningFailure(_)));

        let err = GenerationError::from_service(ServiceError::Timeout, GenerationError::WritingFailure);
        assert!(matches!(err, GenerationError::ServiceFailure(ServiceError::Timeout)));
    }

    #[test]
    fn test_persistence_error_becomes_persistence_failure() {
        let err = GenerationError::from(PersistenceError::DatabaseError("disk full".to_string()));
        assert!(matches!(err, GenerationError::PersistenceFailure(_)));
        assert_eq!(err.to_string(), "Persistence failed: Database error: disk full");
    }

    #[test]
    fn test_tracker_busy_maps_to_business_rule() {
        let err: ApplicationError = TrackerError::Busy(GenerationStatus::Writing).into();
        assert!(matches!(err, ApplicationError::BusinessRuleViolation(_)));
    }
}
