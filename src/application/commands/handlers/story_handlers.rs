//! Story Command Handlers

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::commands::story_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{GenerationStatus, GenerationTrackerPort};
use crate::domain::story::{progress_message, ProgressStep, StoryParameters};

/// CreateStory Handler - 校验参数、进入 writing 状态并把生成任务交给后台
pub struct CreateStoryHandler {
    tracker: Arc<dyn GenerationTrackerPort>,
    queue: mpsc::Sender<StoryParameters>,
}

impl CreateStoryHandler {
    pub fn new(tracker: Arc<dyn GenerationTrackerPort>, queue: mpsc::Sender<StoryParameters>) -> Self {
        Self { tracker, queue }
    }

    pub async fn handle(&self, cmd: CreateStory) -> Result<CreateStoryResponse, ApplicationError> {
        let params = StoryParameters::new(
            cmd.character,
            cmd.setting,
            cmd.theme,
            cmd.subject,
            cmd.language,
            cmd.custom_prompt,
        )?;

        let language = params.language();
        let message = progress_message(language, ProgressStep::Planning);
        self.tracker.begin(language, message.clone())?;

        if let Err(e) = self.queue.try_send(params) {
            tracing::error!(error = %e, "Failed to enqueue story generation");
            let failed = progress_message(language, ProgressStep::Failed);
            if let Err(te) = self.tracker.transition(GenerationStatus::Error, failed) {
                tracing::warn!(error = %te, "Failed to record generation error");
            }
            return Err(ApplicationError::internal("generation queue unavailable"));
        }

        tracing::info!(language = language.as_str(), "Story generation queued");

        Ok(CreateStoryResponse {
            status: GenerationStatus::Writing,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::story::{Language, Subject};
    use crate::infrastructure::memory::InMemoryGenerationTracker;

    fn command(character: &str) -> CreateStory {
        CreateStory {
            character: character.to_string(),
            setting: "Space".to_string(),
            theme: String::new(),
            subject: Subject::Story,
            language: Language::Id,
            custom_prompt: None,
        }
    }

    #[tokio::test]
    async fn test_create_enters_writing() {
        let tracker = Arc::new(InMemoryGenerationTracker::new());
        let (tx, mut rx) = mpsc::channel(4);
        let handler = CreateStoryHandler::new(tracker.clone(), tx);

        let response = handler.handle(command("Robot")).await.unwrap();
        assert_eq!(response.status, GenerationStatus::Writing);
        assert_eq!(response.message, "🤖 Merencanakan petualangan...");
        assert_eq!(tracker.status().status, GenerationStatus::Writing);

        let queued = rx.recv().await.unwrap();
        assert_eq!(queued.character(), "Robot");
        assert_eq!(queued.theme(), "Adventure");
    }

    #[tokio::test]
    async fn test_create_rejected_while_in_progress() {
        let tracker = Arc::new(InMemoryGenerationTracker::new());
        let (tx, _rx) = mpsc::channel(4);
        let handler = CreateStoryHandler::new(tracker.clone(), tx);

        handler.handle(command("Robot")).await.unwrap();
        let err = handler.handle(command("Cat")).await.unwrap_err();
        assert!(matches!(err, ApplicationError::BusinessRuleViolation(_)));
    }

    #[tokio::test]
    async fn test_closed_queue_marks_error_and_allows_retry() {
        let tracker = Arc::new(InMemoryGenerationTracker::new());
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let handler = CreateStoryHandler::new(tracker.clone(), tx);

        let err = handler.handle(command("Robot")).await.unwrap_err();
        assert!(matches!(err, ApplicationError::InternalError(_)));
        assert_eq!(tracker.status().status, GenerationStatus::Error);

        // 出错后可以重新开始
        let retry = handler.handle(command("Robot")).await.unwrap_err();
        assert!(matches!(retry, ApplicationError::InternalError(_)));
    }

    #[tokio::test]
    async fn test_missing_character_is_validation_error() {
        let tracker = Arc::new(InMemoryGenerationTracker::new());
        let (tx, _rx) = mpsc::channel(4);
        let handler = CreateStoryHandler::new(tracker.clone(), tx);

        let err = handler.handle(command("  ")).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(_)));
        assert_eq!(tracker.status().status, GenerationStatus::Idle);
    }
}
