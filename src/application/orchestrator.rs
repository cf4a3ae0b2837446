//! 故事生成编排
//!
//! plan → writer → game → 组装 → 逐页媒体 → ready → 写入书库。
//! 任一阶段失败都进入 error 状态，书库不变

use std::sync::Arc;

use crate::application::error::GenerationError;
use crate::application::library::LibraryCatalog;
use crate::application::ports::{GenerationStatus, GenerationTrackerPort, GenerativeServicePort};
use crate::application::stages::{
    GameStage, MediaFanout, MediaProgress, PipelineSettings, PlanStage, WriterStage,
};
use crate::domain::story::{progress_message, ProgressStep, Story, StoryParameters};

pub struct StoryOrchestrator {
    plan_stage: PlanStage,
    writer_stage: WriterStage,
    game_stage: GameStage,
    media: MediaFanout,
    tracker: Arc<dyn GenerationTrackerPort>,
    library: Arc<LibraryCatalog>,
}

impl StoryOrchestrator {
    pub fn new(
        service: Arc<dyn GenerativeServicePort>,
        tracker: Arc<dyn GenerationTrackerPort>,
        library: Arc<LibraryCatalog>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            plan_stage: PlanStage::new(service.clone(), settings.page_count),
            writer_stage: WriterStage::new(
                service.clone(),
                settings.page_count,
                settings.enforce_visual_anchor,
            ),
            game_stage: GameStage::new(service.clone(), settings.game_context_chars),
            media: MediaFanout::new(service, settings.placeholder_base_url),
            tracker,
            library,
        }
    }

    /// 开始新一轮生成并执行到结束
    pub async fn create(&self, params: StoryParameters) -> Result<Story, GenerationError> {
        let language = params.language();
        self.tracker
            .begin(language, progress_message(language, ProgressStep::Planning))?;
        self.run(params).await
    }

    /// 执行已经 begin 的一轮生成
    pub async fn run(&self, params: StoryParameters) -> Result<Story, GenerationError> {
        let language = params.language();
        match self.generate(&params).await {
            Ok(story) => Ok(story),
            Err(e) => {
                tracing::error!(error = %e, "Story generation failed");
                let message = progress_message(language, ProgressStep::Failed);
                if let Err(te) = self.tracker.transition(GenerationStatus::Error, message) {
                    tracing::warn!(error = %te, "Failed to record generation error");
                }
                Err(e)
            }
        }
    }

    async fn generate(&self, params: &StoryParameters) -> Result<Story, GenerationError> {
        let language = params.language();

        let plan = self.plan_stage.run(params).await?;
        let drafts = self.writer_stage.run(&plan, params).await?;

        let narration = drafts
            .iter()
            .map(|d| d.text())
            .collect::<Vec<_>>()
            .join(" ");
        let game = self.game_stage.run(&narration, params).await?;

        let story = Story::assemble(params, &plan, drafts, game)
            .map_err(|e| GenerationError::WritingFailure(e.to_string()))?;

        self.tracker.transition(
            GenerationStatus::Illustrating,
            progress_message(language, ProgressStep::Painting { page_number: 1 }),
        )?;
        let version = self.tracker.publish_story(story.clone());
        tracing::info!(
            story_id = %story.id(),
            title = %story.title(),
            version,
            "Story text ready, illustrating"
        );

        let tracker = &self.tracker;
        let story = self
            .media
            .run(story, |progress| match progress {
                MediaProgress::PageStarted { page_number } => {
                    tracker.set_message(progress_message(
                        language,
                        ProgressStep::Painting { page_number },
                    ));
                }
                MediaProgress::PageCompleted { page_number, story } => {
                    let version = tracker.publish_story(story.clone());
                    tracing::debug!(page_number, version, "Page media published");
                }
            })
            .await?;

        self.tracker
            .transition(GenerationStatus::Ready, progress_message(language, ProgressStep::Ready))?;
        tracing::info!(story_id = %story.id(), "Story ready");

        if let Err(e) = self.save(&story).await {
            tracing::warn!(story_id = %story.id(), error = %e, "Story kept in memory only");
        }

        Ok(story)
    }

    /// 书库写入失败不影响本轮结果
    async fn save(&self, story: &Story) -> Result<(), GenerationError> {
        self.library.prepend_and_save(story.clone()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::library::test_support::MemoryLibraryStore;
    use crate::domain::story::{Language, Subject};
    use crate::infrastructure::adapters::FakeGenerativeClient;
    use crate::infrastructure::memory::InMemoryGenerationTracker;

    struct Harness {
        orchestrator: StoryOrchestrator,
        tracker: Arc<InMemoryGenerationTracker>,
        library: Arc<LibraryCatalog>,
        store: Arc<MemoryLibraryStore>,
    }

    async fn harness(fake: FakeGenerativeClient) -> Harness {
        let tracker = Arc::new(InMemoryGenerationTracker::new());
        let store = Arc::new(MemoryLibraryStore::default());
        let library = Arc::new(LibraryCatalog::load(store.clone()).await);
        let orchestrator = StoryOrchestrator::new(
            Arc::new(fake),
            tracker.clone(),
            library.clone(),
            PipelineSettings::default(),
        );
        Harness {
            orchestrator,
            tracker,
            library,
            store,
        }
    }

    fn robot_params() -> StoryParameters {
        StoryParameters::new("Robot", "Space", "Friendship", Subject::Math, Language::En, None)
            .unwrap()
    }

    #[tokio::test]
    async fn test_story_reaches_ready() {
        let h = harness(FakeGenerativeClient::default()).await;

        let story = h.orchestrator.create(robot_params()).await.unwrap();

        assert_eq!(story.page_count(), 4);
        assert!(story
            .pages()
            .iter()
            .all(|p| !p.illustration().unwrap().is_placeholder()));
        assert_eq!(story.subject(), Subject::Math);

        let status = h.tracker.status();
        assert_eq!(status.status, GenerationStatus::Ready);
        assert_eq!(status.message, "✨ Your story is ready!");

        let snapshot = h.tracker.snapshot().unwrap();
        assert_eq!(snapshot.story.as_ref(), &story);

        let summaries = h.library.summaries().await;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, *story.id());
    }

    #[tokio::test]
    async fn test_short_writer_output_fails_without_touching_library() {
        let h = harness(FakeGenerativeClient::default().with_short_pages(3)).await;

        let err = h.orchestrator.create(robot_params()).await.unwrap_err();
        assert!(matches!(err, GenerationError::WritingFailure(_)));

        let status = h.tracker.status();
        assert_eq!(status.status, GenerationStatus::Error);
        assert_eq!(
            status.message,
            "Oops! The magic sprites got confused. Please try again."
        );
        assert!(h.tracker.snapshot().is_none());
        assert!(h.library.is_empty().await);
        assert_eq!(*h.store.saves.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_image_failure_still_reaches_ready() {
        let h = harness(FakeGenerativeClient::default().fail_images_containing("scene 2")).await;

        let story = h.orchestrator.create(robot_params()).await.unwrap();

        let page2 = &story.pages()[1];
        assert!(page2.illustration().unwrap().is_placeholder());
        assert!(page2.narration().is_some());
        assert_eq!(h.tracker.status().status, GenerationStatus::Ready);
    }

    #[tokio::test]
    async fn test_plan_failure_reports_error() {
        let h = harness(FakeGenerativeClient::default().fail_plan()).await;

        let err = h.orchestrator.create(robot_params()).await.unwrap_err();
        assert!(matches!(err, GenerationError::PlanningFailure(_)));
        assert_eq!(h.tracker.status().status, GenerationStatus::Error);
    }

    #[tokio::test]
    async fn test_game_failure_reports_error() {
        let h = harness(FakeGenerativeClient::default().fail_game()).await;

        let err = h.orchestrator.create(robot_params()).await.unwrap_err();
        assert!(matches!(err, GenerationError::GameFailure(_)));
        assert!(h.tracker.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_snapshots_only_grow_media() {
        let h = harness(FakeGenerativeClient::default()).await;
        let mut rx = h.tracker.subscribe_story();

        let handle = {
            let params = robot_params();
            let orchestrator = h.orchestrator;
            tokio::spawn(async move { orchestrator.create(params).await })
        };

        let mut versions = Vec::new();
        let mut completed = Vec::new();
        while rx.changed().await.is_ok() {
            let Some(snapshot) = rx.borrow_and_update().clone() else {
                continue;
            };
            versions.push(snapshot.version);
            completed.push(
                snapshot
                    .story
                    .pages()
                    .iter()
                    .filter(|p| !p.is_media_pending())
                    .count(),
            );
            if snapshot.story.is_media_complete() {
                break;
            }
        }

        handle.await.unwrap().unwrap();
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
        assert!(completed.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(completed.last(), Some(&4));
    }

    #[tokio::test]
    async fn test_save_failure_still_ready() {
        let tracker = Arc::new(InMemoryGenerationTracker::new());
        let store = Arc::new(MemoryLibraryStore {
            fail_save: true,
            ..Default::default()
        });
        let library = Arc::new(LibraryCatalog::load(store).await);
        let orchestrator = StoryOrchestrator::new(
            Arc::new(FakeGenerativeClient::default()),
            tracker.clone(),
            library.clone(),
            PipelineSettings::default(),
        );

        let story = orchestrator.create(robot_params()).await.unwrap();
        assert_eq!(tracker.status().status, GenerationStatus::Ready);
        assert_eq!(library.len().await, 1);

        let err = orchestrator.save(&story).await.unwrap_err();
        assert!(matches!(err, GenerationError::PersistenceFailure(_)));
    }
}
