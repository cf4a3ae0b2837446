//! Generation Worker - Background Story Generation
//!
//! 从队列消费已经 begin 的生成请求，逐个执行

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::StoryOrchestrator;
use crate::domain::story::StoryParameters;

/// 生成 Worker
///
/// 同一时间只执行一轮生成
pub struct GenerationWorker {
    queue_receiver: mpsc::Receiver<StoryParameters>,
    orchestrator: Arc<StoryOrchestrator>,
}

impl GenerationWorker {
    pub fn new(
        queue_receiver: mpsc::Receiver<StoryParameters>,
        orchestrator: Arc<StoryOrchestrator>,
    ) -> Self {
        Self {
            queue_receiver,
            orchestrator,
        }
    }

    /// 启动 Worker
    pub async fn run(mut self) {
        tracing::info!("GenerationWorker started");

        while let Some(params) = self.queue_receiver.recv().await {
            tracing::info!(
                character = %params.character(),
                setting = %params.setting(),
                subject = params.subject().as_str(),
                language = params.language().as_str(),
                "Generating story"
            );

            match self.orchestrator.run(params).await {
                Ok(story) => {
                    tracing::info!(story_id = %story.id(), title = %story.title(), "Story generated")
                }
                Err(e) => tracing::warn!(error = %e, "Story generation ended with error"),
            }
        }

        tracing::info!("GenerationWorker stopped");
    }
}
