//! In-Memory Generation Tracker Implementation
//!
//! 状态与故事快照各用一个 watch 通道保存；迁移检查与写入在同一把锁内完成

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::application::ports::{
    GenerationStatus, GenerationTrackerPort, StatusUpdate, StorySnapshot, TrackerError,
};
use crate::domain::story::{Language, Story};
use crate::infrastructure::events::EventPublisher;

/// 内存生成状态跟踪器
pub struct InMemoryGenerationTracker {
    status_tx: watch::Sender<StatusUpdate>,
    story_tx: watch::Sender<Option<StorySnapshot>>,
    version: AtomicU64,
    transition_lock: Mutex<()>,
    events: Option<Arc<EventPublisher>>,
}

impl InMemoryGenerationTracker {
    pub fn new() -> Self {
        let (status_tx, _) = watch::channel(StatusUpdate::idle());
        let (story_tx, _) = watch::channel(None);
        Self {
            status_tx,
            story_tx,
            version: AtomicU64::new(0),
            transition_lock: Mutex::new(()),
            events: None,
        }
    }

    /// 状态变更同时推送 WebSocket 事件
    pub fn with_events(mut self, events: Arc<EventPublisher>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn apply(&self, status: GenerationStatus, message: String, language: Option<Language>) {
        let language = language.or(self.status_tx.borrow().language);
        self.status_tx.send_replace(StatusUpdate {
            status,
            message: message.clone(),
            language,
            updated_at: Utc::now(),
        });
        tracing::info!(status = status.as_str(), message = %message, "Generation status changed");

        if let Some(events) = &self.events {
            events.publish_status(status, &message);
            match status {
                GenerationStatus::Ready => {
                    if let Some(snapshot) = self.snapshot() {
                        events.publish_story_ready(*snapshot.story.id(), snapshot.story.title());
                    }
                }
                GenerationStatus::Error => events.publish_generation_failed(&message),
                _ => {}
            }
        }
    }
}

impl Default for InMemoryGenerationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationTrackerPort for InMemoryGenerationTracker {
    fn begin(&self, language: Language, message: String) -> Result<(), TrackerError> {
        let _guard = self.transition_lock.lock().unwrap_or_else(|e| e.into_inner());

        let current = self.status_tx.borrow().status;
        if current.is_in_progress() {
            return Err(TrackerError::Busy(current));
        }
        if current.is_terminal() {
            tracing::debug!(from = current.as_str(), "Resetting tracker for new attempt");
        }

        self.story_tx.send_replace(None);
        self.apply(GenerationStatus::Writing, message, Some(language));
        Ok(())
    }

    fn transition(&self, next: GenerationStatus, message: String) -> Result<(), TrackerError> {
        let _guard = self.transition_lock.lock().unwrap_or_else(|e| e.into_inner());

        let current = self.status_tx.borrow().status;
        if !current.can_transition_to(next) {
            return Err(TrackerError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        self.apply(next, message, None);
        Ok(())
    }

    fn set_message(&self, message: String) {
        let _guard = self.transition_lock.lock().unwrap_or_else(|e| e.into_inner());
        let status = self.status_tx.borrow().status;
        self.apply(status, message, None);
    }

    fn status(&self) -> StatusUpdate {
        self.status_tx.borrow().clone()
    }

    fn publish_story(&self, story: Story) -> u64 {
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let completed_pages = story.pages().iter().filter(|p| !p.is_media_pending()).count();
        let page_count = story.page_count();
        let story_id = *story.id();

        self.story_tx.send_replace(Some(StorySnapshot {
            version,
            story: Arc::new(story),
        }));

        if let Some(events) = &self.events {
            events.publish_story_updated(story_id, version, completed_pages, page_count);
        }
        version
    }

    fn snapshot(&self) -> Option<StorySnapshot> {
        self.story_tx.borrow().clone()
    }

    fn subscribe_status(&self) -> watch::Receiver<StatusUpdate> {
        self.status_tx.subscribe()
    }

    fn subscribe_story(&self) -> watch::Receiver<Option<StorySnapshot>> {
        self.story_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::events::WsEvent;

    #[test]
    fn test_begin_rejects_while_in_progress() {
        let tracker = InMemoryGenerationTracker::new();
        tracker.begin(Language::En, "planning".into()).unwrap();

        assert_eq!(
            tracker.begin(Language::En, "again".into()),
            Err(TrackerError::Busy(GenerationStatus::Writing))
        );

        tracker
            .transition(GenerationStatus::Illustrating, "painting".into())
            .unwrap();
        assert_eq!(
            tracker.begin(Language::En, "again".into()),
            Err(TrackerError::Busy(GenerationStatus::Illustrating))
        );
    }

    #[test]
    fn test_terminal_state_allows_new_attempt() {
        let tracker = InMemoryGenerationTracker::new();
        tracker.begin(Language::Id, "a".into()).unwrap();
        tracker.transition(GenerationStatus::Error, "oops".into()).unwrap();

        tracker.begin(Language::En, "b".into()).unwrap();
        let status = tracker.status();
        assert_eq!(status.status, GenerationStatus::Writing);
        assert_eq!(status.language, Some(Language::En));
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let tracker = InMemoryGenerationTracker::new();
        assert!(matches!(
            tracker.transition(GenerationStatus::Ready, "x".into()),
            Err(TrackerError::InvalidTransition { .. })
        ));
        assert_eq!(tracker.status().status, GenerationStatus::Idle);
    }

    #[test]
    fn test_set_message_keeps_status() {
        let tracker = InMemoryGenerationTracker::new();
        tracker.begin(Language::En, "a".into()).unwrap();
        tracker.set_message("b".into());

        let status = tracker.status();
        assert_eq!(status.status, GenerationStatus::Writing);
        assert_eq!(status.message, "b");
    }

    #[tokio::test]
    async fn test_status_events_published() {
        let events = EventPublisher::new().arc();
        let mut rx = events.subscribe_global();
        let tracker = InMemoryGenerationTracker::new().with_events(events);

        tracker.begin(Language::En, "planning".into()).unwrap();

        match rx.recv().await.unwrap() {
            WsEvent::GenerationStatusChanged { status, message } => {
                assert_eq!(status, GenerationStatus::Writing);
                assert_eq!(message, "planning");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
