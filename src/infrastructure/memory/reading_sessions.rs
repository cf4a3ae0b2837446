//! In-Memory Reading Sessions Implementation

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::application::playback::ReadingSession;
use crate::application::ports::{AudioDevicePort, PlaybackError, ReadingSessionsPort};
use crate::domain::story::Story;
use crate::infrastructure::events::EventPublisher;

/// 内存阅读会话管理器
pub struct InMemoryReadingSessions {
    sessions: DashMap<String, Arc<ReadingSession>>,
    devices: Arc<dyn AudioDevicePort>,
    events: Arc<EventPublisher>,
    autoplay_delay: Duration,
}

impl InMemoryReadingSessions {
    pub fn new(
        devices: Arc<dyn AudioDevicePort>,
        events: Arc<EventPublisher>,
        autoplay_delay: Duration,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            devices,
            events,
            autoplay_delay,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn shutdown(&self, session: &ReadingSession, reason: &str) {
        session.exit();
        self.events.publish_reading_closed(session.id(), reason);
        self.events.unregister_session(session.id());
    }

    /// 把播放状态变化转发为会话事件；引擎释放后任务自动结束
    fn forward_playback_state(&self, session: &Arc<ReadingSession>) {
        let mut playing = session.engine().subscribe();
        let events = self.events.clone();
        let weak = Arc::downgrade(session);
        let session_id = session.id().to_string();

        tokio::spawn(async move {
            while playing.changed().await.is_ok() {
                let is_playing = *playing.borrow_and_update();
                let Some(session) = weak.upgrade() else {
                    break;
                };
                events.publish_playback_state(&session_id, is_playing, session.page_index());
            }
        });
    }
}

impl ReadingSessionsPort for InMemoryReadingSessions {
    fn open(&self, story: Arc<Story>) -> Result<Arc<ReadingSession>, PlaybackError> {
        let previous: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        for id in previous {
            if let Some((_, session)) = self.sessions.remove(&id) {
                self.shutdown(&session, "replaced");
            }
        }

        let output = self.devices.acquire()?;
        let session = Arc::new(ReadingSession::open(story, output, self.autoplay_delay));
        self.events.register_session(session.id());
        self.forward_playback_state(&session);
        self.sessions.insert(session.id().to_string(), session.clone());

        tracing::info!(session_id = %session.id(), "Reading session registered");
        Ok(session)
    }

    fn get(&self, id: &str) -> Option<Arc<ReadingSession>> {
        self.sessions.get(id).map(|s| s.clone())
    }

    fn close(&self, id: &str) -> Option<Arc<ReadingSession>> {
        let (_, session) = self.sessions.remove(id)?;
        self.shutdown(&session, "exited");
        Some(session)
    }

    fn active_count(&self) -> usize {
        self.sessions.len()
    }
}
