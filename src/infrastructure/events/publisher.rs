//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::ports::GenerationStatus;
use crate::domain::story::StoryId;

/// WebSocket 事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum WsEvent {
    /// 生成状态或进度消息变更
    GenerationStatusChanged {
        status: GenerationStatus,
        message: String,
    },
    /// 进行中的故事有新快照
    StoryUpdated {
        story_id: StoryId,
        version: u64,
        completed_pages: usize,
        page_count: usize,
    },
    /// 故事生成完成
    StoryReady {
        story_id: StoryId,
        title: String,
    },
    /// 故事生成失败
    GenerationFailed {
        message: String,
    },
    /// 阅读会话播放状态变更
    PlaybackStateChanged {
        session_id: String,
        playing: bool,
        page_index: usize,
    },
    /// 阅读会话关闭
    ReadingClosed {
        session_id: String,
        reason: String,
    },
}

/// 事件发布器
pub struct EventPublisher {
    /// session_id -> broadcast sender (for reading-session events)
    session_channels: DashMap<String, broadcast::Sender<WsEvent>>,
    /// Global broadcast channel for generation events
    global_channel: broadcast::Sender<WsEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (global_tx, _) = broadcast::channel(100);
        Self {
            session_channels: DashMap::new(),
            global_channel: global_tx,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅全局生成事件
    pub fn subscribe_global(&self) -> broadcast::Receiver<WsEvent> {
        self.global_channel.subscribe()
    }

    /// 注册会话的事件通道
    pub fn register_session(&self, session_id: &str) -> broadcast::Receiver<WsEvent> {
        if let Some(sender) = self.session_channels.get(session_id) {
            return sender.subscribe();
        }

        let (tx, rx) = broadcast::channel(100);
        self.session_channels.insert(session_id.to_string(), tx);
        rx
    }

    /// 取消注册会话
    pub fn unregister_session(&self, session_id: &str) {
        self.session_channels.remove(session_id);
    }

    /// 获取会话的事件接收器
    pub fn subscribe(&self, session_id: &str) -> Option<broadcast::Receiver<WsEvent>> {
        self.session_channels.get(session_id).map(|s| s.subscribe())
    }

    pub fn publish_status(&self, status: GenerationStatus, message: &str) {
        self.publish_global(WsEvent::GenerationStatusChanged {
            status,
            message: message.to_string(),
        });
    }

    pub fn publish_story_updated(
        &self,
        story_id: StoryId,
        version: u64,
        completed_pages: usize,
        page_count: usize,
    ) {
        self.publish_global(WsEvent::StoryUpdated {
            story_id,
            version,
            completed_pages,
            page_count,
        });
    }

    pub fn publish_story_ready(&self, story_id: StoryId, title: &str) {
        self.publish_global(WsEvent::StoryReady {
            story_id,
            title: title.to_string(),
        });
    }

    pub fn publish_generation_failed(&self, message: &str) {
        self.publish_global(WsEvent::GenerationFailed {
            message: message.to_string(),
        });
    }

    pub fn publish_playback_state(&self, session_id: &str, playing: bool, page_index: usize) {
        self.publish_to_session(
            session_id,
            WsEvent::PlaybackStateChanged {
                session_id: session_id.to_string(),
                playing,
                page_index,
            },
        );
    }

    /// 发布会话关闭事件
    pub fn publish_reading_closed(&self, session_id: &str, reason: &str) {
        self.publish_to_session(
            session_id,
            WsEvent::ReadingClosed {
                session_id: session_id.to_string(),
                reason: reason.to_string(),
            },
        );
    }

    fn publish_global(&self, event: WsEvent) {
        if let Err(e) = self.global_channel.send(event) {
            tracing::debug!(error = %e, "Failed to publish global event (no receivers)");
        }
    }

    /// 发布事件到指定会话
    fn publish_to_session(&self, session_id: &str, event: WsEvent) {
        if let Some(sender) = self.session_channels.get(session_id) {
            if let Err(e) = sender.send(event) {
                tracing::debug!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to publish event (no receivers)"
                );
            }
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
