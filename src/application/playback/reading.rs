//! 阅读会话
//!
//! 页面游标取值 0..=page_count，page_count 表示小游戏页。
//! 每次翻页先撤销待定的自动播放并停止音频，再移动游标，然后按需安排自动播放

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::PlaybackEngine;
use crate::application::ports::{AudioOutputPort, PlaybackError};
use crate::domain::story::{AnswerOutcome, Story, StoryError, StoryId};

/// 翻页方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationDirection {
    Next,
    Previous,
    /// 直接跳到小游戏页
    MiniGame,
}

/// 当前阅读位置
#[derive(Debug, Clone, Serialize)]
pub struct ReadingPosition {
    pub session_id: String,
    pub story_id: StoryId,
    pub page_index: usize,
    pub page_count: usize,
    pub on_mini_game: bool,
    pub has_narration: bool,
    pub playing: bool,
}

pub struct ReadingSession {
    id: String,
    story: RwLock<Arc<Story>>,
    page_index: Mutex<usize>,
    engine: Arc<PlaybackEngine>,
    autoplay: Mutex<Option<JoinHandle<()>>>,
    autoplay_delay: Duration,
    created_at: DateTime<Utc>,
}

impl ReadingSession {
    /// 打开第 1 页；有旁白时安排自动播放
    pub fn open(
        story: Arc<Story>,
        output: Arc<dyn AudioOutputPort>,
        autoplay_delay: Duration,
    ) -> Self {
        let session = Self {
            id: Uuid::new_v4().to_string(),
            story: RwLock::new(story),
            page_index: Mutex::new(0),
            engine: Arc::new(PlaybackEngine::new(output)),
            autoplay: Mutex::new(None),
            autoplay_delay,
            created_at: Utc::now(),
        };
        session.schedule_autoplay(0);
        session
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn story(&self) -> Arc<Story> {
        self.story.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn engine(&self) -> &Arc<PlaybackEngine> {
        &self.engine
    }

    /// 生成仍在进行时，用更新后的快照替换故事（同一个故事才替换）
    pub fn refresh_story(&self, story: Arc<Story>) {
        let mut current = self.story.write().unwrap_or_else(|e| e.into_inner());
        if current.id() == story.id() {
            *current = story;
        }
    }

    pub fn page_index(&self) -> usize {
        *self.page_index.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn position(&self) -> ReadingPosition {
        let story = self.story();
        let page_index = self.page_index();
        ReadingPosition {
            session_id: self.id.clone(),
            story_id: *story.id(),
            page_index,
            page_count: story.page_count(),
            on_mini_game: page_index >= story.page_count(),
            has_narration: story
                .page(page_index)
                .and_then(|p| p.narration())
                .is_some(),
            playing: self.engine.is_playing(),
        }
    }

    /// 翻页
    ///
    /// 撤销自动播放并停止音频发生在其他任何副作用之前；到达边界时游标保持不变
    pub fn navigate(&self, direction: NavigationDirection) -> ReadingPosition {
        self.cancel_autoplay();
        self.engine.stop();

        let page_count = self.story().page_count();
        let index = {
            let mut index = self.page_index.lock().unwrap_or_else(|e| e.into_inner());
            *index = match direction {
                NavigationDirection::Next => (*index + 1).min(page_count),
                NavigationDirection::Previous => index.saturating_sub(1),
                NavigationDirection::MiniGame => page_count,
            };
            *index
        };
        tracing::debug!(session_id = %self.id, page_index = index, "Page changed");

        self.schedule_autoplay(index);
        self.position()
    }

    /// 播放当前页旁白；当前页没有旁白时返回 false
    pub async fn play_current(&self) -> Result<bool, PlaybackError> {
        self.cancel_autoplay();
        let story = self.story();
        let Some(audio) = story.page(self.page_index()).and_then(|p| p.narration()) else {
            return Ok(false);
        };
        self.engine.play(audio).await?;
        Ok(true)
    }

    pub fn stop(&self) {
        self.cancel_autoplay();
        self.engine.stop();
    }

    /// 在小游戏页作答
    pub fn answer(&self, selected_index: usize) -> Result<AnswerOutcome, StoryError> {
        self.story().game().check_answer(selected_index)
    }

    /// 退出阅读：停止音频并释放设备
    pub fn exit(&self) {
        self.cancel_autoplay();
        self.engine.shutdown();
        tracing::info!(session_id = %self.id, "Reading session closed");
    }

    fn schedule_autoplay(&self, index: usize) {
        let story = self.story();
        let Some(audio) = story.page(index).and_then(|p| p.narration()).cloned() else {
            return;
        };

        let engine = self.engine.clone();
        let epoch = engine.epoch();
        let delay = self.autoplay_delay;
        let session_id = self.id.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match engine.play_if_current(&audio, epoch).await {
                Ok(true) => {}
                Ok(false) => tracing::debug!(session_id = %session_id, "Autoplay superseded"),
                Err(e) => tracing::warn!(session_id = %session_id, error = %e, "Autoplay failed"),
            }
        });

        let mut slot = self.autoplay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    fn cancel_autoplay(&self) {
        let mut slot = self.autoplay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

impl Drop for ReadingSession {
    fn drop(&mut self) {
        self.cancel_autoplay();
    }
}
