//! 书库目录
//!
//! 启动时尽力读取一次持久化书库；之后以内存集合为准，
//! 新故事插到最前面并整体写回

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::application::ports::{GenerationTrackerPort, LibraryStorePort, PersistenceError};
use crate::domain::story::{Language, Story, StoryId, Subject};

/// 书库列表项
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorySummary {
    pub id: StoryId,
    pub title: String,
    pub theme: String,
    pub subject: Subject,
    pub language: Language,
    pub created_at: DateTime<Utc>,
    pub page_count: usize,
    /// 第一页插图
    pub cover: Option<String>,
}

impl From<&Story> for StorySummary {
    fn from(story: &Story) -> Self {
        Self {
            id: *story.id(),
            title: story.title().to_string(),
            theme: story.theme().to_string(),
            subject: story.subject(),
            language: story.language(),
            created_at: story.created_at(),
            page_count: story.page_count(),
            cover: story
                .page(0)
                .and_then(|p| p.illustration())
                .map(|i| i.source().to_string()),
        }
    }
}

pub struct LibraryCatalog {
    store: Arc<dyn LibraryStorePort>,
    stories: RwLock<Vec<Arc<Story>>>,
}

impl LibraryCatalog {
    /// 读取持久化书库；读取失败或数据损坏时以空书库启动
    pub async fn load(store: Arc<dyn LibraryStorePort>) -> Self {
        let stories = match store.load_library().await {
            Ok(stories) => {
                tracing::info!(count = stories.len(), "Library loaded");
                stories.into_iter().map(Arc::new).collect()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load library, starting empty");
                Vec::new()
            }
        };

        Self {
            store,
            stories: RwLock::new(stories),
        }
    }

    pub async fn summaries(&self) -> Vec<StorySummary> {
        self.stories
            .read()
            .await
            .iter()
            .map(|s| StorySummary::from(s.as_ref()))
            .collect()
    }

    pub async fn find(&self, id: &StoryId) -> Option<Arc<Story>> {
        self.stories
            .read()
            .await
            .iter()
            .find(|s| s.id() == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.stories.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.stories.read().await.is_empty()
    }

    /// 新故事插到最前面并整体保存
    ///
    /// 保存失败时内存中的书库仍然包含该故事
    pub async fn prepend_and_save(&self, story: Story) -> Result<(), PersistenceError> {
        let mut stories = self.stories.write().await;
        stories.insert(0, Arc::new(story));

        let snapshot: Vec<Story> = stories.iter().map(|s| s.as_ref().clone()).collect();
        self.store.save_library(&snapshot).await.map_err(|e| {
            tracing::warn!(error = %e, count = snapshot.len(), "Failed to save library");
            e
        })?;

        tracing::debug!(count = snapshot.len(), "Library saved");
        Ok(())
    }
}

/// 按 id 查找故事：先查进行中的快照，再查书库
#[derive(Clone)]
pub struct StoryLookup {
    tracker: Arc<dyn GenerationTrackerPort>,
    library: Arc<LibraryCatalog>,
}

impl StoryLookup {
    pub fn new(tracker: Arc<dyn GenerationTrackerPort>, library: Arc<LibraryCatalog>) -> Self {
        Self { tracker, library }
    }

    pub async fn find(&self, id: &StoryId) -> Option<Arc<Story>> {
        if let Some(snapshot) = self.tracker.snapshot() {
            if snapshot.story.id() == id {
                return Some(snapshot.story);
            }
        }
        self.library.find(id).await
    }

    /// 最近一次生成的故事（可能仍在生成插图）
    pub fn current(&self) -> Option<Arc<Story>> {
        self.tracker.snapshot().map(|s| s.story)
    }
}
