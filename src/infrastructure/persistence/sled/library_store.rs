//! Sled-based Library Store Implementation
//!
//! 整个书库序列化为一个 JSON 数组，存放在单个 key 下

use async_trait::async_trait;
use sled::Db;

use crate::application::ports::{LibraryStorePort, PersistenceError};
use crate::domain::story::Story;

const LIBRARY_KEY: &[u8] = b"living_book_library_v2";

/// Sled 书库配置
#[derive(Debug, Clone)]
pub struct SledLibraryConfig {
    /// 数据库路径
    pub db_path: String,
}

impl Default for SledLibraryConfig {
    fn default() -> Self {
        Self {
            db_path: "data/library.sled".to_string(),
        }
    }
}

/// Sled 书库存储
pub struct SledLibraryStore {
    db: Db,
}

impl SledLibraryStore {
    pub fn new(config: &SledLibraryConfig) -> Result<Self, PersistenceError> {
        let db = sled::open(&config.db_path)
            .map_err(|e| PersistenceError::DatabaseError(e.to_string()))?;

        tracing::info!(db_path = %config.db_path, "SledLibraryStore initialized");

        Ok(Self { db })
    }

    /// 原始存储字节
    pub fn raw_library(&self) -> Result<Option<Vec<u8>>, PersistenceError> {
        self.db
            .get(LIBRARY_KEY)
            .map(|v| v.map(|bytes| bytes.to_vec()))
            .map_err(|e| PersistenceError::DatabaseError(e.to_string()))
    }

    #[cfg(test)]
    fn write_raw(&self, bytes: &[u8]) {
        self.db.insert(LIBRARY_KEY, bytes).unwrap();
    }
}

#[async_trait]
impl LibraryStorePort for SledLibraryStore {
    async fn load_library(&self) -> Result<Vec<Story>, PersistenceError> {
        match self.raw_library()? {
            None => Ok(Vec::new()),
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| PersistenceError::Corrupt(e.to_string())),
        }
    }

    async fn save_library(&self, stories: &[Story]) -> Result<(), PersistenceError> {
        let bytes = serde_json::to_vec(stories)
            .map_err(|e| PersistenceError::SerializationError(e.to_string()))?;

        self.db
            .insert(LIBRARY_KEY, bytes.as_slice())
            .map_err(|e| PersistenceError::DatabaseError(e.to_string()))?;
        self.db
            .flush_async()
            .await
            .map_err(|e| PersistenceError::DatabaseError(e.to_string()))?;

        tracing::debug!(count = stories.len(), size = bytes.len(), "Library persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::story::{
        GameKind, Illustration, Language, MiniGame, NarrationAudio, PageDraft, StoryParameters,
        StoryPlan, Subject,
    };
    use tempfile::tempdir;

    fn config(dir: &tempfile::TempDir) -> SledLibraryConfig {
        SledLibraryConfig {
            db_path: dir.path().join("library.sled").to_string_lossy().to_string(),
        }
    }

    fn story(title: &str) -> Story {
        let params =
            StoryParameters::new("Robot", "Space", "", Subject::Science, Language::Id, None).unwrap();
        let plan = StoryPlan::new(title, "Be brave", "a blue robot", vec!["a".into(), "b".into()], 2)
            .unwrap();
        let drafts = vec![
            PageDraft::new(1, "Halo", "a blue robot waving").unwrap(),
            PageDraft::new(2, "Dadah", "a blue robot sleeping").unwrap(),
        ];
        let game = MiniGame::new(GameKind::Quiz, "Kenapa?", vec!["x".into(), "y".into()], 1, "y")
            .unwrap();
        let mut story = Story::assemble(&params, &plan, drafts, game).unwrap();

        let first = story.page(0).unwrap().with_media(
            Illustration::generated("image/jpeg", &[0xFF, 0xD8]),
            Some(NarrationAudio::pcm16(24_000, 1, vec![0, 1, 2, 3])),
        );
        story.replace_page(0, first).unwrap();
        let second = story
            .page(1)
            .unwrap()
            .with_media(Illustration::placeholder("https://picsum.photos", "sleep"), None);
        story.replace_page(1, second).unwrap();
        story
    }

    #[tokio::test]
    async fn test_empty_store_loads_empty() {
        let dir = tempdir().unwrap();
        let store = SledLibraryStore::new(&config(&dir)).unwrap();
        assert!(store.load_library().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_load_round_trip_is_stable() {
        let dir = tempdir().unwrap();
        let store = SledLibraryStore::new(&config(&dir)).unwrap();
        let stories = vec![story("Newest"), story("Oldest")];

        store.save_library(&stories).await.unwrap();
        let first_bytes = store.raw_library().unwrap().unwrap();

        let loaded = store.load_library().await.unwrap();
        assert_eq!(loaded, stories);

        store.save_library(&loaded).await.unwrap();
        assert_eq!(store.raw_library().unwrap().unwrap(), first_bytes);
    }

    #[tokio::test]
    async fn test_corrupt_library_is_reported() {
        let dir = tempdir().unwrap();
        let store = SledLibraryStore::new(&config(&dir)).unwrap();
        store.write_raw(b"{not json");

        assert!(matches!(
            store.load_library().await,
            Err(PersistenceError::Corrupt(_))
        ));
    }
}
