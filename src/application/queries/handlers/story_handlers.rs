//! Story Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::library::{LibraryCatalog, StorySummary, StoryLookup};
use crate::application::ports::{GenerationTrackerPort, StatusUpdate, StorySnapshot};
use crate::application::queries::story_queries::*;
use crate::domain::story::Story;

/// GetGenerationStatus Handler
pub struct GetGenerationStatusHandler {
    tracker: Arc<dyn GenerationTrackerPort>,
}

impl GetGenerationStatusHandler {
    pub fn new(tracker: Arc<dyn GenerationTrackerPort>) -> Self {
        Self { tracker }
    }

    pub async fn handle(&self, _query: GetGenerationStatus) -> Result<StatusUpdate, ApplicationError> {
        Ok(self.tracker.status())
    }
}

/// GetCurrentStory Handler
pub struct GetCurrentStoryHandler {
    tracker: Arc<dyn GenerationTrackerPort>,
}

impl GetCurrentStoryHandler {
    pub fn new(tracker: Arc<dyn GenerationTrackerPort>) -> Self {
        Self { tracker }
    }

    pub async fn handle(&self, _query: GetCurrentStory) -> Result<StorySnapshot, ApplicationError> {
        self.tracker
            .snapshot()
            .ok_or_else(|| ApplicationError::invalid_state("no story has been generated yet"))
    }
}

/// ListLibrary Handler
pub struct ListLibraryHandler {
    library: Arc<LibraryCatalog>,
}

impl ListLibraryHandler {
    pub fn new(library: Arc<LibraryCatalog>) -> Self {
        Self { library }
    }

    pub async fn handle(&self, _query: ListLibrary) -> Result<Vec<StorySummary>, ApplicationError> {
        Ok(self.library.summaries().await)
    }
}

/// GetStory Handler
pub struct GetStoryHandler {
    lookup: StoryLookup,
}

impl GetStoryHandler {
    pub fn new(lookup: StoryLookup) -> Self {
        Self { lookup }
    }

    pub async fn handle(&self, query: GetStory) -> Result<Arc<Story>, ApplicationError> {
        self.lookup
            .find(&query.story_id)
            .await
            .ok_or_else(|| ApplicationError::not_found("Story", query.story_id))
    }
}

/// GetPageAudio Handler
pub struct GetPageAudioHandler {
    lookup: StoryLookup,
}

impl GetPageAudioHandler {
    pub fn new(lookup: StoryLookup) -> Self {
        Self { lookup }
    }

    pub async fn handle(&self, query: GetPageAudio) -> Result<GetPageAudioResponse, ApplicationError> {
        let story = self
            .lookup
            .find(&query.story_id)
            .await
            .ok_or_else(|| ApplicationError::not_found("Story", query.story_id))?;

        let page = story.page_by_number(query.page_number).ok_or_else(|| {
            ApplicationError::not_found("Page", format!("{}:{}", query.story_id, query.page_number))
        })?;

        let audio = page.narration().cloned().ok_or_else(|| {
            ApplicationError::not_found(
                "Narration",
                format!("{}:{}", query.story_id, query.page_number),
            )
        })?;

        Ok(GetPageAudioResponse {
            story_id: query.story_id,
            page_number: query.page_number,
            audio,
        })
    }
}
