//! Application State
//!
//! 持有端口实现与所有 Command/Query Handlers

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::{
    // Command handlers
    AnswerMiniGameHandler, CreateStoryHandler, ExitReadingHandler, NavigateHandler,
    OpenReadingHandler, PlayPageAudioHandler, StopPageAudioHandler,
    // Query handlers
    GetCurrentStoryHandler, GetGenerationStatusHandler, GetPageAudioHandler, GetStoryHandler,
    ListLibraryHandler,
    // Ports
    GenerationTrackerPort, LibraryCatalog, ReadingSessionsPort, StoryLookup,
};
use crate::domain::story::StoryParameters;
use crate::infrastructure::events::EventPublisher;

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub tracker: Arc<dyn GenerationTrackerPort>,
    pub library: Arc<LibraryCatalog>,
    pub sessions: Arc<dyn ReadingSessionsPort>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub create_story_handler: CreateStoryHandler,
    pub open_reading_handler: OpenReadingHandler,
    pub navigate_handler: NavigateHandler,
    pub play_page_audio_handler: PlayPageAudioHandler,
    pub stop_page_audio_handler: StopPageAudioHandler,
    pub exit_reading_handler: ExitReadingHandler,
    pub answer_mini_game_handler: AnswerMiniGameHandler,

    // ========== Query Handlers ==========
    pub get_generation_status_handler: GetGenerationStatusHandler,
    pub get_current_story_handler: GetCurrentStoryHandler,
    pub list_library_handler: ListLibraryHandler,
    pub get_story_handler: GetStoryHandler,
    pub get_page_audio_handler: GetPageAudioHandler,
}

impl AppState {
    /// 创建应用状态
    ///
    /// `generation_queue` 的接收端由 GenerationWorker 持有
    pub fn new(
        tracker: Arc<dyn GenerationTrackerPort>,
        library: Arc<LibraryCatalog>,
        sessions: Arc<dyn ReadingSessionsPort>,
        event_publisher: Arc<EventPublisher>,
        generation_queue: mpsc::Sender<StoryParameters>,
    ) -> Self {
        let lookup = StoryLookup::new(tracker.clone(), library.clone());

        Self {
            // Command handlers
            create_story_handler: CreateStoryHandler::new(tracker.clone(), generation_queue),
            open_reading_handler: OpenReadingHandler::new(sessions.clone(), lookup.clone()),
            navigate_handler: NavigateHandler::new(sessions.clone(), lookup.clone()),
            play_page_audio_handler: PlayPageAudioHandler::new(sessions.clone(), lookup.clone()),
            stop_page_audio_handler: StopPageAudioHandler::new(sessions.clone()),
            exit_reading_handler: ExitReadingHandler::new(sessions.clone()),
            answer_mini_game_handler: AnswerMiniGameHandler::new(sessions.clone()),

            // Query handlers
            get_generation_status_handler: GetGenerationStatusHandler::new(tracker.clone()),
            get_current_story_handler: GetCurrentStoryHandler::new(tracker.clone()),
            list_library_handler: ListLibraryHandler::new(library.clone()),
            get_story_handler: GetStoryHandler::new(lookup.clone()),
            get_page_audio_handler: GetPageAudioHandler::new(lookup),

            // Ports
            tracker,
            library,
            sessions,
            event_publisher,
        }
    }
}
