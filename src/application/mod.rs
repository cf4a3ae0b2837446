//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（GenerativeService、LibraryStore、AudioOutput 等）
//! - stages / orchestrator: 故事生成管线
//! - library: 书库目录
//! - playback: 阅读会话与播放引擎
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod library;
pub mod orchestrator;
pub mod playback;
pub mod ports;
pub mod queries;
pub mod stages;

// Re-exports
pub use commands::{
    handlers::{
        AnswerMiniGameHandler, CreateStoryHandler, ExitReadingHandler, NavigateHandler,
        OpenReadingHandler, PlayPageAudioHandler, StopPageAudioHandler,
    },
    AnswerMiniGame, CreateStory, CreateStoryResponse, ExitReading, Navigate, OpenReading,
    PlayPageAudio, PlayPageAudioResponse, StopPageAudio,
};

pub use error::{ApplicationError, GenerationError};
pub use library::{LibraryCatalog, StoryLookup, StorySummary};
pub use orchestrator::StoryOrchestrator;
pub use playback::{NavigationDirection, PlaybackEngine, ReadingPosition, ReadingSession};

pub use ports::{
    AudioDevicePort, AudioOutputPort, DeviceState, GeneratedImage, GeneratedSpeech,
    GenerationStatus, GenerationTrackerPort, GenerativeServicePort, LibraryStorePort,
    OutputStream, PersistenceError, PlaybackError, ReadingSessionsPort, ServiceError,
    StatusUpdate, StorySnapshot, StructuredRequest, TrackerError,
};

pub use queries::{
    handlers::{
        GetCurrentStoryHandler, GetGenerationStatusHandler, GetPageAudioHandler, GetStoryHandler,
        ListLibraryHandler,
    },
    GetCurrentStory, GetGenerationStatus, GetPageAudio, GetPageAudioResponse, GetStory,
    ListLibrary,
};

pub use stages::PipelineSettings;
