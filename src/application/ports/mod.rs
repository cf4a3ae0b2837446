//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_output;
mod generation_tracker;
mod generative_service;
mod library_store;
mod reading_sessions;

pub use audio_output::{AudioDevicePort, AudioOutputPort, DeviceState, OutputStream, PlaybackError};
pub use generation_tracker::{
    GenerationStatus, GenerationTrackerPort, StatusUpdate, StorySnapshot, TrackerError,
};
pub use generative_service::{
    GeneratedImage, GeneratedSpeech, GenerativeServicePort, ServiceError, StructuredRequest,
};
pub use library_store::{LibraryStorePort, PersistenceError};
pub use reading_sessions::ReadingSessionsPort;
