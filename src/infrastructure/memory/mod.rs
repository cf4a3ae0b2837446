//! Memory Layer - In-Memory State Management
//!
//! 实现 GenerationTracker 和 ReadingSessions，管理生成状态和阅读会话的内存状态

mod generation_tracker;
mod reading_sessions;

pub use generation_tracker::InMemoryGenerationTracker;
pub use reading_sessions::InMemoryReadingSessions;
