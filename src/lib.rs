//! Storyloom - 儿童有声绘本生成与阅读服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Story Context: 故事、页面、小游戏、生成参数
//!
//! 应用层 (application/):
//! - Ports: 端口定义（GenerativeService, LibraryStore, AudioOutput, GenerationTracker, ReadingSessions）
//! - Stages / Orchestrator: plan → writer → game → media 生成管线
//! - Playback: 阅读会话与旁白播放
//! - Commands / Queries: CQRS 处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Memory: GenerationTracker, ReadingSessions 内存实现
//! - Worker: GenerationWorker 后台生成
//! - Persistence: Sled 书库
//! - Adapters: Gemini / Fake 生成服务, 音频解码与输出设备
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
