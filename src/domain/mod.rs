//! Domain Layer - 领域层
//!
//! 限界上下文:
//! - Story Context: 绘本故事（计划、页面、小游戏、媒体）

pub mod story;
