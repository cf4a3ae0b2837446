//! 阅读与音频播放
//!
//! - engine: 单一活动输出的播放引擎
//! - reading: 翻页、自动播放与小游戏作答

mod engine;
mod reading;

pub use engine::PlaybackEngine;
pub use reading::{NavigationDirection, ReadingPosition, ReadingSession};
