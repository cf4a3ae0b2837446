//! Story Context - 故事限界上下文
//!
//! 职责:
//! - 故事聚合（页面、小游戏）
//! - 生成参数与故事计划
//! - 插图/旁白值对象

mod aggregate;
mod entities;
mod errors;
mod parameters;
mod plan;
mod progress;
mod value_objects;

pub use aggregate::Story;
pub use entities::{AnswerOutcome, MiniGame, Page, PageDraft};
pub use errors::StoryError;
pub use parameters::StoryParameters;
pub use plan::StoryPlan;
pub use progress::{progress_message, ProgressStep};
pub use value_objects::{
    AudioEncoding, GameKind, Illustration, Language, NarrationAudio, StoryId, Subject,
    DEFAULT_SPEECH_SAMPLE_RATE,
};
