//! HTTP Handlers

mod library;
mod media;
mod ping;
mod reading;
mod story;
mod websocket;

pub use library::*;
pub use media::*;
pub use ping::*;
pub use reading::*;
pub use story::*;
pub use websocket::*;
