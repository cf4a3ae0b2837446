//! Generative Adapter - Gemini 客户端与 Fake 客户端

mod fake_client;
mod gemini_client;

pub use fake_client::{
    FakeGenerativeClient, FakeGenerativeClientConfig, ServiceCall, FAKE_VISUAL_DESCRIPTION,
};
pub use gemini_client::{GeminiClient, GeminiClientConfig};
