//! Fake Generative Client - 不调用外部服务的生成客户端
//!
//! 返回固定的故事素材，记录每一次调用，并支持按需注入失败

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;

use crate::application::ports::{
    GeneratedImage, GeneratedSpeech, GenerativeServicePort, ServiceError, StructuredRequest,
};
use crate::domain::story::{Language, DEFAULT_SPEECH_SAMPLE_RATE};

/// 固定的角色外观描述，出现在每一页的插图提示词中
pub const FAKE_VISUAL_DESCRIPTION: &str = "a small round robot painted sky blue with a yellow antenna";

/// JPEG 文件头，足以表示一张"插图"
const FAKE_JPEG: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];

/// Fake Generative Client 配置
#[derive(Debug, Clone)]
pub struct FakeGenerativeClientConfig {
    /// 返回的页数
    pub page_count: usize,
    /// 每次请求的模拟延迟（毫秒）
    pub latency_ms: u64,
    /// 朗读音频时长（毫秒）
    pub speech_ms: u64,
}

impl Default for FakeGenerativeClientConfig {
    fn default() -> Self {
        Self {
            page_count: 4,
            latency_ms: 0,
            speech_ms: 400,
        }
    }
}

/// 一次服务调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    Plan,
    Pages,
    Game,
    Image { prompt: String },
    Speech { text: String },
}

#[derive(Debug, Default)]
struct Faults {
    fail_plan: bool,
    fail_game: bool,
    short_pages: Option<usize>,
    image_marker: Option<String>,
    speech_marker: Option<String>,
}

/// Fake Generative Client
pub struct FakeGenerativeClient {
    config: FakeGenerativeClientConfig,
    faults: Faults,
    calls: Mutex<Vec<ServiceCall>>,
}

impl FakeGenerativeClient {
    pub fn new(config: FakeGenerativeClientConfig) -> Self {
        tracing::info!(
            page_count = config.page_count,
            latency_ms = config.latency_ms,
            "FakeGenerativeClient initialized"
        );
        Self {
            config,
            faults: Faults::default(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 规划请求返回空响应
    pub fn fail_plan(mut self) -> Self {
        self.faults.fail_plan = true;
        self
    }

    /// 小游戏请求返回空响应
    pub fn fail_game(mut self) -> Self {
        self.faults.fail_game = true;
        self
    }

    /// 写作请求只返回 `pages` 页
    pub fn with_short_pages(mut self, pages: usize) -> Self {
        self.faults.short_pages = Some(pages);
        self
    }

    /// 提示词包含 `marker` 的插图请求失败
    pub fn fail_images_containing(mut self, marker: impl Into<String>) -> Self {
        self.faults.image_marker = Some(marker.into());
        self
    }

    /// 正文包含 `marker` 的朗读请求失败
    pub fn fail_speech_containing(mut self, marker: impl Into<String>) -> Self {
        self.faults.speech_marker = Some(marker.into());
        self
    }

    /// 按顺序记录的调用
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, call: ServiceCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }
    }

    fn plan(&self) -> Value {
        let outline: Vec<String> = (1..=self.config.page_count)
            .map(|n| format!("Robo meets friend number {} among the stars.", n))
            .collect();
        json!({
            "title": "Robo Counts the Stars",
            "moral": "Friends make every job easier.",
            "characterVisualDescription": FAKE_VISUAL_DESCRIPTION,
            "plotOutline": outline
        })
    }

    fn pages(&self) -> Value {
        let count = self.faults.short_pages.unwrap_or(self.config.page_count);
        let pages: Vec<Value> = (1..=count)
            .map(|n| {
                json!({
                    "pageNumber": n,
                    "text": format!("Page {}: Robo floated past {} shining stars and counted them all.", n, n * 2),
                    "imagePrompt": format!("{}, scene {}, floating in space, 3D Pixar style", FAKE_VISUAL_DESCRIPTION, n)
                })
            })
            .collect();
        json!({ "pages": pages })
    }

    fn game(&self) -> Value {
        json!({
            "type": "math_challenge",
            "question": "Robo saw 2 stars and then 3 more. How many stars did Robo see?",
            "options": ["4", "5", "6"],
            "correctAnswerIndex": 1,
            "explanation": "2 + 3 = 5"
        })
    }

    /// 指定时长的 16 位单声道静音
    fn silence(&self) -> Vec<u8> {
        let samples = DEFAULT_SPEECH_SAMPLE_RATE as u64 * self.config.speech_ms / 1000;
        vec![0u8; samples as usize * 2]
    }
}

impl Default for FakeGenerativeClient {
    fn default() -> Self {
        Self::new(FakeGenerativeClientConfig::default())
    }
}

fn matches_marker(marker: &Option<String>, text: &str) -> bool {
    marker.as_deref().map(|m| text.contains(m)).unwrap_or(false)
}

#[async_trait]
impl GenerativeServicePort for FakeGenerativeClient {
    async fn request_structured_plan(&self, _request: StructuredRequest) -> Result<Value, ServiceError> {
        self.record(ServiceCall::Plan);
        self.simulate_latency().await;

        if self.faults.fail_plan {
            return Err(ServiceError::EmptyResponse);
        }
        Ok(self.plan())
    }

    async fn request_structured_content(
        &self,
        request: StructuredRequest,
    ) -> Result<Value, ServiceError> {
        let is_pages = request.required_fields().contains(&"pages");
        self.record(if is_pages {
            ServiceCall::Pages
        } else {
            ServiceCall::Game
        });
        self.simulate_latency().await;

        if is_pages {
            Ok(self.pages())
        } else if self.faults.fail_game {
            Err(ServiceError::EmptyResponse)
        } else {
            Ok(self.game())
        }
    }

    async fn request_image(&self, prompt: &str) -> Result<GeneratedImage, ServiceError> {
        self.record(ServiceCall::Image {
            prompt: prompt.to_string(),
        });
        self.simulate_latency().await;

        if matches_marker(&self.faults.image_marker, prompt) {
            return Err(ServiceError::ServiceError("HTTP 500: image model overloaded".to_string()));
        }
        Ok(GeneratedImage {
            mime_type: "image/jpeg".to_string(),
            data: FAKE_JPEG.to_vec(),
        })
    }

    async fn request_speech(
        &self,
        text: &str,
        language: Language,
    ) -> Result<GeneratedSpeech, ServiceError> {
        self.record(ServiceCall::Speech {
            text: text.to_string(),
        });
        self.simulate_latency().await;

        if matches_marker(&self.faults.speech_marker, text) {
            return Err(ServiceError::ServiceError("HTTP 500: speech model overloaded".to_string()));
        }

        tracing::debug!(language = language.as_str(), text_len = text.len(), "FakeGenerativeClient: returning silence");
        Ok(GeneratedSpeech {
            mime_type: format!("audio/L16;codec=pcm;rate={}", DEFAULT_SPEECH_SAMPLE_RATE),
            data: self.silence(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_calls_recorded_in_order() {
        let fake = FakeGenerativeClient::default();
        fake.request_image("a").await.unwrap();
        fake.request_speech("b", Language::En).await.unwrap();

        assert_eq!(
            fake.calls(),
            vec![
                ServiceCall::Image { prompt: "a".to_string() },
                ServiceCall::Speech { text: "b".to_string() },
            ]
        );
    }

    #[tokio::test]
    async fn test_pages_and_game_told_apart_by_schema() {
        let fake = FakeGenerativeClient::default().with_short_pages(2);
        let pages = fake
            .request_structured_content(StructuredRequest::new("", "", json!({"required": ["pages"]})))
            .await
            .unwrap();
        assert_eq!(pages["pages"].as_array().unwrap().len(), 2);

        let game = fake
            .request_structured_content(StructuredRequest::new("", "", json!({"required": ["question"]})))
            .await
            .unwrap();
        assert_eq!(game["correctAnswerIndex"], 1);
    }

    #[tokio::test]
    async fn test_speech_is_pcm_silence() {
        let fake = FakeGenerativeClient::default();
        let speech = fake.request_speech("hello", Language::Id).await.unwrap();
        assert_eq!(speech.data.len(), 24_000 * 400 / 1000 * 2);
        assert!(speech.data.iter().all(|&b| b == 0));
    }

    #[tokio::test]
    async fn test_image_fault_injection() {
        let fake = FakeGenerativeClient::default().fail_images_containing("scene 2");
        assert!(fake.request_image("robot, scene 1").await.is_ok());
        assert!(fake.request_image("robot, scene 2").await.is_err());
    }
}
