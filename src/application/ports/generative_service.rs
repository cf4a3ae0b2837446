//! Generative Service Port - 生成式模型服务抽象
//!
//! 结构化文本、插图与朗读音频三类请求，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::story::Language;

/// 生成服务错误
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Empty response")]
    EmptyResponse,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Blocked by safety filter: {0}")]
    Blocked(String),
}

impl ServiceError {
    /// 响应内容不可用（空、格式错误或被拦截），而不是传输层失败
    pub fn is_content_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyResponse | Self::InvalidResponse(_) | Self::Blocked(_)
        )
    }
}

/// 结构化请求：系统指令 + 用户提示 + 响应 schema
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub system_instruction: String,
    pub prompt: String,
    /// 服务端强制的 JSON schema
    pub schema: Value,
}

impl StructuredRequest {
    pub fn new(system_instruction: impl Into<String>, prompt: impl Into<String>, schema: Value) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            prompt: prompt.into(),
            schema,
        }
    }

    /// schema 声明的必填字段
    pub fn required_fields(&self) -> Vec<&str> {
        self.schema
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// 生成的插图
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// 生成的朗读音频
#[derive(Debug, Clone)]
pub struct GeneratedSpeech {
    /// 例如 `audio/L16;codec=pcm;rate=24000`
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Generative Service Port
#[async_trait]
pub trait GenerativeServicePort: Send + Sync {
    /// 故事规划请求
    async fn request_structured_plan(&self, request: StructuredRequest) -> Result<Value, ServiceError>;

    /// 页面正文或小游戏请求
    async fn request_structured_content(
        &self,
        request: StructuredRequest,
    ) -> Result<Value, ServiceError>;

    /// 根据提示词生成一张插图
    async fn request_image(&self, prompt: &str) -> Result<GeneratedImage, ServiceError>;

    /// 朗读一页正文
    async fn request_speech(
        &self,
        text: &str,
        language: Language,
    ) -> Result<GeneratedSpeech, ServiceError>;

    /// 检查服务是否可用
    async fn health_check(&self) -> bool {
        true
    }
}
