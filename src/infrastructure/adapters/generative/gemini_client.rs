//! Gemini Client - 调用 Gemini REST API
//!
//! 实现 GenerativeServicePort：
//! POST {base}/v1beta/models/{model}:generateContent  结构化 JSON 与朗读音频
//! POST {base}/v1beta/models/{model}:predict          插图
//! 认证使用 `x-goog-api-key` 请求头

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::application::ports::{
    GeneratedImage, GeneratedSpeech, GenerativeServicePort, ServiceError, StructuredRequest,
};
use crate::domain::story::Language;

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Gemini 客户端配置
#[derive(Debug, Clone)]
pub struct GeminiClientConfig {
    pub base_url: String,
    pub api_key: String,
    /// 规划、写作、小游戏使用的文本模型
    pub text_model: String,
    pub image_model: String,
    pub speech_model: String,
    /// 预置朗读音色
    pub voice_name: String,
    /// 请求超时时间（秒），0 表示不限制
    pub timeout_secs: u64,
}

impl Default for GeminiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: String::new(),
            text_model: "gemini-2.5-flash".to_string(),
            image_model: "imagen-4.0-generate-001".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice_name: "Kore".to_string(),
            timeout_secs: 0,
        }
    }
}

/// Gemini 客户端
pub struct GeminiClient {
    client: Client,
    config: GeminiClientConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiClientConfig) -> Result<Self, ServiceError> {
        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| ServiceError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            model,
            method
        )
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, ServiceError> {
        tracing::debug!(url = %url, "Sending Gemini request");

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ServiceError::Timeout
                } else if e.is_connect() {
                    ServiceError::NetworkError(format!("Cannot connect to Gemini: {}", e))
                } else {
                    ServiceError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ServiceError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ServiceError::InvalidResponse(format!("Failed to read body: {}", e)))
    }

    async fn generate_structured(&self, request: StructuredRequest) -> Result<Value, ServiceError> {
        let url = self.model_url(&self.config.text_model, "generateContent");
        let body = structured_body(&request);
        let response = self.post_json(&url, &body).await?;
        parse_structured_response(&response)
    }
}

#[async_trait]
impl GenerativeServicePort for GeminiClient {
    async fn request_structured_plan(&self, request: StructuredRequest) -> Result<Value, ServiceError> {
        self.generate_structured(request).await
    }

    async fn request_structured_content(
        &self,
        request: StructuredRequest,
    ) -> Result<Value, ServiceError> {
        self.generate_structured(request).await
    }

    async fn request_image(&self, prompt: &str) -> Result<GeneratedImage, ServiceError> {
        let url = self.model_url(&self.config.image_model, "predict");
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": "1:1",
                "outputMimeType": "image/jpeg"
            }
        });

        let response = self.post_json(&url, &body).await?;
        let image = parse_image_response(&response)?;
        tracing::info!(size = image.data.len(), "Image generated");
        Ok(image)
    }

    async fn request_speech(
        &self,
        text: &str,
        language: Language,
    ) -> Result<GeneratedSpeech, ServiceError> {
        let url = self.model_url(&self.config.speech_model, "generateContent");
        let body = json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "languageCode": language_code(language),
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.config.voice_name }
                    }
                }
            }
        });

        let response = self.post_json(&url, &body).await?;
        let speech = parse_speech_response(&response)?;
        tracing::info!(
            mime_type = %speech.mime_type,
            size = speech.data.len(),
            "Speech generated"
        );
        Ok(speech)
    }

    async fn health_check(&self) -> bool {
        let url = format!(
            "{}/v1beta/models?pageSize=1",
            self.config.base_url.trim_end_matches('/')
        );
        match self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

fn language_code(language: Language) -> &'static str {
    match language {
        Language::Id => "id-ID",
        Language::En => "en-US",
    }
}

fn safety_settings() -> Value {
    Value::Array(
        HARM_CATEGORIES
            .iter()
            .map(|category| json!({ "category": category, "threshold": "BLOCK_ONLY_HIGH" }))
            .collect(),
    )
}

fn structured_body(request: &StructuredRequest) -> Value {
    json!({
        "systemInstruction": { "parts": [{ "text": request.system_instruction }] },
        "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
        "safetySettings": safety_settings(),
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": request.schema
        }
    })
}

fn first_part(response: &Value) -> Option<&Value> {
    response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)
}

fn check_blocked(response: &Value) -> Result<(), ServiceError> {
    if let Some(reason) = response
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(Value::as_str)
    {
        return Err(ServiceError::Blocked(reason.to_string()));
    }
    Ok(())
}

fn decode_base64(data: &str) -> Result<Vec<u8>, ServiceError> {
    general_purpose::STANDARD
        .decode(data)
        .map_err(|e| ServiceError::InvalidResponse(format!("Invalid base64 payload: {}", e)))
}

/// 取出第一个候选的文本并解析为 JSON
fn parse_structured_response(response: &Value) -> Result<Value, ServiceError> {
    check_blocked(response)?;

    let text = first_part(response)
        .and_then(|p| p.get("text"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ServiceError::EmptyResponse)?;

    serde_json::from_str(text)
        .map_err(|e| ServiceError::InvalidResponse(format!("Structured output is not JSON: {}", e)))
}

fn parse_image_response(response: &Value) -> Result<GeneratedImage, ServiceError> {
    let prediction = response
        .get("predictions")
        .and_then(|p| p.get(0))
        .ok_or(ServiceError::EmptyResponse)?;

    let encoded = prediction
        .get("bytesBase64Encoded")
        .and_then(Value::as_str)
        .ok_or(ServiceError::EmptyResponse)?;

    let mime_type = prediction
        .get("mimeType")
        .and_then(Value::as_str)
        .unwrap_or("image/jpeg")
        .to_string();

    Ok(GeneratedImage {
        mime_type,
        data: decode_base64(encoded)?,
    })
}

fn parse_speech_response(response: &Value) -> Result<GeneratedSpeech, ServiceError> {
    check_blocked(response)?;

    let inline = first_part(response)
        .and_then(|p| p.get("inlineData"))
        .ok_or(ServiceError::EmptyResponse)?;

    let encoded = inline
        .get("data")
        .and_then(Value::as_str)
        .ok_or(ServiceError::EmptyResponse)?;

    let mime_type = inline
        .get("mimeType")
        .and_then(Value::as_str)
        .unwrap_or("audio/L16;codec=pcm;rate=24000")
        .to_string();

    let data = decode_base64(encoded)?;
    if data.is_empty() {
        return Err(ServiceError::EmptyResponse);
    }

    Ok(GeneratedSpeech { mime_type, data })
}
