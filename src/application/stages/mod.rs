//! 生成管线阶段
//!
//! plan → writer → game 依次执行，media 在故事组装后逐页扇出

mod game;
mod media;
mod plan;
mod writer;

pub use game::{story_context, GameStage};
pub use media::{MediaFanout, MediaProgress};
pub use plan::PlanStage;
pub use writer::WriterStage;

/// 管线参数
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// 每本书的页数
    pub page_count: usize,
    /// 小游戏上下文截取的字符数
    pub game_context_chars: usize,
    /// 插图提示词缺少角色外观描述时自动补上
    pub enforce_visual_anchor: bool,
    /// 占位插图服务地址
    pub placeholder_base_url: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            page_count: 4,
            game_context_chars: 1000,
            enforce_visual_anchor: true,
            placeholder_base_url: "https://picsum.photos".to_string(),
        }
    }
}

/// 所有阶段共享的受众描述
pub(crate) const AUDIENCE: &str = "Target audience: children aged 5-9.";

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;

    use crate::application::ports::{
        GeneratedImage, GeneratedSpeech, GenerativeServicePort, ServiceError, StructuredRequest,
    };
    use crate::domain::story::Language;

    /// 按顺序返回预设结构化响应的服务
    #[derive(Default)]
    pub struct ScriptedService {
        pub plan: Mutex<Option<Result<Value, ServiceError>>>,
        pub content: Mutex<Vec<Result<Value, ServiceError>>>,
        pub requests: Mutex<Vec<StructuredRequest>>,
    }

    impl ScriptedService {
        pub fn with_plan(plan: Result<Value, ServiceError>) -> Self {
            let service = Self::default();
            *service.plan.lock().unwrap() = Some(plan);
            service
        }

        pub fn with_content(content: Result<Value, ServiceError>) -> Self {
            let service = Self::default();
            service.content.lock().unwrap().push(content);
            service
        }

        pub fn last_request(&self) -> StructuredRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl GenerativeServicePort for ScriptedService {
        async fn request_structured_plan(
            &self,
            request: StructuredRequest,
        ) -> Result<Value, ServiceError> {
            self.requests.lock().unwrap().push(request);
            self.plan
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(ServiceError::EmptyResponse))
        }

        async fn request_structured_content(
            &self,
            request: StructuredRequest,
        ) -> Result<Value, ServiceError> {
            self.requests.lock().unwrap().push(request);
            let mut content = self.content.lock().unwrap();
            if content.is_empty() {
                Err(ServiceError::EmptyResponse)
            } else {
                content.remove(0)
            }
        }

        async fn request_image(&self, _prompt: &str) -> Result<GeneratedImage, ServiceError> {
            Err(ServiceError::ServiceError("no images".to_string()))
        }

        async fn request_speech(
            &self,
            _text: &str,
            _language: Language,
        ) -> Result<GeneratedSpeech, ServiceError> {
            Err(ServiceError::ServiceError("no speech".to_string()))
        }
    }
}
