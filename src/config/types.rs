//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::PipelineSettings;
use crate::infrastructure::adapters::GeminiClientConfig;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 生成服务配置
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// 生成管线配置
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 阅读播放配置
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 生成服务提供方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorProvider {
    #[default]
    Gemini,
    /// 本地固定数据，不访问网络
    Fake,
}

impl GeneratorProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorProvider::Gemini => "gemini",
            GeneratorProvider::Fake => "fake",
        }
    }
}

/// 生成服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub provider: GeneratorProvider,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Gemini API Key，provider = gemini 时必填
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_text_model")]
    pub text_model: String,

    #[serde(default = "default_image_model")]
    pub image_model: String,

    #[serde(default = "default_speech_model")]
    pub speech_model: String,

    #[serde(default = "default_voice_name")]
    pub voice_name: String,

    /// 请求超时时间（秒），0 表示不限制
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_text_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_image_model() -> String {
    "imagen-4.0-generate-001".to_string()
}

fn default_speech_model() -> String {
    "gemini-2.5-flash-preview-tts".to_string()
}

fn default_voice_name() -> String {
    "Kore".to_string()
}

/// 生成调用默认不设超时，直到服务返回结果或错误
fn default_timeout() -> u64 {
    0
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: GeneratorProvider::default(),
            base_url: default_base_url(),
            api_key: None,
            text_model: default_text_model(),
            image_model: default_image_model(),
            speech_model: default_speech_model(),
            voice_name: default_voice_name(),
            timeout_secs: default_timeout(),
        }
    }
}

impl GeneratorConfig {
    /// 转换为 Gemini 客户端配置
    pub fn gemini_client_config(&self) -> GeminiClientConfig {
        GeminiClientConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone().unwrap_or_default(),
            text_model: self.text_model.clone(),
            image_model: self.image_model.clone(),
            speech_model: self.speech_model.clone(),
            voice_name: self.voice_name.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

/// 生成管线配置
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// 每个故事的页数
    #[serde(default = "default_page_count")]
    pub page_count: usize,

    /// 生成小游戏时带入的故事正文字符数上限
    #[serde(default = "default_game_context_chars")]
    pub game_context_chars: usize,

    /// 插图提示词缺少角色外观描述时自动补上
    #[serde(default = "default_enforce_visual_anchor")]
    pub enforce_visual_anchor: bool,

    /// 插图生成失败时使用的占位图服务
    #[serde(default = "default_placeholder_base_url")]
    pub placeholder_base_url: String,
}

fn default_page_count() -> usize {
    4
}

fn default_game_context_chars() -> usize {
    1000
}

fn default_enforce_visual_anchor() -> bool {
    true
}

fn default_placeholder_base_url() -> String {
    "https://picsum.photos".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            page_count: default_page_count(),
            game_context_chars: default_game_context_chars(),
            enforce_visual_anchor: default_enforce_visual_anchor(),
            placeholder_base_url: default_placeholder_base_url(),
        }
    }
}

impl PipelineConfig {
    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            page_count: self.page_count,
            game_context_chars: self.game_context_chars,
            enforce_visual_anchor: self.enforce_visual_anchor,
            placeholder_base_url: self.placeholder_base_url.clone(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 书库 sled 数据库目录
    #[serde(default = "default_library_path")]
    pub library_path: PathBuf,
}

fn default_library_path() -> PathBuf {
    PathBuf::from("data/library.sled")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            library_path: default_library_path(),
        }
    }
}

/// 阅读播放配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// 翻页后自动播放旁白的延迟（毫秒）
    #[serde(default = "default_autoplay_delay")]
    pub autoplay_delay_ms: u64,

    /// 输出设备以挂起状态创建，首次播放时恢复
    #[serde(default)]
    pub start_suspended: bool,
}

fn default_autoplay_delay() -> u64 {
    500
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            autoplay_delay_ms: default_autoplay_delay(),
            start_suspended: false,
        }
    }
}

impl PlaybackConfig {
    pub fn autoplay_delay(&self) -> Duration {
        Duration::from_millis(self.autoplay_delay_ms)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl LogConfig {
    /// RUST_LOG 未设置时使用的过滤规则
    pub fn filter(&self) -> String {
        format!(
            "{},storyloom={},tower_http=debug",
            self.level, self.level
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.generator.provider, GeneratorProvider::Gemini);
        assert_eq!(config.generator.timeout_secs, 0);
        assert_eq!(config.pipeline.page_count, 4);
        assert_eq!(config.playback.autoplay_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_pipeline_settings_match_defaults() {
        let settings = PipelineConfig::default().settings();
        let defaults = PipelineSettings::default();
        assert_eq!(settings.page_count, defaults.page_count);
        assert_eq!(settings.game_context_chars, defaults.game_context_chars);
        assert_eq!(settings.placeholder_base_url, defaults.placeholder_base_url);
    }

    #[test]
    fn test_gemini_client_config_carries_key() {
        let mut config = GeneratorConfig::default();
        config.api_key = Some("k".to_string());
        let client = config.gemini_client_config();
        assert_eq!(client.api_key, "k");
        assert_eq!(client.voice_name, "Kore");
        assert_eq!(client.timeout_secs, 0);
    }

    #[test]
    fn test_log_filter() {
        let log = LogConfig::default();
        assert_eq!(log.filter(), "info,storyloom=info,tower_http=debug");
    }
}
