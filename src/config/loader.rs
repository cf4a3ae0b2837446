//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, GeneratorProvider};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `STORYLOOM_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `STORYLOOM_SERVER__PORT=9000`
/// - `STORYLOOM_GENERATOR__PROVIDER=fake`
/// - `STORYLOOM_GENERATOR__API_KEY=...`
/// - `STORYLOOM_PIPELINE__PAGE_COUNT=6`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("generator.provider", "gemini")?
        .set_default("generator.base_url", "https://generativelanguage.googleapis.com")?
        .set_default("generator.text_model", "gemini-2.5-flash")?
        .set_default("generator.image_model", "imagen-4.0-generate-001")?
        .set_default("generator.speech_model", "gemini-2.5-flash-preview-tts")?
        .set_default("generator.voice_name", "Kore")?
        .set_default("generator.timeout_secs", 0)?
        .set_default("pipeline.page_count", 4)?
        .set_default("pipeline.game_context_chars", 1000)?
        .set_default("pipeline.enforce_visual_anchor", true)?
        .set_default("pipeline.placeholder_base_url", "https://picsum.photos")?
        .set_default("storage.library_path", "data/library.sled")?
        .set_default("playback.autoplay_delay_ms", 500)?
        .set_default("playback.start_suspended", false)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: STORYLOOM_GENERATOR__BASE_URL=http://localhost:9090
    builder = builder.add_source(
        Environment::with_prefix("STORYLOOM")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.pipeline.page_count == 0 {
        return Err(ConfigError::ValidationError(
            "Pipeline page count must be at least 1".to_string(),
        ));
    }

    if config.generator.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Generator base URL cannot be empty".to_string(),
        ));
    }

    if config.generator.provider == GeneratorProvider::Gemini
        && config
            .generator
            .api_key
            .as_deref()
            .map_or(true, |k| k.trim().is_empty())
    {
        return Err(ConfigError::ValidationError(
            "Gemini provider requires generator.api_key".to_string(),
        ));
    }

    if config.storage.library_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Library path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志），不输出 API Key
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Generator: {}", config.generator.provider.as_str());
    if config.generator.provider == GeneratorProvider::Gemini {
        tracing::info!("Gemini Base URL: {}", config.generator.base_url);
        tracing::info!(
            "Gemini Models: text={} image={} speech={}",
            config.generator.text_model,
            config.generator.image_model,
            config.generator.speech_model
        );
        tracing::info!("Gemini Voice: {}", config.generator.voice_name);
        match config.generator.timeout_secs {
            0 => tracing::info!("Gemini Timeout: none"),
            secs => tracing::info!("Gemini Timeout: {}s", secs),
        }
    }
    tracing::info!("Pages Per Story: {}", config.pipeline.page_count);
    tracing::info!("Visual Anchor Enforced: {}", config.pipeline.enforce_visual_anchor);
    tracing::info!("Library: {:?}", config.storage.library_path);
    tracing::info!("Autoplay Delay: {}ms", config.playback.autoplay_delay_ms);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.generator.api_key = Some("test-key".to_string());
        config
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = valid_config();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_pages() {
        let mut config = valid_config();
        config.pipeline.page_count = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_gemini_requires_api_key() {
        let mut config = valid_config();
        config.generator.api_key = Some("   ".to_string());
        assert!(validate_config(&config).is_err());

        config.generator.provider = GeneratorProvider::Fake;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_empty_library_path() {
        let mut config = valid_config();
        config.storage.library_path = std::path::PathBuf::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[generator]\nprovider = \"fake\"\n\n[pipeline]\npage_count = 6\n\n[playback]\nautoplay_delay_ms = 250"
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.generator.provider, GeneratorProvider::Fake);
        assert_eq!(config.pipeline.page_count, 6);
        assert_eq!(config.playback.autoplay_delay_ms, 250);
        assert_eq!(config.generator.text_model, "gemini-2.5-flash");
        assert_eq!(config.generator.timeout_secs, 0);
    }
}
