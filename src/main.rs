//! Storyloom - 儿童有声绘本服务
//!
//! - Domain: story/
//! - Application: stages, orchestrator, playback, commands, queries, ports
//! - Infrastructure: http, memory, worker, persistence, adapters, events

use std::sync::Arc;

use storyloom::application::{
    DeviceState, GenerativeServicePort, LibraryCatalog, StoryOrchestrator,
};
use storyloom::config::{load_config, print_config, AppConfig, GeneratorProvider};
use storyloom::infrastructure::adapters::{
    ClockedDeviceProvider, FakeGenerativeClient, FakeGenerativeClientConfig, GeminiClient,
};
use storyloom::infrastructure::events::EventPublisher;
use storyloom::infrastructure::http::{AppState, HttpServer};
use storyloom::infrastructure::memory::{InMemoryGenerationTracker, InMemoryReadingSessions};
use storyloom::infrastructure::persistence::sled::{SledLibraryConfig, SledLibraryStore};
use storyloom::infrastructure::worker::GenerationWorker;
use tokio::sync::mpsc;

/// 同一时间只有一轮生成，队列只需容纳少量请求
const GENERATION_QUEUE_SIZE: usize = 4;

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log.filter()));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_generator(config: &AppConfig) -> anyhow::Result<Arc<dyn GenerativeServicePort>> {
    let service: Arc<dyn GenerativeServicePort> = match config.generator.provider {
        GeneratorProvider::Gemini => {
            Arc::new(GeminiClient::new(config.generator.gemini_client_config())?)
        }
        GeneratorProvider::Fake => {
            tracing::warn!("Using fake generator, no network calls will be made");
            Arc::new(FakeGenerativeClient::new(FakeGenerativeClientConfig {
                page_count: config.pipeline.page_count,
                ..FakeGenerativeClientConfig::default()
            }))
        }
    };
    Ok(service)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Storyloom - picture book generator");
    print_config(&config);

    // 确保书库目录的上级目录存在
    if let Some(parent) = config.storage.library_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 书库（启动时尽力读取）
    let store = Arc::new(SledLibraryStore::new(&SledLibraryConfig {
        db_path: config.storage.library_path.to_string_lossy().into_owned(),
    })?);
    let library = Arc::new(LibraryCatalog::load(store).await);

    // 事件发布器与生成状态
    let event_publisher = EventPublisher::new().arc();
    let tracker = InMemoryGenerationTracker::new()
        .with_events(event_publisher.clone())
        .arc();

    // 生成服务
    let generator = build_generator(&config)?;
    if !generator.health_check().await {
        tracing::warn!("Generative service health check failed, continuing anyway");
    }

    // 生成管线与后台 Worker
    let orchestrator = Arc::new(StoryOrchestrator::new(
        generator,
        tracker.clone(),
        library.clone(),
        config.pipeline.settings(),
    ));
    let (queue_tx, queue_rx) = mpsc::channel(GENERATION_QUEUE_SIZE);
    let worker = GenerationWorker::new(queue_rx, orchestrator);
    tokio::spawn(worker.run());

    // 阅读会话（每个会话独占一个输出设备）
    let initial_state = if config.playback.start_suspended {
        DeviceState::Suspended
    } else {
        DeviceState::Running
    };
    let sessions = InMemoryReadingSessions::new(
        Arc::new(ClockedDeviceProvider::new(initial_state)),
        event_publisher.clone(),
        config.playback.autoplay_delay(),
    )
    .arc();

    // 创建 HTTP 服务器
    let state = AppState::new(tracker, library, sessions, event_publisher, queue_tx);
    let server = HttpServer::new(config.server.addr(), state);

    // 启动服务器（带优雅关闭）
    server
        .serve_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
