//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                    GET   健康检查
//! - /api/story/create            POST  提交故事生成（后台进行，通过 WS 推送进度）
//! - /api/story/status            GET   当前生成状态
//! - /api/story/current           GET   最近一次生成的故事（含进行中快照）
//! - /api/library/list            GET   书库列表
//! - /api/library/get             POST  按 id 获取故事
//! - /api/reading/open            POST  打开阅读会话
//! - /api/reading/navigate        POST  翻页
//! - /api/reading/play            POST  播放当前页旁白
//! - /api/reading/stop            POST  停止旁白
//! - /api/reading/exit            POST  退出阅读
//! - /api/reading/answer          POST  小游戏作答
//! - /api/media/audio/{story_id}/{page_number}  GET  旁白 WAV
//! - /ws/events                   WS    全局 WebSocket（生成事件）
//! - /ws/reading/{session_id}     WS    阅读会话 WebSocket（播放状态）

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/reading/:session_id", get(handlers::reading_websocket_handler))
        .route("/ws/events", get(handlers::global_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/story", story_routes())
        .nest("/library", library_routes())
        .nest("/reading", reading_routes())
        .route(
            "/media/audio/:story_id/:page_number",
            get(handlers::get_page_audio),
        )
}

/// Story 路由
fn story_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(handlers::create_story))
        .route("/status", get(handlers::generation_status))
        .route("/current", get(handlers::current_story))
}

/// Library 路由
fn library_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list", get(handlers::list_library))
        .route("/get", post(handlers::get_story))
}

/// Reading 路由
fn reading_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/open", post(handlers::open_reading))
        .route("/navigate", post(handlers::navigate))
        .route("/play", post(handlers::play_audio))
        .route("/stop", post(handlers::stop_audio))
        .route("/exit", post(handlers::exit_reading))
        .route("/answer", post(handlers::answer_mini_game))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tower::util::ServiceExt;

    use crate::application::library::test_support::MemoryLibraryStore;
    use crate::application::{
        DeviceState, GenerationTrackerPort, LibraryCatalog, PipelineSettings, StoryOrchestrator,
    };
    use crate::domain::story::{Language, StoryParameters, Subject};
    use crate::infrastructure::adapters::{ClockedDeviceProvider, FakeGenerativeClient};
    use crate::infrastructure::events::EventPublisher;
    use crate::infrastructure::memory::{InMemoryGenerationTracker, InMemoryReadingSessions};

    struct Harness {
        state: Arc<AppState>,
        tracker: Arc<InMemoryGenerationTracker>,
        library: Arc<LibraryCatalog>,
        _queue: mpsc::Receiver<StoryParameters>,
    }

    async fn harness() -> Harness {
        let events = EventPublisher::new().arc();
        let tracker = InMemoryGenerationTracker::new()
            .with_events(events.clone())
            .arc();
        let library = Arc::new(LibraryCatalog::load(Arc::new(MemoryLibraryStore::default())).await);
        let sessions = InMemoryReadingSessions::new(
            Arc::new(ClockedDeviceProvider::new(DeviceState::Running)),
            events.clone(),
            Duration::from_millis(500),
        )
        .arc();
        let (tx, rx) = mpsc::channel(4);

        let state = AppState::new(tracker.clone(), library.clone(), sessions, events, tx);
        Harness {
            state: Arc::new(state),
            tracker,
            library,
            _queue: rx,
        }
    }

    /// 直接跑一遍生成管线，把故事放进快照和书库
    async fn generate(h: &Harness) {
        let orchestrator = StoryOrchestrator::new(
            Arc::new(FakeGenerativeClient::default()),
            h.tracker.clone(),
            h.library.clone(),
            PipelineSettings::default(),
        );
        let params = StoryParameters::new(
            "Robo",
            "Space",
            "Friendship",
            Subject::Math,
            Language::En,
            None,
        )
        .unwrap();
        orchestrator.create(params).await.unwrap();
    }

    fn app(h: &Harness) -> Router {
        create_routes().with_state(h.state.clone())
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let h = harness().await;
        let (status, body) = call(app(&h), get_req("/api/ping")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["generation"], "idle");
    }

    #[tokio::test]
    async fn test_create_story_enters_writing_then_conflicts() {
        let h = harness().await;
        let body = serde_json::json!({
            "character": "Robo",
            "setting": "Space",
            "theme": "Friendship",
            "subject": "math",
            "language": "en"
        });

        let (_, first) = call(app(&h), post_json("/api/story/create", body.clone())).await;
        assert_eq!(first["errno"], 0);
        assert_eq!(first["data"]["status"], "writing");

        let (_, second) = call(app(&h), post_json("/api/story/create", body)).await;
        assert_eq!(second["errno"], 409);

        let (_, status) = call(app(&h), get_req("/api/story/status")).await;
        assert_eq!(status["data"]["status"], "writing");
    }

    #[tokio::test]
    async fn test_create_story_rejects_unknown_language() {
        let h = harness().await;
        let body = serde_json::json!({ "subject": "math", "language": "fr" });

        let (status, resp) = call(app(&h), post_json("/api/story/create", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["errno"], 400);
        assert_eq!(h.tracker.status().status.as_str(), "idle");
    }

    #[tokio::test]
    async fn test_current_story_before_and_after_generation() {
        let h = harness().await;
        let (_, before) = call(app(&h), get_req("/api/story/current")).await;
        assert_eq!(before["errno"], 400);

        generate(&h).await;

        let (_, after) = call(app(&h), get_req("/api/story/current")).await;
        assert_eq!(after["errno"], 0);
        assert_eq!(after["data"]["story"]["title"], "Robo Counts the Stars");
        assert_eq!(after["data"]["story"]["media_complete"], true);
        assert_eq!(after["data"]["story"]["pages"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_library_list_and_get() {
        let h = harness().await;
        generate(&h).await;

        let (_, list) = call(app(&h), get_req("/api/library/list")).await;
        let items = list["data"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        let id = items[0]["id"].as_str().unwrap().to_string();

        let (_, story) = call(app(&h), post_json("/api/library/get", serde_json::json!({ "id": id }))).await;
        assert_eq!(story["errno"], 0);
        assert_eq!(story["data"]["id"], id.as_str());

        let missing = uuid::Uuid::now_v7().to_string();
        let (_, none) = call(app(&h), post_json("/api/library/get", serde_json::json!({ "id": missing }))).await;
        assert_eq!(none["errno"], 404);
    }

    #[tokio::test]
    async fn test_page_audio_served_as_wav() {
        let h = harness().await;
        generate(&h).await;
        let story_id = h.tracker.snapshot().unwrap().story.id().to_string();

        let response = app(&h)
            .oneshot(get_req(&format!("/api/media/audio/{}/1", story_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/wav");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..4], b"RIFF");

        let (_, missing) = call(app(&h), get_req(&format!("/api/media/audio/{}/9", story_id))).await;
        assert_eq!(missing["errno"], 404);
    }

    #[tokio::test]
    async fn test_reading_flow() {
        let h = harness().await;
        generate(&h).await;

        let (_, opened) = call(app(&h), post_json("/api/reading/open", serde_json::json!({}))).await;
        assert_eq!(opened["errno"], 0);
        assert_eq!(opened["data"]["page_index"], 0);
        let session_id = opened["data"]["session_id"].as_str().unwrap().to_string();

        // 不在小游戏页时不能作答
        let (_, early) = call(
            app(&h),
            post_json(
                "/api/reading/answer",
                serde_json::json!({ "session_id": session_id, "option_index": 1 }),
            ),
        )
        .await;
        assert_eq!(early["errno"], 400);

        let (_, game) = call(
            app(&h),
            post_json(
                "/api/reading/navigate",
                serde_json::json!({ "session_id": session_id, "direction": "mini_game" }),
            ),
        )
        .await;
        assert_eq!(game["data"]["on_mini_game"], true);

        let (_, answer) = call(
            app(&h),
            post_json(
                "/api/reading/answer",
                serde_json::json!({ "session_id": session_id, "option_index": 1 }),
            ),
        )
        .await;
        assert_eq!(answer["data"]["correct"], true);

        let (_, exited) = call(
            app(&h),
            post_json("/api/reading/exit", serde_json::json!({ "session_id": session_id })),
        )
        .await;
        assert_eq!(exited["errno"], 0);

        let (_, gone) = call(
            app(&h),
            post_json("/api/reading/stop", serde_json::json!({ "session_id": session_id })),
        )
        .await;
        assert_eq!(gone["errno"], 404);
    }
}
