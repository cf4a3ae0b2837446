//! WebSocket Handlers
//!
//! - /ws/events: 生成进度（全局）
//! - /ws/reading/:session_id: 阅读会话播放状态

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use std::sync::Arc;

use crate::infrastructure::events::WsEvent;
use crate::infrastructure::http::state::AppState;

/// 阅读会话 WebSocket
pub async fn reading_websocket_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_reading_socket(socket, session_id, state))
}

/// 全局 WebSocket（生成状态、故事快照、完成/失败）
pub async fn global_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_global_socket(socket, state))
}

async fn send_event(sender: &mut SplitSink<WebSocket, Message>, event: &WsEvent) -> bool {
    let msg = match serde_json::to_string(event) {
        Ok(json) => Message::Text(json),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize event");
            return true;
        }
    };

    match sender.send(msg).await {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(error = %e, "Failed to send WebSocket message");
            false
        }
    }
}

/// 读取客户端消息直到关闭；内容本身不处理
async fn drain_client(mut receiver: futures_util::stream::SplitStream<WebSocket>, label: String) {
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Close(_)) => {
                tracing::info!(socket = %label, "WebSocket closed by client");
                break;
            }
            Err(e) => {
                tracing::debug!(socket = %label, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }
}

async fn handle_reading_socket(socket: WebSocket, session_id: String, state: Arc<AppState>) {
    let (mut sender, receiver) = socket.split();

    // 会话必须已通过 /api/reading/open 打开
    let Some(mut event_rx) = state
        .sessions
        .get(&session_id)
        .and_then(|_| state.event_publisher.subscribe(&session_id))
    else {
        tracing::warn!(session_id = %session_id, "WebSocket connection rejected: invalid session");
        let _ = sender.close().await;
        return;
    };

    tracing::info!(session_id = %session_id, "Reading WebSocket connected");

    let forward_task = tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            let closed = matches!(event, WsEvent::ReadingClosed { .. });
            if !send_event(&mut sender, &event).await || closed {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let receive_task = tokio::spawn(drain_client(receiver, session_id.clone()));

    // 等待任一任务完成
    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    tracing::info!(session_id = %session_id, "Reading WebSocket disconnected");
}

async fn handle_global_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, receiver) = socket.split();

    // 先订阅再推送当前状态，避免漏掉中间的变更
    let mut event_rx = state.event_publisher.subscribe_global();
    let current = state.tracker.status();

    tracing::info!("Global WebSocket connected");

    let forward_task = tokio::spawn(async move {
        let initial = WsEvent::GenerationStatusChanged {
            status: current.status,
            message: current.message,
        };
        if !send_event(&mut sender, &initial).await {
            return;
        }

        while let Ok(event) = event_rx.recv().await {
            match &event {
                WsEvent::GenerationStatusChanged { .. }
                | WsEvent::StoryUpdated { .. }
                | WsEvent::StoryReady { .. }
                | WsEvent::GenerationFailed { .. } => {
                    if !send_event(&mut sender, &event).await {
                        break;
                    }
                }
                _ => {}
            }
        }
    });

    let receive_task = tokio::spawn(drain_client(receiver, "global".to_string()));

    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    tracing::info!("Global WebSocket disconnected");
}
