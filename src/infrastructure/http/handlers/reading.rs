//! Reading Handlers - 阅读会话（翻页、旁白播放、小游戏）

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::application::{
    AnswerMiniGame, ExitReading, Navigate, OpenReading, PlayPageAudio, ReadingPosition,
    StopPageAudio,
};
use crate::domain::story::{AnswerOutcome, StoryId};
use crate::infrastructure::http::dto::{
    AnswerRequest, ApiResponse, Empty, NavigateRequest, OpenReadingRequest, ReadingSessionRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Open / Exit
// ============================================================================

/// 打开阅读会话；会先关闭已有会话
pub async fn open_reading(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OpenReadingRequest>,
) -> Result<Json<ApiResponse<ReadingPosition>>, ApiError> {
    let cmd = OpenReading {
        story_id: req.story_id.map(StoryId::from_uuid),
    };

    let position = state.open_reading_handler.handle(cmd).await?;
    Ok(Json(ApiResponse::success(position)))
}

pub async fn exit_reading(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReadingSessionRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    let cmd = ExitReading {
        session_id: req.session_id,
    };

    state.exit_reading_handler.handle(cmd).await?;
    Ok(Json(ApiResponse::ok()))
}

// ============================================================================
// Navigate
// ============================================================================

pub async fn navigate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NavigateRequest>,
) -> Result<Json<ApiResponse<ReadingPosition>>, ApiError> {
    let cmd = Navigate {
        session_id: req.session_id,
        direction: req.direction,
    };

    let position = state.navigate_handler.handle(cmd).await?;
    Ok(Json(ApiResponse::success(position)))
}

// ============================================================================
// Audio
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PlayResponseDto {
    pub played: bool,
    pub position: ReadingPosition,
}

pub async fn play_audio(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReadingSessionRequest>,
) -> Result<Json<ApiResponse<PlayResponseDto>>, ApiError> {
    let cmd = PlayPageAudio {
        session_id: req.session_id,
    };

    let result = state.play_page_audio_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(PlayResponseDto {
        played: result.played,
        position: result.position,
    })))
}

pub async fn stop_audio(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReadingSessionRequest>,
) -> Result<Json<ApiResponse<ReadingPosition>>, ApiError> {
    let cmd = StopPageAudio {
        session_id: req.session_id,
    };

    let position = state.stop_page_audio_handler.handle(cmd).await?;
    Ok(Json(ApiResponse::success(position)))
}

// ============================================================================
// Mini-game
// ============================================================================

pub async fn answer_mini_game(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<ApiResponse<AnswerOutcome>>, ApiError> {
    let cmd = AnswerMiniGame {
        session_id: req.session_id,
        option_index: req.option_index,
    };

    let outcome = state.answer_mini_game_handler.handle(cmd).await?;
    Ok(Json(ApiResponse::success(outcome)))
}
