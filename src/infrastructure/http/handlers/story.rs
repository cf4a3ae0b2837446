//! Story Handlers - 创建故事与生成进度

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{CreateStory, GetCurrentStory, GetGenerationStatus, StatusUpdate};
use crate::domain::story::{Language, Subject};
use crate::infrastructure::http::dto::{
    ApiResponse, CreateStoryRequest, CreateStoryResponseDto, StoryDto, StorySnapshotDto,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 提交故事生成（后台进行，进度通过 /ws/events 推送）
pub async fn create_story(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateStoryRequest>,
) -> Result<Json<ApiResponse<CreateStoryResponseDto>>, ApiError> {
    let subject = Subject::from_str(&req.subject)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown subject: {}", req.subject)))?;
    let language = Language::from_str(&req.language)
        .ok_or_else(|| ApiError::BadRequest(format!("unsupported language: {}", req.language)))?;

    let cmd = CreateStory {
        character: req.character,
        setting: req.setting,
        theme: req.theme,
        subject,
        language,
        custom_prompt: req.custom_prompt,
    };

    let result = state.create_story_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(CreateStoryResponseDto {
        status: result.status.as_str().to_string(),
        message: result.message,
    })))
}

pub async fn generation_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<StatusUpdate>>, ApiError> {
    let status = state
        .get_generation_status_handler
        .handle(GetGenerationStatus)
        .await?;

    Ok(Json(ApiResponse::success(status)))
}

/// 最近一次生成的故事；插图阶段返回逐页补全中的快照
pub async fn current_story(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<StorySnapshotDto>>, ApiError> {
    let snapshot = state.get_current_story_handler.handle(GetCurrentStory).await?;

    Ok(Json(ApiResponse::success(StorySnapshotDto {
        version: snapshot.version,
        story: StoryDto::from(snapshot.story.as_ref()),
    })))
}
