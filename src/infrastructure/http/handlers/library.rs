//! Library Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{GetStory, ListLibrary, StorySummary};
use crate::domain::story::StoryId;
use crate::infrastructure::http::dto::{ApiResponse, GetStoryRequest, StoryDto};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 书库列表，最新的在前
pub async fn list_library(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<StorySummary>>>, ApiError> {
    let stories = state.list_library_handler.handle(ListLibrary).await?;
    Ok(Json(ApiResponse::success(stories)))
}

pub async fn get_story(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetStoryRequest>,
) -> Result<Json<ApiResponse<StoryDto>>, ApiError> {
    let query = GetStory {
        story_id: StoryId::from_uuid(req.id),
    };

    let story = state.get_story_handler.handle(query).await?;

    Ok(Json(ApiResponse::success(StoryDto::from(story.as_ref()))))
}
