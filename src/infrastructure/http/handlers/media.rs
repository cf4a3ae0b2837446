//! Media Handlers - 旁白音频下载

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::GetPageAudio;
use crate::domain::story::StoryId;
use crate::infrastructure::adapters::audio::to_wav_bytes;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 下载某页旁白，统一转成 WAV
pub async fn get_page_audio(
    State(state): State<Arc<AppState>>,
    Path((story_id, page_number)): Path<(Uuid, u32)>,
) -> Result<Response, ApiError> {
    let query = GetPageAudio {
        story_id: StoryId::from_uuid(story_id),
        page_number,
    };

    let result = state.get_page_audio_handler.handle(query).await?;
    let wav = to_wav_bytes(&result.audio);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "audio/wav")
        .header(header::CONTENT_LENGTH, wav.len())
        .header(header::CACHE_CONTROL, "public, max-age=86400")
        .body(axum::body::Body::from(wav))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}
