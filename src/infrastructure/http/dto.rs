//! Data Transfer Objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::NavigationDirection;
use crate::domain::story::{GameKind, Language, MiniGame, Page, Story, StoryId, Subject};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(Empty {}),
        }
    }
}

// ============================================================================
// Story DTOs
// ============================================================================

/// 创建故事请求；字段留空时使用向导默认值
#[derive(Debug, Deserialize)]
pub struct CreateStoryRequest {
    #[serde(default)]
    pub character: String,
    #[serde(default)]
    pub setting: String,
    #[serde(default)]
    pub theme: String,
    pub subject: String,
    pub language: String,
    #[serde(default)]
    pub custom_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateStoryResponseDto {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GetStoryRequest {
    pub id: Uuid,
}

/// 单页内容
#[derive(Debug, Serialize)]
pub struct PageDto {
    pub page_number: u32,
    pub text: String,
    pub image_prompt: String,
    /// data URI 或占位图地址；插图未完成时为空
    pub image: Option<String>,
    pub image_placeholder: bool,
    pub has_narration: bool,
    pub media_pending: bool,
}

impl From<&Page> for PageDto {
    fn from(page: &Page) -> Self {
        Self {
            page_number: page.page_number(),
            text: page.text().to_string(),
            image_prompt: page.image_prompt().to_string(),
            image: page.illustration().map(|i| i.source().to_string()),
            image_placeholder: page.illustration().is_some_and(|i| i.is_placeholder()),
            has_narration: page.narration().is_some_and(|a| !a.is_empty()),
            media_pending: page.is_media_pending(),
        }
    }
}

/// 小游戏题面（不含答案，作答走 /api/reading/answer）
#[derive(Debug, Serialize)]
pub struct MiniGameDto {
    pub kind: GameKind,
    pub question: String,
    pub options: Vec<String>,
}

impl From<&MiniGame> for MiniGameDto {
    fn from(game: &MiniGame) -> Self {
        Self {
            kind: game.kind(),
            question: game.question().to_string(),
            options: game.options().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StoryDto {
    pub id: StoryId,
    pub title: String,
    pub moral: String,
    pub theme: String,
    pub subject: Subject,
    pub language: Language,
    pub created_at: DateTime<Utc>,
    pub media_complete: bool,
    pub pages: Vec<PageDto>,
    pub game: MiniGameDto,
}

impl From<&Story> for StoryDto {
    fn from(story: &Story) -> Self {
        Self {
            id: *story.id(),
            title: story.title().to_string(),
            moral: story.moral().to_string(),
            theme: story.theme().to_string(),
            subject: story.subject(),
            language: story.language(),
            created_at: story.created_at(),
            media_complete: story.is_media_complete(),
            pages: story.pages().iter().map(PageDto::from).collect(),
            game: MiniGameDto::from(story.game()),
        }
    }
}

/// 进行中故事的快照
#[derive(Debug, Serialize)]
pub struct StorySnapshotDto {
    pub version: u64,
    pub story: StoryDto,
}

// ============================================================================
// Reading DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct OpenReadingRequest {
    /// 为空时打开最近生成的故事
    #[serde(default)]
    pub story_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub session_id: String,
    pub direction: NavigationDirection,
}

#[derive(Debug, Deserialize)]
pub struct ReadingSessionRequest {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub session_id: String,
    pub option_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::story::{
        GameKind, Illustration, MiniGame, PageDraft, StoryParameters, StoryPlan,
    };

    fn story() -> Story {
        let params = StoryParameters::new(
            "Robo",
            "Space",
            "Friendship",
            Subject::Math,
            Language::En,
            None,
        )
        .unwrap();
        let plan = StoryPlan::new(
            "Robo Counts",
            "Count carefully",
            "a small silver robot",
            (1..=4).map(|n| format!("beat {}", n)).collect(),
            4,
        )
        .unwrap();
        let drafts = (1..=4)
            .map(|n| PageDraft::new(n, format!("Page {}", n), format!("scene {}", n)).unwrap())
            .collect();
        let game = MiniGame::new(
            GameKind::MathChallenge,
            "2 + 3?",
            vec!["4".into(), "5".into()],
            1,
            "Five",
        )
        .unwrap();
        Story::assemble(&params, &plan, drafts, game).unwrap()
    }

    #[test]
    fn test_story_dto_hides_answer_and_marks_pending_media() {
        let story = story();
        let value = serde_json::to_value(StoryDto::from(&story)).unwrap();

        assert_eq!(value["pages"].as_array().unwrap().len(), 4);
        assert_eq!(value["pages"][0]["media_pending"], true);
        assert!(value["pages"][0]["image"].is_null());
        assert_eq!(value["game"]["options"][1], "5");
        assert!(value["game"].get("correct_answer_index").is_none());
        assert_eq!(value["media_complete"], false);
    }

    #[test]
    fn test_page_dto_reports_placeholder() {
        let mut story = story();
        let page = story
            .page(0)
            .unwrap()
            .with_media(Illustration::placeholder("https://picsum.photos", "scene 1"), None);
        story.replace_page(0, page).unwrap();

        let dto = PageDto::from(story.page(0).unwrap());
        assert!(dto.image_placeholder);
        assert!(!dto.has_narration);
        assert!(!dto.media_pending);
        assert!(dto.image.unwrap().starts_with("https://picsum.photos/seed/"));
    }

    #[test]
    fn test_navigate_request_direction() {
        let req: NavigateRequest =
            serde_json::from_str(r#"{"session_id":"s1","direction":"mini_game"}"#).unwrap();
        assert_eq!(req.direction, NavigationDirection::MiniGame);
    }
}
