//! Story Context - Entities

use serde::{Deserialize, Serialize};

use super::{GameKind, Illustration, NarrationAudio, StoryError};

/// 页面草稿（写作阶段产物，尚无媒体）
///
/// 不变量:
/// - page_number 从 1 开始，与页面在故事中的位置一致
/// - 正文和插图提示词非空
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDraft {
    page_number: u32,
    text: String,
    image_prompt: String,
}

impl PageDraft {
    pub fn new(
        page_number: u32,
        text: impl Into<String>,
        image_prompt: impl Into<String>,
    ) -> Result<Self, StoryError> {
        let text = text.into();
        let image_prompt = image_prompt.into();

        if page_number == 0 {
            return Err(StoryError::InvalidPage(
                "page numbers start at 1".to_string(),
            ));
        }
        if text.trim().is_empty() {
            return Err(StoryError::InvalidPage(format!(
                "page {} has no text",
                page_number
            )));
        }
        if image_prompt.trim().is_empty() {
            return Err(StoryError::InvalidPage(format!(
                "page {} has no image prompt",
                page_number
            )));
        }

        Ok(Self {
            page_number,
            text,
            image_prompt,
        })
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn image_prompt(&self) -> &str {
        &self.image_prompt
    }

    pub(crate) fn with_image_prompt(mut self, image_prompt: String) -> Self {
        self.image_prompt = image_prompt;
        self
    }
}

/// 故事页面
///
/// 生命周期: 写作阶段创建为纯文本（media_pending = true），
/// 媒体扇出时整页替换一次，之后不再变化
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(flatten)]
    draft: PageDraft,
    illustration: Option<Illustration>,
    narration: Option<NarrationAudio>,
    media_pending: bool,
}

impl Page {
    /// 从草稿创建，媒体待生成
    pub fn from_draft(draft: PageDraft) -> Self {
        Self {
            draft,
            illustration: None,
            narration: None,
            media_pending: true,
        }
    }

    /// 合并插图和旁白，返回新页面
    pub fn with_media(&self, illustration: Illustration, narration: Option<NarrationAudio>) -> Self {
        Self {
            draft: self.draft.clone(),
            illustration: Some(illustration),
            narration,
            media_pending: false,
        }
    }

    pub fn draft(&self) -> &PageDraft {
        &self.draft
    }

    pub fn page_number(&self) -> u32 {
        self.draft.page_number()
    }

    pub fn text(&self) -> &str {
        self.draft.text()
    }

    pub fn image_prompt(&self) -> &str {
        self.draft.image_prompt()
    }

    pub fn illustration(&self) -> Option<&Illustration> {
        self.illustration.as_ref()
    }

    pub fn narration(&self) -> Option<&NarrationAudio> {
        self.narration.as_ref()
    }

    pub fn is_media_pending(&self) -> bool {
        self.media_pending
    }
}

/// 作答结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub selected_index: usize,
    pub correct_index: usize,
    pub explanation: String,
}

/// 小游戏（单道选择题）
///
/// 不变量:
/// - 选项非空，顺序即显示和索引顺序
/// - correct_answer_index 是选项的有效下标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniGame {
    #[serde(rename = "type")]
    kind: GameKind,
    question: String,
    options: Vec<String>,
    correct_answer_index: usize,
    explanation: String,
}

impl MiniGame {
    pub fn new(
        kind: GameKind,
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer_index: usize,
        explanation: impl Into<String>,
    ) -> Result<Self, StoryError> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(StoryError::InvalidGame("empty question".to_string()));
        }
        if options.is_empty() {
            return Err(StoryError::InvalidGame("no options".to_string()));
        }
        if correct_answer_index >= options.len() {
            return Err(StoryError::InvalidGame(format!(
                "correct index {} out of {} options",
                correct_answer_index,
                options.len()
            )));
        }

        Ok(Self {
            kind,
            question,
            options,
            correct_answer_index,
            explanation: explanation.into(),
        })
    }

    pub fn kind(&self) -> GameKind {
        self.kind
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_answer_index(&self) -> usize {
        self.correct_answer_index
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// 判定所选答案
    pub fn check_answer(&self, selected_index: usize) -> Result<AnswerOutcome, StoryError> {
        if selected_index >= self.options.len() {
            return Err(StoryError::AnswerOutOfRange(selected_index));
        }
        Ok(AnswerOutcome {
            correct: selected_index == self.correct_answer_index,
            selected_index,
            correct_index: self.correct_answer_index,
            explanation: self.explanation.clone(),
        })
    }
}
