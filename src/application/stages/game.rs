//! 小游戏阶段：根据故事内容出一道选择题

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use super::AUDIENCE;
use crate::application::error::GenerationError;
use crate::application::ports::{GenerativeServicePort, StructuredRequest};
use crate::domain::story::{GameKind, MiniGame, StoryParameters, Subject};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGame {
    #[serde(rename = "type")]
    kind: String,
    question: String,
    options: Vec<String>,
    correct_answer_index: i64,
    #[serde(default)]
    explanation: String,
}

/// 取正文的前 `limit` 个字符（按字符边界截断）
pub fn story_context(narration: &str, limit: usize) -> &str {
    match narration.char_indices().nth(limit) {
        Some((byte_index, _)) => &narration[..byte_index],
        None => narration,
    }
}

pub struct GameStage {
    service: Arc<dyn GenerativeServicePort>,
    context_chars: usize,
}

impl GameStage {
    pub fn new(service: Arc<dyn GenerativeServicePort>, context_chars: usize) -> Self {
        Self {
            service,
            context_chars,
        }
    }

    /// `narration` 为所有页面正文按顺序拼接的文本
    pub async fn run(
        &self,
        narration: &str,
        params: &StoryParameters,
    ) -> Result<MiniGame, GenerationError> {
        let request = self.build_request(narration, params);
        let value = self
            .service
            .request_structured_content(request)
            .await
            .map_err(|e| GenerationError::from_service(e, GenerationError::GameFailure))?;

        let raw: RawGame = serde_json::from_value(value)
            .map_err(|e| GenerationError::GameFailure(format!("malformed game: {}", e)))?;

        let kind = GameKind::from_str(&raw.kind).unwrap_or_else(|| {
            let fallback = default_kind(params.subject());
            tracing::warn!(
                reported = %raw.kind,
                fallback = fallback.as_str(),
                "Unknown game type, using subject default"
            );
            fallback
        });

        let correct_answer_index = usize::try_from(raw.correct_answer_index).map_err(|_| {
            GenerationError::GameFailure(format!(
                "negative answer index {}",
                raw.correct_answer_index
            ))
        })?;

        let game = MiniGame::new(
            kind,
            raw.question,
            raw.options,
            correct_answer_index,
            raw.explanation,
        )
        .map_err(|e| GenerationError::GameFailure(e.to_string()))?;

        tracing::info!(kind = game.kind().as_str(), options = game.options().len(), "Mini-game ready");
        Ok(game)
    }

    fn build_request(&self, narration: &str, params: &StoryParameters) -> StructuredRequest {
        let focus = match params.subject() {
            Subject::Story => "reading comprehension (why did something happen?)".to_string(),
            other => format!("{} skills related to the story", other.as_str()),
        };

        let system_instruction = format!(
            "You design a short learning game for a children's story that has just been read.\n\
             {audience}\n\
             Subject: {subject}\n\
             Language: {language}\n\n\
             Task: create 1 multiple-choice question to test {focus}.\n\n\
             Example for math: \"If the hero found 2 apples and 3 oranges, how many fruits in total?\"\n\
             Example for story: \"Why was the robot sad in the beginning?\"",
            audience = AUDIENCE,
            subject = params.subject().as_str(),
            language = params.language().display_name(),
            focus = focus,
        );

        let prompt = format!(
            "Story context: {}... Create the game.",
            story_context(narration, self.context_chars)
        );

        StructuredRequest::new(system_instruction, prompt, game_schema())
    }
}

fn default_kind(subject: Subject) -> GameKind {
    if subject.is_numeric() {
        GameKind::MathChallenge
    } else {
        GameKind::Quiz
    }
}

fn game_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "type": { "type": "STRING", "enum": ["quiz", "math_challenge"] },
            "question": { "type": "STRING" },
            "options": { "type": "ARRAY", "items": { "type": "STRING" } },
            "correctAnswerIndex": { "type": "INTEGER" },
            "explanation": { "type": "STRING" }
        },
        "required": ["type", "question", "options", "correctAnswerIndex", "explanation"]
    })
}
