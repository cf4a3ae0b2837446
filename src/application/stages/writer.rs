//! 写作阶段：按大纲写出每页正文与插图提示词

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use super::AUDIENCE;
use crate::application::error::GenerationError;
use crate::application::ports::{GenerativeServicePort, StructuredRequest};
use crate::domain::story::{PageDraft, StoryParameters, StoryPlan};

#[derive(Debug, Deserialize)]
struct RawPages {
    pages: Vec<RawPage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPage {
    #[serde(default)]
    page_number: Option<i64>,
    text: String,
    image_prompt: String,
}

pub struct WriterStage {
    service: Arc<dyn GenerativeServicePort>,
    page_count: usize,
    enforce_visual_anchor: bool,
}

impl WriterStage {
    pub fn new(
        service: Arc<dyn GenerativeServicePort>,
        page_count: usize,
        enforce_visual_anchor: bool,
    ) -> Self {
        Self {
            service,
            page_count,
            enforce_visual_anchor,
        }
    }

    pub async fn run(
        &self,
        plan: &StoryPlan,
        params: &StoryParameters,
    ) -> Result<Vec<PageDraft>, GenerationError> {
        let request = self.build_request(plan, params);
        let value = self
            .service
            .request_structured_content(request)
            .await
            .map_err(|e| GenerationError::from_service(e, GenerationError::WritingFailure))?;

        let raw: RawPages = serde_json::from_value(value)
            .map_err(|e| GenerationError::WritingFailure(format!("malformed pages: {}", e)))?;

        if raw.pages.len() != self.page_count {
            return Err(GenerationError::WritingFailure(format!(
                "expected {} pages, got {}",
                self.page_count,
                raw.pages.len()
            )));
        }

        let anchor = plan.visual_description();
        let mut drafts = Vec::with_capacity(raw.pages.len());
        for (index, page) in raw.pages.into_iter().enumerate() {
            let position = (index + 1) as u32;
            if page.page_number != Some(position as i64) {
                tracing::warn!(
                    position,
                    reported = ?page.page_number,
                    "Writer returned misnumbered page, renumbering by position"
                );
            }

            let mut draft = PageDraft::new(position, page.text, page.image_prompt)
                .map_err(|e| GenerationError::WritingFailure(e.to_string()))?;

            if self.enforce_visual_anchor && !draft.image_prompt().contains(anchor) {
                tracing::debug!(position, "Image prompt missing visual description, prepending");
                let prompt = format!("{}, {}", anchor, draft.image_prompt());
                draft = draft.with_image_prompt(prompt);
            }
            drafts.push(draft);
        }

        tracing::info!(pages = drafts.len(), "Story pages written");
        Ok(drafts)
    }

    fn build_request(&self, plan: &StoryPlan, params: &StoryParameters) -> StructuredRequest {
        let outline = plan
            .outline()
            .iter()
            .enumerate()
            .map(|(i, beat)| format!("{}. {}", i + 1, beat))
            .collect::<Vec<_>>()
            .join("\n");

        let system_instruction = format!(
            "You write and art-direct children's picture books.\n\
             {audience}\n\n\
             Input plan:\n\
             - Title: {title}\n\
             - Character visuals: \"{visuals}\" (MUST be used in every image prompt)\n\
             - Plot:\n{outline}\n\n\
             Instructions:\n\
             1. Write story text in {language}.\n\
             2. Write exactly {pages} pages based on the plot outline, numbered from 1.\n\
             3. For 'imagePrompt', write a detailed stable-diffusion style prompt. \
             You MUST include \"{visuals}\" in EVERY image prompt so the character looks the same. \
             Style: \"3D Pixar style, cute, vibrant, 4k render\".",
            audience = AUDIENCE,
            title = plan.title(),
            visuals = plan.visual_description(),
            outline = outline,
            language = params.language().display_name(),
            pages = self.page_count,
        );

        StructuredRequest::new(system_instruction, "Write the book pages.", pages_schema())
    }
}

fn pages_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "pages": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "pageNumber": { "type": "INTEGER" },
                        "text": { "type": "STRING" },
                        "imagePrompt": { "type": "STRING" }
                    },
                    "required": ["pageNumber", "text", "imagePrompt"]
                }
            }
        },
        "required": ["pages"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::stages::test_support::ScriptedService;
    use crate::domain::story::{Language, Subject};

    const VISUALS: &str = "a small round blue robot with a yellow antenna";

    fn plan() -> StoryPlan {
        let outline = (1..=4).map(|i| format!("beat {}", i)).collect();
        StoryPlan::new("Robo", "Share", VISUALS, outline, 4).unwrap()
    }

    fn params() -> StoryParameters {
        StoryParameters::new("Robot", "Space", "", Subject::Story, Language::Id, None).unwrap()
    }

    fn page(number: i64, prompt: &str) -> Value {
        json!({
            "pageNumber": number,
            "text": format!("text {}", number),
            "imagePrompt": prompt
        })
    }

    #[tokio::test]
    async fn test_pages_written_in_order() {
        let pages: Vec<Value> = (1..=4)
            .map(|n| page(n, &format!("{}, scene {}", VISUALS, n)))
            .collect();
        let service = Arc::new(ScriptedService::with_content(Ok(json!({ "pages": pages }))));
        let stage = WriterStage::new(service.clone(), 4, true);

        let drafts = stage.run(&plan(), &params()).await.unwrap();
        assert_eq!(drafts.len(), 4);
        for (i, draft) in drafts.iter().enumerate() {
            assert_eq!(draft.page_number() as usize, i + 1);
            assert!(draft.image_prompt().contains(VISUALS));
        }
        assert!(service
            .last_request()
            .system_instruction
            .contains("Write story text in Indonesian."));
    }

    #[tokio::test]
    async fn test_short_page_list_is_writing_failure() {
        let pages: Vec<Value> = (1..=3).map(|n| page(n, VISUALS)).collect();
        let stage = WriterStage::new(
            Arc::new(ScriptedService::with_content(Ok(json!({ "pages": pages })))),
            4,
            true,
        );

        let err = stage.run(&plan(), &params()).await.unwrap_err();
        assert!(matches!(err, GenerationError::WritingFailure(_)));
    }

    #[tokio::test]
    async fn test_misnumbered_pages_are_renumbered() {
        let pages: Vec<Value> = [0, 0, 7, 3].iter().map(|&n| page(n, VISUALS)).collect();
        let stage = WriterStage::new(
            Arc::new(ScriptedService::with_content(Ok(json!({ "pages": pages })))),
            4,
            true,
        );

        let drafts = stage.run(&plan(), &params()).await.unwrap();
        let numbers: Vec<u32> = drafts.iter().map(|d| d.page_number()).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_missing_anchor_is_prepended() {
        let pages: Vec<Value> = (1..=4).map(|n| page(n, "a robot waving")).collect();
        let stage = WriterStage::new(
            Arc::new(ScriptedService::with_content(Ok(json!({ "pages": pages })))),
            4,
            true,
        );

        let drafts = stage.run(&plan(), &params()).await.unwrap();
        assert_eq!(
            drafts[0].image_prompt(),
            format!("{}, a robot waving", VISUALS)
        );
    }

    #[tokio::test]
    async fn test_anchor_left_alone_when_disabled() {
        let pages: Vec<Value> = (1..=4).map(|n| page(n, "a robot waving")).collect();
        let stage = WriterStage::new(
            Arc::new(ScriptedService::with_content(Ok(json!({ "pages": pages })))),
            4,
            false,
        );

        let drafts = stage.run(&plan(), &params()).await.unwrap();
        assert_eq!(drafts[0].image_prompt(), "a robot waving");
    }

    #[tokio::test]
    async fn test_blank_page_text_is_writing_failure() {
        let mut pages: Vec<Value> = (1..=4).map(|n| page(n, VISUALS)).collect();
        pages[1]["text"] = json!("   ");
        let stage = WriterStage::new(
            Arc::new(ScriptedService::with_content(Ok(json!({ "pages": pages })))),
            4,
            true,
        );

        let err = stage.run(&plan(), &params()).await.unwrap_err();
        assert!(matches!(err, GenerationError::WritingFailure(_)));
    }
}
