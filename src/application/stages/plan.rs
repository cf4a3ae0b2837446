//! 规划阶段：标题、寓意、角色外观描述与分页大纲

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use super::AUDIENCE;
use crate::application::error::GenerationError;
use crate::application::ports::{GenerativeServicePort, StructuredRequest};
use crate::domain::story::{StoryParameters, StoryPlan};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlan {
    title: String,
    moral: String,
    character_visual_description: String,
    plot_outline: Vec<String>,
}

pub struct PlanStage {
    service: Arc<dyn GenerativeServicePort>,
    page_count: usize,
}

impl PlanStage {
    pub fn new(service: Arc<dyn GenerativeServicePort>, page_count: usize) -> Self {
        Self {
            service,
            page_count,
        }
    }

    pub async fn run(&self, params: &StoryParameters) -> Result<StoryPlan, GenerationError> {
        let request = self.build_request(params);
        let value = self
            .service
            .request_structured_plan(request)
            .await
            .map_err(|e| GenerationError::from_service(e, GenerationError::PlanningFailure))?;

        let raw: RawPlan = serde_json::from_value(value)
            .map_err(|e| GenerationError::PlanningFailure(format!("malformed plan: {}", e)))?;

        let plan = StoryPlan::new(
            raw.title,
            raw.moral,
            raw.character_visual_description,
            raw.plot_outline,
            self.page_count,
        )
        .map_err(|e| GenerationError::PlanningFailure(e.to_string()))?;

        tracing::info!(title = %plan.title(), beats = plan.beat_count(), "Story plan ready");
        Ok(plan)
    }

    fn build_request(&self, params: &StoryParameters) -> StructuredRequest {
        let n = self.page_count;
        let structure = if n == 4 {
            "Outline a 4-part plot (Beginning, Conflict, Climax, Resolution), one sentence per part.".to_string()
        } else {
            format!("Outline a {}-part plot, one sentence per part.", n)
        };

        let system_instruction = format!(
            "You plan children's picture books.\n\
             {audience}\n\
             Language: {language}.\n\n\
             Task:\n\
             1. Create a title.\n\
             2. Define a clear moral message.\n\
             3. Write a visual style guide for the main character so they look the same in every picture \
             (for example 'a cute blue robot with round eyes and a yellow antenna').\n\
             4. {structure}\n\n\
             Theme: {theme}\n\
             Subject: {subject}\n\
             Character type: {character}\n\
             Setting: {setting}\n\
             Custom idea: {custom}",
            audience = AUDIENCE,
            language = params.language().display_name(),
            structure = structure,
            theme = params.theme(),
            subject = params.subject().as_str(),
            character = params.character(),
            setting = params.setting(),
            custom = params.custom_prompt().unwrap_or("None"),
        );

        StructuredRequest::new(system_instruction, "Create the story plan.", plan_schema(n))
    }
}

fn plan_schema(page_count: usize) -> Value {
    let outline_description = format!(
        "{} sentences outlining the {} pages.",
        page_count, page_count
    );
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "moral": { "type": "STRING" },
            "characterVisualDescription": {
                "type": "STRING",
                "description": "Detailed visual description of the hero for image generation consistency."
            },
            "plotOutline": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": outline_description
            }
        },
        "required": ["title", "moral", "characterVisualDescription", "plotOutline"]
    })
}
