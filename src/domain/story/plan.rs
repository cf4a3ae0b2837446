//! Story Context - 故事计划（规划阶段产物）

use serde::{Deserialize, Serialize};

use super::StoryError;

/// 故事计划
///
/// 不变量:
/// - 情节大纲条目数等于页数
/// - 角色视觉描述非空（后续每个插图提示词都引用它）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryPlan {
    title: String,
    moral: String,
    visual_description: String,
    outline: Vec<String>,
}

impl StoryPlan {
    pub fn new(
        title: impl Into<String>,
        moral: impl Into<String>,
        visual_description: impl Into<String>,
        outline: Vec<String>,
        expected_beats: usize,
    ) -> Result<Self, StoryError> {
        let title = title.into().trim().to_string();
        let visual_description = visual_description.into().trim().to_string();

        if title.is_empty() {
            return Err(StoryError::InvalidPlan("empty title".to_string()));
        }
        if visual_description.is_empty() {
            return Err(StoryError::InvalidPlan(
                "empty visual description".to_string(),
            ));
        }
        if outline.len() != expected_beats {
            return Err(StoryError::InvalidPlan(format!(
                "expected {} outline entries, got {}",
                expected_beats,
                outline.len()
            )));
        }
        if outline.iter().any(|beat| beat.trim().is_empty()) {
            return Err(StoryError::InvalidPlan("empty outline entry".to_string()));
        }

        Ok(Self {
            title,
            moral: moral.into(),
            visual_description,
            outline,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn moral(&self) -> &str {
        &self.moral
    }

    pub fn visual_description(&self) -> &str {
        &self.visual_description
    }

    pub fn outline(&self) -> &[String] {
        &self.outline
    }

    pub fn beat_count(&self) -> usize {
        self.outline.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outline(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("beat {}", i)).collect()
    }

    #[test]
    fn test_plan_requires_exact_beats() {
        assert!(StoryPlan::new("T", "M", "a blue robot", outline(4), 4).is_ok());
        assert!(matches!(
            StoryPlan::new("T", "M", "a blue robot", outline(3), 4),
            Err(StoryError::InvalidPlan(_))
        ));
    }

    #[test]
    fn test_plan_requires_visual_description() {
        assert!(StoryPlan::new("T", "M", "   ", outline(4), 4).is_err());
        assert!(StoryPlan::new("", "M", "a blue robot", outline(4), 4).is_err());
    }
}
