//! Story Context - Aggregate Root

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Language, MiniGame, Page, PageDraft, StoryError, StoryId, StoryParameters, StoryPlan, Subject,
};

/// Story 聚合根
///
/// 不变量:
/// - 页数在创建时确定，之后不变
/// - 第 i 个页面的 page_number 为 i + 1
/// - 页面只能整页替换
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    id: StoryId,
    created_at: DateTime<Utc>,
    title: String,
    moral: String,
    theme: String,
    subject: Subject,
    language: Language,
    pages: Vec<Page>,
    game: MiniGame,
}

impl Story {
    /// 用三个阶段的产物组装故事，所有页面处于媒体待生成状态
    pub fn assemble(
        params: &StoryParameters,
        plan: &StoryPlan,
        drafts: Vec<PageDraft>,
        game: MiniGame,
    ) -> Result<Self, StoryError> {
        if drafts.len() != plan.beat_count() {
            return Err(StoryError::PageCountMismatch {
                expected: plan.beat_count(),
                actual: drafts.len(),
            });
        }
        for (index, draft) in drafts.iter().enumerate() {
            if draft.page_number() as usize != index + 1 {
                return Err(StoryError::InvalidPage(format!(
                    "page at position {} is numbered {}",
                    index + 1,
                    draft.page_number()
                )));
            }
        }

        Ok(Self {
            id: StoryId::new(),
            created_at: Utc::now(),
            title: plan.title().to_string(),
            moral: plan.moral().to_string(),
            theme: params.theme().to_string(),
            subject: params.subject(),
            language: params.language(),
            pages: drafts.into_iter().map(Page::from_draft).collect(),
            game,
        })
    }

    /// 整页替换
    pub fn replace_page(&mut self, index: usize, page: Page) -> Result<(), StoryError> {
        let slot = self
            .pages
            .get_mut(index)
            .ok_or(StoryError::PageOutOfRange(index))?;
        if slot.page_number() != page.page_number() {
            return Err(StoryError::InvalidPage(format!(
                "cannot replace page {} with page {}",
                slot.page_number(),
                page.page_number()
            )));
        }
        *slot = page;
        Ok(())
    }

    // Getters
    pub fn id(&self) -> &StoryId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn moral(&self) -> &str {
        &self.moral
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn subject(&self) -> Subject {
        self.subject
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// 按位置取页面（从 0 开始）
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// 按页码取页面（从 1 开始）
    pub fn page_by_number(&self, page_number: u32) -> Option<&Page> {
        (page_number as usize)
            .checked_sub(1)
            .and_then(|index| self.pages.get(index))
    }

    pub fn game(&self) -> &MiniGame {
        &self.game
    }

    pub fn is_media_complete(&self) -> bool {
        self.pages.iter().all(|p| !p.is_media_pending())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::story::{GameKind, Illustration};

    fn fixture(pages: usize) -> (StoryParameters, StoryPlan, Vec<PageDraft>, MiniGame) {
        let params =
            StoryParameters::new("Robot", "Space", "", Subject::Math, Language::En, None).unwrap();
        let plan = StoryPlan::new(
            "Robo in Space",
            "Counting helps",
            "a small blue robot",
            (1..=4).map(|i| format!("beat {}", i)).collect(),
            4,
        )
        .unwrap();
        let drafts = (1..=pages as u32)
            .map(|n| PageDraft::new(n, format!("text {}", n), "a small blue robot").unwrap())
            .collect();
        let game = MiniGame::new(
            GameKind::MathChallenge,
            "2+2?",
            vec!["3".into(), "4".into()],
            1,
            "",
        )
        .unwrap();
        (params, plan, drafts, game)
    }

    #[test]
    fn test_assemble_story() {
        let (params, plan, drafts, game) = fixture(4);
        let story = Story::assemble(&params, &plan, drafts, game).unwrap();
        assert_eq!(story.page_count(), 4);
        assert_eq!(story.subject(), Subject::Math);
        assert_eq!(story.language(), Language::En);
        assert_eq!(story.theme(), "Adventure");
        assert!(!story.is_media_complete());
        assert!(story.game().correct_answer_index() < story.game().options().len());
    }

    #[test]
    fn test_assemble_rejects_wrong_page_count() {
        let (params, plan, drafts, game) = fixture(3);
        assert_eq!(
            Story::assemble(&params, &plan, drafts, game).unwrap_err(),
            StoryError::PageCountMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_replace_page() {
        let (params, plan, drafts, game) = fixture(4);
        let mut story = Story::assemble(&params, &plan, drafts, game).unwrap();

        let updated = story.pages()[1].with_media(
            Illustration::placeholder("https://picsum.photos", "x"),
            None,
        );
        story.replace_page(1, updated).unwrap();
        assert!(!story.pages()[1].is_media_pending());
        assert!(story.pages()[0].is_media_pending());

        let wrong = story.pages()[0].clone();
        assert!(story.replace_page(2, wrong).is_err());
        let extra = story.pages()[0].clone();
        assert_eq!(
            story.replace_page(9, extra).unwrap_err(),
            StoryError::PageOutOfRange(9)
        );
        assert_eq!(story.page_by_number(2).unwrap().page_number(), 2);
        assert!(story.page_by_number(0).is_none());
    }
}
