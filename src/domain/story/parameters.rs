//! Story Context - 用户输入参数

use serde::{Deserialize, Serialize};

use super::{Language, StoryError, Subject};

const DEFAULT_CHARACTER: &str = "Friend";
const DEFAULT_SETTING: &str = "Fun Place";
const DEFAULT_THEME: &str = "Adventure";

/// 故事参数（不可变输入）
///
/// 不变量:
/// - 没有自由提示词时，主角和场景必须非空
/// - 空白的自由提示词视为未提供
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryParameters {
    character: String,
    setting: String,
    theme: String,
    subject: Subject,
    language: Language,
    custom_prompt: Option<String>,
}

impl StoryParameters {
    pub fn new(
        character: impl Into<String>,
        setting: impl Into<String>,
        theme: impl Into<String>,
        subject: Subject,
        language: Language,
        custom_prompt: Option<String>,
    ) -> Result<Self, StoryError> {
        let character = character.into().trim().to_string();
        let setting = setting.into().trim().to_string();
        let theme = theme.into().trim().to_string();
        let custom_prompt = custom_prompt
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        // 有自由提示词时，缺省字段用向导的默认值补齐
        let (character, setting) = match custom_prompt {
            Some(_) => (
                or_default(character, DEFAULT_CHARACTER),
                or_default(setting, DEFAULT_SETTING),
            ),
            None => {
                if character.is_empty() {
                    return Err(StoryError::MissingParameter("character"));
                }
                if setting.is_empty() {
                    return Err(StoryError::MissingParameter("setting"));
                }
                (character, setting)
            }
        };

        Ok(Self {
            character,
            setting,
            theme: or_default(theme, DEFAULT_THEME),
            subject,
            language,
            custom_prompt,
        })
    }

    pub fn character(&self) -> &str {
        &self.character
    }

    pub fn setting(&self) -> &str {
        &self.setting
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

    pub fn custom_prompt(&self) -> Option<&str> {
        self.custom_prompt.as_deref()
    }
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}
