//! Story Context - 按语言的进度提示

use super::Language;

/// 生成流程中对用户可见的步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStep {
    Planning,
    Painting { page_number: u32 },
    Ready,
    Failed,
}

pub fn progress_message(language: Language, step: ProgressStep) -> String {
    match (language, step) {
        (Language::Id, ProgressStep::Planning) => "🤖 Merencanakan petualangan...".to_string(),
        (Language::En, ProgressStep::Planning) => "🤖 Planning adventure...".to_string(),
        (Language::Id, ProgressStep::Painting { page_number }) => {
            format!("🎨 Menggambar halaman {}...", page_number)
        }
        (Language::En, ProgressStep::Painting { page_number }) => {
            format!("🎨 Painting page {}...", page_number)
        }
        (Language::Id, ProgressStep::Ready) => "✨ Ceritamu sudah siap!".to_string(),
        (Language::En, ProgressStep::Ready) => "✨ Your story is ready!".to_string(),
        (Language::Id, ProgressStep::Failed) => {
            "Ups! Peri ajaib sedang bingung. Silakan coba lagi.".to_string()
        }
        (Language::En, ProgressStep::Failed) => {
            "Oops! The magic sprites got confused. Please try again.".to_string()
        }
    }
}
