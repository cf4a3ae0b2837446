//! 媒体扇出：逐页生成插图与朗读音频
//!
//! 同一页的插图和朗读并发请求；页与页之间严格顺序执行，
//! 第 k 页整页替换并发布之后才开始请求第 k+1 页

use std::sync::Arc;

use crate::application::error::GenerationError;
use crate::application::ports::GenerativeServicePort;
use crate::domain::story::{Illustration, Language, NarrationAudio, Page, Story};

/// 扇出进度回调
pub enum MediaProgress<'a> {
    /// 开始请求某一页的媒体
    PageStarted { page_number: u32 },
    /// 某一页已替换完成，`story` 为替换后的故事
    PageCompleted { page_number: u32, story: &'a Story },
}

pub struct MediaFanout {
    service: Arc<dyn GenerativeServicePort>,
    placeholder_base_url: String,
}

impl MediaFanout {
    pub fn new(service: Arc<dyn GenerativeServicePort>, placeholder_base_url: impl Into<String>) -> Self {
        Self {
            service,
            placeholder_base_url: placeholder_base_url.into(),
        }
    }

    pub async fn run<F>(&self, mut story: Story, mut on_progress: F) -> Result<Story, GenerationError>
    where
        F: FnMut(MediaProgress<'_>),
    {
        let language = story.language();

        for index in 0..story.page_count() {
            let page = story.page(index).cloned().ok_or_else(|| {
                GenerationError::MediaFailure(format!("page index {} missing", index))
            })?;
            let page_number = page.page_number();
            on_progress(MediaProgress::PageStarted { page_number });

            let (illustration, narration) =
                tokio::join!(self.illustrate(&page), self.narrate(&page, language));

            story
                .replace_page(index, page.with_media(illustration, narration))
                .map_err(|e| GenerationError::MediaFailure(e.to_string()))?;

            on_progress(MediaProgress::PageCompleted {
                page_number,
                story: &story,
            });
        }

        Ok(story)
    }

    /// 插图失败时退回到占位图，不会中断管线
    async fn illustrate(&self, page: &Page) -> Illustration {
        match self.service.request_image(page.image_prompt()).await {
            Ok(image) if !image.data.is_empty() => {
                Illustration::generated(&image.mime_type, &image.data)
            }
            Ok(_) => {
                tracing::warn!(page_number = page.page_number(), "Empty image returned, using placeholder");
                self.placeholder(page)
            }
            Err(e) => {
                tracing::warn!(
                    page_number = page.page_number(),
                    error = %e,
                    "Image generation failed, using placeholder"
                );
                self.placeholder(page)
            }
        }
    }

    /// 朗读失败时该页没有音频
    async fn narrate(&self, page: &Page, language: Language) -> Option<NarrationAudio> {
        match self.service.request_speech(page.text(), language).await {
            Ok(speech) => {
                let mime_type = speech.mime_type.clone();
                let audio = NarrationAudio::from_mime(&speech.mime_type, speech.data);
                if audio.is_none() {
                    tracing::warn!(
                        page_number = page.page_number(),
                        mime_type = %mime_type,
                        "Unusable speech audio, page will have no narration"
                    );
                }
                audio
            }
            Err(e) => {
                tracing::warn!(
                    page_number = page.page_number(),
                    error = %e,
                    "Speech generation failed, page will have no narration"
                );
                None
            }
        }
    }

    fn placeholder(&self, page: &Page) -> Illustration {
        Illustration::placeholder(&self.placeholder_base_url, page.image_prompt())
    }
}
