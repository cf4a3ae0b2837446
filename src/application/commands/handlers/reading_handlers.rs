//! Reading Command Handlers

use std::sync::Arc;

use crate::application::commands::reading_commands::*;
use crate::application::error::ApplicationError;
use crate::application::library::StoryLookup;
use crate::application::playback::{ReadingPosition, ReadingSession};
use crate::application::ports::ReadingSessionsPort;
use crate::domain::story::AnswerOutcome;

fn find_session(
    sessions: &dyn ReadingSessionsPort,
    session_id: &str,
) -> Result<Arc<ReadingSession>, ApplicationError> {
    sessions
        .get(session_id)
        .ok_or_else(|| ApplicationError::not_found("ReadingSession", session_id))
}

/// 用最新快照刷新会话中的故事（生成插图期间页面会逐页补全）
async fn refresh(lookup: &StoryLookup, session: &ReadingSession) {
    let story_id = *session.story().id();
    if let Some(latest) = lookup.find(&story_id).await {
        session.refresh_story(latest);
    }
}

/// OpenReading Handler
pub struct OpenReadingHandler {
    sessions: Arc<dyn ReadingSessionsPort>,
    lookup: StoryLookup,
}

impl OpenReadingHandler {
    pub fn new(sessions: Arc<dyn ReadingSessionsPort>, lookup: StoryLookup) -> Self {
        Self { sessions, lookup }
    }

    pub async fn handle(&self, cmd: OpenReading) -> Result<ReadingPosition, ApplicationError> {
        let story = match cmd.story_id {
            Some(id) => self
                .lookup
                .find(&id)
                .await
                .ok_or_else(|| ApplicationError::not_found("Story", id))?,
            None => self
                .lookup
                .current()
                .ok_or_else(|| ApplicationError::invalid_state("no story has been generated yet"))?,
        };

        let session = self.sessions.open(story)?;
        let position = session.position();

        tracing::info!(
            session_id = %position.session_id,
            story_id = %position.story_id,
            "Reading session opened"
        );

        Ok(position)
    }
}

/// Navigate Handler
pub struct NavigateHandler {
    sessions: Arc<dyn ReadingSessionsPort>,
    lookup: StoryLookup,
}

impl NavigateHandler {
    pub fn new(sessions: Arc<dyn ReadingSessionsPort>, lookup: StoryLookup) -> Self {
        Self { sessions, lookup }
    }

    pub async fn handle(&self, cmd: Navigate) -> Result<ReadingPosition, ApplicationError> {
        let session = find_session(self.sessions.as_ref(), &cmd.session_id)?;
        refresh(&self.lookup, &session).await;
        Ok(session.navigate(cmd.direction))
    }
}

/// PlayPageAudio Handler
pub struct PlayPageAudioHandler {
    sessions: Arc<dyn ReadingSessionsPort>,
    lookup: StoryLookup,
}

impl PlayPageAudioHandler {
    pub fn new(sessions: Arc<dyn ReadingSessionsPort>, lookup: StoryLookup) -> Self {
        Self { sessions, lookup }
    }

    pub async fn handle(
        &self,
        cmd: PlayPageAudio,
    ) -> Result<PlayPageAudioResponse, ApplicationError> {
        let session = find_session(self.sessions.as_ref(), &cmd.session_id)?;
        refresh(&self.lookup, &session).await;

        let played = session.play_current().await?;
        if !played {
            tracing::debug!(session_id = %cmd.session_id, "Current page has no narration");
        }

        Ok(PlayPageAudioResponse {
            played,
            position: session.position(),
        })
    }
}

/// StopPageAudio Handler
pub struct StopPageAudioHandler {
    sessions: Arc<dyn ReadingSessionsPort>,
}

impl StopPageAudioHandler {
    pub fn new(sessions: Arc<dyn ReadingSessionsPort>) -> Self {
        Self { sessions }
    }

    pub async fn handle(&self, cmd: StopPageAudio) -> Result<ReadingPosition, ApplicationError> {
        let session = find_session(self.sessions.as_ref(), &cmd.session_id)?;
        session.stop();
        Ok(session.position())
    }
}

/// ExitReading Handler
pub struct ExitReadingHandler {
    sessions: Arc<dyn ReadingSessionsPort>,
}

impl ExitReadingHandler {
    pub fn new(sessions: Arc<dyn ReadingSessionsPort>) -> Self {
        Self { sessions }
    }

    pub async fn handle(&self, cmd: ExitReading) -> Result<(), ApplicationError> {
        self.sessions
            .close(&cmd.session_id)
            .ok_or_else(|| ApplicationError::not_found("ReadingSession", &cmd.session_id))?;
        Ok(())
    }
}

/// AnswerMiniGame Handler
pub struct AnswerMiniGameHandler {
    sessions: Arc<dyn ReadingSessionsPort>,
}

impl AnswerMiniGameHandler {
    pub fn new(sessions: Arc<dyn ReadingSessionsPort>) -> Self {
        Self { sessions }
    }

    pub async fn handle(&self, cmd: AnswerMiniGame) -> Result<AnswerOutcome, ApplicationError> {
        let session = find_session(self.sessions.as_ref(), &cmd.session_id)?;
        if !session.position().on_mini_game {
            return Err(ApplicationError::invalid_state(
                "the mini-game is only available after the last page",
            ));
        }

        let outcome = session.answer(cmd.option_index)?;
        tracing::info!(
            session_id = %cmd.session_id,
            correct = outcome.correct,
            "Mini-game answered"
        );
        Ok(outcome)
    }
}
