//! Spoken announcements. The backend renders the sentence; the display's speech engine says it.

use serde::Deserialize;
use thiserror::Error;

use crate::{
    config::NarrationSettings,
    dto::sse::{NarrationEvent, ServerEvent},
    state::{SseHub, output::Announcement, serve::ServeSide},
};

const EVENT_NARRATION: &str = "narration";

/// Language announcements are rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Locale {
    /// Korean, the default.
    #[serde(rename = "ko")]
    Korean,
    /// English.
    #[serde(rename = "en")]
    English,
}

impl Locale {
    /// BCP 47 tag handed to the speech engine.
    pub fn language_tag(self) -> &'static str {
        match self {
            Locale::Korean => "ko-KR",
            Locale::English => "en-US",
        }
    }
}

/// Failures of a narration sink.
#[derive(Debug, Error)]
pub enum NarrationError {
    /// Payload could not be serialised.
    #[error("failed to encode narration: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Receives announcements once the match state has been committed.
pub trait NarrationSink: Send + Sync {
    /// Deliver one announcement.
    fn announce(&self, announcement: &Announcement) -> Result<(), NarrationError>;
}

/// Stable identifier of the announcement kind, sent alongside the text.
pub fn kind(announcement: &Announcement) -> &'static str {
    match announcement {
        Announcement::MatchStart => "match_start",
        Announcement::Score { .. } => "score",
        Announcement::NextServeSamePlayer { .. } => "next_serve_same_player",
        Announcement::ServeChanged { .. } => "serve_changed",
        Announcement::SetWin { .. } => "set_win",
        Announcement::SetStart { .. } => "set_start",
        Announcement::MatchEnd { .. } => "match_end",
        Announcement::Reset => "reset",
        Announcement::Undo => "undo",
        Announcement::CourtSwap => "court_swap",
    }
}

/// Sentence to speak for `announcement`.
pub fn render(locale: Locale, announcement: &Announcement) -> String {
    match locale {
        Locale::Korean => render_korean(announcement),
        Locale::English => render_english(announcement),
    }
}

fn render_korean(announcement: &Announcement) -> String {
    let side = |side: &ServeSide| match side {
        ServeSide::Right => "오른쪽",
        ServeSide::Left => "왼쪽",
    };

    match announcement {
        Announcement::MatchStart => "게임 시작!".into(),
        Announcement::Score { score1, score2 } => format!("{score1} 대 {score2}"),
        Announcement::NextServeSamePlayer { side: s } => {
            format!("같은 선수 서브, {} 코트", side(s))
        }
        Announcement::ServeChanged { name, side: s, .. } => {
            format!("서브 교체, {name} 서브, {} 코트", side(s))
        }
        Announcement::SetWin { name, .. } => format!("{name} 세트 승리!"),
        Announcement::SetStart { set_number } => format!("{set_number}세트 시작! 0 대 0"),
        Announcement::MatchEnd { name, .. } => format!("게임 종료! {name} 승리!"),
        Announcement::Reset => "0 대 0, 세트 리셋".into(),
        Announcement::Undo => "실수 수정 완료".into(),
        Announcement::CourtSwap => "코트 체인지".into(),
    }
}

fn render_english(announcement: &Announcement) -> String {
    let side = |side: &ServeSide| match side {
        ServeSide::Right => "right",
        ServeSide::Left => "left",
    };

    match announcement {
        Announcement::MatchStart => "Game start!".into(),
        Announcement::Score { score1, score2 } => format!("{score1} to {score2}"),
        Announcement::NextServeSamePlayer { side: s } => {
            format!("Same server, serving from the {}", side(s))
        }
        Announcement::ServeChanged { name, side: s, .. } => {
            format!("Change of serve, {name} serves from the {}", side(s))
        }
        Announcement::SetWin { name, .. } => format!("{name} wins the set!"),
        Announcement::SetStart { set_number } => format!("Set {set_number}, start! 0 to 0"),
        Announcement::MatchEnd { name, .. } => format!("Game over! {name} wins!"),
        Announcement::Reset => "0 to 0, set reset".into(),
        Announcement::Undo => "Correction done".into(),
        Announcement::CourtSwap => "Change ends".into(),
    }
}

/// Default sink: broadcasts the rendered sentence on the display stream.
pub struct SseNarrator {
    hub: SseHub,
    settings: NarrationSettings,
}

impl SseNarrator {
    /// Narrator speaking through the display stream.
    pub fn new(hub: SseHub, settings: NarrationSettings) -> Self {
        Self { hub, settings }
    }

    fn event_for(&self, announcement: &Announcement) -> NarrationEvent {
        NarrationEvent {
            kind: kind(announcement).to_string(),
            text: render(self.settings.locale, announcement),
            lang: self.settings.locale.language_tag().to_string(),
            rate: self.settings.rate,
            pitch: self.settings.pitch,
        }
    }
}

impl NarrationSink for SseNarrator {
    fn announce(&self, announcement: &Announcement) -> Result<(), NarrationError> {
        let payload = self.event_for(announcement);
        self.hub
            .broadcast(ServerEvent::json(Some(EVENT_NARRATION.to_string()), &payload)?);
        Ok(())
    }
}
