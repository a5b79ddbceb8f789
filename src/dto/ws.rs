use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::{
    dto::validation::validate_clicker_id,
    state::{game::Side, serve::ServeSide},
};

#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq, Eq)]
/// Messages accepted from clicker WebSocket clients.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClickerInboundMessage {
    /// First frame of every connection.
    Identification {
        id: String,
    },
    /// Credit a point.
    Point {
        side: Side,
    },
    /// Take back the last point.
    Undo,
    /// Players change ends.
    Swap,
    /// Zero the current set.
    ResetSet,
    /// Raw key press from keyboard-emulating remotes.
    Key {
        key: String,
    },
    /// Any other message type, ignored.
    #[serde(other)]
    Unknown,
}

/// Reasons an inbound clicker frame is rejected.
#[derive(Debug, Error)]
pub enum ClickerMessageError {
    /// Frame is not valid JSON for any known message.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    /// Fields failed validation.
    #[error("invalid message: {0}")]
    Validation(#[from] ValidationErrors),
}

impl ClickerInboundMessage {
    /// Parse a text frame and validate the identification payload.
    pub fn from_json_str(text: &str) -> Result<Self, ClickerMessageError> {
        let message: Self = serde_json::from_str(text)?;
        if let Self::Identification { id } = &message
            && let Err(err) = validate_clicker_id(id)
        {
            let mut errors = ValidationErrors::new();
            errors.add("id", err);
            return Err(errors.into());
        }
        Ok(message)
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Positive acknowledgement sent to a clicker after successful identification.
pub struct ClickerAck {
    /// Identifier the clicker registered with.
    pub id: String,
    /// Connection status, `connected`.
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Feedback sent to a clicker after each command.
#[serde(tag = "type", rename = "serve")]
pub struct ClickerFeedback {
    /// Whether the command changed the scoreboard.
    pub applied: bool,
    /// Slot serving next, when a match is running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<Side>,
    /// Court half the server serves from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serve_side: Option<ServeSide>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(
            ClickerInboundMessage::from_json_str(r#"{"type":"point","side":"player2"}"#).unwrap(),
            ClickerInboundMessage::Point {
                side: Side::Player2
            }
        );
        assert_eq!(
            ClickerInboundMessage::from_json_str(r#"{"type":"reset_set"}"#).unwrap(),
            ClickerInboundMessage::ResetSet
        );
        assert_eq!(
            ClickerInboundMessage::from_json_str(r#"{"type":"vibrate"}"#).unwrap(),
            ClickerInboundMessage::Unknown
        );
    }

    #[test]
    fn rejects_bad_identification() {
        assert!(matches!(
            ClickerInboundMessage::from_json_str(r#"{"type":"identification","id":"a b"}"#),
            Err(ClickerMessageError::Validation(_))
        ));
        assert!(matches!(
            ClickerInboundMessage::from_json_str("not json"),
            Err(ClickerMessageError::Json(_))
        ));
    }

    #[test]
    fn feedback_is_tagged_as_serve() {
        let feedback = ClickerFeedback {
            applied: true,
            server: Some(Side::Player1),
            serve_side: None,
        };
        assert_eq!(
            serde_json::to_value(&feedback).unwrap(),
            serde_json::json!({"type": "serve", "applied": true, "server": "player1"})
        );
    }
}
