//! Client -> Server message parsing.

use crate::{Direction, ProtocolError};
use serde::{Deserialize, Serialize};

/// Raw input forwarded by a client. Both fields are optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub shoot: bool,
}

/// Parsed client message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientPacket {
    /// Create a new room and become its first member.
    CreateRoom,
    /// Join an existing room by code.
    JoinRoom(String),
    /// Mark the sender ready in the given room.
    PlayerReady(String),
    /// Movement / fire input for the given room.
    PlayerInput { room_id: String, input: InputState },
    /// Toggle the pause flag of the given room.
    TogglePause(String),
    /// Request the high-score table.
    GetHighScores,
    /// Submit a high score.
    SaveHighScore { name: String, score: u32 },
}

impl ClientPacket {
    /// Parse a client message from a text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unit_event() {
        let packet = ClientPacket::parse(r#"{"event":"createRoom"}"#).unwrap();
        assert_eq!(packet, ClientPacket::CreateRoom);
    }

    #[test]
    fn test_parse_player_input() {
        let packet = ClientPacket::parse(
            r#"{"event":"playerInput","data":{"roomId":"AB12CD","input":{"direction":"left"}}}"#,
        )
        .unwrap();
        assert_eq!(
            packet,
            ClientPacket::PlayerInput {
                room_id: "AB12CD".to_string(),
                input: InputState {
                    direction: Some(Direction::Left),
                    shoot: false,
                },
            }
        );
    }

    #[test]
    fn test_parse_shoot_only_input() {
        let packet = ClientPacket::parse(
            r#"{"event":"playerInput","data":{"roomId":"X","input":{"shoot":true}}}"#,
        )
        .unwrap();
        match packet {
            ClientPacket::PlayerInput { input, .. } => {
                assert!(input.shoot);
                assert!(input.direction.is_none());
            }
            other => panic!("unexpected packet {:?}", other),
        }
    }

    #[test]
    fn test_reject_unknown_event() {
        assert!(ClientPacket::parse(r#"{"event":"launchNukes"}"#).is_err());
        assert!(ClientPacket::parse("not json").is_err());
    }
}
