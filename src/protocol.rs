//! Wire frames for the three streaming channels.
//!
//! Each channel speaks JSON text frames shaped `{"type": ..., "payload": ...}`.
//! The client only ever originates frames on the game channel (chat); the
//! room-list and room channels are inbound-only.

use serde::{Deserialize, Serialize};

use crate::game::{Game, PlayerId};
use crate::room::{Room, RoomSummary};

/// Frames pushed on the lobby channel (`/rooms/{playerID}`).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum RoomListMessage {
    /// Full replacement of the room list. No incremental diffing.
    Status(Vec<RoomSummary>),
}

/// Frames pushed on the room channel (`/rooms/{playerID}/{roomID}`).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum RoomMessage {
    /// Full replacement of the room snapshot.
    Status(Room),
    /// The game under this room has started.
    Start {
        #[serde(rename = "gameID")]
        game_id: i64,
    },
    /// The host closed the room. The payload repeats the final room state;
    /// the client does not use it.
    End {},
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub username: String,
    pub text: String,
}

/// Frames on the game channel (`/games/{playerID}/{gameID}`), both directions.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum GameMessage {
    /// Full replacement of the game snapshot.
    Status(Game),
    /// Game over; carries the winner.
    End {
        #[serde(rename = "winnerID")]
        winner_id: PlayerId,
        username: String,
    },
    /// Chat, in either direction.
    Msg(ChatMessage),
}

/// Close codes used by the server to signal why it hung up. Always terminal:
/// the client navigates away and never retries.
pub const CLOSE_NOT_FOUND: u16 = 4004;
pub const CLOSE_DUPLICATE_SESSION: u16 = 4005;
pub const CLOSE_SERVER_ERROR: u16 = 4003;
pub const CLOSE_GAME_STARTED: u16 = 4007;

/// Classified close outcome for the room and game channels.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum CloseReason {
    /// 4004: the referenced room/game/player does not exist.
    NotFound,
    /// 4005: the same identity connected from another session.
    DuplicateSession,
    /// 4003: unspecified server error; the close reason string explains.
    ServerError(String),
    /// 4007 (room channel only): the game already started under this room.
    GameStarted,
    /// Anything else, including a normal close.
    Other(u16),
}

impl CloseReason {
    pub fn classify(code: u16, reason: &str) -> CloseReason {
        match code {
            CLOSE_NOT_FOUND => CloseReason::NotFound,
            CLOSE_DUPLICATE_SESSION => CloseReason::DuplicateSession,
            CLOSE_SERVER_ERROR => CloseReason::ServerError(reason.to_string()),
            CLOSE_GAME_STARTED => CloseReason::GameStarted,
            other => CloseReason::Other(other),
        }
    }
}
