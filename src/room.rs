use serde::{Deserialize, Serialize};

use crate::game::{GameId, PlayerId, RoomId};

/// A signed-up player. Created once on signup and persisted locally; the only
/// state that survives a reload.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Player {
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    pub username: String,
}

/// A waiting room, as pushed over the room channel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Room {
    #[serde(rename = "roomID")]
    pub room_id: RoomId,
    #[serde(rename = "hostID")]
    pub host_id: PlayerId,
    #[serde(rename = "roomName")]
    pub room_name: String,
    #[serde(rename = "maxPlayers")]
    pub max_players: i32,
    #[serde(rename = "minPlayers")]
    pub min_players: i32,
    pub players: Vec<Player>,
}

impl Room {
    pub fn has_player(&self, player_id: PlayerId) -> bool {
        self.players.iter().any(|p| p.player_id == player_id)
    }

    pub fn is_host(&self, player_id: PlayerId) -> bool {
        self.host_id == player_id
    }
}

/// List-view projection of a room, replaced wholesale on every lobby push.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoomSummary {
    #[serde(rename = "roomID")]
    pub room_id: RoomId,
    #[serde(rename = "roomName")]
    pub room_name: String,
    #[serde(rename = "maxPlayers")]
    pub max_players: i32,
    #[serde(rename = "actualPlayers")]
    pub actual_players: i32,
    pub started: bool,
    #[serde(rename = "private")]
    pub is_private: bool,
    #[serde(rename = "playersID")]
    pub players_id: Vec<PlayerId>,
}

impl RoomSummary {
    pub fn is_full(&self) -> bool {
        self.actual_players >= self.max_players
    }

    /// Whether a selected room is still joinable from the lobby.
    pub fn joinable(&self) -> bool {
        !self.started && !self.is_full()
    }
}

/// Identifier payloads returned by room/game creation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RoomIdPayload {
    #[serde(rename = "roomID")]
    pub room_id: RoomId,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GameIdPayload {
    #[serde(rename = "gameID")]
    pub game_id: GameId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_summary_wire_names() {
        let j = serde_json::json!({
            "roomID": 4,
            "roomName": "mesa",
            "maxPlayers": 4,
            "actualPlayers": 4,
            "started": false,
            "private": true,
            "playersID": [1, 2, 3, 9]
        });
        let summary: RoomSummary = serde_json::from_value(j).unwrap();
        assert!(summary.is_private);
        assert!(summary.is_full());
        assert!(!summary.joinable());
    }

    #[test]
    fn room_membership_and_host() {
        let room = Room {
            room_id: 1,
            host_id: 10,
            room_name: "mesa".into(),
            max_players: 4,
            min_players: 2,
            players: vec![
                Player {
                    player_id: 10,
                    username: "ana".into(),
                },
                Player {
                    player_id: 11,
                    username: "bob".into(),
                },
            ],
        };
        assert!(room.has_player(11));
        assert!(!room.has_player(12));
        assert!(room.is_host(10));
        assert!(!room.is_host(11));
    }
}
