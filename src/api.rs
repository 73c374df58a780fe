//! REST command gateway.
//!
//! One method per player action. Every call resolves to either the declared
//! success payload or an [`ErrorEnvelope`]; transport failures and unexpected
//! status codes are folded into a synthesized single-entry envelope so the
//! caller handles all rejections the same way. Nothing here retries.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::game::{CardId, CoordsTile, GameId, PlayerId, RoomId};
use crate::room::{GameIdPayload, Player, RoomIdPayload};

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub kind: String,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
}

/// The server reports either a plain string or a list of structured entries.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Text(String),
    Items(Vec<ErrorDetail>),
}

/// Error envelope returned by every rejected command.
#[derive(Clone, PartialEq, Eq, Debug, Error, Serialize, Deserialize)]
#[error("command rejected: {}", self.messages().join("; "))]
pub struct ErrorEnvelope {
    pub detail: ErrorBody,
}

impl ErrorEnvelope {
    /// One message per detail entry, for surfacing each as its own toast.
    pub fn messages(&self) -> Vec<String> {
        match &self.detail {
            ErrorBody::Text(text) => vec![text.clone()],
            ErrorBody::Items(items) => items.iter().map(|item| item.msg.clone()).collect(),
        }
    }

    /// Locally synthesized envelope for transport-level failures.
    pub fn unknown(msg: impl Into<String>) -> ErrorEnvelope {
        ErrorEnvelope {
            detail: ErrorBody::Items(vec![ErrorDetail {
                kind: "unknown".to_string(),
                msg: msg.into(),
                input: None,
            }]),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct CreateRoomRequest {
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    #[serde(rename = "roomName")]
    pub room_name: String,
    #[serde(rename = "minPlayers")]
    pub min_players: i32,
    #[serde(rename = "maxPlayers")]
    pub max_players: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
struct JoinRoomRequest {
    #[serde(rename = "playerID")]
    player_id: PlayerId,
    password: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize)]
struct PlayerIdBody {
    #[serde(rename = "playerID")]
    player_id: PlayerId,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct MoveCardRequest {
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    #[serde(rename = "cardID")]
    pub card_id: CardId,
    pub origin: CoordsTile,
    pub destination: CoordsTile,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayFigureRequest {
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    #[serde(rename = "cardID")]
    pub card_id: CardId,
    pub figure: Vec<CoordsTile>,
}

#[derive(Clone, Debug, Serialize)]
pub struct BlockFigureRequest {
    #[serde(rename = "cardID")]
    pub card_id: CardId,
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    #[serde(rename = "targetID")]
    pub target_id: PlayerId,
    pub figure: Vec<CoordsTile>,
}

/// Thin REST wrapper around the game server.
#[derive(Clone, Debug)]
pub struct CommandGateway {
    http: reqwest::Client,
    base: Url,
}

impl CommandGateway {
    pub fn new(base: Url) -> CommandGateway {
        CommandGateway {
            http: reqwest::Client::new(),
            base,
        }
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        expected: StatusCode,
    ) -> Result<T, ErrorEnvelope> {
        let url = self
            .base
            .join(path)
            .map_err(|err| ErrorEnvelope::unknown(format!("bad url {path}: {err}")))?;

        let mut req = self.http.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req
            .send()
            .await
            .map_err(|err| ErrorEnvelope::unknown(err.to_string()))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| ErrorEnvelope::unknown(err.to_string()))?;

        if status == expected {
            if bytes.is_empty() {
                return serde_json::from_value(serde_json::Value::Null)
                    .map_err(|err| ErrorEnvelope::unknown(err.to_string()));
            }
            return serde_json::from_slice(&bytes)
                .map_err(|err| ErrorEnvelope::unknown(format!("bad response body: {err}")));
        }

        // Any non-expected status: surface the server's envelope if it sent
        // one, otherwise synthesize.
        match serde_json::from_slice::<ErrorEnvelope>(&bytes) {
            Ok(envelope) => Err(envelope),
            Err(_) => Err(ErrorEnvelope::unknown(format!(
                "unexpected status code: {}",
                status.as_u16()
            ))),
        }
    }

    fn json<T: Serialize>(body: &T) -> Option<serde_json::Value> {
        serde_json::to_value(body).ok()
    }

    pub async fn create_player(&self, username: &str) -> Result<Player, ErrorEnvelope> {
        self.request(
            Method::POST,
            "players",
            Some(serde_json::json!({ "username": username })),
            StatusCode::CREATED,
        )
        .await
    }

    pub async fn create_room(
        &self,
        req: &CreateRoomRequest,
    ) -> Result<RoomIdPayload, ErrorEnvelope> {
        self.request(Method::POST, "rooms", Self::json(req), StatusCode::CREATED)
            .await
    }

    pub async fn join_room(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        password: Option<String>,
    ) -> Result<(), ErrorEnvelope> {
        self.request::<serde_json::Value>(
            Method::PUT,
            &format!("rooms/{room_id}/join"),
            Self::json(&JoinRoomRequest {
                player_id,
                password,
            }),
            StatusCode::OK,
        )
        .await
        .map(|_| ())
    }

    pub async fn leave_room(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
    ) -> Result<(), ErrorEnvelope> {
        self.request::<serde_json::Value>(
            Method::PUT,
            &format!("rooms/{room_id}/leave"),
            Self::json(&PlayerIdBody { player_id }),
            StatusCode::OK,
        )
        .await
        .map(|_| ())
    }

    pub async fn start_game(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
    ) -> Result<GameIdPayload, ErrorEnvelope> {
        self.request(
            Method::POST,
            &format!("games/{room_id}"),
            Self::json(&PlayerIdBody { player_id }),
            StatusCode::CREATED,
        )
        .await
    }

    pub async fn end_turn(
        &self,
        game_id: GameId,
        player_id: PlayerId,
    ) -> Result<(), ErrorEnvelope> {
        self.request::<serde_json::Value>(
            Method::PUT,
            &format!("games/{game_id}/turn"),
            Self::json(&PlayerIdBody { player_id }),
            StatusCode::OK,
        )
        .await
        .map(|_| ())
    }

    pub async fn leave_game(
        &self,
        game_id: GameId,
        player_id: PlayerId,
    ) -> Result<(), ErrorEnvelope> {
        self.request::<serde_json::Value>(
            Method::PUT,
            &format!("games/{game_id}/leave"),
            Self::json(&PlayerIdBody { player_id }),
            StatusCode::OK,
        )
        .await
        .map(|_| ())
    }

    pub async fn move_card(
        &self,
        game_id: GameId,
        req: &MoveCardRequest,
    ) -> Result<(), ErrorEnvelope> {
        self.request::<serde_json::Value>(
            Method::POST,
            &format!("games/{game_id}/movement"),
            Self::json(req),
            StatusCode::CREATED,
        )
        .await
        .map(|_| ())
    }

    pub async fn cancel_move(
        &self,
        game_id: GameId,
        player_id: PlayerId,
    ) -> Result<(), ErrorEnvelope> {
        self.request::<serde_json::Value>(
            Method::DELETE,
            &format!("games/{game_id}/movement?playerID={player_id}"),
            None,
            StatusCode::OK,
        )
        .await
        .map(|_| ())
    }

    pub async fn play_figure(
        &self,
        game_id: GameId,
        req: &PlayFigureRequest,
    ) -> Result<(), ErrorEnvelope> {
        self.request::<serde_json::Value>(
            Method::POST,
            &format!("games/{game_id}/figure"),
            Self::json(req),
            StatusCode::CREATED,
        )
        .await
        .map(|_| ())
    }

    pub async fn block_figure(
        &self,
        game_id: GameId,
        req: &BlockFigureRequest,
    ) -> Result<(), ErrorEnvelope> {
        self.request::<serde_json::Value>(
            Method::PUT,
            &format!("games/{game_id}/block"),
            Self::json(req),
            StatusCode::CREATED,
        )
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_with_string_detail() {
        let envelope: ErrorEnvelope =
            serde_json::from_value(serde_json::json!({"detail": "room is full"})).unwrap();
        assert_eq!(envelope.messages(), vec!["room is full".to_string()]);
    }

    #[test]
    fn envelope_with_detail_list() {
        let envelope: ErrorEnvelope = serde_json::from_value(serde_json::json!({
            "detail": [
                {"type": "value_error", "msg": "name too long", "input": "xxxxxxxxxx"},
                {"type": "value_error", "msg": "too many players"}
            ]
        }))
        .unwrap();
        assert_eq!(
            envelope.messages(),
            vec!["name too long".to_string(), "too many players".to_string()]
        );
    }

    #[test]
    fn synthesized_envelope_is_a_single_unknown_entry() {
        let envelope = ErrorEnvelope::unknown("connection refused");
        match &envelope.detail {
            ErrorBody::Items(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].kind, "unknown");
                assert_eq!(items[0].msg, "connection refused");
            }
            other => panic!("unexpected detail: {other:?}"),
        }
    }

    #[test]
    fn move_request_wire_shape() {
        let req = MoveCardRequest {
            player_id: 1,
            card_id: 2,
            origin: CoordsTile::new(1, 1),
            destination: CoordsTile::new(3, 1),
        };
        let j = serde_json::to_value(req).unwrap();
        assert_eq!(
            j,
            serde_json::json!({
                "playerID": 1,
                "cardID": 2,
                "origin": {"posX": 1, "posY": 1},
                "destination": {"posX": 3, "posY": 1}
            })
        );
    }

    #[test]
    fn create_room_omits_missing_password() {
        let req = CreateRoomRequest {
            player_id: 1,
            room_name: "mesa".into(),
            min_players: 2,
            max_players: 4,
            password: None,
        };
        let j = serde_json::to_value(req).unwrap();
        assert!(j.get("password").is_none());
    }
}
