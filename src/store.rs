//! Snapshot stores and the persisted session identity.
//!
//! Server-authoritative snapshots land here and nowhere else. Only the
//! channel reducers write server state; gesture handlers touch the selection
//! fields through the mutators below. The stores are plain structs bundled in
//! [`AppState`] and passed explicitly, so tests run against fresh instances.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::game::{CoordsTile, Game, PlayableCard, RoomId};
use crate::protocol::ChatMessage;
use crate::room::{Player, Room, RoomSummary};

const IDENTITY_RECORD_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct StoredIdentity {
    v: u8,
    player: Player,
}

/// The locally persisted player identity. The only state that survives a
/// reload; everything else is rebuilt from server pushes.
#[derive(Debug, Default)]
pub struct SessionIdentity {
    player: Option<Player>,
    path: Option<PathBuf>,
}

impl SessionIdentity {
    /// In-memory identity, for tests and throwaway sessions.
    pub fn ephemeral() -> SessionIdentity {
        SessionIdentity::default()
    }

    /// Identity backed by a JSON record at `path`; loads it if present.
    pub fn load(path: PathBuf) -> SessionIdentity {
        let player = fs::read(&path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<StoredIdentity>(&bytes).ok())
            .filter(|stored| stored.v == IDENTITY_RECORD_VERSION)
            .map(|stored| stored.player);
        SessionIdentity {
            player,
            path: Some(path),
        }
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn set(&mut self, player: Player) -> Result<()> {
        if let Some(path) = &self.path {
            let record = StoredIdentity {
                v: IDENTITY_RECORD_VERSION,
                player: player.clone(),
            };
            let bytes = serde_json::to_vec_pretty(&record)?;
            fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
        }
        self.player = Some(player);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.player = None;
        if let Some(path) = &self.path {
            // Best effort; a stale record is re-read as whatever it holds.
            let _ = fs::remove_file(path);
        }
    }
}

/// Lobby state: the last room-list push, the selected room, and the winner
/// name handed off from a finished game.
#[derive(Debug, Default)]
pub struct RoomListStore {
    rooms: Option<Vec<RoomSummary>>,
    selected_room_id: Option<RoomId>,
    last_winner: Option<String>,
}

impl RoomListStore {
    pub fn rooms(&self) -> Option<&[RoomSummary]> {
        self.rooms.as_deref()
    }

    /// Replaces the list wholesale. Selection is handled by the reducer.
    pub fn set_rooms(&mut self, rooms: Vec<RoomSummary>) {
        self.rooms = Some(rooms);
    }

    pub fn selected_room_id(&self) -> Option<RoomId> {
        self.selected_room_id
    }

    pub fn select_room(&mut self, room_id: RoomId) {
        self.selected_room_id = Some(room_id);
    }

    pub fn deselect_room(&mut self) {
        self.selected_room_id = None;
    }

    pub fn selected_summary(&self) -> Option<&RoomSummary> {
        let id = self.selected_room_id?;
        self.rooms()?.iter().find(|room| room.room_id == id)
    }

    pub fn last_winner(&self) -> Option<&str> {
        self.last_winner.as_deref()
    }

    pub fn set_last_winner(&mut self, username: String) {
        self.last_winner = Some(username);
    }
}

/// The last known waiting-room snapshot.
#[derive(Debug, Default)]
pub struct RoomStore {
    room: Option<Room>,
}

impl RoomStore {
    pub fn room(&self) -> Option<&Room> {
        self.room.as_ref()
    }

    pub fn set_room(&mut self, room: Room) {
        self.room = Some(room);
    }

    pub fn clear(&mut self) {
        self.room = None;
    }
}

/// The last known game snapshot plus the transient local selection and chat.
#[derive(Debug, Default)]
pub struct GameStore {
    game: Option<Game>,
    selected_card: Option<PlayableCard>,
    selected_tile: Option<CoordsTile>,
    chat: Vec<ChatMessage>,
}

impl GameStore {
    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn set_game(&mut self, game: Game) {
        self.game = Some(game);
    }

    pub fn clear_game(&mut self) {
        self.game = None;
    }

    pub fn selected_card(&self) -> Option<&PlayableCard> {
        self.selected_card.as_ref()
    }

    pub fn select_card(&mut self, card: PlayableCard) {
        self.selected_card = Some(card);
    }

    pub fn unselect_card(&mut self) {
        self.selected_card = None;
    }

    pub fn selected_tile(&self) -> Option<CoordsTile> {
        self.selected_tile
    }

    pub fn select_tile(&mut self, coords: CoordsTile) {
        self.selected_tile = Some(coords);
    }

    pub fn unselect_tile(&mut self) {
        self.selected_tile = None;
    }

    pub fn chat(&self) -> &[ChatMessage] {
        &self.chat
    }

    /// Unbounded, insertion order preserved.
    pub fn push_chat(&mut self, message: ChatMessage) {
        self.chat.push(message);
    }

    pub fn clean_chat(&mut self) {
        self.chat.clear();
    }
}

/// Every store a session needs, constructed per application (or per test).
#[derive(Debug, Default)]
pub struct AppState {
    pub identity: SessionIdentity,
    pub room_list: RoomListStore,
    pub room: RoomStore,
    pub game: GameStore,
}

impl AppState {
    pub fn new(identity: SessionIdentity) -> AppState {
        AppState {
            identity,
            ..AppState::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_round_trips_through_the_record() {
        let dir = std::env::temp_dir().join("switcher-identity-test");
        let _ = fs::create_dir_all(&dir);
        let path = dir.join("player.json");
        let _ = fs::remove_file(&path);

        let mut identity = SessionIdentity::load(path.clone());
        assert!(identity.player().is_none());
        identity
            .set(Player {
                player_id: 7,
                username: "ana".into(),
            })
            .unwrap();

        let reloaded = SessionIdentity::load(path.clone());
        assert_eq!(reloaded.player().unwrap().username, "ana");

        let mut cleared = SessionIdentity::load(path.clone());
        cleared.clear();
        assert!(SessionIdentity::load(path).player().is_none());
    }

    #[test]
    fn selected_summary_follows_the_list() {
        let mut store = RoomListStore::default();
        store.select_room(2);
        assert!(store.selected_summary().is_none());

        store.set_rooms(vec![RoomSummary {
            room_id: 2,
            room_name: "mesa".into(),
            max_players: 4,
            actual_players: 1,
            started: false,
            is_private: false,
            players_id: vec![1],
        }]);
        assert_eq!(store.selected_summary().unwrap().room_id, 2);

        store.set_rooms(vec![]);
        assert!(store.selected_summary().is_none());
    }

    #[test]
    fn chat_preserves_insertion_order() {
        let mut store = GameStore::default();
        store.push_chat(ChatMessage {
            username: "a".into(),
            text: "1".into(),
        });
        store.push_chat(ChatMessage {
            username: "b".into(),
            text: "2".into(),
        });
        assert_eq!(store.chat().len(), 2);
        assert_eq!(store.chat()[0].text, "1");
        store.clean_chat();
        assert!(store.chat().is_empty());
    }
}
