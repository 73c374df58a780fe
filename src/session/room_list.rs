//! Lobby session: the room-list channel reducer plus the signup and
//! room-creation/join gestures.

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{require_player, EffectSink, Route, ToastStatus};
use crate::api::{CommandGateway, CreateRoomRequest};
use crate::channel::ChannelEvent;
use crate::game::RoomId;
use crate::protocol::{CloseReason, RoomListMessage};
use crate::store::AppState;

/// User gestures available from the lobby.
#[derive(Clone, Debug)]
pub enum RoomListGesture {
    SelectRoom(RoomId),
    DeselectRoom,
    CreatePlayer {
        username: String,
    },
    CreateRoom {
        room_name: String,
        min_players: i32,
        max_players: i32,
        password: Option<String>,
    },
    JoinRoom {
        password: Option<String>,
    },
}

pub struct RoomListSession<'a> {
    state: &'a mut AppState,
    gateway: &'a CommandGateway,
    effects: EffectSink,
}

impl<'a> RoomListSession<'a> {
    pub fn new(
        state: &'a mut AppState,
        gateway: &'a CommandGateway,
        effects: EffectSink,
    ) -> RoomListSession<'a> {
        RoomListSession {
            state,
            gateway,
            effects,
        }
    }

    /// Drives the session until the channel closes or both inputs go away.
    pub async fn run(
        &mut self,
        events: &mut mpsc::Receiver<ChannelEvent<RoomListMessage>>,
        gestures: &mut mpsc::Receiver<RoomListGesture>,
    ) {
        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(event) => {
                            let closed = matches!(event, ChannelEvent::Closed(_));
                            self.handle_event(event);
                            if closed {
                                return;
                            }
                        }
                        None => return,
                    }
                }
                gesture = gestures.recv() => {
                    match gesture {
                        Some(gesture) => self.handle_gesture(gesture).await,
                        None => return,
                    }
                }
            }
        }
    }

    /// The current room list, empty until the first push.
    pub fn rooms(&self) -> &[crate::room::RoomSummary] {
        self.state.room_list.rooms().unwrap_or(&[])
    }

    pub fn handle_event(&mut self, event: ChannelEvent<RoomListMessage>) {
        match event {
            ChannelEvent::Frame(RoomListMessage::Status(rooms)) => {
                // Wholesale replacement; then drop a selection that is no
                // longer joinable.
                self.state.room_list.set_rooms(rooms);
                let stale = match self.state.room_list.selected_summary() {
                    Some(summary) => !summary.joinable(),
                    None => self.state.room_list.selected_room_id().is_some(),
                };
                if stale {
                    self.state.room_list.deselect_room();
                }
            }
            ChannelEvent::Closed(CloseReason::NotFound) => {
                // The lobby channel rejects unknown players: the local
                // identity is stale.
                info!("room list channel: player unknown, clearing identity");
                self.state.identity.clear();
                self.effects.navigate(Route::Signup);
            }
            ChannelEvent::Closed(reason) => {
                debug!(?reason, "room list channel closed");
            }
        }
    }

    pub async fn handle_gesture(&mut self, gesture: RoomListGesture) {
        match gesture {
            RoomListGesture::SelectRoom(room_id) => {
                self.state.room_list.select_room(room_id);
            }
            RoomListGesture::DeselectRoom => {
                self.state.room_list.deselect_room();
            }
            RoomListGesture::CreatePlayer { username } => {
                self.create_player(&username).await;
            }
            RoomListGesture::CreateRoom {
                room_name,
                min_players,
                max_players,
                password,
            } => {
                self.create_room(room_name, min_players, max_players, password)
                    .await;
            }
            RoomListGesture::JoinRoom { password } => {
                self.join_room(password).await;
            }
        }
    }

    pub async fn create_player(&mut self, username: &str) {
        match self.gateway.create_player(username).await {
            Ok(player) => {
                if let Err(err) = self.state.identity.set(player) {
                    self.effects.toast_detail(
                        ToastStatus::Error,
                        "Could not save the player",
                        err.to_string(),
                    );
                }
            }
            Err(envelope) => {
                self.effects
                    .surface_error("Could not pick that name", &envelope);
            }
        }
    }

    pub async fn create_room(
        &mut self,
        room_name: String,
        min_players: i32,
        max_players: i32,
        password: Option<String>,
    ) {
        let Some(player) = require_player(self.state, &self.effects) else {
            return;
        };
        let req = CreateRoomRequest {
            player_id: player.player_id,
            room_name,
            min_players,
            max_players,
            password,
        };
        match self.gateway.create_room(&req).await {
            Ok(payload) => {
                self.effects.navigate(Route::Room(payload.room_id));
            }
            Err(envelope) => {
                self.effects
                    .surface_error("Could not create the room", &envelope);
            }
        }
    }

    /// Joins the currently selected room. Re-joining a room the player is
    /// already in skips the network call entirely; a private room without a
    /// password yields a [`super::UiEffect::PasswordRequired`] so the UI can
    /// prompt and retry.
    pub async fn join_room(&mut self, password: Option<String>) {
        let Some(player) = require_player(self.state, &self.effects) else {
            return;
        };
        let Some(room_id) = self.state.room_list.selected_room_id() else {
            self.effects
                .toast(ToastStatus::Error, "The room information is not valid");
            return;
        };

        if let Some(summary) = self.state.room_list.selected_summary() {
            if summary.players_id.contains(&player.player_id) {
                // Already a member; a reload landed us back in the lobby.
                if summary.started {
                    self.effects.navigate(Route::Game(room_id));
                } else {
                    self.effects.navigate(Route::Room(room_id));
                }
                return;
            }
            if summary.is_private && password.is_none() {
                self.effects.password_required();
                return;
            }
        }

        match self
            .gateway
            .join_room(room_id, player.player_id, password)
            .await
        {
            Ok(()) => {
                self.effects.navigate(Route::Room(room_id));
            }
            Err(envelope) => {
                self.effects
                    .surface_error("Could not join the room", &envelope);
            }
        }
    }
}
