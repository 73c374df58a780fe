//! Waiting-room session: the room channel reducer plus the leave/start
//! gestures.

use tokio::sync::mpsc;
use tracing::debug;

use super::{require_player_in_room, require_room_host, EffectSink, Route, ToastStatus};
use crate::api::CommandGateway;
use crate::channel::ChannelEvent;
use crate::game::RoomId;
use crate::protocol::{CloseReason, RoomMessage};
use crate::store::AppState;

#[derive(Clone, Debug)]
pub enum RoomGesture {
    LeaveRoom,
    StartGame,
}

pub struct RoomSession<'a> {
    state: &'a mut AppState,
    gateway: &'a CommandGateway,
    effects: EffectSink,
    room_id: RoomId,
}

impl<'a> RoomSession<'a> {
    pub fn new(
        state: &'a mut AppState,
        gateway: &'a CommandGateway,
        effects: EffectSink,
        room_id: RoomId,
    ) -> RoomSession<'a> {
        RoomSession {
            state,
            gateway,
            effects,
            room_id,
        }
    }

    pub async fn run(
        &mut self,
        events: &mut mpsc::Receiver<ChannelEvent<RoomMessage>>,
        gestures: &mut mpsc::Receiver<RoomGesture>,
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

    pub fn room(&self) -> Option<&crate::room::Room> {
        self.state.room.room()
    }

    pub fn handle_event(&mut self, event: ChannelEvent<RoomMessage>) {
        match event {
            ChannelEvent::Frame(RoomMessage::Status(room)) => {
                self.state.room.set_room(room);
            }
            ChannelEvent::Frame(RoomMessage::Start { game_id }) => {
                self.effects.navigate(Route::Game(game_id));
            }
            ChannelEvent::Frame(RoomMessage::End {}) => {
                self.effects.navigate(Route::Lobby);
                self.state.room.clear();
                self.effects.toast_detail(
                    ToastStatus::Info,
                    "Room closed",
                    "The room was closed by its host",
                );
            }
            ChannelEvent::Closed(CloseReason::NotFound) => {
                self.effects.toast_detail(
                    ToastStatus::Error,
                    "Could not connect to the room",
                    "Room not found",
                );
                self.effects.navigate(Route::Lobby);
            }
            ChannelEvent::Closed(CloseReason::DuplicateSession) => {
                self.effects.toast_detail(
                    ToastStatus::Warning,
                    "Connection opened somewhere else",
                    "Only one connection per room at a time",
                );
                self.effects.navigate(Route::Lobby);
            }
            ChannelEvent::Closed(CloseReason::ServerError(reason)) => {
                self.effects
                    .toast_detail(ToastStatus::Error, "Could not connect to the room", reason);
                self.effects.navigate(Route::Lobby);
            }
            ChannelEvent::Closed(CloseReason::GameStarted) => {
                // The game under this room is already running; its id matches
                // the room id.
                self.effects.navigate(Route::Game(self.room_id));
            }
            ChannelEvent::Closed(CloseReason::Other(code)) => {
                debug!(code, "room channel closed");
            }
        }
    }

    pub async fn handle_gesture(&mut self, gesture: RoomGesture) {
        match gesture {
            RoomGesture::LeaveRoom => self.leave_room().await,
            RoomGesture::StartGame => self.start_game().await,
        }
    }

    pub async fn leave_room(&mut self) {
        let Some(player) = require_player_in_room(self.state, &self.effects) else {
            return;
        };
        match self
            .gateway
            .leave_room(self.room_id, player.player_id)
            .await
        {
            Ok(()) => {
                self.effects.navigate(Route::Lobby);
            }
            Err(envelope) => {
                self.effects
                    .surface_error("Could not leave the room", &envelope);
            }
        }
    }

    /// Host-only. Success is confirmed by the `start` frame on the channel;
    /// the gesture itself does not navigate.
    pub async fn start_game(&mut self) {
        let Some(player) = require_room_host(self.state, &self.effects) else {
            return;
        };
        if let Err(envelope) = self.gateway.start_game(self.room_id, player.player_id).await {
            self.effects
                .surface_error("Could not start the game", &envelope);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::{Player, Room};
    use crate::session::testutil::*;
    use crate::session::{Toast, UiEffect};
    use url::Url;

    fn gateway() -> CommandGateway {
        CommandGateway::new(Url::parse("http://localhost:8000/").unwrap())
    }

    fn room(host_id: i64, member_ids: &[i64]) -> Room {
        Room {
            room_id: 3,
            host_id,
            room_name: "mesa".into(),
            max_players: 4,
            min_players: 2,
            players: member_ids
                .iter()
                .map(|&id| Player {
                    player_id: id,
                    username: format!("p{id}"),
                })
                .collect(),
        }
    }

    #[test]
    fn status_frame_replaces_the_room() {
        let mut state = AppState::new(identity(1, "ana"));
        let gw = gateway();
        let (sink, _rx) = EffectSink::new();
        let mut session = RoomSession::new(&mut state, &gw, sink, 3);

        session.handle_event(ChannelEvent::Frame(RoomMessage::Status(room(1, &[1, 2]))));
        assert_eq!(state.room.room().unwrap().players.len(), 2);
    }

    #[test]
    fn start_frame_navigates_to_the_game() {
        let mut state = AppState::new(identity(1, "ana"));
        let gw = gateway();
        let (sink, mut rx) = EffectSink::new();
        let mut session = RoomSession::new(&mut state, &gw, sink, 3);

        session.handle_event(ChannelEvent::Frame(RoomMessage::Start { game_id: 12 }));
        let effects = drain(&mut rx);
        assert_eq!(effects, vec![UiEffect::Navigate(Route::Game(12))]);
    }

    #[test]
    fn end_frame_clears_the_room_and_informs() {
        let mut state = AppState::new(identity(1, "ana"));
        state.room.set_room(room(2, &[1, 2]));
        let gw = gateway();
        let (sink, mut rx) = EffectSink::new();
        let mut session = RoomSession::new(&mut state, &gw, sink, 3);

        session.handle_event(ChannelEvent::Frame(RoomMessage::End {}));
        assert!(state.room.room().is_none());
        let effects = drain(&mut rx);
        assert_eq!(effects[0], UiEffect::Navigate(Route::Lobby));
        assert!(matches!(
            &effects[1],
            UiEffect::Toast(Toast { title, .. }) if title == "Room closed"
        ));
    }

    #[test]
    fn already_started_close_routes_to_the_game() {
        let mut state = AppState::new(identity(1, "ana"));
        let gw = gateway();
        let (sink, mut rx) = EffectSink::new();
        let mut session = RoomSession::new(&mut state, &gw, sink, 3);

        session.handle_event(ChannelEvent::Closed(CloseReason::GameStarted));
        let effects = drain(&mut rx);
        assert_eq!(effects, vec![UiEffect::Navigate(Route::Game(3))]);
    }

    #[test]
    fn server_error_close_surfaces_the_reason() {
        let mut state = AppState::new(identity(1, "ana"));
        let gw = gateway();
        let (sink, mut rx) = EffectSink::new();
        let mut session = RoomSession::new(&mut state, &gw, sink, 3);

        session.handle_event(ChannelEvent::Closed(CloseReason::ServerError(
            "not in room".into(),
        )));
        let effects = drain(&mut rx);
        assert!(matches!(
            &effects[0],
            UiEffect::Toast(Toast { description: Some(d), .. }) if d == "not in room"
        ));
        assert_eq!(effects[1], UiEffect::Navigate(Route::Lobby));
    }

    #[tokio::test]
    async fn start_game_rejected_for_non_host() {
        let mut state = AppState::new(identity(1, "ana"));
        state.room.set_room(room(2, &[1, 2]));
        let gw = gateway();
        let (sink, mut rx) = EffectSink::new();
        let mut session = RoomSession::new(&mut state, &gw, sink, 3);

        session.start_game().await;
        let effects = drain(&mut rx);
        assert_eq!(warnings(&effects), vec!["Only the room host can do that"]);
    }

    #[tokio::test]
    async fn leave_room_rejected_for_non_member() {
        let mut state = AppState::new(identity(9, "eve"));
        state.room.set_room(room(2, &[1, 2]));
        let gw = gateway();
        let (sink, mut rx) = EffectSink::new();
        let mut session = RoomSession::new(&mut state, &gw, sink, 3);

        session.leave_room().await;
        let effects = drain(&mut rx);
        assert_eq!(warnings(&effects), vec!["You are not in this room"]);
    }
}
