//! Per-view sessions: the reducers and gesture interpreter.
//!
//! A session owns no connection and no UI. It consumes [`ChannelEvent`]s from
//! its socket actor plus gesture commands from the UI, pre-validates gestures
//! against the snapshot stores, calls the REST gateway, and emits
//! [`UiEffect`]s for whatever front-end is attached. Pre-validation is
//! advisory only; the server remains the judge of every action.
//!
//! [`ChannelEvent`]: crate::channel::ChannelEvent

pub mod game;
pub mod room;
pub mod room_list;

use tokio::sync::mpsc;
use tracing::debug;

use crate::api::ErrorEnvelope;
use crate::game::{GameId, PlayerInGame, RoomId};
use crate::room::Player;
use crate::store::AppState;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ToastStatus {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Toast {
    pub status: ToastStatus,
    pub title: String,
    pub description: Option<String>,
}

/// Where the UI should go next.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Route {
    Signup,
    Lobby,
    Room(RoomId),
    Game(GameId),
}

/// Everything a session asks of the UI. Purely descriptive; the session never
/// waits for the UI to comply.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum UiEffect {
    Toast(Toast),
    Navigate(Route),
    /// The selected room is private; ask the user for a password and retry
    /// the join gesture with it.
    PasswordRequired,
}

/// Sending half of the effect stream. Cloneable and sync-friendly, so gesture
/// pre-validation can emit warnings without awaiting.
#[derive(Clone, Debug)]
pub struct EffectSink {
    tx: mpsc::UnboundedSender<UiEffect>,
}

impl EffectSink {
    pub fn new() -> (EffectSink, mpsc::UnboundedReceiver<UiEffect>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (EffectSink { tx }, rx)
    }

    fn send(&self, effect: UiEffect) {
        if self.tx.send(effect).is_err() {
            debug!("ui effect dropped, no receiver");
        }
    }

    pub fn toast(&self, status: ToastStatus, title: impl Into<String>) {
        self.send(UiEffect::Toast(Toast {
            status,
            title: title.into(),
            description: None,
        }));
    }

    pub fn toast_detail(
        &self,
        status: ToastStatus,
        title: impl Into<String>,
        description: impl Into<String>,
    ) {
        self.send(UiEffect::Toast(Toast {
            status,
            title: title.into(),
            description: Some(description.into()),
        }));
    }

    pub fn navigate(&self, route: Route) {
        self.send(UiEffect::Navigate(route));
    }

    pub fn password_required(&self) {
        self.send(UiEffect::PasswordRequired);
    }

    /// Surfaces every entry of a rejection envelope as its own error toast.
    pub fn surface_error(&self, title: &str, envelope: &ErrorEnvelope) {
        for msg in envelope.messages() {
            self.toast_detail(ToastStatus::Error, title, msg);
        }
    }
}

/// Pre-validation checks shared by the gesture handlers. Each failure emits
/// exactly one warning toast and short-circuits.
pub(crate) fn require_player(state: &AppState, effects: &EffectSink) -> Option<Player> {
    match state.identity.player() {
        Some(player) => Some(player.clone()),
        None => {
            effects.toast(ToastStatus::Warning, "Player information is not loaded");
            None
        }
    }
}

pub(crate) fn require_player_in_room(state: &AppState, effects: &EffectSink) -> Option<Player> {
    let Some(room) = state.room.room() else {
        effects.toast(ToastStatus::Warning, "Room information is not loaded");
        return None;
    };
    let player = require_player(state, effects)?;
    if !room.has_player(player.player_id) {
        effects.toast(ToastStatus::Warning, "You are not in this room");
        return None;
    }
    Some(player)
}

pub(crate) fn require_room_host(state: &AppState, effects: &EffectSink) -> Option<Player> {
    let player = require_player_in_room(state, effects)?;
    let room = state.room.room()?;
    if !room.is_host(player.player_id) {
        effects.toast(ToastStatus::Warning, "Only the room host can do that");
        return None;
    }
    Some(player)
}

pub(crate) fn require_player_in_game(
    state: &AppState,
    effects: &EffectSink,
) -> Option<PlayerInGame> {
    let Some(game) = state.game.game() else {
        effects.toast(ToastStatus::Warning, "Game information is not loaded");
        return None;
    };
    let player = require_player(state, effects)?;
    match game.player(player.player_id) {
        Some(in_game) => Some(in_game.clone()),
        None => {
            effects.toast(ToastStatus::Warning, "You are not in this game");
            None
        }
    }
}

/// Turn ownership: the acting player's seat must be the enabled one.
pub(crate) fn require_turn(state: &AppState, effects: &EffectSink) -> Option<PlayerInGame> {
    let in_game = require_player_in_game(state, effects)?;
    let game = state.game.game()?;
    if game.pos_enabled_to_play != in_game.position {
        effects.toast(ToastStatus::Warning, "It's not your turn");
        return None;
    }
    Some(in_game)
}
