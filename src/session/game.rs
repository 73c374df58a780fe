//! Game session: the game channel reducer plus the card/tile gesture state
//! machine.
//!
//! Selection rules, all local and advisory:
//! - selecting a card always clears the selected tile; the two are mutually
//!   exclusive focus targets
//! - re-selecting the selected card toggles it off
//! - with a movement card, the first tile click anchors the origin, a second
//!   click on the same tile toggles it off, a legal destination issues the
//!   move, and any other tile silently re-anchors the origin
//! - the server's next status push clears the whole selection

use tokio::sync::mpsc;
use tracing::debug;

use super::{require_player_in_game, require_turn, EffectSink, Route, ToastStatus};
use crate::api::{
    BlockFigureRequest, CommandGateway, ErrorEnvelope, MoveCardRequest, PlayFigureRequest,
};
use crate::channel::{ChannelEvent, ChatSender};
use crate::game::rules::{extended_board, legal_destination, ExtendedTile};
use crate::game::seats::{assign_seats, TableSeats};
use crate::game::{CardId, CoordsTile, GameId, PlayableCard, PlayerId, PlayerInGame};
use crate::protocol::{ChatMessage, CloseReason, GameMessage};
use crate::store::AppState;

/// The REST commands a game session can issue. Implemented by the real
/// gateway; tests substitute a recorder.
#[allow(async_fn_in_trait)]
pub trait GameCommands {
    async fn end_turn(&self, game_id: GameId, player_id: PlayerId) -> Result<(), ErrorEnvelope>;
    async fn leave_game(&self, game_id: GameId, player_id: PlayerId)
        -> Result<(), ErrorEnvelope>;
    async fn cancel_move(&self, game_id: GameId, player_id: PlayerId)
        -> Result<(), ErrorEnvelope>;
    async fn move_card(
        &self,
        game_id: GameId,
        req: &MoveCardRequest,
    ) -> Result<(), ErrorEnvelope>;
    async fn play_figure(
        &self,
        game_id: GameId,
        req: &PlayFigureRequest,
    ) -> Result<(), ErrorEnvelope>;
    async fn block_figure(
        &self,
        game_id: GameId,
        req: &BlockFigureRequest,
    ) -> Result<(), ErrorEnvelope>;
}

impl GameCommands for CommandGateway {
    async fn end_turn(&self, game_id: GameId, player_id: PlayerId) -> Result<(), ErrorEnvelope> {
        CommandGateway::end_turn(self, game_id, player_id).await
    }

    async fn leave_game(
        &self,
        game_id: GameId,
        player_id: PlayerId,
    ) -> Result<(), ErrorEnvelope> {
        CommandGateway::leave_game(self, game_id, player_id).await
    }

    async fn cancel_move(
        &self,
        game_id: GameId,
        player_id: PlayerId,
    ) -> Result<(), ErrorEnvelope> {
        CommandGateway::cancel_move(self, game_id, player_id).await
    }

    async fn move_card(
        &self,
        game_id: GameId,
        req: &MoveCardRequest,
    ) -> Result<(), ErrorEnvelope> {
        CommandGateway::move_card(self, game_id, req).await
    }

    async fn play_figure(
        &self,
        game_id: GameId,
        req: &PlayFigureRequest,
    ) -> Result<(), ErrorEnvelope> {
        CommandGateway::play_figure(self, game_id, req).await
    }

    async fn block_figure(
        &self,
        game_id: GameId,
        req: &BlockFigureRequest,
    ) -> Result<(), ErrorEnvelope> {
        CommandGateway::block_figure(self, game_id, req).await
    }
}

#[derive(Clone, Debug)]
pub enum GameGesture {
    ClickCard(PlayableCard),
    ClickTile { pos_x: i32, pos_y: i32 },
    EndTurn,
    CancelMove,
    LeaveGame,
    SendChat(String),
}

pub struct GameSession<'a, C: GameCommands = CommandGateway> {
    state: &'a mut AppState,
    gateway: &'a C,
    effects: EffectSink,
    chat: ChatSender,
    game_id: GameId,
}

impl<'a, C: GameCommands> GameSession<'a, C> {
    pub fn new(
        state: &'a mut AppState,
        gateway: &'a C,
        effects: EffectSink,
        chat: ChatSender,
        game_id: GameId,
    ) -> GameSession<'a, C> {
        GameSession {
            state,
            gateway,
            effects,
            chat,
            game_id,
        }
    }

    pub async fn run(
        &mut self,
        events: &mut mpsc::Receiver<ChannelEvent<GameMessage>>,
        gestures: &mut mpsc::Receiver<GameGesture>,
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

    pub fn game(&self) -> Option<&crate::game::Game> {
        self.state.game.game()
    }

    /// The local player's in-game record, if the snapshot holds one.
    pub fn me(&self) -> Option<&PlayerInGame> {
        let game = self.state.game.game()?;
        let player = self.state.identity.player()?;
        game.player(player.player_id)
    }

    pub fn handle_event(&mut self, event: ChannelEvent<GameMessage>) {
        match event {
            ChannelEvent::Frame(GameMessage::Status(game)) => {
                // Server state always wins; whatever was selected is stale.
                self.state.game.set_game(game);
                self.state.game.unselect_card();
                self.state.game.unselect_tile();
            }
            ChannelEvent::Frame(GameMessage::End { username, .. }) => {
                self.effects.navigate(Route::Lobby);
                self.state.game.clean_chat();
                self.state.room_list.set_last_winner(username);
                self.state.game.clear_game();
            }
            ChannelEvent::Frame(GameMessage::Msg(message)) => {
                self.state.game.push_chat(message);
            }
            ChannelEvent::Closed(reason) => self.handle_close(reason),
        }
    }

    fn handle_close(&mut self, reason: CloseReason) {
        match reason {
            CloseReason::NotFound => {
                self.effects.toast_detail(
                    ToastStatus::Error,
                    "Could not connect to the game",
                    "Game not found",
                );
            }
            CloseReason::DuplicateSession => {
                self.effects.toast_detail(
                    ToastStatus::Warning,
                    "Connection opened somewhere else",
                    "Only one connection per game at a time",
                );
            }
            CloseReason::ServerError(reason) => {
                self.effects
                    .toast_detail(ToastStatus::Error, "Could not connect to the game", reason);
            }
            CloseReason::GameStarted | CloseReason::Other(_) => {
                debug!(?reason, "game channel closed");
                return;
            }
        }
        self.effects.navigate(Route::Lobby);
        self.state.game.clean_chat();
        self.state.game.clear_game();
    }

    pub async fn handle_gesture(&mut self, gesture: GameGesture) {
        match gesture {
            GameGesture::ClickCard(card) => self.handle_click_card(card),
            GameGesture::ClickTile { pos_x, pos_y } => {
                self.handle_click_tile(pos_x, pos_y).await;
            }
            GameGesture::EndTurn => self.end_turn().await,
            GameGesture::CancelMove => self.cancel_move().await,
            GameGesture::LeaveGame => self.leave_game().await,
            GameGesture::SendChat(text) => self.send_chat(text),
        }
    }

    /// Card click: pre-validate, then toggle/replace the selection. Never
    /// touches the network.
    pub fn handle_click_card(&mut self, card: PlayableCard) {
        let Some(me) = require_turn(self.state, &self.effects) else {
            return;
        };

        match &card {
            PlayableCard::Movement(mov) => {
                if mov.is_used {
                    self.effects
                        .toast(ToastStatus::Warning, "The card has already been used");
                    return;
                }
            }
            PlayableCard::Figure(fig) => {
                if fig.is_blocked {
                    self.effects
                        .toast(ToastStatus::Warning, "The card is blocked");
                    return;
                }
                // An opponent's figure card is a blocking target and has its
                // own eligibility rules.
                if !me.holds_figure_card(&card) {
                    let Some(game) = self.state.game.game() else {
                        return;
                    };
                    let Some(owner) = game.owner_of(&card) else {
                        self.effects
                            .toast(ToastStatus::Warning, "Nobody holds that card");
                        return;
                    };
                    if owner.cards_figure.len() < 3 {
                        self.effects.toast(
                            ToastStatus::Warning,
                            "That player has fewer than 3 figure cards",
                        );
                        return;
                    }
                    if owner.has_blocked_figure() {
                        self.effects.toast(
                            ToastStatus::Warning,
                            "That player already has a blocked card",
                        );
                        return;
                    }
                }
            }
        }

        self.state.game.unselect_tile();
        let toggled_off = self
            .state
            .game
            .selected_card()
            .map(|selected| selected.same_card(&card))
            .unwrap_or(false);
        if toggled_off {
            self.state.game.unselect_card();
        } else {
            self.state.game.select_card(card);
        }
    }

    /// Tile click: dispatches to the figure or movement flow of the selected
    /// card. Command success leaves the selection alone; the server's status
    /// push clears it uniformly.
    pub async fn handle_click_tile(&mut self, pos_x: i32, pos_y: i32) {
        let Some(me) = require_turn(self.state, &self.effects) else {
            return;
        };
        let Some(card) = self.state.game.selected_card().copied() else {
            self.effects.toast(ToastStatus::Warning, "No card selected");
            return;
        };
        let coords = CoordsTile::new(pos_x, pos_y);

        match card {
            PlayableCard::Figure(fig) => {
                self.click_tile_with_figure(coords, &card, fig.card_id, &me)
                    .await;
            }
            PlayableCard::Movement(mov) => {
                match self.state.game.selected_tile() {
                    None => {
                        self.state.game.select_tile(coords);
                    }
                    Some(origin) if origin == coords => {
                        self.state.game.unselect_tile();
                    }
                    Some(origin) if legal_destination(coords, origin, &card) => {
                        let req = MoveCardRequest {
                            player_id: me.player_id,
                            card_id: mov.card_id,
                            origin,
                            destination: coords,
                        };
                        if let Err(envelope) =
                            self.gateway.move_card(self.game_id, &req).await
                        {
                            self.effects
                                .surface_error("Could not make the move", &envelope);
                        }
                    }
                    Some(_) => {
                        // Not a legal destination: silently re-anchor the
                        // origin, the user is picking a different start.
                        self.state.game.select_tile(coords);
                    }
                }
            }
        }
    }

    async fn click_tile_with_figure(
        &mut self,
        coords: CoordsTile,
        card: &PlayableCard,
        card_id: CardId,
        me: &PlayerInGame,
    ) {
        let Some(game) = self.state.game.game() else {
            return;
        };
        let Some(figure) = game.figure_at(coords) else {
            self.effects
                .toast(ToastStatus::Warning, "Select a valid figure");
            return;
        };
        let figure = figure.to_vec();

        if me.holds_figure_card(card) {
            let req = PlayFigureRequest {
                player_id: me.player_id,
                card_id,
                figure,
            };
            if let Err(envelope) = self.gateway.play_figure(self.game_id, &req).await {
                self.effects
                    .surface_error("Could not play the figure", &envelope);
            }
        } else {
            let Some(owner) = game.owner_of(card) else {
                self.effects
                    .toast(ToastStatus::Warning, "Nobody holds that card");
                return;
            };
            let req = BlockFigureRequest {
                card_id,
                player_id: me.player_id,
                target_id: owner.player_id,
                figure,
            };
            if let Err(envelope) = self.gateway.block_figure(self.game_id, &req).await {
                self.effects
                    .surface_error("Could not block the figure", &envelope);
            }
        }
    }

    pub async fn end_turn(&mut self) {
        let Some(me) = require_turn(self.state, &self.effects) else {
            return;
        };
        match self.gateway.end_turn(self.game_id, me.player_id).await {
            Ok(()) => {
                self.state.game.unselect_card();
                self.state.game.unselect_tile();
            }
            Err(envelope) => {
                self.effects
                    .surface_error("Could not end the turn", &envelope);
            }
        }
    }

    pub async fn cancel_move(&mut self) {
        let Some(me) = require_turn(self.state, &self.effects) else {
            return;
        };
        if !me.has_used_movement() {
            self.effects
                .toast(ToastStatus::Warning, "No movement to cancel");
            return;
        }
        if let Err(envelope) = self.gateway.cancel_move(self.game_id, me.player_id).await {
            self.effects
                .surface_error("Could not cancel the movement", &envelope);
        }
    }

    pub async fn leave_game(&mut self) {
        let Some(me) = require_player_in_game(self.state, &self.effects) else {
            return;
        };
        match self.gateway.leave_game(self.game_id, me.player_id).await {
            Ok(()) => {
                self.effects.navigate(Route::Lobby);
                self.state.game.clean_chat();
            }
            Err(envelope) => {
                self.effects
                    .surface_error("Could not leave the game", &envelope);
            }
        }
    }

    /// Chat is fire-and-forget on the streaming channel, not a REST command.
    pub fn send_chat(&mut self, text: String) {
        let Some(player) = self.state.identity.player() else {
            return;
        };
        self.chat.send(GameMessage::Msg(ChatMessage {
            username: player.username.clone(),
            text,
        }));
    }

    /// The annotated board for the current selection.
    pub fn board(&self) -> Vec<ExtendedTile> {
        match self.state.game.game() {
            Some(game) => extended_board(
                game,
                self.state.game.selected_tile(),
                self.state.game.selected_card(),
            ),
            None => Vec::new(),
        }
    }

    /// Opponents placed around the table, local player south.
    pub fn table_seats(&self) -> TableSeats<'_> {
        let Some(game) = self.state.game.game() else {
            return TableSeats::default();
        };
        let Some(player) = self.state.identity.player() else {
            return TableSeats::default();
        };
        let my_seat = match game.player(player.player_id) {
            Some(me) => me.position,
            None => return TableSeats::default(),
        };
        assign_seats(
            game.players
                .iter()
                .filter(|p| p.player_id != player.player_id),
            my_seat,
        )
    }
}
