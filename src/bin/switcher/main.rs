//! Headless demo client.
//!
//! Wires the socket actors and sessions together against a live server and
//! drives them from stdin, one simple command language per view. Useful for
//! poking at a server and as a wiring reference for a real front-end.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;

use switcher_client::api::CommandGateway;
use switcher_client::channel::{
    game_url, room_list_url, room_url, ChannelEvent, ChatSender, SocketChannel,
};
use switcher_client::game::{CardId, GameId, PlayableCard, RoomId};
use switcher_client::protocol::{GameMessage, RoomListMessage, RoomMessage};
use switcher_client::session::game::{GameGesture, GameSession};
use switcher_client::session::room::{RoomGesture, RoomSession};
use switcher_client::session::room_list::{RoomListGesture, RoomListSession};
use switcher_client::session::{EffectSink, Route, ToastStatus, UiEffect};
use switcher_client::store::{AppState, SessionIdentity};

#[derive(Parser, Debug)]
#[command(name = "switcher", about = "Headless El Switcher client")]
struct Args {
    /// Base URL of the server's REST API.
    #[arg(long, default_value = "http://localhost:8000/")]
    server: Url,

    /// Base URL of the WebSocket endpoint. Derived from --server when
    /// omitted.
    #[arg(long)]
    ws: Option<Url>,

    /// Path of the persisted player identity record.
    #[arg(long, default_value = "switcher-player.json")]
    identity: PathBuf,

    /// Username to sign up with when no identity is stored yet.
    #[arg(long)]
    username: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let ws_base = match args.ws {
        Some(url) => url,
        None => ws_base_from(&args.server)?,
    };

    let mut state = AppState::new(SessionIdentity::load(args.identity));
    let gateway = CommandGateway::new(args.server.clone());

    if state.identity.player().is_none() {
        let username = args
            .username
            .context("no stored identity; pass --username to sign up")?;
        let player = gateway
            .create_player(&username)
            .await
            .map_err(|envelope| anyhow!("signup rejected: {envelope}"))?;
        println!("signed up as {} (id {})", player.username, player.player_id);
        state.identity.set(player)?;
    }

    // One stdin reader for the whole run; the views take turns consuming it.
    let (line_tx, mut lines) = mpsc::channel::<String>(4);
    tokio::spawn(async move {
        let mut reader = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = reader.next_line().await {
            if line_tx.send(line).await.is_err() {
                return;
            }
        }
    });

    let mut route = Route::Lobby;
    loop {
        let next = match route {
            Route::Signup => {
                bail!("the server no longer knows this player; run again with --username")
            }
            Route::Lobby => lobby_view(&mut state, &gateway, &ws_base, &mut lines).await?,
            Route::Room(room_id) => {
                room_view(&mut state, &gateway, &ws_base, &mut lines, room_id).await?
            }
            Route::Game(game_id) => {
                game_view(&mut state, &gateway, &ws_base, &mut lines, game_id).await?
            }
        };
        match next {
            Some(next) => route = next,
            None => return Ok(()),
        }
    }
}

fn ws_base_from(server: &Url) -> Result<Url> {
    let scheme = match server.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => bail!("cannot derive a ws url from scheme {other}"),
    };
    let mut ws = server.clone();
    ws.set_scheme(scheme)
        .map_err(|_| anyhow!("cannot derive a ws url from {server}"))?;
    Ok(ws)
}

/// Prints an effect; returns the route if it was a navigation.
fn report(effect: UiEffect) -> Option<Route> {
    match effect {
        UiEffect::Toast(toast) => {
            let tag = match toast.status {
                ToastStatus::Success => "ok",
                ToastStatus::Error => "error",
                ToastStatus::Warning => "warning",
                ToastStatus::Info => "info",
            };
            match toast.description {
                Some(description) => println!("[{tag}] {}: {description}", toast.title),
                None => println!("[{tag}] {}", toast.title),
            }
            None
        }
        UiEffect::Navigate(route) => Some(route),
        UiEffect::PasswordRequired => {
            println!("that room is private; retry with: join <password>");
            None
        }
    }
}

/// Navigation the reducer emitted right before its channel closed.
fn pending_navigation(rx: &mut mpsc::UnboundedReceiver<UiEffect>) -> Option<Route> {
    let mut nav = None;
    while let Ok(effect) = rx.try_recv() {
        if let Some(route) = report(effect) {
            nav = Some(route);
        }
    }
    nav
}

async fn lobby_view(
    state: &mut AppState,
    gateway: &CommandGateway,
    ws_base: &Url,
    lines: &mut mpsc::Receiver<String>,
) -> Result<Option<Route>> {
    let player_id = state
        .identity
        .player()
        .context("identity missing")?
        .player_id;
    if let Some(winner) = state.room_list.last_winner() {
        println!("last game won by {winner}");
    }
    println!("lobby. commands: rooms, select <id>, deselect, create <name> <min> <max> [password], join [password], quit");

    let (event_tx, mut events) = mpsc::channel(16);
    // The lobby never sends frames, but the held sender keeps the socket
    // open until the view exits.
    let (_outbound_tx, outbound_rx) = mpsc::channel::<serde_json::Value>(1);
    let mut set = JoinSet::new();
    set.spawn(
        SocketChannel::<RoomListMessage, serde_json::Value>::new(
            room_list_url(ws_base, player_id)?,
            event_tx,
            outbound_rx,
        )
        .run(),
    );

    let (sink, mut effects) = EffectSink::new();
    let mut session = RoomListSession::new(state, gateway, sink);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let closed = matches!(event, ChannelEvent::Closed(_));
                session.handle_event(event);
                if closed {
                    break;
                }
            }
            effect = effects.recv() => {
                let Some(effect) = effect else { break };
                if let Some(route) = report(effect) {
                    return Ok(Some(route));
                }
            }
            line = lines.recv() => {
                let Some(line) = line else { return Ok(None) };
                let words: Vec<&str> = line.split_whitespace().collect();
                match words.as_slice() {
                    [] => {}
                    ["quit"] => return Ok(None),
                    ["rooms"] => {
                        for room in session.rooms() {
                            println!(
                                "  #{} {} ({}/{}){}{}",
                                room.room_id,
                                room.room_name,
                                room.actual_players,
                                room.max_players,
                                if room.is_private { " private" } else { "" },
                                if room.started { " started" } else { "" },
                            );
                        }
                    }
                    ["select", id] => match id.parse::<RoomId>() {
                        Ok(id) => session.handle_gesture(RoomListGesture::SelectRoom(id)).await,
                        Err(_) => println!("usage: select <id>"),
                    },
                    ["deselect"] => {
                        session.handle_gesture(RoomListGesture::DeselectRoom).await;
                    }
                    ["create", name, min, max, rest @ ..] => {
                        match (min.parse::<i32>(), max.parse::<i32>()) {
                            (Ok(min_players), Ok(max_players)) => {
                                session
                                    .handle_gesture(RoomListGesture::CreateRoom {
                                        room_name: name.to_string(),
                                        min_players,
                                        max_players,
                                        password: rest.first().map(|p| p.to_string()),
                                    })
                                    .await;
                            }
                            _ => println!("usage: create <name> <min> <max> [password]"),
                        }
                    }
                    ["join", rest @ ..] => {
                        session
                            .handle_gesture(RoomListGesture::JoinRoom {
                                password: rest.first().map(|p| p.to_string()),
                            })
                            .await;
                    }
                    _ => println!("unknown command: {line}"),
                }
            }
        }
    }

    debug!("lobby channel gone");
    match pending_navigation(&mut effects) {
        Some(route) => Ok(Some(route)),
        None => {
            println!("lost the lobby connection");
            Ok(None)
        }
    }
}

async fn room_view(
    state: &mut AppState,
    gateway: &CommandGateway,
    ws_base: &Url,
    lines: &mut mpsc::Receiver<String>,
    room_id: RoomId,
) -> Result<Option<Route>> {
    let player_id = state
        .identity
        .player()
        .context("identity missing")?
        .player_id;
    println!("room {room_id}. commands: who, leave, start, quit");

    let (event_tx, mut events) = mpsc::channel(16);
    let (_outbound_tx, outbound_rx) = mpsc::channel::<serde_json::Value>(1);
    let mut set = JoinSet::new();
    set.spawn(
        SocketChannel::<RoomMessage, serde_json::Value>::new(
            room_url(ws_base, player_id, room_id)?,
            event_tx,
            outbound_rx,
        )
        .run(),
    );

    let (sink, mut effects) = EffectSink::new();
    let mut session = RoomSession::new(state, gateway, sink, room_id);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let closed = matches!(event, ChannelEvent::Closed(_));
                session.handle_event(event);
                if closed {
                    break;
                }
            }
            effect = effects.recv() => {
                let Some(effect) = effect else { break };
                if let Some(route) = report(effect) {
                    return Ok(Some(route));
                }
            }
            line = lines.recv() => {
                let Some(line) = line else { return Ok(None) };
                match line.trim() {
                    "" => {}
                    "quit" => return Ok(None),
                    "who" => {
                        if let Some(room) = session.room() {
                            println!("  {} (host id {})", room.room_name, room.host_id);
                            for player in &room.players {
                                println!("  - {} (id {})", player.username, player.player_id);
                            }
                        } else {
                            println!("no room snapshot yet");
                        }
                    }
                    "leave" => session.handle_gesture(RoomGesture::LeaveRoom).await,
                    "start" => session.handle_gesture(RoomGesture::StartGame).await,
                    other => println!("unknown command: {other}"),
                }
            }
        }
    }

    debug!("room channel gone");
    Ok(Some(pending_navigation(&mut effects).unwrap_or(Route::Lobby)))
}

async fn game_view(
    state: &mut AppState,
    gateway: &CommandGateway,
    ws_base: &Url,
    lines: &mut mpsc::Receiver<String>,
    game_id: GameId,
) -> Result<Option<Route>> {
    let player_id = state
        .identity
        .player()
        .context("identity missing")?
        .player_id;
    println!(
        "game {game_id}. commands: board, hand, card <id>, tile <x> <y>, end, cancel, say <text>, leave, quit"
    );

    let (event_tx, mut events) = mpsc::channel(16);
    let (outbound_tx, outbound_rx) = mpsc::channel::<GameMessage>(16);
    let mut set = JoinSet::new();
    set.spawn(
        SocketChannel::<GameMessage, GameMessage>::new(
            game_url(ws_base, player_id, game_id)?,
            event_tx,
            outbound_rx,
        )
        .run(),
    );

    let (sink, mut effects) = EffectSink::new();
    let chat = ChatSender::new(outbound_tx);
    let mut session = GameSession::new(state, gateway, sink, chat, game_id);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                if let ChannelEvent::Frame(GameMessage::Msg(message)) = &event {
                    println!("<{}> {}", message.username, message.text);
                }
                let closed = matches!(event, ChannelEvent::Closed(_));
                session.handle_event(event);
                if closed {
                    break;
                }
            }
            effect = effects.recv() => {
                let Some(effect) = effect else { break };
                if let Some(route) = report(effect) {
                    return Ok(Some(route));
                }
            }
            line = lines.recv() => {
                let Some(line) = line else { return Ok(None) };
                let words: Vec<&str> = line.split_whitespace().collect();
                match words.as_slice() {
                    [] => {}
                    ["quit"] => return Ok(None),
                    ["board"] => print_board(&session),
                    ["hand"] => print_hand(&session),
                    ["card", id] => match id.parse::<CardId>() {
                        Ok(id) => match find_card(&session, id) {
                            Some(card) => session.handle_gesture(GameGesture::ClickCard(card)).await,
                            None => println!("no card with id {id} on the table"),
                        },
                        Err(_) => println!("usage: card <id>"),
                    },
                    ["tile", x, y] => match (x.parse::<i32>(), y.parse::<i32>()) {
                        (Ok(pos_x), Ok(pos_y)) => {
                            session
                                .handle_gesture(GameGesture::ClickTile { pos_x, pos_y })
                                .await;
                        }
                        _ => println!("usage: tile <x> <y>"),
                    },
                    ["end"] => session.handle_gesture(GameGesture::EndTurn).await,
                    ["cancel"] => session.handle_gesture(GameGesture::CancelMove).await,
                    ["leave"] => session.handle_gesture(GameGesture::LeaveGame).await,
                    ["say", ..] => {
                        let text = line.trim_start().trim_start_matches("say").trim();
                        session
                            .handle_gesture(GameGesture::SendChat(text.to_string()))
                            .await;
                    }
                    _ => println!("unknown command: {line}"),
                }
            }
        }
    }

    debug!("game channel gone");
    Ok(Some(pending_navigation(&mut effects).unwrap_or(Route::Lobby)))
}

/// Resolves a clicked card id: the local movement hand first, then any figure
/// card on the table (opponents' cards are legal blocking targets).
fn find_card(session: &GameSession<'_>, card_id: CardId) -> Option<PlayableCard> {
    let game = session.game()?;
    let me = session.me()?;
    for card in me.cards_movement.iter().flatten() {
        if card.card_id == card_id {
            return Some(PlayableCard::Movement(*card));
        }
    }
    for player in &game.players {
        for card in &player.cards_figure {
            if card.card_id == card_id {
                return Some(PlayableCard::Figure(*card));
            }
        }
    }
    None
}

fn print_board(session: &GameSession<'_>) {
    let board = session.board();
    if board.is_empty() {
        println!("no game snapshot yet");
        return;
    }
    for row in board.chunks(6) {
        let line: String = row
            .iter()
            .map(|cell| {
                let letter = format!("{:?}", cell.tile.color);
                if cell.is_highlighted {
                    format!("[{letter}]")
                } else if cell.marks.background {
                    format!("({letter})")
                } else {
                    format!(" {letter} ")
                }
            })
            .collect();
        println!("  {line}");
    }
}

fn print_hand(session: &GameSession<'_>) {
    let Some(me) = session.me() else {
        println!("no game snapshot yet");
        return;
    };
    for card in me.cards_movement.iter().flatten() {
        println!(
            "  movement #{} {:?}{}",
            card.card_id,
            card.kind,
            if card.is_used { " (used)" } else { "" }
        );
    }
    for card in &me.cards_figure {
        println!(
            "  figure   #{} {:?}{}",
            card.card_id,
            card.kind,
            if card.is_blocked { " (blocked)" } else { "" }
        );
    }
}
