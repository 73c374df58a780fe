//! The streaming-channel actor.
//!
//! One [`SocketChannel`] per mounted view: it opens a single WebSocket
//! connection, turns inbound text frames into typed [`ChannelEvent`]s on an
//! mpsc sender, and drains an outbound mpsc while the socket is open. There
//! is no reconnect loop anywhere; when the server hangs up the close code is
//! classified and forwarded, and the actor exits. A fresh mount makes a
//! fresh actor.

use anyhow::{anyhow, Result};
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::connect_async;
use tracing::{debug, warn};
use url::Url;

use crate::game::{GameId, PlayerId, RoomId};
use crate::protocol::{CloseReason, GameMessage};

/// What a channel reports to its session.
#[derive(Clone, Debug)]
pub enum ChannelEvent<M> {
    /// A decoded inbound frame, in arrival order.
    Frame(M),
    /// The connection ended. Terminal; the actor is gone after sending this.
    Closed(CloseReason),
}

/// Lobby channel endpoint.
pub fn room_list_url(base: &Url, player_id: PlayerId) -> Result<Url> {
    base.join(&format!("rooms/{player_id}"))
        .map_err(|err| anyhow!("room list url: {err}"))
}

/// Waiting-room channel endpoint.
pub fn room_url(base: &Url, player_id: PlayerId, room_id: RoomId) -> Result<Url> {
    base.join(&format!("rooms/{player_id}/{room_id}"))
        .map_err(|err| anyhow!("room url: {err}"))
}

/// Game channel endpoint.
pub fn game_url(base: &Url, player_id: PlayerId, game_id: GameId) -> Result<Url> {
    base.join(&format!("games/{player_id}/{game_id}"))
        .map_err(|err| anyhow!("game url: {err}"))
}

pub struct SocketChannel<In, Out> {
    url: Url,
    events: mpsc::Sender<ChannelEvent<In>>,
    outbound: mpsc::Receiver<Out>,
}

impl<In, Out> SocketChannel<In, Out>
where
    In: DeserializeOwned + Send + 'static,
    Out: Serialize + Send + 'static,
{
    pub fn new(
        url: Url,
        events: mpsc::Sender<ChannelEvent<In>>,
        outbound: mpsc::Receiver<Out>,
    ) -> SocketChannel<In, Out> {
        SocketChannel {
            url,
            events,
            outbound,
        }
    }

    /// Runs the connection to completion. Resolves once the socket closes,
    /// the session drops its outbound sender (unmount), or the session stops
    /// listening for events.
    pub async fn run(mut self) -> Result<()> {
        let (ws_stream, _) = match connect_async(self.url.as_str()).await {
            Ok(v) => v,
            Err(err) => {
                warn!(url = %self.url, error = %err, "ws connect failed");
                // An unreachable server looks like an abnormal close.
                let _ = self
                    .events
                    .send(ChannelEvent::Closed(CloseReason::Other(1006)))
                    .await;
                return Ok(());
            }
        };
        debug!(url = %self.url, "ws connected");

        let (mut to_ws, mut from_ws) = ws_stream.split();

        loop {
            tokio::select! {
                inbound = from_ws.next() => {
                    match inbound {
                        Some(Ok(Message::Text(text))) => {
                            let msg: In = match serde_json::from_str(&text) {
                                Ok(msg) => msg,
                                Err(err) => {
                                    warn!(error = %err, "dropping unparseable frame");
                                    continue;
                                }
                            };
                            if self.events.send(ChannelEvent::Frame(msg)).await.is_err() {
                                // Session is gone; tear down.
                                let _ = to_ws.send(Message::Close(None)).await;
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let reason = match &frame {
                                Some(f) => CloseReason::classify(u16::from(f.code), &f.reason),
                                None => CloseReason::Other(1005),
                            };
                            debug!(url = %self.url, ?reason, "ws closed by server");
                            let _ = self.events.send(ChannelEvent::Closed(reason)).await;
                            return Ok(());
                        }
                        Some(Ok(_)) => {} // ping/pong/binary: nothing to do
                        Some(Err(err)) => {
                            warn!(url = %self.url, error = %err, "ws read error");
                            let _ = self
                                .events
                                .send(ChannelEvent::Closed(CloseReason::Other(1006)))
                                .await;
                            return Ok(());
                        }
                        None => {
                            let _ = self
                                .events
                                .send(ChannelEvent::Closed(CloseReason::Other(1006)))
                                .await;
                            return Ok(());
                        }
                    }
                }

                outbound = self.outbound.recv() => {
                    match outbound {
                        Some(msg) => {
                            let text = serde_json::to_string(&msg)?;
                            if let Err(err) = to_ws.send(Message::Text(text)).await {
                                // Socket already closing; the frame is
                                // dropped, never queued.
                                debug!(error = %err, "dropped outbound frame");
                            }
                        }
                        None => {
                            // Unmount: close if open, then exit.
                            let _ = to_ws.send(Message::Close(None)).await;
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

/// Handle for sending chat on the game channel. Sends are fire-and-forget:
/// if the socket (or its actor) is no longer there, the message is silently
/// dropped, matching the "no-op unless open" contract.
#[derive(Clone, Debug)]
pub struct ChatSender {
    tx: mpsc::Sender<GameMessage>,
}

impl ChatSender {
    pub fn new(tx: mpsc::Sender<GameMessage>) -> ChatSender {
        ChatSender { tx }
    }

    pub fn send(&self, message: GameMessage) {
        if let Err(err) = self.tx.try_send(message) {
            debug!(error = %err, "chat message dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_urls_match_the_server_routes() {
        let base = Url::parse("ws://localhost:8000/").unwrap();
        assert_eq!(
            room_list_url(&base, 7).unwrap().as_str(),
            "ws://localhost:8000/rooms/7"
        );
        assert_eq!(
            room_url(&base, 7, 3).unwrap().as_str(),
            "ws://localhost:8000/rooms/7/3"
        );
        assert_eq!(
            game_url(&base, 7, 12).unwrap().as_str(),
            "ws://localhost:8000/games/7/12"
        );
    }

    #[tokio::test]
    async fn chat_sender_drops_when_the_channel_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        let sender = ChatSender::new(tx);
        drop(rx);
        // Must not panic or block.
        sender.send(GameMessage::Msg(crate::protocol::ChatMessage {
            username: "ana".into(),
            text: "hola".into(),
        }));
    }
}
