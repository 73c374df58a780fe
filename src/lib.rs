//! Client core for the board game "El Switcher".
//!
//! The crate is the headless half of a game client: it holds the
//! server-authoritative snapshots, pre-validates player gestures against
//! them, and talks to the server over one WebSocket channel per view plus a
//! small REST command surface. It renders nothing; a front-end subscribes to
//! the [`session::UiEffect`] stream and draws whatever the stores say.
//!
//! Layout:
//! - [`game`]: the game data model, movement geometry and seat placement
//! - [`room`]: lobby and waiting-room data model
//! - [`protocol`]: WebSocket frame types and close-code classification
//! - [`api`]: the REST command gateway
//! - [`store`]: snapshot stores and the persisted identity
//! - [`channel`]: the socket actor producing [`channel::ChannelEvent`]s
//! - [`session`]: per-view reducers and the gesture interpreter

pub mod api;
pub mod channel;
pub mod game;
pub mod protocol;
pub mod room;
pub mod session;
pub mod store;
