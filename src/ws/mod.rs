//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The endpoint at `/ws` streams committed campaign events to clients
//! that subscribe by campaign id or with the `"*"` wildcard.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
