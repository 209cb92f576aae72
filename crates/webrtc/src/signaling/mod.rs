//! JSON-RPC 2.0 client for the media server's object API
//!
//! The media server exposes its pipeline graph as remotely managed
//! objects: `create` builds them, `invoke` calls their operations,
//! `subscribe` routes their events back over the socket, `release`
//! tears them down. [`PipelineClient`] speaks that protocol over a
//! WebSocket; [`MediaPipelineHandle`] and [`ElementHandle`] wrap object
//! ids with the common calls.

mod client;
mod objects;
pub mod protocol;

pub use client::PipelineClient;
pub use objects::{ElementHandle, EventSubscription, MediaPipelineHandle};
