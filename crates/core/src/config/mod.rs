//! Configuration handling for PipeLink sessions
//!
//! Session configuration is carried as JSON maps so that every layer
//! (built-in defaults, session-type defaults, caller overrides) can be
//! combined with one merge function regardless of which keys it names.

pub mod merge;

pub use merge::{layered, recursive};

use serde_json::{json, Value};

/// Built-in ICE/transport defaults.
///
/// Applied beneath the session-type defaults and caller overrides, so a
/// caller that supplies its own `iceServers` list replaces this one.
pub fn default_ice_configuration() -> Value {
    json!({
        "iceServers": [
            { "urls": ["stun:stun.l.google.com:19302"] }
        ]
    })
}
