//! Deprecated positional calling convention
//!
//! Early SDK releases constructed sessions from a positional argument
//! list instead of an option bundle. This adapter normalizes such calls
//! into [`SessionOptions`] at the boundary so the session constructor
//! stays single-shape. Positional callbacks are bridged onto the typed
//! event channel by a spawned dispatcher.

use crate::config::SessionOptions;
use crate::events::{ErrorCode, SessionEvent};
use crate::media::{MediaAttachment, MediaSink};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Callback invoked with the offer SDP once it is ready
pub type OfferCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Callback invoked with the class and message of a failed step
pub type ErrorCallback = Arc<dyn Fn(ErrorCode, String) + Send + Sync>;

/// One slot of the legacy positional argument list.
///
/// Positions, in order: local sink, remote sink, offer callback, error
/// callback, media constraints, video attachment, audio attachment.
pub enum LegacyArg {
    /// A media sink reference
    Sink(Arc<dyn MediaSink>),
    /// Offer-ready callback
    OfferCallback(OfferCallback),
    /// Error callback
    ErrorCallback(ErrorCallback),
    /// A constraint map
    Constraints(Value),
    /// A pre-acquired media attachment
    Attachment(MediaAttachment),
}

impl LegacyArg {
    fn slot_name(index: usize) -> &'static str {
        match index {
            0 => "local sink",
            1 => "remote sink",
            2 => "offer callback",
            3 => "error callback",
            4 => "media constraints",
            5 => "video attachment",
            6 => "audio attachment",
            _ => "extra argument",
        }
    }
}

/// Normalize a legacy positional call into a structured option bundle.
///
/// Trailing empty slots are trimmed first; a call with three or fewer
/// remaining positions is not a legacy call and yields `None`. When
/// callbacks are supplied the bridge dispatcher is spawned, so this
/// must run inside a tokio runtime in that case.
pub fn normalize(mut args: Vec<Option<LegacyArg>>) -> Option<SessionOptions> {
    while args.last().map_or(false, Option::is_none) {
        args.pop();
    }
    if args.len() <= 3 {
        return None;
    }

    warn!("Positional session arguments are deprecated; pass SessionOptions instead");

    let mut options = SessionOptions::new();
    let mut offer_callback: Option<OfferCallback> = None;
    let mut error_callback: Option<ErrorCallback> = None;

    for (index, arg) in args.into_iter().enumerate() {
        let Some(arg) = arg else { continue };
        match (index, arg) {
            (0, LegacyArg::Sink(sink)) => options.local_sink = Some(sink),
            (1, LegacyArg::Sink(sink)) => options.remote_sink = Some(sink),
            (2, LegacyArg::OfferCallback(callback)) => offer_callback = Some(callback),
            (3, LegacyArg::ErrorCallback(callback)) => error_callback = Some(callback),
            (4, LegacyArg::Constraints(constraints)) => {
                options.media_constraints = Some(constraints)
            }
            (5, LegacyArg::Attachment(attachment)) => {
                options.video_attachment = Some(attachment)
            }
            (6, LegacyArg::Attachment(attachment)) => {
                options.audio_attachment = Some(attachment)
            }
            (index, _) => {
                warn!(
                    "Ignoring positional argument {} ({}): unexpected kind",
                    index,
                    LegacyArg::slot_name(index)
                );
            }
        }
    }

    if offer_callback.is_some() || error_callback.is_some() {
        let (tx, rx) = mpsc::channel(16);
        options.events = Some(tx);
        spawn_callback_bridge(rx, offer_callback, error_callback);
    }

    Some(options)
}

/// Dispatch session events onto the legacy callbacks
fn spawn_callback_bridge(
    mut rx: mpsc::Receiver<SessionEvent>,
    offer_callback: Option<OfferCallback>,
    error_callback: Option<ErrorCallback>,
) {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                SessionEvent::OfferReady { sdp } => {
                    if let Some(callback) = &offer_callback {
                        callback(sdp);
                    }
                }
                SessionEvent::Error { code, message } => {
                    if let Some(callback) = &error_callback {
                        callback(code, message);
                    }
                }
                other => debug!(event = other.name(), "Legacy bridge ignoring event"),
            }
        }
        debug!("Legacy callback bridge terminated");
    });
}
