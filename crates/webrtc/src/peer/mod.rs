//! Peer handle construction and the legacy calling convention

pub mod legacy;

use crate::config::ice_servers_from_configuration;
use crate::{Error, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::RTCPeerConnection;

/// Build a peer connection from a merged ICE/transport configuration.
///
/// Registers the default codecs and interceptors; the configuration's
/// `iceServers` list becomes the engine's ICE server set.
pub async fn build_peer_connection(configuration: &Value) -> Result<Arc<RTCPeerConnection>> {
    let mut media_engine = MediaEngine::default();
    media_engine
        .register_default_codecs()
        .map_err(|e| Error::Negotiation(format!("Failed to register codecs: {}", e)))?;

    let interceptor_registry = register_default_interceptors(Default::default(), &mut media_engine)
        .map_err(|e| Error::Negotiation(format!("Failed to register interceptors: {}", e)))?;

    let api = APIBuilder::new()
        .with_media_engine(media_engine)
        .with_interceptor_registry(interceptor_registry)
        .build();

    let ice_servers = ice_servers_from_configuration(configuration);
    debug!(servers = ice_servers.len(), "Building peer connection");

    let rtc_config = RTCConfiguration {
        ice_servers,
        ..Default::default()
    };

    let peer = api
        .new_peer_connection(rtc_config)
        .await
        .map_err(|e| Error::Negotiation(format!("Failed to create peer connection: {}", e)))?;

    Ok(Arc::new(peer))
}
