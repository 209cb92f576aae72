//! Loopback mirror demo
//!
//! Negotiates a send/receive session against a media server, routes it
//! through a `GStreamerFilter` mirror element, and feeds the answer
//! back into the session. The server URL comes from `PIPELINK_SERVER`
//! (default `ws://localhost:8888/pipelink`).
//!
//! ```bash
//! cargo run -p pipelink-webrtc --example mirror_pipeline
//! ```

use pipelink_core::elements::{GStreamerFilter, WebRtcEndpoint};
use pipelink_webrtc::signaling::PipelineClient;
use pipelink_webrtc::{MediaMode, NegotiationSession, SessionEvent, SessionOptions};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pipelink_webrtc=debug".into()),
        )
        .init();

    let server_url = std::env::var("PIPELINK_SERVER")
        .unwrap_or_else(|_| "ws://localhost:8888/pipelink".to_string());

    let client = PipelineClient::connect(&server_url).await?;
    let pipeline = client.create_pipeline().await?;

    let endpoint = pipeline.create_element(&WebRtcEndpoint).await?;
    let mirror = pipeline.create_element(&GStreamerFilter::mirror()).await?;

    // Loopback through the mirror: endpoint -> mirror -> endpoint
    endpoint.connect(&mirror).await?;
    mirror.connect(&endpoint).await?;

    let (events_tx, mut events_rx) = mpsc::channel(64);
    let session = NegotiationSession::new(
        MediaMode::SendRecv,
        SessionOptions::new().with_events(events_tx),
    )
    .await?;

    let offer = session.start(None).await?;
    info!("Offer ready ({} bytes)", offer.sdp.len());

    let answer = endpoint
        .invoke("processOffer", json!({ "offer": offer.sdp }))
        .await?;
    let answer_sdp = answer
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("processOffer returned no answer"))?;

    session.process_answer(answer_sdp).await?;
    info!("Answer applied; mirror pipeline is live");

    while let Some(event) = events_rx.recv().await {
        match event {
            SessionEvent::IceCandidate(candidate) => {
                endpoint
                    .invoke(
                        "addIceCandidate",
                        serde_json::to_value(&candidate)?,
                    )
                    .await?;
            }
            SessionEvent::IceGatheringDone => info!("Candidate gathering complete"),
            SessionEvent::RemoteMediaAvailable { locator } => {
                info!("Remote media at {}", locator);
            }
            SessionEvent::Error { code, message } => {
                anyhow::bail!("session error {}: {}", code, message);
            }
            SessionEvent::Disposed => break,
            _ => {}
        }
    }

    session.dispose().await;
    pipeline.release().await?;
    client.disconnect();

    Ok(())
}
