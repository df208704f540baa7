// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Prover-side display loop: packs the proof, then cycles the carousel on a
//! fixed tick, skipping frames the scanner has acknowledged, until a verdict
//! arrives on the side channel.

use std::time::Duration;

use tokio::sync::mpsc;

use glint_kernel::{wire, Carousel, ChannelEvent, FrameConfig};

use crate::channel::ChannelClient;
use crate::errors::NodeError;

/// What the display collaborator is asked to render next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayUpdate {
    /// Render this frame as a QR code.
    Frame { seq: u32, text: String },
    /// Transfer is over; show the verdict screen.
    Outcome(bool),
}

/// Drive one transfer's display until the scanner publishes a verdict.
///
/// Returns the verdict. The carousel and its skip set are touched only from
/// this loop; acknowledgements arrive as side-channel events.
pub async fn run_display_loop(
    payload: &[u8],
    frame_cfg: FrameConfig,
    tick_interval: Duration,
    mut channel: ChannelClient,
    display: mpsc::Sender<DisplayUpdate>,
) -> Result<bool, NodeError> {
    let wire_payload = wire::pack_payload(payload)?;
    let frames = frame_cfg.encode(&wire_payload)?;
    let mut carousel = Carousel::new(frames.len() as u32);
    tracing::info!(
        "Prover: displaying {} frames ({} payload bytes, digest {})",
        frames.len(),
        payload.len(),
        wire::payload_digest(payload)
    );

    let mut interval = tokio::time::interval(tick_interval);
    // The first tick completes immediately; consume it so frame 0 gets a
    // full display interval.
    interval.tick().await;
    send_frame(&display, 0, &frames).await?;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if carousel.is_exhausted() {
                    // Terminal display state: the scanner has everything,
                    // hold the last frame and wait for the verdict.
                    continue;
                }
                let seq = carousel.tick();
                send_frame(&display, seq, &frames).await?;
            }
            event = channel.recv() => {
                match event {
                    Some(ChannelEvent::ChunkAcknowledged(seq)) => {
                        carousel.ack(seq);
                        tracing::debug!(
                            "Prover: chunk {} acknowledged ({}/{})",
                            seq,
                            carousel.acked(),
                            carousel.total()
                        );
                        if carousel.is_exhausted() {
                            tracing::info!(
                                "Prover: all {} frames acknowledged, holding",
                                carousel.total()
                            );
                        }
                    }
                    Some(ChannelEvent::VerificationResult(verified)) => {
                        tracing::info!("Prover: verification result {}", verified);
                        let _ = display.send(DisplayUpdate::Outcome(verified)).await;
                        return Ok(verified);
                    }
                    None => {
                        return Err(NodeError::Channel(
                            "side channel closed before a verdict arrived".into(),
                        ));
                    }
                }
            }
        }
    }
}

async fn send_frame(
    display: &mpsc::Sender<DisplayUpdate>,
    seq: u32,
    frames: &[String],
) -> Result<(), NodeError> {
    metrics::counter!("glint_frames_displayed_total", 1);
    display
        .send(DisplayUpdate::Frame {
            seq,
            text: frames[seq as usize].clone(),
        })
        .await
        .map_err(|_| NodeError::Channel("display collaborator dropped".into()))
}
