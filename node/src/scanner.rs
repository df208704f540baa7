// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Scanner-side loop: consumes decoded frame texts from the camera pipeline
//! (unordered, duplicated, possibly corrupt), reassembles the transfer,
//! acknowledges each new chunk exactly once, then hands the joined payload
//! to the verification orchestrator and publishes the verdict.

use tokio::sync::mpsc;

use glint_kernel::{ChannelEvent, FrameConfig, ReassemblyBuffer, Receipt};

use crate::channel::ChannelClient;
use crate::errors::NodeError;
use crate::orchestrator::{ProofVerifier, Verdict, VerificationOrchestrator};

/// Drive one transfer from first capture to published verdict.
///
/// The reassembly buffer and orchestrator are touched only from this loop.
/// During verification the loop keeps draining late captures and
/// side-channel chatter as no-ops; if the side channel drops mid-verification
/// the verdict is still computed but not published.
pub async fn run_scan_loop<V: ProofVerifier>(
    frame_cfg: FrameConfig,
    mut frames: mpsc::Receiver<String>,
    mut channel: ChannelClient,
    orchestrator: VerificationOrchestrator<V>,
) -> Result<Verdict, NodeError> {
    let ack = channel.sender();
    let mut buffer = ReassemblyBuffer::new();

    // Phase 1: capture until the buffer completes.
    let wire_payload = loop {
        tokio::select! {
            frame = frames.recv() => {
                let Some(text) = frame else {
                    return Err(NodeError::Channel(
                        "camera stream ended before the transfer completed".into(),
                    ));
                };
                match frame_cfg.decode(&text) {
                    Ok(chunk) => match buffer.receive(chunk) {
                        Receipt::New { seq } => {
                            metrics::counter!("glint_chunks_scanned_total", 1);
                            ack.send(ChannelEvent::ChunkAcknowledged(seq)).await?;
                            let (filled, total) = buffer.progress();
                            tracing::debug!("Scanner: stored chunk {} ({}/{})", seq, filled, total);
                            metrics::gauge!(
                                "glint_scan_progress",
                                f64::from(filled) / f64::from(total.max(1))
                            );
                        }
                        Receipt::Duplicate => {
                            metrics::counter!("glint_duplicate_chunks_total", 1);
                        }
                        Receipt::Restarted { seq, expected, found } => {
                            tracing::warn!(
                                "Scanner: inconsistent transfer (buffer had {}, frame claims {}), restarting from chunk {}",
                                expected,
                                found,
                                seq
                            );
                            ack.send(ChannelEvent::ChunkAcknowledged(seq)).await?;
                        }
                    },
                    Err(e) => {
                        // Corrupt optical capture: drop the frame, no ack.
                        tracing::debug!("Scanner: dropping frame: {}", e);
                    }
                }
                if buffer.is_complete() {
                    break buffer.join();
                }
            }
            event = channel.recv() => {
                match event {
                    Some(ev) => {
                        tracing::debug!("Scanner: ignoring side-channel event {:?} during capture", ev);
                    }
                    None => {
                        return Err(NodeError::Channel("side channel closed during capture".into()));
                    }
                }
            }
        }
    };

    let (filled, total) = buffer.progress();
    tracing::info!("Scanner: transfer complete ({}/{} chunks)", filled, total);

    // Phase 2: verification runs on its own task so late duplicate frames
    // and side-channel chatter keep draining as no-ops here.
    let mut orchestrator = orchestrator;
    let mut verify_task =
        tokio::spawn(async move { orchestrator.run(&wire_payload).await });

    let mut frames_open = true;
    let mut channel_open = true;
    let result = loop {
        tokio::select! {
            joined = &mut verify_task => {
                match joined {
                    Ok(result) => break result,
                    Err(e) => {
                        tracing::error!("Scanner: verification task failed: {}", e);
                        return Err(NodeError::Internal);
                    }
                }
            }
            frame = frames.recv(), if frames_open => {
                if frame.is_none() {
                    frames_open = false;
                }
                // Late captures of an already-complete transfer are no-ops.
            }
            event = channel.recv(), if channel_open => {
                if event.is_none() {
                    channel_open = false;
                    tracing::warn!("Scanner: side channel dropped mid-verification");
                }
            }
        }
    };

    // Errors and rejections both end the transfer for the sender; only a
    // live session hears about it.
    let verdict_bit = matches!(&result, Ok(Verdict::Accepted));
    if channel_open {
        ack.send(ChannelEvent::VerificationResult(verdict_bit)).await?;
    } else {
        tracing::warn!("Scanner: session gone, verdict not published");
    }

    result
}
