use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use glint_kernel::{wire, FrameConfig, ReassemblyBuffer, Receipt};

/// Offline reassembly check: feed a capture of decoded QR frame texts (one
/// per line, any order, duplicates welcome) through the codec and report
/// what a scanner would have concluded.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the capture file (one decoded frame text per line)
    capture: PathBuf,

    /// Header field width in decimal digits, must match the prover's config
    #[arg(long, default_value_t = 3)]
    field_width: usize,
}

#[derive(Serialize, Debug)]
struct Report {
    total_chunks: u32,
    received: u32,
    dropped_frames: usize,
    duplicate_frames: usize,
    complete: bool,
    missing: Vec<u32>,
    payload_bytes: Option<usize>,
    payload_digest: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let cfg = FrameConfig {
        field_width: args.field_width,
        // Only the prover chunks; decode just slices headers off.
        ..FrameConfig::default()
    };

    let capture = fs::read_to_string(&args.capture).context("Failed to read capture file")?;

    let mut buffer = ReassemblyBuffer::new();
    let mut dropped = 0usize;
    let mut duplicates = 0usize;

    for line in capture.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match cfg.decode(line) {
            Ok(chunk) => match buffer.receive(chunk) {
                Receipt::New { .. } => {}
                Receipt::Duplicate => duplicates += 1,
                Receipt::Restarted { expected, found, .. } => {
                    eprintln!("warning: transfer restarted ({expected} -> {found} chunks)");
                }
            },
            Err(_) => dropped += 1,
        }
    }

    let (received, total) = buffer.progress();
    let missing = buffer.missing();

    let (payload_bytes, payload_digest) = if buffer.is_complete() {
        let payload = wire::unpack_payload(&buffer.join())
            .context("Capture reassembled but the payload is corrupt")?;
        (
            Some(payload.len()),
            Some(wire::payload_digest(&payload)),
        )
    } else {
        (None, None)
    };

    let report = Report {
        total_chunks: total,
        received,
        dropped_frames: dropped,
        duplicate_frames: duplicates,
        complete: buffer.is_complete(),
        missing,
        payload_bytes,
        payload_digest,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.complete {
        anyhow::bail!("transfer incomplete: {received} of {total} chunks captured");
    }
    Ok(())
}
