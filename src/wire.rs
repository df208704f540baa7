//! Wire payload packing. Proof bytes never ride the optical path raw: they
//! are gzipped, then base64'd into ASCII text the frame codec can chunk.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{ProtocolError, Result};

/// `base64(gzip(payload))`.
pub fn pack_payload(payload: &[u8]) -> Result<String> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload)?;
    let compressed = encoder.finish()?;
    Ok(BASE64.encode(compressed))
}

/// Inverse of [`pack_payload`]. Any decode failure is `CorruptPayload`:
/// terminal for the transfer, since re-running reassembly over the same
/// bytes cannot help.
pub fn unpack_payload(wire: &str) -> Result<Vec<u8>> {
    let compressed = BASE64
        .decode(wire.as_bytes())
        .map_err(|e| ProtocolError::CorruptPayload(format!("base64: {e}")))?;
    let mut decoder = GzDecoder::new(compressed.as_slice());
    let mut payload = Vec::new();
    decoder
        .read_to_end(&mut payload)
        .map_err(|e| ProtocolError::CorruptPayload(format!("gzip: {e}")))?;
    Ok(payload)
}

/// BLAKE3 hex digest identifying a payload in logs and reports.
pub fn payload_digest(payload: &[u8]) -> String {
    blake3::hash(payload).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_roundtrip() {
        let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let wire = pack_payload(&payload).unwrap();
        assert!(wire.is_ascii());
        assert_eq!(unpack_payload(&wire).unwrap(), payload);
    }

    #[test]
    fn compresses_repetitive_proofs() {
        let payload = vec![42u8; 100_000];
        let wire = pack_payload(&payload).unwrap();
        assert!(wire.len() < payload.len() / 10);
    }

    #[test]
    fn truncated_wire_text_is_corrupt() {
        let wire = pack_payload(b"some proof bytes").unwrap();
        let truncated = &wire[..wire.len() / 2];
        assert!(matches!(
            unpack_payload(truncated),
            Err(ProtocolError::CorruptPayload(_))
        ));
    }

    #[test]
    fn non_base64_wire_text_is_corrupt() {
        assert!(matches!(
            unpack_payload("!!! not base64 !!!"),
            Err(ProtocolError::CorruptPayload(_))
        ));
    }

    #[test]
    fn valid_base64_of_garbage_is_corrupt_gzip() {
        let wire = BASE64.encode(b"definitely not a gzip stream");
        assert!(matches!(
            unpack_payload(&wire),
            Err(ProtocolError::CorruptPayload(_))
        ));
    }

    #[test]
    fn digest_is_stable() {
        assert_eq!(payload_digest(b"abc"), payload_digest(b"abc"));
        assert_ne!(payload_digest(b"abc"), payload_digest(b"abd"));
    }
}
