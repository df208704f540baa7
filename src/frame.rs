use crate::error::{ProtocolError, Result};

/// Wire layout of one optical frame:
/// `<seq, fixed-width decimal><total, fixed-width decimal><chunk data>`.
///
/// Both codec ends must be constructed with the same config; the widths are
/// a deployment constant, never negotiated in-band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Decimal digits per header field. Caps a transfer at `10^width - 1` chunks.
    pub field_width: usize,
    /// Characters of wire payload per frame.
    pub chunk_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            field_width: 3,
            chunk_size: 480,
        }
    }
}

/// One indexed slice of a transfer, as recovered from a decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub seq: u32,
    pub total: u32,
    pub data: String,
}

impl FrameConfig {
    pub fn max_chunks(&self) -> u32 {
        10u32.pow(self.field_width as u32) - 1
    }

    fn header_len(&self) -> usize {
        self.field_width * 2
    }

    /// Split a wire payload into header-prefixed frames.
    ///
    /// Fails fast on configuration errors (empty or non-ASCII payload,
    /// chunk count above the header cap); these are not runtime retries.
    pub fn encode(&self, payload: &str) -> Result<Vec<String>> {
        assert!(self.chunk_size > 0, "chunk_size must be positive");
        if payload.is_empty() {
            return Err(ProtocolError::EmptyPayload);
        }
        if !payload.is_ascii() {
            return Err(ProtocolError::PayloadNotAscii);
        }

        let total = payload.len().div_ceil(self.chunk_size);
        if total > self.max_chunks() as usize {
            return Err(ProtocolError::ChunkCapExceeded {
                chunks: total,
                field_width: self.field_width,
                cap: self.max_chunks(),
            });
        }

        let w = self.field_width;
        let mut frames = Vec::with_capacity(total);
        for seq in 0..total {
            let start = seq * self.chunk_size;
            let end = (start + self.chunk_size).min(payload.len());
            // ASCII payload, so every byte index is a char boundary.
            frames.push(format!(
                "{seq:0w$}{total:0w$}{data}",
                data = &payload[start..end]
            ));
        }
        Ok(frames)
    }

    /// Slice one decoded frame text back into a chunk.
    pub fn decode(&self, frame: &str) -> Result<Chunk> {
        let w = self.field_width;
        let header = frame.get(..self.header_len()).ok_or_else(|| {
            ProtocolError::MalformedFrame(format!(
                "frame shorter than the {}-char header",
                self.header_len()
            ))
        })?;
        if !header.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ProtocolError::MalformedFrame(format!(
                "non-numeric header {header:?}"
            )));
        }
        // All-digit fields of bounded width, parse cannot fail past this point.
        let seq: u32 = header[..w]
            .parse()
            .map_err(|_| ProtocolError::MalformedFrame("sequence field overflow".into()))?;
        let total: u32 = header[w..]
            .parse()
            .map_err(|_| ProtocolError::MalformedFrame("count field overflow".into()))?;
        if total == 0 {
            return Err(ProtocolError::MalformedFrame("zero chunk count".into()));
        }
        if seq >= total {
            return Err(ProtocolError::MalformedFrame(format!(
                "sequence {seq} out of range for {total} chunks"
            )));
        }
        Ok(Chunk {
            seq,
            total,
            data: frame[self.header_len()..].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> FrameConfig {
        FrameConfig::default()
    }

    #[test]
    fn encode_decode_roundtrip() {
        let payload = "a".repeat(1000);
        let frames = cfg().encode(&payload).unwrap();
        assert_eq!(frames.len(), 3);

        let mut recovered = String::new();
        for frame in &frames {
            let chunk = cfg().decode(frame).unwrap();
            assert_eq!(chunk.total, 3);
            recovered.push_str(&chunk.data);
        }
        assert_eq!(recovered, payload);
    }

    #[test]
    fn headers_are_zero_padded_fixed_width() {
        let frames = cfg().encode("xyz").unwrap();
        assert_eq!(frames[0], "000001xyz");
    }

    #[test]
    fn two_digit_config_caps_at_99() {
        let narrow = FrameConfig {
            field_width: 2,
            chunk_size: 1,
        };
        assert_eq!(narrow.max_chunks(), 99);
        let payload = "a".repeat(100);
        match narrow.encode(&payload) {
            Err(ProtocolError::ChunkCapExceeded { chunks: 100, cap: 99, .. }) => {}
            other => panic!("expected cap error, got {other:?}"),
        }
        assert!(narrow.encode(&"a".repeat(99)).is_ok());
    }

    #[test]
    fn empty_and_non_ascii_payloads_rejected() {
        assert!(matches!(cfg().encode(""), Err(ProtocolError::EmptyPayload)));
        assert!(matches!(
            cfg().encode("héllo"),
            Err(ProtocolError::PayloadNotAscii)
        ));
    }

    #[test]
    fn decode_rejects_short_and_non_numeric_headers() {
        assert!(cfg().decode("00100").is_err());
        assert!(cfg().decode("0x1002data").is_err());
        assert!(cfg().decode("+01002data").is_err());
    }

    #[test]
    fn decode_rejects_out_of_range_sequence() {
        assert!(matches!(
            cfg().decode("003003data"),
            Err(ProtocolError::MalformedFrame(_))
        ));
        assert!(matches!(
            cfg().decode("000000data"),
            Err(ProtocolError::MalformedFrame(_))
        ));
    }

    #[test]
    fn single_chunk_payload_produces_one_frame() {
        let frames = cfg().encode("short").unwrap();
        assert_eq!(frames.len(), 1);
        let chunk = cfg().decode(&frames[0]).unwrap();
        assert_eq!((chunk.seq, chunk.total), (0, 1));
        assert_eq!(chunk.data, "short");
    }
}
