use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Unparseable frame header. The frame is dropped, never acknowledged.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Inconsistent transfer: buffer expects {expected} chunks, frame claims {found}")]
    InconsistentTransfer { expected: u32, found: u32 },

    /// The reassembled wire payload did not decode. Retrying reassembly of
    /// the same bytes cannot help, so this is terminal for the transfer.
    #[error("Corrupt payload: {0}")]
    CorruptPayload(String),

    #[error("Payload needs {chunks} chunks but a {field_width}-digit header caps a transfer at {cap}")]
    ChunkCapExceeded {
        chunks: usize,
        field_width: usize,
        cap: u32,
    },

    #[error("Empty payload")]
    EmptyPayload,

    #[error("Wire payload must be ASCII text (base64), got non-ASCII bytes")]
    PayloadNotAscii,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
