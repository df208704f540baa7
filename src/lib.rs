// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! glint-kernel: the transport-free core of the optical proof transfer
//! protocol: frame codec, carousel schedule, reassembly, wire packing.

pub mod carousel;
pub mod channel;
pub mod error;
pub mod frame;
pub mod reassembly;
pub mod wire;

pub use carousel::Carousel;
pub use channel::ChannelEvent;
pub use error::ProtocolError;
pub use frame::{Chunk, FrameConfig};
pub use reassembly::{ReassemblyBuffer, Receipt};
