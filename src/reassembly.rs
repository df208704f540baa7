use crate::frame::Chunk;

/// Outcome of feeding one decoded chunk to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receipt {
    /// First sighting of this sequence id. The caller acknowledges it
    /// exactly once.
    New { seq: u32 },

    /// Already stored. Never re-acknowledged, so duplicate optical captures
    /// do not multiply side-channel traffic.
    Duplicate,

    /// The chunk disagreed on the chunk count: the sender started a new
    /// transfer before the old one completed. The old buffer is discarded
    /// and this chunk seeds the fresh one. The caller logs the reset and
    /// acknowledges the seeding chunk.
    Restarted { seq: u32, expected: u32, found: u32 },
}

/// Receiver-side sparse chunk store. Unfilled slots are `None`, never an
/// empty string, so a zero-length capture can never fake completeness.
///
/// Callers feed chunks validated by [`FrameConfig::decode`], which
/// guarantees `seq < total`.
///
/// [`FrameConfig::decode`]: crate::frame::FrameConfig::decode
#[derive(Debug, Default)]
pub struct ReassemblyBuffer {
    total: Option<u32>,
    slots: Vec<Option<String>>,
    filled: usize,
}

impl ReassemblyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> Option<u32> {
        self.total
    }

    pub fn receive(&mut self, chunk: Chunk) -> Receipt {
        match self.total {
            None => self.start(chunk.total),
            Some(expected) if expected != chunk.total => {
                let receipt = Receipt::Restarted {
                    seq: chunk.seq,
                    expected,
                    found: chunk.total,
                };
                self.start(chunk.total);
                self.store(chunk);
                return receipt;
            }
            Some(_) => {}
        }

        if self.slots[chunk.seq as usize].is_some() {
            return Receipt::Duplicate;
        }
        let seq = chunk.seq;
        self.store(chunk);
        Receipt::New { seq }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.total, Some(total) if self.filled as u32 == total)
    }

    /// `(filled, total)` for progress display. `(0, 0)` before the first
    /// frame of a transfer is seen.
    pub fn progress(&self) -> (u32, u32) {
        (self.filled as u32, self.total.unwrap_or(0))
    }

    /// Sequence ids still unfilled, in order.
    pub fn missing(&self) -> Vec<u32> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(seq, _)| seq as u32)
            .collect()
    }

    /// Concatenate the stored chunks in sequence order.
    ///
    /// Contract: defined only once the buffer is complete.
    pub fn join(&self) -> String {
        assert!(
            self.is_complete(),
            "join() called on an incomplete reassembly buffer"
        );
        self.slots.iter().flatten().map(String::as_str).collect()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn start(&mut self, total: u32) {
        self.total = Some(total);
        self.slots = vec![None; total as usize];
        self.filled = 0;
    }

    fn store(&mut self, chunk: Chunk) {
        self.filled += 1;
        self.slots[chunk.seq as usize] = Some(chunk.data);
    }
}
