use rustc_hash::FxHashSet;

/// Skip-aware cyclic display schedule. The prover loop calls [`tick`] on a
/// fixed wall-clock interval and displays whatever index it returns;
/// acknowledged indices are skipped on every pass.
///
/// The skip set is mutated only by inbound acknowledgements via [`ack`],
/// never by the scheduler itself.
///
/// [`tick`]: Carousel::tick
/// [`ack`]: Carousel::ack
#[derive(Debug)]
pub struct Carousel {
    current: u32,
    total: u32,
    skip: FxHashSet<u32>,
}

impl Carousel {
    pub fn new(total: u32) -> Self {
        Self {
            current: 0,
            total,
            skip: FxHashSet::default(),
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn acked(&self) -> usize {
        self.skip.len()
    }

    /// Every index acknowledged: the receiver has the whole transfer and
    /// there is nothing left worth displaying.
    pub fn is_exhausted(&self) -> bool {
        self.total > 0 && self.skip.len() as u32 >= self.total
    }

    /// Record an inbound acknowledgement. Out-of-range ids are ignored;
    /// stale acks from a previous transfer are expected around a restart.
    pub fn ack(&mut self, seq: u32) {
        if seq < self.total {
            self.skip.insert(seq);
        }
    }

    /// Advance to the next non-acknowledged index, wrapping. Holds at the
    /// current index once every index is acknowledged (terminal display
    /// state) and on an empty carousel.
    pub fn tick(&mut self) -> u32 {
        if self.total == 0 || self.is_exhausted() {
            return self.current;
        }
        let mut next = (self.current + 1) % self.total;
        while self.skip.contains(&next) {
            next = (next + 1) % self.total;
        }
        self.current = next;
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_in_order_without_acks() {
        let mut c = Carousel::new(3);
        assert_eq!(c.tick(), 1);
        assert_eq!(c.tick(), 2);
        assert_eq!(c.tick(), 0);
        assert_eq!(c.tick(), 1);
    }

    #[test]
    fn skips_acknowledged_indices() {
        let mut c = Carousel::new(4);
        c.ack(1);
        c.ack(2);
        assert_eq!(c.tick(), 3);
        assert_eq!(c.tick(), 0);
        assert_eq!(c.tick(), 3);
    }

    #[test]
    fn holds_once_everything_is_acknowledged() {
        let mut c = Carousel::new(3);
        assert_eq!(c.tick(), 1);
        for seq in 0..3 {
            c.ack(seq);
        }
        assert!(c.is_exhausted());
        let held = c.current();
        for _ in 0..10 {
            assert_eq!(c.tick(), held);
        }
    }

    #[test]
    fn single_chunk_redisplays_index_zero_forever() {
        let mut c = Carousel::new(1);
        for _ in 0..20 {
            assert_eq!(c.tick(), 0);
        }
    }

    #[test]
    fn empty_carousel_does_not_divide_by_zero() {
        let mut c = Carousel::new(0);
        assert_eq!(c.tick(), 0);
    }

    #[test]
    fn out_of_range_acks_are_ignored() {
        let mut c = Carousel::new(2);
        c.ack(7);
        assert_eq!(c.acked(), 0);
        assert!(!c.is_exhausted());
    }

    #[test]
    fn acks_between_ticks_take_effect_on_the_next_tick() {
        let mut c = Carousel::new(3);
        assert_eq!(c.tick(), 1);
        c.ack(2);
        assert_eq!(c.tick(), 0);
    }
}
