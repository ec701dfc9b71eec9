use serde::{Deserialize, Serialize};

/// Block number. All delays in the ledger are differences of these.
pub type BlockHeight = u64;

/// Monotonic block counter driving every time-locked rule.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockClock {
    height: BlockHeight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockRewind {
    pub current: BlockHeight,
    pub requested: BlockHeight,
}

impl BlockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn height(&self) -> BlockHeight {
        self.height
    }

    /// Advance by `blocks`, saturating at `u64::MAX`.
    pub fn advance(&mut self, blocks: u64) -> BlockHeight {
        self.height = self.height.saturating_add(blocks);
        self.height
    }

    /// Jump to an absolute height. Heights never move backwards.
    pub fn set_height(&mut self, height: BlockHeight) -> Result<(), ClockRewind> {
        if height < self.height {
            return Err(ClockRewind {
                current: self.height,
                requested: height,
            });
        }
        self.height = height;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance() {
        let mut clock = BlockClock::new();
        assert_eq!(clock.advance(10), 10);
        assert_eq!(clock.advance(u64::MAX), u64::MAX);
    }

    #[test]
    fn test_no_rewind() {
        let mut clock = BlockClock::new();
        clock.set_height(50).unwrap();
        assert_eq!(
            clock.set_height(49),
            Err(ClockRewind { current: 50, requested: 49 })
        );
        clock.set_height(50).unwrap();
        clock.set_height(70).unwrap();
        assert_eq!(clock.height(), 70);
    }
}
