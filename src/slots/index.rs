//! Slot positions and batch offsets

use serde::Serialize;
use std::fmt;

use crate::constants::{BATCH_SIZE, SLOT_COUNT};
use crate::error::SlotError;

/// A slot position in `0..SLOT_COUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SlotIndex(u8);

impl SlotIndex {
    pub const FIRST: SlotIndex = SlotIndex(0);

    pub fn new(value: u8) -> Result<Self, SlotError> {
        if value < SLOT_COUNT {
            Ok(Self(value))
        } else {
            Err(SlotError::OutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Next position, wrapping the last slot back to the first
    pub fn next(self) -> Self {
        Self((self.0 + 1) % SLOT_COUNT)
    }

    /// All slots in order
    pub fn all() -> impl Iterator<Item = SlotIndex> {
        (0..SLOT_COUNT).map(SlotIndex)
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which half of the rotation a generation batch refreshes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotOffset {
    /// Slots 0..5
    First,
    /// Slots 5..10
    Second,
}

impl SlotOffset {
    pub fn start(self) -> u8 {
        match self {
            SlotOffset::First => 0,
            SlotOffset::Second => BATCH_SIZE,
        }
    }

    /// Slot receiving payload `i` of a batch, `None` past the batch size
    pub fn slot(self, i: usize) -> Option<SlotIndex> {
        if i < BATCH_SIZE as usize {
            Some(SlotIndex(self.start() + i as u8))
        } else {
            None
        }
    }
}

impl fmt::Display for SlotOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_index_range() {
        assert!(SlotIndex::new(0).is_ok());
        assert!(SlotIndex::new(9).is_ok());
        assert!(matches!(SlotIndex::new(10), Err(SlotError::OutOfRange(10))));
    }

    #[test]
    fn test_slot_index_wraps() {
        assert_eq!(SlotIndex::new(9).unwrap().next(), SlotIndex::FIRST);
        assert_eq!(SlotIndex::new(4).unwrap().next().get(), 5);
    }

    #[test]
    fn test_offsets_cover_disjoint_halves() {
        let half = |offset: SlotOffset| -> Vec<SlotIndex> {
            (0..).map_while(|i| offset.slot(i)).collect()
        };
        let first = half(SlotOffset::First);
        let second = half(SlotOffset::Second);
        assert_eq!(first.iter().map(|s| s.get()).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        assert_eq!(second.iter().map(|s| s.get()).collect::<Vec<_>>(), vec![5, 6, 7, 8, 9]);

        for slot in SlotIndex::all() {
            assert_ne!(first.contains(&slot), second.contains(&slot));
        }
    }

    #[test]
    fn test_offset_slot_bounds() {
        assert_eq!(SlotOffset::Second.slot(0).map(SlotIndex::get), Some(5));
        assert_eq!(SlotOffset::Second.slot(4).map(SlotIndex::get), Some(9));
        assert_eq!(SlotOffset::Second.slot(5), None);
    }
}
