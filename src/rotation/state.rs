//! Rotation state machine

use parking_lot::Mutex;
use std::sync::Arc;

use crate::slots::{SlotIndex, SlotOffset};

/// Current position in the rotation
///
/// Starts in a "not yet started" state; the first [`advance`](Self::advance)
/// moves it to slot 0.
#[derive(Debug, Default)]
pub struct Rotation {
    current: Option<SlotIndex>,
    ticks: u64,
}

impl Rotation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to the next slot and decide which half needs fresh content.
    ///
    /// Landing on 0 refreshes slots 5..10 while 0..5 play, landing on 5
    /// refreshes 0..5 while 5..10 play.
    pub fn advance(&mut self) -> Option<SlotOffset> {
        let next = match self.current {
            Some(index) => index.next(),
            None => SlotIndex::FIRST,
        };
        self.current = Some(next);
        self.ticks += 1;

        match next.get() {
            0 => Some(SlotOffset::Second),
            5 => Some(SlotOffset::First),
            _ => None,
        }
    }

    pub fn current_index(&self) -> Option<SlotIndex> {
        self.current
    }

    /// Number of completed advances
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

/// Shared handle to the single rotation state
///
/// All mutation goes through one mutex; readers never see the raw state.
#[derive(Debug, Clone, Default)]
pub struct RotationHandle {
    inner: Arc<Mutex<Rotation>>,
}

impl RotationHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self) -> (SlotIndex, Option<SlotOffset>) {
        let mut rotation = self.inner.lock();
        let refresh = rotation.advance();
        // advance() always leaves a current index behind
        let index = rotation.current_index().unwrap_or(SlotIndex::FIRST);
        (index, refresh)
    }

    pub fn current_index(&self) -> Option<SlotIndex> {
        self.inner.lock().current_index()
    }

    pub fn ticks(&self) -> u64 {
        self.inner.lock().ticks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_starts_unstarted() {
        let rotation = Rotation::new();
        assert_eq!(rotation.current_index(), None);
        assert_eq!(rotation.ticks(), 0);
    }

    #[test]
    fn test_first_advance_lands_on_zero_and_refreshes_second_half() {
        let mut rotation = Rotation::new();
        assert_eq!(rotation.advance(), Some(SlotOffset::Second));
        assert_eq!(rotation.current_index(), Some(SlotIndex::FIRST));
    }

    #[test]
    fn test_full_cycle_triggers() {
        let mut rotation = Rotation::new();
        let decisions: Vec<Option<SlotOffset>> = (0..20).map(|_| rotation.advance()).collect();

        for (tick, decision) in decisions.iter().enumerate() {
            let expected = match tick % 10 {
                0 => Some(SlotOffset::Second),
                5 => Some(SlotOffset::First),
                _ => None,
            };
            assert_eq!(*decision, expected, "tick {}", tick + 1);
        }
    }

    #[test]
    fn test_wraps_nine_to_zero() {
        let mut rotation = Rotation::new();
        for _ in 0..10 {
            rotation.advance();
        }
        assert_eq!(rotation.current_index().map(SlotIndex::get), Some(9));

        rotation.advance();
        assert_eq!(rotation.current_index(), Some(SlotIndex::FIRST));
    }

    #[test]
    fn test_handle_shares_state() {
        let handle = RotationHandle::new();
        let reader = handle.clone();

        assert_eq!(reader.current_index(), None);
        let (index, refresh) = handle.advance();
        assert_eq!(index, SlotIndex::FIRST);
        assert_eq!(refresh, Some(SlotOffset::Second));
        assert_eq!(reader.current_index(), Some(SlotIndex::FIRST));
        assert_eq!(reader.ticks(), 1);
    }

    proptest! {
        #[test]
        fn prop_index_after_n_ticks(n in 1u64..500) {
            let mut rotation = Rotation::new();
            let mut triggers = 0;
            for _ in 0..n {
                if rotation.advance().is_some() {
                    triggers += 1;
                }
            }

            let index = rotation.current_index().unwrap().get() as u64;
            prop_assert_eq!(index, (n - 1) % 10);
            // one trigger on every landing on 0 or 5
            prop_assert_eq!(triggers, (n + 4) / 5);
        }
    }
}
