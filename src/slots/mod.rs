//! Slot storage
//!
//! Ten numbered slots, each holding the latest audio blob written to it.

pub mod index;
pub mod store;

pub use index::{SlotIndex, SlotOffset};
pub use store::{DiskSlotStore, MemorySlotStore, SharedSlotStore, SlotStore};
