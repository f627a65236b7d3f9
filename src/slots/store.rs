//! Slot store backends
//!
//! A store is a pure data sink: the generation client writes, the HTTP
//! layer reads. Writes to one slot never touch another.

use bytes::Bytes;
use parking_lot::RwLock;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::constants::SLOT_COUNT;
use crate::error::SlotError;
use crate::slots::SlotIndex;

/// Storage for the ten rotation slots
pub trait SlotStore: Send + Sync {
    /// Replace the blob held by `slot`
    fn write(&self, slot: SlotIndex, payload: Bytes) -> Result<(), SlotError>;

    /// Latest blob held by `slot`, `None` if nothing was ever written
    fn read(&self, slot: SlotIndex) -> Result<Option<Bytes>, SlotError>;
}

/// Thread-safe handle to a slot store
pub type SharedSlotStore = Arc<dyn SlotStore>;

/// In-process store, contents are lost on restart
#[derive(Default)]
pub struct MemorySlotStore {
    slots: RwLock<[Option<Bytes>; SLOT_COUNT as usize]>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every slot, in order
    pub fn snapshot(&self) -> Vec<Option<Bytes>> {
        self.slots.read().to_vec()
    }
}

impl SlotStore for MemorySlotStore {
    fn write(&self, slot: SlotIndex, payload: Bytes) -> Result<(), SlotError> {
        self.slots.write()[slot.get() as usize] = Some(payload);
        Ok(())
    }

    fn read(&self, slot: SlotIndex) -> Result<Option<Bytes>, SlotError> {
        Ok(self.slots.read()[slot.get() as usize].clone())
    }
}

/// Store keeping each slot as `<dir>/<slot>.mp3`
pub struct DiskSlotStore {
    dir: PathBuf,
}

impl DiskSlotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, slot: SlotIndex) -> PathBuf {
        self.dir.join(format!("{}.mp3", slot))
    }

    fn io_error(path: &Path, source: std::io::Error) -> SlotError {
        SlotError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl SlotStore for DiskSlotStore {
    fn write(&self, slot: SlotIndex, payload: Bytes) -> Result<(), SlotError> {
        let path = self.path(slot);
        // Readers only ever see the old or the new file, never a partial one
        let tmp = self.dir.join(format!(".{}.mp3.tmp", slot));

        std::fs::write(&tmp, &payload).map_err(|e| Self::io_error(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| Self::io_error(&path, e))?;

        tracing::debug!("Wrote {} bytes to {}", payload.len(), path.display());
        Ok(())
    }

    fn read(&self, slot: SlotIndex) -> Result<Option<Bytes>, SlotError> {
        let path = self.path(slot);
        match std::fs::read(&path) {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(n: u8) -> SlotIndex {
        SlotIndex::new(n).unwrap()
    }

    #[test]
    fn test_memory_store_starts_empty() {
        let store = MemorySlotStore::new();
        for s in SlotIndex::all() {
            assert!(store.read(s).unwrap().is_none());
        }
    }

    #[test]
    fn test_memory_store_slots_independent() {
        let store = MemorySlotStore::new();
        store.write(slot(3), Bytes::from_static(b"three")).unwrap();
        store.write(slot(3), Bytes::from_static(b"three again")).unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot[3].as_deref(), Some(&b"three again"[..]));
        assert_eq!(snapshot.iter().filter(|s| s.is_some()).count(), 1);
    }

    #[test]
    fn test_disk_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskSlotStore::new(dir.path());

        assert!(store.read(slot(7)).unwrap().is_none());

        store.write(slot(7), Bytes::from_static(b"ID3 fake")).unwrap();
        assert_eq!(store.read(slot(7)).unwrap().as_deref(), Some(&b"ID3 fake"[..]));
        assert!(dir.path().join("7.mp3").exists());
        assert!(!dir.path().join(".7.mp3.tmp").exists());
        assert!(store.read(slot(6)).unwrap().is_none());
    }

    #[test]
    fn test_disk_store_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskSlotStore::new(dir.path().join("missing"));

        let err = store.write(slot(0), Bytes::from_static(b"x")).unwrap_err();
        assert!(matches!(err, SlotError::Io { .. }));
    }
}
