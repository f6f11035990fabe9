//! Opened-handle registry
//!
//! Tracks which handles are currently open, most recently opened first.
//! Entries are plain [`RotId`]s: the registry never owns a handle.
//! Used for broadcast-style traversal (e.g. transceive updates).

use std::collections::VecDeque;
use std::ops::ControlFlow;

use rot_core::{RotError, RotResult};

use crate::manager::RotId;

/// Ordered set of open handles
#[derive(Debug, Default)]
pub struct OpenedRegistry {
    entries: VecDeque<RotId>,
}

impl OpenedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a freshly opened handle
    pub fn register(&mut self, id: RotId) -> RotResult<()> {
        debug_assert!(!self.contains(id), "{} registered twice", id);
        self.entries.try_reserve(1).map_err(|e| {
            RotError::OutOfMemory(format!("opened registry entry for {}: {}", id, e))
        })?;
        self.entries.push_front(id);
        Ok(())
    }

    /// Remove a handle. `NotFound` if it was not registered.
    pub fn unregister(&mut self, id: RotId) -> RotResult<()> {
        let pos = self
            .entries
            .iter()
            .position(|entry| *entry == id)
            .ok_or_else(|| RotError::NotFound(format!("{} is not in the opened registry", id)))?;
        self.entries.remove(pos);
        Ok(())
    }

    pub fn contains(&self, id: RotId) -> bool {
        self.entries.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Handles in registry order (most recently opened first)
    pub fn iter(&self) -> impl Iterator<Item = RotId> + '_ {
        self.entries.iter().copied()
    }

    /// Visit every entry in registry order.
    ///
    /// Traversal ends early the first time `visitor` returns `Break`; that
    /// is a normal outcome. Returns the number of entries visited.
    pub fn for_each<F>(&self, mut visitor: F) -> usize
    where
        F: FnMut(RotId) -> ControlFlow<()>,
    {
        let mut visited = 0;
        for id in self.iter() {
            visited += 1;
            if visitor(id).is_break() {
                break;
            }
        }
        visited
    }
}
