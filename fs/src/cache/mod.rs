//! Block and inode caches.
//!
//! Both caches key on object id. Cached entries remember the flash
//! location they were read from; after a GC cycle those locations are
//! stale, so the collector drops all cached block content outright and
//! refreshes cached inode locations in place (inode identities survive
//! relocation, only their offsets change).

use alloc::vec::Vec;
use hashbrown::HashMap;

use crate::core::types::{FlashLoc, ObjectId};
use crate::table::ObjectTable;

// ============================================================================
// Block Cache
// ============================================================================

/// One cached block payload.
#[derive(Clone, Debug)]
pub struct CachedBlock {
    /// Flash location the payload was read from
    pub loc: FlashLoc,
    /// Payload bytes
    pub data: Vec<u8>,
}

/// Cache of block payloads, filled by the read path.
#[derive(Debug, Default)]
pub struct BlockCache {
    blocks: HashMap<ObjectId, CachedBlock>,
}

impl BlockCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached payload for `id`, if present
    #[inline]
    pub fn get(&self, id: ObjectId) -> Option<&CachedBlock> {
        self.blocks.get(&id)
    }

    /// Cache `data` as the payload of `id`
    pub fn insert(&mut self, id: ObjectId, loc: FlashLoc, data: Vec<u8>) {
        self.blocks.insert(id, CachedBlock { loc, data });
    }

    /// Drop the entry for `id` (block deleted or superseded)
    pub fn evict(&mut self, id: ObjectId) {
        self.blocks.remove(&id);
    }

    /// Drop everything; block locations are no longer trustworthy
    pub fn invalidate_all(&mut self) {
        self.blocks.clear();
    }

    /// Number of cached blocks
    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the cache is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

// ============================================================================
// Inode Cache
// ============================================================================

/// Cache of inode flash locations.
#[derive(Debug, Default)]
pub struct InodeCache {
    locs: HashMap<ObjectId, FlashLoc>,
}

impl InodeCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached location for `id`, if present
    #[inline]
    pub fn get(&self, id: ObjectId) -> Option<FlashLoc> {
        self.locs.get(&id).copied()
    }

    /// Remember `loc` as the location of inode `id`
    pub fn insert(&mut self, id: ObjectId, loc: FlashLoc) {
        self.locs.insert(id, loc);
    }

    /// Drop the entry for `id`
    pub fn evict(&mut self, id: ObjectId) {
        self.locs.remove(&id);
    }

    /// Re-read every cached inode's location from the table.
    ///
    /// Entries whose inode no longer exists are dropped; the rest are
    /// updated in place rather than invalidated.
    pub fn refresh_locations(&mut self, table: &ObjectTable) {
        self.locs.retain(|&id, loc| {
            match table.get(id).and_then(|obj| obj.as_inode()) {
                Some(inode) => {
                    *loc = inode.loc;
                    true
                }
                None => false,
            }
        });
    }

    /// Number of cached inodes
    #[inline]
    pub fn len(&self) -> usize {
        self.locs.len()
    }

    /// Whether the cache is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locs.is_empty()
    }
}
