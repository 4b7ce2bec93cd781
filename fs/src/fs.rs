//! The filesystem handle.
//!
//! `Fs` owns the flash device, the area table, the object table, and
//! the caches. File operations are in [`crate::ops`], the garbage
//! collector in [`crate::gc`]; both are `impl` blocks on this type.
//! Callers serialize access externally; `Fs` performs no locking.

use alloc::vec::Vec;

use ember_hal::flash::FlashDevice;

use crate::cache::{BlockCache, InodeCache};
use crate::core::config::FsConfig;
use crate::core::error::{FsError, FsResult};
use crate::core::types::{Area, ObjectId, OBJ_ID_NONE};
use crate::table::{BlockEntry, InodeEntry, ObjectTable};

/// A mounted EmberFS instance.
#[derive(Debug)]
pub struct Fs<F: FlashDevice> {
    pub(crate) flash: F,
    pub(crate) areas: Vec<Area>,
    pub(crate) scratch_idx: usize,
    pub(crate) table: ObjectTable,
    pub(crate) block_cache: BlockCache,
    pub(crate) inode_cache: InodeCache,
    pub(crate) config: FsConfig,
    pub(crate) next_id: u16,
}

impl<F: FlashDevice> Fs<F> {
    /// Number of areas, scratch included
    #[inline]
    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    /// Index of the current scratch area
    #[inline]
    pub fn scratch_index(&self) -> usize {
        self.scratch_idx
    }

    /// Free bytes in the area at `idx`
    pub fn area_free_space(&self, idx: usize) -> FsResult<u32> {
        self.areas
            .get(idx)
            .map(Area::free_space)
            .ok_or(FsError::InvalidParam)
    }

    /// Active configuration
    #[inline]
    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    /// Number of live objects (inodes + blocks)
    #[inline]
    pub fn object_count(&self) -> usize {
        self.table.len()
    }

    /// Allocate a fresh object id
    pub(crate) fn alloc_id(&mut self) -> FsResult<ObjectId> {
        if self.next_id == OBJ_ID_NONE {
            return Err(FsError::Full);
        }
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        Ok(id)
    }

    /// Inode entry for `id`
    pub(crate) fn inode_entry(&self, id: ObjectId) -> FsResult<&InodeEntry> {
        self.table
            .get(id)
            .and_then(|obj| obj.as_inode())
            .ok_or(FsError::NotFound)
    }

    /// Mutable inode entry for `id`
    pub(crate) fn inode_entry_mut(&mut self, id: ObjectId) -> FsResult<&mut InodeEntry> {
        self.table
            .get_mut(id)
            .and_then(|obj| obj.as_inode_mut())
            .ok_or(FsError::NotFound)
    }

    /// Block entry for `id`
    pub(crate) fn block_entry(&self, id: ObjectId) -> FsResult<&BlockEntry> {
        self.table
            .get(id)
            .and_then(|obj| obj.as_block())
            .ok_or(FsError::NotFound)
    }

    /// Mutable block entry for `id`
    pub(crate) fn block_entry_mut(&mut self, id: ObjectId) -> FsResult<&mut BlockEntry> {
        self.table
            .get_mut(id)
            .and_then(|obj| obj.as_block_mut())
            .ok_or(FsError::NotFound)
    }
}
