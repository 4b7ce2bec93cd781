//! Garbage collection.
//!
//! Flash is append-only, so deleting or superseding an object leaves
//! its bytes behind as garbage. The collector reclaims one area per
//! cycle: it picks a source area, relocates every live object out of it
//! into the scratch area (merging contiguous block runs on the way),
//! then erases the source, which becomes the next scratch area.
//!
//! ```text
//! gc_until ──> gc ──┬─> select_source
//!                   ├─> gc_copy_inode            (inodes in source)
//!                   └─> gc_relocate_file_blocks  (file chains)
//!                          └─> gc_dispatch_run ──┬─> gc_copy_chain
//!                                                └─> gc_collate_chain
//! ```
//!
//! One cycle walks the whole object table while collation deletes
//! entries from it; the table cursor threaded through the call chain
//! keeps that walk sound (see [`crate::table::cursor`]).

mod collate;
mod copy;
mod select;
mod walk;

use core::sync::atomic::{AtomicU32, Ordering};

use ember_hal::flash::FlashDevice;

use crate::core::error::{FsError, FsResult};
use crate::disk::{io, DiskArea};
use crate::fs::Fs;

/// Bumped once per completed collection cycle, process-wide.
static GC_GENERATION: AtomicU32 = AtomicU32::new(0);

/// Number of collection cycles completed since boot.
///
/// Callers holding state derived from object locations can snapshot
/// this counter and later detect "a GC happened since I last checked".
pub fn gc_generation() -> u32 {
    GC_GENERATION.load(Ordering::Relaxed)
}

impl<F: FlashDevice> Fs<F> {
    /// Run exactly one collection cycle.
    ///
    /// Returns the index of the area that absorbed the cycle (the
    /// former scratch area, now the emptiest data area). I/O errors
    /// abort the cycle and are surfaced unchanged; objects relocated
    /// before the failure keep their new, valid locations, but the
    /// scratch bookkeeping may be left mid-transition.
    pub fn gc(&mut self) -> FsResult<usize> {
        let src_idx = select::select_source(&self.areas, self.scratch_idx);
        let dst_idx = self.scratch_idx;
        let src_id = self.areas[src_idx].id;
        let src_write_off = self.areas[src_idx].write_off;

        log::info!(
            "gc: harvesting area {} (id {}, {} bytes written) into area {}",
            src_idx,
            src_id,
            src_write_off,
            dst_idx
        );

        // Power-loss pivot: from here on, recovery may find two areas
        // carrying the same id, disambiguated by gc_seq. The header
        // rewrite must complete before any object is copied. The
        // scratch sentinel id is all ones, so programming the real id
        // over it needs no erase.
        let dst = &self.areas[dst_idx];
        let header = DiskArea::new(dst.length, src_id, dst.gc_seq);
        io::write_area(&mut self.flash, dst, 0, &header.to_bytes())?;
        self.areas[dst_idx].id = src_id;

        // Relocate every live object out of the source area. Blocks are
        // handled through their owning inode; the cursor survives the
        // entry removals collation performs mid-walk.
        let mut cursor = self.table.cursor();
        while let Some(id) = self.table.advance(&mut cursor) {
            let inode = match self.table.get(id).and_then(|obj| obj.as_inode()) {
                Some(inode) => *inode,
                None => continue,
            };

            if inode.loc.area_idx() as usize == src_idx {
                self.gc_copy_inode(id, dst_idx)?;
            }
            if inode.is_file {
                self.gc_relocate_file_blocks(id, src_idx, dst_idx, &mut cursor)?;
            }
        }

        // Collection never increases the live byte count.
        debug_assert!(self.areas[dst_idx].write_off <= src_write_off);

        // The harvested area becomes the new scratch; its gc_seq
        // increments unconditionally, which is what keeps the selector's
        // tie-break fair.
        self.areas[src_idx].gc_seq = self.areas[src_idx].gc_seq.wrapping_add(1);
        io::format_area(&mut self.flash, &mut self.areas[src_idx], true)?;
        self.scratch_idx = src_idx;

        // Block locations moved; cached block content is dead. Inode
        // identities survive, so their cached locations are refreshed
        // rather than dropped.
        self.block_cache.invalidate_all();
        self.inode_cache.refresh_locations(&self.table);

        GC_GENERATION.fetch_add(1, Ordering::Relaxed);
        log::info!(
            "gc: area {} reclaimed, {} live bytes now in area {}",
            src_idx,
            self.areas[dst_idx].write_off,
            dst_idx
        );
        Ok(dst_idx)
    }

    /// Run collection cycles until some area has `min_free` free bytes.
    ///
    /// Each cycle harvests a distinct area, so more than `area_count`
    /// iterations cannot help; if the bound is exhausted the filesystem
    /// is genuinely [`FsError::Full`] for this request.
    pub fn gc_until(&mut self, min_free: u32) -> FsResult<()> {
        for _ in 0..self.areas.len() {
            let dst_idx = self.gc()?;
            if self.areas[dst_idx].free_space() >= min_free {
                return Ok(());
            }
        }
        Err(FsError::Full)
    }
}
