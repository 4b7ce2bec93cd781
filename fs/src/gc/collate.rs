//! Block-chain collation: merge a run of blocks into one.
//!
//! A run of chain-contiguous blocks, all resident in the area being
//! harvested, is rewritten as a single block in the destination. The
//! merged block keeps the id of the run's terminal block, so every
//! forward reference to the run stays valid; the other constituents are
//! deleted from the object table.

use core::ops::{Deref, DerefMut};

use ember_hal::flash::FlashDevice;

use crate::core::error::{FsError, FsResult};
use crate::core::types::{FlashLoc, ObjectId};
use crate::disk::{io, DiskBlock, DISK_BLOCK_SIZE};
use crate::fs::Fs;
use crate::table::TableCursor;

// ============================================================================
// Assembly Buffer
// ============================================================================

cfg_if::cfg_if! {
    if #[cfg(feature = "fixed-collate-buf")] {
        use crate::core::config::COLLATE_BUF_SIZE;

        /// Scratch buffer the merged payload is assembled in.
        ///
        /// Fixed-size variant: no allocator involvement, at the price of
        /// [`COLLATE_BUF_SIZE`] bytes of stack.
        pub(crate) struct AssemblyBuf {
            buf: heapless::Vec<u8, COLLATE_BUF_SIZE>,
        }

        impl AssemblyBuf {
            /// Acquire a zeroed buffer of `len` bytes.
            ///
            /// Fails with [`FsError::OutOfMemory`] when `len` exceeds the
            /// configured budget; nothing has been mutated at that point.
            pub(crate) fn acquire(len: usize, cap: u32) -> FsResult<Self> {
                if len as u32 > cap {
                    return Err(FsError::OutOfMemory);
                }
                let mut buf = heapless::Vec::new();
                buf.resize(len, 0).map_err(|_| FsError::OutOfMemory)?;
                Ok(Self { buf })
            }
        }
    } else {
        use alloc::vec::Vec;

        /// Scratch buffer the merged payload is assembled in.
        ///
        /// Heap variant; released when dropped, on every exit path.
        pub(crate) struct AssemblyBuf {
            buf: Vec<u8>,
        }

        impl AssemblyBuf {
            /// Acquire a zeroed buffer of `len` bytes.
            ///
            /// Fails with [`FsError::OutOfMemory`] when `len` exceeds the
            /// configured budget or the allocator declines; nothing has
            /// been mutated at that point.
            pub(crate) fn acquire(len: usize, cap: u32) -> FsResult<Self> {
                if len as u32 > cap {
                    return Err(FsError::OutOfMemory);
                }
                let mut buf = Vec::new();
                buf.try_reserve_exact(len).map_err(|_| FsError::OutOfMemory)?;
                buf.resize(len, 0);
                Ok(Self { buf })
            }
        }
    }
}

impl Deref for AssemblyBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for AssemblyBuf {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

// ============================================================================
// Collation
// ============================================================================

impl<F: FlashDevice> Fs<F> {
    /// Merge the run ending at `last_id`, `total_len` payload bytes in
    /// all, into one block appended to the area at `dst_idx`.
    ///
    /// The run's constituents are visited backward from `last_id`; each
    /// payload is read from its current location into the assembly
    /// buffer, and every constituent except the terminal one is removed
    /// from the object table with `cursor` repaired, since the caller is
    /// mid-iteration over the same table.
    ///
    /// [`FsError::OutOfMemory`] from buffer acquisition is non-fatal and
    /// leaves all state untouched; I/O errors abort the cycle.
    pub(crate) fn gc_collate_chain(
        &mut self,
        last_id: ObjectId,
        total_len: u32,
        dst_idx: usize,
        cursor: &mut TableCursor,
    ) -> FsResult<()> {
        let mut buf = AssemblyBuf::acquire(total_len as usize, self.config.collate_buf_cap)?;

        let (inode_id, last_seq) = {
            let last = self.block_entry(last_id)?;
            (last.inode_id, last.seq)
        };

        // Walk backward, filling the buffer from the tail so it ends up
        // holding the payload concatenation in forward order.
        let mut remaining = total_len;
        let mut id = last_id;
        let run_prev;
        loop {
            let (loc, data_len, prev) = {
                let block = self.block_entry(id)?;
                (block.loc, block.data_len as u32, block.prev)
            };

            remaining = remaining.checked_sub(data_len).ok_or(FsError::Corrupt)?;
            io::read_area(
                &mut self.flash,
                &self.areas[loc.area_idx() as usize],
                loc.offset() + DISK_BLOCK_SIZE as u32,
                &mut buf[remaining as usize..(remaining + data_len) as usize],
            )?;

            if id != last_id {
                // Absorbed into the terminal block; the entry dies here.
                let _ = self.table.remove_with_cursor(id, cursor);
                self.block_cache.evict(id);
            }

            if remaining == 0 {
                // `id` is the run's first constituent; whatever precedes
                // it precedes the merged block.
                run_prev = prev;
                break;
            }
            id = prev.ok_or(FsError::Corrupt)?;
        }

        // One merged record: terminal id preserved, sequence bumped.
        let new_seq = last_seq.wrapping_add(1);
        let mut header = DiskBlock::new(last_id, inode_id, run_prev, new_seq, total_len as u16);
        header.fill_crc(&buf);

        let dst_off = self.areas[dst_idx].write_off;
        io::write_area(&mut self.flash, &self.areas[dst_idx], dst_off, &header.to_bytes())?;
        io::write_area(
            &mut self.flash,
            &self.areas[dst_idx],
            dst_off + DISK_BLOCK_SIZE as u32,
            &buf,
        )?;
        self.areas[dst_idx].write_off = dst_off + header.flash_len();

        let block = self.block_entry_mut(last_id)?;
        block.loc = FlashLoc::new(dst_idx as u8, dst_off);
        block.seq = new_seq;
        block.data_len = total_len as u16;
        block.prev = run_prev;
        self.block_cache.evict(last_id);

        log::debug!(
            "gc: collated {} bytes into block {} at area {} offset {}",
            total_len,
            last_id.0,
            dst_idx,
            dst_off
        );
        Ok(())
        // Assembly buffer released here and on every early return.
    }
}
