//! Per-file block walk and run dispatch.

use ember_hal::flash::FlashDevice;

use crate::core::error::{FsError, FsResult};
use crate::core::types::ObjectId;
use crate::fs::Fs;
use crate::table::TableCursor;

impl<F: FlashDevice> Fs<F> {
    /// Relocate one run, choosing between copy and collation.
    ///
    /// Single-block runs are plain-copied (collation would be strictly
    /// more expensive). Multi-block runs are collated; if the collation
    /// buffer cannot be acquired the run is transparently copied block
    /// by block instead, and only that run loses its merge.
    pub(crate) fn gc_dispatch_run(
        &mut self,
        last_id: ObjectId,
        multi: bool,
        total_len: u32,
        dst_idx: usize,
        cursor: &mut TableCursor,
    ) -> FsResult<()> {
        if !multi {
            return self.gc_copy_chain(last_id, total_len, dst_idx);
        }
        match self.gc_collate_chain(last_id, total_len, dst_idx, cursor) {
            Err(FsError::OutOfMemory) => {
                log::debug!(
                    "gc: no collation buffer for {} bytes, copying run block by block",
                    total_len
                );
                self.gc_copy_chain(last_id, total_len, dst_idx)
            }
            other => other,
        }
    }

    /// Relocate every block of `inode_id`'s file that lives in the area
    /// being harvested.
    ///
    /// The entire logical chain is walked backward from the last block.
    /// Blocks resident in `src_idx` accumulate into a run until either
    /// the run would exceed the maximum block payload or a block outside
    /// the source area is reached; non-resident blocks are boundaries
    /// and are left untouched. Each completed run is dispatched, so the
    /// file ends up with every maximal in-source run collapsed (when
    /// multi-block) into one destination block.
    pub(crate) fn gc_relocate_file_blocks(
        &mut self,
        inode_id: ObjectId,
        src_idx: usize,
        dst_idx: usize,
        cursor: &mut TableCursor,
    ) -> FsResult<()> {
        let max_len = self.config.max_block_data_len as u32;

        let mut next = self.inode_entry(inode_id)?.last_block;
        let mut run_last: Option<ObjectId> = None;
        let mut run_len: u32 = 0;
        let mut multi = false;

        while let Some(id) = next {
            let (loc, data_len, prev) = {
                let block = self.block_entry(id)?;
                (block.loc, block.data_len as u32, block.prev)
            };

            if loc.area_idx() as usize == src_idx {
                if run_last.is_none() {
                    run_last = Some(id);
                    run_len = data_len;
                    multi = false;
                } else if run_len + data_len > max_len {
                    // Run is as large as one block may get; flush it and
                    // start a new run at this block.
                    if let Some(last) = run_last {
                        self.gc_dispatch_run(last, multi, run_len, dst_idx, cursor)?;
                    }
                    run_last = Some(id);
                    run_len = data_len;
                    multi = false;
                } else {
                    run_len += data_len;
                    multi = true;
                }
            } else if let Some(last) = run_last.take() {
                // A block outside the source area bounds the run.
                self.gc_dispatch_run(last, multi, run_len, dst_idx, cursor)?;
                run_len = 0;
                multi = false;
            }

            next = prev;
        }

        if let Some(last) = run_last {
            self.gc_dispatch_run(last, multi, run_len, dst_idx, cursor)?;
        }
        Ok(())
    }
}
