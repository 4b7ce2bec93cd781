//! Object and block-chain relocation by byte copy.

use ember_hal::flash::FlashDevice;

use crate::core::error::{FsError, FsResult};
use crate::core::types::{FlashLoc, ObjectId};
use crate::disk::{io, DISK_BLOCK_SIZE, DISK_INODE_SIZE};
use crate::fs::Fs;

impl<F: FlashDevice> Fs<F> {
    /// Relocate one object's raw bytes into the area at `dst_idx`.
    ///
    /// Reads `len` bytes from the object's current location and appends
    /// them at the destination's write cursor. The object's recorded
    /// location is updated only after the byte copy has succeeded; on
    /// I/O failure the entry still points at its original, valid bytes.
    pub(crate) fn gc_copy_object(&mut self, id: ObjectId, len: u32, dst_idx: usize) -> FsResult<()> {
        let loc = self.table.get(id).ok_or(FsError::NotFound)?.loc();
        let dst_off = self.areas[dst_idx].write_off;

        io::copy_between_areas(
            &mut self.flash,
            &self.areas,
            loc.area_idx() as usize,
            loc.offset(),
            dst_idx,
            dst_off,
            len,
        )?;

        self.areas[dst_idx].write_off = dst_off + len;
        self.table
            .get_mut(id)
            .ok_or(FsError::NotFound)?
            .set_loc(FlashLoc::new(dst_idx as u8, dst_off));

        log::trace!(
            "gc: moved object {} ({} bytes) to area {} offset {}",
            id.0,
            len,
            dst_idx,
            dst_off
        );
        Ok(())
    }

    /// Relocate an inode record (header plus filename).
    pub(crate) fn gc_copy_inode(&mut self, id: ObjectId, dst_idx: usize) -> FsResult<()> {
        let len = DISK_INODE_SIZE as u32 + self.inode_entry(id)?.filename_len as u32;
        self.gc_copy_object(id, len, dst_idx)
    }

    /// Relocate a chain of blocks one-for-one, without merging.
    ///
    /// Starts at `last_id` and follows `prev` links until `total_len`
    /// payload bytes have been accounted for. Used for single-block runs
    /// and as the fallback when collation cannot acquire its buffer.
    pub(crate) fn gc_copy_chain(&mut self, last_id: ObjectId, total_len: u32, dst_idx: usize) -> FsResult<()> {
        let mut remaining = total_len;
        let mut next = Some(last_id);

        while remaining > 0 {
            let id = next.ok_or(FsError::Corrupt)?;
            let (data_len, prev) = {
                let block = self.block_entry(id)?;
                (block.data_len as u32, block.prev)
            };

            self.gc_copy_object(id, DISK_BLOCK_SIZE as u32 + data_len, dst_idx)?;

            remaining = remaining.checked_sub(data_len).ok_or(FsError::Corrupt)?;
            next = prev;
        }
        Ok(())
    }
}
