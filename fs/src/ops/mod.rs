//! File operations: format, create, append, read, delete.
//!
//! This is the minimal write path of a log-structured filesystem: every
//! operation appends records, nothing is modified in place, and deleted
//! objects simply stop being referenced by the object table — their
//! flash bytes become garbage for the collector to drop.

use alloc::vec;
use alloc::vec::Vec;

use ember_hal::flash::FlashDevice;

use crate::cache::{BlockCache, InodeCache};
use crate::core::config::FsConfig;
use crate::core::error::{FsError, FsResult};
use crate::core::types::{Area, FlashLoc, ObjectId, FLASH_LOC_MAX_OFFSET, OBJ_ID_NONE};
use crate::disk::{io, DiskBlock, DiskInode, DISK_AREA_SIZE, DISK_BLOCK_SIZE, DISK_INODE_SIZE};
use crate::fs::Fs;
use crate::table::{BlockEntry, InodeEntry, Object, ObjectTable};

/// Placement of one area on the flash device.
#[derive(Clone, Copy, Debug)]
pub struct AreaDesc {
    /// Device-absolute offset of the area
    pub offset: u32,
    /// Area length in bytes
    pub length: u32,
}

impl<F: FlashDevice> Fs<F> {
    /// Format `flash` with the given area layout and mount the result.
    ///
    /// At least two areas are required: the last one becomes the
    /// scratch area, the rest hold data. All areas must share one
    /// length: scratch duty rotates through every area as cycles run,
    /// so each one must be able to absorb any other area's live bytes.
    pub fn format(mut flash: F, layout: &[AreaDesc], config: FsConfig) -> FsResult<Self> {
        if layout.len() < 2 || layout.len() > u8::MAX as usize + 1 {
            return Err(FsError::InvalidParam);
        }
        let length = layout[0].length;

        let mut areas = Vec::with_capacity(layout.len());
        for (idx, desc) in layout.iter().enumerate() {
            let end = desc.offset.checked_add(desc.length).ok_or(FsError::InvalidParam)?;
            if desc.length != length
                || desc.length <= DISK_AREA_SIZE as u32
                || desc.length - 1 > FLASH_LOC_MAX_OFFSET
                || end > flash.size()
            {
                return Err(FsError::InvalidParam);
            }
            areas.push(Area::new(desc.offset, desc.length, idx as u16));
        }

        let scratch_idx = layout.len() - 1;
        for (idx, area) in areas.iter_mut().enumerate() {
            io::format_area(&mut flash, area, idx == scratch_idx)?;
        }

        log::info!(
            "emberfs: formatted {} areas ({} data + 1 scratch)",
            layout.len(),
            layout.len() - 1
        );
        Ok(Self {
            flash,
            areas,
            scratch_idx,
            table: ObjectTable::new(),
            block_cache: BlockCache::new(),
            inode_cache: InodeCache::new(),
            config,
            next_id: 1,
        })
    }

    /// Create a regular file named `name`; returns its inode id.
    pub fn create_file(&mut self, name: &str) -> FsResult<ObjectId> {
        self.create_inode(name, true)
    }

    /// Create a directory named `name`; returns its inode id.
    pub fn create_dir(&mut self, name: &str) -> FsResult<ObjectId> {
        self.create_inode(name, false)
    }

    fn create_inode(&mut self, name: &str, is_file: bool) -> FsResult<ObjectId> {
        let name = name.as_bytes();
        if name.is_empty() || name.len() > u8::MAX as usize {
            return Err(FsError::InvalidParam);
        }

        let flash_len = (DISK_INODE_SIZE + name.len()) as u32;
        let area_idx = self.reserve_space(flash_len)?;
        let id = self.alloc_id()?;

        let mut record = DiskInode::new(id.0, OBJ_ID_NONE, name.len() as u8, is_file);
        record.fill_crc(name);

        let off = self.areas[area_idx].write_off;
        io::write_area(&mut self.flash, &self.areas[area_idx], off, &record.to_bytes())?;
        io::write_area(
            &mut self.flash,
            &self.areas[area_idx],
            off + DISK_INODE_SIZE as u32,
            name,
        )?;
        self.areas[area_idx].write_off = off + flash_len;

        let loc = FlashLoc::new(area_idx as u8, off);
        self.table.insert(Object::Inode(InodeEntry {
            id,
            loc,
            filename_len: name.len() as u8,
            is_file,
            last_block: None,
        }));
        self.inode_cache.insert(id, loc);
        Ok(id)
    }

    /// Append `data` to the file `inode_id`.
    ///
    /// Split into blocks of at most `max_block_data_len` payload bytes.
    /// Empty appends are rejected; blocks never carry empty payloads.
    pub fn append(&mut self, inode_id: ObjectId, data: &[u8]) -> FsResult<()> {
        if data.is_empty() {
            return Err(FsError::InvalidParam);
        }
        if !self.inode_entry(inode_id)?.is_file {
            return Err(FsError::InvalidParam);
        }

        for chunk in data.chunks(self.config.max_block_data_len as usize) {
            let flash_len = (DISK_BLOCK_SIZE + chunk.len()) as u32;
            let area_idx = self.reserve_space(flash_len)?;
            self.append_block_in(inode_id, chunk, area_idx)?;
        }
        Ok(())
    }

    /// Append one block of `data` into a specific area.
    pub(crate) fn append_block_in(
        &mut self,
        inode_id: ObjectId,
        data: &[u8],
        area_idx: usize,
    ) -> FsResult<ObjectId> {
        if data.is_empty() || data.len() > self.config.max_block_data_len as usize {
            return Err(FsError::InvalidParam);
        }

        let prev = self.inode_entry(inode_id)?.last_block;
        let id = self.alloc_id()?;

        let mut record = DiskBlock::new(id, inode_id, prev, 0, data.len() as u16);
        record.fill_crc(data);

        let off = self.areas[area_idx].write_off;
        io::write_area(&mut self.flash, &self.areas[area_idx], off, &record.to_bytes())?;
        io::write_area(
            &mut self.flash,
            &self.areas[area_idx],
            off + DISK_BLOCK_SIZE as u32,
            data,
        )?;
        self.areas[area_idx].write_off = off + record.flash_len();

        self.table.insert(Object::Block(BlockEntry {
            id,
            loc: FlashLoc::new(area_idx as u8, off),
            data_len: data.len() as u16,
            seq: 0,
            inode_id,
            prev,
        }));
        self.inode_entry_mut(inode_id)?.last_block = Some(id);
        Ok(id)
    }

    /// Read the whole content of the file `inode_id`.
    ///
    /// Blocks are served from the block cache when possible; uncached
    /// blocks are read from flash, CRC-validated, and cached.
    pub fn read_file(&mut self, inode_id: ObjectId) -> FsResult<Vec<u8>> {
        let inode = *self.inode_entry(inode_id)?;
        if !inode.is_file {
            return Err(FsError::InvalidParam);
        }

        // Chain order is newest-first; collect it, then fill the output
        // from the tail.
        let mut chain = Vec::new();
        let mut total = 0usize;
        let mut next = inode.last_block;
        while let Some(id) = next {
            let block = self.block_entry(id)?;
            chain.push(id);
            total += block.data_len as usize;
            next = block.prev;
        }

        let mut out = vec![0u8; total];
        let mut pos = total;
        for &id in &chain {
            let (loc, data_len) = {
                let block = self.block_entry(id)?;
                (block.loc, block.data_len as usize)
            };
            pos -= data_len;

            if let Some(cached) = self.block_cache.get(id) {
                // Stale locations cannot survive: GC drops the whole
                // block cache after relocating anything.
                debug_assert_eq!(cached.loc, loc);
                out[pos..pos + data_len].copy_from_slice(&cached.data);
                continue;
            }

            let area = &self.areas[loc.area_idx() as usize];
            let mut header_bytes = [0u8; DISK_BLOCK_SIZE];
            io::read_area(&mut self.flash, area, loc.offset(), &mut header_bytes)?;
            let header = DiskBlock::from_bytes(&header_bytes)?;
            if header.id != id.0 || header.data_len as usize != data_len {
                return Err(FsError::Corrupt);
            }

            let mut payload = vec![0u8; data_len];
            let area = &self.areas[loc.area_idx() as usize];
            io::read_area(
                &mut self.flash,
                area,
                loc.offset() + DISK_BLOCK_SIZE as u32,
                &mut payload,
            )?;
            if !header.validate_crc(&payload) {
                return Err(FsError::Corrupt);
            }

            out[pos..pos + data_len].copy_from_slice(&payload);
            self.block_cache.insert(id, loc, payload);
        }
        Ok(out)
    }

    /// Delete the file or directory `inode_id`.
    ///
    /// Removes the inode and, for files, every block of its chain from
    /// the object table and caches. The records stay on flash as
    /// garbage until the collector harvests their areas.
    pub fn delete_file(&mut self, inode_id: ObjectId) -> FsResult<()> {
        let inode = *self.inode_entry(inode_id)?;

        let mut next = inode.last_block;
        while let Some(id) = next {
            let prev = self.block_entry(id)?.prev;
            let _ = self.table.remove(id);
            self.block_cache.evict(id);
            next = prev;
        }

        let _ = self.table.remove(inode_id);
        self.inode_cache.evict(inode_id);
        log::debug!("emberfs: deleted inode {}", inode_id.0);
        Ok(())
    }

    /// Find a data area with at least `len` free bytes, collecting
    /// garbage if none has them right now.
    pub(crate) fn reserve_space(&mut self, len: u32) -> FsResult<usize> {
        if let Some(idx) = self.area_with_space(len) {
            return Ok(idx);
        }
        self.gc_until(len)?;
        self.area_with_space(len).ok_or(FsError::Full)
    }

    fn area_with_space(&self, len: u32) -> Option<usize> {
        self.areas
            .iter()
            .enumerate()
            .find(|(idx, area)| *idx != self.scratch_idx && area.free_space() >= len)
            .map(|(idx, _)| idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gc::gc_generation;
    use ember_hal::flash::RamFlash;

    fn test_fs(area_count: usize, area_len: u32, config: FsConfig) -> Fs<RamFlash> {
        let flash = RamFlash::new(area_count as u32 * area_len);
        let layout: Vec<AreaDesc> = (0..area_count)
            .map(|idx| AreaDesc {
                offset: idx as u32 * area_len,
                length: area_len,
            })
            .collect();
        Fs::format(flash, &layout, config).unwrap()
    }

    fn small_config() -> FsConfig {
        FsConfig {
            max_block_data_len: 200,
            collate_buf_cap: 200,
        }
    }

    #[test]
    fn test_format_requires_two_areas() {
        let flash = RamFlash::new(1024);
        let layout = [AreaDesc { offset: 0, length: 1024 }];
        assert!(matches!(
            Fs::format(flash, &layout, FsConfig::default()),
            Err(FsError::InvalidParam)
        ));
    }

    #[test]
    fn test_format_rejects_unequal_area_sizes() {
        // An undersized area would eventually serve as scratch and
        // could not absorb a full cycle from a larger one.
        let flash = RamFlash::new(2048 + 512);
        let layout = [
            AreaDesc { offset: 0, length: 2048 },
            AreaDesc { offset: 2048, length: 512 },
        ];
        assert!(matches!(
            Fs::format(flash, &layout, FsConfig::default()),
            Err(FsError::InvalidParam)
        ));
    }

    #[test]
    fn test_create_append_read_roundtrip() {
        let mut fs = test_fs(2, 2048, small_config());
        let file = fs.create_file("notes.txt").unwrap();
        fs.append(file, b"hello ").unwrap();
        fs.append(file, b"world").unwrap();
        assert_eq!(fs.read_file(file).unwrap(), b"hello world");
    }

    #[test]
    fn test_append_splits_at_max_block_size() {
        let mut fs = test_fs(2, 4096, small_config());
        let file = fs.create_file("big.bin").unwrap();

        let data: Vec<u8> = (0..450u32).map(|i| i as u8).collect();
        fs.append(file, &data).unwrap();
        assert_eq!(fs.read_file(file).unwrap(), data);

        // 450 bytes at max 200 payload -> 3 blocks
        let mut blocks = 0;
        let mut next = fs.inode_entry(file).unwrap().last_block;
        while let Some(id) = next {
            let block = fs.block_entry(id).unwrap();
            assert!(block.data_len <= 200);
            blocks += 1;
            next = block.prev;
        }
        assert_eq!(blocks, 3);
    }

    #[test]
    fn test_cached_read_matches_table_location() {
        let mut fs = test_fs(2, 2048, small_config());
        let file = fs.create_file("f").unwrap();
        fs.append(file, &[3u8; 100]).unwrap();

        // First read populates the cache, second is served from it.
        assert_eq!(fs.read_file(file).unwrap(), vec![3u8; 100]);
        assert_eq!(fs.read_file(file).unwrap(), vec![3u8; 100]);
        assert_eq!(fs.block_cache.len(), 1);
    }

    #[test]
    fn test_empty_append_rejected() {
        let mut fs = test_fs(2, 2048, small_config());
        let file = fs.create_file("f").unwrap();
        assert_eq!(fs.append(file, b""), Err(FsError::InvalidParam));
    }

    #[test]
    fn test_append_to_directory_rejected() {
        let mut fs = test_fs(2, 2048, small_config());
        let dir = fs.create_dir("etc").unwrap();
        assert_eq!(fs.append(dir, b"x"), Err(FsError::InvalidParam));
        assert_eq!(fs.read_file(dir), Err(FsError::InvalidParam));
    }

    #[test]
    fn test_delete_removes_objects() {
        let mut fs = test_fs(2, 2048, small_config());
        let file = fs.create_file("gone.txt").unwrap();
        fs.append(file, &[7u8; 300]).unwrap();
        assert_eq!(fs.object_count(), 3); // inode + 2 blocks

        fs.delete_file(file).unwrap();
        assert_eq!(fs.object_count(), 0);
        assert_eq!(fs.read_file(file), Err(FsError::NotFound));
    }

    #[test]
    fn test_reserve_space_triggers_gc() {
        // One data area plus scratch; fill it, delete, and the next
        // append must reclaim through the collector.
        let mut fs = test_fs(2, 1024, small_config());
        let junk = fs.create_file("junk").unwrap();
        while fs.area_free_space(0).unwrap() >= (DISK_BLOCK_SIZE + 200) as u32 {
            fs.append(junk, &[0xAA; 200]).unwrap();
        }
        fs.delete_file(junk).unwrap();

        let generation = gc_generation();
        let file = fs.create_file("fresh").unwrap();
        fs.append(file, &[0xBB; 600]).unwrap();

        assert!(gc_generation() > generation);
        assert_eq!(fs.read_file(file).unwrap(), vec![0xBB; 600]);
    }

    #[test]
    fn test_writes_never_land_in_scratch() {
        let mut fs = test_fs(3, 1024, small_config());
        let file = fs.create_file("f").unwrap();
        fs.append(file, &[1u8; 500]).unwrap();

        let scratch = fs.scratch_index();
        let mut next = fs.inode_entry(file).unwrap().last_block;
        while let Some(id) = next {
            let block = fs.block_entry(id).unwrap();
            assert_ne!(block.loc.area_idx() as usize, scratch);
            next = block.prev;
        }
        assert_eq!(
            fs.area_free_space(scratch).unwrap(),
            1024 - DISK_AREA_SIZE as u32
        );
    }
}
