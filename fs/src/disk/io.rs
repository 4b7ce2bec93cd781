//! Area-relative flash I/O.
//!
//! All filesystem code addresses flash as (area, offset); only this
//! module translates to device-absolute offsets. Accesses are bounds
//! checked against the area, not just the device.

use crate::core::error::{FsError, FsResult};
use crate::core::types::{Area, AREA_ID_NONE};
use crate::disk::{DiskArea, DISK_AREA_SIZE};
use ember_hal::flash::FlashDevice;

/// Chunk size for flash-to-flash copies
const COPY_CHUNK: usize = 256;

fn check_range(area: &Area, offset: u32, len: u32) -> FsResult<()> {
    let end = offset.checked_add(len).ok_or(FsError::InvalidParam)?;
    if end > area.length {
        return Err(FsError::InvalidParam);
    }
    Ok(())
}

/// Read `dst.len()` bytes at `offset` within `area`.
pub fn read_area<F: FlashDevice>(flash: &mut F, area: &Area, offset: u32, dst: &mut [u8]) -> FsResult<()> {
    check_range(area, offset, dst.len() as u32)?;
    flash.read(area.offset + offset, dst)?;
    Ok(())
}

/// Write `src` at `offset` within `area`.
pub fn write_area<F: FlashDevice>(flash: &mut F, area: &Area, offset: u32, src: &[u8]) -> FsResult<()> {
    check_range(area, offset, src.len() as u32)?;
    flash.write(area.offset + offset, src)?;
    Ok(())
}

/// Copy `len` bytes between two areas through a small stack buffer.
pub fn copy_between_areas<F: FlashDevice>(
    flash: &mut F,
    areas: &[Area],
    src_idx: usize,
    src_off: u32,
    dst_idx: usize,
    dst_off: u32,
    len: u32,
) -> FsResult<()> {
    let src = areas.get(src_idx).ok_or(FsError::InvalidParam)?;
    let dst = areas.get(dst_idx).ok_or(FsError::InvalidParam)?;
    check_range(src, src_off, len)?;
    check_range(dst, dst_off, len)?;

    let mut buf = [0u8; COPY_CHUNK];
    let mut done: u32 = 0;
    while done < len {
        let chunk = core::cmp::min((len - done) as usize, COPY_CHUNK);
        flash.read(src.offset + src_off + done, &mut buf[..chunk])?;
        flash.write(dst.offset + dst_off + done, &buf[..chunk])?;
        done += chunk as u32;
    }
    Ok(())
}

/// Erase `area` and write a fresh header.
///
/// As a scratch area the header carries [`AREA_ID_NONE`]; otherwise the
/// id already recorded in the descriptor. The append cursor is reset to
/// just past the header either way.
pub fn format_area<F: FlashDevice>(flash: &mut F, area: &mut Area, scratch: bool) -> FsResult<()> {
    if scratch {
        area.id = AREA_ID_NONE;
    }
    flash.erase(area.offset, area.length)?;

    let header = DiskArea::new(area.length, area.id, area.gc_seq);
    flash.write(area.offset, &header.to_bytes())?;
    area.write_off = DISK_AREA_SIZE as u32;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_hal::flash::RamFlash;

    fn two_areas() -> (RamFlash, [Area; 2]) {
        let flash = RamFlash::new(2048);
        (flash, [Area::new(0, 1024, 0), Area::new(1024, 1024, 1)])
    }

    #[test]
    fn test_area_io_roundtrip() {
        let (mut flash, areas) = two_areas();
        write_area(&mut flash, &areas[1], 100, b"hello").unwrap();

        let mut buf = [0u8; 5];
        read_area(&mut flash, &areas[1], 100, &mut buf).unwrap();
        assert_eq!(&buf, b"hello");

        // Same device offset through the raw device view
        flash.read(1124, &mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn test_area_io_bounds() {
        let (mut flash, areas) = two_areas();
        let mut buf = [0u8; 8];
        assert_eq!(
            read_area(&mut flash, &areas[0], 1020, &mut buf),
            Err(FsError::InvalidParam)
        );
        assert_eq!(
            write_area(&mut flash, &areas[0], 1024, b"x"),
            Err(FsError::InvalidParam)
        );
    }

    #[test]
    fn test_copy_between_areas_chunked() {
        let (mut flash, areas) = two_areas();
        let data: alloc::vec::Vec<u8> = (0..700u32).map(|i| i as u8).collect();
        write_area(&mut flash, &areas[0], 12, &data).unwrap();

        copy_between_areas(&mut flash, &areas, 0, 12, 1, 40, 700).unwrap();

        let mut out = alloc::vec![0u8; 700];
        read_area(&mut flash, &areas[1], 40, &mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_format_area_as_scratch() {
        let (mut flash, mut areas) = two_areas();
        write_area(&mut flash, &areas[0], 500, b"junk").unwrap();
        areas[0].write_off = 504;
        areas[0].gc_seq = 3;

        format_area(&mut flash, &mut areas[0], true).unwrap();
        assert_eq!(areas[0].id, AREA_ID_NONE);
        assert_eq!(areas[0].write_off, DISK_AREA_SIZE as u32);

        let mut hdr = [0u8; DISK_AREA_SIZE];
        read_area(&mut flash, &areas[0], 0, &mut hdr).unwrap();
        let disk = DiskArea::from_bytes(&hdr).unwrap();
        assert!(disk.is_scratch());
        assert_eq!(disk.gc_seq, 3);

        let mut buf = [0u8; 4];
        read_area(&mut flash, &areas[0], 500, &mut buf).unwrap();
        assert_eq!(buf, [0xFF; 4]);
    }
}
