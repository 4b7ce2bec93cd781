//! Flash device abstraction.
//!
//! Flash is modeled as one byte-addressable device; partitioning into
//! erase units is the storage subsystem's concern, not the HAL's. All
//! operations are synchronous and block the calling context.

use alloc::vec;
use alloc::vec::Vec;

use crate::{HalError, HalResult};

/// Value flash bytes take after an erase
pub const ERASED_BYTE: u8 = 0xFF;

/// A byte-granular flash device.
///
/// Offsets are device-absolute. Implementations must fail with
/// [`HalError::OutOfBounds`] for any access past `size()` rather than
/// wrapping or truncating.
pub trait FlashDevice {
    /// Total device size in bytes
    fn size(&self) -> u32;

    /// Read `dst.len()` bytes starting at `offset`
    fn read(&mut self, offset: u32, dst: &mut [u8]) -> HalResult<()>;

    /// Program `src.len()` bytes starting at `offset`
    fn write(&mut self, offset: u32, src: &[u8]) -> HalResult<()>;

    /// Erase `len` bytes starting at `offset` back to [`ERASED_BYTE`]
    fn erase(&mut self, offset: u32, len: u32) -> HalResult<()>;
}

/// RAM-backed flash simulator.
///
/// Used by host-side tests and by boards that stage a filesystem image
/// in RAM before committing it to real flash.
#[derive(Debug)]
pub struct RamFlash {
    mem: Vec<u8>,
}

impl RamFlash {
    /// Create a device of `size` bytes, fully erased
    pub fn new(size: u32) -> Self {
        Self {
            mem: vec![ERASED_BYTE; size as usize],
        }
    }

    fn check_range(&self, offset: u32, len: usize) -> HalResult<()> {
        let end = (offset as usize).checked_add(len).ok_or(HalError::OutOfBounds)?;
        if end > self.mem.len() {
            return Err(HalError::OutOfBounds);
        }
        Ok(())
    }
}

impl FlashDevice for RamFlash {
    fn size(&self) -> u32 {
        self.mem.len() as u32
    }

    fn read(&mut self, offset: u32, dst: &mut [u8]) -> HalResult<()> {
        self.check_range(offset, dst.len())?;
        let start = offset as usize;
        dst.copy_from_slice(&self.mem[start..start + dst.len()]);
        Ok(())
    }

    fn write(&mut self, offset: u32, src: &[u8]) -> HalResult<()> {
        self.check_range(offset, src.len())?;
        let start = offset as usize;
        self.mem[start..start + src.len()].copy_from_slice(src);
        Ok(())
    }

    fn erase(&mut self, offset: u32, len: u32) -> HalResult<()> {
        self.check_range(offset, len as usize)?;
        log::trace!("ram flash: erase {} bytes at {:#x}", len, offset);
        let start = offset as usize;
        self.mem[start..start + len as usize].fill(ERASED_BYTE);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ram_flash_roundtrip() {
        let mut flash = RamFlash::new(256);
        assert_eq!(flash.size(), 256);

        flash.write(10, &[1, 2, 3, 4]).unwrap();
        let mut buf = [0u8; 4];
        flash.read(10, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn test_ram_flash_erase() {
        let mut flash = RamFlash::new(64);
        flash.write(0, &[0u8; 64]).unwrap();
        flash.erase(16, 16).unwrap();

        let mut buf = [0u8; 64];
        flash.read(0, &mut buf).unwrap();
        assert!(buf[..16].iter().all(|&b| b == 0));
        assert!(buf[16..32].iter().all(|&b| b == ERASED_BYTE));
        assert!(buf[32..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_ram_flash_bounds() {
        let mut flash = RamFlash::new(32);
        let mut buf = [0u8; 8];
        assert_eq!(flash.read(28, &mut buf), Err(HalError::OutOfBounds));
        assert_eq!(flash.write(32, &[0]), Err(HalError::OutOfBounds));
        assert_eq!(flash.erase(0, 33), Err(HalError::OutOfBounds));
    }
}
