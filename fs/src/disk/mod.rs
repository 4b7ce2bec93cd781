//! On-flash record layouts and area-granular flash I/O.
//!
//! Every record is written once and never modified in place; superseded
//! records become garbage and are dropped when the garbage collector
//! harvests their area. All multi-byte fields are little-endian.

pub mod area;
pub mod block;
pub mod crc;
pub mod inode;
pub mod io;

pub use area::{DiskArea, DISK_AREA_SIZE};
pub use block::{DiskBlock, DISK_BLOCK_SIZE};
pub use inode::{DiskInode, DISK_INODE_SIZE};

/// Magic number at the start of every area header ("EMBR")
pub const AREA_MAGIC: u32 = 0x524D_4245;

/// Magic number of an on-flash inode record
pub const INODE_MAGIC: u16 = 0x7E49;

/// Magic number of an on-flash data block record
pub const BLOCK_MAGIC: u16 = 0x7E42;

/// On-flash format version
pub const DISK_VERSION: u8 = 1;
