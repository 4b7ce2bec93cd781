//! Object identifiers, flash locations, and area descriptors.

use crate::disk::DISK_AREA_SIZE;

/// Raw id value meaning "no object" (all ones on flash)
pub const OBJ_ID_NONE: u16 = 0xFFFF;

/// Area id of the scratch area (all ones on flash)
pub const AREA_ID_NONE: u16 = 0xFFFF;

// ============================================================================
// Object Id
// ============================================================================

/// Identity of one filesystem object (inode or data block).
///
/// Ids are the only reference form used between objects: a block names
/// its inode and its predecessor by id, never by address, so references
/// survive relocation by the garbage collector.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ObjectId(pub u16);

impl ObjectId {
    /// Decode an optional id from its on-flash raw value
    #[inline]
    pub const fn from_raw(raw: u16) -> Option<Self> {
        if raw == OBJ_ID_NONE {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Encode an optional id to its on-flash raw value
    #[inline]
    pub fn to_raw(id: Option<Self>) -> u16 {
        match id {
            Some(id) => id.0,
            None => OBJ_ID_NONE,
        }
    }
}

// ============================================================================
// Flash Location
// ============================================================================

/// Maximum area-relative offset representable in a packed location
pub const FLASH_LOC_MAX_OFFSET: u32 = (1 << 24) - 1;

/// Packed (area index, byte offset) handle.
///
/// High 8 bits hold the area index, low 24 bits the area-relative byte
/// offset. Every live object owns exactly one current location; the
/// garbage collector updates it in place when it relocates the object.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FlashLoc(u32);

impl FlashLoc {
    /// Pack an area index and area-relative offset
    #[inline]
    pub fn new(area_idx: u8, offset: u32) -> Self {
        debug_assert!(offset <= FLASH_LOC_MAX_OFFSET);
        Self(((area_idx as u32) << 24) | (offset & FLASH_LOC_MAX_OFFSET))
    }

    /// Area index component
    #[inline]
    pub const fn area_idx(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Area-relative byte offset component
    #[inline]
    pub const fn offset(self) -> u32 {
        self.0 & FLASH_LOC_MAX_OFFSET
    }
}

// ============================================================================
// Area
// ============================================================================

/// In-RAM descriptor of one flash area (erase unit).
#[derive(Clone, Copy, Debug)]
pub struct Area {
    /// Device-absolute offset of the area's first byte
    pub offset: u32,
    /// Area length in bytes, header included
    pub length: u32,
    /// Append cursor, area-relative; starts past the area header
    pub write_off: u32,
    /// Area id, or [`AREA_ID_NONE`] for the scratch area
    pub id: u16,
    /// Garbage collection sequence number (wraps)
    pub gc_seq: u8,
}

impl Area {
    /// Fresh descriptor with the append cursor past the header
    pub fn new(offset: u32, length: u32, id: u16) -> Self {
        Self {
            offset,
            length,
            write_off: DISK_AREA_SIZE as u32,
            id,
            gc_seq: 0,
        }
    }

    /// Bytes still free for appends
    #[inline]
    pub fn free_space(&self) -> u32 {
        self.length - self.write_off
    }

    /// Whether this area currently serves as the scratch area
    #[inline]
    pub fn is_scratch(&self) -> bool {
        self.id == AREA_ID_NONE
    }
}
