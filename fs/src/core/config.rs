//! Filesystem tuning knobs.

/// Default maximum payload of a single data block
pub const DEFAULT_MAX_BLOCK_DATA_LEN: u16 = 2048;

/// Size of the fixed collation buffer (`fixed-collate-buf` builds)
pub const COLLATE_BUF_SIZE: usize = 2048;

// A default-config run always fits the fixed buffer; collation would
// otherwise fall back to block-by-block copy on every multi-block run.
static_assertions::const_assert!(COLLATE_BUF_SIZE >= DEFAULT_MAX_BLOCK_DATA_LEN as usize);

/// Filesystem configuration, fixed at format/mount time.
#[derive(Clone, Copy, Debug)]
pub struct FsConfig {
    /// Maximum payload bytes in one data block. Appends split at this
    /// size and GC collation never merges a run past it.
    pub max_block_data_len: u16,
    /// RAM budget for the GC collation buffer. Runs whose merged payload
    /// would exceed it fall back to block-by-block relocation.
    pub collate_buf_cap: u32,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            max_block_data_len: DEFAULT_MAX_BLOCK_DATA_LEN,
            collate_buf_cap: DEFAULT_MAX_BLOCK_DATA_LEN as u32,
        }
    }
}
