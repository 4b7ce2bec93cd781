//! # EmberFS - Log-Structured Flash Filesystem
//!
//! EmberFS targets raw NOR flash split into erase-unit-sized *areas*.
//! All writes are appends; objects (inodes and data blocks) are never
//! rewritten in place. Space is reclaimed by the garbage collector,
//! which harvests one area at a time into the always-empty *scratch*
//! area, merging contiguous runs of data blocks as it goes.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │            File Operations (ops)                 │
//! │     format / create / append / read / delete     │
//! ├──────────────────────────────────────────────────┤
//! │  Object Table (table)   │   Caches (cache)       │
//! │  id -> inode | block    │   block data, inode    │
//! │  mutation-safe cursor   │   locations            │
//! ├──────────────────────────────────────────────────┤
//! │            Garbage Collector (gc)                │
//! │  select -> walk -> dispatch -> copy | collate    │
//! ├──────────────────────────────────────────────────┤
//! │        On-Flash Records + Area I/O (disk)        │
//! ├──────────────────────────────────────────────────┤
//! │          Flash Device (ember-hal)                │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! The whole crate is synchronous and performs no internal locking;
//! callers serialize access with the filesystem-wide lock they already
//! hold around every operation.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod core;
pub mod disk;
pub mod table;
pub mod cache;
pub mod gc;
pub mod ops;

mod fs;

pub use crate::core::config::FsConfig;
pub use crate::core::error::{FsError, FsResult};
pub use crate::core::types::{FlashLoc, ObjectId};
pub use crate::fs::Fs;
pub use crate::gc::gc_generation;
pub use crate::ops::AreaDesc;
