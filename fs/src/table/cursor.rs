//! Mutation-safe iteration cursor.
//!
//! The garbage collector walks the whole object table while its own
//! collation step removes entries from it. The cursor holds the *id* of
//! the next entry to visit rather than a position, so a removal deep in
//! the call stack can repair it (see `ObjectTable::remove_with_cursor`)
//! and iteration never dereferences a dead entry.

use crate::core::types::ObjectId;

/// Cursor over an `ObjectTable`.
///
/// Obtained from `ObjectTable::cursor()` and advanced with
/// `ObjectTable::advance()`. Plain value; holding one borrows nothing.
#[derive(Clone, Copy, Debug)]
pub struct TableCursor {
    /// Bucket currently being walked
    pub(super) bucket: usize,
    /// Id of the next entry to visit within that bucket
    pub(super) next: Option<ObjectId>,
}

impl TableCursor {
    pub(super) fn new(first: Option<ObjectId>) -> Self {
        Self { bucket: 0, next: first }
    }

    /// Id the cursor will yield next, if already determined
    #[inline]
    pub fn pending(&self) -> Option<ObjectId> {
        self.next
    }
}
