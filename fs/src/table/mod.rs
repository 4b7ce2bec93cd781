//! Object table: id -> live object, with bucket-ordered iteration.
//!
//! Lookup goes through a hash map; iteration order is defined by small
//! per-bucket id lists so that a cursor can survive entry removal
//! mid-walk. Entries are created and destroyed by the file operations
//! layer; the garbage collector only updates locations and, during
//! collation, removes the non-terminal blocks of merged runs.

pub mod cursor;
pub mod entry;

pub use cursor::TableCursor;
pub use entry::{BlockEntry, InodeEntry, Object};

use alloc::vec::Vec;
use hashbrown::HashMap;

use crate::core::types::ObjectId;

/// Number of iteration buckets
pub const TABLE_BUCKETS: usize = 32;

/// The object table.
#[derive(Debug)]
pub struct ObjectTable {
    entries: HashMap<ObjectId, Object>,
    buckets: Vec<Vec<ObjectId>>,
}

impl Default for ObjectTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectTable {
    /// Empty table
    pub fn new() -> Self {
        let mut buckets = Vec::with_capacity(TABLE_BUCKETS);
        buckets.resize_with(TABLE_BUCKETS, Vec::new);
        Self {
            entries: HashMap::new(),
            buckets,
        }
    }

    #[inline]
    fn bucket_of(&self, id: ObjectId) -> usize {
        id.0 as usize % self.buckets.len()
    }

    /// Number of live entries
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or replace the entry for `obj.id()`
    pub fn insert(&mut self, obj: Object) {
        let id = obj.id();
        if self.entries.insert(id, obj).is_none() {
            let bucket = self.bucket_of(id);
            self.buckets[bucket].push(id);
        }
    }

    /// Entry for `id`
    #[inline]
    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.entries.get(&id)
    }

    /// Mutable entry for `id`
    #[inline]
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.entries.get_mut(&id)
    }

    /// Remove the entry for `id`
    pub fn remove(&mut self, id: ObjectId) -> Option<Object> {
        let obj = self.entries.remove(&id)?;
        let bucket = self.bucket_of(id);
        self.buckets[bucket].retain(|&other| other != id);
        Some(obj)
    }

    /// Remove `id` while `cursor` iterates this table.
    ///
    /// If the cursor's pending entry is exactly `id`, the cursor is
    /// advanced to the entry that would have been visited after it, so
    /// the caller's walk neither revisits nor touches the dead entry.
    pub fn remove_with_cursor(&mut self, id: ObjectId, cursor: &mut TableCursor) -> Option<Object> {
        if cursor.next == Some(id) {
            cursor.next = self.successor(cursor.bucket, id);
        }
        self.remove(id)
    }

    /// Id following `id` in iteration order within `bucket`, if any
    fn successor(&self, bucket: usize, id: ObjectId) -> Option<ObjectId> {
        let ids = &self.buckets[bucket];
        let pos = ids.iter().position(|&other| other == id)?;
        ids.get(pos + 1).copied()
    }

    /// Cursor positioned before the first entry
    pub fn cursor(&self) -> TableCursor {
        TableCursor::new(self.buckets[0].first().copied())
    }

    /// Yield the cursor's pending entry id and pre-compute its successor.
    ///
    /// The successor is fixed *before* the caller processes the yielded
    /// entry; removals performed while processing repair it through
    /// [`Self::remove_with_cursor`].
    pub fn advance(&self, cursor: &mut TableCursor) -> Option<ObjectId> {
        loop {
            if let Some(id) = cursor.next.take() {
                cursor.next = self.successor(cursor.bucket, id);
                return Some(id);
            }
            if cursor.bucket + 1 >= self.buckets.len() {
                return None;
            }
            cursor.bucket += 1;
            cursor.next = self.buckets[cursor.bucket].first().copied();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FlashLoc;

    fn block(id: u16) -> Object {
        Object::Block(BlockEntry {
            id: ObjectId(id),
            loc: FlashLoc::new(0, id as u32 * 64),
            data_len: 16,
            seq: 0,
            inode_id: ObjectId(0),
            prev: None,
        })
    }

    fn collect_all(table: &ObjectTable) -> Vec<ObjectId> {
        let mut cursor = table.cursor();
        let mut seen = Vec::new();
        while let Some(id) = table.advance(&mut cursor) {
            seen.push(id);
        }
        seen
    }

    #[test]
    fn test_insert_lookup_remove() {
        let mut table = ObjectTable::new();
        table.insert(block(5));
        table.insert(block(6));
        assert_eq!(table.len(), 2);

        assert!(table.get(ObjectId(5)).is_some());
        assert!(table.remove(ObjectId(5)).is_some());
        assert!(table.get(ObjectId(5)).is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_insert_replaces_without_duplicating() {
        let mut table = ObjectTable::new();
        table.insert(block(5));
        table.insert(block(5));
        assert_eq!(table.len(), 1);
        assert_eq!(collect_all(&table).len(), 1);
    }

    #[test]
    fn test_cursor_visits_everything_once() {
        let mut table = ObjectTable::new();
        // Spread over several buckets, with collisions
        for id in [1u16, 2, 33, 34, 65, 100] {
            table.insert(block(id));
        }

        let mut seen = collect_all(&table);
        seen.sort();
        assert_eq!(seen, [1u16, 2, 33, 34, 65, 100].map(ObjectId).to_vec());
    }

    #[test]
    fn test_cursor_repair_on_pending_removal() {
        let mut table = ObjectTable::new();
        // Ids 1, 33, 65 share a bucket and iterate in insertion order.
        table.insert(block(1));
        table.insert(block(33));
        table.insert(block(65));

        let mut cursor = table.cursor();
        let first = table.advance(&mut cursor).unwrap();
        assert_eq!(first, ObjectId(1));
        assert_eq!(cursor.pending(), Some(ObjectId(33)));

        // Simulate collation deleting the entry the walk would visit next.
        table.remove_with_cursor(ObjectId(33), &mut cursor).unwrap();
        assert_eq!(cursor.pending(), Some(ObjectId(65)));

        let mut rest = Vec::new();
        while let Some(id) = table.advance(&mut cursor) {
            rest.push(id);
        }
        assert_eq!(rest, alloc::vec![ObjectId(65)]);
    }

    #[test]
    fn test_cursor_repair_at_bucket_end() {
        let mut table = ObjectTable::new();
        table.insert(block(1));
        table.insert(block(33));
        table.insert(block(2)); // next bucket

        let mut cursor = table.cursor();
        assert_eq!(table.advance(&mut cursor), Some(ObjectId(1)));

        // Pending entry is the bucket's last; repair leaves the cursor
        // to fall through to the next bucket lazily.
        table.remove_with_cursor(ObjectId(33), &mut cursor).unwrap();
        assert_eq!(cursor.pending(), None);
        assert_eq!(table.advance(&mut cursor), Some(ObjectId(2)));
        assert_eq!(table.advance(&mut cursor), None);
    }

    #[test]
    fn test_removal_of_unrelated_entry_leaves_cursor_alone() {
        let mut table = ObjectTable::new();
        table.insert(block(1));
        table.insert(block(33));
        table.insert(block(65));

        let mut cursor = table.cursor();
        assert_eq!(table.advance(&mut cursor), Some(ObjectId(1)));
        table.remove_with_cursor(ObjectId(65), &mut cursor).unwrap();
        assert_eq!(cursor.pending(), Some(ObjectId(33)));
        assert_eq!(table.advance(&mut cursor), Some(ObjectId(33)));
        assert_eq!(table.advance(&mut cursor), None);
    }
}
