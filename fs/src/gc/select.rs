//! Source area selection.

use crate::core::types::Area;

/// Pick the area the next cycle should harvest.
///
/// Largest area wins; among equal sizes the one with the oldest
/// `gc_seq` wins, compared by signed subtraction so the tie-break stays
/// fair across counter wraparound. The scratch area is never a
/// candidate.
pub(crate) fn select_source(areas: &[Area], scratch_idx: usize) -> usize {
    let mut best = 0;
    for idx in 1..areas.len() {
        if idx == scratch_idx {
            continue;
        }
        let area = &areas[idx];
        if area.length > areas[best].length {
            best = idx;
        } else if best == scratch_idx {
            // Area 0 was the scratch; take the first real candidate.
            best = idx;
        } else if (area.gc_seq.wrapping_sub(areas[best].gc_seq) as i8) < 0 {
            best = idx;
        }
    }

    debug_assert_ne!(best, scratch_idx);
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::AREA_ID_NONE;

    fn area(id: u16, length: u32, gc_seq: u8) -> Area {
        let mut area = Area::new(0, length, id);
        area.gc_seq = gc_seq;
        area
    }

    fn scratch(length: u32) -> Area {
        area(AREA_ID_NONE, length, 0)
    }

    #[test]
    fn test_largest_area_wins() {
        let areas = [area(0, 1024, 0), area(1, 4096, 9), scratch(4096)];
        assert_eq!(select_source(&areas, 2), 1);
    }

    #[test]
    fn test_equal_sizes_prefer_oldest_gc_seq() {
        let areas = [area(0, 1024, 5), area(1, 1024, 3), scratch(1024)];
        assert_eq!(select_source(&areas, 2), 1);

        let areas = [area(0, 1024, 3), area(1, 1024, 5), scratch(1024)];
        assert_eq!(select_source(&areas, 2), 0);
    }

    #[test]
    fn test_gc_seq_wraparound() {
        // 250 wrapped to 5: the area still at 250 is the older one.
        let areas = [area(0, 1024, 5), area(1, 1024, 250), scratch(1024)];
        assert_eq!(select_source(&areas, 2), 1);
    }

    #[test]
    fn test_scratch_first_slot_is_skipped() {
        let areas = [scratch(8192), area(0, 1024, 0), area(1, 1024, 1)];
        assert_eq!(select_source(&areas, 0), 1);
    }

    #[test]
    fn test_never_returns_scratch_randomized() {
        // Cheap deterministic xorshift; no RNG crate in the stack.
        let mut state = 0x2545_F491u32;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        };

        for _ in 0..500 {
            let count = 2 + (next() as usize % 6);
            let scratch_idx = next() as usize % count;
            let mut areas = alloc::vec::Vec::new();
            for idx in 0..count {
                let id = if idx == scratch_idx { AREA_ID_NONE } else { idx as u16 };
                areas.push(area(id, 512 + (next() % 4) * 512, next() as u8));
            }
            assert_ne!(select_source(&areas, scratch_idx), scratch_idx);
        }
    }
}
