//! The adaptive sparse line-number cache: a bounded set of (byte position,
//! line number) checkpoints that let the pager answer "what line is this
//! byte on" without rescanning from the start of the file every time.
//!
//! Checkpoints are kept roughly evenly spaced rather than densely packed
//! near wherever the cursor happens to be: an entry 100 lines from its
//! neighbor is expensive to regenerate by forward-scanning, while one only
//! a line or two from its neighbor is nearly free to lose, since the scan to
//! reconstruct it is short. Eviction therefore removes whichever interior
//! entry spans the fewest lines from its neighbor, not the least recently
//! used one.
//!
//! The classic doubly-linked `linenum_info` chain is replaced here by a
//! plain `Vec` kept sorted by position, so there are no pointers to
//! invalidate on eviction — removal is a single `Vec::remove`.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub pos: u64,
    pub line: u64,
}

/// Forward line counting is abandoned once it has run this long without
/// reaching the target, so a huge file with no nearby checkpoint can't stall
/// the command loop indefinitely.
pub const SCAN_TIMEOUT: Duration = Duration::from_secs(2);

pub const DEFAULT_POOL_SIZE: usize = 200;

#[derive(Debug)]
pub struct LineNumCache {
    entries: Vec<Checkpoint>,
    pool_size: usize,
}

impl Default for LineNumCache {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

impl LineNumCache {
    pub fn new(pool_size: usize) -> Self {
        Self {
            entries: vec![Checkpoint { pos: 0, line: 1 }],
            pool_size: pool_size.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The best known checkpoint at or before `pos`: callers resume line
    /// counting by forward-scanning bytes from here rather than from 0.
    pub fn nearest_before(&self, pos: u64) -> Checkpoint {
        self.entries
            .iter()
            .rev()
            .find(|c| c.pos <= pos)
            .copied()
            .unwrap_or(Checkpoint { pos: 0, line: 1 })
    }

    /// The best known checkpoint at or after `pos`, for backward scans.
    pub fn nearest_after(&self, pos: u64) -> Option<Checkpoint> {
        self.entries.iter().find(|c| c.pos >= pos).copied()
    }

    /// The best known checkpoint at or before `line`, the line-indexed
    /// counterpart of `nearest_before` used by `find_position`.
    pub fn nearest_before_line(&self, line: u64) -> Checkpoint {
        self.entries
            .iter()
            .rev()
            .find(|c| c.line <= line)
            .copied()
            .unwrap_or(Checkpoint { pos: 0, line: 1 })
    }

    /// The best known checkpoint at or after `line`.
    pub fn nearest_after_line(&self, line: u64) -> Option<Checkpoint> {
        self.entries.iter().find(|c| c.line >= line).copied()
    }

    /// Record a newly derived checkpoint, evicting the cheapest-to-regenerate
    /// entry first if the pool is full.
    pub fn insert(&mut self, checkpoint: Checkpoint) {
        let idx = match self.entries.binary_search_by_key(&checkpoint.pos, |c| c.pos) {
            Ok(i) => {
                self.entries[i] = checkpoint;
                return;
            }
            Err(i) => i,
        };
        self.entries.insert(idx, checkpoint);
        if self.entries.len() > self.pool_size {
            self.evict_one();
        }
    }

    /// Drop every checkpoint at or after `pos`: the tail of the file changed
    /// (streaming input grew, or the pager was told to re-derive from here).
    pub fn truncate_from(&mut self, pos: u64) {
        self.entries.retain(|c| c.pos < pos);
        if self.entries.is_empty() {
            self.entries.push(Checkpoint { pos: 0, line: 1 });
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.entries.push(Checkpoint { pos: 0, line: 1 });
    }

    /// Remove whichever interior entry bridges the smallest byte-position
    /// interval between its neighbors (the span regenerating it would save a
    /// scan over). The first and last entries are never evicted: they anchor
    /// the cheapest "nearest" lookups at the extremes of the file.
    fn evict_one(&mut self) {
        if self.entries.len() < 3 {
            return;
        }
        let mut victim = 1;
        let mut smallest_gap = u64::MAX;
        for i in 1..self.entries.len() - 1 {
            let gap = self.entries[i + 1].pos - self.entries[i - 1].pos;
            if gap < smallest_gap {
                smallest_gap = gap;
                victim = i;
            }
        }
        self.entries.remove(victim);
    }
}

/// Deadline helper for bounding a forward line-counting scan.
pub struct ScanDeadline {
    started: Instant,
}

impl ScanDeadline {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn expired(&self) -> bool {
        self.started.elapsed() >= SCAN_TIMEOUT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_before_falls_back_to_origin() {
        let cache = LineNumCache::new(10);
        let cp = cache.nearest_before(500);
        assert_eq!(cp, Checkpoint { pos: 0, line: 1 });
    }

    #[test]
    fn insert_then_nearest_before_finds_closest_not_past() {
        let mut cache = LineNumCache::new(10);
        cache.insert(Checkpoint { pos: 1000, line: 50 });
        cache.insert(Checkpoint { pos: 2000, line: 100 });
        assert_eq!(cache.nearest_before(1500), Checkpoint { pos: 1000, line: 50 });
        assert_eq!(cache.nearest_before(2500), Checkpoint { pos: 2000, line: 100 });
        assert_eq!(cache.nearest_before(500), Checkpoint { pos: 0, line: 1 });
    }

    #[test]
    fn eviction_prefers_tightly_spaced_entries_over_sparse_ones() {
        let mut cache = LineNumCache::new(4);
        cache.insert(Checkpoint { pos: 100, line: 100 });
        cache.insert(Checkpoint { pos: 10_000, line: 10_000 });
        // Tight cluster near pos 100: evicting one of these costs little.
        cache.insert(Checkpoint { pos: 101, line: 101 });
        assert_eq!(cache.len(), 4);
        cache.insert(Checkpoint { pos: 5000, line: 5000 });
        // The pool overflowed; one entry from the tight cluster (pos 100/101,
        // a bracketing gap of 101 bytes) should have been evicted before the
        // widely spaced ones (gaps in the thousands).
        assert!(!cache.entries.iter().any(|c| c.line == 100));
        assert!(cache.entries.iter().any(|c| c.line == 101));
        assert!(cache.entries.iter().any(|c| c.line == 10_000));
    }

    #[test]
    fn eviction_gap_is_byte_distance_not_line_distance() {
        // Lines are sparse across a tight byte range, and dense across a
        // wide one: the line-number distance would pick the wrong victim,
        // but the byte-position bracket is what actually bounds a rescan.
        let mut cache = LineNumCache::new(4);
        cache.insert(Checkpoint { pos: 1_000, line: 2 });
        cache.insert(Checkpoint { pos: 2_000, line: 1_000_000 });
        cache.insert(Checkpoint { pos: 1_100, line: 3 });
        assert_eq!(cache.len(), 4);
        cache.insert(Checkpoint { pos: 50_000, line: 2_000_000 });
        // entry at pos 1100 brackets a 1000-byte gap (between 1000 and
        // 2000); entry at pos 2000 brackets a 48900-byte gap (between 1100
        // and 50000). The 1100 entry is the cheaper one to evict.
        assert!(!cache.entries.iter().any(|c| c.pos == 1_100));
        assert!(cache.entries.iter().any(|c| c.pos == 2_000));
    }

    #[test]
    fn truncate_from_drops_tail_checkpoints() {
        let mut cache = LineNumCache::new(10);
        cache.insert(Checkpoint { pos: 1000, line: 50 });
        cache.insert(Checkpoint { pos: 2000, line: 100 });
        cache.truncate_from(1500);
        assert_eq!(cache.nearest_before(u64::MAX), Checkpoint { pos: 1000, line: 50 });
    }

    #[test]
    fn scan_deadline_expires_after_timeout() {
        let deadline = ScanDeadline::start();
        assert!(!deadline.expired());
    }
}
