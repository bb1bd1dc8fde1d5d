//! The block-cached character source.
//!
//! The classic doubly-linked `bufnode` chain
//! with a sentinel is replaced by a vector pool of slots indexed by `u32`,
//! two `prev`/`next` fields per slot for the LRU list, and per-bucket `u32`
//! heads for the hash table. No heap links escape a `FileState`.

use crate::error::{CacheError, CacheResult};
use crate::source::{RawInput, SourceFlags};
use core_events::{SigFlags, Sigs};
use std::time::Duration;

pub const BLOCK_SIZE: usize = 8192;
pub const HASH_SIZE: usize = 1024;
const HASH_MASK: u64 = (HASH_SIZE as u64) - 1;
const NIL: u32 = u32::MAX;

struct BufSlot {
    block: Option<u64>,
    datasize: u32,
    data: Box<[u8; BLOCK_SIZE]>,
    prev: u32,
    next: u32,
    hprev: u32,
    hnext: u32,
}

impl BufSlot {
    fn empty() -> Self {
        Self {
            block: None,
            datasize: 0,
            data: Box::new([0u8; BLOCK_SIZE]),
            prev: NIL,
            next: NIL,
            hprev: NIL,
            hnext: NIL,
        }
    }
}

/// Result of a byte fetch: a real byte, or end of currently-known stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetOutcome {
    Byte(u8),
    End,
}

/// Outcome of a refill/seek attempt on a pipe where the kernel position
/// can't be reached: that's fatal to the read but must not abort the
/// pager, so it surfaces as the literal byte `'?'`.
const PIPE_SEEK_FATAL_BYTE: u8 = b'?';

struct CacheDirectory {
    slots: Vec<BufSlot>,
    lru_head: u32,
    lru_tail: u32,
    hash_heads: [u32; HASH_SIZE],
    max_buffers: usize,
    auto_buffer: bool,
}

impl CacheDirectory {
    fn new(max_buffers: usize) -> Self {
        Self {
            slots: Vec::new(),
            lru_head: NIL,
            lru_tail: NIL,
            hash_heads: [NIL; HASH_SIZE],
            max_buffers,
            auto_buffer: true,
        }
    }

    fn bucket(block: u64) -> usize {
        (block & HASH_MASK) as usize
    }

    fn unlink_lru(&mut self, idx: u32) {
        let (prev, next) = (self.slots[idx as usize].prev, self.slots[idx as usize].next);
        if prev != NIL {
            self.slots[prev as usize].next = next;
        } else {
            self.lru_head = next;
        }
        if next != NIL {
            self.slots[next as usize].prev = prev;
        } else {
            self.lru_tail = prev;
        }
        self.slots[idx as usize].prev = NIL;
        self.slots[idx as usize].next = NIL;
    }

    fn push_lru_head(&mut self, idx: u32) {
        self.slots[idx as usize].prev = NIL;
        self.slots[idx as usize].next = self.lru_head;
        if self.lru_head != NIL {
            self.slots[self.lru_head as usize].prev = idx;
        }
        self.lru_head = idx;
        if self.lru_tail == NIL {
            self.lru_tail = idx;
        }
    }

    fn touch(&mut self, idx: u32) {
        if self.lru_head == idx {
            return;
        }
        self.unlink_lru(idx);
        self.push_lru_head(idx);
    }

    fn unlink_hash(&mut self, idx: u32) {
        let slot = &self.slots[idx as usize];
        let Some(block) = slot.block else { return };
        let (hprev, hnext) = (slot.hprev, slot.hnext);
        if hprev != NIL {
            self.slots[hprev as usize].hnext = hnext;
        } else {
            self.hash_heads[Self::bucket(block)] = hnext;
        }
        if hnext != NIL {
            self.slots[hnext as usize].hprev = hprev;
        }
        self.slots[idx as usize].hprev = NIL;
        self.slots[idx as usize].hnext = NIL;
    }

    fn insert_hash(&mut self, idx: u32, block: u64) {
        let bucket = Self::bucket(block);
        let old_head = self.hash_heads[bucket];
        self.slots[idx as usize].hnext = old_head;
        self.slots[idx as usize].hprev = NIL;
        if old_head != NIL {
            self.slots[old_head as usize].hprev = idx;
        }
        self.hash_heads[bucket] = idx;
    }

    fn find(&self, block: u64) -> Option<u32> {
        // Fast path: LRU head is checked first without walking the bucket.
        if self.lru_head != NIL && self.slots[self.lru_head as usize].block == Some(block) {
            return Some(self.lru_head);
        }
        let mut cur = self.hash_heads[Self::bucket(block)];
        while cur != NIL {
            if self.slots[cur as usize].block == Some(block) {
                return Some(cur);
            }
            cur = self.slots[cur as usize].hnext;
        }
        None
    }

    /// Select the slot that will hold `block`: reuse an existing hit, grow
    /// the pool, or evict the LRU tail, in that order.
    fn acquire(&mut self, block: u64) -> u32 {
        if let Some(idx) = self.find(block) {
            self.touch(idx);
            return idx;
        }
        let should_grow = self.slots.len() < self.max_buffers
            || (self.auto_buffer && self.slots.is_empty());
        let idx = if should_grow {
            self.slots.push(BufSlot::empty());
            let idx = (self.slots.len() - 1) as u32;
            self.push_lru_head(idx);
            idx
        } else {
            let idx = self.lru_tail;
            self.unlink_lru(idx);
            self.unlink_hash(idx);
            self.push_lru_head(idx);
            idx
        };
        self.slots[idx as usize].block = Some(block);
        self.slots[idx as usize].datasize = 0;
        self.insert_hash(idx, block);
        idx
    }

    fn disable_auto_buffer(&mut self) {
        self.auto_buffer = false;
    }

    fn lowest_buffered_block(&self) -> Option<u64> {
        self.slots.iter().filter_map(|s| s.block).min()
    }

    fn highest_buffered_end(&self) -> Option<u64> {
        self.slots
            .iter()
            .filter_map(|s| s.block.map(|b| b * BLOCK_SIZE as u64 + s.datasize as u64))
            .max()
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.lru_head = NIL;
        self.lru_tail = NIL;
        self.hash_heads = [NIL; HASH_SIZE];
        self.auto_buffer = true;
    }
}

/// Per-open-stream state: the character source proper.
pub struct FileState {
    input: Box<dyn RawInput>,
    flags: SourceFlags,
    fpos: u64,
    fsize: Option<u64>,
    cur_pos: u64,
    dir: CacheDirectory,
    unget: Option<u8>,
    ignore_eoi: bool,
    eof_pinned: bool,
}

impl FileState {
    pub fn new(input: Box<dyn RawInput>, flags: SourceFlags, max_buffers: usize) -> Self {
        let fsize = input.stat_len().ok().flatten();
        Self {
            input,
            flags,
            fpos: 0,
            fsize,
            cur_pos: 0,
            dir: CacheDirectory::new(max_buffers),
            unget: None,
            ignore_eoi: false,
            eof_pinned: false,
        }
    }

    pub fn set_ignore_eoi(&mut self, v: bool) {
        self.ignore_eoi = v;
    }

    pub fn is_seekable(&self) -> bool {
        self.flags.can_seek
    }

    pub fn length(&self) -> Option<u64> {
        self.fsize
    }

    pub fn set_eof(&mut self) {
        self.fsize = Some(self.cur_pos);
        self.eof_pinned = true;
    }

    pub fn unget(&mut self, byte: u8) {
        self.unget = Some(byte);
    }

    pub fn tell(&self) -> u64 {
        self.cur_pos
    }

    /// Move the read cursor without fetching data yet (lazy refill on next
    /// `get`/`forward_get`).
    pub fn seek(&mut self, pos: u64) -> CacheResult<()> {
        if self.flags.can_seek {
            self.cur_pos = pos;
            return Ok(());
        }
        // Pipe: succeed iff the target block is already buffered, or lies
        // at/after the current position (read forward to reach it).
        let block = (pos / BLOCK_SIZE as u64) as u64;
        if self.dir.find(block).is_some() || pos >= self.fpos.saturating_sub(self.fpos % BLOCK_SIZE as u64) {
            self.cur_pos = pos;
            Ok(())
        } else {
            Err(CacheError::SeekOnPipe)
        }
    }

    pub fn beg_seek(&mut self) -> CacheResult<()> {
        let target = self.dir.lowest_buffered_block().unwrap_or(0) * BLOCK_SIZE as u64;
        self.cur_pos = target;
        Ok(())
    }

    pub fn end_buffer_seek(&mut self) -> CacheResult<()> {
        let target = self.dir.highest_buffered_end().unwrap_or(0);
        self.cur_pos = target;
        Ok(())
    }

    pub fn end_seek(&mut self) -> CacheResult<()> {
        let target = self.fsize.unwrap_or(self.fpos);
        self.cur_pos = target;
        Ok(())
    }

    pub fn flush(&mut self) -> CacheResult<()> {
        if self.flags.can_seek {
            self.dir.clear();
            let stat_len = self.input.stat_len()?;
            // A zero-size stat on a "seekable" descriptor is reinterpreted as
            // unseekable: a workaround for synthetic filesystem entries that
            // report zero length but aren't truly seekable.
            if stat_len == Some(0) {
                self.flags.can_seek = false;
                self.fsize = None;
            } else {
                self.fsize = stat_len;
            }
        } else {
            self.fsize = None;
        }
        Ok(())
    }

    pub fn close(&mut self) {
        if !self.flags.keep_open {
            self.dir.clear();
        }
    }

    /// Fetch the byte at an absolute file position, refilling as needed.
    pub fn get(&mut self, pos: u64) -> CacheResult<GetOutcome> {
        let block = pos / BLOCK_SIZE as u64;
        let offset = (pos % BLOCK_SIZE as u64) as u32;
        self.get_at_block(block, offset)
    }

    pub fn forward_get(&mut self) -> CacheResult<GetOutcome> {
        let result = self.get(self.cur_pos)?;
        if matches!(result, GetOutcome::Byte(_)) {
            self.cur_pos += 1;
        }
        Ok(result)
    }

    pub fn backward_get(&mut self) -> CacheResult<GetOutcome> {
        if self.cur_pos == 0 {
            return Ok(GetOutcome::End);
        }
        let target = self.cur_pos - 1;
        let block = target / BLOCK_SIZE as u64;
        // Pipes can't re-read data that scrolled out of the buffer pool.
        if !self.flags.can_seek && self.dir.find(block).is_none() {
            return Ok(GetOutcome::End);
        }
        let result = self.get(target)?;
        if let GetOutcome::Byte(b) = result {
            self.cur_pos = target;
            return Ok(GetOutcome::Byte(b));
        }
        Ok(GetOutcome::End)
    }

    fn get_at_block(&mut self, block: u64, offset: u32) -> CacheResult<GetOutcome> {
        loop {
            if let Some(idx) = self.dir.find(block) {
                self.dir.touch(idx);
                let slot = &self.dir.slots[idx as usize];
                if offset < slot.datasize {
                    return Ok(GetOutcome::Byte(slot.data[offset as usize]));
                }
                // Block is loaded but short; only the block at end-of-stream
                // may still grow, so attempt one refill pass.
            }
            match self.refill(block)? {
                RefillOutcome::Filled => continue,
                RefillOutcome::End => return Ok(GetOutcome::End),
                RefillOutcome::PipeSeekFatal => return Ok(GetOutcome::Byte(PIPE_SEEK_FATAL_BYTE)),
            }
        }
    }

    /// The refill algorithm: acquire a slot for `block`, seek the
    /// kernel position if needed, and read up to a full block's worth.
    fn refill(&mut self, block: u64) -> CacheResult<RefillOutcome> {
        let target_pos = block * BLOCK_SIZE as u64;

        let idx = self.dir.acquire(block);
        let already = self.dir.slots[idx as usize].datasize;
        if already as usize >= BLOCK_SIZE {
            return Ok(RefillOutcome::Filled);
        }

        let read_pos = target_pos + already as u64;
        if self.fpos != read_pos {
            if self.flags.can_seek {
                if self.input.seek_to(read_pos).is_err() {
                    return Err(CacheError::Io(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        "seek failed on seekable source",
                    )));
                }
                self.fpos = read_pos;
            } else {
                // A seek on a pipe is fatal but must not abort the pager.
                return Ok(RefillOutcome::PipeSeekFatal);
            }
        }

        if let Some(b) = self.unget.take() {
            let slot = &mut self.dir.slots[idx as usize];
            slot.data[slot.datasize as usize] = b;
            slot.datasize += 1;
            self.fpos += 1;
            return Ok(RefillOutcome::Filled);
        }

        loop {
            if SigFlags::interrupted() {
                return Err(CacheError::Interrupted);
            }
            let slot = &mut self.dir.slots[idx as usize];
            let want = BLOCK_SIZE - slot.datasize as usize;
            let mut tmp = vec![0u8; want];
            let n = match self.input.read(&mut tmp) {
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                    return Err(CacheError::Interrupted);
                }
                Err(e) => return Err(CacheError::Io(e)),
            };
            if n > 0 {
                let slot = &mut self.dir.slots[idx as usize];
                let start = slot.datasize as usize;
                slot.data[start..start + n].copy_from_slice(&tmp[..n]);
                slot.datasize += n as u32;
                self.fpos += n as u64;
                return Ok(RefillOutcome::Filled);
            }

            // Zero-byte read: we've reached the end of currently available data.
            if !self.eof_pinned {
                self.fsize = Some(self.fpos);
            }
            if self.ignore_eoi {
                std::thread::sleep(Duration::from_millis(200));
                if SigFlags::peek().contains(Sigs::INTERRUPT) {
                    return Err(CacheError::Interrupted);
                }
                continue;
            }
            return Ok(RefillOutcome::End);
        }
    }

    /// Allocation failure hook: permanently disables auto-buffering for this
    /// stream: a failed allocation turns auto-buffering off
    /// permanently"). Exposed for callers that track process-wide memory
    /// pressure outside this crate's allocator.
    pub fn disable_auto_buffer(&mut self) {
        self.dir.disable_auto_buffer();
    }
}

enum RefillOutcome {
    Filled,
    End,
    PipeSeekFatal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FileInput, PipeInput};
    use std::io::{Cursor, Write};

    fn seekable_fixture(content: &[u8]) -> FileState {
        let mut f = tempfile::tempfile().unwrap();
        f.write_all(content).unwrap();
        let flags = SourceFlags {
            can_seek: true,
            ..Default::default()
        };
        FileState::new(Box::new(FileInput::new(f)), flags, 64)
    }

    fn pipe_fixture(content: Vec<u8>) -> FileState {
        let flags = SourceFlags::default();
        FileState::new(Box::new(PipeInput::new(Box::new(Cursor::new(content)))), flags, 8)
    }

    #[test]
    fn get_is_idempotent_over_stable_prefix() {
        let mut fs = seekable_fixture(b"hello world");
        let a = fs.get(1).unwrap();
        fs.seek(9).unwrap();
        let _ = fs.get(9).unwrap();
        let b = fs.get(1).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, GetOutcome::Byte(b'e'));
    }

    #[test]
    fn forward_get_walks_whole_stream() {
        let mut fs = seekable_fixture(b"abc");
        let mut out = Vec::new();
        loop {
            match fs.forward_get().unwrap() {
                GetOutcome::Byte(b) => out.push(b),
                GetOutcome::End => break,
            }
        }
        assert_eq!(out, b"abc");
    }

    #[test]
    fn backward_get_fails_at_zero() {
        let mut fs = seekable_fixture(b"abc");
        assert_eq!(fs.backward_get().unwrap(), GetOutcome::End);
    }

    #[test]
    fn backward_get_reverses_forward_get() {
        let mut fs = seekable_fixture(b"abc");
        fs.forward_get().unwrap();
        fs.forward_get().unwrap();
        assert_eq!(fs.tell(), 2);
        assert_eq!(fs.backward_get().unwrap(), GetOutcome::Byte(b'b'));
        assert_eq!(fs.tell(), 1);
    }

    #[test]
    fn pipe_seek_within_cache_scenario() {
        // Scenario (d): consume 30 KiB forward, seek(16384) hits a still
        // buffered block; seek(0) may fail once block 0 scrolls out, in
        // which case beg_seek recovers the oldest buffered block.
        let content = vec![b'x'; 30 * 1024];
        let mut fs = pipe_fixture(content);
        for _ in 0..30 * 1024 {
            fs.forward_get().unwrap();
        }
        assert!(fs.seek(16384).is_ok());
        if fs.seek(0).is_err() {
            fs.beg_seek().unwrap();
            assert!(fs.tell() > 0);
        }
    }

    #[test]
    fn zero_size_seekable_is_reinterpreted_as_unseekable_on_flush() {
        let mut fs = seekable_fixture(b"");
        // Force stat_len to report 0 by truncating: our fixture already is
        // empty, so flush should flip can_seek off.
        fs.flush().unwrap();
        assert!(!fs.is_seekable());
    }

    #[test]
    fn unget_byte_wins_over_kernel_read() {
        let mut fs = seekable_fixture(b"abc");
        fs.unget(b'Z');
        assert_eq!(fs.forward_get().unwrap(), GetOutcome::Byte(b'Z'));
        assert_eq!(fs.forward_get().unwrap(), GetOutcome::Byte(b'a'));
    }

    #[test]
    fn set_eof_pins_length_to_current_position() {
        let mut fs = seekable_fixture(b"abcdef");
        fs.forward_get().unwrap();
        fs.forward_get().unwrap();
        fs.set_eof();
        assert_eq!(fs.length(), Some(2));
    }
}
