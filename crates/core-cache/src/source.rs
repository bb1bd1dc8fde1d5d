//! The kernel-facing half of the character source: a small trait abstracting
//! over regular files, pipes, and static "help" content, so the block cache
//! doesn't care which kind of stream it's refilling from.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

/// What `init()` probed or was told about this stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceFlags {
    pub can_seek: bool,
    pub keep_open: bool,
    pub popened: bool,
    pub help: bool,
}

pub trait RawInput: Send {
    /// Read up to `buf.len()` bytes at the current kernel position, advancing
    /// it. Short reads are normal (end of currently-available data).
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// Reposition the kernel read cursor. Only ever called when `can_seek`.
    fn seek_to(&mut self, pos: u64) -> io::Result<()>;
    /// `fstat`-equivalent size, if the source can report one.
    fn stat_len(&self) -> io::Result<Option<u64>>;
}

pub struct FileInput {
    file: File,
}

impl FileInput {
    pub fn new(file: File) -> Self {
        Self { file }
    }
}

impl RawInput for FileInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
    fn seek_to(&mut self, pos: u64) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(pos))?;
        Ok(())
    }
    fn stat_len(&self) -> io::Result<Option<u64>> {
        let meta = self.file.metadata()?;
        Ok(Some(meta.len()))
    }
}

/// A one-directional stream (pipe, popen'd process, stdin). `seek_to` always
/// fails: the caller (block cache) treats that as the pipe-seek-fatal case
/// never surfacing it as a hard error.
pub struct PipeInput {
    reader: Box<dyn Read + Send>,
}

impl PipeInput {
    pub fn new(reader: Box<dyn Read + Send>) -> Self {
        Self { reader }
    }
}

impl RawInput for PipeInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
    fn seek_to(&mut self, _pos: u64) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "pipe is not seekable"))
    }
    fn stat_len(&self) -> io::Result<Option<u64>> {
        Ok(None)
    }
}

/// Static in-memory content addressed like a file (used for built-in help
/// a static byte array addressed like a file").
pub struct StaticInput {
    data: &'static [u8],
    pos: usize,
}

impl StaticInput {
    pub fn new(data: &'static [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl RawInput for StaticInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.data[self.pos.min(self.data.len())..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
    fn seek_to(&mut self, pos: u64) -> io::Result<()> {
        self.pos = (pos as usize).min(self.data.len());
        Ok(())
    }
    fn stat_len(&self) -> io::Result<Option<u64>> {
        Ok(Some(self.data.len() as u64))
    }
}
