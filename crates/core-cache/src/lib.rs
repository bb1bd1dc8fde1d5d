//! The byte-level foundation of the pager: a block-cached view over an
//! arbitrary input stream (regular file, pipe, or static help text), the
//! list of every file the pager has visited, the marks pointing into them,
//! and the `LESSOPEN`/`LESSCLOSE` preprocessor protocol that decides what
//! actually gets opened for a given name.

mod altfile;
mod cache;
mod error;
mod ifile;
mod marks;
pub mod source;

pub use altfile::{OpenAction, close as altfile_close, open as altfile_open};
pub use cache::{BLOCK_SIZE, FileState, GetOutcome, HASH_SIZE};
pub use error::{CacheError, CacheResult};
pub use ifile::{FileId, IfileEntry, IfileList};
pub use marks::{MarkPosition, MarkTable, PREVIOUS_MARK};
pub use source::{FileInput, PipeInput, RawInput, SourceFlags, StaticInput};
