/// Failure kinds the block cache surfaces. Input errors are
/// abandoned operations (status-line message + `END`/`NONE` to the caller),
/// never a panic.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("i/o error reading input: {0}")]
    Io(#[from] std::io::Error),
    #[error("seek failed on unseekable source")]
    SeekOnPipe,
    #[error("read interrupted by signal")]
    Interrupted,
}

pub type CacheResult<T> = Result<T, CacheError>;
