//! Event types and the two forms of asynchrony the pager tolerates.
//!
//! Per the concurrency model, the pager is single-threaded and cooperative.
//! Asynchrony is limited to (1) POSIX signals, folded into a process-global
//! flags word, and (2) slow input on a pipe. This crate defines the flags
//! word, the event enum consumed by the command loop, and a small registry
//! for async event sources (terminal input, resize, tick) that feed a single
//! bounded channel.

use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

pub const EVENT_CHANNEL_CAP: usize = 4096;

bitflags::bitflags! {
    /// Bits OR-ed into the process-global signal word by the signal handler.
    /// The handler's only job is to set a bit (and, if a read is blocked in
    /// the kernel, wake it); all interpretation happens on the main thread.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Sigs: u32 {
        /// SIGINT: abort the current long-running scan, or quit if configured.
        const INTERRUPT   = 0b0000_0001;
        /// SIGWINCH: terminal size changed, requery and recompute geometry.
        const WINCH       = 0b0000_0010;
        /// SIGTSTP delivered: suspend — leave raw mode, re-raise on self.
        const STOP        = 0b0000_0100;
        /// Resumed from a previous STOP: re-enter raw mode, trash the screen.
        const CONT        = 0b0000_1000;
        /// SIGTERM/SIGHUP: terminate cleanly.
        const TERM        = 0b0001_0000;
    }
}

/// Process-global signal flags. The signal handler may only OR bits into
/// this; all other access happens from the command loop via [`SigFlags`].
pub static SIGS: AtomicU32 = AtomicU32::new(0);

/// Handle for reading and draining [`SIGS`] from the main thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SigFlags;

impl SigFlags {
    /// OR a bit into the flags word. Safe to call from a signal handler:
    /// touches nothing but a single atomic.
    pub fn raise(bits: Sigs) {
        SIGS.fetch_or(bits.bits(), Ordering::SeqCst);
    }

    /// Snapshot the current flags without clearing them.
    pub fn peek() -> Sigs {
        Sigs::from_bits_truncate(SIGS.load(Ordering::SeqCst))
    }

    /// Atomically read and clear the flags word. The command loop calls this
    /// once per checkpoint (`psignals`) and handles every bit that was set.
    pub fn drain() -> Sigs {
        Sigs::from_bits_truncate(SIGS.swap(0, Ordering::SeqCst))
    }

    /// True if any long-running scan should abandon its work and surface
    /// `READ_INTR` to its caller.
    pub fn interrupted() -> bool {
        Self::peek().contains(Sigs::INTERRUPT)
    }
}

/// Top-level event consumed by the command loop.
#[derive(Debug, Clone)]
pub enum Event {
    /// One raw input byte, as read from the terminal one byte at a time.
    Key(u8),
    /// Terminal resize to (columns, rows).
    Resize(u16, u16),
    /// A mouse report, already framed by the input source (X10 is 3 bytes
    /// after the introducer; SGR-1006 is variable-length up to `M`/`m`).
    Mouse(Vec<u8>),
    /// Periodic monotonic tick, used to expire ephemeral status messages.
    Tick,
    /// Asked to stop the event loop (quit command, or fatal error unwinding).
    Shutdown,
}

/// Trait implemented by any async event producer: terminal input, resize
/// watcher, tick timer. Each spawns one background task pushing `Event`s
/// into the shared channel, terminating when the channel closes.
pub trait AsyncEventSource: Send + 'static {
    fn name(&self) -> &'static str;
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

pub struct TickEventSource {
    interval: std::time::Duration,
}

impl TickEventSource {
    pub fn new(interval: std::time::Duration) -> Self {
        Self { interval }
    }
}

impl AsyncEventSource for TickEventSource {
    fn name(&self) -> &'static str {
        "tick"
    }
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let dur = self.interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(dur);
            loop {
                interval.tick().await;
                if tx.send(Event::Tick).await.is_err() {
                    break;
                }
            }
        })
    }
}

#[derive(Default)]
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    /// Spawn every registered source, returning their join handles. Callers
    /// should drop their own `Sender` before awaiting these on shutdown so
    /// sources observe the closed channel and exit cooperatively.
    pub fn spawn_all(&mut self, tx: &Sender<Event>) -> Vec<JoinHandle<()>> {
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::debug!(target: "events", source = name, "spawning event source");
            out.push(src.spawn(tx.clone()));
        }
        out
    }
}
