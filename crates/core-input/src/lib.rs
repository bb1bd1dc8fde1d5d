//! Async input service: decodes terminal events into the byte stream the
//! command dispatcher consumes, and folds POSIX signals into the
//! process-global flags word.

mod async_service;
mod key_token;
pub mod signals;

pub use async_service::AsyncInputShutdown;
pub use key_token::{key_event_bytes, mouse_event_bytes};

use async_service::spawn_async_event_task;
use core_events::Event;
use tokio::task::JoinHandle;

/// Spawn the async input service backed by `crossterm::EventStream`, along
/// with a shutdown handle that requests immediate termination.
pub fn spawn_async_input(
    sender: tokio::sync::mpsc::Sender<Event>,
) -> (JoinHandle<()>, AsyncInputShutdown) {
    spawn_async_event_task(sender)
}
