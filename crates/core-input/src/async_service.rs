use crate::key_token::{key_event_bytes, mouse_event_bytes};
use core_events::Event;
use crossterm::event::{Event as CEvent, EventStream};
use std::sync::Arc;
use tokio::sync::{Notify, mpsc::Sender};
use tokio::task;
use tokio_stream::StreamExt;
use tracing::{debug, info, trace, warn};

#[derive(Clone, Debug)]
pub struct AsyncInputShutdown {
    notify: Arc<Notify>,
}

impl AsyncInputShutdown {
    pub fn signal(&self) {
        self.notify.notify_one();
    }
}

#[derive(Clone, Debug)]
struct ShutdownListener {
    notify: Arc<Notify>,
}

impl ShutdownListener {
    fn new_pair() -> (AsyncInputShutdown, Self) {
        let notify = Arc::new(Notify::new());
        (
            AsyncInputShutdown {
                notify: notify.clone(),
            },
            ShutdownListener { notify },
        )
    }

    async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// Spawn a Tokio task that decodes crossterm's structured event stream back
/// into the raw bytes the command dispatcher consumes, one key at a time.
pub(crate) fn spawn_async_event_task(
    sender: Sender<Event>,
) -> (task::JoinHandle<()>, AsyncInputShutdown) {
    let (shutdown, listener) = ShutdownListener::new_pair();
    let handle = task::spawn(async move {
        let span = tracing::debug_span!(target: "input.thread", "input_async_task");
        let _enter = span.enter();
        let stream = EventStream::new();
        AsyncEventStreamTask::new(sender, stream, listener)
            .run()
            .await;
    });
    (handle, shutdown)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExitReason {
    Running,
    ShutdownSignal,
    ChannelClosed,
    StreamEnded,
    StreamError,
}

impl ExitReason {
    fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Running => "running",
            ExitReason::ShutdownSignal => "shutdown_signal",
            ExitReason::ChannelClosed => "channel_closed",
            ExitReason::StreamEnded => "stream_ended",
            ExitReason::StreamError => "stream_error",
        }
    }
}

struct AsyncEventStreamTask<S>
where
    S: tokio_stream::Stream<Item = std::io::Result<CEvent>> + Send + Unpin + 'static,
{
    sender: Sender<Event>,
    stream: S,
    shutdown: ShutdownListener,
    exit_reason: ExitReason,
}

impl<S> AsyncEventStreamTask<S>
where
    S: tokio_stream::Stream<Item = std::io::Result<CEvent>> + Send + Unpin + 'static,
{
    fn new(sender: Sender<Event>, stream: S, shutdown: ShutdownListener) -> Self {
        Self {
            sender,
            stream,
            shutdown,
            exit_reason: ExitReason::Running,
        }
    }

    async fn run(mut self) {
        info!(target: "input.thread", "async_input_task_started");
        self.exit_reason = ExitReason::StreamEnded;
        loop {
            let maybe_result = tokio::select! {
                biased;
                _ = self.shutdown.wait() => {
                    self.exit_reason = ExitReason::ShutdownSignal;
                    break;
                }
                result = self.stream.next() => result,
            };

            let Some(result) = maybe_result else { break };

            match result {
                Ok(CEvent::Key(key)) => {
                    for b in key_event_bytes(&key) {
                        if !self.send_event(Event::Key(b)).await {
                            return;
                        }
                    }
                }
                Ok(CEvent::Resize(w, h)) => {
                    trace!(target: "input.event", w, h, "resize");
                    if !self.send_event(Event::Resize(w, h)).await {
                        return;
                    }
                }
                Ok(CEvent::Mouse(mouse)) => {
                    let bytes = mouse_event_bytes(&mouse);
                    if !self.send_event(Event::Mouse(bytes)).await {
                        return;
                    }
                }
                Ok(_other) => {}
                Err(err) => {
                    self.exit_reason = ExitReason::StreamError;
                    warn!(target: "input.thread", error_kind = ?err.kind(), "async_input_task_stream_error");
                    break;
                }
            }
        }

        let reason = match self.exit_reason {
            ExitReason::Running => ExitReason::StreamEnded,
            other => other,
        };
        debug!(target: "input.thread", reason = reason.as_str(), "async_input_task_stopped");
    }

    async fn send_event(&mut self, event: Event) -> bool {
        match self.sender.send(event).await {
            Ok(()) => true,
            Err(_) => {
                if !matches!(self.exit_reason, ExitReason::ShutdownSignal) {
                    self.exit_reason = ExitReason::ChannelClosed;
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use tokio::sync::mpsc;
    use tokio::time::{Duration, timeout};

    async fn run_scenario(events: Vec<CEvent>) -> Vec<Event> {
        let (tx, mut rx) = mpsc::channel(64);
        let stream = tokio_stream::iter(events.into_iter().map(Ok));
        let (_shutdown, listener) = ShutdownListener::new_pair();
        AsyncEventStreamTask::new(tx, stream, listener).run().await;
        let mut out = Vec::new();
        while let Some(ev) = rx.recv().await {
            out.push(ev);
        }
        out
    }

    #[tokio::test]
    async fn forwards_plain_key_as_one_byte() {
        let outputs = run_scenario(vec![CEvent::Key(KeyEvent::new(
            KeyCode::Char('q'),
            KeyModifiers::NONE,
        ))])
        .await;
        assert!(matches!(outputs.as_slice(), [Event::Key(b'q')]));
    }

    #[tokio::test]
    async fn forwards_resize_event() {
        let outputs = run_scenario(vec![CEvent::Resize(80, 24)]).await;
        assert!(matches!(outputs.as_slice(), [Event::Resize(80, 24)]));
    }

    #[tokio::test]
    async fn shutdown_signal_exits_immediately() {
        let (tx, mut rx) = mpsc::channel(1);
        let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel::<std::io::Result<CEvent>>();
        let stream = tokio_stream::wrappers::UnboundedReceiverStream::new(event_rx);
        let (shutdown, listener) = ShutdownListener::new_pair();

        let task = tokio::spawn(async move {
            let _keep_alive = event_tx;
            AsyncEventStreamTask::new(tx, stream, listener).run().await;
        });
        shutdown.signal();
        timeout(Duration::from_millis(50), task)
            .await
            .expect("shutdown should resolve promptly")
            .expect("task join failed");
        assert!(rx.recv().await.is_none());
    }
}
