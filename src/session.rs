use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::Local;

use crate::backend::{EventSink, Listener, ListenerKind, NotificationSource, SessionMessage};
use crate::console::Console;
use crate::error::{ProbeError, Result};
use crate::events::ProbeEvent;
use crate::filter::EventFilter;

/// Number of accepted events in one session.
#[derive(Debug, Clone, Default)]
pub struct EventCounter(Arc<AtomicUsize>);

impl EventCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumps the count and returns the new value, which doubles as the
    /// event's sequence number.
    pub fn increment(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Filters, counts and prints the events of one session.
pub struct EventRecorder {
    filter: EventFilter,
    counter: EventCounter,
    console: Console,
    color: bool,
}

impl EventRecorder {
    pub fn new(counter: EventCounter, console: Console, color: bool) -> Self {
        Self {
            filter: EventFilter::new(),
            counter,
            console,
            color,
        }
    }

    /// Returns the sequence number assigned to the event, or `None` when filtered.
    pub fn record(&self, event: &ProbeEvent) -> Option<usize> {
        if let Err(reason) = self.filter.check(event) {
            tracing::trace!("Filtered {:?} ({:?})", event.path, reason);
            return None;
        }

        let seq = self.counter.increment();
        let timestamp = Local::now().format("%H:%M:%S").to_string();
        self.console
            .line(format_event_line(seq, &timestamp, event, self.color));
        Some(seq)
    }
}

pub fn format_event_line(seq: usize, timestamp: &str, event: &ProbeEvent, color: bool) -> String {
    let label = event.category.label();
    if color {
        format!(
            "[{}] #{} {}{}\x1b[0m: {}",
            timestamp,
            seq,
            event.category.ansi_color(),
            label,
            event.path.display()
        )
    } else {
        format!("[{}] #{} {}: {}", timestamp, seq, label, event.path.display())
    }
}

/// One listening run against a directory, from start until an explicit stop.
pub struct Session {
    kind: ListenerKind,
    root: PathBuf,
    listener: Box<dyn Listener>,
    tx: Sender<SessionMessage>,
    worker: JoinHandle<Result<()>>,
    counter: EventCounter,
}

impl Session {
    pub fn start(
        source: &dyn NotificationSource,
        kind: ListenerKind,
        root: &Path,
        poll_interval: Duration,
        console: Console,
        color: bool,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<SessionMessage>();
        let counter = EventCounter::new();
        let recorder = EventRecorder::new(counter.clone(), console, color);

        let worker = thread::spawn(move || drain(rx, recorder));

        let listener = match source.listen(kind, root, poll_interval, EventSink::new(tx.clone())) {
            Ok(listener) => listener,
            Err(err) => {
                let _ = tx.send(SessionMessage::Stop);
                let _ = worker.join();
                return Err(err);
            }
        };

        tracing::info!("{} session started on {}", kind.label(), root.display());

        Ok(Self {
            kind,
            root: root.to_path_buf(),
            listener,
            tx,
            worker,
            counter,
        })
    }

    pub fn kind(&self) -> ListenerKind {
        self.kind
    }

    /// Live count; only final once [`Session::stop`] has returned.
    pub fn count(&self) -> usize {
        self.counter.get()
    }

    /// Stops the listener, drains everything it delivered and joins the worker.
    /// Returns the final number of accepted events.
    pub fn stop(self) -> Result<usize> {
        // The worker is joined even when the listener fails to stop cleanly
        let stopped = self.listener.stop();

        // Everything the listener delivered is queued ahead of this marker
        let _ = self.tx.send(SessionMessage::Stop);
        let outcome = self.worker.join().map_err(|_| ProbeError::SessionPanicked)?;

        let count = self.counter.get();
        tracing::info!(
            "{} session on {} stopped after {} events",
            self.kind.label(),
            self.root.display(),
            count
        );

        stopped?;
        outcome.map(|_| count)
    }
}

fn drain(rx: Receiver<SessionMessage>, recorder: EventRecorder) -> Result<()> {
    let mut first_error = None;

    while let Ok(message) = rx.recv() {
        match message {
            SessionMessage::Event(event) => {
                recorder.record(&event);
            }
            SessionMessage::Error(err) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
            SessionMessage::Stop => break,
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendInfo;
    use crate::backend::BackendKind;
    use crate::events::EventCategory;
    use std::sync::Mutex;

    /// Source whose listeners hand their sink back to the test.
    #[derive(Default)]
    struct ScriptedSource {
        sinks: Arc<Mutex<Vec<EventSink>>>,
    }

    struct ScriptedListener;

    impl Listener for ScriptedListener {
        fn stop(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    /// Delivers one last event while shutting down, then reports failure.
    struct FailingListener {
        sink: EventSink,
    }

    impl Listener for FailingListener {
        fn stop(self: Box<Self>) -> Result<()> {
            self.sink.deliver(event("/docs/last.md"));
            Err(notify::Error::generic("unwatch failed").into())
        }
    }

    struct FailingSource;

    impl NotificationSource for FailingSource {
        fn native_backend(&self) -> BackendInfo {
            BackendInfo::new("ScriptedWatcher", BackendKind::Other)
        }

        fn native(&self, _root: &Path, sink: EventSink) -> Result<Box<dyn Listener>> {
            sink.deliver(event("/docs/first.md"));
            Ok(Box::new(FailingListener { sink }))
        }

        fn polling(
            &self,
            root: &Path,
            _interval: Duration,
            sink: EventSink,
        ) -> Result<Box<dyn Listener>> {
            self.native(root, sink)
        }
    }

    impl NotificationSource for ScriptedSource {
        fn native_backend(&self) -> BackendInfo {
            BackendInfo::new("ScriptedWatcher", BackendKind::Other)
        }

        fn native(&self, _root: &Path, sink: EventSink) -> Result<Box<dyn Listener>> {
            self.sinks.lock().unwrap().push(sink);
            Ok(Box::new(ScriptedListener))
        }

        fn polling(
            &self,
            _root: &Path,
            _interval: Duration,
            sink: EventSink,
        ) -> Result<Box<dyn Listener>> {
            self.sinks.lock().unwrap().push(sink);
            Ok(Box::new(ScriptedListener))
        }
    }

    fn event(path: &str) -> ProbeEvent {
        ProbeEvent::new(PathBuf::from(path), EventCategory::Modified)
    }

    #[test]
    fn test_counter_sequence() {
        let counter = EventCounter::new();
        assert_eq!(counter.get(), 0);
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_format_event_line_plain() {
        let line = format_event_line(3, "12:34:56", &event("/docs/index.md"), false);
        assert_eq!(line, "[12:34:56] #3 MODIFIED: /docs/index.md");
    }

    #[test]
    fn test_format_event_line_colored() {
        let created = ProbeEvent::new(PathBuf::from("/docs/a.md"), EventCategory::Created);
        let line = format_event_line(1, "08:00:00", &created, true);
        assert_eq!(line, "[08:00:00] #1 \x1b[32mCREATED\x1b[0m: /docs/a.md");
    }

    #[test]
    fn test_recorder_skips_filtered_events() {
        let (console, buffer) = Console::buffer();
        let counter = EventCounter::new();
        let recorder = EventRecorder::new(counter.clone(), console, false);

        assert_eq!(recorder.record(&event("/docs/index.md")), Some(1));
        assert_eq!(recorder.record(&event("/docs/.index.md.swp")), None);
        assert_eq!(recorder.record(&event("/docs/index.md~")), None);
        assert_eq!(recorder.record(&event("/docs/guide").directory()), None);
        assert_eq!(recorder.record(&event("/docs/guide/setup.md")), Some(2));

        assert_eq!(counter.get(), 2);
        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("#1 MODIFIED: /docs/index.md"));
        assert!(lines[1].contains("#2 MODIFIED: /docs/guide/setup.md"));
    }

    #[test]
    fn test_session_counts_events_delivered_before_stop() {
        let source = ScriptedSource::default();
        let (console, buffer) = Console::buffer();

        let session = Session::start(
            &source,
            ListenerKind::Native,
            Path::new("/docs"),
            Duration::from_secs(1),
            console,
            false,
        )
        .unwrap();

        let sink = source.sinks.lock().unwrap()[0].clone();
        sink.deliver(event("/docs/a.md"));
        sink.deliver(event("/docs/.hidden/b.md"));
        sink.deliver(event("/docs/c.md"));

        assert_eq!(session.kind(), ListenerKind::Native);
        assert_eq!(session.stop().unwrap(), 2);

        // Late deliveries after stop are discarded
        sink.deliver(event("/docs/late.md"));
        assert_eq!(buffer.lines().len(), 2);
    }

    #[test]
    fn test_listener_stop_failure_still_drains_worker() {
        let (console, buffer) = Console::buffer();

        let session = Session::start(
            &FailingSource,
            ListenerKind::Native,
            Path::new("/docs"),
            Duration::from_secs(1),
            console,
            false,
        )
        .unwrap();

        assert!(matches!(session.stop(), Err(ProbeError::Watch(_))));

        // Both events were recorded before stop returned
        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("#1 MODIFIED: /docs/first.md"));
        assert!(lines[1].contains("#2 MODIFIED: /docs/last.md"));
    }

    #[test]
    fn test_session_propagates_watch_errors() {
        let source = ScriptedSource::default();
        let (console, _buffer) = Console::buffer();

        let session = Session::start(
            &source,
            ListenerKind::Polling,
            Path::new("/docs"),
            Duration::from_secs(1),
            console,
            false,
        )
        .unwrap();

        let sink = source.sinks.lock().unwrap()[0].clone();
        sink.deliver(event("/docs/a.md"));
        sink.fail(notify::Error::generic("watch descriptor lost").into());

        assert!(matches!(session.stop(), Err(ProbeError::Watch(_))));
    }
}
