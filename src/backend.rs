//! Filesystem notification capability.
//!
//! A [`NotificationSource`] hands out the two kinds of listening sessions the
//! probe compares: one driven by the operating system's native change
//! notifications and one that polls the tree on a fixed interval. The probe
//! only talks to this trait, so the backends can be swapped per platform (or
//! replaced by a scripted source in tests) without touching the probe logic.

use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use notify::{Config, Event, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher, WatcherKind};

use crate::error::{ProbeError, Result};
use crate::events::{EventTranslator, ProbeEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    Native,
    Polling,
}

impl ListenerKind {
    pub fn label(&self) -> &'static str {
        match self {
            ListenerKind::Native => "NATIVE",
            ListenerKind::Polling => "POLLING",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Inotify,
    FsEvents,
    Kqueue,
    ReadDirectoryChanges,
    Polling,
    Other,
}

/// Which implementation backs the native listener. Advisory text only; the
/// probe never branches on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendInfo {
    pub name: String,
    pub kind: BackendKind,
}

impl BackendInfo {
    pub fn new(name: impl Into<String>, kind: BackendKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Whether the backend is an OS change-notification facility rather than polling.
    pub fn is_os_native(&self) -> bool {
        !matches!(self.kind, BackendKind::Polling | BackendKind::Other)
    }

    pub fn description(&self) -> &'static str {
        match self.kind {
            BackendKind::Inotify => "inotify (native Linux file system events)",
            BackendKind::FsEvents => "FSEvents (native macOS file system events)",
            BackendKind::Kqueue => "kqueue (native BSD file system events)",
            BackendKind::ReadDirectoryChanges => {
                "ReadDirectoryChangesW (native Windows file system events)"
            }
            BackendKind::Polling | BackendKind::Other => "May be polling or platform-specific",
        }
    }
}

/// Messages flowing from a listener into its session.
#[derive(Debug)]
pub enum SessionMessage {
    Event(ProbeEvent),
    Error(ProbeError),
    Stop,
}

/// Where a listener delivers what it observes. Delivery after the session has
/// finished is silently discarded.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Sender<SessionMessage>,
}

impl EventSink {
    pub fn new(tx: Sender<SessionMessage>) -> Self {
        Self { tx }
    }

    pub fn deliver(&self, event: ProbeEvent) {
        let _ = self.tx.send(SessionMessage::Event(event));
    }

    pub fn fail(&self, err: ProbeError) {
        let _ = self.tx.send(SessionMessage::Error(err));
    }
}

/// A running listener. `stop` tears it down; no further events are delivered
/// once it returns.
///
/// Delivery up to the stop is best-effort. A backend that hands events over
/// from its own thread may still have a change in flight when `stop` is
/// called; such a change is dropped rather than waited for.
pub trait Listener: Send {
    fn stop(self: Box<Self>) -> Result<()>;
}

pub trait NotificationSource {
    fn native_backend(&self) -> BackendInfo;

    fn native(&self, root: &Path, sink: EventSink) -> Result<Box<dyn Listener>>;

    fn polling(&self, root: &Path, interval: Duration, sink: EventSink)
        -> Result<Box<dyn Listener>>;

    fn listen(
        &self,
        kind: ListenerKind,
        root: &Path,
        interval: Duration,
        sink: EventSink,
    ) -> Result<Box<dyn Listener>> {
        match kind {
            ListenerKind::Native => self.native(root, sink),
            ListenerKind::Polling => self.polling(root, interval, sink),
        }
    }
}

/// Notification source backed by the `notify` crate.
#[derive(Debug, Clone, Default)]
pub struct NotifySource;

impl NotifySource {
    pub fn new() -> Self {
        Self
    }
}

impl NotificationSource for NotifySource {
    fn native_backend(&self) -> BackendInfo {
        let kind = match <RecommendedWatcher as Watcher>::kind() {
            WatcherKind::Inotify => BackendKind::Inotify,
            WatcherKind::Fsevent => BackendKind::FsEvents,
            WatcherKind::Kqueue => BackendKind::Kqueue,
            WatcherKind::ReadDirectoryChangesWatcher => BackendKind::ReadDirectoryChanges,
            WatcherKind::PollWatcher => BackendKind::Polling,
            _ => BackendKind::Other,
        };
        BackendInfo::new(short_type_name::<RecommendedWatcher>(), kind)
    }

    fn native(&self, root: &Path, sink: EventSink) -> Result<Box<dyn Listener>> {
        let translator = Arc::new(Mutex::new(EventTranslator::seeded(root)));
        let watcher = RecommendedWatcher::new(
            forward_to(sink.clone(), translator.clone()),
            Config::default(),
        )
        .map_err(|source| ProbeError::MissingDependency {
            backend: short_type_name::<RecommendedWatcher>().to_string(),
            source,
        })?;
        tracing::debug!("Created native watcher for {}", root.display());
        NotifyListener::start(watcher, root, translator, sink)
    }

    fn polling(
        &self,
        root: &Path,
        interval: Duration,
        sink: EventSink,
    ) -> Result<Box<dyn Listener>> {
        let translator = Arc::new(Mutex::new(EventTranslator::seeded(root)));
        let config = Config::default().with_poll_interval(interval);
        let watcher = PollWatcher::new(forward_to(sink.clone(), translator.clone()), config)?;
        tracing::debug!(
            "Created polling watcher for {} ({:?} interval)",
            root.display(),
            interval
        );
        NotifyListener::start(watcher, root, translator, sink)
    }
}

type SharedTranslator = Arc<Mutex<EventTranslator>>;

fn lock(translator: &SharedTranslator) -> MutexGuard<'_, EventTranslator> {
    match translator.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn forward_to(
    sink: EventSink,
    translator: SharedTranslator,
) -> impl FnMut(notify::Result<Event>) + Send + 'static {
    move |result: notify::Result<Event>| match result {
        Ok(event) => {
            let translated = lock(&translator).translate(&event);
            for probe_event in translated {
                sink.deliver(probe_event);
            }
        }
        Err(err) => {
            tracing::error!("File watcher error: {}", err);
            sink.fail(err.into());
        }
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

struct NotifyListener<W: Watcher + Send> {
    watcher: W,
    root: PathBuf,
    translator: SharedTranslator,
    sink: EventSink,
}

impl<W: Watcher + Send + 'static> NotifyListener<W> {
    fn start(
        mut watcher: W,
        root: &Path,
        translator: SharedTranslator,
        sink: EventSink,
    ) -> Result<Box<dyn Listener>> {
        watcher.watch(root, RecursiveMode::Recursive)?;
        Ok(Box::new(Self {
            watcher,
            root: root.to_path_buf(),
            translator,
            sink,
        }))
    }
}

impl<W: Watcher + Send + 'static> Listener for NotifyListener<W> {
    fn stop(self: Box<Self>) -> Result<()> {
        let NotifyListener {
            mut watcher,
            root,
            translator,
            sink,
        } = *self;

        // The root may have been removed while watching; dropping the watcher
        // below still shuts the backend down.
        if let Err(err) = watcher.unwatch(&root) {
            tracing::debug!("Unwatch of {} failed: {}", root.display(), err);
        }
        drop(watcher);

        // A rename half still waiting for its partner left the tree
        if let Some(event) = lock(&translator).flush() {
            sink.deliver(event);
        }
        Ok(())
    }
}
