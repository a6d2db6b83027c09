use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    Created,
    Modified,
    Deleted,
    Moved,
}

impl EventCategory {
    /// Uppercased name used in printed event lines.
    pub fn label(&self) -> &'static str {
        match self {
            EventCategory::Created => "CREATED",
            EventCategory::Modified => "MODIFIED",
            EventCategory::Deleted => "DELETED",
            EventCategory::Moved => "MOVED",
        }
    }

    pub fn ansi_color(&self) -> &'static str {
        match self {
            EventCategory::Created => "\x1b[32m",  // Green
            EventCategory::Modified => "\x1b[33m", // Yellow
            EventCategory::Deleted => "\x1b[31m",  // Red
            EventCategory::Moved => "\x1b[34m",    // Blue
        }
    }

    /// Maps a notify event kind onto a category. A rename half on its own means
    /// the entry left (`From`) or entered (`To`) the watched tree. `None` means
    /// the kind is not a change we report.
    pub fn from_kind(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(EventCategory::Created),
            EventKind::Modify(ModifyKind::Name(mode)) => match mode {
                RenameMode::From => Some(EventCategory::Deleted),
                RenameMode::To => Some(EventCategory::Created),
                RenameMode::Both | RenameMode::Any | RenameMode::Other => {
                    Some(EventCategory::Moved)
                }
            },
            EventKind::Modify(_) | EventKind::Any => Some(EventCategory::Modified),
            EventKind::Remove(_) => Some(EventCategory::Deleted),
            EventKind::Access(_) | EventKind::Other => None,
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single change notification as seen by a listening session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeEvent {
    pub path: PathBuf,
    pub is_directory: bool,
    pub category: EventCategory,
}

impl ProbeEvent {
    pub fn new(path: PathBuf, category: EventCategory) -> Self {
        Self {
            path,
            is_directory: false,
            category,
        }
    }

    pub fn directory(mut self) -> Self {
        self.is_directory = true;
        self
    }
}

#[derive(Debug)]
struct PendingRename {
    tracker: Option<usize>,
    path: PathBuf,
    is_directory: bool,
}

/// Turns raw notify events into probe events.
///
/// Two things can't be read off a single notify event. Whether a vanished path
/// was a directory is answered from the set of directories seen so far in the
/// tree. Rename halves are paired by tracker: a `From` is held until the next
/// event, and becomes one MOVED record if the matching `To` follows. A `From`
/// with no partner is a delete, a `To` with no partner is a create, and the
/// `Both` that follows an already paired rename is dropped.
#[derive(Debug, Default)]
pub struct EventTranslator {
    known_dirs: HashSet<PathBuf>,
    pending_from: Option<PendingRename>,
    /// Tracker of a rename completed from its halves, until its `Both` arrives
    paired_tracker: Option<Option<usize>>,
}

impl EventTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A translator that already knows every directory under `root`.
    pub fn seeded<P: AsRef<Path>>(root: P) -> Self {
        let mut translator = Self::new();
        translator.add_tree(root.as_ref());
        tracing::debug!(
            "Seeded {} known directories under {}",
            translator.known_dirs.len(),
            root.as_ref().display()
        );
        translator
    }

    pub fn is_known_dir<P: AsRef<Path>>(&self, path: P) -> bool {
        self.known_dirs.contains(path.as_ref())
    }

    pub fn translate(&mut self, event: &Event) -> Vec<ProbeEvent> {
        let mut out = Vec::new();
        let tracker = event.tracker();

        match event.kind {
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                out.extend(self.flush());
                if let Some(path) = event.paths.first() {
                    self.pending_from = Some(PendingRename {
                        tracker,
                        path: path.clone(),
                        is_directory: self.is_dir(path),
                    });
                }
                return out;
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                let Some(to) = event.paths.first() else {
                    out.extend(self.flush());
                    return out;
                };
                match self.pending_from.take() {
                    Some(from) if from.tracker == tracker => {
                        let is_directory = from.is_directory || to.is_dir();
                        if is_directory {
                            self.forget_tree(&from.path);
                            self.add_tree(to);
                        }
                        out.push(ProbeEvent {
                            path: from.path,
                            is_directory,
                            category: EventCategory::Moved,
                        });
                        self.paired_tracker = Some(tracker);
                        return out;
                    }
                    unpaired => {
                        if let Some(from) = unpaired {
                            out.push(self.departed(from));
                        }
                    }
                }
            }
            _ => out.extend(self.flush()),
        }

        let paired_tracker = self.paired_tracker.take();
        let closes_pair = matches!(
            event.kind,
            EventKind::Modify(ModifyKind::Name(RenameMode::Both))
        );
        if closes_pair && paired_tracker == Some(tracker) {
            return out;
        }

        let Some(category) = EventCategory::from_kind(&event.kind) else {
            tracing::trace!("Ignoring notify event {:?}", event.kind);
            return out;
        };
        let Some(path) = event.paths.first() else {
            return out;
        };

        let is_directory = match event.kind {
            EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => true,
            EventKind::Create(CreateKind::File) | EventKind::Remove(RemoveKind::File) => false,
            EventKind::Modify(ModifyKind::Name(_)) => {
                // The destination still exists, the source usually doesn't
                let to = event.paths.last().unwrap_or(path);
                self.is_known_dir(path) || to.is_dir()
            }
            _ => self.is_dir(path),
        };

        match category {
            EventCategory::Created if is_directory => self.add_tree(path),
            EventCategory::Deleted if is_directory => self.forget_tree(path),
            EventCategory::Moved if is_directory => {
                self.forget_tree(path);
                if let Some(to) = event.paths.last() {
                    self.add_tree(to);
                }
            }
            _ => {}
        }

        out.push(ProbeEvent {
            path: path.clone(),
            is_directory,
            category,
        });
        out
    }

    /// Releases a rename half still waiting for its partner, as a delete.
    pub fn flush(&mut self) -> Option<ProbeEvent> {
        self.pending_from.take().map(|from| self.departed(from))
    }

    fn departed(&mut self, from: PendingRename) -> ProbeEvent {
        if from.is_directory {
            self.forget_tree(&from.path);
        }
        ProbeEvent {
            path: from.path,
            is_directory: from.is_directory,
            category: EventCategory::Deleted,
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_known_dir(path) || path.is_dir()
    }

    fn add_tree(&mut self, root: &Path) {
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_dir() {
                self.known_dirs.insert(entry.into_path());
            }
        }
    }

    fn forget_tree(&mut self, root: &Path) {
        self.known_dirs.retain(|dir| !dir.starts_with(root));
    }
}
