use std::path::{Component, Path};

use crate::events::ProbeEvent;

const HIDDEN_MARKER: char = '.';

/// Editor swap files, temp files and backup files.
pub const TRANSIENT_SUFFIXES: &[&str] = &[".swp", ".tmp", "~"];

/// Why an event was not counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Directory,
    Hidden,
    Transient,
}

/// Decides which events a session counts. Rules are applied in order:
/// directory entries, hidden path segments, transient file suffixes.
#[derive(Debug, Clone, Default)]
pub struct EventFilter;

impl EventFilter {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, event: &ProbeEvent) -> Result<(), Rejection> {
        if event.is_directory {
            return Err(Rejection::Directory);
        }
        if is_hidden(&event.path) {
            return Err(Rejection::Hidden);
        }
        if is_transient(&event.path) {
            return Err(Rejection::Transient);
        }
        Ok(())
    }

    pub fn accepts(&self, event: &ProbeEvent) -> bool {
        self.check(event).is_ok()
    }
}

/// True when any segment of the path starts with the hidden-entry marker.
pub fn is_hidden<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().components().any(|comp| match comp {
        Component::Normal(name) => name.to_string_lossy().starts_with(HIDDEN_MARKER),
        _ => false,
    })
}

pub fn is_transient<P: AsRef<Path>>(path: P) -> bool {
    match path.as_ref().file_name() {
        Some(name) => {
            let name = name.to_string_lossy();
            TRANSIENT_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventCategory;
    use std::path::PathBuf;

    fn file_event(path: &str) -> ProbeEvent {
        ProbeEvent::new(PathBuf::from(path), EventCategory::Modified)
    }

    #[test]
    fn test_accepts_regular_file() {
        let filter = EventFilter::new();
        assert!(filter.accepts(&file_event("/srv/site/docs/index.md")));
        assert!(filter.accepts(&file_event("/srv/site/docs/guide/setup.md")));
    }

    #[test]
    fn test_rejects_directories() {
        let filter = EventFilter::new();
        let event = file_event("/srv/site/docs/guide").directory();
        assert_eq!(filter.check(&event), Err(Rejection::Directory));
    }

    #[test]
    fn test_rejects_hidden_segments() {
        let filter = EventFilter::new();
        assert_eq!(
            filter.check(&file_event("/srv/site/docs/.git/index")),
            Err(Rejection::Hidden)
        );
        assert_eq!(
            filter.check(&file_event("/srv/site/docs/.draft.md")),
            Err(Rejection::Hidden)
        );
        assert!(is_hidden("/home/user/.cache/docs/index.md"));
        assert!(!is_hidden("/srv/site/docs/v1.2/index.md"));
    }

    #[test]
    fn test_rejects_transient_suffixes() {
        let filter = EventFilter::new();
        assert_eq!(
            filter.check(&file_event("/srv/site/docs/index.md.swp")),
            Err(Rejection::Transient)
        );
        assert_eq!(
            filter.check(&file_event("/srv/site/docs/upload.tmp")),
            Err(Rejection::Transient)
        );
        assert_eq!(
            filter.check(&file_event("/srv/site/docs/index.md~")),
            Err(Rejection::Transient)
        );
        assert!(!is_transient("/srv/site/docs/tmp/index.md"));
        assert!(!is_transient("/srv/site/docs/swp.md"));
    }

    #[test]
    fn test_directory_rule_applies_first() {
        let filter = EventFilter::new();
        let event = file_event("/srv/site/.docs/build.tmp").directory();
        assert_eq!(filter.check(&event), Err(Rejection::Directory));

        let event = file_event("/srv/site/.docs/build.tmp");
        assert_eq!(filter.check(&event), Err(Rejection::Hidden));
    }
}
