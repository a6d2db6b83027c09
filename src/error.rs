use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Directory '{0}' does not exist.")]
    DirectoryNotFound(PathBuf),

    #[error("Path '{0}' is not a directory.")]
    NotADirectory(PathBuf),

    /// The OS notification facility behind the native backend could not be set up.
    #[error("native file watching backend '{backend}' is unavailable: {source}")]
    MissingDependency {
        backend: String,
        #[source]
        source: notify::Error,
    },

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to install interrupt handler: {0}")]
    Interrupt(String),

    #[error("listening session thread panicked")]
    SessionPanicked,
}

impl ProbeError {
    /// Pre-flight failures that end the program with status 1 before any session starts.
    pub fn is_fatal_preflight(&self) -> bool {
        matches!(
            self,
            Self::DirectoryNotFound(_) | Self::NotADirectory(_) | Self::MissingDependency { .. }
        )
    }

    /// How to fix the condition, when there is a known fix.
    pub fn remedy(&self) -> Option<&'static str> {
        match self {
            Self::MissingDependency { .. } => Some(
                "Raise the inotify instance limit with:\n  sudo sysctl fs.inotify.max_user_instances=512",
            ),
            Self::Watch(err) if matches!(err.kind, notify::ErrorKind::MaxFilesWatch) => Some(
                "Raise the inotify watch limit with:\n  sudo sysctl fs.inotify.max_user_watches=524288",
            ),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_not_found_names_path() {
        let err = ProbeError::DirectoryNotFound(PathBuf::from("missing/docs"));
        assert_eq!(err.to_string(), "Directory 'missing/docs' does not exist.");
        assert!(err.is_fatal_preflight());
        assert!(err.remedy().is_none());
    }

    #[test]
    fn test_missing_dependency_has_remedy() {
        let err = ProbeError::MissingDependency {
            backend: "INotifyWatcher".to_string(),
            source: notify::Error::generic("too many open files"),
        };
        assert!(err.is_fatal_preflight());
        assert!(err.remedy().unwrap().contains("max_user_instances"));
    }

    #[test]
    fn test_watch_limit_has_remedy() {
        let err: ProbeError = notify::Error::new(notify::ErrorKind::MaxFilesWatch).into();
        assert!(err.remedy().unwrap().contains("max_user_watches"));
    }

    #[test]
    fn test_watch_error_is_not_preflight() {
        let err: ProbeError = notify::Error::generic("boom").into();
        assert!(!err.is_fatal_preflight());
    }
}
