//! Turns the two session counts into a verdict with concrete advice.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnosis {
    /// Polling saw changes the native backend missed.
    NativeEventsBroken,
    /// Neither session saw anything; most likely nothing was edited.
    NoEventsDetected,
    /// The native backend delivers events, so the live-reload tool's own setup is suspect.
    WatchingWorks,
}

impl Diagnosis {
    pub fn from_counts(native_count: usize, polling_count: usize) -> Self {
        match (native_count, polling_count) {
            (0, p) if p > 0 => Diagnosis::NativeEventsBroken,
            (0, _) => Diagnosis::NoEventsDetected,
            _ => Diagnosis::WatchingWorks,
        }
    }

    pub fn lines(&self) -> Vec<&'static str> {
        match self {
            Diagnosis::NativeEventsBroken => vec![
                "DIAGNOSIS: Native file system events are NOT working.",
                "This is likely why MkDocs live reload isn't working.",
                "",
                "SOLUTIONS:",
                "1. Check inotify limits:",
                "   cat /proc/sys/fs/inotify/max_user_watches",
                "   sudo sysctl fs.inotify.max_user_watches=524288",
                "",
                "2. Use polling in MkDocs by adding to mkdocs.yml:",
                "   watch:",
                "     - docs",
                "",
                "3. Or try running MkDocs with:",
                "   mkdocs serve --watch-theme",
            ],
            Diagnosis::NoEventsDetected => vec![
                "DIAGNOSIS: No events detected with either method.",
                "Make sure you actually modified a file while testing.",
            ],
            Diagnosis::WatchingWorks => vec![
                "DIAGNOSIS: File watching appears to be working.",
                "The issue may be with MkDocs configuration.",
                "",
                "Try these MkDocs options:",
                "1. mkdocs serve --dirty  (faster rebuilds)",
                "2. Check mkdocs.yml for watch configuration",
                "3. Try: mkdocs serve --watch docs",
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_broken_when_only_polling_sees_events() {
        assert_eq!(Diagnosis::from_counts(0, 5), Diagnosis::NativeEventsBroken);
        assert_eq!(Diagnosis::from_counts(0, 1), Diagnosis::NativeEventsBroken);
    }

    #[test]
    fn test_no_events_from_either() {
        assert_eq!(Diagnosis::from_counts(0, 0), Diagnosis::NoEventsDetected);
    }

    #[test]
    fn test_watching_works_whenever_native_counts() {
        assert_eq!(Diagnosis::from_counts(3, 0), Diagnosis::WatchingWorks);
        assert_eq!(Diagnosis::from_counts(3, 3), Diagnosis::WatchingWorks);
        assert_eq!(Diagnosis::from_counts(3, 100), Diagnosis::WatchingWorks);
    }

    #[test]
    fn test_advice_text() {
        let broken = Diagnosis::NativeEventsBroken.lines();
        assert!(broken[0].contains("NOT working"));
        assert!(broken.iter().any(|l| l.contains("max_user_watches")));

        assert!(Diagnosis::NoEventsDetected.lines()[0].contains("No events detected"));
        assert!(Diagnosis::WatchingWorks.lines()[1].contains("configuration"));
    }
}
