//! The two-phase interactive probe.
//!
//! A run moves through `RunningNative → RunningPolling → Done`. Each running
//! phase starts one listening session, blocks on an [`Interrupt`], stops the
//! session and records its final count. Once both counts are in, a
//! [`ProbeReport`] compares them.

use std::path::{Path, PathBuf};

use crate::backend::{BackendInfo, ListenerKind, NotificationSource};
use crate::config::ProbeConfig;
use crate::console::Console;
use crate::diagnosis::Diagnosis;
use crate::error::Result;
use crate::interrupt::Interrupt;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePhase {
    RunningNative,
    RunningPolling,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReport {
    pub native_count: usize,
    pub polling_count: usize,
}

impl ProbeReport {
    pub fn diagnosis(&self) -> Diagnosis {
        Diagnosis::from_counts(self.native_count, self.polling_count)
    }
}

pub struct Probe<'a> {
    source: &'a dyn NotificationSource,
    config: ProbeConfig,
    root: PathBuf,
    backend: BackendInfo,
    console: Console,
    phase: ProbePhase,
    native_count: Option<usize>,
    polling_count: Option<usize>,
}

impl<'a> Probe<'a> {
    /// Validates the configuration and resolves the target directory. Fails with
    /// `DirectoryNotFound` before any listener is created.
    pub fn new(
        source: &'a dyn NotificationSource,
        config: ProbeConfig,
        console: Console,
    ) -> Result<Self> {
        config.validate()?;
        let root = config.resolve_watch_path()?;
        let backend = source.native_backend();
        tracing::debug!("Native backend: {} ({:?})", backend.name, backend.kind);

        Ok(Self {
            source,
            config,
            root,
            backend,
            console,
            phase: ProbePhase::RunningNative,
            native_count: None,
            polling_count: None,
        })
    }

    pub fn phase(&self) -> ProbePhase {
        self.phase
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backend(&self) -> &BackendInfo {
        &self.backend
    }

    /// Final report, available once both phases are done.
    pub fn report(&self) -> Option<ProbeReport> {
        match (self.native_count, self.polling_count) {
            (Some(native_count), Some(polling_count)) => Some(ProbeReport {
                native_count,
                polling_count,
            }),
            _ => None,
        }
    }

    /// Runs the current phase until `interrupt` fires, then advances.
    pub fn step(&mut self, interrupt: &mut dyn Interrupt) -> Result<ProbePhase> {
        match self.phase {
            ProbePhase::RunningNative => {
                self.print_banner();
                let count = self.listen(ListenerKind::Native, interrupt)?;
                self.native_count = Some(count);
                self.print_transition(count);
                self.phase = ProbePhase::RunningPolling;
            }
            ProbePhase::RunningPolling => {
                let count = self.listen(ListenerKind::Polling, interrupt)?;
                self.polling_count = Some(count);
                if let Some(report) = self.report() {
                    self.print_results(&report);
                }
                self.phase = ProbePhase::Done;
            }
            ProbePhase::Done => {}
        }
        Ok(self.phase)
    }

    /// Drives both phases to completion.
    pub fn run(mut self, interrupt: &mut dyn Interrupt) -> Result<ProbeReport> {
        while self.step(interrupt)? != ProbePhase::Done {}

        // Done is only reached after both counts are recorded
        Ok(self.report().unwrap_or(ProbeReport {
            native_count: 0,
            polling_count: 0,
        }))
    }

    fn listen(&self, kind: ListenerKind, interrupt: &mut dyn Interrupt) -> Result<usize> {
        let session = Session::start(
            self.source,
            kind,
            &self.root,
            self.config.poll_interval,
            self.console.clone(),
            self.config.color,
        )?;

        let waited = interrupt.wait();
        let count = session.stop()?;
        waited?;
        Ok(count)
    }

    fn print_banner(&self) {
        let out = &self.console;
        out.rule('=');
        out.line("File Watcher Test");
        out.rule('=');
        out.line(format!("Watching: {}", self.root.display()));
        out.line(format!("Observer: {}", self.backend.name));
        out.line(format!("Backend: {}", self.backend.description()));
        out.blank();
        out.line("Testing with NATIVE observer first...");
        out.line("Edit a file in the watched directory to see if events are detected.");
        out.line("Press Ctrl+C to switch to POLLING observer for comparison.");
        out.rule('-');
    }

    fn print_transition(&self, native_count: usize) {
        let out = &self.console;
        out.blank();
        out.line(format!("Native observer detected {} events.", native_count));
        out.blank();
        out.rule('-');
        out.line("Now testing with POLLING observer...");
        out.line("This is slower but more reliable on some systems.");
        out.line("Edit a file again. Press Ctrl+C to exit.");
        out.rule('-');
    }

    fn print_results(&self, report: &ProbeReport) {
        let out = &self.console;
        out.blank();
        out.rule('=');
        out.line("RESULTS");
        out.rule('=');
        out.line(format!("Native observer events:  {}", report.native_count));
        out.line(format!("Polling observer events: {}", report.polling_count));
        out.blank();
        for line in report.diagnosis().lines() {
            out.line(line);
        }
    }
}
