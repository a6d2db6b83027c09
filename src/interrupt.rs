use std::sync::mpsc::{self, Receiver};

use crate::error::{ProbeError, Result};

/// Blocks the foreground flow until the user asks to move on.
pub trait Interrupt {
    fn wait(&mut self) -> Result<()>;
}

/// Ctrl+C driven interrupt. The process-wide handler is installed once and
/// forwards every signal into a channel, so it serves both probe phases.
pub struct CtrlC {
    rx: Receiver<()>,
}

impl CtrlC {
    pub fn install() -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        ctrlc::set_handler(move || {
            let _ = tx.send(());
        })
        .map_err(|err| ProbeError::Interrupt(err.to_string()))?;
        Ok(Self { rx })
    }
}

impl Interrupt for CtrlC {
    fn wait(&mut self) -> Result<()> {
        // Presses that landed while the previous phase was shutting down
        // belong to that phase
        while self.rx.try_recv().is_ok() {}

        self.rx
            .recv()
            .map_err(|_| ProbeError::Interrupt("interrupt handler went away".to_string()))
    }
}

/// Runs a closure in place of waiting for a signal. Lets the probe be driven by
/// synthetic interrupts, e.g. perform some file operations, then "press Ctrl+C".
pub struct ScriptedInterrupt<F> {
    step: F,
}

impl<F: FnMut() -> Result<()>> ScriptedInterrupt<F> {
    pub fn new(step: F) -> Self {
        Self { step }
    }
}

impl<F: FnMut() -> Result<()>> Interrupt for ScriptedInterrupt<F> {
    fn wait(&mut self) -> Result<()> {
        (self.step)()
    }
}
