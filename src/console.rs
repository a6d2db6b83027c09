//! Line-oriented output shared between the foreground flow and session threads.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct Console {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Console {
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// A console writing into memory, plus a handle to read back what was written.
    pub fn buffer() -> (Self, ConsoleBuffer) {
        let buffer = ConsoleBuffer::default();
        (Self::from_writer(buffer.clone()), buffer)
    }

    pub fn line(&self, text: impl AsRef<str>) {
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // stdout going away (closed pipe) is not worth aborting a diagnostic run for
        if let Err(err) = writeln!(out, "{}", text.as_ref()).and_then(|_| out.flush()) {
            tracing::debug!("Failed to write output: {}", err);
        }
    }

    pub fn blank(&self) {
        self.line("");
    }

    pub fn rule(&self, ch: char) {
        self.line(ch.to_string().repeat(60));
    }
}

#[derive(Clone, Default)]
pub struct ConsoleBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl ConsoleBuffer {
    pub fn contents(&self) -> String {
        let bytes = match self.bytes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for ConsoleBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = match self.bytes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
