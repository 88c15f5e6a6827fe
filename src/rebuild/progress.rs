//! Operator-facing progress lines.
//!
//! Passes write through a shared [`Progress`] so the binary prints to stdout
//! while tests capture the same lines in memory.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use console::style;

/// Shared, cloneable progress writer.
#[derive(Clone)]
pub struct Progress {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Progress {
    fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Arc::new(Mutex::new(out)),
        }
    }

    /// Progress printed to stdout.
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Progress that discards everything.
    pub fn silent() -> Self {
        Self::new(Box::new(io::sink()))
    }

    /// Progress captured into a buffer that can be read back.
    pub fn buffer() -> (Self, ProgressBuffer) {
        let buffer = ProgressBuffer::default();
        (Self::new(Box::new(buffer.clone())), buffer)
    }

    /// Start of a pass or sub-step.
    pub fn step(&self, message: &str) {
        self.write_line(&format!("{} {}", style("→").cyan(), message));
    }

    /// Indented detail under the current step.
    pub fn detail(&self, message: &str) {
        self.write_line(&format!("  {}", style(message).dim()));
    }

    /// Anomaly that does not stop the run.
    pub fn warn(&self, message: &str) {
        self.write_line(&format!("{} {}", style("!").yellow(), message));
    }

    /// Final completion marker.
    pub fn done(&self) {
        self.write_line("Done.");
    }

    fn write_line(&self, line: &str) {
        // Progress output is best effort; a closed stdout must not abort a rebuild.
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{}", line);
            let _ = out.flush();
        }
    }
}

/// In-memory sink behind [`Progress::buffer`].
#[derive(Clone, Default)]
pub struct ProgressBuffer(Arc<Mutex<Vec<u8>>>);

impl ProgressBuffer {
    /// Everything written so far, ANSI styling stripped.
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        console::strip_ansi_codes(&String::from_utf8_lossy(&bytes)).into_owned()
    }

    /// Written lines, ANSI styling stripped.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for ProgressBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.0.lock() {
            Ok(mut inner) => {
                inner.extend_from_slice(buf);
                Ok(buf.len())
            }
            Err(_) => Err(io::Error::other("progress buffer poisoned")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
