//! Render sinks for released lines

use std::io::{self, BufWriter, Write};

/// Receiver of display updates
///
/// The smoother calls `display` for each released line and `evict_oldest`
/// whenever the visible log drops its last entry.
pub trait DisplaySink {
    fn display(&mut self, line: &str);

    fn evict_oldest(&mut self);
}

/// Prints each released line to a writer (stdout by default)
pub struct TerminalSink<W: Write> {
    writer: W,
}

impl TerminalSink<BufWriter<io::Stdout>> {
    pub fn stdout() -> Self {
        Self {
            writer: BufWriter::new(io::stdout()),
        }
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DisplaySink for TerminalSink<W> {
    fn display(&mut self, line: &str) {
        let result = writeln!(self.writer, "{}", line).and_then(|_| self.writer.flush());
        if let Err(e) = result {
            tracing::warn!("[Feed] Failed to write line: {}", e);
        }
    }

    fn evict_oldest(&mut self) {
        // Scrolled-off lines stay in the terminal history
    }
}

/// Records every sink call in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    /// Displayed lines in release order
    pub displayed: Vec<String>,
    /// Number of evictions requested
    pub evictions: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySink for MemorySink {
    fn display(&mut self, line: &str) {
        self.displayed.push(line.to_string());
    }

    fn evict_oldest(&mut self) {
        self.evictions += 1;
    }
}
