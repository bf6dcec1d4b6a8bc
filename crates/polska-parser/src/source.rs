//! Character source with cheap snapshot/restore

use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A read cursor over a fully materialized input text.
///
/// The text lives behind an `Arc`, so cloning a `Source` copies one pointer
/// and one offset. A clone is an independent cursor: advancing it never moves
/// the original.
#[derive(Debug, Clone)]
pub struct Source {
    text: Arc<str>,
    position: usize,
}

impl Source {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self {
            text: text.into(),
            position: 0,
        }
    }

    /// Reads the whole file into memory. This is the only place where the
    /// parser waits on I/O.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await?;
        debug!("Read {} bytes from {}", text.len(), path.display());
        Ok(Self::new(text))
    }

    /// Returns the next character and advances, or `None` once exhausted.
    /// Reading at the end does not move the cursor.
    pub fn next_char(&mut self) -> Option<char> {
        let ch = self.text[self.position..].chars().next()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// Moves this cursor to where `snapshot` stands. Only the position is
    /// taken; the buffer is shared already.
    pub fn restore(&mut self, snapshot: &Source) {
        debug_assert!(Arc::ptr_eq(&self.text, &snapshot.text));
        self.position = snapshot.position;
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
