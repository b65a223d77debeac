//! Trace line source
//!
//! Yields `(line number, text)` records lazily from a file or any reader.
//! Invalid UTF-8 is replaced rather than rejected; strace output routinely
//! contains raw buffer bytes.

use crate::error::{AnalyzerError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// A single input record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceLine {
    /// 1-based line number
    pub number: usize,
    /// Raw text without the line terminator
    pub text: String,
}

impl TraceLine {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// Number an in-memory sequence of lines starting at 1
pub fn numbered<I, S>(lines: I) -> impl Iterator<Item = Result<TraceLine>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    lines
        .into_iter()
        .enumerate()
        .map(|(index, text)| Ok(TraceLine::new(index + 1, text)))
}

/// Lazy, finite, non-restartable line reader
#[derive(Debug)]
pub struct TraceSource<R> {
    reader: R,
    path: PathBuf,
    next_number: usize,
    buf: Vec<u8>,
    failed: bool,
}

impl TraceSource<BufReader<File>> {
    /// Open a trace file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|e| AnalyzerError::source_unavailable(path, e))?;
        Ok(Self::from_reader(BufReader::new(file), path))
    }
}

impl<R: BufRead> TraceSource<R> {
    /// Wrap an already-open reader. `path` is only used in error messages.
    pub fn from_reader(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            next_number: 1,
            buf: Vec::new(),
            failed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<R: BufRead> Iterator for TraceSource<R> {
    type Item = Result<TraceLine>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                let line = TraceLine::new(
                    self.next_number,
                    String::from_utf8_lossy(&self.buf).into_owned(),
                );
                self.next_number += 1;
                Some(Ok(line))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(AnalyzerError::source_unavailable(self.path.clone(), e)))
            }
        }
    }
}
