//! Line-by-line extraction from a build's `build-log.txt`.

use std::io::{BufRead, BufReader};

use prow_core::Build;
use storage::{BlobStore, StorageError};

use crate::{Prow, ProwError, ScanError};

impl<S: BlobStore> Prow<S> {
    /// Stream the build log through `check_line`, collecting what it keeps.
    ///
    /// `check_line` receives each line split on whitespace and returns the
    /// fragment to keep, or `None`. Empty fragments are dropped. Results are
    /// in log order.
    ///
    /// If the log cannot be opened the error carries no fragments; a read
    /// failure part-way returns the fragments collected so far inside the
    /// error. The reader is dropped before returning on every path.
    pub fn parse_log<F>(&self, build: &Build, mut check_line: F) -> Result<Vec<String>, ScanError>
    where
        F: FnMut(&[&str]) -> Option<String>,
    {
        let path = build.build_log_path();
        let reader = self
            .store
            .open_reader(build.bucket(), &path)
            .map_err(|err| ScanError {
                path: path.clone(),
                collected: Vec::new(),
                source: err.into(),
            })?;

        let mut reader = BufReader::new(reader);
        let mut collected = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(trim_line_ending(&buf));
                    let words: Vec<&str> = line.split_whitespace().collect();
                    if let Some(fragment) = check_line(&words).filter(|f| !f.is_empty()) {
                        collected.push(fragment);
                    }
                }
                Err(err) => {
                    tracing::warn!(build = %build, path = path.as_str(), error = %err, "log read failed");
                    return Err(ScanError {
                        path,
                        collected,
                        source: ProwError::Storage(StorageError::Io(err)),
                    });
                }
            }
        }

        tracing::debug!(build = %build, matched = collected.len(), "scanned build log");
        Ok(collected)
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
