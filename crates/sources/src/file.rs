//! File source
//!
//! Reads a file line by line. Two declared modes, chosen up front by the
//! descriptor and never inferred from content:
//!
//! - **replay** (`follow = false`): yields every line in file order and
//!   ends the stream at EOF;
//! - **tail** (`follow = true`): at EOF, polls for appended lines on a
//!   fixed interval and never terminates on its own.
//!
//! Lines are preserved faithfully: an empty line in the file becomes an
//! empty record, so replaying a capture keeps its exact line count. A line
//! still missing its newline in tail mode is held back until the writer
//! completes it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use relog_protocol::{trim_line, EndpointId, Record};

use crate::{SourceError, SourceOptions};

/// File source adapter (replay or tail)
pub struct FileSource {
    id: EndpointId,
    reader: BufReader<File>,
    /// Bytes of a line whose newline has not arrived yet
    pending: Vec<u8>,
    chunk: Vec<u8>,
    follow: bool,
    poll_interval: Duration,
}

impl FileSource {
    /// Open `path` for reading
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Open`] if the file cannot be opened.
    pub async fn open(
        path: &Path,
        follow: bool,
        options: &SourceOptions,
    ) -> Result<Self, SourceError> {
        let id = EndpointId::new(format!("file://{}", path.display()));

        let file = File::open(path).await.map_err(|e| SourceError::Open {
            path: PathBuf::from(path),
            source: e,
        })?;

        tracing::info!(
            endpoint = %id,
            mode = if follow { "tail" } else { "replay" },
            "file source opened"
        );

        Ok(Self {
            id,
            reader: BufReader::new(file),
            pending: Vec::new(),
            chunk: Vec::new(),
            follow,
            poll_interval: options.poll_interval,
        })
    }
}

#[async_trait]
impl crate::RecordSource for FileSource {
    fn id(&self) -> &EndpointId {
        &self.id
    }

    async fn next_record(&mut self) -> Result<Option<Record>, SourceError> {
        loop {
            self.chunk.clear();
            let n = self
                .reader
                .read_until(b'\n', &mut self.chunk)
                .await
                .map_err(|e| SourceError::Read {
                    endpoint: self.id.clone(),
                    source: e,
                })?;

            if n == 0 {
                if self.follow {
                    // Wait for the file to grow; a held-back partial line
                    // stays pending until its newline arrives.
                    tokio::time::sleep(self.poll_interval).await;
                    continue;
                }

                // Replay: emit a final unterminated line, then end.
                if !self.pending.is_empty() {
                    let record = self.take_pending();
                    return Ok(Some(record));
                }
                return Ok(None);
            }

            self.pending.extend_from_slice(&self.chunk);

            if self.pending.ends_with(b"\n") {
                let record = self.take_pending();
                return Ok(Some(record));
            }
            // Partial line at EOF - keep accumulating.
        }
    }
}

impl FileSource {
    fn take_pending(&mut self) -> Record {
        let record = Record::new(
            Bytes::copy_from_slice(trim_line(&self.pending)),
            self.id.clone(),
        );
        self.pending.clear();
        record
    }
}

#[cfg(test)]
#[path = "file_test.rs"]
mod file_test;
