//! File append sink
//!
//! One line per record, newline-terminated, no escaping. Output goes
//! through a buffered writer; the owning task calls [`flush`] on a cadence
//! so a slow trickle of records still reaches disk promptly.
//!
//! A write failure (disk full, permission revoked) is fatal for this
//! adapter only.
//!
//! [`flush`]: crate::RecordSink::flush

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

use relog_protocol::{EndpointId, Record};

use crate::SinkError;

/// File append sink adapter
pub struct FileSink {
    id: EndpointId,
    writer: BufWriter<File>,
}

impl FileSink {
    /// Open or create `path` for appending
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Open`] if the file cannot be opened or created.
    pub async fn open(path: &Path) -> Result<Self, SinkError> {
        let id = EndpointId::new(format!("file://{}", path.display()));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| SinkError::Open {
                path: PathBuf::from(path),
                source: e,
            })?;

        tracing::info!(endpoint = %id, "file sink opened");

        Ok(Self {
            id,
            writer: BufWriter::new(file),
        })
    }

    fn write_err(&self, source: std::io::Error) -> SinkError {
        SinkError::Write {
            endpoint: self.id.clone(),
            source,
        }
    }
}

#[async_trait]
impl crate::RecordSink for FileSink {
    fn id(&self) -> &EndpointId {
        &self.id
    }

    async fn send(&mut self, record: &Record) -> Result<(), SinkError> {
        self.writer
            .write_all(record.payload())
            .await
            .map_err(|e| self.write_err(e))?;
        self.writer
            .write_all(b"\n")
            .await
            .map_err(|e| self.write_err(e))
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush().await.map_err(|e| self.write_err(e))
    }
}

#[cfg(test)]
#[path = "file_test.rs"]
mod file_test;
