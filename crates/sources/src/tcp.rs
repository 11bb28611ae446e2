//! TCP listen source
//!
//! Accepts any number of connections and merges their newline-delimited
//! records into one stream. An internal accept task spawns one reader per
//! connection; readers feed a bounded channel the adapter consumes from.
//!
//! Per-connection errors and disconnects are non-fatal: the listener keeps
//! serving other and future connections. Dropping the adapter aborts the
//! accept task and, with it, every connection reader.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

use relog_protocol::{trim_line, EndpointId, Record, Transport};

use crate::{resolve_addr, SourceError, SourceOptions};

/// Pause after a failed accept before retrying
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// TCP listen source adapter
pub struct TcpListenSource {
    id: EndpointId,
    local_addr: SocketAddr,
    rx: mpsc::Receiver<Record>,
    accept_task: JoinHandle<()>,
}

impl TcpListenSource {
    /// Bind `host:port` and start accepting connections
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Bind`] if the address cannot be resolved or
    /// bound.
    pub async fn open(host: &str, port: u16, options: &SourceOptions) -> Result<Self, SourceError> {
        let id = EndpointId::new(format!("{}://{host}:{port}", Transport::Tcp));

        let addr = resolve_addr(host, port).await.map_err(|e| SourceError::Bind {
            endpoint: id.clone(),
            source: e,
        })?;

        let listener = TcpListener::bind(addr).await.map_err(|e| SourceError::Bind {
            endpoint: id.clone(),
            source: e,
        })?;

        let local_addr = listener.local_addr().map_err(|e| SourceError::Bind {
            endpoint: id.clone(),
            source: e,
        })?;

        tracing::info!(endpoint = %id, local_addr = %local_addr, "TCP source listening");

        let (tx, rx) = mpsc::channel(options.queue_size);
        let accept_task = tokio::spawn(accept_loop(
            listener,
            tx,
            id.clone(),
            options.max_message_size,
        ));

        Ok(Self {
            id,
            local_addr,
            rx,
            accept_task,
        })
    }
}

#[async_trait]
impl crate::RecordSource for TcpListenSource {
    fn id(&self) -> &EndpointId {
        &self.id
    }

    async fn next_record(&mut self) -> Result<Option<Record>, SourceError> {
        // None means the accept task is gone - end of stream.
        Ok(self.rx.recv().await)
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        Some(self.local_addr)
    }
}

impl Drop for TcpListenSource {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

/// Accept connections and spawn one reader per connection
async fn accept_loop(
    listener: TcpListener,
    tx: mpsc::Sender<Record>,
    id: EndpointId,
    max_message_size: usize,
) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tracing::debug!(endpoint = %id, peer = %peer, "connection accepted");
                    connections.spawn(read_connection(
                        stream,
                        peer,
                        tx.clone(),
                        id.clone(),
                        max_message_size,
                    ));
                }
                Err(e) => {
                    tracing::warn!(endpoint = %id, error = %e, "accept failed");
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                }
            },

            // Adapter dropped its receiver - stop accepting.
            _ = tx.closed() => break,

            // Reap finished connection readers.
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }
}

/// Read newline-delimited records from one connection until it closes
async fn read_connection(
    stream: TcpStream,
    peer: SocketAddr,
    tx: mpsc::Sender<Record>,
    id: EndpointId,
    max_message_size: usize,
) {
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => {
                tracing::debug!(endpoint = %id, peer = %peer, "peer disconnected");
                break;
            }
            Ok(n) => {
                if n > max_message_size {
                    tracing::debug!(
                        endpoint = %id,
                        peer = %peer,
                        size = n,
                        max = max_message_size,
                        "line too large, dropping"
                    );
                    continue;
                }

                let message = trim_line(&line);
                if message.is_empty() {
                    continue;
                }

                let record = Record::new(Bytes::copy_from_slice(message), id.clone());
                if tx.send(record).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!(endpoint = %id, peer = %peer, error = %e, "read error, dropping connection");
                break;
            }
        }
    }
}

#[cfg(test)]
#[path = "tcp_test.rs"]
mod tcp_test;
