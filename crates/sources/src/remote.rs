//! TCP connect source (read-remote)
//!
//! The less common inverse of the listen source: connect out to a remote
//! endpoint and read newline-delimited records until the peer closes the
//! stream. Used to drain a remote spooler that only speaks "connect to me
//! and read".

use std::net::SocketAddr;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

use relog_protocol::{trim_line, EndpointId, Record, Transport};

use crate::{resolve_addr, SourceError, SourceOptions};

/// TCP connect (read-remote) source adapter
pub struct TcpConnectSource {
    id: EndpointId,
    reader: BufReader<TcpStream>,
    local_addr: SocketAddr,
    line: Vec<u8>,
    max_message_size: usize,
}

impl TcpConnectSource {
    /// Connect to `host:port` and start reading
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Connect`] if resolution, the connection, or
    /// the connect timeout fails.
    pub async fn open(host: &str, port: u16, options: &SourceOptions) -> Result<Self, SourceError> {
        let id = EndpointId::new(format!("{}://{host}:{port}", Transport::Tcp));

        let connect_err = |e: std::io::Error| SourceError::Connect {
            endpoint: id.clone(),
            source: e,
        };

        let addr = resolve_addr(host, port).await.map_err(connect_err)?;

        let stream = match timeout(options.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(connect_err(e)),
            Err(_) => {
                return Err(connect_err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "connection timed out",
                )));
            }
        };

        let local_addr = stream.local_addr().map_err(connect_err)?;

        tracing::info!(endpoint = %id, "read-remote source connected");

        Ok(Self {
            id,
            reader: BufReader::new(stream),
            local_addr,
            line: Vec::new(),
            max_message_size: options.max_message_size,
        })
    }
}

#[async_trait]
impl crate::RecordSource for TcpConnectSource {
    fn id(&self) -> &EndpointId {
        &self.id
    }

    async fn next_record(&mut self) -> Result<Option<Record>, SourceError> {
        loop {
            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line).await {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    if n > self.max_message_size {
                        tracing::debug!(
                            endpoint = %self.id,
                            size = n,
                            max = self.max_message_size,
                            "line too large, dropping"
                        );
                        continue;
                    }

                    let message = trim_line(&self.line);
                    if message.is_empty() {
                        continue;
                    }

                    return Ok(Some(Record::new(
                        Bytes::copy_from_slice(message),
                        self.id.clone(),
                    )));
                }
                Err(e) => {
                    return Err(SourceError::Read {
                        endpoint: self.id.clone(),
                        source: e,
                    });
                }
            }
        }
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        Some(self.local_addr)
    }
}

#[cfg(test)]
#[path = "remote_test.rs"]
mod remote_test;
