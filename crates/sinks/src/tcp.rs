//! TCP send sink
//!
//! Newline-framed records over a connection opened at construction.
//! A failed write invalidates the connection and triggers a bounded number
//! of reconnect-and-retry attempts; once exhausted, the adapter reports
//! [`SinkError::RetriesExhausted`] and is considered dead by its owner.

use std::io::ErrorKind;
use std::net::SocketAddr;

use async_trait::async_trait;
use socket2::{SockRef, TcpKeepalive};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

use relog_protocol::{EndpointId, Record, Transport};

use crate::{SinkError, SinkOptions};

/// TCP send sink adapter
pub struct TcpSink {
    id: EndpointId,
    host: String,
    port: u16,
    options: SinkOptions,
    stream: Option<TcpStream>,
}

impl TcpSink {
    /// Resolve `host:port` and open the initial connection
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Connect`] if resolution, the connection, or the
    /// connect timeout fails.
    pub async fn open(host: &str, port: u16, options: SinkOptions) -> Result<Self, SinkError> {
        let mut sink = Self {
            id: EndpointId::new(format!("{}://{host}:{port}", Transport::Tcp)),
            host: host.to_string(),
            port,
            options,
            stream: None,
        };
        sink.connect().await?;

        tracing::info!(endpoint = %sink.id, "TCP sink connected");
        Ok(sink)
    }

    /// (Re)connect to the destination, replacing any existing connection
    async fn connect(&mut self) -> Result<(), SinkError> {
        self.stream = None;

        let connect_err = |e: std::io::Error| SinkError::Connect {
            endpoint: self.id.clone(),
            source: e,
        };

        let addr = self.resolve().await.map_err(connect_err)?;

        let stream = match timeout(self.options.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(connect_err(e)),
            Err(_) => {
                return Err(connect_err(std::io::Error::new(
                    ErrorKind::TimedOut,
                    "connection timed out",
                )));
            }
        };

        // Lower latency for record-at-a-time writes (non-fatal if it fails)
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(endpoint = %self.id, error = %e, "failed to set TCP_NODELAY");
        }

        if self.options.tcp_keepalive {
            let sock_ref = SockRef::from(&stream);
            let keepalive = TcpKeepalive::new().with_time(self.options.tcp_keepalive_interval);

            #[cfg(target_os = "linux")]
            let keepalive = keepalive.with_interval(self.options.tcp_keepalive_interval);

            if let Err(e) = sock_ref.set_tcp_keepalive(&keepalive) {
                tracing::debug!(endpoint = %self.id, error = %e, "failed to set TCP keep-alive");
            }
        }

        self.stream = Some(stream);
        Ok(())
    }

    async fn resolve(&self) -> std::io::Result<SocketAddr> {
        tokio::net::lookup_host((self.host.as_str(), self.port))
            .await?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(
                    ErrorKind::NotFound,
                    format!("no addresses resolved for {}:{}", self.host, self.port),
                )
            })
    }

    /// Write one newline-framed record on the current connection
    async fn write_record(&mut self, record: &Record) -> std::io::Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| std::io::Error::new(ErrorKind::NotConnected, "no connection"))?;

        let write = async {
            stream.write_all(record.payload()).await?;
            stream.write_all(b"\n").await?;
            stream.flush().await
        };

        match timeout(self.options.write_timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                self.stream = None;
                Err(e)
            }
            Err(_) => {
                self.stream = None;
                Err(std::io::Error::new(ErrorKind::TimedOut, "write timed out"))
            }
        }
    }
}

#[async_trait]
impl crate::RecordSink for TcpSink {
    fn id(&self) -> &EndpointId {
        &self.id
    }

    async fn send(&mut self, record: &Record) -> Result<(), SinkError> {
        let attempts = self.options.retry_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(self.options.retry_interval).await;
            }

            if self.stream.is_none() {
                if let Err(e) = self.connect().await {
                    last_error = e.to_string();
                    tracing::debug!(
                        endpoint = %self.id,
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        error = %last_error,
                        "reconnect failed"
                    );
                    continue;
                }
                tracing::debug!(endpoint = %self.id, "reconnected");
            }

            match self.write_record(record).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    last_error = e.to_string();
                    tracing::debug!(
                        endpoint = %self.id,
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        error = %last_error,
                        "write attempt failed"
                    );
                }
            }
        }

        Err(SinkError::RetriesExhausted {
            endpoint: self.id.clone(),
            attempts,
            last_error,
        })
    }
}

#[cfg(test)]
#[path = "tcp_test.rs"]
mod tcp_test;
