//! UDP send sink
//!
//! One datagram per record, connected at construction so the destination
//! address is resolved exactly once. Datagram delivery is best-effort by
//! nature: an ICMP-induced "connection refused" (nothing listening on the
//! peer yet) is logged and the record dropped, without killing the adapter;
//! the peer may come up later.

use async_trait::async_trait;
use tokio::net::UdpSocket;

use relog_protocol::{EndpointId, Record, Transport};

use crate::SinkError;

/// UDP send sink adapter
pub struct UdpSink {
    id: EndpointId,
    socket: UdpSocket,
}

impl UdpSink {
    /// Resolve `host:port` and connect a datagram socket to it
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Connect`] if resolution or the connect fails.
    pub async fn open(host: &str, port: u16) -> Result<Self, SinkError> {
        let id = EndpointId::new(format!("{}://{host}:{port}", Transport::Udp));

        let connect_err = |e: std::io::Error| SinkError::Connect {
            endpoint: id.clone(),
            source: e,
        };

        let addr = tokio::net::lookup_host((host, port))
            .await
            .map_err(connect_err)?
            .next()
            .ok_or_else(|| {
                connect_err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no addresses resolved for {host}:{port}"),
                ))
            })?;

        let bind_addr = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr).await.map_err(connect_err)?;
        socket.connect(addr).await.map_err(connect_err)?;

        tracing::info!(endpoint = %id, "UDP sink connected");

        Ok(Self { id, socket })
    }
}

#[async_trait]
impl crate::RecordSink for UdpSink {
    fn id(&self) -> &EndpointId {
        &self.id
    }

    async fn send(&mut self, record: &Record) -> Result<(), SinkError> {
        match self.socket.send(record.payload()).await {
            Ok(_) => Ok(()),
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::ConnectionReset
                ) =>
            {
                tracing::debug!(
                    endpoint = %self.id,
                    error = %e,
                    "peer not receiving, record dropped"
                );
                Ok(())
            }
            Err(e) => Err(SinkError::Write {
                endpoint: self.id.clone(),
                source: e,
            }),
        }
    }
}

#[cfg(test)]
#[path = "udp_test.rs"]
mod udp_test;
