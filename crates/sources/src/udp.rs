//! UDP listen source
//!
//! Receives one record per datagram, the transport classic syslog senders
//! speak. The socket is built with `socket2` so the receive buffer can be
//! sized for bursts before the bind.
//!
//! Transient receive errors (ICMP-induced resets, interrupts) are logged
//! and skipped; the adapter keeps serving. Only an unrecoverable socket
//! error ends the stream.

use std::net::SocketAddr;

use bytes::Bytes;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use relog_protocol::{trim_line, EndpointId, Record, Transport};

use crate::error::is_transient;
use crate::{resolve_addr, SourceError, SourceOptions};

use async_trait::async_trait;

/// UDP listen source adapter
pub struct UdpListenSource {
    id: EndpointId,
    socket: UdpSocket,
    local_addr: SocketAddr,
    /// One byte larger than the limit so oversized datagrams are detectable
    recv_buf: Vec<u8>,
    max_message_size: usize,
}

impl UdpListenSource {
    /// Bind `host:port` and start receiving
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Bind`] if the address cannot be resolved or
    /// bound (address in use, permission denied).
    pub async fn open(host: &str, port: u16, options: &SourceOptions) -> Result<Self, SourceError> {
        let id = EndpointId::new(format!("{}://{host}:{port}", Transport::Udp));

        let addr = resolve_addr(host, port).await.map_err(|e| SourceError::Bind {
            endpoint: id.clone(),
            source: e,
        })?;

        let socket = build_socket(addr, options.recv_buffer_size).map_err(|e| SourceError::Bind {
            endpoint: id.clone(),
            source: e,
        })?;

        let local_addr = socket.local_addr().map_err(|e| SourceError::Bind {
            endpoint: id.clone(),
            source: e,
        })?;

        tracing::info!(endpoint = %id, local_addr = %local_addr, "UDP source listening");

        Ok(Self {
            id,
            socket,
            local_addr,
            recv_buf: vec![0u8; options.max_message_size + 1],
            max_message_size: options.max_message_size,
        })
    }
}

#[async_trait]
impl crate::RecordSource for UdpListenSource {
    fn id(&self) -> &EndpointId {
        &self.id
    }

    async fn next_record(&mut self) -> Result<Option<Record>, SourceError> {
        loop {
            match self.socket.recv_from(&mut self.recv_buf).await {
                Ok((len, peer)) => {
                    if len > self.max_message_size {
                        tracing::debug!(
                            endpoint = %self.id,
                            peer = %peer,
                            size = len,
                            max = self.max_message_size,
                            "datagram too large, dropping"
                        );
                        continue;
                    }

                    let message = trim_line(&self.recv_buf[..len]);
                    if message.is_empty() {
                        continue;
                    }

                    return Ok(Some(Record::new(
                        Bytes::copy_from_slice(message),
                        self.id.clone(),
                    )));
                }
                Err(e) if is_transient(&e) => {
                    tracing::debug!(endpoint = %self.id, error = %e, "transient recv error");
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

/// Build a UDP socket with reuse-addr and a tuned receive buffer
fn build_socket(addr: SocketAddr, recv_buffer_size: usize) -> std::io::Result<UdpSocket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;

    if let Err(e) = socket.set_recv_buffer_size(recv_buffer_size) {
        tracing::warn!(
            error = %e,
            requested_size = recv_buffer_size,
            "failed to set UDP SO_RCVBUF"
        );
    }

    socket.bind(&addr.into())?;
    socket.set_nonblocking(true)?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket)
}

#[cfg(test)]
#[path = "udp_test.rs"]
mod udp_test;
