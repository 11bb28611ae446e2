//! Record and provenance types
//!
//! A [`Record`] is one log line in flight: an opaque byte payload plus the
//! identifier of the adapter that produced it. Provenance is carried for
//! diagnostics only - it never influences routing.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

/// Identifier for one endpoint adapter
///
/// Rendered like a URL (`udp://0.0.0.0:5140`, `file:///var/log/in.log`) so
/// log lines and status output read naturally. Cloning is cheap; the same id
/// is stamped onto every record an adapter produces.
///
/// # Example
///
/// ```
/// use relog_protocol::EndpointId;
///
/// let id = EndpointId::new("udp://0.0.0.0:5140");
/// assert_eq!(id.as_str(), "udp://0.0.0.0:5140");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointId(Arc<str>);

impl EndpointId {
    /// Create a new endpoint ID
    #[inline]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Get the ID as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EndpointId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for EndpointId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One log line in flight
///
/// The payload is an opaque byte sequence without a trailing newline;
/// destination adapters re-add framing as their transport requires (newline
/// for files and TCP, nothing for datagrams).
#[derive(Debug, Clone)]
pub struct Record {
    payload: Bytes,
    origin: EndpointId,
}

impl Record {
    /// Create a record from a payload and the adapter that produced it
    #[inline]
    pub fn new(payload: impl Into<Bytes>, origin: EndpointId) -> Self {
        Self {
            payload: payload.into(),
            origin,
        }
    }

    /// The raw payload bytes (no trailing newline)
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// The adapter that produced this record (diagnostics only)
    #[inline]
    pub fn origin(&self) -> &EndpointId {
        &self.origin
    }
}

/// Trim one trailing newline from a received payload (LF or CRLF)
#[inline]
pub fn trim_line(data: &[u8]) -> &[u8] {
    let mut end = data.len();

    if end > 0 && data[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && data[end - 1] == b'\r' {
            end -= 1;
        }
    }

    &data[..end]
}
