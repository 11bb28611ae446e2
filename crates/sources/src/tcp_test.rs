//! TCP listen source tests

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::{RecordSource, SourceOptions};

use super::TcpListenSource;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

async fn open_localhost() -> (TcpListenSource, std::net::SocketAddr) {
    let source = TcpListenSource::open("127.0.0.1", 0, &SourceOptions::default())
        .await
        .expect("bind failed");
    let addr = source.local_addr().expect("no local addr");
    (source, addr)
}

#[tokio::test]
async fn test_lines_become_records_in_order() {
    let (mut source, addr) = open_localhost().await;

    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(b"first\nsecond\n").await.unwrap();

    let first = timeout(RECV_TIMEOUT, source.next_record())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let second = timeout(RECV_TIMEOUT, source.next_record())
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert_eq!(first.payload(), b"first");
    assert_eq!(second.payload(), b"second");
}

#[tokio::test]
async fn test_disconnect_is_not_fatal() {
    let (mut source, addr) = open_localhost().await;

    {
        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"from first\n").await.unwrap();
        client.shutdown().await.unwrap();
    }

    let record = timeout(RECV_TIMEOUT, source.next_record())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(record.payload(), b"from first");

    // Listener keeps serving new connections after the first peer is gone.
    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(b"from second\n").await.unwrap();

    let record = timeout(RECV_TIMEOUT, source.next_record())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(record.payload(), b"from second");
}

#[tokio::test]
async fn test_interleaved_connections() {
    let (mut source, addr) = open_localhost().await;

    let mut a = TcpStream::connect(addr).await.unwrap();
    let mut b = TcpStream::connect(addr).await.unwrap();
    a.write_all(b"a1\n").await.unwrap();
    b.write_all(b"b1\n").await.unwrap();

    let mut payloads = Vec::new();
    for _ in 0..2 {
        let record = timeout(RECV_TIMEOUT, source.next_record())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        payloads.push(record.payload().to_vec());
    }
    payloads.sort();
    assert_eq!(payloads, vec![b"a1".to_vec(), b"b1".to_vec()]);
}

#[tokio::test]
async fn test_bind_conflict_reported() {
    let (_source, addr) = open_localhost().await;

    let err = TcpListenSource::open("127.0.0.1", addr.port(), &SourceOptions::default())
        .await
        .err()
        .expect("second bind should fail");
    assert!(matches!(err, crate::SourceError::Bind { .. }));
}
