//! File source tests

use std::io::Write;
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::timeout;

use crate::{RecordSource, SourceError, SourceOptions};

use super::FileSource;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn test_replay_yields_lines_in_order_then_ends() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "in.log", b"line one\nline two\nline three\n");

    let mut source = FileSource::open(&path, false, &SourceOptions::default())
        .await
        .unwrap();

    let mut lines = Vec::new();
    while let Some(record) = source.next_record().await.unwrap() {
        lines.push(record.payload().to_vec());
    }

    assert_eq!(
        lines,
        vec![
            b"line one".to_vec(),
            b"line two".to_vec(),
            b"line three".to_vec()
        ]
    );
}

#[tokio::test]
async fn test_replay_preserves_empty_lines() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "in.log", b"a\n\nb\n");

    let mut source = FileSource::open(&path, false, &SourceOptions::default())
        .await
        .unwrap();

    let mut lines = Vec::new();
    while let Some(record) = source.next_record().await.unwrap() {
        lines.push(record.payload().to_vec());
    }

    assert_eq!(lines, vec![b"a".to_vec(), b"".to_vec(), b"b".to_vec()]);
}

#[tokio::test]
async fn test_replay_emits_final_unterminated_line() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "in.log", b"complete\npartial");

    let mut source = FileSource::open(&path, false, &SourceOptions::default())
        .await
        .unwrap();

    assert_eq!(
        source.next_record().await.unwrap().unwrap().payload(),
        b"complete"
    );
    assert_eq!(
        source.next_record().await.unwrap().unwrap().payload(),
        b"partial"
    );
    assert!(source.next_record().await.unwrap().is_none());
}

#[tokio::test]
async fn test_tail_picks_up_appended_lines() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "grow.log", b"first\n");

    let options = SourceOptions {
        poll_interval: Duration::from_millis(10),
        ..Default::default()
    };
    let mut source = FileSource::open(&path, true, &options).await.unwrap();

    let first = timeout(RECV_TIMEOUT, source.next_record())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(first.payload(), b"first");

    // Append while the source is waiting at EOF.
    let path_clone = path.clone();
    let appender = tokio::task::spawn_blocking(move || {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(path_clone)
            .unwrap();
        file.write_all(b"appended\n").unwrap();
    });

    let appended = timeout(RECV_TIMEOUT, source.next_record())
        .await
        .expect("tail did not pick up appended line")
        .unwrap()
        .unwrap();
    assert_eq!(appended.payload(), b"appended");

    appender.await.unwrap();
}

#[tokio::test]
async fn test_tail_holds_back_partial_line() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "grow.log", b"par");

    let options = SourceOptions {
        poll_interval: Duration::from_millis(10),
        ..Default::default()
    };
    let mut source = FileSource::open(&path, true, &options).await.unwrap();

    // Nothing to emit yet: the line has no newline.
    let pending = timeout(Duration::from_millis(100), source.next_record()).await;
    assert!(pending.is_err(), "partial line must not be emitted");

    let path_clone = path.clone();
    tokio::task::spawn_blocking(move || {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(path_clone)
            .unwrap();
        file.write_all(b"tial\n").unwrap();
    })
    .await
    .unwrap();

    let record = timeout(RECV_TIMEOUT, source.next_record())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(record.payload(), b"partial");
}

#[tokio::test]
async fn test_missing_file_reported_at_open() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.log");

    let err = FileSource::open(&path, false, &SourceOptions::default())
        .await
        .err()
        .expect("open should fail");
    assert!(matches!(err, SourceError::Open { .. }));
}
