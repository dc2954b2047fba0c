//! End-to-end replay through the feed service
//!
//! Writes a JSON-lines capture, pumps it through a running service with the
//! throttle enabled, and checks what a reader ends up seeing.

use std::io::Write;
use std::time::Duration;

use book_feed::source::{pump, PumpStats};
use book_feed::{spawn, FeedConfig, JsonLinesSource};
use serde_json::json;
use tokio::time::Instant;

fn write_capture(lines: &[String]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}

#[tokio::test(start_paused = true)]
async fn test_replay_with_noise_converges_to_latest() {
    let capture = write_capture(&[
        json!({"bids": [["100.0", "5"], ["99.5", "3"]], "asks": [["100.5", "1"]], "sequence": 1}).to_string(),
        "{not json".to_string(),
        json!({"bids": [["100.0", "5"]], "asks": [["100.5", "1"]], "sequence": "2"}).to_string(),
        json!({"bids": [["100.0", "5"], ["99.5", "0"], ["99.0", "2"]], "asks": [["100.5", "1"]], "sequence": 3}).to_string(),
        json!({"bids": [["100.0", "5"]], "asks": [["100.5", "1"]], "sequence": 2}).to_string(),
        String::new(),
        json!({"bids": [["100.0", "4"], ["99.0", "2"]], "asks": [["100.5", "1"], ["101", "6"]], "sequence": 5}).to_string(),
    ]);

    let (sender, mut reader, handle) = spawn(FeedConfig::default());
    let metrics = handle.metrics();

    let mut source = JsonLinesSource::open(capture.path()).await.unwrap();
    let stats = pump(&mut source, &sender, None).await.unwrap();
    assert_eq!(
        stats,
        PumpStats {
            delivered: 5,
            undecodable: 1
        }
    );

    let view = reader.wait_for_sequence(5).await.unwrap();
    assert_eq!(view.book.sequence, 5);
    assert_eq!(view.book.bids[0].price, "100.0");
    assert_eq!(view.book.bids[0].size, "4");
    assert_eq!(view.book.bids[1].total, "6");
    assert_eq!(view.book.asks[1].total, "7");

    // 99.5 leaves the book exactly once, whether or not sequence 3 ran
    // before being coalesced with sequence 5.
    let removed = view
        .changes
        .iter()
        .find(|change| change.price == "99.5")
        .unwrap();
    assert_eq!(removed.old_size, "3");
    assert_eq!(removed.new_size, "0");
    assert_eq!(
        view.changes.iter().filter(|change| change.price == "99.5").count(),
        1
    );

    drop(sender);
    handle.join().await.unwrap();

    assert_eq!(metrics.messages_received(), 5);
    assert_eq!(metrics.messages_malformed(), 1);
    assert!(metrics.updates_published() >= 2);
    assert_eq!(metrics.updates_failed(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_paced_replay_applies_every_update() {
    let lines: Vec<String> = (1..=4u64)
        .map(|seq| {
            json!({
                "bids": [["100", seq.to_string()]],
                "asks": [["101", "1"]],
                "sequence": seq
            })
            .to_string()
        })
        .collect();
    let capture = write_capture(&lines);

    let (sender, reader, handle) = spawn(FeedConfig::default());
    let metrics = handle.metrics();

    let mut source = JsonLinesSource::open(capture.path()).await.unwrap();
    pump(&mut source, &sender, Some(Duration::from_millis(600)))
        .await
        .unwrap();
    drop(sender);

    let final_view = handle.join().await.unwrap();
    assert_eq!(final_view.book.sequence, 4);
    assert_eq!(reader.sequence(), 4);
    assert_eq!(metrics.updates_published(), 4);
    assert_eq!(metrics.updates_coalesced(), 0);
    assert_eq!(final_view.changes.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_latest_update_applied_within_one_interval() {
    let (sender, mut reader, handle) = spawn(FeedConfig::default());

    let update = |seq: u64| {
        json!({"bids": [["100", "1"]], "asks": [["101", seq.to_string()]], "sequence": seq})
    };

    sender.deliver(update(1)).await.unwrap();
    reader.wait_for_sequence(1).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    let arrival = Instant::now();
    for seq in 2..=4 {
        sender.deliver(update(seq)).await.unwrap();
    }

    let view = reader.changed().await.unwrap();
    assert_eq!(view.book.sequence, 4);
    assert!(arrival.elapsed() <= Duration::from_millis(500));

    handle.shutdown().await.unwrap();
}
