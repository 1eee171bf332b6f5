use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{TimeZone, Utc};

use fdlog::{
    contact::{ContactDraft, ContactPatch},
    core::store::{ContactStore, SortOrder},
    engine::PowerCategory,
    op::StoredOp,
    persist::{OpSink, PersistError, PersistResult},
    runtime::{AckMode, DupeNotice, LogEvent, RuntimeConfig, RuntimeError, spawn_fdlog},
    types::{Band, Mode, OpSeq},
};

fn draft(call: &str, band: Band, mode: Mode, power: u32) -> ContactDraft {
    ContactDraft {
        callsign: call.to_string(),
        exchange_class: "1D".to_string(),
        exchange_section: "ORG".to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 6, 22, 20, 0, 0).unwrap(),
        frequency_hz: 0,
        band,
        mode,
        power_watts: power,
        grid: String::new(),
        operator_name: String::new(),
    }
}

/// Records every op it is handed; fails once `fail` is set.
#[derive(Default, Clone)]
struct RecordingSink {
    seen: Arc<Mutex<Vec<OpSeq>>>,
    fail: Arc<Mutex<bool>>,
}

impl OpSink for RecordingSink {
    fn append_ops(&mut self, ops: &[StoredOp]) -> PersistResult<OpSeq> {
        if *self.fail.lock().expect("lock") {
            return Err(PersistError::Message("disk full".to_string()));
        }
        let mut seen = self.seen.lock().expect("lock");
        seen.extend(ops.iter().map(|o| o.seq));
        Ok(ops.last().map(|o| o.seq).unwrap_or(0))
    }
}

async fn next_non_durable(sub: &mut tokio::sync::broadcast::Receiver<LogEvent>) -> LogEvent {
    loop {
        let evt = tokio::time::timeout(Duration::from_secs(1), sub.recv())
            .await
            .expect("event")
            .expect("recv");
        if !matches!(evt, LogEvent::DurableUpTo { .. }) {
            return evt;
        }
    }
}

#[tokio::test]
async fn append_update_delete_emit_ordered_events() {
    let handle = spawn_fdlog(ContactStore::new(), None, RuntimeConfig::default());
    let mut sub = handle.subscribe();

    let id = handle
        .append(draft("k1abc", Band::B20, Mode::CW, 5))
        .await
        .expect("append");
    assert!(matches!(next_non_durable(&mut sub).await, LogEvent::ScoreChanged { .. }));
    assert_eq!(next_non_durable(&mut sub).await, LogEvent::Inserted { id });

    handle
        .update(
            id,
            ContactPatch {
                exchange_section: Some("wwa".to_string()),
                ..ContactPatch::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(next_non_durable(&mut sub).await, LogEvent::Updated { id });

    let rec = handle.get(id).await.expect("get").expect("record");
    assert_eq!(rec.callsign, "K1ABC");
    assert_eq!(rec.exchange_section, "WWA");
    assert!(handle.worked("WWA").await.expect("worked"));
    assert!(!handle.worked("ORG").await.expect("worked"));

    handle.delete(id).await.expect("delete");
    assert!(matches!(next_non_durable(&mut sub).await, LogEvent::ScoreChanged { .. }));
    assert_eq!(next_non_durable(&mut sub).await, LogEvent::Deleted { id });
    assert!(handle.all(SortOrder::Ascending).await.expect("all").is_empty());

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn score_and_dupes_follow_the_log() {
    let handle = spawn_fdlog(ContactStore::new(), None, RuntimeConfig::default());

    handle.append(draft("W1AW", Band::B40, Mode::CW, 5)).await.expect("1");
    handle.append(draft("W1AW", Band::B40, Mode::PH, 5)).await.expect("2");
    handle.append(draft("K6GTE", Band::B20, Mode::DI, 5)).await.expect("3");

    let score = handle.score().await.expect("score");
    assert_eq!(score.basic_score, 5);
    assert_eq!(score.band_mode_mults, 3);
    assert_eq!(score.power_category, PowerCategory::Qrp);
    assert_eq!(score.final_score, 25);

    assert!(handle.is_duplicate("w1aw", Band::B40, Mode::CW).await.expect("dupe"));
    assert!(!handle.is_duplicate("W1AW", Band::B20, Mode::CW).await.expect("dupe"));
    assert_eq!(
        handle.worked_on("W1AW").await.expect("worked_on"),
        vec![(Band::B40, Mode::CW), (Band::B40, Mode::PH)]
    );

    handle.append(draft("N0CALL", Band::B20, Mode::DI, 150)).await.expect("4");
    let score = handle.score().await.expect("score");
    assert_eq!(score.power_category, PowerCategory::High);
    assert_eq!(score.final_score, score.basic_score);

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn invalid_append_is_rejected() {
    let handle = spawn_fdlog(ContactStore::new(), None, RuntimeConfig::default());
    let err = handle
        .append(draft("W1AW", Band::B40, Mode::CW, 0))
        .await
        .expect_err("zero power");
    assert!(matches!(err, RuntimeError::Store(_)));
    assert!(handle.all(SortOrder::Ascending).await.expect("all").is_empty());
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn status_dupe_notice_is_taken_once() {
    let handle = spawn_fdlog(ContactStore::new(), None, RuntimeConfig::default());
    handle.append(draft("W1AW", Band::B40, Mode::DI, 5)).await.expect("append");

    assert_eq!(handle.observe_status("W1AW").await.expect("status"), None);

    handle.set_station(Band::B40, Mode::DI).await.expect("station");
    let notice = handle
        .observe_status("w1aw")
        .await
        .expect("status")
        .expect("notice");
    assert_eq!(
        notice,
        DupeNotice {
            call: "W1AW".to_string(),
            band: Band::B40,
            mode: Mode::DI,
        }
    );
    assert_eq!(notice.to_string(), "W1AW 40M DI dupe!");

    assert_eq!(handle.take_notice().await.expect("take"), Some(notice));
    assert_eq!(handle.take_notice().await.expect("take"), None);

    assert_eq!(handle.observe_status("K1ABC").await.expect("status"), None);
    assert_eq!(handle.observe_status("").await.expect("status"), None);

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn durable_failure_leaves_memory_untouched() {
    let sink = RecordingSink::default();
    let fail = Arc::clone(&sink.fail);
    let seen = Arc::clone(&sink.seen);
    let handle = spawn_fdlog(ContactStore::new(), Some(Box::new(sink)), RuntimeConfig::default());
    let mut sub = handle.subscribe();

    let first = handle.append(draft("W1AW", Band::B40, Mode::CW, 5)).await.expect("first");
    assert_eq!(seen.lock().expect("lock").as_slice(), &[1]);

    *fail.lock().expect("lock") = true;
    let err = handle
        .append(draft("K1ABC", Band::B40, Mode::CW, 5))
        .await
        .expect_err("journal write fails");
    assert!(matches!(err, RuntimeError::Persist(_)));

    let all = handle.all(SortOrder::Ascending).await.expect("all");
    assert_eq!(all.iter().map(|c| c.id).collect::<Vec<_>>(), vec![first]);
    assert!(!handle.is_duplicate("K1ABC", Band::B40, Mode::CW).await.expect("dupe"));

    let mut failure_seen = false;
    while let Ok(Ok(evt)) = tokio::time::timeout(Duration::from_millis(200), sub.recv()).await {
        if matches!(evt, LogEvent::PersistFailed { .. }) {
            failure_seen = true;
            break;
        }
    }
    assert!(failure_seen, "expected PersistFailed event");

    *fail.lock().expect("lock") = false;
    let next = handle.append(draft("K1ABC", Band::B40, Mode::CW, 5)).await.expect("retry");
    assert_eq!(next, first + 1);

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn in_memory_ack_commits_before_the_write() {
    let sink = RecordingSink::default();
    let seen = Arc::clone(&sink.seen);
    let cfg = RuntimeConfig {
        ack_mode: AckMode::InMemory,
        flush_on_insert: false,
        batch_max_ops: 64,
        batch_max_latency_ms: 20,
        ..RuntimeConfig::default()
    };
    let handle = spawn_fdlog(ContactStore::new(), Some(Box::new(sink)), cfg);

    for i in 0..5u32 {
        handle
            .append(draft(&format!("K{i}AA"), Band::B20, Mode::PH, 5))
            .await
            .expect("append");
    }
    assert_eq!(handle.all(SortOrder::Ascending).await.expect("all").len(), 5);

    let durable = handle.flush().await.expect("flush");
    assert_eq!(durable, 5);
    assert_eq!(seen.lock().expect("lock").as_slice(), &[1, 2, 3, 4, 5]);

    handle.shutdown().await.expect("shutdown");
}
