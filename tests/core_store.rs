use chrono::{DateTime, TimeZone, Utc};

use fdlog::{
    contact::{ContactDraft, ContactPatch, ValidationError},
    core::store::{ContactStore, SortOrder, StoreError},
    op::Op,
    types::{Band, Mode},
};

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 22, 18, minute, 0).unwrap()
}

fn draft(call: &str, band: Band, mode: Mode, minute: u32) -> ContactDraft {
    ContactDraft {
        callsign: call.to_string(),
        exchange_class: "3A".to_string(),
        exchange_section: "EMA".to_string(),
        timestamp: at(minute),
        frequency_hz: 0,
        band,
        mode,
        power_watts: 5,
        grid: String::new(),
        operator_name: String::new(),
    }
}

#[test]
fn append_assigns_increasing_ids_and_normalizes() {
    let mut store = ContactStore::new();
    let (a, op) = store.append(draft("w1aw", Band::B20, Mode::CW, 1)).expect("a");
    let (b, _) = store.append(draft("K1ABC", Band::B20, Mode::CW, 2)).expect("b");
    assert_eq!((a, b), (1, 2));
    assert!(matches!(op.op, Op::Insert { .. }));
    assert_eq!(store.get(a).map(|c| c.callsign.as_str()), Some("W1AW"));
    assert_eq!(store.drain_pending_ops().len(), 2);
    assert_eq!(store.latest_op_seq(), 2);
}

#[test]
fn invalid_draft_is_rejected_without_side_effects() {
    let mut store = ContactStore::new();
    let mut bad = draft("W1AW", Band::B20, Mode::CW, 1);
    bad.exchange_section = "E1".to_string();
    let err = store.append(bad).expect_err("must reject");
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::InvalidSection(_))
    ));
    assert!(store.is_empty());
    assert_eq!(store.next_contact_id(), 1);
    assert_eq!(store.latest_op_seq(), 0);
}

#[test]
fn deleted_ids_are_never_reused() {
    let mut store = ContactStore::new();
    let (a, _) = store.append(draft("W1AW", Band::B20, Mode::CW, 1)).expect("a");
    store.delete(a).expect("delete");
    let (b, _) = store.append(draft("W1AW", Band::B20, Mode::CW, 2)).expect("b");
    assert_eq!(b, 2);
    assert!(store.get(a).is_none());
    assert_eq!(store.delete(a), Err(StoreError::MissingContact(a)));
}

#[test]
fn update_moves_dupe_key() {
    let mut store = ContactStore::new();
    let (id, _) = store.append(draft("W1AW", Band::B20, Mode::CW, 1)).expect("append");
    store
        .update(
            id,
            &ContactPatch {
                band: Some(Band::B40),
                ..ContactPatch::default()
            },
        )
        .expect("update");
    assert!(store.by_dupe_key("W1AW", Band::B20, Mode::CW).is_empty());
    assert_eq!(store.by_dupe_key("w1aw", Band::B40, Mode::CW).len(), 1);
}

#[test]
fn invalid_update_leaves_record_untouched() {
    let mut store = ContactStore::new();
    let (id, _) = store.append(draft("W1AW", Band::B20, Mode::CW, 1)).expect("append");
    let before = store.get_cloned(id);
    let err = store
        .update(
            id,
            &ContactPatch {
                power_watts: Some(0),
                ..ContactPatch::default()
            },
        )
        .expect_err("zero power");
    assert_eq!(err, StoreError::Validation(ValidationError::ZeroPower));
    assert_eq!(store.get_cloned(id), before);
}

#[test]
fn get_all_sorts_by_timestamp_then_id() {
    let mut store = ContactStore::new();
    store.append(draft("K3C", Band::B20, Mode::CW, 30)).expect("1");
    store.append(draft("K1A", Band::B20, Mode::CW, 10)).expect("2");
    store.append(draft("K2B", Band::B20, Mode::PH, 10)).expect("3");

    let asc: Vec<_> = store.get_all(SortOrder::Ascending).iter().map(|c| c.id).collect();
    assert_eq!(asc, vec![2, 3, 1]);
    let desc: Vec<_> = store.get_all(SortOrder::Descending).iter().map(|c| c.id).collect();
    assert_eq!(desc, vec![1, 3, 2]);
}

#[test]
fn snapshot_restores_ids_and_indices() {
    let mut store = ContactStore::new();
    for (i, call) in ["W1AW", "K1ABC", "N0CALL"].iter().enumerate() {
        store.append(draft(call, Band::B40, Mode::DI, i as u32)).expect("append");
    }
    store.delete(2).expect("delete");

    let restored = ContactStore::from_snapshot(store.export_snapshot()).expect("restore");
    assert_eq!(restored.ordered_ids(), &[1, 3]);
    assert_eq!(restored.next_contact_id(), 4);
    assert_eq!(restored.by_dupe_key("N0CALL", Band::B40, Mode::DI).len(), 1);
    assert!(restored.by_dupe_key("K1ABC", Band::B40, Mode::DI).is_empty());
}
