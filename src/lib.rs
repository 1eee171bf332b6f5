//! Field Day contact logger core.
//!
//! Contacts arrive as UDP datagrams from a digital-mode application or by
//! manual entry, are serialized through one writer task that journals them
//! to SQLite, and feed duplicate checks, section coverage and the claimed
//! score. ADIF and Cabrillo submission files are generated on demand.
//!
//! # Examples
//!
//! In-memory usage with [`core::store::ContactStore`]:
//! ```
//! use chrono::{TimeZone, Utc};
//! use fdlog::{
//!     contact::ContactDraft,
//!     core::{indices::DupeIndex, store::ContactStore},
//!     types::{Band, Mode},
//! };
//!
//! let mut store = ContactStore::new();
//! let (id, _op) = store.append(ContactDraft {
//!     callsign: "W1AW".to_string(),
//!     exchange_class: "2A".to_string(),
//!     exchange_section: "CT".to_string(),
//!     timestamp: Utc.with_ymd_and_hms(2024, 6, 22, 18, 5, 0).unwrap(),
//!     frequency_hz: 7_030_000,
//!     band: Band::B40,
//!     mode: Mode::CW,
//!     power_watts: 5,
//!     grid: String::new(),
//!     operator_name: String::new(),
//! }).expect("append");
//! assert_eq!(id, 1);
//!
//! let dupes = DupeIndex::build(store.iter());
//! assert!(dupes.is_duplicate("W1AW", Band::B40, Mode::CW));
//! assert!(!dupes.is_duplicate("W1AW", Band::B20, Mode::CW));
//! ```
//!
//! Runtime usage with SQLite sink:
//! ```no_run
//! use fdlog::{
//!     persist::sqlite::SqliteOpSink,
//!     runtime::{RuntimeConfig, spawn_fdlog},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let sink = SqliteOpSink::open("fieldday.db").expect("open sqlite");
//! let store = sink.load_store().expect("replay");
//! let handle = spawn_fdlog(store, Some(Box::new(sink)), RuntimeConfig::default());
//! let score = handle.score().await.expect("score");
//! println!("claimed {}", score.final_score);
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```

/// Operator preferences and session settings.
pub mod config;
/// Contact records and validation.
pub mod contact;
/// Core in-memory store and derived views.
pub mod core;
/// Scoring, tallies and rate.
pub mod engine;
/// ADIF, Cabrillo and statistics files.
pub mod export;
/// Maidenhead geodesy.
pub mod geo;
/// UDP ingestion loop.
pub mod listener;
/// Callsign lookup contract.
pub mod lookup;
/// Mutation op model and persistence wrapper types.
pub mod op;
/// Datagram decoding and contact assembly.
pub mod packet;
/// Persistence abstraction and SQLite implementation.
pub mod persist;
/// Remote log sync client.
pub mod remote;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Super check partial callsign list.
pub mod scp;
/// Section reference data.
pub mod sections;
/// Session wiring.
pub mod session;
/// Shared primitive types and enums.
pub mod types;
