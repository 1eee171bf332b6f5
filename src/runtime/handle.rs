use std::sync::Arc;

use tokio::{
    sync::{Mutex, broadcast, mpsc, oneshot},
    time::{Duration, Instant},
};

use crate::{
    config::PowerThresholds,
    contact::{Contact, ContactDraft, ContactPatch},
    core::{
        indices::Derived,
        store::{ContactStore, SortOrder, StoreError, StoreSnapshotV1},
    },
    engine::{Score, compute_score},
    op::{Op, StoredOp},
    persist::{OpSink, PersistError},
    types::{Band, ContactId, Mode, OpSeq},
};

use super::events::{DupeNotice, LogEvent};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("log runtime is not running")]
    ChannelClosed,
}

/// When a mutation is acknowledged relative to its journal write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckMode {
    /// Memory changes only after the journal write commits. A failed write
    /// leaves the log exactly as it was.
    #[default]
    Durable,
    /// Memory changes first; the write is queued and batched.
    InMemory,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub ack_mode: AckMode,
    pub flush_on_insert: bool,
    pub batch_max_ops: usize,
    pub batch_max_latency_ms: u64,
    pub persist_queue_bound: usize,
    pub snapshot_every_ops: usize,
    pub compact_after_snapshot: bool,
    pub power_thresholds: PowerThresholds,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            ack_mode: AckMode::Durable,
            flush_on_insert: true,
            batch_max_ops: 32,
            batch_max_latency_ms: 75,
            persist_queue_bound: 64,
            snapshot_every_ops: 2000,
            compact_after_snapshot: false,
            power_thresholds: PowerThresholds::default(),
        }
    }
}

/// Cloneable handle to the single-writer log task.
#[derive(Clone)]
pub struct LogHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<LogEvent>,
}

enum Command {
    Append {
        draft: ContactDraft,
        resp: oneshot::Sender<Result<ContactId, RuntimeError>>,
    },
    Update {
        id: ContactId,
        patch: ContactPatch,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Delete {
        id: ContactId,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Get {
        id: ContactId,
        resp: oneshot::Sender<Option<Contact>>,
    },
    All {
        order: SortOrder,
        resp: oneshot::Sender<Vec<Contact>>,
    },
    IsDuplicate {
        call: String,
        band: Band,
        mode: Mode,
        resp: oneshot::Sender<bool>,
    },
    WorkedOn {
        call: String,
        resp: oneshot::Sender<Vec<(Band, Mode)>>,
    },
    Worked {
        section: String,
        resp: oneshot::Sender<bool>,
    },
    WorkedSections {
        resp: oneshot::Sender<Vec<String>>,
    },
    Score {
        resp: oneshot::Sender<Score>,
    },
    SetStation {
        band: Band,
        mode: Mode,
        resp: oneshot::Sender<()>,
    },
    ObserveStatus {
        dx_call: String,
        resp: oneshot::Sender<Option<DupeNotice>>,
    },
    TakeNotice {
        resp: oneshot::Sender<Option<DupeNotice>>,
    },
    Flush {
        resp: oneshot::Sender<Result<OpSeq, RuntimeError>>,
    },
    Checkpoint {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Shutdown {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
}

enum PersistMsg {
    Op(StoredOp),
    Write {
        ops: Vec<StoredOp>,
        resp: oneshot::Sender<Result<OpSeq, PersistError>>,
    },
    Flush {
        resp: oneshot::Sender<Result<OpSeq, PersistError>>,
    },
    Checkpoint {
        snapshot: StoreSnapshotV1,
        last_seq: OpSeq,
        compact: bool,
        resp: oneshot::Sender<Result<(), PersistError>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Everything the writer task owns.
struct LogState {
    store: ContactStore,
    derived: Derived,
    score: Score,
    thresholds: PowerThresholds,
    station: Option<(Band, Mode)>,
    notice: Option<DupeNotice>,
    ops_since_snapshot: usize,
}

impl LogState {
    fn new(store: ContactStore, thresholds: PowerThresholds) -> Self {
        let derived = Derived::build(store.iter());
        let score = compute_score(store.iter(), &thresholds);
        Self {
            store,
            derived,
            score,
            thresholds,
            station: None,
            notice: None,
            ops_since_snapshot: 0,
        }
    }

    /// Rebuilds every derived view from the store.
    fn refresh(&mut self, events_tx: &broadcast::Sender<LogEvent>) {
        self.derived = Derived::build(self.store.iter());
        let score = compute_score(self.store.iter(), &self.thresholds);
        if score != self.score {
            self.score = score;
            let _ = events_tx.send(LogEvent::ScoreChanged { score });
        }
    }
}

pub fn spawn_fdlog(
    store: ContactStore,
    sink: Option<Box<dyn OpSink>>,
    config: RuntimeConfig,
) -> LogHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(256);
    let (events_tx, _) = broadcast::channel::<LogEvent>(1024);

    let (persist_tx_opt, mut durable_rx) = if let Some(sink) = sink {
        let (persist_tx, persist_rx) = mpsc::channel::<PersistMsg>(config.persist_queue_bound);
        let (durable_tx, durable_rx) = mpsc::unbounded_channel::<Result<OpSeq, PersistError>>();
        spawn_persistence_worker(sink, persist_rx, durable_tx, config.clone());
        (Some(persist_tx), Some(durable_rx))
    } else {
        (None, None)
    };

    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        let mut state = LogState::new(store, config.power_thresholds);
        tracing::debug!(contacts = state.store.len(), "log runtime started");

        loop {
            if let Some(rx) = durable_rx.as_mut() {
                tokio::select! {
                    cmd = cmd_rx.recv() => {
                        let Some(cmd) = cmd else { break; };
                        let done = handle_command(
                            cmd,
                            &mut state,
                            &events_tx_loop,
                            persist_tx_opt.as_ref(),
                            &config,
                        ).await;

                        if done {
                            break;
                        }
                    }
                    durable = rx.recv() => {
                        match durable {
                            Some(Ok(op_seq)) => {
                                let _ = events_tx_loop.send(LogEvent::DurableUpTo { op_seq });
                            }
                            Some(Err(err)) => {
                                tracing::error!(error = %err, "journal write failed");
                                let _ = events_tx_loop.send(LogEvent::PersistFailed {
                                    message: err.to_string(),
                                });
                            }
                            None => {}
                        }
                    }
                }
            } else {
                let Some(cmd) = cmd_rx.recv().await else { break; };
                let done = handle_command(
                    cmd,
                    &mut state,
                    &events_tx_loop,
                    persist_tx_opt.as_ref(),
                    &config,
                ).await;
                if done {
                    break;
                }
            }
        }
        tracing::debug!("log runtime stopped");
    });

    LogHandle {
        cmd_tx,
        events_tx,
    }
}

impl LogHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.events_tx.subscribe()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Validates and stores a new contact, returning its id.
    pub async fn append(&self, draft: ContactDraft) -> Result<ContactId, RuntimeError> {
        self.request(|resp| Command::Append { draft, resp }).await?
    }

    /// Applies `patch` over contact `id`; the result is re-validated.
    pub async fn update(&self, id: ContactId, patch: ContactPatch) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Update { id, patch, resp }).await?
    }

    pub async fn delete(&self, id: ContactId) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Delete { id, resp }).await?
    }

    pub async fn get(&self, id: ContactId) -> Result<Option<Contact>, RuntimeError> {
        self.request(|resp| Command::Get { id, resp }).await
    }

    /// Every contact sorted by timestamp.
    pub async fn all(&self, order: SortOrder) -> Result<Vec<Contact>, RuntimeError> {
        self.request(|resp| Command::All { order, resp }).await
    }

    pub async fn is_duplicate(
        &self,
        call: impl Into<String>,
        band: Band,
        mode: Mode,
    ) -> Result<bool, RuntimeError> {
        let call = call.into();
        self.request(|resp| Command::IsDuplicate {
            call,
            band,
            mode,
            resp,
        })
        .await
    }

    /// Band/mode pairs already worked by `call`.
    pub async fn worked_on(&self, call: impl Into<String>) -> Result<Vec<(Band, Mode)>, RuntimeError> {
        let call = call.into();
        self.request(|resp| Command::WorkedOn { call, resp }).await
    }

    /// Whether any stored contact is in `section`.
    pub async fn worked(&self, section: impl Into<String>) -> Result<bool, RuntimeError> {
        let section = section.into();
        self.request(|resp| Command::Worked { section, resp }).await
    }

    pub async fn worked_sections(&self) -> Result<Vec<String>, RuntimeError> {
        self.request(|resp| Command::WorkedSections { resp }).await
    }

    pub async fn score(&self) -> Result<Score, RuntimeError> {
        self.request(|resp| Command::Score { resp }).await
    }

    /// Records the band and mode the station is currently on.
    pub async fn set_station(&self, band: Band, mode: Mode) -> Result<(), RuntimeError> {
        self.request(|resp| Command::SetStation { band, mode, resp }).await
    }

    /// Checks a status report's DX call against the current station and
    /// raises a pending notice when it would be a dupe.
    pub async fn observe_status(
        &self,
        dx_call: impl Into<String>,
    ) -> Result<Option<DupeNotice>, RuntimeError> {
        let dx_call = dx_call.into();
        self.request(|resp| Command::ObserveStatus { dx_call, resp }).await
    }

    /// Returns and clears the pending notice.
    pub async fn take_notice(&self) -> Result<Option<DupeNotice>, RuntimeError> {
        self.request(|resp| Command::TakeNotice { resp }).await
    }

    pub async fn flush(&self) -> Result<OpSeq, RuntimeError> {
        self.request(|resp| Command::Flush { resp }).await?
    }

    pub async fn checkpoint(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Checkpoint { resp }).await?
    }

    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Shutdown { resp }).await?
    }
}

async fn handle_command(
    cmd: Command,
    state: &mut LogState,
    events_tx: &broadcast::Sender<LogEvent>,
    persist_tx: Option<&mpsc::Sender<PersistMsg>>,
    config: &RuntimeConfig,
) -> bool {
    match cmd {
        Command::Append { draft, resp } => {
            let res = match state.store.prepare_append(draft) {
                Ok(stored) => {
                    let id = stored.op.contact_id();
                    apply(state, stored, events_tx, persist_tx, config)
                        .await
                        .map(|_| {
                            let _ = events_tx.send(LogEvent::Inserted { id });
                            id
                        })
                }
                Err(err) => Err(err.into()),
            };
            if res.is_ok() {
                state.ops_since_snapshot += 1;
                maybe_auto_checkpoint(state, persist_tx, config).await;
            }
            let _ = resp.send(res);
        }
        Command::Update { id, patch, resp } => {
            let res = match state.store.prepare_update(id, &patch) {
                Ok(stored) => apply(state, stored, events_tx, persist_tx, config)
                    .await
                    .map(|_| {
                        let _ = events_tx.send(LogEvent::Updated { id });
                    }),
                Err(err) => Err(err.into()),
            };
            let _ = resp.send(res);
        }
        Command::Delete { id, resp } => {
            let res = match state.store.prepare_delete(id) {
                Ok(stored) => apply(state, stored, events_tx, persist_tx, config)
                    .await
                    .map(|_| {
                        let _ = events_tx.send(LogEvent::Deleted { id });
                    }),
                Err(err) => Err(err.into()),
            };
            let _ = resp.send(res);
        }
        Command::Get { id, resp } => {
            let _ = resp.send(state.store.get_cloned(id));
        }
        Command::All { order, resp } => {
            let _ = resp.send(state.store.get_all_cloned(order));
        }
        Command::IsDuplicate {
            call,
            band,
            mode,
            resp,
        } => {
            let _ = resp.send(state.derived.dupes.is_duplicate(&call, band, mode));
        }
        Command::WorkedOn { call, resp } => {
            let _ = resp.send(state.derived.dupes.worked_on(&call));
        }
        Command::Worked { section, resp } => {
            let _ = resp.send(state.derived.sections.worked(&section));
        }
        Command::WorkedSections { resp } => {
            let _ = resp.send(state.derived.sections.worked_sections());
        }
        Command::Score { resp } => {
            let _ = resp.send(state.score);
        }
        Command::SetStation { band, mode, resp } => {
            state.station = Some((band, mode));
            let _ = resp.send(());
        }
        Command::ObserveStatus { dx_call, resp } => {
            let raised = match state.station {
                Some((band, mode))
                    if !dx_call.trim().is_empty()
                        && state.derived.dupes.is_duplicate(&dx_call, band, mode) =>
                {
                    let notice = DupeNotice {
                        call: dx_call.trim().to_ascii_uppercase(),
                        band,
                        mode,
                    };
                    state.notice = Some(notice.clone());
                    let _ = events_tx.send(LogEvent::PossibleDupe {
                        notice: notice.clone(),
                    });
                    Some(notice)
                }
                _ => None,
            };
            let _ = resp.send(raised);
        }
        Command::TakeNotice { resp } => {
            let _ = resp.send(state.notice.take());
        }
        Command::Flush { resp } => {
            let out = if let Some(tx) = persist_tx {
                let (flush_tx, flush_rx) = oneshot::channel();
                if tx
                    .send(PersistMsg::Flush { resp: flush_tx })
                    .await
                    .is_err()
                {
                    Err(RuntimeError::ChannelClosed)
                } else {
                    flush_rx
                        .await
                        .map_err(|_| RuntimeError::ChannelClosed)
                        .and_then(|r| r.map_err(RuntimeError::from))
                }
            } else {
                Ok(state.store.latest_op_seq())
            };
            let _ = resp.send(out);
        }
        Command::Checkpoint { resp } => {
            let out = match persist_tx {
                Some(tx) => send_checkpoint(tx, &state.store, config.compact_after_snapshot).await,
                None => Ok(()),
            };
            if out.is_ok() {
                state.ops_since_snapshot = 0;
            }
            let _ = resp.send(out);
        }
        Command::Shutdown { resp } => {
            let out = if let Some(tx) = persist_tx {
                let (done_tx, done_rx) = oneshot::channel();
                if tx.send(PersistMsg::Shutdown { resp: done_tx }).await.is_err() {
                    Err(RuntimeError::ChannelClosed)
                } else {
                    done_rx.await.map_err(|_| RuntimeError::ChannelClosed)
                }
            } else {
                Ok(())
            };
            let _ = resp.send(out);
            return true;
        }
    }

    false
}

/// Journals and commits one prepared op according to the ack mode, then
/// rebuilds derived views.
async fn apply(
    state: &mut LogState,
    stored: StoredOp,
    events_tx: &broadcast::Sender<LogEvent>,
    persist_tx: Option<&mpsc::Sender<PersistMsg>>,
    config: &RuntimeConfig,
) -> Result<(), RuntimeError> {
    match (persist_tx, config.ack_mode) {
        (Some(tx), AckMode::Durable) => {
            let (resp_tx, resp_rx) = oneshot::channel();
            tx.send(PersistMsg::Write {
                ops: vec![stored.clone()],
                resp: resp_tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
            resp_rx.await.map_err(|_| RuntimeError::ChannelClosed)??;
            state.store.commit(stored)?;
            state.refresh(events_tx);
            Ok(())
        }
        (Some(tx), AckMode::InMemory) => {
            state.store.commit(stored.clone())?;
            state.refresh(events_tx);
            enqueue_persist(tx, stored)
        }
        (None, _) => {
            state.store.commit(stored)?;
            state.refresh(events_tx);
            let _ = events_tx.send(LogEvent::DurableUpTo {
                op_seq: state.store.latest_op_seq(),
            });
            Ok(())
        }
    }
}

fn spawn_persistence_worker(
    sink: Box<dyn OpSink>,
    mut rx: mpsc::Receiver<PersistMsg>,
    durable_tx: mpsc::UnboundedSender<Result<OpSeq, PersistError>>,
    config: RuntimeConfig,
) {
    let sink = Arc::new(Mutex::new(sink));
    tokio::spawn(async move {
        let mut buf = Vec::<StoredOp>::new();
        let mut deadline = Instant::now() + Duration::from_millis(config.batch_max_latency_ms);
        let mut last_durable: OpSeq = 0;

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else {
                        let _ = flush_buf(&sink, &mut buf, &mut last_durable, &durable_tx, true).await;
                        break;
                    };

                    match msg {
                        PersistMsg::Op(stored) => {
                            let is_insert = matches!(stored.op, Op::Insert { .. });
                            buf.push(stored);

                            if buf.len() >= config.batch_max_ops || (config.flush_on_insert && is_insert) {
                                let _ = flush_buf(&sink, &mut buf, &mut last_durable, &durable_tx, true).await;
                                deadline = Instant::now() + Duration::from_millis(config.batch_max_latency_ms);
                            }
                        }
                        PersistMsg::Write { ops, resp } => {
                            buf.extend(ops);
                            let result = flush_buf(&sink, &mut buf, &mut last_durable, &durable_tx, true).await;
                            let _ = resp.send(result.map(|_| last_durable));
                            deadline = Instant::now() + Duration::from_millis(config.batch_max_latency_ms);
                        }
                        PersistMsg::Flush { resp } => {
                            let result = flush_buf(&sink, &mut buf, &mut last_durable, &durable_tx, true).await;
                            let _ = resp.send(result.map(|_| last_durable));
                            deadline = Instant::now() + Duration::from_millis(config.batch_max_latency_ms);
                        }
                        PersistMsg::Checkpoint { snapshot, last_seq, compact, resp } => {
                            let flush_result = flush_buf(&sink, &mut buf, &mut last_durable, &durable_tx, true).await;
                            let result = if let Err(err) = flush_result {
                                Err(err)
                            } else {
                                let sink_ref = Arc::clone(&sink);
                                match tokio::task::spawn_blocking(move || {
                                    let mut sink = sink_ref.blocking_lock();
                                    sink.write_snapshot(&snapshot, last_seq)?;
                                    if compact {
                                        let _ = sink.compact_through(last_seq)?;
                                    }
                                    Result::<(), PersistError>::Ok(())
                                }).await {
                                    Ok(inner) => inner,
                                    Err(e) => Err(PersistError::Message(format!("join error: {e}"))),
                                }
                            };
                            let _ = resp.send(result);
                            deadline = Instant::now() + Duration::from_millis(config.batch_max_latency_ms);
                        }
                        PersistMsg::Shutdown { resp } => {
                            let _ = flush_buf(&sink, &mut buf, &mut last_durable, &durable_tx, true).await;
                            let _ = resp.send(());
                            break;
                        }
                    }
                }
                _ = tokio::time::sleep_until(deadline), if !buf.is_empty() => {
                    let _ = flush_buf(&sink, &mut buf, &mut last_durable, &durable_tx, false).await;
                    deadline = Instant::now() + Duration::from_millis(config.batch_max_latency_ms);
                }
            }
        }
    });
}

async fn flush_buf(
    sink: &Arc<Mutex<Box<dyn OpSink>>>,
    buf: &mut Vec<StoredOp>,
    last_durable: &mut OpSeq,
    durable_tx: &mpsc::UnboundedSender<Result<OpSeq, PersistError>>,
    call_flush: bool,
) -> Result<(), PersistError> {
    if buf.is_empty() {
        if call_flush {
            let sink_ref = Arc::clone(sink);
            tokio::task::spawn_blocking(move || {
                let mut sink = sink_ref.blocking_lock();
                sink.flush()
            })
            .await
            .map_err(|e| PersistError::Message(format!("join error: {e}")))??;
        }
        return Ok(());
    }

    let ops = std::mem::take(buf);
    let sink_ref = Arc::clone(sink);
    let append_res: Result<OpSeq, PersistError> = tokio::task::spawn_blocking(move || {
        let mut sink = sink_ref.blocking_lock();
        let seq = sink.append_ops(&ops)?;
        if call_flush {
            sink.flush()?;
        }
        Ok(seq)
    })
    .await
    .map_err(|e| PersistError::Message(format!("join error: {e}")))?;

    match append_res {
        Ok(seq) => {
            *last_durable = (*last_durable).max(seq);
            let _ = durable_tx.send(Ok(*last_durable));
            Ok(())
        }
        Err(err) => {
            let _ = durable_tx.send(Err(PersistError::Message(format!("append failed: {err}"))));
            Err(err)
        }
    }
}

async fn send_checkpoint(
    tx: &mpsc::Sender<PersistMsg>,
    store: &ContactStore,
    compact: bool,
) -> Result<(), RuntimeError> {
    let (cp_tx, cp_rx) = oneshot::channel();
    tx.send(PersistMsg::Checkpoint {
        snapshot: store.export_snapshot(),
        last_seq: store.latest_op_seq(),
        compact,
        resp: cp_tx,
    })
    .await
    .map_err(|_| RuntimeError::ChannelClosed)?;
    cp_rx.await.map_err(|_| RuntimeError::ChannelClosed)??;
    Ok(())
}

async fn maybe_auto_checkpoint(
    state: &mut LogState,
    persist_tx: Option<&mpsc::Sender<PersistMsg>>,
    config: &RuntimeConfig,
) {
    if config.snapshot_every_ops == 0 || state.ops_since_snapshot < config.snapshot_every_ops {
        return;
    }

    let Some(tx) = persist_tx else {
        return;
    };

    match send_checkpoint(tx, &state.store, config.compact_after_snapshot).await {
        Ok(()) => state.ops_since_snapshot = 0,
        Err(err) => tracing::warn!(error = %err, "automatic checkpoint failed"),
    }
}

fn enqueue_persist(tx: &mpsc::Sender<PersistMsg>, stored: StoredOp) -> Result<(), RuntimeError> {
    tx.try_send(PersistMsg::Op(stored))
        .map_err(|err| RuntimeError::Persist(PersistError::Message(format!("persist queue error: {err}"))))
}
