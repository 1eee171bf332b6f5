//! Explicit session context tying ingestion, lookup and remote sync to one
//! log runtime.
//!
//! Packet decoding runs on the caller's task. Anything that touches the
//! network (lookup, remote sync) runs on spawned tasks bounded by the
//! session timeout, and a late or failed result only costs the optional
//! data it would have added.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::task::JoinHandle;

use crate::{
    config::{Preferences, SessionConfig},
    contact::ContactDraft,
    export::remote_record,
    geo::{self, GreatCirclePath},
    lookup::CallsignLookup,
    packet::{self, IngestRules, Packet, ProtocolError, contact_from_tags},
    remote::{NetworkError, RemoteLogClient},
    runtime::{DupeNotice, LogHandle, RuntimeError},
    sections::SectionCatalog,
    types::{Band, ContactId, Mode},
};

/// What happened to one datagram.
#[derive(Debug)]
pub enum IngestOutcome {
    /// Undecodable or unsupported; dropped.
    Dropped(ProtocolError),
    /// Heartbeat or decode report; nothing to do.
    Informational,
    /// Status report, with the dupe notice it raised if any.
    Status(Option<DupeNotice>),
    /// Logged packet for another contest.
    OtherContest,
    /// Contact is being looked up and logged on a spawned task.
    Logging(JoinHandle<Result<ContactId, RuntimeError>>),
}

#[derive(Clone)]
pub struct Session {
    prefs: Arc<Preferences>,
    catalog: &'static SectionCatalog,
    handle: LogHandle,
    config: SessionConfig,
    rules: IngestRules,
    lookup: Option<Arc<dyn CallsignLookup>>,
    remote: Option<RemoteLogClient>,
    remote_ok: Arc<AtomicBool>,
}

impl Session {
    pub fn new(prefs: Preferences, handle: LogHandle, config: SessionConfig) -> Self {
        let rules = IngestRules {
            contest_id: config.contest_id.clone(),
            default_power: prefs.power,
        };
        Self {
            prefs: Arc::new(prefs),
            catalog: SectionCatalog::global(),
            handle,
            config,
            rules,
            lookup: None,
            remote: None,
            remote_ok: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_lookup(mut self, lookup: Arc<dyn CallsignLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Builds the remote client when remote logging is enabled.
    pub fn with_remote_from_prefs(mut self) -> Result<Self, NetworkError> {
        if self.prefs.remote_log.enabled {
            let client = RemoteLogClient::new(self.prefs.remote_log.clone(), self.config.network_timeout)?;
            self.remote = Some(client);
        }
        Ok(self)
    }

    pub fn handle(&self) -> &LogHandle {
        &self.handle
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Distance and bearing from the operator's grid to `grid`.
    pub fn path_to(&self, grid: &str) -> Option<GreatCirclePath> {
        geo::path(&self.prefs.mygrid, grid)
    }

    /// Whether contacts are currently being synced.
    pub fn remote_sync_active(&self) -> bool {
        self.remote.is_some() && self.remote_ok.load(Ordering::Relaxed)
    }

    /// Authenticates against the remote log; sync stays off on failure.
    pub async fn authenticate_remote(&self) -> bool {
        let Some(remote) = &self.remote else {
            return false;
        };
        let ok = match remote.authenticate().await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "remote log authentication failed");
                false
            }
        };
        self.remote_ok.store(ok, Ordering::Relaxed);
        ok
    }

    /// Decodes one datagram and routes it. Never fails; a bad datagram is
    /// reported as [`IngestOutcome::Dropped`] after diagnostic logging.
    pub async fn ingest(&self, datagram: &[u8]) -> IngestOutcome {
        let packet = match packet::decode(datagram) {
            Ok(packet) => packet,
            Err(err) => {
                tracing::debug!(error = %err, len = datagram.len(), "dropping datagram");
                return IngestOutcome::Dropped(err);
            }
        };

        match packet {
            Packet::Heartbeat {
                client_id, version, ..
            } => {
                tracing::trace!(%client_id, %version, "heartbeat");
                IngestOutcome::Informational
            }
            Packet::Decode { .. } => IngestOutcome::Informational,
            Packet::Status {
                dial_freq_hz,
                mode,
                dx_call,
                ..
            } => IngestOutcome::Status(self.observe_status(dial_freq_hz, &mode, &dx_call).await),
            Packet::LoggedAdif { tags, .. } => match contact_from_tags(&tags, &self.rules) {
                Ok(Some(draft)) => {
                    let session = self.clone();
                    IngestOutcome::Logging(tokio::spawn(async move { session.log_draft(draft).await }))
                }
                Ok(None) => {
                    tracing::debug!(contest = ?tags.get("CONTEST_ID"), "ignoring other contest");
                    IngestOutcome::OtherContest
                }
                Err(err) => {
                    tracing::debug!(error = %err, "dropping logged packet");
                    IngestOutcome::Dropped(err)
                }
            },
        }
    }

    async fn observe_status(&self, dial_freq_hz: u64, mode: &str, dx_call: &str) -> Option<DupeNotice> {
        if let Some(band) = Band::from_freq(dial_freq_hz) {
            if let Err(err) = self.handle.set_station(band, Mode::from_rig_mode(mode)).await {
                tracing::warn!(error = %err, "status ignored");
                return None;
            }
        }
        match self.handle.observe_status(dx_call).await {
            Ok(notice) => notice,
            Err(err) => {
                tracing::warn!(error = %err, "status ignored");
                None
            }
        }
    }

    /// Manual entry. Validation failures come back to the caller so the
    /// entry form can re-prompt.
    pub async fn log_manual(&self, draft: ContactDraft) -> Result<ContactId, RuntimeError> {
        self.log_draft(draft.normalized()).await
    }

    async fn log_draft(&self, mut draft: ContactDraft) -> Result<ContactId, RuntimeError> {
        if draft.needs_lookup() {
            self.fill_from_lookup(&mut draft).await;
        }
        let call = draft.callsign.clone();
        let path = self.path_to(&draft.grid);
        let id = match self.handle.append(draft).await {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(%call, error = %err, "contact not logged");
                return Err(err);
            }
        };
        match path {
            Some(p) => tracing::info!(id, %call, km = p.km, bearing = p.degrees, "contact logged"),
            None => tracing::info!(id, %call, "contact logged"),
        }
        self.spawn_remote_sync(id);
        Ok(id)
    }

    async fn fill_from_lookup(&self, draft: &mut ContactDraft) {
        let Some(lookup) = &self.lookup else {
            return;
        };
        let result =
            tokio::time::timeout(self.config.network_timeout, lookup.lookup(&draft.callsign)).await;
        match result.map(|r| r.usable()) {
            Ok(Some((grid, name))) => {
                if draft.grid.is_empty() {
                    draft.grid = grid.trim().to_string();
                }
                if draft.operator_name.is_empty() {
                    draft.operator_name = name.trim().to_string();
                }
            }
            Ok(None) => tracing::debug!(call = %draft.callsign, "lookup returned no data"),
            Err(_) => tracing::warn!(call = %draft.callsign, "lookup timed out"),
        }
    }

    fn spawn_remote_sync(&self, id: ContactId) {
        if !self.remote_sync_active() {
            return;
        }
        let session = self.clone();
        tokio::spawn(async move {
            let Some(remote) = &session.remote else {
                return;
            };
            let contact = match session.handle.get(id).await {
                Ok(Some(contact)) => contact,
                _ => return,
            };
            let record = remote_record(&contact, &session.prefs, session.catalog);
            if let Err(err) = remote.post_contact(&record).await {
                tracing::warn!(id, error = %err, "remote sync failed, disabling");
                session.remote_ok.store(false, Ordering::Relaxed);
            }
        });
    }
}
