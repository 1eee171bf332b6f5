use std::time::{SystemTime, UNIX_EPOCH};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{
    contact::{Contact, ContactDraft, ContactPatch, ValidationError},
    op::{Op, StoredOp},
    types::{Band, ContactId, Mode, OpSeq},
};

use super::indices::{DupeKey, VecIndex};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("contact {0} not found")]
    MissingContact(ContactId),
    #[error("contact {0} already exists")]
    AlreadyExists(ContactId),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Listing order for [`ContactStore::get_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshotV1 {
    pub next_contact_id: ContactId,
    pub next_op_seq: OpSeq,
    pub order: Vec<ContactId>,
    pub records: Vec<Contact>,
}

#[derive(Debug, Default)]
pub struct ContactStore {
    records: HashMap<ContactId, Contact>,
    order: Vec<ContactId>,
    by_dupe: VecIndex<DupeKey>,
    pending_ops: Vec<StoredOp>,
    next_op_seq: OpSeq,
    next_contact_id: ContactId,
}

impl ContactStore {
    pub fn new() -> Self {
        Self {
            next_op_seq: 1,
            next_contact_id: 1,
            ..Self::default()
        }
    }

    pub fn from_snapshot(snapshot: StoreSnapshotV1) -> Result<Self, StoreError> {
        let mut store = Self {
            next_contact_id: snapshot.next_contact_id,
            next_op_seq: snapshot.next_op_seq,
            order: snapshot.order,
            ..Self::default()
        };

        for rec in snapshot.records {
            if store.records.contains_key(&rec.id) {
                return Err(StoreError::AlreadyExists(rec.id));
            }
            store.insert_indices(&rec);
            store.records.insert(rec.id, rec);
        }

        if let Some(id) = store.order.iter().find(|id| !store.records.contains_key(*id)) {
            return Err(StoreError::MissingContact(*id));
        }

        Ok(store)
    }

    pub fn export_snapshot(&self) -> StoreSnapshotV1 {
        let records = self
            .order
            .iter()
            .filter_map(|id| self.records.get(id).cloned())
            .collect();

        StoreSnapshotV1 {
            next_contact_id: self.next_contact_id,
            next_op_seq: self.next_op_seq,
            order: self.order.clone(),
            records,
        }
    }

    /// Validates `draft` and builds the insert op without touching the store.
    pub fn prepare_append(&self, draft: ContactDraft) -> Result<StoredOp, StoreError> {
        let draft = draft.normalized();
        draft.validate()?;
        let contact = Contact::from_draft(self.next_contact_id, draft);
        Ok(self.stored(Op::Insert { contact }))
    }

    /// Builds the full-replacement op for `id` with `patch` applied.
    pub fn prepare_update(&self, id: ContactId, patch: &ContactPatch) -> Result<StoredOp, StoreError> {
        let mut contact = self
            .records
            .get(&id)
            .cloned()
            .ok_or(StoreError::MissingContact(id))?;
        patch.apply_to(&mut contact);
        contact.validate()?;
        Ok(self.stored(Op::Update { contact }))
    }

    pub fn prepare_delete(&self, id: ContactId) -> Result<StoredOp, StoreError> {
        if !self.records.contains_key(&id) {
            return Err(StoreError::MissingContact(id));
        }
        Ok(self.stored(Op::Delete { id }))
    }

    /// Applies an op produced by a `prepare_*` call or read back from the journal.
    pub fn commit(&mut self, stored: StoredOp) -> Result<(), StoreError> {
        self.apply_replayed_op(stored)
    }

    pub fn append(&mut self, draft: ContactDraft) -> Result<(ContactId, StoredOp), StoreError> {
        let stored = self.prepare_append(draft)?;
        let id = stored.op.contact_id();
        self.commit(stored.clone())?;
        self.pending_ops.push(stored.clone());
        Ok((id, stored))
    }

    pub fn update(&mut self, id: ContactId, patch: &ContactPatch) -> Result<StoredOp, StoreError> {
        let stored = self.prepare_update(id, patch)?;
        self.commit(stored.clone())?;
        self.pending_ops.push(stored.clone());
        Ok(stored)
    }

    pub fn delete(&mut self, id: ContactId) -> Result<StoredOp, StoreError> {
        let stored = self.prepare_delete(id)?;
        self.commit(stored.clone())?;
        self.pending_ops.push(stored.clone());
        Ok(stored)
    }

    pub fn apply_replayed_op(&mut self, stored: StoredOp) -> Result<(), StoreError> {
        match stored.op {
            Op::Insert { contact } => self.apply_insert(contact)?,
            Op::Update { contact } => self.apply_update(contact)?,
            Op::Delete { id } => self.apply_delete(id)?,
        }
        self.bump_next_seq_from(stored.seq);
        Ok(())
    }

    pub fn get(&self, id: ContactId) -> Option<&Contact> {
        self.records.get(&id)
    }

    pub fn get_cloned(&self, id: ContactId) -> Option<Contact> {
        self.get(id).cloned()
    }

    /// Every contact sorted by timestamp, ties broken by id.
    pub fn get_all(&self, order: SortOrder) -> Vec<&Contact> {
        let mut all: Vec<&Contact> = self.order.iter().filter_map(|id| self.records.get(id)).collect();
        all.sort_by(|a, b| (a.timestamp, a.id).cmp(&(b.timestamp, b.id)));
        if order == SortOrder::Descending {
            all.reverse();
        }
        all
    }

    pub fn get_all_cloned(&self, order: SortOrder) -> Vec<Contact> {
        self.get_all(order).into_iter().cloned().collect()
    }

    pub fn by_dupe_key(&self, call: &str, band: Band, mode: Mode) -> Vec<&Contact> {
        self.by_dupe
            .get(&DupeKey::new(call, band, mode))
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.records.get(id))
            .collect()
    }

    /// Contacts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Contact> + Clone {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    pub fn ordered_ids(&self) -> &[ContactId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn drain_pending_ops(&mut self) -> Vec<StoredOp> {
        std::mem::take(&mut self.pending_ops)
    }

    pub fn latest_op_seq(&self) -> OpSeq {
        self.next_op_seq.saturating_sub(1)
    }

    pub fn next_contact_id(&self) -> ContactId {
        self.next_contact_id
    }

    fn stored(&self, op: Op) -> StoredOp {
        StoredOp {
            seq: self.next_op_seq,
            ts_ms: now_ms(),
            op,
        }
    }

    fn apply_insert(&mut self, contact: Contact) -> Result<(), StoreError> {
        if self.records.contains_key(&contact.id) {
            return Err(StoreError::AlreadyExists(contact.id));
        }

        let id = contact.id;
        self.next_contact_id = self.next_contact_id.max(id.saturating_add(1));
        self.insert_indices(&contact);
        self.order.push(id);
        self.records.insert(id, contact);
        Ok(())
    }

    fn apply_update(&mut self, contact: Contact) -> Result<(), StoreError> {
        let id = contact.id;
        let rec = self.records.get_mut(&id).ok_or(StoreError::MissingContact(id))?;
        let old_key = rec.dupe_key();
        let new_key = contact.dupe_key();
        *rec = contact;

        if old_key != new_key {
            self.remove_indices(&old_key, id);
            self.by_dupe.entry(new_key).or_default().push(id);
        }
        Ok(())
    }

    fn apply_delete(&mut self, id: ContactId) -> Result<(), StoreError> {
        let rec = self.records.remove(&id).ok_or(StoreError::MissingContact(id))?;
        self.remove_indices(&rec.dupe_key(), id);
        if let Some(pos) = self.order.iter().position(|x| *x == id) {
            self.order.remove(pos);
        }
        Ok(())
    }

    fn insert_indices(&mut self, rec: &Contact) {
        self.by_dupe.entry(rec.dupe_key()).or_default().push(rec.id);
    }

    fn remove_indices(&mut self, key: &DupeKey, id: ContactId) {
        if let Some(ids) = self.by_dupe.get_mut(key) {
            if let Some(pos) = ids.iter().position(|x| *x == id) {
                ids.remove(pos);
            }
            if ids.is_empty() {
                self.by_dupe.remove(key);
            }
        }
    }

    fn bump_next_seq_from(&mut self, seq: OpSeq) {
        self.next_op_seq = self.next_op_seq.max(seq.saturating_add(1));
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
