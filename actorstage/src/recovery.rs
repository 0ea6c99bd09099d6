//! Recovery bookkeeping for context loss.
//!
//! Every successful actor load deposits a record of exactly which URLs built
//! it. After a restore the stage replays these records instead of asking the
//! caller to re-register anything.

use crate::actor::ActorId;
use std::collections::HashMap;

/// The URLs that produced one actor's runtime, captured at load time.
#[derive(Clone, Debug, PartialEq)]
pub struct RecoveryRecord {
    pub asset_id: String,
    pub atlas_url: String,
    pub skeleton_url: String,
    pub texture_urls: Vec<String>,
}

#[derive(Debug, Default)]
pub struct RecoveryMap {
    records: HashMap<ActorId, RecoveryRecord>,
}

impl RecoveryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, actor: ActorId, record: RecoveryRecord) {
        self.records.insert(actor, record);
    }

    pub fn remove(&mut self, actor: ActorId) -> Option<RecoveryRecord> {
        self.records.remove(&actor)
    }

    pub fn get(&self, actor: ActorId) -> Option<&RecoveryRecord> {
        self.records.get(&actor)
    }

    /// Records in ascending actor-id order, so recovery is deterministic.
    pub fn entries(&self) -> Vec<(ActorId, RecoveryRecord)> {
        let mut entries: Vec<_> = self
            .records
            .iter()
            .map(|(id, record)| (*id, record.clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
