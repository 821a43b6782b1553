use crate::model::MessageId;
use std::collections::HashSet;

/// Message ids whose business effect has been applied in this worker session.
///
/// Owned by one [`FulfillmentWorker`](super::FulfillmentWorker) and never shared, so it
/// needs no lock. Entries are only removed when the processing they guarded failed,
/// which keeps "present" meaning "done". Nothing is persisted: a restarted worker
/// starts empty and will process a redelivered message again.
#[derive(Debug, Default)]
pub struct ProcessedIdSet {
    ids: HashSet<MessageId>,
}

impl ProcessedIdSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the id was already present.
    pub fn insert(&mut self, id: MessageId) -> bool {
        self.ids.insert(id)
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.ids.contains(id)
    }

    /// Undo an `insert` whose processing did not complete.
    pub fn remove(&mut self, id: &MessageId) -> bool {
        self.ids.remove(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
