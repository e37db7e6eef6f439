use crate::error::StoreError;
use crate::session::SessionRecord;

use super::SessionStore;

/// In-process store. Holds whatever was last saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<SessionRecord>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `records`, as if saved by a previous run.
    pub fn with_records(records: Vec<SessionRecord>) -> Self {
        Self { records, saves: 0 }
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<Vec<SessionRecord>, StoreError> {
        Ok(self.records.clone())
    }

    fn save(&mut self, records: &[SessionRecord]) -> Result<(), StoreError> {
        self.records = records.to_vec();
        self.saves += 1;
        Ok(())
    }
}
