#![allow(dead_code)]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::types::ChangeRecord;

/// One committed change-set. Records keep the order they were diffed in;
/// the entry itself is never edited after commit except by record removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub changes: Vec<ChangeRecord>,
}

impl HistoryEntry {
    pub fn forward_commands(&self) -> Vec<String> {
        self.changes.iter().map(|change| change.forward.clone()).collect()
    }

    pub fn revert_commands(&self) -> Vec<String> {
        self.changes.iter().map(|change| change.revert.clone()).collect()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("no history entry at index {0}")]
    EntryOutOfRange(usize),
    #[error("no change record at index {1} in entry {0}")]
    RecordOutOfRange(usize, usize),
}

/// Append-only log of committed change-sets. Independent of any parsed
/// document: it survives re-parses and is persisted across sessions.
#[derive(Debug, Default)]
pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the ledger from persisted entries.
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot a change-set into the ledger. An empty change list is a
    /// no-op and returns None ("nothing to commit").
    pub fn commit(&mut self, changes: Vec<ChangeRecord>) -> Option<&HistoryEntry> {
        if changes.is_empty() {
            return None;
        }
        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            saved_at: Utc::now(),
            changes,
        };
        info!(
            "committed change-set {} with {} record(s)",
            entry.id,
            entry.changes.len()
        );
        self.entries.push(entry);
        self.entries.last()
    }

    /// Remove one record from one entry. An entry left with no records is
    /// removed from the ledger entirely.
    pub fn remove_record(&mut self, entry_index: usize, record_index: usize) -> Result<(), LedgerError> {
        let entry = self
            .entries
            .get_mut(entry_index)
            .ok_or(LedgerError::EntryOutOfRange(entry_index))?;
        if record_index >= entry.changes.len() {
            return Err(LedgerError::RecordOutOfRange(entry_index, record_index));
        }
        entry.changes.remove(record_index);
        if entry.changes.is_empty() {
            self.entries.remove(entry_index);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::set_param_command;

    fn record(param: &str, old: &str, new: &str) -> ChangeRecord {
        ChangeRecord {
            target: "F1".to_string(),
            param_name: param.to_string(),
            old_value: old.to_string(),
            new_value: new.to_string(),
            forward: set_param_command("F1", param, new),
            revert: set_param_command("F1", param, old),
        }
    }

    #[test]
    fn test_empty_commit_is_noop() {
        let mut ledger = HistoryLedger::new();
        assert!(ledger.commit(Vec::new()).is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_commit_appends_entry() {
        let mut ledger = HistoryLedger::new();
        let entry = ledger.commit(vec![record("AutoBuy", "0", "1")]).unwrap();
        assert_eq!(entry.changes.len(), 1);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_removing_last_record_removes_entry() {
        let mut ledger = HistoryLedger::new();
        ledger.commit(vec![record("AutoBuy", "0", "1")]);

        ledger.remove_record(0, 0).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_removing_one_of_many_keeps_entry() {
        let mut ledger = HistoryLedger::new();
        ledger.commit(vec![record("AutoBuy", "0", "1"), record("Risk", "5", "9")]);

        ledger.remove_record(0, 0).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.entries()[0].changes[0].param_name, "Risk");
    }

    #[test]
    fn test_out_of_range_indices_are_errors() {
        let mut ledger = HistoryLedger::new();
        ledger.commit(vec![record("AutoBuy", "0", "1")]);

        assert_eq!(ledger.remove_record(3, 0), Err(LedgerError::EntryOutOfRange(3)));
        assert_eq!(ledger.remove_record(0, 5), Err(LedgerError::RecordOutOfRange(0, 5)));
        // Failed removals leave the ledger untouched.
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_command_lists_preserve_record_order() {
        let mut ledger = HistoryLedger::new();
        ledger.commit(vec![record("AutoBuy", "0", "1"), record("Risk", "5", "9")]);

        let entry = &ledger.entries()[0];
        assert_eq!(
            entry.forward_commands(),
            vec!["SetParam \"F1\" AutoBuy 1", "SetParam \"F1\" Risk 9"]
        );
        assert_eq!(
            entry.revert_commands(),
            vec!["SetParam \"F1\" AutoBuy 0", "SetParam \"F1\" Risk 5"]
        );
    }

    #[test]
    fn test_commits_keep_chronological_order() {
        let mut ledger = HistoryLedger::new();
        ledger.commit(vec![record("AutoBuy", "0", "1")]);
        ledger.commit(vec![record("Risk", "5", "9")]);

        assert_eq!(ledger.entries()[0].changes[0].param_name, "AutoBuy");
        assert_eq!(ledger.entries()[1].changes[0].param_name, "Risk");
    }
}