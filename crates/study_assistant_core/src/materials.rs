//! crates/study_assistant_core/src/materials.rs
//!
//! The study material store: one record per source document, created on first
//! access and updated in place as each generation completes. Records are never
//! deleted.

use chrono::{DateTime, Utc};

use crate::domain::{Flashcard, MindMapNode, StudyMaterialRecord, Summary};
use crate::ports::StudyMaterials;

#[derive(Debug, Clone, Default)]
pub struct MaterialStore {
    records: StudyMaterials,
}

impl MaterialStore {
    pub fn from_records(records: StudyMaterials) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &StudyMaterials {
        &self.records
    }

    pub fn get(&self, document_id: &str) -> Option<&StudyMaterialRecord> {
        self.records.get(document_id)
    }

    /// True when a summary is already cached for the document.
    pub fn has_summary(&self, document_id: &str) -> bool {
        self.get(document_id).is_some_and(|r| r.summary.is_some())
    }

    /// Returns the record for `document_id`, creating an empty one if absent.
    pub fn ensure(&mut self, document_id: &str, now: DateTime<Utc>) -> &mut StudyMaterialRecord {
        self.records
            .entry(document_id.to_string())
            .or_insert_with(|| StudyMaterialRecord::empty(document_id, now))
    }

    /// Refreshes the last access time of an existing record.
    pub fn touch(&mut self, document_id: &str, now: DateTime<Utc>) -> bool {
        match self.records.get_mut(document_id) {
            Some(record) => {
                record.last_accessed = now;
                true
            }
            None => false,
        }
    }

    /// Stores a summary result, including `None` after a failed generation.
    pub fn set_summary(&mut self, document_id: &str, summary: Option<Summary>, now: DateTime<Utc>) {
        self.ensure(document_id, now).summary = summary;
    }

    pub fn set_flashcards(&mut self, document_id: &str, cards: Vec<Flashcard>, now: DateTime<Utc>) {
        self.ensure(document_id, now).flashcards = cards;
    }

    pub fn set_mind_map(&mut self, document_id: &str, map: Option<MindMapNode>, now: DateTime<Utc>) {
        self.ensure(document_id, now).mind_map = map;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> Summary {
        Summary {
            title: "t".into(),
            topic: "c".into(),
            sections: Vec::new(),
            exam_pearls: Vec::new(),
        }
    }

    #[test]
    fn ensure_creates_an_empty_record_once() {
        let mut store = MaterialStore::default();
        let now = Utc::now();
        store.ensure("1", now).flashcards.push(Flashcard {
            id: "fc".into(),
            front: "f".into(),
            back: "b".into(),
            status: Default::default(),
        });
        let record = store.ensure("1", now);
        assert_eq!(record.flashcards.len(), 1);
        assert!(record.summary.is_none());
        assert!(record.mind_map.is_none());
    }

    #[test]
    fn failed_summary_leaves_cache_miss() {
        let mut store = MaterialStore::default();
        store.set_summary("1", None, Utc::now());
        assert!(store.get("1").is_some());
        assert!(!store.has_summary("1"));
        store.set_summary("1", Some(summary()), Utc::now());
        assert!(store.has_summary("1"));
    }

    #[test]
    fn touch_only_updates_existing_records() {
        let mut store = MaterialStore::default();
        assert!(!store.touch("1", Utc::now()));
        assert!(store.get("1").is_none());
    }
}
