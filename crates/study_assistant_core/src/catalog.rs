//! crates/study_assistant_core/src/catalog.rs
//!
//! The read-only library of lecture transcripts.

use crate::domain::SourceDocument;
use crate::ports::{PortError, PortResult};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// An ordered, immutable collection of source documents.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    documents: Vec<SourceDocument>,
}

impl Catalog {
    /// Builds a catalog, rejecting duplicate ids.
    pub fn new(documents: Vec<SourceDocument>) -> PortResult<Self> {
        for (i, doc) in documents.iter().enumerate() {
            if documents[..i].iter().any(|d| d.id == doc.id) {
                return Err(PortError::Malformed(format!(
                    "duplicate document id '{}' in catalog",
                    doc.id
                )));
            }
        }
        Ok(Self { documents })
    }

    /// Parses a catalog from a JSON array of documents.
    pub fn from_json(json: &str) -> PortResult<Self> {
        let documents: Vec<SourceDocument> =
            serde_json::from_str(json).map_err(|e| PortError::Malformed(e.to_string()))?;
        Self::new(documents)
    }

    /// The lectures shipped with the application.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_CATALOG).unwrap_or_else(|e| {
            tracing::error!("Built-in catalog is invalid: {}", e);
            Self::default()
        })
    }

    pub fn documents(&self) -> &[SourceDocument] {
        &self.documents
    }

    pub fn get(&self, id: &str) -> Option<&SourceDocument> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Distinct subject areas, in order of first appearance.
    pub fn subject_areas(&self) -> Vec<&str> {
        let mut areas: Vec<&str> = Vec::new();
        for doc in &self.documents {
            if !areas.contains(&doc.subject_area.as_str()) {
                areas.push(&doc.subject_area);
            }
        }
        areas
    }

    pub fn by_subject<'a>(&'a self, area: &'a str) -> impl Iterator<Item = &'a SourceDocument> + 'a {
        self.documents.iter().filter(move |d| d.subject_area == area)
    }
}
