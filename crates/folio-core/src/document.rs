//! Persisted document record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::element::{self, Element};

/// A stored document: its identity plus the flat element sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique document identifier.
    pub id: String,
    /// Document name.
    pub name: String,
    /// Every element of every page, deleted ones included.
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with a single empty auto-fit page.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: "Untitled".to_string(),
            elements: vec![Element::page()],
        }
    }

    /// Number of live pages.
    pub fn page_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|el| el.is_page() && !el.is_deleted)
            .count()
    }

    /// Copy of this document with deleted elements dropped and transient
    /// editing state cleared.
    pub fn for_export(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            elements: element::clear_elements_for_export(&self.elements),
        }
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
