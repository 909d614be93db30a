use std::collections::BTreeMap;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::store::{load_json, load_text, save_json, save_text, KeyValueStore, Slot, StoreError};

/// Header fields, page bodies (HTML) and participant names of the document
/// editor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Worksheet {
    pub header: BTreeMap<String, String>,
    pub pages: Vec<String>,
    pub participants: Vec<String>,
}

impl Worksheet {
    /// One empty page and one empty participant row.
    pub fn blank() -> Self {
        let mut worksheet = Self::default();
        worksheet.ensure_defaults();
        worksheet
    }

    pub fn ensure_defaults(&mut self) {
        if self.pages.is_empty() {
            self.pages.push(String::new());
        }
        if self.participants.is_empty() {
            self.participants.push(String::new());
        }
    }

    /// Reads every slot the document editor owns. Missing or malformed slots
    /// fall back to defaults; empty header values are skipped.
    pub fn load(store: &impl KeyValueStore, header_ids: &[&str]) -> Self {
        let mut header = BTreeMap::new();
        for id in header_ids {
            if let Some(value) = load_text(store, &Slot::Header((*id).to_string())) {
                if !value.is_empty() {
                    header.insert((*id).to_string(), value);
                }
            }
        }
        let mut worksheet = Self {
            header,
            pages: load_json(store, &Slot::Pages).unwrap_or_default(),
            participants: load_json(store, &Slot::Participants).unwrap_or_default(),
        };
        worksheet.ensure_defaults();
        worksheet
    }

    pub fn save(&self, store: &mut impl KeyValueStore) -> Result<(), StoreError> {
        save_json(store, &Slot::Pages, &self.pages)?;
        for (id, value) in &self.header {
            save_text(store, &Slot::Header(id.clone()), value)?;
        }
        save_json(store, &Slot::Participants, &self.participants)
    }

    pub fn set_header(&mut self, id: &str, value: &str) {
        self.header.insert(id.to_string(), value.to_string());
    }

    pub fn add_page(&mut self, html: impl Into<String>) -> usize {
        self.pages.push(html.into());
        self.pages.len() - 1
    }

    pub fn remove_page(&mut self, index: usize) -> bool {
        if index >= self.pages.len() {
            return false;
        }
        self.pages.remove(index);
        true
    }

    /// Drops every page and leaves a single empty one.
    pub fn clear_pages(&mut self) {
        self.pages.clear();
        self.pages.push(String::new());
    }

    pub fn add_participant(&mut self, name: impl Into<String>) -> usize {
        self.participants.push(name.into());
        self.participants.len() - 1
    }

    pub fn remove_participant(&mut self, index: usize) -> bool {
        if index >= self.participants.len() {
            return false;
        }
        self.participants.remove(index);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const IDS: [&str; 2] = ["header-fecha", "header-sede"];

    #[test]
    fn empty_store_gives_blank_worksheet() {
        let worksheet = Worksheet::load(&MemoryStore::new(), &IDS);
        assert_eq!(worksheet, Worksheet::blank());
        assert_eq!(worksheet.pages, vec![String::new()]);
        assert_eq!(worksheet.participants, vec![String::new()]);
    }

    #[test]
    fn save_then_load() {
        let mut worksheet = Worksheet::blank();
        worksheet.set_header("header-fecha", "2024-05-02");
        worksheet.pages[0] = "<b>uno</b>".into();
        worksheet.add_page("dos");
        worksheet.participants[0] = "Ana".into();
        worksheet.add_participant("Luis");

        let mut store = MemoryStore::new();
        worksheet.save(&mut store).unwrap();
        assert_eq!(Worksheet::load(&store, &IDS), worksheet);
    }

    #[test]
    fn malformed_pages_fall_back_to_one_page() {
        let mut store = MemoryStore::new();
        store.set("pagesData", "{oops").unwrap();
        store.set("participants", "[]").unwrap();
        let worksheet = Worksheet::load(&store, &IDS);
        assert_eq!(worksheet.pages.len(), 1);
        assert_eq!(worksheet.participants.len(), 1);
    }

    #[test]
    fn empty_header_values_are_skipped() {
        let mut store = MemoryStore::new();
        store.set("header-header-sede", "").unwrap();
        let worksheet = Worksheet::load(&store, &IDS);
        assert!(worksheet.header.is_empty());
    }

    #[test]
    fn page_and_participant_edits() {
        let mut worksheet = Worksheet::blank();
        assert_eq!(worksheet.add_page("b"), 1);
        assert!(worksheet.remove_page(0));
        assert!(!worksheet.remove_page(5));
        assert_eq!(worksheet.pages, vec!["b".to_string()]);
        worksheet.clear_pages();
        assert_eq!(worksheet.pages, vec![String::new()]);

        assert!(worksheet.remove_participant(0));
        assert!(worksheet.participants.is_empty());
        assert!(!worksheet.remove_participant(0));
    }
}
