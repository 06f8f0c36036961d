//! The durable multi-page document store.
//!
//! Pages are local-only: they are persisted as a single serialized blob
//! through a [`KeyValueStore`] and never replicated through the relay.

use crate::storage::{KeyValueStore, StorageError};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Storage key holding the serialized page collection.
pub const PAGES_KEY: &str = "quillboard.pages";
/// Legacy storage key holding the raw single-document text.
pub const LEGACY_TEXT_KEY: &str = "quillboard.text";

/// Maximum number of pages the store will hold.
pub const MAX_PAGES: usize = 50;
/// Maximum page name length in characters.
pub const MAX_NAME_LEN: usize = 64;

/// A durable document unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Timestamp-derived identifier, unique within the store.
    pub id: String,
    /// Display name, at most [`MAX_NAME_LEN`] characters.
    pub name: String,
    /// Page text content.
    pub content: String,
    /// Creation time, unix milliseconds.
    pub created: i64,
    /// Last edit time, unix milliseconds.
    pub last_edited: i64,
}

/// Page store errors.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Page limit reached ({0} pages)")]
    AtCapacity(usize),
    #[error("Page not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// CRUD over the page collection, persisted as one blob per mutation.
pub struct PageStore<S: KeyValueStore> {
    pages: HashMap<String, Page>,
    selected: Option<String>,
    storage: S,
}

impl<S: KeyValueStore> PageStore<S> {
    /// Load the page collection from storage.
    ///
    /// When no collection exists but the legacy single-document text
    /// does, the text is wrapped into one page, persisted, and the
    /// legacy key is removed. Missing data is never fatal: an absent
    /// store starts empty.
    pub fn load(storage: S) -> Result<Self, PageError> {
        let mut store = Self {
            pages: HashMap::new(),
            selected: None,
            storage,
        };

        match store.storage.get(PAGES_KEY)? {
            Some(blob) => match serde_json::from_str::<HashMap<String, Page>>(&blob) {
                Ok(pages) => store.pages = pages,
                Err(e) => {
                    log::warn!("discarding unreadable page collection: {}", e);
                }
            },
            None => {
                // One-time migration of the legacy single document.
                if let Some(text) = store.storage.get(LEGACY_TEXT_KEY)? {
                    let page = store.build_page(text);
                    log::info!("migrated legacy document into page {}", page.id);
                    store.pages.insert(page.id.clone(), page);
                    store.persist()?;
                    store.storage.remove(LEGACY_TEXT_KEY)?;
                }
            }
        }

        Ok(store)
    }

    /// Number of pages held.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Get a page by id.
    pub fn get(&self, id: &str) -> Option<&Page> {
        self.pages.get(id)
    }

    /// The currently selected page id, if any.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Select a page. Selecting an unknown id clears the selection.
    pub fn select(&mut self, id: &str) {
        self.selected = self.pages.contains_key(id).then(|| id.to_string());
    }

    /// Pages in display order: most recently edited first. Ties break by
    /// descending creation time, then descending id.
    pub fn pages_sorted(&self) -> Vec<&Page> {
        let mut pages: Vec<&Page> = self.pages.values().collect();
        pages.sort_by(|a, b| {
            b.last_edited
                .cmp(&a.last_edited)
                .then(b.created.cmp(&a.created))
                .then(b.id.cmp(&a.id))
        });
        pages
    }

    /// Create a new empty page and select it.
    ///
    /// Fails without touching the store when the collection is at
    /// capacity.
    pub fn create(&mut self) -> Result<&Page, PageError> {
        if self.pages.len() >= MAX_PAGES {
            return Err(PageError::AtCapacity(MAX_PAGES));
        }
        let page = self.build_page(String::new());
        let id = page.id.clone();
        self.pages.insert(id.clone(), page);
        self.persist()?;
        self.selected = Some(id.clone());
        Ok(&self.pages[&id])
    }

    /// Rename a page.
    ///
    /// The name is trimmed and truncated to [`MAX_NAME_LEN`] characters.
    /// An empty or whitespace-only name is silently ignored and the
    /// prior name retained.
    pub fn rename(&mut self, id: &str, name: &str) -> Result<(), PageError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        let bounded: String = trimmed.chars().take(MAX_NAME_LEN).collect();
        let page = self
            .pages
            .get_mut(id)
            .ok_or_else(|| PageError::NotFound(id.to_string()))?;
        page.name = bounded;
        self.persist()
    }

    /// Replace a page's content and touch its last-edited time.
    pub fn edit_content(&mut self, id: &str, content: impl Into<String>) -> Result<(), PageError> {
        let page = self
            .pages
            .get_mut(id)
            .ok_or_else(|| PageError::NotFound(id.to_string()))?;
        page.content = content.into();
        page.last_edited = now_millis();
        self.persist()
    }

    /// Delete a page.
    ///
    /// If it was selected, selection falls back to the most recently
    /// edited remaining page, or none.
    pub fn delete(&mut self, id: &str) -> Result<(), PageError> {
        if self.pages.remove(id).is_none() {
            return Err(PageError::NotFound(id.to_string()));
        }
        if self.selected.as_deref() == Some(id) {
            self.selected = self.pages_sorted().first().map(|p| p.id.clone());
        }
        self.persist()
    }

    fn persist(&mut self) -> Result<(), PageError> {
        let blob = serde_json::to_string(&self.pages)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage.set(PAGES_KEY, &blob)?;
        Ok(())
    }

    /// Build a page with a fresh timestamp-derived id and a name derived
    /// from the creation time. Ids are effectively unique; collisions
    /// within one millisecond are resolved by bumping the timestamp.
    fn build_page(&self, content: String) -> Page {
        let created = now_millis();
        let mut stamp = created;
        while self.pages.contains_key(&page_id(stamp)) {
            stamp += 1;
        }
        Page {
            id: page_id(stamp),
            name: default_name(created),
            content,
            created,
            last_edited: created,
        }
    }
}

fn page_id(millis: i64) -> String {
    format!("page-{}", millis)
}

fn default_name(millis: i64) -> String {
    let name = chrono::DateTime::from_timestamp_millis(millis)
        .map(|utc| {
            utc.with_timezone(&Local)
                .format("Note %b %e, %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| "Note".to_string());
    name.chars().take(MAX_NAME_LEN).collect()
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
