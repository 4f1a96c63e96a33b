//! Tag-like many-to-many indexes.
//!
//! A [`Collection`] maps normalized item keys to pages: a page with
//! `Tags: Pet, animal` is listed under `pet` and `animal` in the `Tags`
//! collection. [`Collections`] holds one collection per configured parameter
//! name.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::page::Page;

/// Separator between items in a collection parameter.
pub const ITEM_SEP: &str = ",";

/// Singular spellings accepted for the stock plural collection names.
const SINGULARS: &[(&str, &str)] = &[
    ("Tag", "Tags"),
    ("Category", "Categories"),
    ("Keyword", "Keywords"),
];

/// Trimmed, lowercased item key.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Item key → pages, in the order they were appended.
#[derive(Debug, Default)]
pub struct Collection {
    items: RwLock<HashMap<String, Vec<Arc<Page>>>>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, key: &str, page: Arc<Page>) {
        self.items
            .write()
            .entry(normalize_key(key))
            .or_default()
            .push(page);
    }

    pub fn get(&self, key: &str) -> Vec<Arc<Page>> {
        self.items
            .read()
            .get(&normalize_key(key))
            .cloned()
            .unwrap_or_default()
    }

    pub fn remove(&self, key: &str) -> Option<Vec<Arc<Page>>> {
        self.items.write().remove(&normalize_key(key))
    }

    /// Drop `page` from every entry; entries left empty disappear.
    pub fn remove_page(&self, page: &Arc<Page>) {
        self.items.write().retain(|_, pages| {
            pages.retain(|p| !Arc::ptr_eq(p, page));
            !pages.is_empty()
        });
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.items.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn make_empty(&self) {
        self.items.write().clear();
    }
}

/// The configured collections of one loaded site, by parameter name.
#[derive(Debug, Default)]
pub struct Collections {
    by_name: BTreeMap<String, Arc<Collection>>,
}

impl Collections {
    pub fn new(names: &[String]) -> Self {
        Self {
            by_name: names
                .iter()
                .map(|name| (name.clone(), Arc::new(Collection::new())))
                .collect(),
        }
    }

    /// Look up by parameter name, accepting `Tag`, `Category` and `Keyword`
    /// for their plural forms.
    pub fn get(&self, name: &str) -> Option<Arc<Collection>> {
        self.by_name
            .get(name)
            .or_else(|| {
                SINGULARS
                    .iter()
                    .find(|(singular, _)| *singular == name)
                    .and_then(|(_, plural)| self.by_name.get(*plural))
            })
            .cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.by_name.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Append `page` to every collection whose parameter it sets.
    pub fn link_page(&self, page: &Arc<Page>) {
        for (name, collection) in &self.by_name {
            for item in page.split(name, ITEM_SEP) {
                collection.append(&item, page.clone());
            }
        }
    }

    pub fn unlink_page(&self, page: &Arc<Page>) {
        for collection in self.by_name.values() {
            collection.remove_page(page);
        }
    }

    pub fn make_empty(&self) {
        for collection in self.by_name.values() {
            collection.make_empty();
        }
    }
}
