//! Slug → page lookup table.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::page::Page;

/// Every registered page under its unique slug.
#[derive(Debug, Default)]
pub struct PageIndex {
    pages: RwLock<BTreeMap<String, Arc<Page>>>,
}

impl PageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slug: &str) -> Option<Arc<Page>> {
        self.pages.read().get(slug).cloned()
    }

    /// Register `page` under `slug`, replacing any previous holder.
    pub fn add(&self, slug: &str, page: Arc<Page>) {
        self.pages.write().insert(slug.to_string(), page);
    }

    pub fn remove(&self, slug: &str) -> Option<Arc<Page>> {
        self.pages.write().remove(slug)
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.pages.read().contains_key(slug)
    }

    pub fn len(&self) -> usize {
        self.pages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.read().is_empty()
    }

    /// Pages matching `pred`, ordered by slug.
    pub fn filter(&self, pred: impl Fn(&Arc<Page>) -> bool) -> Vec<Arc<Page>> {
        self.pages
            .read()
            .values()
            .filter(|p| pred(p))
            .cloned()
            .collect()
    }

    pub fn slugs(&self) -> Vec<String> {
        self.pages.read().keys().cloned().collect()
    }

    pub fn make_empty(&self) {
        self.pages.write().clear();
    }

    /// First free slug among `slug`, `slug-2`, `slug-3`, ...
    pub fn unique_slug(&self, slug: &str) -> String {
        let pages = self.pages.read();
        if !pages.contains_key(slug) {
            return slug.to_string();
        }
        (2..)
            .map(|n| format!("{slug}-{n}"))
            .find(|candidate| !pages.contains_key(candidate))
            .unwrap_or_else(|| slug.to_string())
    }
}
