//! Cross-page parameters that need the whole site loaded first.
//!
//! | Parameter         | Effect                                                   |
//! |-------------------|----------------------------------------------------------|
//! | `ContentFrom`     | append content of a slug, a directory's children, or `Tags:pet` / `Collection:pet` entries |
//! | `ContentTemplate` | wrapper for each appended piece, default `"\n{{ Content }}"` |
//! | `Breadcrumbs`     | set to ancestor slugs, root first                        |
//! | `Redirect`        | `RedirectSlug` set when it names a known slug            |
//!
//! Pages are visited in slug order. A page whose content is pulled in by
//! `ContentFrom` contributes whatever content it has at that moment.

use std::sync::Arc;

use crate::collection::Collections;
use crate::index::PageIndex;
use crate::page::Page;
use crate::params::{APPEND_SEP, YES};

/// Placeholder replaced by the pulled-in content.
pub const CONTENT_PLACEHOLDER: &str = "{{ Content }}";

const DEFAULT_CONTENT_TEMPLATE: &str = "\n{{ Content }}";

/// Prefix of `ContentFrom` values that name a collection entry.
const COLLECTION_SOURCE: &str = "Collection:";

pub fn run(index: &PageIndex, collections: &Collections) {
    for page in index.filter(|_| true) {
        pull_content(&page, index, collections);
        set_breadcrumbs(&page);
        resolve_redirect(&page, index);
    }
}

fn pull_content(page: &Arc<Page>, index: &PageIndex, collections: &Collections) {
    let Some(source) = page.get_opt("ContentFrom").filter(|s| !s.trim().is_empty()) else {
        return;
    };
    let source = source.trim();

    let named_collection = source
        .split_once(':')
        .is_some_and(|(name, _)| collections.get(name.trim()).is_some());

    let pieces: Vec<Arc<Page>> = if let Some(rest) = source.strip_prefix(COLLECTION_SOURCE) {
        collections_entry(collections, rest.trim())
    } else if named_collection {
        collections_entry(collections, source)
    } else {
        match index.get(source) {
            Some(found) if found.is_dir() => found.children(),
            Some(found) => vec![found],
            None => Vec::new(),
        }
    };
    let pieces: Vec<Arc<Page>> = pieces
        .into_iter()
        .filter(|p| !Arc::ptr_eq(p, page))
        .collect();
    if pieces.is_empty() {
        tracing::debug!(slug = %page.slug(), source, "ContentFrom matched nothing");
        return;
    }

    let template = page
        .get_opt("ContentTemplate")
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_CONTENT_TEMPLATE.to_string());

    for piece in pieces {
        let wrapped = template.replacen(CONTENT_PLACEHOLDER, &piece.content_string(), 1);
        page.append_content(wrapped.as_bytes());
    }
    page.set("HaveContent", YES);
}

/// `"Tags:pet"` → pages tagged `pet`. A bare key searches every collection.
fn collections_entry(collections: &Collections, entry: &str) -> Vec<Arc<Page>> {
    match entry.split_once(':') {
        Some((name, key)) => collections
            .get(name.trim())
            .map(|c| c.get(key))
            .unwrap_or_default(),
        None => collections
            .names()
            .iter()
            .filter_map(|name| collections.get(name))
            .flat_map(|c| c.get(entry))
            .collect(),
    }
}

fn set_breadcrumbs(page: &Arc<Page>) {
    let trail: Vec<String> = page.breadcrumbs().iter().map(|p| p.slug()).collect();
    if !trail.is_empty() {
        page.set("Breadcrumbs", trail.join(APPEND_SEP));
    }
}

fn resolve_redirect(page: &Arc<Page>, index: &PageIndex) {
    let target = page.get("Redirect");
    let target = target.trim().trim_start_matches('/');
    if !target.is_empty() && index.contains(target) {
        page.set("RedirectSlug", target);
    }
}
