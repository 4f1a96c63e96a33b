//! The page entity.
//!
//! A [`Page`] is shared between the tree, the index and any number of
//! collections, so it is always handled as `Arc<Page>` and mutated through
//! interior locks. Each concern has its own lock so that reading parameters
//! never waits on a content reload:
//!
//! | Field      | Lock                  | Direction                     |
//! |------------|-----------------------|-------------------------------|
//! | params     | `RwLock<Params>`      | owned                         |
//! | content    | `RwLock<Vec<u8>>`     | owned                         |
//! | app        | `OnceLock<Weak<_>>`   | back-reference, set once      |
//! | parent     | `RwLock<Weak<Page>>`  | back-reference                |
//! | children   | `RwLock<Vec<Arc<_>>>` | owned, in display order       |
//!
//! No method holds one of its locks while calling another method that takes
//! the same lock.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, OnceLock, Weak};

use chrono::{DateTime, NaiveDateTime};
use parking_lot::RwLock;
use regex::Regex;

use crate::app::Application;
use crate::config::EngineConfig;
use crate::file::{mod_time_nanos, read_params};
use crate::naming::{CONTENT_EXT, filename_to_params};
use crate::params::{NO, Params, YES, merge_params, split_list};
use crate::render::{asset_dir, render_body, rewrite_asset_urls};

/// Values that read as "no" in [`Page::is_negation`].
const NEGATIONS: &[&str] = &["No", "", "Not", "None", "N/A", "0", "-1"];

/// `{Key}` placeholders in [`Page::populate_params`].
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid"));

pub struct Page {
    params: RwLock<Params>,
    content: RwLock<Vec<u8>>,
    app: OnceLock<Weak<Application>>,
    parent: RwLock<Weak<Page>>,
    children: RwLock<Vec<Arc<Page>>>,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("slug", &self.slug())
            .field("params", &self.params_len())
            .field("children", &self.children.read().len())
            .finish()
    }
}

impl Page {
    fn with_params(params: Params, content: Vec<u8>) -> Self {
        Self {
            params: RwLock::new(params),
            content: RwLock::new(content),
            app: OnceLock::new(),
            parent: RwLock::new(Weak::new()),
            children: RwLock::new(Vec::new()),
        }
    }

    /// Read a content file or directory into a page.
    ///
    /// The body is rendered and its asset references rewritten; the transient
    /// `Content` parameter is consumed in the process.
    pub fn from_file(path: &Path, config: &EngineConfig) -> Self {
        let mut params = read_params(path, &config.content_path);
        let raw = params.remove("Content").unwrap_or_default();
        let content = prepare_content(&raw, &params, config);
        Self::with_params(params, content)
    }

    /// A page with no filesystem backing.
    ///
    /// Parameters are derived as for `<label>.md`; the derived slug is kept
    /// as `VirtualSlug` and `Slug` is left unset.
    pub fn virtual_page(label: &str) -> Self {
        let mut params = filename_to_params(Path::new(&format!("{label}{CONTENT_EXT}")));
        if let Some(slug) = params.remove("Slug") {
            params.insert("VirtualSlug".into(), slug);
        }
        params.insert("IsVirtual".into(), YES.into());
        Self::with_params(params, Vec::new())
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    /// Value of `key`, empty when unset.
    pub fn get(&self, key: &str) -> String {
        self.params.read().get(key).cloned().unwrap_or_default()
    }

    pub fn get_opt(&self, key: &str) -> Option<String> {
        self.params.read().get(key).cloned()
    }

    /// `true` only for the literal `Yes`.
    pub fn get_bool(&self, key: &str) -> bool {
        self.is_yes(key)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.params.read().get(key)?.trim().parse().ok()
    }

    pub fn slug(&self) -> String {
        self.get("Slug")
    }

    /// Set a parameter. `Slug` is immutable and silently ignored.
    pub fn set(&self, key: &str, val: impl Into<String>) {
        if key == "Slug" {
            return;
        }
        self.params.write().insert(key.to_string(), val.into());
    }

    pub fn set_value(&self, key: &str, val: impl fmt::Display) {
        self.set(key, val.to_string());
    }

    pub fn set_bool(&self, key: &str, val: bool) {
        self.set(key, if val { YES } else { NO });
    }

    /// Assign the slug during tree building and deduplication.
    pub(crate) fn force_slug(&self, slug: &str) {
        self.params.write().insert("Slug".into(), slug.to_string());
    }

    pub fn remove_param(&self, key: &str) -> Option<String> {
        if key == "Slug" {
            return None;
        }
        self.params.write().remove(key)
    }

    /// Merge `more` underneath the current parameters (existing keys win).
    pub fn merge_params(&self, more: &Params) {
        let mut params = self.params.write();
        let merged = merge_params(&params, &[more]);
        *params = merged;
    }

    /// Snapshot of all parameters.
    pub fn params(&self) -> Params {
        self.params.read().clone()
    }

    pub fn params_len(&self) -> usize {
        self.params.read().len()
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.params.read().get(key).is_some_and(|v| !v.is_empty())
    }

    pub fn is_equal(&self, key: &str, val: &str) -> bool {
        self.params.read().get(key).is_some_and(|v| v == val)
    }

    pub fn is_yes(&self, key: &str) -> bool {
        self.is_equal(key, YES)
    }

    /// Anything but `Yes`, including unset.
    pub fn is_no(&self, key: &str) -> bool {
        !self.is_yes(key)
    }

    /// Loose negation: `No`, empty, `Not`, `None`, `N/A`, `0`, `-1` or unset.
    pub fn is_negation(&self, key: &str) -> bool {
        let params = self.params.read();
        let val = params.get(key).map(String::as_str).unwrap_or_default();
        NEGATIONS.contains(&val)
    }

    pub fn is_dir(&self) -> bool {
        self.is_yes("IsDir")
    }

    pub fn is_virtual(&self) -> bool {
        self.is_yes("IsVirtual")
    }

    /// Split a list parameter on `sep`, trimming items and dropping empties.
    pub fn split(&self, key: &str, sep: &str) -> Vec<String> {
        split_list(&self.get(key), sep)
    }

    /// Replace `{Key}` placeholders with this page's parameters.
    ///
    /// `"/{Lang}/{Slug}"` → `"/en/cats"`. Unknown keys become empty.
    pub fn populate_params(&self, template: &str) -> String {
        let params = self.params.read();
        PLACEHOLDER
            .replace_all(template, |caps: &regex::Captures| {
                params.get(&caps[1]).cloned().unwrap_or_default()
            })
            .into_owned()
    }

    /// Modification time as recorded in `ModTime`, or now if unknown.
    pub fn mod_time(&self) -> NaiveDateTime {
        self.get_opt("ModTime")
            .and_then(|v| v.parse::<i64>().ok())
            .map(DateTime::from_timestamp_nanos)
            .map(|dt| dt.naive_utc())
            .unwrap_or_else(crate::date::now)
    }

    /// Set `Lang`, falling back to the first top-level page's slug when the
    /// application does not know the language.
    pub fn set_lang(&self, lang: &str) {
        let lang = match self.app() {
            Some(app) if !app.is_valid_lang(lang) => app
                .pages()
                .first()
                .map(|p| p.slug())
                .unwrap_or_else(|| lang.to_string()),
            _ => lang.to_string(),
        };
        self.set("Lang", lang);
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// Current content.
    ///
    /// While the application's reload marker exists the file is re-read on
    /// every access. Pages with `IsCache: No` are re-read when the file's
    /// modification time changed. Directories and virtual pages never reload.
    pub fn content(&self) -> Vec<u8> {
        if !self.is_dir() && !self.is_virtual() {
            let forced = self.app().is_some_and(|app| app.reload_marker_exists());
            if forced || self.is_no("IsCache") {
                self.reload_content(forced);
            }
        }
        self.content.read().clone()
    }

    /// Content as text, lossily decoded.
    pub fn content_string(&self) -> String {
        String::from_utf8_lossy(&self.content()).into_owned()
    }

    /// Replace the content. Asset references are rewritten once the page
    /// belongs to an application.
    pub fn set_content(&self, content: Vec<u8>) {
        let content = match self.app() {
            Some(app) => {
                let config = app.config();
                let dir = asset_dir(Path::new(&self.get("Path")), &config.content_path);
                rewrite_asset_urls(&content, &dir, config)
            }
            None => content,
        };
        *self.content.write() = content;
    }

    pub fn append_content(&self, more: &[u8]) {
        let mut content = self.content.read().clone();
        content.extend_from_slice(more);
        self.set_content(content);
    }

    /// Re-read parameters and content from disk.
    ///
    /// Without `force`, nothing happens unless the modification time differs
    /// from `ModTime`. Returns whether the page was reloaded. The slug and
    /// tree position are kept.
    pub fn reload_content(&self, force: bool) -> bool {
        if self.is_dir() || self.is_virtual() {
            return false;
        }
        let path = PathBuf::from(self.get("Path"));
        let Ok(meta) = fs::metadata(&path) else {
            return false;
        };
        let mod_time = mod_time_nanos(&meta).to_string();
        if !force && self.is_equal("ModTime", &mod_time) {
            return false;
        }

        let app = self.app();
        let fallback;
        let config = match &app {
            Some(app) => app.config(),
            None => {
                fallback = EngineConfig {
                    content_path: path.parent().map(Path::to_path_buf).unwrap_or_default(),
                    ..EngineConfig::default()
                };
                &fallback
            }
        };

        let mut fresh = read_params(&path, &config.content_path);
        let raw = fresh.remove("Content").unwrap_or_default();
        let content = prepare_content(&raw, &fresh, config);
        fresh.remove("Slug");

        {
            let mut params = self.params.write();
            for (key, val) in fresh {
                params.insert(key, val);
            }
            params.insert("ModTime".into(), mod_time);
        }
        *self.content.write() = content;
        tracing::debug!(slug = %self.slug(), path = %path.display(), "reloaded page content");
        true
    }

    // =========================================================================
    // Graph
    // =========================================================================

    pub fn app(&self) -> Option<Arc<Application>> {
        self.app.get().and_then(Weak::upgrade)
    }

    /// Attach to an application. Only the first call has an effect.
    pub(crate) fn link_app(&self, app: Weak<Application>) {
        let _ = self.app.set(app);
    }

    pub fn parent(&self) -> Option<Arc<Page>> {
        self.parent.read().upgrade()
    }

    pub(crate) fn set_parent(&self, parent: &Arc<Page>) {
        *self.parent.write() = Arc::downgrade(parent);
    }

    pub(crate) fn clear_parent(&self) {
        *self.parent.write() = Weak::new();
    }

    /// Listed children in display order.
    pub fn children(&self) -> Vec<Arc<Page>> {
        self.children.read().clone()
    }

    pub(crate) fn set_children(&self, children: Vec<Arc<Page>>) {
        *self.children.write() = children;
    }

    pub(crate) fn push_child(&self, child: Arc<Page>) {
        self.children.write().push(child);
    }

    pub(crate) fn remove_child(&self, child: &Arc<Page>) -> bool {
        let mut children = self.children.write();
        let before = children.len();
        children.retain(|c| !Arc::ptr_eq(c, child));
        children.len() != before
    }

    /// Descendants in pre-order for which `pred` holds. The page itself is
    /// not included.
    pub fn walk(&self, pred: impl Fn(&Arc<Page>) -> bool) -> Vec<Arc<Page>> {
        let mut found = Vec::new();
        self.walk_into(&pred, &mut found);
        found
    }

    fn walk_into(&self, pred: &dyn Fn(&Arc<Page>) -> bool, found: &mut Vec<Arc<Page>>) {
        for child in self.children() {
            if pred(&child) {
                found.push(child.clone());
            }
            child.walk_into(pred, found);
        }
    }

    /// Call `f` for each ancestor, nearest first, until it returns `false`.
    pub fn walk_top(&self, mut f: impl FnMut(&Arc<Page>) -> bool) {
        let mut current = self.parent();
        while let Some(page) = current {
            if !f(&page) {
                break;
            }
            current = page.parent();
        }
    }

    /// Ancestors, root first.
    pub fn breadcrumbs(&self) -> Vec<Arc<Page>> {
        let mut trail = Vec::new();
        self.walk_top(|p| {
            trail.push(p.clone());
            true
        });
        trail.reverse();
        trail
    }

    /// One page of the listed children, 1-based.
    ///
    /// `limit` caps how many children take part (0 = all) and `size` is the
    /// page length (0 = everything on one page). `num` is clamped into range.
    /// The child list itself is left alone; the window is described in
    /// `PNum`, `PPrev`, `PNext`, `PSize`, `PFrom`, `PTo`, `PTotalPages` and
    /// `PTotalItems`, where `PPrev`/`PNext` are 0 when there is no such page
    /// and `PFrom`/`PTo` are 1-based item positions (0 when empty).
    pub fn children_page(&self, num: usize, size: usize, limit: usize) -> Vec<Arc<Page>> {
        let mut items = self.children();
        if limit > 0 {
            items.truncate(limit);
        }
        let total_items = items.len();
        let size = if size == 0 { total_items.max(1) } else { size };
        let total_pages = total_items.div_ceil(size);
        let num = num.clamp(1, total_pages.max(1));

        let from = ((num - 1) * size).min(total_items);
        let to = (from + size).min(total_items);
        let window = items[from..to].to_vec();

        let prev = if num > 1 { num - 1 } else { 0 };
        let next = if num < total_pages { num + 1 } else { 0 };
        let (first, last) = if window.is_empty() { (0, 0) } else { (from + 1, to) };
        for (key, val) in [
            ("PNum", num),
            ("PPrev", prev),
            ("PNext", next),
            ("PSize", size),
            ("PFrom", first),
            ("PTo", last),
            ("PTotalPages", total_pages),
            ("PTotalItems", total_items),
        ] {
            self.set_value(key, val);
        }
        window
    }

    /// Descendants whose slug, label, title or content contain `term`,
    /// ignoring case.
    pub fn search(&self, term: &str) -> Vec<Arc<Page>> {
        let term = term.trim().to_lowercase();
        self.walk(|p| p.search_text().contains(&term))
    }

    /// Descendants where `key` equals `val`.
    pub fn search_by_param(&self, key: &str, val: &str) -> Vec<Arc<Page>> {
        self.walk(|p| p.is_equal(key, val))
    }

    /// Slug, label, title and content run together, lowercased.
    fn search_text(&self) -> String {
        let mut text: String = {
            let params = self.params.read();
            ["Slug", "Label", "Title"]
                .iter()
                .filter_map(|k| params.get(*k).map(String::as_str))
                .collect()
        };
        text.push_str(&self.content_string());
        text.to_lowercase()
    }
}

/// Render a raw body for storage and rewrite its asset references.
fn prepare_content(raw: &str, params: &Params, config: &EngineConfig) -> Vec<u8> {
    if raw.is_empty() {
        return Vec::new();
    }
    let is_html = params.get("IsHTML").is_some_and(|v| v == YES);
    let path = params.get("Path").map(String::as_str).unwrap_or_default();
    let dir = asset_dir(Path::new(path), &config.content_path);
    rewrite_asset_urls(&render_body(raw, is_html), &dir, config)
}
