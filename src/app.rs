//! Application lifecycle: load, reload, lookup and structural mutation.
//!
//! The loaded site is one immutable-shape generation ([`Site`]: tree, index
//! and collections) behind an [`ArcSwap`]. A load builds the next generation
//! off to the side and publishes it in a single swap, so readers see either
//! the old graph or the new one, never a mix:
//!
//! ```text
//!            busy lock held
//!   load ─────────────────────────────────────────────┐
//!     │ TreeBuilder ─▶ Site(next) ─▶ postload::run ─▶ swap
//!     ▼                                                ▼
//!   readers ── site.load() ── Site(current) ───────── Site(next)
//! ```
//!
//! `add_page` and `remove_page` take the same lock as `load`, so structural
//! changes never interleave with a rebuild.

use std::path::Path;
use std::sync::{Arc, Weak};
use std::time::Instant;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::collection::{Collection, Collections};
use crate::config::{ConfigError, EngineConfig, load_config};
use crate::index::PageIndex;
use crate::page::Page;
use crate::postload;
use crate::slug::to_slug;
use crate::tree::TreeBuilder;

/// One loaded generation of the page graph.
#[derive(Debug, Default)]
pub struct Site {
    /// Listed top-level pages, usually one per language.
    pub tree: Vec<Arc<Page>>,
    pub index: PageIndex,
    pub collections: Collections,
}

impl Site {
    fn empty(config: &EngineConfig) -> Self {
        Self {
            tree: Vec::new(),
            index: PageIndex::new(),
            collections: Collections::new(&config.collections),
        }
    }
}

pub struct Application {
    config: EngineConfig,
    site: ArcSwap<Site>,
    busy: Mutex<()>,
    this: Weak<Application>,
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("content_path", &self.config.content_path)
            .field("pages", &self.page_count())
            .finish()
    }
}

impl Application {
    /// An application with an empty site. Call [`Application::load`] to read content.
    pub fn new(config: EngineConfig) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            site: ArcSwap::from_pointee(Site::empty(&config)),
            config,
            busy: Mutex::new(()),
            this: this.clone(),
        })
    }

    /// Create and load in one step.
    pub fn open(config: EngineConfig) -> Arc<Self> {
        let app = Self::new(config);
        app.load();
        app
    }

    /// Load `mango.toml` from `base` and open the site it describes.
    pub fn from_dir(base: &Path) -> Result<Arc<Self>, ConfigError> {
        Ok(Self::open(load_config(base)?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current generation.
    pub fn site(&self) -> Arc<Site> {
        self.site.load_full()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Read the content tree and publish it. Concurrent calls queue up.
    pub fn load(&self) {
        let _busy = self.busy.lock();
        let started = Instant::now();

        let mut next = Site::empty(&self.config);
        next.tree = TreeBuilder::new(
            &self.config,
            &next.index,
            &next.collections,
            self.this.clone(),
        )
        .build();
        postload::run(&next.index, &next.collections);

        tracing::info!(
            content = %self.config.content_path.display(),
            pages = next.index.len(),
            top_level = next.tree.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "content loaded"
        );
        self.site.store(Arc::new(next));
    }

    pub fn reload(&self) {
        self.load();
    }

    /// Whether the reload marker file currently exists.
    pub fn reload_marker_exists(&self) -> bool {
        self.config.reload_marker.exists()
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn page(&self, slug: &str) -> Option<Arc<Page>> {
        self.site.load().index.get(slug)
    }

    /// Listed top-level pages.
    pub fn pages(&self) -> Vec<Arc<Page>> {
        self.site.load().tree.clone()
    }

    pub fn page_count(&self) -> usize {
        self.site.load().index.len()
    }

    /// Registered pages matching `pred`, ordered by slug.
    pub fn pages_where(&self, pred: impl Fn(&Arc<Page>) -> bool) -> Vec<Arc<Page>> {
        self.site.load().index.filter(pred)
    }

    /// A language is valid when a top-level page carries it as its slug.
    pub fn is_valid_lang(&self, lang: &str) -> bool {
        self.site.load().tree.iter().any(|p| p.slug() == lang)
    }

    /// Descendants of `root_slug` matching `term`. Unknown root → empty.
    pub fn search(&self, root_slug: &str, term: &str) -> Vec<Arc<Page>> {
        self.page(root_slug)
            .map(|root| root.search(term))
            .unwrap_or_default()
    }

    pub fn collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.site.load().collections.get(name)
    }

    pub fn collection_pages(&self, name: &str, key: &str) -> Vec<Arc<Page>> {
        self.collection(name)
            .map(|c| c.get(key))
            .unwrap_or_default()
    }

    pub fn collection_names(&self) -> Vec<String> {
        self.site.load().collections.names()
    }

    pub fn collection_count(&self) -> usize {
        self.site.load().collections.len()
    }

    // =========================================================================
    // Page creation and structural mutation
    // =========================================================================

    /// A virtual page bound to this application but not registered.
    ///
    /// An unknown `lang` falls back to the first top-level page's slug.
    pub fn new_page(&self, lang: &str, label: &str) -> Arc<Page> {
        let page = Arc::new(Page::virtual_page(label));
        page.link_app(self.this.clone());
        page.set_lang(lang);
        page
    }

    /// Read a file into a page bound to this application but not registered.
    pub fn file_to_page(&self, path: &Path) -> Arc<Page> {
        let page = Arc::new(Page::from_file(path, &self.config));
        page.link_app(self.this.clone());
        page
    }

    /// Register `page`, link its collections and attach it below `parent`
    /// unless it is unlisted. Returns the (possibly suffixed) slug.
    ///
    /// The slug comes from `Slug`, then `VirtualSlug`, then the label. A page
    /// with none of them is not registered and `None` is returned.
    pub fn add_page(&self, page: &Arc<Page>, parent: Option<&Arc<Page>>) -> Option<String> {
        let wanted = ["Slug", "VirtualSlug"]
            .iter()
            .map(|key| page.get(key))
            .chain(std::iter::once(to_slug(&page.get("Label"))))
            .find(|slug| !slug.is_empty());
        let Some(wanted) = wanted else {
            tracing::warn!("page without slug or label not added");
            return None;
        };

        let _busy = self.busy.lock();
        let site = self.site();

        page.link_app(self.this.clone());
        let slug = site.index.unique_slug(&wanted);
        page.force_slug(&slug);
        site.index.add(&slug, page.clone());
        site.collections.link_page(page);

        if let Some(parent) = parent {
            page.set_parent(parent);
            if !page.is_yes("IsUnlisted") {
                parent.push_child(page.clone());
            }
        }
        tracing::debug!(slug = %slug, "page added");
        Some(slug)
    }

    /// Unregister a page, detach it from its parent and drop it from every
    /// collection.
    pub fn remove_page(&self, slug: &str) -> Option<Arc<Page>> {
        let _busy = self.busy.lock();
        let site = self.site();

        let page = site.index.remove(slug)?;
        if let Some(parent) = page.parent() {
            parent.remove_child(&page);
        }
        page.clear_parent();
        site.collections.unlink_page(&page);
        tracing::debug!(slug, "page removed");
        Some(page)
    }
}
