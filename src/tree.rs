//! Content tree building.
//!
//! Walks the content root one directory at a time and turns every entry into
//! a page, registering it as it goes:
//!
//! ```text
//! content/                      ← content root
//! ├── 1_en/                     ← Lang "en", Level 0, slug "en"
//! │   ├── .dir                  ← parameters of 1_en itself
//! │   ├── 1_Hello.md            ← Level 1
//! │   ├── 2_top-menu/           ← Level 1 dir, slug "en-top-menu"
//! │   │   ├── 1_Simple.md       ← Level 2, GroupKey "2_top-menu"
//! │   │   └── Sports/           ← Level 2 dir
//! │   │       └── Golf.md       ← Level 3, GroupKey "2_top-menu"
//! │   └── logo.png              ← asset → public/images/1_en/logo.png
//! └── 2_lv/
//! ```
//!
//! ## Per directory
//!
//! 1. List entries in file name order, skipping dot names.
//! 2. Copy assets to the public directory.
//! 3. Parse the remaining entries in parallel.
//! 4. In file name order: assign path metadata, drop invisible pages,
//!    deduplicate the slug, register, recurse into directories, link
//!    collections.
//! 5. Sort the listed children per the directory's `Sort` parameter.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use rand::Rng;
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::app::Application;
use crate::collection::Collections;
use crate::config::EngineConfig;
use crate::index::PageIndex;
use crate::naming::{CONTENT_EXT, extension};
use crate::page::Page;

/// Upper bound for random sort numbers.
const RANDOM_SORT_MAX: u32 = 1_000_000;

/// Pages of one directory, split by whether they show up in listings.
#[derive(Debug, Default)]
pub struct DirPages {
    pub listed: Vec<Arc<Page>>,
    pub unlisted: Vec<Arc<Page>>,
}

/// Builds one generation of the page tree into an index and collections.
pub struct TreeBuilder<'a> {
    config: &'a EngineConfig,
    index: &'a PageIndex,
    collections: &'a Collections,
    app: Weak<Application>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(
        config: &'a EngineConfig,
        index: &'a PageIndex,
        collections: &'a Collections,
        app: Weak<Application>,
    ) -> Self {
        Self {
            config,
            index,
            collections,
            app,
        }
    }

    /// Build the whole tree. Returns the listed top-level pages.
    pub fn build(&self) -> Vec<Arc<Page>> {
        let mut top = self.load_dir(&self.config.content_path);
        sort_pages(&mut top.listed, "");
        top.listed
    }

    /// Load one directory level, recursing into subdirectories.
    pub fn load_dir(&self, dir: &Path) -> DirPages {
        let mut sources = Vec::new();
        for path in list_entries(dir) {
            if path.is_file() && extension(&file_name(&path)).to_lowercase() != CONTENT_EXT {
                self.relocate_asset(&path);
            } else {
                sources.push(path);
            }
        }

        let parsed: Vec<Page> = sources
            .par_iter()
            .map(|path| Page::from_file(path, self.config))
            .collect();

        let mut pages = DirPages::default();
        for page in parsed {
            let page = Arc::new(page);
            page.link_app(self.app.clone());
            self.assign_path_params(&page);

            if !page.is_yes("IsVisible") {
                tracing::debug!(path = %page.get("Path"), "skipping invisible page");
                continue;
            }

            let slug = self.index.unique_slug(&page.slug());
            page.force_slug(&slug);
            self.index.add(&slug, page.clone());

            if page.is_dir() {
                self.load_children(&page);
            }
            self.collections.link_page(&page);

            if page.is_yes("IsUnlisted") {
                pages.unlisted.push(page);
            } else {
                pages.listed.push(page);
            }
        }
        pages
    }

    fn load_children(&self, page: &Arc<Page>) {
        let DirPages {
            mut listed,
            unlisted,
        } = self.load_dir(Path::new(&page.get("Path")));
        sort_pages(&mut listed, &page.get("Sort"));
        for child in listed.iter().chain(&unlisted) {
            child.set_parent(page);
        }
        page.set_children(listed);
    }

    /// `Lang`, `Level`, `GroupKey` and the language prefix of level-1 slugs.
    fn assign_path_params(&self, page: &Page) {
        let path = PathBuf::from(page.get("Path"));
        let Ok(rel) = path.strip_prefix(&self.config.content_path) else {
            return;
        };
        let segments: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let Some(first) = segments.first() else {
            return;
        };

        // Chars, not bytes: a root named "1_latviešu" must not split a character
        let chars: Vec<char> = first.chars().collect();
        let lang: String = chars[chars.len().saturating_sub(2)..].iter().collect();
        page.set("Lang", lang.as_str());

        // Directories above the entry, language roots included
        let depth = segments.len();
        page.set_value("Level", depth - 1);

        if page.is_dir() && depth == 2 {
            page.force_slug(&format!("{lang}-{}", page.slug()));
        }
        if depth > 2 {
            page.set("GroupKey", segments[1].as_str());
        }
    }

    /// Copy a non-content file into `<public>/images` or `<public>/data`,
    /// keeping its path below the content root. Unknown kinds are ignored.
    fn relocate_asset(&self, src: &Path) {
        let ext = extension(&file_name(src)).to_string();
        let Some(bucket) = self.config.asset_bucket(&ext) else {
            tracing::debug!(path = %src.display(), "ignoring non-content file");
            return;
        };
        let rel = src.strip_prefix(&self.config.content_path).unwrap_or(src);
        let dest = self.config.public_path.join(bucket).join(rel);

        if !is_newer(src, &dest) {
            return;
        }
        let copied = dest
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| fs::copy(src, &dest));
        match copied {
            Ok(_) => tracing::debug!(from = %src.display(), to = %dest.display(), "copied asset"),
            Err(e) => tracing::warn!(from = %src.display(), to = %dest.display(), error = %e, "asset copy failed"),
        }
    }
}

/// Entries directly inside `dir`, sorted by file name, dot names skipped.
fn list_entries(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "cannot read directory entry");
                None
            }
        })
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.into_path())
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `true` when `dest` is missing or older than `src`.
fn is_newer(src: &Path, dest: &Path) -> bool {
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
    match (modified(src), modified(dest)) {
        (Some(s), Some(d)) => s > d,
        (_, None) => true,
        (None, Some(_)) => false,
    }
}

fn sort_nr(page: &Page) -> u32 {
    page.get_int("SortNr")
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or_default()
}

/// Order siblings by `SortNr` according to a directory's `Sort` mode.
///
/// - `"Reverse"`: descending
/// - `"Random"`: every page gets a fresh random non-zero `SortNr`, then ascending
/// - anything else: ascending
///
/// Pages without a sort number (or `0`) keep their positions; numbered pages
/// are ordered among the remaining slots. The sort is stable.
pub fn sort_pages(pages: &mut [Arc<Page>], mode: &str) {
    if pages.len() < 2 {
        return;
    }
    if mode == "Random" {
        let mut rng = rand::thread_rng();
        for page in pages.iter() {
            page.set_value("SortNr", rng.gen_range(1..=RANDOM_SORT_MAX));
        }
    }
    let descending = mode == "Reverse";

    let slots: Vec<usize> = pages
        .iter()
        .enumerate()
        .filter(|(_, p)| sort_nr(p) > 0)
        .map(|(i, _)| i)
        .collect();
    let mut numbered: Vec<Arc<Page>> = slots.iter().map(|&i| pages[i].clone()).collect();
    if descending {
        numbered.sort_by_cached_key(|p| std::cmp::Reverse(sort_nr(p)));
    } else {
        numbered.sort_by_cached_key(|p| sort_nr(p));
    }
    for (slot, page) in slots.into_iter().zip(numbered) {
        pages[slot] = page;
    }
}
