//! Shared test utilities for the mango test suite.
//!
//! Provides a fixture site, lookup helpers that panic with the available
//! slugs, and a tree shape assertion.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let (_tmp, app) = open_fixtures();
//!
//! let menu = find_page(&app, "en-top-menu");
//! assert_eq!(child_slugs(&menu)[0], "simple-slug-oh");
//!
//! assert_tree_shape(&app, &[
//!     ("en", &["hello", "en-top-menu", "en-animals"]),
//!     ("lv", &["hello-2", "sveiki"]),
//! ]);
//! ```

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use crate::app::Application;
use crate::config::EngineConfig;
use crate::page::Page;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to `<tmp>/content` and return the temp directory.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    let content = tmp.path().join("content");
    std::fs::create_dir_all(&content).unwrap();
    copy_dir_recursive(&fixtures, &content).unwrap();
    tmp
}

/// Fixture copy plus an application loaded from it with stock settings.
pub fn open_fixtures() -> (TempDir, Arc<Application>) {
    let tmp = setup_fixtures();
    let app = Application::open(EngineConfig::with_base(tmp.path()));
    (tmp, app)
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Lookups — panics with a clear message on miss
// =========================================================================

/// Find a registered page by slug. Panics if not found.
pub fn find_page(app: &Application, slug: &str) -> Arc<Page> {
    app.page(slug).unwrap_or_else(|| {
        let slugs: Vec<String> = app.pages_where(|_| true).iter().map(|p| p.slug()).collect();
        panic!("page '{slug}' not found. Available: {slugs:?}")
    })
}

/// Slugs of a page's listed children, in order.
pub fn child_slugs(page: &Page) -> Vec<String> {
    page.children().iter().map(|p| p.slug()).collect()
}

// =========================================================================
// Tree helpers
// =========================================================================

/// Assert the top two levels of the tree.
///
/// Each entry is `(top-level slug, child slugs)`.
pub fn assert_tree_shape(app: &Application, expected: &[(&str, &[&str])]) {
    let top: Vec<String> = app.pages().iter().map(|p| p.slug()).collect();
    let expected_top: Vec<&str> = expected.iter().map(|(s, _)| *s).collect();
    assert_eq!(top, expected_top, "top-level slugs mismatch");

    for (slug, children) in expected {
        let actual = child_slugs(&find_page(app, slug));
        assert_eq!(actual, children.to_vec(), "children of '{slug}' mismatch");
    }
}
