//! CLI output formatting.
//!
//! # Information-First Display
//!
//! The primary display for every page is its semantic identity (positional
//! index, title and slug), with parameters shown as secondary, indented
//! context lines.
//!
//! # Output Format
//!
//! ## Tree
//!
//! ```text
//! 001 English [en]
//!     001 Hello [hello]
//!     002 Top menu [en-top-menu]
//!         001 Simple changed [simple-slug-oh]
//! ```
//!
//! ## Collection
//!
//! ```text
//! Tags
//!     pet (2)
//!         cats
//!         dogs
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure,
//! apart from reading page state.

use std::sync::Arc;

use crate::app::Application;
use crate::collection::Collection;
use crate::page::Page;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `Title [slug]`, falling back to the label when there is no title.
fn page_identity(page: &Page) -> String {
    let title = page.get("Title");
    let title = if title.is_empty() { page.get("Label") } else { title };
    format!("{} [{}]", title, page.slug())
}

// ============================================================================
// Tree
// ============================================================================

/// Listed pages as an indented tree.
pub fn format_tree(pages: &[Arc<Page>]) -> Vec<String> {
    let mut lines = Vec::new();
    tree_lines(pages, 0, &mut lines);
    lines
}

fn tree_lines(pages: &[Arc<Page>], depth: usize, lines: &mut Vec<String>) {
    for (i, page) in pages.iter().enumerate() {
        lines.push(format!(
            "{}{} {}",
            indent(depth),
            format_index(i + 1),
            page_identity(page)
        ));
        tree_lines(&page.children(), depth + 1, lines);
    }
}

pub fn print_tree(pages: &[Arc<Page>]) {
    for line in format_tree(pages) {
        println!("{line}");
    }
}

// ============================================================================
// Pages
// ============================================================================

/// One line per page: `slug  Lang  Level  Path`.
pub fn format_page_list(pages: &[Arc<Page>]) -> Vec<String> {
    let width = pages.iter().map(|p| p.slug().chars().count()).max().unwrap_or(0);
    pages
        .iter()
        .map(|p| {
            format!(
                "{:<width$}  {:<2}  {}  {}",
                p.slug(),
                p.get("Lang"),
                p.get("Level"),
                p.get("Path"),
            )
        })
        .collect()
}

pub fn print_page_list(pages: &[Arc<Page>]) {
    for line in format_page_list(pages) {
        println!("{line}");
    }
}

/// A page's identity followed by its parameters and content size.
pub fn format_page(page: &Page) -> Vec<String> {
    let mut lines = vec![page_identity(page)];
    for (key, val) in page.params() {
        let val = val.replace('\n', "\\n");
        lines.push(format!("{}{key}: {val}", indent(1)));
    }
    let children = page.children();
    if !children.is_empty() {
        let slugs: Vec<String> = children.iter().map(|c| c.slug()).collect();
        lines.push(format!("{}Children: {}", indent(1), slugs.join(", ")));
    }
    lines.push(format!("{}Content: {} bytes", indent(1), page.content().len()));
    lines
}

pub fn print_page(page: &Page) {
    for line in format_page(page) {
        println!("{line}");
    }
}

/// Search hits as `001 Title [slug]` lines with a count footer.
pub fn format_search(term: &str, hits: &[Arc<Page>]) -> Vec<String> {
    let mut lines: Vec<String> = hits
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{} {}", format_index(i + 1), page_identity(p)))
        .collect();
    let noun = if hits.len() == 1 { "page" } else { "pages" };
    lines.push(format!("{} {noun} matching {term:?}", hits.len()));
    lines
}

pub fn print_search(term: &str, hits: &[Arc<Page>]) {
    for line in format_search(term, hits) {
        println!("{line}");
    }
}

// ============================================================================
// Collections
// ============================================================================

/// A collection's keys with member slugs, or only the entry for `key`.
pub fn format_collection(name: &str, collection: &Collection, key: Option<&str>) -> Vec<String> {
    let keys = match key {
        Some(k) => vec![crate::collection::normalize_key(k)],
        None => collection.keys(),
    };
    let mut lines = vec![name.to_string()];
    for key in keys {
        let pages = collection.get(&key);
        lines.push(format!("{}{key} ({})", indent(1), pages.len()));
        for page in pages {
            lines.push(format!("{}{}", indent(2), page.slug()));
        }
    }
    lines
}

pub fn print_collection(name: &str, collection: &Collection, key: Option<&str>) {
    for line in format_collection(name, collection, key) {
        println!("{line}");
    }
}

// ============================================================================
// Summary
// ============================================================================

/// `Loaded 12 pages (2 top-level), collections: Tags 3, Categories 1`
pub fn format_summary(app: &Application) -> String {
    let collections: Vec<String> = app
        .collection_names()
        .iter()
        .map(|name| {
            let keys = app.collection(name).map(|c| c.len()).unwrap_or_default();
            format!("{name} {keys}")
        })
        .collect();
    format!(
        "Loaded {} pages ({} top-level), collections: {}",
        app.page_count(),
        app.pages().len(),
        if collections.is_empty() {
            "none".to_string()
        } else {
            collections.join(", ")
        }
    )
}

pub fn print_summary(app: &Application) {
    println!("{}", format_summary(app));
}
