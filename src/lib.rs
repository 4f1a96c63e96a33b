//! # Mango
//!
//! A flat-file content engine. Your filesystem is the data source:
//! directories become sections, text files become pages, and a small
//! `Key: Value` header on each file carries its metadata.
//!
//! # Architecture: Files In, Page Graph Out
//!
//! ```text
//! content/ ─▶ file + defaults ─▶ Page ─▶ TreeBuilder ─▶ Site { tree, index, collections }
//!              (params, body)                              │
//!                                                          ▼
//!                                      Application ── page(slug), search, collection(...)
//! ```
//!
//! Consumers (HTTP handlers, templates, sitemap writers) only talk to
//! [`app::Application`]: look up a page by slug, list a collection entry, walk
//! the tree below a node, or reload.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`params`] | Parameter maps: header parsing, layered merge, append directives |
//! | [`naming`] | `NN_Label.ext` filename convention and filename visibility |
//! | [`slug`] | URL slug derivation with transliteration |
//! | [`date`] | Human date parsing and `VisibleFrom`/`VisibleTo` windows |
//! | [`defaults`] | `.defaults` / `.subdefaults` resolution by directory position |
//! | [`file`] | One path → one complete parameter set |
//! | [`render`] | Markdown rendering and asset URL rewriting |
//! | [`page`] | The shared, lock-protected page entity |
//! | [`index`] | Slug → page table |
//! | [`collection`] | Tag-like many-to-many indexes |
//! | [`tree`] | Content directory walk, sorting, slug dedup, asset relocation |
//! | [`postload`] | Cross-page parameters: `ContentFrom`, breadcrumbs, redirects |
//! | [`app`] | Load/reload lifecycle, lookup, structural mutation |
//! | [`config`] | `mango.toml` loading, validation, merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Everything Is a String Parameter
//!
//! Page metadata stays a flat `String → String` map so authors can invent keys
//! without touching code. [`page::Page`] layers typed accessors (`get_bool`,
//! `get_int`, `is_negation`, ...) on top instead of fixing a schema.
//!
//! ## Generations Instead of In-Place Rebuilds
//!
//! A reload never clears the live index. It builds a complete new
//! [`app::Site`] and swaps it in, so a request that started on the old graph
//! finishes on the old graph. Structural edits (`add_page`, `remove_page`)
//! share the load lock so they never race a rebuild.
//!
//! ## Weak Back-References
//!
//! Ownership runs Application → Site → tree → children. Parent and
//! application links are `Weak`, so dropping a generation frees it.
//!
//! ## Filesystem Is the Source of Truth
//!
//! Ordering comes from `NN_` prefixes, defaults from dotfiles next to the
//! content, visibility from filenames and date windows. There is no database
//! and nothing is written back to the content tree.

pub mod app;
pub mod collection;
pub mod config;
pub mod date;
pub mod defaults;
pub mod file;
pub mod index;
pub mod naming;
pub mod output;
pub mod page;
pub mod params;
pub mod postload;
pub mod render;
pub mod slug;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_helpers;
