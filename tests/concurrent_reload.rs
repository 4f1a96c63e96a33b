//! Reload against concurrent readers and writers.
//!
//! Readers must always see a complete generation: every snapshot has the
//! same page count, every listed child is registered, and collections point
//! at registered pages.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use mango::app::{Application, Site};
use mango::config::EngineConfig;
use mango::page::Page;
use tempfile::TempDir;

const SECTIONS: usize = 6;
const PAGES_PER_SECTION: usize = 15;

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

/// en/ with numbered sections full of tagged pages.
fn build_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "content/en/.dir", "Title: English");
    for s in 1..=SECTIONS {
        write(tmp.path(), &format!("content/en/{s}_Section {s}/.dir"), "Sort: Reverse");
        for p in 1..=PAGES_PER_SECTION {
            write(
                tmp.path(),
                &format!("content/en/{s}_Section {s}/{p}_Page {s} {p}.md"),
                &format!("Tags: shared, section-{s}\n+++\nBody of page {s}.{p}"),
            );
        }
    }
    tmp
}

/// language root + sections + pages
fn expected_pages() -> usize {
    1 + SECTIONS + SECTIONS * PAGES_PER_SECTION
}

fn assert_consistent(site: &Site) {
    assert_eq!(site.index.len(), expected_pages());
    assert_eq!(site.tree.len(), 1);

    let mut stack: Vec<Arc<Page>> = site.tree.clone();
    while let Some(page) = stack.pop() {
        let registered = site.index.get(&page.slug()).expect("listed page is registered");
        assert!(Arc::ptr_eq(&registered, &page), "index holds the same page as the tree");
        stack.extend(page.children());
    }

    let shared = site.collections.get("Tags").unwrap().get("shared");
    assert_eq!(shared.len(), SECTIONS * PAGES_PER_SECTION);
    for page in shared {
        assert!(site.index.contains(&page.slug()));
    }
}

#[test]
fn readers_never_see_partial_graph() {
    let tmp = build_site();
    let app = Application::open(EngineConfig::with_base(tmp.path()));
    assert_consistent(&app.site());

    let done = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let app = Arc::clone(&app);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut checks = 0;
                while !done.load(Ordering::Acquire) || checks == 0 {
                    assert_consistent(&app.site());
                    let page = app.page("page-3-7").expect("page survives reloads");
                    assert!(page.content_string().contains("Body of page 3.7"));
                    assert_eq!(app.collection_pages("Tag", "section-2").len(), PAGES_PER_SECTION);
                    checks += 1;
                }
                checks
            })
        })
        .collect();

    for _ in 0..10 {
        app.reload();
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
}

#[test]
fn concurrent_reloads_serialize() {
    let tmp = build_site();
    let app = Application::open(EngineConfig::with_base(tmp.path()));

    let loaders: Vec<_> = (0..4)
        .map(|_| {
            let app = Arc::clone(&app);
            thread::spawn(move || {
                for _ in 0..3 {
                    app.reload();
                }
            })
        })
        .collect();
    for loader in loaders {
        loader.join().unwrap();
    }

    assert_consistent(&app.site());
    let section = app.page("en-section-1").unwrap();
    let first: Vec<String> = section.children().iter().take(3).map(|p| p.slug()).collect();
    assert_eq!(first, vec!["page-1-15", "page-1-14", "page-1-13"]);
}

#[test]
fn mutation_during_reload_lands_in_one_generation() {
    let tmp = build_site();
    let app = Application::open(EngineConfig::with_base(tmp.path()));

    let reloader = {
        let app = Arc::clone(&app);
        thread::spawn(move || {
            for _ in 0..5 {
                app.reload();
            }
        })
    };

    let mut added = Vec::new();
    for i in 0..20 {
        let page = app.new_page("en", &format!("Extra {i}"));
        page.set("Tags", "extra");
        let parent = app.page("en-section-1");
        added.extend(app.add_page(&page, parent.as_ref()));
    }
    reloader.join().unwrap();

    // Extras are in-memory only: a reload after the last add drops them
    app.reload();
    for slug in added {
        assert!(app.page(&slug).is_none());
    }
    assert!(app.collection_pages("Tags", "extra").is_empty());
    assert_consistent(&app.site());
}
