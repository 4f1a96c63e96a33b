//! Directory-level parameter defaults.
//!
//! Two kinds of header-only files supply fallback parameters by position in
//! the content tree:
//!
//! ```text
//! content/
//! ├── .subdefaults            ← inherited by everything below content/
//! └── en/
//!     ├── .defaults           ← applies to entries directly in en/, top-menu/ included
//!     ├── .subdefaults        ← inherited by everything below en/ (wins over content/)
//!     └── top-menu/
//!         ├── .defaults       ← applies to pages directly in top-menu/
//!         ├── .dir            ← parameters of the top-menu page, an entry of en/
//!         └── 1_Simple.md
//! ```
//!
//! A directory page is an entry of its parent directory, so it resolves its
//! defaults there, not from the files inside it. A `.subdefaults` file does
//! not apply to its own directory's entries, only to the levels below it. The upward walk stops at the first ancestor without a
//! `.subdefaults` file, after the content root, or at the filesystem root,
//! whichever comes first.

use std::fs;
use std::path::Path;

use crate::params::{Params, merge_params, parse_header};

pub const DEFAULTS_FILE: &str = ".defaults";
pub const SUBDEFAULTS_FILE: &str = ".subdefaults";

/// Defaults for pages living in `dir`: its `.defaults` over inherited `.subdefaults`.
pub fn resolve_defaults(dir: &Path, content_root: &Path) -> Params {
    let same_level = read_param_file(&dir.join(DEFAULTS_FILE)).unwrap_or_default();
    let inherited = inherited_defaults(dir, content_root);
    merge_params(&same_level, &[&inherited])
}

/// Merge `.subdefaults` from the ancestors of `dir`, nearest first.
pub fn inherited_defaults(dir: &Path, content_root: &Path) -> Params {
    let mut merged = Params::new();
    let mut ancestor = dir.parent();

    while let Some(candidate) = ancestor {
        if !candidate.starts_with(content_root) {
            break;
        }
        let Some(found) = read_param_file(&candidate.join(SUBDEFAULTS_FILE)) else {
            break;
        };
        merged = merge_params(&merged, &[&found]);
        if candidate == content_root {
            break;
        }
        ancestor = candidate.parent();
    }

    merged
}

/// Read a header-only parameter file. `None` if it cannot be read.
fn read_param_file(path: &Path) -> Option<Params> {
    let buf = fs::read(path).ok()?;
    Some(parse_header(&buf, true))
}
