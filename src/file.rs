//! Content file reading: one path in, one merged parameter set out.
//!
//! ```text
//! 1_Simple.md                  filename  → Slug, Label, SortNr, Ext, ...
//! ├── header (before +++)      header    → author-written keys
//! ├── content (after +++)      body      → Content, HaveContent
//! └── ../.defaults, .subdefaults         → directory defaults
//! ```
//!
//! Precedence is header over filename over defaults. Directories are read
//! through their `.dir` file, which is header only.

use std::fs::{self, Metadata};
use std::path::Path;
use std::time::UNIX_EPOCH;

use crate::date::{apply_visibility_window, now};
use crate::defaults::resolve_defaults;
use crate::naming::{CONTENT_EXT, DIR_FILE, filename_to_params};
use crate::params::{NO, Params, YES, merge_params, parse_header_detailed, settle_appends};

/// Line separating the header from the content in `.md` files.
pub const HEADER_SEPARATOR: &str = "+++";

/// Read a file or directory into a complete parameter set.
///
/// The body, if any, is returned under the transient `Content` key so that the
/// caller can move it into page content. A path that cannot be stat'ed yields
/// an empty map; an unreadable file is treated as empty.
pub fn read_params(fpath: &Path, content_root: &Path) -> Params {
    let Ok(meta) = fs::metadata(fpath) else {
        return Params::new();
    };
    let is_dir = meta.is_dir();
    let target = if is_dir {
        fpath.join(DIR_FILE)
    } else {
        fpath.to_path_buf()
    };

    let mut from_name = filename_to_params(&target);
    from_name.insert("Path".into(), fpath.to_string_lossy().into_owned());
    from_name.insert("ModTime".into(), mod_time_nanos(&meta).to_string());
    let is_content = from_name.get("Ext").is_some_and(|ext| ext == CONTENT_EXT);

    let buf = fs::read(&target).unwrap_or_default();
    let (header_buf, body) = if is_content {
        split_header(&buf)
    } else {
        (buf.as_slice(), &[][..])
    };

    let header = parse_header_detailed(header_buf, true);
    for skipped in &header.skipped {
        tracing::debug!(
            path = %target.display(),
            line = skipped.line,
            reason = ?skipped.reason,
            text = %skipped.text,
            "skipping header line"
        );
    }
    let mut params = header.params;

    let body = body.trim_ascii();
    if body.is_empty() {
        params.insert("HaveContent".into(), NO.into());
    } else {
        params.insert("HaveContent".into(), YES.into());
        params.insert("Content".into(), String::from_utf8_lossy(body).into_owned());
    }

    // A directory is an entry of its parent, like any page
    let defaults = match fpath.parent() {
        Some(dir) if is_content || is_dir => resolve_defaults(dir, content_root),
        _ => Params::new(),
    };

    let untitled = params.get("Title").is_none_or(String::is_empty);
    if let Some(label) = params.get("Label").filter(|l| untitled && !l.is_empty()) {
        let label = label.clone();
        params.insert("Title".into(), label);
    }

    let mut params = merge_params(&params, &[&from_name, &defaults]);
    settle_appends(&mut params);
    apply_visibility_window(&mut params, now());

    if params.get("IsCache").is_none_or(|v| v != NO) {
        params.insert("IsCache".into(), YES.into());
    }

    params
}

/// Split `.md` bytes at the first line consisting only of `+++`.
///
/// Without a separator the whole file is content.
pub fn split_header(buf: &[u8]) -> (&[u8], &[u8]) {
    let mut start = 0;
    while start <= buf.len() {
        let end = buf[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(buf.len(), |i| start + i);
        if buf[start..end].trim_ascii() == HEADER_SEPARATOR.as_bytes() {
            let body_start = (end + 1).min(buf.len());
            return (&buf[..start], &buf[body_start..]);
        }
        start = end + 1;
    }
    (&[], buf)
}

/// Modification time as Unix nanoseconds, 0 when the platform cannot tell.
pub fn mod_time_nanos(meta: &Metadata) -> u128 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) -> std::path::PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        path
    }

    // =========================================================================
    // split_header
    // =========================================================================

    #[test]
    fn splits_on_separator_line() {
        let (h, c) = split_header(b"Title: x\n+++\nBody\n");
        assert_eq!(h, b"Title: x\n");
        assert_eq!(c, b"Body\n");
    }

    #[test]
    fn separator_must_be_whole_line() {
        let (h, c) = split_header(b"Title: a+++b\nBody");
        assert!(h.is_empty());
        assert_eq!(c, b"Title: a+++b\nBody");
    }

    #[test]
    fn no_separator_means_all_content() {
        let (h, c) = split_header(b"Just text");
        assert!(h.is_empty());
        assert_eq!(c, b"Just text");
    }

    #[test]
    fn separator_at_end_of_file() {
        let (h, c) = split_header(b"Title: x\n+++");
        assert_eq!(h, b"Title: x\n");
        assert!(c.is_empty());
    }

    #[test]
    fn crlf_separator() {
        let (h, c) = split_header(b"A: 1\r\n+++\r\nBody");
        assert_eq!(h, b"A: 1\r\n");
        assert_eq!(c, b"Body");
    }

    // =========================================================================
    // read_params
    // =========================================================================

    #[test]
    fn missing_path_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(read_params(&tmp.path().join("nope.md"), tmp.path()).is_empty());
    }

    #[test]
    fn header_and_content() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "en/1_Simple.md", "Tags: a, b\n+++\n\n  Hello  \n");
        let p = read_params(&path, tmp.path());

        assert_eq!(p["Tags"], "a, b");
        assert_eq!(p["Content"], "Hello");
        assert_eq!(p["HaveContent"], "Yes");
        assert_eq!(p["Slug"], "simple");
        assert_eq!(p["SortNr"], "1");
        assert_eq!(p["Path"], path.to_string_lossy());
        assert_eq!(p["IsCache"], "Yes");
        assert!(p["ModTime"].parse::<u128>().unwrap() > 0);
    }

    #[test]
    fn header_wins_over_filename_and_defaults() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "en/.defaults", "Icon: default.ico\nSlug: from-defaults");
        let path = write(tmp.path(), "en/Simple.md", "Slug: simple-slug-oh\n+++\n");
        let p = read_params(&path, tmp.path());

        assert_eq!(p["Slug"], "simple-slug-oh");
        assert_eq!(p["Icon"], "default.ico");
        assert_eq!(p["HaveContent"], "No");
        assert!(!p.contains_key("Content"));
    }

    #[test]
    fn label_fills_title() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "Simple.md", "Label: Simple changed\n+++\n");
        let p = read_params(&path, tmp.path());
        assert_eq!(p["Label"], "Simple changed");
        assert_eq!(p["Title"], "Simple changed");
        assert_eq!(p["Slug"], "simple-changed");
    }

    #[test]
    fn explicit_title_kept() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "One more.md", "Title: Title is changed\n+++\n");
        let p = read_params(&path, tmp.path());
        assert_eq!(p["Title"], "Title is changed");
        assert_eq!(p["Label"], "One more");
    }

    #[test]
    fn markdown_without_separator_is_all_content() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "Note.md", "Title: not a header");
        let p = read_params(&path, tmp.path());
        assert_eq!(p["Title"], "Note");
        assert_eq!(p["Content"], "Title: not a header");
    }

    #[test]
    fn directory_reads_dir_file() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "en/3_Sports/.dir", "Sort: Reverse");
        write(tmp.path(), "en/.defaults", "Icon: en.ico");
        let dir = tmp.path().join("en/3_Sports");
        let p = read_params(&dir, tmp.path());

        assert_eq!(p["IsDir"], "Yes");
        assert_eq!(p["Sort"], "Reverse");
        assert_eq!(p["Slug"], "sports");
        assert_eq!(p["Icon"], "en.ico");
        assert_eq!(p["Path"], dir.to_string_lossy());
        assert_eq!(p["HaveContent"], "No");
    }

    #[test]
    fn directory_without_dir_file() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("en/Weather")).unwrap();
        let p = read_params(&tmp.path().join("en/Weather"), tmp.path());
        assert_eq!(p["Label"], "Weather");
        assert_eq!(p["IsVisible"], "Yes");
    }

    #[test]
    fn dir_file_text_is_header_not_content() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "Menu/.dir", "Title: Menu\n+++\nignored");
        let p = read_params(&tmp.path().join("Menu"), tmp.path());
        assert!(!p.contains_key("Content"));
    }

    #[test]
    fn is_cache_no_preserved() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "Live.md", "IsCache: No\n+++\nx");
        assert_eq!(read_params(&path, tmp.path())["IsCache"], "No");
    }

    #[test]
    fn future_window_hides_page() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "021_Soccer.md", "VisibleFrom: 2099-03-21\n+++\n");
        assert_eq!(read_params(&path, tmp.path())["IsVisible"], "No");
    }

    #[test]
    fn header_append_extends_defaults() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "en/.defaults", "Keywords: y");
        let path = write(tmp.path(), "en/Page.md", "+Keywords: x\n+++\n");
        let p = read_params(&path, tmp.path());
        assert_eq!(p["Keywords"], "y, x");
        assert!(!p.contains_key("+Keywords"));
    }

    #[test]
    fn asset_gets_no_defaults() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), ".defaults", "Icon: default.ico");
        let path = write(tmp.path(), "logo.png", "binary");
        let p = read_params(&path, tmp.path());
        assert!(!p.contains_key("Icon"));
        assert_eq!(p["IsVisible"], "No");
    }

    #[test]
    fn directory_skips_its_own_defaults() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), ".subdefaults", "Deep: root");
        write(tmp.path(), "en/.subdefaults", "Sub: en");
        write(tmp.path(), "en/Menu/.dir", "Title: Menu");
        write(tmp.path(), "en/Menu/.defaults", "Icon: inner.ico");
        write(tmp.path(), "en/Menu/.subdefaults", "Sub: inner");
        let p = read_params(&tmp.path().join("en/Menu"), tmp.path());

        // en/.subdefaults covers the levels below en/, not en's own entries
        assert!(!p.contains_key("Icon"));
        assert!(!p.contains_key("Sub"));
        assert_eq!(p["Deep"], "root");
    }
}
