//! Content rendering: Markdown to HTML and asset URL rewriting.

use std::path::Path;
use std::sync::LazyLock;

use pulldown_cmark::{Options, Parser, html};
use regex::bytes::{Captures, Regex};

use crate::config::EngineConfig;

/// `src="..."` and `href="..."` attributes preceded by whitespace.
static ASSET_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\s)(src|href)="([^"]*)""#).expect("asset attribute pattern is valid")
});

/// Render Markdown to HTML.
///
/// Tabs become four spaces and carriage returns are dropped first, so that
/// files written on any platform produce the same output.
pub fn markdown_to_html(src: &str) -> String {
    let src = src.replace('\t', "    ").replace('\r', "");
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(&src, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Raw page body to stored content: Markdown is rendered unless `is_html`.
pub fn render_body(raw: &str, is_html: bool) -> Vec<u8> {
    if is_html {
        raw.as_bytes().to_vec()
    } else {
        markdown_to_html(raw).into_bytes()
    }
}

/// Point relative asset references at their relocated public URLs.
///
/// Image references in `src` and data references in `href` are rewritten.
/// Assets are relocated with their path below the content root, so relative
/// references resolve against `dir`, the page's directory below that root:
///
/// ```text
/// dir = "1_en/3_Animals"
/// src="logo.png"          → src="{prefix}images/1_en/3_Animals/logo.png"
/// src="images/logo.png"   → src="{prefix}images/1_en/3_Animals/logo.png"
/// src="/images/logo.png"  → src="{prefix}images/logo.png"
/// ```
///
/// Other absolute paths, URLs with a scheme, fragments and unknown extensions
/// are left alone. Rewriting is idempotent as long as the prefix is absolute
/// or carries a scheme.
pub fn rewrite_asset_urls(content: &[u8], dir: &str, config: &EngineConfig) -> Vec<u8> {
    ASSET_ATTR
        .replace_all(content, |caps: &Captures| {
            let attr = &caps[2];
            let value = String::from_utf8_lossy(&caps[3]);
            let bucket = if attr == b"src" { "images" } else { "data" };

            match rewrite_one(&value, bucket, dir, config) {
                Some(url) => {
                    let mut out = caps[1].to_vec();
                    out.extend_from_slice(attr);
                    out.extend_from_slice(b"=\"");
                    out.extend_from_slice(url.as_bytes());
                    out.push(b'"');
                    out
                }
                None => caps[0].to_vec(),
            }
        })
        .into_owned()
}

fn rewrite_one(value: &str, bucket: &str, dir: &str, config: &EngineConfig) -> Option<String> {
    let (rest, rooted) = match value.strip_prefix(&format!("/{bucket}/")) {
        Some(rest) => (rest, true),
        None => (value.strip_prefix(&format!("{bucket}/")).unwrap_or(value), false),
    };

    if rest.is_empty() || rest.starts_with(['/', '#', '?']) || rest.contains(':') {
        return None;
    }
    let ext = crate::naming::extension(rest.split(['?', '#']).next().unwrap_or(rest));
    if config.asset_bucket(ext) != Some(bucket) {
        return None;
    }
    let dir = dir.trim_matches('/');
    if rooted || dir.is_empty() {
        Some(format!("{}{bucket}/{rest}", config.file_url_prefix))
    } else {
        Some(format!("{}{bucket}/{dir}/{rest}", config.file_url_prefix))
    }
}

/// Directory of `path` below `content_root`, `/`-separated.
///
/// `content/1_en/3_Animals/Cats.md` → `"1_en/3_Animals"`. Empty when `path`
/// is not below the root.
pub fn asset_dir(path: &Path, content_root: &Path) -> String {
    path.parent()
        .and_then(|dir| dir.strip_prefix(content_root).ok())
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}
