//! Page parameters: header parsing and layered merging.
//!
//! Every page is described by a flat, string-keyed parameter map. Values are
//! always strings; booleans are the literals `"Yes"`/`"No"` and numbers are
//! decimal digit strings. The map stays untyped on purpose so that content
//! authors can attach any metadata they like; typed access lives on
//! [`Page`](crate::page::Page).
//!
//! ## Header format
//!
//! ```text
//! Title: Weather report
//! Tags: rain, snow
//! # comment lines are skipped
//! Summary: first line \
//! second line
//! +++
//! Content starts here.
//! ```
//!
//! ## Merge precedence
//!
//! [`merge_params`] takes the most important map first. Lower maps only fill
//! keys the result does not have yet, except for append directives (`+Key`),
//! which concatenate instead of being dropped:
//!
//! ```text
//! higher {+Keywords: x}  +  lower {Keywords: y}   →  Keywords = "y, x"
//! higher {Keywords: a}   +  lower {+Keywords: z}  →  Keywords = "a, z"
//! ```

use std::collections::BTreeMap;

/// A page's parameter set.
pub type Params = BTreeMap<String, String>;

pub const YES: &str = "Yes";
pub const NO: &str = "No";

/// Separator used when an append directive concatenates values.
pub const APPEND_SEP: &str = ", ";

/// Stands in for an escaped newline while lines are split.
///
/// A header that literally contains this character (U+10A58) gets it turned
/// into a newline; nothing escapes it.
const CONTINUATION_GLUE: &str = "\u{10A58}";

/// First characters marking a comment line in strict mode.
const COMMENT_MARKERS: &[char] = &['#', '/', '-', '<', '"', '~'];

/// Why a header line did not produce a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No `:` after a non-empty key.
    NoSeparator,
    /// Starts with a comment marker (strict mode).
    Comment,
    /// Key contains whitespace (strict mode).
    InvalidKey,
}

/// A non-blank header line that was ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number after continuation lines are joined.
    pub line: usize,
    pub text: String,
    pub reason: SkipReason,
}

/// Parsed header with the lines that were dropped along the way.
#[derive(Debug, Default)]
pub struct Header {
    pub params: Params,
    pub skipped: Vec<SkippedLine>,
}

/// Parse `Key: Value` lines into parameters.
///
/// `strict` rejects comment-style lines and keys with whitespace; translation
/// files are parsed with `strict = false`.
pub fn parse_header(buf: &[u8], strict: bool) -> Params {
    parse_header_detailed(buf, strict).params
}

/// Like [`parse_header`], but also reports every skipped non-blank line.
pub fn parse_header_detailed(buf: &[u8], strict: bool) -> Header {
    let text = String::from_utf8_lossy(buf)
        .replace("\r\n", "\n")
        .replace("\\\n", CONTINUATION_GLUE);

    let mut header = Header::default();
    for (i, raw) in text.split('\n').enumerate() {
        let row = raw.trim();
        if row.is_empty() {
            continue;
        }
        let mut skip = |reason| {
            header.skipped.push(SkippedLine {
                line: i + 1,
                text: row.replace(CONTINUATION_GLUE, "\\"),
                reason,
            })
        };

        let Some((key, val)) = row.split_once(':').filter(|(k, _)| !k.is_empty()) else {
            skip(SkipReason::NoSeparator);
            continue;
        };
        if strict && row.starts_with(COMMENT_MARKERS) {
            skip(SkipReason::Comment);
            continue;
        }
        let key = key.trim();
        if strict && key.contains(char::is_whitespace) {
            skip(SkipReason::InvalidKey);
            continue;
        }

        let val = val.trim().replace(CONTINUATION_GLUE, "\n");
        header.params.insert(key.to_string(), val);
    }

    // An explicit Label without an explicit Slug names the page
    if !header.params.contains_key("Slug") {
        if let Some(label) = header.params.get("Label") {
            let slug = crate::slug::to_slug(label);
            header.params.insert("Slug".into(), slug);
        }
    }

    header
}

/// Merge parameter maps, most important first.
///
/// The result starts as a copy of `main`; each lower map only fills keys that
/// are still missing. Append directives are resolved as they meet a base
/// value and are consumed in the process. See the module docs.
pub fn merge_params(main: &Params, lowers: &[&Params]) -> Params {
    let mut merged = main.clone();

    for lower in lowers {
        // Bare keys first, so that a lower map's own +Key sees its base value
        let (appends, bare): (Vec<_>, Vec<_>) = lower.iter().partition(|(k, _)| k.starts_with('+'));

        for (key, val) in bare {
            merged.entry(key.clone()).or_insert_with(|| val.clone());
            if let Some(extra) = merged.remove(&format!("+{key}")) {
                append_value(&mut merged, key, &extra);
            }
        }

        for (plus_key, val) in appends {
            let key = &plus_key[1..];
            if merged.contains_key(key) {
                append_value(&mut merged, key, val);
            } else {
                merged.entry(plus_key.clone()).or_insert_with(|| val.clone());
            }
        }
    }

    merged
}

/// Promote append directives that never met a base value to plain keys.
pub fn settle_appends(params: &mut Params) {
    let dangling: Vec<String> = params
        .keys()
        .filter(|k| k.len() > 1 && k.starts_with('+'))
        .cloned()
        .collect();
    for plus_key in dangling {
        if let Some(val) = params.remove(&plus_key) {
            let key = &plus_key[1..];
            if params.contains_key(key) {
                append_value(params, key, &val);
            } else {
                params.insert(key.to_string(), val);
            }
        }
    }
}

fn append_value(params: &mut Params, key: &str, extra: &str) {
    if let Some(base) = params.get_mut(key) {
        base.push_str(APPEND_SEP);
        base.push_str(extra);
    }
}

/// Split a list value on `sep`, trimming items and dropping empty ones.
///
/// `"A, B,,,,C"` → `["A", "B", "C"]`
pub fn split_list(val: &str, sep: &str) -> Vec<String> {
    val.split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
