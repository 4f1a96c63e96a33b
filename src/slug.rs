//! URL slug derivation.
//!
//! `"Hello World!"` → `"hello-world"`, `"Mazs, rūķītis.."` → `"mazs-rukitis"`.
//!
//! Characters outside the allow-list (ASCII letters and digits, Latin
//! Extended-A, basic Cyrillic) collapse into single dashes first, so that
//! punctuation never leaks into a slug through transliteration. The survivors
//! are then transliterated to ASCII with `deunicode`.

use std::sync::LazyLock;

use deunicode::deunicode;
use regex::Regex;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-zA-Zā-žĀ-Žа-яА-Я0-9]+").expect("slug pattern is valid"));

/// Create a slug from free text.
///
/// Falls back to the input unchanged when nothing slug-worthy is left.
pub fn to_slug(s: &str) -> String {
    let dashed = DISALLOWED.replace_all(s, "-");
    let slug = deunicode(&dashed).trim_matches('-').to_lowercase();
    if slug.is_empty() { s.to_string() } else { slug }
}
