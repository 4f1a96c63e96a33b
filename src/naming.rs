//! Centralized filename parsing for the `NN_Label.ext` convention.
//!
//! Every page-producing entry (content files and directories) follows the same
//! naming pattern: an optional numeric sort prefix (`NN_`) followed by a label,
//! followed by an extension for files. This module turns a filename into the
//! parameters the rest of the engine reads: `FileName`, `Ext`, `SortNr`,
//! `Label`, `Title`, `Slug` and `IsVisible`.
//!
//! ## Visibility
//!
//! Filenames decide the first visibility verdict, before any header or
//! default can override it:
//! - `Simple.md` → visible
//! - `.hidden.md`, `~draft.md`, `backup.md~` → hidden (directories exempt)
//! - `logo.png` → hidden (not the content extension; handled as an asset)
//! - `.md` → hidden (empty label)

use std::path::Path;

use crate::params::{NO, Params, YES};
use crate::slug::to_slug;

/// Extension of files that become content pages.
pub const CONTENT_EXT: &str = ".md";

/// Parameter file inside a directory describing the directory page itself.
pub const DIR_FILE: &str = ".dir";

/// Sort prefixes longer than this are treated as part of the label, so that
/// dates like `02.07.2015_Party` are never mistaken for a sort number.
const MAX_SORT_PREFIX_LEN: usize = 9;

/// Result of parsing a label like `65_With sort number`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Sort number if present (`65` from `65_With sort number`).
    pub number: Option<u32>,
    /// Label with the sort prefix removed. For unnumbered entries, the full input.
    pub label: String,
}

/// Parse a stem following the `NN_label` convention.
///
/// - `"65_With sort number"` → number=Some(65), label="With sort number"
/// - `"021_Soccer"` → number=Some(21), label="Soccer"
/// - `"1a_Odd"` → number=Some(0), label="Odd" (prefix starts with a digit but is not a number)
/// - `"Museum"` → number=None, label="Museum"
/// - `"02.07.2015_Party"` → number=None (prefix too long)
pub fn parse_entry_name(stem: &str) -> ParsedName {
    let numbered = stem.split_once('_').filter(|(prefix, _)| {
        prefix.len() <= MAX_SORT_PREFIX_LEN && prefix.starts_with(|c: char| c.is_ascii_digit())
    });
    if let Some((prefix, rest)) = numbered {
        return ParsedName {
            number: Some(prefix.parse().unwrap_or_default()),
            label: rest.to_string(),
        };
    }
    ParsedName {
        number: None,
        label: stem.to_string(),
    }
}

/// Extension of a filename including the dot, as written (`"Simple.MD"` → `".MD"`).
///
/// A leading dot counts, so `".mango"` has the extension `".mango"`.
pub fn extension(fname: &str) -> &str {
    fname.rfind('.').map(|i| &fname[i..]).unwrap_or("")
}

/// Derive page parameters from a file path's final component.
///
/// A path ending in `.dir` describes the directory that holds it: the
/// directory name becomes `FileName`, `Ext` is `.dir` and `IsDir` is `Yes`.
pub fn filename_to_params(fpath: &Path) -> Params {
    let mut fname = file_name(fpath);
    let mut params = Params::new();
    params.insert("IsVisible".into(), YES.into());

    let is_dir = fname == DIR_FILE;
    let label_source = if is_dir {
        fname = fpath.parent().map(file_name).unwrap_or_default();
        params.insert("Ext".into(), DIR_FILE.into());
        params.insert("IsDir".into(), YES.into());
        fname.clone()
    } else {
        let ext = extension(&fname);
        params.insert("Ext".into(), ext.to_lowercase());
        fname[..fname.len() - ext.len()].to_string()
    };
    params.insert("FileName".into(), fname.clone());

    let parsed = parse_entry_name(&label_source);
    if let Some(nr) = parsed.number {
        params.insert("SortNr".into(), nr.to_string());
    }
    params.insert("Slug".into(), to_slug(&parsed.label));
    params.insert("Title".into(), parsed.label.clone());
    params.insert("Label".into(), parsed.label.clone());

    // Visibility checks run last
    let ext = params["Ext"].as_str();
    let hidden = parsed.label.is_empty()
        || (!is_dir && !ext.is_empty() && ext != CONTENT_EXT)
        || (!is_dir && (fname.starts_with('.') || fname.starts_with('~') || fname.ends_with('~')));
    if hidden {
        params.insert("IsVisible".into(), NO.into());
    }

    params
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params_of(name: &str) -> Params {
        filename_to_params(Path::new(name))
    }

    #[test]
    fn numbered_label() {
        let p = parse_entry_name("65_With sort number");
        assert_eq!(p.number, Some(65));
        assert_eq!(p.label, "With sort number");
    }

    #[test]
    fn leading_zeros_dropped() {
        let p = parse_entry_name("021_Soccer");
        assert_eq!(p.number, Some(21));
        assert_eq!(p.label, "Soccer");
    }

    #[test]
    fn unnumbered_label() {
        let p = parse_entry_name("Museum");
        assert_eq!(p.number, None);
        assert_eq!(p.label, "Museum");
    }

    #[test]
    fn underscore_without_number_is_label() {
        let p = parse_entry_name("my_notes");
        assert_eq!(p.number, None);
        assert_eq!(p.label, "my_notes");
    }

    #[test]
    fn long_prefix_is_not_sort_number() {
        let p = parse_entry_name("02.07.2015_Party");
        assert_eq!(p.number, None);
        assert_eq!(p.label, "02.07.2015_Party");
    }

    #[test]
    fn extension_keeps_leading_dot_names() {
        assert_eq!(extension(".mango"), ".mango");
        assert_eq!(extension("Simple.md"), ".md");
        assert_eq!(extension("Simple"), "");
    }

    #[test]
    fn simple_file() {
        let p = params_of("Simple.md");
        assert_eq!(p["Ext"], ".md");
        assert_eq!(p["Label"], "Simple");
        assert_eq!(p["Title"], "Simple");
        assert_eq!(p["Slug"], "simple");
        assert_eq!(p["IsVisible"], "Yes");
        assert!(!p.contains_key("SortNr"));
    }

    #[test]
    fn nested_path_uses_final_component() {
        let p = params_of("path.to/some/file/Simple.md");
        assert_eq!(p["Label"], "Simple");
        assert_eq!(p["Slug"], "simple");
    }

    #[test]
    fn unicode_label_transliterated_in_slug() {
        let p = params_of("path.to/some/file/ŪTF 8.md/");
        assert_eq!(p["Label"], "ŪTF 8");
        assert_eq!(p["Slug"], "utf-8");
        assert_eq!(p["IsVisible"], "Yes");
    }

    #[test]
    fn sort_number_prefix() {
        let p = params_of("65_With sort number.md");
        assert_eq!(p["SortNr"], "65");
        assert_eq!(p["Label"], "With sort number");
        assert_eq!(p["Slug"], "with-sort-number");
    }

    #[test]
    fn uppercase_extension_lowered() {
        let p = params_of("Loud.MD");
        assert_eq!(p["Ext"], ".md");
        assert_eq!(p["IsVisible"], "Yes");
    }

    #[test]
    fn dotfile_is_hidden() {
        let p = params_of(".hidden.md");
        assert_eq!(p["IsVisible"], "No");
    }

    #[test]
    fn config_file_is_hidden_with_empty_label() {
        let p = params_of(".mango");
        assert_eq!(p["Ext"], ".mango");
        assert_eq!(p["Label"], "");
        assert_eq!(p["Slug"], "");
        assert_eq!(p["IsVisible"], "No");
    }

    #[test]
    fn tilde_files_are_hidden() {
        assert_eq!(params_of("~draft.md")["IsVisible"], "No");
        assert_eq!(params_of("backup.md~")["IsVisible"], "No");
    }

    #[test]
    fn asset_extension_is_hidden() {
        assert_eq!(params_of("logo.png")["IsVisible"], "No");
    }

    #[test]
    fn directory_parameter_file() {
        let p = params_of("content/en/3_Sports/.dir");
        assert_eq!(p["FileName"], "3_Sports");
        assert_eq!(p["Ext"], ".dir");
        assert_eq!(p["IsDir"], "Yes");
        assert_eq!(p["SortNr"], "3");
        assert_eq!(p["Label"], "Sports");
        assert_eq!(p["Slug"], "sports");
        assert_eq!(p["IsVisible"], "Yes");
    }

    #[test]
    fn directory_name_keeps_dots() {
        let p = params_of("content/en/v1.2/.dir");
        assert_eq!(p["Label"], "v1.2");
    }
}
