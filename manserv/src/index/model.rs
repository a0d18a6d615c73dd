//! In-memory index of all known manual pages.
//!
//! The index maps a lowercase page name to every product/package/section/
//! language variant that provides a page of that name. It is built once
//! (by scanning extracted packages, or by loading persisted index files)
//! and treated as immutable, shared, read-only state afterwards; request
//! handling never mutates it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One concrete, fully-qualified manual page variant.
///
/// The same page name is typically provided by several products, packages,
/// sections and languages; each combination is one entry.
///
/// # Example
///
/// ```
/// use manserv::index::IndexEntry;
///
/// let entry = IndexEntry {
///     name: "i3".to_string(),
///     product: "Tumbleweed".to_string(),
///     binarypkg: "i3wm".to_string(),
///     section: "1".to_string(),
///     language: "en".to_string(),
/// };
/// assert_eq!(entry.serving_path(".html"), "/Tumbleweed/i3wm/i3.1.en.html");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Page name, case preserved as shipped by the package.
    pub name: String,

    /// Product (suite) this variant belongs to, e.g. "Tumbleweed".
    pub product: String,

    /// Binary package providing this variant.
    pub binarypkg: String,

    /// Manual section, possibly multi-character ("1", "3posix").
    pub section: String,

    /// Locale string ("en", "fr", "pt_BR"); empty means unspecified.
    pub language: String,
}

impl IndexEntry {
    /// Relative path under which this variant is served.
    pub fn serving_path(&self, suffix: &str) -> String {
        format!(
            "/{}/{}/{}.{}.{}{}",
            self.product, self.binarypkg, self.name, self.section, self.language, suffix
        )
    }

    /// Main section identifier: the leading character of the section
    /// string ("3" for "3posix").
    pub fn main_section(&self) -> &str {
        match self.section.chars().next() {
            Some(c) => &self.section[..c.len_utf8()],
            None => "",
        }
    }
}

/// A partially-specified page reference.
///
/// Shares the identifying fields of [`IndexEntry`]; an empty field means
/// "unconstrained". Used both for the parsed request path and for the
/// referrer hints carried in query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryQuery {
    pub product: String,
    pub binarypkg: String,
    pub section: String,
    pub language: String,
}

impl EntryQuery {
    /// True when this query names exactly the given entry, field for field.
    pub fn fully_matches(&self, entry: &IndexEntry) -> bool {
        self.product == entry.product
            && self.binarypkg == entry.binarypkg
            && self.section == entry.section
            && self.language == entry.language
    }
}

/// Process-wide manual page index.
///
/// Read-only after construction; serving processes share it behind an
/// `Arc` and a new index is a whole-value replacement, never an in-place
/// update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Index {
    /// Entries keyed by lowercase page name.
    pub entries: HashMap<String, Vec<IndexEntry>>,

    /// Sorted, de-duplicated product names, for rendering choice lists.
    pub product_names: Vec<String>,

    /// All distinct languages, sorted ascending.
    ///
    /// The path splitter classifies path segments by binary search, so
    /// this list must stay sorted.
    pub langs: Vec<String>,

    /// All distinct sections (full values and main sections), sorted
    /// ascending. Same binary-search requirement as [`Index::langs`].
    pub sections: Vec<String>,

    /// Alias/codename to canonical product name, identity entries
    /// included for the canonical names themselves.
    pub product_mapping: HashMap<String, String>,
}

impl Index {
    /// All variants of a page name; `name` must already be lowercase.
    pub fn entries_for(&self, name: &str) -> Option<&[IndexEntry]> {
        self.entries.get(name).map(|entries| entries.as_slice())
    }

    /// Whether `candidate` is a known language string.
    pub fn is_known_lang(&self, candidate: &str) -> bool {
        self.langs
            .binary_search_by(|probe| probe.as_str().cmp(candidate))
            .is_ok()
    }

    /// Whether `candidate` is a known section string.
    pub fn is_known_section(&self, candidate: &str) -> bool {
        self.sections
            .binary_search_by(|probe| probe.as_str().cmp(candidate))
            .is_ok()
    }

    /// Resolve a product name or alias to its canonical product name.
    pub fn canonical_product(&self, name: &str) -> Option<&str> {
        self.product_mapping.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(section: &str, language: &str) -> IndexEntry {
        IndexEntry {
            name: "i3".to_string(),
            product: "Tumbleweed".to_string(),
            binarypkg: "i3wm".to_string(),
            section: section.to_string(),
            language: language.to_string(),
        }
    }

    #[test]
    fn test_serving_path_html() {
        assert_eq!(
            entry("1", "en").serving_path(".html"),
            "/Tumbleweed/i3wm/i3.1.en.html"
        );
    }

    #[test]
    fn test_serving_path_raw() {
        assert_eq!(
            entry("5", "pt_BR").serving_path(".gz"),
            "/Tumbleweed/i3wm/i3.5.pt_BR.gz"
        );
    }

    #[test]
    fn test_main_section() {
        assert_eq!(entry("1", "en").main_section(), "1");
        assert_eq!(entry("3posix", "en").main_section(), "3");
        assert_eq!(entry("", "en").main_section(), "");
    }

    #[test]
    fn test_fully_matches() {
        let e = entry("1", "en");
        let query = EntryQuery {
            product: "Tumbleweed".to_string(),
            binarypkg: "i3wm".to_string(),
            section: "1".to_string(),
            language: "en".to_string(),
        };
        assert!(query.fully_matches(&e));

        let other = EntryQuery {
            language: "de".to_string(),
            ..query
        };
        assert!(!other.fully_matches(&e));
    }

    #[test]
    fn test_known_lang_and_section_need_sorted_lists() {
        let index = Index {
            langs: vec!["de".to_string(), "en".to_string(), "fr".to_string()],
            sections: vec!["1".to_string(), "3".to_string(), "3posix".to_string()],
            ..Default::default()
        };

        assert!(index.is_known_lang("de"));
        assert!(index.is_known_lang("fr"));
        assert!(!index.is_known_lang("es"));
        assert!(index.is_known_section("3posix"));
        assert!(!index.is_known_section("8"));
    }

    #[test]
    fn test_canonical_product() {
        let mut index = Index::default();
        index
            .product_mapping
            .insert("Tumbleweed".to_string(), "Tumbleweed".to_string());
        index
            .product_mapping
            .insert("MicroOS".to_string(), "Tumbleweed".to_string());

        assert_eq!(index.canonical_product("MicroOS"), Some("Tumbleweed"));
        assert_eq!(index.canonical_product("Tumbleweed"), Some("Tumbleweed"));
        assert_eq!(index.canonical_product("Leap"), None);
    }

    #[test]
    fn test_entries_for() {
        let mut index = Index::default();
        index.entries.insert("i3".to_string(), vec![entry("1", "en")]);

        assert_eq!(index.entries_for("i3").map(<[_]>::len), Some(1));
        assert!(index.entries_for("I3").is_none());
    }
}
