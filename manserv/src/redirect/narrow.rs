//! Candidate narrowing.
//!
//! Given every variant of a requested page name, the engine narrows the
//! set down to a single servable entry in four stages, in fixed order:
//! product, section, language, binary package. Each stage applies the
//! constraint from the query when present, picks a preferred value with a
//! stage-specific heuristic when not, and re-filters. If the resolved
//! tuple exactly names one of the original candidates with all four
//! fields set, the engine returns early without running the remaining
//! stages.
//!
//! Filtering is strictly monotonic: no stage ever adds entries back, and
//! only the section stage reorders (a stable sort by the canonical
//! section order). An emptied candidate set is a normal result, reported
//! as an empty vector.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::index::{EntryQuery, IndexEntry};
use crate::langtag::{self, LanguageTag};

/// man(1)'s default section search order.
const MAN_SECTION_ORDER: &str = "0 1 n l 8 3 2 5 4 9 6 7 1x 3x 4x 5x 6x 8x \
    1bind 3bind 5bind 7bind 8bind 1cn 8cn 1m 1mh 5mh 8mh 1netpbm 3netpbm \
    5netpbm 0p 1p 3p 3posix 1pgsql 3pgsql 5pgsql 3C++ 8C++ 3blt 3curses \
    3ncurses 3form 3menu 3db 3gdbm 3f 3gk 3paper 3mm 5mm 3perl 3pm 3pq 3qt \
    3pub 3readline 1ssl 3ssl 5ssl 7ssl 3t 3tk 3tcl 3tclx 3tix 7l 7nr 8c Cg \
    g s m";

/// Canonical manual-section ordering.
///
/// Sections listed in the priority table sort by their position, before
/// any unlisted section; unlisted sections sort alphabetically among
/// themselves. Built once at startup and passed into [`narrow`]
/// explicitly, so the ordering is plain data rather than global state.
#[derive(Debug, Clone)]
pub struct SectionOrder {
    order: HashMap<String, usize>,
}

impl SectionOrder {
    /// The ordering used by man(1) when searching sections.
    pub fn man_default() -> Self {
        Self::from_sections(MAN_SECTION_ORDER.split_ascii_whitespace())
    }

    /// Build an ordering from an explicit priority list; first entry
    /// ranks highest.
    pub fn from_sections<I, S>(sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let order = sections
            .into_iter()
            .enumerate()
            .map(|(position, section)| (section.into(), position))
            .collect();
        Self { order }
    }

    /// Compare two section strings under this ordering.
    pub fn cmp(&self, a: &str, b: &str) -> Ordering {
        match (self.order.get(a), self.order.get(b)) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    }
}

impl Default for SectionOrder {
    fn default() -> Self {
        Self::man_default()
    }
}

/// Sections match on their leading character, so a query for "1"
/// matches "1x".
fn first_char_matches(a: &str, b: &str) -> bool {
    match (a.chars().next(), b.chars().next()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Pick the best language among the surviving candidates.
///
/// The header is parsed into a weighted preference list, defaulting to
/// English when empty or unparseable. Exact tag matches win in
/// preference order, then matches on the primary language subtag; when
/// nothing reaches that confidence the first candidate stands. An entry
/// whose language does not parse can only match by literal string
/// comparison.
fn best_language(accept_language: &str, candidates: &[IndexEntry]) -> String {
    let mut preferred = langtag::parse_accept_language(accept_language);
    if preferred.is_empty() {
        preferred.push(LanguageTag::english());
    }

    let tags: Vec<Option<LanguageTag>> = candidates
        .iter()
        .map(|entry| match LanguageTag::from_locale(&entry.language) {
            Ok(tag) => Some(tag),
            Err(err) => {
                tracing::debug!(
                    language = %entry.language,
                    error = %err,
                    "entry language does not parse, falling back to string comparison"
                );
                None
            }
        })
        .collect();

    for want in &preferred {
        for (entry, tag) in candidates.iter().zip(&tags) {
            let exact = match tag {
                Some(tag) => tag == want,
                None => entry.language.eq_ignore_ascii_case(&want.to_string()),
            };
            if exact {
                return entry.language.clone();
            }
        }
    }
    for want in &preferred {
        for (entry, tag) in candidates.iter().zip(&tags) {
            if tag.as_ref().is_some_and(|t| t.primary() == want.primary()) {
                return entry.language.clone();
            }
        }
    }
    candidates[0].language.clone()
}

/// Narrow `entries` down to the servable candidates for `query`.
///
/// `referrer` carries the tuple of the page the user came from and is
/// only consulted for fields the query leaves open. Returns the
/// surviving candidates, best first; an empty vector means nothing
/// matched and the caller reports the page as not found.
pub fn narrow(
    order: &SectionOrder,
    accept_language: &str,
    query: &EntryQuery,
    referrer: &EntryQuery,
    entries: &[IndexEntry],
) -> Vec<IndexEntry> {
    let mut q = query.clone();

    let fully_qualified = |q: &EntryQuery| {
        if q.product.is_empty()
            || q.binarypkg.is_empty()
            || q.section.is_empty()
            || q.language.is_empty()
        {
            return false;
        }
        entries.iter().any(|entry| q.fully_matches(entry))
    };

    let mut filtered: Vec<IndexEntry> = entries.to_vec();

    // Narrow down as much as possible upfront: the combined filter of
    // all four stages.
    filtered.retain(|e| {
        (q.product.is_empty() || e.product == q.product)
            && (q.section.is_empty() || first_char_matches(&e.section, &q.section))
            && (q.language.is_empty() || e.language == q.language)
            && (q.binarypkg.is_empty() || e.binarypkg == q.binarypkg)
    });
    if filtered.is_empty() {
        return Vec::new();
    }

    // Product: prefer the product the referrer came from, when any
    // survivor has it.
    if q.product.is_empty() && filtered.iter().any(|e| e.product == referrer.product) {
        q.product = referrer.product.clone();
    }
    filtered.retain(|e| q.product.is_empty() || e.product == q.product);
    if filtered.is_empty() {
        return Vec::new();
    }
    if fully_qualified(&q) {
        return filtered;
    }

    // Section: order candidates the way man(1) searches sections, then
    // prefer the referrer's section, then the first after sorting.
    filtered.sort_by(|a, b| order.cmp(&a.section, &b.section));
    if q.section.is_empty() {
        if filtered.iter().any(|e| e.section == referrer.section) {
            q.section = referrer.section.clone();
        }
        if q.section.is_empty() {
            q.section = filtered[0].section.clone();
        }
    }
    filtered.retain(|e| q.section.is_empty() || first_char_matches(&e.section, &q.section));
    if filtered.is_empty() {
        return Vec::new();
    }
    if fully_qualified(&q) {
        return filtered;
    }

    // Language: negotiate against the Accept-Language header.
    if q.language.is_empty() {
        q.language = best_language(accept_language, &filtered);
    }
    filtered.retain(|e| q.language.is_empty() || e.language == q.language);
    if filtered.is_empty() {
        return Vec::new();
    }
    if fully_qualified(&q) {
        return filtered;
    }

    // Binary package: the first surviving candidate wins.
    if q.binarypkg.is_empty() {
        q.binarypkg = filtered[0].binarypkg.clone();
    }
    filtered.retain(|e| q.binarypkg.is_empty() || e.binarypkg == q.binarypkg);
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(product: &str, binarypkg: &str, section: &str, language: &str) -> IndexEntry {
        IndexEntry {
            name: "i3".to_string(),
            product: product.to_string(),
            binarypkg: binarypkg.to_string(),
            section: section.to_string(),
            language: language.to_string(),
        }
    }

    fn query(product: &str, binarypkg: &str, section: &str, language: &str) -> EntryQuery {
        EntryQuery {
            product: product.to_string(),
            binarypkg: binarypkg.to_string(),
            section: section.to_string(),
            language: language.to_string(),
        }
    }

    fn narrow_default(
        accept_language: &str,
        q: &EntryQuery,
        referrer: &EntryQuery,
        entries: &[IndexEntry],
    ) -> Vec<IndexEntry> {
        narrow(
            &SectionOrder::man_default(),
            accept_language,
            q,
            referrer,
            entries,
        )
    }

    // ========================================================================
    // Section ordering
    // ========================================================================

    #[test]
    fn test_section_order_follows_man() {
        let order = SectionOrder::man_default();
        assert_eq!(order.cmp("1", "8"), Ordering::Less);
        assert_eq!(order.cmp("8", "3"), Ordering::Less);
        assert_eq!(order.cmp("3", "2"), Ordering::Less);
        assert_eq!(order.cmp("1", "1"), Ordering::Equal);
    }

    #[test]
    fn test_section_order_unknown_after_known() {
        let order = SectionOrder::man_default();
        assert_eq!(order.cmp("m", "zz"), Ordering::Less);
        assert_eq!(order.cmp("zz", "1"), Ordering::Greater);
        // Unknown sections are alphabetical among themselves.
        assert_eq!(order.cmp("aa", "zz"), Ordering::Less);
    }

    // ========================================================================
    // Stage behavior
    // ========================================================================

    #[test]
    fn test_narrow_language_from_accept_header() {
        let entries = vec![
            entry("Tumbleweed", "i3wm", "1", "en"),
            entry("Tumbleweed", "i3wm", "1", "de"),
        ];
        let filtered = narrow_default(
            "de",
            &query("", "", "1", ""),
            &EntryQuery::default(),
            &entries,
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].language, "de");
    }

    #[test]
    fn test_narrow_defaults_to_english_without_header() {
        let entries = vec![
            entry("Tumbleweed", "i3wm", "1", "fr"),
            entry("Tumbleweed", "i3wm", "1", "en"),
        ];
        let filtered = narrow_default(
            "",
            &query("", "", "1", ""),
            &EntryQuery::default(),
            &entries,
        );
        assert_eq!(filtered[0].language, "en");
    }

    #[test]
    fn test_narrow_language_primary_subtag_match() {
        let entries = vec![
            entry("Tumbleweed", "i3wm", "1", "en"),
            entry("Tumbleweed", "i3wm", "1", "pt_BR"),
        ];
        // "pt-PT" has no exact counterpart; "pt_BR" shares the primary
        // subtag and wins over the first candidate.
        let filtered = narrow_default(
            "pt-PT",
            &query("", "", "1", ""),
            &EntryQuery::default(),
            &entries,
        );
        assert_eq!(filtered[0].language, "pt_BR");
    }

    #[test]
    fn test_narrow_language_falls_back_to_first_candidate() {
        let entries = vec![
            entry("Tumbleweed", "i3wm", "1", "fr"),
            entry("Tumbleweed", "i3wm", "1", "de"),
        ];
        let filtered = narrow_default(
            "ja",
            &query("", "", "1", ""),
            &EntryQuery::default(),
            &entries,
        );
        assert_eq!(filtered[0].language, "fr");
    }

    #[test]
    fn test_narrow_section_first_char_match() {
        // A query for section "1" matches "1x" entries.
        let entries = vec![entry("Tumbleweed", "xorg", "1x", "en")];
        let filtered = narrow_default(
            "",
            &query("", "", "1", ""),
            &EntryQuery::default(),
            &entries,
        );
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_narrow_section_filter_can_empty_the_set() {
        let entries = vec![entry("Tumbleweed", "pkg", "3", "en")];
        let filtered = narrow_default(
            "",
            &query("", "", "8", ""),
            &EntryQuery::default(),
            &entries,
        );
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_narrow_prefers_lowest_section() {
        let entries = vec![
            entry("Tumbleweed", "pkg", "8", "en"),
            entry("Tumbleweed", "pkg", "1", "en"),
            entry("Tumbleweed", "pkg", "5", "en"),
        ];
        let filtered = narrow_default("", &query("", "", "", ""), &EntryQuery::default(), &entries);
        assert_eq!(filtered[0].section, "1");
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_narrow_referrer_product_preferred() {
        let entries = vec![
            entry("Tumbleweed", "i3wm", "1", "en"),
            entry("Leap", "i3wm", "1", "en"),
        ];
        let filtered = narrow_default(
            "",
            &query("", "", "", ""),
            &query("Leap", "", "", ""),
            &entries,
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].product, "Leap");
    }

    #[test]
    fn test_narrow_referrer_section_preferred() {
        let entries = vec![
            entry("Tumbleweed", "pkg", "1", "en"),
            entry("Tumbleweed", "pkg", "5", "en"),
        ];
        let filtered = narrow_default(
            "",
            &query("", "", "", ""),
            &query("", "", "5", ""),
            &entries,
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].section, "5");
    }

    #[test]
    fn test_narrow_referrer_product_ignored_when_absent() {
        let entries = vec![entry("Tumbleweed", "i3wm", "1", "en")];
        let filtered = narrow_default(
            "",
            &query("", "", "", ""),
            &query("Debian", "", "", ""),
            &entries,
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].product, "Tumbleweed");
    }

    #[test]
    fn test_narrow_binarypkg_takes_first_survivor() {
        let entries = vec![
            entry("Tumbleweed", "i3wm", "1", "en"),
            entry("Tumbleweed", "i3-gaps", "1", "en"),
        ];
        let filtered = narrow_default("", &query("", "", "", ""), &EntryQuery::default(), &entries);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].binarypkg, "i3wm");
    }

    #[test]
    fn test_narrow_hard_product_filter() {
        let entries = vec![entry("Tumbleweed", "i3wm", "1", "en")];
        let filtered = narrow_default(
            "",
            &query("Leap", "", "", ""),
            &EntryQuery::default(),
            &entries,
        );
        assert!(filtered.is_empty());
    }

    // ========================================================================
    // Short-circuit
    // ========================================================================

    #[test]
    fn test_narrow_fully_qualified_short_circuit() {
        // A fully-specified query that names a real entry returns after
        // the product stage; the unparseable Accept-Language header must
        // never be consulted.
        let entries = vec![
            entry("Tumbleweed", "i3wm", "1", "en"),
            entry("Tumbleweed", "i3wm", "1", "de"),
        ];
        let filtered = narrow_default(
            "definitely;;;not=a-header",
            &query("Tumbleweed", "i3wm", "1", "de"),
            &EntryQuery::default(),
            &entries,
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].language, "de");
    }

    #[test]
    fn test_narrow_fully_qualified_but_nonexistent() {
        let entries = vec![entry("Tumbleweed", "i3wm", "1", "en")];
        let filtered = narrow_default(
            "",
            &query("Tumbleweed", "i3wm", "1", "de"),
            &EntryQuery::default(),
            &entries,
        );
        assert!(filtered.is_empty());
    }

    // ========================================================================
    // Monotonicity
    // ========================================================================

    fn arbitrary_entry() -> impl Strategy<Value = IndexEntry> {
        (
            prop_oneof![Just("Tumbleweed"), Just("Leap")],
            prop_oneof![Just("a-pkg"), Just("b-pkg")],
            prop_oneof![Just("1"), Just("3"), Just("3posix"), Just("8")],
            prop_oneof![Just("en"), Just("de"), Just("pt_BR")],
        )
            .prop_map(|(p, b, s, l)| entry(p, b, s, l))
    }

    fn arbitrary_field(values: &'static [&'static str]) -> impl Strategy<Value = String> {
        proptest::sample::select(values).prop_map(str::to_string)
    }

    fn arbitrary_query() -> impl Strategy<Value = EntryQuery> {
        (
            arbitrary_field(&["", "Tumbleweed", "Leap"]),
            arbitrary_field(&["", "a-pkg"]),
            arbitrary_field(&["", "1", "8"]),
            arbitrary_field(&["", "en", "de"]),
        )
            .prop_map(|(product, binarypkg, section, language)| EntryQuery {
                product,
                binarypkg,
                section,
                language,
            })
    }

    proptest! {
        /// Narrowing never invents entries: every result is one of the
        /// inputs.
        #[test]
        fn prop_narrow_is_monotonic(
            entries in proptest::collection::vec(arbitrary_entry(), 0..8),
            q in arbitrary_query(),
            referrer in arbitrary_query(),
            header in arbitrary_field(&["", "de", "pt-BR, en;q=0.5", "garbage;;q"]),
        ) {
            let filtered = narrow_default(&header, &q, &referrer, &entries);
            for result in &filtered {
                prop_assert!(entries.contains(result));
            }
            prop_assert!(filtered.len() <= entries.len());
        }
    }
}
