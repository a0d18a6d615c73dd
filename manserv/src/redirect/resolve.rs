//! Redirect resolution for a single request.
//!
//! The orchestrator normalizes the request path, classifies its pieces,
//! looks the page name up in the index and hands the candidates to the
//! narrowing engine. The result is either the relative serving path of
//! one concrete page, or a typed not-found carrying everything a caller
//! needs to render a disambiguation page.

use thiserror::Error;

use crate::index::{EntryQuery, Index, IndexEntry};
use crate::redirect::narrow::{narrow, SectionOrder};
use crate::redirect::split::split_path;

/// Contents listings are served statically, never redirected.
const CONTENTS_PREFIX: &str = "/contents-";

/// A single incoming page request, separated from the HTTP transport.
#[derive(Debug, Clone, Default)]
pub struct RedirectRequest {
    /// Request path ("/Tumbleweed/i3wm/i3.1.html").
    pub path: String,

    /// Raw `Accept-Language` header value; empty means no preference.
    pub accept_language: String,

    /// Referrer hints from the `suite` / `binarypkg` / `section` /
    /// `language` query parameters.
    pub referrer: EntryQuery,
}

/// A page reference that could not be resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotFound {
    /// The requested page name.
    pub manpage: String,

    /// Other variants of the same name, for a disambiguation page.
    pub choices: Vec<IndexEntry>,

    /// All known product names.
    pub products: Vec<String>,
}

/// Outcome of a failed resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedirectError {
    /// The path is structurally not a single-manpage request (directory
    /// listing, index page, contents page); the caller falls through to
    /// ordinary file serving.
    #[error("not a manual page request")]
    NotApplicable,

    /// The name is not indexed, or no variant survived narrowing.
    #[error("no such manual page: {}", .0.manpage)]
    NotFound(NotFound),
}

/// Resolve a request to the relative serving path of a concrete page.
///
/// # Example
///
/// ```no_run
/// use manserv::index::Index;
/// use manserv::redirect::{resolve, RedirectRequest, SectionOrder};
///
/// # let index = Index::default();
/// let request = RedirectRequest {
///     path: "/i3(1)".to_string(),
///     accept_language: "de".to_string(),
///     ..Default::default()
/// };
/// let target = resolve(&index, &SectionOrder::man_default(), &request);
/// ```
pub fn resolve(
    index: &Index,
    order: &SectionOrder,
    request: &RedirectRequest,
) -> Result<String, RedirectError> {
    let raw_path = request.path.as_str();
    if raw_path.ends_with('/')
        || raw_path.ends_with("/index.html")
        || raw_path.starts_with(CONTENTS_PREFIX)
    {
        return Err(RedirectError::NotApplicable);
    }

    // A raw manpage request redirects to the raw file, not the HTML
    // rendering.
    let suffix = if raw_path.ends_with(".gz") && !raw_path.ends_with(".html.gz") {
        ".gz"
    } else {
        ".html"
    };

    let mut path = raw_path.to_string();
    while path.ends_with(".html") || path.ends_with(".gz") {
        if path.ends_with(".gz") {
            path.truncate(path.len() - ".gz".len());
        }
        if path.ends_with(".html") {
            path.truncate(path.len() - ".html".len());
        }
    }

    // Parens are converted into dots, so that "i3(1)" becomes "i3.1.";
    // doubled dots collapse and the trailing dot is stripped.
    let mut path = path.replace('(', ".").replace(')', ".").replace("..", ".");
    if path.ends_with('.') {
        path.truncate(path.len() - 1);
    }

    let mut split = split_path(index, &path);
    if let Some(canonical) = index.canonical_product(&split.product) {
        split.product = canonical.to_string();
    }

    let name = std::mem::take(&mut split.name);
    let lowercase = name.to_lowercase();
    // man(1) joins multi-word page names with dashes or underscores;
    // retry the lookup under those spellings before giving up.
    let entries = index
        .entries_for(&lowercase)
        .or_else(|| index.entries_for(&lowercase.replace('.', "-")))
        .or_else(|| index.entries_for(&lowercase.replace('.', "_")));
    let entries = match entries {
        Some(entries) => entries,
        None => {
            tracing::debug!(url = %request.path, path = %path, "page name not indexed");
            return Err(RedirectError::NotFound(NotFound {
                manpage: name,
                ..Default::default()
            }));
        }
    };

    tracing::debug!(
        url = %request.path,
        product = %split.product,
        binarypkg = %split.binarypkg,
        name = %name,
        section = %split.section,
        language = %split.language,
        "split request"
    );

    let query = EntryQuery {
        product: split.product,
        binarypkg: split.binarypkg,
        section: split.section,
        language: split.language,
    };
    let filtered = narrow(
        order,
        &request.accept_language,
        &query,
        &request.referrer,
        entries,
    );

    if filtered.is_empty() {
        // Present the user with the remaining choices for this page,
        // except for requests that are browser noise.
        let choices = if name != "index" && name != "favicon" {
            entries.to_vec()
        } else {
            Vec::new()
        };
        tracing::debug!(
            url = %request.path,
            choices = choices.len(),
            "no entry survived narrowing"
        );
        return Err(RedirectError::NotFound(NotFound {
            manpage: name,
            choices,
            products: index.product_names.clone(),
        }));
    }

    let target = filtered[0].serving_path(suffix);
    tracing::debug!(url = %request.path, target = %target, "resolved");
    Ok(target)
}
