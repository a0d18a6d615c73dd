//! Locale parsing for language negotiation.
//!
//! Manual pages are indexed under POSIX-style locale strings as shipped by
//! their packages (`en`, `fr`, `pt_BR`, `zh_TW.UTF-8`, `sr@latin`), while
//! incoming requests carry BCP-47 `Accept-Language` headers
//! (`pt-BR, pt;q=0.9, en;q=0.8`). This module converts both notations into
//! structured language tags so the narrowing engine can compare them.
//!
//! Parsing a locale can fail ([`LocaleError::InvalidLocale`]); callers log
//! the failure and carry on without a tag, degrading that entry to literal
//! string comparison. A bad locale in a package must never take the engine
//! down.

use std::fmt;

use icu_locale_core::LanguageIdentifier;
use thiserror::Error;

/// Error converting a locale string into a structured language tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocaleError {
    /// The string could not be parsed as a language identifier.
    #[error("invalid locale {0:?}")]
    InvalidLocale(String),
}

/// A parsed language tag.
///
/// Wraps an ICU language identifier with normalized subtag casing, so
/// `pt_BR`, `pt-br` and `pt-BR` all compare equal.
///
/// # Example
///
/// ```
/// use manserv::langtag::LanguageTag;
///
/// let a = LanguageTag::from_locale("pt_BR").unwrap();
/// let b = LanguageTag::from_locale("pt-br").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "pt-BR");
/// assert_eq!(a.primary(), "pt");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageTag {
    id: LanguageIdentifier,
}

impl LanguageTag {
    /// The English tag, used as the default preference when a request
    /// carries no usable `Accept-Language` header.
    pub fn english() -> Self {
        Self {
            id: icu_locale_core::langid!("en"),
        }
    }

    /// Parse a POSIX-style locale string.
    ///
    /// The codeset (`pt_BR.UTF-8`) is stripped and the `@latin` /
    /// `@cyrillic` modifiers are mapped to the corresponding script
    /// subtag; other modifiers (`@euro`) are ignored. The `C` and `POSIX`
    /// locales resolve to English.
    pub fn from_locale(locale: &str) -> Result<Self, LocaleError> {
        let trimmed = locale.trim();
        if trimmed.is_empty() {
            return Err(LocaleError::InvalidLocale(locale.to_string()));
        }

        let (base, modifier) = match trimmed.split_once('@') {
            Some((base, modifier)) => (base, Some(modifier)),
            None => (trimmed, None),
        };
        let base = base.split('.').next().unwrap_or(base);
        let base = match base {
            "C" | "POSIX" => "en",
            other => other,
        };

        let mut id: LanguageIdentifier = base
            .parse()
            .map_err(|_| LocaleError::InvalidLocale(locale.to_string()))?;
        if id.script.is_none() {
            match modifier {
                Some("latin") => id.script = "Latn".parse().ok(),
                Some("cyrillic") => id.script = "Cyrl".parse().ok(),
                _ => {}
            }
        }

        Ok(Self { id })
    }

    /// The primary language subtag (`pt` for `pt-BR`).
    pub fn primary(&self) -> &str {
        self.id.language.as_str()
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Parse an `Accept-Language` header into tags ordered by preference.
///
/// Entries are sorted by descending quality weight; ties keep header
/// order. Wildcards, zero-quality entries and items that fail to parse
/// are skipped. An empty or fully unparseable header yields an empty
/// list; callers fall back to [`LanguageTag::english`].
pub fn parse_accept_language(header: &str) -> Vec<LanguageTag> {
    let mut weighted: Vec<(f32, usize, LanguageTag)> = Vec::new();

    for (position, item) in header.split(',').enumerate() {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }

        let mut parts = item.split(';');
        let range = parts.next().unwrap_or("").trim();
        if range.is_empty() || range == "*" {
            continue;
        }

        let mut quality = 1.0f32;
        for param in parts {
            if let Some(q) = param.trim().strip_prefix("q=") {
                quality = q.trim().parse().unwrap_or(0.0);
            }
        }
        if quality <= 0.0 {
            continue;
        }

        if let Ok(tag) = LanguageTag::from_locale(range) {
            weighted.push((quality, position, tag));
        }
    }

    weighted.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.cmp(&b.1))
    });
    weighted.into_iter().map(|(_, _, tag)| tag).collect()
}
