//! Manual page path interpretation.
//!
//! Packages ship manual pages under `usr/share/man` as
//! `[<lang>/]man<sect>/<name>.<suffix>.gz`:
//!
//! - `man1/ls.1.gz` — English (the default), section 1
//! - `fr/man1/ls.1.gz` — French, section 1
//! - `man3/open.3posix.gz` — the file suffix carries the full section,
//!   the directory only its leading part
//!
//! A language directory may carry a codeset (`fr.UTF-8`), which is
//! ignored for indexing purposes.

use thiserror::Error;

/// A manual page location interpreted from its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManPath {
    /// Page name ("ls", "systemd.service").
    pub name: String,
    /// Full section from the file suffix ("1", "3posix").
    pub section: String,
    /// Language, "en" when the path has no language directory.
    pub language: String,
}

/// Error interpreting a path as a manual page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManPathError {
    /// The path does not follow the `[<lang>/]man<sect>/<file>` layout.
    #[error("not a manual page path: {0:?}")]
    NotManPath(String),

    /// The file suffix contradicts the section directory it lives in.
    #[error("section directory {dir:?} does not match file suffix {suffix:?} in {path:?}")]
    SectionMismatch {
        path: String,
        dir: String,
        suffix: String,
    },
}

/// Interpret a path relative to `usr/share/man`.
///
/// # Example
///
/// ```
/// use manserv::index::parse_man_path;
///
/// let page = parse_man_path("fr/man1/ls.1.gz").unwrap();
/// assert_eq!(page.name, "ls");
/// assert_eq!(page.section, "1");
/// assert_eq!(page.language, "fr");
/// ```
pub fn parse_man_path(path: &str) -> Result<ManPath, ManPathError> {
    let not_man_path = || ManPathError::NotManPath(path.to_string());

    let mut components: Vec<&str> = path
        .trim_start_matches('/')
        .split('/')
        .filter(|c| !c.is_empty())
        .collect();
    if components.len() < 2 || components.len() > 3 {
        return Err(not_man_path());
    }

    let file = components.pop().unwrap_or_default();
    let section_dir = components.pop().unwrap_or_default();
    let language = match components.pop() {
        Some(lang_dir) => lang_dir.split('.').next().unwrap_or(lang_dir).to_string(),
        None => String::from("en"),
    };

    let dir_section = section_dir.strip_prefix("man").ok_or_else(not_man_path)?;
    if dir_section.is_empty() {
        return Err(not_man_path());
    }

    let base = file.strip_suffix(".gz").unwrap_or(file);
    // Page names can contain dots (systemd.service), so the section
    // suffix is split off from the right.
    let (name, suffix) = base.rsplit_once('.').ok_or_else(not_man_path)?;
    if name.is_empty() {
        return Err(not_man_path());
    }
    if !suffix.starts_with(dir_section) {
        return Err(ManPathError::SectionMismatch {
            path: path.to_string(),
            dir: dir_section.to_string(),
            suffix: suffix.to_string(),
        });
    }

    Ok(ManPath {
        name: name.to_string(),
        section: suffix.to_string(),
        language,
    })
}
