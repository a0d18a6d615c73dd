//! RPM package name handling.
//!
//! Package directories in a cache tree are named after the RPM they were
//! extracted from (`i3wm-4.22-1.3.x86_64`). The name is split from the
//! right, since package names themselves may contain dashes, and package
//! versions are ordered with rpm's `rpmvercmp` rules so that the newest
//! build of a package wins at index build time.

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Error splitting an RPM file or directory name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpmNameError {
    /// The name is missing one of the version/release/arch components.
    #[error("not a full RPM name: {0:?}")]
    Incomplete(String),
}

/// Components of an RPM file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpmName {
    pub name: String,
    pub version: String,
    pub release: String,
    pub arch: String,
}

impl RpmName {
    /// The version-release pair of this package.
    pub fn version(&self) -> RpmVersion {
        RpmVersion {
            version: self.version.clone(),
            release: self.release.clone(),
        }
    }
}

fn rpm_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // <name>-<version>-<release>.<arch>, all components split from
        // the right because <name> may contain dashes.
        Regex::new(r"^(.+)-([^-]+)-([^-]+)\.([^.-]+)$").expect("static pattern")
    })
}

/// Split `name-version-release.arch`, with an optional `.rpm` suffix.
///
/// # Example
///
/// ```
/// use manserv::index::split_rpm_name;
///
/// let rpm = split_rpm_name("i3wm-4.22-1.3.x86_64.rpm").unwrap();
/// assert_eq!(rpm.name, "i3wm");
/// assert_eq!(rpm.version, "4.22");
/// assert_eq!(rpm.release, "1.3");
/// assert_eq!(rpm.arch, "x86_64");
/// ```
pub fn split_rpm_name(file: &str) -> Result<RpmName, RpmNameError> {
    let stem = file.strip_suffix(".rpm").unwrap_or(file);
    let captures = rpm_name_pattern()
        .captures(stem)
        .ok_or_else(|| RpmNameError::Incomplete(file.to_string()))?;

    Ok(RpmName {
        name: captures[1].to_string(),
        version: captures[2].to_string(),
        release: captures[3].to_string(),
        arch: captures[4].to_string(),
    })
}

/// A version-release pair, ordered with [`compare_versions`] on the
/// version first and the release as tie-break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpmVersion {
    pub version: String,
    pub release: String,
}

impl Ord for RpmVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_versions(&self.version, &other.version)
            .then_with(|| compare_versions(&self.release, &other.release))
    }
}

impl PartialOrd for RpmVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn is_version_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'~' || c == b'^'
}

/// Compare two RPM version strings with rpm's `rpmvercmp` rules.
///
/// Versions are walked segment by segment: runs of digits compare
/// numerically, runs of letters lexically, and a digit segment is newer
/// than a letter segment at the same position. `~` marks a pre-release
/// (older than the bare version), `^` a post-release snapshot (newer
/// than the bare version, older than any longer plain version). All
/// other characters only separate segments.
///
/// # Example
///
/// ```
/// use std::cmp::Ordering;
/// use manserv::index::compare_versions;
///
/// assert_eq!(compare_versions("1.10", "1.9"), Ordering::Greater);
/// assert_eq!(compare_versions("1.0~rc1", "1.0"), Ordering::Less);
/// ```
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let a = a.as_bytes();
    let b = b.as_bytes();
    let mut i = 0;
    let mut j = 0;

    loop {
        while i < a.len() && !is_version_char(a[i]) {
            i += 1;
        }
        while j < b.len() && !is_version_char(b[j]) {
            j += 1;
        }

        let a_tilde = a.get(i) == Some(&b'~');
        let b_tilde = b.get(j) == Some(&b'~');
        if a_tilde || b_tilde {
            match (a_tilde, b_tilde) {
                (true, true) => {
                    i += 1;
                    j += 1;
                    continue;
                }
                (true, false) => return Ordering::Less,
                (false, _) => return Ordering::Greater,
            }
        }

        let a_caret = a.get(i) == Some(&b'^');
        let b_caret = b.get(j) == Some(&b'^');
        if a_caret || b_caret {
            match (a_caret, b_caret) {
                (true, true) => {
                    i += 1;
                    j += 1;
                    continue;
                }
                // "1.0^" is newer than "1.0" but older than "1.0.1".
                (true, false) => {
                    return if j < b.len() {
                        Ordering::Less
                    } else {
                        Ordering::Greater
                    }
                }
                (false, _) => {
                    return if i < a.len() {
                        Ordering::Greater
                    } else {
                        Ordering::Less
                    }
                }
            }
        }

        if i >= a.len() || j >= b.len() {
            break;
        }

        let digits = a[i].is_ascii_digit();
        let a_start = i;
        while i < a.len() && a[i].is_ascii_digit() == digits && a[i].is_ascii_alphanumeric() {
            i += 1;
        }
        let b_start = j;
        while j < b.len() && b[j].is_ascii_digit() == digits && b[j].is_ascii_alphanumeric() {
            j += 1;
        }

        let seg_a = &a[a_start..i];
        let seg_b = &b[b_start..j];
        if seg_b.is_empty() {
            // Different segment classes at the same position: the
            // numeric one is newer.
            return if digits {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let ordering = if digits {
            let seg_a = trim_leading_zeros(seg_a);
            let seg_b = trim_leading_zeros(seg_b);
            seg_a.len().cmp(&seg_b.len()).then_with(|| seg_a.cmp(seg_b))
        } else {
            seg_a.cmp(seg_b)
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    // All shared segments are equal: whichever version has more left is
    // newer.
    match (i >= a.len(), j >= b.len()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        // The loop breaks as soon as `i >= a.len() || j >= b.len()`, so at
        // least one side is exhausted here; `(false, false)` cannot occur.
        (false, false) => unreachable!(),
    }
}

fn trim_leading_zeros(segment: &[u8]) -> &[u8] {
    let first = segment
        .iter()
        .position(|&c| c != b'0')
        .unwrap_or(segment.len());
    &segment[first..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple() {
        let rpm = split_rpm_name("tar-1.35-2.1.x86_64.rpm").unwrap();
        assert_eq!(rpm.name, "tar");
        assert_eq!(rpm.version, "1.35");
        assert_eq!(rpm.release, "2.1");
        assert_eq!(rpm.arch, "x86_64");
    }

    #[test]
    fn test_split_name_with_dashes() {
        let rpm = split_rpm_name("util-linux-systemd-2.39.1-1.2.x86_64.rpm").unwrap();
        assert_eq!(rpm.name, "util-linux-systemd");
        assert_eq!(rpm.version, "2.39.1");
        assert_eq!(rpm.release, "1.2");
    }

    #[test]
    fn test_split_without_rpm_suffix() {
        // Cache directories are named after the RPM, minus the suffix.
        let rpm = split_rpm_name("i3wm-4.22-1.3.x86_64").unwrap();
        assert_eq!(rpm.name, "i3wm");
        assert_eq!(rpm.arch, "x86_64");
    }

    #[test]
    fn test_split_noarch() {
        let rpm = split_rpm_name("man-pages-6.05-1.1.noarch.rpm").unwrap();
        assert_eq!(rpm.name, "man-pages");
        assert_eq!(rpm.arch, "noarch");
    }

    #[test]
    fn test_split_incomplete() {
        assert!(matches!(
            split_rpm_name("tar.rpm"),
            Err(RpmNameError::Incomplete(_))
        ));
        assert!(matches!(
            split_rpm_name("tar-1.35.x86_64"),
            Err(RpmNameError::Incomplete(_))
        ));
    }

    #[test]
    fn test_compare_equal() {
        assert_eq!(compare_versions("1.0", "1.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.05", "1.5"), Ordering::Equal);
        assert_eq!(compare_versions("fc4", "fc.4"), Ordering::Equal);
    }

    #[test]
    fn test_compare_numeric() {
        assert_eq!(compare_versions("1.0", "2.0"), Ordering::Less);
        assert_eq!(compare_versions("2.0.1", "2.0"), Ordering::Greater);
        assert_eq!(compare_versions("10", "9"), Ordering::Greater);
        assert_eq!(compare_versions("1.10", "1.9"), Ordering::Greater);
    }

    #[test]
    fn test_compare_alpha() {
        assert_eq!(compare_versions("a", "b"), Ordering::Less);
        assert_eq!(compare_versions("1a", "1b"), Ordering::Less);
    }

    #[test]
    fn test_compare_digits_beat_letters() {
        assert_eq!(compare_versions("2.0", "2a"), Ordering::Greater);
        assert_eq!(compare_versions("2a", "2.0"), Ordering::Less);
    }

    #[test]
    fn test_compare_tilde_is_older() {
        assert_eq!(compare_versions("1.0~rc1", "1.0"), Ordering::Less);
        assert_eq!(compare_versions("1.0", "1.0~rc1"), Ordering::Greater);
        assert_eq!(compare_versions("1.0~rc1", "1.0~rc2"), Ordering::Less);
        assert_eq!(compare_versions("1.0~rc1~git1", "1.0~rc1"), Ordering::Less);
    }

    #[test]
    fn test_compare_caret_is_newer_than_base() {
        assert_eq!(compare_versions("1.0^", "1.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0^git1", "1.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0^git1", "1.0.1"), Ordering::Less);
        assert_eq!(compare_versions("1.0^git1", "1.0^git2"), Ordering::Less);
    }

    #[test]
    fn test_compare_separators_are_ignored() {
        assert_eq!(compare_versions("1.0.0", "1_0_0"), Ordering::Equal);
    }

    #[test]
    fn test_rpm_version_ordering() {
        let older = RpmVersion {
            version: "4.22".to_string(),
            release: "1.1".to_string(),
        };
        let newer = RpmVersion {
            version: "4.22".to_string(),
            release: "1.3".to_string(),
        };
        let newest = RpmVersion {
            version: "4.23".to_string(),
            release: "1.1".to_string(),
        };

        assert!(older < newer);
        assert!(newer < newest);
        assert_eq!(older.cmp(&older.clone()), Ordering::Equal);
    }
}
