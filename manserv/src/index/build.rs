//! Index construction from a tree of extracted packages.
//!
//! The builder scans cache directories of the form
//! `<cache>/<name>-<version>-<release>.<arch>/usr/share/man/...`, one
//! cache per product, as left behind by the package extraction pipeline.
//! Older builds of the same package are skipped, and encoding variants of
//! the same page (same serving path) are collapsed to one entry.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::Product;
use crate::index::manpath::parse_man_path;
use crate::index::model::{Index, IndexEntry};
use crate::index::rpmname::{split_rpm_name, RpmVersion};

/// Relative directory under which packages ship manual pages.
const MAN_SUBDIR: &str = "usr/share/man";

/// Error scanning the package cache.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A cache directory could not be read.
    #[error("failed to scan {path:?}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Product ordering table for choice lists.
///
/// Known products sort by their configured priority, before any unknown
/// product; unknown products sort alphabetically among themselves. The
/// table is built once at startup and passed in explicitly.
#[derive(Debug, Clone, Default)]
pub struct ProductOrder {
    order: HashMap<String, usize>,
}

impl ProductOrder {
    /// Build an ordering from a priority list; first entry ranks highest.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let order = names
            .into_iter()
            .enumerate()
            .map(|(position, name)| (name.into(), position))
            .collect();
        Self { order }
    }

    /// Compare two product names.
    pub fn cmp(&self, a: &str, b: &str) -> Ordering {
        match (self.order.get(a), self.order.get(b)) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    }
}

/// Statistics gathered during an index build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Package directories recognized in the caches.
    pub packages_scanned: usize,
    /// Packages that shipped at least one manual page.
    pub packages_with_manpages: usize,
    /// Entries added to the index.
    pub entries_indexed: usize,
    /// Pages skipped because an identical serving path already existed.
    pub duplicates_skipped: usize,
    /// Files under the man tree that could not be interpreted.
    pub paths_ignored: usize,
}

/// Scan the products' cache directories and build the index.
///
/// For every (product, package) pair only the highest package version
/// contributes entries. `langs` and `sections` are the sorted,
/// de-duplicated unions over all entries, with each section contributing
/// both its full value and its main section. Product names are ordered
/// by `order`.
pub fn build_index(
    products: &[Product],
    order: &ProductOrder,
) -> Result<(Index, BuildStats), BuildError> {
    let mut index = Index::default();
    let mut stats = BuildStats::default();
    let mut langs = BTreeSet::new();
    let mut sections = BTreeSet::new();

    for product in products {
        index
            .product_mapping
            .insert(product.name.clone(), product.name.clone());
        for alias in &product.aliases {
            index
                .product_mapping
                .insert(alias.clone(), product.name.clone());
        }
        index.product_names.push(product.name.clone());

        // Only the newest build of each package is indexed.
        let mut latest: HashMap<String, (RpmVersion, PathBuf)> = HashMap::new();
        for cache in &product.cache_dirs {
            tracing::debug!(product = %product.name, cache = %cache.display(), "scanning cache");
            scan_cache(cache, &mut latest, &mut stats)?;
        }

        // Deterministic entry order: packages are indexed by name.
        let mut winners: Vec<_> = latest.iter().collect();
        winners.sort_by(|a, b| a.0.cmp(b.0));
        for (binarypkg, (version, path)) in winners {
            let before = stats.entries_indexed;
            index_package(
                &mut index,
                &mut stats,
                &mut langs,
                &mut sections,
                &product.name,
                binarypkg,
                path,
            );
            if stats.entries_indexed > before {
                stats.packages_with_manpages += 1;
            }
            tracing::trace!(
                product = %product.name,
                binarypkg = %binarypkg,
                version = %version.version,
                entries = stats.entries_indexed - before,
                "indexed package"
            );
        }
    }

    index.product_names.sort_by(|a, b| order.cmp(a, b));
    index.product_names.dedup();
    index.langs = langs.into_iter().collect();
    index.sections = sections.into_iter().collect();

    tracing::info!(
        packages = stats.packages_scanned,
        with_manpages = stats.packages_with_manpages,
        entries = stats.entries_indexed,
        duplicates = stats.duplicates_skipped,
        "index built"
    );

    Ok((index, stats))
}

/// Collect the newest version of every package directory in `cache`.
fn scan_cache(
    cache: &Path,
    latest: &mut HashMap<String, (RpmVersion, PathBuf)>,
    stats: &mut BuildStats,
) -> Result<(), BuildError> {
    let entries = fs::read_dir(cache).map_err(|source| BuildError::Scan {
        path: cache.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| BuildError::Scan {
            path: cache.to_path_buf(),
            source,
        })?;
        if !entry.path().is_dir() {
            continue;
        }

        let file_name = entry.file_name();
        let dir_name = file_name.to_string_lossy();
        let rpm = match split_rpm_name(&dir_name) {
            Ok(rpm) => rpm,
            Err(err) => {
                tracing::debug!(dir = %dir_name, error = %err, "ignoring cache entry");
                continue;
            }
        };
        stats.packages_scanned += 1;

        let version = rpm.version();
        let newer = match latest.get(&rpm.name) {
            Some((known, _)) => *known < version,
            None => true,
        };
        if newer {
            latest.insert(rpm.name, (version, entry.path()));
        }
    }

    Ok(())
}

/// Index every manual page of one extracted package.
fn index_package(
    index: &mut Index,
    stats: &mut BuildStats,
    langs: &mut BTreeSet<String>,
    sections: &mut BTreeSet<String>,
    product: &str,
    binarypkg: &str,
    package_dir: &Path,
) {
    let man_root = package_dir.join(MAN_SUBDIR);
    let mut files = Vec::new();
    collect_gz_files(&man_root, &mut files);
    files.sort();

    for file in files {
        let relative = match file.strip_prefix(&man_root) {
            Ok(relative) => relative.to_string_lossy().replace('\\', "/"),
            Err(_) => continue,
        };
        let page = match parse_man_path(&relative) {
            Ok(page) => page,
            Err(err) => {
                // Packages occasionally ship stray files below the man
                // tree; they are skipped, not fatal.
                tracing::warn!(
                    product = %product,
                    binarypkg = %binarypkg,
                    path = %relative,
                    error = %err,
                    "skipping unrecognized manual page path"
                );
                stats.paths_ignored += 1;
                continue;
            }
        };

        let new_entry = IndexEntry {
            name: page.name,
            product: product.to_string(),
            binarypkg: binarypkg.to_string(),
            section: page.section,
            language: page.language,
        };

        // The same page can be shipped in multiple encodings; under the
        // normalized serving path those are duplicates.
        let key = new_entry.name.to_lowercase();
        let variants = index.entries.entry(key).or_default();
        if variants
            .iter()
            .any(|known| known.serving_path("") == new_entry.serving_path(""))
        {
            stats.duplicates_skipped += 1;
            continue;
        }

        langs.insert(new_entry.language.clone());
        sections.insert(new_entry.section.clone());
        sections.insert(new_entry.main_section().to_string());
        variants.push(new_entry);
        stats.entries_indexed += 1;
    }
}

/// Recursively collect `.gz` files below `dir`; missing directories are
/// simply empty (not every package ships manual pages).
fn collect_gz_files(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_gz_files(&path, files);
        } else if path.extension().is_some_and(|ext| ext == "gz") {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_manpage(package_dir: &Path, relative: &str) {
        let path = package_dir.join(MAN_SUBDIR).join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"\x1f\x8b").unwrap();
    }

    fn product(name: &str, cache: &Path) -> Product {
        Product {
            name: name.to_string(),
            aliases: Vec::new(),
            cache_dirs: vec![cache.to_path_buf()],
        }
    }

    #[test]
    fn test_build_single_package() {
        let temp = TempDir::new().unwrap();
        let pkg = temp.path().join("i3wm-4.22-1.3.x86_64");
        write_manpage(&pkg, "man1/i3.1.gz");
        write_manpage(&pkg, "de/man1/i3.1.gz");

        let products = vec![product("Tumbleweed", temp.path())];
        let (index, stats) = build_index(&products, &ProductOrder::default()).unwrap();

        let entries = index.entries_for("i3").unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.binarypkg == "i3wm"));
        assert_eq!(stats.packages_scanned, 1);
        assert_eq!(stats.packages_with_manpages, 1);
        assert_eq!(stats.entries_indexed, 2);
        assert_eq!(index.langs, vec!["de".to_string(), "en".to_string()]);
    }

    #[test]
    fn test_build_keeps_highest_version_only() {
        let temp = TempDir::new().unwrap();
        let old = temp.path().join("i3wm-4.21-1.1.x86_64");
        let new = temp.path().join("i3wm-4.22-1.3.x86_64");
        write_manpage(&old, "man1/i3.1.gz");
        write_manpage(&old, "man1/i3-msg.1.gz");
        write_manpage(&new, "man1/i3.1.gz");

        let products = vec![product("Tumbleweed", temp.path())];
        let (index, stats) = build_index(&products, &ProductOrder::default()).unwrap();

        // i3-msg only exists in the older build, which loses entirely.
        assert_eq!(stats.packages_scanned, 2);
        assert_eq!(index.entries_for("i3").map(<[_]>::len), Some(1));
        assert!(index.entries_for("i3-msg").is_none());
    }

    #[test]
    fn test_build_collapses_duplicate_serving_paths() {
        let temp = TempDir::new().unwrap();
        let pkg = temp.path().join("qelectrotech-0.80-1.1.x86_64");
        // Same page in two encodings of the same language directory.
        write_manpage(&pkg, "fr/man1/qelectrotech.1.gz");
        write_manpage(&pkg, "fr.UTF-8/man1/qelectrotech.1.gz");

        let products = vec![product("Tumbleweed", temp.path())];
        let (index, stats) = build_index(&products, &ProductOrder::default()).unwrap();

        assert_eq!(index.entries_for("qelectrotech").map(<[_]>::len), Some(1));
        assert_eq!(stats.duplicates_skipped, 1);
    }

    #[test]
    fn test_build_sections_include_main_section() {
        let temp = TempDir::new().unwrap();
        let pkg = temp.path().join("man-pages-posix-2017-1.1.noarch");
        write_manpage(&pkg, "man3/open.3posix.gz");

        let products = vec![product("Tumbleweed", temp.path())];
        let (index, _) = build_index(&products, &ProductOrder::default()).unwrap();

        assert_eq!(
            index.sections,
            vec!["3".to_string(), "3posix".to_string()]
        );
    }

    #[test]
    fn test_build_product_mapping_and_order() {
        let temp_a = TempDir::new().unwrap();
        let temp_b = TempDir::new().unwrap();
        let mut leap = product("Leap", temp_a.path());
        leap.aliases.push("leap-15.6".to_string());
        let tumbleweed = product("Tumbleweed", temp_b.path());

        let order = ProductOrder::new(["Tumbleweed", "Leap"]);
        let (index, _) = build_index(&[leap, tumbleweed], &order).unwrap();

        assert_eq!(
            index.product_names,
            vec!["Tumbleweed".to_string(), "Leap".to_string()]
        );
        assert_eq!(index.canonical_product("leap-15.6"), Some("Leap"));
        assert_eq!(index.canonical_product("Tumbleweed"), Some("Tumbleweed"));
    }

    #[test]
    fn test_build_missing_cache_is_an_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("does-not-exist");
        let products = vec![product("Tumbleweed", &missing)];

        assert!(matches!(
            build_index(&products, &ProductOrder::default()),
            Err(BuildError::Scan { .. })
        ));
    }

    #[test]
    fn test_build_ignores_stray_files() {
        let temp = TempDir::new().unwrap();
        let pkg = temp.path().join("tar-1.35-2.1.x86_64");
        write_manpage(&pkg, "man1/tar.1.gz");
        // No section suffix at all: skipped, not fatal.
        write_manpage(&pkg, "man1/README.gz");

        let products = vec![product("Tumbleweed", temp.path())];
        let (index, stats) = build_index(&products, &ProductOrder::default()).unwrap();

        assert_eq!(stats.entries_indexed, 1);
        assert_eq!(stats.paths_ignored, 1);
        assert!(index.entries_for("tar").is_some());
    }

    #[test]
    fn test_product_order_known_before_unknown() {
        let order = ProductOrder::new(["Tumbleweed", "Leap"]);
        assert_eq!(order.cmp("Tumbleweed", "Leap"), Ordering::Less);
        assert_eq!(order.cmp("Leap", "Aeon"), Ordering::Less);
        assert_eq!(order.cmp("Aeon", "Tumbleweed"), Ordering::Greater);
        assert_eq!(order.cmp("Aeon", "Zeta"), Ordering::Less);
    }
}
