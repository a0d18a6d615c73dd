//! Persisted index files.
//!
//! The index is written as a single binary file with a fixed magic and a
//! format version, so the builder and the serving process can evolve the
//! schema in lockstep. Saving is atomic (temp file + rename); loading
//! accepts several files and merges their entries, so an index can be
//! assembled from multiple build runs.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::index::model::{Index, IndexEntry};

/// Identifies a manserv index file.
const INDEX_MAGIC: [u8; 4] = *b"MSRV";

/// Current index file format version.
const INDEX_FORMAT_VERSION: u32 = 1;

/// On-disk representation of an [`Index`].
#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    magic: [u8; 4],
    format_version: u32,
    entries: Vec<IndexEntry>,
    langs: Vec<String>,
    sections: Vec<String>,
    product_mapping: Vec<(String, String)>,
    product_names: Vec<String>,
}

/// Error reading or writing index files.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An index file could not be read.
    #[error("failed to read index file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An index file could not be written.
    #[error("failed to write index file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file does not start with the index magic.
    #[error("{path:?} is not an index file")]
    BadMagic { path: PathBuf },

    /// The file uses a format version this build does not understand.
    #[error("index file {path:?} has unsupported format version {version}")]
    UnsupportedVersion { path: PathBuf, version: u32 },

    /// The file carries the right header but malformed content.
    #[error("failed to decode index file {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    /// The index could not be encoded.
    #[error("failed to encode index: {0}")]
    Encode(#[source] bincode::Error),
}

/// Serialize `index` to `path` atomically.
///
/// Returns the number of bytes written. The parent directory is created
/// if needed; the data is written to a temporary file first and renamed
/// into place so readers never observe a partial index.
pub fn save(index: &Index, path: &Path) -> Result<u64, StorageError> {
    let file = to_file(index);
    let encoded = bincode::serialize(&file).map_err(StorageError::Encode)?;

    let write_err = |source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, &encoded).map_err(write_err)?;
    fs::rename(&temp_path, path).map_err(write_err)?;

    tracing::info!(
        path = %path.display(),
        entries = file.entries.len(),
        bytes = encoded.len(),
        "saved index"
    );
    Ok(encoded.len() as u64)
}

/// Load one or more index files and merge them into a single [`Index`].
///
/// Entries of later files are appended under the same lowercase-name key
/// (a multi-map union, deliberately without de-duplication); languages
/// and sections are merged as sets; the product mapping is merged with
/// later files winning per key. Product names are taken from the last
/// file that carries any, and derived from the product mapping otherwise.
///
/// `langs` and `sections` are re-sorted after loading even if the files
/// claim to be sorted; the path splitter's binary searches depend on it.
pub fn load(paths: &[PathBuf]) -> Result<Index, StorageError> {
    let mut index = Index::default();
    let mut langs = BTreeSet::new();
    let mut sections = BTreeSet::new();

    for path in paths {
        let file = read_file(path)?;

        tracing::info!(
            path = %path.display(),
            entries = file.entries.len(),
            products = file.product_names.len(),
            langs = file.langs.len(),
            sections = file.sections.len(),
            "loaded index"
        );

        for entry in file.entries {
            index
                .entries
                .entry(entry.name.to_lowercase())
                .or_default()
                .push(entry);
        }
        langs.extend(file.langs);
        sections.extend(file.sections);
        index.product_mapping.extend(file.product_mapping);
        if !file.product_names.is_empty() {
            index.product_names = file.product_names;
        }
    }

    index.langs = langs.into_iter().collect();
    index.sections = sections.into_iter().collect();

    if index.product_names.is_empty() {
        // Older index files carry no product list; derive one.
        let mut names: Vec<String> = index.product_mapping.values().cloned().collect();
        names.sort();
        names.dedup();
        index.product_names = names;
    }

    Ok(index)
}

fn to_file(index: &Index) -> IndexFile {
    let mut names: Vec<&String> = index.entries.keys().collect();
    names.sort();
    let entries = names
        .into_iter()
        .flat_map(|name| index.entries[name].iter().cloned())
        .collect();

    let mut product_mapping: Vec<(String, String)> = index
        .product_mapping
        .iter()
        .map(|(alias, name)| (alias.clone(), name.clone()))
        .collect();
    product_mapping.sort();

    IndexFile {
        magic: INDEX_MAGIC,
        format_version: INDEX_FORMAT_VERSION,
        entries,
        langs: index.langs.clone(),
        sections: index.sections.clone(),
        product_mapping,
        product_names: index.product_names.clone(),
    }
}

fn read_file(path: &Path) -> Result<IndexFile, StorageError> {
    let bytes = fs::read(path).map_err(|source| StorageError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    // The header is checked before decoding the body, so a file in an
    // older or foreign format fails with a telling error instead of a
    // generic decode failure. bincode writes the magic as four raw bytes
    // followed by the version as a little-endian u32.
    if bytes.len() < 8 || bytes[..4] != INDEX_MAGIC {
        return Err(StorageError::BadMagic {
            path: path.to_path_buf(),
        });
    }
    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != INDEX_FORMAT_VERSION {
        return Err(StorageError::UnsupportedVersion {
            path: path.to_path_buf(),
            version,
        });
    }

    bincode::deserialize(&bytes).map_err(|source| StorageError::Decode {
        path: path.to_path_buf(),
        source,
    })
}
