//! Manual page index: model, construction and persistence.
//!
//! The index is the shared, read-only data structure behind redirect
//! resolution: for every page name it knows all product / package /
//! section / language variants and where they are served from.
//!
//! ```text
//! Package caches ──► build_index ──► Index ──► storage::save ──► .idx file
//!                                      ▲                            │
//!                                      └──────── storage::load ◄────┘
//! ```

mod build;
mod manpath;
mod model;
mod rpmname;
pub mod storage;

pub use build::{build_index, BuildError, BuildStats, ProductOrder};
pub use manpath::{parse_man_path, ManPath, ManPathError};
pub use model::{EntryQuery, Index, IndexEntry};
pub use rpmname::{compare_versions, split_rpm_name, RpmName, RpmNameError, RpmVersion};
pub use storage::StorageError;
