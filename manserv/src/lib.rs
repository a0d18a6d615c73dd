//! Manserv - manual page mirror indexing and redirect resolution
//!
//! This library provides the core functionality behind a static, browsable
//! mirror of manual pages extracted from RPM packages: building an in-memory
//! cross-reference index, persisting it to compact binary index files, and
//! resolving ambiguous page references (`i3(1)`, `/i3wm/i3.1.html`) to a
//! concrete rendered page.

pub mod config;
pub mod index;
pub mod langtag;
pub mod redirect;
pub mod server;

/// Crate version, as reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
