//! Ambiguous reference resolution.
//!
//! This is the decision core of the server: given a request path, an
//! `Accept-Language` header and optional referrer hints, find the one
//! concrete page to serve.
//!
//! ```text
//! path ──► split ──► candidates ──► narrow ──► serving path
//!                        │                        │
//!                        └── none ────────────────┴── NotFound{choices}
//! ```
//!
//! Everything here is a pure function of the (immutable) index and the
//! request; resolution allocates its own working set and never blocks.

mod narrow;
mod resolve;
mod split;

pub use narrow::{narrow, SectionOrder};
pub use resolve::{resolve, NotFound, RedirectError, RedirectRequest};
