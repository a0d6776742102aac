//! Markdown format tests
//!
//! Import, export and round trips through the default extension set.

mod callouts;
mod export;
mod extensions;
mod fallback;
mod flavors;
mod import;
mod round_trip;
