#![doc(test(attr(deny(warnings))))]

//! Recurring expense engine: calendar-anchored recurring expense records,
//! mode-based deletion that keeps chains disjoint, and start-date shift
//! classification.
//!
//! The heavy lifting lives in the workspace crates re-exported here.
//! [`rex_domain`] holds the record and month types and [`rex_core`] the
//! services plus the store trait. File persistence is in
//! [`rex_storage_json`] and user preferences in [`rex_config`].

pub mod cli;
pub mod config;
pub mod utils;

pub use rex_config;
pub use rex_core;
pub use rex_domain;
pub use rex_storage_json;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing with the default filter.
pub fn init() {
    init_with_filter(None);
}

/// Initializes global tracing, preferring `RUST_LOG`, then `filter`.
pub fn init_with_filter(filter: Option<&str>) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(filter);
        tracing::debug!("rex engine tracing initialized");
    });
}
