//! Input loading and run observability.
//!
//! Most callers should use [`CatalogRequest`] (from [`unified`]) which:
//!
//! - auto-detects each input's format by file extension (or you can force one)
//! - loads fields, custom fields, the exclusion index and override tables
//! - assembles the catalog, optionally reporting success/failure/alerts to a [`CatalogObserver`]
//!
//! Format-specific loaders are also available under:
//! - [`csv`]
//! - [`json`]

pub mod csv;
pub mod json;
pub mod observability;
pub mod unified;

#[cfg(feature = "tracing")]
pub use observability::TracingObserver;
pub use observability::{
    severity_for_error, CatalogContext, CatalogObserver, CatalogSeverity, CatalogStats, CatalogWarning,
    CompositeObserver, FileObserver, SkipReason, StdErrObserver,
};
pub use unified::{
    load_custom_fields, load_exclusion_index, load_standard_fields, load_type_overrides, CatalogRequest,
    SourceFormat,
};
