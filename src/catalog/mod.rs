//! Catalog generation: type resolution, exclusion lookup, placeholder expansion, metadata
//! writing, and assembly.
//!
//! Most callers should use [`assemble()`] or a configured [`CatalogAssembler`]. The pieces it is
//! built from are public so each can be used (and tested) alone:
//!
//! - [`resolve`]: vendor type + override tables -> schema property
//! - [`exclusion`]: the index of queryable identifiers and their exclusion sets
//! - [`placeholder`]: detection, classification and expansion of `XX` templates
//! - [`discovery`]: the seam for profile-scoped enumeration of dynamic templates
//! - [`metadata`]: the metadata writer
//! - [`hash`]: the record-hash primary key
//! - [`reports`]: premade field selections and conflict checks
//!
//! ## Example
//!
//! ```rust
//! use field_catalog::catalog::{assemble, ConfiguredSlots, ExclusionIndex};
//! use field_catalog::types::{FieldDescriptor, FieldKind, PrimitiveType, SchemaKind};
//!
//! let standard = vec![
//!     FieldDescriptor::new("ga:users", PrimitiveType::Integer, FieldKind::Metric),
//!     FieldDescriptor::new("ga:goalXXCompletions", PrimitiveType::Integer, FieldKind::Metric),
//! ];
//! let index = ExclusionIndex::build([
//!     ("ga:users", vec![]),
//!     ("ga:goalXXCompletions", vec!["ga:users"]),
//! ]);
//!
//! let goals = ConfiguredSlots::for_template("ga:goalXXCompletions", [1, 17]);
//! let catalog = assemble(&standard, &[], &index, &goals).unwrap();
//! assert_eq!(catalog.schema.get("ga:goal17Completions").unwrap().kind, SchemaKind::Integer);
//! assert_eq!(catalog.schema.len(), 4);
//! ```

pub mod assemble;
pub mod discovery;
pub mod exclusion;
pub mod hash;
pub mod metadata;
pub mod placeholder;
pub mod reports;
pub mod resolve;

pub use assemble::{
    assemble, custom_exclusion_key, CatalogAssembler, CatalogOptions, CUSTOM_DIMENSION_KEY, CUSTOM_METRIC_KEY,
};
pub use discovery::{ConfiguredSlots, FieldDiscovery, NoDiscovery, ProfileContext};
pub use exclusion::ExclusionIndex;
pub use hash::{record_hash, stamp_record};
pub use placeholder::{
    classify, detect, Classification, ExpandedField, Expansion, Placeholder, PlaceholderTemplate, UnresolvedReason,
    PLACEHOLDER_TOKEN,
};
pub use reports::{check_report, check_selection, premade_report, PremadeReport, SelectionIssue, PREMADE_REPORTS};
pub use resolve::{OverrideKind, TypeOverrides, TypeResolver};
