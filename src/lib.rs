//! `field-catalog` turns an analytics vendor's field catalog (dimensions and metrics, each with a
//! declared data type) into a JSON-schema style property map plus per-field metadata describing
//! which fields may be queried together.
//!
//! The primary entrypoint is [`catalog::assemble()`] (or a configured
//! [`catalog::CatalogAssembler`]). [`ingestion::CatalogRequest`] wraps it for file inputs.
//!
//! ## What goes in
//!
//! - **Standard fields**: [`types::FieldDescriptor`]s with a namespaced identifier
//!   (`ga:users`), a declared [`types::PrimitiveType`], a [`types::FieldKind`] and a status.
//! - **Custom fields**: account-defined [`types::CustomField`]s tagged as custom dimension or
//!   custom metric.
//! - **Exclusion index**: [`catalog::ExclusionIndex`], every queryable identifier and the
//!   identifiers it cannot be combined with.
//! - **Discovery**: a [`catalog::FieldDiscovery`] that enumerates profile-specific slots for
//!   templates such as `ga:goalXXCompletions`.
//!
//! ## What comes out
//!
//! A [`types::Catalog`]: one schema property and one metadata record per emitted field, plus the
//! `_sdc_record_hash` primary key. Declared types map as follows (override tables win):
//!
//! - `CURRENCY`, `PERCENT` -> nullable number
//! - `TIME` -> nullable string
//! - `INTEGER` -> nullable integer
//! - `FLOAT` -> nullable number
//! - `STRING` -> nullable string
//!
//! Any other declared type fails the run with [`CatalogError::UnknownPrimitiveType`].
//!
//! ## Quick example
//!
//! ```rust
//! use field_catalog::catalog::{assemble, ConfiguredSlots, ExclusionIndex};
//! use field_catalog::types::{FieldDescriptor, FieldKind, PrimitiveType, SchemaFormat};
//!
//! # fn main() -> Result<(), field_catalog::CatalogError> {
//! let standard = vec![
//!     FieldDescriptor::new("ga:dateHour", PrimitiveType::String, FieldKind::Dimension),
//!     FieldDescriptor::new("ga:sessions", PrimitiveType::Integer, FieldKind::Metric),
//! ];
//! let index = ExclusionIndex::build([("ga:dateHour", Vec::<&str>::new()), ("ga:sessions", vec![])]);
//!
//! let catalog = assemble(&standard, &[], &index, &ConfiguredSlots::default())?;
//! let date_hour = catalog.schema.get("ga:dateHour").unwrap();
//! assert_eq!(date_hour.format, Some(SchemaFormat::DateTime));
//! assert!(catalog.metadata.contains("_sdc_record_hash"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: type resolution, placeholder expansion, metadata and assembly
//! - [`ingestion`]: JSON/CSV loaders, the file-based request, and observers
//! - [`execution`]: parallel template expansion with throttled discovery
//! - [`types`]: field descriptors and catalog output types
//! - [`error`]: error types used across the crate

pub mod catalog;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod types;

pub use error::{CatalogError, CatalogResult, DiscoveryError};
