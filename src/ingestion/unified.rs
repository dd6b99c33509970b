//! Unified loading entrypoint.
//!
//! Most callers should use [`CatalogRequest::run`], which loads the field lists, exclusion
//! index and (optionally) override tables from files and assembles a catalog.
//!
//! - Each file's format is inferred from its extension unless [`CatalogRequest::format`] is set.
//! - If an observer is configured in [`CatalogOptions`], load failures are reported to it the
//!   same way assembly failures are.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::catalog::assemble::{CatalogAssembler, CatalogOptions};
use crate::catalog::discovery::FieldDiscovery;
use crate::catalog::exclusion::ExclusionIndex;
use crate::catalog::resolve::{TypeOverrides, TypeResolver};
use crate::error::{CatalogError, CatalogResult};
use crate::types::{Catalog, CustomField, FieldDescriptor};

use super::{csv, json};

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// JSON array, or an object with an `items` array.
    Json,
    /// Comma-separated values with headers.
    Csv,
}

impl SourceFormat {
    /// Parse a source format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

fn resolve_format(path: &Path, format: Option<SourceFormat>) -> CatalogResult<SourceFormat> {
    if let Some(f) = format {
        return Ok(f);
    }
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| CatalogError::InvalidInput {
            message: format!("cannot infer format: path has no extension ({})", path.display()),
        })?;

    SourceFormat::from_extension(ext).ok_or_else(|| CatalogError::InvalidInput {
        message: format!("cannot infer format from extension '{ext}' for path ({})", path.display()),
    })
}

fn unsupported(what: &str, format: SourceFormat, path: &Path) -> CatalogError {
    CatalogError::InvalidInput {
        message: format!("{what} cannot be loaded as {format:?} ({})", path.display()),
    }
}

/// Load standard field descriptors (JSON or CSV).
pub fn load_standard_fields(
    path: impl AsRef<Path>,
    format: Option<SourceFormat>,
) -> CatalogResult<Vec<FieldDescriptor>> {
    let path = path.as_ref();
    match resolve_format(path, format)? {
        SourceFormat::Json => json::standard_fields_from_path(path),
        SourceFormat::Csv => csv::standard_fields_from_path(path),
    }
}

/// Load custom field definitions (JSON only).
pub fn load_custom_fields(path: impl AsRef<Path>, format: Option<SourceFormat>) -> CatalogResult<Vec<CustomField>> {
    let path = path.as_ref();
    match resolve_format(path, format)? {
        SourceFormat::Json => json::custom_fields_from_path(path),
        other => Err(unsupported("custom fields", other, path)),
    }
}

/// Load an exclusion index (JSON only).
pub fn load_exclusion_index(path: impl AsRef<Path>, format: Option<SourceFormat>) -> CatalogResult<ExclusionIndex> {
    let path = path.as_ref();
    match resolve_format(path, format)? {
        SourceFormat::Json => json::exclusion_index_from_path(path),
        other => Err(unsupported("exclusion index", other, path)),
    }
}

/// Load override tables (JSON or CSV).
pub fn load_type_overrides(path: impl AsRef<Path>, format: Option<SourceFormat>) -> CatalogResult<TypeOverrides> {
    let path = path.as_ref();
    match resolve_format(path, format)? {
        SourceFormat::Json => json::type_overrides_from_path(path),
        SourceFormat::Csv => csv::type_overrides_from_path(path),
    }
}

/// Owned description of one catalog generation run over files.
///
/// This can be useful if you want to enqueue generation work in a job system.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use field_catalog::catalog::{CatalogOptions, ConfiguredSlots};
/// use field_catalog::ingestion::{CatalogRequest, StdErrObserver};
///
/// # fn main() -> Result<(), field_catalog::CatalogError> {
/// let request = CatalogRequest {
///     custom_fields: Some("custom_fields.json".into()),
///     options: CatalogOptions {
///         observer: Some(Arc::new(StdErrObserver::default())),
///         ..Default::default()
///     },
///     ..CatalogRequest::new("fields.json", "exclusions.json")
/// };
///
/// let catalog = request.run(&ConfiguredSlots::for_template("ga:goalXXCompletions", 1..=20))?;
/// println!("{}", serde_json::to_string_pretty(&catalog.to_json_value()).unwrap());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CatalogRequest {
    /// Standard field list (JSON or CSV).
    pub standard_fields: PathBuf,
    /// Custom field list (JSON). `None` means no custom fields.
    pub custom_fields: Option<PathBuf>,
    /// Exclusion index (JSON).
    pub exclusions: PathBuf,
    /// Override tables (JSON or CSV). `None` uses the built-in tables.
    pub overrides: Option<PathBuf>,
    /// Forces one format for every file instead of inferring from extensions.
    pub format: Option<SourceFormat>,
    /// Options handed to the assembler.
    pub options: CatalogOptions,
}

impl fmt::Debug for CatalogRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogRequest")
            .field("standard_fields", &self.standard_fields)
            .field("custom_fields", &self.custom_fields)
            .field("exclusions", &self.exclusions)
            .field("overrides", &self.overrides)
            .field("format", &self.format)
            .field("options", &self.options)
            .finish()
    }
}

impl CatalogRequest {
    pub fn new(standard_fields: impl Into<PathBuf>, exclusions: impl Into<PathBuf>) -> Self {
        Self {
            standard_fields: standard_fields.into(),
            custom_fields: None,
            exclusions: exclusions.into(),
            overrides: None,
            format: None,
            options: CatalogOptions::default(),
        }
    }

    /// Load every input and assemble the catalog.
    ///
    /// A load failure is reported to the configured observer (`on_failure`, plus `on_alert` at
    /// or above the threshold) before it is returned.
    pub fn run(&self, discovery: &dyn FieldDiscovery) -> CatalogResult<Catalog> {
        let (standard, custom, index, resolver) = match self.load() {
            Ok(loaded) => loaded,
            Err(e) => {
                self.options.notify_failure(&self.options.context(), &e);
                return Err(e);
            }
        };

        CatalogAssembler::new(resolver, self.options.clone()).assemble(&standard, &custom, &index, discovery)
    }

    fn load(&self) -> CatalogResult<(Vec<FieldDescriptor>, Vec<CustomField>, ExclusionIndex, TypeResolver)> {
        let standard = load_standard_fields(&self.standard_fields, self.format)?;
        let custom = match &self.custom_fields {
            Some(path) => load_custom_fields(path, self.format)?,
            None => Vec::new(),
        };
        let index = load_exclusion_index(&self.exclusions, self.format)?;
        let resolver = match &self.overrides {
            Some(path) => TypeResolver::new(load_type_overrides(path, self.format)?),
            None => TypeResolver::default(),
        };
        Ok((standard, custom, index, resolver))
    }
}
