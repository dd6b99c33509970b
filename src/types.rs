//! Core data model types for catalog generation.
//!
//! Field descriptors come in from the vendor catalog (standard fields) or from a profile's
//! configuration (custom fields). A generation run turns them into a [`Catalog`]: a
//! [`CatalogSchema`] of nullable JSON-schema properties plus a [`Metadata`] collection keyed by
//! the same concrete field identifiers.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::{json, Value};

/// Name of the synthetic primary-key property anchoring every catalog.
pub const PRIMARY_KEY: &str = "_sdc_record_hash";

/// Stream name used when none is configured.
pub const DEFAULT_STREAM: &str = "report";

/// Primitive data type declared by the vendor for a field.
///
/// Unknown vendor types are kept as [`PrimitiveType::Other`] so that type resolution can reject
/// them explicitly instead of failing while the field list is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// Monetary value.
    Currency,
    /// Free text.
    String,
    /// Percentage.
    Percent,
    /// Duration or time-of-day rendered as text.
    Time,
    /// Whole number.
    Integer,
    /// Floating point number.
    Float,
    /// A type tag with no resolution rule (e.g. `BOOLEAN`).
    Other(String),
}

impl PrimitiveType {
    /// Parse a vendor data type tag (case-insensitive).
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "CURRENCY" => Self::Currency,
            "STRING" => Self::String,
            "PERCENT" => Self::Percent,
            "TIME" => Self::Time,
            "INTEGER" => Self::Integer,
            "FLOAT" => Self::Float,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// The vendor tag for this type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Currency => "CURRENCY",
            Self::String => "STRING",
            Self::Percent => "PERCENT",
            Self::Time => "TIME",
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::Other(tag) => tag.as_str(),
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic role of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKind {
    /// A measured quantity.
    Metric,
    /// An attribute used to group metrics.
    Dimension,
}

impl FieldKind {
    /// Parse a vendor kind tag (`METRIC` / `DIMENSION`, case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "METRIC" => Some(Self::Metric),
            "DIMENSION" => Some(Self::Dimension),
            _ => None,
        }
    }

    /// Tag written into the `behavior` metadata entry.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Metric => "METRIC",
            Self::Dimension => "DIMENSION",
        }
    }
}

/// Lifecycle status of a vendor field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldStatus {
    #[default]
    Active,
    Deprecated,
}

impl FieldStatus {
    /// `DEPRECATED` maps to [`FieldStatus::Deprecated`]; every other tag (`PUBLIC`, `ACTIVE`, ...)
    /// is treated as active.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("DEPRECATED") {
            Self::Deprecated
        } else {
            Self::Active
        }
    }
}

/// An immutable description of one vendor field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    /// Namespace-qualified identifier, e.g. `ga:sessions` or `ga:goalXXCompletions`.
    pub identifier: String,
    /// Vendor-declared primitive type.
    pub primitive_type: PrimitiveType,
    /// Metric or dimension.
    pub kind: FieldKind,
    /// Active or deprecated.
    pub status: FieldStatus,
}

impl FieldDescriptor {
    /// Create an active field descriptor.
    pub fn new(identifier: impl Into<String>, primitive_type: PrimitiveType, kind: FieldKind) -> Self {
        Self {
            identifier: identifier.into(),
            primitive_type,
            kind,
            status: FieldStatus::Active,
        }
    }

    /// Builder-style status override.
    pub fn with_status(mut self, status: FieldStatus) -> Self {
        self.status = status;
        self
    }

    /// A copy of this descriptor carrying a different (concrete) identifier.
    pub fn with_identifier(&self, identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..self.clone()
        }
    }

    /// The identifier with any vendor namespace prefix removed (`ga:date` -> `date`).
    pub fn local_name(&self) -> &str {
        local_name(&self.identifier)
    }

    pub fn is_deprecated(&self) -> bool {
        self.status == FieldStatus::Deprecated
    }
}

/// Strip a vendor namespace prefix (everything up to the first `:`).
pub fn local_name(identifier: &str) -> &str {
    match identifier.split_once(':') {
        Some((_, rest)) => rest,
        None => identifier,
    }
}

/// Kind tag of a profile-defined custom field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CustomFieldKind {
    /// `analytics#customDimension`
    Dimension,
    /// `analytics#customMetric`
    Metric,
    /// Any other tag; rejected during assembly.
    Unrecognized(String),
}

impl CustomFieldKind {
    /// Parse a custom field kind tag. Both the vendor form (`analytics#customMetric`) and the
    /// short form (`customMetric`) are accepted.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let short = trimmed.strip_prefix("analytics#").unwrap_or(trimmed);
        match short {
            "customDimension" => Self::Dimension,
            "customMetric" => Self::Metric,
            _ => Self::Unrecognized(trimmed.to_string()),
        }
    }
}

/// A custom field defined in a profile's configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomField {
    pub descriptor: FieldDescriptor,
    pub kind_tag: CustomFieldKind,
}

impl CustomField {
    pub fn new(descriptor: FieldDescriptor, kind_tag: CustomFieldKind) -> Self {
        Self { descriptor, kind_tag }
    }
}

/// JSON-schema value kind of a resolved property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Integer,
    Number,
    String,
}

impl SchemaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
        }
    }
}

/// Optional JSON-schema `format` annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    DateTime,
}

impl SchemaFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DateTime => "date-time",
        }
    }
}

/// A single property of the catalog schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaProperty {
    pub kind: SchemaKind,
    pub nullable: bool,
    pub format: Option<SchemaFormat>,
}

impl SchemaProperty {
    /// A nullable property of the given kind.
    pub fn nullable(kind: SchemaKind) -> Self {
        Self {
            kind,
            nullable: true,
            format: None,
        }
    }

    /// A nullable `date-time` formatted string.
    pub fn date_time() -> Self {
        Self {
            kind: SchemaKind::String,
            nullable: true,
            format: Some(SchemaFormat::DateTime),
        }
    }

    /// The non-nullable string used for the synthetic primary key.
    pub fn primary_key() -> Self {
        Self {
            kind: SchemaKind::String,
            nullable: false,
            format: None,
        }
    }

    /// Render as a JSON-schema fragment, e.g. `{"type": ["integer", "null"]}`.
    pub fn to_json_value(&self) -> Value {
        let mut out = serde_json::Map::new();
        let ty = if self.nullable {
            json!([self.kind.as_str(), "null"])
        } else {
            json!(self.kind.as_str())
        };
        out.insert("type".to_string(), ty);
        if let Some(format) = self.format {
            out.insert("format".to_string(), json!(format.as_str()));
        }
        Value::Object(out)
    }
}

/// Inclusion policy of a catalog property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    /// Selectable by the user.
    Available,
    /// Always emitted.
    Automatic,
}

impl Inclusion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Automatic => "automatic",
        }
    }
}

/// Metadata describing one catalog property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub inclusion: Inclusion,
    /// Identifiers that cannot be requested together with this field.
    pub field_exclusions: BTreeSet<String>,
    /// Metric or dimension; `None` for the synthetic primary key.
    pub behavior: Option<FieldKind>,
}

impl MetadataRecord {
    /// Record for the synthetic primary key.
    pub fn automatic() -> Self {
        Self {
            inclusion: Inclusion::Automatic,
            field_exclusions: BTreeSet::new(),
            behavior: None,
        }
    }

    pub fn to_json_value(&self) -> Value {
        let mut out = serde_json::Map::new();
        out.insert("inclusion".to_string(), json!(self.inclusion.as_str()));
        if let Some(behavior) = self.behavior {
            out.insert(
                "fieldExclusions".to_string(),
                json!(self.field_exclusions.iter().collect::<Vec<_>>()),
            );
            out.insert("behavior".to_string(), json!(behavior.as_str()));
        }
        Value::Object(out)
    }
}

/// Property map of the generated schema, keyed by concrete field identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogSchema {
    pub properties: BTreeMap<String, SchemaProperty>,
}

impl CatalogSchema {
    /// A schema holding only the synthetic primary key.
    pub fn with_primary_key() -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(PRIMARY_KEY.to_string(), SchemaProperty::primary_key());
        Self { properties }
    }

    pub fn get(&self, identifier: &str) -> Option<&SchemaProperty> {
        self.properties.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.properties.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterate property identifiers in sorted order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn to_json_value(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .properties
            .iter()
            .map(|(id, prop)| (id.clone(), prop.to_json_value()))
            .collect();
        json!({ "type": "object", "properties": properties })
    }
}

/// Metadata collection keyed by concrete field identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    pub records: BTreeMap<String, MetadataRecord>,
}

impl Metadata {
    /// Metadata holding only the primary key's `automatic` record.
    pub fn with_primary_key() -> Self {
        let mut records = BTreeMap::new();
        records.insert(PRIMARY_KEY.to_string(), MetadataRecord::automatic());
        Self { records }
    }

    pub fn get(&self, identifier: &str) -> Option<&MetadataRecord> {
        self.records.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.records.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The output of one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub stream: String,
    pub key_properties: Vec<String>,
    pub schema: CatalogSchema,
    pub metadata: Metadata,
}

impl Catalog {
    /// Render as a stream-catalog document with a single stream.
    ///
    /// Metadata entries are addressed by breadcrumb: the empty breadcrumb carries the table key
    /// properties, `["properties", id]` carries the per-field record.
    pub fn to_json_value(&self) -> Value {
        let mut metadata = Vec::with_capacity(self.metadata.len() + 1);
        metadata.push(json!({
            "breadcrumb": [],
            "metadata": { "table-key-properties": self.key_properties },
        }));
        for (id, record) in &self.metadata.records {
            metadata.push(json!({
                "breadcrumb": ["properties", id],
                "metadata": record.to_json_value(),
            }));
        }

        json!({
            "streams": [{
                "stream": self.stream,
                "tap_stream_id": self.stream,
                "key_properties": self.key_properties,
                "schema": self.schema.to_json_value(),
                "metadata": metadata,
            }]
        })
    }
}
