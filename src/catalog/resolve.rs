//! Type resolution: vendor primitive type + field-specific overrides -> [`SchemaProperty`].

use std::collections::BTreeSet;

use crate::error::{CatalogError, CatalogResult};
use crate::types::{local_name, PrimitiveType, SchemaKind, SchemaProperty};

const DATE_TIME_OVERRIDES: &[&str] = &["date", "dateHour"];

const INTEGER_OVERRIDES: &[&str] = &[
    "cohortNthDay",
    "cohortNthMonth",
    "cohortNthWeek",
    "daysSinceLastSession",
    "daysToTransaction",
    "nthDay",
    "nthHour",
    "nthMinute",
    "nthMonth",
    "nthWeek",
    "pageDepth",
    "screenDepth",
    "sessionCount",
    "sessionsToTransaction",
    "subContinentCode",
    "visitCount",
    "visitLength",
    "visitsToTransaction",
];

const FLOAT_OVERRIDES: &[&str] = &[
    "latitude",
    "longitude",
    "avgScreenviewDuration",
    "avgSearchDuration",
    "avgSessionDuration",
    "avgTimeOnPage",
    "cohortSessionDurationPerUser",
    "cohortSessionDurationPerUserWithLifetimeCriteria",
    "searchDuration",
    "sessionDuration",
    "timeOnPage",
    "timeOnScreen",
];

/// Which correction an override entry applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideKind {
    DateTime,
    Integer,
    Float,
}

impl OverrideKind {
    /// Parse `date-time`, `integer` or `float` (case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "date-time" | "datetime" => Some(Self::DateTime),
            "integer" => Some(Self::Integer),
            "float" | "number" => Some(Self::Float),
            _ => None,
        }
    }
}

/// Per-field corrections to the vendor-declared primitive type.
///
/// Entries are bare local names (no namespace prefix). The tables are immutable once built and
/// are handed to [`TypeResolver::new`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeOverrides {
    pub date_time: BTreeSet<String>,
    pub integer: BTreeSet<String>,
    pub float: BTreeSet<String>,
}

impl TypeOverrides {
    /// No overrides: resolution follows the declared type only.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The correction tables for the vendor's known mistyped fields.
    pub fn builtin() -> Self {
        let collect = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Self {
            date_time: collect(DATE_TIME_OVERRIDES),
            integer: collect(INTEGER_OVERRIDES),
            float: collect(FLOAT_OVERRIDES),
        }
    }

    /// Add one entry. A namespace prefix on `name` is stripped.
    pub fn insert(&mut self, name: &str, kind: OverrideKind) {
        let name = local_name(name).to_string();
        match kind {
            OverrideKind::DateTime => self.date_time.insert(name),
            OverrideKind::Integer => self.integer.insert(name),
            OverrideKind::Float => self.float.insert(name),
        };
    }

    /// Builder-style [`Self::insert`].
    pub fn with(mut self, name: &str, kind: OverrideKind) -> Self {
        self.insert(name, kind);
        self
    }
}

/// Resolves schema properties from declared types and a fixed override table.
#[derive(Debug, Clone)]
pub struct TypeResolver {
    overrides: TypeOverrides,
}

impl Default for TypeResolver {
    fn default() -> Self {
        Self::new(TypeOverrides::builtin())
    }
}

impl TypeResolver {
    pub fn new(overrides: TypeOverrides) -> Self {
        Self { overrides }
    }

    /// Resolve the schema property for a concrete field.
    ///
    /// Precedence, highest first:
    ///
    /// 1. date-time override -> `string` with `date-time` format
    /// 2. `CURRENCY` / `PERCENT` -> `number`
    /// 3. `TIME` -> `string`
    /// 4. integer override or `INTEGER` -> `integer`
    /// 5. float override or `FLOAT` -> `number`
    /// 6. `STRING` -> `string`
    ///
    /// Every result is nullable. A declared type matching none of the rules is an
    /// [`CatalogError::UnknownPrimitiveType`].
    ///
    /// Percent values are mapped to `number` although it is not settled whether the vendor sends
    /// them as `0.25` or as `"0.25%"`.
    pub fn resolve(&self, primitive_type: &PrimitiveType, identifier: &str) -> CatalogResult<SchemaProperty> {
        let name = local_name(identifier);

        if self.overrides.date_time.contains(name) {
            return Ok(SchemaProperty::date_time());
        }

        let kind = match primitive_type {
            PrimitiveType::Currency | PrimitiveType::Percent => SchemaKind::Number,
            PrimitiveType::Time => SchemaKind::String,
            _ if self.overrides.integer.contains(name) => SchemaKind::Integer,
            PrimitiveType::Integer => SchemaKind::Integer,
            _ if self.overrides.float.contains(name) => SchemaKind::Number,
            PrimitiveType::Float => SchemaKind::Number,
            PrimitiveType::String => SchemaKind::String,
            PrimitiveType::Other(tag) => {
                return Err(CatalogError::UnknownPrimitiveType {
                    field: identifier.to_string(),
                    primitive_type: tag.clone(),
                });
            }
        };

        Ok(SchemaProperty::nullable(kind))
    }
}
