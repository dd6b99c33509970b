//! JSON loaders for field lists, exclusion indexes and override tables.
//!
//! Field lists are accepted in two shapes:
//! - The vendor envelope: `{"items": [{"id": "ga:users", "attributes": {"type": "METRIC", "dataType": "INTEGER", "status": "PUBLIC"}}]}`
//! - A flat array: `[{"id": "ga:users", "type": "METRIC", "dataType": "INTEGER"}]`

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::catalog::exclusion::ExclusionIndex;
use crate::catalog::resolve::{OverrideKind, TypeOverrides};
use crate::error::{CatalogError, CatalogResult};
use crate::types::{CustomField, CustomFieldKind, FieldDescriptor, FieldKind, FieldStatus, PrimitiveType};

/// Load standard field descriptors from a JSON file.
pub fn standard_fields_from_path(path: impl AsRef<Path>) -> CatalogResult<Vec<FieldDescriptor>> {
    let text = fs::read_to_string(path)?;
    standard_fields_from_str(&text)
}

/// Load standard field descriptors from an in-memory JSON string.
pub fn standard_fields_from_str(input: &str) -> CatalogResult<Vec<FieldDescriptor>> {
    let value = parse_document(input, "field list")?;
    items(&value)?
        .iter()
        .enumerate()
        .map(|(idx0, item)| standard_field(idx0 + 1, item))
        .collect()
}

/// Load custom field definitions from a JSON file.
pub fn custom_fields_from_path(path: impl AsRef<Path>) -> CatalogResult<Vec<CustomField>> {
    let text = fs::read_to_string(path)?;
    custom_fields_from_str(&text)
}

/// Load custom field definitions from an in-memory JSON string.
///
/// Each item needs `id` and `kind` (`analytics#customDimension` / `analytics#customMetric`).
/// The behavior comes from `type` when it is `METRIC`/`DIMENSION`, otherwise from the kind tag.
/// The data type comes from `dataType`, or from `type` when that holds a data type. Custom
/// dimensions without a data type are strings; custom metrics must declare one.
pub fn custom_fields_from_str(input: &str) -> CatalogResult<Vec<CustomField>> {
    let value = parse_document(input, "custom field list")?;
    items(&value)?
        .iter()
        .enumerate()
        .map(|(idx0, item)| custom_field(idx0 + 1, item))
        .collect()
}

/// Load an exclusion index (`{"ga:id": ["ga:other", ...]}`) from a JSON file.
pub fn exclusion_index_from_path(path: impl AsRef<Path>) -> CatalogResult<ExclusionIndex> {
    let text = fs::read_to_string(path)?;
    exclusion_index_from_str(&text)
}

/// Load an exclusion index from an in-memory JSON string.
pub fn exclusion_index_from_str(input: &str) -> CatalogResult<ExclusionIndex> {
    let value = parse_document(input, "exclusion index")?;
    ExclusionIndex::from_json_value(&value)
}

/// Load override tables (`{"date-time": [..], "integer": [..], "float": [..]}`) from a JSON file.
pub fn type_overrides_from_path(path: impl AsRef<Path>) -> CatalogResult<TypeOverrides> {
    let text = fs::read_to_string(path)?;
    type_overrides_from_str(&text)
}

/// Load override tables from an in-memory JSON string. Missing tables are empty.
pub fn type_overrides_from_str(input: &str) -> CatalogResult<TypeOverrides> {
    let value = parse_document(input, "type overrides")?;
    let doc: OverridesDocument = serde_json::from_value(value)?;

    let mut overrides = TypeOverrides::empty();
    let tables = [
        (doc.date_time, OverrideKind::DateTime),
        (doc.integer, OverrideKind::Integer),
        (doc.float, OverrideKind::Float),
    ];
    for (names, kind) in tables {
        for name in &names {
            overrides.insert(name, kind);
        }
    }
    Ok(overrides)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OverridesDocument {
    #[serde(rename = "date-time", alias = "datetime", default)]
    date_time: Vec<String>,
    #[serde(default)]
    integer: Vec<String>,
    #[serde(default)]
    float: Vec<String>,
}

fn parse_document(input: &str, what: &str) -> CatalogResult<Value> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::InvalidInput {
            message: format!("{what} is empty"),
        });
    }
    Ok(serde_json::from_str(trimmed)?)
}

fn items(value: &Value) -> CatalogResult<&Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(obj) => obj
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| CatalogError::InvalidInput {
                message: "json object must carry an 'items' array".to_string(),
            }),
        _ => Err(CatalogError::InvalidInput {
            message: "json must be an array of fields or an object with 'items'".to_string(),
        }),
    }
}

fn as_object(item_num: usize, item: &Value) -> CatalogResult<&Map<String, Value>> {
    item.as_object().ok_or_else(|| CatalogError::InvalidInput {
        message: format!("item {item_num} is not a json object"),
    })
}

/// `key` from `attributes` when present, otherwise from the item itself.
fn attr<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get("attributes")
        .and_then(|a| a.get(key))
        .or_else(|| obj.get(key))
        .and_then(Value::as_str)
}

fn required<'a>(item_num: usize, obj: &'a Map<String, Value>, key: &str) -> CatalogResult<&'a str> {
    attr(obj, key).ok_or_else(|| CatalogError::InvalidInput {
        message: format!("item {item_num} missing required string '{key}'"),
    })
}

fn standard_field(item_num: usize, item: &Value) -> CatalogResult<FieldDescriptor> {
    let obj = as_object(item_num, item)?;
    let id = required(item_num, obj, "id")?;
    let data_type = required(item_num, obj, "dataType")?;
    let kind_raw = required(item_num, obj, "type")?;
    let kind = FieldKind::parse(kind_raw).ok_or_else(|| CatalogError::InvalidInput {
        message: format!("item {item_num} ('{id}') has unknown type '{kind_raw}'"),
    })?;
    let status = attr(obj, "status").map(FieldStatus::parse).unwrap_or_default();

    Ok(FieldDescriptor::new(id, PrimitiveType::parse(data_type), kind).with_status(status))
}

fn custom_field(item_num: usize, item: &Value) -> CatalogResult<CustomField> {
    let obj = as_object(item_num, item)?;
    let id = required(item_num, obj, "id")?;
    let kind_tag = CustomFieldKind::parse(required(item_num, obj, "kind")?);

    let type_attr = attr(obj, "type");
    let declared_kind = type_attr.and_then(FieldKind::parse);
    let kind = declared_kind.unwrap_or(match kind_tag {
        CustomFieldKind::Metric => FieldKind::Metric,
        _ => FieldKind::Dimension,
    });

    let data_type = attr(obj, "dataType").or(if declared_kind.is_none() { type_attr } else { None });
    let primitive_type = match (data_type, &kind_tag) {
        (Some(raw), _) => PrimitiveType::parse(raw),
        (None, CustomFieldKind::Metric) => {
            return Err(CatalogError::InvalidInput {
                message: format!("item {item_num} ('{id}') is a custom metric without a data type"),
            });
        }
        (None, _) => PrimitiveType::String,
    };

    // Custom fields carry `active: false` instead of a status tag.
    let status = match obj.get("active").and_then(Value::as_bool) {
        Some(false) => FieldStatus::Deprecated,
        _ => attr(obj, "status").map(FieldStatus::parse).unwrap_or_default(),
    };

    Ok(CustomField::new(
        FieldDescriptor::new(id, primitive_type, kind).with_status(status),
        kind_tag,
    ))
}
