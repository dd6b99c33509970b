//! CSV loaders for field lists and override tables.

use std::path::Path;

use crate::catalog::resolve::{OverrideKind, TypeOverrides};
use crate::error::{CatalogError, CatalogResult};
use crate::types::{FieldDescriptor, FieldKind, FieldStatus, PrimitiveType};

const FIELD_COLUMNS: [&str; 3] = ["id", "type", "dataType"];
const OVERRIDE_COLUMNS: [&str; 2] = ["field", "resolution"];

/// Load standard field descriptors from a CSV file.
///
/// Rules:
///
/// - CSV must have headers.
/// - Headers must contain `id`, `type` and `dataType` (order can differ); `status` is optional.
/// - A blank `status` means the field is active.
pub fn standard_fields_from_path(path: impl AsRef<Path>) -> CatalogResult<Vec<FieldDescriptor>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    standard_fields_from_reader(&mut rdr)
}

/// Load standard field descriptors from an existing CSV reader.
pub fn standard_fields_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
) -> CatalogResult<Vec<FieldDescriptor>> {
    let headers = rdr.headers()?.clone();
    let [id_idx, type_idx, data_type_idx] = column_indexes(&headers, FIELD_COLUMNS)?;
    let status_idx = headers.iter().position(|h| h == "status");

    let mut fields = Vec::new();
    for (row_idx0, result) in rdr.records().enumerate() {
        // Header is row 1.
        let user_row = row_idx0 + 2;
        let record = result?;

        let id = required_cell(&record, id_idx, user_row, "id")?;
        let kind_raw = required_cell(&record, type_idx, user_row, "type")?;
        let data_type = required_cell(&record, data_type_idx, user_row, "dataType")?;
        let kind = FieldKind::parse(kind_raw).ok_or_else(|| CatalogError::InvalidInput {
            message: format!("row {user_row} ('{id}') has unknown type '{kind_raw}'"),
        })?;
        let status = status_idx
            .and_then(|idx| record.get(idx))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(FieldStatus::parse)
            .unwrap_or_default();

        fields.push(FieldDescriptor::new(id, PrimitiveType::parse(data_type), kind).with_status(status));
    }

    Ok(fields)
}

/// Load override tables from a CSV file with `field,resolution` columns.
///
/// `resolution` is one of `date-time`, `integer` or `float`.
pub fn type_overrides_from_path(path: impl AsRef<Path>) -> CatalogResult<TypeOverrides> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    type_overrides_from_reader(&mut rdr)
}

/// Load override tables from an existing CSV reader.
pub fn type_overrides_from_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> CatalogResult<TypeOverrides> {
    let headers = rdr.headers()?.clone();
    let [field_idx, resolution_idx] = column_indexes(&headers, OVERRIDE_COLUMNS)?;

    let mut overrides = TypeOverrides::empty();
    for (row_idx0, result) in rdr.records().enumerate() {
        let user_row = row_idx0 + 2;
        let record = result?;

        let field = required_cell(&record, field_idx, user_row, "field")?;
        let raw = required_cell(&record, resolution_idx, user_row, "resolution")?;
        let kind = OverrideKind::parse(raw).ok_or_else(|| CatalogError::InvalidInput {
            message: format!("row {user_row} has unknown resolution '{raw}' (expected date-time, integer or float)"),
        })?;
        overrides.insert(field, kind);
    }

    Ok(overrides)
}

fn column_indexes<const N: usize>(headers: &csv::StringRecord, columns: [&str; N]) -> CatalogResult<[usize; N]> {
    let mut idxs = [0usize; N];
    for (slot, column) in idxs.iter_mut().zip(columns) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == column)
            .ok_or_else(|| CatalogError::InvalidInput {
                message: format!(
                    "missing required column '{column}'. headers={:?}",
                    headers.iter().collect::<Vec<_>>()
                ),
            })?;
    }
    Ok(idxs)
}

fn required_cell<'a>(
    record: &'a csv::StringRecord,
    idx: usize,
    row: usize,
    column: &str,
) -> CatalogResult<&'a str> {
    let value = record.get(idx).unwrap_or("").trim();
    if value.is_empty() {
        return Err(CatalogError::InvalidInput {
            message: format!("row {row} has an empty '{column}'"),
        });
    }
    Ok(value)
}
