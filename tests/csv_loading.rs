use std::io::Write;

use field_catalog::ingestion::csv::{standard_fields_from_path, type_overrides_from_path};
use field_catalog::types::{FieldKind, PrimitiveType};
use field_catalog::CatalogError;

#[test]
fn standard_fields_from_fixture() {
    let fields = standard_fields_from_path("tests/fixtures/standard_fields.csv").unwrap();

    assert_eq!(fields.len(), 4);
    assert_eq!(fields[1].identifier, "ga:dateHour");
    assert_eq!(fields[1].kind, FieldKind::Dimension);
    assert_eq!(fields[1].primitive_type, PrimitiveType::String);
    assert!(!fields[2].is_deprecated());
    assert!(fields[3].is_deprecated());
}

#[test]
fn standard_fields_without_status_column() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "type,dataType,id").unwrap();
    writeln!(file, "METRIC,CURRENCY,ga:revenuePerUser").unwrap();
    writeln!(file, "DIMENSION,BOOLEAN,ga:isMobile").unwrap();

    let fields = standard_fields_from_path(file.path()).unwrap();
    assert_eq!(fields[0].primitive_type, PrimitiveType::Currency);
    assert_eq!(fields[1].primitive_type, PrimitiveType::Other("BOOLEAN".to_string()));
    assert!(fields.iter().all(|f| !f.is_deprecated()));
}

#[test]
fn unknown_kind_reports_row_number() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "id,type,dataType").unwrap();
    writeln!(file, "ga:users,METRIC,INTEGER").unwrap();
    writeln!(file, "ga:sessions,COUNTER,INTEGER").unwrap();

    let err = standard_fields_from_path(file.path()).unwrap_err();
    match err {
        CatalogError::InvalidInput { message } => {
            assert!(message.contains("row 3"), "{message}");
            assert!(message.contains("COUNTER"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn missing_file_is_io_error() {
    let err = standard_fields_from_path("tests/fixtures/does_not_exist.csv").unwrap_err();
    match err {
        CatalogError::Csv(e) => assert!(matches!(e.kind(), csv::ErrorKind::Io(_))),
        CatalogError::Io(_) => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn type_overrides_from_fixture() {
    let overrides = type_overrides_from_path("tests/fixtures/overrides.csv").unwrap();
    assert!(overrides.integer.contains("country"));
    assert!(overrides.float.contains("users"));
    assert!(overrides.date_time.is_empty());
}

#[test]
fn type_overrides_reject_unknown_resolution() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "field,resolution").unwrap();
    writeln!(file, "isMobile,boolean").unwrap();

    let err = type_overrides_from_path(file.path()).unwrap_err();
    assert!(err.to_string().contains("boolean"));
}
