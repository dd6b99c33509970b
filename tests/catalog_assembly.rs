use std::collections::BTreeSet;
use std::sync::Mutex;

use field_catalog::catalog::{
    assemble, check_report, check_selection, premade_report, CatalogAssembler, CatalogOptions, ConfiguredSlots,
    ExclusionIndex, FieldDiscovery, NoDiscovery, PlaceholderTemplate, ProfileContext, SelectionIssue, TypeOverrides,
    TypeResolver,
};
use field_catalog::execution::ExecutionOptions;
use field_catalog::ingestion::json;
use field_catalog::types::{
    Catalog, CustomField, CustomFieldKind, FieldDescriptor, FieldKind, FieldStatus, Inclusion, PrimitiveType,
    SchemaFormat, SchemaKind, PRIMARY_KEY,
};
use field_catalog::{CatalogError, DiscoveryError};

fn fixture_inputs() -> (Vec<FieldDescriptor>, Vec<CustomField>, ExclusionIndex) {
    let standard = json::standard_fields_from_path("tests/fixtures/standard_fields.json").unwrap();
    let custom = json::custom_fields_from_path("tests/fixtures/custom_fields.json").unwrap();
    let index = json::exclusion_index_from_path("tests/fixtures/exclusions.json").unwrap();
    (standard, custom, index)
}

fn fixture_catalog() -> Catalog {
    let (standard, custom, index) = fixture_inputs();
    assemble(&standard, &custom, &index, &ConfiguredSlots::for_template("ga:goalXXCompletions", [1, 2])).unwrap()
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn declared_types_map_to_nullable_schema_kinds() {
    let standard = vec![
        FieldDescriptor::new("ga:c", PrimitiveType::Currency, FieldKind::Metric),
        FieldDescriptor::new("ga:p", PrimitiveType::Percent, FieldKind::Metric),
        FieldDescriptor::new("ga:t", PrimitiveType::Time, FieldKind::Metric),
        FieldDescriptor::new("ga:i", PrimitiveType::Integer, FieldKind::Metric),
        FieldDescriptor::new("ga:f", PrimitiveType::Float, FieldKind::Metric),
        FieldDescriptor::new("ga:s", PrimitiveType::String, FieldKind::Dimension),
    ];
    let index = ExclusionIndex::build(standard.iter().map(|f| (f.identifier.clone(), Vec::<String>::new())));

    let catalog = assemble(&standard, &[], &index, &NoDiscovery).unwrap();

    let expected = [
        ("ga:c", SchemaKind::Number),
        ("ga:p", SchemaKind::Number),
        ("ga:t", SchemaKind::String),
        ("ga:i", SchemaKind::Integer),
        ("ga:f", SchemaKind::Number),
        ("ga:s", SchemaKind::String),
    ];
    for (id, kind) in expected {
        let prop = catalog.schema.get(id).unwrap();
        assert_eq!(prop.kind, kind, "{id}");
        assert!(prop.nullable, "{id}");
        assert_eq!(prop.format, None, "{id}");
    }
}

#[test]
fn fixture_catalog_has_expected_properties() {
    let catalog = fixture_catalog();

    let ids: Vec<&str> = catalog.schema.identifiers().collect();
    assert_eq!(
        ids,
        vec![
            PRIMARY_KEY,
            "ga:bounceRate",
            "ga:country",
            "ga:dateHour",
            "ga:dimension1",
            "ga:goal1Completions",
            "ga:goal2Completions",
            "ga:latitude",
            "ga:metric2",
            "ga:productCategoryLevel1",
            "ga:productCategoryLevel2",
            "ga:productCategoryLevel3",
            "ga:revenuePerUser",
            "ga:sessions",
            "ga:users",
            "ga:visitCount",
        ]
    );

    // Schema and metadata always describe the same set of identifiers.
    let meta_ids: Vec<&str> = catalog.metadata.records.keys().map(String::as_str).collect();
    assert_eq!(ids, meta_ids);
}

#[test]
fn overrides_correct_declared_types() {
    let catalog = fixture_catalog();

    let date_hour = catalog.schema.get("ga:dateHour").unwrap();
    assert_eq!(date_hour.kind, SchemaKind::String);
    assert_eq!(date_hour.format, Some(SchemaFormat::DateTime));

    assert_eq!(catalog.schema.get("ga:visitCount").unwrap().kind, SchemaKind::Integer);
    assert_eq!(catalog.schema.get("ga:latitude").unwrap().kind, SchemaKind::Number);
}

#[test]
fn empty_overrides_follow_declared_types_only() {
    let (standard, custom, index) = fixture_inputs();
    let assembler = CatalogAssembler::new(TypeResolver::new(TypeOverrides::empty()), CatalogOptions::default());
    let catalog = assembler
        .assemble(&standard, &custom, &index, &ConfiguredSlots::for_template("ga:goalXXCompletions", [1]))
        .unwrap();

    let date_hour = catalog.schema.get("ga:dateHour").unwrap();
    assert_eq!(date_hour.kind, SchemaKind::String);
    assert_eq!(date_hour.format, None);
    assert_eq!(catalog.schema.get("ga:visitCount").unwrap().kind, SchemaKind::String);
}

#[test]
fn primary_key_is_always_present() {
    let catalog = assemble(&[], &[], &ExclusionIndex::default(), &NoDiscovery).unwrap();

    assert_eq!(catalog.schema.len(), 1);
    assert_eq!(catalog.metadata.len(), 1);
    let pk = catalog.schema.get(PRIMARY_KEY).unwrap();
    assert_eq!(pk.kind, SchemaKind::String);
    assert!(!pk.nullable);
    let record = catalog.metadata.get(PRIMARY_KEY).unwrap();
    assert_eq!(record.inclusion, Inclusion::Automatic);
    assert_eq!(record.behavior, None);
    assert_eq!(catalog.key_properties, vec![PRIMARY_KEY.to_string()]);
}

#[test]
fn static_template_expands_to_index_members_with_own_exclusions() {
    let catalog = fixture_catalog();

    assert!(!catalog.schema.contains("ga:productCategoryLevelXX"));
    for level in 1..=3 {
        let id = format!("ga:productCategoryLevel{level}");
        assert_eq!(catalog.schema.get(&id).unwrap().kind, SchemaKind::String);
        assert_eq!(catalog.metadata.get(&id).unwrap().behavior, Some(FieldKind::Dimension));
    }
    assert_eq!(
        catalog.metadata.get("ga:productCategoryLevel1").unwrap().field_exclusions,
        set(&["ga:productCategoryLevel2"])
    );
    assert!(catalog.metadata.get("ga:productCategoryLevel3").unwrap().field_exclusions.is_empty());
}

#[test]
fn dynamic_template_members_share_template_exclusions() {
    let catalog = fixture_catalog();

    assert!(!catalog.schema.contains("ga:goalXXCompletions"));
    for id in ["ga:goal1Completions", "ga:goal2Completions"] {
        assert_eq!(catalog.schema.get(id).unwrap().kind, SchemaKind::Integer);
        let record = catalog.metadata.get(id).unwrap();
        assert_eq!(record.field_exclusions, set(&["ga:visitCount"]));
        assert_eq!(record.behavior, Some(FieldKind::Metric));
        assert_eq!(record.inclusion, Inclusion::Available);
    }
}

#[test]
fn dynamic_template_with_no_configured_slots_contributes_nothing() {
    let (standard, custom, index) = fixture_inputs();
    let catalog = assemble(&standard, &custom, &index, &ConfiguredSlots::default()).unwrap();
    assert!(!catalog.schema.identifiers().any(|id| id.starts_with("ga:goal")));
}

#[test]
fn unresolved_and_deprecated_fields_are_absent() {
    let catalog = fixture_catalog();

    assert!(!catalog.schema.identifiers().any(|id| id.contains("searchGoal")));
    assert!(!catalog.schema.contains("ga:socialActivityUserHandle"));
    assert!(!catalog.metadata.contains("ga:socialActivityUserHandle"));
    assert!(!catalog.schema.contains("ga:dimension3"));
}

#[test]
fn custom_fields_use_shared_custom_exclusions() {
    let catalog = fixture_catalog();

    let dim = catalog.metadata.get("ga:dimension1").unwrap();
    assert_eq!(dim.field_exclusions, set(&["ga:visitCount"]));
    assert_eq!(dim.behavior, Some(FieldKind::Dimension));
    assert_eq!(catalog.schema.get("ga:dimension1").unwrap().kind, SchemaKind::String);

    let metric = catalog.metadata.get("ga:metric2").unwrap();
    assert!(metric.field_exclusions.is_empty());
    assert_eq!(metric.behavior, Some(FieldKind::Metric));
    assert_eq!(catalog.schema.get("ga:metric2").unwrap().kind, SchemaKind::Integer);
}

#[test]
fn unknown_primitive_type_fails_the_run() {
    let standard = vec![
        FieldDescriptor::new("ga:users", PrimitiveType::Integer, FieldKind::Metric),
        FieldDescriptor::new("ga:isMobile", PrimitiveType::parse("BOOLEAN"), FieldKind::Dimension),
    ];
    let index = ExclusionIndex::build([("ga:users", Vec::<&str>::new()), ("ga:isMobile", vec![])]);

    let err = assemble(&standard, &[], &index, &NoDiscovery).unwrap_err();
    match err {
        CatalogError::UnknownPrimitiveType { field, primitive_type } => {
            assert_eq!(field, "ga:isMobile");
            assert_eq!(primitive_type, "BOOLEAN");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn unknown_primitive_type_wins_over_missing_index_entry() {
    let standard = vec![FieldDescriptor::new(
        "ga:isMobile",
        PrimitiveType::parse("BOOLEAN"),
        FieldKind::Dimension,
    )];
    let err = assemble(&standard, &[], &ExclusionIndex::default(), &NoDiscovery).unwrap_err();
    assert!(matches!(err, CatalogError::UnknownPrimitiveType { ref field, .. } if field == "ga:isMobile"));

    let custom = vec![CustomField::new(
        FieldDescriptor::new("ga:metric4", PrimitiveType::parse("BOOLEAN"), FieldKind::Metric),
        CustomFieldKind::Metric,
    )];
    let err = assemble(&[], &custom, &ExclusionIndex::default(), &NoDiscovery).unwrap_err();
    assert!(matches!(err, CatalogError::UnknownPrimitiveType { ref field, .. } if field == "ga:metric4"));
}

#[test]
fn concrete_field_without_index_entry_fails_the_run() {
    let standard = vec![FieldDescriptor::new("ga:users", PrimitiveType::Integer, FieldKind::Metric)];
    let err = assemble(&standard, &[], &ExclusionIndex::default(), &NoDiscovery).unwrap_err();
    assert!(matches!(err, CatalogError::MissingExclusions { ref field, .. } if field == "ga:users"));
}

#[test]
fn unrecognized_custom_kind_fails_the_run() {
    let custom = vec![CustomField::new(
        FieldDescriptor::new("ga:thing1", PrimitiveType::String, FieldKind::Dimension),
        CustomFieldKind::parse("analytics#customThing"),
    )];
    let index = ExclusionIndex::build([("ga:dimensionXX", Vec::<&str>::new()), ("ga:metricXX", vec![])]);

    let err = assemble(&[], &custom, &index, &NoDiscovery).unwrap_err();
    assert!(matches!(err, CatalogError::UnknownCustomFieldKind { .. }));
}

#[test]
fn discovery_failure_propagates_and_no_catalog_is_produced() {
    let (standard, custom, index) = fixture_inputs();
    let failing = |_: &ProfileContext, _: &PlaceholderTemplate| -> Result<Vec<String>, DiscoveryError> {
        Err(DiscoveryError::Unauthorized {
            message: "token expired".to_string(),
        })
    };

    let err = assemble(&standard, &custom, &index, &failing).unwrap_err();
    match err {
        CatalogError::Discovery { template, source } => {
            assert_eq!(template, "ga:goalXXCompletions");
            assert!(matches!(source, DiscoveryError::Unauthorized { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn no_discovery_rejects_dynamic_templates() {
    let (standard, custom, index) = fixture_inputs();
    let err = assemble(&standard, &custom, &index, &NoDiscovery).unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Discovery {
            source: DiscoveryError::UnknownTemplate { .. },
            ..
        }
    ));
}

struct ProfileRecorder {
    seen: Mutex<Vec<ProfileContext>>,
}

impl FieldDiscovery for ProfileRecorder {
    fn discover(&self, profile: &ProfileContext, template: &PlaceholderTemplate) -> Result<Vec<String>, DiscoveryError> {
        self.seen.lock().unwrap().push(profile.clone());
        Ok(vec![template.substitute(5), template.substitute(5)])
    }
}

#[test]
fn discovery_receives_configured_profile_and_duplicates_are_dropped() {
    let (standard, custom, index) = fixture_inputs();
    let discovery = ProfileRecorder { seen: Mutex::new(Vec::new()) };
    let options = CatalogOptions {
        profile: ProfileContext::new("1234", "UA-1234-1", "98765"),
        ..Default::default()
    };

    let catalog = CatalogAssembler::new(TypeResolver::default(), options)
        .assemble(&standard, &custom, &index, &discovery)
        .unwrap();

    assert!(catalog.schema.contains("ga:goal5Completions"));
    let seen = discovery.seen.lock().unwrap().clone();
    assert_eq!(seen, vec![ProfileContext::new("1234", "UA-1234-1", "98765")]);
}

#[test]
fn configured_slots_expand_only_their_own_template() {
    let standard = vec![
        FieldDescriptor::new("ga:goalXXCompletions", PrimitiveType::Integer, FieldKind::Metric),
        FieldDescriptor::new("ga:dimensionXX", PrimitiveType::String, FieldKind::Dimension),
    ];
    let custom = vec![CustomField::new(
        FieldDescriptor::new("ga:dimension1", PrimitiveType::String, FieldKind::Dimension),
        CustomFieldKind::Dimension,
    )];
    let index = ExclusionIndex::build([
        ("ga:goalXXCompletions", Vec::<&str>::new()),
        ("ga:dimensionXX", vec![]),
        ("ga:metricXX", vec![]),
    ]);

    let discovery = ConfiguredSlots::for_template("ga:goalXXCompletions", [17]);
    let catalog = assemble(&standard, &custom, &index, &discovery).unwrap();

    let ids: Vec<&str> = catalog.schema.identifiers().collect();
    assert_eq!(ids, vec![PRIMARY_KEY, "ga:dimension1", "ga:goal17Completions"]);
    assert!(!catalog.metadata.contains("ga:dimension17"));
}

#[test]
fn assembly_is_idempotent() {
    assert_eq!(fixture_catalog(), fixture_catalog());
}

#[test]
fn parallel_expansion_matches_sequential() {
    let (standard, custom, index) = fixture_inputs();
    let discovery = ConfiguredSlots::for_template("ga:goalXXCompletions", [1, 2, 17]);

    let sequential = assemble(&standard, &custom, &index, &discovery).unwrap();
    let options = CatalogOptions {
        execution: Some(ExecutionOptions {
            num_threads: Some(4),
            max_in_flight_discoveries: 1,
        }),
        ..Default::default()
    };
    let parallel = CatalogAssembler::new(TypeResolver::default(), options)
        .assemble(&standard, &custom, &index, &discovery)
        .unwrap();

    assert_eq!(sequential, parallel);
}

#[test]
fn deprecated_status_is_read_from_field_lists() {
    let (standard, custom, _) = fixture_inputs();
    assert_eq!(standard.iter().filter(|f| f.status == FieldStatus::Deprecated).count(), 1);
    assert_eq!(custom.iter().filter(|f| f.descriptor.is_deprecated()).count(), 1);
}

#[test]
fn catalog_renders_as_stream_document() {
    let catalog = fixture_catalog();
    let doc = catalog.to_json_value();

    let stream = &doc["streams"][0];
    assert_eq!(stream["stream"], "report");
    assert_eq!(stream["key_properties"][0], PRIMARY_KEY);
    assert_eq!(stream["schema"]["properties"]["ga:users"]["type"][0], "integer");
    assert_eq!(stream["schema"]["properties"]["ga:users"]["type"][1], "null");
    assert_eq!(stream["schema"]["properties"]["ga:dateHour"]["format"], "date-time");
    assert_eq!(stream["schema"]["properties"][PRIMARY_KEY]["type"], "string");

    let metadata = stream["metadata"].as_array().unwrap();
    assert_eq!(metadata.len(), catalog.metadata.len() + 1);
    assert_eq!(metadata[0]["metadata"]["table-key-properties"][0], PRIMARY_KEY);

    let visit_count = metadata
        .iter()
        .find(|m| m["breadcrumb"][1] == "ga:visitCount")
        .unwrap();
    assert_eq!(visit_count["metadata"]["inclusion"], "available");
    assert_eq!(visit_count["metadata"]["behavior"], "DIMENSION");
    assert_eq!(visit_count["metadata"]["fieldExclusions"][0], "ga:country");
}

#[test]
fn selection_checks_report_conflicts_and_unknown_fields() {
    let catalog = fixture_catalog();

    let issues = check_selection(&catalog, ["users", "ga:country", "visitCount", "nope"]);
    assert_eq!(
        issues,
        vec![
            SelectionIssue::UnknownField {
                field: "nope".to_string()
            },
            SelectionIssue::Conflict {
                first: "ga:country".to_string(),
                second: "ga:visitCount".to_string(),
            },
        ]
    );

    assert!(check_selection(&catalog, ["users", "sessions", "dateHour"]).is_empty());
}

#[test]
fn premade_report_against_small_catalog_lists_missing_fields() {
    let catalog = fixture_catalog();
    let report = premade_report("ecommerce_overview").unwrap();

    let issues = check_report(&catalog, report);
    assert!(issues.contains(&SelectionIssue::UnknownField {
        field: "transactions".to_string()
    }));
    assert!(issues.iter().all(|i| matches!(i, SelectionIssue::UnknownField { .. })));
}
