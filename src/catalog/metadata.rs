//! Metadata writer.

use std::collections::BTreeSet;

use crate::types::{FieldDescriptor, Inclusion, Metadata, MetadataRecord};

/// Record `descriptor` as an available field with `exclusions`, addressed by its identifier.
///
/// Any existing record for the identifier is replaced, so writing the same arguments twice leaves
/// the metadata unchanged.
pub fn write(mut metadata: Metadata, descriptor: &FieldDescriptor, exclusions: &BTreeSet<String>) -> Metadata {
    metadata.records.insert(
        descriptor.identifier.clone(),
        MetadataRecord {
            inclusion: Inclusion::Available,
            field_exclusions: exclusions.clone(),
            behavior: Some(descriptor.kind),
        },
    );
    metadata
}
