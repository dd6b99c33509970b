//! Catalog assembly: standard + custom fields -> one schema and one metadata collection.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{CatalogError, CatalogResult};
use crate::execution::{ExecutionObserver, ExecutionOptions, ExpansionEngine};
use crate::ingestion::observability::{
    severity_for_error, CatalogContext, CatalogObserver, CatalogSeverity, CatalogStats, CatalogWarning,
    SkipReason,
};
use crate::types::{
    Catalog, CatalogSchema, CustomField, CustomFieldKind, FieldDescriptor, Metadata, DEFAULT_STREAM, PRIMARY_KEY,
};

use super::discovery::{FieldDiscovery, ProfileContext};
use super::exclusion::ExclusionIndex;
use super::metadata;
use super::placeholder::{self, Classification, Expansion, Placeholder, PlaceholderTemplate, UnresolvedReason};
use super::resolve::TypeResolver;

/// Index key holding the exclusion policy shared by all custom dimensions.
pub const CUSTOM_DIMENSION_KEY: &str = "ga:dimensionXX";

/// Index key holding the exclusion policy shared by all custom metrics.
pub const CUSTOM_METRIC_KEY: &str = "ga:metricXX";

/// Options controlling catalog assembly.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct CatalogOptions {
    /// Stream name written into the catalog.
    pub stream: String,
    /// Account/profile handed to the discovery collaborator.
    pub profile: ProfileContext,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn CatalogObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: CatalogSeverity,
    /// If set, templates are expanded in parallel with these options; otherwise sequentially.
    pub execution: Option<ExecutionOptions>,
    /// Observer for the parallel engine's events. Ignored for sequential runs.
    pub execution_observer: Option<Arc<dyn ExecutionObserver>>,
}

impl fmt::Debug for CatalogOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogOptions")
            .field("stream", &self.stream)
            .field("profile", &self.profile)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .field("execution", &self.execution)
            .field("execution_observer_set", &self.execution_observer.is_some())
            .finish()
    }
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            stream: DEFAULT_STREAM.to_string(),
            profile: ProfileContext::default(),
            observer: None,
            alert_at_or_above: CatalogSeverity::Critical,
            execution: None,
            execution_observer: None,
        }
    }
}

impl CatalogOptions {
    /// Observer context for a run with these options.
    pub fn context(&self) -> CatalogContext {
        CatalogContext {
            stream: self.stream.clone(),
            profile: self.profile.clone(),
        }
    }

    /// Report `error` as a failure, and as an alert when it meets the threshold.
    pub(crate) fn notify_failure(&self, ctx: &CatalogContext, error: &CatalogError) {
        if let Some(obs) = self.observer.as_ref() {
            let sev = severity_for_error(error);
            obs.on_failure(ctx, sev, error);
            if sev >= self.alert_at_or_above {
                obs.on_alert(ctx, sev, error);
            }
        }
    }
}

/// Index key whose exclusion set applies to a custom field of this kind.
pub fn custom_exclusion_key(field: &CustomField) -> CatalogResult<&'static str> {
    match &field.kind_tag {
        CustomFieldKind::Dimension => Ok(CUSTOM_DIMENSION_KEY),
        CustomFieldKind::Metric => Ok(CUSTOM_METRIC_KEY),
        CustomFieldKind::Unrecognized(kind) => Err(CatalogError::UnknownCustomFieldKind {
            field: field.descriptor.identifier.clone(),
            kind: kind.clone(),
        }),
    }
}

/// Exclusion set stored under `key` for `field`.
fn lookup<'i>(index: &'i ExclusionIndex, field: &str, key: &str) -> CatalogResult<&'i BTreeSet<String>> {
    index.get(key).ok_or_else(|| CatalogError::MissingExclusions {
        field: field.to_string(),
        key: key.to_string(),
    })
}

/// Builds catalogs with a fixed type resolver and options.
#[derive(Debug, Clone, Default)]
pub struct CatalogAssembler {
    resolver: TypeResolver,
    options: CatalogOptions,
}

enum Planned<'a> {
    Concrete(&'a FieldDescriptor),
    Template(usize),
}

/// Running schema/metadata pair plus counters. Only turned into a [`Catalog`] once every field
/// has been folded in.
struct Fold {
    schema: CatalogSchema,
    metadata: Metadata,
    stats: CatalogStats,
}

impl Fold {
    fn new() -> Self {
        Self {
            schema: CatalogSchema::with_primary_key(),
            metadata: Metadata::with_primary_key(),
            stats: CatalogStats::default(),
        }
    }

    /// Resolve the type first, then look up the exclusions, so an unknown type is reported even
    /// for a field the index does not know.
    fn add<'i>(
        &mut self,
        resolver: &TypeResolver,
        descriptor: &FieldDescriptor,
        exclusions: impl FnOnce() -> CatalogResult<&'i BTreeSet<String>>,
    ) -> CatalogResult<()> {
        let property = resolver.resolve(&descriptor.primitive_type, &descriptor.identifier)?;
        let exclusions = exclusions()?;
        self.schema.properties.insert(descriptor.identifier.clone(), property);
        self.metadata = metadata::write(std::mem::take(&mut self.metadata), descriptor, exclusions);
        Ok(())
    }
}

impl CatalogAssembler {
    pub fn new(resolver: TypeResolver, options: CatalogOptions) -> Self {
        Self { resolver, options }
    }

    pub fn resolver(&self) -> &TypeResolver {
        &self.resolver
    }

    pub fn options(&self) -> &CatalogOptions {
        &self.options
    }

    /// Assemble a catalog from the standard and custom field lists.
    ///
    /// - Deprecated fields are skipped and reported through `on_skip`.
    /// - Placeholder templates are expanded statically or through `discovery`; templates that
    ///   cannot be expanded are reported through `on_warning` and skipped.
    /// - Every other standard field uses the exclusion entry under its own identifier; custom
    ///   fields use the entry under [`CUSTOM_DIMENSION_KEY`] or [`CUSTOM_METRIC_KEY`].
    ///
    /// The result is all-or-nothing: any error from type resolution, the index, or discovery
    /// aborts the run and no catalog is returned. When an observer is configured it receives
    /// `on_success` with stats, or `on_failure` (and `on_alert` at or above the threshold).
    pub fn assemble(
        &self,
        standard: &[FieldDescriptor],
        custom: &[CustomField],
        index: &ExclusionIndex,
        discovery: &dyn FieldDiscovery,
    ) -> CatalogResult<Catalog> {
        let ctx = self.options.context();
        let result = self.assemble_inner(&ctx, standard, custom, index, discovery);

        match &result {
            Ok((_, stats)) => {
                if let Some(obs) = self.options.observer.as_ref() {
                    obs.on_success(&ctx, *stats);
                }
            }
            Err(e) => self.options.notify_failure(&ctx, e),
        }

        result.map(|(catalog, _)| catalog)
    }

    fn assemble_inner(
        &self,
        ctx: &CatalogContext,
        standard: &[FieldDescriptor],
        custom: &[CustomField],
        index: &ExclusionIndex,
        discovery: &dyn FieldDiscovery,
    ) -> CatalogResult<(Catalog, CatalogStats)> {
        let mut fold = Fold::new();
        let mut plan = Vec::with_capacity(standard.len());
        let mut templates: Vec<PlaceholderTemplate> = Vec::new();

        for field in standard {
            if field.is_deprecated() {
                self.skip(ctx, field, &mut fold.stats);
                continue;
            }
            match placeholder::detect(field) {
                Placeholder::Concrete => plan.push(Planned::Concrete(field)),
                Placeholder::Template(t) => {
                    plan.push(Planned::Template(templates.len()));
                    templates.push(t);
                }
                Placeholder::Malformed(reason) => self.unresolved(ctx, field, reason, &mut fold.stats),
            }
        }

        let expansions = self.expand_templates(&templates, index, discovery)?;

        for item in plan {
            match item {
                Planned::Concrete(field) => {
                    fold.add(&self.resolver, field, || lookup(index, &field.identifier, &field.identifier))?;
                }
                Planned::Template(i) => {
                    let expansion = &expansions[i];
                    if expansion.classification == Classification::Unresolved {
                        self.unresolved(
                            ctx,
                            templates[i].descriptor(),
                            UnresolvedReason::NoIndexEntries,
                            &mut fold.stats,
                        );
                        continue;
                    }
                    for expanded in &expansion.fields {
                        fold.add(&self.resolver, &expanded.descriptor, || Ok(&expanded.exclusions))?;
                        fold.stats.expanded_fields += 1;
                    }
                }
            }
        }

        for field in custom {
            if field.descriptor.is_deprecated() {
                self.skip(ctx, &field.descriptor, &mut fold.stats);
                continue;
            }
            fold.add(&self.resolver, &field.descriptor, || {
                lookup(index, &field.descriptor.identifier, custom_exclusion_key(field)?)
            })?;
        }

        let Fold {
            schema,
            metadata,
            mut stats,
        } = fold;
        stats.properties = schema.len();
        stats.metadata_records = metadata.len();

        let catalog = Catalog {
            stream: self.options.stream.clone(),
            key_properties: vec![PRIMARY_KEY.to_string()],
            schema,
            metadata,
        };
        Ok((catalog, stats))
    }

    fn expand_templates(
        &self,
        templates: &[PlaceholderTemplate],
        index: &ExclusionIndex,
        discovery: &dyn FieldDiscovery,
    ) -> CatalogResult<Vec<Expansion>> {
        let profile = &self.options.profile;
        match &self.options.execution {
            None => templates
                .iter()
                .map(|t| placeholder::expand(t, index, discovery, profile))
                .collect(),
            Some(opts) => {
                let mut engine = ExpansionEngine::new(opts.clone())?;
                if let Some(obs) = &self.options.execution_observer {
                    engine = engine.with_observer(Arc::clone(obs));
                }
                engine.expand_all(templates, index, discovery, profile)
            }
        }
    }

    fn skip(&self, ctx: &CatalogContext, field: &FieldDescriptor, stats: &mut CatalogStats) {
        stats.skipped_deprecated += 1;
        if let Some(obs) = &self.options.observer {
            obs.on_skip(ctx, field, SkipReason::Deprecated);
        }
    }

    fn unresolved(
        &self,
        ctx: &CatalogContext,
        field: &FieldDescriptor,
        reason: UnresolvedReason,
        stats: &mut CatalogStats,
    ) {
        stats.unresolved_placeholders += 1;
        if let Some(obs) = &self.options.observer {
            obs.on_warning(
                ctx,
                &CatalogWarning::UnresolvedPlaceholder {
                    field: field.identifier.clone(),
                    reason,
                },
            );
        }
    }
}

/// Assemble a catalog with the built-in type overrides and default options.
pub fn assemble(
    standard: &[FieldDescriptor],
    custom: &[CustomField],
    index: &ExclusionIndex,
    discovery: &dyn FieldDiscovery,
) -> CatalogResult<Catalog> {
    CatalogAssembler::default().assemble(standard, custom, index, discovery)
}
