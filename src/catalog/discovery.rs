//! Dynamic discovery: enumerating numbered fields that depend on a profile's configuration.
//!
//! The core never talks to the vendor itself. Whatever knows the profile (an API client, a
//! cached configuration dump, a test stub) implements [`FieldDiscovery`].

use std::collections::BTreeMap;

use crate::error::DiscoveryError;

use super::placeholder::PlaceholderTemplate;

/// The account/profile a generation run is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileContext {
    pub account_id: String,
    pub web_property_id: String,
    pub profile_id: String,
}

impl ProfileContext {
    pub fn new(
        account_id: impl Into<String>,
        web_property_id: impl Into<String>,
        profile_id: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            web_property_id: web_property_id.into(),
            profile_id: profile_id.into(),
        }
    }
}

/// Returns the concrete identifiers currently valid for a dynamic placeholder template.
///
/// Implementations own their deadlines; the core neither retries nor times out.
pub trait FieldDiscovery: Send + Sync {
    fn discover(
        &self,
        profile: &ProfileContext,
        template: &PlaceholderTemplate,
    ) -> Result<Vec<String>, DiscoveryError>;
}

impl<F> FieldDiscovery for F
where
    F: Fn(&ProfileContext, &PlaceholderTemplate) -> Result<Vec<String>, DiscoveryError> + Send + Sync,
{
    fn discover(
        &self,
        profile: &ProfileContext,
        template: &PlaceholderTemplate,
    ) -> Result<Vec<String>, DiscoveryError> {
        self(profile, template)
    }
}

/// Discovery from slot numbers configured per template (e.g. a profile's goal ids).
///
/// Slots need not be contiguous; a profile may define goals 1, 2 and 17 only. A template with no
/// configured slots has no members, so unrelated dynamic templates (`ga:dimensionXX`) never pick
/// up another template's numbers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfiguredSlots {
    slots: BTreeMap<String, Vec<u32>>,
}

impl ConfiguredSlots {
    /// Slots for a single template, keyed by its placeholder-form identifier.
    pub fn for_template(template: impl Into<String>, slots: impl IntoIterator<Item = u32>) -> Self {
        Self::default().with(template, slots)
    }

    /// Builder-style: add (or replace) the slots of `template`.
    pub fn with(mut self, template: impl Into<String>, slots: impl IntoIterator<Item = u32>) -> Self {
        self.slots.insert(template.into(), slots.into_iter().collect());
        self
    }

    /// Slots configured for `template`; empty when none are.
    pub fn slots(&self, template: &str) -> &[u32] {
        self.slots.get(template).map(Vec::as_slice).unwrap_or_default()
    }
}

impl FieldDiscovery for ConfiguredSlots {
    fn discover(
        &self,
        _profile: &ProfileContext,
        template: &PlaceholderTemplate,
    ) -> Result<Vec<String>, DiscoveryError> {
        Ok(self
            .slots(template.identifier())
            .iter()
            .map(|slot| template.substitute(*slot))
            .collect())
    }
}

/// A collaborator that knows no templates. Any dynamic template fails assembly.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiscovery;

impl FieldDiscovery for NoDiscovery {
    fn discover(
        &self,
        _profile: &ProfileContext,
        template: &PlaceholderTemplate,
    ) -> Result<Vec<String>, DiscoveryError> {
        Err(DiscoveryError::UnknownTemplate {
            template: template.identifier().to_string(),
        })
    }
}
