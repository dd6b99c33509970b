//! Placeholder classification and expansion.
//!
//! Some vendor identifiers are templates: `ga:goalXXCompletions`, `ga:contentGroupXX`. The `XX`
//! token stands for a one- or two-digit slot number. A template is expanded one of two ways:
//!
//! - **static**: the index has no key for the template itself but does have numbered keys that
//!   fit it (`ga:contentGroup1` .. `ga:contentGroup5`). Those keys are the members, each with its
//!   own exclusion set.
//! - **dynamic**: the index has a key for the template itself. The members depend on the
//!   profile's configuration and come from a [`FieldDiscovery`] collaborator; they all share the
//!   template's exclusion set.
//!
//! Templates that fit neither rule are left unresolved and reported, never guessed at.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use regex::Regex;

use crate::error::{CatalogError, CatalogResult};
use crate::types::FieldDescriptor;

use super::discovery::{FieldDiscovery, ProfileContext};
use super::exclusion::ExclusionIndex;

/// Token marking the numbered slot in a template identifier.
pub const PLACEHOLDER_TOKEN: &str = "XX";

/// Why a placeholder identifier could not be expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// Neither the template nor any numbered form of it is in the exclusion index.
    NoIndexEntries,
    /// The identifier carries the token more than once.
    MultipleTokens,
    /// The slot matcher could not be built.
    InvalidPattern(String),
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoIndexEntries => f.write_str("no static or dynamic entries in the exclusion index"),
            Self::MultipleTokens => write!(f, "more than one '{PLACEHOLDER_TOKEN}' token"),
            Self::InvalidPattern(msg) => write!(f, "invalid slot pattern: {msg}"),
        }
    }
}

/// Matches identifiers produced by substituting a one- or two-digit number for the token.
#[derive(Debug, Clone)]
struct SlotMatcher {
    prefix: String,
    suffix: String,
    regex: Regex,
}

impl SlotMatcher {
    fn new(prefix: &str, suffix: &str) -> Result<Self, regex::Error> {
        let pattern = format!(r"^{}\d{{1,2}}{}$", regex::escape(prefix), regex::escape(suffix));
        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            regex: Regex::new(&pattern)?,
        })
    }

    fn is_match(&self, identifier: &str) -> bool {
        self.regex.is_match(identifier)
    }

    fn substitute(&self, slot: u32) -> String {
        format!("{}{slot}{}", self.prefix, self.suffix)
    }
}

/// A field descriptor whose identifier contains exactly one placeholder token.
#[derive(Debug, Clone)]
pub struct PlaceholderTemplate {
    descriptor: FieldDescriptor,
    matcher: SlotMatcher,
}

impl PlaceholderTemplate {
    /// Placeholder-form identifier, e.g. `ga:goalXXCompletions`.
    pub fn identifier(&self) -> &str {
        &self.descriptor.identifier
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    /// Whether `identifier` is a numbered member of this template.
    pub fn matches(&self, identifier: &str) -> bool {
        self.matcher.is_match(identifier)
    }

    /// The identifier for slot `slot` (`goalXXCompletions`, 7 -> `goal7Completions`).
    pub fn substitute(&self, slot: u32) -> String {
        self.matcher.substitute(slot)
    }
}

/// Result of inspecting a descriptor for the placeholder token.
#[derive(Debug, Clone)]
pub enum Placeholder {
    /// An ordinary concrete identifier.
    Concrete,
    /// A well-formed template.
    Template(PlaceholderTemplate),
    /// Carries the token but cannot be treated as a template.
    Malformed(UnresolvedReason),
}

/// Inspect `descriptor` for the placeholder token.
pub fn detect(descriptor: &FieldDescriptor) -> Placeholder {
    let id = &descriptor.identifier;
    match id.matches(PLACEHOLDER_TOKEN).count() {
        0 => Placeholder::Concrete,
        1 => {
            let Some((prefix, suffix)) = id.split_once(PLACEHOLDER_TOKEN) else {
                return Placeholder::Concrete;
            };
            match SlotMatcher::new(prefix, suffix) {
                Ok(matcher) => Placeholder::Template(PlaceholderTemplate {
                    descriptor: descriptor.clone(),
                    matcher,
                }),
                Err(e) => Placeholder::Malformed(UnresolvedReason::InvalidPattern(e.to_string())),
            }
        }
        _ => Placeholder::Malformed(UnresolvedReason::MultipleTokens),
    }
}

/// Expansion strategy for a template against a fixed index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Static,
    Dynamic,
    Unresolved,
}

/// Decide how `template` expands against `index`. Exactly one variant holds.
pub fn classify(template: &PlaceholderTemplate, index: &ExclusionIndex) -> Classification {
    if index.contains(template.identifier()) {
        Classification::Dynamic
    } else if index.identifiers().any(|id| template.matches(id)) {
        Classification::Static
    } else {
        Classification::Unresolved
    }
}

/// One concrete field synthesized from a template, with the exclusion set it is recorded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedField {
    pub descriptor: FieldDescriptor,
    pub exclusions: BTreeSet<String>,
}

/// Outcome of expanding one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub classification: Classification,
    /// Concrete members, in index order (static) or discovery order (dynamic). Empty when
    /// unresolved.
    pub fields: Vec<ExpandedField>,
}

/// Members of a static template: every index key that fits the slot pattern, each with its own
/// exclusion set.
pub fn expand_static(template: &PlaceholderTemplate, index: &ExclusionIndex) -> Vec<ExpandedField> {
    index
        .iter()
        .filter(|(id, _)| template.matches(id))
        .map(|(id, exclusions)| ExpandedField {
            descriptor: template.descriptor().with_identifier(id),
            exclusions: exclusions.clone(),
        })
        .collect()
}

/// Members of a dynamic template, as reported by `discovery` for `profile`.
///
/// Every member shares the exclusion set stored under the template's own identifier. Discovery
/// failures propagate unchanged inside [`CatalogError::Discovery`]; duplicate identifiers from
/// the collaborator are dropped after their first occurrence.
pub fn expand_dynamic(
    template: &PlaceholderTemplate,
    index: &ExclusionIndex,
    discovery: &dyn FieldDiscovery,
    profile: &ProfileContext,
) -> CatalogResult<Vec<ExpandedField>> {
    let shared = index
        .get(template.identifier())
        .ok_or_else(|| CatalogError::MissingExclusions {
            field: template.identifier().to_string(),
            key: template.identifier().to_string(),
        })?;

    let discovered = discovery
        .discover(profile, template)
        .map_err(|source| CatalogError::Discovery {
            template: template.identifier().to_string(),
            source,
        })?;

    let mut seen = HashSet::with_capacity(discovered.len());
    Ok(discovered
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .map(|id| ExpandedField {
            descriptor: template.descriptor().with_identifier(id),
            exclusions: shared.clone(),
        })
        .collect())
}

/// Classify `template` and expand it with the matching strategy.
pub fn expand(
    template: &PlaceholderTemplate,
    index: &ExclusionIndex,
    discovery: &dyn FieldDiscovery,
    profile: &ProfileContext,
) -> CatalogResult<Expansion> {
    let classification = classify(template, index);
    let fields = match classification {
        Classification::Static => expand_static(template, index),
        Classification::Dynamic => expand_dynamic(template, index, discovery, profile)?,
        Classification::Unresolved => Vec::new(),
    };
    Ok(Expansion { classification, fields })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::discovery::{ConfiguredSlots, NoDiscovery};
    use crate::error::DiscoveryError;
    use crate::types::{FieldKind, PrimitiveType};

    fn template(id: &str) -> PlaceholderTemplate {
        match detect(&FieldDescriptor::new(id, PrimitiveType::Integer, FieldKind::Metric)) {
            Placeholder::Template(t) => t,
            other => panic!("expected template, got {other:?}"),
        }
    }

    fn index() -> ExclusionIndex {
        ExclusionIndex::build([
            ("ga:contentGroup1", vec!["ga:a"]),
            ("ga:contentGroup2", vec!["ga:b"]),
            ("ga:contentGroup15", vec!["ga:c"]),
            ("ga:contentGroup123", vec![]),
            ("ga:contentGroupUniqueViews1", vec![]),
            ("ga:landingContentGroup1", vec![]),
            ("ga:goalXXCompletions", vec!["ga:x", "ga:y"]),
            ("ga:users", vec![]),
        ])
    }

    #[test]
    fn detect_distinguishes_concrete_templates_and_malformed() {
        let d = |id: &str| FieldDescriptor::new(id, PrimitiveType::String, FieldKind::Dimension);
        assert!(matches!(detect(&d("ga:users")), Placeholder::Concrete));
        assert!(matches!(detect(&d("ga:contentGroupXX")), Placeholder::Template(_)));
        assert!(matches!(
            detect(&d("ga:goalXXStepXX")),
            Placeholder::Malformed(UnresolvedReason::MultipleTokens)
        ));
    }

    #[test]
    fn slot_pattern_only_accepts_one_or_two_digits() {
        let t = template("ga:contentGroupXX");
        assert!(t.matches("ga:contentGroup1"));
        assert!(t.matches("ga:contentGroup15"));
        assert!(!t.matches("ga:contentGroup123"));
        assert!(!t.matches("ga:contentGroup"));
        assert!(!t.matches("ga:contentGroupUniqueViews1"));
        assert!(!t.matches("ga:landingContentGroup1"));
        assert!(!t.matches("ga:contentGroup1x"));
    }

    #[test]
    fn pattern_treats_identifier_text_literally() {
        let t = template("ga:a.bXX");
        assert!(t.matches("ga:a.b3"));
        assert!(!t.matches("ga:aXb3"));
    }

    #[test]
    fn classification_is_exclusive() {
        let idx = index();
        assert_eq!(classify(&template("ga:contentGroupXX"), &idx), Classification::Static);
        assert_eq!(classify(&template("ga:goalXXCompletions"), &idx), Classification::Dynamic);
        assert_eq!(classify(&template("ga:searchGoalXXConversionRate"), &idx), Classification::Unresolved);
    }

    #[test]
    fn static_expansion_uses_each_members_own_exclusions() {
        let fields = expand_static(&template("ga:contentGroupXX"), &index());
        let ids: Vec<_> = fields.iter().map(|f| f.descriptor.identifier.as_str()).collect();
        assert_eq!(ids, vec!["ga:contentGroup1", "ga:contentGroup15", "ga:contentGroup2"]);
        assert_eq!(fields[0].exclusions, BTreeSet::from(["ga:a".to_string()]));
        assert_eq!(fields[1].exclusions, BTreeSet::from(["ga:c".to_string()]));
        assert!(fields.iter().all(|f| f.descriptor.primitive_type == PrimitiveType::Integer));
    }

    #[test]
    fn dynamic_expansion_shares_template_exclusions() {
        let t = template("ga:goalXXCompletions");
        let goals = ConfiguredSlots::for_template("ga:goalXXCompletions", [1, 17, 1]);
        let fields = expand_dynamic(&t, &index(), &goals, &ProfileContext::default()).unwrap();
        let ids: Vec<_> = fields.iter().map(|f| f.descriptor.identifier.as_str()).collect();
        assert_eq!(ids, vec!["ga:goal1Completions", "ga:goal17Completions"]);
        for f in &fields {
            assert_eq!(f.exclusions, index().get("ga:goalXXCompletions").cloned().unwrap());
        }
    }

    #[test]
    fn dynamic_discovery_errors_propagate() {
        let t = template("ga:goalXXCompletions");
        let err = expand(&t, &index(), &NoDiscovery, &ProfileContext::default()).unwrap_err();
        match err {
            CatalogError::Discovery { template, source } => {
                assert_eq!(template, "ga:goalXXCompletions");
                assert!(matches!(source, DiscoveryError::UnknownTemplate { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unresolved_expansion_is_empty() {
        let t = template("ga:searchGoalXXConversionRate");
        let out = expand(&t, &index(), &NoDiscovery, &ProfileContext::default()).unwrap();
        assert_eq!(out.classification, Classification::Unresolved);
        assert!(out.fields.is_empty());
    }
}
