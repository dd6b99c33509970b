//! Premade report definitions and selection checks against a generated catalog.

use std::fmt;

use crate::types::{local_name, Catalog};

use super::exclusion::mutually_excluded;

/// A named field selection users commonly start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PremadeReport {
    pub name: &'static str,
    pub metrics: &'static [&'static str],
    pub dimensions: &'static [&'static str],
    /// Dimensions selected by default; a subset of `dimensions`.
    pub default_dimensions: &'static [&'static str],
}

impl PremadeReport {
    /// Metrics followed by dimensions.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> {
        self.metrics.iter().chain(self.dimensions.iter()).copied()
    }

    /// Metrics followed by the default dimensions.
    pub fn default_fields(&self) -> impl Iterator<Item = &'static str> {
        self.metrics.iter().chain(self.default_dimensions.iter()).copied()
    }
}

pub const PREMADE_REPORTS: &[PremadeReport] = &[
    PremadeReport {
        name: "audience_overview",
        metrics: &[
            "users",
            "newUsers",
            "sessions",
            "sessionsPerUser",
            "pageviews",
            "pageviewsPerSession",
            "avgSessionDuration",
            "bounceRate",
        ],
        dimensions: &[
            "date",
            "language",
            "country",
            "city",
            "browser",
            "operatingSystem",
            "screenResolution",
            "year",
            "month",
            "hour",
        ],
        default_dimensions: &["date"],
    },
    PremadeReport {
        name: "audience_geo_location",
        metrics: &["users", "newUsers", "sessions", "pageviewsPerSession", "avgSessionDuration", "bounceRate"],
        dimensions: &["date", "year", "month", "hour", "country", "city", "continent", "subContinent"],
        default_dimensions: &["date", "country", "city", "continent", "subContinent"],
    },
    PremadeReport {
        name: "audience_technology",
        metrics: &["users", "newUsers", "sessions", "pageviewsPerSession", "avgSessionDuration", "bounceRate"],
        dimensions: &[
            "date",
            "year",
            "month",
            "hour",
            "browser",
            "operatingSystem",
            "screenResolution",
            "screenColors",
            "flashVersion",
            "javaEnabled",
            "hostname",
        ],
        default_dimensions: &["date", "browser", "operatingSystem"],
    },
    PremadeReport {
        name: "acquisition_overview",
        metrics: &["sessions", "pageviewsPerSession", "avgSessionDuration", "bounceRate"],
        dimensions: &[
            "acquisitionMedium",
            "acquisitionSource",
            "acquisitionSourceMedium",
            "acquisitionTrafficChannel",
        ],
        default_dimensions: &[
            "acquisitionTrafficChannel",
            "acquisitionSource",
            "acquisitionSourceMedium",
            "acquisitionMedium",
        ],
    },
    PremadeReport {
        name: "behavior_overview",
        metrics: &["pageviews", "uniquePageviews", "avgTimeOnPage", "bounceRate", "exitRate", "exits"],
        dimensions: &["date", "year", "month", "hour", "pagePath", "pageTitle", "searchKeyword", "eventCategory"],
        default_dimensions: &["date", "pagePath", "pageTitle", "searchKeyword"],
    },
    PremadeReport {
        name: "ecommerce_overview",
        metrics: &["transactions"],
        dimensions: &["transactionId", "campaign", "source", "medium", "keyword", "socialNetwork"],
        default_dimensions: &["transactionId", "campaign", "source", "medium", "keyword", "socialNetwork"],
    },
];

/// Look up a premade report by name.
pub fn premade_report(name: &str) -> Option<&'static PremadeReport> {
    PREMADE_REPORTS.iter().find(|r| r.name == name)
}

/// A problem with a requested field selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionIssue {
    /// The name matches no catalog property.
    UnknownField { field: String },
    /// Two selected fields cannot be requested together.
    Conflict { first: String, second: String },
}

impl fmt::Display for SelectionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownField { field } => write!(f, "unknown field '{field}'"),
            Self::Conflict { first, second } => write!(f, "'{first}' cannot be combined with '{second}'"),
        }
    }
}

/// Resolve `name` to a catalog identifier: an exact match first, then a match on the local name
/// (`users` -> `ga:users`).
fn find_identifier<'a>(catalog: &'a Catalog, name: &str) -> Option<&'a str> {
    if let Some((id, _)) = catalog.metadata.records.get_key_value(name) {
        return Some(id.as_str());
    }
    catalog
        .metadata
        .records
        .keys()
        .map(String::as_str)
        .find(|id| local_name(id) == name)
}

/// Check that every name in `fields` is in `catalog` and that no two of them exclude each other.
///
/// Issues are reported in selection order; an empty result means the selection can be requested
/// as one query.
pub fn check_selection<'a>(catalog: &Catalog, fields: impl IntoIterator<Item = &'a str>) -> Vec<SelectionIssue> {
    let mut issues = Vec::new();
    let mut resolved: Vec<&str> = Vec::new();

    for name in fields {
        match find_identifier(catalog, name) {
            Some(id) if !resolved.contains(&id) => resolved.push(id),
            Some(_) => {}
            None => issues.push(SelectionIssue::UnknownField {
                field: name.to_string(),
            }),
        }
    }

    for (i, first) in resolved.iter().enumerate() {
        for second in &resolved[i + 1..] {
            let exclusions_of = |id: &str| catalog.metadata.get(id).map(|rec| &rec.field_exclusions);
            if mutually_excluded(exclusions_of, first, second) {
                issues.push(SelectionIssue::Conflict {
                    first: first.to_string(),
                    second: second.to_string(),
                });
            }
        }
    }

    issues
}

/// [`check_selection`] over a premade report's metrics and default dimensions.
pub fn check_report(catalog: &Catalog, report: &PremadeReport) -> Vec<SelectionIssue> {
    check_selection(catalog, report.default_fields())
}
