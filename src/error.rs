use thiserror::Error;

/// Convenience result type for catalog generation.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Error type returned by catalog generation and input loading.
///
/// Assembly either completes or fails with one of these; a partially populated catalog is never
/// returned.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON document.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed CSV document.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A field declares a primitive type with no resolution rule.
    #[error("unknown primitive type '{primitive_type}' for field '{field}'")]
    UnknownPrimitiveType { field: String, primitive_type: String },

    /// A custom field's kind tag is neither the custom-dimension nor the custom-metric tag.
    #[error("unknown custom field kind '{kind}' for field '{field}'")]
    UnknownCustomFieldKind { field: String, kind: String },

    /// The exclusion index has no entry under the key a field needs.
    #[error("no exclusion entry '{key}' for field '{field}'")]
    MissingExclusions { field: String, key: String },

    /// The dynamic discovery collaborator failed for a placeholder template.
    #[error("discovery failed for '{template}': {source}")]
    Discovery {
        template: String,
        #[source]
        source: DiscoveryError,
    },

    /// An input document does not have the expected shape.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// The parallel expansion engine could not be set up.
    #[error("execution error: {message}")]
    Execution { message: String },
}

/// Error returned by a [`crate::catalog::discovery::FieldDiscovery`] collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    /// Network or protocol failure talking to the vendor.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// Credentials were rejected or lack access to the profile.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// The collaborator gave up waiting for the vendor.
    #[error("timed out")]
    Timeout,

    /// The collaborator does not know how to enumerate this template.
    #[error("no discovery source for template '{template}'")]
    UnknownTemplate { template: String },
}
