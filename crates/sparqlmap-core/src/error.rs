//! Error taxonomy for entity materialization.

use thiserror::Error;

use crate::term::Node;

/// Errors raised while describing, fetching or materializing an entity.
///
/// Every variant aborts the enclosing materialization run as a whole. Nothing is
/// retried or masked inside this crate.
#[derive(Debug, Error)]
pub enum MappingError {
    /// A single-valued property matched zero or several triples.
    #[error(
        "expecting exactly {expected} RDF predicate for IRI {subject} and property {property} \
         with prefix {}, but found {found}",
        .prefix.as_deref().unwrap_or("<none>")
    )]
    Cardinality {
        subject: String,
        property: String,
        prefix: Option<String>,
        expected: usize,
        found: usize,
    },

    /// The object node kind does not fit the property kind.
    #[error("property {property} expects {expected} object node, but was {} {node}", .node.kind())]
    TypeMismatch {
        property: String,
        expected: &'static str,
        node: Node,
    },

    /// A literal accepted by the convertibility probe failed conversion.
    #[error(
        "cannot convert literal {lexical:?} ({datatype}) of property {property} to {target}: {reason}"
    )]
    Conversion {
        property: String,
        lexical: String,
        datatype: String,
        target: &'static str,
        reason: String,
    },

    /// The triple source failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An entity descriptor declares something this crate cannot load.
    #[error("invalid mapping for entity {entity}: {message}")]
    SchemaConfiguration { entity: String, message: String },
}

impl MappingError {
    pub(crate) fn schema(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaConfiguration {
            entity: entity.into(),
            message: message.into(),
        }
    }
}

/// Failures of a [`crate::TripleSource`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The remote endpoint could not be reached or timed out.
    #[error("request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },

    /// The endpoint answered with a non-success status.
    #[error("endpoint {endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The returned RDF could not be parsed.
    #[error("failed to parse {format}: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other failure of a custom source.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid prefix binding {0:?} (expected name=namespace)")]
    PrefixBinding(String),
}

pub type Result<T, E = MappingError> = std::result::Result<T, E>;
