//! sparqlmap: typed, lazily materialized entities over RDF.
//!
//! A Rust type declares which predicates feed which fields ([`RdfEntity`]).
//! [`SparqlTemplate::load`] hands back an unloaded [`LazyEntity`]; the first
//! access fetches all triples of the subject once, matches them to the
//! declared properties and converts the literals:
//!
//! - **Scalar** properties need exactly one matching literal.
//! - **Scalar collections** gather every matching literal into a set
//!   (duplicates collapse).
//! - **Associations** need exactly one IRI object and become new, unloaded
//!   handles. Nothing is fetched for them until the caller navigates there.
//!
//! Any failure aborts the whole load and leaves the handle unloaded.
//!
//! Transports live behind [`TripleSource`]: [`InMemoryGraph`] here, and the
//! Turtle/N-Triples loaders and the SPARQL endpoint in `sparqlmap-transport`.

pub mod config;
pub mod convert;
pub mod descriptor;
pub mod error;
pub mod lazy;
pub mod loader;
pub mod mapping;
pub mod materialize;
pub mod matcher;
pub mod prefix;
pub mod source;
pub mod template;
pub mod term;
pub mod vocab;

pub use config::TemplateConfig;
pub use convert::FromLiteral;
pub use descriptor::{
    prop, Cardinality, DescriptorBuilder, EntityDescriptor, PropertyKind, PropertyMeta,
    PropertySpec, RdfEntity,
};
pub use error::{ConfigError, MappingError, Result, TransportError};
pub use lazy::{LazyEntity, LoadState};
pub use loader::ValueSet;
pub use mapping::MappingContext;
pub use materialize::Materializer;
pub use prefix::PrefixTable;
pub use source::{CountingSource, InMemoryGraph, TripleSource};
pub use template::SparqlTemplate;
pub use term::{Literal, Node, Triple};
