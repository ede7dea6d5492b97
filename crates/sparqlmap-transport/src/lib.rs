//! Triple sources for sparqlmap.
//!
//! - [`parse`]: N-Triples / Turtle documents (via Sophia) loaded into an
//!   [`InMemoryGraph`](sparqlmap_core::InMemoryGraph).
//! - [`sparql`] (feature `http`): a remote SPARQL endpoint queried with
//!   `CONSTRUCT { <s> ?p ?o } WHERE { <s> ?p ?o }`.

pub mod parse;
#[cfg(feature = "http")]
pub mod sparql;

pub use parse::{graph_from_file, graph_from_str, parse_triples, RdfFormat};
#[cfg(feature = "http")]
pub use sparql::{construct_query, SparqlEndpoint};
