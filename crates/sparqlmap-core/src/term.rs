//! RDF term model: just enough of RDF 1.1 to describe one subject.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::vocab::{rdf, xsd};

/// A literal object: lexical form, optional datatype IRI, optional language tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    pub lexical: String,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

impl Literal {
    /// A plain literal (`xsd:string`).
    pub fn plain(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    pub fn lang(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }

    /// Datatype IRI with RDF 1.1 defaults applied.
    ///
    /// Language-tagged literals are `rdf:langString`; untyped literals are
    /// `xsd:string`.
    pub fn datatype_iri(&self) -> &str {
        match (&self.datatype, &self.language) {
            (Some(dt), _) => dt.as_str(),
            (None, Some(_)) => rdf::LANG_STRING,
            (None, None) => xsd::STRING,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", escape_lexical(&self.lexical))?;
        if let Some(lang) = &self.language {
            write!(f, "@{lang}")
        } else if let Some(dt) = &self.datatype {
            write!(f, "^^<{dt}>")
        } else {
            Ok(())
        }
    }
}

fn escape_lexical(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

/// An object node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Node {
    Iri(String),
    BlankNode(String),
    Literal(Literal),
}

impl Node {
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Iri(iri.into())
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Self::Iri(_))
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Self::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// Short kind label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Iri(_) => "an IRI",
            Self::BlankNode(_) => "a blank node",
            Self::Literal(_) => "a literal",
        }
    }
}

impl From<Literal> for Node {
    fn from(value: Literal) -> Self {
        Self::Literal(value)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => write!(f, "<{iri}>"),
            Self::BlankNode(id) => write!(f, "_:{id}"),
            Self::Literal(lit) => lit.fmt(f),
        }
    }
}

/// One statement about a subject.
///
/// The predicate is kept as received; sources may hand out prefixed names and
/// the matcher expands them against the entity's prefix table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: Node,
}

impl Triple {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<Node>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

impl fmt::Display for Triple {
    /// N-Triples line (without the trailing newline).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> <{}> {} .", self.subject, self.predicate, self.object)
    }
}
