//! N-Triples / Turtle parsing with Sophia into the core term model.
//!
//! Sophia hands us terms that we print and read back (its display form is
//! N-Triples), which keeps the core crate free of any Sophia types.

use std::io::{BufReader, Cursor};
use std::path::Path;

use sophia::api::source::TripleSource as _;
use sophia::api::triple::Triple as _;
use sparqlmap_core::vocab::xsd;
use sparqlmap_core::{InMemoryGraph, Literal, Node, TransportError, Triple};

/// Serializations understood by the parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    NTriples,
    Turtle,
}

impl RdfFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::NTriples => "N-Triples",
            Self::Turtle => "Turtle",
        }
    }

    /// Guess from a file extension (`nt`, `ntriples`, `ttl`, `turtle`).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "nt" | "ntriples" => Some(Self::NTriples),
            "ttl" | "turtle" => Some(Self::Turtle),
            _ => None,
        }
    }

    /// Guess from an HTTP `Content-Type` value.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "application/n-triples" | "text/plain" => Some(Self::NTriples),
            "text/turtle" | "application/x-turtle" => Some(Self::Turtle),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct SinkError(String);

/// Parse a whole document. Triples with a blank-node subject are kept; their
/// subject is the `_:label` form.
pub fn parse_triples(bytes: &[u8], format: RdfFormat) -> Result<Vec<Triple>, TransportError> {
    let reader = BufReader::new(Cursor::new(bytes));
    let mut out = Vec::new();
    let mut sink = |subject: String, predicate: String, object: String| -> Result<(), SinkError> {
        let subject = match parse_term(&subject)? {
            Node::Iri(iri) => iri,
            Node::BlankNode(label) => format!("_:{label}"),
            Node::Literal(_) => return Err(SinkError(format!("literal in subject position: {subject}"))),
        };
        let Node::Iri(predicate) = parse_term(&predicate)? else {
            return Err(SinkError(format!("predicate is not an IRI: {predicate}")));
        };
        out.push(Triple::new(subject, predicate, parse_term(&object)?));
        Ok(())
    };

    let parse_error = |message: String| TransportError::Parse {
        format: format.name(),
        message,
    };
    match format {
        RdfFormat::NTriples => sophia::turtle::parser::nt::parse_bufread(reader)
            .try_for_each_triple(|t| sink(t.s().to_string(), t.p().to_string(), t.o().to_string()))
            .map_err(|e| parse_error(e.to_string()))?,
        RdfFormat::Turtle => sophia::turtle::parser::turtle::parse_bufread(reader)
            .try_for_each_triple(|t| sink(t.s().to_string(), t.p().to_string(), t.o().to_string()))
            .map_err(|e| parse_error(e.to_string()))?,
    }
    Ok(out)
}

/// Parse a document into a fresh [`InMemoryGraph`].
pub fn graph_from_str(text: &str, format: RdfFormat) -> Result<InMemoryGraph, TransportError> {
    Ok(parse_triples(text.as_bytes(), format)?.into_iter().collect())
}

/// Read a `.nt` / `.ttl` file into an [`InMemoryGraph`].
pub fn graph_from_file(path: &Path) -> Result<InMemoryGraph, TransportError> {
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    let format = RdfFormat::from_extension(ext).ok_or_else(|| TransportError::Parse {
        format: "RDF",
        message: format!("unsupported RDF file extension .{ext} ({})", path.display()),
    })?;
    let bytes = std::fs::read(path)?;
    Ok(parse_triples(&bytes, format)?.into_iter().collect())
}

/// Read one term in N-Triples display form.
fn parse_term(text: &str) -> Result<Node, SinkError> {
    let s = text.trim();
    if let Some(iri) = s.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        return Ok(Node::iri(iri));
    }
    if let Some(label) = s.strip_prefix("_:") {
        return Ok(Node::BlankNode(label.to_string()));
    }
    if s.starts_with('"') {
        return parse_literal(s).map(Node::Literal);
    }
    Err(SinkError(format!("unsupported RDF term: {s}")))
}

fn parse_literal(s: &str) -> Result<Literal, SinkError> {
    let body = &s[1..];
    let mut escaped = false;
    let close = body
        .char_indices()
        .find(|&(_, c)| {
            let closes = c == '"' && !escaped;
            escaped = c == '\\' && !escaped;
            closes
        })
        .map(|(i, _)| i)
        .ok_or_else(|| SinkError(format!("unterminated literal: {s}")))?;

    let lexical = unescape(&body[..close])?;
    let suffix = body[close + 1..].trim();
    if let Some(lang) = suffix.strip_prefix('@') {
        return Ok(Literal::lang(lexical, lang));
    }
    match suffix.strip_prefix("^^") {
        Some(dt) => {
            let dt = dt.trim();
            let dt = dt.strip_prefix('<').and_then(|t| t.strip_suffix('>')).unwrap_or(dt);
            if dt == xsd::STRING {
                Ok(Literal::plain(lexical))
            } else {
                Ok(Literal::typed(lexical, dt))
            }
        }
        None => Ok(Literal::plain(lexical)),
    }
}

fn unescape(raw: &str) -> Result<String, SinkError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let decoded = match chars.next() {
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('b') => '\u{8}',
            Some('f') => '\u{c}',
            Some('"') => '"',
            Some('\'') => '\'',
            Some('\\') => '\\',
            Some(u @ ('u' | 'U')) => {
                let width = if u == 'u' { 4 } else { 8 };
                let hex: String = chars.by_ref().take(width).collect();
                u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| SinkError(format!("invalid \\{u} escape {hex:?}")))?
            }
            Some(other) => return Err(SinkError(format!("invalid escape \\{other}"))),
            None => return Err(SinkError("dangling backslash in literal".to_string())),
        };
        out.push(decoded);
    }
    Ok(out)
}
