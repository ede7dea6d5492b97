//! Predicate matching: which triples feed which property.

use crate::convert;
use crate::descriptor::{PropertyKind, PropertyMeta};
use crate::prefix::PrefixTable;
use crate::term::{Literal, Node, Triple};

/// Select the triples that belong to `property`.
///
/// A triple matches when its predicate, expanded with `prefixes`, equals the
/// property's predicate IRI and its object fits the property kind:
/// associations need an IRI object, scalar kinds need a literal that passes
/// the language filter and the target type's probe. Everything else is dropped
/// here, so an incompatible object shows up later as a cardinality error that
/// names the subject and property.
///
/// Single-valued scalars then keep only the best language tier, see
/// [`convert::prefer_language`].
pub fn match_property<'t>(
    property: &PropertyMeta,
    prefixes: &PrefixTable,
    default_language: Option<&str>,
    triples: &'t [Triple],
) -> Vec<&'t Triple> {
    let matched: Vec<&Triple> = triples
        .iter()
        .filter(|t| prefixes.expand(&t.predicate) == property.predicate())
        .filter(|t| match (property.kind(), &t.object) {
            (PropertyKind::Association, object) => object.is_iri(),
            (PropertyKind::Scalar | PropertyKind::ScalarCollection, Node::Literal(lit)) => {
                convert::can_convert(lit, property, default_language)
            }
            (PropertyKind::Scalar | PropertyKind::ScalarCollection, _) => false,
        })
        .collect();

    if property.kind() != PropertyKind::Scalar || matched.len() < 2 {
        return matched;
    }
    let literals: Vec<&Literal> = matched.iter().copied().filter_map(|t| t.object.as_literal()).collect();
    let kept = convert::prefer_language(literals, property.language().or(default_language));
    matched
        .into_iter()
        .filter(|t| t.object.as_literal().is_some_and(|l| kept.iter().any(|k| std::ptr::eq(*k, l))))
        .collect()
}
