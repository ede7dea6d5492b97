//! Property loaders: cardinality policy + conversion for matched triples.
//!
//! The matcher already guarantees object kinds, but every loader checks again
//! and reports a type mismatch instead of trusting its caller.

use std::collections::{BTreeSet, HashSet};
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use crate::convert::{self, FromLiteral};
use crate::descriptor::{PropertyMeta, RdfEntity};
use crate::error::{MappingError, Result};
use crate::lazy::LazyEntity;
use crate::materialize::Materializer;
use crate::term::{Literal, Triple};

/// Target of a scalar-collection property. Inserting an equal value twice keeps one.
pub trait ValueSet: Default + Send + 'static {
    type Item: FromLiteral;

    fn insert_value(&mut self, value: Self::Item);
}

impl<T, S> ValueSet for HashSet<T, S>
where
    T: FromLiteral + Eq + Hash,
    S: BuildHasher + Default + Send + 'static,
{
    type Item = T;

    fn insert_value(&mut self, value: T) {
        self.insert(value);
    }
}

impl<T> ValueSet for BTreeSet<T>
where
    T: FromLiteral + Ord,
{
    type Item = T;

    fn insert_value(&mut self, value: T) {
        self.insert(value);
    }
}

fn exactly_one<'t>(subject: &str, property: &PropertyMeta, matched: &[&'t Triple]) -> Result<&'t Triple> {
    match matched {
        [single] => Ok(*single),
        _ => Err(MappingError::Cardinality {
            subject: subject.to_string(),
            property: property.name().to_string(),
            prefix: property.prefix().map(str::to_string),
            expected: 1,
            found: matched.len(),
        }),
    }
}

fn literal_object<'t>(property: &PropertyMeta, triple: &'t Triple) -> Result<&'t Literal> {
    triple.object.as_literal().ok_or_else(|| MappingError::TypeMismatch {
        property: property.name().to_string(),
        expected: "a literal",
        node: triple.object.clone(),
    })
}

/// Exactly one literal, converted to `T`.
pub fn load_scalar<T: FromLiteral>(
    subject: &str,
    property: &PropertyMeta,
    matched: &[&Triple],
) -> Result<T> {
    let triple = exactly_one(subject, property, matched)?;
    let literal = literal_object(property, triple)?;
    convert::convert(literal, property)
}

/// Every matched literal converted and collected; duplicates collapse, zero
/// matches give an empty set.
pub fn load_scalar_set<C: ValueSet>(property: &PropertyMeta, matched: &[&Triple]) -> Result<C> {
    let mut values = C::default();
    for triple in matched {
        let literal = literal_object(property, triple)?;
        values.insert_value(convert::convert::<C::Item>(literal, property)?);
    }
    Ok(values)
}

/// Exactly one IRI object, turned into a new, unloaded handle. Nothing is
/// fetched here.
pub fn load_association<T: RdfEntity>(
    subject: &str,
    property: &PropertyMeta,
    matched: &[&Triple],
    materializer: &Arc<Materializer>,
) -> Result<LazyEntity<T>> {
    let triple = exactly_one(subject, property, matched)?;
    let iri = triple.object.as_iri().ok_or_else(|| MappingError::TypeMismatch {
        property: property.name().to_string(),
        expected: "an IRI",
        node: triple.object.clone(),
    })?;
    materializer.handle::<T>(iri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DescriptorBuilder, EntityDescriptor};
    use crate::mapping::MappingContext;
    use crate::prefix::PrefixTable;
    use crate::source::InMemoryGraph;
    use crate::term::Node;
    use crate::vocab::xsd;

    #[derive(Default)]
    struct Spouse {
        year: i32,
        years: BTreeSet<i32>,
        partner: Option<LazyEntity<Spouse>>,
    }

    impl RdfEntity for Spouse {
        fn describe(b: DescriptorBuilder<Self>) -> DescriptorBuilder<Self> {
            b.prefix("ex", "http://example.org/")
                .scalar(("birthYear", "ex"), |p, v: i32| p.year = v)
                .scalar_set(("yearsMarried", "ex"), |p, v: BTreeSet<i32>| p.years = v)
                .association(("partner", "ex"), |p, v: LazyEntity<Spouse>| p.partner = Some(v))
        }
    }

    fn meta(name: &str) -> PropertyMeta {
        EntityDescriptor::<Spouse>::describe(PrefixTable::with_defaults())
            .unwrap()
            .property(name)
            .unwrap()
            .clone()
    }

    fn year(lexical: &str) -> Triple {
        Triple::new(
            "http://example.org/p",
            "http://example.org/yearsMarried",
            Literal::typed(lexical, xsd::G_YEAR),
        )
    }

    #[test]
    fn scalar_requires_exactly_one() {
        let m = meta("birthYear");
        let t = year("1980");

        assert_eq!(load_scalar::<i32>("ex:p", &m, &[&t]).unwrap(), 1980);

        let err = load_scalar::<i32>("ex:p", &m, &[]).unwrap_err();
        match err {
            MappingError::Cardinality {
                subject,
                property,
                prefix,
                expected,
                found,
            } => {
                assert_eq!(subject, "ex:p");
                assert_eq!(property, "birthYear");
                assert_eq!(prefix.as_deref(), Some("ex"));
                assert_eq!((expected, found), (1, 0));
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = load_scalar::<i32>("ex:p", &m, &[&t, &t]).unwrap_err();
        assert!(matches!(err, MappingError::Cardinality { found: 2, .. }));
    }

    #[test]
    fn scalar_rejects_iri_object() {
        let m = meta("birthYear");
        let t = Triple::new("ex:p", "ex:birthYear", Node::iri("http://example.org/y"));
        let err = load_scalar::<i32>("ex:p", &m, &[&t]).unwrap_err();
        assert!(matches!(err, MappingError::TypeMismatch { .. }));
    }

    #[test]
    fn scalar_reports_conversion_failure() {
        let m = meta("birthYear");
        let t = year("nineteen-eighty");
        let err = load_scalar::<i32>("ex:p", &m, &[&t]).unwrap_err();
        match err {
            MappingError::Conversion {
                property, target, ..
            } => {
                assert_eq!(property, "birthYear");
                assert_eq!(target, "i32");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn set_collapses_duplicates() {
        let m = meta("yearsMarried");
        let (a, b, c) = (year("1996"), year("1996"), year("1999"));
        let set: BTreeSet<i32> = load_scalar_set(&m, &[&a, &b, &c]).unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1996, 1999]);

        let empty: HashSet<i32> = load_scalar_set(&m, &[]).unwrap();
        assert!(empty.is_empty());
    }

    fn materializer() -> Arc<Materializer> {
        Arc::new(Materializer::new(
            Arc::new(InMemoryGraph::new()),
            MappingContext::new(PrefixTable::with_defaults()),
            None,
        ))
    }

    fn partner(object: impl Into<Node>) -> Triple {
        Triple::new("http://example.org/p", "http://example.org/partner", object)
    }

    #[test]
    fn association_yields_unloaded_handle() {
        let m = meta("partner");
        let t = partner(Node::iri("http://example.org/q"));
        let handle = load_association::<Spouse>("ex:p", &m, &[&t], &materializer()).unwrap();
        assert_eq!(handle.iri(), "http://example.org/q");
        assert!(!handle.is_loaded());
    }

    #[test]
    fn association_rejects_non_iri_objects() {
        let m = meta("partner");
        let blank = partner(Node::BlankNode("b0".to_string()));
        let literal = partner(Literal::plain("Brad"));

        for t in [&blank, &literal] {
            let err = load_association::<Spouse>("ex:p", &m, &[t], &materializer()).unwrap_err();
            match &err {
                MappingError::TypeMismatch {
                    property,
                    expected,
                    node,
                } => {
                    assert_eq!(property, "partner");
                    assert_eq!(*expected, "an IRI");
                    assert_eq!(node, &t.object);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        let err = load_association::<Spouse>("ex:p", &m, &[&blank], &materializer()).unwrap_err();
        assert!(err.to_string().ends_with("but was a blank node _:b0"));
    }

    #[test]
    fn association_requires_exactly_one() {
        let m = meta("partner");
        let (a, b) = (
            partner(Node::iri("http://example.org/q")),
            partner(Node::iri("http://example.org/r")),
        );

        let err = load_association::<Spouse>("ex:p", &m, &[&a, &b], &materializer()).unwrap_err();
        match err {
            MappingError::Cardinality {
                property,
                expected,
                found,
                ..
            } => {
                assert_eq!(property, "partner");
                assert_eq!((expected, found), (1, 2));
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = load_association::<Spouse>("ex:p", &m, &[], &materializer()).unwrap_err();
        assert!(matches!(err, MappingError::Cardinality { found: 0, .. }));
    }

    #[test]
    fn set_rejects_iri_object() {
        let m = meta("yearsMarried");
        let (a, b) = (year("1996"), partner(Node::iri("http://example.org/y1999")));
        let err = load_scalar_set::<BTreeSet<i32>>(&m, &[&a, &b]).unwrap_err();
        assert!(matches!(
            err,
            MappingError::TypeMismatch { expected: "a literal", .. }
        ));
    }
}
