//! Entity descriptors: the per-type mapping from Rust fields to RDF predicates.
//!
//! A descriptor is built once per type (see [`crate::MappingContext`]) and is
//! immutable afterwards. Each property carries a typed setter closure captured
//! at build time, so materialization never needs reflection or late casts:
//!
//! ```ignore
//! impl RdfEntity for Person {
//!     fn describe(b: DescriptorBuilder<Self>) -> DescriptorBuilder<Self> {
//!         b.prefix("ex", "http://example.org/")
//!             .scalar(("birthName", "ex"), |p, v: String| p.birth_name = v)
//!             .scalar_set(("hobby", "ex"), |p, v: HashSet<String>| p.hobby = v)
//!             .association(("citizenship", "ex"), |p, c: LazyEntity<Country>| {
//!                 p.citizenship = Some(c)
//!             })
//!     }
//! }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::convert::FromLiteral;
use crate::error::{MappingError, Result};
use crate::lazy::LazyEntity;
use crate::loader::{self, ValueSet};
use crate::materialize::Materializer;
use crate::prefix::PrefixTable;
use crate::term::{Literal, Triple};

/// A Rust type that can be materialized from RDF.
///
/// Implementations only declare their mapping; construction goes through
/// `Default` followed by the registered setters.
pub trait RdfEntity: Default + Send + Sync + 'static {
    fn describe(builder: DescriptorBuilder<Self>) -> DescriptorBuilder<Self>;

    /// Name used in diagnostics. Defaults to the unqualified type name.
    fn entity_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

/// How a property is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// One literal converted to a scalar.
    Scalar,
    /// Any number of literals collected into a set.
    ScalarCollection,
    /// One IRI resolved lazily to another entity.
    Association,
}

impl PropertyKind {
    pub fn cardinality(self) -> Cardinality {
        match self {
            Self::Scalar | Self::Association => Cardinality::ExactlyOne,
            Self::ScalarCollection => Cardinality::ZeroOrMore,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    ExactlyOne,
    ZeroOrMore,
}

/// Declaration of one property, before its predicate has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySpec {
    name: String,
    prefix: Option<String>,
    local: Option<String>,
    iri: Option<String>,
    language: Option<String>,
}

impl PropertySpec {
    /// Property `name` whose predicate is `prefix:name`.
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: Some(prefix.into()),
            local: None,
            iri: None,
            language: None,
        }
    }

    /// Property `name` bound to a fixed predicate IRI. A prefixed name
    /// (`foaf:name`) is expanded against the entity's prefixes at build time.
    pub fn absolute(name: impl Into<String>, iri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            local: None,
            iri: Some(iri.into()),
            language: None,
        }
    }

    /// Use `local` instead of the property name as the predicate's local part.
    pub fn local(mut self, local: impl Into<String>) -> Self {
        self.local = Some(local.into());
        self
    }

    /// Language preference for this property's literals.
    pub fn lang(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Shorthand for [`PropertySpec::new`].
pub fn prop(name: impl Into<String>, prefix: impl Into<String>) -> PropertySpec {
    PropertySpec::new(name, prefix)
}

impl From<(&str, &str)> for PropertySpec {
    fn from((name, prefix): (&str, &str)) -> Self {
        Self::new(name, prefix)
    }
}

/// Resolved, type-independent description of one property.
#[derive(Clone)]
pub struct PropertyMeta {
    name: String,
    prefix: Option<String>,
    predicate: String,
    kind: PropertyKind,
    target: &'static str,
    language: Option<String>,
    probe: fn(&Literal) -> bool,
}

impl PropertyMeta {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Full predicate IRI.
    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    pub fn cardinality(&self) -> Cardinality {
        self.kind.cardinality()
    }

    /// Target scalar or entity type name.
    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Datatype probe of the target type (language is not considered).
    pub fn probe(&self, literal: &Literal) -> bool {
        (self.probe)(literal)
    }
}

impl fmt::Debug for PropertyMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMeta")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("predicate", &self.predicate)
            .field("kind", &self.kind)
            .field("target", &self.target)
            .field("language", &self.language)
            .finish()
    }
}

/// Everything a loader sees for one property of one subject.
pub(crate) struct LoadInput<'a> {
    pub subject: &'a str,
    pub property: &'a PropertyMeta,
    pub matched: &'a [&'a Triple],
    pub materializer: &'a Arc<Materializer>,
}

type LoadFn<E> = Box<dyn Fn(&mut E, &LoadInput<'_>) -> Result<()> + Send + Sync>;

fn never_literal(_: &Literal) -> bool {
    false
}

/// A property plus its typed loader.
pub struct PropertyDescriptor<E> {
    meta: PropertyMeta,
    load: LoadFn<E>,
}

impl<E> PropertyDescriptor<E> {
    pub fn meta(&self) -> &PropertyMeta {
        &self.meta
    }

    pub(crate) fn load(&self, entity: &mut E, input: &LoadInput<'_>) -> Result<()> {
        (self.load)(entity, input)
    }
}

impl<E> fmt::Debug for PropertyDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.meta.fmt(f)
    }
}

/// Immutable mapping schema of one entity type.
pub struct EntityDescriptor<E> {
    name: String,
    prefixes: PrefixTable,
    language: Option<String>,
    properties: Vec<PropertyDescriptor<E>>,
}

impl<E: RdfEntity> EntityDescriptor<E> {
    /// Start a descriptor seeded with the built-in prefixes.
    pub fn builder() -> DescriptorBuilder<E> {
        DescriptorBuilder::new(E::entity_name(), PrefixTable::with_defaults())
    }

    /// Build the descriptor declared by `E::describe`.
    pub fn describe(prefixes: PrefixTable) -> Result<Self> {
        E::describe(DescriptorBuilder::new(E::entity_name(), prefixes)).build()
    }
}

impl<E> EntityDescriptor<E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefixes(&self) -> &PrefixTable {
        &self.prefixes
    }

    /// Entity-wide language preference.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> &[PropertyDescriptor<E>] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyMeta> {
        self.properties
            .iter()
            .map(PropertyDescriptor::meta)
            .find(|m| m.name == name)
    }
}

impl<E> fmt::Debug for EntityDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("name", &self.name)
            .field("language", &self.language)
            .field("properties", &self.properties)
            .finish()
    }
}

struct PendingProperty<E> {
    spec: PropertySpec,
    kind: PropertyKind,
    target: &'static str,
    probe: fn(&Literal) -> bool,
    load: LoadFn<E>,
}

/// Builder for [`EntityDescriptor`]. Validation happens in [`DescriptorBuilder::build`].
pub struct DescriptorBuilder<E> {
    name: String,
    prefixes: PrefixTable,
    language: Option<String>,
    pending: Vec<PendingProperty<E>>,
}

impl<E: RdfEntity> DescriptorBuilder<E> {
    pub fn new(name: impl Into<String>, prefixes: PrefixTable) -> Self {
        Self {
            name: name.into(),
            prefixes,
            language: None,
            pending: Vec::new(),
        }
    }

    /// Bind a prefix for this entity (overrides inherited bindings).
    pub fn prefix(mut self, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.prefixes.insert(name, namespace);
        self
    }

    /// Entity-wide language preference.
    pub fn lang(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Single-valued literal property.
    pub fn scalar<T, F>(mut self, spec: impl Into<PropertySpec>, setter: F) -> Self
    where
        T: FromLiteral,
        F: Fn(&mut E, T) + Send + Sync + 'static,
    {
        self.pending.push(PendingProperty {
            spec: spec.into(),
            kind: PropertyKind::Scalar,
            target: T::TARGET,
            probe: T::accepts,
            load: Box::new(move |entity: &mut E, input: &LoadInput<'_>| {
                let value = loader::load_scalar::<T>(input.subject, input.property, input.matched)?;
                setter(entity, value);
                Ok(())
            }),
        });
        self
    }

    /// Set of literals. `C` is any [`ValueSet`] (`HashSet<T>`, `BTreeSet<T>`).
    pub fn scalar_set<C, F>(mut self, spec: impl Into<PropertySpec>, setter: F) -> Self
    where
        C: ValueSet,
        F: Fn(&mut E, C) + Send + Sync + 'static,
    {
        self.pending.push(PendingProperty {
            spec: spec.into(),
            kind: PropertyKind::ScalarCollection,
            target: <C::Item as FromLiteral>::TARGET,
            probe: <C::Item as FromLiteral>::accepts,
            load: Box::new(move |entity: &mut E, input: &LoadInput<'_>| {
                let values = loader::load_scalar_set::<C>(input.property, input.matched)?;
                setter(entity, values);
                Ok(())
            }),
        });
        self
    }

    /// Single-valued association to another entity, resolved lazily.
    ///
    /// Collection-valued associations have no declaration here: the setter
    /// receives exactly one handle.
    pub fn association<T, F>(mut self, spec: impl Into<PropertySpec>, setter: F) -> Self
    where
        T: RdfEntity,
        F: Fn(&mut E, LazyEntity<T>) + Send + Sync + 'static,
    {
        self.pending.push(PendingProperty {
            spec: spec.into(),
            kind: PropertyKind::Association,
            target: T::entity_name(),
            probe: never_literal,
            load: Box::new(move |entity: &mut E, input: &LoadInput<'_>| {
                let handle = loader::load_association::<T>(
                    input.subject,
                    input.property,
                    input.matched,
                    input.materializer,
                )?;
                setter(entity, handle);
                Ok(())
            }),
        });
        self
    }

    /// Reuse the declarations of `P` for a `P` embedded in `E`.
    ///
    /// Every property `P::describe` declares is added here, its setter applied
    /// to the field `project` selects. `P`'s prefix bindings are merged into
    /// this builder, and its language applies when `E` has none. A name
    /// declared by both `P` and `E` fails in [`DescriptorBuilder::build`].
    pub fn embed<P, F>(mut self, project: F) -> Self
    where
        P: RdfEntity,
        F: Fn(&mut E) -> &mut P + Send + Sync + 'static,
    {
        let project = Arc::new(project);
        let inner = P::describe(DescriptorBuilder::new(P::entity_name(), self.prefixes.clone()));
        self.prefixes = inner.prefixes;
        if self.language.is_none() {
            self.language = inner.language;
        }
        for p in inner.pending {
            let project = Arc::clone(&project);
            let load = p.load;
            self.pending.push(PendingProperty {
                spec: p.spec,
                kind: p.kind,
                target: p.target,
                probe: p.probe,
                load: Box::new(move |entity: &mut E, input: &LoadInput<'_>| {
                    load((*project)(entity), input)
                }),
            });
        }
        self
    }

    /// Resolve predicates and validate the declaration.
    pub fn build(self) -> Result<EntityDescriptor<E>> {
        let Self {
            name,
            prefixes,
            language,
            pending,
        } = self;

        if pending.is_empty() {
            return Err(MappingError::schema(&name, "no properties declared"));
        }

        let mut seen = HashSet::new();
        let mut properties = Vec::with_capacity(pending.len());
        for p in pending {
            let spec = p.spec;
            if spec.name.trim().is_empty() {
                return Err(MappingError::schema(&name, "property with an empty name"));
            }
            if !seen.insert(spec.name.clone()) {
                return Err(MappingError::schema(
                    &name,
                    format!("property {} declared more than once", spec.name),
                ));
            }

            let predicate = match (&spec.iri, &spec.prefix) {
                (Some(iri), _) => {
                    if !iri.contains(':') {
                        return Err(MappingError::schema(
                            &name,
                            format!("property {} has a relative predicate IRI {iri:?}", spec.name),
                        ));
                    }
                    prefixes.expand(iri).into_owned()
                }
                (None, Some(prefix)) => {
                    let ns = prefixes.namespace(prefix).ok_or_else(|| {
                        MappingError::schema(
                            &name,
                            format!("property {} uses undefined prefix {prefix:?}", spec.name),
                        )
                    })?;
                    let local = spec.local.as_deref().unwrap_or(&spec.name);
                    if local.trim().is_empty() {
                        return Err(MappingError::schema(
                            &name,
                            format!("property {} has an empty predicate name", spec.name),
                        ));
                    }
                    format!("{ns}{local}")
                }
                (None, None) => {
                    return Err(MappingError::schema(
                        &name,
                        format!("property {} has no predicate", spec.name),
                    ))
                }
            };

            properties.push(PropertyDescriptor {
                meta: PropertyMeta {
                    name: spec.name,
                    prefix: spec.prefix,
                    predicate,
                    kind: p.kind,
                    target: p.target,
                    language: spec.language,
                    probe: p.probe,
                },
                load: p.load,
            });
        }

        Ok(EntityDescriptor {
            name,
            prefixes,
            language,
            properties,
        })
    }
}
