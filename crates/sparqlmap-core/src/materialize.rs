//! One materialization run: fetch once, load every property, publish all or nothing.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, debug_span, trace, warn};

use crate::descriptor::{EntityDescriptor, LoadInput, RdfEntity};
use crate::error::Result;
use crate::lazy::LazyEntity;
use crate::mapping::MappingContext;
use crate::matcher;
use crate::source::TripleSource;

/// Shared state behind every handle of one template: the triple source, the
/// descriptor registry and the default language.
pub struct Materializer {
    source: Arc<dyn TripleSource>,
    mapping: MappingContext,
    default_language: Option<String>,
}

impl Materializer {
    pub fn new(
        source: Arc<dyn TripleSource>,
        mapping: MappingContext,
        default_language: Option<String>,
    ) -> Self {
        Self {
            source,
            mapping,
            default_language,
        }
    }

    pub fn mapping(&self) -> &MappingContext {
        &self.mapping
    }

    pub fn source(&self) -> &dyn TripleSource {
        self.source.as_ref()
    }

    pub fn default_language(&self) -> Option<&str> {
        self.default_language.as_deref()
    }

    /// A new, unloaded handle for `iri`. Only the descriptor lookup happens now.
    pub fn handle<T: RdfEntity>(self: &Arc<Self>, iri: &str) -> Result<LazyEntity<T>> {
        let descriptor = self.mapping.descriptor::<T>()?;
        Ok(LazyEntity::new(iri.to_string(), descriptor, Arc::clone(self)))
    }

    /// Fetch the triples of `subject` and populate a fresh `T`.
    ///
    /// Properties load in declaration order; the first failure aborts the run
    /// and the partially filled value is dropped.
    pub fn materialize<T: RdfEntity>(
        self: &Arc<Self>,
        subject: &str,
        descriptor: &EntityDescriptor<T>,
    ) -> Result<T> {
        let span = debug_span!("materialize", entity = descriptor.name(), subject);
        let _enter = span.enter();

        let result = self.run(subject, descriptor);
        if let Err(err) = &result {
            warn!(error = %err, "materialization failed");
        }
        result
    }

    fn run<T: RdfEntity>(self: &Arc<Self>, subject: &str, descriptor: &EntityDescriptor<T>) -> Result<T> {
        let triples = self.source.fetch_triples(subject, descriptor.prefixes())?;
        debug!(triples = triples.len(), "fetched subject triples");

        let language = descriptor.language().or(self.default_language());
        let mut entity = T::default();
        for property in descriptor.properties() {
            let meta = property.meta();
            let matched = matcher::match_property(meta, descriptor.prefixes(), language, &triples);
            trace!(property = meta.name(), matched = matched.len(), "matched property");
            property.load(
                &mut entity,
                &LoadInput {
                    subject,
                    property: meta,
                    matched: &matched,
                    materializer: self,
                },
            )?;
        }
        Ok(entity)
    }
}

impl fmt::Debug for Materializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Materializer")
            .field("mapping", &self.mapping)
            .field("default_language", &self.default_language)
            .finish_non_exhaustive()
    }
}
