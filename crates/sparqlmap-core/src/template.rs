//! The entry point: a triple source plus the mapping registry.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::TemplateConfig;
use crate::descriptor::{EntityDescriptor, RdfEntity};
use crate::error::Result;
use crate::lazy::LazyEntity;
use crate::mapping::MappingContext;
use crate::materialize::Materializer;
use crate::prefix::PrefixTable;
use crate::source::TripleSource;

/// Hands out lazy entity handles backed by one [`TripleSource`].
///
/// Cloning is cheap; clones share the source and the descriptor registry.
#[derive(Clone)]
pub struct SparqlTemplate {
    config: Arc<TemplateConfig>,
    materializer: Arc<Materializer>,
}

impl SparqlTemplate {
    pub fn new<S: TripleSource + 'static>(source: S) -> Self {
        Self::with_config(source, TemplateConfig::default())
    }

    pub fn with_config<S: TripleSource + 'static>(source: S, config: TemplateConfig) -> Self {
        Self::from_shared(Arc::new(source), config)
    }

    /// Build on a source the caller keeps a handle to (e.g. a `CountingSource`).
    pub fn from_shared(source: Arc<dyn TripleSource>, config: TemplateConfig) -> Self {
        let mapping = MappingContext::new(config.prefix_table());
        let materializer = Materializer::new(source, mapping, config.default_language.clone());
        Self {
            config: Arc::new(config),
            materializer: Arc::new(materializer),
        }
    }

    /// An unloaded handle for `iri`, which may be prefixed (`dbr:Paris`).
    ///
    /// Nothing is fetched here; the only possible failure is a schema error
    /// in `T`'s declaration.
    pub fn load<T: RdfEntity>(&self, iri: &str) -> Result<LazyEntity<T>> {
        let subject = self.prefixes().expand(iri);
        debug!(entity = T::entity_name(), subject = %subject, "created entity handle");
        self.materializer.handle::<T>(&subject)
    }

    /// Build and validate `T`'s descriptor ahead of the first load.
    pub fn register<T: RdfEntity>(&self) -> Result<Arc<EntityDescriptor<T>>> {
        self.mapping().descriptor::<T>()
    }

    pub fn prefixes(&self) -> &PrefixTable {
        self.mapping().prefixes()
    }

    pub fn mapping(&self) -> &MappingContext {
        self.materializer.mapping()
    }

    pub fn materializer(&self) -> &Arc<Materializer> {
        &self.materializer
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }
}

impl fmt::Debug for SparqlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparqlTemplate")
            .field("config", &self.config)
            .field("materializer", &self.materializer)
            .finish()
    }
}
