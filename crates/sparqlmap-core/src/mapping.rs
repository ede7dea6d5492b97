//! Registry of entity descriptors, one per Rust type.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::descriptor::{EntityDescriptor, RdfEntity};
use crate::error::{MappingError, Result};
use crate::prefix::PrefixTable;

type AnyDescriptor = Arc<dyn Any + Send + Sync>;

/// Builds each type's descriptor on first request and caches it.
///
/// Descriptors are seeded with the context's prefix table; an entity's own
/// prefix bindings override it.
pub struct MappingContext {
    prefixes: PrefixTable,
    descriptors: RwLock<HashMap<TypeId, AnyDescriptor>>,
}

impl MappingContext {
    pub fn new(prefixes: PrefixTable) -> Self {
        Self {
            prefixes,
            descriptors: RwLock::new(HashMap::new()),
        }
    }

    pub fn prefixes(&self) -> &PrefixTable {
        &self.prefixes
    }

    /// The descriptor of `T`, building and validating it on first use.
    pub fn descriptor<T: RdfEntity>(&self) -> Result<Arc<EntityDescriptor<T>>> {
        let key = TypeId::of::<T>();
        if let Some(found) = self.descriptors.read().get(&key) {
            return downcast::<T>(Arc::clone(found));
        }

        let built = Arc::new(EntityDescriptor::<T>::describe(self.prefixes.clone())?);
        debug!(
            entity = built.name(),
            properties = built.properties().len(),
            "registered entity descriptor"
        );

        let mut map = self.descriptors.write();
        let entry = map
            .entry(key)
            .or_insert_with(|| built as AnyDescriptor);
        downcast::<T>(Arc::clone(entry))
    }

    /// Build `T`'s descriptor now so schema errors surface before any load.
    pub fn register<T: RdfEntity>(&self) -> Result<()> {
        self.descriptor::<T>().map(|_| ())
    }

    pub fn is_registered<T: RdfEntity>(&self) -> bool {
        self.descriptors.read().contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.descriptors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MappingContext {
    fn default() -> Self {
        Self::new(PrefixTable::with_defaults())
    }
}

impl fmt::Debug for MappingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingContext")
            .field("prefixes", &self.prefixes)
            .field("registered", &self.len())
            .finish()
    }
}

fn downcast<T: RdfEntity>(any: AnyDescriptor) -> Result<Arc<EntityDescriptor<T>>> {
    any.downcast::<EntityDescriptor<T>>()
        .map_err(|_| MappingError::schema(T::entity_name(), "registry entry has a foreign type"))
}
