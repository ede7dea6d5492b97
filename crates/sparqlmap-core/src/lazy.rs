//! Lazily materialized entity handles.
//!
//! A [`LazyEntity`] starts `Unloaded`. The first accessor call runs the
//! materializer (one fetch) and publishes the populated value; every later
//! call reads it without touching the source. A failed run publishes nothing,
//! so the next accessor call tries again.
//!
//! Handles are never shared or deduplicated: two handles for the same IRI
//! load independently, and an association that points back at its own subject
//! yields a fresh handle. Navigation depth is therefore exactly the depth the
//! caller walks.

use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::descriptor::{EntityDescriptor, RdfEntity};
use crate::error::Result;
use crate::materialize::Materializer;

/// Observable load state of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loaded,
}

/// A deferred entity of type `T` identified by its subject IRI.
pub struct LazyEntity<T: RdfEntity> {
    iri: String,
    descriptor: Arc<EntityDescriptor<T>>,
    materializer: Arc<Materializer>,
    /// Held for the whole run so concurrent first accesses wait instead of
    /// fetching twice.
    latch: Mutex<()>,
    loaded: OnceLock<Box<T>>,
}

impl<T: RdfEntity> LazyEntity<T> {
    pub(crate) fn new(
        iri: String,
        descriptor: Arc<EntityDescriptor<T>>,
        materializer: Arc<Materializer>,
    ) -> Self {
        Self {
            iri,
            descriptor,
            materializer,
            latch: Mutex::new(()),
            loaded: OnceLock::new(),
        }
    }

    /// Subject IRI. Never triggers a load.
    pub fn iri(&self) -> &str {
        &self.iri
    }

    pub fn descriptor(&self) -> &EntityDescriptor<T> {
        &self.descriptor
    }

    pub fn state(&self) -> LoadState {
        if self.loaded.get().is_some() {
            LoadState::Loaded
        } else {
            LoadState::Unloaded
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state() == LoadState::Loaded
    }

    /// The populated entity, materializing it on first call.
    pub fn get(&self) -> Result<&T> {
        if let Some(entity) = self.loaded.get() {
            return Ok(entity);
        }

        let _guard = self.latch.lock();
        // Another thread may have finished while we waited.
        if let Some(entity) = self.loaded.get() {
            return Ok(entity);
        }

        let entity = self.materializer.materialize(&self.iri, &self.descriptor)?;
        Ok(self.loaded.get_or_init(|| Box::new(entity)))
    }

    /// Read one value out of the entity.
    pub fn with<R>(&self, read: impl FnOnce(&T) -> R) -> Result<R> {
        self.get().map(read)
    }

    /// The populated entity, if a previous access loaded it.
    pub fn peek(&self) -> Option<&T> {
        self.loaded.get().map(|entity| &**entity)
    }

    /// Consume the handle, returning the entity (loading it if needed).
    pub fn into_inner(self) -> Result<T> {
        match self.loaded.into_inner() {
            Some(entity) => Ok(*entity),
            None => self.materializer.materialize(&self.iri, &self.descriptor),
        }
    }
}

impl<T: RdfEntity> fmt::Debug for LazyEntity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyEntity")
            .field("entity", &self.descriptor.name())
            .field("iri", &self.iri)
            .field("state", &self.state())
            .finish()
    }
}
