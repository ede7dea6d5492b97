//! Triple sources: where the triples of a subject come from.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::TransportError;
use crate::prefix::PrefixTable;
use crate::term::Triple;

/// Retrieval of every triple whose subject is a given IRI.
///
/// Implementations must return all such triples (order is irrelevant) and may
/// use `prefixes` to build their query. Failures are reported as-is; callers
/// never retry.
pub trait TripleSource: Send + Sync {
    fn fetch_triples(&self, subject: &str, prefixes: &PrefixTable) -> Result<Vec<Triple>, TransportError>;
}

impl<S: TripleSource + ?Sized> TripleSource for Arc<S> {
    fn fetch_triples(&self, subject: &str, prefixes: &PrefixTable) -> Result<Vec<Triple>, TransportError> {
        (**self).fetch_triples(subject, prefixes)
    }
}

impl<S: TripleSource + ?Sized> TripleSource for Box<S> {
    fn fetch_triples(&self, subject: &str, prefixes: &PrefixTable) -> Result<Vec<Triple>, TransportError> {
        (**self).fetch_triples(subject, prefixes)
    }
}

/// An in-memory graph indexed by subject.
#[derive(Debug, Default)]
pub struct InMemoryGraph {
    by_subject: RwLock<HashMap<String, Vec<Triple>>>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, triple: Triple) {
        self.by_subject
            .write()
            .entry(triple.subject.clone())
            .or_default()
            .push(triple);
    }

    pub fn len(&self) -> usize {
        self.by_subject.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct subjects, sorted.
    pub fn subjects(&self) -> Vec<String> {
        let mut out: Vec<String> = self.by_subject.read().keys().cloned().collect();
        out.sort();
        out
    }
}

impl FromIterator<Triple> for InMemoryGraph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        let graph = Self::new();
        for triple in iter {
            graph.insert(triple);
        }
        graph
    }
}

impl Extend<Triple> for InMemoryGraph {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        for triple in iter {
            self.insert(triple);
        }
    }
}

impl TripleSource for InMemoryGraph {
    fn fetch_triples(&self, subject: &str, _prefixes: &PrefixTable) -> Result<Vec<Triple>, TransportError> {
        Ok(self
            .by_subject
            .read()
            .get(subject)
            .cloned()
            .unwrap_or_default())
    }
}

/// Wraps a source and counts fetch calls (successful or not).
#[derive(Debug, Default)]
pub struct CountingSource<S> {
    inner: S,
    calls: AtomicUsize,
}

impl<S> CountingSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: TripleSource> TripleSource for CountingSource<S> {
    fn fetch_triples(&self, subject: &str, prefixes: &PrefixTable) -> Result<Vec<Triple>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_triples(subject, prefixes)
    }
}
