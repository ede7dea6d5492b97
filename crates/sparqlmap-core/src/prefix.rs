//! Prefix tables: `name → namespace IRI` bindings used to expand qualified names.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::vocab::DEFAULT_PREFIXES;

/// Ordered prefix bindings. Later bindings of the same name replace earlier ones
/// in place, so iteration order stays the declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixTable {
    bindings: Vec<(String, String)>,
}

impl PrefixTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in bindings (`rdf`, `rdfs`, `xsd`, `owl`, `foaf`, DBpedia, ...).
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        for (name, ns) in DEFAULT_PREFIXES {
            table.insert(*name, *ns);
        }
        table
    }

    pub fn insert(&mut self, name: impl Into<String>, namespace: impl Into<String>) {
        let name = name.into();
        let namespace = namespace.into();
        match self.bindings.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = namespace,
            None => self.bindings.push((name, namespace)),
        }
    }

    /// Bind `name=namespace` as written on a command line.
    pub fn insert_binding(&mut self, binding: &str) -> Result<(), ConfigError> {
        let (name, ns) = binding
            .split_once('=')
            .filter(|(n, ns)| !n.trim().is_empty() && !ns.trim().is_empty())
            .ok_or_else(|| ConfigError::PrefixBinding(binding.to_string()))?;
        self.insert(name.trim(), ns.trim());
        Ok(())
    }

    /// Overlay `other` onto this table.
    pub fn merge(&mut self, other: &PrefixTable) {
        for (name, ns) in other.iter() {
            self.insert(name, ns);
        }
    }

    pub fn namespace(&self, name: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ns)| ns.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.namespace(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(n, ns)| (n.as_str(), ns.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Expand `prefix:local` into a full IRI.
    ///
    /// Absolute IRIs, `<...>`-wrapped IRIs and names with an unbound prefix are
    /// returned unchanged (brackets stripped).
    pub fn expand<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if let Some(inner) = name.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
            return Cow::Borrowed(inner);
        }
        if name.contains("://") {
            return Cow::Borrowed(name);
        }
        match name.split_once(':') {
            Some((prefix, local)) => match self.namespace(prefix) {
                Some(ns) => Cow::Owned(format!("{ns}{local}")),
                None => Cow::Borrowed(name),
            },
            None => Cow::Borrowed(name),
        }
    }

    /// Compact a full IRI with the longest matching namespace.
    pub fn compact(&self, iri: &str) -> Option<String> {
        self.bindings
            .iter()
            .filter(|(_, ns)| !ns.is_empty() && iri.len() > ns.len() && iri.starts_with(ns.as_str()))
            .max_by_key(|(_, ns)| ns.len())
            .map(|(name, ns)| format!("{name}:{}", &iri[ns.len()..]))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PrefixTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (name, ns) in iter {
            table.insert(name, ns);
        }
        table
    }
}

impl fmt::Display for PrefixTable {
    /// SPARQL `PREFIX` declarations, one per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, ns) in self.iter() {
            writeln!(f, "PREFIX {name}: <{ns}>")?;
        }
        Ok(())
    }
}
