//! Stage 2: Naming - give every graph node a unique local symbol.
//!
//! Candidates come from, in order: the configured root symbol, the entity's
//! own preferred name (schema id, keyword or format name, helper name), the
//! slot that first discovered it, and finally a per-kind counter. Taken
//! names get `_1`, `_2`, ... appended. Identifiers used inside any body and
//! reserved words are never handed out, so no emitted symbol can be shadowed.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::config::PackOptions;
use crate::core::collect::{Graph, Node};
use crate::core::data::{EntityId, EntityKind, Referent};
use crate::error::PackError;
use crate::utils::sanitize_identifier;

/// Bijective map from entity identity to symbol for one packing run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NameBinding {
    symbols: IndexMap<EntityId, String>,
}

impl NameBinding {
    pub(crate) fn bind(&mut self, id: EntityId, symbol: String) {
        self.symbols.insert(id, symbol);
    }

    pub fn symbol(&self, id: EntityId) -> Option<&str> {
        self.symbols.get(&id).map(String::as_str)
    }

    /// (id, symbol) pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &str)> {
        self.symbols.iter().map(|(id, symbol)| (*id, symbol.as_str()))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

pub struct NameAllocator<'o> {
    options: &'o PackOptions,
}

impl<'o> NameAllocator<'o> {
    pub fn new(options: &'o PackOptions) -> Self {
        Self { options }
    }

    pub fn allocate(&self, graph: &Graph) -> Result<NameBinding, PackError> {
        let mut taken: HashSet<String> = self
            .options
            .reserved_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        for node in graph.nodes() {
            if let Some(analysis) = &node.analysis {
                taken.extend(analysis.identifiers.iter().cloned());
            }
        }

        let mut counters: HashMap<EntityKind, usize> = HashMap::new();
        let mut binding = NameBinding::default();

        for node in graph.nodes() {
            let base = self.candidate(node, graph.root(), &mut counters);
            let symbol = self.claim(&mut taken, &base)?;
            tracing::trace!(entity = %node.id, symbol = %symbol, "allocated symbol");
            binding.bind(node.id, symbol);
        }

        tracing::debug!(symbols = binding.len(), "allocated names");
        Ok(binding)
    }

    fn candidate(
        &self,
        node: &Node,
        root: EntityId,
        counters: &mut HashMap<EntityKind, usize>,
    ) -> String {
        if node.id == root {
            return self.options.root_symbol.clone();
        }

        let named = node
            .entity
            .preferred_name()
            .and_then(|name| sanitize_identifier(&name))
            .or_else(|| {
                node.discovered_as
                    .as_deref()
                    .and_then(sanitize_identifier)
            });
        if let Some(name) = named {
            return name;
        }

        let kind = node.entity.kind();
        let counter = counters.entry(kind).or_insert(0);
        let name = format!("{}{}", kind.counter_prefix(), counter);
        *counter += 1;
        name
    }

    /// Take `base` or the first free `base_N`.
    fn claim(&self, taken: &mut HashSet<String>, base: &str) -> Result<String, PackError> {
        if taken.insert(base.to_string()) {
            return Ok(base.to_string());
        }

        for n in 1..=self.options.max_name_suffix {
            let candidate = format!("{}_{}", base, n);
            if taken.insert(candidate.clone()) {
                tracing::debug!(base, symbol = %candidate, "disambiguated symbol");
                return Ok(candidate);
            }
        }

        Err(PackError::NameCollision {
            base: base.to_string(),
            attempts: self.options.max_name_suffix,
        })
    }
}
