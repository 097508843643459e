//! Stage 1: Collection - walk the reference graph of a root routine.
//!
//! Starting from the root, every reference slot is followed once per entity
//! identity. An entity is recorded before its own slots are followed, so
//! recursive and mutually recursive routines terminate. Code-bearing
//! entities are parsed and analysed here, once, for the later stages.

pub mod analysis;
pub mod graph;

pub use analysis::{BodyAnalysis, ReferenceSite, Timing, analyze_body};
pub use graph::{Graph, Node};

use crate::core::data::{EntityId, EntityKind, EntitySource, Referent};
use crate::error::PackError;

/// Description used when the root itself cannot be found.
const ROOT_REFERRER: &str = "pack request";

struct Pending {
    id: EntityId,
    /// (referrer description, slot name)
    via: Option<(String, String)>,
}

pub struct DependencyCollector<'s, S: EntitySource + ?Sized> {
    source: &'s S,
    registry: &'s str,
}

impl<'s, S: EntitySource + ?Sized> DependencyCollector<'s, S> {
    pub fn new(source: &'s S, registry: &'s str) -> Self {
        Self { source, registry }
    }

    pub fn collect(&self, root: EntityId) -> Result<Graph<'s>, PackError> {
        let mut graph = Graph::new(root);
        let mut pending = vec![Pending { id: root, via: None }];

        while let Some(Pending { id, via }) = pending.pop() {
            if graph.contains(id) {
                continue;
            }

            let Some(entity) = self.source.entity(id) else {
                let (referrer, slot) =
                    via.unwrap_or_else(|| (ROOT_REFERRER.to_string(), "root".to_string()));
                return Err(PackError::MissingDependency {
                    referrer,
                    slot,
                    target: id,
                });
            };

            if id == root && entity.kind() != EntityKind::Routine {
                return Err(PackError::unsupported(
                    entity.describe(),
                    "only a compiled routine can be packed as the root",
                ));
            }

            let analysis = match entity.code() {
                Some(code) => Some(analyze_body(code, self.registry, &entity.describe())?),
                None => None,
            };

            graph.insert(Node {
                id,
                entity,
                discovered_as: via.map(|(_, slot)| slot),
                analysis,
            });

            // Reverse so the first slot is visited first.
            for slot in entity.slots().iter().rev() {
                if !graph.contains(slot.target) {
                    pending.push(Pending {
                        id: slot.target,
                        via: Some((entity.describe(), slot.name.clone())),
                    });
                }
            }
        }

        tracing::debug!(nodes = graph.len(), root = %root, "collected dependency graph");
        Ok(graph)
    }
}
