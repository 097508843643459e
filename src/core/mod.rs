//! Packing engine.
//!
//! Four stages run in order over an [`EntitySource`](data::EntitySource):
//!
//! 1. **Collect**: walk reference slots from the root, once per entity
//! 2. **Name**: bind a unique, non-shadowing symbol to every entity
//! 3. **Emit**: render each entity, rewriting reference sites in bodies
//! 4. **Assemble**: order declarations, forward-declare cycles, export the root

pub mod assemble;
pub mod collect;
pub mod data;
pub mod emit;
pub mod naming;
pub mod parsers;
pub mod pipeline;

pub use assemble::{ModuleAssembler, PackedModule};
pub use collect::{DependencyCollector, Graph, Node};
pub use emit::{CodeEmitter, Declaration, Dependency};
pub use naming::{NameAllocator, NameBinding};
pub use pipeline::{pack, pack_module};
