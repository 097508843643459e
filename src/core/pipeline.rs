//! End-to-end packing: collect, name, emit, assemble.

use crate::config::PackOptions;
use crate::core::assemble::{ModuleAssembler, PackedModule};
use crate::core::collect::DependencyCollector;
use crate::core::data::{EntityId, EntitySource};
use crate::core::emit::CodeEmitter;
use crate::core::naming::NameAllocator;
use crate::error::PackError;

/// Pack `root` and everything it reaches into one module.
///
/// The source is only read. Packing the same graph with the same options
/// always produces byte-identical text.
pub fn pack_module<S: EntitySource + ?Sized>(
    source: &S,
    root: EntityId,
    options: &PackOptions,
) -> Result<PackedModule, PackError> {
    let graph = DependencyCollector::new(source, &options.registry_ident).collect(root)?;
    let binding = NameAllocator::new(options).allocate(&graph)?;

    let emitter = CodeEmitter::new(options);
    let declarations = graph
        .nodes()
        .map(|node| emitter.emit(node, &binding))
        .collect::<Result<Vec<_>, _>>()?;

    let module = ModuleAssembler::new(options).assemble(declarations, root)?;
    tracing::debug!(
        root = %root,
        entities = graph.len(),
        bytes = module.text().len(),
        "packed module"
    );
    Ok(module)
}

/// Same as [`pack_module`], returning only the module text.
pub fn pack<S: EntitySource + ?Sized>(
    source: &S,
    root: EntityId,
    options: &PackOptions,
) -> Result<String, PackError> {
    pack_module(source, root, options).map(PackedModule::into_text)
}
