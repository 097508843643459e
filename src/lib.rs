//! schemapack - pack compiled schema validators into standalone modules
//!
//! A compiled validation routine reaches its sub-routines, custom keywords,
//! formats, patterns, default values and runtime helpers through a live
//! registry. Packing resolves that registry once and writes the routine and
//! everything it transitively references into a single CommonJS module whose
//! only export is the root validator.
//!
//! ## Module Structure
//!
//! - `config`: Packing options
//! - `core`: Packing engine (collect, name, emit, assemble)
//! - `error`: Packing failure taxonomy
//! - `instance`: Validator facade that packs every compiled schema
//! - `utils`: Identifier and string-literal helpers

pub mod config;
pub mod core;
pub mod error;
pub mod instance;
pub mod utils;

pub use config::PackOptions;
pub use crate::core::data::{
    CompiledRoutine, Entity, EntityId, EntityKind, EntitySource, FormatCheck, FormatChecker,
    KeywordImpl, KeywordKind, PatternLiteral, ReferenceSlot, RoutineStore, RuntimeHelper,
};
pub use crate::core::{PackedModule, pack, pack_module};
pub use error::PackError;
pub use instance::{
    ErrorRecord, ModuleLoader, PackInstance, PackedValidator, SchemaCompiler, ValidationFailure,
    Verdict,
};
