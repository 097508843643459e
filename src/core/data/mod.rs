//! Input data model: the entities a compiled routine references and the
//! bookkeeping that owns them.

pub mod entity;
pub mod store;

pub use entity::{
    CompiledRoutine, Entity, EntityId, EntityKind, FormatCheck, FormatChecker, KeywordImpl,
    KeywordKind, PatternLiteral, ReferenceSlot, Referent, RuntimeHelper,
};
pub use store::{EntitySource, RoutineStore};
