//! Packing failures.
//!
//! Every variant aborts the whole packing call; there is no partial output.
//! A packed validator rejecting a datum is *not* a packing failure; see
//! [`ErrorRecord`](crate::instance::ErrorRecord) for that.

use thiserror::Error;

use crate::core::data::EntityId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackError {
    /// A reference slot points at an entity the compiler never produced.
    #[error("{referrer} references missing entity {target} through slot '{slot}'")]
    MissingDependency {
        referrer: String,
        slot: String,
        target: EntityId,
    },

    /// A reference site has no slot, or its slot has no allocated symbol.
    #[error("'{symbol}' has an unresolved reference site '{slot}'")]
    UnresolvedReference { symbol: String, slot: String },

    /// The allocator ran out of disambiguating suffixes.
    #[error("no free symbol for '{base}' after {attempts} attempts")]
    NameCollision { base: String, attempts: usize },

    /// An entity cannot be expressed as static, inlineable text.
    #[error("{entity} cannot be packed: {reason}")]
    UnsupportedConstruct { entity: String, reason: String },
}

impl PackError {
    pub(crate) fn unsupported(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        PackError::UnsupportedConstruct {
            entity: entity.into(),
            reason: reason.into(),
        }
    }
}
