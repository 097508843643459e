//! Source parsers.
//!
//! - `js`: JavaScript expression parser (uses swc for AST generation)

pub mod js;
