//! Stage 3: Emission - render one declaration per graph node.
//!
//! Routine bodies (and function-based keywords and formats) are copied
//! verbatim except for their reference sites, which are replaced by the
//! symbol bound to the slot's target. Everything else is rendered from the
//! entity's data.

pub mod writer;

pub use writer::ModuleWriter;

use crate::config::PackOptions;
use crate::core::collect::{Node, Timing};
use crate::core::data::{Entity, EntityId, FormatCheck, PatternLiteral, Referent};
use crate::core::naming::NameBinding;
use crate::error::PackError;
use crate::utils::escape_quotes;

/// An edge the assembler has to respect when ordering declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub target: EntityId,
    pub timing: Timing,
}

/// Rendered text for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub id: EntityId,
    pub symbol: String,
    /// Initializer expression.
    pub init: String,
    /// `symbol.<name> = <value>;` statements following the definition.
    pub properties: Vec<(&'static str, String)>,
    /// One entry per distinct target, in slot order.
    pub dependencies: Vec<Dependency>,
}

pub struct CodeEmitter<'o> {
    options: &'o PackOptions,
}

impl<'o> CodeEmitter<'o> {
    pub fn new(options: &'o PackOptions) -> Self {
        Self { options }
    }

    pub fn emit(&self, node: &Node, binding: &NameBinding) -> Result<Declaration, PackError> {
        let symbol = binding
            .symbol(node.id)
            .ok_or_else(|| PackError::UnresolvedReference {
                symbol: node.entity.describe(),
                slot: node.id.to_string(),
            })?
            .to_string();

        let init = match node.entity {
            Entity::Routine(_) => self.rewrite(node, &symbol, binding)?,
            Entity::Keyword(keyword) => match &keyword.source {
                Some(_) => self.rewrite(node, &symbol, binding)?,
                None => {
                    return Err(PackError::unsupported(
                        node.entity.describe(),
                        "keyword has no runtime function source",
                    ));
                }
            },
            Entity::Format(format) => match &format.check {
                FormatCheck::Regex(pattern) => regexp(pattern),
                FormatCheck::Function(_) => self.rewrite(node, &symbol, binding)?,
                FormatCheck::Native => {
                    return Err(PackError::unsupported(
                        node.entity.describe(),
                        "native format checker has no source",
                    ));
                }
            },
            Entity::Pattern(pattern) => regexp(pattern),
            Entity::Value(value) => serde_json::to_string(value)
                .map_err(|err| PackError::unsupported(node.entity.describe(), err.to_string()))?,
            Entity::Runtime(helper) => format!(
                "require('{}/{}')",
                escape_quotes(self.options.runtime_path.trim_end_matches('/')),
                helper.module()
            ),
        };

        let mut properties = Vec::new();
        if let Entity::Routine(routine) = node.entity {
            properties.push(("errors", "null".to_string()));
            if routine.is_async {
                properties.push(("$async", "true".to_string()));
            }
        }

        Ok(Declaration {
            id: node.id,
            symbol,
            init,
            properties,
            dependencies: dependencies(node),
        })
    }

    /// Copy the node's code, replacing every reference site with its target's symbol.
    fn rewrite(
        &self,
        node: &Node,
        symbol: &str,
        binding: &NameBinding,
    ) -> Result<String, PackError> {
        let (Some(code), Some(analysis)) = (node.entity.code(), node.analysis.as_ref()) else {
            return Err(PackError::unsupported(
                node.entity.describe(),
                "code was not analysed",
            ));
        };

        let mut out = String::with_capacity(code.len());
        let mut cursor = 0;
        for site in &analysis.sites {
            let unresolved = || PackError::UnresolvedReference {
                symbol: symbol.to_string(),
                slot: site.slot.clone(),
            };
            let slot = node
                .entity
                .slots()
                .iter()
                .find(|slot| slot.name == site.slot)
                .ok_or_else(unresolved)?;
            let target = binding.symbol(slot.target).ok_or_else(unresolved)?;

            let before = code.get(cursor..site.start).ok_or_else(|| {
                PackError::unsupported(node.entity.describe(), "overlapping reference sites")
            })?;
            out.push_str(before);
            out.push_str(target);
            cursor = site.end;
        }
        out.push_str(code.get(cursor..).unwrap_or_default());

        Ok(out)
    }
}

/// `new RegExp('<source>'[, '<flags>'])`
fn regexp(pattern: &PatternLiteral) -> String {
    if pattern.flags.is_empty() {
        format!("new RegExp('{}')", escape_quotes(&pattern.source))
    } else {
        format!(
            "new RegExp('{}', '{}')",
            escape_quotes(&pattern.source),
            escape_quotes(&pattern.flags)
        )
    }
}

/// Distinct slot targets; a target used eagerly anywhere is eager.
fn dependencies(node: &Node) -> Vec<Dependency> {
    let mut out: Vec<Dependency> = Vec::new();
    for slot in node.entity.slots() {
        let timing = node
            .analysis
            .as_ref()
            .and_then(|analysis| analysis.timing_of(&slot.name))
            .unwrap_or(Timing::Deferred);

        match out.iter_mut().find(|dep| dep.target == slot.target) {
            Some(existing) => {
                if timing == Timing::Eager {
                    existing.timing = Timing::Eager;
                }
            }
            None => out.push(Dependency {
                target: slot.target,
                timing,
            }),
        }
    }
    out
}
