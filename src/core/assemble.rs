//! Stage 4: Assembly - order declarations and export the root.
//!
//! Declarations are grouped into strongly connected components and written
//! dependencies first. A component that is a cycle is written in two phases:
//! all its symbols are declared up front, then defined one by one, ordered so
//! that every eager reference targets an already defined member.

use indexmap::IndexMap;

use crate::config::PackOptions;
use crate::core::collect::Timing;
use crate::core::data::EntityId;
use crate::core::emit::{Declaration, ModuleWriter};
use crate::error::PackError;

/// The assembled module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedModule {
    /// (symbol, declaration text) in emission order.
    declarations: Vec<(String, String)>,
    root_symbol: String,
    text: String,
}

impl PackedModule {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn root_symbol(&self) -> &str {
        &self.root_symbol
    }

    pub fn declarations(&self) -> &[(String, String)] {
        &self.declarations
    }

    /// Symbols in emission order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.declarations.iter().map(|(symbol, _)| symbol.as_str())
    }
}

pub struct ModuleAssembler<'o> {
    options: &'o PackOptions,
}

impl<'o> ModuleAssembler<'o> {
    pub fn new(options: &'o PackOptions) -> Self {
        Self { options }
    }

    pub fn assemble(
        &self,
        declarations: Vec<Declaration>,
        root: EntityId,
    ) -> Result<PackedModule, PackError> {
        let index: IndexMap<EntityId, usize> = declarations
            .iter()
            .enumerate()
            .map(|(i, decl)| (decl.id, i))
            .collect();

        let root_index = *index.get(&root).ok_or_else(|| PackError::UnresolvedReference {
            symbol: self.options.root_symbol.clone(),
            slot: root.to_string(),
        })?;

        // (target index, eager) per declaration
        let mut edges: Vec<Vec<(usize, bool)>> = Vec::with_capacity(declarations.len());
        for decl in &declarations {
            let mut out = Vec::with_capacity(decl.dependencies.len());
            for dep in &decl.dependencies {
                let target = *index.get(&dep.target).ok_or_else(|| {
                    PackError::UnresolvedReference {
                        symbol: decl.symbol.clone(),
                        slot: dep.target.to_string(),
                    }
                })?;
                out.push((target, dep.timing == Timing::Eager));
            }
            edges.push(out);
        }

        let adjacency: Vec<Vec<usize>> = edges
            .iter()
            .map(|out| out.iter().map(|(target, _)| *target).collect())
            .collect();
        let components = strongly_connected(&adjacency);

        let mut writer = ModuleWriter::new();
        if self.options.strict_mode {
            writer.use_strict();
        }

        let mut emitted = Vec::with_capacity(declarations.len());
        let mut cyclic_groups = 0;
        for component in components {
            let is_cycle = component.len() > 1
                || adjacency[component[0]].contains(&component[0]);

            if !is_cycle {
                let decl = &declarations[component[0]];
                let text = render(decl, false);
                writer.append(&text);
                emitted.push((decl.symbol.clone(), text));
                continue;
            }

            cyclic_groups += 1;
            let order = definition_order(&component, &edges).ok_or_else(|| {
                let symbols: Vec<&str> = component
                    .iter()
                    .map(|&i| declarations[i].symbol.as_str())
                    .collect();
                PackError::unsupported(
                    format!("cyclic group [{}]", symbols.join(", ")),
                    "eager references inside the group form a cycle",
                )
            })?;

            let symbols: Vec<&str> = order
                .iter()
                .map(|&i| declarations[i].symbol.as_str())
                .collect();
            writer.forward(&symbols);
            for &i in &order {
                let decl = &declarations[i];
                let text = render(decl, true);
                writer.append(&text);
                emitted.push((decl.symbol.clone(), text));
            }
        }

        let root_symbol = declarations[root_index].symbol.clone();
        writer.export(&root_symbol);

        tracing::debug!(
            declarations = emitted.len(),
            cyclic_groups,
            root = %root_symbol,
            "assembled module"
        );

        Ok(PackedModule {
            declarations: emitted,
            root_symbol,
            text: writer.finish(),
        })
    }
}

/// Statements defining one declaration. `forwarded` symbols were already declared.
fn render(decl: &Declaration, forwarded: bool) -> String {
    let mut writer = ModuleWriter::new();
    if forwarded {
        writer.assign(&decl.symbol, &decl.init);
    } else {
        writer.var(&decl.symbol, &decl.init);
    }
    for (name, value) in &decl.properties {
        writer.property(&decl.symbol, name, value);
    }
    writer.finish()
}

/// Order the members of a cycle so eager references point backwards.
///
/// Returns `None` when no such order exists.
fn definition_order(component: &[usize], edges: &[Vec<(usize, bool)>]) -> Option<Vec<usize>> {
    let mut remaining: Vec<usize> = component.to_vec();
    remaining.sort_unstable();
    let mut placed: Vec<usize> = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let ready = remaining.iter().position(|&member| {
            edges[member].iter().all(|&(target, eager)| {
                !eager || !component.contains(&target) || placed.contains(&target)
            })
        })?;
        placed.push(remaining.remove(ready));
    }

    Some(placed)
}

/// Tarjan's algorithm. Components come out dependencies first; members are
/// sorted by index.
fn strongly_connected(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    struct State<'a> {
        adjacency: &'a [Vec<usize>],
        counter: usize,
        index: Vec<Option<usize>>,
        lowlink: Vec<usize>,
        on_stack: Vec<bool>,
        stack: Vec<usize>,
        components: Vec<Vec<usize>>,
    }

    fn visit(state: &mut State, v: usize) {
        state.index[v] = Some(state.counter);
        state.lowlink[v] = state.counter;
        state.counter += 1;
        state.stack.push(v);
        state.on_stack[v] = true;

        for i in 0..state.adjacency[v].len() {
            let w = state.adjacency[v][i];
            match state.index[w] {
                None => {
                    visit(state, w);
                    state.lowlink[v] = state.lowlink[v].min(state.lowlink[w]);
                }
                Some(w_index) if state.on_stack[w] => {
                    state.lowlink[v] = state.lowlink[v].min(w_index);
                }
                Some(_) => {}
            }
        }

        if Some(state.lowlink[v]) == state.index[v] {
            let mut component = Vec::new();
            while let Some(w) = state.stack.pop() {
                state.on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            component.sort_unstable();
            state.components.push(component);
        }
    }

    let n = adjacency.len();
    let mut state = State {
        adjacency,
        counter: 0,
        index: vec![None; n],
        lowlink: vec![0; n],
        on_stack: vec![false; n],
        stack: Vec::new(),
        components: Vec::new(),
    };
    for v in 0..n {
        if state.index[v].is_none() {
            visit(&mut state, v);
        }
    }
    state.components
}
