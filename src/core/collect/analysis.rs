//! Reference-site analysis of JavaScript bodies.
//!
//! A body reaches its dependencies through the registry identifier
//! (`refs.name` or `refs["name"]`). This visitor records each such site with
//! its byte range and whether it runs while the declaration is evaluated
//! (eager) or only once the produced function is called (deferred).
//!
//! Rewritten sites become plain local bindings, so a call like `refs.x(d)`
//! runs with no receiver. Runtime functions never read `this` from the
//! registry. Deleting or assigning a slot has no local equivalent and is
//! rejected.

use std::collections::BTreeSet;

use swc_ecma_ast::{
    ArrowExpr, AssignExpr, AssignTarget, CallExpr, Callee, Constructor, Expr, Function,
    GetterProp, Ident, Lit, MemberExpr, MemberProp, NewExpr, SetterProp, SimpleAssignTarget,
    UnaryExpr, UnaryOp, UpdateExpr,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::core::parsers::js::{ParsedExpression, parse_expression_source};
use crate::error::PackError;

/// When a reference site executes relative to its declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timing {
    /// Runs while the declaration's initializer is evaluated.
    Eager,
    /// Runs only when a function created by the initializer is called.
    Deferred,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSite {
    pub slot: String,
    /// Byte range of the whole lookup expression in the body.
    pub start: usize,
    pub end: usize,
    pub timing: Timing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyAnalysis {
    /// Every identifier appearing in the body.
    pub identifiers: BTreeSet<String>,
    /// Reference sites in source order.
    pub sites: Vec<ReferenceSite>,
}

impl BodyAnalysis {
    /// Timing of the earliest-running site for `slot`, if the body uses it.
    pub fn timing_of(&self, slot: &str) -> Option<Timing> {
        let mut found = None;
        for site in self.sites.iter().filter(|site| site.slot == slot) {
            if site.timing == Timing::Eager {
                return Some(Timing::Eager);
            }
            found = Some(Timing::Deferred);
        }
        found
    }
}

/// Parse `code` and collect its identifiers and reference sites.
///
/// `label` describes the owning entity and is used in error messages.
pub fn analyze_body(code: &str, registry: &str, label: &str) -> Result<BodyAnalysis, PackError> {
    let parsed = parse_expression_source(code, label)
        .map_err(|err| PackError::unsupported(label, format!("{:#}", err)))?;

    let mut collector = SiteCollector::new(&parsed, registry);
    parsed.script.visit_with(&mut collector);

    if let Some(offset) = collector.dynamic_access {
        return Err(PackError::unsupported(
            label,
            format!(
                "registry '{}' is used dynamically at byte {}",
                registry, offset
            ),
        ));
    }

    if let Some(slot) = collector.mutated_slot {
        return Err(PackError::unsupported(
            label,
            format!("registry slot '{}' is deleted or assigned", slot),
        ));
    }

    let mut sites = collector.sites;
    sites.sort_by_key(|site| site.start);

    Ok(BodyAnalysis {
        identifiers: collector.identifiers,
        sites,
    })
}

struct SiteCollector<'a> {
    parsed: &'a ParsedExpression,
    registry: &'a str,
    /// 0 = runs during declaration, >0 = inside a function body
    scope_depth: usize,
    identifiers: BTreeSet<String>,
    sites: Vec<ReferenceSite>,
    dynamic_access: Option<usize>,
    mutated_slot: Option<String>,
}

impl<'a> SiteCollector<'a> {
    fn new(parsed: &'a ParsedExpression, registry: &'a str) -> Self {
        Self {
            parsed,
            registry,
            scope_depth: 0,
            identifiers: BTreeSet::new(),
            sites: Vec::new(),
            dynamic_access: None,
            mutated_slot: None,
        }
    }

    /// Slot name if `node` is a static registry lookup.
    fn slot_name(&self, node: &MemberExpr) -> Option<String> {
        let Expr::Ident(obj) = &*node.obj else {
            return None;
        };
        if &*obj.sym != self.registry {
            return None;
        }

        match &node.prop {
            MemberProp::Ident(name) => Some(name.sym.to_string()),
            MemberProp::Computed(computed) => match &*computed.expr {
                Expr::Lit(Lit::Str(s)) => s.value.as_str().map(|s| s.to_string()),
                _ => None,
            },
            _ => None,
        }
    }

    fn check_mutation(&mut self, target: &Expr) {
        if let Expr::Member(member) = target {
            self.check_member_mutation(member);
        }
    }

    fn check_member_mutation(&mut self, member: &MemberExpr) {
        if self.mutated_slot.is_none() {
            self.mutated_slot = self.slot_name(member);
        }
    }

    fn timing(&self) -> Timing {
        if self.scope_depth == 0 {
            Timing::Eager
        } else {
            Timing::Deferred
        }
    }

    fn nested<F: FnOnce(&mut Self)>(&mut self, f: F) {
        self.scope_depth += 1;
        f(self);
        self.scope_depth -= 1;
    }

    /// Visit a function that runs as soon as it is created, at the current depth.
    fn run_inline(&mut self, function: &Expr) {
        match function {
            Expr::Fn(fn_expr) => {
                if let Some(ident) = &fn_expr.ident {
                    self.visit_ident(ident);
                }
                let function: &Function = &fn_expr.function;
                function.visit_children_with(self);
            }
            Expr::Arrow(arrow) => arrow.visit_children_with(self),
            _ => {}
        }
    }
}

/// The function expression `callee` evaluates to, unwrapping parentheses.
fn invoked_function(callee: &Expr) -> Option<&Expr> {
    match callee {
        Expr::Paren(paren) => invoked_function(&paren.expr),
        Expr::Fn(_) | Expr::Arrow(_) => Some(callee),
        _ => None,
    }
}

/// The function a call runs immediately: `f()`, `f.call(..)` or `f.apply(..)`.
fn called_function(callee: &Expr) -> Option<&Expr> {
    match callee {
        Expr::Paren(paren) => called_function(&paren.expr),
        Expr::Member(member) => match &member.prop {
            MemberProp::Ident(prop) if matches!(&*prop.sym, "call" | "apply") => {
                invoked_function(&member.obj)
            }
            _ => None,
        },
        _ => invoked_function(callee),
    }
}

impl Visit for SiteCollector<'_> {
    fn visit_function(&mut self, node: &Function) {
        self.nested(|this| node.visit_children_with(this));
    }

    fn visit_arrow_expr(&mut self, node: &ArrowExpr) {
        self.nested(|this| node.visit_children_with(this));
    }

    fn visit_constructor(&mut self, node: &Constructor) {
        self.nested(|this| node.visit_children_with(this));
    }

    fn visit_getter_prop(&mut self, node: &GetterProp) {
        self.nested(|this| node.visit_children_with(this));
    }

    fn visit_setter_prop(&mut self, node: &SetterProp) {
        self.nested(|this| node.visit_children_with(this));
    }

    fn visit_call_expr(&mut self, node: &CallExpr) {
        let Callee::Expr(callee) = &node.callee else {
            node.visit_children_with(self);
            return;
        };
        let Some(invoked) = called_function(callee) else {
            node.visit_children_with(self);
            return;
        };

        self.run_inline(invoked);
        for arg in &node.args {
            arg.visit_with(self);
        }
    }

    fn visit_new_expr(&mut self, node: &NewExpr) {
        let Some(invoked) = invoked_function(&node.callee) else {
            node.visit_children_with(self);
            return;
        };

        self.run_inline(invoked);
        for arg in node.args.iter().flatten() {
            arg.visit_with(self);
        }
    }

    fn visit_unary_expr(&mut self, node: &UnaryExpr) {
        if node.op == UnaryOp::Delete {
            self.check_mutation(&node.arg);
        }
        node.visit_children_with(self);
    }

    fn visit_update_expr(&mut self, node: &UpdateExpr) {
        self.check_mutation(&node.arg);
        node.visit_children_with(self);
    }

    fn visit_assign_expr(&mut self, node: &AssignExpr) {
        if let AssignTarget::Simple(SimpleAssignTarget::Member(member)) = &node.left {
            self.check_member_mutation(member);
        }
        node.visit_children_with(self);
    }

    fn visit_member_expr(&mut self, node: &MemberExpr) {
        if let Some(slot) = self.slot_name(node)
            && let (Some(start), Some(end)) =
                (self.parsed.offset(node.span.lo), self.parsed.offset(node.span.hi))
        {
            self.sites.push(ReferenceSite {
                slot,
                start,
                end,
                timing: self.timing(),
            });
            return;
        }
        node.visit_children_with(self);
    }

    fn visit_ident(&mut self, node: &Ident) {
        if &*node.sym == self.registry && self.dynamic_access.is_none() {
            self.dynamic_access = self.parsed.offset(node.span.lo);
        }
        self.identifiers.insert(node.sym.to_string());
    }
}
