//! Guard algebra (component C3).
//!
//! A guard is the Boolean condition carried on an edge: a single HDL
//! expression node, its negation, or a binary AND/OR of two guards (spec
//! §3 "Guard"). Guards are immutable after creation and pure — they may be
//! evaluated every clock tick (spec §4.2). Grounded on
//! `psl_lower_guard()` / `guard_binop_t` in
//! `examples/original_source/src/psl/psl-lower.c`.

use std::fmt;
use std::rc::Rc;

use crate::ast::{HdlExpr, PslNodeRef};
use crate::hdl::HdlLower;

/// Combinator kind for a binary guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    And,
    Or,
}

/// A leaf or compound Boolean guard (spec §3 "Guard").
#[derive(Debug, Clone)]
pub enum Guard {
    /// A PSL HDL-expression node whose Boolean value the HDL lowerer
    /// evaluates (spec §4.2).
    Expr(PslNodeRef),
    Not(Rc<Guard>),
    BinOp { kind: BinOpKind, left: Rc<Guard>, right: Rc<Guard> },
}

impl Guard {
    /// `from_expr(node)` (spec §4.2).
    pub fn from_expr(node: PslNodeRef) -> Rc<Guard> {
        Rc::new(Guard::Expr(node))
    }

    pub fn not(g: Rc<Guard>) -> Rc<Guard> {
        Rc::new(Guard::Not(g))
    }

    pub fn and(a: Rc<Guard>, b: Rc<Guard>) -> Rc<Guard> {
        Rc::new(Guard::BinOp { kind: BinOpKind::And, left: a, right: b })
    }

    pub fn or(a: Rc<Guard>, b: Rc<Guard>) -> Rc<Guard> {
        Rc::new(Guard::BinOp { kind: BinOpKind::Or, left: a, right: b })
    }

    /// `lower(g, hdl_ctx) -> ir_bool` (spec §4.2): recursively evaluate the
    /// guard against the given HDL lowering context. The 9-valued
    /// `std_logic`-to-Boolean coercion (comparing against the '1' code)
    /// lives in [`crate::hdl::HdlLower`] implementations; at this layer a
    /// leaf expression is simply "true" or "false" for the current tick.
    pub fn lower(&self, hdl: &dyn HdlLower) -> bool {
        match self {
            Guard::Expr(node) => {
                let expr = node
                    .hdl
                    .as_ref()
                    .expect("HdlExpr node must carry an HDL expression");
                hdl.eval_bool(expr)
            }
            Guard::Not(g) => !g.lower(hdl),
            Guard::BinOp { kind: BinOpKind::And, left, right } => {
                left.lower(hdl) && right.lower(hdl)
            }
            Guard::BinOp { kind: BinOpKind::Or, left, right } => {
                left.lower(hdl) || right.lower(hdl)
            }
        }
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::Expr(node) => match &node.hdl {
                Some(expr) => write!(f, "{expr}"),
                None => write!(f, "<expr>"),
            },
            Guard::Not(g) => write!(f, "not ({g})"),
            Guard::BinOp { kind: BinOpKind::And, left, right } => write!(f, "({left} and {right})"),
            Guard::BinOp { kind: BinOpKind::Or, left, right } => write!(f, "({left} or {right})"),
        }
    }
}

/// Convenience: build a [`Guard::Expr`] directly from an [`HdlExpr`]
/// without a backing `PslNodeRef`, for call sites that only have the raw
/// expression (e.g. the fixed `prev(x, 0)` comparison re-used by repeated
/// non-consecutive SERE closing, spec §4.3 step 2's `P[0]` re-test).
pub fn expr_guard(expr: HdlExpr) -> Rc<Guard> {
    Guard::from_expr(crate::ast::build::hdl(expr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::hdl_expr;
    use crate::hdl::SignalSnapshot;

    #[test]
    fn leaf_guard_evaluates_signal() {
        let g = Guard::from_expr(hdl_expr("req"));
        let snap = SignalSnapshot::from_pairs([("req", true)]);
        assert!(g.lower(&snap));
    }

    #[test]
    fn not_and_or_compose() {
        let req = Guard::from_expr(hdl_expr("req"));
        let ack = Guard::from_expr(hdl_expr("ack"));
        let g = Guard::or(Guard::not(req.clone()), ack.clone());

        let snap = SignalSnapshot::from_pairs([("req", true), ("ack", false)]);
        assert!(!g.lower(&snap));

        let snap2 = SignalSnapshot::from_pairs([("req", false), ("ack", false)]);
        assert!(g.lower(&snap2));
    }
}
