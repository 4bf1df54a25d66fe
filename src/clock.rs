//! Clock resolution and asynchronous-abort wiring (component C8, spec
//! §4.8).
//!
//! Grounded on `psl_outer_async_abort()` and the clock-handling half of
//! `psl_lower_directive()` in
//! `examples/original_source/src/psl/psl-lower.c`. A property unit is
//! driven by exactly one clock signal (spec §1 Non-goals: "multiple
//! clocks"); an `abort ... async` wrapped directly around the clocked
//! property additionally needs an OR-combined sensitivity on the abort
//! condition, evaluated independent of the clock edge.

use crate::ast::{HdlExpr, PslKind, PslNodeRef, PslSubKind};
use crate::error::FsmError;

/// The clock signal driving a property unit, plus an optional
/// asynchronous abort condition that pre-empts it (spec §4.8).
#[derive(Debug, Clone)]
pub struct ClockInfo {
    pub clock: HdlExpr,
    pub async_abort: Option<PslNodeRef>,
}

/// Wrapper kinds `psl_outer_async_abort` walks through while looking for
/// a top-level `abort ... async` (spec §H.6). Order doesn't matter here
/// since each is just a single-operand unwrap via `value()`.
fn is_transparent_wrapper(kind: PslKind) -> bool {
    matches!(
        kind,
        PslKind::Always | PslKind::Never | PslKind::Assume | PslKind::Cover | PslKind::Clocked
    )
}

/// `psl_outer_async_abort(p)`: walks through the wrapper kinds listed
/// above looking for a top-level `ABORT` node with `AbortAsync` sub-kind.
/// Returns `None` as soon as a non-wrapper, non-abort node is reached —
/// an async abort must be the *direct* child of the wrapper chain, not
/// nested arbitrarily deep inside the property.
pub fn outer_async_abort(directive: &PslNodeRef) -> Option<PslNodeRef> {
    let mut node = directive.clone();
    loop {
        if node.kind == PslKind::Abort && node.sub_kind == PslSubKind::AbortAsync {
            return Some(node);
        }
        if is_transparent_wrapper(node.kind) {
            node = node.value().clone();
            continue;
        }
        return None;
    }
}

/// Resolves the single clock driving `directive` (spec §4.8 "Single-clock
/// restriction"). Walks the same wrapper chain as [`outer_async_abort`]
/// looking for the first `Clocked` node's `clock_ref`, then verifies no
/// other `Clocked` node beneath it declares a different signal.
pub fn resolve(directive: &PslNodeRef) -> Result<ClockInfo, FsmError> {
    let clock_node = find_first_clock(directive)
        .ok_or_else(|| FsmError::MissingClock { locus: directive.locus.clone() })?;
    let clock = clock_node
        .hdl
        .clone()
        .expect("ClockDecl node must carry an HDL expression");

    if let Some(other) = find_second_clock(directive, &clock) {
        return Err(FsmError::MultipleClocks { locus: other.locus.clone() });
    }

    Ok(ClockInfo { clock, async_abort: outer_async_abort(directive) })
}

fn find_first_clock(node: &PslNodeRef) -> Option<PslNodeRef> {
    if node.kind == PslKind::Clocked {
        return node.clock_ref.clone();
    }
    if is_transparent_wrapper(node.kind) || node.kind == PslKind::Abort {
        for operand in &node.operands {
            if let Some(found) = find_first_clock(operand) {
                return Some(found);
            }
        }
    }
    None
}

/// Collects every signal reference within an HDL expression (spec §4.8
/// "visiting each signal reference in `clk_expr`... `sched_event`").
pub fn signals_in(expr: &HdlExpr, out: &mut Vec<String>) {
    match expr {
        HdlExpr::Signal(name) => out.push(name.clone()),
        HdlExpr::Const(_) => {}
        HdlExpr::Not(e) => signals_in(e, out),
        HdlExpr::And(l, r) | HdlExpr::Or(l, r) => {
            signals_in(l, out);
            signals_in(r, out);
        }
        // `prev(x, n)` still reads `x` every tick, so it's still a
        // clock signal dependency the same way `x` alone would be.
        HdlExpr::Prev(e, _) => signals_in(e, out),
    }
}

fn find_second_clock(node: &PslNodeRef, expected: &HdlExpr) -> Option<PslNodeRef> {
    if node.kind == PslKind::Clocked {
        if let Some(decl) = &node.clock_ref {
            if decl.hdl.as_ref() != Some(expected) {
                return Some(decl.clone());
            }
        }
    }
    for operand in &node.operands {
        if let Some(found) = find_second_clock(operand, expected) {
            return Some(found);
        }
    }
    None
}
