//! FSM construction (components C4/C5): a PSL property directive compiled
//! into an explicit, labelled state graph (spec §3, §4.3, §4.4).

pub mod builder;
pub mod closure;
pub mod invariant;
pub mod repeat;
pub mod state;

pub use builder::build;
pub use closure::{closure as epsilon_closure, Closure, ClosureAccept, ClosureEdge};
pub use state::{EdgeKind, Fsm, FsmEdge, FsmKind, FsmState, StateId};

use crate::diag::DiagnosticSink;
use crate::number::ConstFold;
use crate::ast::PslNodeRef;

/// Builds an FSM and, when `debug_checks` is set, immediately validates
/// its epsilon-acyclicity invariant (spec §4.4, §C "Compile-time debug
/// flag"). This is the entry point most callers want; `builder::build`
/// remains available directly for callers that manage the check
/// themselves (e.g. to compare timing with and without it).
pub fn build_checked(
    directive: &PslNodeRef,
    folder: &dyn ConstFold,
    sink: &mut dyn DiagnosticSink,
    debug_checks: bool,
) -> Fsm {
    let fsm = builder::build(directive, folder, sink);
    if debug_checks {
        invariant::check_acyclic(&fsm);
    }
    fsm
}
