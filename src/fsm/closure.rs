//! Epsilon-closure computation (spec §9 "NFA vs code generation", option
//! (a): "store, for each state, its epsilon-closure set and the set of
//! `NEXT` transitions labelled by a conjunction of guards collected
//! along the closure path"). The builder (C4) produces an ε-NFA; the
//! lowerer (C7) only ever drives `NEXT` transitions and accept checks,
//! so this module bridges the two by transparently walking epsilon
//! edges ahead of time and folding their guards into the transitions
//! and acceptance events found on the other side.

use std::collections::HashSet;
use std::rc::Rc;

use crate::ast::Locus;
use crate::fsm::state::{EdgeKind, Fsm, StateId};
use crate::guard::Guard;

/// A `NEXT` transition reachable from a state after transparently
/// crossing zero or more epsilon edges, labelled with the AND of every
/// guard encountered along the way.
#[derive(Debug, Clone)]
pub struct ClosureEdge {
    pub guard: Option<Rc<Guard>>,
    pub dest: StateId,
    pub strong: bool,
}

/// An acceptance reachable purely through epsilon edges (including the
/// zero-step case: the start state itself being accepting).
#[derive(Debug, Clone)]
pub struct ClosureAccept {
    pub guard: Option<Rc<Guard>>,
    pub locus: Locus,
}

#[derive(Debug, Clone, Default)]
pub struct Closure {
    pub accepts: Vec<ClosureAccept>,
    pub edges: Vec<ClosureEdge>,
}

/// `a AND b`, treating `None` as the identity (an unconditional "true").
pub fn and_opt(a: Option<Rc<Guard>>, b: Option<Rc<Guard>>) -> Option<Rc<Guard>> {
    match (a, b) {
        (None, None) => None,
        (Some(g), None) | (None, Some(g)) => Some(g),
        (Some(a), Some(b)) => Some(Guard::and(a, b)),
    }
}

/// Computes the epsilon closure of `start`: every accept event and every
/// `NEXT` transition reachable without consuming a clock tick. Guards
/// from epsilon hops on the path are conjoined into the event's guard.
/// Cycles cannot occur here since epsilon-acyclicity is an FSM invariant
/// (spec §4.4) checked separately; this walk still carries a visited set
/// defensively so a violated invariant degrades to a bounded traversal
/// rather than an infinite loop.
pub fn closure(fsm: &Fsm, start: StateId) -> Closure {
    let mut result = Closure::default();
    let mut visited = HashSet::new();
    visit(fsm, start, None, &mut visited, &mut result);
    result
}

fn visit(
    fsm: &Fsm,
    id: StateId,
    acc_guard: Option<Rc<Guard>>,
    visited: &mut HashSet<StateId>,
    result: &mut Closure,
) {
    if !visited.insert(id) {
        return;
    }
    let state = fsm.state(id);
    if state.accept {
        result.accepts.push(ClosureAccept {
            guard: and_opt(acc_guard.clone(), state.guard.clone()),
            locus: state.where_.locus.clone(),
        });
    }
    for edge in &state.edges {
        let combined = and_opt(acc_guard.clone(), edge.guard.clone());
        match edge.kind {
            EdgeKind::Next => {
                result.edges.push(ClosureEdge {
                    guard: combined,
                    dest: edge.dest,
                    strong: fsm.state(edge.dest).strong,
                });
            }
            EdgeKind::Epsilon => visit(fsm, edge.dest, combined, visited, result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::hdl_expr;
    use crate::fsm::state::{Fsm, FsmEdge, FsmKind, FsmState};

    fn bare(id: u32, accept: bool) -> FsmState {
        FsmState {
            id: StateId(id),
            where_: hdl_expr("x"),
            edges: Vec::new(),
            initial: id == 0,
            accept,
            strong: false,
            guard: None,
        }
    }

    #[test]
    fn next_edge_with_no_epsilon_hop_has_identity_guard_conjunction() {
        let mut s0 = bare(0, false);
        s0.edges.push(FsmEdge {
            dest: StateId(1),
            kind: EdgeKind::Next,
            guard: Some(Guard::from_expr(hdl_expr("a"))),
        });
        let s1 = bare(1, false);
        let fsm = Fsm { kind: FsmKind::Bare, src: hdl_expr("x"), states: vec![s0, s1] };
        let c = closure(&fsm, StateId(0));
        assert_eq!(c.edges.len(), 1);
        assert!(c.accepts.is_empty());
    }

    #[test]
    fn epsilon_hop_conjoins_guard_onto_the_next_edge_beyond_it() {
        let mut s0 = bare(0, false);
        s0.edges.push(FsmEdge {
            dest: StateId(1),
            kind: EdgeKind::Epsilon,
            guard: Some(Guard::from_expr(hdl_expr("a"))),
        });
        let mut s1 = bare(1, false);
        s1.edges.push(FsmEdge {
            dest: StateId(2),
            kind: EdgeKind::Next,
            guard: Some(Guard::from_expr(hdl_expr("b"))),
        });
        let s2 = bare(2, false);
        let fsm = Fsm { kind: FsmKind::Bare, src: hdl_expr("x"), states: vec![s0, s1, s2] };
        let c = closure(&fsm, StateId(0));
        assert_eq!(c.edges.len(), 1);
        // guard must be "a and b", not just "b".
        assert_eq!(c.edges[0].guard.as_ref().unwrap().to_string(), "(a and b)");
    }

    #[test]
    fn epsilon_reachable_accept_is_reported_with_accumulated_guard() {
        let mut s0 = bare(0, false);
        s0.edges.push(FsmEdge {
            dest: StateId(1),
            kind: EdgeKind::Epsilon,
            guard: Some(Guard::from_expr(hdl_expr("a"))),
        });
        let s1 = bare(1, true);
        let fsm = Fsm { kind: FsmKind::Bare, src: hdl_expr("x"), states: vec![s0, s1] };
        let c = closure(&fsm, StateId(0));
        assert_eq!(c.accepts.len(), 1);
        assert!(c.accepts[0].guard.is_some());
    }

    #[test]
    fn start_state_itself_accepting_is_a_zero_step_accept() {
        let s0 = bare(0, true);
        let fsm = Fsm { kind: FsmKind::Bare, src: hdl_expr("x"), states: vec![s0] };
        let c = closure(&fsm, StateId(0));
        assert_eq!(c.accepts.len(), 1);
        assert!(c.accepts[0].guard.is_none());
    }
}
