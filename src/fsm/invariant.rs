//! Epsilon-acyclicity checker (component C5, spec §4.4).
//!
//! Two-colour DFS over epsilon edges only. Grounded on `psl_loops_dfs()` /
//! `psl_detect_loops()` in `examples/original_source/src/psl/psl-fsm.c`,
//! which run this walk only in debug builds (`#ifdef DEBUG`) and `fatal`
//! on a back-edge. Here the caller decides whether to run it at all
//! (`CompileOptions::debug_checks`, spec §F), and a detected cycle panics
//! rather than returning a `Result` — per spec §7.3 this is a tier-3
//! internal-invariant violation, not a recoverable condition.

use crate::fsm::state::{EdgeKind, Fsm, StateId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Grey,
    Black,
}

/// Walks every epsilon edge reachable from the initial state and panics on
/// the first back-edge found. No-op cost when `debug_checks` is false;
/// callers are expected to gate the call itself, not rely on this function
/// short-circuiting.
pub fn check_acyclic(fsm: &Fsm) {
    let mut color = vec![Color::White; fsm.states.len()];
    for start in 0..fsm.states.len() {
        if color[start] == Color::White {
            visit(fsm, StateId(start as u32), &mut color);
        }
    }
}

fn visit(fsm: &Fsm, id: StateId, color: &mut [Color]) {
    color[id.index()] = Color::Grey;
    for edge in &fsm.state(id).edges {
        if edge.kind != EdgeKind::Epsilon {
            continue;
        }
        match color[edge.dest.index()] {
            Color::Grey => panic!(
                "internal error: epsilon cycle detected at state {} (via state {})",
                edge.dest, id
            ),
            Color::White => visit(fsm, edge.dest, color),
            Color::Black => {}
        }
    }
    color[id.index()] = Color::Black;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::hdl_expr;
    use crate::fsm::state::{Fsm, FsmEdge, FsmKind, FsmState};
    use crate::guard::Guard;

    fn bare_state(id: u32) -> FsmState {
        FsmState {
            id: StateId(id),
            where_: hdl_expr("x"),
            edges: Vec::new(),
            initial: id == 0,
            accept: false,
            strong: false,
            guard: None,
        }
    }

    #[test]
    fn acyclic_epsilon_chain_passes() {
        let mut s0 = bare_state(0);
        let mut s1 = bare_state(1);
        let s2 = bare_state(2);
        s0.edges.push(FsmEdge { dest: StateId(1), kind: EdgeKind::Epsilon, guard: None });
        s1.edges.push(FsmEdge { dest: StateId(2), kind: EdgeKind::Epsilon, guard: None });
        let fsm = Fsm { kind: FsmKind::Bare, src: hdl_expr("x"), states: vec![s0, s1, s2] };
        check_acyclic(&fsm); // must not panic
    }

    #[test]
    fn next_edge_self_loop_is_fine() {
        let mut s0 = bare_state(0);
        s0.edges.push(FsmEdge { dest: StateId(0), kind: EdgeKind::Next, guard: None });
        let fsm = Fsm { kind: FsmKind::Bare, src: hdl_expr("x"), states: vec![s0] };
        check_acyclic(&fsm); // NEXT self-loops are not epsilon cycles
    }

    #[test]
    #[should_panic(expected = "epsilon cycle")]
    fn epsilon_cycle_panics() {
        let mut s0 = bare_state(0);
        let mut s1 = bare_state(1);
        s0.edges.push(FsmEdge { dest: StateId(1), kind: EdgeKind::Epsilon, guard: None });
        s1.edges.push(FsmEdge {
            dest: StateId(0),
            kind: EdgeKind::Epsilon,
            guard: Some(Guard::from_expr(hdl_expr("x"))),
        });
        let fsm = Fsm { kind: FsmKind::Bare, src: hdl_expr("x"), states: vec![s0, s1] };
        check_acyclic(&fsm);
    }
}
