//! FSM data model (spec §3): states, edges, and the FSM itself.
//!
//! States live in a dense arena (`Vec<FsmState>`) addressed by
//! [`StateId`], edges are small per-state vectors of `(dest, kind, guard)`
//! tuples — spec §9's "Graph ownership" note prefers this over
//! heap-allocated linked nodes to avoid the C original's manual
//! `xcalloc`/intrusive-list bookkeeping (`fsm->tail`, `s->next`) while
//! keeping O(1) id-to-state lookup.

use std::rc::Rc;

use crate::ast::PslNodeRef;
use crate::guard::Guard;

/// Dense, zero-based state id assigned in construction order (spec §3:
/// `id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub u32);

impl StateId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for StateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Edge kind (spec §3 "FSM edge"): `NEXT` consumes a clock tick, `EPSILON`
/// is taken within the same tick and must never form a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Next,
    Epsilon,
}

/// An outgoing transition (spec §3 "FSM edge").
#[derive(Debug, Clone)]
pub struct FsmEdge {
    pub dest: StateId,
    pub kind: EdgeKind,
    /// `None` = unconditional.
    pub guard: Option<Rc<Guard>>,
}

/// A state in the FSM (spec §3 "FSM state").
#[derive(Debug, Clone)]
pub struct FsmState {
    pub id: StateId,
    /// PSL node used as source locus for diagnostics raised at this state.
    pub where_: PslNodeRef,
    /// Insertion-ordered outgoing edges. Edges with a guard are kept
    /// before the unconditional edge, when one exists (spec §4.3.2 "Edge
    /// insertion discipline") — this ordering is semantically load-bearing
    /// at simulation time, not cosmetic.
    pub edges: Vec<FsmEdge>,
    pub initial: bool,
    pub accept: bool,
    /// Liveness obligation: if execution terminates while this state is
    /// live, the property must fail.
    pub strong: bool,
    /// Additional guard that must hold to treat entry as accepting (used
    /// by `before`/suffix-implication vacuous paths).
    pub guard: Option<Rc<Guard>>,
}

impl FsmState {
    /// True if this state has no outgoing edges (the original's "Final
    /// state" check in `connect_abort`/`connect_default`).
    pub fn is_final(&self) -> bool {
        self.edges.is_empty()
    }

    /// True if any outgoing edge is unconditional (guard `None`).
    pub fn has_default_edge(&self) -> bool {
        self.edges.iter().any(|e| e.guard.is_none())
    }
}

/// FSM kind (spec §3 "FSM"), driven by the outermost directive operator
/// encountered while walking (`NEVER`/`ALWAYS` mutate this mid-build, see
/// `examples/original_source/src/psl/psl-fsm.c`'s `build_node`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsmKind {
    Bare,
    Always,
    Never,
    Cover,
}

/// The built FSM (spec §3 "FSM").
#[derive(Debug, Clone)]
pub struct Fsm {
    pub kind: FsmKind,
    pub src: PslNodeRef,
    /// Dense, index-addressed state arena; `states[0]` is always the
    /// initial state (spec §3 invariant 1).
    pub states: Vec<FsmState>,
}

impl Fsm {
    pub fn next_id(&self) -> u32 {
        self.states.len() as u32
    }

    pub fn state(&self, id: StateId) -> &FsmState {
        &self.states[id.index()]
    }

    pub fn state_mut(&mut self, id: StateId) -> &mut FsmState {
        &mut self.states[id.index()]
    }

    pub fn initial_id(&self) -> StateId {
        StateId(0)
    }

    /// `psl_fsm_repeating()`: the initial state re-enters itself every
    /// tick for these three kinds (spec §4.6).
    pub fn is_repeating(&self) -> bool {
        matches!(self.kind, FsmKind::Cover | FsmKind::Always | FsmKind::Never)
    }
}
