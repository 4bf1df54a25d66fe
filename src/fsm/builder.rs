//! The FSM builder (component C4, spec §4.3): the central recursive
//! translator from a PSL sub-tree to a connected sub-graph.
//!
//! Grounded directly on `build_node()` and its per-operator helpers in
//! `examples/original_source/src/psl/psl-fsm.c`. Each `build_*` method
//! below corresponds to one `static fsm_state_t *build_*(...)` function
//! there; the edge-insertion helpers (`add_state`, `insert_edge`,
//! `add_edge`, `connect_abort`, `connect_default`) are the same four
//! primitives, reworked to operate on a `Vec`-backed arena instead of an
//! intrusive linked list.

use std::collections::HashSet;
use std::rc::Rc;

use crate::ast::{PslFlags, PslKind, PslNodeRef, PslSubKind};
use crate::diag::DiagnosticSink;
use crate::error::FsmError;
use crate::fsm::repeat::{self, RepeatBounds};
use crate::fsm::state::{EdgeKind, Fsm, FsmEdge, FsmKind, FsmState, StateId};
use crate::guard::Guard;
use crate::number::ConstFold;

/// Build the FSM for a top-level directive (`assert`/`assume`/`restrict`/
/// `cover`/a bare property). Never fails: tier-1/2 failures encountered
/// while walking the tree are recorded into `sink` and this function
/// degrades to a minimal, trivially-accepting FSM (spec §7.1) instead of
/// propagating an error, matching the propagation policy in spec §7 — the
/// caller is expected to check `sink.error_count()` before lowering.
pub fn build(directive: &PslNodeRef, folder: &dyn ConstFold, sink: &mut dyn DiagnosticSink) -> Fsm {
    let kind = if directive.kind == PslKind::Cover { FsmKind::Cover } else { FsmKind::Bare };
    let mut fsm = empty_fsm(kind, directive.clone());

    let result = {
        let mut builder = FsmBuilder { fsm: &mut fsm, folder, sink };
        builder.build_node(fsm_initial_id(), directive)
    };

    match result {
        Ok(final_id) => fsm.state_mut(final_id).accept = true,
        Err(_) => {
            fsm = empty_fsm(kind, directive.clone());
            fsm.state_mut(fsm_initial_id()).accept = true;
        }
    }

    fsm
}

fn fsm_initial_id() -> StateId {
    StateId(0)
}

fn empty_fsm(kind: FsmKind, src: PslNodeRef) -> Fsm {
    Fsm {
        kind,
        src: src.clone(),
        states: vec![FsmState {
            id: fsm_initial_id(),
            where_: src,
            edges: Vec::new(),
            initial: true,
            accept: false,
            strong: false,
            guard: None,
        }],
    }
}

struct FsmBuilder<'a> {
    fsm: &'a mut Fsm,
    folder: &'a dyn ConstFold,
    sink: &'a mut dyn DiagnosticSink,
}

impl<'a> FsmBuilder<'a> {
    fn add_state(&mut self, where_: PslNodeRef) -> StateId {
        let id = StateId(self.fsm.next_id());
        self.fsm.states.push(FsmState {
            id,
            where_,
            edges: Vec::new(),
            initial: false,
            accept: false,
            strong: false,
            guard: None,
        });
        id
    }

    /// Prepends unconditionally at the front of `from`'s edge list;
    /// used only by `connect_abort`, matching `insert_edge` in the
    /// original (always called with `&(from->edges)` as the insertion
    /// point there).
    fn insert_edge(&mut self, from: StateId, to: StateId, kind: EdgeKind, guard: Option<Rc<Guard>>) {
        self.fsm.state_mut(from).edges.insert(0, FsmEdge { dest: to, kind, guard });
    }

    /// Inserts a guarded edge just before the first unconditional edge
    /// (keeping any existing unconditional edge last), or appends at the
    /// end when adding an unconditional edge itself (spec §4.3.2).
    fn add_edge(&mut self, from: StateId, to: StateId, kind: EdgeKind, guard: Option<Rc<Guard>>) {
        let edges = &mut self.fsm.state_mut(from).edges;
        let pos = if guard.is_none() {
            edges.len()
        } else {
            edges.iter().position(|e| e.guard.is_none()).unwrap_or(edges.len())
        };
        edges.insert(pos, FsmEdge { dest: to, kind, guard });
    }

    fn cannot_handle(&self, p: &PslNodeRef, function: &'static str) -> ! {
        panic!("{}", FsmError::UnhandledKind { kind: p.kind, function });
    }

    /// `connect_abort(from, to, guard, visited)`: walks the subgraph
    /// reachable from `from`, prepending `from →[guard] to` onto every
    /// non-terminal state's edge list once its own descendants have been
    /// wired (post-order, so the sink itself is never revisited through
    /// the freshly-added edge).
    fn connect_abort(&mut self, from: StateId, to: StateId, guard: Rc<Guard>, visited: &mut HashSet<StateId>) {
        if self.fsm.state(from).is_final() {
            return;
        }
        if !visited.insert(from) {
            return;
        }
        let dests: Vec<StateId> = self.fsm.state(from).edges.iter().map(|e| e.dest).collect();
        for dest in dests {
            self.connect_abort(dest, to, guard.clone(), visited);
        }
        self.insert_edge(from, to, EdgeKind::Epsilon, Some(guard));
    }

    /// `connect_default(from, to, visited)`: adds an unconditional `NEXT`
    /// self-loop-ish default edge at every epsilon-reachable state
    /// lacking one already (used by `eventually` and suffix-implication's
    /// vacuous path).
    fn connect_default(&mut self, from: StateId, to: StateId, visited: &mut HashSet<StateId>) {
        if self.fsm.state(from).is_final() {
            return;
        }
        if !visited.insert(from) {
            return;
        }
        let dests: Vec<StateId> = self.fsm.state(from).edges.iter().map(|e| e.dest).collect();
        for dest in dests {
            self.connect_default(dest, to, visited);
        }
        if !self.fsm.state(from).has_default_edge() {
            self.add_edge(from, to, EdgeKind::Next, None);
        }
    }

    fn build_node(&mut self, state: StateId, p: &PslNodeRef) -> Result<StateId, FsmError> {
        match p.kind {
            PslKind::Never => {
                self.fsm.kind = FsmKind::Never;
                self.build_node(state, p.value())
            }
            PslKind::Always => {
                self.fsm.kind = FsmKind::Always;
                self.build_node(state, p.value())
            }
            // Directive wrappers and the clock annotation carry no graph
            // shape of their own; this crate's `build` already peels the
            // outermost one, but nested occurrences (e.g. an `assert`
            // used as a SERE operand by a test fixture) unwrap the same
            // way. The clock itself is consumed separately by
            // `crate::clock`, not by the builder.
            PslKind::Assert | PslKind::Assume | PslKind::Restrict | PslKind::Cover | PslKind::Clocked => {
                self.build_node(state, p.value())
            }
            // A bare HDL leaf can itself carry a repeat annotation (e.g.
            // `a[*0]`, built directly on the leaf rather than wrapped in a
            // `Sere` node by test fixtures and simple one-operand SEREs),
            // so check for one the same way `build_sequence` does for
            // `PslKind::Sere` before falling back to the single-edge leaf.
            PslKind::HdlExpr if p.has_repeat() => self.build_repeated_sere(state, p),
            PslKind::HdlExpr => Ok(self.build_hdl_leaf(state, p)),
            // `prev(x, n)` used directly as a (Boolean) property leaf:
            // same recipe as HDL_EXPR, since its `.hdl` is already a
            // resolved `HdlExpr::Prev` read-out (spec §4.8; see
            // `crate::ast::build::prev`).
            PslKind::BuiltinFcall if p.sub_kind == PslSubKind::BuiltinPrev => {
                let new = self.add_state(p.clone());
                self.add_edge(state, new, EdgeKind::Epsilon, Some(Guard::from_expr(p.clone())));
                Ok(new)
            }
            PslKind::Next => self.build_next(state, p),
            PslKind::Sere => self.build_sequence(state, p),
            PslKind::Logical => self.build_logical(state, p),
            PslKind::Until => Ok(self.build_until(state, p)),
            PslKind::Eventually => self.build_eventually(state, p),
            PslKind::Abort => self.build_abort(state, p),
            PslKind::Before => Ok(self.build_before(state, p)),
            PslKind::SuffixImpl => self.build_suffix_impl(state, p),
            PslKind::BuiltinFcall | PslKind::ClockDecl => self.cannot_handle(p, "build_node"),
        }
    }

    fn build_hdl_leaf(&mut self, state: StateId, p: &PslNodeRef) -> StateId {
        let new = self.add_state(p.clone());
        self.add_edge(state, new, EdgeKind::Epsilon, Some(Guard::from_expr(p.clone())));
        new
    }

    fn build_logical(&mut self, state: StateId, p: &PslNodeRef) -> Result<StateId, FsmError> {
        let lhs = p.operand(0).clone();
        let rhs = p.operand(1).clone();

        match p.sub_kind {
            PslSubKind::LogicIff => {
                // Only legal with Boolean HDL-expression operands.
                let left = self.add_state(p.clone());
                let right = self.add_state(p.clone());
                let accept = self.add_state(p.clone());
                self.add_edge(state, left, EdgeKind::Epsilon, Some(Guard::from_expr(lhs.clone())));
                self.add_edge(state, right, EdgeKind::Epsilon, Some(Guard::from_expr(rhs.clone())));
                self.add_edge(left, accept, EdgeKind::Epsilon, Some(Guard::from_expr(rhs)));
                self.add_edge(right, accept, EdgeKind::Epsilon, Some(Guard::from_expr(lhs)));
                self.add_edge(state, accept, EdgeKind::Epsilon, None);
                Ok(accept)
            }
            PslSubKind::LogicIf => {
                let left = self.add_state(p.clone());
                let right = self.build_node(left, &rhs)?;
                self.add_edge(state, left, EdgeKind::Epsilon, Some(Guard::from_expr(lhs)));
                self.add_edge(state, right, EdgeKind::Epsilon, None);
                Ok(right)
            }
            PslSubKind::LogicOr => {
                let accept = self.add_state(p.clone());
                let final_ = if lhs.kind == PslKind::HdlExpr {
                    self.add_edge(state, accept, EdgeKind::Epsilon, Some(Guard::from_expr(lhs)));
                    self.build_node(state, &rhs)?
                } else {
                    self.add_edge(state, accept, EdgeKind::Epsilon, Some(Guard::from_expr(rhs)));
                    self.build_node(state, &lhs)?
                };
                self.add_edge(final_, accept, EdgeKind::Epsilon, None);
                Ok(accept)
            }
            _ => self.cannot_handle(p, "build_logical"),
        }
    }

    /// `until!` (the `STRONG` flag) is not wired into the original's
    /// `build_until` at all — only `build_before` consults
    /// `PSL_F_STRONG` there. That leaves the strong variant's liveness
    /// obligation ungrounded in the source this crate is built from, but
    /// spec §8 scenario 5 requires it to fail at simulation end when `b`
    /// never holds, so this follows `build_before`'s own convention
    /// (mark the self-looping state `strong` when the flag is set) by
    /// analogy — see DESIGN.md's Open Questions.
    fn build_until(&mut self, state: StateId, p: &PslNodeRef) -> StateId {
        let lhs = p.operand(0).clone();
        let rhs = p.operand(1).clone();
        let strong = p.flags.contains(PslFlags::STRONG);

        if p.flags.contains(PslFlags::INCLUSIVE) {
            let test = self.add_state(p.clone());
            self.add_edge(state, test, EdgeKind::Epsilon, Some(Guard::from_expr(lhs)));
            self.fsm.state_mut(test).strong = strong;

            let new = self.add_state(p.clone());
            self.add_edge(test, new, EdgeKind::Next, Some(Guard::from_expr(rhs)));
            self.add_edge(test, state, EdgeKind::Next, None);
            new
        } else {
            let new = self.add_state(p.clone());
            self.add_edge(state, new, EdgeKind::Next, Some(Guard::from_expr(rhs)));
            self.add_edge(state, state, EdgeKind::Next, Some(Guard::from_expr(lhs)));
            self.fsm.state_mut(state).strong = strong;
            new
        }
    }

    fn build_abort(&mut self, state: StateId, p: &PslNodeRef) -> Result<StateId, FsmError> {
        let lhs = p.operand(0).clone();
        let rhs = p.operand(1).clone();

        let final_ = self.build_node(state, &lhs)?;

        let sink_state = self.add_state(p.clone());
        self.fsm.state_mut(sink_state).accept = true;

        let mut visited = HashSet::new();
        self.connect_abort(state, sink_state, Guard::from_expr(rhs), &mut visited);

        Ok(final_)
    }

    fn build_sere(&mut self, mut state: StateId, p: &PslNodeRef) -> Result<StateId, FsmError> {
        if !matches!(p.sub_kind, PslSubKind::SereConcat | PslSubKind::SereFusion) {
            self.cannot_handle(p, "build_sere");
        }
        let ekind = if p.sub_kind == PslSubKind::SereFusion { EdgeKind::Epsilon } else { EdgeKind::Next };
        let nops = p.operands_len();

        for i in 0..nops {
            let rhs = p.operand(i).clone();
            if i + 1 < nops {
                let lhs = self.build_node(state, &rhs)?;
                if lhs != state {
                    let new = self.add_state(p.clone());
                    self.add_edge(lhs, new, ekind, None);
                    state = new;
                }
            } else {
                state = self.build_node(state, &rhs)?;
            }
        }

        Ok(state)
    }

    /// Builds one repetition of the base sequence `p` carries its repeat
    /// annotation on, ignoring that annotation itself (it is already being
    /// consumed by the caller's unrolling loop). `p` is a `Sere` node for
    /// a multi-element repeated sequence, or a bare leaf (e.g. `a[*3]`
    /// built directly on an `HdlExpr`) for a single-element one.
    fn build_repeat_unit(&mut self, state: StateId, p: &PslNodeRef) -> Result<StateId, FsmError> {
        match p.kind {
            PslKind::Sere => self.build_sere(state, p),
            PslKind::HdlExpr => Ok(self.build_hdl_leaf(state, p)),
            _ => self.cannot_handle(p, "build_repeat_unit"),
        }
    }

    /// The repeated unit's first atom (`P[0]` in spec §4.3's "`[=n]`
    /// requires the matching expression to hold again" wording): a
    /// `Sere`'s first operand, or the leaf itself when the repeated unit
    /// is a bare HDL expression.
    fn first_atom(p: &PslNodeRef) -> PslNodeRef {
        match p.kind {
            PslKind::Sere => p.operand(0).clone(),
            _ => p.clone(),
        }
    }

    fn build_repeated_sere(&mut self, state: StateId, p: &PslNodeRef) -> Result<StateId, FsmError> {
        let repeat_spec = p.repeat.as_ref().expect("build_repeated_sere requires a repeat annotation");
        let RepeatBounds { low, high, infinite, noncon, goto_rep } =
            repeat::resolve(repeat_spec, self.folder, &p.locus, self.sink)?;

        // A skip state is only ever reachable from a non-last iteration
        // (`high > 1`); with exactly one iteration it would be an
        // unreferenced dead state, as happens for the collapsed bare
        // `[*]` bounds (`low = 0, high = 1`).
        let skip = if high > low && high > 1 { Some(self.add_state(p.clone())) } else { None };
        let initial = state;
        let mut state = state;
        let mut last_but_one = state;

        let mut i = 0;
        while i < high {
            let is_last = i == high - 1;

            last_but_one = state;
            state = self.build_repeat_unit(state, p)?;

            if noncon {
                let wait = self.add_state(p.clone());
                self.add_edge(last_but_one, wait, EdgeKind::Epsilon, None);
                self.add_edge(wait, last_but_one, EdgeKind::Next, None);
            }

            if !is_last {
                if i >= low - 1 {
                    let skip_id = skip.expect("skip state present whenever high > low");
                    self.add_edge(state, skip_id, EdgeKind::Epsilon, None);
                }

                let curr = state;
                state = self.add_state(p.clone());
                self.add_edge(curr, state, EdgeKind::Next, None);
            } else if noncon && !goto_rep {
                let aux = self.add_state(p.clone());
                let dead = self.add_state(p.clone());
                let wait = self.add_state(p.clone());
                self.add_edge(state, aux, EdgeKind::Next, None);
                self.add_edge(aux, dead, EdgeKind::Epsilon, Some(Guard::from_expr(Self::first_atom(p))));
                self.add_edge(aux, wait, EdgeKind::Epsilon, None);
                self.add_edge(wait, aux, EdgeKind::Next, None);
                self.add_edge(wait, state, EdgeKind::Epsilon, None);
            }

            i += 1;
        }

        if let Some(skip_id) = skip {
            self.add_edge(skip_id, state, EdgeKind::Epsilon, None);
        }

        if initial != state {
            if low == 0 {
                self.add_edge(initial, state, EdgeKind::Epsilon, None);
            }
            if infinite {
                self.add_edge(state, last_but_one, EdgeKind::Next, None);
            }
        }

        Ok(state)
    }

    fn build_sequence(&mut self, state: StateId, p: &PslNodeRef) -> Result<StateId, FsmError> {
        if p.has_repeat() {
            self.build_repeated_sere(state, p)
        } else {
            self.build_sere(state, p)
        }
    }

    fn build_next(&mut self, state: StateId, p: &PslNodeRef) -> Result<StateId, FsmError> {
        let mut cur = state;
        if p.has_delay() {
            let delay = p.delay.as_ref().expect("has_delay");
            let cycles = crate::number::fold_count(self.folder, delay, &p.locus, self.sink)
                .ok_or_else(|| FsmError::NonStaticNumber { locus: p.locus.clone() })?;
            for _ in 0..cycles {
                let new = self.add_state(p.clone());
                self.add_edge(cur, new, EdgeKind::Next, None);
                cur = new;
            }
        } else {
            let new = self.add_state(p.clone());
            self.add_edge(cur, new, EdgeKind::Next, None);
            cur = new;
        }
        self.build_node(cur, p.value())
    }

    fn build_eventually(&mut self, state: StateId, p: &PslNodeRef) -> Result<StateId, FsmError> {
        let wait = self.add_state(p.clone());
        let accept = self.build_node(wait, p.value())?;

        let mut visited = HashSet::new();
        self.connect_default(wait, wait, &mut visited);

        self.add_edge(state, wait, EdgeKind::Next, None);
        self.fsm.state_mut(wait).strong = true;

        Ok(accept)
    }

    fn build_before(&mut self, state: StateId, p: &PslNodeRef) -> StateId {
        let accept = self.add_state(p.clone());
        let fail = self.add_state(p.clone());

        self.fsm.state_mut(state).strong = p.flags.contains(PslFlags::STRONG);

        let a = p.operand(0).clone();
        let b = p.operand(1).clone();
        if p.flags.contains(PslFlags::INCLUSIVE) {
            self.add_edge(state, accept, EdgeKind::Epsilon, Some(Guard::from_expr(a)));
            self.add_edge(state, fail, EdgeKind::Epsilon, Some(Guard::from_expr(b)));
        } else {
            self.add_edge(state, fail, EdgeKind::Epsilon, Some(Guard::from_expr(b)));
            self.add_edge(state, accept, EdgeKind::Epsilon, Some(Guard::from_expr(a)));
        }

        self.add_edge(state, state, EdgeKind::Next, None);

        accept
    }

    fn build_suffix_impl(&mut self, state: StateId, p: &PslNodeRef) -> Result<StateId, FsmError> {
        let left = self.build_node(state, p.operand(0))?;
        let right = self.add_state(p.clone());
        let vacuous = self.add_state(p.clone());

        if p.sub_kind == PslSubKind::SuffixOverlap {
            self.add_edge(left, right, EdgeKind::Epsilon, None);
        } else {
            self.add_edge(left, right, EdgeKind::Next, None);
        }

        // Computed before building the consequent, so the vacuous path is
        // rooted at the antecedent's states rather than anything the
        // consequent introduces (spec §H.4).
        let mut visited = HashSet::new();
        self.connect_default(state, vacuous, &mut visited);

        let final_ = self.build_node(right, p.operand(1))?;
        self.add_edge(vacuous, final_, EdgeKind::Epsilon, None);

        Ok(final_)
    }
}
