//! `InterpEmitter`: an [`IrEmitter`] that records a lowered FSM as an
//! in-memory [`PropertyProgram`] which can actually be *run*, tick by
//! tick, against a signal trace. Nothing in spec §1's external
//! collaborators provides a simulation runtime (it is explicitly out of
//! scope), so the concrete end-to-end scenarios in spec §8 would
//! otherwise be untestable; this is the "small interpreter" spec §9's
//! design notes mention as option (b) for driving a tick, built against
//! the pre-closed (option (a)) state table `lower::lower` already
//! produces.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::ast::Locus;
use crate::coverage::{CoverageDb, ItemTag};
use crate::fsm::{FsmKind, StateId};
use crate::guard::Guard;
use crate::hdl::HdlLower;
use crate::lower::ir::{BlockId, IrEmitter, FIRST_STATE_BLOCK};

#[derive(Debug, Clone, Default)]
struct StateProgram {
    accepts: Vec<(Option<Rc<Guard>>, Locus, Option<ItemTag>)>,
    edges: Vec<(Option<Rc<Guard>>, StateId, bool)>,
    assert_progress: Option<Locus>,
}

/// The runnable form of a lowered FSM: one [`StateProgram`] per state,
/// keyed by id, plus the FSM's kind (needed to decide whether an accept
/// is a coverage hit, a `never` failure, or a plain success marker).
#[derive(Debug, Clone)]
pub struct PropertyProgram {
    kind: FsmKind,
    initial: StateId,
    states: HashMap<StateId, StateProgram>,
}

impl Default for PropertyProgram {
    fn default() -> Self {
        Self { kind: FsmKind::Bare, initial: StateId(0), states: HashMap::new() }
    }
}

impl PropertyProgram {
    pub fn initial(&self) -> StateId {
        self.initial
    }
}

/// Builds a [`PropertyProgram`] by driving the same `lower::lower` call
/// a real emitter would receive. `current_state` tracks which per-state
/// block is being described; reserved blocks (`CASE`/`ABORT`/`PREV`) are
/// no-ops here since this emitter doesn't need a dispatch shell, only
/// the per-state recipe.
#[derive(Debug, Clone, Default)]
pub struct InterpEmitter {
    program: PropertyProgram,
    current: Option<StateId>,
}

impl InterpEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the emitter, returning the program it built. Call after
    /// `lower::lower` returns.
    pub fn into_program(mut self, kind: FsmKind) -> PropertyProgram {
        self.program.kind = kind;
        self.program
    }

    fn current_mut(&mut self) -> Option<&mut StateProgram> {
        let id = self.current?;
        Some(self.program.states.entry(id).or_default())
    }
}

fn state_id_of(block: BlockId) -> Option<StateId> {
    if block.0 >= FIRST_STATE_BLOCK {
        Some(StateId(block.0 - FIRST_STATE_BLOCK))
    } else {
        None
    }
}

impl IrEmitter for InterpEmitter {
    fn begin_block(&mut self, block: BlockId, _comment: &str) {
        self.current = state_id_of(block);
        if let Some(id) = self.current {
            if self.program.states.is_empty() {
                self.program.initial = id;
            }
            self.program.states.entry(id).or_default();
        }
    }

    fn sched_event(&mut self, _signal: &str) {}
    fn add_trigger(&mut self, _has_async_abort: bool) {}
    fn function_trigger(&mut self, _guard: &Rc<Guard>) {}
    fn case_dispatch(&mut self, _state_count: u32, _default: BlockId) {}
    fn comment(&mut self, _text: &str) {}

    fn enter_successor(&mut self, guard: Option<&Rc<Guard>>, dest: StateId, strong: bool) {
        if let Some(sp) = self.current_mut() {
            sp.edges.push((guard.cloned(), dest, strong));
        }
    }

    fn accept(&mut self, _kind: FsmKind, guard: Option<&Rc<Guard>>, locus: &Locus, tag: Option<ItemTag>) {
        if let Some(sp) = self.current_mut() {
            sp.accepts.push((guard.cloned(), locus.clone(), tag));
        }
    }

    fn assert_progress(&mut self, locus: &Locus) {
        if let Some(sp) = self.current_mut() {
            sp.assert_progress = Some(locus.clone());
        }
    }
}

/// One state's verdict for a single tick (spec §8 "each tick reporting
/// satisfaction state").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickEvent {
    /// A `cover` item was hit.
    CoverageHit { tag: Option<ItemTag>, locus: Locus },
    /// A `never`/`assert` violation (spec §6 "assertion failure").
    AssertionFailure { locus: Locus, message: String },
    /// An ordinary (non-`cover`/`never`) accept fired.
    Satisfied { locus: Locus },
}

#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub events: Vec<TickEvent>,
    pub live: Vec<StateId>,
}

impl TickReport {
    pub fn failures(&self) -> impl Iterator<Item = &TickEvent> {
        self.events.iter().filter(|e| matches!(e, TickEvent::AssertionFailure { .. }))
    }

    pub fn has_failure(&self) -> bool {
        self.events.iter().any(|e| matches!(e, TickEvent::AssertionFailure { .. }))
    }
}

/// Drives a [`PropertyProgram`] tick by tick (spec §5's "invoked once
/// per trigger firing" contract, minus the trigger plumbing itself,
/// which is out of scope). Starts with only the initial state live,
/// exactly as a freshly-reset property unit would (spec §4.6 step 2).
pub struct PropertyRun<'a> {
    program: &'a PropertyProgram,
    live: HashSet<StateId>,
    strong_live: HashSet<StateId>,
}

impl<'a> PropertyRun<'a> {
    pub fn new(program: &'a PropertyProgram) -> Self {
        let mut live = HashSet::new();
        live.insert(program.initial);
        Self { program, live, strong_live: HashSet::new() }
    }

    /// Advances one clock tick against `hdl` (already reflecting this
    /// tick's signal values; callers that reference `prev(x,n)` drive a
    /// [`crate::hdl::SignalHistory::advance`] beforehand). Coverage hits
    /// are recorded into `cover`.
    pub fn tick(&mut self, hdl: &dyn HdlLower, cover: &mut dyn CoverageDb) -> TickReport {
        let mut report = TickReport::default();
        let mut next_live = HashSet::new();
        let mut next_strong = HashSet::new();

        for id in &self.live {
            let Some(sp) = self.program.states.get(id) else { continue };

            let mut accepted = false;
            for (guard, locus, tag) in &sp.accepts {
                if guard.as_ref().map_or(true, |g| g.lower(hdl)) {
                    accepted = true;
                    match self.program.kind {
                        FsmKind::Cover => {
                            if let Some(t) = tag {
                                cover.record_hit(*t, locus.clone());
                            }
                            report.events.push(TickEvent::CoverageHit { tag: *tag, locus: locus.clone() });
                        }
                        FsmKind::Never => {
                            report.events.push(TickEvent::AssertionFailure {
                                locus: locus.clone(),
                                message: "never property violated".to_string(),
                            });
                        }
                        FsmKind::Bare | FsmKind::Always => {
                            report.events.push(TickEvent::Satisfied { locus: locus.clone() });
                        }
                    }
                }
            }

            let mut taken = false;
            for (guard, dest, strong) in &sp.edges {
                if guard.as_ref().map_or(true, |g| g.lower(hdl)) {
                    taken = true;
                    next_live.insert(*dest);
                    if *strong {
                        next_strong.insert(*dest);
                    }
                }
            }

            // A satisfied accept returns before the progress check, the
            // same way the original emits `emit_return` ahead of
            // `emit_assert(taken_reg, ...)` (psl-lower.c:152-181): an
            // accepting state that fired this tick never also raises a
            // "failed to progress" failure, even if it had no NEXT edge.
            if let Some(locus) = &sp.assert_progress {
                if !taken && !accepted {
                    report.events.push(TickEvent::AssertionFailure {
                        locus: locus.clone(),
                        message: "property failed to progress".to_string(),
                    });
                }
            }
        }

        self.live = next_live;
        self.strong_live = next_strong;
        report.live = self.live.iter().copied().collect();
        report
    }

    /// Call once after the signal trace ends (spec §5 "Strong states
    /// impose a liveness obligation"). Returns `Some(message)` when an
    /// unmet strong obligation remains live.
    pub fn finish(&self) -> Option<String> {
        if self.strong_live.is_empty() {
            None
        } else {
            Some("strong liveness obligation unmet at end of simulation".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::clock::ClockInfo;
    use crate::coverage::{CoverageMask, InMemoryCoverageDb};
    use crate::fsm::build as build_fsm;
    use crate::hdl::SignalSnapshot;
    use crate::number::IdentityFold;

    fn run_program(directive: &crate::ast::PslNodeRef) -> (PropertyProgram, crate::fsm::FsmKind) {
        let mut sink: Vec<crate::diag::Diagnostic> = Vec::new();
        let fsm = build_fsm(directive, &IdentityFold, &mut sink);
        let clock = ClockInfo { clock: crate::ast::HdlExpr::Signal("clk".into()), async_abort: None };
        let mut cover = InMemoryCoverageDb::new(CoverageMask::FUNCTIONAL);
        let mut emitter = InterpEmitter::new();
        crate::lower::lower(&fsm, &clock, &[], &mut cover, CoverageMask::FUNCTIONAL, &mut emitter);
        let kind = fsm.kind;
        (emitter.into_program(kind), kind)
    }

    #[test]
    fn always_next_req_implies_ack_has_no_failure_on_matching_trace() {
        // assert always (req -> next ack)
        let (program, _) = run_program(&always(logic_if(hdl_expr("req"), next(hdl_expr("ack"), None))));
        let mut run = PropertyRun::new(&program);
        let mut cover = InMemoryCoverageDb::new(CoverageMask::empty());
        let trace = [(false, false), (true, false), (false, true), (false, false)];
        let mut any_failure = false;
        for (req, ack) in trace {
            let snap = SignalSnapshot::from_pairs([("req", req), ("ack", ack)]);
            let report = run.tick(&snap, &mut cover);
            any_failure |= report.has_failure();
        }
        assert!(!any_failure);
    }

    #[test]
    fn always_next_req_implies_ack_fails_when_ack_missing() {
        let (program, _) = run_program(&always(logic_if(hdl_expr("req"), next(hdl_expr("ack"), None))));
        let mut run = PropertyRun::new(&program);
        let mut cover = InMemoryCoverageDb::new(CoverageMask::empty());
        let trace = [(false, false), (true, false), (false, false), (false, false)];
        let mut any_failure = false;
        for (req, ack) in trace {
            let snap = SignalSnapshot::from_pairs([("req", req), ("ack", ack)]);
            let report = run.tick(&snap, &mut cover);
            any_failure |= report.has_failure();
        }
        assert!(any_failure);
    }

    #[test]
    fn cover_sequence_records_exactly_one_hit() {
        let (program, _) = run_program(&cover(sere_concat(vec![hdl_expr("a"), hdl_expr("b"), hdl_expr("c")])));
        let mut run = PropertyRun::new(&program);
        let mut cover_db = InMemoryCoverageDb::new(CoverageMask::FUNCTIONAL);
        let trace = [(true, false, false), (false, true, false), (false, false, true)];
        for (a, b, c) in trace {
            let snap = SignalSnapshot::from_pairs([("a", a), ("b", b), ("c", c)]);
            run.tick(&snap, &mut cover_db);
        }
        assert_eq!(cover_db.hit_count(), 1);
    }

    #[test]
    fn never_fault_fails_the_tick_fault_goes_high() {
        let (program, _) = run_program(&never(hdl_expr("fault")));
        let mut run = PropertyRun::new(&program);
        let mut cover_db = InMemoryCoverageDb::new(CoverageMask::empty());
        let mut failed_at = None;
        for (i, fault) in [false, false, false, false, true].into_iter().enumerate() {
            let snap = SignalSnapshot::from_pairs([("fault", fault)]);
            let report = run.tick(&snap, &mut cover_db);
            if report.has_failure() {
                failed_at = Some(i);
            }
        }
        assert_eq!(failed_at, Some(4));
    }

    #[test]
    fn strong_eventually_unmet_fails_at_finish() {
        // assert always (start -> eventually! done), done never rises.
        let (program, _) =
            run_program(&always(logic_if(hdl_expr("start"), eventually(hdl_expr("done")))));
        let mut run = PropertyRun::new(&program);
        let mut cover_db = InMemoryCoverageDb::new(CoverageMask::empty());
        for (start, done) in [(true, false), (false, false), (false, false)] {
            let snap = SignalSnapshot::from_pairs([("start", start), ("done", done)]);
            run.tick(&snap, &mut cover_db);
        }
        assert!(run.finish().is_some());
    }

    #[test]
    fn weak_until_has_no_failure_when_b_never_holds() {
        let (program, _) = run_program(&until(hdl_expr("a"), hdl_expr("b"), false));
        let mut run = PropertyRun::new(&program);
        let mut cover_db = InMemoryCoverageDb::new(CoverageMask::empty());
        for _ in 0..10 {
            let snap = SignalSnapshot::from_pairs([("a", true), ("b", false)]);
            run.tick(&snap, &mut cover_db);
        }
        assert!(run.finish().is_none());
    }
}
