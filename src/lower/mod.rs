//! Property lowerer (component C7, spec §4.6).
//!
//! Translates a built [`crate::fsm::Fsm`] into calls against an
//! [`IrEmitter`]: one basic block per state, a `CASE` dispatch over
//! state ids, guard evaluation via the epsilon closure (spec §9, see
//! [`crate::fsm::closure`]), successor notification, and terminal
//! assertion/coverage/never emission. Grounded on `psl_lower_directive`
//! and `psl_lower_state` in
//! `examples/original_source/src/psl/psl-lower.c`.

pub mod interp;
pub mod ir;
pub mod text;

pub use interp::{InterpEmitter, PropertyProgram, PropertyRun, TickEvent, TickReport};
pub use ir::{IrEmitter, BlockId, ABORT_BLOCK, CASE_BLOCK, PREV_BLOCK};
pub use text::TextIrEmitter;

use crate::clock::ClockInfo;
use crate::coverage::{CoverageDb, CoverageMask, ItemTag};
use crate::fsm::{epsilon_closure, Fsm, FsmKind};
use crate::prev::PrevSite;

/// Reserved-block numbering plus the `PREV` re-entry sentinel (spec
/// §H.1, §H.3): `next_id` is a synthetic extra state purely so the
/// `PREV` block can be re-entered; `next_id + 1` is returned when no
/// real state transition fired this tick.
#[derive(Debug, Clone, Copy)]
pub struct PropertyUnit {
    state_count: u32,
}

impl PropertyUnit {
    pub fn new(fsm: &Fsm) -> Self {
        Self { state_count: fsm.next_id() }
    }

    pub fn prev_sentinel(&self) -> u32 {
        self.state_count
    }

    pub fn prev_continuation(&self) -> u32 {
        self.state_count + 1
    }
}

/// Lowers `fsm` by driving `emitter` through the full property-unit
/// recipe of spec §4.6. `prev_sites` lists every `prev(x,n)` reference
/// found in the directive (spec §4.8, via
/// [`crate::prev::find_prev_sites`]); lowering only needs to describe
/// that the `PREV` block performs their shifts, the actual register
/// storage lives in a [`crate::hdl::SignalHistory`] at runtime.
pub fn lower(
    fsm: &Fsm,
    clock: &ClockInfo,
    prev_sites: &[PrevSite],
    cover: &mut dyn CoverageDb,
    coverage_mask: CoverageMask,
    emitter: &mut dyn IrEmitter,
) -> PropertyUnit {
    let unit = PropertyUnit::new(fsm);

    emitter.begin_block(CASE_BLOCK, "dispatch on current state id");
    emitter.begin_block(ABORT_BLOCK, "unreachable unless a strong state is live");
    emitter.begin_block(PREV_BLOCK, "advance prev(x,n) shift registers");
    for site in prev_sites {
        emitter.comment(&format!("shift prev({}, {}) register", site.inner, site.ticks));
    }

    let mut signals = Vec::new();
    crate::clock::signals_in(&clock.clock, &mut signals);
    for signal in &signals {
        emitter.sched_event(signal);
    }
    if let Some(abort) = &clock.async_abort {
        let guard = crate::guard::Guard::from_expr(abort.operand(1).clone());
        emitter.function_trigger(&guard);
    }
    emitter.add_trigger(clock.async_abort.is_some());
    emitter.case_dispatch(unit.prev_continuation(), ABORT_BLOCK);

    let tag = tag_for(fsm, cover, coverage_mask);

    for state in &fsm.states {
        emitter.begin_block(ir::state_block(state.id), "");
        if fsm.is_repeating() && state.initial {
            emitter.comment("every-tick restart");
            emitter.enter_successor(None, state.id, false);
        }

        let closure = epsilon_closure(fsm, state.id);
        for accept in &closure.accepts {
            emitter.accept(fsm.kind, accept.guard.as_ref(), &accept.locus, tag);
        }
        for edge in &closure.edges {
            emitter.enter_successor(edge.guard.as_ref(), edge.dest, edge.strong);
        }
        if !matches!(fsm.kind, FsmKind::Cover | FsmKind::Never) {
            emitter.assert_progress(&state.where_.locus);
        }
    }

    unit
}

fn tag_for(fsm: &Fsm, cover: &mut dyn CoverageDb, mask: CoverageMask) -> Option<ItemTag> {
    if fsm.kind != FsmKind::Cover || !cover.cover_enabled(mask) {
        return None;
    }
    let scope = cover.cover_create_scope(&fsm.src);
    cover.cover_add_items_for(scope, &fsm.src)
}
