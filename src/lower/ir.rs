//! The `IrEmitter` trait (component C7, spec §4.6, §6 "Outputs").
//!
//! Condenses the `emit_*` inventory named in spec §6 down to the
//! operations [`crate::lower::lower`] actually performs while walking a
//! state (block structure, trigger wiring, guarded dispatch, accept
//! handling, progress assertion). The scalar/array shift-register
//! mechanics behind `emit_var`/`emit_index`/`emit_copy`/`emit_load`/
//! `emit_store` are folded into [`crate::prev::PrevBank`] instead of
//! being routed through the emitter, since this crate specialises
//! `prev(x,n)` to the Boolean domain (see `DESIGN.md`).

use std::rc::Rc;

use crate::ast::Locus;
use crate::coverage::ItemTag;
use crate::fsm::{FsmKind, StateId};
use crate::guard::Guard;

/// Reserved and per-state block ids (spec §H.1): `CASE = 1`, `ABORT = 2`,
/// `PREV = 3`, states start at 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

pub const CASE_BLOCK: BlockId = BlockId(1);
pub const ABORT_BLOCK: BlockId = BlockId(2);
pub const PREV_BLOCK: BlockId = BlockId(3);
pub const FIRST_STATE_BLOCK: u32 = 4;

pub fn state_block(id: StateId) -> BlockId {
    BlockId(FIRST_STATE_BLOCK + id.0)
}

pub trait IrEmitter {
    /// Begins a reserved or per-state block.
    fn begin_block(&mut self, block: BlockId, comment: &str);

    /// `emit_sched_event`: registers sensitivity on a clocked signal
    /// (spec §4.8).
    fn sched_event(&mut self, signal: &str);

    /// `emit_add_trigger` / `emit_or_trigger`: installs the combined
    /// clock (and, when present, async-abort) trigger (spec §4.8).
    fn add_trigger(&mut self, has_async_abort: bool);

    /// `emit_function_trigger`: the side function evaluating an
    /// asynchronous abort condition (spec §4.8).
    fn function_trigger(&mut self, guard: &Rc<Guard>);

    /// `emit_case`: dispatch on the current state id, defaulting to
    /// `ABORT_BLOCK` (spec §4.6 step 4).
    fn case_dispatch(&mut self, state_count: u32, default: BlockId);

    /// `emit_cond` + `emit_enter_state`: guarded transition to `dest`
    /// (spec §4.6 "For each outgoing edge"). `guard = None` means
    /// unconditional.
    fn enter_successor(&mut self, guard: Option<&Rc<Guard>>, dest: StateId, strong: bool);

    /// A (possibly guarded) acceptance at the current state (spec §4.6
    /// "If accept"). `Cover` records a coverage hit (optionally tagged);
    /// `Never` raises an assertion failure; other kinds just `return`.
    fn accept(&mut self, kind: FsmKind, guard: Option<&Rc<Guard>>, locus: &Locus, tag: Option<ItemTag>);

    /// `emit_assert`: the end-of-state "taken" progress assertion (spec
    /// §4.6 final step), skipped for `Cover`/`Never` states by the
    /// caller.
    fn assert_progress(&mut self, locus: &Locus);

    fn comment(&mut self, text: &str);
}
