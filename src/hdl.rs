//! HDL expression lowering boundary (spec §1 "out of scope: the VHDL
//! expression lowering layer"; spec §4.2: "invoking the HDL lowerer on
//! leaf expressions and coercing a 9-valued `std_logic` to Boolean by
//! comparing with the '1' code").
//!
//! A real toolchain resolves `HdlExpr` leaves against its own typed VHDL
//! expression representation. This crate only needs *some* way to turn a
//! leaf expression into a Boolean so guards can be evaluated, so the
//! boundary is a trait plus one reference implementation, a direct
//! evaluator over [`crate::ast::HdlExpr`] used by tests and by the bundled
//! `pslfsmc` binary.

use std::collections::HashMap;

use crate::ast::HdlExpr;
use crate::prev::PrevBank;

/// Resolves a leaf HDL expression to a Boolean value for the current
/// clock tick. Implementations own whatever signal-value snapshot the
/// simulation runtime provides (spec §5: "within one invocation it sees a
/// consistent snapshot of signal values").
pub trait HdlLower {
    fn eval_bool(&self, expr: &HdlExpr) -> bool;
}

/// A flat signal-value snapshot, the simplest possible [`HdlLower`]: every
/// named signal not present defaults to `false`, matching an unasserted
/// `std_logic` line reset to '0'.
#[derive(Debug, Clone, Default)]
pub struct SignalSnapshot {
    values: HashMap<String, bool>,
}

impl SignalSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: bool) -> &mut Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, bool)>) -> Self {
        let mut s = Self::default();
        for (k, v) in pairs {
            s.set(k, v);
        }
        s
    }
}

impl HdlLower for SignalSnapshot {
    fn eval_bool(&self, expr: &HdlExpr) -> bool {
        match expr {
            HdlExpr::Signal(name) => *self.values.get(name).unwrap_or(&false),
            HdlExpr::Const(b) => *b,
            HdlExpr::Not(e) => !self.eval_bool(e),
            HdlExpr::And(l, r) => self.eval_bool(l) && self.eval_bool(r),
            HdlExpr::Or(l, r) => self.eval_bool(l) || self.eval_bool(r),
            // No history without a `SignalHistory`; reading the present
            // value is the least surprising fallback for callers that
            // only ever exercise `prev`-free properties against this
            // flat snapshot.
            HdlExpr::Prev(inner, _) => self.eval_bool(inner),
        }
    }
}

/// A signal-value snapshot with `prev(x, n)` support (spec §4.8): one
/// [`PrevBank`] per distinct `(signal text, n)` pair referenced by a
/// directive, advanced exactly once per clock tick by [`Self::advance`]
/// — matching the real runtime's "`PREV` block runs before `CASE`
/// dispatch" ordering (spec §4.6 step 3) rather than on every guard
/// evaluation, since a guard may be evaluated more than once per tick
/// (spec §4.2) and must not re-shift the register each time.
#[derive(Debug, Clone, Default)]
pub struct SignalHistory {
    current: SignalSnapshot,
    banks: HashMap<(String, u32), PrevBank>,
}

impl SignalHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a `prev(x, n)` site so its bank exists before the first
    /// tick (sites discovered via [`crate::prev::find_prev_sites`]).
    pub fn register(&mut self, inner: &HdlExpr, ticks: u32) {
        self.banks
            .entry((inner.to_string(), ticks))
            .or_insert_with(|| PrevBank::new(ticks));
    }

    /// Installs `values` as the current tick's snapshot, then advances
    /// every registered bank by sampling its inner expression against
    /// that new snapshot (spec §4.8): each bank's shift register stores
    /// this tick's own value, the same way [`crate::prev::PrevBank::tick`]
    /// is driven directly from the signal's present value one tick at a
    /// time.
    pub fn advance<'a>(&mut self, values: impl IntoIterator<Item = (&'a str, bool)>) {
        self.current = SignalSnapshot::default();
        for (name, value) in values {
            self.current.set(name, value);
        }
        let keys: Vec<(String, u32)> = self.banks.keys().cloned().collect();
        for key in keys {
            let inner = reconstruct_signal(&key.0);
            let sample = self.current.eval_bool(&inner);
            self.banks.get_mut(&key).expect("key from self.banks").tick(sample);
        }
    }
}

/// `prev`'s bank key only ever holds the `Display` text of a signal
/// reference built from [`HdlExpr::Signal`]/`Const`/`Not`/`And`/`Or`
/// leaves (never another `Prev`, since `prev(prev(x,n),m)` is not valid
/// PSL); for the flat leaves this crate actually constructs that text
/// round-trips as a bare signal name, which is all [`SignalSnapshot`]
/// needs to look the value up again.
fn reconstruct_signal(text: &str) -> HdlExpr {
    HdlExpr::Signal(text.to_string())
}

impl HdlLower for SignalHistory {
    fn eval_bool(&self, expr: &HdlExpr) -> bool {
        match expr {
            HdlExpr::Prev(inner, ticks) => self
                .banks
                .get(&(inner.to_string(), *ticks))
                .map(|b| b.read())
                .unwrap_or(false),
            HdlExpr::Signal(_) | HdlExpr::Const(_) => self.current.eval_bool(expr),
            HdlExpr::Not(e) => !self.eval_bool(e),
            HdlExpr::And(l, r) => self.eval_bool(l) && self.eval_bool(r),
            HdlExpr::Or(l, r) => self.eval_bool(l) || self.eval_bool(r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_signal_defaults_false() {
        let snap = SignalSnapshot::new();
        assert!(!snap.eval_bool(&HdlExpr::Signal("req".into())));
    }

    #[test]
    fn and_or_not_compose() {
        let snap = SignalSnapshot::from_pairs([("a", true), ("b", false)]);
        let expr = HdlExpr::Or(
            Box::new(HdlExpr::And(
                Box::new(HdlExpr::Signal("a".into())),
                Box::new(HdlExpr::Not(Box::new(HdlExpr::Signal("b".into())))),
            )),
            Box::new(HdlExpr::Const(false)),
        );
        assert!(snap.eval_bool(&expr));
    }

    #[test]
    fn signal_history_reads_value_two_ticks_back() {
        let mut hist = SignalHistory::new();
        let req = HdlExpr::Signal("req".into());
        hist.register(&req, 2);
        let prev2 = HdlExpr::Prev(Box::new(req.clone()), 2);

        hist.advance([("req", true)]); // t=0
        hist.advance([("req", false)]); // t=1
        hist.advance([("req", true)]); // t=2
        // at t=2, prev(req,2) should read t=0's value.
        assert!(hist.eval_bool(&prev2));
    }

    #[test]
    fn signal_history_tracks_current_value_independently() {
        let mut hist = SignalHistory::new();
        hist.advance([("a", true), ("b", false)]);
        assert!(hist.eval_bool(&HdlExpr::Signal("a".into())));
        assert!(!hist.eval_bool(&HdlExpr::Signal("b".into())));
    }
}
