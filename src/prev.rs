//! `prev(x, n)` lowering (spec §4.8, supplemented feature H.3).
//!
//! Grounded on `psl_lower_fcall()` in
//! `examples/original_source/src/psl/psl-fsm.c` (dispatch) and
//! `psl-lower.c` (the shift-register construction itself): `prev` reads
//! the value a signal held `n` ticks ago by maintaining an `n`-deep
//! shift register that advances once per clock tick. The original
//! operates over arbitrary VHDL types via a statically-sized array
//! temporary; this crate specialises the register to the Boolean domain
//! `HdlLower` already works in; the bound checks (`n > 512`, non-static
//! array length) are preserved verbatim since they are user-facing
//! diagnostics, not implementation detail.

use crate::ast::{HdlExpr, Locus, NumExpr, PslKind, PslNodeRef, PslSubKind};
use crate::diag::{Diagnostic, DiagnosticSink};
use crate::error::FsmError;
use crate::number::ConstFold;

/// Default `n` when `prev(x)` omits the tick count (spec §4.8).
pub const DEFAULT_TICKS: i64 = 1;

/// Resolves and validates `prev(x, n)`'s tick count against `max_prev`
/// (`CompileOptions::max_prev`, normally 512). `delay = None` means the
/// default of one tick.
pub fn resolve_ticks(
    delay: &Option<NumExpr>,
    folder: &dyn ConstFold,
    locus: &Locus,
    max_prev: u32,
) -> Result<u32, FsmError> {
    let n = match delay {
        None => DEFAULT_TICKS,
        Some(expr) => folder
            .fold_int(expr)
            .ok_or_else(|| FsmError::NonStaticNumber { locus: locus.clone() })?,
    };
    if n < 0 || n as u32 > max_prev {
        return Err(FsmError::PrevTooLarge { locus: locus.clone() });
    }
    Ok(n as u32)
}

/// A statically-sized shift register backing one `prev(x, n)` reference.
/// `vars[0]` is the oldest sample (`n` ticks back), `vars[num - 1]` is the
/// most recent (grounded on the original's `vars[i] = vars[i + 1]` shift
/// loop run for `i in 0..num-1` followed by a store of the current sample
/// into the last slot).
#[derive(Debug, Clone)]
pub struct PrevBank {
    vars: Vec<bool>,
}

impl PrevBank {
    /// `num` must be `n + 1` (the current sample plus `n` historical
    /// ones); `n = 0` degenerates to a single-element bank that always
    /// reads the just-stored sample.
    pub fn new(n: u32) -> Self {
        Self { vars: vec![false; n as usize + 1] }
    }

    /// `vars[0]`: the value `n` ticks ago.
    pub fn read(&self) -> bool {
        self.vars[0]
    }

    /// Advances the register by one clock tick: shifts every slot down
    /// and stores `current` at the top.
    pub fn tick(&mut self, current: bool) {
        let len = self.vars.len();
        for i in 0..len - 1 {
            self.vars[i] = self.vars[i + 1];
        }
        self.vars[len - 1] = current;
    }
}

/// One `prev(x, n)` reference found while walking a directive (spec
/// §4.8, supplemented feature H.3): the site's locus (for diagnostics
/// and the `PREV`-block comment emitted by `lower::lower`), the
/// resolved, validated tick count, and the inner signal expression the
/// shift register samples.
#[derive(Debug, Clone)]
pub struct PrevSite {
    pub locus: Locus,
    pub ticks: u32,
    pub inner: HdlExpr,
}

/// `n`/`inner` pairs the shift-register bank is keyed by; two `prev`
/// references over the same signal and tick count share one bank
/// (mirrors the original's "allocate `n` shift-register variables"
/// being per distinct `(x, n)`, not per call site).
pub type PrevKey = (String, u32);

impl PrevSite {
    pub fn key(&self) -> PrevKey {
        (self.inner.to_string(), self.ticks)
    }
}

/// Walks `directive` collecting every `prev(x, n)` reference (spec
/// §4.8), validating each against `max_prev` the same way
/// [`resolve_ticks`] does for a single call, and recording a
/// `Limitation`/`Error` diagnostic for any that fail. Sites that fail
/// validation are omitted from the result — callers degrade by simply
/// not wiring a shift register for them (the FSM builder still produced
/// a guard leaf for the node; it will always read `false` since no bank
/// backs it, which is a safe default for an already-diagnosed error).
pub fn find_prev_sites(
    directive: &PslNodeRef,
    folder: &dyn ConstFold,
    sink: &mut dyn DiagnosticSink,
    max_prev: u32,
) -> Vec<PrevSite> {
    let mut out = Vec::new();
    walk(directive, folder, sink, max_prev, &mut out);
    out
}

fn walk(
    node: &PslNodeRef,
    folder: &dyn ConstFold,
    sink: &mut dyn DiagnosticSink,
    max_prev: u32,
    out: &mut Vec<PrevSite>,
) {
    if node.kind == PslKind::BuiltinFcall && node.sub_kind == PslSubKind::BuiltinPrev {
        match resolve_ticks(&node.delay, folder, &node.locus, max_prev) {
            Ok(ticks) => {
                let inner = match &node.hdl {
                    Some(HdlExpr::Prev(inner, _)) => (**inner).clone(),
                    _ => unreachable!("build::prev always sets .hdl to HdlExpr::Prev"),
                };
                out.push(PrevSite { locus: node.locus.clone(), ticks, inner });
            }
            Err(err) => {
                sink.report(Diagnostic::limitation(err.to_string(), node.locus.clone()));
            }
        }
    }
    for operand in &node.operands {
        walk(operand, folder, sink, max_prev, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::IdentityFold;

    #[test]
    fn default_tick_count_is_one() {
        let n = resolve_ticks(&None, &IdentityFold, &Locus::synthetic(), 512).unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn exactly_512_is_accepted() {
        let n = resolve_ticks(&Some(NumExpr::Int(512)), &IdentityFold, &Locus::synthetic(), 512).unwrap();
        assert_eq!(n, 512);
    }

    #[test]
    fn above_512_is_rejected() {
        let err =
            resolve_ticks(&Some(NumExpr::Int(513)), &IdentityFold, &Locus::synthetic(), 512).unwrap_err();
        assert!(matches!(err, FsmError::PrevTooLarge { .. }));
    }

    #[test]
    fn non_static_count_is_rejected() {
        let err =
            resolve_ticks(&Some(NumExpr::NonStatic), &IdentityFold, &Locus::synthetic(), 512).unwrap_err();
        assert!(matches!(err, FsmError::NonStaticNumber { .. }));
    }

    #[test]
    fn bank_reads_value_from_n_ticks_ago() {
        let mut bank = PrevBank::new(2); // prev(x, 2)
        bank.tick(true); // t=0: x=true
        bank.tick(false); // t=1: x=false
        bank.tick(true); // t=2: x=true
        // after 3 ticks, slot 0 holds the value from t=0.
        assert!(bank.read());
    }

    #[test]
    fn find_prev_sites_collects_resolved_ticks() {
        use crate::ast::build::*;
        let directive = always(clocked(
            logic_if(hdl_expr("en"), prev(hdl_expr("req"), Some(3))),
            clock_decl("clk"),
        ));
        let mut sink: Vec<Diagnostic> = Vec::new();
        let sites = find_prev_sites(&directive, &IdentityFold, &mut sink, 512);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].ticks, 3);
        assert!(sink.is_empty());
    }

    #[test]
    fn find_prev_sites_reports_oversize_as_limitation() {
        use crate::ast::build::*;
        let directive = always(prev(hdl_expr("req"), Some(513)));
        let mut sink: Vec<Diagnostic> = Vec::new();
        let sites = find_prev_sites(&directive, &IdentityFold, &mut sink, 512);
        assert!(sites.is_empty());
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].severity, crate::diag::Severity::Limitation);
    }

    #[test]
    fn zero_tick_bank_reads_the_last_store() {
        let mut bank = PrevBank::new(0);
        bank.tick(true);
        assert!(bank.read());
        bank.tick(false);
        assert!(!bank.read());
    }
}
