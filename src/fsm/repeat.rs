//! Repeat bound resolution (spec §4.3.1).
//!
//! Grounded on `get_repeat_bounds()` in
//! `examples/original_source/src/psl/psl-fsm.c`: the five repeat syntaxes
//! share one resolution routine, differing only in their `(noncon,
//! goto_rep)` flags and in whether an explicit range is required.

use crate::ast::{Locus, NumExpr, NumRange, Repeat, RepeatKind};
use crate::diag::DiagnosticSink;
use crate::error::FsmError;
use crate::number::{fold_count, ConstFold, INFINITE};

/// Resolved repeat bounds (spec §4.3.1 table, post `infinite` collapse).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatBounds {
    pub low: i64,
    pub high: i64,
    pub infinite: bool,
    pub noncon: bool,
    pub goto_rep: bool,
}

pub fn resolve(
    repeat: &Repeat,
    folder: &dyn ConstFold,
    locus: &Locus,
    sink: &mut dyn DiagnosticSink,
) -> Result<RepeatBounds, FsmError> {
    let (mut noncon, mut goto_rep) = (false, false);
    let (low, high) = match repeat.kind {
        RepeatKind::Plus => (1, INFINITE),
        RepeatKind::Goto => {
            goto_rep = true;
            noncon = true;
            resolve_range(&repeat.range, folder, locus, sink)?
        }
        RepeatKind::Equal => {
            noncon = true;
            resolve_range(&repeat.range, folder, locus, sink)?
        }
        RepeatKind::Times => resolve_range(&repeat.range, folder, locus, sink)?,
    };

    // When `high = infinity`, collapse `high` down to the smallest bound
    // that still unrolls at least one repetition for `build_repeated_sere`
    // to attach its infinite back-edge to (spec §4.3.1): `low` for `[+]`
    // (already >= 1), but `low.max(1)` for bare `[*]`, where `low = 0`
    // would otherwise collapse to `high = 0` and skip building the
    // repeated body at all, leaving no back-edge to recover the
    // unboundedness from.
    let (high, infinite) = if high >= INFINITE { (low.max(1), true) } else { (high, false) };

    Ok(RepeatBounds { low, high, infinite, noncon, goto_rep })
}

fn resolve_range(
    range: &Option<NumRange>,
    folder: &dyn ConstFold,
    locus: &Locus,
    sink: &mut dyn DiagnosticSink,
) -> Result<(i64, i64), FsmError> {
    match range {
        None => Ok((0, INFINITE)),
        Some(NumRange::Single(n)) => {
            let v = fold(folder, n, locus, sink)?;
            Ok((v, v))
        }
        Some(NumRange::Range(lo, hi)) => {
            let lo = fold(folder, lo, locus, sink)?;
            let hi = fold(folder, hi, locus, sink)?;
            Ok((lo, hi))
        }
    }
}

fn fold(
    folder: &dyn ConstFold,
    expr: &NumExpr,
    locus: &Locus,
    sink: &mut dyn DiagnosticSink,
) -> Result<i64, FsmError> {
    fold_count(folder, expr, locus, sink).ok_or_else(|| FsmError::NonStaticNumber { locus: locus.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::IdentityFold;

    fn r(kind: RepeatKind, range: Option<NumRange>) -> Repeat {
        Repeat { kind, range }
    }

    #[test]
    fn plus_is_one_to_infinite() {
        let mut sink: Vec<crate::diag::Diagnostic> = Vec::new();
        let b = resolve(&r(RepeatKind::Plus, None), &IdentityFold, &Locus::synthetic(), &mut sink).unwrap();
        assert_eq!(b.low, 1);
        assert_eq!(b.high, 1); // collapsed
        assert!(b.infinite);
        assert!(!b.noncon);
        assert!(!b.goto_rep);
    }

    #[test]
    fn times_star_is_zero_to_infinite() {
        let mut sink: Vec<crate::diag::Diagnostic> = Vec::new();
        let b = resolve(&r(RepeatKind::Times, None), &IdentityFold, &Locus::synthetic(), &mut sink).unwrap();
        assert_eq!(b.low, 0);
        assert!(b.infinite);
    }

    #[test]
    fn times_singleton_range_has_no_skip() {
        let mut sink: Vec<crate::diag::Diagnostic> = Vec::new();
        let rep = r(RepeatKind::Times, Some(NumRange::Single(NumExpr::Int(3))));
        let b = resolve(&rep, &IdentityFold, &Locus::synthetic(), &mut sink).unwrap();
        assert_eq!((b.low, b.high, b.infinite), (3, 3, false));
    }

    #[test]
    fn goto_sets_noncon_and_goto_rep() {
        let mut sink: Vec<crate::diag::Diagnostic> = Vec::new();
        let rep = r(RepeatKind::Goto, Some(NumRange::Range(NumExpr::Int(2), NumExpr::Int(4))));
        let b = resolve(&rep, &IdentityFold, &Locus::synthetic(), &mut sink).unwrap();
        assert_eq!((b.low, b.high), (2, 4));
        assert!(b.noncon);
        assert!(b.goto_rep);
    }

    #[test]
    fn equal_sets_noncon_only() {
        let mut sink: Vec<crate::diag::Diagnostic> = Vec::new();
        let rep = r(RepeatKind::Equal, Some(NumRange::Single(NumExpr::Int(2))));
        let b = resolve(&rep, &IdentityFold, &Locus::synthetic(), &mut sink).unwrap();
        assert!(b.noncon);
        assert!(!b.goto_rep);
    }

    #[test]
    fn non_static_bound_aborts() {
        let mut sink: Vec<crate::diag::Diagnostic> = Vec::new();
        let rep = r(RepeatKind::Times, Some(NumRange::Single(NumExpr::NonStatic)));
        let err = resolve(&rep, &IdentityFold, &Locus::synthetic(), &mut sink).unwrap_err();
        assert!(matches!(err, FsmError::NonStaticNumber { .. }));
    }
}
