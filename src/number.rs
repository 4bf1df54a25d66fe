//! Number folder (component C2).
//!
//! Evaluates compile-time integer sub-expressions embedded in PSL
//! (repetition counts, `next[k]`'s delay, `prev(x, n)`'s `n`). Grounded on
//! `get_number()` in `examples/original_source/src/psl/psl-fsm.c` and
//! `get_psl_number()` in `psl-utils.c`, which both wrap a single constant
//! folder call (`folded_int`) with the same two diagnostics.

use crate::ast::{Locus, NumExpr};
use crate::diag::{Diagnostic, DiagnosticSink};

/// The sentinel used to represent an unbounded repetition upper bound
/// (spec §4.1: "infinity" is the highest representable positive int).
pub const INFINITE: i64 = i32::MAX as i64;

/// External constant folder contract (spec §1 "out of scope": the
/// surrounding toolchain's constant folder; spec §6 `folded_int`,
/// `folded_length`). This crate's [`NumExpr`] already carries the folded
/// value or a `NonStatic` marker, so the default folder is trivial; a real
/// integration would instead call out to an HDL constant evaluator here.
pub trait ConstFold {
    fn fold_int(&self, expr: &NumExpr) -> Option<i64>;
}

/// The folder used when `NumExpr` already is the fold result (tests, and
/// any caller that pre-folds before handing nodes to this crate).
pub struct IdentityFold;

impl ConstFold for IdentityFold {
    fn fold_int(&self, expr: &NumExpr) -> Option<i64> {
        match expr {
            NumExpr::Int(v) => Some(*v),
            NumExpr::NonStatic => None,
        }
    }
}

/// Fold `expr` to a non-negative count, recording diagnostics the same way
/// `get_number()` does: a non-foldable value is a hard error (caller
/// should abort construction of the enclosing directive); a negative value
/// is a warning and gets clamped to zero.
///
/// Returns `None` only when the value could not be folded at all (spec
/// §7.1: "abort graph construction for non-static bounds by returning an
/// empty FSM with a diagnostic").
pub fn fold_count(
    folder: &dyn ConstFold,
    expr: &NumExpr,
    locus: &Locus,
    sink: &mut dyn DiagnosticSink,
) -> Option<i64> {
    match folder.fold_int(expr) {
        None => {
            sink.report(Diagnostic::error(
                "static value of PSL Number is not known",
                locus.clone(),
            ));
            None
        }
        Some(v) if v < 0 => {
            sink.report(Diagnostic::warning(
                format!("PSL Number {v} is negative"),
                locus.clone(),
            ));
            Some(0)
        }
        Some(v) => Some(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_plain_literal() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let v = fold_count(&IdentityFold, &NumExpr::Int(4), &Locus::synthetic(), &mut sink);
        assert_eq!(v, Some(4));
        assert!(sink.is_empty());
    }

    #[test]
    fn negative_is_warned_and_clamped() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let v = fold_count(&IdentityFold, &NumExpr::Int(-3), &Locus::synthetic(), &mut sink);
        assert_eq!(v, Some(0));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn non_static_is_a_hard_error() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let v = fold_count(&IdentityFold, &NumExpr::NonStatic, &Locus::synthetic(), &mut sink);
        assert_eq!(v, None);
        assert_eq!(sink.error_count(), 1);
    }
}
