//! Result-carrying errors for the handful of tier-1/2 failures that abort
//! construction of a single directive (spec §7). Most tier-1/2 failures
//! are instead just recorded into a [`crate::diag::DiagnosticSink`] and
//! construction continues with a best-effort replacement value; these
//! variants are reserved for the cases that cannot continue at all.
//!
//! Tier-3 failures (spec §7.3: epsilon cycles, an unhandled PSL or guard
//! kind) are not represented here — they `panic!`/`unreachable!` at the
//! point of detection, matching the teacher crate's own treatment of
//! genuinely-unreachable dispatch arms and the original's
//! `fatal_at(...)`/`fatal_trace(...)` calls, which never return.

use crate::ast::{Locus, PslKind};

#[derive(Debug, thiserror::Error)]
pub enum FsmError {
    /// A `prev(x, n)` with `n > 512` (spec §4.8, §6).
    #[error("sorry, Number higher than 512 is not supported ({locus})")]
    PrevTooLarge { locus: Locus },

    /// `prev(x, n)` over an array whose length is not statically known
    /// (spec §4.8, §6).
    #[error("sorry, only constant length arrays are supported ({locus})")]
    NonConstantArrayLength { locus: Locus },

    /// An unsupported PSL built-in function (spec §1 "Non-goals": only
    /// `prev` is supported).
    #[error("sorry, this built-in function is not supported ({locus})")]
    UnsupportedBuiltin { locus: Locus },

    /// A repetition/delay count could not be folded to a static integer
    /// (spec §7.1); construction of the enclosing directive is abandoned.
    #[error("static value of PSL Number is not known ({locus})")]
    NonStaticNumber { locus: Locus },

    /// More than one clock at the top of a directive (spec §1 Non-goals,
    /// §4.8 "Single-clock restriction").
    #[error("property has more than one clock ({locus})")]
    MultipleClocks { locus: Locus },

    /// The directive's value is not wrapped in a `Clocked` node at all.
    #[error("property is not associated with a clock ({locus})")]
    MissingClock { locus: Locus },

    /// Caught only in debug builds by [`crate::fsm::invariant`]; release
    /// builds never construct this because the check is skipped, matching
    /// the original's `#ifdef DEBUG` guard.
    #[error("internal error: cannot handle PSL kind {kind} in {function}")]
    UnhandledKind { kind: PslKind, function: &'static str },
}
