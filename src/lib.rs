//! `pslfsm` — the PSL temporal-property compiler core.
//!
//! Translates a parsed Property Specification Language (PSL) assertion or
//! cover directive into an executable finite-state machine suitable for
//! simulation-time monitoring. The crate is organised as a straight
//! pipeline, leaves first:
//!
//! ```text
//! ast          read-only view over a typed PSL AST              (C1)
//! number       compile-time integer folding for repeat/delay     (C2)
//! guard        the edge-guard algebra                            (C3)
//! fsm          the builder, the state graph, the invariant check (C4, C5)
//! dot          DOT emission + external renderer invocation       (C6)
//! lower        the state-dispatch property lowerer               (C7)
//! clock        clock resolution, async-abort wiring              (C8)
//! prev         prev(x, n) shift-register lowering
//! hdl          the Boolean-expression evaluation boundary
//! coverage     the coverage-database boundary
//! diag, error  diagnostics and tier-1/2 errors
//! config       compile-time options and the pslfsm.toml loader
//! ```
//!
//! A directive is compiled in three steps:
//!
//! ```rust
//! use pslfsm::ast::build::*;
//! use pslfsm::diag::{Diagnostic, DiagnosticSink};
//! use pslfsm::number::IdentityFold;
//!
//! // assert always (req -> next ack), clocked on `clk`
//! let directive = clocked(
//!     always(logic_if(hdl_expr("req"), next(hdl_expr("ack"), None))),
//!     clock_decl("clk"),
//! );
//!
//! let mut diags: Vec<Diagnostic> = Vec::new();
//! let clock = pslfsm::clock::resolve(&directive).unwrap();
//! let inner = directive.value().clone();
//! let fsm = pslfsm::fsm::build_checked(&inner, &IdentityFold, &mut diags, true);
//! assert_eq!(diags.error_count(), 0);
//!
//! let mut cover = pslfsm::coverage::InMemoryCoverageDb::new(pslfsm::coverage::CoverageMask::empty());
//! let mut text = pslfsm::lower::TextIrEmitter::new();
//! pslfsm::lower::lower(&fsm, &clock, &[], &mut cover, pslfsm::coverage::CoverageMask::empty(), &mut text);
//! assert!(text.render().contains("block 1:"));
//! ```
//!
//! This crate deliberately does not parse PSL or lower VHDL expressions
//! (spec §1 "Out of scope"): those, along with the coverage database and
//! the simulation runtime, are modelled as narrow traits (see `number`,
//! `hdl`, `coverage`, `lower::IrEmitter`) so the compiler core can be built
//! and tested standalone.

pub mod ast;
pub mod clock;
pub mod config;
pub mod coverage;
pub mod diag;
pub mod dot;
pub mod error;
pub mod fsm;
pub mod guard;
pub mod hdl;
pub mod lower;
pub mod number;
pub mod prev;

pub use ast::{PslNode, PslNodeRef};
pub use config::CompileOptions;
pub use diag::{Diagnostic, DiagnosticSink, Severity};
pub use error::FsmError;
pub use fsm::{Fsm, FsmKind};
pub use guard::Guard;

/// Crate version, exposed the same way the teacher crate surfaces its own
/// `VERSION` constant for diagnostics and `pslfsmc --version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!VERSION.is_empty());
    }
}
