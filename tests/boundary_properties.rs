//! Quantified/boundary behaviours called out in spec §8: the ones with a
//! crisp pass/fail condition that are worth pinning down as integration
//! tests against the public API rather than only as builder unit tests.

use pslfsm::ast::build::*;
use pslfsm::ast::{NumExpr, NumRange, Repeat, RepeatKind};
use pslfsm::diag::{Diagnostic, DiagnosticSink};
use pslfsm::fsm::{build as build_fsm, invariant::check_acyclic};
use pslfsm::number::IdentityFold;
use pslfsm::prev::find_prev_sites;

fn build(directive: &pslfsm::ast::PslNodeRef) -> (pslfsm::fsm::Fsm, Vec<Diagnostic>) {
    let mut sink: Vec<Diagnostic> = Vec::new();
    let fsm = build_fsm(directive, &IdentityFold, &mut sink);
    (fsm, sink)
}

/// `next[0](a)` is equivalent to `a` itself: no extra hop should appear.
#[test]
fn next_zero_delay_is_equivalent_to_its_inner_property() {
    let (with_next, _) = build(&assert(next(hdl_expr("a"), Some(0))));
    let (bare, _) = build(&assert(hdl_expr("a")));
    assert_eq!(with_next.states.len(), bare.states.len());
}

/// `a[*0]` permits immediate acceptance without consuming any ticks.
#[test]
fn star_zero_repetition_accepts_the_empty_match() {
    let rep = repeated(hdl_expr("a"), Repeat { kind: RepeatKind::Times, range: Some(NumRange::Single(NumExpr::Int(0))) });
    let (fsm, sink) = build(&assert(rep));
    assert_eq!(sink.error_count(), 0);
    assert!(fsm.states[0].accept || fsm.states.iter().any(|s| s.accept && s.edges.is_empty()));
    check_acyclic(&fsm);
}

/// `a[*2..2]` (a singleton range written as a range) behaves like `a[*2]`:
/// exactly two repetitions, no "skip ahead" state.
#[test]
fn singleton_times_range_has_the_same_shape_as_its_bare_count() {
    let singleton = repeated(
        hdl_expr("a"),
        Repeat { kind: RepeatKind::Times, range: Some(NumRange::Range(NumExpr::Int(2), NumExpr::Int(2))) },
    );
    let exact = repeated(hdl_expr("a"), Repeat { kind: RepeatKind::Times, range: Some(NumRange::Single(NumExpr::Int(2))) });
    let (a, _) = build(&assert(singleton));
    let (b, _) = build(&assert(exact));
    assert_eq!(a.states.len(), b.states.len());
}

/// `a[+]` must contain a back edge (unbounded repetition), and that back
/// edge must not violate the epsilon-acyclicity invariant (it's a `NEXT`
/// edge, which is allowed to cycle).
#[test]
fn plus_repetition_has_an_infinite_back_edge_and_stays_acyclic() {
    let rep = repeated(sere_concat(vec![hdl_expr("a")]), Repeat { kind: RepeatKind::Plus, range: None });
    let (fsm, _) = build(&assert(rep));
    let has_back_edge = fsm.states.iter().any(|s| s.edges.iter().any(|e| e.dest == s.id));
    assert!(has_back_edge);
    check_acyclic(&fsm);
}

/// `prev(x, 512)` is within the cap (spec §4.8) and must resolve cleanly;
/// `prev(x, 513)` exceeds it and must be reported as a diagnostic, not a
/// panic.
#[test]
fn prev_depth_cap_is_enforced_with_a_diagnostic_not_a_panic() {
    let mut sink: Vec<Diagnostic> = Vec::new();
    let ok = prev(hdl_expr("x"), Some(512));
    let sites_ok = find_prev_sites(&ok, &IdentityFold, &mut sink, 512);
    assert_eq!(sink.error_count(), 0);
    assert_eq!(sites_ok.len(), 1);

    let mut sink2: Vec<Diagnostic> = Vec::new();
    let too_deep = prev(hdl_expr("x"), Some(513));
    let _ = find_prev_sites(&too_deep, &IdentityFold, &mut sink2, 512);
    assert!(sink2.error_count() > 0, "prev(x, 513) should be rejected when max_prev is 512");
}

/// A `next[k]` whose delay isn't a compile-time constant degrades to an
/// empty FSM plus a diagnostic rather than panicking (spec §8's
/// "non-static next delay" scenario).
#[test]
fn non_static_next_delay_degrades_gracefully() {
    let mut n = (*next(hdl_expr("a"), Some(1))).clone();
    n.delay = Some(NumExpr::NonStatic);
    let directive: pslfsm::ast::PslNodeRef = std::rc::Rc::new(n);
    let (fsm, sink) = build(&assert(directive));
    assert!(sink.error_count() > 0);
    assert!(fsm.states.len() <= 1);
}
