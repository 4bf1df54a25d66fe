//! pslfsmc - PSL property compiler/runner command line tool
//!
//! Thin driver around the `pslfsm` library for interactive use: dump a
//! property's compiled FSM as DOT, or run it tick-by-tick against a CSV
//! stimulus file and print per-tick pass/fail (spec §8's worked examples).
//! PSL parsing is out of scope for this crate (spec §1), so properties are
//! selected by name from a small built-in registry instead of parsed from
//! source text; `pslfsmc list` shows the available names.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use pslfsm::ast::build::*;
use pslfsm::ast::PslNodeRef;
use pslfsm::config::ConfigFile;
use pslfsm::coverage::InMemoryCoverageDb;
use pslfsm::diag::{Diagnostic, DiagnosticSink};
use pslfsm::hdl::SignalHistory;
use pslfsm::lower::{lower, InterpEmitter, PropertyRun, TickEvent};
use pslfsm::number::IdentityFold;
use pslfsm::{CompileOptions, VERSION};

/// Loads `./pslfsm.toml` if present (spec §F), falling back to
/// [`CompileOptions::default`] otherwise. A present-but-invalid file is a
/// hard error: silently falling back would mask a typo'd config key.
fn load_options() -> Result<CompileOptions, String> {
    let path = Path::new("pslfsm.toml");
    if !path.exists() {
        return Ok(CompileOptions::default());
    }
    let text = fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let cfg = ConfigFile::parse(&text).map_err(|e| format!("{}: {e}", path.display()))?;
    Ok(cfg.into_options())
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    match args[1].as_str() {
        "-h" | "--help" | "help" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "-V" | "--version" => {
            println!("pslfsmc {VERSION}");
            ExitCode::SUCCESS
        }
        "list" => {
            for name in scenario::NAMES {
                println!("{name}");
            }
            ExitCode::SUCCESS
        }
        "dot" if args.len() >= 4 => cmd_dot(&args[2], Path::new(&args[3])),
        "run" if args.len() >= 4 => cmd_run(&args[2], Path::new(&args[3])),
        other => {
            eprintln!("pslfsmc: unknown command or missing arguments: {other}");
            print_usage();
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!("pslfsmc - PSL temporal-property compiler/runner");
    println!();
    println!("USAGE:");
    println!("    pslfsmc list");
    println!("    pslfsmc dot <scenario> <out.dot>");
    println!("    pslfsmc run <scenario> <trace.csv>");
    println!();
    println!("    -h, --help     Show this help message");
    println!("    -V, --version  Show version information");
    println!();
    println!("SCENARIOS:");
    for name in scenario::NAMES {
        println!("    {name}");
    }
    println!();
    println!("CSV TRACE FORMAT:");
    println!("    first line: comma-separated signal names");
    println!("    each following line: comma-separated 0/1 values, one row per tick");
    println!();
    println!("CONFIGURATION:");
    println!("    a ./pslfsm.toml in the working directory overrides debug_checks,");
    println!("    functional_coverage, max_prev, and dot_renderer; see config.rs.");
}

fn cmd_dot(name: &str, out: &Path) -> ExitCode {
    let Some(scn) = scenario::lookup(name) else {
        eprintln!("pslfsmc: unknown scenario {name:?}; try `pslfsmc list`");
        return ExitCode::from(1);
    };

    let opts = match load_options() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("pslfsmc: {e}");
            return ExitCode::from(1);
        }
    };
    let mut sink: Vec<Diagnostic> = Vec::new();
    let fsm = pslfsm::fsm::build_checked(&scn.inner, &IdentityFold, &mut sink, opts.debug_checks);

    for diag in &sink {
        eprintln!("{diag}");
    }

    if let Err(e) = pslfsm::dot::dump(&fsm, out, opts.dot_renderer.as_deref()) {
        eprintln!("pslfsmc: failed to write {}: {e}", out.display());
        return ExitCode::from(1);
    }
    println!("wrote {}", out.display());
    ExitCode::SUCCESS
}

fn cmd_run(name: &str, trace_path: &Path) -> ExitCode {
    let Some(scn) = scenario::lookup(name) else {
        eprintln!("pslfsmc: unknown scenario {name:?}; try `pslfsmc list`");
        return ExitCode::from(1);
    };

    let trace = match read_trace(trace_path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("pslfsmc: {e}");
            return ExitCode::from(1);
        }
    };

    let opts = match load_options() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("pslfsmc: {e}");
            return ExitCode::from(1);
        }
    };
    let mut sink: Vec<Diagnostic> = Vec::new();

    let clock = match pslfsm::clock::resolve(&scn.directive) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("pslfsmc: {e}");
            return ExitCode::from(1);
        }
    };

    let fsm = pslfsm::fsm::build_checked(&scn.inner, &IdentityFold, &mut sink, opts.debug_checks);
    if sink.error_count() > 0 {
        for diag in &sink {
            eprintln!("{diag}");
        }
        return ExitCode::from(1);
    }

    let prev_sites = pslfsm::prev::find_prev_sites(&scn.inner, &IdentityFold, &mut sink, opts.max_prev);

    let mut cover = InMemoryCoverageDb::new(opts.coverage_mask);
    let mut emitter = InterpEmitter::new();
    lower(&fsm, &clock, &prev_sites, &mut cover, opts.coverage_mask, &mut emitter);
    let program = emitter.into_program(fsm.kind);

    let mut history = SignalHistory::new();
    for site in &prev_sites {
        history.register(&site.inner, site.ticks);
    }

    let mut run = PropertyRun::new(&program);
    let mut any_failure = false;

    for (tick, row) in trace.rows.iter().enumerate() {
        history.advance(trace.header.iter().zip(row.iter()).map(|(n, v)| (n.as_str(), *v)));
        let report = run.tick(&history, &mut cover);
        for event in &report.events {
            match event {
                TickEvent::AssertionFailure { locus, message } => {
                    any_failure = true;
                    println!("tick {tick}: FAIL {message} ({locus})");
                }
                TickEvent::CoverageHit { locus, .. } => println!("tick {tick}: cover hit ({locus})"),
                TickEvent::Satisfied { locus } => println!("tick {tick}: pass ({locus})"),
            }
        }
        if report.events.is_empty() {
            println!("tick {tick}: ok");
        }
    }

    if let Some(msg) = run.finish() {
        any_failure = true;
        println!("end of trace: FAIL {msg}");
    }

    println!("coverage hits: {}", cover.hit_count());
    if any_failure {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

struct Trace {
    header: Vec<String>,
    rows: Vec<Vec<bool>>,
}

fn read_trace(path: &Path) -> Result<Trace, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header_line = lines.next().ok_or_else(|| "empty trace file".to_string())?;
    let header: Vec<String> = header_line.split(',').map(|s| s.trim().to_string()).collect();

    let mut rows = Vec::new();
    for line in lines {
        let row: Vec<bool> = line
            .split(',')
            .map(|s| matches!(s.trim(), "1" | "true" | "TRUE"))
            .collect();
        if row.len() != header.len() {
            return Err(format!("row {:?} has {} columns, expected {}", line, row.len(), header.len()));
        }
        rows.push(row);
    }
    Ok(Trace { header, rows })
}

/// Built-in scenario registry (spec §8's worked examples, plus the
/// repetition/SERE corners exercised in the test suite). PSL parsing is
/// out of scope, so each scenario is assembled directly from
/// `pslfsm::ast::build`'s fixture constructors.
mod scenario {
    use super::*;

    pub struct Scenario {
        /// The full directive, `Clocked`-wrapped, for `clock::resolve`.
        pub directive: PslNodeRef,
        /// The directive's inner property, for `fsm::build_checked`.
        pub inner: PslNodeRef,
    }

    pub const NAMES: &[&str] = &[
        "req-ack",
        "cover-abc",
        "never-fault",
        "eventually-done",
        "until-weak",
        "until-strong",
        "suffix-impl",
    ];

    pub fn lookup(name: &str) -> Option<Scenario> {
        let directive = match name {
            "req-ack" => clocked(always(logic_if(hdl_expr("req"), next(hdl_expr("ack"), None))), clock_decl("clk")),
            "cover-abc" => clocked(cover(sere_concat(vec![hdl_expr("a"), hdl_expr("b"), hdl_expr("c")])), clock_decl("clk")),
            "never-fault" => clocked(never(hdl_expr("fault")), clock_decl("clk")),
            "eventually-done" => clocked(
                always(logic_if(hdl_expr("start"), eventually(hdl_expr("done")))),
                clock_decl("clk"),
            ),
            "until-weak" => clocked(until(hdl_expr("a"), hdl_expr("b"), false), clock_decl("clk")),
            "until-strong" => clocked(until_strong(hdl_expr("a"), hdl_expr("b"), false), clock_decl("clk")),
            "suffix-impl" => clocked(
                suffix_impl(sere_concat(vec![hdl_expr("a"), hdl_expr("b")]), hdl_expr("c"), false),
                clock_decl("clk"),
            ),
            _ => return None,
        };
        let inner = directive.value().clone();
        Some(Scenario { directive, inner })
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn every_name_resolves() {
            for name in NAMES {
                assert!(lookup(name).is_some(), "scenario {name} should resolve");
            }
        }
    }
}
