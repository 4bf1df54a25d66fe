//! FSM visualiser (component C6, spec §4.5).
//!
//! Grounded directly on `psl_fsm_dump()` in
//! `examples/original_source/src/psl/psl-fsm.c`: write a `digraph psl { ... }`
//! body with one line per accepting state (`peripheries=2`) and one line per
//! edge (guard label, dashed style for epsilon edges), then shell out to
//! `dot -Tsvg -O <file>`. The original treats a failed spawn as non-fatal to
//! the surrounding compiler ("Failures to spawn are fatal to the visualiser
//! but not to the compiler", spec §4.5); this module mirrors that by
//! returning a `Result` from the rendering step alone, while `to_dot` itself
//! is infallible.

use std::fmt::Write as _;
use std::io;
use std::path::Path;
use std::process::Command;

use crate::fsm::{EdgeKind, Fsm};

/// Escapes a guard's `Display` text the way `psl_dump_label` escapes the
/// captured PSL syntax: only `"` needs quoting for a DOT string label.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '"' {
            out.push_str("\\\"");
        } else {
            out.push(c);
        }
    }
    out
}

/// Renders `fsm` as a DOT digraph (spec §4.5, §6 "Outputs"). Pure and
/// infallible: no file I/O happens here, matching this crate's convention
/// of keeping the compiler core free of side effects (spec §5).
pub fn to_dot(fsm: &Fsm) -> String {
    let mut out = String::new();
    out.push_str("digraph psl {\n");

    for state in &fsm.states {
        if state.accept {
            writeln!(out, "  {} [peripheries=2];", state.id).unwrap();
        }
        for edge in &state.edges {
            write!(out, "  {} -> {} [", state.id, edge.dest).unwrap();
            if let Some(guard) = &edge.guard {
                write!(out, "label=\"{}\",", escape(&guard.to_string())).unwrap();
            }
            if edge.kind == EdgeKind::Epsilon {
                out.push_str("style=dashed,");
            }
            out.push_str("];\n");
        }
    }

    out.push_str("}\n");
    out
}

/// Writes `to_dot(fsm)` to `path`, then invokes an external renderer
/// (`dot -Tsvg -O <path>` by default, spec §6) to produce `<path>.svg`
/// alongside it. `renderer` overrides the `dot` binary
/// (`CompileOptions::dot_renderer`, spec §F); passing `None` for the
/// configured path skips the spawn entirely and only writes the `.dot`
/// file, which is what this crate's own tests do to stay hermetic.
pub fn dump(fsm: &Fsm, path: &Path, renderer: Option<&Path>) -> io::Result<()> {
    std::fs::write(path, to_dot(fsm))?;

    let Some(renderer) = renderer else {
        return Ok(());
    };

    let status = Command::new(renderer)
        .arg("-Tsvg")
        .arg("-O")
        .arg(path)
        .status()?;

    if !status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("{} exited with {status}", renderer.display()),
        ));
    }
    log::debug!("[PslFsm] wrote PSL state machine graph to {}.svg", path.display());
    Ok(())
}
