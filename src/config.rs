//! Compile-time configuration (ambient, spec §F).
//!
//! A small by-value options struct plus an optional `pslfsm.toml` loader for
//! `pslfsmc`, mirroring the teacher crate's own `serde` + `toml`
//! configuration layer (see `nvm`'s enterprise config modules, which load a
//! TOML/YAML file into a `serde`-derived struct the same way). The library
//! itself never reads a config file — only `CompileOptions` is threaded
//! through `fsm::build_checked`/`lower::lower`; loading `pslfsm.toml` is the
//! CLI binary's job.

use std::path::PathBuf;

use serde::Deserialize;

use crate::coverage::CoverageMask;

/// The compile-time knobs named in spec §6 "Configuration" and §F.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Gates the invariant checker (spec §4.4). Defaults to
    /// `cfg!(debug_assertions)`, matching the original's `#ifdef DEBUG`.
    pub debug_checks: bool,
    /// The `FUNCTIONAL` coverage-mask bit (spec §6).
    pub coverage_mask: CoverageMask,
    /// Upper bound on `prev(x, n)`'s `n` (spec §4.8/§6), normally 512.
    pub max_prev: u32,
    /// Overrides the external `dot` binary used by [`crate::dot::dump`].
    /// `None` disables spawning the renderer while still writing the
    /// `.dot` file.
    pub dot_renderer: Option<PathBuf>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            debug_checks: cfg!(debug_assertions),
            coverage_mask: CoverageMask::FUNCTIONAL,
            max_prev: 512,
            dot_renderer: None,
        }
    }
}

/// The on-disk shape of `pslfsm.toml` (spec §F: "the CLI binary
/// additionally accepts a `pslfsm.toml`... for the handful of options
/// above"). Every field is optional so a partial file only overrides what
/// it names; unset fields fall back to [`CompileOptions::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub debug_checks: Option<bool>,
    pub functional_coverage: Option<bool>,
    pub max_prev: Option<u32>,
    pub dot_renderer: Option<PathBuf>,
}

impl ConfigFile {
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Merges this file's overrides onto [`CompileOptions::default`].
    pub fn into_options(self) -> CompileOptions {
        let mut opts = CompileOptions::default();
        if let Some(v) = self.debug_checks {
            opts.debug_checks = v;
        }
        if let Some(enabled) = self.functional_coverage {
            opts.coverage_mask.set(CoverageMask::FUNCTIONAL, enabled);
        }
        if let Some(v) = self.max_prev {
            opts.max_prev = v;
        }
        if let Some(v) = self.dot_renderer {
            opts.dot_renderer = Some(v);
        }
        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_match_spec_defaults() {
        let opts = CompileOptions::default();
        assert_eq!(opts.max_prev, 512);
        assert!(opts.coverage_mask.contains(CoverageMask::FUNCTIONAL));
        assert!(opts.dot_renderer.is_none());
    }

    #[test]
    fn partial_toml_only_overrides_named_fields() {
        let cfg = ConfigFile::parse("max_prev = 64\n").unwrap();
        let opts = cfg.into_options();
        assert_eq!(opts.max_prev, 64);
        assert!(opts.coverage_mask.contains(CoverageMask::FUNCTIONAL));
    }

    #[test]
    fn functional_coverage_false_clears_the_mask() {
        let cfg = ConfigFile::parse("functional_coverage = false\n").unwrap();
        let opts = cfg.into_options();
        assert!(!opts.coverage_mask.contains(CoverageMask::FUNCTIONAL));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = ConfigFile::parse("bogus = 1\n");
        assert!(err.is_err());
    }
}
