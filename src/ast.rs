//! Read-only view over a typed PSL abstract syntax tree (component C1).
//!
//! PSL parsing and AST construction are out of scope for this crate (spec
//! §1); what follows is the *shape* of node the builder in [`crate::fsm`]
//! consumes, modelled closely enough on the real thing (see
//! `examples/original_source/src/psl/psl-fsm.c`'s `psl_node_t` accessors:
//! `psl_kind`, `psl_subkind`, `psl_flags`, `psl_operand`, `psl_value`,
//! `psl_delay`, `psl_repeat`, `psl_tree`, `psl_ref`, `psl_loc`) that it can
//! be exercised and tested without a real parser.
//!
//! Nodes are shared via `Rc` rather than arena indices: the AST is owned by
//! an upstream parser that outlives any one FSM, and guards alias into it
//! (spec §9 "Guard AST sharing"), so reference counting gives the right
//! lifetime without threading an explicit arena lifetime through the whole
//! crate.

use std::fmt;
use std::rc::Rc;

bitflags::bitflags! {
    /// Node flag bits (spec §3: `flags` bitset).
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct PslFlags: u8 {
        /// Strong operator: unmet liveness obligation at end of simulation is a failure.
        const STRONG    = 1 << 0;
        /// Inclusive variant (`until_`, `[->]`-style inclusive before/until).
        const INCLUSIVE = 1 << 1;
    }
}

/// Node kind (spec §3: `kind`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PslKind {
    Assert,
    Assume,
    Restrict,
    Cover,
    Never,
    Always,
    HdlExpr,
    Next,
    Sere,
    Logical,
    Until,
    Eventually,
    Abort,
    Before,
    SuffixImpl,
    Clocked,
    BuiltinFcall,
    ClockDecl,
}

impl fmt::Display for PslKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Sub-kind: refines `kind` for the handful of node kinds that need it
/// (spec §3: `sub_kind`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PslSubKind {
    None,
    SereConcat,
    SereFusion,
    LogicIf,
    LogicIff,
    LogicOr,
    AbortSync,
    AbortAsync,
    SuffixOverlap,
    SuffixNonOverlap,
    BuiltinPrev,
    Guarantee,
}

impl Default for PslSubKind {
    fn default() -> Self {
        PslSubKind::None
    }
}

/// A compile-time-foldable integer sub-expression (repetition counts,
/// `next[k]`'s delay, `prev(x,n)`'s `n`). Folding is performed by
/// [`crate::number::fold`] via the [`crate::number::ConstFold`] trait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumExpr {
    /// A literal that folds to itself.
    Int(i64),
    /// An expression that the upstream constant folder could not reduce
    /// (stands in for an arbitrary non-static HDL expression in tests).
    NonStatic,
}

/// A repetition range, `n` or `n..m`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumRange {
    Single(NumExpr),
    Range(NumExpr, NumExpr),
}

/// Repeat-spec kind (spec §4.3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatKind {
    /// `[+]`
    Plus,
    /// `[->n]` / `[->n..m]`
    Goto,
    /// `[=n]` / `[=n..m]`
    Equal,
    /// `[*n]` / `[*n..m]` / `[*]`
    Times,
}

/// A SERE's repeat annotation (spec §3: `repeat`).
#[derive(Debug, Clone)]
pub struct Repeat {
    pub kind: RepeatKind,
    /// `None` means no explicit range was written (`[+]`, `[*]`).
    pub range: Option<NumRange>,
}

/// A leaf Boolean HDL expression. Standing in for the external VHDL
/// expression lowerer's input (spec §1 "out of scope: VHDL expression
/// lowering layer"); kept intentionally tiny since this crate only needs
/// to evaluate it through the [`crate::hdl::HdlLower`] trait boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HdlExpr {
    /// A named signal reference.
    Signal(String),
    /// A Boolean literal.
    Const(bool),
    Not(Box<HdlExpr>),
    And(Box<HdlExpr>, Box<HdlExpr>),
    Or(Box<HdlExpr>, Box<HdlExpr>),
    /// `prev(x, n)`'s read-out: the value `x` held `n` ticks ago (spec
    /// §4.8, §GLOSSARY). This crate specialises the built-in's VHDL
    /// rvalue result to the Boolean domain, so it is just another guard
    /// leaf rather than a distinct guard-algebra variant (spec §3's
    /// `Guard` sum type is retained unchanged: a `Prev` node is still
    /// evaluated through `Guard::Expr`, see `crate::prev`).
    Prev(Box<HdlExpr>, u32),
}

impl fmt::Display for HdlExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HdlExpr::Signal(name) => write!(f, "{name}"),
            HdlExpr::Const(b) => write!(f, "{b}"),
            HdlExpr::Not(e) => write!(f, "not {e}"),
            HdlExpr::And(l, r) => write!(f, "({l} and {r})"),
            HdlExpr::Or(l, r) => write!(f, "({l} or {r})"),
            HdlExpr::Prev(e, n) => write!(f, "prev({e}, {n})"),
        }
    }
}

/// Source locus, carried by every node for diagnostics (spec §3: `locus`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locus {
    pub file: Rc<str>,
    pub line: u32,
    pub column: u32,
}

impl Locus {
    pub fn new(file: impl Into<Rc<str>>, line: u32, column: u32) -> Self {
        Self { file: file.into(), line, column }
    }

    /// A placeholder locus for synthesized or test-only nodes.
    pub fn synthetic() -> Self {
        Self { file: Rc::from("<synthetic>"), line: 0, column: 0 }
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Shared handle to a PSL AST node (spec §3 "PSL node (external)").
pub type PslNodeRef = Rc<PslNode>;

/// A PSL AST node.
#[derive(Debug, Clone)]
pub struct PslNode {
    pub kind: PslKind,
    pub sub_kind: PslSubKind,
    pub flags: PslFlags,
    /// Ordered operands (binary operators use `operands[0]`/`[1]`; unary
    /// wrapper kinds such as `Never`/`Always`/`Eventually`/`Clocked` carry
    /// their single wrapped property in `operands[0]`, mirroring
    /// `psl_value`).
    pub operands: Vec<PslNodeRef>,
    pub delay: Option<NumExpr>,
    pub message: Option<String>,
    pub repeat: Option<Repeat>,
    /// HDL expression carried by `HdlExpr` leaf nodes and `ClockDecl`.
    pub hdl: Option<HdlExpr>,
    /// Referenced declaration (e.g. a `Clocked` node's clock declaration).
    pub clock_ref: Option<PslNodeRef>,
    pub locus: Locus,
}

impl PslNode {
    pub fn new(kind: PslKind, locus: Locus) -> Self {
        Self {
            kind,
            sub_kind: PslSubKind::None,
            flags: PslFlags::empty(),
            operands: Vec::new(),
            delay: None,
            message: None,
            repeat: None,
            hdl: None,
            clock_ref: None,
            locus,
        }
    }

    /// Spec's `psl_value(p)`: the single wrapped sub-property.
    pub fn value(&self) -> &PslNodeRef {
        &self.operands[0]
    }

    pub fn operand(&self, i: usize) -> &PslNodeRef {
        &self.operands[i]
    }

    pub fn operands_len(&self) -> usize {
        self.operands.len()
    }

    pub fn has_repeat(&self) -> bool {
        self.repeat.is_some()
    }

    pub fn has_delay(&self) -> bool {
        self.delay.is_some()
    }
}

/// Small constructors for assembling test fixtures without a real parser.
/// Named after the PSL syntax they stand in for rather than after
/// `psl_new`-style factory functions, since that is what a reader
/// skimming a test will recognise.
pub mod build {
    use super::*;

    pub fn hdl_expr(name: &str) -> PslNodeRef {
        let mut n = PslNode::new(PslKind::HdlExpr, Locus::synthetic());
        n.hdl = Some(HdlExpr::Signal(name.to_string()));
        Rc::new(n)
    }

    pub fn hdl(expr: HdlExpr) -> PslNodeRef {
        let mut n = PslNode::new(PslKind::HdlExpr, Locus::synthetic());
        n.hdl = Some(expr);
        Rc::new(n)
    }

    fn wrap(kind: PslKind, inner: PslNodeRef) -> PslNodeRef {
        let mut n = PslNode::new(kind, Locus::synthetic());
        n.operands.push(inner);
        Rc::new(n)
    }

    pub fn always(inner: PslNodeRef) -> PslNodeRef {
        wrap(PslKind::Always, inner)
    }

    pub fn never(inner: PslNodeRef) -> PslNodeRef {
        wrap(PslKind::Never, inner)
    }

    pub fn cover(inner: PslNodeRef) -> PslNodeRef {
        wrap(PslKind::Cover, inner)
    }

    pub fn assert(inner: PslNodeRef) -> PslNodeRef {
        wrap(PslKind::Assert, inner)
    }

    pub fn clocked(inner: PslNodeRef, clock: PslNodeRef) -> PslNodeRef {
        let mut n = PslNode::new(PslKind::Clocked, Locus::synthetic());
        n.operands.push(inner);
        n.clock_ref = Some(clock);
        Rc::new(n)
    }

    pub fn clock_decl(signal: &str) -> PslNodeRef {
        let mut n = PslNode::new(PslKind::ClockDecl, Locus::synthetic());
        n.hdl = Some(HdlExpr::Signal(signal.to_string()));
        Rc::new(n)
    }

    pub fn next(inner: PslNodeRef, delay: Option<i64>) -> PslNodeRef {
        let mut n = PslNode::new(PslKind::Next, Locus::synthetic());
        n.operands.push(inner);
        n.delay = delay.map(NumExpr::Int);
        Rc::new(n)
    }

    pub fn sere_concat(parts: Vec<PslNodeRef>) -> PslNodeRef {
        let mut n = PslNode::new(PslKind::Sere, Locus::synthetic());
        n.sub_kind = PslSubKind::SereConcat;
        n.operands = parts;
        Rc::new(n)
    }

    pub fn sere_fusion(parts: Vec<PslNodeRef>) -> PslNodeRef {
        let mut n = PslNode::new(PslKind::Sere, Locus::synthetic());
        n.sub_kind = PslSubKind::SereFusion;
        n.operands = parts;
        Rc::new(n)
    }

    pub fn repeated(mut sere: PslNodeRef, repeat: Repeat) -> PslNodeRef {
        let n = Rc::get_mut(&mut sere).expect("fresh node");
        n.repeat = Some(repeat);
        sere
    }

    pub fn until(lhs: PslNodeRef, rhs: PslNodeRef, inclusive: bool) -> PslNodeRef {
        let mut n = PslNode::new(PslKind::Until, Locus::synthetic());
        if inclusive {
            n.flags |= PslFlags::INCLUSIVE;
        }
        n.operands = vec![lhs, rhs];
        Rc::new(n)
    }

    /// `until!` / `until!_`: the strong variants of [`until`] (spec
    /// §GLOSSARY "Strong operator"; spec §8 scenario 5).
    pub fn until_strong(lhs: PslNodeRef, rhs: PslNodeRef, inclusive: bool) -> PslNodeRef {
        let mut n = PslNode::new(PslKind::Until, Locus::synthetic());
        n.flags |= PslFlags::STRONG;
        if inclusive {
            n.flags |= PslFlags::INCLUSIVE;
        }
        n.operands = vec![lhs, rhs];
        Rc::new(n)
    }

    pub fn eventually(inner: PslNodeRef) -> PslNodeRef {
        wrap(PslKind::Eventually, inner)
    }

    pub fn before(a: PslNodeRef, b: PslNodeRef, inclusive: bool, strong: bool) -> PslNodeRef {
        let mut n = PslNode::new(PslKind::Before, Locus::synthetic());
        if inclusive {
            n.flags |= PslFlags::INCLUSIVE;
        }
        if strong {
            n.flags |= PslFlags::STRONG;
        }
        n.operands = vec![a, b];
        Rc::new(n)
    }

    pub fn abort(lhs: PslNodeRef, cond: PslNodeRef, sync: bool) -> PslNodeRef {
        let mut n = PslNode::new(PslKind::Abort, Locus::synthetic());
        n.sub_kind = if sync { PslSubKind::AbortSync } else { PslSubKind::AbortAsync };
        n.operands = vec![lhs, cond];
        Rc::new(n)
    }

    pub fn suffix_impl(lhs: PslNodeRef, rhs: PslNodeRef, overlap: bool) -> PslNodeRef {
        let mut n = PslNode::new(PslKind::SuffixImpl, Locus::synthetic());
        n.sub_kind = if overlap { PslSubKind::SuffixOverlap } else { PslSubKind::SuffixNonOverlap };
        n.operands = vec![lhs, rhs];
        Rc::new(n)
    }

    pub fn logic_if(cond: PslNodeRef, then: PslNodeRef) -> PslNodeRef {
        let mut n = PslNode::new(PslKind::Logical, Locus::synthetic());
        n.sub_kind = PslSubKind::LogicIf;
        n.operands = vec![cond, then];
        Rc::new(n)
    }

    pub fn logic_iff(a: PslNodeRef, b: PslNodeRef) -> PslNodeRef {
        let mut n = PslNode::new(PslKind::Logical, Locus::synthetic());
        n.sub_kind = PslSubKind::LogicIff;
        n.operands = vec![a, b];
        Rc::new(n)
    }

    pub fn logic_or(a: PslNodeRef, b: PslNodeRef) -> PslNodeRef {
        let mut n = PslNode::new(PslKind::Logical, Locus::synthetic());
        n.sub_kind = PslSubKind::LogicOr;
        n.operands = vec![a, b];
        Rc::new(n)
    }

    /// `prev(signal, n)`; `n_ticks = None` means the 1-tick default. The
    /// node carries both `delay` (the raw, possibly non-static `NumExpr`,
    /// for [`crate::prev::find_prev_sites`]'s diagnostics) and a resolved
    /// `hdl` read-out (an [`HdlExpr::Prev`] leaf) so it can be used
    /// directly as a guard via `Guard::from_expr`, the same way an
    /// `HdlExpr` leaf node is.
    pub fn prev(signal: PslNodeRef, n_ticks: Option<i64>) -> PslNodeRef {
        let mut n = PslNode::new(PslKind::BuiltinFcall, Locus::synthetic());
        n.sub_kind = PslSubKind::BuiltinPrev;
        let inner = signal.hdl.clone().expect("prev()'s operand must be an HdlExpr leaf");
        let ticks = n_ticks.unwrap_or(crate::prev::DEFAULT_TICKS).max(0) as u32;
        n.hdl = Some(HdlExpr::Prev(Box::new(inner), ticks));
        n.operands.push(signal);
        n.delay = n_ticks.map(NumExpr::Int);
        Rc::new(n)
    }
}
