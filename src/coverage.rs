//! Coverage database boundary (component, spec §4.7 "Coverage
//! integration"; spec §1 "out of scope: the coverage database").
//!
//! Grounded on `cover_create_scope()` / `cover_add_items_for()` /
//! `cover_enabled()` referenced throughout
//! `examples/original_source/src/psl/psl-lower.c`'s `psl_lower_cover()`.
//! A real toolchain owns a persistent coverage model; this crate only
//! needs to record functional-coverage hits as they're reached during
//! lowering, so the boundary is a narrow trait plus one in-memory
//! reference implementation used by tests and the bundled CLI.

use crate::ast::{Locus, PslNodeRef};

bitflags::bitflags! {
    /// Coverage-mask bits (spec §6 "Configuration": `FUNCTIONAL`).
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct CoverageMask: u8 {
        const FUNCTIONAL = 1 << 0;
    }
}

/// A single registered coverage scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

/// A single registered coverage item within a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemTag(pub u32);

pub trait CoverageDb {
    /// `cover_create_scope(parent, directive)`.
    fn cover_create_scope(&mut self, directive: &PslNodeRef) -> ScopeId;

    /// `cover_add_items_for(scope, directive)`; returns `None` when
    /// coverage is disabled for this mask (mirrors the original's
    /// `item == NULL` early return).
    fn cover_add_items_for(&mut self, scope: ScopeId, directive: &PslNodeRef) -> Option<ItemTag>;

    /// `cover_enabled(mask)`.
    fn cover_enabled(&self, mask: CoverageMask) -> bool;

    /// Records a hit against a previously registered item (the runtime
    /// side of `emit_cover_stmt(item->tag)`).
    fn record_hit(&mut self, tag: ItemTag, locus: Locus);
}

/// A simple in-memory coverage database: every scope gets exactly one
/// item, hits are just counted. Enough to make spec §8's `cover { ... }`
/// scenario testable without a real coverage backend.
#[derive(Debug, Default)]
pub struct InMemoryCoverageDb {
    mask: CoverageMask,
    next_scope: u32,
    next_item: u32,
    pub hits: Vec<(ItemTag, Locus)>,
}

impl InMemoryCoverageDb {
    pub fn new(mask: CoverageMask) -> Self {
        Self { mask, next_scope: 0, next_item: 0, hits: Vec::new() }
    }

    pub fn hit_count(&self) -> usize {
        self.hits.len()
    }
}

impl CoverageDb for InMemoryCoverageDb {
    fn cover_create_scope(&mut self, _directive: &PslNodeRef) -> ScopeId {
        let id = ScopeId(self.next_scope);
        self.next_scope += 1;
        id
    }

    fn cover_add_items_for(&mut self, _scope: ScopeId, _directive: &PslNodeRef) -> Option<ItemTag> {
        if !self.cover_enabled(CoverageMask::FUNCTIONAL) {
            return None;
        }
        let tag = ItemTag(self.next_item);
        self.next_item += 1;
        Some(tag)
    }

    fn cover_enabled(&self, mask: CoverageMask) -> bool {
        self.mask.contains(mask)
    }

    fn record_hit(&mut self, tag: ItemTag, locus: Locus) {
        self.hits.push((tag, locus));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::hdl_expr;

    #[test]
    fn disabled_mask_yields_no_item() {
        let mut db = InMemoryCoverageDb::new(CoverageMask::empty());
        let scope = db.cover_create_scope(&hdl_expr("a"));
        assert!(db.cover_add_items_for(scope, &hdl_expr("a")).is_none());
    }

    #[test]
    fn enabled_mask_registers_and_records_hits() {
        let mut db = InMemoryCoverageDb::new(CoverageMask::FUNCTIONAL);
        let scope = db.cover_create_scope(&hdl_expr("a"));
        let tag = db.cover_add_items_for(scope, &hdl_expr("a")).expect("item registered");
        db.record_hit(tag, Locus::synthetic());
        assert_eq!(db.hit_count(), 1);
    }
}
