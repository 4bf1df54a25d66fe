//! `TextIrEmitter`: an [`IrEmitter`] that renders a readable instruction
//! listing instead of real target IR (spec §6 "Outputs": "a target IR
//! unit whose first block resets the property, subsequent blocks form a
//! case dispatch over state ids..."). This is the crate's one
//! general-purpose emitter — good for `pslfsmc --dump-ir` and for
//! asserting on lowering output in tests without depending on a real
//! code generator, the same role `jit::codegen`'s disassembly dump plays
//! in the teacher crate's own test suite.

use std::fmt::Write as _;
use std::rc::Rc;

use crate::ast::Locus;
use crate::coverage::ItemTag;
use crate::fsm::{FsmKind, StateId};
use crate::guard::Guard;
use crate::lower::ir::{BlockId, IrEmitter};

#[derive(Debug, Clone, Default)]
pub struct TextIrEmitter {
    lines: Vec<String>,
}

impl TextIrEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }

    fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }
}

impl IrEmitter for TextIrEmitter {
    fn begin_block(&mut self, block: BlockId, comment: &str) {
        if comment.is_empty() {
            self.push(format!("block {}:", block.0));
        } else {
            self.push(format!("block {}: ; {}", block.0, comment));
        }
    }

    fn sched_event(&mut self, signal: &str) {
        self.push(format!("  sched_event {signal}"));
    }

    fn add_trigger(&mut self, has_async_abort: bool) {
        if has_async_abort {
            self.push("  or_trigger abort_trigger, clock_trigger".to_string());
            self.push("  add_trigger combined_trigger".to_string());
        } else {
            self.push("  add_trigger clock_trigger".to_string());
        }
    }

    fn function_trigger(&mut self, guard: &Rc<Guard>) {
        self.push(format!("  function_trigger abort_trigger = {guard}"));
    }

    fn case_dispatch(&mut self, state_count: u32, default: BlockId) {
        self.push(format!("  case state in 0..{state_count} default block {}", default.0));
    }

    fn enter_successor(&mut self, guard: Option<&Rc<Guard>>, dest: StateId, strong: bool) {
        let strong_note = if strong { " [strong]" } else { "" };
        match guard {
            Some(g) => self.push(format!("  if {g} then enter_state {dest}{strong_note}")),
            None => self.push(format!("  enter_state {dest}{strong_note}")),
        }
    }

    fn accept(&mut self, kind: FsmKind, guard: Option<&Rc<Guard>>, locus: &Locus, tag: Option<ItemTag>) {
        let gate = guard.map(|g| format!("if {g} then ")).unwrap_or_default();
        match kind {
            FsmKind::Cover => {
                let tag_note = tag.map(|t| format!(" tag={}", t.0)).unwrap_or_default();
                self.push(format!("  {gate}cover_stmt{tag_note} ({locus})"));
            }
            FsmKind::Never => {
                self.push(format!("  {gate}assert false, \"never\" violated ({locus})"));
            }
            FsmKind::Bare | FsmKind::Always => {
                self.push(format!("  {gate}return ; satisfied ({locus})"));
            }
        }
    }

    fn assert_progress(&mut self, locus: &Locus) {
        let mut line = String::new();
        write!(line, "  assert taken ; property failed to progress ({locus})").unwrap();
        self.push(line);
    }

    fn comment(&mut self, text: &str) {
        if !text.is_empty() {
            self.push(format!("  ; {text}"));
        }
    }
}
