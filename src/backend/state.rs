//! Per-function codegen state (C6): the stack map and sp bookkeeping that
//! replace the original's `Context`/`ContextManager` globals.
//!
//! Grounded on `backend_utils.hpp`'s `Context` struct: one instance lives for
//! the duration of a single function's codegen and is thrown away afterward.

use std::collections::HashMap;

use koopa::ir::{FunctionData, Program, Value};

/// Stack frame layout for one function, computed up front by `frame::layout`
/// before any instruction is emitted (§4.5.1).
pub struct Frame {
    /// Total frame size in bytes, already rounded up to 16.
    pub size: i32,
    /// `ra`'s slot offset from `sp`, if this function calls another.
    pub ra_offset: Option<i32>,
    /// Every local value's slot offset from `sp`, keyed by its Koopa handle.
    pub slots: HashMap<Value, i32>,
}

impl Frame {
    pub fn slot_of(&self, v: Value) -> i32 {
        *self.slots.get(&v).unwrap_or_else(|| panic!("value has no stack slot: {:?}", v))
    }
}

/// Everything threaded through one function's instruction walk.
pub struct CodeGen<'p> {
    pub program: &'p Program,
    pub output: String,
    pub frame: Frame,
    trampoline_count: u32,
}

impl<'p> CodeGen<'p> {
    pub fn new(program: &'p Program, frame: Frame) -> Self {
        CodeGen { program, output: String::new(), frame, trampoline_count: 0 }
    }

    pub fn func_data(&self, func: koopa::ir::Function) -> &'p FunctionData {
        self.program.func(func)
    }

    /// Mint a fresh id for a legalized branch's near/far label pair.
    pub fn next_trampoline_id(&mut self) -> u32 {
        let id = self.trampoline_count;
        self.trampoline_count += 1;
        id
    }
}
