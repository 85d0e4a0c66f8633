//! Emission environment (C3): the single owned "session" state threaded through
//! lowering, replacing the original's mutable globals (`EnvironmentManager`,
//! `ContextManager`, output streams) per SPEC_FULL.md §9.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::error::CompileResult;
use crate::symbol::ScopeStack;

/// The result of lowering any AST expression: either a folded constant or a
/// reference to a per-function SSA temporary. Always threaded explicitly as a
/// return value — there is no "last register" field to peek at, which is the
/// hazard SPEC_FULL.md §9's open question calls out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LowerResult {
    Imm(i32),
    Reg(u32),
}

impl LowerResult {
    /// Render as the operand text used inline in emitted IR (`%7` or `42`).
    pub fn text(&self) -> String {
        match self {
            LowerResult::Imm(v) => v.to_string(),
            LowerResult::Reg(id) => format!("%{}", id),
        }
    }
}

pub struct Env {
    pub output: String,
    pub scopes: ScopeStack,

    if_else_count: u32,
    while_count: u32,
    short_circuit_count: u32,
    jump_count: u32,
    /// Stack of active `while` ids; `break`/`continue` target the top.
    while_current: Vec<u32>,
    /// Per-function SSA temporary counter; reset by `enter_function`.
    temp_count: u32,

    pub is_global: bool,
    is_func_return: HashMap<String, bool>,

    /// Whether the current basic block has already emitted a control-transfer
    /// instruction (`br`/`jump`/`ret`). Distinct from `Scope::returned`: this is
    /// reset at the start of every fresh block, not sticky per lexical scope
    /// (SPEC_FULL.md §9).
    pub block_terminated: bool,
}

impl Env {
    pub fn new() -> Self {
        let mut is_func_return = HashMap::new();
        is_func_return.insert("getint".to_string(), true);
        is_func_return.insert("getch".to_string(), true);
        is_func_return.insert("getarray".to_string(), true);

        Env {
            output: String::new(),
            scopes: ScopeStack::new(),
            if_else_count: 0,
            while_count: 0,
            short_circuit_count: 0,
            jump_count: 0,
            while_current: Vec::new(),
            temp_count: 0,
            is_global: true,
            is_func_return,
            block_terminated: false,
        }
    }

    /// Emit the fixed library declarations, in the order the original compiler
    /// emits them, before any global or function.
    pub fn emit_library_decls(&mut self) -> CompileResult<()> {
        writeln!(self.output, "decl @getint(): i32")?;
        writeln!(self.output, "decl @getch(): i32")?;
        writeln!(self.output, "decl @getarray(*i32): i32")?;
        writeln!(self.output, "decl @putint(i32)")?;
        writeln!(self.output, "decl @putch(i32)")?;
        writeln!(self.output, "decl @putarray(i32, *i32)")?;
        writeln!(self.output, "decl @starttime()")?;
        writeln!(self.output, "decl @stoptime()")?;
        writeln!(self.output)?;
        Ok(())
    }

    pub fn func_returns(&self, name: &str) -> bool {
        self.is_func_return.get(name).copied().unwrap_or(false)
    }

    pub fn set_func_returns(&mut self, name: &str, returns: bool) {
        self.is_func_return.insert(name.to_string(), returns);
    }

    pub fn enter_function(&mut self) {
        self.temp_count = 0;
        self.block_terminated = false;
    }

    /// Mint a fresh SSA temporary id; does not emit anything.
    pub fn new_temp(&mut self) -> u32 {
        let id = self.temp_count;
        self.temp_count += 1;
        id
    }

    pub fn then_label(&self) -> String {
        format!("%then_{}", self.if_else_count)
    }

    pub fn else_label(&self) -> String {
        format!("%else_{}", self.if_else_count)
    }

    pub fn if_end_label(&self) -> String {
        format!("%end_{}", self.if_else_count)
    }

    pub fn bump_if_else(&mut self) {
        self.if_else_count += 1;
    }

    /// Mint a fresh `while` id and immediately push it as the innermost active
    /// loop, so nested `while`s mint distinct ids. The caller builds its own
    /// entry/body/end label strings from the returned id and keeps them as
    /// local bindings rather than re-reading mutable counters later — the
    /// explicit-threading re-design SPEC_FULL.md §9 calls for, extended from
    /// `Result` values to loop ids.
    pub fn enter_while(&mut self) -> u32 {
        let id = self.while_count;
        self.while_count += 1;
        self.while_current.push(id);
        id
    }

    pub fn exit_while(&mut self) {
        self.while_current.pop();
    }

    /// The innermost active loop's id, consulted by `break`/`continue`.
    pub fn current_while_id(&self) -> Option<u32> {
        self.while_current.last().copied()
    }

    pub fn while_entry_label(id: u32) -> String {
        format!("%while_entry_{}", id)
    }

    pub fn while_body_label(id: u32) -> String {
        format!("%while_body_{}", id)
    }

    pub fn while_end_label(id: u32) -> String {
        format!("%while_end_{}", id)
    }

    pub fn short_true_label(&self) -> String {
        format!("%short_true_{}", self.short_circuit_count)
    }

    pub fn short_false_label(&self) -> String {
        format!("%short_false_{}", self.short_circuit_count)
    }

    pub fn short_end_label(&self) -> String {
        format!("%short_end_{}", self.short_circuit_count)
    }

    pub fn short_result_cell(&self) -> String {
        format!("@short_result_{}", self.short_circuit_count)
    }

    pub fn bump_short_circuit(&mut self) {
        self.short_circuit_count += 1;
    }

    /// A fresh "jump pad" label: a trivially-reachable label opened right after
    /// a control-transfer instruction so subsequent (dead) statements in the
    /// same block remain syntactically valid, per invariant §3.5.4.
    pub fn jump_pad_label(&mut self) -> String {
        let id = self.jump_count;
        self.jump_count += 1;
        format!("%jump_{}", id)
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_decls_seed_return_flags() {
        let env = Env::new();
        assert!(env.func_returns("getint"));
        assert!(env.func_returns("getch"));
        assert!(env.func_returns("getarray"));
        assert!(!env.func_returns("putint"));
    }

    #[test]
    fn while_ids_are_distinct_and_stack_correctly() {
        let mut env = Env::new();
        let outer = env.enter_while();
        assert_eq!(env.current_while_id(), Some(outer));
        let inner = env.enter_while();
        assert_eq!(env.current_while_id(), Some(inner));
        assert_ne!(outer, inner);
        env.exit_while();
        assert_eq!(env.current_while_id(), Some(outer));
        assert_eq!(Env::while_entry_label(outer), "%while_entry_0");
    }

    #[test]
    fn temp_counter_resets_per_function() {
        let mut env = Env::new();
        assert_eq!(env.new_temp(), 0);
        assert_eq!(env.new_temp(), 1);
        env.enter_function();
        assert_eq!(env.new_temp(), 0);
    }
}
