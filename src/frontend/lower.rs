//! Frontend lowering (C4): AST → Koopa-IR text.
//!
//! Each AST node is lowered by an inherent function here rather than a virtual
//! `lower()` method, per SPEC_FULL.md §9's tagged-union decision. Results flow
//! bottom-up as `LowerResult` values, explicitly returned and passed — there is
//! no global "last register" to peek at.

use std::fmt::Write as _;

use crate::ast::*;
use crate::error::{CompileError, CompileResult};
use crate::frontend::array::{self, ArrayBase, InitItem};
use crate::frontend::env::{Env, LowerResult};
use crate::symbol::{Symbol, SymbolKind};

/// Fold a constant expression to its host value. Used for array dimensions and
/// `const` initializers, both of which must be compile-time constants.
pub fn const_eval(env: &mut Env, e: &Expr) -> CompileResult<i32> {
    match lower_expr(env, e)? {
        LowerResult::Imm(v) => Ok(v),
        LowerResult::Reg(_) => Err(CompileError::InitializerShape(
            "expected a constant expression".to_string(),
        )),
    }
}

fn const_dims(env: &mut Env, dims: &[Expr]) -> CompileResult<Vec<i32>> {
    dims.iter().map(|e| const_eval(env, e)).collect()
}

fn fold_binary(op: BinaryOp, a: i32, b: i32) -> i32 {
    match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div => a / b,
        BinaryOp::Mod => a % b,
        BinaryOp::Lt => (a < b) as i32,
        BinaryOp::Le => (a <= b) as i32,
        BinaryOp::Gt => (a > b) as i32,
        BinaryOp::Ge => (a >= b) as i32,
        BinaryOp::Eq => (a == b) as i32,
        BinaryOp::Ne => (a != b) as i32,
        BinaryOp::And | BinaryOp::Or => unreachable!("handled by lower_short_circuit"),
    }
}

fn ir_opcode(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "add",
        BinaryOp::Sub => "sub",
        BinaryOp::Mul => "mul",
        BinaryOp::Div => "div",
        BinaryOp::Mod => "mod",
        BinaryOp::Lt => "lt",
        BinaryOp::Le => "le",
        BinaryOp::Gt => "gt",
        BinaryOp::Ge => "ge",
        BinaryOp::Eq => "eq",
        BinaryOp::Ne => "ne",
        BinaryOp::And | BinaryOp::Or => unreachable!("handled by lower_short_circuit"),
    }
}

fn lower_binary_arith(env: &mut Env, op: BinaryOp, lhs: LowerResult, rhs: LowerResult) -> CompileResult<LowerResult> {
    if let (LowerResult::Imm(a), LowerResult::Imm(b)) = (lhs, rhs) {
        // Division by zero is never folded host-side: it is propagated to
        // runtime as an emitted `div`/`mod` instruction (§7).
        let skip_fold = matches!(op, BinaryOp::Div | BinaryOp::Mod) && b == 0;
        if !skip_fold {
            return Ok(LowerResult::Imm(fold_binary(op, a, b)));
        }
    }
    let t = env.new_temp();
    writeln!(env.output, "\t%{} = {} {}, {}", t, ir_opcode(op), lhs.text(), rhs.text())?;
    Ok(LowerResult::Reg(t))
}

pub fn lower_expr(env: &mut Env, e: &Expr) -> CompileResult<LowerResult> {
    match e {
        Expr::Number(n) => Ok(LowerResult::Imm(*n)),
        Expr::LVal(lval) => lval_read(env, lval),
        Expr::Call(name, args) => lower_call(env, name, args),
        Expr::Unary(op, inner) => {
            let v = lower_expr(env, inner)?;
            match op {
                UnaryOp::Pos => Ok(v),
                UnaryOp::Neg => lower_binary_arith(env, BinaryOp::Sub, LowerResult::Imm(0), v),
                UnaryOp::Not => lower_binary_arith(env, BinaryOp::Eq, LowerResult::Imm(0), v),
            }
        }
        Expr::Binary(BinaryOp::And, l, r) => lower_short_circuit(env, true, l, r),
        Expr::Binary(BinaryOp::Or, l, r) => lower_short_circuit(env, false, l, r),
        Expr::Binary(op, l, r) => {
            let lv = lower_expr(env, l)?;
            let rv = lower_expr(env, r)?;
            lower_binary_arith(env, *op, lv, rv)
        }
    }
}

/// `is_and == true` lowers `&&`, `false` lowers `||` — the two are mirror
/// images of each other (§4.4.2).
fn lower_short_circuit(env: &mut Env, is_and: bool, l: &Expr, r: &Expr) -> CompileResult<LowerResult> {
    let lv = lower_expr(env, l)?;
    if let LowerResult::Imm(a) = lv {
        let decides = if is_and { a == 0 } else { a != 0 };
        if decides {
            return Ok(LowerResult::Imm(if is_and { 0 } else { 1 }));
        }
        // Left is a non-deciding constant (0 for `&&`, nonzero for `||`): the
        // overall result is just the right operand normalised to {0,1}.
        let rv = lower_expr(env, r)?;
        if let LowerResult::Imm(b) = rv {
            return Ok(LowerResult::Imm((b != 0) as i32));
        }
        let t = env.new_temp();
        writeln!(env.output, "\t%{} = ne {}, 0", t, rv.text())?;
        return Ok(LowerResult::Reg(t));
    }

    let cell = env.short_result_cell();
    let true_l = env.short_true_label();
    let false_l = env.short_false_label();
    let end_l = env.short_end_label();
    env.bump_short_circuit();

    writeln!(env.output, "\t{} = alloc i32", cell)?;
    writeln!(env.output, "\tbr {}, {}, {}", lv.text(), true_l, false_l)?;
    env.block_terminated = true;

    writeln!(env.output, "\n{}:", true_l)?;
    env.block_terminated = false;
    if is_and {
        let rv = lower_expr(env, r)?;
        let t = env.new_temp();
        writeln!(env.output, "\t%{} = ne {}, 0", t, rv.text())?;
        writeln!(env.output, "\tstore %{}, {}", t, cell)?;
    } else {
        writeln!(env.output, "\tstore 1, {}", cell)?;
    }
    writeln!(env.output, "\tjump {}", end_l)?;
    env.block_terminated = true;

    writeln!(env.output, "\n{}:", false_l)?;
    env.block_terminated = false;
    if is_and {
        writeln!(env.output, "\tstore 0, {}", cell)?;
    } else {
        let rv = lower_expr(env, r)?;
        let t = env.new_temp();
        writeln!(env.output, "\t%{} = ne {}, 0", t, rv.text())?;
        writeln!(env.output, "\tstore %{}, {}", t, cell)?;
    }
    writeln!(env.output, "\tjump {}", end_l)?;
    env.block_terminated = true;

    writeln!(env.output, "\n{}:", end_l)?;
    env.block_terminated = false;
    let t = env.new_temp();
    writeln!(env.output, "\t%{} = load {}", t, cell)?;
    Ok(LowerResult::Reg(t))
}

fn lower_call(env: &mut Env, name: &str, args: &[Expr]) -> CompileResult<LowerResult> {
    let mut arg_texts = Vec::with_capacity(args.len());
    for a in args {
        arg_texts.push(lower_expr(env, a)?.text());
    }
    let joined = arg_texts.join(", ");
    if env.func_returns(name) {
        let t = env.new_temp();
        writeln!(env.output, "\t%{} = call @{}({})", t, name, joined)?;
        Ok(LowerResult::Reg(t))
    } else {
        writeln!(env.output, "\tcall @{}({})", name, joined)?;
        Ok(LowerResult::Imm(0))
    }
}

/// Evaluate each index expression of an l-value, in source order.
fn lower_indices(env: &mut Env, indices: &[Expr]) -> CompileResult<Vec<LowerResult>> {
    indices.iter().map(|e| lower_expr(env, e)).collect()
}

fn lval_read(env: &mut Env, lval: &LVal) -> CompileResult<LowerResult> {
    let sym = env.scopes.lookup(&lval.name)?;
    let uname = env.scopes.locate(&lval.name)?;
    match sym.kind {
        SymbolKind::Val => {
            if !lval.indices.is_empty() {
                return Err(CompileError::Logic(format!(
                    "'{}' is a scalar constant and cannot be indexed",
                    lval.name
                )));
            }
            Ok(LowerResult::Imm(sym.value))
        }
        SymbolKind::Var => {
            let idxs = lower_indices(env, &lval.indices)?;
            debug_assert!(idxs.is_empty());
            let t = env.new_temp();
            writeln!(env.output, "\t%{} = load @{}", t, uname)?;
            Ok(LowerResult::Reg(t))
        }
        SymbolKind::Arr => {
            let idxs = lower_indices(env, &lval.indices)?;
            if idxs.is_empty() {
                let t = env.new_temp();
                writeln!(env.output, "\t%{} = getelemptr @{}, 0", t, uname)?;
                return Ok(LowerResult::Reg(t));
            }
            let last = walk_getelemptr(env, &ArrayBase::Named(uname), &idxs)?;
            if idxs.len() as i32 == sym.value {
                let t = env.new_temp();
                writeln!(env.output, "\t%{} = load %{}", t, last)?;
                Ok(LowerResult::Reg(t))
            } else {
                let t = env.new_temp();
                writeln!(env.output, "\t%{} = getelemptr %{}, 0", t, last)?;
                Ok(LowerResult::Reg(t))
            }
        }
        SymbolKind::Ptr => {
            let base = env.new_temp();
            writeln!(env.output, "\t%{} = load @{}", base, uname)?;
            let idxs = lower_indices(env, &lval.indices)?;
            if idxs.is_empty() {
                return Ok(LowerResult::Reg(base));
            }
            let outer = env.new_temp();
            writeln!(env.output, "\t%{} = getptr %{}, {}", outer, base, idxs[0].text())?;
            let last = if idxs.len() > 1 {
                walk_getelemptr(env, &ArrayBase::Temp(outer), &idxs[1..])?
            } else {
                outer
            };
            if idxs.len() as i32 == sym.value {
                let t = env.new_temp();
                writeln!(env.output, "\t%{} = load %{}", t, last)?;
                Ok(LowerResult::Reg(t))
            } else {
                let t = env.new_temp();
                writeln!(env.output, "\t%{} = getelemptr %{}, 0", t, last)?;
                Ok(LowerResult::Reg(t))
            }
        }
    }
}

pub fn lval_write(env: &mut Env, lval: &LVal, rhs: LowerResult) -> CompileResult<()> {
    let sym = env.scopes.lookup(&lval.name)?;
    let uname = env.scopes.locate(&lval.name)?;
    match sym.kind {
        SymbolKind::Val => Err(CompileError::AssignToConst(lval.name.clone())),
        SymbolKind::Var => {
            writeln!(env.output, "\tstore {}, @{}", rhs.text(), uname)?;
            Ok(())
        }
        SymbolKind::Arr => {
            let idxs = lower_indices(env, &lval.indices)?;
            let last = walk_getelemptr(env, &ArrayBase::Named(uname), &idxs)?;
            writeln!(env.output, "\tstore {}, %{}", rhs.text(), last)?;
            Ok(())
        }
        SymbolKind::Ptr => {
            let base = env.new_temp();
            writeln!(env.output, "\t%{} = load @{}", base, uname)?;
            let idxs = lower_indices(env, &lval.indices)?;
            let outer = env.new_temp();
            writeln!(env.output, "\t%{} = getptr %{}, {}", outer, base, idxs[0].text())?;
            let last = if idxs.len() > 1 {
                walk_getelemptr(env, &ArrayBase::Temp(outer), &idxs[1..])?
            } else {
                outer
            };
            writeln!(env.output, "\tstore {}, %{}", rhs.text(), last)?;
            Ok(())
        }
    }
}

/// Walk `getelemptr base, i` once per index, threading the previous step's
/// temporary as the next step's base. Returns the final temp id.
fn walk_getelemptr(env: &mut Env, base: &ArrayBase, idxs: &[LowerResult]) -> CompileResult<u32> {
    let mut cur_base_named: Option<String> = match base {
        ArrayBase::Named(n) => Some(n.clone()),
        ArrayBase::Temp(_) => None,
    };
    let mut cur_temp: Option<u32> = match base {
        ArrayBase::Temp(t) => Some(*t),
        ArrayBase::Named(_) => None,
    };
    let mut last = 0u32;
    for idx in idxs {
        let t = env.new_temp();
        if let Some(name) = cur_base_named.take() {
            writeln!(env.output, "\t%{} = getelemptr @{}, {}", t, name, idx.text())?;
        } else {
            let prev = cur_temp.expect("base must be named or a prior temp");
            writeln!(env.output, "\t%{} = getelemptr %{}, {}", t, prev, idx.text())?;
        }
        cur_temp = Some(t);
        last = t;
    }
    Ok(last)
}

pub fn lower_block(env: &mut Env, block: &Block) -> CompileResult<()> {
    env.scopes.push_scope();
    for item in &block.items {
        if env.block_terminated {
            break;
        }
        match item {
            BlockItem::Decl(decl) => lower_decl(env, decl)?,
            BlockItem::Stmt(stmt) => lower_stmt(env, stmt)?,
        }
    }
    env.scopes.pop_scope();
    Ok(())
}

fn lower_decl(env: &mut Env, decl: &Decl) -> CompileResult<()> {
    match decl {
        Decl::Const(cd) => {
            for def in &cd.defs {
                lower_const_def(env, def)?;
            }
        }
        Decl::Var(vd) => {
            for def in &vd.defs {
                lower_var_def(env, def)?;
            }
        }
    }
    Ok(())
}

fn lower_const_def(env: &mut Env, def: &ConstDef) -> CompileResult<()> {
    let dims = const_dims(env, &def.dims)?;
    if dims.is_empty() {
        let ConstInitVal::Exp(e) = &def.init else {
            return Err(CompileError::InitializerShape(
                "scalar const requires a scalar initializer".to_string(),
            ));
        };
        let v = const_eval(env, e)?;
        env.scopes.define(&def.name, Symbol::val(v))?;
        return Ok(());
    }
    let item = InitItem::from(&def.init);
    let buf = array::flatten_init(&dims, &item, &mut |e| const_eval(env, e))?;
    let uname = env.scopes.define(&def.name, Symbol::arr(dims.len() as i32))?;
    if env.is_global {
        emit_array_decl(env, &uname, &dims, Some(&buf))?;
    } else {
        emit_array_decl(env, &uname, &dims, None)?;
        array::emit_local_array_init(env, &ArrayBase::Named(uname.clone()), &dims, &buf)?;
    }
    Ok(())
}

fn lower_var_def(env: &mut Env, def: &VarDef) -> CompileResult<()> {
    let dims = const_dims(env, &def.dims)?;
    if dims.is_empty() {
        let uname = env.scopes.define(&def.name, Symbol::var())?;
        if env.is_global {
            // A global's initializer must be baked into its `alloc` as a
            // literal — Koopa IR has no top-level `store`, so the value has
            // to be compile-time-constant here (the same constraint §4.4.5
            // places on global array initializers).
            let init_text = match &def.init {
                Some(InitVal::Exp(e)) => const_eval(env, e)?.to_string(),
                Some(InitVal::List(_)) => {
                    return Err(CompileError::InitializerShape(
                        "scalar global requires a scalar initializer".to_string(),
                    ))
                }
                None => "zeroinit".to_string(),
            };
            writeln!(env.output, "global @{} = alloc i32, {}", uname, init_text)?;
        } else {
            emit_scalar_decl(env, &uname)?;
            if let Some(InitVal::Exp(e)) = &def.init {
                let v = lower_expr(env, e)?;
                writeln!(env.output, "\tstore {}, @{}", v.text(), uname)?;
            }
        }
        return Ok(());
    }
    let uname = env.scopes.define(&def.name, Symbol::arr(dims.len() as i32))?;
    match &def.init {
        None => emit_array_decl(env, &uname, &dims, None)?,
        Some(init) => {
            let item = InitItem::from(init);
            let buf = array::flatten_init(&dims, &item, &mut |e| const_eval(env, e))?;
            if env.is_global {
                emit_array_decl(env, &uname, &dims, Some(&buf))?;
            } else {
                emit_array_decl(env, &uname, &dims, None)?;
                array::emit_local_array_init(env, &ArrayBase::Named(uname.clone()), &dims, &buf)?;
            }
        }
    }
    Ok(())
}

/// Local scalar `alloc` — globals go through `lower_var_def`'s own branch
/// instead, since a global's initializer must be baked into the `alloc`
/// itself rather than a following `store`.
fn emit_scalar_decl(env: &mut Env, uname: &str) -> CompileResult<()> {
    writeln!(env.output, "\t@{} = alloc i32", uname)?;
    Ok(())
}

fn emit_array_decl(env: &mut Env, uname: &str, dims: &[i32], init: Option<&[i32]>) -> CompileResult<()> {
    let ty = array::array_type_text(dims);
    if env.is_global {
        let init_text = match init {
            Some(buf) => array::global_aggregate_text(dims, buf),
            None => "zeroinit".to_string(),
        };
        writeln!(env.output, "global @{} = alloc {}, {}", uname, ty, init_text)?;
    } else {
        writeln!(env.output, "\t@{} = alloc {}", uname, ty)?;
    }
    Ok(())
}

pub fn lower_stmt(env: &mut Env, stmt: &Stmt) -> CompileResult<()> {
    match stmt {
        Stmt::Assign(lval, rhs) => {
            let v = lower_expr(env, rhs)?;
            lval_write(env, lval, v)
        }
        Stmt::Exp(None) => Ok(()),
        Stmt::Exp(Some(e)) => {
            lower_expr(env, e)?;
            Ok(())
        }
        Stmt::Block(b) => lower_block(env, b),
        Stmt::If(cond, then_s, else_s) => lower_if(env, cond, then_s, else_s.as_deref()),
        Stmt::While(cond, body) => lower_while(env, cond, body),
        Stmt::Break => {
            let id = env.current_while_id().ok_or_else(|| {
                CompileError::Logic("'break' outside of a loop".to_string())
            })?;
            writeln!(env.output, "\tjump {}", Env::while_end_label(id))?;
            env.block_terminated = true;
            open_jump_pad(env)
        }
        Stmt::Continue => {
            let id = env.current_while_id().ok_or_else(|| {
                CompileError::Logic("'continue' outside of a loop".to_string())
            })?;
            writeln!(env.output, "\tjump {}", Env::while_entry_label(id))?;
            env.block_terminated = true;
            open_jump_pad(env)
        }
        Stmt::Return(value) => {
            match value {
                Some(e) => {
                    let v = lower_expr(env, e)?;
                    writeln!(env.output, "\tret {}", v.text())?;
                }
                None => writeln!(env.output, "\tret")?,
            }
            env.scopes.mark_returned();
            env.block_terminated = true;
            open_jump_pad(env)
        }
    }
}

fn open_jump_pad(env: &mut Env) -> CompileResult<()> {
    let label = env.jump_pad_label();
    writeln!(env.output, "\n{}:", label)?;
    env.block_terminated = false;
    Ok(())
}

fn lower_if(env: &mut Env, cond: &Expr, then_s: &Stmt, else_s: Option<&Stmt>) -> CompileResult<()> {
    let then_l = env.then_label();
    let else_l = env.else_label();
    let end_l = env.if_end_label();
    env.bump_if_else();

    let cond_v = lower_expr(env, cond)?;
    let false_target = if else_s.is_some() { &else_l } else { &end_l };
    writeln!(env.output, "\tbr {}, {}, {}", cond_v.text(), then_l, false_target)?;
    env.block_terminated = true;

    writeln!(env.output, "\n{}:", then_l)?;
    env.block_terminated = false;
    lower_stmt(env, then_s)?;
    if !env.block_terminated {
        writeln!(env.output, "\tjump {}", end_l)?;
        env.block_terminated = true;
    }

    if let Some(else_s) = else_s {
        writeln!(env.output, "\n{}:", else_l)?;
        env.block_terminated = false;
        lower_stmt(env, else_s)?;
        if !env.block_terminated {
            writeln!(env.output, "\tjump {}", end_l)?;
            env.block_terminated = true;
        }
    }

    writeln!(env.output, "\n{}:", end_l)?;
    env.block_terminated = false;
    Ok(())
}

fn lower_while(env: &mut Env, cond: &Expr, body: &Stmt) -> CompileResult<()> {
    let id = env.enter_while();
    let entry_l = Env::while_entry_label(id);
    let body_l = Env::while_body_label(id);
    let end_l = Env::while_end_label(id);

    if !env.block_terminated {
        writeln!(env.output, "\tjump {}", entry_l)?;
    }
    env.block_terminated = true;

    writeln!(env.output, "\n{}:", entry_l)?;
    env.block_terminated = false;
    let cond_v = lower_expr(env, cond)?;
    writeln!(env.output, "\tbr {}, {}, {}", cond_v.text(), body_l, end_l)?;
    env.block_terminated = true;

    writeln!(env.output, "\n{}:", body_l)?;
    env.block_terminated = false;
    lower_stmt(env, body)?;
    if !env.block_terminated {
        writeln!(env.output, "\tjump {}", entry_l)?;
    }
    env.block_terminated = true;

    writeln!(env.output, "\n{}:", end_l)?;
    env.block_terminated = false;
    env.exit_while();
    Ok(())
}

/// Lower a function definition: predeclare its parameter-derived symbols in a
/// fresh scope, emit the signature, then the body, finally a guaranteed
/// trailing `ret` so callers may rely on termination (§4.4.4).
pub fn lower_func_def(env: &mut Env, f: &FuncDef) -> CompileResult<()> {
    env.is_global = false;
    env.enter_function();
    env.scopes.push_scope();

    let ret_ty_text = match f.ret_ty {
        FuncType::Int => "i32",
        FuncType::Void => "",
    };
    let mut param_texts = Vec::with_capacity(f.params.len());
    for p in &f.params {
        let ty = match &p.dims {
            None => "i32".to_string(),
            Some(extra_dims) => {
                let extra = const_dims(env, extra_dims)?;
                format!("*{}", array::array_type_text(&extra))
            }
        };
        param_texts.push(format!("@{}_param: {}", p.name, ty));
    }
    let signature = param_texts.join(", ");
    if f.ret_ty == FuncType::Void {
        writeln!(env.output, "fun @{}({}) {{", f.name, signature)?;
    } else {
        writeln!(env.output, "fun @{}({}): {} {{", f.name, signature, ret_ty_text)?;
    }
    writeln!(env.output, "%entry:")?;

    // Each array/scalar param gets its own stack slot, matching an ordinary
    // local `alloc`, initialised from the by-value `@name_param` argument —
    // this lets every subsequent read/write go through the same `load`/`store`/
    // `getelemptr` machinery as any other local, instead of special-casing
    // `func_arg_ref` throughout the frontend.
    for (i, p) in f.params.iter().enumerate() {
        let kind = match &p.dims {
            None => Symbol::var(),
            Some(extra_dims) => Symbol::ptr(extra_dims.len() as i32 + 1),
        };
        let uname = env.scopes.define(&p.name, kind)?;
        let ty = match &p.dims {
            None => "i32".to_string(),
            Some(extra_dims) => {
                let extra = const_dims(env, extra_dims)?;
                format!("*{}", array::array_type_text(&extra))
            }
        };
        writeln!(env.output, "\t@{} = alloc {}", uname, ty)?;
        writeln!(env.output, "\tstore @{}_param, @{}", p.name, uname)?;
        let _ = i;
    }

    lower_block(env, &f.body)?;

    if !env.block_terminated {
        match f.ret_ty {
            FuncType::Int => writeln!(env.output, "\tret 0")?,
            FuncType::Void => writeln!(env.output, "\tret")?,
        }
    }

    writeln!(env.output, "}}\n")?;
    env.scopes.pop_scope();
    env.is_global = true;
    Ok(())
}

pub fn lower_comp_unit(env: &mut Env, unit: &CompUnit) -> CompileResult<()> {
    env.emit_library_decls()?;

    for item in &unit.items {
        if let GlobalItem::FuncDef(f) = item {
            env.set_func_returns(&f.name, f.ret_ty == FuncType::Int);
        }
    }

    for item in &unit.items {
        match item {
            GlobalItem::Decl(decl) => lower_decl(env, decl)?,
            GlobalItem::FuncDef(_) => {}
        }
    }

    for item in &unit.items {
        if let GlobalItem::FuncDef(f) = item {
            lower_func_def(env, f)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn lower_source(src: &str) -> String {
        let unit = parse(src).unwrap();
        let mut env = Env::new();
        lower_comp_unit(&mut env, &unit).unwrap();
        env.output
    }

    #[test]
    fn folds_fully_constant_arithmetic() {
        let ir = lower_source("int main(){ return 1+2*3; }");
        assert!(!ir.contains("add"));
        assert!(!ir.contains("mul"));
        assert!(ir.contains("ret 7"));
    }

    #[test]
    fn short_circuit_or_skips_right_when_left_decides() {
        let ir = lower_source("int main(){ int a=0; if(1||a) a=1; return a; }");
        // Left operand `1` decides the `||`, so no short-circuit scaffolding
        // (`short_result`) should appear at all.
        assert!(!ir.contains("short_result"));
    }

    #[test]
    fn while_with_break_mints_one_set_of_loop_labels() {
        let ir = lower_source(
            "int main(){ int s=0,i=0; while(i<10){ if(i==5) break; s=s+i; i=i+1; } return s; }",
        );
        assert_eq!(ir.matches("while_entry_0:").count(), 1);
        assert_eq!(ir.matches("while_body_0:").count(), 1);
        assert_eq!(ir.matches("while_end_0:").count(), 1);
    }

    #[test]
    fn division_by_zero_is_not_folded() {
        let ir = lower_source("int main(){ return 1/0; }");
        assert!(ir.contains("div 1, 0"));
    }

    #[test]
    fn local_const_array_emits_its_initializer() {
        let ir = lower_source("int main(){ const int a[3] = {1, 2, 3}; return a[0]; }");
        assert!(ir.contains("@a_2 = alloc [i32, 3]"));
        assert!(ir.contains("store 1, %"));
        assert!(ir.contains("store 2, %"));
        assert!(ir.contains("store 3, %"));
    }
}
