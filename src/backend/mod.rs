//! C6: instruction-by-instruction codegen (§4.5). Walks the Koopa IR object
//! graph produced by re-parsing the frontend's text output and emits RV32IM
//! assembly text. Grounded on `asm.cpp`'s visitor; array/global addressing
//! (`getelemptr`/`getptr`/`.data`) is synthesized from the frame/stack-map
//! design below since the lv7-era original never had arrays.

pub mod frame;
pub mod riscv;
pub mod state;
pub mod util;

use std::fmt::Write as _;

use koopa::ir::{BasicBlock, BinaryOp, Function, FunctionData, Program, Type, TypeKind, Value, ValueKind};

use crate::error::{CompileError, CompileResult};
use state::CodeGen;
use util::{arg_reg, asm_label, gep_elem_size, getptr_elem_size, is_power_of_two, type_size_bytes};

/// Lower a whole program (already parsed into Koopa's object graph) to
/// RV32IM assembly text.
pub fn generate(program: &Program) -> CompileResult<String> {
    let mut out = String::new();
    emit_globals(program, &mut out)?;
    for &func in program.func_layout() {
        let data = program.func(func);
        if data.layout().bbs().len() == 0 {
            // library declarations (`getint`, `putint`, ...) carry no body.
            continue;
        }
        emit_function(program, data, &mut out)?;
    }
    Ok(out)
}

fn emit_globals(program: &Program, out: &mut String) -> CompileResult<()> {
    let globals = program.inst_layout();
    if globals.is_empty() {
        return Ok(());
    }
    writeln!(out, "  .data")?;
    for &value in globals {
        let borrowed = program.borrow_value(value);
        let name = borrowed
            .name()
            .as_ref()
            .expect("global value has no name")
            .trim_start_matches('@')
            .to_string();
        let ty = borrowed.ty().clone();
        let pointee = match ty.kind() {
            TypeKind::Pointer(p) => p.clone(),
            _ => ty.clone(),
        };
        let init = match borrowed.kind() {
            ValueKind::GlobalAlloc(alloc) => alloc.init(),
            other => {
                return Err(CompileError::InvalidIrKind(format!(
                    "expected global alloc, found {other:?}"
                )))
            }
        };
        drop(borrowed);
        writeln!(out, "  .globl {name}")?;
        writeln!(out, "{name}:")?;
        emit_global_init(program, init, &pointee, out)?;
        writeln!(out)?;
    }
    Ok(())
}

fn emit_global_init(program: &Program, init: Value, ty: &Type, out: &mut String) -> CompileResult<()> {
    let borrowed = program.borrow_value(init);
    match borrowed.kind() {
        ValueKind::Integer(i) => {
            writeln!(out, "  .word {}", i.value())?;
            Ok(())
        }
        ValueKind::ZeroInit(_) => {
            writeln!(out, "  .zero {}", type_size_bytes(ty))?;
            Ok(())
        }
        ValueKind::Aggregate(agg) => {
            let elem_ty = match ty.kind() {
                TypeKind::Array(elem, _) => elem.clone(),
                other => {
                    return Err(CompileError::InvalidIrKind(format!(
                        "aggregate initializer for non-array type {other:?}"
                    )))
                }
            };
            let elems: Vec<Value> = agg.elems().to_vec();
            drop(borrowed);
            for elem in elems {
                emit_global_init(program, elem, &elem_ty, out)?;
            }
            Ok(())
        }
        other => Err(CompileError::InvalidIrKind(format!(
            "unsupported global initializer {other:?}"
        ))),
    }
}

fn emit_function(program: &Program, data: &FunctionData, out: &mut String) -> CompileResult<()> {
    let frame = frame::layout(data);
    let mut cg = CodeGen::new(program, frame);
    let fname = data.name().trim_start_matches('@').to_string();

    writeln!(cg.output, "  .text")?;
    writeln!(cg.output, "  .globl {fname}")?;
    writeln!(cg.output, "{fname}:")?;
    emit_prologue(&mut cg)?;

    for (&bb, node) in data.layout().bbs() {
        let bb_data = data.dfg().bb(bb);
        let bb_name = bb_data.name().as_ref().map(|s| s.as_str()).unwrap_or("bb");
        writeln!(cg.output, "{}:", asm_label(data.name(), bb_name))?;
        for &inst in node.insts().keys() {
            emit_inst(&mut cg, data, inst)?;
        }
    }

    out.push_str(&cg.output);
    writeln!(out)?;
    Ok(())
}

fn emit_prologue(cg: &mut CodeGen) -> CompileResult<()> {
    let size = cg.frame.size;
    if size > 0 {
        riscv::emit_addi(&mut cg.output, "sp", "sp", -size, "t0")?;
    }
    if let Some(off) = cg.frame.ra_offset {
        riscv::emit_store(&mut cg.output, "ra", "sp", off, "t0")?;
    }
    Ok(())
}

fn emit_epilogue(cg: &mut CodeGen) -> CompileResult<()> {
    if let Some(off) = cg.frame.ra_offset {
        riscv::emit_load(&mut cg.output, "ra", "sp", off, "t0")?;
    }
    if cg.frame.size > 0 {
        riscv::emit_addi(&mut cg.output, "sp", "sp", cg.frame.size, "t0")?;
    }
    writeln!(cg.output, "  ret")?;
    Ok(())
}

/// Resolve `value` into `reg`, ready for immediate use.
///
/// There is no register allocator (§9 Design Notes): every operand is
/// re-derived into a scratch register at the point of use rather than kept
/// live across instructions. Two value kinds are address-valued rather than
/// word-valued — `alloc` (local storage) and a global — and those compute
/// their address on the fly instead of loading a stored word; every other
/// kind (including a prior `getelemptr`/`getptr`, whose *computed* address
/// was written to its own slot like any other result) is a plain `lw`.
fn resolve(cg: &mut CodeGen, data: &FunctionData, value: Value, reg: &str) -> CompileResult<()> {
    if let Some(local) = data.dfg().values().get(&value) {
        match local.kind() {
            ValueKind::Integer(i) => {
                let v = i.value();
                if v == 0 {
                    writeln!(cg.output, "  mv {reg}, x0")?;
                } else {
                    riscv::emit_li(&mut cg.output, reg, v)?;
                }
                return Ok(());
            }
            ValueKind::FuncArgRef(r) => {
                let idx = r.index();
                if idx < 8 {
                    writeln!(cg.output, "  mv {reg}, {}", arg_reg(idx))?;
                } else {
                    let off = cg.frame.size + 4 * (idx as i32 - 8);
                    riscv::emit_load(&mut cg.output, reg, "sp", off, "t6")?;
                }
                return Ok(());
            }
            ValueKind::Alloc(_) => {
                let off = cg.frame.slot_of(value);
                riscv::emit_addi(&mut cg.output, reg, "sp", off, reg)?;
                return Ok(());
            }
            _ => {}
        }
    } else {
        let borrowed = cg.program.borrow_value(value);
        if matches!(borrowed.kind(), ValueKind::GlobalAlloc(_)) {
            let name = borrowed
                .name()
                .as_ref()
                .expect("global value has no name")
                .trim_start_matches('@')
                .to_string();
            drop(borrowed);
            writeln!(cg.output, "  la {reg}, {name}")?;
            return Ok(());
        }
    }
    let off = cg.frame.slot_of(value);
    riscv::emit_load(&mut cg.output, reg, "sp", off, "t6")?;
    Ok(())
}

/// The type of a value, whichever pool (function-local or global) it lives in.
fn operand_type(cg: &CodeGen, data: &FunctionData, value: Value) -> Type {
    if let Some(local) = data.dfg().values().get(&value) {
        local.ty().clone()
    } else {
        cg.program.borrow_value(value).ty().clone()
    }
}

fn func_returns_value(ty: &Type) -> bool {
    match ty.kind() {
        TypeKind::Function(_, ret) => !matches!(ret.kind(), TypeKind::Unit),
        _ => false,
    }
}

/// `dst = base + index * elem_size`, strength-reducing a power-of-two stride
/// to a shift (§4.6) and routing anything else through a multiply. `idx`
/// is clobbered in place before the final add.
fn emit_index_add(
    out: &mut String,
    dst: &str,
    base: &str,
    idx: &str,
    elem_size: i32,
    scratch: &str,
) -> CompileResult<()> {
    if let Some(shift) = is_power_of_two(elem_size) {
        writeln!(out, "  slli {idx}, {idx}, {shift}")?;
    } else {
        riscv::emit_li(out, scratch, elem_size)?;
        writeln!(out, "  mul {idx}, {idx}, {scratch}")?;
    }
    writeln!(out, "  add {dst}, {base}, {idx}")?;
    Ok(())
}

fn bb_label(data: &FunctionData, bb: BasicBlock) -> String {
    let bb_data = data.dfg().bb(bb);
    let bb_name = bb_data.name().as_ref().map(|s| s.as_str()).unwrap_or("bb");
    asm_label(data.name(), bb_name)
}

fn emit_binary_op(out: &mut String, op: BinaryOp, dst: &str, lhs: &str, rhs: &str) -> CompileResult<()> {
    match op {
        BinaryOp::Add => writeln!(out, "  add {dst}, {lhs}, {rhs}")?,
        BinaryOp::Sub => writeln!(out, "  sub {dst}, {lhs}, {rhs}")?,
        BinaryOp::Mul => writeln!(out, "  mul {dst}, {lhs}, {rhs}")?,
        BinaryOp::Div => writeln!(out, "  div {dst}, {lhs}, {rhs}")?,
        BinaryOp::Mod => writeln!(out, "  rem {dst}, {lhs}, {rhs}")?,
        BinaryOp::Lt => writeln!(out, "  slt {dst}, {lhs}, {rhs}")?,
        BinaryOp::Gt => writeln!(out, "  sgt {dst}, {lhs}, {rhs}")?,
        BinaryOp::Le => {
            writeln!(out, "  sgt {dst}, {lhs}, {rhs}")?;
            writeln!(out, "  seqz {dst}, {dst}")?;
        }
        BinaryOp::Ge => {
            writeln!(out, "  slt {dst}, {lhs}, {rhs}")?;
            writeln!(out, "  seqz {dst}, {dst}")?;
        }
        BinaryOp::Eq => {
            writeln!(out, "  xor {dst}, {lhs}, {rhs}")?;
            writeln!(out, "  seqz {dst}, {dst}")?;
        }
        BinaryOp::NotEq => {
            writeln!(out, "  xor {dst}, {lhs}, {rhs}")?;
            writeln!(out, "  snez {dst}, {dst}")?;
        }
        BinaryOp::And => writeln!(out, "  and {dst}, {lhs}, {rhs}")?,
        BinaryOp::Or => writeln!(out, "  or {dst}, {lhs}, {rhs}")?,
        other => {
            return Err(CompileError::InvalidIrKind(format!(
                "unsupported binary operator: {other:?}"
            )))
        }
    }
    Ok(())
}

fn emit_inst(cg: &mut CodeGen, data: &FunctionData, inst: Value) -> CompileResult<()> {
    let kind = data.dfg().value(inst).kind();
    match kind {
        ValueKind::Alloc(_) => Ok(()),

        ValueKind::GlobalAlloc(_) => Err(CompileError::InvalidIrKind(
            "global alloc encountered inside a function body".to_string(),
        )),

        ValueKind::Load(l) => {
            let src = l.src();
            resolve(cg, data, src, "t0")?;
            riscv::emit_load(&mut cg.output, "t0", "t0", 0, "t1")?;
            let off = cg.frame.slot_of(inst);
            riscv::emit_store(&mut cg.output, "t0", "sp", off, "t1")?;
            Ok(())
        }

        ValueKind::Store(s) => {
            let (val, dest) = (s.value(), s.dest());
            resolve(cg, data, val, "t0")?;
            resolve(cg, data, dest, "t1")?;
            riscv::emit_store(&mut cg.output, "t0", "t1", 0, "t2")?;
            Ok(())
        }

        ValueKind::Binary(b) => {
            let (op, lhs, rhs) = (b.op(), b.lhs(), b.rhs());
            resolve(cg, data, lhs, "t0")?;
            resolve(cg, data, rhs, "t1")?;
            emit_binary_op(&mut cg.output, op, "t0", "t0", "t1")?;
            let off = cg.frame.slot_of(inst);
            riscv::emit_store(&mut cg.output, "t0", "sp", off, "t2")?;
            Ok(())
        }

        ValueKind::Branch(br) => {
            let (cond, true_bb, false_bb) = (br.cond(), br.true_bb(), br.false_bb());
            resolve(cg, data, cond, "t0")?;
            let true_label = bb_label(data, true_bb);
            let false_label = bb_label(data, false_bb);
            let id = cg.next_trampoline_id();
            riscv::emit_branch(&mut cg.output, "bnez", "t0", &true_label, id)?;
            let id = cg.next_trampoline_id();
            riscv::emit_branch(&mut cg.output, "beqz", "t0", &false_label, id)?;
            Ok(())
        }

        ValueKind::Jump(j) => {
            let label = bb_label(data, j.target());
            writeln!(cg.output, "  j {label}")?;
            Ok(())
        }

        ValueKind::Call(c) => {
            let callee = c.callee();
            let args: Vec<Value> = c.args().to_vec();
            for (i, &arg) in args.iter().enumerate() {
                if i < 8 {
                    resolve(cg, data, arg, &arg_reg(i))?;
                } else {
                    resolve(cg, data, arg, "t0")?;
                    riscv::emit_store(&mut cg.output, "t0", "sp", 4 * (i as i32 - 8), "t1")?;
                }
            }
            let callee_data = cg.func_data(callee);
            let callee_name = callee_data.name().trim_start_matches('@').to_string();
            let returns_value = func_returns_value(callee_data.ty());
            writeln!(cg.output, "  call {callee_name}")?;
            if returns_value {
                let off = cg.frame.slot_of(inst);
                riscv::emit_store(&mut cg.output, "a0", "sp", off, "t0")?;
            }
            Ok(())
        }

        ValueKind::Return(r) => {
            if let Some(v) = r.value() {
                resolve(cg, data, v, "a0")?;
            }
            emit_epilogue(cg)?;
            Ok(())
        }

        ValueKind::GetElemPtr(g) => {
            let (base, index) = (g.src(), g.index());
            let base_ty = operand_type(cg, data, base);
            let elem_size = gep_elem_size(&base_ty);
            resolve(cg, data, base, "t0")?;
            resolve(cg, data, index, "t1")?;
            emit_index_add(&mut cg.output, "t0", "t0", "t1", elem_size, "t2")?;
            let off = cg.frame.slot_of(inst);
            riscv::emit_store(&mut cg.output, "t0", "sp", off, "t2")?;
            Ok(())
        }

        ValueKind::GetPtr(g) => {
            let (base, index) = (g.src(), g.index());
            let base_ty = operand_type(cg, data, base);
            let elem_size = getptr_elem_size(&base_ty);
            resolve(cg, data, base, "t0")?;
            resolve(cg, data, index, "t1")?;
            emit_index_add(&mut cg.output, "t0", "t0", "t1", elem_size, "t2")?;
            let off = cg.frame.slot_of(inst);
            riscv::emit_store(&mut cg.output, "t0", "sp", off, "t2")?;
            Ok(())
        }

        other => Err(CompileError::InvalidIrKind(format!(
            "unsupported instruction kind: {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lower_program;
    use crate::parser::parse;
    use koopa::front::Driver;

    fn compile(src: &str) -> String {
        let unit = parse(src).unwrap();
        let ir = lower_program(&unit).unwrap();
        let program = Driver::from(ir).generate_program().unwrap();
        generate(&program).unwrap()
    }

    #[test]
    fn emits_return_constant() {
        let asm = compile("int main() { return 42; }");
        assert!(asm.contains(".globl main"));
        assert!(asm.contains("main:"));
        assert!(asm.contains("li a0, 42") || asm.contains("li t"));
        assert!(asm.contains("ret"));
    }

    #[test]
    fn emits_call_with_arguments() {
        let asm = compile("int main() { putint(1 + 2); return 0; }");
        assert!(asm.contains("call putint"));
    }

    #[test]
    fn emits_global_array_data_section() {
        let asm = compile("const int a[2] = {1, 2}; int main() { return a[0]; }");
        assert!(asm.contains(".data"));
        assert!(asm.contains(".globl a"));
        assert!(asm.contains(".word 1"));
        assert!(asm.contains(".word 2"));
    }
}
