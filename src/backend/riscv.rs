//! Instruction emitters with legalization (C7, §4.6).
//!
//! RV32I's `addi`/`lw`/`sw` immediates and `beq`/`bne`/... branch offsets are
//! both 12-bit signed fields. Every emitter here either fits the immediate
//! directly or falls back to materializing it through a scratch register —
//! callers never have to reason about the 12-bit boundary themselves.
//! Grounded on `asm.cpp`'s emitter functions.

use std::fmt::Write as _;

use crate::error::CompileResult;

const IMM12_MIN: i32 = -2048;
const IMM12_MAX: i32 = 2047;

pub fn fits_imm12(v: i32) -> bool {
    (IMM12_MIN..=IMM12_MAX).contains(&v)
}

/// Load an arbitrary 32-bit constant into `reg`.
pub fn emit_li(out: &mut String, reg: &str, value: i32) -> CompileResult<()> {
    writeln!(out, "  li {}, {}", reg, value)?;
    Ok(())
}

/// `dst = lhs + imm`, legalizing `imm` through `scratch` if it overflows 12 bits.
/// Used for every stack-relative address and frame-pointer adjustment.
pub fn emit_addi(out: &mut String, dst: &str, lhs: &str, imm: i32, scratch: &str) -> CompileResult<()> {
    if fits_imm12(imm) {
        writeln!(out, "  addi {}, {}, {}", dst, lhs, imm)?;
    } else {
        emit_li(out, scratch, imm)?;
        writeln!(out, "  add {}, {}, {}", dst, lhs, scratch)?;
    }
    Ok(())
}

/// `lw dst, imm(base)`, legalizing through `scratch` when `imm` overflows 12 bits
/// by first computing `scratch = base + imm` and loading `0(scratch)`.
pub fn emit_load(out: &mut String, dst: &str, base: &str, imm: i32, scratch: &str) -> CompileResult<()> {
    if fits_imm12(imm) {
        writeln!(out, "  lw {}, {}({})", dst, imm, base)?;
    } else {
        emit_addi(out, scratch, base, imm, scratch)?;
        writeln!(out, "  lw {}, 0({})", dst, scratch)?;
    }
    Ok(())
}

/// `sw src, imm(base)`, same legalization as `emit_load`. `scratch` must not
/// alias `src`.
pub fn emit_store(out: &mut String, src: &str, base: &str, imm: i32, scratch: &str) -> CompileResult<()> {
    if fits_imm12(imm) {
        writeln!(out, "  sw {}, {}({})", src, imm, base)?;
    } else {
        emit_addi(out, scratch, base, imm, scratch)?;
        writeln!(out, "  sw {}, 0({})", src, scratch)?;
    }
    Ok(())
}

/// A conditional branch to a named label, legalized against RV32I's ±4KiB
/// branch-offset window via an unconditional-jump trampoline: `op` (a
/// two-operand pseudo like `bnez`/`beqz`) branches over a near `j` that
/// performs the real (possibly far) jump, landing on a far label when not
/// taken, since `j` itself has a much larger reach than `bnez`/`beqz`.
/// Self-contained: both the near and far labels are minted and emitted here
/// from `trampoline_id`, so callers never supply anything else.
pub fn emit_branch(out: &mut String, op: &str, reg: &str, label: &str, trampoline_id: u32) -> CompileResult<()> {
    let near = format!(".Lbnear_{}", trampoline_id);
    let far = format!(".Lbfar_{}", trampoline_id);
    writeln!(out, "  {} {}, {}", op, reg, near)?;
    writeln!(out, "  j {}", far)?;
    writeln!(out, "{}:", near)?;
    writeln!(out, "  j {}", label)?;
    writeln!(out, "{}:", far)?;
    Ok(())
}
