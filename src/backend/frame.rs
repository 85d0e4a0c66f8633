//! Frame-size computation (§4.5.1): a function's whole stack layout is decided
//! before a single instruction is emitted, rather than growing the frame as
//! codegen walks the body. Grounded on `backend_utils.cpp`'s frame-size pass.

use std::collections::HashMap;

use koopa::ir::{FunctionData, ValueKind};

use crate::backend::state::Frame;
use crate::backend::util::alloc_payload_size;

fn round_up_16(n: i32) -> i32 {
    (n + 15) & !15
}

/// Whether an instruction's result value is ever used elsewhere — values with
/// a unit return type (`store`, `branch`, `jump`, `return`) never get a slot.
fn produces_value(kind: &ValueKind) -> bool {
    !matches!(
        kind,
        ValueKind::Store(_) | ValueKind::Branch(_) | ValueKind::Jump(_) | ValueKind::Return(_)
    )
}

/// Compute the full frame layout for `func` in one pass, per §4.5.1:
///
/// 1. the outgoing-argument area for the widest call this function makes is
///    reserved first, at offset 0 — call sites always stage args beyond the
///    first 8 at `0(sp), 4(sp), …` (§4.5.4), and a callee reads its own
///    stack-passed arguments at `frame_size + 4*(i-8)` from *its* `sp`
///    (§4.5.3), which only lines up with the caller's staging area when that
///    area sits at the very bottom of the caller's frame;
/// 2. every instruction that yields a value (including every `alloc`, sized
///    by its pointee type) gets a slot above that, in program order;
/// 3. if the function contains any `call`, a slot for `ra` is reserved last;
/// 4. the total is rounded up to a 16-byte boundary.
pub fn layout(func: &FunctionData) -> Frame {
    let dfg = func.dfg();
    let mut has_call = false;
    let mut max_outgoing_words = 0i32;
    for (&_bb, node) in func.layout().bbs() {
        for &inst in node.insts().keys() {
            if let ValueKind::Call(call) = dfg.value(inst).kind() {
                has_call = true;
                let extra = call.args().len() as i32 - 8;
                if extra > max_outgoing_words {
                    max_outgoing_words = extra;
                }
            }
        }
    }

    let mut offset = max_outgoing_words.max(0) * 4;

    let mut slots = HashMap::new();
    for (&_bb, node) in func.layout().bbs() {
        for &inst in node.insts().keys() {
            let data = dfg.value(inst);
            if !produces_value(data.kind()) {
                continue;
            }
            let size = match data.kind() {
                ValueKind::Alloc(_) => alloc_payload_size(data.ty()),
                _ => 4,
            };
            slots.insert(inst, offset);
            offset += size.max(4);
        }
    }

    let ra_offset = if has_call {
        let o = offset;
        offset += 4;
        Some(o)
    } else {
        None
    };

    Frame { size: round_up_16(offset), ra_offset, slots }
}
