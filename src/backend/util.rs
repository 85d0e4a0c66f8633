//! Runtime symbol/type utilities (C8): size-of for IR types, power-of-two
//! detection for strength reduction, and label/register name composition.
//! Grounded on `backend_utils.cpp`'s free functions of the same purpose.

use koopa::ir::{Type, TypeKind};

/// Byte size of a Koopa type. Pointers are always one word regardless of
/// pointee (RV32 is a 32-bit machine); arrays multiply the element size by
/// their length; functions never appear as a value's storage type.
pub fn type_size_bytes(ty: &Type) -> i32 {
    match ty.kind() {
        TypeKind::Int32 => 4,
        TypeKind::Unit => 0,
        TypeKind::Pointer(_) => 4,
        TypeKind::Array(base, len) => type_size_bytes(base) * (*len as i32),
        TypeKind::Function(..) => 4,
    }
}

/// Byte size of the region an `alloc` instruction reserves: `alloc`'s own
/// value type is `*T` (a pointer to the storage it just created), so the
/// reserved size is `sizeof(T)`, not `sizeof(*T)` (always 4).
pub fn alloc_payload_size(alloc_ty: &Type) -> i32 {
    match alloc_ty.kind() {
        TypeKind::Pointer(pointee) => type_size_bytes(pointee),
        _ => type_size_bytes(alloc_ty),
    }
}

/// Element stride for `getelemptr base, i`: `base`'s type is always
/// `*[T, N]` (pointer to an array of known shape), and indexing decays the
/// outer dimension, stepping by `sizeof(T)` (§4.4.6, §4.5.4).
pub fn gep_elem_size(base_ty: &Type) -> i32 {
    match base_ty.kind() {
        TypeKind::Pointer(inner) => match inner.kind() {
            TypeKind::Array(elem, _) => type_size_bytes(elem),
            _ => type_size_bytes(inner),
        },
        _ => panic!("getelemptr base is not a pointer: {:?}", base_ty),
    }
}

/// Element stride for `getptr base, i`: `base`'s type is `*T` where `T` is
/// the pointee element itself (no outer dimension to decay), so the step is
/// `sizeof(T)` directly.
pub fn getptr_elem_size(base_ty: &Type) -> i32 {
    match base_ty.kind() {
        TypeKind::Pointer(inner) => type_size_bytes(inner),
        _ => panic!("getptr base is not a pointer: {:?}", base_ty),
    }
}

/// `Some(log2(x))` if `x` is a positive power of two, else `None`. The only
/// arithmetic optimisation the backend performs (§4.6): an array-stride
/// multiply by a power-of-two element size becomes a left shift.
pub fn is_power_of_two(x: i32) -> Option<u32> {
    if x > 0 && (x & (x - 1)) == 0 {
        Some(x.trailing_zeros())
    } else {
        None
    }
}

/// The asm label for one of a function's basic blocks. IR basic-block names
/// are process-wide unique by construction (`frontend::env::Env`'s label
/// counters are never reset per function), except for the fixed `%entry`
/// name every function shares, so every label is namespaced by its owning
/// function's identifier to stay safe regardless.
pub fn asm_label(func_name: &str, bb_name: &str) -> String {
    format!(
        "{}_{}",
        func_name.trim_start_matches('@'),
        bb_name.trim_start_matches('%')
    )
}

/// The integer-argument register for the first 8 call-site arguments.
pub fn arg_reg(index: usize) -> String {
    format!("a{}", index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_of_two_detection() {
        assert_eq!(is_power_of_two(1), Some(0));
        assert_eq!(is_power_of_two(4), Some(2));
        assert_eq!(is_power_of_two(3), None);
        assert_eq!(is_power_of_two(0), None);
        assert_eq!(is_power_of_two(-4), None);
    }

    #[test]
    fn asm_label_strips_sigils_and_namespaces_by_function() {
        assert_eq!(asm_label("@main", "%then_0"), "main_then_0");
        assert_eq!(asm_label("@f", "%entry"), "f_entry");
    }

    #[test]
    fn arg_reg_names() {
        assert_eq!(arg_reg(0), "a0");
        assert_eq!(arg_reg(7), "a7");
    }
}
