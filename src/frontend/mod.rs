//! C4: frontend lowering. AST in, Koopa-IR text out.

pub mod array;
pub mod env;
pub mod lower;

use crate::ast::CompUnit;
use crate::error::CompileResult;
use env::Env;

/// Lower a whole compilation unit to Koopa-IR text.
pub fn lower_program(unit: &CompUnit) -> CompileResult<String> {
    let mut env = Env::new();
    lower::lower_comp_unit(&mut env, unit)?;
    Ok(env.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn lowers_hello_world_style_program() {
        let unit = parse("int main() { putint(1 + 2); return 0; }").unwrap();
        let ir = lower_program(&unit).unwrap();
        assert!(ir.contains("decl @putint(i32)"));
        assert!(ir.contains("fun @main(): i32 {"));
        assert!(ir.contains("call @putint(3)"));
        assert!(ir.contains("ret 0"));
    }

    #[test]
    fn global_scalar_initializer_is_baked_into_the_alloc() {
        let unit = parse("int x = 5; int main() { return x; }").unwrap();
        let ir = lower_program(&unit).unwrap();
        assert!(ir.contains("global @x_0 = alloc i32, 5"));
        assert!(!ir.contains("store"), "global init must not use a runtime store: {ir}");
    }

    #[test]
    fn uninitialized_global_scalar_is_zeroinit() {
        let unit = parse("int x; int main() { return x; }").unwrap();
        let ir = lower_program(&unit).unwrap();
        assert!(ir.contains("global @x_0 = alloc i32, zeroinit"));
    }

    #[test]
    fn global_array_emits_aggregate_initializer() {
        let unit = parse("const int a[2][3] = {1, 2, 3, {4}}; int main() { return 0; }")
            .unwrap();
        let ir = lower_program(&unit).unwrap();
        assert!(ir.contains("global @a_0 = alloc [[i32, 3], 2], {{1, 2, 3}, {4, 0, 0}}"));
    }

    #[test]
    fn array_initializer_overflowing_declared_shape_is_fatal() {
        let unit =
            parse("const int a[2][3] = {1, 2, 3, {4}, {5, 6}}; int main() { return 0; }")
                .unwrap();
        assert!(lower_program(&unit).is_err());
    }
}
