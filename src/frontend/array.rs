//! Array type printing and initializer resolution/emission (§4.4.5).
//!
//! Grounded on `frontend_utils.cpp`'s `format_array_type`/`print_array_type`/
//! `print_array`: global arrays emit a nested brace aggregate, local arrays emit
//! a depth-first `getelemptr`+`store` sequence. The original's `-1` base
//! sentinel ("address off `@name` directly" vs "address off a prior
//! `getelemptr` temp") becomes the `ArrayBase` enum below rather than a magic
//! number, per SPEC_FULL.md's supplemented-features note.

use std::fmt::Write as _;

use crate::ast::{ConstInitVal, InitVal};
use crate::error::CompileResult;
use crate::frontend::env::Env;

/// Suffix-product strides of a declared shape: `strides[i]` is the element
/// count of the sub-array starting at dimension `i` (`strides[dims.len()] ==
/// 1`, `strides[0]` is the whole array's element count).
pub fn strides(dims: &[i32]) -> Vec<i32> {
    let mut s = vec![1i32; dims.len() + 1];
    for i in (0..dims.len()).rev() {
        s[i] = s[i + 1] * dims[i];
    }
    s
}

/// Koopa type text for a shape, nested innermost-first:
/// `[2, 3]` (meaning `int[2][3]`) → `"[[i32, 3], 2]"`.
pub fn array_type_text(dims: &[i32]) -> String {
    if dims.is_empty() {
        return "i32".to_string();
    }
    let mut text = "i32".to_string();
    for &d in dims.iter().rev() {
        text = format!("[{}, {}]", text, d);
    }
    text
}

/// A braced initializer item, generic over `ConstInitVal`/`InitVal` so the
/// resolver below only has to be written once.
pub enum InitItem<'a> {
    Scalar(&'a crate::ast::Expr),
    List(Vec<InitItem<'a>>),
}

impl<'a> From<&'a ConstInitVal> for InitItem<'a> {
    fn from(v: &'a ConstInitVal) -> Self {
        match v {
            ConstInitVal::Exp(e) => InitItem::Scalar(e),
            ConstInitVal::List(items) => {
                InitItem::List(items.iter().map(InitItem::from).collect())
            }
        }
    }
}

impl<'a> From<&'a InitVal> for InitItem<'a> {
    fn from(v: &'a InitVal) -> Self {
        match v {
            InitVal::Exp(e) => InitItem::Scalar(e),
            InitVal::List(items) => InitItem::List(items.iter().map(InitItem::from).collect()),
        }
    }
}

/// Resolve a (possibly irregular) initializer list against a declared shape
/// into a flat buffer of scalars, per the write-cursor algorithm in
/// SPEC_FULL.md §4.4.5. `eval` folds a scalar expression to its constant value.
pub fn flatten_init(
    dims: &[i32],
    item: &InitItem<'_>,
    eval: &mut impl FnMut(&crate::ast::Expr) -> CompileResult<i32>,
) -> CompileResult<Vec<i32>> {
    if matches!(item, InitItem::Scalar(_)) {
        return Err(crate::error::CompileError::InitializerShape(
            "array initializer must be a brace-enclosed list, found a bare scalar".to_string(),
        ));
    }
    let strides = strides(dims);
    let mut buf = Vec::new();
    fill(0, dims, &strides, item, &mut buf, eval)?;
    Ok(buf)
}

fn fill(
    level: usize,
    dims: &[i32],
    strides: &[i32],
    item: &InitItem<'_>,
    buf: &mut Vec<i32>,
    eval: &mut impl FnMut(&crate::ast::Expr) -> CompileResult<i32>,
) -> CompileResult<()> {
    let start = buf.len();
    let capacity = strides[level] as usize;
    match item {
        InitItem::Scalar(e) => buf.push(eval(e)?),
        InitItem::List(items) => {
            for sub in items {
                let cur_local = buf.len() - start;
                if cur_local >= capacity {
                    return Err(crate::error::CompileError::InitializerShape(
                        "initializer has more elements than the declared array shape"
                            .to_string(),
                    ));
                }
                match sub {
                    InitItem::Scalar(e) => buf.push(eval(e)?),
                    InitItem::List(_) => {
                        let mut l = level + 1;
                        while l < dims.len() && cur_local % strides[l] as usize != 0 {
                            l += 1;
                        }
                        fill(l, dims, strides, sub, buf, eval)?;
                    }
                }
            }
        }
    }
    let target = start + capacity;
    while buf.len() < target {
        buf.push(0);
    }
    Ok(())
}

/// Build the nested brace aggregate text for a resolved flat buffer, e.g.
/// `{{1, 2, 3}, {4, 0, 0}}` for shape `[2, 3]`.
pub fn global_aggregate_text(dims: &[i32], buf: &[i32]) -> String {
    let mut index = 0usize;
    build_aggregate(dims, 0, buf, &mut index)
}

fn build_aggregate(dims: &[i32], level: usize, buf: &[i32], index: &mut usize) -> String {
    if level == dims.len() - 1 {
        let parts: Vec<String> = (0..dims[level] as usize)
            .map(|_| {
                let v = buf[*index];
                *index += 1;
                v.to_string()
            })
            .collect();
        format!("{{{}}}", parts.join(", "))
    } else {
        let parts: Vec<String> = (0..dims[level])
            .map(|_| build_aggregate(dims, level + 1, buf, index))
            .collect();
        format!("{{{}}}", parts.join(", "))
    }
}

/// Base pointer for a `getelemptr` step while walking a local array's shape:
/// either straight off the named stack slot, or off a previously computed
/// `getelemptr` temporary.
pub enum ArrayBase {
    Named(String),
    Temp(u32),
}

/// Emit the `getelemptr`+`store` sequence that initializes a local array,
/// walking `dims` depth-first.
pub fn emit_local_array_init(
    env: &mut Env,
    base: &ArrayBase,
    dims: &[i32],
    buf: &[i32],
) -> CompileResult<()> {
    let mut index = 0usize;
    emit_level(env, base, dims, 0, buf, &mut index)
}

fn emit_level(
    env: &mut Env,
    base: &ArrayBase,
    dims: &[i32],
    level: usize,
    buf: &[i32],
    index: &mut usize,
) -> CompileResult<()> {
    if level == dims.len() - 1 {
        for i in 0..dims[level] {
            let ptr = env.new_temp();
            emit_getelemptr(env, base, ptr, i)?;
            writeln!(env.output, "\tstore {}, %{}", buf[*index], ptr)?;
            *index += 1;
        }
    } else {
        for i in 0..dims[level] {
            let ptr = env.new_temp();
            emit_getelemptr(env, base, ptr, i)?;
            emit_level(env, &ArrayBase::Temp(ptr), dims, level + 1, buf, index)?;
        }
    }
    Ok(())
}

fn emit_getelemptr(env: &mut Env, base: &ArrayBase, dest: u32, index: i32) -> CompileResult<()> {
    match base {
        ArrayBase::Named(name) => {
            writeln!(env.output, "\t%{} = getelemptr @{}, {}", dest, name, index)?
        }
        ArrayBase::Temp(t) => writeln!(env.output, "\t%{} = getelemptr %{}, {}", dest, t, index)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;

    fn scalar(n: i32) -> crate::ast::ConstInitVal {
        ConstInitVal::Exp(Expr::Number(n))
    }

    #[test]
    fn array_type_nests_innermost_first() {
        assert_eq!(array_type_text(&[2, 3]), "[[i32, 3], 2]");
        assert_eq!(array_type_text(&[4]), "[i32, 4]");
    }

    #[test]
    fn strides_are_suffix_products() {
        assert_eq!(strides(&[2, 3]), vec![6, 3, 1]);
    }

    #[test]
    fn irregular_initializer_aligns_to_largest_fitting_sub_array() {
        // int a[2][3] = {1, 2, 3, {4}};
        let init = ConstInitVal::List(vec![
            scalar(1),
            scalar(2),
            scalar(3),
            ConstInitVal::List(vec![scalar(4)]),
        ]);
        let item = InitItem::from(&init);
        let mut eval = |e: &Expr| -> CompileResult<i32> {
            match e {
                Expr::Number(n) => Ok(*n),
                _ => unreachable!(),
            }
        };
        let buf = flatten_init(&[2, 3], &item, &mut eval).unwrap();
        assert_eq!(buf, vec![1, 2, 3, 4, 0, 0]);
        assert_eq!(
            global_aggregate_text(&[2, 3], &buf),
            "{{1, 2, 3}, {4, 0, 0}}"
        );
    }

    #[test]
    fn initializer_overflowing_the_declared_shape_is_a_shape_error() {
        // int a[2][3] = {1, 2, 3, {4}, {5, 6}}; — a third row does not fit.
        let init = ConstInitVal::List(vec![
            scalar(1),
            scalar(2),
            scalar(3),
            ConstInitVal::List(vec![scalar(4)]),
            ConstInitVal::List(vec![scalar(5), scalar(6)]),
        ]);
        let item = InitItem::from(&init);
        let mut eval = |e: &Expr| -> CompileResult<i32> {
            match e {
                Expr::Number(n) => Ok(*n),
                _ => unreachable!(),
            }
        };
        assert!(flatten_init(&[2, 3], &item, &mut eval).is_err());
    }

    #[test]
    fn empty_brace_zero_fills_whole_sub_array() {
        let init = ConstInitVal::List(vec![ConstInitVal::List(vec![])]);
        let item = InitItem::from(&init);
        let mut eval = |_: &Expr| -> CompileResult<i32> { unreachable!() };
        let buf = flatten_init(&[2, 3], &item, &mut eval).unwrap();
        assert_eq!(buf, vec![0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn bare_scalar_initializer_for_an_array_is_a_shape_error() {
        let init = scalar(5);
        let item = InitItem::from(&init);
        let mut eval = |e: &Expr| -> CompileResult<i32> {
            match e {
                Expr::Number(n) => Ok(*n),
                _ => unreachable!(),
            }
        };
        assert!(flatten_init(&[3], &item, &mut eval).is_err());
    }
}
