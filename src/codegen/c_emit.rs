//! C source emission for a `FlatProgram`.
//!
//! Layout of the generated file:
//! 1. header and runtime include
//! 2. forward declarations of every function
//! 3. the program globals record (one closure per top-level function)
//! 4. function bodies
//! 5. `lz_init`, which builds the global closures
//! 6. `main`, which evaluates the entry and prints it unless it is unit

use std::fmt::Write;

use crate::codegen::flat::{Block, Callee, FlatFunction, FlatProgram, Instr, Var};
use crate::error::CodegenError;

const INDENT: &str = "    ";

pub fn emit_c(program: &FlatProgram) -> Result<String, CodegenError> {
    let mut out = String::new();
    emit_header(program, &mut out)?;
    emit_forward_declarations(program, &mut out)?;
    emit_globals(program, &mut out)?;
    for func in &program.functions {
        emit_function(program, func, &mut out)?;
    }
    emit_init(program, &mut out)?;
    emit_main(program, &mut out)?;
    Ok(out)
}

fn emit_header(program: &FlatProgram, out: &mut String) -> Result<(), CodegenError> {
    writeln!(
        out,
        "/* generated by lazyc from module {} */",
        comment_text(&program.module)
    )?;
    writeln!(out, "#include <stdio.h>")?;
    writeln!(out, "#include \"lazyc_runtime.h\"")?;
    writeln!(out)?;
    Ok(())
}

fn param_list(func: &FlatFunction, named: bool) -> String {
    let params: Vec<String> = func
        .all_params()
        .map(|p| {
            if named {
                format!("lz_val *{}", p)
            } else {
                "lz_val *".to_owned()
            }
        })
        .collect();
    params.join(", ")
}

fn emit_forward_declarations(program: &FlatProgram, out: &mut String) -> Result<(), CodegenError> {
    if program.functions.is_empty() {
        return Ok(());
    }
    for func in &program.functions {
        writeln!(out, "lz_val *{}({});", func.symbol, param_list(func, false))?;
    }
    writeln!(out)?;
    Ok(())
}

fn emit_globals(program: &FlatProgram, out: &mut String) -> Result<(), CodegenError> {
    if program.globals.is_empty() {
        return Ok(());
    }
    writeln!(out, "static struct {{")?;
    for slot in &program.globals {
        writeln!(out, "{}lz_val *{};", INDENT, slot.field)?;
    }
    writeln!(out, "}} lz_program;")?;
    writeln!(out)?;
    Ok(())
}

fn emit_function(
    program: &FlatProgram,
    func: &FlatFunction,
    out: &mut String,
) -> Result<(), CodegenError> {
    writeln!(out, "/* {} */", comment_text(&func.display_name()))?;
    writeln!(out, "lz_val *{}({}) {{", func.symbol, param_list(func, true))?;
    emit_block(program, &func.body, 1, out)?;
    writeln!(out, "{}return {};", INDENT, func.body.result)?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    Ok(())
}

fn emit_init(program: &FlatProgram, out: &mut String) -> Result<(), CodegenError> {
    writeln!(out, "static void lz_init(void) {{")?;
    for slot in &program.globals {
        let func = program.function(slot.function);
        writeln!(
            out,
            "{}lz_program.{} = lz_alloc_closure((lz_code){}, {});",
            INDENT, slot.field, func.symbol, slot.arity
        )?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;
    Ok(())
}

fn emit_main(program: &FlatProgram, out: &mut String) -> Result<(), CodegenError> {
    writeln!(out, "int main(void) {{")?;
    writeln!(out, "{}lz_init();", INDENT)?;
    writeln!(out, "{}/* {} */", INDENT, comment_text(&program.entry_name))?;
    emit_block(program, &program.entry, 1, out)?;
    let result = &program.entry.result;
    writeln!(out, "{}if (!lz_is_unit({})) {{", INDENT, result)?;
    writeln!(out, "{}{}lz_print_val({});", INDENT, INDENT, result)?;
    writeln!(out, "{}{}putchar('\\n');", INDENT, INDENT)?;
    writeln!(out, "{}}}", INDENT)?;
    writeln!(out, "{}return 0;", INDENT)?;
    writeln!(out, "}}")?;
    Ok(())
}

/// Source names may contain `*/`, which would end the comment early.
fn comment_text(text: &str) -> String {
    text.replace("*/", "* /")
}

fn callee_symbol(program: &FlatProgram, callee: &Callee) -> String {
    match callee {
        Callee::Function(id) => program.function(*id).symbol.clone(),
        Callee::Intrinsic(i) => i.runtime_symbol().to_owned(),
    }
}

fn int_literal(value: i64) -> String {
    if value == i64::MIN {
        // The literal 9223372036854775808 does not fit in a signed long long.
        "(-9223372036854775807LL - 1)".to_owned()
    } else {
        format!("{}LL", value)
    }
}

/// Renders a string as a C literal. Non-printable and non-ASCII bytes use
/// three-digit octal escapes.
pub fn c_string_literal(s: &str) -> String {
    let mut lit = String::with_capacity(s.len() + 2);
    lit.push('"');
    for b in s.bytes() {
        match b {
            b'"' => lit.push_str("\\\""),
            b'\\' => lit.push_str("\\\\"),
            b'\n' => lit.push_str("\\n"),
            b'\t' => lit.push_str("\\t"),
            b'\r' => lit.push_str("\\r"),
            // `??x` sequences are trigraphs in older C dialects.
            b'?' => lit.push_str("\\?"),
            0x20..=0x7e => lit.push(b as char),
            _ => lit.push_str(&format!("\\{:03o}", b)),
        }
    }
    lit.push('"');
    lit
}

fn emit_block(
    program: &FlatProgram,
    block: &Block,
    depth: usize,
    out: &mut String,
) -> Result<(), CodegenError> {
    for instr in &block.instrs {
        emit_instr(program, instr, depth, out)?;
    }
    Ok(())
}

fn emit_instr(
    program: &FlatProgram,
    instr: &Instr,
    depth: usize,
    out: &mut String,
) -> Result<(), CodegenError> {
    let pad = INDENT.repeat(depth);
    match instr {
        Instr::AllocInt { dst, value } => {
            writeln!(out, "{}lz_val *{} = lz_alloc_int({});", pad, dst, int_literal(*value))?;
        }
        Instr::AllocStr { dst, value } => {
            writeln!(
                out,
                "{}lz_val *{} = lz_alloc_str({});",
                pad,
                dst,
                c_string_literal(value)
            )?;
        }
        Instr::AllocCon { dst, tag, name } => {
            writeln!(out, "{}lz_val *{} = lz_alloc_con({}); /* {} */", pad, dst, tag, name)?;
        }
        Instr::Copy { dst, src } => {
            writeln!(out, "{}lz_val *{} = {};", pad, dst, src)?;
        }
        Instr::LoadGlobal { dst, slot } => {
            writeln!(
                out,
                "{}lz_val *{} = lz_program.{};",
                pad, dst, program.globals[*slot].field
            )?;
        }
        Instr::AllocClosure { dst, callee, arity } => {
            writeln!(
                out,
                "{}lz_val *{} = lz_alloc_closure((lz_code){}, {});",
                pad,
                dst,
                callee_symbol(program, callee),
                arity
            )?;
        }
        Instr::CallIntrinsic {
            dst,
            intrinsic,
            args,
        } => {
            let args: Vec<String> = args.iter().map(Var::to_string).collect();
            writeln!(
                out,
                "{}lz_val *{} = {}({});",
                pad,
                dst,
                intrinsic.runtime_symbol(),
                args.join(", ")
            )?;
        }
        Instr::Apply { dst, func, arg } => {
            writeln!(out, "{}lz_val *{} = lz_apply({}, {});", pad, dst, func, arg)?;
        }
        Instr::Branch {
            dst,
            cond,
            then_block,
            else_block,
        } => {
            writeln!(out, "{}lz_val *{};", pad, dst)?;
            writeln!(out, "{}if (lz_truthy({})) {{", pad, cond)?;
            emit_block(program, then_block, depth + 1, out)?;
            writeln!(out, "{}{}{} = {};", pad, INDENT, dst, then_block.result)?;
            writeln!(out, "{}}} else {{", pad)?;
            emit_block(program, else_block, depth + 1, out)?;
            writeln!(out, "{}{}{} = {};", pad, INDENT, dst, else_block.result)?;
            writeln!(out, "{}}}", pad)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_literals_are_escaped() {
        assert_eq!(c_string_literal("a\"b\\c\n"), r#""a\"b\\c\n""#);
        assert_eq!(c_string_literal("é"), r#""\303\251""#);
        assert_eq!(c_string_literal("??="), r#""\?\?=""#);
    }

    #[test]
    fn minimum_integer_is_spelled_safely() {
        assert_eq!(int_literal(i64::MIN), "(-9223372036854775807LL - 1)");
        assert_eq!(int_literal(-3), "-3LL");
    }
}
