// src/codegen.rs
//! GLSL emitted in place of each call site, and the shared declarations the
//! rewriter inserts once per shader.

use crate::{
    config::PrintfConfig,
    format::{EmitOp, Family, Field, FormatProgram},
};

const COMPONENTS: [char; 4] = ['x', 'y', 'z', 'w'];

/// Replacement block for one call.
///
/// `args` are the call's value arguments (format string excluded), indexed by
/// [`Field::argument`]. The record is reserved with one `atomicAdd` of the
/// program's write size on word 0 and written only if it fits entirely, so a
/// full buffer drops records instead of truncating them. The fit test never
/// adds to the cursor, so it stays correct after the counter wraps.
pub fn generate_block(program: &FormatProgram, args: &[String], config: &PrintfConfig) -> String {
    let buf = &config.buffer_identifier;
    let cur = &config.cursor_identifier;
    let n = program.write_size();

    let len = format!("uint({buf}.length())");
    let mut out = String::with_capacity(96 + n * (buf.len() + cur.len() + 12));
    out.push_str(&format!(
        "if({flag}){{uint {cur}=atomicAdd({buf}[0],{n}u);if({cur}<={len}&&{len}-{cur}>={n}u){{",
        flag = config.enable_flag_name,
    ));
    for op in &program.ops {
        let value = match op {
            EmitOp::Literal(c) => format!("{c}u"),
            EmitOp::Field(field) => field_value(field, args),
        };
        out.push_str(&format!("{buf}[{cur}++]={value};"));
    }
    out.push_str("}}");
    out
}

fn field_value(field: &Field, args: &[String]) -> String {
    let arg = &args[field.argument];
    let expr = match field.component {
        Some(c) => format!("({arg}).{}", COMPONENTS[c as usize]),
        None => arg.clone(),
    };
    match field.family() {
        Family::Float => format!("floatBitsToUint({expr})"),
        Family::Integer => format!("uint({expr})"),
    }
}

/// Storage block, enable flag and the two toggle functions, on one line.
pub fn declarations(config: &PrintfConfig) -> String {
    let flag = &config.enable_flag_name;
    format!(
        "{layout}buffer {block}{{uint {buf}[];}};bool {flag}={on};void {enable}(){{{flag}=true;}}void {disable}(){{{flag}=false;}}",
        layout = config.layout_qualifier(),
        block = config.block_name,
        buf = config.buffer_identifier,
        on = config.enabled_by_default,
        enable = config.enable_fn_name,
        disable = config.disable_fn_name,
    )
}
