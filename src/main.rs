// src/main.rs
use anyhow::Result;
use shaderprintf::{
    PrintfConfig,
    cpu::{HostPrintBuffer, Value},
    format::compile_call,
    lexer::{CallSites, extract_call, strip_comments},
    rewrite::add_printf_to_source,
};

fn main() -> Result<()> {
    env_logger::init();

    let src = r#"#version 450
layout(local_size_x = 4) in;
void main() {
    uint id = gl_GlobalInvocationID.x;
    // printf("never printed\n");
    printf("id %u: pos = %^2f\n", id, vec2(id, 0.5));
}
"#;
    let config = PrintfConfig::from_env()?;
    let rewritten = add_printf_to_source(src, &config)?;
    println!("REWRITTEN:\n{rewritten}");

    // Run the call on the CPU for four invocations and decode the result.
    let scrubbed = strip_comments(src);
    let buffer = HostPrintBuffer::new(256);
    for site in CallSites::new(&scrubbed, &config.function_name) {
        let call = extract_call(&scrubbed, site)?;
        let program = compile_call(&scrubbed, &call)?;
        let invocations: Vec<Vec<Value>> = (0..4u32)
            .map(|id| {
                vec![
                    Value::Uint(id),
                    Value::Vector(vec![Value::Float(id as f32), Value::Float(0.5)]),
                ]
            })
            .collect();
        buffer.dispatch(&program, &invocations)?;
    }
    print!("OUTPUT:\n{}", buffer.read_report());
    Ok(())
}
