// src/bin/gpu_demo.rs
// Compile a printf-enabled compute shader with wgpu, dispatch it, and print
// what the invocations wrote.
//
//   gpu_demo [shader.comp]   defaults to a built-in shader
//   GPU_DEMO_GROUPS=n        workgroups to dispatch (default 1)
//   GPU_DEMO_WORDS=n         print buffer size in words (default 16M)
//   SHADERPRINTF_BACKEND=vulkan|dx12|metal|gl

use std::{collections::HashMap, env, fs, time::Instant};

use anyhow::{Context, Result};
use shaderprintf::{
    BindingSlot, PrintfConfig,
    gpu::{DEFAULT_PRINT_BUFFER_WORDS, PrintBuffer, PrintfProgram, device},
};

const DEMO: &str = r#"#version 450
layout(local_size_x = 8) in;
void main() {
    enablePrintf();
    uint id = gl_GlobalInvocationID.x;
    printf("invocation %u says %f\n", id, float(id) * 0.25);
}
"#;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();

    let src = match env::args().nth(1) {
        Some(path) => fs::read_to_string(&path).with_context(|| format!("read {path}"))?,
        None => DEMO.to_string(),
    };
    let groups: u32 = env::var("GPU_DEMO_GROUPS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);
    let words: usize = env::var("GPU_DEMO_WORDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PRINT_BUFFER_WORDS);

    let mut config = PrintfConfig::from_env()?;
    if config.binding.is_none() {
        config.binding = Some(BindingSlot {
            group: 0,
            binding: 0,
        });
    }

    let ctx = device::global();
    let t0 = Instant::now();
    let program = PrintfProgram::new(&ctx.device, "gpu_demo", &[&src], &config)?;
    let print = PrintBuffer::new(&ctx.device, words)?;
    print.reset(&ctx.device, &ctx.queue);
    println!("[gpu_demo] compiled in {:.3} ms", t0.elapsed().as_secs_f64() * 1e3);

    let resources: HashMap<_, _> = [program.print_resource(&print)?].into_iter().collect();
    let mut enc = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("gpu_demo"),
        });
    program.record_dispatch(&ctx.device, &mut enc, &resources, [groups, 1, 1])?;
    ctx.queue.submit(Some(enc.finish()));

    let report = print.read_report(&ctx.device, &ctx.queue).await?;
    println!(
        "[gpu_demo] {} of {} claimed words decoded{}",
        report.decoded_words,
        report.claimed_words,
        if report.overflowed { " (overflowed)" } else { "" }
    );
    print!("{report}");
    drop(resources);
    print.destroy();
    Ok(())
}
