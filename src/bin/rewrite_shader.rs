// src/bin/rewrite_shader.rs
// Rewrite GLSL sources for printf and print (or save) the result.
//
//   rewrite_shader a.comp [b.glsl ...]    sources are concatenated in order
//   REWRITE_OUT=path                      write to a file instead of stdout
//   SHADERPRINTF_CONFIG / SHADERPRINTF_FUNCTION as for the library

use std::{env, fs, time::Instant};

use anyhow::{Context, Result, bail};
use shaderprintf::{PrintfConfig, rewrite_sources};

fn main() -> Result<()> {
    env_logger::init();

    let paths: Vec<String> = env::args().skip(1).collect();
    if paths.is_empty() {
        bail!("usage: rewrite_shader <source>...");
    }
    let texts = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("read {p}")))
        .collect::<Result<Vec<_>>>()?;
    let sources: Vec<&str> = texts.iter().map(String::as_str).collect();

    let config = PrintfConfig::from_env()?;
    let t0 = Instant::now();
    let out = rewrite_sources(&sources, &config)
        .with_context(|| format!("rewriting {}", paths.join(", ")))?;
    log::info!(
        "rewrote {} file(s), {} -> {} bytes in {:.3} ms",
        paths.len(),
        sources.iter().map(|s| s.len()).sum::<usize>(),
        out.len(),
        t0.elapsed().as_secs_f64() * 1e3
    );

    match env::var("REWRITE_OUT") {
        Ok(path) if !path.is_empty() => {
            fs::write(&path, &out).with_context(|| format!("write {path}"))?;
            eprintln!("[rewrite] wrote {path}");
        }
        _ => print!("{out}"),
    }
    Ok(())
}
