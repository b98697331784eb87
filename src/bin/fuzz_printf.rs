// src/bin/fuzz_printf.rs
// Generate random shaders full of print calls, rewrite them, run every call on
// the CPU print buffer from many threads, decode, and compare with the
// expected text.
//
//   FUZZ_SEED=u64      (default 42)
//   FUZZ_ITERS=n       shaders to try (default 100)
//   FUZZ_CALLS=n       calls per shader (default 16)
//   FUZZ_THREADS=n     invocations per call (default 64)
//   FUZZ_SAVE=1        save failing cases under FUZZ_DIR (default "fuzz-cases")
//   FUZZ_INPUT=path    replay a saved case

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result, bail};
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use shaderprintf::{
    PrintfConfig,
    cpu::HostPrintBuffer,
    dev::generator::{PrintCase, gen_shader},
    format::compile_call,
    lexer::{CallSites, extract_call, strip_comments},
    rewrite::add_printf_to_source,
};

#[derive(Serialize, Deserialize)]
struct SavedCase {
    unix_ts: u64,
    seed: Option<u64>,
    iter: Option<usize>,
    shader: String,
    cases: Vec<PrintCase>,
    note: String,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Checks one shader. Returns a description of the first mismatch.
fn run_once(shader: &str, cases: &[PrintCase], threads: usize) -> Result<Option<String>> {
    let config = PrintfConfig::default();
    let rewritten = add_printf_to_source(shader, &config)?;
    let blocks = rewritten.matches("atomicAdd(").count();
    if blocks != cases.len() {
        return Ok(Some(format!(
            "rewrite produced {blocks} blocks for {} calls",
            cases.len()
        )));
    }

    let src = strip_comments(shader);
    let sites: Vec<usize> = CallSites::new(&src, &config.function_name).collect();
    if sites.len() != cases.len() {
        return Ok(Some(format!("found {} call sites for {} calls", sites.len(), cases.len())));
    }

    for (i, (site, case)) in sites.into_iter().zip(cases).enumerate() {
        let call = extract_call(&src, site)?;
        let program = compile_call(&src, &call)?;
        let buf = HostPrintBuffer::new(1 + program.write_size() * threads);
        let invocations = vec![case.values.clone(); threads];
        let written = buf.dispatch(&program, &invocations)?;
        let report = buf.read_report();
        let want = case.expected.repeat(threads);
        if written != threads || report.text != want {
            return Ok(Some(format!(
                "call #{i} `{}`\n  want {:?}\n  got  {:?}",
                case.call, case.expected, report.text
            )));
        }
    }
    Ok(None)
}

fn save_case(dir: &str, seed: Option<u64>, iter: Option<usize>, shader: &str, cases: &[PrintCase]) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create {dir}"))?;
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let path = Path::new(dir).join(format!(
        "case_s{}_i{}.json",
        seed.unwrap_or(0),
        iter.unwrap_or(0)
    ));
    let saved = SavedCase {
        unix_ts: ts,
        seed,
        iter,
        shader: shader.to_string(),
        cases: cases.to_vec(),
        note: "Replay with: FUZZ_INPUT=<this file> cargo run --bin fuzz_printf".into(),
    };
    fs::write(&path, serde_json::to_string_pretty(&saved)?)?;
    Ok(path)
}

fn main() -> Result<()> {
    env_logger::init();
    let threads: usize = env_or("FUZZ_THREADS", 64);

    if let Ok(path) = env::var("FUZZ_INPUT") {
        eprintln!("[replay] reading {path}");
        let text = fs::read_to_string(&path).with_context(|| format!("read {path}"))?;
        let saved: SavedCase = serde_json::from_str(&text)?;
        return match run_once(&saved.shader, &saved.cases, threads)? {
            None => {
                eprintln!("[replay] OK");
                Ok(())
            }
            Some(msg) => bail!("[replay] mismatch: {msg}"),
        };
    }

    let seed: u64 = env_or("FUZZ_SEED", 42);
    let iters: usize = env_or("FUZZ_ITERS", 100);
    let calls: usize = env_or("FUZZ_CALLS", 16);
    let save = env::var("FUZZ_SAVE").ok().as_deref() == Some("1");
    let out_dir = env::var("FUZZ_DIR").unwrap_or_else(|_| "fuzz-cases".to_string());

    eprintln!("[fuzz] seed={seed} iters={iters} calls={calls} threads={threads}");
    let mut rng = StdRng::seed_from_u64(seed);
    let t0 = Instant::now();
    for i in 0..iters {
        let (shader, cases) = gen_shader(&mut rng, "printf", calls);
        if let Some(msg) = run_once(&shader, &cases, threads)? {
            eprintln!("[fuzz] iter {i}: MISMATCH\n{msg}");
            if save {
                let path = save_case(&out_dir, Some(seed), Some(i), &shader, &cases)?;
                eprintln!("[save] wrote {}", path.display());
            }
            std::process::exit(1);
        }
    }
    eprintln!(
        "[fuzz] {iters} shaders matched in {:.1} ms",
        t0.elapsed().as_secs_f64() * 1e3
    );
    Ok(())
}
