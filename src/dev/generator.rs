// src/dev/generator.rs
// Random print calls and the text they must decode to. Shared by the fuzz
// binary and the sweep tests.
//
// Expected text is built with Rust's own formatting, restricted to the
// directive shapes where it agrees with C printf (integer width and `-`/`0`
// flags, fixed-point floats on exactly representable values).

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cpu::Value;

/// One generated call: its GLSL statement, the values its arguments hold at
/// runtime, and the decoded text it must produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintCase {
    pub call: String,
    pub values: Vec<Value>,
    pub expected: String,
}

const PLAIN: &[u8] = b"abcdefxyzXYZ =:,.;![]<>#_-+";

struct Builder {
    literal: String,
    expected: String,
    values: Vec<Value>,
}

impl Builder {
    fn text<R: Rng>(&mut self, rng: &mut R) {
        match rng.random_range(0u32..100) {
            0..=69 => {
                let c = PLAIN[rng.random_range(0..PLAIN.len())] as char;
                self.literal.push(c);
                self.expected.push(c);
            }
            70..=79 => {
                self.literal.push_str("\\n");
                self.expected.push('\n');
            }
            80..=84 => {
                self.literal.push_str("\\t");
                self.expected.push('\t');
            }
            85..=89 => {
                self.literal.push_str("\\\"");
                self.expected.push('"');
            }
            90..=94 => {
                self.literal.push_str("\\\\");
                self.expected.push('\\');
            }
            _ => {
                self.literal.push_str("%%");
                self.expected.push('%');
            }
        }
    }

    fn int<R: Rng>(&mut self, rng: &mut R) {
        let width = if rng.random_bool(0.5) {
            rng.random_range(1..=10usize)
        } else {
            0
        };
        let flag = match rng.random_range(0u32..3) {
            0 => "",
            1 => "-",
            _ => "0",
        };
        let letter = ['d', 'i', 'u', 'x', 'X', 'o'][rng.random_range(0..6)];
        let w = if width > 0 { width.to_string() } else { String::new() };
        self.literal.push_str(&format!("%{flag}{w}{letter}"));

        let (value, body) = match letter {
            'd' | 'i' => {
                let v: i32 = small_or_any(rng);
                (Value::Int(v), v.to_string())
            }
            _ => {
                let v: u32 = rng.random();
                let body = match letter {
                    'x' => format!("{v:x}"),
                    'X' => format!("{v:X}"),
                    'o' => format!("{v:o}"),
                    _ => v.to_string(),
                };
                (Value::Uint(v), body)
            }
        };
        self.expected.push_str(&pad_like_c(&body, width, flag));
        self.values.push(value);
    }

    fn float<R: Rng>(&mut self, rng: &mut R) {
        let v = rng.random_range(-8000i32..8000) as f32 / 8.0;
        let prec = [3usize, 4, 6][rng.random_range(0..3)];
        if prec == 6 && rng.random_bool(0.5) {
            self.literal.push_str("%f");
        } else {
            self.literal.push_str(&format!("%.{prec}f"));
        }
        self.expected.push_str(&format!("{:.prec$}", v as f64));
        self.values.push(Value::Float(v));
    }

    fn vector<R: Rng>(&mut self, rng: &mut R) {
        let n = rng.random_range(2..=4usize);
        let parts: Vec<(Value, String)> = if rng.random_bool(0.5) {
            self.literal.push_str(&format!("%^{n}d"));
            (0..n)
                .map(|_| {
                    let v: i32 = small_or_any(rng);
                    (Value::Int(v), v.to_string())
                })
                .collect()
        } else {
            self.literal.push_str(&format!("%^{n}f"));
            (0..n)
                .map(|_| {
                    let v = rng.random_range(-64i32..64) as f32 / 4.0;
                    (Value::Float(v), format!("{:.6}", v as f64))
                })
                .collect()
        };
        let (values, texts): (Vec<_>, Vec<_>) = parts.into_iter().unzip();
        self.expected.push('(');
        self.expected.push_str(&texts.join(", "));
        self.expected.push(')');
        self.values.push(Value::Vector(values));
    }
}

fn small_or_any<R: Rng>(rng: &mut R) -> i32 {
    if rng.random_bool(0.7) {
        rng.random_range(-1000..1000)
    } else {
        rng.random()
    }
}

fn pad_like_c(body: &str, width: usize, flag: &str) -> String {
    match flag {
        "-" => format!("{body:<width$}"),
        "0" => match body.strip_prefix('-') {
            Some(digits) => format!("-{digits:0>w$}", w = width.saturating_sub(1)),
            None => format!("{body:0>width$}"),
        },
        _ => format!("{body:>width$}"),
    }
}

/// A random `name("...", args...);` call with up to `max_pieces` pieces of
/// format text and directives.
pub fn gen_print_case<R: Rng>(rng: &mut R, name: &str, max_pieces: usize) -> PrintCase {
    let mut b = Builder {
        literal: String::new(),
        expected: String::new(),
        values: Vec::new(),
    };
    let pieces = rng.random_range(1..=max_pieces.max(1));
    for _ in 0..pieces {
        match rng.random_range(0u32..100) {
            0..=49 => b.text(rng),
            50..=74 => b.int(rng),
            75..=89 => b.float(rng),
            _ => b.vector(rng),
        }
    }

    let mut call = format!("{name}(\"{}\"", b.literal);
    for i in 0..b.values.len() {
        let sep = [",", ", ", " ,\n\t"][rng.random_range(0..3)];
        call.push_str(&format!("{sep}v{i}"));
    }
    call.push_str(");");

    PrintCase {
        call,
        values: b.values,
        expected: b.expected,
    }
}

/// A compute shader with `calls` print statements mixed with comments that
/// mention the call name and must be left alone.
pub fn gen_shader<R: Rng>(rng: &mut R, name: &str, calls: usize) -> (String, Vec<PrintCase>) {
    let mut src = String::from("#version 450\nlayout(local_size_x = 64) in;\nvoid main() {\n");
    let mut cases = Vec::with_capacity(calls);
    for _ in 0..calls {
        match rng.random_range(0u32..4) {
            0 => src.push_str(&format!("  // {name}(\"ignored %d\", x);\n")),
            1 => src.push_str(&format!("  /* {name}(\"also ignored\");\n  */\n")),
            _ => {}
        }
        let case = gen_print_case(rng, name, 6);
        src.push_str("  ");
        src.push_str(&case.call);
        src.push('\n');
        cases.push(case);
    }
    src.push_str("}\n");
    (src, cases)
}
