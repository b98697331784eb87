// src/format/render.rs
// C printf rendering of single 32-bit words for the decoder.

use super::directive::{Conversion, Family, FormatDirective};

/// Largest field width or precision a directive may ask for.
pub const MAX_FIELD: usize = 1024;

/// Flags, width and precision parsed out of a directive's flag string.
/// Length modifiers (`l`, `h`, ...) are accepted and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Spec {
    pub left: bool,
    pub plus: bool,
    pub space: bool,
    pub alt: bool,
    pub zero: bool,
    pub width: usize,
    pub precision: Option<usize>,
}

impl Spec {
    pub fn parse(flags: &str) -> Self {
        let mut spec = Spec::default();
        let b = flags.as_bytes();
        let mut i = 0;
        while let Some(&c) = b.get(i) {
            match c {
                b'-' => spec.left = true,
                b'+' => spec.plus = true,
                b' ' => spec.space = true,
                b'#' => spec.alt = true,
                b'0' => spec.zero = true,
                _ => break,
            }
            i += 1;
        }
        while let Some(&c) = b.get(i).filter(|c| c.is_ascii_digit()) {
            spec.width = spec.width.saturating_mul(10).saturating_add((c - b'0') as usize);
            i += 1;
        }
        if b.get(i) == Some(&b'.') {
            i += 1;
            let mut p = 0usize;
            while let Some(&c) = b.get(i).filter(|c| c.is_ascii_digit()) {
                p = p.saturating_mul(10).saturating_add((c - b'0') as usize);
                i += 1;
            }
            spec.precision = Some(p);
        }
        spec
    }

    pub fn within_limits(&self) -> bool {
        self.width <= MAX_FIELD && self.precision.is_none_or(|p| p <= MAX_FIELD)
    }

    fn clamped(mut self) -> Self {
        self.width = self.width.min(MAX_FIELD);
        self.precision = self.precision.map(|p| p.min(MAX_FIELD));
        self
    }
}

/// Renders one data word the way C `printf` renders the directive.
/// Float-family words are reinterpreted as `f32`; `d`/`i` read the word as a
/// signed 32-bit value, `u`/`o`/`x`/`X` as unsigned. `u` therefore prints
/// `4294967295` for a word holding `-1`, where a signed reading would print
/// `-1`. Width and precision are capped at [`MAX_FIELD`].
pub fn render_word(directive: &FormatDirective, word: u32) -> String {
    let spec = Spec::parse(&directive.flags).clamped();
    let conv = directive.conversion;
    match conv.family() {
        Family::Float => render_float(spec, conv, f32::from_bits(word) as f64),
        Family::Integer => render_int(spec, conv, word),
    }
}

fn sign_of(negative: bool, spec: Spec) -> &'static str {
    if negative {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    }
}

/// Pads `sign + prefix + body` to the field width.
fn pad(spec: Spec, sign: &str, prefix: &str, body: &str, zero_ok: bool) -> String {
    let len = sign.len() + prefix.len() + body.chars().count();
    let fill = spec.width.saturating_sub(len);
    let mut out = String::with_capacity(len + fill);
    if spec.left {
        out.push_str(sign);
        out.push_str(prefix);
        out.push_str(body);
        out.extend(std::iter::repeat_n(' ', fill));
    } else if spec.zero && zero_ok {
        out.push_str(sign);
        out.push_str(prefix);
        out.extend(std::iter::repeat_n('0', fill));
        out.push_str(body);
    } else {
        out.extend(std::iter::repeat_n(' ', fill));
        out.push_str(sign);
        out.push_str(prefix);
        out.push_str(body);
    }
    out
}

fn render_int(spec: Spec, conv: Conversion, word: u32) -> String {
    let (negative, magnitude) = match conv {
        Conversion::Decimal | Conversion::Integer => {
            let v = word as i32;
            (v < 0, v.unsigned_abs())
        }
        _ => (false, word),
    };
    let mut digits = match conv {
        Conversion::Octal => format!("{magnitude:o}"),
        Conversion::Hex => format!("{magnitude:x}"),
        Conversion::HexUpper => format!("{magnitude:X}"),
        _ => magnitude.to_string(),
    };
    if let Some(p) = spec.precision {
        if p == 0 && magnitude == 0 {
            digits.clear();
        } else if digits.len() < p {
            digits.insert_str(0, &"0".repeat(p - digits.len()));
        }
    }
    let prefix = match conv {
        Conversion::Octal if spec.alt && !digits.starts_with('0') => {
            digits.insert(0, '0');
            ""
        }
        Conversion::Hex if spec.alt && magnitude != 0 => "0x",
        Conversion::HexUpper if spec.alt && magnitude != 0 => "0X",
        _ => "",
    };
    let sign = match conv {
        Conversion::Decimal | Conversion::Integer => sign_of(negative, spec),
        _ => "",
    };
    pad(spec, sign, prefix, &digits, spec.precision.is_none())
}

fn render_float(spec: Spec, conv: Conversion, v: f64) -> String {
    let upper = conv.is_upper();
    let sign = sign_of(v.is_sign_negative(), spec);
    let a = v.abs();

    if !a.is_finite() {
        let body = match (a.is_nan(), upper) {
            (true, false) => "nan",
            (true, true) => "NAN",
            (false, false) => "inf",
            (false, true) => "INF",
        };
        return pad(spec, sign, "", body, false);
    }

    let (prefix, body) = match conv {
        Conversion::Fixed | Conversion::FixedUpper => {
            ("", fixed(a, spec.precision.unwrap_or(6), spec.alt))
        }
        Conversion::Exp | Conversion::ExpUpper => {
            ("", exp(a, spec.precision.unwrap_or(6), spec.alt, upper))
        }
        Conversion::General | Conversion::GeneralUpper => {
            ("", general(a, spec.precision.unwrap_or(6), spec.alt, upper))
        }
        _ => (
            if upper { "0X" } else { "0x" },
            hex_float(a, spec.precision, spec.alt, upper),
        ),
    };
    pad(spec, sign, prefix, &body, true)
}

fn fixed(a: f64, p: usize, alt: bool) -> String {
    let mut s = format!("{a:.p$}");
    if alt && p == 0 {
        s.push('.');
    }
    s
}

/// Splits Rust's `1.5e3` form into mantissa and exponent.
fn rust_exp(a: f64, p: usize) -> (String, i32) {
    let s = format!("{a:.p$e}");
    match s.split_once('e') {
        Some((m, e)) => (m.to_string(), e.parse().unwrap_or(0)),
        None => (s, 0),
    }
}

fn c_exp_suffix(e: i32, upper: bool) -> String {
    let sign = if e < 0 { '-' } else { '+' };
    format!("{}{sign}{:02}", if upper { 'E' } else { 'e' }, e.unsigned_abs())
}

fn exp(a: f64, p: usize, alt: bool, upper: bool) -> String {
    let (mut m, e) = rust_exp(a, p);
    if alt && p == 0 {
        m.push('.');
    }
    m + &c_exp_suffix(e, upper)
}

fn strip_trailing_zeros(s: &mut String) {
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
}

fn general(a: f64, p: usize, alt: bool, upper: bool) -> String {
    let p = p.max(1);
    let x = if a == 0.0 { 0 } else { rust_exp(a, p - 1).1 };
    if x >= -4 && (x as i64) < p as i64 {
        let mut s = fixed(a, (p as i64 - 1 - x as i64) as usize, alt);
        if !alt {
            strip_trailing_zeros(&mut s);
        }
        s
    } else {
        let (mut m, e) = rust_exp(a, p - 1);
        if alt {
            if !m.contains('.') {
                m.push('.');
            }
        } else {
            strip_trailing_zeros(&mut m);
        }
        m + &c_exp_suffix(e, upper)
    }
}

/// `%a` body without the `0x` prefix, e.g. `1.8p+1` for 3.0.
fn hex_float(a: f64, precision: Option<usize>, alt: bool, upper: bool) -> String {
    const FRAC_BITS: u32 = 52;
    const FRAC_DIGITS: usize = 13;

    let bits = a.to_bits();
    let biased = ((bits >> FRAC_BITS) & 0x7ff) as i32;
    let mut frac = bits & ((1u64 << FRAC_BITS) - 1);
    let (mut lead, exp) = match (biased, frac) {
        (0, 0) => (0u64, 0),
        (0, _) => (0u64, -1022),
        _ => (1u64, biased - 1023),
    };

    let digits = match precision {
        Some(p) if p < FRAC_DIGITS => {
            let shift = (FRAC_DIGITS - p) as u32 * 4;
            let rem = frac & ((1u64 << shift) - 1);
            let half = 1u64 << (shift - 1);
            let mut keep = frac >> shift;
            let odd = if p == 0 { lead & 1 == 1 } else { keep & 1 == 1 };
            if rem > half || (rem == half && odd) {
                keep += 1;
                if p == 0 || keep >> (p * 4) != 0 {
                    lead += 1;
                    keep = 0;
                }
            }
            frac = keep;
            p
        }
        Some(p) => p,
        None => {
            let mut d = FRAC_DIGITS;
            while d > 0 && frac & 0xf == 0 {
                frac >>= 4;
                d -= 1;
            }
            d
        }
    };

    let mut hex = if digits == 0 {
        String::new()
    } else if digits <= FRAC_DIGITS {
        format!("{:0w$x}", frac, w = digits)
    } else {
        format!("{:0w$x}", frac, w = FRAC_DIGITS) + &"0".repeat(digits - FRAC_DIGITS)
    };
    if upper {
        hex.make_ascii_uppercase();
    }

    let mut out = lead.to_string();
    if !hex.is_empty() || alt {
        out.push('.');
    }
    out.push_str(&hex);
    out.push(if upper { 'P' } else { 'p' });
    out.push(if exp < 0 { '-' } else { '+' });
    out.push_str(&exp.unsigned_abs().to_string());
    out
}
