// src/format/escape.rs
use log::warn;

/// Decodes the body of a string literal (without its quotes) into code units.
///
/// Recognises `\\ \" \? \' \a \b \f \n \r \t \v`. Any other escaped
/// character stands for itself; a trailing lone backslash is kept.
pub fn unescape(body: &str) -> Vec<u32> {
    let mut out = Vec::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c as u32);
            continue;
        }
        let Some(e) = chars.next() else {
            out.push('\\' as u32);
            break;
        };
        let unit = match e {
            '\\' => 0x5C,
            '"' => 0x22,
            '?' => 0x3F,
            '\'' => 0x27,
            'a' => 0x07,
            'b' => 0x08,
            'f' => 0x0C,
            'n' => 0x0A,
            'r' => 0x0D,
            't' => 0x09,
            'v' => 0x0B,
            other => {
                warn!("unknown escape sequence `\\{other}` in format string; using `{other}`");
                other as u32
            }
        };
        out.push(unit);
    }
    out
}
