// src/lexer/extract.rs
// Call extraction: balanced-parenthesis scan from a call site to the `;` that
// ends the statement, splitting top-level arguments on the way.

use std::ops::Range;

use super::state::is_space;
use crate::error::{PrintfError, Result, snippet};

/// One extracted `name(args...);` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// From the first byte of the call name through the terminating `;`.
    pub span: Range<usize>,
    /// Top-level arguments, left to right. Whitespace outside string literals
    /// is stripped, except that one space is kept where dropping it would
    /// join two tokens (`a - -b`, `x + +y`). The first one is the format
    /// string literal.
    pub args: Vec<String>,
}

impl Call {
    pub fn format_arg(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    pub fn value_args(&self) -> &[String] {
        self.args.get(1..).unwrap_or(&[])
    }
}

fn malformed(src: &str, start: usize, reason: &'static str) -> PrintfError {
    PrintfError::MalformedCall {
        offset: start,
        reason,
        call: snippet(src, start, src.len()),
    }
}

fn is_operator(b: u8) -> bool {
    b"+-*/%<>=!&|^~.".contains(&b)
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Pushes a code byte, restoring one pending space if the bytes on either
/// side of it would otherwise lex as a single token.
fn push_code(cur: &mut Vec<u8>, pending_space: &mut bool, b: u8) {
    if std::mem::take(pending_space) {
        if let Some(&last) = cur.last() {
            if (is_operator(last) && is_operator(b)) || (is_word(last) && is_word(b)) {
                cur.push(b' ');
            }
        }
    }
    cur.push(b);
}

fn finish_arg(
    src: &str,
    start: usize,
    args: &mut Vec<String>,
    cur: &mut Vec<u8>,
) -> Result<()> {
    if cur.is_empty() {
        return Err(malformed(src, start, "empty argument"));
    }
    let bytes = std::mem::take(cur);
    args.push(match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    });
    Ok(())
}

/// Extracts the call starting at `start` (the first byte of its name).
///
/// Fails with `MalformedCall` when the source ends inside a string literal,
/// before the parentheses balance, or before the terminating `;`, and when
/// anything other than whitespace sits between the closing `)` and the `;`
/// (which is how a stray unmatched `)` inside an argument shows up).
pub fn extract_call(source: &str, start: usize) -> Result<Call> {
    let src = source.as_bytes();
    let mut i = start;

    while i < src.len() && (src[i].is_ascii_alphanumeric() || src[i] == b'_') {
        i += 1;
    }
    while i < src.len() && is_space(src[i]) {
        i += 1;
    }
    if src.get(i) != Some(&b'(') {
        return Err(malformed(source, start, "expected `(` after call name"));
    }
    i += 1;

    let mut depth = 1usize;
    let mut in_string = false;
    let mut args = Vec::new();
    let mut cur: Vec<u8> = Vec::new();
    let mut saw_comma = false;
    let mut pending_space = false;

    loop {
        let Some(&b) = src.get(i) else {
            return Err(malformed(
                source,
                start,
                if in_string {
                    "unterminated string literal"
                } else {
                    "unbalanced parentheses"
                },
            ));
        };

        if in_string {
            cur.push(b);
            match b {
                b'\\' => {
                    let Some(&esc) = src.get(i + 1) else {
                        return Err(malformed(source, start, "unterminated string literal"));
                    };
                    cur.push(esc);
                    i += 2;
                    continue;
                }
                b'"' => in_string = false,
                _ => {}
            }
            i += 1;
            continue;
        }

        match b {
            b'"' => {
                in_string = true;
                push_code(&mut cur, &mut pending_space, b);
            }
            b'(' => {
                depth += 1;
                push_code(&mut cur, &mut pending_space, b);
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    if saw_comma || !cur.is_empty() {
                        finish_arg(source, start, &mut args, &mut cur)?;
                    }
                    i += 1;
                    break;
                }
                push_code(&mut cur, &mut pending_space, b);
            }
            b',' if depth == 1 => {
                saw_comma = true;
                pending_space = false;
                finish_arg(source, start, &mut args, &mut cur)?;
            }
            b if is_space(b) => pending_space = true,
            _ => push_code(&mut cur, &mut pending_space, b),
        }
        i += 1;
    }

    while i < src.len() && is_space(src[i]) {
        i += 1;
    }
    match src.get(i) {
        Some(b';') => Ok(Call {
            span: start..i + 1,
            args,
        }),
        Some(_) => Err(malformed(
            source,
            start,
            "unexpected text between the closing `)` and `;`",
        )),
        None => Err(malformed(source, start, "missing `;` after call")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(err: PrintfError) -> &'static str {
        match err {
            PrintfError::MalformedCall { reason, .. } => reason,
            other => panic!("expected MalformedCall, got {other:?}"),
        }
    }

    #[test]
    fn nested_commas_do_not_split() {
        let src = r#"printf("%d", f(a, g(b,c)));"#;
        let call = extract_call(src, 0).unwrap();
        assert_eq!(call.args, vec![r#""%d""#.to_string(), "f(a,g(b,c))".to_string()]);
        assert_eq!(call.span, 0..src.len());
    }

    #[test]
    fn whitespace_inside_strings_is_kept() {
        let src = "printf ( \"a , b\" ,  x + 1 ,\n\ty ) ;";
        let call = extract_call(src, 0).unwrap();
        assert_eq!(call.format_arg(), Some("\"a , b\""));
        assert_eq!(call.value_args(), ["x+1".to_string(), "y".to_string()]);
        assert_eq!(call.span.end, src.len());
    }

    #[test]
    fn spaces_that_separate_tokens_are_kept() {
        let src = "printf(\"%d %d %d\", a - -b, x + +y, float (i) * 2.0);";
        let call = extract_call(src, 0).unwrap();
        assert_eq!(
            call.value_args(),
            ["a- -b".to_string(), "x+ +y".to_string(), "float(i)*2.0".to_string()]
        );
    }

    #[test]
    fn escaped_quotes_and_parens_in_strings() {
        let src = r#"printf("(\")", v); rest"#;
        let call = extract_call(src, 0).unwrap();
        assert_eq!(call.args, vec![r#""(\")""#.to_string(), "v".to_string()]);
        assert_eq!(&src[call.span.clone()], r#"printf("(\")", v);"#);
    }

    #[test]
    fn span_starts_at_given_offset() {
        let src = "  x; printf(\"a\");";
        let call = extract_call(src, 5).unwrap();
        assert_eq!(call.span, 5..src.len());
    }

    #[test]
    fn no_arguments() {
        let call = extract_call("printf();", 0).unwrap();
        assert!(call.args.is_empty());
    }

    #[test]
    fn unterminated_string() {
        assert_eq!(reason(extract_call(r#"printf("abc);"#, 0).unwrap_err()), "unterminated string literal");
        assert_eq!(reason(extract_call(r#"printf("abc\"#, 0).unwrap_err()), "unterminated string literal");
    }

    #[test]
    fn unbalanced_parentheses() {
        assert_eq!(reason(extract_call(r#"printf("%d", f(x);"#, 0).unwrap_err()), "unbalanced parentheses");
    }

    #[test]
    fn missing_semicolon() {
        assert_eq!(reason(extract_call(r#"printf("a")  "#, 0).unwrap_err()), "missing `;` after call");
    }

    #[test]
    fn stray_closing_paren_is_an_error() {
        let err = extract_call(r#"printf("%d", a)) ;"#, 0).unwrap_err();
        assert_eq!(reason(err), "unexpected text between the closing `)` and `;`");
    }

    #[test]
    fn empty_argument() {
        assert_eq!(reason(extract_call(r#"printf("%d", );"#, 0).unwrap_err()), "empty argument");
        assert_eq!(reason(extract_call(r#"printf("%d",,x);"#, 0).unwrap_err()), "empty argument");
    }

    #[test]
    fn missing_open_paren() {
        assert_eq!(reason(extract_call("printf x;", 0).unwrap_err()), "expected `(` after call name");
    }
}
