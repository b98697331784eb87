// src/lexer/scrub.rs
use super::state::{Class, Lexer};

/// Removes `//` and `/* */` comments, leaving string literals untouched.
///
/// Newlines inside block comments are kept so every surviving byte stays on
/// its original line. The output is never longer than the input and bytes are
/// never reordered.
pub fn strip_comments(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    for piece in Lexer::new(bytes) {
        let run = &bytes[piece.start..piece.start + piece.len];
        match piece.class {
            Class::Code | Class::Literal => out.extend_from_slice(run),
            Class::Comment => out.extend(run.iter().copied().filter(|&b| b == b'\n')),
        }
    }
    // Comment delimiters are ASCII, so multi-byte characters are kept or
    // dropped whole; the lossy path is unreachable for `&str` input.
    match String::from_utf8(out) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_line_and_block_comments() {
        let src = "a = 1; // one\nb = 2; /* two */ c = 3;";
        assert_eq!(strip_comments(src), "a = 1; \nb = 2;  c = 3;");
    }

    #[test]
    fn keeps_line_structure_across_block_comments() {
        let src = "x /* a\nb\nc */ y\nz";
        let out = strip_comments(src);
        assert_eq!(out, "x \n\n y\nz");
        assert_eq!(out.lines().count(), src.lines().count());
    }

    #[test]
    fn comment_markers_in_strings_survive() {
        let src = r#"printf("// not /* a comment */", 1); // gone"#;
        assert_eq!(strip_comments(src), r#"printf("// not /* a comment */", 1); "#);
    }

    #[test]
    fn escaped_quote_keeps_string_open() {
        let src = r#"printf("say \"// hi\"");// gone"#;
        assert_eq!(strip_comments(src), r#"printf("say \"// hi\"");"#);
    }

    #[test]
    fn never_grows_and_keeps_unicode() {
        let src = "é /* ü */ ß // ñ";
        let out = strip_comments(src);
        assert_eq!(out, "é  ß ");
        assert!(out.len() <= src.len());
    }
}
