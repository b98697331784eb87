// src/rewrite.rs
//! Whole-source rewrite: scrub comments, replace every call site with its
//! generated block, insert the shared declarations after `#version`.
//!
//! All changes are collected as [`Edit`]s against the scrubbed text and
//! applied in one pass at the end, so no offset ever shifts mid-scan.

use std::ops::Range;

use log::{debug, warn};

use crate::{
    codegen::{declarations, generate_block},
    config::PrintfConfig,
    error::Result,
    format::compile_call,
    lexer::{CallSites, extract_call, strip_comments},
};

/// Replace `span` of the base text with `text`. An empty span is an insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub span: Range<usize>,
    pub text: String,
}

/// Applies non-overlapping edits to `base` in order of their start offset.
/// Insertions at the same offset keep the order they were given in.
pub fn apply_edits(base: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| e.span.start);
    let grow: usize = edits.iter().map(|e| e.text.len()).sum();
    let mut out = String::with_capacity(base.len() + grow);
    let mut pos = 0;
    for edit in edits {
        if edit.span.start < pos || edit.span.end > base.len() {
            warn!("dropping overlapping edit at {:?}", edit.span);
            continue;
        }
        out.push_str(&base[pos..edit.span.start]);
        out.push_str(&edit.text);
        pos = edit.span.end;
    }
    out.push_str(&base[pos..]);
    out
}

/// Where the declarations go and the line number to restore after them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchor {
    /// Byte offset of the newline that ends the `#version` line, or 0.
    at: usize,
    /// Line number the next original line must report.
    next_line: usize,
    after_version: bool,
}

fn version_anchor(src: &str) -> Anchor {
    let Some(v) = src.find("#version") else {
        return Anchor {
            at: 0,
            next_line: 1,
            after_version: false,
        };
    };
    let line = 1 + src.as_bytes()[..v].iter().filter(|&&b| b == b'\n').count();
    let at = src[v..].find('\n').map_or(src.len(), |n| v + n);
    Anchor {
        at,
        next_line: line + 1,
        after_version: true,
    }
}

/// Rewrites shader sources for one configuration.
pub struct Rewriter<'c> {
    config: &'c PrintfConfig,
}

impl<'c> Rewriter<'c> {
    pub fn new(config: &'c PrintfConfig) -> Self {
        Self { config }
    }

    /// Edits that turn the scrubbed `src` into the rewritten shader.
    pub fn plan(&self, src: &str) -> Result<Vec<Edit>> {
        let anchor = version_anchor(src);
        let decls = declarations(self.config);
        let header = if anchor.after_version {
            format!("\n{decls}\n#line {}", anchor.next_line)
        } else {
            format!("{decls}\n#line {}\n", anchor.next_line)
        };
        let mut edits = vec![Edit {
            span: anchor.at..anchor.at,
            text: header,
        }];

        let mut cursor = 0;
        for site in CallSites::new(src, &self.config.function_name) {
            if site < cursor {
                continue;
            }
            let call = extract_call(src, site)?;
            let program = compile_call(src, &call)?;
            let mut text = generate_block(&program, call.value_args(), self.config);
            let newlines = src[call.span.clone()].bytes().filter(|&b| b == b'\n').count();
            text.extend(std::iter::repeat_n('\n', newlines));
            debug!(
                "rewrote `{}` call at {}: {} words",
                self.config.function_name,
                call.span.start,
                program.write_size()
            );
            cursor = call.span.end;
            edits.push(Edit {
                span: call.span,
                text,
            });
        }
        Ok(edits)
    }

    pub fn rewrite(&self, source: &str) -> Result<String> {
        let src = strip_comments(source);
        let edits = self.plan(&src)?;
        debug!("{} call site(s) rewritten", edits.len() - 1);
        Ok(apply_edits(&src, edits))
    }
}

/// Comment-free copy of `source` with every call of
/// `config.function_name` replaced by buffer writes and the print buffer
/// declarations inserted after `#version` (or at the top), followed by a
/// `#line` directive so compiler diagnostics keep their original line numbers.
pub fn add_printf_to_source(source: &str, config: &PrintfConfig) -> Result<String> {
    Rewriter::new(config).rewrite(source)
}

/// Concatenates `sources` in order and rewrites the result as one shader.
pub fn rewrite_sources(sources: &[&str], config: &PrintfConfig) -> Result<String> {
    add_printf_to_source(&sources.concat(), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{codegen::declarations, error::PrintfError};

    fn cfg() -> PrintfConfig {
        PrintfConfig::default()
    }

    #[test]
    fn edits_apply_in_offset_order() {
        let out = apply_edits(
            "abcdef",
            vec![
                Edit {
                    span: 4..5,
                    text: "E".into(),
                },
                Edit {
                    span: 0..0,
                    text: ">".into(),
                },
                Edit {
                    span: 1..3,
                    text: "".into(),
                },
            ],
        );
        assert_eq!(out, ">adEf");
    }

    #[test]
    fn overlapping_edit_is_dropped() {
        let out = apply_edits(
            "abcdef",
            vec![
                Edit {
                    span: 0..4,
                    text: "X".into(),
                },
                Edit {
                    span: 2..3,
                    text: "Y".into(),
                },
            ],
        );
        assert_eq!(out, "Xef");
    }

    #[test]
    fn declarations_follow_version_line() {
        let src = "#version 450\nvoid main(){}\n";
        let out = add_printf_to_source(src, &cfg()).unwrap();
        let want = format!("#version 450\n{}\n#line 2\nvoid main(){{}}\n", declarations(&cfg()));
        assert_eq!(out, want);
    }

    #[test]
    fn version_on_a_later_line() {
        let src = "\n\n#version 430 core\nvoid main(){}";
        let out = add_printf_to_source(src, &cfg()).unwrap();
        assert!(out.starts_with("\n\n#version 430 core\nlayout(std430) buffer printBuffer"));
        assert!(out.contains("\n#line 4\nvoid main(){}"));
    }

    #[test]
    fn no_version_inserts_at_top() {
        let out = add_printf_to_source("void main(){}", &cfg()).unwrap();
        assert_eq!(out, format!("{}\n#line 1\nvoid main(){{}}", declarations(&cfg())));
    }

    #[test]
    fn calls_are_replaced_and_lines_kept() {
        let src = "#version 450\nvoid main(){\n  printf(\"%d\",\n    i);\n  x = 1;\n}\n";
        let out = add_printf_to_source(src, &cfg()).unwrap();
        assert!(!out.contains("printf("));
        assert!(out.contains("printData[_printfCursor++]=uint(i);}}\n\n  x = 1;"));
        let body = out.split("#line 2\n").nth(1).unwrap();
        assert_eq!(body.lines().count(), src.lines().count() - 1);
    }

    #[test]
    fn every_call_is_rewritten() {
        let src = "void main(){ printf(\"a\"); if(c){ printf(\"%f\", v); } printf (\"b\"); }";
        let out = add_printf_to_source(src, &cfg()).unwrap();
        assert_eq!(out.matches("if(printfWriter)").count(), 3);
        assert!(out.contains("floatBitsToUint(v)"));
    }

    #[test]
    fn comments_and_strings_are_not_calls() {
        let src = "// printf(\"no\");\n/* printf(\"no\"); */\nvoid main(){ printf(\"yes\"); }";
        let out = add_printf_to_source(src, &cfg()).unwrap();
        assert_eq!(out.matches("atomicAdd").count(), 1);
        assert!(out.contains("=121u;"));
        assert!(!out.contains("=110u;"));
    }

    #[test]
    fn first_error_aborts_the_rewrite() {
        let src = "void main(){ printf(\"ok\"); printf(\"%d\"); }";
        let err = add_printf_to_source(src, &cfg()).unwrap_err();
        assert!(matches!(err, PrintfError::ArgumentCountMismatch { .. }));
        assert_eq!(err.offset(), src.find("printf(\"%d").unwrap());
    }

    #[test]
    fn sources_are_concatenated() {
        let out = rewrite_sources(&["#version 450\n", "void main(){ printf(\"x\"); }\n"], &cfg())
            .unwrap();
        assert!(out.starts_with("#version 450\nlayout(std430) buffer printBuffer"));
        assert!(out.contains("=120u;"));
    }

    #[test]
    fn custom_function_name() {
        let config = PrintfConfig {
            function_name: "debugPrint".into(),
            ..cfg()
        };
        let src = "void main(){ debugPrint(\"%u\", n); printf(\"left\"); }";
        let out = add_printf_to_source(src, &config).unwrap();
        assert!(out.contains("uint(n)"));
        assert!(out.contains("printf(\"left\");"));
    }
}
