// src/format/compile.rs
//! Format compiler: lowers a format literal to the flat list of buffer writes
//! one call site performs at runtime.

use log::debug;

use super::{
    directive::{Family, FormatDirective},
    escape::unescape,
    grammar::{Grammar, GrammarError, Piece},
};
use crate::{
    error::{PrintfError, Result, snippet},
    lexer::Call,
};

/// Largest vector a directive may print (`x`, `y`, `z`, `w`).
pub const MAX_VECTOR_WIDTH: u8 = 4;

/// One 32-bit word of a print record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitOp {
    /// A character code from the format text.
    Literal(u32),
    /// One scalar (or one vector component) taken from a value argument.
    Field(Field),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub directive: FormatDirective,
    /// Index into the value arguments (the arguments after the format string).
    pub argument: usize,
    /// Vector component (0 = `x` .. 3 = `w`), `None` for scalars.
    pub component: Option<u8>,
}

impl Field {
    pub fn family(&self) -> Family {
        self.directive.family()
    }
}

/// The compiled form of one format string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormatProgram {
    pub ops: Vec<EmitOp>,
    /// Number of value arguments the directives consume.
    pub args_consumed: usize,
}

impl FormatProgram {
    /// Words one execution of the call writes. Known statically.
    pub fn write_size(&self) -> usize {
        self.ops.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.ops.iter().filter_map(|op| match op {
            EmitOp::Field(f) => Some(f),
            EmitOp::Literal(_) => None,
        })
    }
}

/// Why a format string failed to compile; `at` indexes the decoded format units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    Grammar { at: usize, error: GrammarError },
    VectorTooWide { at: usize, width: u8 },
    Nul { at: usize },
}

/// Compiles decoded format code units.
///
/// The record repeats the format text verbatim: plain characters, `%%` as two
/// `%` words and each directive's own text, followed right after every
/// directive by its `vector_width` data words. The decoder re-reads that text
/// with the same grammar.
pub fn compile_format(format: &[u32]) -> Result<FormatProgram, FormatError> {
    let mut grammar = Grammar::new(format.iter().copied());
    let mut program = FormatProgram::default();

    loop {
        let at = grammar.position();
        let Some(piece) = grammar.next_piece() else {
            break;
        };
        match piece.map_err(|error| FormatError::Grammar { at, error })? {
            Piece::Char(0) => return Err(FormatError::Nul { at }),
            Piece::Char(c) => program.ops.push(EmitOp::Literal(c)),
            Piece::Percent => {
                program.ops.push(EmitOp::Literal('%' as u32));
                program.ops.push(EmitOp::Literal('%' as u32));
            }
            Piece::Directive { directive, raw } => {
                let width = directive.vector_width;
                if width > MAX_VECTOR_WIDTH {
                    return Err(FormatError::VectorTooWide { at, width });
                }
                program.ops.extend(raw.into_iter().map(EmitOp::Literal));
                let argument = program.args_consumed;
                for c in 0..width {
                    program.ops.push(EmitOp::Field(Field {
                        directive: directive.clone(),
                        argument,
                        component: (width > 1).then_some(c),
                    }));
                }
                program.args_consumed += 1;
            }
        }
    }
    Ok(program)
}

/// Compiles the format literal of an extracted call and checks it against
/// the number of value arguments supplied.
pub fn compile_call(source: &str, call: &Call) -> Result<FormatProgram> {
    let offset = call.span.start;
    let call_text = || snippet(source, call.span.start, call.span.end);

    let literal = call.format_arg().ok_or_else(|| PrintfError::MalformedCall {
        offset,
        reason: "missing format string",
        call: call_text(),
    })?;
    let body = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| PrintfError::MalformedCall {
            offset,
            reason: "format argument is not a single string literal",
            call: call_text(),
        })?;

    let program = compile_format(&unescape(body)).map_err(|e| match e {
        FormatError::Grammar {
            error: GrammarError::UnknownConversion { found, .. },
            ..
        } => PrintfError::UnknownConversion {
            offset,
            found: char::from_u32(found),
            call: call_text(),
        },
        FormatError::Grammar {
            error: GrammarError::Unterminated { .. },
            ..
        } => PrintfError::UnknownConversion {
            offset,
            found: None,
            call: call_text(),
        },
        FormatError::Grammar {
            error: GrammarError::BadVectorWidth { found, .. },
            ..
        } => PrintfError::InvalidVectorWidth {
            offset,
            width: found
                .and_then(char::from_u32)
                .and_then(|c| c.to_digit(10))
                .unwrap_or(0),
            call: call_text(),
        },
        FormatError::Grammar {
            error: GrammarError::FieldTooLarge { .. },
            ..
        } => PrintfError::MalformedCall {
            offset,
            reason: "field width or precision above 1024",
            call: call_text(),
        },
        FormatError::VectorTooWide { width, .. } => PrintfError::InvalidVectorWidth {
            offset,
            width: width as u32,
            call: call_text(),
        },
        FormatError::Nul { .. } => PrintfError::MalformedCall {
            offset,
            reason: "NUL character in format string",
            call: call_text(),
        },
    })?;

    let supplied = call.value_args().len();
    if program.args_consumed != supplied {
        return Err(PrintfError::ArgumentCountMismatch {
            offset,
            expected: program.args_consumed,
            supplied,
            call: call_text(),
        });
    }
    debug!(
        "compiled call at {offset}: {} words, {} argument(s)",
        program.write_size(),
        supplied
    );
    Ok(program)
}
