// src/error.rs
//! Preprocessing errors. Every variant carries the absolute byte offset of the
//! offending call site and a short excerpt of the call text.

/// Longest call excerpt kept in an error message.
const SNIPPET_MAX: usize = 80;

#[derive(Clone, Debug, thiserror::Error)]
#[cfg_attr(test, derive(PartialEq))]
pub enum PrintfError {
    #[error("malformed call at offset {offset}: {reason} in `{call}`")]
    MalformedCall {
        offset: usize,
        reason: &'static str,
        call: String,
    },
    #[error(
        "argument count mismatch at offset {offset}: format consumes {expected} argument(s) but {supplied} supplied in `{call}`"
    )]
    ArgumentCountMismatch {
        offset: usize,
        expected: usize,
        supplied: usize,
        call: String,
    },
    #[error("unknown conversion {found:?} at offset {offset} in `{call}`")]
    UnknownConversion {
        offset: usize,
        found: Option<char>,
        call: String,
    },
    #[error("vector width {width} at offset {offset} is outside 1..=4 in `{call}`")]
    InvalidVectorWidth {
        offset: usize,
        width: u32,
        call: String,
    },
}

impl PrintfError {
    pub fn offset(&self) -> usize {
        match self {
            Self::MalformedCall { offset, .. }
            | Self::ArgumentCountMismatch { offset, .. }
            | Self::UnknownConversion { offset, .. }
            | Self::InvalidVectorWidth { offset, .. } => *offset,
        }
    }
}

/// Excerpt of `src` starting at `start`, cut at a char boundary and with
/// newlines flattened so diagnostics stay on one line.
pub(crate) fn snippet(src: &str, start: usize, end: usize) -> String {
    let start = start.min(src.len());
    let mut end = end.min(src.len()).max(start);
    let truncated = end - start > SNIPPET_MAX;
    if truncated {
        end = start + SNIPPET_MAX;
    }
    while !src.is_char_boundary(end) {
        end -= 1;
    }
    let mut s: String = src[start..end]
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if truncated {
        s.push('…');
    }
    s
}

pub type Result<T, E = PrintfError> = std::result::Result<T, E>;
