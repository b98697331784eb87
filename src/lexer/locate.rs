// src/lexer/locate.rs
// Call-site discovery. One forward pass tracks comment/string state and checks
// every occurrence of the call name found in plain code.

use log::trace;

use super::state::{Class, Lexer, is_space};

/// Iterator over the byte offsets of valid invocations of `name`.
///
/// An occurrence is valid when it lies in code (not in a comment or string
/// literal), is preceded by whitespace or the start of the source, and is
/// followed by whitespace or `(`.
pub struct CallSites<'a> {
    src: &'a [u8],
    name: &'a [u8],
    lexer: Lexer<'a>,
}

impl<'a> CallSites<'a> {
    pub fn new(source: &'a str, name: &'a str) -> Self {
        Self {
            src: source.as_bytes(),
            name: name.as_bytes(),
            lexer: Lexer::new(source.as_bytes()),
        }
    }

    fn accepts(&self, at: usize) -> bool {
        let end = at + self.name.len();
        if !self.src[at..].starts_with(self.name) {
            return false;
        }
        if at > 0 && !is_space(self.src[at - 1]) {
            trace!("reject call candidate at {at}: part of a longer identifier");
            return false;
        }
        match self.src.get(end) {
            Some(&b) if is_space(b) || b == b'(' => true,
            _ => {
                trace!("reject call candidate at {at}: not followed by `(` or whitespace");
                false
            }
        }
    }
}

impl Iterator for CallSites<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.name.is_empty() {
            return None;
        }
        let first = self.name[0];
        while let Some(piece) = self.lexer.next() {
            if piece.class == Class::Code && self.src[piece.start] == first && self.accepts(piece.start) {
                return Some(piece.start);
            }
        }
        None
    }
}

/// Offset of the first valid invocation of `name`, if any.
pub fn find_call(source: &str, name: &str) -> Option<usize> {
    CallSites::new(source, name).next()
}
