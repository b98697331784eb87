// src/lexer/state.rs
// Comment/string state shared by the scrubber and the call-site locator.
// The state is a plain value: each step takes the current mode and the bytes
// under the cursor and returns the next mode plus how many bytes it consumed.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Code,
    Str,
    LineComment,
    BlockComment,
}

/// What the bytes consumed by one step belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Code,
    Literal,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub next: Mode,
    pub len: usize,
    pub class: Class,
}

impl Mode {
    #[inline]
    pub fn step(self, cur: u8, next: Option<u8>) -> Step {
        use Mode::*;
        let (next_mode, len, class) = match (self, cur, next) {
            (Code, b'"', _) => (Str, 1, Class::Literal),
            (Code, b'/', Some(b'*')) => (BlockComment, 2, Class::Comment),
            (Code, b'/', Some(b'/')) => (LineComment, 2, Class::Comment),
            (Code, _, _) => (Code, 1, Class::Code),

            // an escape swallows exactly one following byte
            (Str, b'\\', Some(_)) => (Str, 2, Class::Literal),
            (Str, b'"', _) => (Code, 1, Class::Literal),
            (Str, _, _) => (Str, 1, Class::Literal),

            (LineComment, b'\n', _) => (Code, 1, Class::Code),
            (LineComment, _, _) => (LineComment, 1, Class::Comment),

            (BlockComment, b'*', Some(b'/')) => (Code, 2, Class::Comment),
            (BlockComment, _, _) => (BlockComment, 1, Class::Comment),
        };
        Step {
            next: next_mode,
            len,
            class,
        }
    }
}

/// A run of bytes produced by one lexer step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub start: usize,
    pub len: usize,
    pub class: Class,
}

/// Forward scan over source bytes, threading `Mode` through `Mode::step`.
pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    mode: Mode,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            pos: 0,
            mode: Mode::Code,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn pos(&self) -> usize {
        self.pos
    }
}

impl Iterator for Lexer<'_> {
    type Item = Piece;

    fn next(&mut self) -> Option<Piece> {
        let cur = *self.src.get(self.pos)?;
        let step = self.mode.step(cur, self.src.get(self.pos + 1).copied());
        let piece = Piece {
            start: self.pos,
            len: step.len,
            class: step.class,
        };
        self.pos += step.len;
        self.mode = step.next;
        Some(piece)
    }
}

/// C `isspace`.
#[inline]
pub fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(src: &str) -> Vec<(usize, Class)> {
        Lexer::new(src.as_bytes()).map(|p| (p.start, p.class)).collect()
    }

    #[test]
    fn comment_openers_inside_strings_are_literal() {
        let c = classes("\"//x\"a");
        assert!(c[..5].iter().all(|&(_, k)| k == Class::Literal));
        assert_eq!(c.last(), Some(&(5, Class::Code)));
    }

    #[test]
    fn escaped_quote_does_not_close_string() {
        let mut lx = Lexer::new(br#""a\"b"c"#);
        let pieces: Vec<_> = lx.by_ref().collect();
        // `\"` is one two-byte step
        assert!(pieces.iter().any(|p| p.start == 2 && p.len == 2));
        assert_eq!(pieces.last().map(|p| p.class), Some(Class::Code));
        assert_eq!(lx.mode(), Mode::Code);
    }

    #[test]
    fn quotes_inside_comments_do_not_open_strings() {
        let mut lx = Lexer::new(b"/* \" */ x // \"\ny");
        let last = lx.by_ref().last();
        assert_eq!(last.map(|p| p.class), Some(Class::Code));
        assert_eq!(lx.mode(), Mode::Code);
    }

    #[test]
    fn unterminated_block_comment_stays_open() {
        let mut lx = Lexer::new(b"a /* b");
        lx.by_ref().for_each(drop);
        assert_eq!(lx.mode(), Mode::BlockComment);
        assert_eq!(lx.pos(), 6);
    }
}
