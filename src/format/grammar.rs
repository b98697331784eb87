// src/format/grammar.rs
//! The one format grammar shared by the write side (format compiler) and the
//! read side (record decoder).
//!
//! Input is a stream of code units (`u32`). On the write side that stream is the
//! escape-decoded format literal; on the read side it is the payload itself,
//! where each directive's text is followed by its data words. The decoder pulls
//! those data words with [`Grammar::next_word`] between pieces.

use std::iter::Peekable;

use super::{
    directive::{Conversion, FormatDirective},
    render::Spec,
};

/// Characters allowed between `%` and the conversion letter (besides `^N`).
const FLAG_CHARS: &[u8] = b"-+ #0123456789.hlLqjzt";

const PERCENT: u32 = '%' as u32;
const CARET: u32 = '^' as u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    /// A plain character.
    Char(u32),
    /// `%%`.
    Percent,
    /// A complete `%...X` directive and the exact code units it was read from.
    Directive {
        directive: FormatDirective,
        raw: Vec<u32>,
    },
}

/// Where a directive went wrong. `raw` holds the code units consumed for the
/// broken directive (starting with `%`) so a lenient reader can echo them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// Input ended before a conversion letter.
    Unterminated { raw: Vec<u32> },
    /// A code unit that is neither a flag nor a conversion letter.
    UnknownConversion { found: u32, raw: Vec<u32> },
    /// `^` not followed by a digit 1-9.
    BadVectorWidth { found: Option<u32>, raw: Vec<u32> },
    /// Width or precision above [`super::render::MAX_FIELD`].
    FieldTooLarge { raw: Vec<u32> },
}

impl GrammarError {
    pub fn raw(&self) -> &[u32] {
        match self {
            Self::Unterminated { raw }
            | Self::UnknownConversion { raw, .. }
            | Self::BadVectorWidth { raw, .. }
            | Self::FieldTooLarge { raw } => raw,
        }
    }
}

pub struct Grammar<I: Iterator<Item = u32>> {
    input: Peekable<I>,
    consumed: usize,
}

impl<I: Iterator<Item = u32>> Grammar<I> {
    pub fn new(input: I) -> Self {
        Self {
            input: input.peekable(),
            consumed: 0,
        }
    }

    /// Number of code units consumed so far.
    pub fn position(&self) -> usize {
        self.consumed
    }

    pub fn peek_word(&mut self) -> Option<u32> {
        self.input.peek().copied()
    }

    /// Takes the next code unit without interpreting it.
    pub fn next_word(&mut self) -> Option<u32> {
        let w = self.input.next()?;
        self.consumed += 1;
        Some(w)
    }

    /// Parses the next piece; `None` at end of input.
    pub fn next_piece(&mut self) -> Option<Result<Piece, GrammarError>> {
        let c = self.next_word()?;
        if c != PERCENT {
            return Some(Ok(Piece::Char(c)));
        }
        if self.peek_word() == Some(PERCENT) {
            self.next_word();
            return Some(Ok(Piece::Percent));
        }
        Some(self.directive_after_percent())
    }

    fn directive_after_percent(&mut self) -> Result<Piece, GrammarError> {
        let mut raw = vec![PERCENT];
        let mut flags = String::new();
        let mut vector_width = 1u8;

        loop {
            let Some(c) = self.next_word() else {
                return Err(GrammarError::Unterminated { raw });
            };
            raw.push(c);

            if let Some(conversion) = Conversion::from_letter(c) {
                if !Spec::parse(&flags).within_limits() {
                    return Err(GrammarError::FieldTooLarge { raw });
                }
                return Ok(Piece::Directive {
                    directive: FormatDirective {
                        flags,
                        vector_width,
                        conversion,
                    },
                    raw,
                });
            }

            if c == CARET {
                let Some(d) = self.next_word() else {
                    return Err(GrammarError::Unterminated { raw });
                };
                raw.push(d);
                match char::from_u32(d).and_then(|ch| ch.to_digit(10)) {
                    Some(n @ 1..=9) => vector_width = n as u8,
                    _ => {
                        return Err(GrammarError::BadVectorWidth {
                            found: Some(d),
                            raw,
                        });
                    }
                }
                continue;
            }

            match u8::try_from(c) {
                Ok(b) if FLAG_CHARS.contains(&b) => flags.push(b as char),
                _ => return Err(GrammarError::UnknownConversion { found: c, raw }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(s: &str) -> Vec<u32> {
        s.chars().map(|c| c as u32).collect()
    }

    fn pieces(s: &str) -> Vec<Result<Piece, GrammarError>> {
        let mut g = Grammar::new(units(s).into_iter());
        std::iter::from_fn(|| g.next_piece()).collect()
    }

    #[test]
    fn plain_text_and_percent_escape() {
        let p = pieces("a%%b");
        assert_eq!(
            p,
            vec![
                Ok(Piece::Char('a' as u32)),
                Ok(Piece::Percent),
                Ok(Piece::Char('b' as u32)),
            ]
        );
    }

    #[test]
    fn directive_with_flags_and_vector_width() {
        let p = pieces("%-8^3.2f!");
        let Ok(Piece::Directive { directive, raw }) = &p[0] else {
            panic!("expected directive, got {:?}", p[0]);
        };
        assert_eq!(directive.flags, "-8.2");
        assert_eq!(directive.vector_width, 3);
        assert_eq!(directive.conversion, Conversion::Fixed);
        assert_eq!(raw, &units("%-8^3.2f"));
        assert_eq!(p[1], Ok(Piece::Char('!' as u32)));
    }

    #[test]
    fn length_modifiers_are_flags() {
        let p = pieces("%lu");
        assert!(matches!(
            &p[0],
            Ok(Piece::Directive { directive, .. }) if directive.flags == "l"
                && directive.conversion == Conversion::Unsigned
        ));
    }

    #[test]
    fn unknown_conversion_reports_offending_unit() {
        let p = pieces("%5s");
        assert_eq!(
            p[0],
            Err(GrammarError::UnknownConversion {
                found: 's' as u32,
                raw: units("%5s"),
            })
        );
    }

    #[test]
    fn unterminated_directive() {
        assert_eq!(
            pieces("%5"),
            vec![Err(GrammarError::Unterminated { raw: units("%5") })]
        );
        assert_eq!(
            pieces("%"),
            vec![Err(GrammarError::Unterminated { raw: units("%") })]
        );
    }

    #[test]
    fn bad_vector_width() {
        assert_eq!(
            pieces("%^0d")[0],
            Err(GrammarError::BadVectorWidth {
                found: Some('0' as u32),
                raw: units("%^0"),
            })
        );
    }

    #[test]
    fn oversized_field() {
        assert_eq!(
            pieces("%.70000f")[0],
            Err(GrammarError::FieldTooLarge {
                raw: units("%.70000f"),
            })
        );
        assert!(matches!(pieces("%1024.1024e")[0], Ok(Piece::Directive { .. })));
    }

    #[test]
    fn data_words_are_pulled_between_pieces() {
        let mut g = Grammar::new(vec![PERCENT, 'd' as u32, 42, 'x' as u32].into_iter());
        assert!(matches!(g.next_piece(), Some(Ok(Piece::Directive { .. }))));
        assert_eq!(g.next_word(), Some(42));
        assert_eq!(g.next_piece(), Some(Ok(Piece::Char('x' as u32))));
        assert_eq!(g.position(), 4);
        assert_eq!(g.next_piece(), None);
    }
}
