// src/decode.rs
//! Host-side decoding of a print buffer readback into text.
//!
//! The payload is the format text of every record with each directive's data
//! words right after the directive, so decoding is the format grammar run over
//! the payload itself. Decoding never fails: whatever is malformed or cut off
//! is echoed or dropped and the rest is still rendered.

use std::fmt;

use log::warn;

use crate::format::{
    Grammar, GrammarError, Piece,
    render::render_word,
};

/// Text decoded from one readback plus how much of the buffer it covered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedReport {
    pub text: String,
    /// Words the counter says were reserved (`counter - 1`).
    pub claimed_words: usize,
    /// Payload words actually consumed by the decoder.
    pub decoded_words: usize,
    /// More words were reserved than the payload can hold, so later records
    /// were dropped on the device.
    pub overflowed: bool,
}

impl fmt::Display for DecodedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn push_unit(out: &mut String, w: u32) {
    out.push(char::from_u32(w).unwrap_or(char::REPLACEMENT_CHARACTER));
}

/// Decodes `payload` (the buffer words after the counter word).
///
/// `counter_word` is the raw word 0 of the buffer and `capacity_words` the
/// buffer's size in words, counter included. The payload is clamped to what
/// the counter claims and the buffer can hold, and decoding stops at the first
/// zero word found where format text is expected (the unwritten tail after a
/// reset).
pub fn decode_report(counter_word: u32, payload: &[u32], capacity_words: usize) -> DecodedReport {
    let claimed = counter_word.saturating_sub(1) as usize;
    let room = capacity_words.saturating_sub(1);
    let len = claimed.min(room).min(payload.len());
    let overflowed = claimed > room;
    if overflowed {
        warn!("print buffer overflowed: {claimed} words reserved, room for {room}");
    }

    let mut text = String::with_capacity(len);
    let mut grammar = Grammar::new(payload[..len].iter().copied());
    let mut decoded = len;

    while let Some(piece) = grammar.next_piece() {
        match piece {
            Ok(Piece::Char(0)) => {
                decoded = grammar.position() - 1;
                break;
            }
            Ok(Piece::Char(c)) => push_unit(&mut text, c),
            Ok(Piece::Percent) => text.push('%'),
            Ok(Piece::Directive { directive, raw }) => {
                let width = directive.vector_width as usize;
                let mut parts = Vec::with_capacity(width);
                for _ in 0..width {
                    match grammar.next_word() {
                        Some(w) => parts.push(render_word(&directive, w)),
                        None => break,
                    }
                }
                if parts.is_empty() {
                    warn!("payload ends inside a record; dropping a dangling directive");
                    raw.iter().for_each(|&c| push_unit(&mut text, c));
                    break;
                }
                if width == 1 {
                    text.push_str(&parts[0]);
                } else {
                    text.push('(');
                    text.push_str(&parts.join(", "));
                    if parts.len() < width {
                        warn!("payload ends inside a vector value");
                    } else {
                        text.push(')');
                    }
                }
            }
            Err(e) => {
                let stop = is_terminal(&e);
                let raw = e.raw();
                let keep = raw.iter().position(|&c| c == 0).unwrap_or(raw.len());
                raw[..keep].iter().for_each(|&c| push_unit(&mut text, c));
                if stop {
                    decoded = grammar.position() - (raw.len() - keep);
                    break;
                }
            }
        }
    }

    DecodedReport {
        text,
        claimed_words: claimed,
        decoded_words: decoded,
        overflowed,
    }
}

/// Whether a grammar error means the readable text has ended.
fn is_terminal(e: &GrammarError) -> bool {
    match e {
        GrammarError::Unterminated { .. } => true,
        GrammarError::UnknownConversion { found, .. } => *found == 0,
        GrammarError::BadVectorWidth { found, .. } => matches!(found, Some(0) | None),
        GrammarError::FieldTooLarge { .. } => false,
    }
}

/// [`decode_report`], text only.
pub fn decode_payload(counter_word: u32, payload: &[u32], capacity_words: usize) -> String {
    decode_report(counter_word, payload, capacity_words).text
}

/// Decodes a whole buffer readback (counter word first).
pub fn decode_buffer(words: &[u32]) -> DecodedReport {
    match words.split_first() {
        Some((&counter, payload)) => decode_report(counter, payload, words.len()),
        None => DecodedReport::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Vec<u32> {
        s.chars().map(|c| c as u32).collect()
    }

    fn buffer(payload: &[u32], capacity: usize) -> Vec<u32> {
        let mut words = vec![0u32; capacity];
        words[0] = payload.len() as u32 + 1;
        words[1..=payload.len()].copy_from_slice(payload);
        words
    }

    #[test]
    fn scalar_directive() {
        let mut p = text("text %d");
        p.push(7);
        p.extend(text(" end"));
        assert_eq!(decode_buffer(&buffer(&p, 64)).text, "text 7 end");
    }

    #[test]
    fn percent_escape_and_negative_int() {
        let mut p = text("%% %d");
        p.push(-3i32 as u32);
        assert_eq!(decode_buffer(&buffer(&p, 16)).text, "% -3");
    }

    #[test]
    fn vector_directive() {
        let mut p = text("v=%^3f");
        p.extend([1.0f32.to_bits(), 2.5f32.to_bits(), (-0.25f32).to_bits()]);
        assert_eq!(
            decode_buffer(&buffer(&p, 32)).text,
            "v=(1.000000, 2.500000, -0.250000)"
        );
    }

    #[test]
    fn zero_data_word_is_a_value() {
        let mut p = text("%u");
        p.push(0);
        p.extend(text("|"));
        let r = decode_buffer(&buffer(&p, 16));
        assert_eq!(r.text, "0|");
        assert_eq!(r.decoded_words, p.len());
    }

    #[test]
    fn stops_at_unwritten_tail() {
        let mut p = text("ab");
        p.extend([0, 0, 0]);
        let r = decode_buffer(&buffer(&p, 16));
        assert_eq!(r.text, "ab");
        assert_eq!(r.decoded_words, 2);
        assert!(!r.overflowed);
    }

    #[test]
    fn clamps_to_capacity() {
        let mut words = buffer(&text("abc"), 4);
        words[0] = 7;
        let r = decode_buffer(&words);
        assert_eq!(r.text, "abc");
        assert_eq!(r.claimed_words, 6);
        assert!(r.overflowed);
    }

    #[test]
    fn counter_beyond_readback_is_clamped() {
        let r = decode_report(1000, &text("hi"), 1 << 20);
        assert_eq!(r.text, "hi");
        assert_eq!(r.decoded_words, 2);
    }

    #[test]
    fn truncated_directive_is_best_effort() {
        assert_eq!(decode_payload(5, &text("x=%d"), 16), "x=%d");
        let mut p = text("%^3d");
        p.extend([1, 2]);
        assert_eq!(decode_payload(p.len() as u32 + 1, &p, 64), "(1, 2");
        assert_eq!(decode_payload(4, &text("a%5"), 16), "a%5");
    }

    #[test]
    fn malformed_directive_is_echoed() {
        assert_eq!(decode_payload(6, &text("%s ok"), 16), "%s ok");
    }

    #[test]
    fn huge_width_and_precision_are_echoed() {
        let mut p = text("%.70000f");
        p.push(1.0f32.to_bits());
        p.extend(text("|"));
        let out = decode_payload(p.len() as u32 + 1, &p, 64);
        assert!(out.starts_with("%.70000f"));
        assert!(out.ends_with('|'));

        let mut p = text("%99999999999999999999d");
        p.push('7' as u32);
        p.extend(text(" ok"));
        let out = decode_payload(p.len() as u32 + 1, &p, 64);
        assert_eq!(out, "%99999999999999999999d7 ok");
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(decode_buffer(&[]), DecodedReport::default());
        assert_eq!(decode_payload(0, &[], 0), "");
        assert_eq!(decode_payload(1, &[65], 2), "");
    }
}
