// src/format/mod.rs
pub mod compile;
pub mod directive;
pub mod escape;
pub mod grammar;
pub mod render;

pub use compile::{EmitOp, Field, FormatProgram, compile_call, compile_format};
pub use directive::{Conversion, Family, FormatDirective};
pub use grammar::{Grammar, GrammarError, Piece};
