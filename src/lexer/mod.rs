// src/lexer/mod.rs
pub mod extract;
pub mod locate;
pub mod scrub;
pub mod state;

pub use extract::{Call, extract_call};
pub use locate::{CallSites, find_call};
pub use scrub::strip_comments;
