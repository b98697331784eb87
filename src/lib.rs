//! GLSL `printf` for compute shaders.
//!
//! [`rewrite::add_printf_to_source`] turns every `printf("...", args);` in a
//! shader into writes of the format text and argument bits into a storage
//! buffer; [`decode`] turns a readback of that buffer into text again.

pub mod codegen;
pub mod config;
pub mod cpu;
pub mod decode;
pub mod dev;
pub mod error;
pub mod format;
pub mod gpu;
pub mod lexer;
pub mod rewrite;

pub use config::{BindingSlot, PrintfConfig};
pub use decode::{DecodedReport, decode_buffer, decode_payload, decode_report};
pub use error::PrintfError;
pub use rewrite::{add_printf_to_source, rewrite_sources};
