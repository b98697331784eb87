//! wgpu side of printf: device context, the print buffer, GLSL to SPIR-V,
//! and the shader compile hook.

pub mod buffers;
pub mod device;
pub mod shader;
pub mod spirv;

pub use buffers::{DEFAULT_PRINT_BUFFER_WORDS, PrintBuffer};
pub use shader::{Bound, PrintfProgram, create_shader_module_with_printf};
