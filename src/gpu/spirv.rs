// src/gpu/spirv.rs
//! GLSL to SPIR-V for rewritten shaders.
//!
//! The generated blocks reserve records with `atomicAdd` on a `uint[]` member,
//! which naga's GLSL front end does not implement, so rewritten sources go
//! through glslang (via `shaderc`) and reach wgpu as SPIR-V.

use anyhow::{Result, anyhow, bail};
use wgpu::naga::{self, ShaderStage};

fn shader_kind(stage: ShaderStage) -> Result<shaderc::ShaderKind> {
    Ok(match stage {
        ShaderStage::Vertex => shaderc::ShaderKind::Vertex,
        ShaderStage::Fragment => shaderc::ShaderKind::Fragment,
        ShaderStage::Compute => shaderc::ShaderKind::Compute,
        #[allow(unreachable_patterns)]
        other => bail!("no GLSL compile path for {other:?} shaders"),
    })
}

/// Compiles GLSL `source` for `stage` (entry point `main`) to SPIR-V words.
/// Blocks without an explicit binding are given one automatically.
pub fn compile_glsl(label: &str, stage: ShaderStage, source: &str) -> Result<Vec<u32>> {
    let compiler = shaderc::Compiler::new().ok_or_else(|| anyhow!("shaderc compiler unavailable"))?;
    let mut options =
        shaderc::CompileOptions::new().ok_or_else(|| anyhow!("shaderc options unavailable"))?;
    options.set_auto_bind_uniforms(true);

    let artifact = compiler
        .compile_into_spirv(source, shader_kind(stage)?, label, "main", Some(&options))
        .map_err(|e| anyhow!("GLSL compile of `{label}` failed: {e}"))?;
    if artifact.get_num_warnings() > 0 {
        log::warn!("`{label}`: {}", artifact.get_warning_messages());
    }
    Ok(artifact.as_binary().to_vec())
}

/// Parses and validates SPIR-V the way wgpu will when the module is created.
pub fn validate(label: &str, words: &[u32]) -> Result<naga::Module> {
    let module = naga::front::spv::Frontend::new(
        words.iter().copied(),
        &naga::front::spv::Options::default(),
    )
    .parse()
    .map_err(|e| anyhow!("SPIR-V of `{label}` does not parse: {e}"))?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| anyhow!("SPIR-V of `{label}` failed validation: {e}"))?;
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BindingSlot, PrintfConfig, add_printf_to_source};

    const SHADER: &str = "#version 450\n\
        layout(local_size_x = 4) in;\n\
        void main() {\n\
            vec2 v = vec2(gl_GlobalInvocationID.xy);\n\
            printf(\"id=%u v=%^2f\\n\", gl_GlobalInvocationID.x, v);\n\
        }\n";

    #[test]
    fn rewritten_shader_compiles_and_validates() {
        let glsl = add_printf_to_source(SHADER, &PrintfConfig::default()).unwrap();
        let words = compile_glsl("rewritten", ShaderStage::Compute, &glsl).unwrap();
        let module = validate("rewritten", &words).unwrap();
        assert!(module.entry_points.iter().any(|ep| ep.stage == ShaderStage::Compute));
    }

    #[test]
    fn explicit_binding_is_honoured() {
        let config = PrintfConfig {
            binding: Some(BindingSlot {
                group: 1,
                binding: 3,
            }),
            ..PrintfConfig::default()
        };
        let glsl = add_printf_to_source(SHADER, &config).unwrap();
        let module = validate(
            "bound",
            &compile_glsl("bound", ShaderStage::Compute, &glsl).unwrap(),
        )
        .unwrap();
        let slots: Vec<_> = module
            .global_variables
            .iter()
            .filter_map(|(_, var)| var.binding.as_ref())
            .map(|b| (b.group, b.binding))
            .collect();
        assert_eq!(slots, vec![(1, 3)]);
    }

    #[test]
    fn compile_errors_are_reported() {
        let err = compile_glsl("broken", ShaderStage::Compute, "#version 450\nvoid main() { x; }\n")
            .unwrap_err();
        assert!(err.to_string().contains("broken"));
    }
}
