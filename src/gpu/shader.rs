// src/gpu/shader.rs
//! Compile hook: rewrite GLSL compute sources, then hand them to wgpu.

use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap},
};

use anyhow::{Context, Result, anyhow, bail};

use super::{buffers::PrintBuffer, spirv::compile_glsl};
use crate::{config::PrintfConfig, rewrite::rewrite_sources};

/// Rewrites GLSL `sources` (concatenated in order), compiles them for `stage`
/// to SPIR-V and creates the module. Rewrite, GLSL and validation errors all
/// fail the call.
pub fn create_shader_module_with_printf(
    device: &wgpu::Device,
    label: &str,
    stage: wgpu::naga::ShaderStage,
    sources: &[&str],
    config: &PrintfConfig,
) -> Result<wgpu::ShaderModule> {
    let glsl = rewrite_sources(sources, config)
        .with_context(|| format!("printf rewrite of shader `{label}`"))?;
    log::trace!("rewritten `{label}`:\n{glsl}");

    let spirv = compile_glsl(label, stage, &glsl)?;

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::SpirV(Cow::Owned(spirv)),
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        bail!("shader `{label}` failed to compile: {err}");
    }
    Ok(module)
}

/// Where a named resource sits in the shader's bind groups.
pub struct Bound<'a> {
    pub group: u32,
    pub binding: u32,
    pub resource: wgpu::BindingResource<'a>,
}

/// A compute pipeline built from printf-enabled GLSL.
pub struct PrintfProgram {
    pub label: String,
    pub pipeline: wgpu::ComputePipeline,
    config: PrintfConfig,
}

impl PrintfProgram {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        sources: &[&str],
        config: &PrintfConfig,
    ) -> Result<Self> {
        let module = create_shader_module_with_printf(
            device,
            label,
            wgpu::naga::ShaderStage::Compute,
            sources,
            config,
        )?;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(label),
            layout: None,
            module: &module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            bail!("pipeline `{label}`: {err}");
        }
        Ok(Self {
            label: label.to_string(),
            pipeline,
            config: config.clone(),
        })
    }

    /// Resource map entry binding `print` under the block name.
    pub fn print_resource<'a>(&self, print: &'a PrintBuffer) -> Result<(String, Bound<'a>)> {
        let slot = self.config.binding.ok_or_else(|| {
            anyhow!(
                "`{}` has no binding slot; set `binding` in the printf config",
                self.config.block_name
            )
        })?;
        Ok((
            self.config.block_name.clone(),
            Bound {
                group: slot.group,
                binding: slot.binding,
                resource: print.binding_resource(),
            },
        ))
    }

    /// Records one dispatch. `resources` maps names to bind slots and must
    /// include the print buffer (see [`PrintfProgram::print_resource`]).
    pub fn record_dispatch(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        resources: &HashMap<String, Bound<'_>>,
        workgroups: [u32; 3],
    ) -> Result<()> {
        if !resources.contains_key(&self.config.block_name) {
            bail!("no resource provided for '{}'", self.config.block_name);
        }
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let mut groups: BTreeMap<u32, Vec<wgpu::BindGroupEntry>> = BTreeMap::new();
        for bound in resources.values() {
            groups.entry(bound.group).or_default().push(wgpu::BindGroupEntry {
                binding: bound.binding,
                resource: bound.resource.clone(),
            });
        }
        let bind_groups: Vec<(u32, wgpu::BindGroup)> = groups
            .into_iter()
            .map(|(g, entries)| {
                let layout = self.pipeline.get_bind_group_layout(g);
                let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(self.label.as_str()),
                    layout: &layout,
                    entries: &entries,
                });
                (g, bg)
            })
            .collect();

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(self.label.as_str()),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        for (g, bg) in &bind_groups {
            pass.set_bind_group(*g, bg, &[]);
        }
        let [x, y, z] = workgroups;
        pass.dispatch_workgroups(x, y, z);
        drop(pass);

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(anyhow!("validation in dispatch {}: {err:?}", self.label));
        }
        Ok(())
    }
}
