// src/gpu/device.rs
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};

/// GPU device/queue shared by every print buffer and shader module.
pub struct GpuDeviceCtx {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
}

fn backends_from_env() -> wgpu::Backends {
    match std::env::var("SHADERPRINTF_BACKEND")
        .unwrap_or_else(|_| "auto".into())
        .to_ascii_lowercase()
        .as_str()
    {
        "vulkan" | "vk" => wgpu::Backends::VULKAN,
        "dx12" => wgpu::Backends::DX12,
        "metal" | "mtl" => wgpu::Backends::METAL,
        "gl" => wgpu::Backends::GL,
        _ => wgpu::Backends::all(),
    }
}

impl GpuDeviceCtx {
    /// Picks an adapter (honouring `SHADERPRINTF_BACKEND`) and opens a device
    /// whose storage binding limit is as large as the adapter allows, so the
    /// default 16M-word print buffer can be bound.
    pub fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: backends_from_env(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;
        log::debug!("using adapter {:?}", adapter.get_info());

        let supported = adapter.limits();
        let mut limits = wgpu::Limits::defaults();
        limits.max_storage_buffer_binding_size = supported.max_storage_buffer_binding_size;
        limits.max_buffer_size = supported.max_buffer_size;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("shaderprintf_device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits,
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create wgpu device")?;

        device.on_uncaptured_error(Box::new(|e| {
            log::error!("[wgpu uncaptured] {e:?}");
        }));

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }
}

/// Returns the global GPU context (created on first use).
pub fn global() -> &'static GpuDeviceCtx {
    static CTX: OnceLock<GpuDeviceCtx> = OnceLock::new();
    CTX.get_or_init(|| GpuDeviceCtx::new().expect("GPU context"))
}
