// src/gpu/buffers.rs
use std::ops::Deref;

use anyhow::{Context, Result, anyhow, bail};

use crate::{
    config::PrintfConfig,
    decode::{DecodedReport, decode_report},
};

/// Print buffer size used when the caller does not pick one: 16M words.
pub const DEFAULT_PRINT_BUFFER_WORDS: usize = 16 * 1024 * 1024;

const WORD: u64 = 4;

/// A `wgpu::Buffer` that also tracks element count and byte size.
pub struct GpuBuffer<T> {
    pub buffer: wgpu::Buffer,
    /// total allocated size in bytes
    pub byte_size: usize,
    /// number of logical T elements
    pub count: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<T> GpuBuffer<T> {
    pub fn new((buffer, byte_size): (wgpu::Buffer, u64), count: usize) -> Self {
        Self {
            buffer,
            byte_size: byte_size as usize,
            count,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T> Deref for GpuBuffer<T> {
    type Target = wgpu::Buffer;
    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

/// STORAGE buffer (read/write) sized for `count` elements of `T` at their
/// std430 stride, measured by encoding one `T::default()` with encase.
pub fn storage_rw_for_array<T>(
    device: &wgpu::Device,
    label: &str,
    count: usize,
) -> Result<GpuBuffer<T>>
where
    T: Default + encase::ShaderType + encase::internal::WriteInto,
{
    let mut sb = encase::StorageBuffer::new(Vec::<u8>::new());
    sb.write(&T::default())
        .map_err(|e| anyhow!("measuring element layout for {label}: {e:?}"))?;
    let elem_padded_bytes = sb.as_ref().len();
    let total = elem_padded_bytes
        .checked_mul(count)
        .ok_or_else(|| anyhow!("overflow sizing storage buffer {label}"))?;
    let raw = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: total as u64,
        usage: wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_SRC
            | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    Ok(GpuBuffer::new((raw, total as u64), count))
}

pub fn readback_bytes(device: &wgpu::Device, label: &str, byte_size: usize) -> GpuBuffer<u8> {
    let raw = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: byte_size as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    GpuBuffer::new((raw, byte_size as u64), byte_size)
}

fn u32s_from_le(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Device-side print buffer: word 0 counts reserved words plus one, the rest
/// holds the records written by rewritten shaders.
pub struct PrintBuffer {
    words: GpuBuffer<u32>,
}

impl PrintBuffer {
    /// Allocates `capacity_words` words (counter included). The buffer starts
    /// zeroed, so call [`PrintBuffer::reset`] before the first dispatch.
    pub fn new(device: &wgpu::Device, capacity_words: usize) -> Result<Self> {
        if capacity_words < 2 {
            bail!("print buffer needs at least 2 words, got {capacity_words}");
        }
        let max = device.limits().max_storage_buffer_binding_size as usize / WORD as usize;
        if capacity_words > max {
            bail!("print buffer of {capacity_words} words exceeds the device binding limit of {max} words");
        }
        let words = storage_rw_for_array::<u32>(device, "printf.buffer", capacity_words)?;
        log::debug!("print buffer: {} words, {} bytes", words.count, words.byte_size);
        Ok(Self { words })
    }

    pub fn with_default_size(device: &wgpu::Device) -> Result<Self> {
        Self::new(device, DEFAULT_PRINT_BUFFER_WORDS)
    }

    pub fn capacity_words(&self) -> usize {
        self.words.count
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.words
    }

    /// Zeroes the payload and sets the counter to its empty value of 1.
    pub fn reset(&self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let mut enc = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("printf.reset"),
        });
        enc.clear_buffer(&self.words, WORD, None);
        queue.write_buffer(&self.words, 0, &1u32.to_le_bytes());
        queue.submit(Some(enc.finish()));
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource<'_> {
        self.words.as_entire_binding()
    }

    /// Bind group holding only the print buffer, at the slot `config.binding`
    /// names. `layout` must be the layout of that group.
    pub fn bind_group(
        &self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        config: &PrintfConfig,
    ) -> Result<wgpu::BindGroup> {
        let slot = config
            .binding
            .ok_or_else(|| anyhow!("no binding slot configured for `{}`", config.block_name))?;
        Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(config.block_name.as_str()),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: slot.binding,
                resource: self.binding_resource(),
            }],
        }))
    }

    pub fn destroy(self) {
        self.words.buffer.destroy();
    }

    /// Copies `count` words starting at word `offset` back to the host. Waits
    /// for all previously submitted work.
    pub async fn read_words(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        offset: usize,
        count: usize,
    ) -> Result<Vec<u32>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if offset + count > self.capacity_words() {
            bail!(
                "read of words {offset}..{} past print buffer end {}",
                offset + count,
                self.capacity_words()
            );
        }
        let bytes = count * WORD as usize;
        let staging = readback_bytes(device, "printf.readback", bytes);
        let mut enc = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("printf.readback"),
        });
        enc.copy_buffer_to_buffer(&self.words, offset as u64 * WORD, &staging, 0, bytes as u64);

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        queue.submit(Some(enc.finish()));
        if let Some(err) = device.pop_error_scope().await {
            bail!("validation while reading print buffer: {err}");
        }

        let slice = staging.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        device
            .poll(wgpu::PollType::Wait)
            .context("waiting for print buffer readback")?;
        rx.receive()
            .await
            .ok_or_else(|| anyhow!("print buffer map callback dropped"))?
            .context("mapping print buffer readback")?;

        let mapped = slice.get_mapped_range();
        let words = u32s_from_le(&mapped);
        drop(mapped);
        staging.unmap();

        #[cfg(feature = "gpu-debug")]
        log::debug!("read {count} print words at {offset}: {:?}", &words[..count.min(16)]);

        Ok(words)
    }

    /// Reads the counter, then only the claimed part of the payload, and
    /// decodes it.
    pub async fn read_report(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<DecodedReport> {
        let counter = self
            .read_words(device, queue, 0, 1)
            .await?
            .first()
            .copied()
            .unwrap_or(0);
        let capacity = self.capacity_words();
        let claimed = (counter.saturating_sub(1) as usize).min(capacity - 1);
        let payload = self.read_words(device, queue, 1, claimed).await?;
        Ok(decode_report(counter, &payload, capacity))
    }

    pub async fn read_string(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<String> {
        Ok(self.read_report(device, queue).await?.text)
    }

    pub fn read_report_blocking(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<DecodedReport> {
        pollster::block_on(self.read_report(device, queue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_endian_words() {
        assert_eq!(
            u32s_from_le(&[1, 0, 0, 0, 0x78, 0x56, 0x34, 0x12, 9]),
            vec![1, 0x1234_5678]
        );
    }
}
