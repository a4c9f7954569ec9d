//! GPU resources: device context, particle state, target texture, passes.

mod camera;
mod context;
mod passes;
mod render;
mod store;
mod target;

pub use camera::Camera;
pub use context::GpuContext;
pub(crate) use passes::ComputePasses;
pub use render::SpriteRenderer;
pub(crate) use store::ParticleStore;
pub(crate) use target::TargetTextureGpu;

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

use crate::error::GpuError;
use crate::kernel::SlotOutput;

/// Per-frame values shared by every compute entry point.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct SimUniforms {
    pub start_color: [f32; 4],
    pub end_color: [f32; 4],
    pub delta_time: f32,
    pub emissive_intensity: f32,
    pub jitter_strength: f32,
    pub particle_count: u32,
    pub side: u32,
    pub frame: u32,
    pub _padding: [u32; 2],
}

/// Render attributes of one particle, written by the derive pass.
///
/// Bound by the sink as a per-instance vertex buffer (64 byte stride,
/// four `Float32x4` attributes at locations 0..=3).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RenderInstance {
    /// xyz = render position, w = 1.
    pub position: [f32; 4],
    /// rgb = color, a = per-particle opacity.
    pub color: [f32; 4],
    /// xyz = sprite scale.
    pub scale: [f32; 4],
    /// rgb = emissive color.
    pub emissive: [f32; 4],
}

impl RenderInstance {
    pub fn to_output(&self) -> SlotOutput {
        SlotOutput {
            position: Vec4::from_array(self.position).truncate(),
            color: Vec4::from_array(self.color),
            scale: Vec4::from_array(self.scale).truncate(),
            emissive: Vec4::from_array(self.emissive).truncate(),
        }
    }
}

/// Host layout of one element of a WGSL `array<vec3<f32>>` (16 byte stride).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct PaddedVec3 {
    pub xyz: [f32; 3],
    pub _pad: f32,
}

impl From<PaddedVec3> for Vec3 {
    fn from(v: PaddedVec3) -> Self {
        Vec3::from_array(v.xyz)
    }
}

/// Copy `buffer` into host memory. Blocks until the GPU is done.
pub(crate) fn read_buffer<T: Pod>(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    buffer: &wgpu::Buffer,
) -> Result<Vec<T>, GpuError> {
    let size = buffer.size();
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Staging Buffer"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback Encoder"),
    });
    encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);

    match rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(GpuError::BufferMapping(e.to_string())),
        Err(e) => return Err(GpuError::BufferMapping(e.to_string())),
    }

    let values = {
        let data = slice.get_mapped_range();
        bytemuck::cast_slice::<u8, T>(&data).to_vec()
    };
    staging.unmap();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_struct_sizes() {
        // Must match the WGSL struct layouts in shaders.rs.
        assert_eq!(std::mem::size_of::<SimUniforms>(), 64);
        assert_eq!(std::mem::size_of::<RenderInstance>(), 64);
        assert_eq!(std::mem::size_of::<PaddedVec3>(), 16);
    }
}
