//! Per-slot particle state on the GPU.

use glam::Vec3;

use super::{read_buffer, PaddedVec3};
use crate::error::GpuError;
use crate::kernel::SlotState;

/// Spawn positions, noise offsets and ages for every slot.
///
/// The three arrays are parallel and sized to the particle count once.
/// Nothing but the init and update passes writes them.
pub(crate) struct ParticleStore {
    pub spawn_positions: wgpu::Buffer,
    pub offset_positions: wgpu::Buffer,
    pub ages: wgpu::Buffer,
    count: u32,
}

impl ParticleStore {
    pub fn new(device: &wgpu::Device, count: u32) -> Self {
        let vec3_size = (count as u64) * std::mem::size_of::<PaddedVec3>() as u64;
        let f32_size = (count as u64) * std::mem::size_of::<f32>() as u64;
        let usage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC;

        let make = |label: &str, size: u64| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage,
                mapped_at_creation: false,
            })
        };

        Self {
            spawn_positions: make("Spawn Positions", vec3_size),
            offset_positions: make("Offset Positions", vec3_size),
            ages: make("Ages", f32_size),
            count,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Copy every slot back to the host. Blocks.
    pub fn read_back(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Vec<SlotState>, GpuError> {
        let spawn = read_buffer::<PaddedVec3>(device, queue, &self.spawn_positions)?;
        let offset = read_buffer::<PaddedVec3>(device, queue, &self.offset_positions)?;
        let ages = read_buffer::<f32>(device, queue, &self.ages)?;

        Ok(spawn
            .into_iter()
            .zip(offset)
            .zip(ages)
            .map(|((spawn, offset), age)| SlotState {
                spawn_position: Vec3::from(spawn),
                offset_position: Vec3::from(offset),
                age,
            })
            .collect())
    }
}
