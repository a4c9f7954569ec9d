//! Init, update and derive compute pipelines.

use wgpu::util::DeviceExt;

use super::{ParticleStore, RenderInstance, SimUniforms, TargetTextureGpu};
use crate::shaders::{self, DERIVE_ENTRY, INIT_ENTRY, UPDATE_ENTRY, WORKGROUP_SIZE};

/// The three compute passes and the resources they share.
///
/// All pipelines use one bind group: particle state, uniforms, the target
/// texture and the render instance buffer.
pub(crate) struct ComputePasses {
    init_pipeline: wgpu::ComputePipeline,
    update_pipeline: wgpu::ComputePipeline,
    derive_pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    /// Written by the derive pass, read by the sprite sink as instance data.
    pub instance_buffer: wgpu::Buffer,
    workgroups: u32,
}

fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: false },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl ComputePasses {
    pub fn new(device: &wgpu::Device, store: &ParticleStore, target: &TargetTextureGpu) -> Self {
        let count = store.count();

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sim Uniform Buffer"),
            contents: bytemuck::bytes_of(&SimUniforms::zeroed_for(count, target.side())),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Render Instance Buffer"),
            size: (count as u64) * std::mem::size_of::<RenderInstance>() as u64,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Compute Bind Group Layout"),
            entries: &[
                storage_entry(0),
                storage_entry(1),
                storage_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                storage_entry(5),
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Compute Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: store.spawn_positions.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: store.offset_positions.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: store.ages.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(&target.view),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: instance_buffer.as_entire_binding(),
                },
            ],
        });

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Morph Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::compute_shader().into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Compute Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let make_pipeline = |label: &str, entry_point: &str| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some(entry_point),
                compilation_options: Default::default(),
                cache: None,
            })
        };

        Self {
            init_pipeline: make_pipeline("Init Pipeline", INIT_ENTRY),
            update_pipeline: make_pipeline("Update Pipeline", UPDATE_ENTRY),
            derive_pipeline: make_pipeline("Derive Pipeline", DERIVE_ENTRY),
            bind_group,
            uniform_buffer,
            instance_buffer,
            workgroups: count.div_ceil(WORKGROUP_SIZE),
        }
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue, uniforms: &SimUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    pub fn encode_init(&self, encoder: &mut wgpu::CommandEncoder) {
        self.encode(encoder, "Init Pass", &self.init_pipeline);
    }

    pub fn encode_update(&self, encoder: &mut wgpu::CommandEncoder) {
        self.encode(encoder, "Update Pass", &self.update_pipeline);
    }

    pub fn encode_derive(&self, encoder: &mut wgpu::CommandEncoder) {
        self.encode(encoder, "Derive Pass", &self.derive_pipeline);
    }

    fn encode(&self, encoder: &mut wgpu::CommandEncoder, label: &str, pipeline: &wgpu::ComputePipeline) {
        let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(label),
            timestamp_writes: None,
        });
        compute_pass.set_pipeline(pipeline);
        compute_pass.set_bind_group(0, &self.bind_group, &[]);
        compute_pass.dispatch_workgroups(self.workgroups, 1, 1);
    }
}

impl SimUniforms {
    fn zeroed_for(particle_count: u32, side: u32) -> Self {
        Self {
            particle_count,
            side,
            ..bytemuck::Zeroable::zeroed()
        }
    }
}
