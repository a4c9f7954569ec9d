//! The morph simulation: target sampling, GPU state, and the per-frame passes.
//!
//! A [`Simulation`] owns every GPU resource for one particle count. Its
//! lifecycle is `Uninitialized -> Ready -> Running`; a device fault at any
//! point moves it to `Faulted`, after which it must be rebuilt.

use std::fmt;
use std::sync::Arc;

use crate::color::ColorState;
use crate::config::{MorphConfig, MAX_PARTICLES};
use crate::error::{ConfigError, GpuError, SimulationError};
use crate::gpu::{
    read_buffer, ComputePasses, GpuContext, ParticleStore, RenderInstance, SimUniforms,
    TargetTextureGpu,
};
use crate::kernel::SlotState;
use crate::sampler::{TargetSampler, TargetTexture};
use crate::shape::{Palette, Shape, ShapeLibrary};

/// Where a [`Simulation`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Resources exist but Init has not run. Updates are rejected.
    Uninitialized,
    /// Init completed; no update has run since.
    Ready,
    /// At least one update has been submitted since the last Init.
    Running,
    /// The device reported a fault. Terminal.
    Faulted,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifecycle::Uninitialized => "uninitialized",
            Lifecycle::Ready => "ready",
            Lifecycle::Running => "running",
            Lifecycle::Faulted => "faulted",
        };
        f.write_str(name)
    }
}

/// A GPU particle cloud that morphs toward the selected shape.
///
/// # Example
///
/// ```ignore
/// let ctx = Arc::new(pollster::block_on(GpuContext::headless())?);
/// let mut sim = Simulation::new(ctx, MorphConfig::default(), ShapeLibrary::procedural())?;
/// sim.init()?;
/// loop {
///     sim.update(clock.tick().delta)?;
///     renderer.render(sim.context(), &camera, sim.instance_buffer(), sim.particle_count())?;
/// }
/// ```
pub struct Simulation {
    ctx: Arc<GpuContext>,
    library: ShapeLibrary,
    shape: Shape,
    sampler: TargetSampler,
    targets: TargetTexture,
    colors: ColorState,
    manual_palette: Palette,
    manual_colors: bool,
    jitter_strength: f32,
    store: ParticleStore,
    target_gpu: TargetTextureGpu,
    passes: ComputePasses,
    lifecycle: Lifecycle,
    frame: u32,
}

impl Simulation {
    /// Validate `config`, sample the initial shape, and allocate GPU state.
    ///
    /// Does not dispatch anything; call [`init`](Self::init) next.
    pub fn new(
        ctx: Arc<GpuContext>,
        config: MorphConfig,
        library: ShapeLibrary,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let limit = particle_limit(&ctx.device.limits());
        if config.particle_count > limit {
            return Err(ConfigError::TooManyParticles {
                requested: config.particle_count,
                max: limit,
            }
            .into());
        }
        let manual_palette = config.manual_colors.palette()?;
        let count = config.particle_count;

        let mut sampler = match config.sampler_seed {
            Some(seed) => TargetSampler::with_seed(seed),
            None => TargetSampler::new(),
        };
        let mut targets = TargetTexture::new(count);
        sample_shape(&mut sampler, &library, config.shape, &mut targets);

        let initial_palette = if config.manual_colors.enabled {
            manual_palette
        } else {
            config.shape.palette()
        };

        let store = ParticleStore::new(&ctx.device, count);
        let target_gpu = TargetTextureGpu::new(&ctx.device, targets.side());
        let passes = ComputePasses::new(&ctx.device, &store, &target_gpu);

        log::info!(
            "Created simulation: {} particles, {}x{} target texture, shape {}",
            count,
            targets.side(),
            targets.side(),
            config.shape
        );

        Ok(Self {
            ctx,
            library,
            shape: config.shape,
            sampler,
            targets,
            colors: ColorState::new(initial_palette),
            manual_palette,
            manual_colors: config.manual_colors.enabled,
            jitter_strength: config.jitter_strength,
            store,
            target_gpu,
            passes,
            lifecycle: Lifecycle::Uninitialized,
            frame: 0,
        })
    }

    /// Run the Init pass: scatter every slot and randomize its phase.
    ///
    /// Blocks until the GPU finishes. Calling it again restarts the
    /// simulation from a fresh scatter.
    pub fn init(&mut self) -> Result<(), SimulationError> {
        self.ensure_usable()?;

        let device = &self.ctx.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);

        self.target_gpu.sync(&self.ctx.queue, &mut self.targets);
        self.frame = 0;
        self.passes.write_uniforms(&self.ctx.queue, &self.uniforms(0.0));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Init Encoder"),
        });
        self.passes.encode_init(&mut encoder);
        self.passes.encode_derive(&mut encoder);
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        device.poll(wgpu::Maintain::Wait);

        let out_of_memory = pollster::block_on(device.pop_error_scope());
        let validation = pollster::block_on(device.pop_error_scope());
        if let Some(error) = validation.or(out_of_memory) {
            return Err(self.fault(error.to_string()));
        }
        self.check_device()?;

        self.lifecycle = Lifecycle::Ready;
        log::info!("Simulation {}", self.lifecycle);
        Ok(())
    }

    /// Advance every slot by `dt` seconds and refresh the render instances.
    ///
    /// Negative or non-finite `dt` is treated as zero, and a zero `dt` (a
    /// paused clock) submits nothing: the approach step is not scaled by
    /// `dt`, so dispatching it would keep particles moving. Work is
    /// submitted without waiting for completion.
    pub fn update(&mut self, dt: f32) -> Result<(), SimulationError> {
        self.ensure_usable()?;
        if self.lifecycle == Lifecycle::Uninitialized {
            return Err(SimulationError::NotInitialized);
        }
        self.check_device()?;

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        if dt == 0.0 {
            return Ok(());
        }
        let target = self.target_palette();
        self.colors.approach(&target, dt);

        self.target_gpu.sync(&self.ctx.queue, &mut self.targets);
        self.passes.write_uniforms(&self.ctx.queue, &self.uniforms(dt));

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Update Encoder"),
            });
        self.passes.encode_update(&mut encoder);
        self.passes.encode_derive(&mut encoder);
        self.ctx.queue.submit(std::iter::once(encoder.finish()));

        self.frame = self.frame.wrapping_add(1);
        if self.lifecycle == Lifecycle::Ready {
            self.lifecycle = Lifecycle::Running;
            log::info!("Simulation {}", self.lifecycle);
        }
        Ok(())
    }

    /// Switch the target shape and resample the target texture.
    ///
    /// Colors ease toward the new palette over the following frames.
    pub fn select_shape(&mut self, shape: Shape) {
        sample_shape(&mut self.sampler, &self.library, shape, &mut self.targets);
        if shape != self.shape {
            log::info!("Shape {} -> {}", self.shape, shape);
        }
        self.shape = shape;
    }

    /// [`select_shape`](Self::select_shape) by name. Unknown names leave
    /// the simulation untouched.
    pub fn select_shape_by_name(&mut self, name: &str) -> Result<(), ConfigError> {
        let shape: Shape = name.parse()?;
        self.select_shape(shape);
        Ok(())
    }

    /// [`select_shape`](Self::select_shape) by position in [`Shape::ALL`].
    pub fn select_shape_by_index(&mut self, index: u32) -> Result<(), ConfigError> {
        let shape = Shape::try_from(index)?;
        self.select_shape(shape);
        Ok(())
    }

    /// Use the manual palette instead of the shape palette.
    pub fn set_manual_colors_enabled(&mut self, enabled: bool) {
        self.manual_colors = enabled;
    }

    pub fn toggle_manual_colors(&mut self) -> bool {
        self.manual_colors = !self.manual_colors;
        self.manual_colors
    }

    /// Replace the manual palette with sRGB hex colors.
    pub fn set_manual_colors(
        &mut self,
        start: &str,
        end: &str,
        emissive_intensity: f32,
    ) -> Result<(), ConfigError> {
        self.manual_palette = Palette::from_hex(start, end, emissive_intensity)?;
        Ok(())
    }

    /// Scale the noise offset. `0.0` disables jitter.
    pub fn set_jitter_strength(&mut self, strength: f32) {
        self.jitter_strength = strength.max(0.0);
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn particle_count(&self) -> u32 {
        self.store.count()
    }

    pub fn manual_colors_enabled(&self) -> bool {
        self.manual_colors
    }

    /// The smoothed colors the next derive pass will use.
    pub fn colors(&self) -> &ColorState {
        &self.colors
    }

    /// The palette colors are easing toward.
    pub fn target_palette(&self) -> Palette {
        if self.manual_colors {
            self.manual_palette
        } else {
            self.shape.palette()
        }
    }

    /// Host copy of the target texture.
    pub fn targets(&self) -> &TargetTexture {
        &self.targets
    }

    /// Per-instance vertex buffer of [`RenderInstance`]s for the sink.
    pub fn instance_buffer(&self) -> &wgpu::Buffer {
        &self.passes.instance_buffer
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    /// Number of updates since the last Init.
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Copy particle state back to the host. Blocks.
    pub fn read_state(&self) -> Result<Vec<SlotState>, SimulationError> {
        self.ensure_initialized()?;
        Ok(self.store.read_back(&self.ctx.device, &self.ctx.queue)?)
    }

    /// Copy the derive pass output back to the host. Blocks.
    pub fn read_instances(&self) -> Result<Vec<RenderInstance>, SimulationError> {
        self.ensure_initialized()?;
        Ok(read_buffer(
            &self.ctx.device,
            &self.ctx.queue,
            &self.passes.instance_buffer,
        )?)
    }

    fn uniforms(&self, dt: f32) -> SimUniforms {
        let colors = self.colors.frame_colors();
        SimUniforms {
            start_color: colors.start.extend(1.0).to_array(),
            end_color: colors.end.extend(1.0).to_array(),
            delta_time: dt,
            emissive_intensity: colors.emissive_intensity,
            jitter_strength: self.jitter_strength,
            particle_count: self.store.count(),
            side: self.target_gpu.side(),
            frame: self.frame,
            _padding: [0; 2],
        }
    }

    fn ensure_usable(&self) -> Result<(), SimulationError> {
        match self.lifecycle {
            Lifecycle::Faulted => Err(SimulationError::Faulted),
            _ => Ok(()),
        }
    }

    fn ensure_initialized(&self) -> Result<(), SimulationError> {
        match self.lifecycle {
            Lifecycle::Faulted => Err(SimulationError::Faulted),
            Lifecycle::Uninitialized => Err(SimulationError::NotInitialized),
            Lifecycle::Ready | Lifecycle::Running => Ok(()),
        }
    }

    fn check_device(&mut self) -> Result<(), SimulationError> {
        match self.ctx.fault() {
            Some(message) => Err(self.fault(message)),
            None => Ok(()),
        }
    }

    fn fault(&mut self, message: String) -> SimulationError {
        log::error!("Simulation faulted: {}", message);
        self.lifecycle = Lifecycle::Faulted;
        SimulationError::Gpu(GpuError::DeviceFault(message))
    }
}

/// Largest particle count `limits` can hold.
///
/// The render instance buffer (64 bytes per slot) is the largest binding;
/// the target texture side is bounded by the 2D texture dimension.
pub fn particle_limit(limits: &wgpu::Limits) -> u32 {
    let per_slot = std::mem::size_of::<RenderInstance>() as u64;
    let by_binding = limits.max_storage_buffer_binding_size as u64 / per_slot;
    let by_buffer = limits.max_buffer_size / per_slot;
    let side = limits.max_texture_dimension_2d as u64;
    let by_texture = side * side;

    [by_binding, by_buffer, by_texture, MAX_PARTICLES as u64]
        .into_iter()
        .min()
        .unwrap_or(0) as u32
}

fn sample_shape(
    sampler: &mut TargetSampler,
    library: &ShapeLibrary,
    shape: Shape,
    targets: &mut TargetTexture,
) {
    match library.get(shape) {
        Some(mesh) => {
            sampler.sample(mesh, targets);
        }
        None => log::warn!("No mesh registered for {}; targets unchanged", shape),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_limit_default_device() {
        // 128 MiB storage binding / 64 bytes per render instance.
        assert_eq!(particle_limit(&wgpu::Limits::default()), 2_097_152);
    }

    #[test]
    fn test_particle_limit_caps_at_dispatch_limit() {
        let limits = wgpu::Limits {
            max_storage_buffer_binding_size: u32::MAX,
            max_buffer_size: u64::MAX,
            max_texture_dimension_2d: 65_536,
            ..wgpu::Limits::default()
        };
        assert_eq!(particle_limit(&limits), MAX_PARTICLES);
    }

    #[test]
    fn test_particle_limit_by_texture_side() {
        let limits = wgpu::Limits {
            max_texture_dimension_2d: 1024,
            ..wgpu::Limits::default()
        };
        assert_eq!(particle_limit(&limits), 1024 * 1024);
    }

    #[test]
    fn test_lifecycle_display() {
        assert_eq!(Lifecycle::Uninitialized.to_string(), "uninitialized");
        assert_eq!(Lifecycle::Faulted.to_string(), "faulted");
    }
}
