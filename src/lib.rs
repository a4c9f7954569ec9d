//! # pmorph - Particle Morph
//!
//! GPU particle clouds that morph into the silhouette of 3D shapes.
//!
//! Each frame, every particle steps toward a target point sampled from the
//! selected shape's vertices, drifts with fractal noise, ages, and respawns at
//! its current position when its lifetime runs out. Colors fade from a start
//! to an end color over each particle's life and ease between palettes when
//! the shape changes.
//!
//! ## Quick Start
//!
//! ```ignore
//! use pmorph::prelude::*;
//!
//! fn main() -> Result<(), SimulationError> {
//!     let config = MorphConfig::new()
//!         .with_particle_count(200_000)
//!         .with_shape(Shape::Fox);
//!     pmorph::run(config, ShapeLibrary::procedural())
//! }
//! ```
//!
//! ## Headless
//!
//! ```ignore
//! let ctx = Arc::new(pollster::block_on(GpuContext::headless())?);
//! let mut sim = Simulation::new(ctx, config, library)?;
//! sim.init()?;
//! sim.update(1.0 / 60.0)?;
//! let state = sim.read_state()?;
//! ```
//!
//! ## Pieces
//!
//! - [`TargetSampler`] fills a square [`TargetTexture`] with one random mesh
//!   vertex per particle.
//! - The init, update and derive compute passes live in one WGSL module
//!   ([`shaders::compute_shader`]). [`kernel`] mirrors them on the host for
//!   verification.
//! - The derive pass writes [`RenderInstance`]s that [`SpriteRenderer`] draws
//!   as additive billboards.
//!
//! Per-particle constants (speed, lifetime, opacity, scale) are never stored.
//! They are rehashed from the particle index every pass.

pub mod color;
pub mod config;
pub mod error;
pub mod gpu;
pub mod kernel;
pub mod sampler;
pub mod shader_utils;
pub mod shaders;
pub mod shape;
pub mod simulation;
pub mod time;
mod window;

pub use color::ColorState;
pub use config::{ManualColors, MorphConfig, MAX_PARTICLES};
pub use error::{ConfigError, GpuError, SimulationError};
pub use gpu::{Camera, GpuContext, RenderInstance, SpriteRenderer};
pub use sampler::{TargetSampler, TargetTexture};
pub use shape::{Palette, Shape, ShapeLibrary, ShapeMesh, SubMesh};
pub use simulation::{particle_limit, Lifecycle, Simulation};
pub use time::FrameClock;
pub use window::run;

pub use glam::{Vec3, Vec4};

/// Convenient imports for typical usage.
pub mod prelude {
    pub use crate::{
        run, Camera, ColorState, ConfigError, FrameClock, GpuContext, GpuError, Lifecycle,
        MorphConfig, Palette, RenderInstance, Shape, ShapeLibrary, ShapeMesh, Simulation,
        SimulationError, SpriteRenderer, SubMesh, TargetSampler, TargetTexture,
    };
    pub use glam::{Vec3, Vec4};
}
