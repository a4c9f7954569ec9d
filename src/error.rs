//! Error types for pmorph.
//!
//! Configuration problems are caught before any GPU state is touched. Device
//! faults are fatal to the simulation instance that observed them.

use std::fmt;

/// Errors raised while validating configuration or shape selections.
#[derive(Debug)]
pub enum ConfigError {
    /// The particle count was zero.
    ZeroParticles,
    /// The particle count exceeds what a single dispatch can cover.
    TooManyParticles { requested: u32, max: u32 },
    /// A shape name or index outside the closed shape enumeration.
    UnknownShape(String),
    /// A color string that is not `#rrggbb`.
    InvalidColor(String),
    /// Malformed JSON configuration.
    Parse(serde_json::Error),
    /// Failed to read a configuration file.
    Io(std::io::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroParticles => write!(f, "Particle count must be at least 1"),
            ConfigError::TooManyParticles { requested, max } => write!(
                f,
                "Particle count {} exceeds the maximum of {} for a single dispatch",
                requested, max
            ),
            ConfigError::UnknownShape(name) => write!(
                f,
                "Unknown shape '{}'. Expected one of: Fox, Book, Humanoid",
                name
            ),
            ConfigError::InvalidColor(s) => write!(f, "Invalid color '{}', expected #rrggbb", s),
            ConfigError::Parse(e) => write!(f, "Failed to parse configuration: {}", e),
            ConfigError::Io(e) => write!(f, "Failed to read configuration file: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(e) => Some(e),
            ConfigError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

/// Errors that can occur while acquiring or using the GPU.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// Failed to map buffer for reading.
    BufferMapping(String),
    /// The device rejected work or was lost. GPU state can no longer be trusted.
    DeviceFault(String),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::BufferMapping(msg) => write!(f, "Failed to map GPU buffer: {}", msg),
            GpuError::DeviceFault(msg) => write!(f, "GPU device fault: {}", msg),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur when driving a simulation.
#[derive(Debug)]
pub enum SimulationError {
    /// Invalid configuration or shape selection.
    Config(ConfigError),
    /// GPU acquisition or submission failed.
    Gpu(GpuError),
    /// Update was called before Init completed.
    NotInitialized,
    /// A previous device fault left this instance unusable. Rebuild it.
    Faulted,
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Config(e) => write!(f, "Configuration error: {}", e),
            SimulationError::Gpu(e) => write!(f, "GPU error: {}", e),
            SimulationError::NotInitialized => {
                write!(f, "Simulation is not initialized. Call init() before update().")
            }
            SimulationError::Faulted => write!(
                f,
                "Simulation faulted on an earlier device error and must be rebuilt"
            ),
            SimulationError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            SimulationError::Window(e) => write!(f, "Failed to create window: {}", e),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Config(e) => Some(e),
            SimulationError::Gpu(e) => Some(e),
            SimulationError::EventLoop(e) => Some(e),
            SimulationError::Window(e) => Some(e),
            SimulationError::NotInitialized | SimulationError::Faulted => None,
        }
    }
}

impl From<ConfigError> for SimulationError {
    fn from(e: ConfigError) -> Self {
        SimulationError::Config(e)
    }
}

impl From<GpuError> for SimulationError {
    fn from(e: GpuError) -> Self {
        SimulationError::Gpu(e)
    }
}

impl From<winit::error::EventLoopError> for SimulationError {
    fn from(e: winit::error::EventLoopError) -> Self {
        SimulationError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for SimulationError {
    fn from(e: winit::error::OsError) -> Self {
        SimulationError::Window(e)
    }
}
