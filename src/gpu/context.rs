//! Device acquisition and fault capture.

use std::sync::{Arc, Mutex};

use crate::error::GpuError;

/// First fault reported by the device, shared with wgpu's callbacks.
#[derive(Clone, Default)]
struct FaultSlot(Arc<Mutex<Option<String>>>);

impl FaultSlot {
    fn record(&self, message: String) {
        if let Ok(mut slot) = self.0.lock() {
            if slot.is_none() {
                log::error!("GPU device fault: {}", message);
                *slot = Some(message);
            }
        }
    }

    fn get(&self) -> Option<String> {
        self.0.lock().ok().and_then(|slot| slot.clone())
    }
}

/// A wgpu device and queue plus the adapter they came from.
///
/// Uncaptured errors and device loss are recorded rather than panicking, so
/// the simulation can surface them as [`GpuError::DeviceFault`].
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    fault: FaultSlot,
}

impl GpuContext {
    /// Instance over the primary native backends.
    pub fn default_instance() -> wgpu::Instance {
        wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        })
    }

    /// Request an adapter (optionally able to present to `compatible_surface`)
    /// and a device on it.
    pub async fn new(
        instance: wgpu::Instance,
        compatible_surface: Option<&wgpu::Surface<'_>>,
    ) -> Result<Self, GpuError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("Using {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let fault = FaultSlot::default();
        {
            let fault = fault.clone();
            device.on_uncaptured_error(Box::new(move |error| fault.record(error.to_string())));
        }
        {
            let fault = fault.clone();
            device.set_device_lost_callback(move |reason, message| {
                fault.record(format!("device lost ({:?}): {}", reason, message));
            });
        }

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            fault,
        })
    }

    /// Context without a surface, for offscreen simulation and tests.
    pub async fn headless() -> Result<Self, GpuError> {
        Self::new(Self::default_instance(), None).await
    }

    /// The first fault the device reported, if any.
    pub fn fault(&self) -> Option<String> {
        self.fault.get()
    }
}
