//! GPU copy of the target-position texture.

use crate::sampler::TargetTexture;

/// Square `Rgba32Float` texture read by the update pass with `textureLoad`.
pub(crate) struct TargetTextureGpu {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    side: u32,
}

impl TargetTextureGpu {
    pub fn new(device: &wgpu::Device, side: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Target Positions"),
            size: wgpu::Extent3d {
                width: side,
                height: side,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view, side }
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    /// Upload `texels` if they changed since the last upload.
    pub fn sync(&self, queue: &wgpu::Queue, texels: &mut TargetTexture) {
        if !texels.is_dirty() {
            return;
        }
        debug_assert_eq!(texels.side(), self.side);

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            texels.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.side * 16),
                rows_per_image: Some(self.side),
            },
            wgpu::Extent3d {
                width: self.side,
                height: self.side,
                depth_or_array_layers: 1,
            },
        );
        texels.mark_uploaded();
        log::debug!("Uploaded {}x{} target texture", self.side, self.side);
    }
}
