//! Target sampling: which point of the shape each particle slot heads for.
//!
//! Targets live in a square RGBA32F texture of side `ceil(sqrt(N))`. Slot `i`
//! owns the texel at `col = i % side`, `row = i / side`. Texels past `N` stay
//! zeroed. The texture is rebuilt in full on every shape change and flagged
//! dirty so the GPU copy is re-uploaded before the next update reads it.

use glam::{Vec3, Vec4};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::shape::ShapeMesh;

/// Side of the square texture needed to hold `count` slots.
pub fn texture_side(count: u32) -> u32 {
    let mut side = (count as f64).sqrt().ceil() as u32;
    // Guard against float rounding at perfect squares.
    while side.saturating_mul(side) < count {
        side += 1;
    }
    while side > 1 && (side - 1) * (side - 1) >= count {
        side -= 1;
    }
    side
}

/// Texel `(col, row)` owned by slot `index`.
#[inline]
pub fn texel_coord(index: u32, side: u32) -> (u32, u32) {
    (index % side, index / side)
}

/// Host copy of the target positions texture.
#[derive(Debug, Clone)]
pub struct TargetTexture {
    count: u32,
    side: u32,
    texels: Vec<Vec4>,
    dirty: bool,
}

impl TargetTexture {
    /// A texture for `count` slots with every used target at the origin.
    pub fn new(count: u32) -> Self {
        let side = texture_side(count);
        let mut texels = vec![Vec4::ZERO; (side * side) as usize];
        for texel in texels.iter_mut().take(count as usize) {
            *texel = Vec4::W;
        }
        Self {
            count,
            side,
            texels,
            dirty: true,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    /// Target texel of slot `index`.
    pub fn target(&self, index: u32) -> Vec4 {
        let (col, row) = texel_coord(index, self.side);
        self.texels[(row * self.side + col) as usize]
    }

    /// All texels in row-major order.
    pub fn texels(&self) -> &[Vec4] {
        &self.texels
    }

    /// Raw bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }

    /// Whether the contents changed since the last [`mark_uploaded`](Self::mark_uploaded).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_uploaded(&mut self) {
        self.dirty = false;
    }
}

/// Fills a [`TargetTexture`] with random vertices of a shape.
pub struct TargetSampler {
    rng: SmallRng,
}

impl TargetSampler {
    /// Sampler seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Sampler with a fixed seed, for reproducible targets.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Replace every used texel with a vertex of `mesh`.
    ///
    /// Each slot picks a sub-mesh uniformly, then a vertex of it uniformly,
    /// with replacement. Sub-meshes without vertices are never picked. If the
    /// mesh has no vertices at all the texture is left untouched and `false`
    /// is returned.
    pub fn sample(&mut self, mesh: &ShapeMesh, texture: &mut TargetTexture) -> bool {
        let candidates: Vec<_> = mesh
            .sub_meshes()
            .iter()
            .filter(|sub| sub.vertex_count() > 0)
            .collect();

        if candidates.is_empty() {
            log::warn!(
                "Shape has no sampleable vertices; keeping previous targets for {} slots",
                texture.count
            );
            return false;
        }

        for index in 0..texture.count {
            let sub = candidates[self.rng.gen_range(0..candidates.len())];
            let vertex: Vec3 = sub.vertex(self.rng.gen_range(0..sub.vertex_count()));
            let (col, row) = texel_coord(index, texture.side);
            texture.texels[(row * texture.side + col) as usize] = vertex.extend(1.0);
        }
        texture.dirty = true;

        log::debug!(
            "Sampled {} targets from {} sub-meshes into a {}x{} texture",
            texture.count,
            candidates.len(),
            texture.side,
            texture.side
        );
        true
    }
}

impl Default for TargetSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::SubMesh;

    #[test]
    fn test_texture_side() {
        assert_eq!(texture_side(1), 1);
        assert_eq!(texture_side(4), 2);
        assert_eq!(texture_side(5), 3);
        assert_eq!(texture_side(9), 3);
        assert_eq!(texture_side(10), 4);
        assert_eq!(texture_side(500_000), 708);
    }

    #[test]
    fn test_texel_coord_round_trip() {
        for count in [1u32, 2, 7, 16, 17, 1000] {
            let side = texture_side(count);
            let mut seen = vec![false; (side * side) as usize];
            for i in 0..count {
                let (col, row) = texel_coord(i, side);
                assert!(col < side && row < side);
                assert_eq!(row * side + col, i);
                assert!(!seen[i as usize]);
                seen[i as usize] = true;
            }
        }
    }

    #[test]
    fn test_new_texture_defaults() {
        let texture = TargetTexture::new(5);
        assert_eq!(texture.side(), 3);
        assert_eq!(texture.texels().len(), 9);
        for i in 0..5 {
            assert_eq!(texture.target(i), Vec4::new(0.0, 0.0, 0.0, 1.0));
        }
        for texel in &texture.texels()[5..] {
            assert_eq!(*texel, Vec4::ZERO);
        }
        assert!(texture.is_dirty());
    }

    #[test]
    fn test_single_vertex_shape_fills_every_slot() {
        let mesh = ShapeMesh::from_flat(vec![1.0, 2.0, 3.0]);
        let mut texture = TargetTexture::new(4);
        texture.mark_uploaded();

        assert!(TargetSampler::with_seed(7).sample(&mesh, &mut texture));
        assert!(texture.is_dirty());
        for texel in texture.texels() {
            assert_eq!(*texel, Vec4::new(1.0, 2.0, 3.0, 1.0));
        }
    }

    #[test]
    fn test_empty_shape_is_noop() {
        let mut texture = TargetTexture::new(4);
        texture.mark_uploaded();
        let empty = ShapeMesh::new().with_sub_mesh(SubMesh::from_flat(Vec::new()));

        assert!(!TargetSampler::with_seed(1).sample(&ShapeMesh::new(), &mut texture));
        assert!(!TargetSampler::with_seed(1).sample(&empty, &mut texture));
        assert!(!texture.is_dirty());
        assert_eq!(texture.target(3), Vec4::W);
    }

    #[test]
    fn test_samples_only_mesh_vertices() {
        let mesh = ShapeMesh::from_points(&[Vec3::X, Vec3::Y])
            .with_sub_mesh(SubMesh::from_flat(Vec::new()))
            .with_sub_mesh(SubMesh::from_flat(vec![0.0, 0.0, -5.0]));
        let mut texture = TargetTexture::new(200);
        TargetSampler::with_seed(3).sample(&mesh, &mut texture);

        let allowed = [Vec3::X, Vec3::Y, Vec3::new(0.0, 0.0, -5.0)];
        let mut hits = [0usize; 3];
        for i in 0..200 {
            let t = texture.target(i).truncate();
            let k = allowed.iter().position(|a| *a == t).expect("target not from mesh");
            hits[k] += 1;
        }
        // Sub-mesh choice is uniform, so the lone vertex gets about half the slots.
        assert!(hits[2] > 60 && hits[2] < 140, "{hits:?}");
    }

    #[test]
    fn test_resample_replaces_contents() {
        let mut texture = TargetTexture::new(16);
        let mut sampler = TargetSampler::with_seed(11);
        sampler.sample(&ShapeMesh::from_points(&[Vec3::ONE]), &mut texture);
        sampler.sample(&ShapeMesh::from_points(&[Vec3::NEG_ONE]), &mut texture);
        for i in 0..16 {
            assert_eq!(texture.target(i), Vec3::NEG_ONE.extend(1.0));
        }
    }
}
