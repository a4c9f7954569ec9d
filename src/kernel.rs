//! Host-side reference of the per-slot GPU kernels.
//!
//! Every function here mirrors a WGSL function emitted by
//! [`shader_utils`](crate::shader_utils) and [`shaders`](crate::shaders)
//! operation for operation. The simulation never steps particles on the CPU;
//! this module exists so the kernels can be reasoned about and tested as
//! plain functions `update(state_i, constants_i, target_i, dt) -> state_i'`.
//!
//! # Hash contract
//!
//! Per-slot constants are not stored. Init and Update both recompute them
//! from `(index, seed)`, so the hash must give bit-identical results in
//! every pass. It is integer-only up to the final conversion, which keeps
//! the top 24 bits so the float is exact on every device.

use glam::{Vec2, Vec3, Vec3Swizzles, Vec4, Vec4Swizzles};

/// Seeds for the hash-derived per-slot values.
pub mod seeds {
    pub const SPAWN_X: u32 = 0;
    pub const SPAWN_Y: u32 = 1;
    pub const SPAWN_Z: u32 = 2;
    pub const INITIAL_AGE: u32 = 11;
    pub const SPEED: u32 = 12;
    pub const LIFETIME: u32 = 13;
    pub const ALPHA: u32 = 15;
    pub const OFFSET_SPEED: u32 = 16;
    pub const BASE_SCALE: u32 = 17;
    pub const VERTICAL_JITTER: u32 = 18;
}

/// Lower corner of the box particles are scattered in at Init.
pub const SCATTER_MIN: Vec3 = Vec3::new(-3.0, -5.0, -3.0);
/// Upper corner of the scatter box.
pub const SCATTER_MAX: Vec3 = Vec3::new(3.0, 3.0, 3.0);
/// Distance below which a particle stops approaching its target.
pub const ARRIVAL_EPSILON: f32 = 0.01;

pub const LIFETIME_RANGE: (f32, f32) = (0.1, 6.0);
pub const SPEED_RANGE: (f32, f32) = (0.01, 0.05);
pub const OFFSET_SPEED_RANGE: (f32, f32) = (0.01, 0.5);
pub const ALPHA_RANGE: (f32, f32) = (0.5, 1.0);
pub const BASE_SCALE_RANGE: (f32, f32) = (0.001, 0.01);
pub const VERTICAL_JITTER_RANGE: (f32, f32) = (-0.1, 0.1);

/// PCG output permutation of a single 32-bit state step.
#[inline]
pub fn pcg_hash(n: u32) -> u32 {
    let state = n.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277_803_737);
    (word >> 22) ^ word
}

/// Uniform value in `[0, 1)` derived from `(index, seed)`.
#[inline]
pub fn hash01(index: u32, seed: u32) -> f32 {
    let h = pcg_hash(index.wrapping_add(pcg_hash(seed)));
    (h >> 8) as f32 * (1.0 / 16_777_216.0)
}

/// Value in `[min, max)` derived from `(index, seed)`.
#[inline]
pub fn rand_value(index: u32, seed: u32, min: f32, max: f32) -> f32 {
    min + hash01(index, seed) * (max - min)
}

#[inline]
fn rand_in(index: u32, seed: u32, range: (f32, f32)) -> f32 {
    rand_value(index, seed, range.0, range.1)
}

/// Per-slot constants recomputed from the slot index on every pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotConstants {
    pub lifetime: f32,
    pub speed: f32,
    pub offset_speed: f32,
    pub alpha: f32,
    pub base_scale: f32,
}

impl SlotConstants {
    pub fn for_index(index: u32) -> Self {
        Self {
            lifetime: rand_in(index, seeds::LIFETIME, LIFETIME_RANGE),
            speed: rand_in(index, seeds::SPEED, SPEED_RANGE),
            offset_speed: rand_in(index, seeds::OFFSET_SPEED, OFFSET_SPEED_RANGE),
            alpha: rand_in(index, seeds::ALPHA, ALPHA_RANGE),
            base_scale: rand_in(index, seeds::BASE_SCALE, BASE_SCALE_RANGE),
        }
    }
}

/// Mutable state of one particle slot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SlotState {
    pub spawn_position: Vec3,
    pub offset_position: Vec3,
    pub age: f32,
}

/// Init kernel: scatter, zero offset, randomized phase.
pub fn init_slot(index: u32) -> SlotState {
    let spawn_position = Vec3::new(
        rand_value(index, seeds::SPAWN_X, SCATTER_MIN.x, SCATTER_MAX.x),
        rand_value(index, seeds::SPAWN_Y, SCATTER_MIN.y, SCATTER_MAX.y),
        rand_value(index, seeds::SPAWN_Z, SCATTER_MIN.z, SCATTER_MAX.z),
    );
    let lifetime = rand_in(index, seeds::LIFETIME, LIFETIME_RANGE);
    SlotState {
        spawn_position,
        offset_position: Vec3::ZERO,
        age: rand_value(index, seeds::INITIAL_AGE, 0.0, lifetime),
    }
}

/// Update kernel for one slot.
///
/// `jitter_strength` scales the noise offset; `0.0` disables it.
pub fn update_slot(index: u32, state: SlotState, target: Vec3, dt: f32, jitter_strength: f32) -> SlotState {
    let constants = SlotConstants::for_index(index);
    let mut next = state;

    let to_target = target - next.spawn_position;
    let distance = to_target.length();
    if distance > ARRIVAL_EPSILON {
        next.spawn_position += (to_target / distance) * constants.speed.min(distance);
    }

    next.offset_position += fractal_noise3(next.spawn_position * next.age)
        * constants.offset_speed
        * dt
        * jitter_strength;

    next.age += dt;

    if next.age > constants.lifetime {
        next.age = 0.0;
        next.offset_position = Vec3::ZERO;
    }
    next
}

/// Smoothed colors shared by every slot in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameColors {
    pub start: Vec3,
    pub end: Vec3,
    pub emissive_intensity: f32,
}

/// Render attributes of one slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotOutput {
    pub position: Vec3,
    pub color: Vec4,
    pub scale: Vec3,
    pub emissive: Vec3,
}

/// Derive kernel: render attributes from state and the frame's colors.
///
/// `frame` salts the vertical jitter so it is redrawn every frame.
pub fn derive_slot(index: u32, state: &SlotState, colors: &FrameColors, frame: u32) -> SlotOutput {
    let constants = SlotConstants::for_index(index);
    let progress = (state.age / constants.lifetime).clamp(0.0, 1.0);

    let jitter = rand_in(
        index,
        seeds::VERTICAL_JITTER.wrapping_add(frame),
        VERTICAL_JITTER_RANGE,
    );
    let rgb = colors.start.lerp(colors.end, progress);
    let shrink = 1.0 - smoothstep(0.0, 1.0, progress);

    SlotOutput {
        position: state.spawn_position + state.offset_position + Vec3::new(0.0, jitter, 0.0),
        color: rgb.extend(constants.alpha),
        scale: Vec3::splat(constants.base_scale * shrink),
        emissive: rgb * colors.emissive_intensity,
    }
}

#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

// Simplex noise, matching NOISE_WGSL.

fn mod289_3(x: Vec3) -> Vec3 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn mod289_4(x: Vec4) -> Vec4 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn permute4(x: Vec4) -> Vec4 {
    mod289_4((x * 34.0 + Vec4::ONE) * x)
}

fn taylor_inv_sqrt4(r: Vec4) -> Vec4 {
    Vec4::splat(1.792_842_9) - r * 0.853_734_7
}

fn step3(edge: Vec3, x: Vec3) -> Vec3 {
    Vec3::select(x.cmpge(edge), Vec3::ONE, Vec3::ZERO)
}

fn step4(edge: Vec4, x: Vec4) -> Vec4 {
    Vec4::select(x.cmpge(edge), Vec4::ONE, Vec4::ZERO)
}

/// 3D simplex noise in roughly `[-1, 1]`.
pub fn noise3(v: Vec3) -> f32 {
    let c = Vec2::new(1.0 / 6.0, 1.0 / 3.0);
    let d = Vec4::new(0.0, 0.5, 1.0, 2.0);

    let mut i = (v + Vec3::splat(v.dot(Vec3::splat(c.y)))).floor();
    let x0 = v - i + Vec3::splat(i.dot(Vec3::splat(c.x)));

    let g = step3(x0.yzx(), x0);
    let l = Vec3::ONE - g;
    let i1 = g.min(l.zxy());
    let i2 = g.max(l.zxy());

    let x1 = x0 - i1 + Vec3::splat(c.x);
    let x2 = x0 - i2 + Vec3::splat(c.y);
    let x3 = x0 - Vec3::splat(d.y);

    i = mod289_3(i);
    let p = permute4(
        permute4(
            permute4(Vec4::splat(i.z) + Vec4::new(0.0, i1.z, i2.z, 1.0))
                + Vec4::splat(i.y)
                + Vec4::new(0.0, i1.y, i2.y, 1.0),
        ) + Vec4::splat(i.x)
            + Vec4::new(0.0, i1.x, i2.x, 1.0),
    );

    let n_: f32 = 0.142_857_15;
    let ns = d.wyz() * n_ - d.xzx();

    let j = p - (p * ns.z * ns.z).floor() * 49.0;

    let x_ = (j * ns.z).floor();
    let y_ = (j - x_ * 7.0).floor();

    let x = x_ * ns.x + Vec4::splat(ns.y);
    let y = y_ * ns.x + Vec4::splat(ns.y);
    let h = Vec4::ONE - x.abs() - y.abs();

    let b0 = Vec4::new(x.x, x.y, y.x, y.y);
    let b1 = Vec4::new(x.z, x.w, y.z, y.w);

    let s0 = b0.floor() * 2.0 + Vec4::ONE;
    let s1 = b1.floor() * 2.0 + Vec4::ONE;
    let sh = -step4(h, Vec4::ZERO);

    let a0 = b0.xzyw() + s0.xzyw() * sh.xxyy();
    let a1 = b1.xzyw() + s1.xzyw() * sh.zzww();

    let p0 = Vec3::new(a0.x, a0.y, h.x);
    let p1 = Vec3::new(a0.z, a0.w, h.y);
    let p2 = Vec3::new(a1.x, a1.y, h.z);
    let p3 = Vec3::new(a1.z, a1.w, h.w);

    let norm = taylor_inv_sqrt4(Vec4::new(p0.dot(p0), p1.dot(p1), p2.dot(p2), p3.dot(p3)));
    let (p0, p1, p2, p3) = (p0 * norm.x, p1 * norm.y, p2 * norm.z, p3 * norm.w);

    let m = (Vec4::splat(0.6) - Vec4::new(x0.dot(x0), x1.dot(x1), x2.dot(x2), x3.dot(x3)))
        .max(Vec4::ZERO);
    let m = m * m;
    42.0 * (m * m).dot(Vec4::new(p0.dot(x0), p1.dot(x1), p2.dot(x2), p3.dot(x3)))
}

pub const FRACTAL_OCTAVES: u32 = 3;
pub const FRACTAL_LACUNARITY: f32 = 2.0;
pub const FRACTAL_DIMINISH: f32 = 0.5;

/// Decorrelation offsets for the y and z components of [`fractal_noise3`].
const NOISE_OFFSET_Y: Vec3 = Vec3::new(31.416, -47.853, 12.793);
const NOISE_OFFSET_Z: Vec3 = Vec3::new(-233.145, -113.408, -185.31);

/// Three-channel fractal noise (3 octaves, lacunarity 2, diminish 0.5).
pub fn fractal_noise3(p: Vec3) -> Vec3 {
    let mut result = Vec3::ZERO;
    let mut amplitude: f32 = 1.0;
    let mut pos = p;
    for _ in 0..FRACTAL_OCTAVES {
        result += amplitude
            * Vec3::new(
                noise3(pos),
                noise3(pos + NOISE_OFFSET_Y),
                noise3(pos + NOISE_OFFSET_Z),
            );
        amplitude *= FRACTAL_DIMINISH;
        pos *= FRACTAL_LACUNARITY;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcg_hash_known_values() {
        // Reference values of the PCG output permutation.
        assert_eq!(pcg_hash(0), 129_708_002);
        assert_ne!(pcg_hash(1), pcg_hash(2));
    }

    #[test]
    fn test_hash01_range() {
        for i in 0..10_000 {
            let v = hash01(i, 13);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_rand_value_is_pure() {
        for i in [0, 1, 42, 499_999, u32::MAX] {
            assert_eq!(
                rand_value(i, seeds::LIFETIME, 0.1, 6.0).to_bits(),
                rand_value(i, seeds::LIFETIME, 0.1, 6.0).to_bits()
            );
        }
    }

    #[test]
    fn test_neighbouring_seeds_are_decorrelated() {
        // Slot i+1 with seed s must not reuse slot i with seed s+1.
        let same = (0..1000)
            .filter(|&i| hash01(i + 1, seeds::SPAWN_X) == hash01(i, seeds::SPAWN_Y))
            .count();
        assert_eq!(same, 0);
    }

    #[test]
    fn test_slot_constants_in_range() {
        for i in 0..5000 {
            let c = SlotConstants::for_index(i);
            assert!(c.lifetime >= 0.1 && c.lifetime < 6.0);
            assert!(c.speed >= 0.01 && c.speed < 0.05);
            assert!(c.offset_speed >= 0.01 && c.offset_speed < 0.5);
            assert!(c.alpha >= 0.5 && c.alpha < 1.0);
            assert!(c.base_scale >= 0.001 && c.base_scale < 0.01);
        }
    }

    #[test]
    fn test_noise_is_bounded_and_varies() {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for i in 0..2000 {
            let p = Vec3::new(i as f32 * 0.173, i as f32 * 0.071, i as f32 * -0.113);
            let n = noise3(p);
            assert!(n.is_finite());
            assert!(n.abs() <= 1.1);
            min = min.min(n);
            max = max.max(n);
        }
        assert!(max - min > 0.5);
    }

    #[test]
    fn test_fractal_noise_is_deterministic() {
        let p = Vec3::new(0.3, -1.7, 2.2);
        assert_eq!(fractal_noise3(p), fractal_noise3(p));
        assert_ne!(fractal_noise3(p).x, fractal_noise3(p).y);
    }

    #[test]
    fn test_smoothstep() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_derive_at_birth_and_death() {
        let colors = FrameColors {
            start: Vec3::X,
            end: Vec3::Z,
            emissive_intensity: 2.0,
        };
        let c = SlotConstants::for_index(3);
        let born = SlotState {
            spawn_position: Vec3::ONE,
            offset_position: Vec3::ZERO,
            age: 0.0,
        };
        let out = derive_slot(3, &born, &colors, 0);
        assert_eq!(out.color.truncate(), Vec3::X);
        assert_eq!(out.color.w, c.alpha);
        assert!((out.scale.x - c.base_scale).abs() < 1e-9);
        assert_eq!(out.emissive, Vec3::X * 2.0);
        assert_eq!(out.position.x, 1.0);
        assert!((out.position.y - 1.0).abs() <= 0.1);

        let dying = SlotState { age: c.lifetime, ..born };
        let out = derive_slot(3, &dying, &colors, 0);
        assert_eq!(out.color.truncate(), Vec3::Z);
        assert_eq!(out.scale, Vec3::ZERO);
    }
}
