//! Built-in WGSL utility functions shared by every compute entry point.
//!
//! Each function has a host twin in [`kernel`](crate::kernel); keep the two
//! in lockstep.
//!
//! # Available Functions
//!
//! ## Random & Hash
//! - `pcg_hash(n: u32) -> u32` - PCG output permutation
//! - `hash01(index: u32, seed: u32) -> f32` - Random float in [0, 1)
//! - `rand_value(index: u32, seed: u32, min: f32, max: f32) -> f32` - Random float in range
//!
//! ## Noise
//! - `noise3(p: vec3<f32>) -> f32` - 3D simplex noise in [-1, 1]
//! - `fractal_noise3(p: vec3<f32>) -> vec3<f32>` - 3-channel fractal noise

/// WGSL code for hash-derived random values.
///
/// Integer-only until the final conversion, which keeps 24 bits so the
/// float is exactly representable on any device.
pub const RANDOM_WGSL: &str = r#"
fn pcg_hash(n: u32) -> u32 {
    let state = n * 747796405u + 2891336453u;
    let word = ((state >> ((state >> 28u) + 4u)) ^ state) * 277803737u;
    return (word >> 22u) ^ word;
}

// Random float in [0, 1)
fn hash01(index: u32, seed: u32) -> f32 {
    let h = pcg_hash(index + pcg_hash(seed));
    return f32(h >> 8u) * (1.0 / 16777216.0);
}

// Random float in [min, max)
fn rand_value(index: u32, seed: u32, min_val: f32, max_val: f32) -> f32 {
    return min_val + hash01(index, seed) * (max_val - min_val);
}
"#;

/// WGSL code for gradient noise functions.
pub const NOISE_WGSL: &str = r#"
// Gradient noise helpers
fn mod289_3(x: vec3<f32>) -> vec3<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn mod289_4(x: vec4<f32>) -> vec4<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn permute4(x: vec4<f32>) -> vec4<f32> {
    return mod289_4(((x * 34.0) + 1.0) * x);
}

fn taylor_inv_sqrt4(r: vec4<f32>) -> vec4<f32> {
    return 1.79284291400159 - 0.85373472095314 * r;
}

// 3D Simplex noise
fn noise3(v: vec3<f32>) -> f32 {
    let C = vec2<f32>(1.0/6.0, 1.0/3.0);
    let D = vec4<f32>(0.0, 0.5, 1.0, 2.0);

    // First corner
    var i = floor(v + dot(v, vec3(C.y)));
    let x0 = v - i + dot(i, vec3(C.x));

    // Other corners
    let g = step(x0.yzx, x0.xyz);
    let l = 1.0 - g;
    let i1 = min(g.xyz, l.zxy);
    let i2 = max(g.xyz, l.zxy);

    let x1 = x0 - i1 + C.x;
    let x2 = x0 - i2 + C.y;
    let x3 = x0 - D.yyy;

    // Permutations
    i = mod289_3(i);
    let p = permute4(permute4(permute4(
        i.z + vec4<f32>(0.0, i1.z, i2.z, 1.0))
      + i.y + vec4<f32>(0.0, i1.y, i2.y, 1.0))
      + i.x + vec4<f32>(0.0, i1.x, i2.x, 1.0));

    // Gradients
    let n_ = 0.142857142857;
    let ns = n_ * D.wyz - D.xzx;

    let j = p - 49.0 * floor(p * ns.z * ns.z);

    let x_ = floor(j * ns.z);
    let y_ = floor(j - 7.0 * x_);

    let x = x_ * ns.x + ns.yyyy;
    let y = y_ * ns.x + ns.yyyy;
    let h = 1.0 - abs(x) - abs(y);

    let b0 = vec4<f32>(x.xy, y.xy);
    let b1 = vec4<f32>(x.zw, y.zw);

    let s0 = floor(b0) * 2.0 + 1.0;
    let s1 = floor(b1) * 2.0 + 1.0;
    let sh = -step(h, vec4<f32>(0.0));

    let a0 = b0.xzyw + s0.xzyw * sh.xxyy;
    let a1 = b1.xzyw + s1.xzyw * sh.zzww;

    var p0 = vec3<f32>(a0.xy, h.x);
    var p1 = vec3<f32>(a0.zw, h.y);
    var p2 = vec3<f32>(a1.xy, h.z);
    var p3 = vec3<f32>(a1.zw, h.w);

    // Normalize gradients
    let norm = taylor_inv_sqrt4(vec4<f32>(dot(p0,p0), dot(p1,p1), dot(p2,p2), dot(p3,p3)));
    p0 *= norm.x;
    p1 *= norm.y;
    p2 *= norm.z;
    p3 *= norm.w;

    // Mix final noise value
    var m = max(0.6 - vec4<f32>(dot(x0,x0), dot(x1,x1), dot(x2,x2), dot(x3,x3)), vec4<f32>(0.0));
    m = m * m;
    return 42.0 * dot(m*m, vec4<f32>(dot(p0,x0), dot(p1,x1), dot(p2,x2), dot(p3,x3)));
}

// Fractal noise with one decorrelated simplex channel per component.
// 3 octaves, lacunarity 2, diminish 0.5.
fn fractal_noise3(p: vec3<f32>) -> vec3<f32> {
    var result = vec3<f32>(0.0);
    var amplitude = 1.0;
    var pos = p;
    for (var octave = 0u; octave < 3u; octave++) {
        result += amplitude * vec3<f32>(
            noise3(pos),
            noise3(pos + vec3<f32>(31.416, -47.853, 12.793)),
            noise3(pos + vec3<f32>(-233.145, -113.408, -185.31))
        );
        amplitude *= 0.5;
        pos *= 2.0;
    }
    return result;
}
"#;

/// Get all built-in utility functions combined.
pub fn all_utils_wgsl() -> String {
    format!("// Built-in utility functions\n{}\n{}\n", RANDOM_WGSL, NOISE_WGSL)
}
