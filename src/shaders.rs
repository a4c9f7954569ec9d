//! WGSL generation for the compute passes and the sprite sink.
//!
//! All three compute passes are entry points of one module so they share a
//! single compiled copy of `rand_value`; Init and Update must agree on every
//! slot's lifetime.

use crate::kernel::{self, seeds};
use crate::shader_utils;

/// Threads per compute workgroup.
pub const WORKGROUP_SIZE: u32 = 256;

pub const INIT_ENTRY: &str = "init_main";
pub const UPDATE_ENTRY: &str = "update_main";
pub const DERIVE_ENTRY: &str = "derive_main";

/// Format an f32 as a WGSL float literal.
fn lit(v: f32) -> String {
    format!("{:?}", v)
}

/// Generate the compute module holding the init, update and derive passes.
pub fn compute_shader() -> String {
    let utils = shader_utils::all_utils_wgsl();
    let (lifetime_min, lifetime_max) = (lit(kernel::LIFETIME_RANGE.0), lit(kernel::LIFETIME_RANGE.1));
    let (speed_min, speed_max) = (lit(kernel::SPEED_RANGE.0), lit(kernel::SPEED_RANGE.1));
    let (offset_min, offset_max) = (
        lit(kernel::OFFSET_SPEED_RANGE.0),
        lit(kernel::OFFSET_SPEED_RANGE.1),
    );
    let (alpha_min, alpha_max) = (lit(kernel::ALPHA_RANGE.0), lit(kernel::ALPHA_RANGE.1));
    let (scale_min, scale_max) = (lit(kernel::BASE_SCALE_RANGE.0), lit(kernel::BASE_SCALE_RANGE.1));
    let (jitter_min, jitter_max) = (
        lit(kernel::VERTICAL_JITTER_RANGE.0),
        lit(kernel::VERTICAL_JITTER_RANGE.1),
    );
    let (box_min, box_max) = (kernel::SCATTER_MIN, kernel::SCATTER_MAX);
    let (bx0, by0, bz0) = (lit(box_min.x), lit(box_min.y), lit(box_min.z));
    let (bx1, by1, bz1) = (lit(box_max.x), lit(box_max.y), lit(box_max.z));
    let epsilon = lit(kernel::ARRIVAL_EPSILON);
    let wg = WORKGROUP_SIZE;

    format!(
        r#"struct SimUniforms {{
    start_color: vec4<f32>,
    end_color: vec4<f32>,
    delta_time: f32,
    emissive_intensity: f32,
    jitter_strength: f32,
    particle_count: u32,
    side: u32,
    frame: u32,
    _padding0: u32,
    _padding1: u32,
}};

struct RenderInstance {{
    position: vec4<f32>,
    color: vec4<f32>,
    scale: vec4<f32>,
    emissive: vec4<f32>,
}};

@group(0) @binding(0)
var<storage, read_write> spawn_positions: array<vec3<f32>>;

@group(0) @binding(1)
var<storage, read_write> offset_positions: array<vec3<f32>>;

@group(0) @binding(2)
var<storage, read_write> ages: array<f32>;

@group(0) @binding(3)
var<uniform> uniforms: SimUniforms;

@group(0) @binding(4)
var target_positions: texture_2d<f32>;

@group(0) @binding(5)
var<storage, read_write> instances: array<RenderInstance>;

{utils}

const SEED_SPAWN_X: u32 = {spawn_x}u;
const SEED_SPAWN_Y: u32 = {spawn_y}u;
const SEED_SPAWN_Z: u32 = {spawn_z}u;
const SEED_INITIAL_AGE: u32 = {initial_age}u;
const SEED_SPEED: u32 = {speed}u;
const SEED_LIFETIME: u32 = {lifetime}u;
const SEED_ALPHA: u32 = {alpha}u;
const SEED_OFFSET_SPEED: u32 = {offset_speed}u;
const SEED_BASE_SCALE: u32 = {base_scale}u;
const SEED_VERTICAL_JITTER: u32 = {vertical_jitter}u;

const ARRIVAL_EPSILON: f32 = {epsilon};

fn lifetime_of(index: u32) -> f32 {{
    return rand_value(index, SEED_LIFETIME, {lifetime_min}, {lifetime_max});
}}

@compute @workgroup_size({wg})
fn {init_entry}(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let index = global_id.x;
    if index >= uniforms.particle_count {{
        return;
    }}

    spawn_positions[index] = vec3<f32>(
        rand_value(index, SEED_SPAWN_X, {bx0}, {bx1}),
        rand_value(index, SEED_SPAWN_Y, {by0}, {by1}),
        rand_value(index, SEED_SPAWN_Z, {bz0}, {bz1})
    );
    offset_positions[index] = vec3<f32>(0.0);
    ages[index] = rand_value(index, SEED_INITIAL_AGE, 0.0, lifetime_of(index));
}}

@compute @workgroup_size({wg})
fn {update_entry}(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let index = global_id.x;
    if index >= uniforms.particle_count {{
        return;
    }}

    let lifetime = lifetime_of(index);
    let speed = rand_value(index, SEED_SPEED, {speed_min}, {speed_max});
    let offset_speed = rand_value(index, SEED_OFFSET_SPEED, {offset_min}, {offset_max});
    let dt = uniforms.delta_time;

    let texel = vec2<u32>(index % uniforms.side, index / uniforms.side);
    let target_pos = textureLoad(target_positions, texel, 0).xyz;

    var spawn = spawn_positions[index];
    var offset = offset_positions[index];
    var age = ages[index];

    let to_target = target_pos - spawn;
    let dist = length(to_target);
    if dist > ARRIVAL_EPSILON {{
        spawn += (to_target / dist) * min(speed, dist);
    }}

    offset += fractal_noise3(spawn * age) * offset_speed * dt * uniforms.jitter_strength;

    age += dt;

    if age > lifetime {{
        age = 0.0;
        offset = vec3<f32>(0.0);
    }}

    spawn_positions[index] = spawn;
    offset_positions[index] = offset;
    ages[index] = age;
}}

@compute @workgroup_size({wg})
fn {derive_entry}(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let index = global_id.x;
    if index >= uniforms.particle_count {{
        return;
    }}

    let lifetime = lifetime_of(index);
    let alpha = rand_value(index, SEED_ALPHA, {alpha_min}, {alpha_max});
    let base_scale = rand_value(index, SEED_BASE_SCALE, {scale_min}, {scale_max});
    let jitter = rand_value(index, SEED_VERTICAL_JITTER + uniforms.frame, {jitter_min}, {jitter_max});

    let progress = clamp(ages[index] / lifetime, 0.0, 1.0);
    let rgb = mix(uniforms.start_color.rgb, uniforms.end_color.rgb, progress);
    let shrink = 1.0 - smoothstep(0.0, 1.0, progress);
    let position = spawn_positions[index] + offset_positions[index] + vec3<f32>(0.0, jitter, 0.0);

    var out: RenderInstance;
    out.position = vec4<f32>(position, 1.0);
    out.color = vec4<f32>(rgb, alpha);
    out.scale = vec4<f32>(vec3<f32>(base_scale * shrink), 0.0);
    out.emissive = vec4<f32>(rgb * uniforms.emissive_intensity, 0.0);
    instances[index] = out;
}}
"#,
        spawn_x = seeds::SPAWN_X,
        spawn_y = seeds::SPAWN_Y,
        spawn_z = seeds::SPAWN_Z,
        initial_age = seeds::INITIAL_AGE,
        speed = seeds::SPEED,
        lifetime = seeds::LIFETIME,
        alpha = seeds::ALPHA,
        offset_speed = seeds::OFFSET_SPEED,
        base_scale = seeds::BASE_SCALE,
        vertical_jitter = seeds::VERTICAL_JITTER,
        init_entry = INIT_ENTRY,
        update_entry = UPDATE_ENTRY,
        derive_entry = DERIVE_ENTRY,
    )
}

/// Generate the sprite render shader that draws [`RenderInstance`](crate::RenderInstance)s.
///
/// Camera-facing quads with a soft circular mask; emissive is added on top
/// of the masked color.
pub fn render_shader() -> String {
    r#"struct CameraUniforms {
    view_proj: mat4x4<f32>,
    right: vec4<f32>,
    up: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: CameraUniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) emissive: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec4<f32>,
    @location(1) color: vec4<f32>,
    @location(2) scale: vec4<f32>,
    @location(3) emissive: vec4<f32>,
) -> VertexOutput {
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-0.5, -0.5),
        vec2<f32>( 0.5, -0.5),
        vec2<f32>(-0.5,  0.5),
        vec2<f32>(-0.5,  0.5),
        vec2<f32>( 0.5, -0.5),
        vec2<f32>( 0.5,  0.5),
    );

    let corner = quad_vertices[vertex_index];
    let world_pos = position.xyz
        + camera.right.xyz * corner.x * scale.x
        + camera.up.xyz * corner.y * scale.y;

    var out: VertexOutput;
    out.clip_position = camera.view_proj * vec4<f32>(world_pos, 1.0);
    out.color = color;
    out.emissive = emissive.rgb;
    out.uv = corner + vec2<f32>(0.5);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let dist = length(in.uv - vec2<f32>(0.5));
    let circle = 1.0 - smoothstep(0.49, 0.5, dist);
    if circle <= 0.0 {
        discard;
    }
    let color = in.color * circle;
    return vec4<f32>(color.rgb + in.emissive * circle, color.a);
}
"#
    .to_string()
}
