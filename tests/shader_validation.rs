//! Generated WGSL must parse and validate with naga.

use naga::front::wgsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};
use pmorph::shaders::{self, DERIVE_ENTRY, INIT_ENTRY, UPDATE_ENTRY};

fn validate(source: &str) -> naga::Module {
    let module = match wgsl::parse_str(source) {
        Ok(module) => module,
        Err(e) => panic!("WGSL parse error:\n{}", e.emit_to_string(source)),
    };
    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
    if let Err(e) = validator.validate(&module) {
        panic!("WGSL validation error:\n{}", e.emit_to_string(source));
    }
    module
}

#[test]
fn test_compute_shader_validates() {
    let module = validate(&shaders::compute_shader());
    let entries: Vec<&str> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
    for name in [INIT_ENTRY, UPDATE_ENTRY, DERIVE_ENTRY] {
        assert!(entries.contains(&name), "missing entry point {name}");
    }
    for entry in &module.entry_points {
        assert_eq!(entry.stage, naga::ShaderStage::Compute);
        assert_eq!(entry.workgroup_size, [shaders::WORKGROUP_SIZE, 1, 1]);
    }
}

#[test]
fn test_render_shader_validates() {
    let module = validate(&shaders::render_shader());
    let stages: Vec<naga::ShaderStage> = module.entry_points.iter().map(|e| e.stage).collect();
    assert!(stages.contains(&naga::ShaderStage::Vertex));
    assert!(stages.contains(&naga::ShaderStage::Fragment));
}

#[test]
fn test_shader_utils_validate_standalone() {
    validate(&pmorph::shader_utils::all_utils_wgsl());
}
