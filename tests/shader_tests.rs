//! Built-in Shader Tests
//!
//! Every pass shader under `src/renderer/shaders/passes` is flattened through
//! the include preprocessor and validated with naga, without a GPU device.

use std::path::PathBuf;

use dusk::renderer::shader_cache::validate_wgsl;
use dusk::resources::Shader;
use dusk::{DuskError, RendererSettings};

const PASSES: [&str; 8] = [
    "shadow",
    "gbuffer",
    "lighting",
    "forward",
    "bloom_threshold",
    "kawase",
    "tonemap",
    "fxaa",
];

fn pass_path(name: &str) -> PathBuf {
    RendererSettings::default()
        .shader_dir
        .join("passes")
        .join(format!("{name}.wgsl"))
}

#[test]
fn every_pass_shader_validates() {
    for name in PASSES {
        let shader = Shader::load(name, pass_path(name)).unwrap_or_else(|e| panic!("{name}: {e}"));
        if let Err(err) = validate_wgsl(&shader) {
            panic!("{name} failed validation:\n{err}");
        }
    }
}

#[test]
fn pass_shaders_resolve_shared_chunks() {
    let shader = Shader::load("lighting", pass_path("lighting")).unwrap();
    let names: Vec<_> = shader
        .dependencies()
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();

    assert_eq!(names[0], "lighting.wgsl");
    for chunk in ["uniforms.wgsl", "fullscreen.wgsl", "pbr.wgsl", "shadow.wgsl"] {
        assert!(names.iter().any(|n| n == chunk), "missing {chunk} in {names:?}");
    }
}

#[test]
fn validation_errors_point_at_the_source_file() {
    let dir = std::env::temp_dir().join(format!("dusk-shader-invalid-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("broken_chunk.wgsl"), "fn broken() -> f32 {\n    return undefined_value;\n}").unwrap();
    std::fs::write(dir.join("main.wgsl"), "#include \"broken_chunk.wgsl\"").unwrap();

    let shader = Shader::load("broken", dir.join("main.wgsl")).unwrap();
    match validate_wgsl(&shader) {
        Err(DuskError::ShaderCompile { label, message }) => {
            assert_eq!(label, "broken");
            assert!(message.contains("broken_chunk.wgsl:2]"), "{message}");
        }
        other => panic!("expected a compile error, got {other:?}"),
    }
}
