use super::*;

// =============================================================================
// Assembly tests
// =============================================================================

#[test]
fn test_base_source_has_no_include_tokens() {
    let ctx = ShaderContext::new();
    assert!(!ctx.base_source().contains("#include"));
}

#[test]
fn test_base_source_contains_fallback_entry() {
    let ctx = ShaderContext::new();
    assert!(ctx.base_source().contains("float decUserDE(vec3"));
}

#[test]
fn test_base_source_keeps_marker_lines() {
    // Markers survive assembly so later rebuilds can re-substitute fast.
    let ctx = ShaderContext::new();
    assert_eq!(ctx.base_source().matches(MARKER_BEGIN).count(), 1);
    assert_eq!(ctx.base_source().matches(MARKER_END).count(), 1);
}

#[test]
fn test_exactly_one_entry_definition_with_fallback() {
    let ctx = ShaderContext::new();
    assert_eq!(ctx.base_source().matches("float decUserDE(vec3").count(), 1);
}

#[test]
fn test_exactly_one_entry_definition_with_preview() {
    let mut ctx = ShaderContext::new();
    ctx.set_preview_enabled(true);
    ctx.select_snippet(Some("kalibox.glsl".to_string()));
    ctx.apply_dec_mapping();
    assert_eq!(ctx.base_source().matches("float decUserDE(vec3").count(), 1);
    assert!(ctx.base_source().contains(sanitize::SENTINEL_BEGIN));
}

#[test]
fn test_rebuild_bumps_generation() {
    let mut ctx = ShaderContext::new();
    let before = ctx.generation();
    ctx.apply_dec_mapping();
    assert_eq!(ctx.generation(), before + 1);
}

#[test]
fn test_preview_off_restores_fallback_shape() {
    let mut ctx = ShaderContext::new();
    ctx.set_preview_enabled(true);
    ctx.select_snippet(Some("gyroid_shell.glsl".to_string()));
    ctx.apply_dec_mapping();
    assert!(ctx.base_source().contains(sanitize::SENTINEL_BEGIN));

    ctx.set_preview_enabled(false);
    ctx.apply_dec_mapping();
    assert!(ctx.base_source().contains("Fallback user estimator"));
}

#[test]
fn test_unresolved_selection_falls_back_to_default() {
    let mut ctx = ShaderContext::new();
    ctx.set_preview_enabled(true);
    ctx.select_snippet(Some("definitely/not/registered.glsl".to_string()));
    ctx.apply_dec_mapping();
    // The default snippet is sanitized and injected instead of erroring.
    assert!(ctx.base_source().contains(sanitize::SENTINEL_BEGIN));
    assert_eq!(ctx.base_source().matches("float decUserDE(vec3").count(), 1);
}

#[test]
fn test_specialized_source_bakes_define() {
    let ctx = ShaderContext::new();
    for kind in FractalKind::ALL {
        let source = ctx.specialized_source(kind);
        assert!(source.starts_with("#version"));
        assert!(source.contains(&format!("#define FRACTAL_TYPE {}", kind.define_value())));
    }
}

#[test]
fn test_resolve_dec_key_is_exposed() {
    let ctx = ShaderContext::new();
    assert_eq!(
        ctx.resolve_dec_key("box.glsl"),
        Some("includes/dec/primitive/box.glsl")
    );
    assert_eq!(ctx.resolve_dec_key("nope.glsl"), None);
}

// =============================================================================
// Shader compilation tests (using naga)
// =============================================================================

fn validate_glsl(source: &str, stage: naga::ShaderStage, label: &str) {
    let mut frontend = naga::front::glsl::Frontend::default();
    let module = frontend
        .parse(&naga::front::glsl::Options::from(stage), source)
        .unwrap_or_else(|e| panic!("GLSL parse error for {label}: {e:?}"));

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .unwrap_or_else(|e| panic!("validation error for {label}: {e:?}"));
}

#[test]
fn test_compile_vertex_shader() {
    let ctx = ShaderContext::new();
    validate_glsl(ctx.vert_source(), naga::ShaderStage::Vertex, "fullscreen.vert");
}

#[test]
fn test_compile_all_fractal_kinds() {
    let ctx = ShaderContext::new();
    let mut errors = Vec::new();
    for kind in FractalKind::ALL {
        let source = ctx.specialized_source(kind);
        let result = std::panic::catch_unwind(|| {
            validate_glsl(&source, naga::ShaderStage::Fragment, kind.name());
        });
        if result.is_err() {
            errors.push(kind.name());
        }
    }
    assert!(
        errors.is_empty(),
        "shader compilation failed for kinds: {errors:?}"
    );
}

#[test]
fn test_compile_all_bundled_snippets() {
    // Every bundled snippet, sanitized and injected, must produce a shader
    // that naga accepts for the DEC preview specialization.
    let keys: Vec<String> = ShaderContext::new()
        .registry()
        .keys()
        .map(str::to_string)
        .collect();
    for key in keys {
        let mut ctx = ShaderContext::new();
        ctx.set_preview_enabled(true);
        ctx.select_snippet(Some(key.clone()));
        ctx.apply_dec_mapping();
        let source = ctx.specialized_source(FractalKind::UserDec);
        validate_glsl(&source, naga::ShaderStage::Fragment, &key);
    }
}

#[test]
fn test_post_shader_is_valid_wgsl() {
    let module = naga::front::wgsl::parse_str(chunks::POST_SHADER)
        .unwrap_or_else(|e| panic!("WGSL parse error for post.wgsl: {e:?}"));
    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .unwrap_or_else(|e| panic!("validation error for post.wgsl: {e:?}"));
}

#[test]
fn test_post_shader_has_entry_points() {
    assert!(chunks::POST_SHADER.contains("fn vs("));
    assert!(chunks::POST_SHADER.contains("fn fs("));
}
