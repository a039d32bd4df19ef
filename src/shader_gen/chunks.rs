//! Embedded shader sources.
//!
//! All GLSL chunks referenced by the fragment template are compiled into the
//! binary and exposed through `builtin_includes()` as the include map. The
//! keys mirror the on-disk layout under `shaders/`.

use hashbrown::HashMap;

/// Raymarch fragment template (contains `#include` directives and the DEC
/// marker region).
pub const FRAG_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/shaders/raymarch.frag"
));

/// Fullscreen-triangle vertex shader.
pub const VERT_SOURCE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/shaders/fullscreen.vert"
));

/// WGSL post composite pass (offscreen scene -> surface, vignette).
pub const POST_SHADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/post.wgsl"));

/// Fallback box estimator substituted into the marker region when no user
/// snippet is active.
pub const DEC_DEFAULT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/shaders/include/dec_default.glsl"
));

const INCLUDE_CHUNKS: &[(&str, &str)] = &[
    (
        "include/common.glsl",
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/include/common.glsl")),
    ),
    (
        "include/primitives.glsl",
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/shaders/include/primitives.glsl"
        )),
    ),
    (
        "include/operators.glsl",
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/shaders/include/operators.glsl"
        )),
    ),
    (
        "include/dec_support.glsl",
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/shaders/include/dec_support.glsl"
        )),
    ),
    ("include/dec_default.glsl", DEC_DEFAULT),
    (
        "include/coloring.glsl",
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/shaders/include/coloring.glsl"
        )),
    ),
    (
        "include/fractals/menger.glsl",
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/shaders/include/fractals/menger.glsl"
        )),
    ),
    (
        "include/fractals/mandelbulb.glsl",
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/shaders/include/fractals/mandelbulb.glsl"
        )),
    ),
    (
        "include/fractals/mandelbox.glsl",
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/shaders/include/fractals/mandelbox.glsl"
        )),
    ),
    (
        "include/fractals/sierpinski.glsl",
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/shaders/include/fractals/sierpinski.glsl"
        )),
    ),
    (
        "include/fractals/world.glsl",
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/shaders/include/fractals/world.glsl"
        )),
    ),
    (
        "include/fractals/truchet.glsl",
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/shaders/include/fractals/truchet.glsl"
        )),
    ),
];

/// Build the include map for the assembler. Fixed at startup; the session
/// never mutates it.
pub fn builtin_includes() -> HashMap<String, String> {
    INCLUDE_CHUNKS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_chunks_are_non_empty() {
        for (key, source) in INCLUDE_CHUNKS {
            assert!(!source.trim().is_empty(), "chunk {} is empty", key);
        }
    }

    #[test]
    fn test_template_references_only_registered_chunks() {
        let includes = builtin_includes();
        for line in FRAG_TEMPLATE.lines() {
            let t = line.trim();
            if let Some(rest) = t.strip_prefix("#include ") {
                let path = rest.trim().trim_matches('"');
                assert!(includes.contains_key(path), "unregistered include {}", path);
            }
        }
    }

    #[test]
    fn test_template_has_exactly_one_marker_region() {
        assert_eq!(FRAG_TEMPLATE.matches(crate::shader_gen::MARKER_BEGIN).count(), 1);
        assert_eq!(FRAG_TEMPLATE.matches(crate::shader_gen::MARKER_END).count(), 1);
    }
}
