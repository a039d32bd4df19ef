//! Shader assembly and variant management for SDF Forge.
//!
//! The raymarch fragment shader is assembled at runtime from embedded GLSL
//! chunks:
//!
//! - `include::resolve` flattens `#include` directives against the chunk map
//! - the marker region receives either a sanitized user snippet (DEC
//!   preview) or the fallback box estimator
//! - `specialized_source` bakes a `FRACTAL_TYPE` define per fractal kind;
//!   one pipeline per kind is held by the specialization cache in
//!   `graphics`
//!
//! Assembly is all-or-nothing: every call produces a complete shader
//! source, and a failed snippet lookup degrades to the fallback shape
//! instead of erroring. Rebuilds are synchronous with the caller; nothing
//! here runs off-thread.

pub mod chunks;
pub mod error;
pub mod include;
pub mod kinds;
pub mod registry;
pub mod sanitize;

#[cfg(test)]
mod tests;

pub use error::ShaderGenError;
pub use kinds::FractalKind;
pub use registry::{DEFAULT_KEY, SnippetRegistry};
pub use sanitize::{ENTRY_POINT, sanitize};

use hashbrown::HashMap;

/// Marker lines delimiting the sole injection region in the fragment
/// template.
pub const MARKER_BEGIN: &str = "// BEGIN DEC INJECT";
pub const MARKER_END: &str = "// END DEC INJECT";

/// DEC preview state. Mutated only by explicit toggle/select calls.
#[derive(Debug, Clone, Default)]
pub struct PreviewState {
    pub enabled: bool,
    pub selected_key: Option<String>,
}

/// Owns the include map, the snippet registry, the current assembled base
/// source, and the preview state. All shader management flows through this
/// context; there is no ambient global state.
pub struct ShaderContext {
    includes: HashMap<String, String>,
    registry: SnippetRegistry,
    preview: PreviewState,
    base_source: String,
    generation: u64,
}

impl ShaderContext {
    /// Build the context and assemble the initial base source (preview off,
    /// fallback shape in the marker region).
    pub fn new() -> Self {
        debug_assert_eq!(
            chunks::FRAG_TEMPLATE.matches(MARKER_BEGIN).count(),
            1,
            "fragment template must contain exactly one marker region"
        );
        let mut ctx = Self {
            includes: chunks::builtin_includes(),
            registry: SnippetRegistry::bundled(),
            preview: PreviewState::default(),
            base_source: String::new(),
            generation: 0,
        };
        ctx.base_source = ctx.assemble(None);
        tracing::info!(
            "assembled base shader: {} bytes, generation {}",
            ctx.base_source.len(),
            ctx.generation
        );
        ctx
    }

    /// Current assembled fragment source (includes resolved, marker region
    /// substituted, no specialization define yet).
    pub fn base_source(&self) -> &str {
        &self.base_source
    }

    /// Bumped on every rebuild; the specialization cache keys its validity
    /// on this.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Fullscreen-triangle vertex source (static, never reassembled).
    pub fn vert_source(&self) -> &'static str {
        chunks::VERT_SOURCE
    }

    pub fn registry(&self) -> &SnippetRegistry {
        &self.registry
    }

    pub fn preview(&self) -> &PreviewState {
        &self.preview
    }

    /// Toggle the DEC preview. The caller must follow up with
    /// [`ShaderContext::apply_dec_mapping`] to rebuild.
    pub fn set_preview_enabled(&mut self, enabled: bool) {
        self.preview.enabled = enabled;
    }

    /// Select a snippet by user-facing spec (resolved lazily at rebuild).
    pub fn select_snippet(&mut self, spec: Option<String>) {
        self.preview.selected_key = spec;
    }

    /// Diagnostic pass-through to the registry's key resolution.
    pub fn resolve_dec_key(&self, spec: &str) -> Option<&str> {
        self.registry.resolve_key(spec)
    }

    /// Re-resolve the current snippet selection, sanitize it, and reassemble
    /// the base source. Never fails: a resolution miss falls back to the
    /// default snippet, unusable snippet text degrades inside the sanitizer.
    ///
    /// The caller owns cache invalidation; this only produces the new source
    /// and bumps the generation.
    pub fn apply_dec_mapping(&mut self) {
        let injected = if self.preview.enabled {
            let key = self
                .preview
                .selected_key
                .as_deref()
                .and_then(|spec| self.registry.resolve_key(spec))
                .unwrap_or(registry::DEFAULT_KEY);
            tracing::info!("DEC preview active, snippet key: {}", key);
            self.registry.effective_source(key).map(sanitize::sanitize)
        } else {
            None
        };
        let rebuilt = self.assemble(injected.as_deref());
        self.base_source = rebuilt;
        self.generation += 1;
        tracing::debug!(
            "rebuilt base shader: {} bytes, generation {}",
            self.base_source.len(),
            self.generation
        );
    }

    /// Assemble a complete fragment source: resolve includes over the
    /// template, substitute the marker region with `injected` (or the
    /// fallback box), then resolve once more since injected content may
    /// itself use `#include`.
    pub fn assemble(&self, injected: Option<&str>) -> String {
        let resolved = include::resolve(chunks::FRAG_TEMPLATE, &self.includes);
        let block = injected.unwrap_or(chunks::DEC_DEFAULT);
        let substituted = match replace_marker_region(&resolved, block) {
            Some(s) => s,
            None => {
                tracing::warn!("marker region missing from template, skipping injection");
                resolved
            }
        };
        include::resolve(&substituted, &self.includes)
    }

    /// Base source with the `FRACTAL_TYPE` define for `kind` baked in,
    /// inserted directly below the `#version` line.
    pub fn specialized_source(&self, kind: FractalKind) -> String {
        let define = format!("#define FRACTAL_TYPE {}", kind.define_value());
        match self.base_source.find('\n') {
            Some(pos) if self.base_source.starts_with("#version") => {
                format!(
                    "{}\n{}{}",
                    &self.base_source[..pos],
                    define,
                    &self.base_source[pos..]
                )
            }
            _ => format!("{define}\n{}", self.base_source),
        }
    }
}

impl Default for ShaderContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace the content between the marker lines, keeping the markers.
/// Returns `None` when either marker is missing — the caller then skips
/// injection entirely rather than emitting a half-spliced source.
fn replace_marker_region(source: &str, block: &str) -> Option<String> {
    let begin = source.find(MARKER_BEGIN)?;
    let after_begin = begin + MARKER_BEGIN.len();
    let end = source[after_begin..].find(MARKER_END)? + after_begin;
    let mut out = String::with_capacity(source.len() + block.len());
    out.push_str(&source[..after_begin]);
    out.push('\n');
    out.push_str(block.trim_matches('\n'));
    out.push('\n');
    out.push_str(&source[end..]);
    Some(out)
}
