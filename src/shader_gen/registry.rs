//! Bundled DEC snippet registry and key resolution.
//!
//! Snippet sources are embedded at build time under path-like keys
//! (`includes/dec/<category>/<name>.glsl`). Keys are fixed for the session.
//! `resolve_key` accepts abbreviated or differently-rooted selections and
//! maps them onto a registered key; a miss means "use the default", never an
//! error.

use hashbrown::HashMap;

/// Canonical root all bundled keys live under.
const CANON_ROOT: &str = "includes/dec/";

/// Legacy root still seen in saved configs and older catalogs.
const ALT_ROOT: &str = "shaders/dec/";

/// Marker substring for suffix resolution: everything after the last
/// occurrence of this in a query is matched against key remainders.
const DEC_MARKER: &str = "dec/";

/// Key selected when no snippet was requested or resolution misses.
pub const DEFAULT_KEY: &str = "includes/dec/primitive/box.glsl";

const BUNDLE: &[(&str, &str)] = &[
    (
        "includes/dec/escape/bulb_power8.glsl",
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/snippets/escape/bulb_power8.glsl")),
    ),
    (
        "includes/dec/escape/hybrid_ifs.glsl",
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/snippets/escape/hybrid_ifs.glsl")),
    ),
    (
        "includes/dec/escape/kalibox.glsl",
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/snippets/escape/kalibox.glsl")),
    ),
    (
        "includes/dec/escape/quat_julia.glsl",
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/snippets/escape/quat_julia.glsl")),
    ),
    (
        "includes/dec/geometric/menger_lace.glsl",
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/snippets/geometric/menger_lace.glsl")),
    ),
    (
        "includes/dec/geometric/tetra_fold.glsl",
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/snippets/geometric/tetra_fold.glsl")),
    ),
    (
        "includes/dec/geometric/truchet_pipes.glsl",
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/snippets/geometric/truchet_pipes.glsl"
        )),
    ),
    (
        "includes/dec/kleinian/pseudo_kleinian.glsl",
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/snippets/kleinian/pseudo_kleinian.glsl"
        )),
    ),
    (
        "includes/dec/primitive/box.glsl",
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/snippets/primitive/box.glsl")),
    ),
    (
        "includes/dec/primitive/gyroid_shell.glsl",
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/snippets/primitive/gyroid_shell.glsl"
        )),
    ),
];

/// Curated wholesale replacements for snippets the generic sanitizer cannot
/// repair. Matchers are key suffixes; first match wins. This is a long-term
/// curation mechanism, not a stopgap — new unsalvageable catalog entries get
/// a row here instead of a special case in the sanitizer.
const OVERRIDES: &[(&str, &str)] = &[(
    "escape/hybrid_ifs.glsl",
    r"// Curated replacement for the broken hybrid IFS dump.
float de(vec3 p) {
    vec3 z = p;
    float s = 1.0;
    for (int i = 0; i < 8; i++) {
        z = abs(z) * 2.0 - vec3(1.0, 1.0, 0.7);
        s *= 2.0;
    }
    return (length(z) - 1.5) / s;
}
",
)];

/// Registry of snippet sources keyed by path-like strings.
pub struct SnippetRegistry {
    sources: HashMap<String, String>,
    /// Keys in sorted order, so tie-breaking during fuzzy resolution is
    /// deterministic regardless of map iteration order.
    keys: Vec<String>,
}

impl SnippetRegistry {
    /// Registry over the embedded snippet bundle.
    pub fn bundled() -> Self {
        Self::from_entries(BUNDLE.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    /// Registry over arbitrary entries. Used by diagnostics and tests.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        let sources: HashMap<String, String> = entries.into_iter().collect();
        let mut keys: Vec<String> = sources.keys().cloned().collect();
        keys.sort();
        Self { sources, keys }
    }

    /// All registered keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Raw source for an exact key.
    pub fn raw_source(&self, key: &str) -> Option<&str> {
        self.sources.get(key).map(String::as_str)
    }

    /// Source for an exact key, with the override table consulted first.
    pub fn effective_source(&self, key: &str) -> Option<&str> {
        if let Some((_, replacement)) = OVERRIDES.iter().find(|(suffix, _)| key.ends_with(suffix)) {
            tracing::debug!("snippet \"{}\" replaced by curated override", key);
            return Some(replacement);
        }
        self.raw_source(key)
    }

    /// Map a user-facing selection onto a registered key.
    ///
    /// Resolution order: exact match, prefix-normalized match, suffix match
    /// after the `dec/` marker, basename match. Ties within a rule go to the
    /// first key in sorted order. Returns `None` only when nothing matches;
    /// callers fall back to [`DEFAULT_KEY`].
    pub fn resolve_key(&self, spec: &str) -> Option<&str> {
        if self.sources.contains_key(spec) {
            return self.keys.iter().find(|k| *k == spec).map(String::as_str);
        }

        let normalized = normalize_prefix(spec);
        if let Some(key) = self.keys.iter().find(|k| **k == normalized) {
            return Some(key);
        }

        if let Some(idx) = normalized.rfind(DEC_MARKER) {
            let rest = &normalized[idx + DEC_MARKER.len()..];
            if !rest.is_empty() {
                if let Some(key) = self
                    .keys
                    .iter()
                    .find(|k| k.strip_prefix(CANON_ROOT).is_some_and(|tail| tail == rest))
                {
                    return Some(key);
                }
            }
        }

        let base = normalized.rsplit('/').next().unwrap_or(&normalized);
        if !base.is_empty() {
            if let Some(key) = self
                .keys
                .iter()
                .find(|k| k.rsplit('/').next() == Some(base))
            {
                return Some(key);
            }
        }

        tracing::warn!("snippet selection \"{}\" did not resolve to any key", spec);
        None
    }

    /// Next key after `current` in sorted order, wrapping around. Drives the
    /// snippet-cycling keybindings.
    pub fn next_key(&self, current: &str) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }
        let idx = self.keys.iter().position(|k| k == current);
        let next = match idx {
            Some(i) => (i + 1) % self.keys.len(),
            None => 0,
        };
        Some(self.keys[next].as_str())
    }

    /// Previous key before `current` in sorted order, wrapping around.
    pub fn prev_key(&self, current: &str) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }
        let idx = self.keys.iter().position(|k| k == current);
        let prev = match idx {
            Some(0) | None => self.keys.len() - 1,
            Some(i) => i - 1,
        };
        Some(self.keys[prev].as_str())
    }
}

/// Strip a leading `./` and rewrite the legacy root onto the canonical one.
fn normalize_prefix(spec: &str) -> String {
    let spec = spec.strip_prefix("./").unwrap_or(spec);
    if let Some(rest) = spec.strip_prefix(ALT_ROOT) {
        return format!("{CANON_ROOT}{rest}");
    }
    spec.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let reg = SnippetRegistry::bundled();
        assert_eq!(
            reg.resolve_key("includes/dec/primitive/box.glsl"),
            Some("includes/dec/primitive/box.glsl")
        );
    }

    #[test]
    fn test_dot_slash_prefix_is_normalized() {
        let reg = SnippetRegistry::bundled();
        assert_eq!(
            reg.resolve_key("./includes/dec/primitive/box.glsl"),
            Some("includes/dec/primitive/box.glsl")
        );
    }

    #[test]
    fn test_legacy_root_is_normalized() {
        let reg = SnippetRegistry::bundled();
        assert_eq!(
            reg.resolve_key("shaders/dec/escape/kalibox.glsl"),
            Some("includes/dec/escape/kalibox.glsl")
        );
    }

    #[test]
    fn test_suffix_match_after_marker() {
        let reg = SnippetRegistry::bundled();
        assert_eq!(
            reg.resolve_key("dec/kleinian/pseudo_kleinian.glsl"),
            Some("includes/dec/kleinian/pseudo_kleinian.glsl")
        );
    }

    #[test]
    fn test_basename_match() {
        let reg = SnippetRegistry::bundled();
        assert_eq!(
            reg.resolve_key("box.glsl"),
            Some("includes/dec/primitive/box.glsl")
        );
    }

    #[test]
    fn test_basename_match_on_foreign_root() {
        let reg = SnippetRegistry::from_entries([(
            "./includes/dec/primitive/box.glsl".to_string(),
            "float de(vec3 p){ return 0.0; }".to_string(),
        )]);
        assert_eq!(
            reg.resolve_key("box.glsl"),
            Some("./includes/dec/primitive/box.glsl")
        );
    }

    #[test]
    fn test_miss_returns_none() {
        let reg = SnippetRegistry::bundled();
        assert_eq!(reg.resolve_key("no/such/snippet.glsl"), None);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let reg = SnippetRegistry::bundled();
        let first = reg.resolve_key("box.glsl");
        for _ in 0..16 {
            assert_eq!(SnippetRegistry::bundled().resolve_key("box.glsl"), first);
        }
    }

    #[test]
    fn test_override_is_consulted() {
        let reg = SnippetRegistry::bundled();
        let src = reg.effective_source("includes/dec/escape/hybrid_ifs.glsl");
        assert!(src.is_some_and(|s| s.contains("Curated replacement")));
    }

    #[test]
    fn test_non_overridden_snippet_uses_raw_source() {
        let reg = SnippetRegistry::bundled();
        let src = reg.effective_source("includes/dec/primitive/box.glsl");
        assert_eq!(src, reg.raw_source("includes/dec/primitive/box.glsl"));
    }

    #[test]
    fn test_default_key_is_registered() {
        let reg = SnippetRegistry::bundled();
        assert!(reg.raw_source(DEFAULT_KEY).is_some());
    }

    #[test]
    fn test_key_cycling_wraps() {
        let reg = SnippetRegistry::bundled();
        let first = reg.keys().next().unwrap().to_string();
        let mut current = first.clone();
        for _ in 0..reg.keys().count() {
            current = reg.next_key(&current).unwrap().to_string();
        }
        assert_eq!(current, first);
    }
}
