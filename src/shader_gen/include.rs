//! Custom `#include` resolver for shader templates.
//!
//! Pure textual substitution: no GLSL-level validation happens here. Each
//! pass replaces every `#include "path"` directive with the registered chunk
//! (wrapped in begin/end marker comments) or, for unregistered paths, with a
//! comment noting the omission. Passes repeat until a fixed point so that
//! chunks may include other chunks.

use std::sync::OnceLock;

use hashbrown::HashMap;
use regex::{Captures, Regex};

/// Upper bound on resolution passes. Deep enough for any sane nesting;
/// terminates include cycles instead of spinning.
pub const MAX_INCLUDE_PASSES: usize = 12;

fn include_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"#include\s+"([^"]+)""#).expect("include regex is valid"))
}

/// Expand all `#include` directives in `template` against `includes`.
///
/// Missing includes are never fatal: some optional chunks are deliberately
/// absent unless a feature is enabled, so an unresolved path degrades to a
/// harmless comment.
pub fn resolve(template: &str, includes: &HashMap<String, String>) -> String {
    let mut source = template.to_string();
    for _ in 0..MAX_INCLUDE_PASSES {
        if !source.contains("#include") {
            break;
        }
        let mut changed = false;
        let resolved = include_re()
            .replace_all(&source, |caps: &Captures| {
                changed = true;
                let path = &caps[1];
                match includes.get(path) {
                    Some(chunk) => {
                        format!("// <<< begin include: {path}\n{chunk}\n// >>> end include: {path}")
                    }
                    None => {
                        tracing::warn!("include \"{}\" not registered, omitting", path);
                        format!("// include \"{path}\" omitted (not registered)")
                    }
                }
            })
            .into_owned();
        source = resolved;
        if !changed {
            break;
        }
    }
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_exact_include() {
        let includes = map(&[("a.glsl", "X")]);
        let out = resolve("#include \"a.glsl\"", &includes);
        assert!(out.contains('X'));
        assert!(!out.contains("#include"));
    }

    #[test]
    fn test_missing_include_degrades_to_comment() {
        let includes = map(&[]);
        let out = resolve("#include \"missing.glsl\"", &includes);
        assert!(!out.contains("#include"));
        assert!(out.contains("omitted"));
    }

    #[test]
    fn test_nested_includes() {
        let includes = map(&[("outer.glsl", "#include \"inner.glsl\""), ("inner.glsl", "DEEP")]);
        let out = resolve("#include \"outer.glsl\"", &includes);
        assert!(out.contains("DEEP"));
        assert!(!out.contains("#include"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let includes = map(&[("a.glsl", "float x = 1.0;")]);
        let once = resolve("#include \"a.glsl\"\nvoid main() {}", &includes);
        let twice = resolve(&once, &includes);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_include_cycle_terminates() {
        let includes = map(&[("a.glsl", "#include \"b.glsl\""), ("b.glsl", "#include \"a.glsl\"")]);
        // A cycle can never fully resolve; the pass bound just has to stop it.
        let out = resolve("#include \"a.glsl\"", &includes);
        assert!(out.contains("begin include"));
    }

    #[test]
    fn test_plain_source_passes_through() {
        let includes = map(&[("a.glsl", "X")]);
        let src = "void main() { }";
        assert_eq!(resolve(src, &includes), src);
    }
}
