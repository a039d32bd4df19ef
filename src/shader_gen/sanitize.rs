//! Snippet sanitizer: rewrites arbitrary third-party distance-estimator code
//! into a self-contained block exporting exactly one `decUserDE(vec3)`.
//!
//! The transformation is an ordered pipeline of named stages. Order matters:
//! later stages assume the normalization done by earlier ones. The pipeline
//! is total — for any input, including empty strings and non-GLSL garbage,
//! it produces a block with a usable entry point, falling back to a
//! unit-sphere stub as the last resort. Snippet text is untrusted; nothing
//! in here may panic or error out.
//!
//! Identifier rewrites are word-boundary aware and skip comments, so a
//! snippet that merely mentions `time` or `sdBox` in its commentary is left
//! readable.

use std::sync::OnceLock;

use regex::Regex;

/// The one name the rest of the shader calls into.
pub const ENTRY_POINT: &str = "decUserDE";

/// Sentinel lines wrapping every sanitized block, used for fast
/// re-substitution and stripped again if a block is re-sanitized.
pub const SENTINEL_BEGIN: &str = "// --- dec snippet begin ---";
pub const SENTINEL_END: &str = "// --- dec snippet end ---";

/// Name given to a `decUserDE` the *input* already claimed (stage 2). The
/// entry-point normalization in stage 10 may promote it back.
const RESERVED_RENAME: &str = "decUserDE_src";

/// First words of prose lines commonly left behind by documentation
/// scrapers. Lines starting with one of these outside any comment are
/// dropped.
const PROSE_STARTERS: &[&str] = &[
    "The", "This", "Note", "Source", "From", "See", "Based", "Author", "Original", "License",
    "Scraped", "Taken", "Found", "More", "Here", "It", "DO",
];

/// Whole-identifier aliases: math constants and the time-varying input are
/// redirected to reserved names the shared preamble provides, so snippets
/// compile without their original uniform bindings.
const SYMBOL_ALIASES: &[(&str, &str)] = &[
    ("PI", "DEC_PI"),
    ("TAU", "DEC_TAU"),
    ("PHI", "DEC_PHI"),
    ("time", "decTime"),
    ("iTime", "decTime"),
    ("iGlobalTime", "decTime"),
];

/// Constants the shared preamble already provides; snippet-local
/// redefinitions of these are removed to avoid duplicate-definition errors.
const PREAMBLE_MACROS: &[&str] = &["DEC_PI", "DEC_TAU", "DEC_PHI", "DEC_VERT_COUNT"];

/// Helper names already used elsewhere in the assembled shader. A snippet
/// defining one of these gets its definition and internal call sites renamed
/// to a `dec_` namespaced variant.
const HELPER_DENYLIST: &[&str] = &[
    "sdBox",
    "sdSphere",
    "sdTorus",
    "sdPlane",
    "opUnion",
    "opSubtract",
    "opIntersect",
    "opRep",
    "smin",
    "rot2",
    "hash",
    "noise",
    "fbm",
    "palette",
    "map",
    "calcNormal",
    "softShadow",
    "calcAO",
    "skyColor",
    "shade",
];

/// The conventional name of a snippet-local fold-vertex table. Rewritten to
/// the shared `decVerts` table provided by the assembled shader.
const VERTEX_TABLE_NAME: &str = "va";
const SHARED_VERTEX_TABLE: &str = "decVerts";

/// Run the full sanitation pipeline over raw snippet text.
///
/// Never fails; worst case the returned block contains the unit-sphere stub.
pub fn sanitize(raw: &str) -> String {
    let mut src = strip_pragmas(raw);
    src = retire_reserved_entry(&src);
    src = strip_prose(&src);
    src = repair_numeric_literals(&src);
    src = alias_symbols(&src);
    let (aliased, vert_count) = alias_vertex_table(&src);
    src = aliased;
    src = drop_duplicate_constants(&src);
    src = synthesize_header(&src);
    src = rename_colliding_helpers(&src);
    src = normalize_entry_point(&src);
    emit_block(&src, vert_count)
}

// ============================================================================
// Stage 1: pragma stripping / line-ending normalization
// ============================================================================

/// Remove `#version` / `precision` pragmas (meaningless inside an already
/// versioned shader), normalize CRLF, and strip any sentinel lines left over
/// from a previous sanitation pass.
fn strip_pragmas(raw: &str) -> String {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
    normalized
        .lines()
        .filter(|line| {
            let t = line.trim();
            !(t.starts_with("#version") || t.starts_with("precision ") || t == SENTINEL_BEGIN || t == SENTINEL_END)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Stage 2: reserved entry-point retirement
// ============================================================================

/// Rename a pre-existing `decUserDE` so the input cannot claim the reserved
/// export name before normalization decides the real entry point.
fn retire_reserved_entry(src: &str) -> String {
    rewrite_identifier(src, ENTRY_POINT, RESERVED_RENAME)
}

// ============================================================================
// Stage 3: stray prose removal
// ============================================================================

fn strip_prose(src: &str) -> String {
    let mut kept = Vec::new();
    let mut in_block = false;
    for line in src.lines() {
        let was_in_block = in_block;
        in_block = block_comment_state_after(line, in_block);
        if was_in_block {
            kept.push(line);
            continue;
        }
        let t = line.trim_start();
        if t.starts_with("//") || t.starts_with("/*") || t.starts_with('#') {
            kept.push(line);
            continue;
        }
        let word: String = t.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
        if !word.is_empty() && PROSE_STARTERS.contains(&word.as_str()) {
            continue;
        }
        kept.push(line);
    }
    kept.join("\n")
}

/// Track whether a block comment is still open after this line.
fn block_comment_state_after(line: &str, mut in_block: bool) -> bool {
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if in_block {
            if chars[i] == '*' && i + 1 < chars.len() && chars[i + 1] == '/' {
                in_block = false;
                i += 2;
                continue;
            }
            i += 1;
            continue;
        }
        if chars[i] == '/' && i + 1 < chars.len() {
            if chars[i + 1] == '/' {
                break;
            }
            if chars[i + 1] == '*' {
                in_block = true;
                i += 2;
                continue;
            }
        }
        i += 1;
    }
    in_block
}

// ============================================================================
// Stage 4: numeric literal repair
// ============================================================================

/// Fix integer literals in positions that require floats: the exponent of
/// `pow`, and components of `vec2/3/4` constructors.
fn repair_numeric_literals(src: &str) -> String {
    let mut out = rewrite_calls(src, "pow", &|args| {
        if args.len() == 2 && coerce_int(&mut args[1]) {
            return true;
        }
        false
    });
    for ctor in ["vec2", "vec3", "vec4"] {
        out = rewrite_calls(&out, ctor, &|args| {
            let mut changed = false;
            for arg in args.iter_mut() {
                changed |= coerce_int(arg);
            }
            changed
        });
    }
    out
}

/// If `arg` is a bare (optionally negated) integer literal, give it a
/// decimal point. Returns whether a change was made.
fn coerce_int(arg: &mut String) -> bool {
    let trimmed = arg.trim().to_string();
    let digits = trimmed.strip_prefix('-').unwrap_or(&trimmed);
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        *arg = format!("{trimmed}.0");
        return true;
    }
    false
}

// ============================================================================
// Stage 5: symbol aliasing
// ============================================================================

fn alias_symbols(src: &str) -> String {
    let mut out = src.to_string();
    for &(from, to) in SYMBOL_ALIASES {
        out = rewrite_identifier(&out, from, to);
    }
    out
}

// ============================================================================
// Stage 6: fold-vertex table aliasing
// ============================================================================

fn vertex_table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:const\s+)?vec3\s+va\s*\[\s*(\d+)\s*\]").expect("vertex table regex is valid")
    })
}

/// Replace a snippet-local `vec3 va[N]` table with the shared `decVerts`
/// table: the declaration is dropped (redeclaring the shared table would be
/// a compile error) and uses are renamed. Returns the declared size so the
/// preamble can emit a guarded `DEC_VERT_COUNT` for standalone use.
fn alias_vertex_table(src: &str) -> (String, Option<u32>) {
    let Some(caps) = vertex_table_re().captures(src) else {
        return (src.to_string(), None);
    };
    let count: u32 = caps[1].parse().unwrap_or(0);
    let m = caps.get(0).expect("capture 0 always present");
    let Some(semi) = src[m.end()..].find(';') else {
        // Declaration never terminates; leave it for the fallback paths.
        return (src.to_string(), None);
    };
    let mut stripped = String::with_capacity(src.len());
    stripped.push_str(&src[..m.start()]);
    stripped.push_str("// vertex table replaced by the shared decVerts table");
    stripped.push_str(&src[m.end() + semi + 1..]);
    let renamed = rewrite_identifier(&stripped, VERTEX_TABLE_NAME, SHARED_VERTEX_TABLE);
    (renamed, Some(count))
}

// ============================================================================
// Stage 7: duplicate constant removal
// ============================================================================

fn drop_duplicate_constants(src: &str) -> String {
    let kept: Vec<&str> = src
        .lines()
        .filter(|line| {
            let t = line.trim_start();
            for name in PREAMBLE_MACROS {
                if let Some(rest) = t.strip_prefix("#define ") {
                    if rest.trim_start().starts_with(name)
                        && !rest
                            .trim_start()
                            .chars()
                            .nth(name.len())
                            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
                    {
                        return false;
                    }
                }
                if is_const_float_def(t, name) {
                    return false;
                }
            }
            !is_const_float_def(t, "decTime")
        })
        .collect();
    kept.join("\n")
}

fn is_const_float_def(line: &str, name: &str) -> bool {
    let t = line.strip_prefix("const ").unwrap_or(line);
    let Some(rest) = t.strip_prefix("float ") else {
        return false;
    };
    let rest = rest.trim_start();
    rest.strip_prefix(name)
        .is_some_and(|after| after.trim_start().starts_with('='))
}

// ============================================================================
// Stage 8: header synthesis
// ============================================================================

fn prototype_echo_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*//\s*(float|int)\s+([A-Za-z_]\w*)\s*\(\s*((?:in\s+)?vec3\s+[A-Za-z_]\w*)\s*\)\s*$")
            .expect("prototype echo regex is valid")
    })
}

fn any_function_def_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:float|int|void|vec[234]|mat[234])\s+[A-Za-z_]\w*\s*\([^)]*\)\s*\{")
            .expect("function definition regex is valid")
    })
}

/// Some scraped snippets lost their signature line and carry it only as a
/// "prototype echo" comment at the top. When the code itself defines no
/// function, re-insert the declaration before the first non-comment line. A
/// parameter sharing the function's own name is illegal, so the *function*
/// is renamed (call sites updated), never the parameter.
fn synthesize_header(src: &str) -> String {
    if any_function_def_re().is_match(src) {
        return src.to_string();
    }

    let lines: Vec<&str> = src.lines().collect();
    let mut proto: Option<(String, String, String)> = None;
    let mut insert_at = lines.len();
    for (idx, line) in lines.iter().enumerate() {
        let t = line.trim_start();
        if t.is_empty() || t.starts_with("//") {
            if proto.is_none() {
                if let Some(caps) = prototype_echo_re().captures(line) {
                    proto = Some((caps[1].to_string(), caps[2].to_string(), caps[3].to_string()));
                }
            }
            continue;
        }
        insert_at = idx;
        break;
    }

    let Some((ret, mut name, params)) = proto else {
        return src.to_string();
    };

    let param_name = params
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .to_string();
    let mut body = src.to_string();
    if param_name == name {
        let renamed = format!("{name}Fn");
        // Only call sites (identifier followed by an open paren) move to the
        // new name; bare occurrences are uses of the parameter.
        body = rewrite_call_sites(&body, &name, &renamed);
        name = renamed;
    }

    let mut out_lines: Vec<String> = body.lines().map(str::to_string).collect();
    let header = format!("{ret} {name}({params}) {{");
    if insert_at >= out_lines.len() {
        out_lines.push(header);
    } else {
        out_lines.insert(insert_at, header);
    }
    out_lines.join("\n")
}

// ============================================================================
// Stage 9: helper-name collision avoidance
// ============================================================================

fn rename_colliding_helpers(src: &str) -> String {
    let mut out = src.to_string();
    for name in HELPER_DENYLIST {
        if defines_function(&out, name) {
            out = rewrite_identifier(&out, name, &format!("dec_{name}"));
        }
    }
    out
}

fn defines_function(src: &str, name: &str) -> bool {
    let pattern = format!(r"\b(?:float|int|void|vec[234]|mat[234])\s+{name}\s*\([^)]*\)\s*\{{");
    Regex::new(&pattern)
        .expect("helper definition regex is valid")
        .is_match(src)
}

// ============================================================================
// Stage 10: entry-point normalization
// ============================================================================

fn conventional_de_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bfloat\s+([A-Za-z_]\w*)\s*\(\s*(?:in\s+)?vec3\s+[A-Za-z_]\w*\s*\)\s*\{")
            .expect("conventional signature regex is valid")
    })
}

fn int_de_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bint\s+([A-Za-z_]\w*)\s*\(\s*(?:in\s+)?vec3\s+[A-Za-z_]\w*\s*\)\s*\{")
            .expect("scalar signature regex is valid")
    })
}

fn macro_de_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*#\s*define\s+([A-Za-z_]\w*)\s*\(\s*([A-Za-z_]\w*)\s*\)")
            .expect("macro definition regex is valid")
    })
}

/// Locate the snippet's own distance function and rename it to the reserved
/// entry point. Preference order: exact `float f(vec3)` signature (last
/// definition wins, earlier same-name duplicates are renamed, not deleted),
/// then a function-like macro, then any other single-vec3-argument scalar
/// function, then the unit-sphere stub. This stage cannot fail.
fn normalize_entry_point(src: &str) -> String {
    let defs: Vec<(std::ops::Range<usize>, String)> = conventional_de_re()
        .captures_iter(src)
        .map(|caps| {
            let name = caps.get(1).expect("group 1 always present");
            (name.range(), name.as_str().to_string())
        })
        .collect();

    if let Some((_, entry_name)) = defs.last().cloned() {
        let mut body = src.to_string();
        // Earlier definitions under the same name would collide once the
        // final one takes the reserved name; rename them in place. They may
        // still be called internally, so they are kept, not deleted.
        let duplicates: Vec<std::ops::Range<usize>> = defs[..defs.len() - 1]
            .iter()
            .filter(|(_, name)| *name == entry_name)
            .map(|(range, _)| range.clone())
            .collect();
        for (i, range) in duplicates.iter().enumerate().rev() {
            body.replace_range(range.clone(), &format!("{entry_name}_alt{i}"));
        }
        return rewrite_identifier(&body, &entry_name, ENTRY_POINT);
    }

    if let Some(caps) = macro_de_re().captures_iter(src).last() {
        let name = &caps[1];
        return format!(
            "{src}\n\nfloat {ENTRY_POINT}(vec3 p) {{\n    return float({name}(p));\n}}"
        );
    }

    if let Some(caps) = int_de_re().captures_iter(src).last() {
        let name = &caps[1];
        return format!(
            "{src}\n\nfloat {ENTRY_POINT}(vec3 p) {{\n    return float({name}(p));\n}}"
        );
    }

    tracing::warn!("no usable distance estimator found in snippet, emitting stub");
    let neutralized = src.replace(ENTRY_POINT, "decRetiredDE");
    format!(
        "{neutralized}\n\n// no usable distance estimator found; unit-sphere stub\nfloat {ENTRY_POINT}(vec3 p) {{\n    return length(p) - 1.0;\n}}"
    )
}

// ============================================================================
// Stage 11: preamble + sentinels
// ============================================================================

fn emit_block(body: &str, vert_count: Option<u32>) -> String {
    let mut out = String::with_capacity(body.len() + 256);
    out.push_str(SENTINEL_BEGIN);
    out.push('\n');
    out.push_str("#ifndef DEC_HAVE_TIME\n#define DEC_HAVE_TIME 1\nconst float decTime = 0.0;\n#endif\n");
    if let Some(n) = vert_count {
        out.push_str(&format!(
            "#ifndef DEC_VERT_COUNT\n#define DEC_VERT_COUNT {n}\n#endif\n"
        ));
    }
    out.push('\n');
    out.push_str(body.trim_matches('\n'));
    out.push('\n');
    out.push_str(SENTINEL_END);
    out.push('\n');
    out
}

// ============================================================================
// Lexical helpers
// ============================================================================

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Replace whole-identifier occurrences of `from` with `to`, skipping
/// comments. Substrings of longer identifiers are never touched.
fn rewrite_identifier(src: &str, from: &str, to: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let n = chars.len();
    let mut out = String::with_capacity(src.len());
    let mut i = 0;
    while i < n {
        let c = chars[i];
        if c == '/' && i + 1 < n && chars[i + 1] == '/' {
            while i < n && chars[i] != '\n' {
                out.push(chars[i]);
                i += 1;
            }
            continue;
        }
        if c == '/' && i + 1 < n && chars[i + 1] == '*' {
            out.push_str("/*");
            i += 2;
            while i < n {
                if chars[i] == '*' && i + 1 < n && chars[i + 1] == '/' {
                    out.push_str("*/");
                    i += 2;
                    break;
                }
                out.push(chars[i]);
                i += 1;
            }
            continue;
        }
        if is_ident_start(c) {
            let start = i;
            while i < n && is_ident_char(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            if word == from {
                out.push_str(to);
            } else {
                out.push_str(&word);
            }
            continue;
        }
        out.push(c);
        i += 1;
    }
    out
}

/// Rename only *call sites* of `from` (identifier immediately followed by an
/// open paren), leaving bare identifier uses alone.
fn rewrite_call_sites(src: &str, from: &str, to: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let n = chars.len();
    let mut out = String::with_capacity(src.len());
    let mut i = 0;
    while i < n {
        if is_ident_start(chars[i]) {
            let start = i;
            while i < n && is_ident_char(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let mut j = i;
            while j < n && chars[j].is_whitespace() {
                j += 1;
            }
            if word == from && j < n && chars[j] == '(' {
                out.push_str(to);
            } else {
                out.push_str(&word);
            }
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

/// Walk all calls of `callee`, split their arguments at top level, and let
/// `fix` mutate them. Calls are reassembled only when something changed, so
/// untouched code keeps its original formatting. Nested calls of the same
/// callee are handled recursively.
fn rewrite_calls(src: &str, callee: &str, fix: &dyn Fn(&mut Vec<String>) -> bool) -> String {
    let chars: Vec<char> = src.chars().collect();
    let n = chars.len();
    let mut out = String::with_capacity(src.len());
    let mut i = 0;
    while i < n {
        let c = chars[i];
        if c == '/' && i + 1 < n && (chars[i + 1] == '/' || chars[i + 1] == '*') {
            let line = chars[i + 1] == '/';
            out.push(c);
            out.push(chars[i + 1]);
            i += 2;
            while i < n {
                if line && chars[i] == '\n' {
                    break;
                }
                if !line && chars[i] == '*' && i + 1 < n && chars[i + 1] == '/' {
                    out.push_str("*/");
                    i += 2;
                    break;
                }
                out.push(chars[i]);
                i += 1;
            }
            continue;
        }
        if is_ident_start(c) {
            let start = i;
            while i < n && is_ident_char(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            if word == callee {
                let mut j = i;
                while j < n && chars[j].is_whitespace() {
                    j += 1;
                }
                if j < n && chars[j] == '(' {
                    let mut depth = 1;
                    let mut k = j + 1;
                    while k < n && depth > 0 {
                        if chars[k] == '(' {
                            depth += 1;
                        } else if chars[k] == ')' {
                            depth -= 1;
                        }
                        k += 1;
                    }
                    if depth == 0 {
                        let inner: String = chars[j + 1..k - 1].iter().collect();
                        let inner = rewrite_calls(&inner, callee, fix);
                        let mut args = split_top_level(&inner);
                        if fix(&mut args) {
                            out.push_str(&word);
                            out.push('(');
                            out.push_str(&args.join(", "));
                            out.push(')');
                        } else {
                            out.push_str(&word);
                            out.push('(');
                            out.push_str(&inner);
                            out.push(')');
                        }
                        i = k;
                        continue;
                    }
                }
            }
            out.push_str(&word);
            continue;
        }
        out.push(c);
        i += 1;
    }
    out
}

/// Split an argument list at commas not nested inside parentheses.
fn split_top_level(args: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in args.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() || !parts.is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn count_entry_declarations(block: &str) -> usize {
        block.matches("decUserDE(vec3").count()
    }

    #[test]
    fn test_simple_de_is_renamed() {
        let out = sanitize("float de(vec3 p){ return length(p)-1.0; }");
        assert!(out.contains("float decUserDE(vec3 p){ return length(p)-1.0; }"));
        assert!(!out.contains("float de(vec3"));
    }

    #[test]
    fn test_integer_pow_exponent_is_coerced() {
        let out = sanitize("float de(vec3 p){ return pow(length(p), 2) - 1.0; }");
        assert!(out.contains("pow(length(p), 2.0)"));
    }

    #[test]
    fn test_vector_constructor_components_are_coerced() {
        let out = sanitize("float de(vec3 p){ return length(p - vec3(1, 0, -2)) - 1.0; }");
        assert!(out.contains("vec3(1.0, 0.0, -2.0)"));
    }

    #[test]
    fn test_float_constructor_components_untouched() {
        let out = sanitize("float de(vec3 p){ return length(p - vec3(1.0, x, 0.5)) - 1.0; }");
        assert!(out.contains("vec3(1.0, x, 0.5)"));
    }

    #[test]
    fn test_colliding_helper_is_namespaced() {
        let src = "float sdBox(vec3 p, vec3 b){ vec3 q = abs(p) - b; return length(max(q, vec3(0.0))); }\nfloat de(vec3 p){ return sdBox(p, vec3(1.0, 1.0, 1.0)); }";
        let out = sanitize(src);
        assert!(out.contains("float dec_sdBox(vec3 p"));
        assert!(out.contains("dec_sdBox(p,"));
        assert!(!out.contains("float sdBox(vec3"));
    }

    #[test]
    fn test_constants_and_time_are_aliased() {
        let out = sanitize("float de(vec3 p){ return length(p) - 1.0 + 0.1 * sin(time * PI); }");
        assert!(out.contains("sin(decTime * DEC_PI)"));
        assert!(!out.contains("* PI)"));
    }

    #[test]
    fn test_alias_is_word_boundary_aware() {
        let out = sanitize("float de(vec3 p){ float timeline = 1.0; return length(p) - timeline; }");
        assert!(out.contains("timeline"));
        assert!(!out.contains("decTimeline"));
    }

    #[test]
    fn test_alias_skips_comments() {
        let out = sanitize("// uses time for wobble\nfloat de(vec3 p){ return length(p) - 1.0; }");
        assert!(out.contains("// uses time for wobble"));
    }

    #[test]
    fn test_preexisting_entry_name_is_retired_then_promoted() {
        let out = sanitize("float decUserDE(vec3 p){ return length(p) - 0.5; }");
        assert_eq!(count_entry_declarations(&out), 1);
        assert!(out.contains("float decUserDE(vec3 p){ return length(p) - 0.5; }"));
    }

    #[test]
    fn test_prose_lines_are_stripped() {
        let src = "Source: forum mirror.\nThe author explains the fold below.\nfloat de(vec3 p){ return length(p)-1.0; }";
        let out = sanitize(src);
        assert!(!out.contains("forum mirror"));
        assert!(!out.contains("explains"));
        assert!(out.contains("decUserDE"));
    }

    #[test]
    fn test_version_and_precision_pragmas_are_stripped() {
        let src = "#version 300 es\nprecision highp float;\nfloat de(vec3 p){ return length(p)-1.0; }";
        let out = sanitize(src);
        assert!(!out.contains("#version"));
        assert!(!out.contains("precision"));
    }

    #[test]
    fn test_duplicate_pi_define_is_dropped() {
        let src = "#define PI 3.14159\nfloat de(vec3 p){ return length(p) - PI * 0.1; }";
        let out = sanitize(src);
        assert!(!out.contains("#define DEC_PI"));
        assert!(out.contains("DEC_PI * 0.1"));
    }

    #[test]
    fn test_vertex_table_is_redirected() {
        let src = "const vec3 va[4] = vec3[4](vec3(1.0, 0.0, 0.0), vec3(0.0, 1.0, 0.0), vec3(0.0, 0.0, 1.0), vec3(1.0, 1.0, 1.0));\nfloat de(vec3 p){ return length(p - va[0]) - 1.0; }";
        let out = sanitize(src);
        assert!(!out.contains("vec3 va["));
        assert!(out.contains("decVerts[0]"));
        assert!(out.contains("#ifndef DEC_VERT_COUNT"));
        assert!(out.contains("#define DEC_VERT_COUNT 4"));
    }

    #[test]
    fn test_header_synthesis_from_prototype_echo() {
        let src = "// float deBulb(vec3 p)\n// header lost in the paste\n    return length(p) - 1.0;\n}";
        let out = sanitize(src);
        assert!(out.contains("float decUserDE(vec3 p) {"));
        assert_eq!(count_entry_declarations(&out), 1);
    }

    #[test]
    fn test_header_synthesis_renames_function_on_param_collision() {
        let src = "// float fold(vec3 fold)\n    return length(fold) - 1.0;\n}";
        let out = sanitize(src);
        // The parameter keeps its name; the function is renamed and then
        // normalized into the entry point.
        assert!(out.contains("float decUserDE(vec3 fold) {"));
        assert!(out.contains("length(fold)"));
    }

    #[test]
    fn test_last_definition_wins_and_duplicates_survive() {
        let src = "float de(vec3 p){ return length(p) - 1.0; }\nfloat de(vec3 p){ return length(p) - 2.0; }";
        let out = sanitize(src);
        assert!(out.contains("float decUserDE(vec3 p){ return length(p) - 2.0; }"));
        assert!(out.contains("de_alt0"));
        assert_eq!(count_entry_declarations(&out), 1);
    }

    #[test]
    fn test_macro_definition_gets_bridge() {
        let src = "#define DE(p) (length(p) - 1.0)";
        let out = sanitize(src);
        assert!(out.contains("return float(DE(p));"));
        assert_eq!(count_entry_declarations(&out), 1);
    }

    #[test]
    fn test_int_returning_function_gets_bridge() {
        let src = "int voxelDist(vec3 p){ return 1; }";
        let out = sanitize(src);
        assert!(out.contains("return float(voxelDist(p));"));
        assert_eq!(count_entry_declarations(&out), 1);
    }

    #[test]
    fn test_garbage_input_yields_stub() {
        let out = sanitize("this is not even remotely a shader ~~ 12 $$");
        assert_eq!(count_entry_declarations(&out), 1);
        assert!(out.contains("length(p) - 1.0"));
    }

    #[test]
    fn test_empty_input_yields_stub() {
        let out = sanitize("");
        assert!(!out.is_empty());
        assert_eq!(count_entry_declarations(&out), 1);
    }

    #[test]
    fn test_sanitize_is_total_on_own_output() {
        let once = sanitize("float de(vec3 p){ return length(p)-1.0; }");
        let twice = sanitize(&once);
        assert_eq!(count_entry_declarations(&twice), 1);
        assert!(twice.contains(SENTINEL_BEGIN));
    }

    #[test]
    fn test_output_is_wrapped_in_sentinels() {
        let out = sanitize("float de(vec3 p){ return length(p)-1.0; }");
        assert!(out.starts_with(SENTINEL_BEGIN));
        assert!(out.trim_end().ends_with(SENTINEL_END));
    }

    #[test]
    fn test_crlf_input_is_normalized() {
        let out = sanitize("float de(vec3 p){\r\n    return length(p)-1.0;\r\n}");
        assert!(!out.contains('\r'));
        assert_eq!(count_entry_declarations(&out), 1);
    }
}
