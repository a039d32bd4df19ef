/// Error type for shader specialization contract violations.
///
/// Sanitize/assemble themselves are total and never error; the only contract
/// a caller can break is asking for a fractal kind outside the known range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShaderGenError {
    /// Unknown fractal kind value
    #[error("unknown fractal kind {0} (must be 0-6)")]
    UnknownFractalKind(u32),
}
