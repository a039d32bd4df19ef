//! Fractal variant keys.
//!
//! Each kind is baked into its own shader specialization via a compile-time
//! `FRACTAL_TYPE` define; there is no runtime branching between variants.

use super::error::ShaderGenError;

/// Fractal variant selector. The discriminant is the `FRACTAL_TYPE` value
/// baked into the specialized shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum FractalKind {
    Menger = 0,
    Mandelbulb = 1,
    Mandelbox = 2,
    Sierpinski = 3,
    World = 4,
    Truchet = 5,
    /// Live preview of the injected DEC snippet.
    UserDec = 6,
}

impl FractalKind {
    /// All kinds, in define-value order. Used for prewarming.
    pub const ALL: [FractalKind; 7] = [
        FractalKind::Menger,
        FractalKind::Mandelbulb,
        FractalKind::Mandelbox,
        FractalKind::Sierpinski,
        FractalKind::World,
        FractalKind::Truchet,
        FractalKind::UserDec,
    ];

    /// The `FRACTAL_TYPE` value for this kind.
    pub fn define_value(self) -> u32 {
        self as u32
    }

    /// # Errors
    ///
    /// Returns `ShaderGenError::UnknownFractalKind` for values outside 0-6.
    pub fn from_u32(value: u32) -> Result<Self, ShaderGenError> {
        match value {
            0 => Ok(FractalKind::Menger),
            1 => Ok(FractalKind::Mandelbulb),
            2 => Ok(FractalKind::Mandelbox),
            3 => Ok(FractalKind::Sierpinski),
            4 => Ok(FractalKind::World),
            5 => Ok(FractalKind::Truchet),
            6 => Ok(FractalKind::UserDec),
            other => Err(ShaderGenError::UnknownFractalKind(other)),
        }
    }

    /// Human-readable name, also accepted by `from_name`.
    pub fn name(self) -> &'static str {
        match self {
            FractalKind::Menger => "menger",
            FractalKind::Mandelbulb => "mandelbulb",
            FractalKind::Mandelbox => "mandelbox",
            FractalKind::Sierpinski => "sierpinski",
            FractalKind::World => "world",
            FractalKind::Truchet => "truchet",
            FractalKind::UserDec => "dec",
        }
    }

    /// Parse a CLI/config name, case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        Self::ALL.into_iter().find(|k| k.name() == lower)
    }
}
