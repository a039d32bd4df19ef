//! SDF Forge graphics backend (wgpu)
//!
//! # Architecture
//!
//! **ShaderContext** (source assembly) -> **SpecializationCache** (one
//! pipeline per fractal kind) -> **Renderer** (per-frame bind + passes)
//!
//! The renderer owns all GPU resources. Fractal-kind switches and DEC
//! snippet rebuilds arrive as explicit calls from the app layer; nothing is
//! mutated from background tasks.
//!
//! # Resource Cleanup
//!
//! Cached materials live behind `Arc`s inside the specialization cache.
//! `invalidate_all` clears the map; wgpu resources release when the last
//! reference (usually the renderer's currently bound material) drops.

mod init;
mod renderer;
mod specialization;
mod uniforms;

pub use renderer::{Renderer, SpecializedMaterial};
pub use specialization::SpecializationCache;
pub use uniforms::Globals;
