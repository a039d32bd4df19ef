//! Configuration management (config dir: `sdf-forge/config.toml`)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub scene: SceneConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    #[serde(default)]
    pub fullscreen: bool,
    #[serde(default = "default_true")]
    pub vsync: bool,
    /// Two-pass offscreen composite (vignette) instead of direct rendering.
    #[serde(default = "default_true")]
    pub post_fx: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,
    #[serde(default = "default_focal_length")]
    pub focal_length: f32,
    #[serde(default = "default_fog_density")]
    pub fog_density: f32,
    #[serde(default = "default_ao_strength")]
    pub ao_strength: f32,
    #[serde(default = "default_shadow_sharpness")]
    pub shadow_sharpness: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Fractal kind name (see `FractalKind::from_name`).
    #[serde(default = "default_fractal")]
    pub fractal: String,
    #[serde(default)]
    pub dec_preview: bool,
    /// Last selected DEC snippet, as the user typed it.
    #[serde(default)]
    pub dec_snippet: Option<String>,
}

fn default_true() -> bool { true }
fn default_max_steps() -> u32 { 256 }
fn default_max_distance() -> f32 { 60.0 }
fn default_focal_length() -> f32 { 1.6 }
fn default_fog_density() -> f32 { 0.02 }
fn default_ao_strength() -> f32 { 1.0 }
fn default_shadow_sharpness() -> f32 { 12.0 }
fn default_fractal() -> String { "menger".to_string() }

impl Default for Config {
    fn default() -> Self {
        Self {
            video: VideoConfig::default(),
            quality: QualityConfig::default(),
            scene: SceneConfig::default(),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fullscreen: false,
            vsync: true,
            post_fx: true,
        }
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_distance: default_max_distance(),
            focal_length: default_focal_length(),
            fog_density: default_fog_density(),
            ao_strength: default_ao_strength(),
            shadow_sharpness: default_shadow_sharpness(),
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            fractal: default_fractal(),
            dec_preview: false,
            dec_snippet: None,
        }
    }
}

pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "sdf-forge", "sdf-forge")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

pub fn load() -> Config {
    config_dir()
        .and_then(|dir| std::fs::read_to_string(dir.join("config.toml")).ok())
        .and_then(|content| toml::from_str(&content).ok())
        .unwrap_or_default()
}

pub fn save(config: &Config) -> std::io::Result<()> {
    if let Some(dir) = config_dir() {
        std::fs::create_dir_all(&dir)?;
        let content = toml::to_string_pretty(config).expect("config serializes to TOML");
        std::fs::write(dir.join("config.toml"), content)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = Config::default();
        assert!(config.video.vsync);
        assert!(config.video.post_fx);
        assert_eq!(config.quality.max_steps, 256);
        assert_eq!(config.scene.fractal, "menger");
        assert!(!config.scene.dec_preview);
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.quality.max_steps, 256);
        assert!(config.video.vsync);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config: Config = toml::from_str("[quality]\nmax_steps = 64\n").unwrap();
        assert_eq!(config.quality.max_steps, 64);
        assert_eq!(config.quality.max_distance, 60.0);
        assert!(config.video.post_fx);
    }

    #[test]
    fn test_round_trip() {
        let mut config = Config::default();
        config.scene.dec_preview = true;
        config.scene.dec_snippet = Some("box.glsl".to_string());
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert!(parsed.scene.dec_preview);
        assert_eq!(parsed.scene.dec_snippet.as_deref(), Some("box.glsl"));
    }
}
