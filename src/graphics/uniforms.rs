//! Uniform table for the raymarch pass.
//!
//! Layout must match the `Globals` block in `shaders/raymarch.frag`.
//! Everything is packed into vec4s so std140 padding cannot drift.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Globals {
    /// xy = render resolution, z = time in seconds, w unused
    pub resolution_time: [f32; 4],
    /// xyz = camera origin
    pub cam_pos: [f32; 4],
    /// xyz = camera look-at target
    pub cam_target: [f32; 4],
    /// x = max march steps, y = max march distance, z = focal length
    pub params: [f32; 4],
    /// x = fog density, y = AO strength, z = shadow sharpness
    pub quality: [f32; 4],
}

impl Globals {
    pub const SIZE: u64 = std::mem::size_of::<Globals>() as u64;

    pub fn new() -> Self {
        Self {
            resolution_time: [1.0, 1.0, 0.0, 0.0],
            cam_pos: [0.0, 0.0, -4.0, 0.0],
            cam_target: [0.0; 4],
            params: [256.0, 60.0, 1.6, 0.0],
            quality: [0.02, 1.0, 12.0, 0.0],
        }
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.resolution_time[0] = width.max(1) as f32;
        self.resolution_time[1] = height.max(1) as f32;
    }

    pub fn set_time(&mut self, seconds: f32) {
        self.resolution_time[2] = seconds;
    }

    pub fn set_camera(&mut self, pos: Vec3, target: Vec3) {
        self.cam_pos = [pos.x, pos.y, pos.z, 0.0];
        self.cam_target = [target.x, target.y, target.z, 0.0];
    }
}

impl Default for Globals {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_globals_size_is_five_vec4s() {
        assert_eq!(Globals::SIZE, 80);
    }

    #[test]
    fn test_resolution_never_hits_zero() {
        let mut g = Globals::new();
        g.set_resolution(0, 0);
        assert_eq!(g.resolution_time[0], 1.0);
        assert_eq!(g.resolution_time[1], 1.0);
    }
}
