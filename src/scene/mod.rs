//! Decorative 3D Scene
//!
//! Floating cubes on a sphere around a pulsing centre sphere, each tied to
//! the origin by a line. The scene is generated once from a random source;
//! [`Scene::frame`] is a pure function of the frame counter and the clock, so
//! any renderer can draw it and tests can pin every pose.

use rand::Rng;
use serde::Serialize;
use std::f64::consts::{PI, TAU};

/// Cube colours
pub const PALETTE: [u32; 3] = [0x4361ee, 0x7209b7, 0x4cc9f0];

/// Group rotation per frame (radians)
pub const GROUP_ROTATION_STEP: f64 = 0.002;

/// Amplitude of the centre sphere's pulse
pub const SPHERE_PULSE: f64 = 0.05;

/// A point or a set of Euler angles
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Scene layout
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub cube_count: usize,
    /// Radius of the sphere the cubes sit on
    pub radius: f64,
    pub sphere_radius: f64,
    pub camera_z: f64,
    /// Vertical field of view in degrees
    pub fov: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            cube_count: 20,
            radius: 5.0,
            sphere_radius: 1.5,
            camera_z: 10.0,
            fov: 75.0,
        }
    }
}

/// One cube and its animation parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cube {
    pub position: Vec3,
    pub size: f64,
    pub color: u32,
    pub rotation: Vec3,
    /// Per-frame rotation increment on each axis
    pub rotation_speed: Vec3,
    pub float_speed: f64,
    pub float_distance: f64,
    pub float_offset: f64,
}

/// Pose of one cube in a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CubePose {
    pub position: Vec3,
    pub rotation: Vec3,
    pub size: f64,
    pub color: u32,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    /// Rotation of the whole group about the y axis
    pub group_rotation_y: f64,
    pub cubes: Vec<CubePose>,
    /// Line segments from the origin to each cube
    pub lines: Vec<(Vec3, Vec3)>,
    /// Uniform scale of the centre sphere
    pub sphere_scale: f64,
}

/// A generated scene
#[derive(Debug, Clone)]
pub struct Scene {
    config: SceneConfig,
    cubes: Vec<Cube>,
}

impl Scene {
    /// Place `config.cube_count` cubes at random on the sphere
    pub fn generate<R: Rng>(config: SceneConfig, rng: &mut R) -> Self {
        let cubes = (0..config.cube_count)
            .map(|_| {
                let size = rng.gen_range(0.1..0.6);
                let color = PALETTE[rng.gen_range(0..PALETTE.len())];

                let theta = rng.gen_range(0.0..TAU);
                let phi = rng.gen_range(0.0..PI);
                let position = Vec3::new(
                    config.radius * phi.sin() * theta.cos(),
                    config.radius * phi.sin() * theta.sin(),
                    config.radius * phi.cos(),
                );

                let rotation = Vec3::new(rng.gen_range(0.0..PI), rng.gen_range(0.0..PI), 0.0);
                let rotation_speed = Vec3::new(
                    rng.gen_range(-0.005..0.005),
                    rng.gen_range(-0.005..0.005),
                    rng.gen_range(-0.005..0.005),
                );

                Cube {
                    position,
                    size,
                    color,
                    rotation,
                    rotation_speed,
                    float_speed: rng.gen_range(0.005..0.015),
                    float_distance: rng.gen_range(0.1..0.3),
                    float_offset: rng.gen_range(0.0..TAU),
                }
            })
            .collect();

        tracing::debug!(cubes = config.cube_count, radius = config.radius, "Scene generated");
        Self { config, cubes }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn cubes(&self) -> &[Cube] {
        &self.cubes
    }

    /// Poses after `n` frames at clock time `t` seconds
    pub fn frame(&self, n: u64, t: f64) -> Frame {
        let steps = n as f64;

        let cubes: Vec<CubePose> = self
            .cubes
            .iter()
            .map(|cube| {
                let float = (t * cube.float_speed + cube.float_offset).sin() * cube.float_distance;
                CubePose {
                    position: Vec3::new(cube.position.x, cube.position.y + float, cube.position.z),
                    rotation: Vec3::new(
                        cube.rotation.x + cube.rotation_speed.x * steps,
                        cube.rotation.y + cube.rotation_speed.y * steps,
                        cube.rotation.z + cube.rotation_speed.z * steps,
                    ),
                    size: cube.size,
                    color: cube.color,
                }
            })
            .collect();

        let lines = cubes.iter().map(|pose| (Vec3::ZERO, pose.position)).collect();

        Frame {
            group_rotation_y: GROUP_ROTATION_STEP * steps,
            cubes,
            lines,
            sphere_scale: 1.0 + t.sin() * SPHERE_PULSE,
        }
    }
}

/// Camera aspect ratio for a viewport; a zero-height viewport is square
pub fn camera_aspect(width: u32, height: u32) -> f64 {
    if height == 0 {
        1.0
    } else {
        width as f64 / height as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const EPS: f64 = 1e-9;

    fn scene() -> Scene {
        Scene::generate(SceneConfig::default(), &mut StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_generate_ranges() {
        let scene = scene();
        assert_eq!(scene.cubes().len(), 20);

        for cube in scene.cubes() {
            assert!((cube.position.length() - 5.0).abs() < 1e-6);
            assert!((0.1..0.6).contains(&cube.size));
            assert!(PALETTE.contains(&cube.color));
            assert!((0.005..0.015).contains(&cube.float_speed));
            assert!((0.1..0.3).contains(&cube.float_distance));
            assert!((0.0..TAU).contains(&cube.float_offset));
            for speed in [
                cube.rotation_speed.x,
                cube.rotation_speed.y,
                cube.rotation_speed.z,
            ] {
                assert!((-0.005..0.005).contains(&speed));
            }
        }
    }

    #[test]
    fn test_frame_zero_is_initial_pose() {
        let scene = scene();
        let frame = scene.frame(0, 0.0);

        assert_eq!(frame.group_rotation_y, 0.0);
        assert!((frame.sphere_scale - 1.0).abs() < EPS);

        for (cube, pose) in scene.cubes().iter().zip(&frame.cubes) {
            assert_eq!(pose.rotation, cube.rotation);
            let expected_y = cube.position.y + cube.float_offset.sin() * cube.float_distance;
            assert!((pose.position.y - expected_y).abs() < EPS);
            assert_eq!(pose.position.x, cube.position.x);
        }
    }

    #[test]
    fn test_frame_advances_linearly() {
        let scene = scene();
        let frame = scene.frame(500, 3.0);

        assert!((frame.group_rotation_y - 1.0).abs() < EPS);
        assert!((frame.sphere_scale - (1.0 + 3.0f64.sin() * 0.05)).abs() < EPS);

        let cube = &scene.cubes()[0];
        let pose = &frame.cubes[0];
        assert!((pose.rotation.x - (cube.rotation.x + cube.rotation_speed.x * 500.0)).abs() < EPS);
        assert!((pose.rotation.z - cube.rotation_speed.z * 500.0).abs() < EPS);
    }

    #[test]
    fn test_frame_is_pure() {
        let scene = scene();
        assert_eq!(scene.frame(42, 1.5), scene.frame(42, 1.5));
    }

    #[test]
    fn test_lines_follow_cubes() {
        let scene = scene();
        let frame = scene.frame(10, 2.0);
        assert_eq!(frame.lines.len(), frame.cubes.len());
        for ((from, to), pose) in frame.lines.iter().zip(&frame.cubes) {
            assert_eq!(*from, Vec3::ZERO);
            assert_eq!(*to, pose.position);
        }
    }

    #[test]
    fn test_float_stays_within_distance() {
        let scene = scene();
        for t in [0.0, 10.0, 100.0, 1000.0] {
            let frame = scene.frame(0, t);
            for (cube, pose) in scene.cubes().iter().zip(&frame.cubes) {
                assert!((pose.position.y - cube.position.y).abs() <= cube.float_distance + EPS);
            }
        }
    }

    #[test]
    fn test_camera_aspect() {
        assert!((camera_aspect(1920, 1080) - 16.0 / 9.0).abs() < EPS);
        assert_eq!(camera_aspect(800, 0), 1.0);
    }
}
