use glam::Vec3;

/// Projection model mapping pixels to rays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    Perspective,
    Orthographic,
}

/// Camera description, immutable once a frame starts. The right and up
/// vectors may be non-unit; their lengths carry the aspect and field of
/// view scaling into ray generation.
#[derive(Clone, Debug)]
pub struct Camera {
    pub projection: Projection,
    pub location: Vec3,
    pub direction: Vec3,
    pub up: Vec3,
    pub right: Vec3,
    /// Lens diameter; zero disables focal blur.
    pub aperture: f32,
    /// Distance to the plane of perfect focus.
    pub focal_distance: f32,
    /// Maximum number of focal blur samples per pixel.
    pub blur_samples: u32,
    /// Probability level for the adaptive sampling confidence test.
    pub confidence: f32,
    /// Acceptable per-channel variance of the pixel estimate.
    pub variance: f32,
}

impl Camera {
    /// Builds a perspective camera from a viewpoint, a target and a
    /// vertical field of view in degrees.
    pub fn look_at(location: Vec3, target: Vec3, up: Vec3, vfov: f32, aspect: f32) -> Self {
        let forward = (target - location).normalize();
        let right = forward.cross(up).normalize();
        let true_up = right.cross(forward);

        let half_height = (vfov.to_radians() / 2.0).tan();

        Self {
            projection: Projection::Perspective,
            location,
            direction: forward,
            up: true_up * 2.0 * half_height,
            right: right * 2.0 * aspect * half_height,
            ..Self::default()
        }
    }

    pub fn uses_focal_blur(&self) -> bool {
        self.aperture > 0.0 && self.blur_samples > 0
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Projection::Perspective,
            location: Vec3::zero(),
            direction: -Vec3::unit_z(),
            up: Vec3::unit_y(),
            right: Vec3::unit_x(),
            aperture: 0.0,
            focal_distance: 1.0,
            blur_samples: 0,
            confidence: 0.9,
            variance: 1.0 / 128.0,
        }
    }
}
