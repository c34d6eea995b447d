use crate::camera::Camera;
use anyhow::{Context, Result};
use glam::Vec3;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Frame-level settings, loadable from a TOML file. Every field has a
/// default so partial files work.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub max_bounces: u32,
    pub seed: u64,
    pub output: String,
    pub camera: CameraSettings,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            max_bounces: 64,
            seed: 0x5eed,
            output: "output.png".to_string(),
            camera: CameraSettings::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub location: [f32; 3],
    pub look_at: [f32; 3],
    pub up: [f32; 3],
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aperture: f32,
    /// Zero means "focus on the look-at point".
    pub focal_distance: f32,
    pub blur_samples: u32,
    pub confidence: f32,
    pub variance: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            location: [13.0, 2.0, 3.0],
            look_at: [0.0, 1.0, 0.0],
            up: [0.0, 1.0, 0.0],
            fov: 20.0,
            aperture: 0.1,
            focal_distance: 0.0,
            blur_samples: 32,
            confidence: 0.9,
            variance: 1.0 / 128.0,
        }
    }
}

impl RenderSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {:?}", path))?;
        let settings =
            toml::from_str(&text).with_context(|| format!("failed to parse settings in {:?}", path))?;

        Ok(settings)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl CameraSettings {
    pub fn to_camera(&self, aspect: f32) -> Camera {
        let location = Vec3::from(self.location);
        let target = Vec3::from(self.look_at);

        let mut camera = Camera::look_at(location, target, Vec3::from(self.up), self.fov, aspect);
        camera.aperture = self.aperture;
        camera.focal_distance = if self.focal_distance > 0.0 {
            self.focal_distance
        } else {
            (target - location).length()
        };
        camera.blur_samples = self.blur_samples;
        camera.confidence = self.confidence;
        camera.variance = self.variance;

        camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_fills_in_defaults() {
        let settings: RenderSettings = toml::from_str(
            r#"
            width = 320
            height = 240

            [camera]
            aperture = 0.0
            fov = 45.0
            "#,
        )
        .expect("valid settings");

        assert_eq!(settings.width, 320);
        assert_eq!(settings.height, 240);
        assert_eq!(settings.max_bounces, 64);
        assert_eq!(settings.camera.fov, 45.0);
        assert_eq!(settings.camera.aperture, 0.0);
        assert_eq!(settings.camera.blur_samples, 32);
    }

    #[test]
    fn camera_focuses_on_the_target_by_default() {
        let settings = RenderSettings::default();
        let camera = settings.camera.to_camera(settings.aspect());

        let expected = (Vec3::from(settings.camera.look_at)
            - Vec3::from(settings.camera.location))
        .length();
        assert!((camera.focal_distance - expected).abs() < 1.0e-5);
        assert!(camera.uses_focal_blur());
    }
}
