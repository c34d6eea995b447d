//! Per-pixel trace orchestration: camera ray generation, container
//! seeding, and adaptive focal blur sampling.

use crate::camera::{Camera, Projection};
use crate::colour::Colour;
use crate::interior::InteriorList;
use crate::ray::Ray;
use crate::scene::Scene;
use crate::trace::TraceRay;
use crate::{DefaultRng, EPSILON};
use anyhow::{ensure, Result};
use glam::{vec2, Vec2, Vec3};
use rand::prelude::*;
use std::f32::consts::PI;

/// Check confidence for the first time after this many samples.
const FIRST_TIER: usize = 4;

/// Precomputed per-camera state for stochastic focal blur. Built once at
/// camera setup and reused for every pixel.
#[derive(Clone, Debug)]
pub struct FocalBlurData {
    /// Distance to the focal plane.
    focal_distance: f32,
    /// Confidence thresholds indexed by number of samples taken.
    sample_threshold: Vec<f32>,
    /// Additional samples to take before each confidence check.
    samples_per_tier: Vec<usize>,
    /// Lens sample locations on the unit disc.
    sample_grid: Vec<Vec2>,
    /// Maximum jitter applied around each grid point.
    max_jitter: f32,
    /// Viewing-plane basis for lens offsets.
    x_perp: Vec3,
    y_perp: Vec3,
}

impl FocalBlurData {
    fn new(camera: &Camera, right: Vec3, up: Vec3) -> Self {
        let count = camera.blur_samples.max(1) as usize;

        // Threshold schedule for the confidence test, tightening as
        // samples accumulate.
        let mut sample_threshold = vec![0.0; count];
        if count > 1 {
            let scale =
                camera.variance * chi_square_quantile(camera.confidence, (count - 1) as f32);
            for (taken, threshold) in sample_threshold.iter_mut().enumerate() {
                *threshold = scale / (taken + 1) as f32;
            }
        }

        // First check after a handful of samples, then at doubling
        // intervals up to the budget.
        let mut samples_per_tier = Vec::new();
        let mut planned = 0;
        while planned < count {
            let batch = if planned == 0 {
                FIRST_TIER.min(count)
            } else {
                planned.min(count - planned)
            };
            samples_per_tier.push(batch);
            planned += batch;
        }

        // Deterministic spiral covering the unit disc evenly for any
        // sample budget.
        let golden_angle = PI * (3.0 - f32::sqrt(5.0));
        let sample_grid = (0..count)
            .map(|i| {
                let radius = f32::sqrt((i as f32 + 0.5) / count as f32);
                let theta = i as f32 * golden_angle;
                vec2(radius * theta.cos(), radius * theta.sin())
            })
            .collect();

        // Half the mean spacing between grid points.
        let max_jitter = 0.5 / (count as f32).sqrt();

        let focal_distance = if camera.focal_distance > 0.0 {
            camera.focal_distance
        } else {
            1.0
        };

        Self {
            focal_distance,
            sample_threshold,
            samples_per_tier,
            sample_grid,
            max_jitter,
            x_perp: right,
            y_perp: up,
        }
    }

    fn total_samples(&self) -> usize {
        self.sample_grid.len()
    }
}

/// Camera state captured at setup: the normalised basis plus the
/// pre-normalisation lengths that keep aspect scaling.
#[derive(Clone, Debug)]
struct CameraData {
    camera: Camera,
    direction: Vec3,
    right: Vec3,
    up: Vec3,
    length_right: f32,
    length_up: f32,
    focal_blur: Option<FocalBlurData>,
}

/// Traces complete pixels: owns the camera state, the focal blur
/// schedule and the scratch buffers, and drives a `TraceRay`
/// implementation. One instance belongs to exactly one worker.
pub struct TracePixel<'a, T> {
    scene: &'a Scene,
    tracer: T,
    camera: Option<CameraData>,
    /// Pretrace passes skip container precomputation entirely.
    pretrace: bool,
    seed: u64,
    precompute_containing_interiors: bool,
    containing_interiors: InteriorList,
}

impl<'a, T: TraceRay> TracePixel<'a, T> {
    pub fn new(scene: &'a Scene, tracer: T, pretrace: bool, seed: u64) -> Self {
        Self {
            scene,
            tracer,
            camera: None,
            pretrace,
            seed,
            precompute_containing_interiors: false,
            containing_interiors: InteriorList::new(),
        }
    }

    pub fn tracer(&self) -> &T {
        &self.tracer
    }

    /// Captures the camera for this frame. Expensive when focal blur is
    /// enabled, so call it once per frame, never per pixel.
    pub fn setup_camera(&mut self, camera: &Camera) -> Result<()> {
        let length_right = camera.right.length();
        let length_up = camera.up.length();
        let length_direction = camera.direction.length();
        ensure!(
            length_direction > EPSILON,
            "camera direction vector has zero length"
        );
        ensure!(length_right > EPSILON, "camera right vector has zero length");
        ensure!(length_up > EPSILON, "camera up vector has zero length");

        let direction = camera.direction / length_direction;
        let right = camera.right / length_right;
        let up = camera.up / length_up;

        let focal_blur = if camera.uses_focal_blur() {
            Some(FocalBlurData::new(camera, right, up))
        } else {
            None
        };

        self.camera = Some(CameraData {
            camera: camera.clone(),
            direction,
            right,
            up,
            length_right,
            length_up,
            focal_blur,
        });

        Ok(())
    }

    /// The per-pixel entry point: one ray without focal blur, the
    /// adaptive sampler with it. `x` and `y` are pixel-space coordinates,
    /// usually the pixel centre.
    pub fn trace_pixel(&mut self, x: f32, y: f32, width: f32, height: f32) -> Colour {
        let use_focal_blur = match &self.camera {
            Some(camera) => camera.focal_blur.is_some(),
            None => {
                log::error!("trace_pixel called before setup_camera");
                return Colour::transparent();
            }
        };

        self.precompute_containing_interiors = !self.pretrace;

        if use_focal_blur {
            self.trace_ray_with_focal_blur(x, y, width, height)
        } else {
            match self.create_camera_ray(x, y, width, height, 0) {
                Some(mut ray) => {
                    self.init_ray_container_state(&mut ray);
                    self.tracer.trace_ray(&ray)
                }
                None => Colour::transparent(),
            }
        }
    }

    /// Maps a pixel coordinate through the camera basis into a primary
    /// ray. Returns None when the resulting direction degenerates.
    fn create_camera_ray(
        &self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        ray_number: usize,
    ) -> Option<Ray> {
        let camera = self.camera.as_ref()?;

        // Map the pixel to [-0.5, 0.5] on both axes, y up, so the centre
        // pixel lands exactly on the look direction.
        let x0 = x / width - 0.5;
        let y0 = 0.5 - y / height;

        let mut ray = match camera.camera.projection {
            Projection::Perspective => {
                let direction = camera.direction
                    + x0 * camera.length_right * camera.right
                    + y0 * camera.length_up * camera.up;
                if direction.length_squared() < EPSILON {
                    return None;
                }
                Ray::new(camera.camera.location, direction.normalize())
            }
            Projection::Orthographic => {
                let origin = camera.camera.location
                    + x0 * camera.length_right * camera.right
                    + y0 * camera.length_up * camera.up;
                Ray::new(origin, camera.direction)
            }
        };

        if camera.focal_blur.is_some() {
            self.jitter_camera_ray(&mut ray, x, y, ray_number);
        }
        ray.primary = true;

        Some(ray)
    }

    /// Moves the eye across the aperture by the grid sample plus bounded
    /// jitter, and bends the ray back through the focal point so all
    /// samples converge at the focal plane.
    fn jitter_camera_ray(&self, ray: &mut Ray, x: f32, y: f32, ray_number: usize) {
        let camera = match &self.camera {
            Some(camera) => camera,
            None => return,
        };
        let blur = match &camera.focal_blur {
            Some(blur) => blur,
            None => return,
        };

        let mut rng = DefaultRng::seed_from_u64(jitter_seed(self.seed, x, y, ray_number));
        let jitter_x = (rng.gen::<f32>() - 0.5) * blur.max_jitter * 2.0;
        let jitter_y = (rng.gen::<f32>() - 0.5) * blur.max_jitter * 2.0;

        let sample = blur.sample_grid.get(ray_number).copied().unwrap_or_default();
        let lens_x = sample.x + jitter_x;
        let lens_y = sample.y + jitter_y;

        let deflection =
            (blur.x_perp * lens_x - blur.y_perp * lens_y) * (0.5 * camera.camera.aperture);
        let origin = camera.camera.location + deflection;
        let direction = (ray.direction * blur.focal_distance - deflection).normalize();

        *ray = Ray::new(origin, direction);
    }

    /// Seeds the ray with the media containing its origin. The
    /// containment walk runs once per pixel and its result is reused for
    /// every focal blur sample of that pixel.
    fn init_ray_container_state(&mut self, ray: &mut Ray) {
        if self.pretrace {
            return;
        }

        if self.precompute_containing_interiors {
            self.precompute_containing_interiors = false;
            self.containing_interiors.clear();
            let scene = self.scene;
            scene.containing_interiors(ray.origin, &mut self.containing_interiors);
        }

        ray.append_interiors(&self.containing_interiors);
    }

    fn blur_data(&self) -> Option<&FocalBlurData> {
        self.camera.as_ref().and_then(|camera| camera.focal_blur.as_ref())
    }

    fn blur_tier_batch(&self, tier: usize) -> usize {
        self.blur_data()
            .and_then(|blur| blur.samples_per_tier.get(tier).copied())
            .unwrap_or(0)
    }

    /// Confidence check: the per-channel sample variance of the mean must
    /// drop below the threshold for the current sample count.
    fn blur_converged(&self, sum: &Colour, sum_sq: &[f32; 4], taken: usize) -> bool {
        if taken < 2 {
            return false;
        }

        let threshold = match self
            .blur_data()
            .and_then(|blur| blur.sample_threshold.get(taken - 1).copied())
        {
            Some(threshold) => threshold,
            None => return false,
        };

        let n = taken as f32;
        sum.channels()
            .iter()
            .zip(sum_sq.iter())
            .all(|(channel_sum, channel_sq)| {
                let variance = (channel_sq - channel_sum * channel_sum / n) / (n - 1.0);
                variance / n <= threshold
            })
    }

    /// Casts batches of jittered rays, escalating through the tier
    /// schedule until the colour estimate is confident or the budget is
    /// spent. Exhausting the budget is a normal terminal state.
    fn trace_ray_with_focal_blur(&mut self, x: f32, y: f32, width: f32, height: f32) -> Colour {
        let total = match self.blur_data() {
            Some(blur) => blur.total_samples(),
            None => return Colour::transparent(),
        };

        let mut sum = Colour::default();
        let mut sum_sq = [0.0f32; 4];
        let mut taken = 0usize;

        for tier in 0.. {
            let batch = self.blur_tier_batch(tier);
            if batch == 0 {
                break;
            }

            for i in 0..batch {
                let ray_number = taken + i;
                if let Some(mut ray) = self.create_camera_ray(x, y, width, height, ray_number) {
                    self.init_ray_container_state(&mut ray);
                    let colour = self.tracer.trace_ray(&ray);

                    sum += colour;
                    for (acc, channel) in sum_sq.iter_mut().zip(colour.channels().iter()) {
                        *acc += channel * channel;
                    }
                }
            }
            taken += batch;

            if taken >= total || self.blur_converged(&sum, &sum_sq, taken) {
                break;
            }
        }

        if taken == 0 {
            return Colour::transparent();
        }
        sum * (1.0 / taken as f32)
    }
}

/// Mixes the frame seed with the sample coordinates so jitter is
/// reproducible for a given (x, y, ray_number).
fn jitter_seed(seed: u64, x: f32, y: f32, ray_number: usize) -> u64 {
    let mut state = seed
        ^ ((u64::from(x.to_bits()) << 32) | u64::from(y.to_bits()))
        ^ (ray_number as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
    state = (state ^ (state >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    state = (state ^ (state >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    state ^ (state >> 31)
}

/// Quantile of the standard normal distribution (Acklam's rational
/// approximation).
fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];

    let p = p.max(1.0e-9).min(1.0 - 1.0e-9);

    if p < 0.02425 {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 0.97575 {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

/// Chi-square quantile via the Wilson-Hilferty cube approximation.
fn chi_square_quantile(p: f32, df: f32) -> f32 {
    let df = f64::from(df.max(1.0));
    let z = normal_quantile(f64::from(p));
    let t = 1.0 - 2.0 / (9.0 * df) + z * (2.0 / (9.0 * df)).sqrt();

    (df * t * t * t).max(0.0) as f32
}
