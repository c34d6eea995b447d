use crate::camera::Camera;
use crate::colour::Colour;
use crate::pixel::TracePixel;
use crate::scene::Scene;
use crate::settings::RenderSettings;
use crate::trace::SceneTracer;
use anyhow::Result;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

const COLOR_CHANNELS: usize = 3;
const GAMMA: f32 = 2.2;

/// Cooperative cancellation, checked between pixels. Stopping abandons
/// the remaining pixels and leaves finished ones intact.
pub trait Cooperate: Sync {
    fn should_stop(&self) -> bool;
}

impl Cooperate for AtomicBool {
    fn should_stop(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// Aggregate statistics for one rendered frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderStats {
    pub rays: u64,
    pub seconds: f64,
}

/// Renders the frame row-parallel into an RGB byte buffer. Every row
/// worker owns its own pixel orchestrator and tracer; the scene is shared
/// read-only.
pub fn render(
    scene: &Scene,
    camera: &Camera,
    settings: &RenderSettings,
    cancel: &dyn Cooperate,
) -> Result<(Vec<u8>, RenderStats)> {
    let width = settings.width as usize;
    let height = settings.height as usize;

    // Fail fast on a degenerate camera before any worker starts.
    let probe_tracer = SceneTracer::new(scene, settings.max_bounces, settings.seed);
    let mut probe = TracePixel::new(scene, probe_tracer, false, settings.seed);
    probe.setup_camera(camera)?;
    drop(probe);

    let mut buffer = vec![0u8; width * height * COLOR_CHANNELS];
    let ray_count = AtomicU64::new(0);
    let start = Instant::now();

    buffer
        .par_chunks_mut(width * COLOR_CHANNELS)
        .enumerate()
        .for_each(|(y, row)| {
            if cancel.should_stop() {
                return;
            }

            let tracer_seed = settings.seed.wrapping_add(y as u64);
            let tracer = SceneTracer::new(scene, settings.max_bounces, tracer_seed);
            let mut pixel = TracePixel::new(scene, tracer, false, settings.seed);
            if pixel.setup_camera(camera).is_err() {
                // Validated above; an error here leaves the row black.
                return;
            }

            for (x, out) in row.chunks_mut(COLOR_CHANNELS).enumerate() {
                if cancel.should_stop() {
                    break;
                }

                let colour = pixel.trace_pixel(
                    x as f32 + 0.5,
                    y as f32 + 0.5,
                    width as f32,
                    height as f32,
                );
                write_pixel(out, colour);
            }

            ray_count.fetch_add(pixel.tracer().rays_traced(), Ordering::Relaxed);
        });

    let seconds = start.elapsed().as_secs_f64();
    let rays = ray_count.load(Ordering::Relaxed);
    log::info!(
        "traced {:.2}M rays in {:.2}s ({:.2}M rays/s)",
        rays as f64 / 1.0e6,
        seconds,
        rays as f64 / 1.0e6 / seconds.max(1.0e-9)
    );

    Ok((buffer, RenderStats { rays, seconds }))
}

fn write_pixel(out: &mut [u8], colour: Colour) {
    let channels = [colour.rgb.x, colour.rgb.y, colour.rgb.z];
    for (slot, channel) in out.iter_mut().zip(channels.iter()) {
        // Gamma correct, then convert from [0, 1] to [0, 256).
        let corrected = channel.max(0.0).powf(1.0 / GAMMA).min(1.0);
        *slot = (255.99 * corrected) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec3;

    #[test]
    fn write_pixel_clamps_and_gamma_corrects() {
        let mut out = [0u8; 3];
        write_pixel(&mut out, Colour::opaque(vec3(1.0, 0.0, 4.0)));
        assert_eq!(out[0], 255);
        assert_eq!(out[1], 0);
        assert_eq!(out[2], 255);

        write_pixel(&mut out, Colour::opaque(vec3(0.5, 0.5, 0.5)));
        // 0.5^(1/2.2) is roughly 0.73.
        assert!(out[0] > 180 && out[0] < 190);
    }
}
