use anyhow::{Context, Result};
use glam::{vec3, Vec3};
use itertools::iproduct;
use log::LevelFilter;
use rand::prelude::*;
use raytracer::interior::{Interior, InteriorId};
use raytracer::material::Material;
use raytracer::primitives::{Plane, Sphere};
use raytracer::render::render;
use raytracer::scene::{Scene, SceneObject};
use raytracer::settings::RenderSettings;
use std::env;
use std::path::Path;
use std::sync::atomic::AtomicBool;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .init();

    let settings = match env::args().nth(1) {
        Some(path) => RenderSettings::load(Path::new(&path))?,
        None => RenderSettings::default(),
    };
    log::info!(
        "rendering {}x{} to {}",
        settings.width,
        settings.height,
        settings.output
    );

    let scene = demo_scene();
    let camera = settings.camera.to_camera(settings.aspect());

    let cancel = AtomicBool::new(false);
    let (buffer, stats) = render(&scene, &camera, &settings, &cancel)?;

    image::save_buffer(
        &settings.output,
        &buffer,
        settings.width,
        settings.height,
        image::ColorType::Rgb8,
    )
    .with_context(|| format!("failed to write {}", settings.output))?;
    log::info!(
        "wrote {} after {:.2}M rays",
        settings.output,
        stats.rays as f64 / 1.0e6
    );

    Ok(())
}

/// A semi random scene: matte ground plane, a field of small spheres, and
/// three large feature spheres including a hollow glass one.
fn demo_scene() -> Scene {
    let mut rng = rand::thread_rng();
    let interiors = vec![Interior::new(1.5), Interior::new(1.0)];
    let glass = InteriorId(0);
    let bubble = InteriorId(1);

    let mut objects = vec![SceneObject {
        shape: Box::new(Plane::new(vec3(0.0, 1.0, 0.0), 0.0)),
        material: Material::Lambertian {
            albedo: vec3(0.5, 0.5, 0.5),
        },
        interior: None,
    }];

    for (a, b) in iproduct!(-8..8, -8..8) {
        let choice = rng.gen::<f32>();
        let center = vec3(
            a as f32 + 0.9 * rng.gen::<f32>(),
            0.2,
            b as f32 + 0.9 * rng.gen::<f32>(),
        );

        if (center - vec3(4.0, 0.2, 0.0)).length() <= 0.9 {
            continue;
        }

        let material = if choice < 0.6 {
            Material::Lambertian {
                albedo: vec3(
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                ),
            }
        } else if choice < 0.85 {
            Material::Metal {
                albedo: vec3(
                    0.5 * (1.0 + rng.gen::<f32>()),
                    0.5 * (1.0 + rng.gen::<f32>()),
                    0.5 * (1.0 + rng.gen::<f32>()),
                ),
                fuzz: 0.5 * rng.gen::<f32>(),
            }
        } else {
            Material::Dielectric {
                filter: vec3(0.9, 0.9, 0.9),
            }
        };
        let interior = match material {
            Material::Dielectric { .. } => Some(glass),
            _ => None,
        };

        objects.push(SceneObject {
            shape: Box::new(Sphere::new(center, 0.2)),
            material,
            interior,
        });
    }

    // Hollow glass sphere: outer shell plus an inner air bubble, so rays
    // cross nested media.
    objects.push(SceneObject {
        shape: Box::new(Sphere::new(vec3(0.0, 1.0, 0.0), 1.0)),
        material: Material::Dielectric {
            filter: vec3(0.9, 0.9, 0.9),
        },
        interior: Some(glass),
    });
    objects.push(SceneObject {
        shape: Box::new(Sphere::new(vec3(0.0, 1.0, 0.0), 0.6)),
        material: Material::Dielectric {
            filter: Vec3::one(),
        },
        interior: Some(bubble),
    });

    objects.push(SceneObject {
        shape: Box::new(Sphere::new(vec3(-4.0, 1.0, 0.0), 1.0)),
        material: Material::Lambertian {
            albedo: vec3(0.6, 0.2, 0.9),
        },
        interior: None,
    });
    objects.push(SceneObject {
        shape: Box::new(Sphere::new(vec3(4.0, 1.0, 0.0), 1.0)),
        material: Material::Metal {
            albedo: vec3(0.7, 0.6, 0.5),
            fuzz: 0.0,
        },
        interior: None,
    });

    Scene::new(objects, interiors)
}
