use glam::{vec3, Vec3};
use raytracer::interior::{Interior, InteriorId};
use raytracer::material::Material;
use raytracer::primitives::{Plane, Sphere};
use raytracer::render::render;
use raytracer::scene::{Scene, SceneObject};
use raytracer::settings::RenderSettings;
use std::sync::atomic::AtomicBool;

fn tiny_scene() -> Scene {
    let objects = vec![
        SceneObject {
            shape: Box::new(Plane::new(vec3(0.0, 1.0, 0.0), 0.0)),
            material: Material::Lambertian {
                albedo: vec3(0.5, 0.5, 0.5),
            },
            interior: None,
        },
        SceneObject {
            shape: Box::new(Sphere::new(vec3(0.0, 1.0, 0.0), 1.0)),
            material: Material::Dielectric {
                filter: vec3(0.9, 0.9, 0.9),
            },
            interior: Some(InteriorId(0)),
        },
        SceneObject {
            shape: Box::new(Sphere::new(vec3(2.5, 1.0, 0.0), 1.0)),
            material: Material::Metal {
                albedo: vec3(0.7, 0.6, 0.5),
                fuzz: 0.0,
            },
            interior: None,
        },
    ];

    Scene::new(objects, vec![Interior::new(1.5)])
}

fn tiny_settings() -> RenderSettings {
    let mut settings = RenderSettings::default();
    settings.width = 16;
    settings.height = 12;
    settings.max_bounces = 8;
    settings.camera.location = [0.0, 2.0, 8.0];
    settings.camera.look_at = [0.0, 1.0, 0.0];
    settings.camera.fov = 40.0;
    settings.camera.blur_samples = 8;
    settings
}

#[test]
fn a_full_frame_renders_without_black_fallout() {
    let scene = tiny_scene();
    let settings = tiny_settings();
    let camera = settings.camera.to_camera(settings.aspect());

    let cancel = AtomicBool::new(false);
    let (buffer, stats) =
        render(&scene, &camera, &settings, &cancel).expect("valid camera renders");

    assert_eq!(
        buffer.len(),
        settings.width as usize * settings.height as usize * 3
    );
    assert!(stats.rays > 0);

    // The sky alone guarantees plenty of lit pixels.
    let lit = buffer.iter().filter(|&&b| b > 32).count();
    assert!(lit > buffer.len() / 4);
}

#[test]
fn focal_blur_off_renders_one_primary_ray_per_pixel_at_most() {
    let scene = tiny_scene();
    let mut settings = tiny_settings();
    settings.camera.aperture = 0.0;
    settings.max_bounces = 0;
    let camera = settings.camera.to_camera(settings.aspect());

    let cancel = AtomicBool::new(false);
    let (_, stats) = render(&scene, &camera, &settings, &cancel).expect("valid camera renders");

    // With bounces capped at zero, primaries plus at most one scatter
    // level each.
    let pixels = u64::from(settings.width) * u64::from(settings.height);
    assert!(stats.rays >= pixels);
    assert!(stats.rays <= pixels * 2);
}

#[test]
fn cancellation_abandons_the_frame_cleanly() {
    let scene = tiny_scene();
    let settings = tiny_settings();
    let camera = settings.camera.to_camera(settings.aspect());

    let cancel = AtomicBool::new(true);
    let (buffer, _) = render(&scene, &camera, &settings, &cancel).expect("cancel is not an error");

    assert!(buffer.iter().all(|&b| b == 0));
}

#[test]
fn degenerate_cameras_are_rejected_before_rendering() {
    let scene = tiny_scene();
    let settings = tiny_settings();
    let mut camera = settings.camera.to_camera(settings.aspect());
    camera.up = Vec3::zero();

    let cancel = AtomicBool::new(false);
    assert!(render(&scene, &camera, &settings, &cancel).is_err());
}
