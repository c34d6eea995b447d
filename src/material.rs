use crate::ray::Ray;
use crate::scene::RayHit;
use crate::DefaultRng;
use glam::Vec3;
use rand::prelude::*;
use rand_distr::{Distribution, UnitSphere};

/// Samples a random point on the unit sphere.
pub fn sample_unit_sphere(rng: &mut DefaultRng) -> Vec3 {
    Vec3::from(UnitSphere.sample(rng))
}

/// Reflect vector v around normal n.
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract vector v around normal n, or None at total internal
/// reflection.
pub fn refract(v: Vec3, n: Vec3, ni_over_nt: f32) -> Option<Vec3> {
    let uv = v.normalize();
    let dt = uv.dot(n);
    let discriminant = 1.0 - ni_over_nt * ni_over_nt * (1.0 - dt * dt);

    if discriminant > 0.0 {
        Some(ni_over_nt * (uv - n * dt) - n * f32::sqrt(discriminant))
    } else {
        None
    }
}

/// Schlick's approximation for reflectivity.
pub fn schlick(cosine: f32, ior_ratio: f32) -> f32 {
    let r_0 = (1.0 - ior_ratio) / (1.0 + ior_ratio);
    let r_0 = r_0 * r_0;

    r_0 + (1.0 - r_0) * f32::powf(1.0 - cosine, 5.0)
}

pub struct ScatterResult {
    pub scattered: Ray,
    pub attenuation: Vec3,
    /// Whether the scattered ray crossed the surface into the other
    /// medium, so the caller updates its interior list.
    pub refracted: bool,
}

#[derive(Clone, Copy, Debug)]
pub enum Material {
    Lambertian { albedo: Vec3 },
    Metal { albedo: Vec3, fuzz: f32 },
    Dielectric { filter: Vec3 },
}

impl Material {
    /// Scatters an incoming ray at a hit point. `ior_ratio` is the
    /// current-over-next index of refraction across the surface, taken
    /// from the ray's interior state; only dielectrics consume it.
    pub fn scatter(
        &self,
        ray: &Ray,
        hit: &RayHit,
        ior_ratio: f32,
        rng: &mut DefaultRng,
    ) -> Option<ScatterResult> {
        match *self {
            Material::Lambertian { albedo } => {
                let target = hit.point + hit.normal + sample_unit_sphere(rng);

                Some(ScatterResult {
                    scattered: Ray::new(hit.point, target - hit.point),
                    attenuation: albedo,
                    refracted: false,
                })
            }
            Material::Metal { albedo, fuzz } => {
                let reflected = reflect(ray.direction.normalize(), hit.normal);
                let scattered = Ray::new(hit.point, reflected + fuzz * sample_unit_sphere(rng));

                if scattered.direction.dot(hit.normal) > 0.0 {
                    Some(ScatterResult {
                        scattered,
                        attenuation: albedo,
                        refracted: false,
                    })
                } else {
                    None
                }
            }
            Material::Dielectric { filter } => {
                let direction = ray.direction.normalize();
                let entering = direction.dot(hit.normal) < 0.0;
                let outward_normal = if entering { hit.normal } else { -hit.normal };
                let cosine = -direction.dot(outward_normal);

                let refracted = refract(direction, outward_normal, ior_ratio);
                let reflect_prob = match refracted {
                    Some(_) => schlick(cosine, ior_ratio),
                    None => 1.0,
                };

                // Reflect or refract based on probability.
                let result = match refracted {
                    Some(refracted) if rng.gen::<f32>() >= reflect_prob => ScatterResult {
                        scattered: Ray::new(hit.point, refracted),
                        attenuation: filter,
                        refracted: true,
                    },
                    _ => ScatterResult {
                        scattered: Ray::new(hit.point, reflect(direction, hit.normal)),
                        attenuation: filter,
                        refracted: false,
                    },
                };

                Some(result)
            }
        }
    }
}
