use crate::colour::Colour;
use crate::primitives::Intersection;
use crate::ray::Ray;
use crate::scene::{Scene, SceneObject};
use crate::{DefaultRng, MAX_DISTANCE};
use glam::{vec3, Vec3};
use rand::prelude::*;

/// The scene-trace seam: resolves one ray to a colour. The pixel
/// orchestrator only ever talks to this trait, so tests can substitute
/// cheap tracers.
pub trait TraceRay {
    fn trace_ray(&mut self, ray: &Ray) -> Colour;
}

/// Recursive material-scatter tracer over the scene geometry.
pub struct SceneTracer<'a> {
    scene: &'a Scene,
    max_bounces: u32,
    rng: DefaultRng,
    /// Reused intersection scratch so tracing never allocates per ray.
    stack: Vec<Intersection>,
    rays_traced: u64,
}

impl<'a> SceneTracer<'a> {
    pub fn new(scene: &'a Scene, max_bounces: u32, seed: u64) -> Self {
        Self {
            scene,
            max_bounces,
            rng: DefaultRng::seed_from_u64(seed),
            stack: Vec::new(),
            rays_traced: 0,
        }
    }

    pub fn rays_traced(&self) -> u64 {
        self.rays_traced
    }

    /// Index-of-refraction ratio (current medium over next medium) for a
    /// ray crossing the surface of `object`.
    fn ior_ratio(&self, ray: &Ray, object: &SceneObject, entering: bool) -> f32 {
        let scene = self.scene;
        let current = ray
            .current_interior()
            .map(|id| scene.interior(id).ior)
            .unwrap_or(1.0);

        let next = if entering {
            object
                .interior
                .map(|id| scene.interior(id).ior)
                .unwrap_or(current)
        } else {
            // Leaving: the next medium is the innermost one remaining
            // after this object's interior is gone.
            ray.interiors
                .iter()
                .rev()
                .find(|id| Some(**id) != object.interior)
                .map(|id| scene.interior(*id).ior)
                .unwrap_or(1.0)
        };

        current / next
    }

    fn trace_impl(&mut self, ray: &Ray, bounces: u32) -> Colour {
        self.rays_traced += 1;
        let scene = self.scene;

        if bounces > self.max_bounces {
            return Colour::opaque(Vec3::zero());
        }

        if let Some(hit) = scene.nearest_intersection(ray, MAX_DISTANCE, &mut self.stack) {
            let object = &scene.objects()[hit.object];
            let entering = ray.direction.dot(hit.normal) < 0.0;
            let ior_ratio = self.ior_ratio(ray, object, entering);

            if let Some(scatter) = object.material.scatter(ray, &hit, ior_ratio, &mut self.rng) {
                let mut child = scatter.scattered;
                child.interiors = ray.interiors.clone();
                if scatter.refracted {
                    if let Some(interior) = object.interior {
                        if entering {
                            child.enter(interior);
                        } else {
                            child.exit(interior);
                        }
                    }
                }

                let traced = self.trace_impl(&child, bounces + 1);
                Colour::opaque(scatter.attenuation * traced.rgb)
            } else {
                // Hit something that swallowed the ray.
                Colour::opaque(Vec3::zero())
            }
        } else {
            // Sky gradient; primary rays that escape stay transparent for
            // compositing.
            let direction = ray.direction.normalize();
            let t = 0.5 * (direction.y + 1.0);
            let rgb = (1.0 - t) * vec3(1.0, 1.0, 1.0) + t * vec3(0.5, 0.7, 1.0);

            Colour::new(rgb, if ray.primary { 1.0 } else { 0.0 })
        }
    }
}

impl TraceRay for SceneTracer<'_> {
    fn trace_ray(&mut self, ray: &Ray) -> Colour {
        self.trace_impl(ray, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interior::{Interior, InteriorId};
    use crate::material::Material;
    use crate::primitives::Sphere;
    use glam::vec3;

    fn glass_scene() -> Scene {
        let objects = vec![
            SceneObject {
                shape: Box::new(Sphere::new(Vec3::zero(), 5.0)),
                material: Material::Dielectric {
                    filter: vec3(0.9, 0.9, 0.9),
                },
                interior: Some(InteriorId(0)),
            },
            SceneObject {
                shape: Box::new(Sphere::new(Vec3::zero(), 2.0)),
                material: Material::Dielectric {
                    filter: Vec3::one(),
                },
                interior: Some(InteriorId(1)),
            },
        ];
        Scene::new(objects, vec![Interior::new(1.5), Interior::new(1.0)])
    }

    #[test]
    fn ior_ratio_follows_the_interior_stack() {
        let scene = glass_scene();
        let tracer = SceneTracer::new(&scene, 8, 1);
        let outer = &scene.objects()[0];
        let inner = &scene.objects()[1];

        // From open air into the outer glass.
        let ray = Ray::new(vec3(0.0, 10.0, 0.0), vec3(0.0, -1.0, 0.0));
        assert!((tracer.ior_ratio(&ray, outer, true) - 1.0 / 1.5).abs() < 1.0e-6);

        // Inside the glass, entering the bubble.
        let mut ray = Ray::new(vec3(0.0, 3.0, 0.0), vec3(0.0, -1.0, 0.0));
        ray.enter(InteriorId(0));
        assert!((tracer.ior_ratio(&ray, inner, true) - 1.5 / 1.0).abs() < 1.0e-6);

        // Leaving the glass back into open air.
        assert!((tracer.ior_ratio(&ray, outer, false) - 1.5).abs() < 1.0e-6);

        // Leaving the bubble back into the glass.
        let mut nested = Ray::new(Vec3::zero(), vec3(0.0, 1.0, 0.0));
        nested.append_interiors(&[InteriorId(0), InteriorId(1)]);
        assert_eq!(nested.current_interior(), Some(InteriorId(1)));
        assert!((tracer.ior_ratio(&nested, inner, false) - 1.0 / 1.5).abs() < 1.0e-6);
    }

    #[test]
    fn escaped_primary_rays_are_transparent() {
        let scene = Scene::new(Vec::new(), Vec::new());
        let mut tracer = SceneTracer::new(&scene, 8, 1);

        let mut ray = Ray::new(Vec3::zero(), vec3(0.0, 0.0, -1.0));
        ray.primary = true;
        let colour = tracer.trace_ray(&ray);
        assert!((colour.transm - 1.0).abs() < 1.0e-6);
        assert!(colour.rgb.length() > 0.0);

        // Secondary rays composite as opaque sky.
        let secondary = Ray::new(Vec3::zero(), vec3(0.0, 0.0, -1.0));
        let colour = tracer.trace_ray(&secondary);
        assert_eq!(colour.transm, 0.0);
    }
}
