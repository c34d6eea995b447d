//! Geometric primitives that all implement the shared intersection contract.

mod bounds;
mod plane;
mod sphere;

pub use bounds::*;
pub use plane::*;
pub use sphere::*;

use crate::ray::Ray;
use glam::{Quat, Vec3};

/// A single ray/surface intersection record.
#[derive(Clone, Copy, Debug)]
pub struct Intersection {
    /// Distance from the ray origin along the direction.
    pub depth: f32,
    /// World-space intersection point.
    pub point: Vec3,
}

/// Decomposed affine transform applied to primitives.
#[derive(Clone, Copy, Debug)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::zero(),
            rotation: Quat::identity(),
            scale: Vec3::one(),
        }
    }
}

/// Capability set every scene shape implements.
///
/// Intersections are reported with depths in `(DEPTH_TOLERANCE,
/// MAX_DISTANCE)`, ascending, so self-intersections never leak back into
/// the trace. `inside` must agree with the intersection geometry: walking
/// along a ray flips containment exactly at each reported depth.
pub trait Primitive: Send + Sync {
    /// Appends every intersection along `ray` to `stack`, ascending by
    /// depth. Returns whether any intersection was found.
    fn all_intersections(&self, ray: &Ray, stack: &mut Vec<Intersection>) -> bool;

    /// Whether `point` lies in the primitive's interior half.
    fn inside(&self, point: Vec3) -> bool;

    /// Unit surface normal at a previously reported intersection.
    fn normal(&self, intersection: &Intersection) -> Vec3;

    /// The primitive's current bounding box.
    fn bounds(&self) -> Bounds;

    /// Cheap bounding pre-filter; unbounded primitives always pass.
    fn intersect_bounds(&self, ray: &Ray, max_depth: f32) -> bool {
        self.bounds().intersect(ray, max_depth)
    }

    fn translate(&mut self, vector: Vec3);

    fn rotate(&mut self, rotation: Quat);

    fn scale(&mut self, factor: Vec3);

    /// Applies a decomposed transform as scale, then rotation, then
    /// translation.
    fn transform(&mut self, transform: &Transform) {
        self.scale(transform.scale);
        self.rotate(transform.rotation);
        self.translate(transform.translation);
    }

    /// The primitive bounding the complementary volume.
    fn invert(self: Box<Self>) -> Box<dyn Primitive>;

    /// Deep copy, bounding box included.
    fn copy(&self) -> Box<dyn Primitive>;
}
