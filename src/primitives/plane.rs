use crate::primitives::{Bounds, Intersection, Primitive};
use crate::ray::Ray;
use crate::{DEPTH_TOLERANCE, EPSILON, MAX_DISTANCE};
use glam::{vec3, Quat, Vec3};

/// An unbounded plane. Every surface point satisfies
/// `normal · point = distance`; the half-space `normal · point < distance`
/// is the inside.
#[derive(Clone, Debug)]
pub struct Plane {
    normal: Vec3,
    distance: f32,
    bounds: Bounds,
}

impl Plane {
    /// The normal is normalised on construction, rescaling the distance so
    /// the plane equation is unchanged.
    pub fn new(normal: Vec3, distance: f32) -> Self {
        let length = normal.length();
        Self {
            normal: normal / length,
            distance: distance / length,
            bounds: Bounds::unbounded(),
        }
    }

    pub fn normal_vector(&self) -> Vec3 {
        self.normal
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    fn compute_bounds(&mut self) {
        self.bounds = Bounds::unbounded();
    }

    fn intersect(&self, ray: &Ray) -> Option<f32> {
        let denom = self.normal.dot(ray.direction);

        // Parallel to the plane.
        if denom.abs() < EPSILON {
            return None;
        }

        let depth = (self.distance - self.normal.dot(ray.origin)) / denom;
        if depth > DEPTH_TOLERANCE && depth < MAX_DISTANCE {
            Some(depth)
        } else {
            None
        }
    }
}

impl Primitive for Plane {
    fn all_intersections(&self, ray: &Ray, stack: &mut Vec<Intersection>) -> bool {
        match self.intersect(ray) {
            Some(depth) => {
                stack.push(Intersection {
                    depth,
                    point: ray.point_at_parameter(depth),
                });
                true
            }
            None => false,
        }
    }

    fn inside(&self, point: Vec3) -> bool {
        self.normal.dot(point) - self.distance < 0.0
    }

    fn normal(&self, _intersection: &Intersection) -> Vec3 {
        self.normal
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn translate(&mut self, vector: Vec3) {
        self.distance += self.normal.dot(vector);
        self.compute_bounds();
    }

    fn rotate(&mut self, rotation: Quat) {
        self.normal = rotation * self.normal;
        self.compute_bounds();
    }

    fn scale(&mut self, factor: Vec3) {
        let scaled = vec3(
            self.normal.x / factor.x,
            self.normal.y / factor.y,
            self.normal.z / factor.z,
        );
        let length = scaled.length();
        self.normal = scaled / length;
        self.distance /= length;
        self.compute_bounds();
    }

    fn invert(self: Box<Self>) -> Box<dyn Primitive> {
        Box::new(Plane {
            normal: -self.normal,
            distance: -self.distance,
            bounds: self.bounds,
        })
    }

    fn copy(&self) -> Box<dyn Primitive> {
        Box::new(self.clone())
    }
}
