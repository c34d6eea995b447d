use crate::primitives::{Bounds, Intersection, Primitive};
use crate::ray::Ray;
use crate::{DEPTH_TOLERANCE, MAX_DISTANCE};
use glam::{Quat, Vec3};

#[derive(Clone, Debug)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    /// When set the primitive bounds the complementary volume: everything
    /// but the ball.
    inverted: bool,
    bounds: Bounds,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        let mut sphere = Self {
            center,
            radius,
            inverted: false,
            bounds: Bounds::empty(),
        };
        sphere.compute_bounds();
        sphere
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    fn compute_bounds(&mut self) {
        // An inverted sphere extends to infinity.
        self.bounds = if self.inverted {
            Bounds::unbounded()
        } else {
            Bounds::new(
                self.center - Vec3::splat(self.radius),
                self.center + Vec3::splat(self.radius),
            )
        };
    }
}

impl Primitive for Sphere {
    fn all_intersections(&self, ray: &Ray, stack: &mut Vec<Intersection>) -> bool {
        let oc = ray.origin - self.center;
        let a = ray.direction.dot(ray.direction);
        let b = oc.dot(ray.direction);
        let c = oc.dot(oc) - self.radius * self.radius;
        let discriminant = b * b - a * c;

        if discriminant <= 0.0 {
            return false;
        }

        let root = discriminant.sqrt();
        let mut found = false;

        // Ascending: (-b - root) / a <= (-b + root) / a.
        for &depth in &[(-b - root) / a, (-b + root) / a] {
            if depth > DEPTH_TOLERANCE && depth < MAX_DISTANCE {
                stack.push(Intersection {
                    depth,
                    point: ray.point_at_parameter(depth),
                });
                found = true;
            }
        }

        found
    }

    fn inside(&self, point: Vec3) -> bool {
        let inside = (point - self.center).length_squared() < self.radius * self.radius;
        inside != self.inverted
    }

    fn normal(&self, intersection: &Intersection) -> Vec3 {
        let normal = (intersection.point - self.center) / self.radius;
        if self.inverted {
            -normal
        } else {
            normal
        }
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn translate(&mut self, vector: Vec3) {
        self.center += vector;
        self.compute_bounds();
    }

    fn rotate(&mut self, rotation: Quat) {
        self.center = rotation * self.center;
        self.compute_bounds();
    }

    fn scale(&mut self, factor: Vec3) {
        // Only uniform scaling is representable; the x component sets the
        // factor.
        self.center = self.center * factor;
        self.radius *= factor.x.abs();
        self.compute_bounds();
    }

    fn invert(self: Box<Self>) -> Box<dyn Primitive> {
        let mut sphere = *self;
        sphere.inverted = !sphere.inverted;
        sphere.compute_bounds();
        Box::new(sphere)
    }

    fn copy(&self) -> Box<dyn Primitive> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec3;

    const TOLERANCE: f32 = 1.0e-4;

    #[test]
    fn ray_through_center_reports_both_hits_ascending() {
        let sphere = Sphere::new(vec3(0.0, 0.0, -10.0), 2.0);
        let ray = Ray::new(Vec3::zero(), vec3(0.0, 0.0, -1.0));

        let mut stack = Vec::new();
        assert!(sphere.all_intersections(&ray, &mut stack));
        assert_eq!(stack.len(), 2);
        assert!((stack[0].depth - 8.0).abs() < TOLERANCE);
        assert!((stack[1].depth - 12.0).abs() < TOLERANCE);
        assert!(stack[0].depth < stack[1].depth);
    }

    #[test]
    fn origin_inside_reports_only_the_exit() {
        let sphere = Sphere::new(Vec3::zero(), 3.0);
        let ray = Ray::new(Vec3::zero(), vec3(1.0, 0.0, 0.0));

        let mut stack = Vec::new();
        assert!(sphere.all_intersections(&ray, &mut stack));
        assert_eq!(stack.len(), 1);
        assert!((stack[0].depth - 3.0).abs() < TOLERANCE);
    }

    #[test]
    fn inside_and_normal_flip_when_inverted() {
        let sphere = Sphere::new(Vec3::zero(), 2.0);
        assert!(sphere.inside(vec3(1.0, 0.0, 0.0)));
        assert!(!sphere.inside(vec3(3.0, 0.0, 0.0)));

        let ray = Ray::new(vec3(5.0, 0.0, 0.0), vec3(-1.0, 0.0, 0.0));
        let mut stack = Vec::new();
        sphere.all_intersections(&ray, &mut stack);
        let outward = sphere.normal(&stack[0]);
        assert!((outward - vec3(1.0, 0.0, 0.0)).length() < TOLERANCE);

        let inverted = Box::new(sphere).invert();
        assert!(!inverted.inside(vec3(1.0, 0.0, 0.0)));
        assert!(inverted.inside(vec3(3.0, 0.0, 0.0)));
        assert!((inverted.normal(&stack[0]) - vec3(-1.0, 0.0, 0.0)).length() < TOLERANCE);
        assert!(inverted.bounds().infinite);
    }

    #[test]
    fn transforms_move_the_bounds_with_the_shape() {
        let mut sphere = Sphere::new(vec3(1.0, 0.0, 0.0), 1.0);
        sphere.translate(vec3(0.0, 2.0, 0.0));
        assert_eq!(sphere.center(), vec3(1.0, 2.0, 0.0));
        assert!(sphere.bounds().contains(vec3(1.0, 2.9, 0.0)));

        sphere.scale(vec3(2.0, 2.0, 2.0));
        assert_eq!(sphere.center(), vec3(2.0, 4.0, 0.0));
        assert!((sphere.radius() - 2.0).abs() < TOLERANCE);

        sphere.rotate(Quat::from_axis_angle(
            vec3(0.0, 0.0, 1.0),
            std::f32::consts::PI,
        ));
        assert!((sphere.center() - vec3(-2.0, -4.0, 0.0)).length() < 1.0e-3);
    }
}
