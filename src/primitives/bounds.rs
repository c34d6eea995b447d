use crate::bvh::Axis;
use crate::ray::Ray;
use crate::MAX_DISTANCE;
use glam::Vec3;

/// Axis aligned bounding box. Unbounded primitives set the `infinite`
/// flag instead of meaningful extents and can never be culled.
#[derive(Clone, Copy, Debug)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
    pub infinite: bool,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min,
            max,
            infinite: false,
        }
    }

    /// The box covering all of space, for primitives without finite
    /// extents.
    pub fn unbounded() -> Self {
        Self {
            min: Vec3::splat(-MAX_DISTANCE),
            max: Vec3::splat(MAX_DISTANCE),
            infinite: true,
        }
    }

    /// Identity for `union`: contains nothing.
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(MAX_DISTANCE),
            max: Vec3::splat(-MAX_DISTANCE),
            infinite: false,
        }
    }

    /// Create a union bounds of two bounds that surrounds both of them.
    pub fn union(self, other: Bounds) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            infinite: self.infinite || other.infinite,
        }
    }

    pub fn point_union(self, point: Vec3) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
            infinite: self.infinite,
        }
    }

    /// Returns the axis which has greatest extent.
    pub fn max_extent(&self) -> Axis {
        let extent = self.max - self.min;

        if extent.x > extent.y && extent.x > extent.z {
            Axis::X
        } else if extent.y > extent.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    pub fn surface_area(&self) -> f32 {
        let d = (self.max - self.min).max(Vec3::zero());
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    pub fn contains(&self, point: Vec3) -> bool {
        self.infinite
            || (self.min.x <= point.x
                && point.x <= self.max.x
                && self.min.y <= point.y
                && point.y <= self.max.y
                && self.min.z <= point.z
                && point.z <= self.max.z)
    }

    /// Slab overlap test against the ray, limited to `max_depth`.
    pub fn intersect(&self, ray: &Ray, max_depth: f32) -> bool {
        if self.infinite {
            return true;
        }

        let t1 = (self.min - ray.origin) * ray.inv_direction;
        let t2 = (self.max - ray.origin) * ray.inv_direction;

        // X
        let tmin = f32::min(t1.x, t2.x);
        let tmax = f32::max(t2.x, t1.x);

        // Y
        let tmin = f32::max(tmin, f32::min(t1.y, t2.y));
        let tmax = f32::min(tmax, f32::max(t1.y, t2.y));

        // Z
        let tmin = f32::max(tmin, f32::min(t1.z, t2.z));
        let tmax = f32::min(tmax, f32::max(t1.z, t2.z));

        tmax >= f32::max(tmin, 0.0) && tmin <= max_depth
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec3;

    #[test]
    fn slab_test_hits_and_misses() {
        let bounds = Bounds::new(vec3(-1.0, -1.0, -1.0), vec3(1.0, 1.0, 1.0));

        let hit = Ray::new(vec3(0.0, 0.0, 5.0), vec3(0.0, 0.0, -1.0));
        assert!(bounds.intersect(&hit, MAX_DISTANCE));

        let miss = Ray::new(vec3(0.0, 5.0, 5.0), vec3(0.0, 0.0, -1.0));
        assert!(!bounds.intersect(&miss, MAX_DISTANCE));

        // Box behind the origin.
        let behind = Ray::new(vec3(0.0, 0.0, 5.0), vec3(0.0, 0.0, 1.0));
        assert!(!bounds.intersect(&behind, MAX_DISTANCE));

        // Box beyond the depth limit.
        assert!(!bounds.intersect(&hit, 2.0));
    }

    #[test]
    fn infinite_bounds_never_cull() {
        let bounds = Bounds::unbounded();
        let ray = Ray::new(vec3(0.0, 1000.0, 0.0), vec3(1.0, 0.0, 0.0));
        assert!(bounds.intersect(&ray, 0.001));
        assert!(bounds.contains(vec3(1.0e6, -1.0e6, 0.0)));
    }

    #[test]
    fn union_and_containment() {
        let a = Bounds::new(vec3(0.0, 0.0, 0.0), vec3(1.0, 1.0, 1.0));
        let b = Bounds::new(vec3(2.0, -1.0, 0.0), vec3(3.0, 0.5, 1.0));
        let u = a.union(b);
        assert_eq!(u.min, vec3(0.0, -1.0, 0.0));
        assert_eq!(u.max, vec3(3.0, 1.0, 1.0));
        assert!(u.contains(vec3(1.5, 0.0, 0.5)));
        assert!(!a.contains(vec3(1.5, 0.0, 0.5)));

        let folded = Bounds::empty().union(a);
        assert_eq!(folded.min, a.min);
        assert_eq!(folded.max, a.max);
    }
}
