use crate::interior::{InteriorId, InteriorList};
use glam::{vec3, Vec3};

/// The ray data type. Carries the ordered list of interiors the origin is
/// considered inside, so refraction always knows which medium it leaves.
#[derive(Clone, Debug, Default)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub inv_direction: Vec3,
    /// Media the ray origin is inside, innermost last. Never contains the
    /// same interior twice.
    pub interiors: InteriorList,
    /// Whether this is a primary camera ray.
    pub primary: bool,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let inv_direction = vec3(
            1.0 / direction.x,
            1.0 / direction.y,
            1.0 / direction.z,
        );

        Self {
            origin,
            direction,
            inv_direction,
            interiors: InteriorList::new(),
            primary: false,
        }
    }

    pub fn point_at_parameter(&self, t: f32) -> Vec3 {
        self.origin + t * self.direction
    }

    /// Record that the ray has entered a medium. Duplicates are suppressed.
    pub fn enter(&mut self, interior: InteriorId) {
        if !self.interiors.contains(&interior) {
            self.interiors.push(interior);
        }
    }

    /// Record that the ray has left a medium.
    pub fn exit(&mut self, interior: InteriorId) {
        if let Some(index) = self.interiors.iter().position(|i| *i == interior) {
            self.interiors.remove(index);
        }
    }

    /// Seed the interior list from a precomputed set of containing media.
    pub fn append_interiors(&mut self, interiors: &[InteriorId]) {
        for interior in interiors {
            self.enter(*interior);
        }
    }

    /// The innermost medium the ray is currently in, if any.
    pub fn current_interior(&self) -> Option<InteriorId> {
        self.interiors.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_list_rejects_duplicates() {
        let mut ray = Ray::new(Vec3::zero(), vec3(0.0, 0.0, -1.0));
        ray.enter(InteriorId(3));
        ray.enter(InteriorId(7));
        ray.enter(InteriorId(3));
        assert_eq!(ray.interiors.as_slice(), &[InteriorId(3), InteriorId(7)]);

        ray.append_interiors(&[InteriorId(7), InteriorId(9)]);
        assert_eq!(
            ray.interiors.as_slice(),
            &[InteriorId(3), InteriorId(7), InteriorId(9)]
        );
    }

    #[test]
    fn exit_removes_only_the_named_interior() {
        let mut ray = Ray::new(Vec3::zero(), vec3(0.0, 0.0, -1.0));
        ray.append_interiors(&[InteriorId(0), InteriorId(1), InteriorId(2)]);
        ray.exit(InteriorId(1));
        assert_eq!(ray.interiors.as_slice(), &[InteriorId(0), InteriorId(2)]);
        assert_eq!(ray.current_interior(), Some(InteriorId(2)));

        ray.exit(InteriorId(5));
        assert_eq!(ray.interiors.len(), 2);
    }

    #[test]
    fn point_at_parameter_walks_the_direction() {
        let ray = Ray::new(vec3(1.0, 0.0, 0.0), vec3(0.0, 2.0, 0.0));
        assert_eq!(ray.point_at_parameter(1.5), vec3(1.0, 3.0, 0.0));
    }
}
