use crate::bvh::Bvh;
use crate::containers::{ContainingInteriorsCondition, HasInteriorCondition, PointObjectCondition};
use crate::interior::{Interior, InteriorId, InteriorList};
use crate::material::Material;
use crate::primitives::{Intersection, Primitive};
use crate::ray::Ray;
use glam::Vec3;

/// One shape in the scene together with its surface material and, for
/// solids, the medium filling it.
pub struct SceneObject {
    pub shape: Box<dyn Primitive>,
    pub material: Material,
    pub interior: Option<InteriorId>,
}

/// Nearest intersection along a ray, resolved to a scene object.
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    pub depth: f32,
    pub point: Vec3,
    pub normal: Vec3,
    pub object: usize,
}

/// Read-only scene geometry shared by every worker: objects, the interior
/// table, and the spatial index. Unbounded objects stay out of the tree
/// and are tested linearly.
pub struct Scene {
    objects: Vec<SceneObject>,
    interiors: Vec<Interior>,
    tree: Bvh,
    unbounded: Vec<usize>,
}

impl Scene {
    pub fn new(objects: Vec<SceneObject>, interiors: Vec<Interior>) -> Self {
        let mut finite = Vec::new();
        let mut unbounded = Vec::new();
        for (index, object) in objects.iter().enumerate() {
            let bounds = object.shape.bounds();
            if bounds.infinite {
                unbounded.push(index);
            } else {
                finite.push((index, bounds));
            }
        }

        let tree = Bvh::new(&finite);

        Self {
            objects,
            interiors,
            tree,
            unbounded,
        }
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn interior(&self, id: InteriorId) -> &Interior {
        &self.interiors[id.0]
    }

    /// Nearest intersection within `max_depth`. `stack` is caller-owned
    /// scratch so the hot path never allocates.
    pub fn nearest_intersection(
        &self,
        ray: &Ray,
        max_depth: f32,
        stack: &mut Vec<Intersection>,
    ) -> Option<RayHit> {
        let mut best: Option<(usize, Intersection)> = None;
        let mut closest = max_depth;

        {
            let objects = &self.objects;
            let best = &mut best;
            let mut visit = |index: usize, closest: f32| -> f32 {
                let object = &objects[index];
                if !object.shape.intersect_bounds(ray, closest) {
                    return closest;
                }

                stack.clear();
                if object.shape.all_intersections(ray, stack) {
                    // Per primitive the stack is ascending, so the first
                    // entry is its nearest.
                    let nearest = stack[0];
                    if nearest.depth < closest {
                        *best = Some((index, nearest));
                        return nearest.depth;
                    }
                }

                closest
            };

            for &index in &self.unbounded {
                closest = visit(index, closest);
            }
            self.tree.walk_ray(ray, &mut closest, &mut visit);
        }

        best.map(|(object, intersection)| RayHit {
            depth: intersection.depth,
            point: intersection.point,
            normal: self.objects[object].shape.normal(&intersection),
            object,
        })
    }

    /// Applies a containment condition to every object that could hold
    /// `point`: the unbounded list plus the tree nodes containing it.
    pub fn visit_containing<C>(&self, point: Vec3, condition: &mut C)
    where
        C: PointObjectCondition,
    {
        for &index in &self.unbounded {
            condition.evaluate(point, &self.objects[index]);
        }

        let objects = &self.objects;
        self.tree.walk_point(point, &mut |index| {
            condition.evaluate(point, &objects[index]);
        });
    }

    /// Collects the interiors containing `point` into `out`, innermost
    /// media included exactly once.
    pub fn containing_interiors(&self, point: Vec3, out: &mut InteriorList) {
        let mut condition = ContainingInteriorsCondition { interiors: out };
        self.visit_containing(point, &mut condition);
    }

    /// Whether `point` is inside any object with a defined interior.
    pub fn has_interior_at(&self, point: Vec3) -> bool {
        let mut condition = HasInteriorCondition::default();
        self.visit_containing(point, &mut condition);
        condition.found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{Plane, Sphere};
    use crate::MAX_DISTANCE;
    use glam::vec3;

    fn solid(shape: Box<dyn Primitive>, interior: Option<InteriorId>) -> SceneObject {
        SceneObject {
            shape,
            material: Material::Lambertian {
                albedo: vec3(0.5, 0.5, 0.5),
            },
            interior,
        }
    }

    fn nested_scene(outer_first: bool) -> Scene {
        // Outer glass ball with interior A, inner bubble with interior B.
        let outer = solid(Box::new(Sphere::new(Vec3::zero(), 5.0)), Some(InteriorId(0)));
        let inner = solid(Box::new(Sphere::new(Vec3::zero(), 2.0)), Some(InteriorId(1)));
        let objects = if outer_first {
            vec![outer, inner]
        } else {
            vec![inner, outer]
        };
        Scene::new(objects, vec![Interior::new(1.5), Interior::new(1.0)])
    }

    #[test]
    fn nested_interiors_are_each_collected_exactly_once() {
        for &outer_first in &[true, false] {
            let scene = nested_scene(outer_first);

            let mut interiors = InteriorList::new();
            scene.containing_interiors(vec3(0.0, 1.0, 0.0), &mut interiors);

            assert_eq!(interiors.len(), 2, "outer_first = {}", outer_first);
            assert!(interiors.contains(&InteriorId(0)));
            assert!(interiors.contains(&InteriorId(1)));
        }
    }

    #[test]
    fn points_between_the_shells_see_only_the_outer_interior() {
        let scene = nested_scene(true);

        let mut interiors = InteriorList::new();
        scene.containing_interiors(vec3(0.0, 3.5, 0.0), &mut interiors);
        assert_eq!(interiors.as_slice(), &[InteriorId(0)]);

        assert!(scene.has_interior_at(vec3(0.0, 3.5, 0.0)));
        assert!(!scene.has_interior_at(vec3(0.0, 8.0, 0.0)));
    }

    #[test]
    fn objects_without_interiors_are_ignored_by_the_tracker() {
        let objects = vec![solid(Box::new(Sphere::new(Vec3::zero(), 5.0)), None)];
        let scene = Scene::new(objects, Vec::new());

        let mut interiors = InteriorList::new();
        scene.containing_interiors(Vec3::zero(), &mut interiors);
        assert!(interiors.is_empty());
        assert!(!scene.has_interior_at(Vec3::zero()));
    }

    #[test]
    fn nearest_intersection_picks_the_closer_object() {
        let objects = vec![
            solid(Box::new(Plane::new(vec3(0.0, 1.0, 0.0), -2.0)), None),
            solid(Box::new(Sphere::new(vec3(0.0, 0.0, -5.0), 1.0)), None),
        ];
        let scene = Scene::new(objects, Vec::new());

        let ray = Ray::new(Vec3::zero(), vec3(0.0, 0.0, -1.0));
        let mut stack = Vec::new();
        let hit = scene.nearest_intersection(&ray, MAX_DISTANCE, &mut stack);

        let hit = hit.expect("sphere in front of the ray");
        assert_eq!(hit.object, 1);
        assert!((hit.depth - 4.0).abs() < 1.0e-4);
        assert!((hit.normal - vec3(0.0, 0.0, 1.0)).length() < 1.0e-4);

        // Aimed down, the unbounded plane is the only thing to hit.
        let down = Ray::new(Vec3::zero(), vec3(0.0, -1.0, 0.0));
        let hit = scene.nearest_intersection(&down, MAX_DISTANCE, &mut stack);
        let hit = hit.expect("ground plane below");
        assert_eq!(hit.object, 0);
        assert!((hit.depth - 2.0).abs() < 1.0e-4);
    }
}
