//! Point/object conditions used to work out which media contain a point
//! before a primary ray is traced.

use crate::interior::InteriorList;
use crate::scene::SceneObject;
use glam::Vec3;

/// Predicate applied at the leaves of a containment walk.
pub trait PointObjectCondition {
    /// Returns whether the object satisfied the condition for `point`.
    fn evaluate(&mut self, point: Vec3, object: &SceneObject) -> bool;
}

/// Answers only whether any object with a defined interior contains the
/// point.
#[derive(Debug, Default)]
pub struct HasInteriorCondition {
    pub found: bool,
}

impl PointObjectCondition for HasInteriorCondition {
    fn evaluate(&mut self, point: Vec3, object: &SceneObject) -> bool {
        let inside = object.interior.is_some() && object.shape.inside(point);
        self.found = self.found || inside;
        inside
    }
}

/// Collects the interiors of every object containing the point,
/// suppressing duplicates, to seed a ray's interior list.
#[derive(Debug)]
pub struct ContainingInteriorsCondition<'a> {
    pub interiors: &'a mut InteriorList,
}

impl PointObjectCondition for ContainingInteriorsCondition<'_> {
    fn evaluate(&mut self, point: Vec3, object: &SceneObject) -> bool {
        match object.interior {
            Some(interior) if object.shape.inside(point) => {
                if !self.interiors.contains(&interior) {
                    self.interiors.push(interior);
                }
                true
            }
            _ => false,
        }
    }
}
