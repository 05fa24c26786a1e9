//! Axis-aligned bounding box, used for block selection/collision shapes and
//! for `World::is_unobstructed` queries. Block-kind shapes that are not full
//! cubes (torches, crosses, liquids) still expose one of these for their
//! "occupies space" test.

use nalgebra::{Point3, Vector3};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    pub fn unit(origin: Point3<f32>) -> Self {
        Self {
            min: origin,
            max: origin + Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn translated(&self, offset: Vector3<f32>) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Grows (or shrinks, for negative `amount`) the box by `amount` on every
    /// face.
    pub fn inflate(&self, amount: f32) -> Self {
        let delta = Vector3::new(amount, amount, amount);
        Self {
            min: self.min - delta,
            max: self.max + delta,
        }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    pub fn contains_point(&self, point: Point3<f32>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_boxes_do_not_intersect() {
        let a = Aabb::unit(Point3::new(0.0, 0.0, 0.0));
        let b = Aabb::unit(Point3::new(5.0, 0.0, 0.0));
        assert!(!a.intersects(&b));
    }

    #[test]
    fn overlapping_boxes_intersect() {
        let a = Aabb::unit(Point3::new(0.0, 0.0, 0.0));
        let b = Aabb::new(Point3::new(0.5, 0.5, 0.5), Point3::new(1.5, 1.5, 1.5));
        assert!(a.intersects(&b));
    }

    #[test]
    fn touching_faces_do_not_intersect() {
        let a = Aabb::unit(Point3::new(0.0, 0.0, 0.0));
        let b = Aabb::unit(Point3::new(1.0, 0.0, 0.0));
        assert!(!a.intersects(&b));
    }
}
