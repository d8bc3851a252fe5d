// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned bounding boxes

use nalgebra::{Matrix4, Point3, Vector3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Point3<f32>,
    /// Maximum corner
    pub max: Point3<f32>,
}

impl Aabb {
    /// Bounds in an invalid state, ready to be expanded
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::MAX, f32::MAX, f32::MAX),
            max: Point3::new(f32::MIN, f32::MIN, f32::MIN),
        }
    }

    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// Check if bounds are valid (at least one point added)
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Expand bounds to include a point
    #[inline]
    pub fn expand(&mut self, p: Point3<f32>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    #[inline]
    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    #[inline]
    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// The eight corners of the box
    pub fn corners(&self) -> [Point3<f32>; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(a.x, b.y, b.z),
            Point3::new(b.x, b.y, b.z),
        ]
    }

    /// Bounds of this box after an affine transform
    ///
    /// Transforms all eight corners and re-bounds them, so the result may be
    /// looser than the transformed geometry under rotation.
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Aabb {
        if !self.is_valid() {
            return *self;
        }
        let mut out = Aabb::empty();
        for corner in self.corners() {
            out.expand(matrix.transform_point(&corner));
        }
        out
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_is_invalid() {
        let mut bounds = Aabb::empty();
        assert!(!bounds.is_valid());
        bounds.expand(Point3::new(1.0, 2.0, 3.0));
        assert!(bounds.is_valid());
        assert_eq!(bounds.size(), Vector3::zeros());
    }

    #[test]
    fn test_center() {
        let bounds = Aabb::new(Point3::new(-2.0, 0.0, 2.0), Point3::new(4.0, 2.0, 6.0));
        assert_eq!(bounds.center(), Point3::new(1.0, 1.0, 4.0));
    }

    #[test]
    fn test_transformed_by_translation_and_scale() {
        let bounds = Aabb::new(Point3::new(-1.0, 0.0, -1.0), Point3::new(1.0, 2.0, 1.0));
        let matrix = Matrix4::new_translation(&Vector3::new(0.0, -3.0, 0.0))
            * Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 0.5, 1.0));
        let out = bounds.transformed(&matrix);
        assert_relative_eq!(out.min, Point3::new(-2.0, -3.0, -1.0), epsilon = 1e-6);
        assert_relative_eq!(out.max, Point3::new(2.0, -2.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_transformed_by_rotation_grows() {
        let bounds = Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        let matrix = nalgebra::Rotation3::from_axis_angle(&Vector3::y_axis(), std::f32::consts::FRAC_PI_4)
            .to_homogeneous();
        let out = bounds.transformed(&matrix);
        assert_relative_eq!(out.max.x, std::f32::consts::SQRT_2, epsilon = 1e-5);
        assert_relative_eq!(out.max.y, 1.0, epsilon = 1e-5);
    }
}
