// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Translation / rotation / scale transforms for rig nodes

use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, UnitQuaternion, Vector3};

/// Local transform of a scene node, composed as `T * R * S`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_translation(translation: Vector3<f32>) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    pub fn with_rotation(mut self, rotation: UnitQuaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }

    /// Homogeneous matrix for this transform
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.translation)
            * self.rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }

    #[inline]
    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        self.to_matrix().transform_point(point)
    }

    /// Decompose an affine matrix into translation, rotation and scale
    ///
    /// Shear is discarded. A negative determinant flips the X scale.
    pub fn from_matrix(matrix: &Matrix4<f32>) -> Self {
        let translation = Vector3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]);
        let linear: Matrix3<f32> = matrix.fixed_view::<3, 3>(0, 0).into_owned();

        let mut scale = Vector3::new(
            linear.column(0).norm(),
            linear.column(1).norm(),
            linear.column(2).norm(),
        );
        if linear.determinant() < 0.0 {
            scale.x = -scale.x;
        }

        if scale.iter().any(|s| s.abs() < f32::EPSILON) {
            return Self {
                translation,
                rotation: UnitQuaternion::identity(),
                scale,
            };
        }

        let mut basis = linear;
        for (i, s) in scale.iter().enumerate() {
            basis.column_mut(i).unscale_mut(*s);
        }
        let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix(&basis));

        Self {
            translation,
            rotation,
            scale,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
