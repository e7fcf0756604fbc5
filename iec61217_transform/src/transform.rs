use crate::error::{TransformError, TransformResult};
use nalgebra::{Matrix4, Point3, Rotation3, Translation3, Unit, Vector3};
use std::fmt;
use uom::si::angle::radian;
use uom::si::f64::{Angle, Length};
use uom::si::length::millimeter;

/// Homogeneous 4x4 affine matrix, column vectors (p' = M * p), translations in millimeters.
pub type AffineMatrix = Matrix4<f64>;

/// A named transform between a child frame and its parent.
///
/// Operations are pre-multiplied: each new operation is applied in the coordinate system
/// produced by the previous ones, so `identity().translate(..).rotate_z(..)` yields `T * Rz`.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementaryTransform {
    name: String,
    matrix: AffineMatrix,
}

impl ElementaryTransform {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_matrix(name, AffineMatrix::identity())
    }

    pub fn from_matrix(name: impl Into<String>, matrix: AffineMatrix) -> Self {
        Self {
            name: name.into(),
            matrix,
        }
    }

    /// Builds a transform from 16 values in row-major order.
    pub fn from_row_major(name: impl Into<String>, values: &[f64; 16]) -> Self {
        Self::from_matrix(name, AffineMatrix::from_row_slice(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matrix(&self) -> &AffineMatrix {
        &self.matrix
    }

    pub fn identity(&mut self) -> &mut Self {
        self.matrix = AffineMatrix::identity();
        self
    }

    pub fn concatenate(&mut self, matrix: &AffineMatrix) -> &mut Self {
        self.matrix *= matrix;
        self
    }

    pub fn translate(&mut self, x: Length, y: Length, z: Length) -> &mut Self {
        let translation = Translation3::new(
            x.get::<millimeter>(),
            y.get::<millimeter>(),
            z.get::<millimeter>(),
        );
        self.concatenate(&translation.to_homogeneous())
    }

    /// Counter clockwise rotation about X, seen from +X.
    pub fn rotate_x(&mut self, angle: Angle) -> &mut Self {
        self.rotate(Vector3::x_axis(), angle)
    }

    /// Counter clockwise rotation about Y, seen from +Y.
    pub fn rotate_y(&mut self, angle: Angle) -> &mut Self {
        self.rotate(Vector3::y_axis(), angle)
    }

    /// Counter clockwise rotation about Z, seen from +Z.
    pub fn rotate_z(&mut self, angle: Angle) -> &mut Self {
        self.rotate(Vector3::z_axis(), angle)
    }

    fn rotate(&mut self, axis: Unit<Vector3<f64>>, angle: Angle) -> &mut Self {
        let rotation = Rotation3::from_axis_angle(&axis, angle.get::<radian>());
        self.concatenate(&rotation.to_homogeneous())
    }

    pub fn inverse(&self) -> TransformResult<AffineMatrix> {
        self.matrix
            .try_inverse()
            .ok_or_else(|| TransformError::SingularTransform(self.name.clone()))
    }

    /// Maps a point given in the child frame into the parent frame.
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.matrix.transform_point(point)
    }
}

impl fmt::Display for ElementaryTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.matrix)
    }
}

/// Accumulator for a chain of transforms.
/// Concatenation post-multiplies: every new matrix is applied after everything accumulated so far.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedTransform {
    name: String,
    matrix: AffineMatrix,
}

impl ComposedTransform {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            matrix: AffineMatrix::identity(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn concatenate(&mut self, matrix: &AffineMatrix) {
        self.matrix = matrix * self.matrix;
    }

    pub fn matrix(&self) -> &AffineMatrix {
        &self.matrix
    }

    pub fn into_matrix(self) -> AffineMatrix {
        self.matrix
    }
}
