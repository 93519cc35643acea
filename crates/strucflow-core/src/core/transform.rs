use nalgebra::{Matrix3, Point3, Rotation3, Unit, Vector3};

/// A rotation followed by a translation, `x' = R x + t`.
///
/// The rotation is kept as a general 3x3 matrix rather than a `Rotation3` because it is
/// recovered verbatim from an external tool's text output, which rounds its entries; the
/// matrix is passed on to the engine exactly as reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

impl RigidTransform {
    pub fn new(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Builds a transform from a rotation about `axis` by `angle_degrees` and a translation.
    pub fn from_axis_angle(
        axis: &Vector3<f64>,
        angle_degrees: f64,
        translation: Vector3<f64>,
    ) -> Self {
        let rotation =
            Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle_degrees.to_radians());
        Self {
            rotation: *rotation.matrix(),
            translation,
        }
    }

    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation * point.coords + self.translation)
    }

    pub fn apply_all(&self, points: &[Point3<f64>]) -> Vec<Point3<f64>> {
        points.iter().map(|p| self.apply(p)).collect()
    }

    /// Row-major rotation entries, the order in which the engine's move command takes them.
    pub fn rotation_row_major(&self) -> [f64; 9] {
        let r = &self.rotation;
        [
            r[(0, 0)],
            r[(0, 1)],
            r[(0, 2)],
            r[(1, 0)],
            r[(1, 1)],
            r[(1, 2)],
            r[(2, 0)],
            r[(2, 1)],
            r[(2, 2)],
        ]
    }

    pub fn translation_components(&self) -> [f64; 3] {
        [self.translation.x, self.translation.y, self.translation.z]
    }

    /// Whether the rotation part is orthonormal with determinant +1, within `tolerance`.
    pub fn is_proper_rotation(&self, tolerance: f64) -> bool {
        let should_be_identity = self.rotation * self.rotation.transpose();
        (should_be_identity - Matrix3::identity()).amax() <= tolerance
            && (self.rotation.determinant() - 1.0).abs() <= tolerance
    }
}
