// Transform decomposition for trs-inspect
//
// Matrices are glam `Mat4` (column-major storage), but everything here talks
// about them as `m[row, col]`. Translation sits in column 3, rows 0..=2.

use glam::{Mat3, Mat4, Quat, Vec3, Vec4};
use log::warn;

use crate::error::{DecomposeError, DecomposeResult};

/// Largest cosine between two basis columns before a matrix counts as sheared.
pub const SHEAR_TOLERANCE: f32 = 1e-4;

/// The four ways of reading translation out of a matrix.
///
/// They all read the same three floats, so they agree bit for bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationMethod {
    /// Direct field read of `m03`, `m13`, `m23`
    Fields,
    /// Column accessor, `col(3)`
    Column,
    /// `.w` of rows 0, 1 and 2
    RowW,
    /// Indexed accessor, `m[r, 3]`
    Indexed,
}

impl TranslationMethod {
    pub const ALL: [TranslationMethod; 4] = [
        TranslationMethod::Fields,
        TranslationMethod::Column,
        TranslationMethod::RowW,
        TranslationMethod::Indexed,
    ];
}

/// Reads `m[row, col]`.
pub fn element(m: &Mat4, row: usize, col: usize) -> f32 {
    m.col(col)[row]
}

/// Extracts the translation using the given access method.
pub fn extract_translation_with(m: &Mat4, method: TranslationMethod) -> Vec3 {
    match method {
        TranslationMethod::Fields => Vec3::new(m.w_axis.x, m.w_axis.y, m.w_axis.z),
        TranslationMethod::Column => m.col(3).truncate(),
        TranslationMethod::RowW => Vec3::new(m.row(0).w, m.row(1).w, m.row(2).w),
        TranslationMethod::Indexed => {
            Vec3::new(element(m, 0, 3), element(m, 1, 3), element(m, 2, 3))
        }
    }
}

/// Extracts the translation stored in column 3.
pub fn extract_translation(m: &Mat4) -> Vec3 {
    extract_translation_with(m, TranslationMethod::Column)
}

/// Extracts the lossy scale as the length of each basis column.
///
/// The columns of a pure rotation are unit length, so this holds for any
/// rotation. Reading the diagonal (`m00`, `m11`, `m22`) only works when the
/// rotation is the identity.
pub fn extract_scale(m: &Mat4) -> Vec3 {
    Vec3::new(
        m.col(0).truncate().length(),
        m.col(1).truncate().length(),
        m.col(2).truncate().length(),
    )
}

// Zero, subnormal and non-finite components have no usable reciprocal.
fn check_scale(scale: Vec3) -> DecomposeResult<()> {
    if scale.to_array().iter().any(|s| !s.is_normal()) {
        return Err(DecomposeError::DegenerateScale { scale });
    }
    Ok(())
}

/// Builds a unit quaternion from a pure rotation matrix (Shepperd's method).
///
/// The branch is picked by the largest of the trace and the diagonal entries,
/// which keeps the square root away from zero.
pub fn quat_from_rotation(r: &Mat3) -> Quat {
    let (m00, m10, m20) = (r.x_axis.x, r.x_axis.y, r.x_axis.z);
    let (m01, m11, m21) = (r.y_axis.x, r.y_axis.y, r.y_axis.z);
    let (m02, m12, m22) = (r.z_axis.x, r.z_axis.y, r.z_axis.z);
    let trace = m00 + m11 + m22;

    let q = if trace > 0.0 {
        let s = (trace + 1.0).sqrt() * 2.0; // 4w
        Quat::from_xyzw((m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s, 0.25 * s)
    } else if m00 > m11 && m00 > m22 {
        let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0; // 4x
        Quat::from_xyzw(0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s)
    } else if m11 > m22 {
        let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0; // 4y
        Quat::from_xyzw((m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s)
    } else {
        let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0; // 4z
        Quat::from_xyzw((m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s)
    };

    q.normalize()
}

/// Rotation via an orientation: strip scale from the basis, take its
/// quaternion, and rebuild a pure rotation matrix from that.
pub fn rotation_from_orientation(m: &Mat4, scale: Vec3) -> DecomposeResult<Mat4> {
    check_scale(scale)?;

    let basis = Mat3::from_cols(
        m.col(0).truncate() / scale.x,
        m.col(1).truncate() / scale.y,
        m.col(2).truncate() / scale.z,
    );
    Ok(Mat4::from_quat(quat_from_rotation(&basis)))
}

/// Rotation by algebra: `M * diag(1/sx, 1/sy, 1/sz, 1)` with the
/// translation column zeroed.
pub fn rotation_by_inverse_scale(m: &Mat4, scale: Vec3) -> DecomposeResult<Mat4> {
    check_scale(scale)?;

    let inv_scale = Mat4::from_scale(scale.recip());
    let mut r = *m * inv_scale;
    r.w_axis.x = 0.0;
    r.w_axis.y = 0.0;
    r.w_axis.z = 0.0;
    Ok(r)
}

/// Rebuilds `T * R * S`.
pub fn recompose(translation: Vec3, rotation: &Mat4, scale: Vec3) -> Mat4 {
    Mat4::from_translation(translation) * *rotation * Mat4::from_scale(scale)
}

/// Whether the last row is exactly (0, 0, 0, 1).
pub fn is_affine(m: &Mat4) -> bool {
    m.row(3) == Vec4::W
}

/// Largest absolute cosine between any two basis columns. Zero when the
/// columns are orthogonal.
pub fn shear(m: &Mat4) -> f32 {
    let x = m.col(0).truncate().normalize_or_zero();
    let y = m.col(1).truncate().normalize_or_zero();
    let z = m.col(2).truncate().normalize_or_zero();

    x.dot(y).abs().max(x.dot(z).abs()).max(y.dot(z).abs())
}

/// Translation, scale and rotation recovered from one matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decomposition {
    pub translation: Vec3,
    pub scale: Vec3,
    pub orientation: Quat,
    pub rotation: Mat4,
}

impl Decomposition {
    /// Decomposes an affine, shear-free matrix.
    ///
    /// Projective matrices are rejected. A mirrored matrix gets a negative
    /// x scale so the rotation stays proper. Sheared matrices are decomposed
    /// anyway, with a warning; the rotation then carries the shear.
    pub fn from_matrix(m: &Mat4) -> DecomposeResult<Self> {
        if !is_affine(m) {
            return Err(DecomposeError::NotAffine { last_row: m.row(3) });
        }

        let translation = extract_translation(m);
        let mut scale = extract_scale(m);
        if Mat3::from_mat4(*m).determinant() < 0.0 {
            scale.x = -scale.x;
        }
        let rotation = rotation_by_inverse_scale(m, scale)?;

        let skew = shear(m);
        if skew > SHEAR_TOLERANCE {
            warn!("Matrix is sheared (max column cosine {skew}); rotation will not be orthonormal");
        }

        Ok(Self {
            translation,
            scale,
            orientation: quat_from_rotation(&Mat3::from_mat4(rotation)),
            rotation,
        })
    }

    /// Rebuilds the matrix from the recovered parts.
    pub fn recompose(&self) -> Mat4 {
        recompose(self.translation, &self.rotation, self.scale)
    }
}

/// Represents a 3D transformation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    /// Create a new transform
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Create an identity transform
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Recover a transform from a composed matrix
    pub fn from_matrix(m: &Mat4) -> DecomposeResult<Self> {
        Decomposition::from_matrix(m).map(Self::from)
    }

    /// Generate transformation matrix
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Decomposition> for Transform {
    fn from(d: Decomposition) -> Self {
        Self::new(d.translation, d.orientation, d.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{abs_diff_eq, assert_abs_diff_eq};
    use std::f32::consts::{FRAC_PI_2, PI};

    const EPS: f32 = 1e-5;

    fn trs(t: Vec3, r: Quat, s: Vec3) -> Mat4 {
        Mat4::from_translation(t) * Mat4::from_quat(r) * Mat4::from_scale(s)
    }

    fn samples() -> Vec<(Vec3, Quat, Vec3)> {
        vec![
            (Vec3::ZERO, Quat::IDENTITY, Vec3::ONE),
            (Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_y(FRAC_PI_2), Vec3::new(2.0, 1.0, 1.0)),
            (
                Vec3::new(-4.5, 0.25, 10.0),
                Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.0).normalize(), 0.7),
                Vec3::new(2.0, 3.0, 4.0),
            ),
            (
                Vec3::new(0.0, -7.0, 1.5),
                Quat::from_euler(glam::EulerRot::YXZ, 1.2, -0.4, 2.9),
                Vec3::new(0.5, 0.01, 12.0),
            ),
            (Vec3::splat(100.0), Quat::from_rotation_x(PI - 0.1), Vec3::splat(3.0)),
        ]
    }

    fn naive_diagonal_scale(m: &Mat4) -> Vec3 {
        Vec3::new(element(m, 0, 0), element(m, 1, 1), element(m, 2, 2))
    }

    #[test]
    fn rotate_y_scenario() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))
            * Mat4::from_rotation_y(FRAC_PI_2)
            * Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));

        let translation = extract_translation(&m);
        let scale = extract_scale(&m);
        let rotation = rotation_by_inverse_scale(&m, scale).unwrap();

        assert_eq!(translation, Vec3::new(1.0, 2.0, 3.0));
        assert_abs_diff_eq!(scale, Vec3::new(2.0, 1.0, 1.0), epsilon = EPS);
        assert_abs_diff_eq!(rotation, Mat4::from_rotation_y(FRAC_PI_2), epsilon = EPS);
        assert_abs_diff_eq!(recompose(translation, &rotation, scale), m, epsilon = EPS);
    }

    #[test]
    fn translation_methods_agree_exactly() {
        for (t, r, s) in samples() {
            let m = trs(t, r, s);
            let expected = extract_translation_with(&m, TranslationMethod::Fields);
            for method in TranslationMethod::ALL {
                assert_eq!(extract_translation_with(&m, method), expected, "{method:?}");
            }
            assert_eq!(expected, t);
        }
    }

    #[test]
    fn indexed_access_uses_row_then_column() {
        let m = Mat4::from_cols_array_2d(&[
            [0.0, 1.0, 2.0, 3.0],
            [4.0, 5.0, 6.0, 7.0],
            [8.0, 9.0, 10.0, 11.0],
            [12.0, 13.0, 14.0, 15.0],
        ]);
        assert_eq!(element(&m, 1, 0), 1.0);
        assert_eq!(element(&m, 0, 3), 12.0);
        assert_eq!(element(&m, 2, 3), 14.0);
    }

    #[test]
    fn column_magnitude_scale_survives_rotation() {
        for (t, r, s) in samples() {
            let m = trs(t, r, s);
            assert_abs_diff_eq!(extract_scale(&m), s, epsilon = EPS);
        }
    }

    #[test]
    fn diagonal_scale_is_only_right_without_rotation() {
        let s = Vec3::new(2.0, 3.0, 4.0);
        let t = Vec3::new(1.0, 2.0, 3.0);

        let unrotated = trs(t, Quat::IDENTITY, s);
        assert_eq!(naive_diagonal_scale(&unrotated), s);

        for angle in [0.3, FRAC_PI_2, 2.0] {
            let r = Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.0).normalize(), angle);
            let m = trs(t, r, s);
            assert!(!abs_diff_eq!(naive_diagonal_scale(&m), s, epsilon = EPS));
            assert_abs_diff_eq!(extract_scale(&m), s, epsilon = EPS);
        }
    }

    #[test]
    fn both_rotation_methods_recover_rotation() {
        for (t, r, s) in samples() {
            let m = trs(t, r, s);
            let scale = extract_scale(&m);
            let expected = Mat4::from_quat(r);

            let via_orientation = rotation_from_orientation(&m, scale).unwrap();
            let via_inverse = rotation_by_inverse_scale(&m, scale).unwrap();

            assert_abs_diff_eq!(via_orientation, expected, epsilon = 1e-4);
            assert_abs_diff_eq!(via_inverse, expected, epsilon = 1e-4);
            assert_abs_diff_eq!(via_orientation, via_inverse, epsilon = 1e-4);
        }
    }

    #[test]
    fn full_round_trip() {
        for (t, r, s) in samples() {
            let m = trs(t, r, s);
            let translation = extract_translation(&m);
            let scale = extract_scale(&m);
            let rotation = rotation_from_orientation(&m, scale).unwrap();

            let rebuilt = recompose(translation, &rotation, scale);
            for (a, b) in rebuilt.to_cols_array().iter().zip(m.to_cols_array().iter()) {
                assert_abs_diff_eq!(a, b, epsilon = 1e-4 * b.abs().max(1.0));
            }
        }
    }

    #[test]
    fn zero_scale_is_signalled() {
        let m = Mat4::from_translation(Vec3::X) * Mat4::from_scale(Vec3::new(0.0, 1.0, 1.0));
        let scale = extract_scale(&m);
        assert_eq!(scale, Vec3::new(0.0, 1.0, 1.0));

        assert_eq!(
            rotation_by_inverse_scale(&m, scale),
            Err(DecomposeError::DegenerateScale { scale })
        );
        assert!(rotation_from_orientation(&m, scale).is_err());
        assert!(matches!(
            Decomposition::from_matrix(&m),
            Err(DecomposeError::DegenerateScale { .. })
        ));
    }

    #[test]
    fn non_finite_scale_is_signalled() {
        let scale = Vec3::new(1.0, f32::NAN, 1.0);
        assert!(rotation_by_inverse_scale(&Mat4::IDENTITY, scale).is_err());

        let scale = Vec3::new(1.0, 1.0, f32::INFINITY);
        assert!(rotation_by_inverse_scale(&Mat4::IDENTITY, scale).is_err());
    }

    #[test]
    fn shepperd_covers_every_branch() {
        let cases = [
            Quat::IDENTITY,
            Quat::from_rotation_x(PI - 0.1),
            Quat::from_rotation_y(PI - 0.1),
            Quat::from_rotation_z(PI - 0.1),
            Quat::from_rotation_x(PI),
        ];
        for expected in cases {
            let q = quat_from_rotation(&Mat3::from_quat(expected));
            // q and -q are the same rotation
            assert_abs_diff_eq!(q.dot(expected).abs(), 1.0, epsilon = EPS);
            assert_abs_diff_eq!(q.length(), 1.0, epsilon = EPS);
        }
    }

    #[test]
    fn decomposition_rejects_projective_matrices() {
        let m = Mat4::perspective_rh(FRAC_PI_2, 1.5, 0.1, 100.0);
        assert!(!is_affine(&m));
        assert!(matches!(
            Decomposition::from_matrix(&m),
            Err(DecomposeError::NotAffine { .. })
        ));
    }

    #[test]
    fn reflections_fold_into_negative_x_scale() {
        let m = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0));
        let d = Decomposition::from_matrix(&m).unwrap();
        assert_eq!(d.scale, Vec3::new(-1.0, 1.0, 1.0));
        assert_eq!(d.rotation, Mat4::IDENTITY);
        assert_eq!(d.recompose(), m);

        let r = Quat::from_rotation_y(0.5);
        let m = trs(Vec3::new(1.0, 2.0, 3.0), r, Vec3::new(-1.0, 1.0, 1.0));
        let d = Decomposition::from_matrix(&m).unwrap();
        assert_abs_diff_eq!(d.scale, Vec3::new(-1.0, 1.0, 1.0), epsilon = EPS);
        assert_abs_diff_eq!(d.orientation.dot(r).abs(), 1.0, epsilon = EPS);
        assert_abs_diff_eq!(d.recompose(), m, epsilon = EPS);

        // Mirroring another axis still lands on a proper rotation
        let m = trs(Vec3::ZERO, r, Vec3::new(2.0, -3.0, 1.0));
        let d = Decomposition::from_matrix(&m).unwrap();
        assert!(d.scale.x < 0.0);
        assert_abs_diff_eq!(Mat3::from_mat4(d.rotation).determinant(), 1.0, epsilon = EPS);
        assert_abs_diff_eq!(d.recompose(), m, epsilon = 1e-4);
    }

    #[test]
    fn tiny_uniform_scale_is_not_degenerate() {
        let r = Quat::from_rotation_y(FRAC_PI_2);
        let m = trs(Vec3::new(1.0, 2.0, 3.0), r, Vec3::splat(1e-7));
        let scale = extract_scale(&m);

        let rotation = rotation_by_inverse_scale(&m, scale).unwrap();
        assert_abs_diff_eq!(rotation, Mat4::from_quat(r), epsilon = EPS);
        assert_abs_diff_eq!(rotation_from_orientation(&m, scale).unwrap(), rotation, epsilon = EPS);

        let d = Decomposition::from_matrix(&m).unwrap();
        assert_abs_diff_eq!(d.scale, Vec3::splat(1e-7), epsilon = 1e-12);
        assert_abs_diff_eq!(d.recompose(), m, epsilon = EPS);
    }

    #[test]
    fn subnormal_scale_is_signalled() {
        let scale = Vec3::new(1.0, 1e-40, 1.0);
        assert_eq!(
            rotation_by_inverse_scale(&Mat4::IDENTITY, scale),
            Err(DecomposeError::DegenerateScale { scale })
        );
    }

    #[test]
    fn sheared_matrices_still_decompose() {
        let mut m = Mat4::IDENTITY;
        m.y_axis = Vec4::new(0.5, 1.0, 0.0, 0.0);
        assert!(shear(&m) > SHEAR_TOLERANCE);

        let d = Decomposition::from_matrix(&m).unwrap();
        assert_abs_diff_eq!(d.scale.y, 1.25_f32.sqrt(), epsilon = EPS);
        assert_abs_diff_eq!(d.recompose(), m, epsilon = EPS);
    }

    #[test]
    fn shear_free_matrices_report_no_shear() {
        for (t, r, s) in samples() {
            assert!(shear(&trs(t, r, s)) < SHEAR_TOLERANCE);
        }
    }

    #[test]
    fn transform_round_trips_through_matrix() {
        for (t, r, s) in samples() {
            let transform = Transform::new(t, r, s);
            let recovered = Transform::from_matrix(&transform.matrix()).unwrap();

            assert_abs_diff_eq!(recovered.position, t, epsilon = EPS);
            assert_abs_diff_eq!(recovered.scale, s, epsilon = EPS);
            assert_abs_diff_eq!(recovered.rotation.dot(r).abs(), 1.0, epsilon = 1e-4);
        }
    }
}
