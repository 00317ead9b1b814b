//! Matrix and angle helpers for the camera pipeline.
//!
//! Every `translate`/`rotate_*` helper right-multiplies into the matrix it is
//! given, so transforms apply in the local frame of what came before.

use std::f32::consts::{FRAC_PI_2, PI};

use nalgebra::{Matrix4, Point3, Vector3};

use crate::error::TransformError;

/// Vectors shorter than this are treated as zero when building a basis.
const MIN_AXIS_NORM: f32 = 1e-7;

pub(crate) fn deg_to_rad(degrees: f32) -> f32 {
    degrees * PI / 180.0
}

pub(crate) fn rad_to_deg(radians: f32) -> f32 {
    radians * 180.0 / PI
}

/// Right-handed perspective projection mapping depth to `[-1, 1]`.
///
/// Callers must ensure `aspect > 0` and `far > near > 0`.
#[rustfmt::skip]
pub(crate) fn perspective(fov_radians: f32, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
    let f = (FRAC_PI_2 - 0.5 * fov_radians).tan();
    let range_inv = 1.0 / (near - far);

    Matrix4::new(
        f / aspect, 0.0, 0.0,                       0.0,
        0.0,        f,   0.0,                       0.0,
        0.0,        0.0, (near + far) * range_inv,  near * far * range_inv * 2.0,
        0.0,        0.0, -1.0,                      0.0,
    )
}

/// Camera (not view) matrix: the basis columns followed by the eye position.
#[rustfmt::skip]
pub(crate) fn look_at(
    eye: &Point3<f32>,
    target: &Point3<f32>,
    up: &Vector3<f32>,
) -> Result<Matrix4<f32>, TransformError> {
    let z_axis = (eye - target)
        .try_normalize(MIN_AXIS_NORM)
        .ok_or(TransformError::DegenerateCamera)?;
    let x_axis = up
        .cross(&z_axis)
        .try_normalize(MIN_AXIS_NORM)
        .ok_or(TransformError::DegenerateCamera)?;
    let y_axis = z_axis
        .cross(&x_axis)
        .try_normalize(MIN_AXIS_NORM)
        .ok_or(TransformError::DegenerateCamera)?;

    Ok(Matrix4::new(
        x_axis.x, y_axis.x, z_axis.x, eye.x,
        x_axis.y, y_axis.y, z_axis.y, eye.y,
        x_axis.z, y_axis.z, z_axis.z, eye.z,
        0.0,      0.0,      0.0,      1.0,
    ))
}

pub(crate) fn translate(matrix: &Matrix4<f32>, offset: &Vector3<f32>) -> Matrix4<f32> {
    matrix * Matrix4::new_translation(offset)
}

#[rustfmt::skip]
pub(crate) fn rotate_x(matrix: &Matrix4<f32>, angle: f32) -> Matrix4<f32> {
    let (s, c) = angle.sin_cos();
    matrix * Matrix4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, c,   -s,  0.0,
        0.0, s,   c,   0.0,
        0.0, 0.0, 0.0, 1.0,
    )
}

#[rustfmt::skip]
pub(crate) fn rotate_y(matrix: &Matrix4<f32>, angle: f32) -> Matrix4<f32> {
    let (s, c) = angle.sin_cos();
    matrix * Matrix4::new(
        c,   0.0, s,   0.0,
        0.0, 1.0, 0.0, 0.0,
        -s,  0.0, c,   0.0,
        0.0, 0.0, 0.0, 1.0,
    )
}

#[rustfmt::skip]
pub(crate) fn rotate_z(matrix: &Matrix4<f32>, angle: f32) -> Matrix4<f32> {
    let (s, c) = angle.sin_cos();
    matrix * Matrix4::new(
        c,   -s,  0.0, 0.0,
        s,   c,   0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    )
}

#[cfg(test)]
pub(crate) fn assert_matrix_close(actual: &Matrix4<f32>, expected: &Matrix4<f32>, epsilon: f32) {
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            (a - e).abs() <= epsilon * e.abs().max(1.0),
            "element {} differs: {} vs {}\nactual: {}\nexpected: {}",
            i,
            a,
            e,
            actual,
            expected
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degree_radian_round_trip() {
        for value in [-720.5_f32, -1.0, 0.0, 0.25, 30.0, 359.9, 12345.0] {
            let back = rad_to_deg(deg_to_rad(value));
            assert!((back - value).abs() <= 1e-5 * value.abs().max(1.0), "{} -> {}", value, back);

            let back = deg_to_rad(rad_to_deg(value));
            assert!((back - value).abs() <= 1e-5 * value.abs().max(1.0), "{} -> {}", value, back);
        }
    }

    #[test]
    fn perspective_matches_gl_convention() {
        let fov = deg_to_rad(60.0);
        let ours = perspective(fov, 4.0 / 3.0, 1.0, 2000.0);
        let reference = Matrix4::new_perspective(4.0 / 3.0, fov, 1.0, 2000.0);
        assert_matrix_close(&ours, &reference, 1e-5);
        assert_eq!(ours[(3, 2)], -1.0);
        assert_eq!(ours[(3, 3)], 0.0);
    }

    #[test]
    fn inverse_look_at_matches_view_matrix() {
        let eye = Point3::new(0.0, 0.0, 100.0);
        let target = Point3::origin();
        let up = Vector3::y();

        let camera = look_at(&eye, &target, &up).unwrap();
        let view = camera.try_inverse().unwrap();
        assert_matrix_close(&view, &Matrix4::look_at_rh(&eye, &target, &up), 1e-5);

        // Camera matrix carries the eye as its translation column.
        assert_eq!(camera[(0, 3)], 0.0);
        assert_eq!(camera[(2, 3)], 100.0);
    }

    #[test]
    fn look_at_rejects_degenerate_basis() {
        let eye = Point3::new(1.0, 2.0, 3.0);
        assert_eq!(
            look_at(&eye, &eye, &Vector3::y()),
            Err(TransformError::DegenerateCamera)
        );
        assert_eq!(
            look_at(&Point3::new(0.0, 10.0, 0.0), &Point3::origin(), &Vector3::y()),
            Err(TransformError::DegenerateCamera)
        );
    }

    #[test]
    fn rotations_match_axis_angle() {
        let identity = Matrix4::identity();
        let angle = 0.7;
        assert_matrix_close(
            &rotate_x(&identity, angle),
            &Matrix4::from_axis_angle(&Vector3::x_axis(), angle),
            1e-6,
        );
        assert_matrix_close(
            &rotate_y(&identity, angle),
            &Matrix4::from_axis_angle(&Vector3::y_axis(), angle),
            1e-6,
        );
        assert_matrix_close(
            &rotate_z(&identity, angle),
            &Matrix4::from_axis_angle(&Vector3::z_axis(), angle),
            1e-6,
        );
    }

    #[test]
    fn translate_applies_in_local_frame() {
        let rotated = rotate_z(&Matrix4::identity(), FRAC_PI_2);
        let moved = translate(&rotated, &Vector3::new(1.0, 0.0, 0.0));
        // Local +X is world +Y after a quarter turn around Z.
        assert!(moved[(0, 3)].abs() < 1e-6);
        assert!((moved[(1, 3)] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rotation_order_is_significant() {
        let identity = Matrix4::identity();
        let x_then_y = rotate_y(&rotate_x(&identity, 0.5), 0.8);
        let y_then_x = rotate_x(&rotate_y(&identity, 0.8), 0.5);
        let max_difference = (x_then_y - y_then_x).amax();
        assert!(max_difference > 1e-3, "rotations commuted: {}", max_difference);
    }
}
