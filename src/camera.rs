use nalgebra::{Matrix4, Point3, Vector3};

use crate::error::TransformError;
use crate::math::{
    deg_to_rad, look_at, perspective, rad_to_deg, rotate_x, rotate_y, rotate_z, translate,
};
use crate::options::{CameraOptions, ControlOptions};

/// Accumulated camera parameters, mutated by input and read once per frame.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CameraState {
    /// World-space offset applied after the view.
    pub(crate) translation: Vector3<f32>,
    /// Radians around local X, Y, Z. Accumulates without wrapping.
    pub(crate) rotation: Vector3<f32>,
    field_of_view: f32,
    min_fov_degrees: f32,
    max_fov_degrees: f32,
    zoom_speed: f32,
}

impl CameraState {
    pub(crate) fn new(camera: &CameraOptions, controls: &ControlOptions) -> Self {
        let min_fov_degrees = camera.min_fov_degrees.min(camera.max_fov_degrees);
        let max_fov_degrees = camera.max_fov_degrees.max(camera.min_fov_degrees);
        let [rx, ry, rz] = camera.rotation_degrees;

        Self {
            translation: Vector3::from(camera.translation),
            rotation: Vector3::new(deg_to_rad(rx), deg_to_rad(ry), deg_to_rad(rz)),
            field_of_view: deg_to_rad(camera.fov_degrees.clamp(min_fov_degrees, max_fov_degrees)),
            min_fov_degrees,
            max_fov_degrees,
            zoom_speed: controls.zoom_speed,
        }
    }

    /// Vertical field of view in radians, always inside the configured bounds.
    pub(crate) fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    fn is_finite(&self) -> bool {
        self.field_of_view.is_finite()
            && self.translation.iter().all(|v| v.is_finite())
            && self.rotation.iter().all(|v| v.is_finite())
    }

    /// Narrows or widens the field of view from a wheel delta (positive = scroll down).
    pub(crate) fn apply_zoom(&mut self, wheel_delta_y: f32) {
        let degrees = rad_to_deg(self.field_of_view) + wheel_delta_y * -self.zoom_speed;
        let degrees = degrees.clamp(self.min_fov_degrees, self.max_fov_degrees);
        self.field_of_view = deg_to_rad(degrees);
        log::trace!("zoom {} -> fov {:.2}°", wheel_delta_y, degrees);
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new(&CameraOptions::default(), &ControlOptions::default())
    }
}

/// Fixed projection and look-at setup feeding the per-frame pipeline.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Projection {
    znear: f32,
    zfar: f32,
    eye: Point3<f32>,
    target: Point3<f32>,
    up: Vector3<f32>,
}

impl Projection {
    /// Validates the clip range and look-at basis up front.
    pub(crate) fn new(camera: &CameraOptions) -> Result<Self, TransformError> {
        let (znear, zfar) = (camera.near, camera.far);
        if !(znear > 0.0 && zfar > znear && zfar.is_finite()) {
            return Err(TransformError::InvalidClipRange { near: znear, far: zfar });
        }

        let projection = Self {
            znear,
            zfar,
            eye: Point3::from(camera.eye),
            target: Point3::from(camera.target),
            up: Vector3::from(camera.up),
        };
        projection.camera_matrix()?;
        Ok(projection)
    }

    fn camera_matrix(&self) -> Result<Matrix4<f32>, TransformError> {
        look_at(&self.eye, &self.target, &self.up)
    }

    /// `projection * inverse(look_at)`, before any camera state is applied.
    pub(crate) fn base_view_projection(
        &self,
        fov: f32,
        aspect: f32,
    ) -> Result<Matrix4<f32>, TransformError> {
        if !(aspect.is_finite() && aspect > 0.0) {
            return Err(TransformError::InvalidAspect(aspect));
        }

        let projection = perspective(fov, aspect, self.znear, self.zfar);
        let view = self
            .camera_matrix()?
            .try_inverse()
            .ok_or(TransformError::DegenerateCamera)?;
        Ok(projection * view)
    }

    /// Builds the frame matrix: view-projection, then translation, then
    /// rotation about X, Y and Z in that order.
    pub(crate) fn view_projection(
        &self,
        camera: &CameraState,
        aspect: f32,
    ) -> Result<Matrix4<f32>, TransformError> {
        if !camera.is_finite() {
            return Err(TransformError::NonFiniteCamera);
        }
        let matrix = self.base_view_projection(camera.field_of_view(), aspect)?;
        let matrix = translate(&matrix, &camera.translation);
        let matrix = rotate_x(&matrix, camera.rotation.x);
        let matrix = rotate_y(&matrix, camera.rotation.y);
        Ok(rotate_z(&matrix, camera.rotation.z))
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            znear: 1.0,
            zfar: 2000.0,
            eye: Point3::new(0.0, 0.0, 100.0),
            target: Point3::origin(),
            up: Vector3::y(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct CameraUniform {
    pub(crate) view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub(crate) fn new() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
        }
    }

    pub(crate) fn update_view_proj(&mut self, view_projection: &Matrix4<f32>) {
        self.view_proj = (*view_projection).into();
    }
}
