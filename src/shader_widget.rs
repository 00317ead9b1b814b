//! Shader widget hosting the interactive camera.
//!
//! The widget state owns the camera, its controller and the input queue.
//! Input events are only queued; the queue is drained on the frame's redraw
//! event, right before the view-projection matrix is rebuilt, so `draw` always
//! sees a fully applied camera.

use iced::advanced::Shell;
use iced::widget::shader::{self, wgpu};
use iced::{Rectangle, event, keyboard, mouse, touch, window};
use nalgebra::{Matrix4, Point2};

use crate::Message;
use crate::camera::{CameraState, CameraUniform, Projection};
use crate::input::{CameraController, ClientRect, GestureMode, InputEvent, InputQueue, Viewport};
use crate::options::{ModifierKey, SketchOptions};
use crate::renderer::Renderer;

/// Aspect ratio used until the widget has been laid out.
const INITIAL_ASPECT: f32 = 800.0 / 600.0;

/// Matrix snapshot handed to the renderer each frame.
#[derive(Debug, Clone)]
pub(crate) struct SketchPrimitive {
    uniform: CameraUniform,
    /// Ratio the pointer mapping assumed for this frame.
    device_pixel_ratio: f32,
}

/// Last scale factor reported by the window, kept in shader storage.
#[derive(Debug, Default)]
pub(crate) struct ScaleFactorCheck {
    reported: Option<f32>,
}

impl ScaleFactorCheck {
    /// Records the window's scale factor. Warns once per new value that
    /// disagrees with the configured device pixel ratio and returns whether
    /// it did.
    pub(crate) fn observe(&mut self, configured: f32, actual: f32) -> bool {
        if self.reported == Some(actual) {
            return false;
        }
        self.reported = Some(actual);

        let mismatch = (configured - actual).abs() > 1e-3;
        if mismatch {
            log::warn!(
                "window scale factor is {} but viewport.device_pixel_ratio is {}; \
                 drag speed will not match the display",
                actual,
                configured
            );
        }
        mismatch
    }
}

impl shader::Primitive for SketchPrimitive {
    fn prepare(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        storage: &mut shader::Storage,
        _bounds: &Rectangle,
        viewport: &shader::Viewport,
    ) {
        if !storage.has::<ScaleFactorCheck>() {
            storage.store(ScaleFactorCheck::default());
        }
        if let Some(check) = storage.get_mut::<ScaleFactorCheck>() {
            check.observe(self.device_pixel_ratio, viewport.scale_factor() as f32);
        }

        if !storage.has::<Renderer>() {
            let renderer =
                pollster::block_on(Renderer::new(device, format, viewport.physical_size()));
            storage.store(renderer);
        }
        if let Some(renderer) = storage.get_mut::<Renderer>() {
            renderer.resize(device, viewport.physical_size());
            renderer.update_camera(queue, &self.uniform);
        }
    }

    fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        storage: &shader::Storage,
        target: &wgpu::TextureView,
        clip_bounds: &Rectangle<u32>,
    ) {
        if let Some(renderer) = storage.get::<Renderer>() {
            renderer.render(encoder, target, clip_bounds);
        }
    }
}

/// Internal state managed by the shader widget
pub(crate) struct SketchState {
    options: SketchOptions,
    camera: CameraState,
    controller: CameraController,
    projection: Projection,
    queue: InputQueue,
    /// First finger of the current touch gesture; other fingers are ignored.
    active_finger: Option<touch::Finger>,
    view_projection: Matrix4<f32>,
}

impl SketchState {
    fn new(options: &SketchOptions) -> Self {
        let projection = Projection::new(&options.camera).unwrap_or_else(|err| {
            log::error!("{}; falling back to the default projection", err);
            Projection::default()
        });
        let camera = CameraState::new(&options.camera, &options.controls);
        let view_projection = projection
            .view_projection(&camera, INITIAL_ASPECT)
            .unwrap_or_else(|err| {
                log::error!("{}; starting from the identity matrix", err);
                Matrix4::identity()
            });

        Self {
            options: options.clone(),
            camera,
            controller: CameraController::new(options.controls.clone()),
            projection,
            queue: InputQueue::default(),
            active_finger: None,
            view_projection,
        }
    }

    /// Applies new options. A pan key change keeps the camera where it is;
    /// anything else rebuilds the state.
    fn reconfigure(&mut self, options: &SketchOptions) {
        let mut controls = self.options.controls.clone();
        controls.pan_key = options.controls.pan_key;

        if self.options.camera == options.camera
            && self.options.viewport == options.viewport
            && controls == options.controls
        {
            log::info!("pan key set to {}", options.controls.pan_key);
            self.controller.set_pan_key(options.controls.pan_key);
            self.options = options.clone();
        } else {
            log::info!("options changed, resetting camera");
            *self = Self::new(options);
        }
    }

    fn viewport(&self, bounds: Rectangle) -> Viewport {
        Viewport::from_client_rect(
            ClientRect {
                x: bounds.x,
                y: bounds.y,
                width: bounds.width,
                height: bounds.height,
            },
            self.options.viewport.device_pixel_ratio,
        )
    }

    /// Drains queued input and rebuilds the frame matrix.
    fn advance_frame(&mut self, bounds: Rectangle) {
        if bounds.width <= 0.0 || bounds.height <= 0.0 {
            return;
        }
        let viewport = self.viewport(bounds);

        if !self.queue.is_empty() {
            let applied = self
                .queue
                .drain_into(&mut self.controller, &mut self.camera, &viewport);
            log::trace!("applied {} input events", applied);
        }

        match self.projection.view_projection(&self.camera, viewport.aspect()) {
            Ok(matrix) => self.view_projection = matrix,
            Err(err) => log::warn!("keeping previous frame: {}", err),
        }
    }

    fn mouse_input(
        &self,
        mouse_event: mouse::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<(InputEvent, event::Status)> {
        match mouse_event {
            mouse::Event::ButtonPressed(_) => {
                let position = cursor.position_over(bounds)?;
                Some((
                    InputEvent::PointerDown { position: to_point(position) },
                    event::Status::Captured,
                ))
            }
            // Release and movement are tracked window-wide so a drag can leave the viewport.
            mouse::Event::ButtonReleased(_) => {
                Some((InputEvent::PointerUp, event::Status::Ignored))
            }
            mouse::Event::CursorMoved { position } => {
                if self.controller.session().is_active() || !self.queue.is_empty() {
                    Some((
                        InputEvent::PointerMove { position: to_point(position) },
                        event::Status::Ignored,
                    ))
                } else {
                    None
                }
            }
            mouse::Event::WheelScrolled { delta } => {
                cursor.position_over(bounds)?;
                // Browser convention: pixels, positive when scrolling down.
                let delta_y = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => {
                        -y * self.controller.controls().wheel_line_pixels
                    }
                    mouse::ScrollDelta::Pixels { y, .. } => -y,
                };
                Some((InputEvent::Wheel { delta_y }, event::Status::Captured))
            }
            mouse::Event::CursorEntered | mouse::Event::CursorLeft => None,
        }
    }

    fn touch_input(
        &mut self,
        touch_event: touch::Event,
        bounds: Rectangle,
    ) -> Option<(InputEvent, event::Status)> {
        match touch_event {
            touch::Event::FingerPressed { id, position } => {
                if self.active_finger.is_some() || !bounds.contains(position) {
                    return None;
                }
                self.active_finger = Some(id);
                Some((
                    InputEvent::TouchStart { position: to_point(position) },
                    event::Status::Captured,
                ))
            }
            touch::Event::FingerMoved { id, position } if self.active_finger == Some(id) => Some((
                InputEvent::TouchMove { position: to_point(position) },
                event::Status::Captured,
            )),
            touch::Event::FingerLifted { id, .. } | touch::Event::FingerLost { id, .. }
                if self.active_finger == Some(id) =>
            {
                self.active_finger = None;
                Some((InputEvent::TouchEnd, event::Status::Captured))
            }
            _ => None,
        }
    }
}

impl Default for SketchState {
    fn default() -> Self {
        Self::new(&SketchOptions::default())
    }
}

fn to_point(position: iced::Point) -> Point2<f32> {
    Point2::new(position.x, position.y)
}

fn modifier_key(key: &keyboard::Key) -> Option<ModifierKey> {
    match key {
        keyboard::Key::Named(keyboard::key::Named::Alt) => Some(ModifierKey::Alt),
        keyboard::Key::Named(keyboard::key::Named::Shift) => Some(ModifierKey::Shift),
        keyboard::Key::Named(keyboard::key::Named::Control) => Some(ModifierKey::Control),
        _ => None,
    }
}

fn keyboard_input(keyboard_event: keyboard::Event) -> Option<(InputEvent, event::Status)> {
    match keyboard_event {
        keyboard::Event::KeyPressed { key, .. } => {
            modifier_key(&key).map(|key| (InputEvent::KeyDown(key), event::Status::Captured))
        }
        keyboard::Event::KeyReleased { key, .. } => {
            modifier_key(&key).map(|key| (InputEvent::KeyUp(key), event::Status::Captured))
        }
        _ => None,
    }
}

/// The shader program that turns input into camera motion.
pub(crate) struct SketchProgram {
    options: SketchOptions,
}

impl SketchProgram {
    pub(crate) fn new(options: SketchOptions) -> Self {
        Self { options }
    }
}

impl shader::Program<Message> for SketchProgram {
    type State = SketchState;
    type Primitive = SketchPrimitive;

    fn update(
        &self,
        state: &mut Self::State,
        event: shader::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
        shell: &mut Shell<'_, Message>,
    ) -> (event::Status, Option<Message>) {
        if state.options != self.options {
            state.reconfigure(&self.options);
        }

        let input = match event {
            shader::Event::Mouse(mouse_event) => state.mouse_input(mouse_event, bounds, cursor),
            shader::Event::Touch(touch_event) => state.touch_input(touch_event, bounds),
            shader::Event::Keyboard(keyboard_event) => keyboard_input(keyboard_event),
            shader::Event::RedrawRequested(_) => {
                state.advance_frame(bounds);
                None
            }
        };

        match input {
            Some((input, status)) => {
                state.queue.push(input);
                shell.request_redraw(window::RedrawRequest::NextFrame);
                (status, None)
            }
            None => (event::Status::Ignored, None),
        }
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        let session = state.controller.session();
        match session.mode() {
            GestureMode::Pan | GestureMode::Rotate if session.is_active() => {
                mouse::Interaction::Grabbing
            }
            _ if cursor.is_over(bounds) => mouse::Interaction::Grab,
            _ => mouse::Interaction::Idle,
        }
    }

    fn draw(
        &self,
        state: &Self::State,
        _cursor: mouse::Cursor,
        _bounds: Rectangle,
    ) -> Self::Primitive {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&state.view_projection);
        SketchPrimitive {
            uniform,
            device_pixel_ratio: state.options.viewport.device_pixel_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iced::Point;
    use iced::widget::shader::Program;

    fn bounds() -> Rectangle {
        Rectangle {
            x: 0.0,
            y: 0.0,
            width: 400.0,
            height: 300.0,
        }
    }

    #[test]
    fn events_wait_for_the_next_frame() {
        let mut state = SketchState::default();
        let before = state.view_projection;

        let cursor = mouse::Cursor::Available(Point::new(100.0, 100.0));
        let (down, status) = state
            .mouse_input(mouse::Event::ButtonPressed(mouse::Button::Left), bounds(), cursor)
            .unwrap();
        assert_eq!(status, event::Status::Captured);
        state.queue.push(down);

        let (moved, _) = state
            .mouse_input(
                mouse::Event::CursorMoved { position: Point::new(140.0, 100.0) },
                bounds(),
                cursor,
            )
            .unwrap();
        state.queue.push(moved);

        // Nothing applied until the frame runs.
        assert_eq!(state.view_projection, before);
        let rotation_y = state.camera.rotation.y;

        state.advance_frame(bounds());
        assert!(state.queue.is_empty());
        assert!((state.camera.rotation.y - rotation_y + 2.0).abs() < 1e-5);
        assert_ne!(state.view_projection, before);
    }

    #[test]
    fn hover_without_gesture_is_not_queued() {
        let state = SketchState::default();
        let cursor = mouse::Cursor::Available(Point::new(10.0, 10.0));
        let result = state.mouse_input(
            mouse::Event::CursorMoved { position: Point::new(20.0, 20.0) },
            bounds(),
            cursor,
        );
        assert!(result.is_none());
    }

    #[test]
    fn press_outside_viewport_is_ignored() {
        let state = SketchState::default();
        let cursor = mouse::Cursor::Available(Point::new(500.0, 10.0));
        assert!(
            state
                .mouse_input(mouse::Event::ButtonPressed(mouse::Button::Left), bounds(), cursor)
                .is_none()
        );
    }

    #[test]
    fn wheel_lines_convert_to_pixels() {
        let state = SketchState::default();
        let cursor = mouse::Cursor::Available(Point::new(10.0, 10.0));
        let (input, _) = state
            .mouse_input(
                mouse::Event::WheelScrolled {
                    delta: mouse::ScrollDelta::Lines { x: 0.0, y: -1.0 },
                },
                bounds(),
                cursor,
            )
            .unwrap();
        assert_eq!(input, InputEvent::Wheel { delta_y: 100.0 });
    }

    #[test]
    fn only_first_finger_drives_the_gesture() {
        let mut state = SketchState::default();
        let first = touch::Finger(1);
        let second = touch::Finger(2);

        let start = state.touch_input(
            touch::Event::FingerPressed { id: first, position: Point::new(10.0, 10.0) },
            bounds(),
        );
        assert!(matches!(start, Some((InputEvent::TouchStart { .. }, _))));

        let ignored = state.touch_input(
            touch::Event::FingerPressed { id: second, position: Point::new(20.0, 20.0) },
            bounds(),
        );
        assert!(ignored.is_none());
        assert!(
            state
                .touch_input(
                    touch::Event::FingerMoved { id: second, position: Point::new(30.0, 30.0) },
                    bounds(),
                )
                .is_none()
        );

        let end = state.touch_input(
            touch::Event::FingerLifted { id: first, position: Point::new(10.0, 10.0) },
            bounds(),
        );
        assert!(matches!(end, Some((InputEvent::TouchEnd, _))));
        assert!(state.active_finger.is_none());
    }

    #[test]
    fn pan_key_change_keeps_camera() {
        let mut state = SketchState::default();
        state.camera.rotation.x = 1.5;

        let mut options = SketchOptions::default();
        options.controls.pan_key = ModifierKey::Shift;
        state.reconfigure(&options);

        assert_eq!(state.camera.rotation.x, 1.5);
        assert_eq!(state.controller.controls().pan_key, ModifierKey::Shift);

        options.camera.fov_degrees = 90.0;
        state.reconfigure(&options);
        assert!((state.camera.field_of_view() - crate::math::deg_to_rad(90.0)).abs() < 1e-6);
    }

    #[test]
    fn invalid_initial_camera_falls_back_to_identity() {
        let mut options = SketchOptions::default();
        options.camera.rotation_degrees[0] = f32::NAN;
        let state = SketchState::new(&options);
        assert_eq!(state.view_projection, Matrix4::identity());
    }

    #[test]
    fn scale_factor_mismatch_warns_once_per_value() {
        let mut check = ScaleFactorCheck::default();
        assert!(!check.observe(1.0, 1.0));
        assert!(check.observe(1.0, 2.0));
        assert!(!check.observe(1.0, 2.0));
        assert_eq!(check.reported, Some(2.0));

        let mut check = ScaleFactorCheck::default();
        assert!(!check.observe(2.0, 2.0));
    }

    #[test]
    fn primitive_carries_configured_ratio() {
        let mut options = SketchOptions::default();
        options.viewport.device_pixel_ratio = 2.0;
        let program = SketchProgram::new(options.clone());
        let state = SketchState::new(&options);
        let primitive = program.draw(&state, mouse::Cursor::Unavailable, bounds());
        assert_eq!(primitive.device_pixel_ratio, 2.0);
    }

    #[test]
    fn modifier_keys_map_to_input() {
        assert_eq!(
            modifier_key(&keyboard::Key::Named(keyboard::key::Named::Alt)),
            Some(ModifierKey::Alt)
        );
        assert_eq!(modifier_key(&keyboard::Key::Character("a".into())), None);
    }
}
