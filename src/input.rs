//! Pointer, wheel, touch and key handling for the camera.
//!
//! Raw events are normalized into [`InputEvent`]s, queued, and applied to a
//! [`CameraState`] once per frame through the [`CameraController`].

use std::collections::VecDeque;

use nalgebra::{Point2, Vector2};

use crate::camera::CameraState;
use crate::options::{ControlOptions, ModifierKey};

/// Platform-agnostic input events. Positions are raw client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum InputEvent {
    /// Wheel scroll in pixels (positive = scroll down).
    Wheel { delta_y: f32 },
    PointerDown { position: Point2<f32> },
    PointerMove { position: Point2<f32> },
    PointerUp,
    KeyDown(ModifierKey),
    KeyUp(ModifierKey),
    /// First touch point only.
    TouchStart { position: Point2<f32> },
    TouchMove { position: Point2<f32> },
    TouchEnd,
}

/// Rectangle of the canvas in client (logical) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ClientRect {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
}

/// Per-frame snapshot of the canvas geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Viewport {
    pub(crate) client_rect: ClientRect,
    /// Canvas size in device pixels.
    pub(crate) pixel_size: Vector2<f32>,
    pub(crate) device_pixel_ratio: f32,
}

impl Viewport {
    /// Builds a viewport whose pixel size is the client size scaled by `device_pixel_ratio`.
    pub(crate) fn from_client_rect(client_rect: ClientRect, device_pixel_ratio: f32) -> Self {
        Self {
            client_rect,
            pixel_size: Vector2::new(client_rect.width, client_rect.height) * device_pixel_ratio,
            device_pixel_ratio,
        }
    }

    /// Client width over client height.
    pub(crate) fn aspect(&self) -> f32 {
        self.client_rect.width / self.client_rect.height
    }
}

/// Converts a client position into canvas-local coordinates centered on the
/// canvas and divided by the device pixel ratio.
pub(crate) fn map_pointer_to_local(
    raw: Point2<f32>,
    rect: &ClientRect,
    pixel_size: Vector2<f32>,
    device_pixel_ratio: f32,
) -> Point2<f32> {
    let local_x = (raw.x - rect.x) / rect.width * pixel_size.x;
    let local_y = (raw.y - rect.y) / rect.height * pixel_size.y;
    Point2::new(
        (local_x - pixel_size.x / 2.0) / device_pixel_ratio,
        (local_y - pixel_size.y / 2.0) / device_pixel_ratio,
    )
}

/// How pointer deltas are interpreted during a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum GestureMode {
    /// No mode chosen yet.
    #[default]
    Idle,
    Rotate,
    Pan,
}

/// One press-to-release drag. Active exactly when a last pointer is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct InteractionSession {
    last_pointer: Option<Point2<f32>>,
    mode: GestureMode,
}

impl InteractionSession {
    pub(crate) fn is_active(&self) -> bool {
        self.last_pointer.is_some()
    }

    pub(crate) fn last_pointer(&self) -> Option<Point2<f32>> {
        self.last_pointer
    }

    pub(crate) fn mode(&self) -> GestureMode {
        self.mode
    }
}

/// Applies normalized input to a camera.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CameraController {
    session: InteractionSession,
    pan_key_held: bool,
    controls: ControlOptions,
}

impl CameraController {
    pub(crate) fn new(controls: ControlOptions) -> Self {
        Self {
            session: InteractionSession::default(),
            pan_key_held: false,
            controls,
        }
    }

    pub(crate) fn session(&self) -> &InteractionSession {
        &self.session
    }

    pub(crate) fn controls(&self) -> &ControlOptions {
        &self.controls
    }

    /// Starts a drag. A held pan modifier forces pan mode; otherwise an
    /// already chosen mode is kept and only `Idle` becomes `Rotate`.
    pub(crate) fn begin_gesture(&mut self, pointer: Point2<f32>, modifier_held: bool) {
        if modifier_held {
            self.session.mode = GestureMode::Pan;
        }
        if self.session.mode == GestureMode::Idle {
            self.session.mode = GestureMode::Rotate;
        }
        self.session.last_pointer = Some(pointer);
        log::debug!("gesture started in {:?} mode at {}", self.session.mode, pointer);
    }

    pub(crate) fn update_gesture(
        &mut self,
        camera: &mut CameraState,
        pointer: Point2<f32>,
        pixel_size: Vector2<f32>,
    ) {
        let Some(last_pointer) = self.session.last_pointer else {
            return;
        };

        let scale = Vector2::new(
            self.controls.drag_normalization / pixel_size.x,
            self.controls.drag_normalization / pixel_size.y,
        );
        let delta = (last_pointer - pointer).component_mul(&scale);

        match self.session.mode {
            GestureMode::Rotate => {
                camera.rotation.x += delta.y * self.controls.rotate_speed;
                camera.rotation.y += delta.x * self.controls.rotate_speed;
            }
            GestureMode::Pan => {
                camera.translation.x += delta.x * -self.controls.pan_speed;
                camera.translation.y += delta.y * self.controls.pan_speed;
            }
            GestureMode::Idle => {}
        }
        log::trace!("{:?} delta ({:.4}, {:.4})", self.session.mode, delta.x, delta.y);

        self.session.last_pointer = Some(pointer);
    }

    pub(crate) fn end_gesture(&mut self) {
        if let Some(last_pointer) = self.session.last_pointer() {
            log::debug!("gesture ended at {}", last_pointer);
        }
        self.session = InteractionSession::default();
    }

    /// Reacts to pan modifier transitions; repeats without a change are ignored.
    pub(crate) fn set_pan_modifier(&mut self, held: bool) {
        if held == self.pan_key_held {
            return;
        }
        self.pan_key_held = held;
        self.session.mode = if held { GestureMode::Pan } else { GestureMode::Rotate };
        log::debug!(
            "pan modifier {}, mode {:?}",
            if held { "held" } else { "released" },
            self.session.mode
        );
    }

    /// Rebinds the pan modifier. A held old key no longer counts as held,
    /// so a pan it forced falls back to rotate.
    pub(crate) fn set_pan_key(&mut self, key: ModifierKey) {
        if self.controls.pan_key == key {
            return;
        }
        self.controls.pan_key = key;
        if self.pan_key_held {
            self.set_pan_modifier(false);
        }
    }

    pub(crate) fn handle(
        &mut self,
        camera: &mut CameraState,
        event: InputEvent,
        viewport: &Viewport,
    ) {
        let to_local = |position| {
            map_pointer_to_local(
                position,
                &viewport.client_rect,
                viewport.pixel_size,
                viewport.device_pixel_ratio,
            )
        };

        match event {
            InputEvent::Wheel { delta_y } => camera.apply_zoom(delta_y),
            InputEvent::PointerDown { position } | InputEvent::TouchStart { position } => {
                self.begin_gesture(to_local(position), self.pan_key_held);
            }
            InputEvent::PointerMove { position } | InputEvent::TouchMove { position } => {
                self.update_gesture(camera, to_local(position), viewport.pixel_size);
            }
            InputEvent::PointerUp | InputEvent::TouchEnd => self.end_gesture(),
            InputEvent::KeyDown(key) if key == self.controls.pan_key => self.set_pan_modifier(true),
            InputEvent::KeyUp(key) if key == self.controls.pan_key => self.set_pan_modifier(false),
            InputEvent::KeyDown(_) | InputEvent::KeyUp(_) => {}
        }
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(ControlOptions::default())
    }
}

/// Events collected between frames.
#[derive(Debug, Clone, Default)]
pub(crate) struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    pub(crate) fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Applies every pending event in arrival order. Returns how many were applied.
    pub(crate) fn drain_into(
        &mut self,
        controller: &mut CameraController,
        camera: &mut CameraState,
        viewport: &Viewport,
    ) -> usize {
        let count = self.events.len();
        for event in self.events.drain(..) {
            controller.handle(camera, event, viewport);
        }
        count
    }
}
