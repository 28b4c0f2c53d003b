//! Drag-to-rotate camera state.
//!
//! The accumulated rotation angles, the drag flag and the last cursor
//! position live in one struct. Events mutate it, the per-frame matrix
//! setup only reads it.

use glam::{Mat4, Vec3, vec3};
use sdl2::event::Event;
use sdl2::mouse::MouseButton;

/// Degrees of rotation per pixel of drag.
const DRAG_SENSITIVITY: f32 = 0.5;

/// Camera orbit state driven by left-button mouse drags.
#[derive(Debug, Default)]
pub struct Camera {
    /// Accumulated rotation about the Y axis, in degrees.
    pub yaw: f32,
    /// Accumulated rotation about the X axis, in degrees.
    pub pitch: f32,
    dragging: bool,
    last_cursor: (i32, i32),
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one SDL event into the drag state machine.
    pub fn handle_event(&mut self, event: &Event) {
        match *event {
            Event::MouseButtonDown {
                mouse_btn: MouseButton::Left,
                x,
                y,
                ..
            } => self.begin_drag(x, y),
            Event::MouseButtonUp {
                mouse_btn: MouseButton::Left,
                ..
            } => self.end_drag(),
            Event::MouseMotion { x, y, .. } => self.drag_to(x, y),
            _ => {}
        }
    }

    pub fn begin_drag(&mut self, x: i32, y: i32) {
        self.dragging = true;
        self.last_cursor = (x, y);
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Accumulates rotation from cursor motion. A no-op unless a drag is
    /// active.
    pub fn drag_to(&mut self, x: i32, y: i32) {
        if !self.dragging {
            return;
        }
        let (last_x, last_y) = self.last_cursor;
        self.yaw += (x - last_x) as f32 * DRAG_SENSITIVITY;
        self.pitch += (y - last_y) as f32 * DRAG_SENSITIVITY;
        self.last_cursor = (x, y);
    }

    /// View matrix: a fixed look-at with the accumulated drag rotation
    /// applied about X, then about Y.
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(vec3(0.0, 2.0, 10.0), vec3(0.0, 2.0, 0.0), Vec3::Y)
            * Mat4::from_rotation_x(self.pitch.to_radians())
            * Mat4::from_rotation_y(self.yaw.to_radians())
    }

    /// Perspective projection with a 60 degree vertical field of view.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(60.0f32.to_radians(), aspect, 0.1, 100.0)
    }
}
