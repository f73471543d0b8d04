// input.rs: keyboard, pointer and wheel bindings onto panorama operations

use crate::angle::Angle;
use crate::orientation::Axis;
use crate::panorama::Panorama;
use crate::surface::Surface;
use glam::DVec2;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Space,
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Rotate { axis: Axis, reverse: bool },
    Zoom { reverse: bool },
    ToggleAutoRotate,
}

impl Key {
    pub fn action(self) -> KeyAction {
        match self {
            Key::Up => KeyAction::Rotate {
                axis: Axis::Pitch,
                reverse: false,
            },
            Key::Down => KeyAction::Rotate {
                axis: Axis::Pitch,
                reverse: true,
            },
            Key::Right => KeyAction::Rotate {
                axis: Axis::Yaw,
                reverse: false,
            },
            Key::Left => KeyAction::Rotate {
                axis: Axis::Yaw,
                reverse: true,
            },
            Key::Plus => KeyAction::Zoom { reverse: false },
            Key::Minus => KeyAction::Zoom { reverse: true },
            Key::Space => KeyAction::ToggleAutoRotate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pointer {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    pointer: Pointer,
    last: DVec2,
}

/// Held keys and the active drag, turned into panorama calls.
#[derive(Debug, Default)]
pub struct Controls {
    held: HashSet<Key>,
    drag: Option<Drag>,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Returns whether the key was consumed. Auto-repeat presses of a held
    /// key are swallowed.
    pub fn key_down<S: Surface>(&mut self, panorama: &mut Panorama<S>, key: Key) -> bool {
        if !panorama.options().bind_keyboard {
            return false;
        }
        if !self.held.insert(key) {
            return true;
        }
        match key.action() {
            KeyAction::Rotate { axis, reverse } => {
                let period = panorama.options().key_rotate_period();
                panorama.start_rotate(axis, period, reverse);
            }
            KeyAction::Zoom { reverse } => panorama.start_zoom(reverse),
            KeyAction::ToggleAutoRotate => panorama.toggle_auto_rotate(),
        }
        true
    }

    pub fn key_up<S: Surface>(&mut self, panorama: &mut Panorama<S>, key: Key) -> bool {
        if !self.held.remove(&key) {
            return false;
        }
        match key.action() {
            KeyAction::Rotate { axis, .. } => panorama.stop_rotate(axis),
            KeyAction::Zoom { .. } => panorama.stop_zoom(),
            KeyAction::ToggleAutoRotate => {}
        }
        true
    }

    /// Starts a drag at `at` (viewport pixels) if that pointer kind is bound.
    pub fn pointer_down<S: Surface>(&mut self, panorama: &Panorama<S>, pointer: Pointer, at: DVec2) -> bool {
        let options = panorama.options();
        let bound = match pointer {
            Pointer::Mouse => options.bind_mouse,
            Pointer::Touch => options.bind_touch,
        };
        if bound {
            self.drag = Some(Drag { pointer, last: at });
        }
        bound
    }

    pub fn pointer_move<S: Surface>(&mut self, panorama: &mut Panorama<S>, at: DVec2) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let delta = at - drag.last;
        drag.last = at;
        let sensitivity = match drag.pointer {
            Pointer::Mouse => panorama.options().mouse_sensitivity,
            Pointer::Touch => panorama.options().touch_sensitivity,
        };
        let (dp, dy) = drag_rotation(panorama, delta, sensitivity);
        panorama.rotate_by(dp, dy);
    }

    pub fn pointer_up(&mut self, pointer: Pointer) {
        if self.drag.is_some_and(|d| d.pointer == pointer) {
            self.drag = None;
        }
    }

    /// One wheel notch widens (negative `delta_y`) or narrows the horizontal
    /// FOV by the wheel sensitivity.
    pub fn wheel<S: Surface>(&mut self, panorama: &mut Panorama<S>, delta_y: f64) {
        if !panorama.options().bind_mouse || delta_y == 0.0 || !delta_y.is_finite() {
            return;
        }
        let step = delta_y.signum() * panorama.options().wheel_sensitivity;
        let fov_h = panorama.fov().horizontal.to_degrees() - step;
        let transition = panorama.options().wheel_transition();
        panorama.zoom_to(Angle::from_degrees(fov_h), transition);
    }

    /// Drops held keys and the drag, e.g. when the window loses focus.
    pub fn release_all<S: Surface>(&mut self, panorama: &mut Panorama<S>) {
        let held: Vec<Key> = self.held.iter().copied().collect();
        for key in held {
            self.key_up(panorama, key);
        }
        self.drag = None;
    }
}

/// Degrees of (pitch, yaw) for a pointer delta in pixels. Dragging right
/// turns left and dragging down looks up, so the image follows the pointer.
/// Each axis scales by its own FOV over its own extent: a drag across the
/// full width turns one horizontal FOV.
pub fn drag_rotation<S: Surface>(panorama: &Panorama<S>, delta: DVec2, sensitivity: f64) -> (f64, f64) {
    let fov = panorama.fov();
    let viewport = panorama.viewport();
    let yaw = -delta.x * fov.horizontal.to_degrees() / viewport.width * sensitivity;
    let pitch = delta.y * fov.vertical.to_degrees() / viewport.height * sensitivity;
    (pitch, yaw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fov::Viewport;
    use crate::panorama::Options;
    use approx::assert_abs_diff_eq;
    use std::time::Duration;

    fn panorama(options: Options) -> Panorama {
        Panorama::new(options, Viewport::new(1000.0, 500.0))
    }

    #[test]
    fn every_key_maps_to_its_own_action() {
        assert_eq!(
            Key::Left.action(),
            KeyAction::Rotate {
                axis: Axis::Yaw,
                reverse: true
            }
        );
        assert_eq!(Key::Minus.action(), KeyAction::Zoom { reverse: true });
        // Space never doubles as a rotation.
        assert_eq!(Key::Space.action(), KeyAction::ToggleAutoRotate);
    }

    #[test]
    fn arrow_spins_while_held() {
        let mut p = panorama(Options::default());
        let mut c = Controls::new();
        assert!(c.key_down(&mut p, Key::Right));
        assert!(p.is_rotating(Axis::Yaw));
        // 10s per turn.
        p.advance(Duration::from_millis(2500));
        assert!(c.key_up(&mut p, Key::Right));
        assert!(!p.is_rotating(Axis::Yaw));
        assert_abs_diff_eq!(p.orientation().yaw.to_degrees(), 90.0, epsilon = 1e-6);
    }

    #[test]
    fn auto_repeat_does_not_restart_the_spin() {
        let mut p = panorama(Options::default());
        let mut c = Controls::new();
        c.key_down(&mut p, Key::Up);
        p.advance(Duration::from_secs(1));
        c.key_down(&mut p, Key::Up);
        p.advance(Duration::from_secs(1));
        c.key_up(&mut p, Key::Up);
        assert_abs_diff_eq!(p.orientation().pitch.to_degrees(), 72.0, epsilon = 1e-6);
        assert_eq!(p.surface().rule_count(), 0);
    }

    #[test]
    fn space_toggles_auto_rotate_and_key_up_is_inert() {
        let mut p = panorama(Options::default());
        let mut c = Controls::new();
        c.key_down(&mut p, Key::Space);
        c.key_up(&mut p, Key::Space);
        assert!(p.is_auto_rotating());
        c.key_down(&mut p, Key::Space);
        assert!(!p.is_auto_rotating());
    }

    #[test]
    fn zoom_keys_start_and_settle() {
        let mut p = panorama(Options::default());
        let mut c = Controls::new();
        c.key_down(&mut p, Key::Plus);
        assert!(p.is_zooming());
        p.advance(Duration::from_secs(1));
        c.key_up(&mut p, Key::Plus);
        assert!(p.is_zooming());
        p.advance(p.options().zoom_settle());
        assert!(!p.is_zooming());
    }

    #[test]
    fn unbound_keyboard_is_ignored() {
        let mut p = panorama(Options {
            bind_keyboard: false,
            ..Options::default()
        });
        let mut c = Controls::new();
        assert!(!c.key_down(&mut p, Key::Right));
        assert!(!p.is_rotating(Axis::Yaw));
        assert!(!c.key_up(&mut p, Key::Right));
    }

    #[test]
    fn mouse_drag_follows_the_pointer() {
        let mut p = panorama(Options::default());
        let mut c = Controls::new();
        let fov = p.fov();
        c.pointer_down(&p, Pointer::Mouse, DVec2::new(500.0, 250.0));
        c.pointer_move(&mut p, DVec2::new(600.0, 200.0));
        let o = p.orientation();
        assert_abs_diff_eq!(o.yaw.to_degrees(), -100.0 * fov.horizontal.to_degrees() / 1000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(o.pitch.to_degrees(), -50.0 * fov.vertical.to_degrees() / 500.0, epsilon = 1e-9);

        c.pointer_up(Pointer::Mouse);
        c.pointer_move(&mut p, DVec2::new(0.0, 0.0));
        assert_eq!(p.orientation(), o);
    }

    #[test]
    fn touch_uses_its_own_sensitivity() {
        let mut p = panorama(Options::default());
        let mut c = Controls::new();
        let fov_h = p.fov().horizontal.to_degrees();
        c.pointer_down(&p, Pointer::Touch, DVec2::ZERO);
        c.pointer_move(&mut p, DVec2::new(-10.0, 0.0));
        assert_abs_diff_eq!(p.orientation().yaw.to_degrees(), 10.0 * fov_h / 1000.0 * 2.0, epsilon = 1e-9);
        // A mouse release does not end a touch drag.
        c.pointer_up(Pointer::Mouse);
        assert!(c.is_dragging());
    }

    #[test]
    fn unbound_touch_never_drags() {
        let mut p = panorama(Options {
            bind_touch: false,
            ..Options::default()
        });
        let mut c = Controls::new();
        assert!(!c.pointer_down(&p, Pointer::Touch, DVec2::ZERO));
        c.pointer_move(&mut p, DVec2::new(50.0, 50.0));
        assert_eq!(p.orientation().yaw, Angle::ZERO);
    }

    #[test]
    fn wheel_steps_the_fov() {
        let mut p = panorama(Options::default());
        let mut c = Controls::new();
        c.wheel(&mut p, 3.0);
        assert_abs_diff_eq!(p.fov().horizontal.to_degrees(), 110.0, epsilon = 1e-9);
        c.wheel(&mut p, -0.2);
        assert_abs_diff_eq!(p.fov().horizontal.to_degrees(), 115.0, epsilon = 1e-9);
        c.wheel(&mut p, 0.0);
        assert_abs_diff_eq!(p.fov().horizontal.to_degrees(), 115.0, epsilon = 1e-9);
    }

    #[test]
    fn release_all_stops_every_held_action() {
        let mut p = panorama(Options::default());
        let mut c = Controls::new();
        c.key_down(&mut p, Key::Left);
        c.key_down(&mut p, Key::Minus);
        c.release_all(&mut p);
        assert!(!p.is_rotating(Axis::Yaw));
        assert!(!c.is_held(Key::Left));
        assert!(p.has_pending_tasks());
    }
}
