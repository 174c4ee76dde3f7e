//! Input interpretation
//!
//! The host samples device state once per tick into an `InputSnapshot`;
//! the `Interpreter` turns it into `Intent`s in a fixed priority order and
//! owns the drag session that spans press → hold → release.

use glam::Vec2;

use super::state::Scene;
use crate::consts::*;

/// Logical keys the scene reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    /// Decrease shadow intensity (S)
    ShadowLess,
    /// Increase shadow intensity (D)
    ShadowMore,
    /// Show/hide the environment overlay (M)
    ToggleOverlay,
    /// Leave (Escape)
    Quit,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_dom_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" => Some(Key::Up),
            "ArrowDown" => Some(Key::Down),
            "ArrowLeft" => Some(Key::Left),
            "ArrowRight" => Some(Key::Right),
            "s" | "S" => Some(Key::ShadowLess),
            "d" | "D" => Some(Key::ShadowMore),
            "m" | "M" => Some(Key::ToggleOverlay),
            "Escape" => Some(Key::Quit),
            _ => None,
        }
    }
}

/// Device state sampled for one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    /// Pointer position in screen pixels
    pub pointer: Vec2,
    /// Left button currently held
    pub pointer_down: bool,
    /// Left button went down since the previous tick
    pub pointer_pressed: bool,
    /// Left button went up since the previous tick
    pub pointer_released: bool,
    /// Keys that went down since the previous tick
    pub keys_pressed: Vec<Key>,
}

impl InputSnapshot {
    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }
}

/// Accumulates host events between ticks and hands out snapshots
#[derive(Debug, Clone, Default)]
pub struct InputTracker {
    current: InputSnapshot,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer_moved(&mut self, pos: Vec2) {
        self.current.pointer = pos;
    }

    pub fn pointer_down(&mut self, pos: Vec2) {
        self.current.pointer = pos;
        if !self.current.pointer_down {
            self.current.pointer_pressed = true;
        }
        self.current.pointer_down = true;
    }

    pub fn pointer_up(&mut self, pos: Vec2) {
        self.current.pointer = pos;
        if self.current.pointer_down {
            self.current.pointer_released = true;
        }
        self.current.pointer_down = false;
    }

    /// Release the button where the pointer was last seen (focus lost mid-drag)
    pub fn pointer_cancel(&mut self) {
        let pos = self.current.pointer;
        self.pointer_up(pos);
    }

    /// Record a key press; auto-repeat is ignored by the caller
    pub fn key_down(&mut self, key: Key) {
        if !self.current.keys_pressed.contains(&key) {
            self.current.keys_pressed.push(key);
        }
    }

    /// Take the state for this tick and clear one-shot edges
    pub fn snapshot(&mut self) -> InputSnapshot {
        let snap = self.current.clone();
        self.current.pointer_pressed = false;
        self.current.pointer_released = false;
        self.current.keys_pressed.clear();
        snap
    }
}

/// What is being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    Sun,
    /// Index into `Scene::trees`
    Tree(usize),
}

/// A grab in progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub target: DragTarget,
    /// Pointer minus target position at grab time
    pub offset: Vec2,
}

/// A state change requested by the user this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    Quit,
    ToggleOverlay,
    /// Step the tree count target
    AdjustTreeCount(i32),
    /// Step the overlay cloud count
    AdjustCloudCount(i32),
    AdjustShadowIntensity(f32),
    /// Step the coarse density (overlay hidden)
    AdjustDensity(f32),
    Grab(DragTarget),
    /// Move the sun toward a position (clamped when applied)
    DragSun(Vec2),
    /// Move a tree toward a position (clamped when applied)
    DragTree { index: usize, pos: Vec2 },
    Release(DragTarget),
}

/// Per-tick input state machine
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    drag: Option<DragSession>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current drag session, if any
    pub fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// End a tree drag whose tree no longer exists.
    ///
    /// Returns true if a session was dropped.
    pub fn forget_removed_trees(&mut self, tree_count: usize) -> bool {
        let stale = matches!(
            self.drag,
            Some(DragSession { target: DragTarget::Tree(i), .. }) if i >= tree_count
        );
        if stale {
            self.drag = None;
        }
        stale
    }

    /// Turn one tick of input into intents, in priority order
    pub fn interpret(&mut self, input: &InputSnapshot, scene: &Scene) -> Vec<Intent> {
        let mut intents = Vec::new();

        if input.key_pressed(Key::Quit) {
            self.drag = None;
            intents.push(Intent::Quit);
            return intents;
        }

        let mut overlay_visible = scene.params.overlay_visible;
        if input.key_pressed(Key::ToggleOverlay) {
            overlay_visible = !overlay_visible;
            intents.push(Intent::ToggleOverlay);
        }

        if overlay_visible {
            if input.key_pressed(Key::Up) {
                intents.push(Intent::AdjustTreeCount(1));
            }
            if input.key_pressed(Key::Down) {
                intents.push(Intent::AdjustTreeCount(-1));
            }
            if input.key_pressed(Key::Left) {
                intents.push(Intent::AdjustCloudCount(-(CLOUD_COUNT_STEP as i32)));
            }
            if input.key_pressed(Key::Right) {
                intents.push(Intent::AdjustCloudCount(CLOUD_COUNT_STEP as i32));
            }
            if input.key_pressed(Key::ShadowLess) {
                intents.push(Intent::AdjustShadowIntensity(-SHADOW_INTENSITY_STEP));
            }
            if input.key_pressed(Key::ShadowMore) {
                intents.push(Intent::AdjustShadowIntensity(SHADOW_INTENSITY_STEP));
            }
        } else {
            if input.key_pressed(Key::Up) {
                intents.push(Intent::AdjustDensity(DENSITY_STEP));
            }
            if input.key_pressed(Key::Down) {
                intents.push(Intent::AdjustDensity(-DENSITY_STEP));
            }
        }

        // A release since the last tick ends the session it belonged to,
        // so a press later in the same tick is hit-tested afresh
        if input.pointer_released {
            if let Some(session) = self.drag.take() {
                intents.push(Intent::Release(session.target));
            }
        }

        // Press: sun first, then trees in storage order; one target at most
        if input.pointer_pressed && self.drag.is_none() {
            let grabbed = if scene.sun.hit_test(input.pointer) {
                Some(DragSession {
                    target: DragTarget::Sun,
                    offset: input.pointer - scene.sun.pos,
                })
            } else {
                scene.tree_at(input.pointer).map(|index| DragSession {
                    target: DragTarget::Tree(index),
                    offset: input.pointer - scene.trees[index].pos,
                })
            };
            if let Some(session) = grabbed {
                intents.push(Intent::Grab(session.target));
                self.drag = Some(session);
            }
        }

        // Hold: follow the pointer
        if input.pointer_down {
            if let Some(session) = self.drag {
                let pos = input.pointer - session.offset;
                match session.target {
                    DragTarget::Sun => intents.push(Intent::DragSun(pos)),
                    DragTarget::Tree(index) => intents.push(Intent::DragTree { index, pos }),
                }
            }
        }

        // Press and release within one tick
        if !input.pointer_down {
            if let Some(session) = self.drag.take() {
                intents.push(Intent::Release(session.target));
            }
        }

        intents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn scene() -> Scene {
        Scene::new(&Settings::default(), 7)
    }

    fn keys(keys: &[Key]) -> InputSnapshot {
        InputSnapshot {
            keys_pressed: keys.to_vec(),
            ..Default::default()
        }
    }

    fn press(at: Vec2) -> InputSnapshot {
        InputSnapshot {
            pointer: at,
            pointer_down: true,
            pointer_pressed: true,
            ..Default::default()
        }
    }

    fn hold(at: Vec2) -> InputSnapshot {
        InputSnapshot {
            pointer: at,
            pointer_down: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_quit_preempts_everything() {
        let mut interp = Interpreter::new();
        let mut input = press(scene().sun.pos);
        input.keys_pressed = vec![Key::ToggleOverlay, Key::Quit, Key::Up];
        assert_eq!(interp.interpret(&input, &scene()), vec![Intent::Quit]);
        assert!(interp.drag().is_none());
    }

    #[test]
    fn test_arrows_depend_on_overlay() {
        let mut interp = Interpreter::new();
        let s = scene();
        assert_eq!(
            interp.interpret(&keys(&[Key::Up]), &s),
            vec![Intent::AdjustDensity(DENSITY_STEP)]
        );
        // Toggling in the same tick switches the arrow meaning immediately
        assert_eq!(
            interp.interpret(&keys(&[Key::ToggleOverlay, Key::Up, Key::Right]), &s),
            vec![
                Intent::ToggleOverlay,
                Intent::AdjustTreeCount(1),
                Intent::AdjustCloudCount(10)
            ]
        );
    }

    #[test]
    fn test_shadow_keys_only_with_overlay() {
        let mut interp = Interpreter::new();
        let mut s = scene();
        assert!(interp.interpret(&keys(&[Key::ShadowMore]), &s).is_empty());
        s.params.overlay_visible = true;
        assert_eq!(
            interp.interpret(&keys(&[Key::ShadowLess]), &s),
            vec![Intent::AdjustShadowIntensity(-SHADOW_INTENSITY_STEP)]
        );
    }

    #[test]
    fn test_press_on_sun_grabs_sun_with_offset() {
        let mut interp = Interpreter::new();
        let s = scene();
        let at = s.sun.pos + Vec2::new(10.0, -5.0);
        let intents = interp.interpret(&press(at), &s);
        assert_eq!(
            intents,
            vec![Intent::Grab(DragTarget::Sun), Intent::DragSun(s.sun.pos)]
        );
        assert_eq!(interp.drag().unwrap().offset, Vec2::new(10.0, -5.0));

        let intents = interp.interpret(&hold(Vec2::new(100.0, 100.0)), &s);
        assert_eq!(intents, vec![Intent::DragSun(Vec2::new(90.0, 105.0))]);
    }

    #[test]
    fn test_sun_wins_over_tree_under_it() {
        let mut interp = Interpreter::new();
        let mut s = scene();
        s.trees[0].pos = s.sun.pos + Vec2::new(0.0, 30.0);
        let intents = interp.interpret(&press(s.sun.pos), &s);
        assert_eq!(intents[0], Intent::Grab(DragTarget::Sun));
    }

    #[test]
    fn test_first_tree_in_storage_order_wins() {
        let mut interp = Interpreter::new();
        let mut s = scene();
        for t in &mut s.trees {
            t.pos = Vec2::new(60.0, 599.0);
            t.size = 50.0;
        }
        s.trees[1].pos = Vec2::new(600.0, 550.0);
        s.trees[3].pos = Vec2::new(602.0, 551.0);

        let intents = interp.interpret(&press(Vec2::new(601.0, 530.0)), &s);
        assert_eq!(intents[0], Intent::Grab(DragTarget::Tree(1)));
        assert_eq!(
            intents
                .iter()
                .filter(|i| matches!(i, Intent::Grab(_)))
                .count(),
            1
        );
        assert_eq!(interp.drag().unwrap().offset, Vec2::new(1.0, -20.0));
    }

    #[test]
    fn test_press_on_empty_sky_grabs_nothing() {
        let mut interp = Interpreter::new();
        let s = scene();
        let intents = interp.interpret(&press(Vec2::new(5.0, 5.0)), &s);
        assert!(intents.is_empty());
        assert!(interp.drag().is_none());
    }

    #[test]
    fn test_release_ends_session() {
        let mut interp = Interpreter::new();
        let s = scene();
        interp.interpret(&press(s.sun.pos), &s);
        let released = InputSnapshot {
            pointer: Vec2::new(50.0, 50.0),
            pointer_released: true,
            ..Default::default()
        };
        let intents = interp.interpret(&released, &s);
        assert_eq!(intents, vec![Intent::Release(DragTarget::Sun)]);
        assert!(interp.drag().is_none());
    }

    #[test]
    fn test_click_within_one_tick_grabs_and_releases() {
        let mut interp = Interpreter::new();
        let s = scene();
        let click = InputSnapshot {
            pointer: s.sun.pos,
            pointer_pressed: true,
            pointer_released: true,
            ..Default::default()
        };
        let intents = interp.interpret(&click, &s);
        assert_eq!(
            intents,
            vec![Intent::Grab(DragTarget::Sun), Intent::Release(DragTarget::Sun)]
        );
    }

    #[test]
    fn test_release_then_press_in_one_tick_regrabs() {
        let mut interp = Interpreter::new();
        let mut s = scene();
        s.trees[0].pos = Vec2::new(100.0, 550.0);
        interp.interpret(&press(s.sun.pos + Vec2::new(10.0, 0.0)), &s);

        // Button went up and down again between two ticks, now over a tree
        let mut input = press(Vec2::new(100.0, 545.0));
        input.pointer_released = true;
        let intents = interp.interpret(&input, &s);
        assert_eq!(intents[0], Intent::Release(DragTarget::Sun));
        assert_eq!(intents[1], Intent::Grab(DragTarget::Tree(0)));
        let session = interp.drag().unwrap();
        assert_eq!(session.target, DragTarget::Tree(0));
        assert_eq!(session.offset, Vec2::new(0.0, -5.0));
    }

    #[test]
    fn test_forget_removed_trees() {
        let mut interp = Interpreter::new();
        interp.drag = Some(DragSession {
            target: DragTarget::Tree(4),
            offset: Vec2::ZERO,
        });
        assert!(!interp.forget_removed_trees(5));
        assert!(interp.drag().is_some());
        assert!(interp.forget_removed_trees(4));
        assert!(interp.drag().is_none());

        interp.drag = Some(DragSession {
            target: DragTarget::Sun,
            offset: Vec2::ZERO,
        });
        assert!(!interp.forget_removed_trees(0));
    }

    #[test]
    fn test_tracker_edges_are_one_shot() {
        let mut tracker = InputTracker::new();
        tracker.pointer_down(Vec2::new(1.0, 2.0));
        tracker.key_down(Key::Up);
        tracker.key_down(Key::Up);

        let first = tracker.snapshot();
        assert!(first.pointer_pressed && first.pointer_down);
        assert_eq!(first.keys_pressed, vec![Key::Up]);

        let second = tracker.snapshot();
        assert!(!second.pointer_pressed && second.pointer_down);
        assert!(second.keys_pressed.is_empty());

        tracker.pointer_up(Vec2::new(3.0, 4.0));
        let third = tracker.snapshot();
        assert!(third.pointer_released && !third.pointer_down);
        assert_eq!(third.pointer, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_pointer_cancel_releases_in_place() {
        let mut tracker = InputTracker::new();
        tracker.pointer_down(Vec2::new(5.0, 6.0));
        tracker.pointer_moved(Vec2::new(7.0, 8.0));
        tracker.snapshot();

        tracker.pointer_cancel();
        let snap = tracker.snapshot();
        assert!(snap.pointer_released && !snap.pointer_down);
        assert_eq!(snap.pointer, Vec2::new(7.0, 8.0));

        // Nothing held, nothing to release
        tracker.pointer_cancel();
        assert!(!tracker.snapshot().pointer_released);
    }

    #[test]
    fn test_dom_key_mapping() {
        assert_eq!(Key::from_dom_key("ArrowLeft"), Some(Key::Left));
        assert_eq!(Key::from_dom_key("M"), Some(Key::ToggleOverlay));
        assert_eq!(Key::from_dom_key("Escape"), Some(Key::Quit));
        assert_eq!(Key::from_dom_key("x"), None);
    }
}
