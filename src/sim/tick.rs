//! Fixed timestep scene tick
//!
//! One tick runs the phases in a fixed order:
//! interpret input → apply intents → advance clouds → revalidate shadows.
//! Shadows are always revalidated before the frame composer reads them.

use super::animation;
use super::input::{DragTarget, InputSnapshot, Intent, Interpreter};
use super::state::{Param, Scene};

/// Whether the run continues after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// Terminal; no further ticks should run
    Quit,
}

/// Per-tick bookkeeping, mostly for logging and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Tree shadows rebuilt this tick
    pub shadows_rebuilt: usize,
}

/// Advance the scene by one tick
pub fn tick(
    scene: &mut Scene,
    interpreter: &mut Interpreter,
    input: &InputSnapshot,
) -> (TickOutcome, TickStats) {
    let intents = interpreter.interpret(input, scene);
    if apply_intents(scene, &intents) == TickOutcome::Quit {
        return (TickOutcome::Quit, TickStats::default());
    }
    if interpreter.forget_removed_trees(scene.trees.len()) {
        log::debug!("Dragged tree was removed; drag ended");
    }

    scene.time_ticks += 1;
    animation::advance(&mut scene.clouds);

    let shadows_rebuilt = revalidate_shadows(scene);
    (TickOutcome::Continue, TickStats { shadows_rebuilt })
}

/// Apply intents in order
pub fn apply_intents(scene: &mut Scene, intents: &[Intent]) -> TickOutcome {
    for intent in intents {
        match *intent {
            Intent::Quit => {
                log::info!("Quit requested at tick {}", scene.time_ticks);
                return TickOutcome::Quit;
            }
            Intent::ToggleOverlay => {
                scene.params.overlay_visible = !scene.params.overlay_visible;
                log::info!("Overlay visible: {}", scene.params.overlay_visible);
            }
            Intent::AdjustTreeCount(step) => {
                let target = scene.params.tree_count.saturating_add_signed(step as isize);
                scene.resize_trees(target);
                log::info!("Tree count: {}", scene.trees.len());
            }
            Intent::AdjustCloudCount(step) => {
                let target = scene.params.cloud_count.saturating_add_signed(step as isize);
                scene.set_param(Param::CloudCount(target));
            }
            Intent::AdjustShadowIntensity(step) => {
                let target = scene.params.shadow_intensity + step;
                scene.set_param(Param::ShadowIntensity(target));
                log::info!("Shadow intensity: {:.1}", scene.params.shadow_intensity);
            }
            Intent::AdjustDensity(step) => {
                let target = scene.params.density + step;
                scene.set_param(Param::Density(target));
            }
            Intent::Grab(target) => {
                log::info!("Grabbed {:?}", target);
            }
            Intent::DragSun(pos) => scene.move_sun(pos),
            Intent::DragTree { index, pos } => scene.move_tree(index, pos),
            Intent::Release(target) => {
                match target {
                    // Every tree's shadow depends on the sun
                    DragTarget::Sun => {
                        for tree in &mut scene.trees {
                            tree.shadow.invalidate();
                        }
                    }
                    DragTarget::Tree(index) => {
                        if let Some(tree) = scene.trees.get_mut(index) {
                            tree.shadow.invalidate();
                        }
                    }
                }
                log::info!("Released {:?}", target);
            }
        }
    }
    TickOutcome::Continue
}

/// Bring every tree's cached shadow up to date with the current sun and
/// intensity. Returns how many were rebuilt.
pub fn revalidate_shadows(scene: &mut Scene) -> usize {
    let light = scene.sun.pos;
    let intensity = scene.params.shadow_intensity;
    let mut rebuilt = 0;
    for (i, tree) in scene.trees.iter_mut().enumerate() {
        if tree.ensure_shadow(light, intensity) {
            rebuilt += 1;
            let art = tree.shadow.artifact();
            log::debug!(
                "Shadow {} rebuilt: length {:.1}, {} dabs",
                i,
                art.length,
                art.dabs.len()
            );
        }
    }
    rebuilt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::settings::Settings;
    use crate::sim::input::Key;
    use crate::sim::state::Tree;
    use glam::Vec2;

    fn setup() -> (Scene, Interpreter) {
        (Scene::new(&Settings::default(), 4242), Interpreter::new())
    }

    fn keys(keys: &[Key]) -> InputSnapshot {
        InputSnapshot {
            keys_pressed: keys.to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_tick_builds_all_shadows_then_idles() {
        let (mut scene, mut interp) = setup();
        let (outcome, stats) = tick(&mut scene, &mut interp, &InputSnapshot::default());
        assert_eq!(outcome, TickOutcome::Continue);
        assert_eq!(stats.shadows_rebuilt, DEFAULT_TREES);

        let (_, stats) = tick(&mut scene, &mut interp, &InputSnapshot::default());
        assert_eq!(stats.shadows_rebuilt, 0);
        for t in &scene.trees {
            assert_eq!(t.shadow.rasterizations(), 1);
        }
    }

    #[test]
    fn test_quit_is_terminal() {
        let (mut scene, mut interp) = setup();
        let before = scene.clouds.clone();
        let (outcome, _) = tick(&mut scene, &mut interp, &keys(&[Key::Quit]));
        assert_eq!(outcome, TickOutcome::Quit);
        assert_eq!(scene.clouds, before);
        assert_eq!(scene.time_ticks, 0);
    }

    #[test]
    fn test_clouds_advance_each_tick() {
        let (mut scene, mut interp) = setup();
        let x0 = scene.clouds[0].pos.x;
        let v = scene.clouds[0].velocity;
        tick(&mut scene, &mut interp, &InputSnapshot::default());
        let x1 = scene.clouds[0].pos.x;
        assert!((x1 - x0 - v).abs() < 1e-4 || x1 < 0.0);
    }

    #[test]
    fn test_drag_sun_to_corner_is_clamped() {
        let (mut scene, mut interp) = setup();
        let start = scene.sun.pos;

        let press = InputSnapshot {
            pointer: start,
            pointer_down: true,
            pointer_pressed: true,
            ..Default::default()
        };
        tick(&mut scene, &mut interp, &press);

        let drag = InputSnapshot {
            pointer: Vec2::new(10.0, 10.0),
            pointer_down: true,
            ..Default::default()
        };
        tick(&mut scene, &mut interp, &drag);

        let release = InputSnapshot {
            pointer: Vec2::new(10.0, 10.0),
            pointer_released: true,
            ..Default::default()
        };
        tick(&mut scene, &mut interp, &release);

        assert_eq!(scene.sun.pos, Vec2::new(SUN_RADIUS, SUN_RADIUS));
        assert!(interp.drag().is_none());
    }

    #[test]
    fn test_moving_sun_invalidates_every_tree() {
        let (mut scene, mut interp) = setup();
        tick(&mut scene, &mut interp, &InputSnapshot::default());

        scene.move_sun(Vec2::new(200.0, 150.0));
        let light = scene.sun.pos;
        let intensity = scene.params.shadow_intensity;
        for t in &scene.trees {
            assert!(!t.shadow.is_valid_for(&t.shadow_stamp(light, intensity)));
        }
        assert_eq!(revalidate_shadows(&mut scene), DEFAULT_TREES);
    }

    #[test]
    fn test_moving_one_tree_invalidates_only_that_tree() {
        let (mut scene, mut interp) = setup();
        tick(&mut scene, &mut interp, &InputSnapshot::default());

        let target = scene.trees[2].pos;
        let press = InputSnapshot {
            pointer: target - Vec2::new(0.0, 5.0),
            pointer_down: true,
            pointer_pressed: true,
            ..Default::default()
        };
        // Make sure nothing earlier in storage order overlaps the grab point
        for i in 0..2 {
            scene.trees[i].pos = Vec2::new(if target.x > 400.0 { 60.0 } else { 740.0 }, 599.0);
        }
        scene.sun.pos = Vec2::new(SUN_RADIUS, SUN_RADIUS);
        revalidate_shadows(&mut scene);

        let (_, stats) = tick(&mut scene, &mut interp, &press);
        assert_eq!(interp.drag().unwrap().target, DragTarget::Tree(2));
        assert_eq!(stats.shadows_rebuilt, 0);

        let drag = InputSnapshot {
            pointer: press.pointer + Vec2::new(3.0, 4.0),
            pointer_down: true,
            ..Default::default()
        };
        let (_, stats) = tick(&mut scene, &mut interp, &drag);
        assert_eq!(stats.shadows_rebuilt, 1);
        assert_eq!(scene.trees[2].pos, Tree::clamp_position(target + Vec2::new(3.0, 4.0)));
    }

    #[test]
    fn test_intensity_change_invalidates_all() {
        let (mut scene, mut interp) = setup();
        scene.params.overlay_visible = true;
        tick(&mut scene, &mut interp, &InputSnapshot::default());

        let (_, stats) = tick(&mut scene, &mut interp, &keys(&[Key::ShadowMore]));
        assert_eq!(scene.params.shadow_intensity, 1.1);
        assert_eq!(stats.shadows_rebuilt, DEFAULT_TREES);
    }

    #[test]
    fn test_grow_trees_only_builds_new_shadows() {
        let (mut scene, mut interp) = setup();
        scene.params.overlay_visible = true;
        tick(&mut scene, &mut interp, &InputSnapshot::default());

        for _ in 0..3 {
            tick(&mut scene, &mut interp, &keys(&[Key::Up]));
        }
        assert_eq!(scene.trees.len(), 8);
        for t in &scene.trees {
            assert_eq!(t.shadow.rasterizations(), 1);
        }
    }

    #[test]
    fn test_removing_dragged_tree_ends_the_drag() {
        let (mut scene, mut interp) = setup();
        scene.params.overlay_visible = true;
        scene.sun.pos = Vec2::new(SUN_RADIUS, SUN_RADIUS);
        for (i, t) in scene.trees.iter_mut().enumerate() {
            t.pos = Vec2::new(100.0 + 120.0 * i as f32, 560.0);
        }
        tick(&mut scene, &mut interp, &InputSnapshot::default());

        let grab_at = scene.trees[4].pos - Vec2::new(0.0, 5.0);
        let press = InputSnapshot {
            pointer: grab_at,
            pointer_down: true,
            pointer_pressed: true,
            ..Default::default()
        };
        tick(&mut scene, &mut interp, &press);
        assert_eq!(interp.drag().unwrap().target, DragTarget::Tree(4));

        let holding = |keys_pressed: Vec<Key>, pointer: Vec2| InputSnapshot {
            pointer,
            pointer_down: true,
            keys_pressed,
            ..Default::default()
        };
        tick(&mut scene, &mut interp, &holding(vec![Key::Down], grab_at));
        assert_eq!(scene.trees.len(), 4);
        assert!(interp.drag().is_none());

        tick(&mut scene, &mut interp, &holding(vec![Key::Up], grab_at));
        assert_eq!(scene.trees.len(), 5);
        let spawned = scene.trees[4].pos;

        tick(&mut scene, &mut interp, &holding(vec![], Vec2::new(300.0, 530.0)));
        assert_eq!(scene.trees[4].pos, spawned);

        let release = InputSnapshot {
            pointer: Vec2::new(300.0, 530.0),
            pointer_released: true,
            ..Default::default()
        };
        tick(&mut scene, &mut interp, &release);
        assert!(interp.drag().is_none());
    }

    #[test]
    fn test_repeated_steps_saturate() {
        let (mut scene, mut interp) = setup();
        for _ in 0..100 {
            tick(&mut scene, &mut interp, &keys(&[Key::Up]));
        }
        assert_eq!(scene.params.density, 1.0);
        for _ in 0..100 {
            tick(&mut scene, &mut interp, &keys(&[Key::Down]));
        }
        assert_eq!(scene.params.density, 0.0);

        tick(&mut scene, &mut interp, &keys(&[Key::ToggleOverlay]));
        for _ in 0..100 {
            tick(&mut scene, &mut interp, &keys(&[Key::Up, Key::Right, Key::ShadowMore]));
        }
        assert_eq!(scene.params.tree_count, MAX_TREES);
        assert_eq!(scene.trees.len(), MAX_TREES);
        assert_eq!(scene.params.cloud_count, MAX_CLOUDS);
        assert_eq!(scene.params.shadow_intensity, MAX_SHADOW_INTENSITY);

        for _ in 0..100 {
            tick(&mut scene, &mut interp, &keys(&[Key::Down, Key::Left, Key::ShadowLess]));
        }
        assert_eq!(scene.params.tree_count, MIN_TREES);
        assert_eq!(scene.trees.len(), MIN_TREES);
        assert_eq!(scene.params.cloud_count, 0);
        assert_eq!(scene.params.shadow_intensity, MIN_SHADOW_INTENSITY);
    }
}
