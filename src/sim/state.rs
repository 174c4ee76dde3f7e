//! Scene state and entity types
//!
//! Everything the tick mutates and the frame composer reads lives in
//! `Scene`, passed by reference through each phase of a tick.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::shadow::{ShadowCache, ShadowStamp};
use crate::consts::*;
use crate::settings::Settings;
use crate::{ground_line, round_tenths};

/// A drifting cloud
#[derive(Debug, Clone, PartialEq)]
pub struct Cloud {
    pub pos: Vec2,
    /// Horizontal pixels per tick
    pub velocity: f32,
    pub size: f32,
    /// 0-1
    pub opacity: f32,
}

impl Cloud {
    /// Number of overlapping puffs a cloud is drawn with
    pub const PUFFS: usize = 4;

    /// Random cloud in the upper 60% of the screen
    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            pos: Vec2::new(
                rng.random_range(0.0..SCREEN_WIDTH),
                rng.random_range(0.0..SCREEN_HEIGHT * 0.6),
            ),
            velocity: rng.random_range(1.0..3.0),
            size: rng.random_range(30.0..80.0),
            opacity: rng.random_range(0.3..0.8),
        }
    }

    /// Puff centers relative to the cloud position
    pub fn puff_offsets(&self) -> [Vec2; Self::PUFFS] {
        let s = self.size;
        [
            Vec2::ZERO,
            Vec2::new(s * 0.5, s * 0.1),
            Vec2::new(s * 0.3, -s * 0.1),
            Vec2::new(s * 0.7, s * 0.05),
        ]
    }

    /// Puff radius
    pub fn puff_radius(&self) -> f32 {
        self.size * 0.3
    }
}

/// Crown silhouette of a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeShape {
    /// Stacked tapering triangles (conifer)
    #[default]
    Pointed,
    /// Stacked wide discs
    Rounded,
    /// Stacked shrinking spheres
    Spherical,
}

impl TreeShape {
    pub const ALL: [TreeShape; 3] = [TreeShape::Pointed, TreeShape::Rounded, TreeShape::Spherical];

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// A draggable tree with a cached shadow
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    /// Base of the trunk (y is within the ground band)
    pub pos: Vec2,
    pub size: f32,
    /// Crown tint variation, 0-1
    pub shade: f32,
    pub shape: TreeShape,
    pub shadow: ShadowCache,
}

impl Tree {
    /// Random tree somewhere on the ground band
    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            pos: Vec2::new(
                rng.random_range(50.0..SCREEN_WIDTH - 50.0),
                rng.random_range(ground_line()..SCREEN_HEIGHT),
            ),
            size: rng.random_range(50.0..80.0),
            shade: rng.random_range(0.7..1.0),
            shape: TreeShape::random(rng),
            shadow: ShadowCache::new(),
        }
    }

    pub fn trunk_width(&self) -> f32 {
        self.size * 0.2
    }

    pub fn trunk_height(&self) -> f32 {
        self.size * 0.4
    }

    /// Grab region covering trunk and crown
    pub fn hit_test(&self, point: Vec2) -> bool {
        let crown_top = self.pos.y - self.size * 1.2;
        (point.x - self.pos.x).abs() < self.size * 0.4
            && point.y >= crown_top
            && point.y <= self.pos.y
    }

    /// Stamp of the inputs this tree's shadow depends on
    pub fn shadow_stamp(&self, light: Vec2, intensity: f32) -> ShadowStamp {
        ShadowStamp {
            light,
            intensity,
            anchor: self.pos,
            size: self.size,
        }
    }

    /// Revalidate the cached shadow; true if it had to be rebuilt
    pub fn ensure_shadow(&mut self, light: Vec2, intensity: f32) -> bool {
        let stamp = self.shadow_stamp(light, intensity);
        self.shadow.ensure_valid(stamp)
    }

    /// Clamp a requested position into the ground band
    pub fn clamp_position(pos: Vec2) -> Vec2 {
        Vec2::new(
            pos.x.clamp(0.0, SCREEN_WIDTH),
            pos.y.clamp(ground_line(), SCREEN_HEIGHT),
        )
    }
}

/// The sun
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sun {
    pub pos: Vec2,
}

impl Default for Sun {
    fn default() -> Self {
        Self {
            pos: Vec2::new(SCREEN_WIDTH / 2.0, Self::max_y()),
        }
    }
}

impl Sun {
    /// Lowest allowed sun position (just above the ground)
    pub fn max_y() -> f32 {
        SCREEN_HEIGHT - GROUND_HEIGHT - SUN_GROUND_GAP
    }

    /// Clamp a requested position into the sun's box
    pub fn clamp_position(pos: Vec2) -> Vec2 {
        Vec2::new(
            pos.x.clamp(SUN_RADIUS, SCREEN_WIDTH - SUN_RADIUS),
            pos.y.clamp(SUN_RADIUS, Self::max_y()),
        )
    }

    pub fn hit_test(&self, point: Vec2) -> bool {
        self.pos.distance_squared(point) <= SUN_RADIUS * SUN_RADIUS
    }
}

/// Which subset of stored clouds is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveCloudPolicy {
    /// floor(density × stored) while the overlay is hidden
    Density,
    /// The overlay's explicit cloud count
    Explicit,
}

/// User-tunable scene parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneParams {
    /// Fraction of stored clouds active while the overlay is hidden
    pub density: f32,
    /// Tree count target (overlay)
    pub tree_count: usize,
    /// Cloud count target (overlay)
    pub cloud_count: usize,
    /// Shadow length / darkening factor
    pub shadow_intensity: f32,
    pub overlay_visible: bool,
}

/// A parameter adjustable by `Scene::set_param`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Param {
    Density(f32),
    CloudCount(usize),
    ShadowIntensity(f32),
}

/// Complete scene state
#[derive(Debug, Clone)]
pub struct Scene {
    /// Run seed for reproducibility
    pub seed: u64,
    rng: Pcg32,
    pub clouds: Vec<Cloud>,
    /// Insertion order; resize truncates or appends
    pub trees: Vec<Tree>,
    pub sun: Sun,
    pub params: SceneParams,
    /// Simulation tick counter
    pub time_ticks: u64,
}

impl Scene {
    /// Create a scene from settings with the given seed
    pub fn new(settings: &Settings, seed: u64) -> Self {
        let settings = settings.clone().validated();
        let mut rng = Pcg32::seed_from_u64(seed);

        let clouds = (0..settings.max_clouds)
            .map(|_| Cloud::random(&mut rng))
            .collect();
        let trees = (0..settings.tree_count)
            .map(|_| Tree::random(&mut rng))
            .collect();

        Self {
            seed,
            rng,
            clouds,
            trees,
            sun: Sun::default(),
            params: SceneParams {
                density: settings.density,
                tree_count: settings.tree_count,
                cloud_count: settings.max_clouds,
                shadow_intensity: settings.shadow_intensity,
                overlay_visible: settings.overlay_visible,
            },
            time_ticks: 0,
        }
    }

    /// Resize the tree list to `count` (clamped to the allowed range).
    ///
    /// The first min(old, new) trees are kept untouched, cache included;
    /// growth appends fresh random trees.
    pub fn resize_trees(&mut self, count: usize) {
        let count = count.clamp(MIN_TREES, MAX_TREES);
        self.params.tree_count = count;
        if count <= self.trees.len() {
            self.trees.truncate(count);
            return;
        }
        let rng = &mut self.rng;
        let grow = count - self.trees.len();
        self.trees.extend((0..grow).map(|_| Tree::random(rng)));
    }

    /// Set a parameter, clamped to its documented range
    pub fn set_param(&mut self, param: Param) {
        match param {
            Param::Density(d) => {
                self.params.density = round_tenths(d.clamp(0.0, 1.0));
            }
            Param::CloudCount(n) => {
                self.params.cloud_count = n.min(self.clouds.len());
            }
            Param::ShadowIntensity(s) => {
                self.params.shadow_intensity =
                    round_tenths(s.clamp(MIN_SHADOW_INTENSITY, MAX_SHADOW_INTENSITY));
            }
        }
    }

    /// Move the sun, clamped to its box
    pub fn move_sun(&mut self, pos: Vec2) {
        self.sun.pos = Sun::clamp_position(pos);
    }

    /// Move a tree, clamped to the ground band. Out-of-range indices are ignored.
    ///
    /// The new position is part of the tree's shadow stamp, so its cached
    /// shadow goes stale by itself.
    pub fn move_tree(&mut self, index: usize, pos: Vec2) {
        if let Some(tree) = self.trees.get_mut(index) {
            tree.pos = Tree::clamp_position(pos);
        }
    }

    /// Policy currently selecting the active clouds
    pub fn cloud_policy(&self) -> ActiveCloudPolicy {
        if self.params.overlay_visible {
            ActiveCloudPolicy::Explicit
        } else {
            ActiveCloudPolicy::Density
        }
    }

    /// Number of leading stored clouds that are drawn this frame
    pub fn active_cloud_count(&self) -> usize {
        let n = match self.cloud_policy() {
            ActiveCloudPolicy::Explicit => self.params.cloud_count,
            ActiveCloudPolicy::Density => {
                (self.params.density * self.clouds.len() as f32).floor() as usize
            }
        };
        n.min(self.clouds.len())
    }

    pub fn active_clouds(&self) -> &[Cloud] {
        &self.clouds[..self.active_cloud_count()]
    }

    /// Index of the first tree (storage order) under `point`
    pub fn tree_at(&self, point: Vec2) -> Option<usize> {
        self.trees.iter().position(|t| t.hit_test(point))
    }

    /// Indices of trees sorted back to front (ascending y, stable)
    pub fn trees_back_to_front(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.trees.len()).collect();
        order.sort_by(|&a, &b| self.trees[a].pos.y.total_cmp(&self.trees[b].pos.y));
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Scene {
        Scene::new(&Settings::default(), 12345)
    }

    #[test]
    fn test_new_scene_ranges() {
        let s = scene();
        assert_eq!(s.clouds.len(), MAX_CLOUDS);
        assert_eq!(s.trees.len(), DEFAULT_TREES);
        for c in &s.clouds {
            assert!((0.0..SCREEN_WIDTH).contains(&c.pos.x));
            assert!((0.0..SCREEN_HEIGHT * 0.6).contains(&c.pos.y));
            assert!((1.0..3.0).contains(&c.velocity));
            assert!((30.0..80.0).contains(&c.size));
            assert!((0.3..0.8).contains(&c.opacity));
        }
        for t in &s.trees {
            assert!((50.0..750.0).contains(&t.pos.x));
            assert!((ground_line()..SCREEN_HEIGHT).contains(&t.pos.y));
            assert!((50.0..80.0).contains(&t.size));
            assert!((0.7..1.0).contains(&t.shade));
            assert!(!t.shadow.is_valid());
        }
    }

    #[test]
    fn test_same_seed_same_scene() {
        let a = scene();
        let b = scene();
        assert_eq!(a.clouds, b.clouds);
        assert_eq!(a.trees, b.trees);
    }

    #[test]
    fn test_grow_keeps_existing_trees_and_caches() {
        let mut s = scene();
        let light = s.sun.pos;
        for t in &mut s.trees {
            t.ensure_shadow(light, 1.0);
        }
        let before = s.trees.clone();

        s.resize_trees(8);

        assert_eq!(s.trees.len(), 8);
        assert_eq!(&s.trees[..5], &before[..]);
        for t in &s.trees[5..] {
            assert!(!t.shadow.is_valid());
            assert!((50.0..750.0).contains(&t.pos.x));
            assert!((ground_line()..SCREEN_HEIGHT).contains(&t.pos.y));
            assert!((50.0..80.0).contains(&t.size));
            assert!((0.7..1.0).contains(&t.shade));
        }
    }

    #[test]
    fn test_shrink_truncates_in_insertion_order() {
        let mut s = scene();
        let before = s.trees.clone();
        s.resize_trees(2);
        assert_eq!(s.trees, before[..2].to_vec());
        assert_eq!(s.params.tree_count, 2);
    }

    #[test]
    fn test_resize_clamps() {
        let mut s = scene();
        s.resize_trees(0);
        assert_eq!(s.trees.len(), MIN_TREES);
        s.resize_trees(500);
        assert_eq!(s.trees.len(), MAX_TREES);
    }

    #[test]
    fn test_set_param_clamps() {
        let mut s = scene();
        s.set_param(Param::Density(1.7));
        assert_eq!(s.params.density, 1.0);
        s.set_param(Param::Density(-0.3));
        assert_eq!(s.params.density, 0.0);
        s.set_param(Param::CloudCount(10_000));
        assert_eq!(s.params.cloud_count, MAX_CLOUDS);
        s.set_param(Param::ShadowIntensity(9.0));
        assert_eq!(s.params.shadow_intensity, MAX_SHADOW_INTENSITY);
        s.set_param(Param::ShadowIntensity(0.0));
        assert_eq!(s.params.shadow_intensity, MIN_SHADOW_INTENSITY);
    }

    #[test]
    fn test_active_cloud_policies() {
        let mut s = scene();
        // Hidden overlay: density 0.2 of 100
        assert_eq!(s.cloud_policy(), ActiveCloudPolicy::Density);
        assert_eq!(s.active_cloud_count(), 20);

        s.set_param(Param::CloudCount(40));
        s.params.overlay_visible = true;
        assert_eq!(s.cloud_policy(), ActiveCloudPolicy::Explicit);
        assert_eq!(s.active_cloud_count(), 40);
        assert_eq!(s.active_clouds().len(), 40);
    }

    #[test]
    fn test_sun_clamp() {
        let p = Sun::clamp_position(Vec2::new(10.0, 10.0));
        assert_eq!(p, Vec2::new(SUN_RADIUS, SUN_RADIUS));
        let p = Sun::clamp_position(Vec2::new(900.0, 590.0));
        assert_eq!(p, Vec2::new(SCREEN_WIDTH - SUN_RADIUS, 440.0));
    }

    #[test]
    fn test_tree_hit_region() {
        let t = Tree {
            pos: Vec2::new(200.0, 500.0),
            size: 50.0,
            shade: 0.8,
            shape: TreeShape::Rounded,
            shadow: ShadowCache::new(),
        };
        assert!(t.hit_test(Vec2::new(210.0, 480.0)));
        assert!(t.hit_test(Vec2::new(200.0, 440.0)));
        assert!(!t.hit_test(Vec2::new(200.0, 430.0)));
        assert!(!t.hit_test(Vec2::new(221.0, 480.0)));
        assert!(!t.hit_test(Vec2::new(200.0, 501.0)));
    }

    #[test]
    fn test_back_to_front_order() {
        let mut s = scene();
        s.trees[0].pos.y = SCREEN_HEIGHT;
        s.trees[1].pos.y = 471.0;
        let order = s.trees_back_to_front();
        assert_eq!(order.len(), s.trees.len());
        assert_eq!(*order.last().unwrap(), 0);
        for w in order.windows(2) {
            assert!(s.trees[w[0]].pos.y <= s.trees[w[1]].pos.y);
        }
    }
}
