//! Obstacle stream: pipe pairs that scroll right-to-left
//!
//! Pairs are kept in a deque ordered by x. Every pair spawns at the same line
//! and moves at the same speed, so insertion order is spatial order and the
//! oldest pair is always the first one to leave the screen.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use crate::config::{GameConfig, SpawnPolicy};

/// Which half of a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleSide {
    /// Hangs from the top of the world down to the gap
    Upper,
    /// Rises from the floor up to the gap
    Lower,
}

/// Two pipes sharing an x position with a passable gap between them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstaclePair {
    pub id: u32,
    /// Left edge
    pub x: f32,
    /// Top of the gap
    pub gap_start: f32,
    pub gap_height: f32,
    pub width: f32,
    /// Already counted toward the score
    pub scored: bool,
}

impl ObstaclePair {
    pub fn new(id: u32, x: f32, gap_start: f32, gap_height: f32, width: f32) -> Self {
        Self {
            id,
            x,
            gap_start,
            gap_height,
            width,
            scored: false,
        }
    }

    /// Bottom of the gap
    #[inline]
    pub fn gap_end(&self) -> f32 {
        self.gap_start + self.gap_height
    }

    #[inline]
    pub fn right_edge(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn midpoint_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Fully past the left edge of the world
    #[inline]
    pub fn is_off_screen(&self) -> bool {
        self.right_edge() < 0.0
    }

    /// Pipe above the gap
    pub fn upper_rect(&self, world_top: f32) -> Aabb {
        Aabb::new(self.x, world_top, self.width, self.gap_start - world_top)
    }

    /// Pipe below the gap, down to the floor
    pub fn lower_rect(&self, world_floor: f32) -> Aabb {
        let top = self.gap_end();
        Aabb::new(self.x, top, self.width, world_floor - top)
    }
}

/// One pipe rectangle, tagged for the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleRect {
    pub id: u32,
    pub kind: ObstacleSide,
    pub rect: Aabb,
}

/// What changed during one [`ObstacleStream::advance`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStep {
    /// Id of the pair spawned this frame
    pub spawned: Option<u32>,
    /// Ids of pairs evicted this frame, oldest first
    pub evicted: Vec<u32>,
}

/// Ordered sequence of in-flight pairs plus the spawn timers
#[derive(Debug, Clone)]
pub struct ObstacleStream {
    pairs: VecDeque<ObstaclePair>,
    /// Frames since the last spawn (frame policy)
    frames_since_spawn: u32,
    /// Clock reading of the last spawn (elapsed policy)
    last_spawn_ms: Option<u64>,
    next_id: u32,
}

impl Default for ObstacleStream {
    fn default() -> Self {
        Self::new()
    }
}

impl ObstacleStream {
    pub fn new() -> Self {
        Self {
            pairs: VecDeque::new(),
            frames_since_spawn: 0,
            last_spawn_ms: None,
            next_id: 1,
        }
    }

    /// Drop all pairs and reset the spawn timers
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in spatial order (leftmost first)
    pub fn iter(&self) -> impl Iterator<Item = &ObstaclePair> {
        self.pairs.iter()
    }

    pub fn get(&self, id: u32) -> Option<&ObstaclePair> {
        self.pairs.iter().find(|p| p.id == id)
    }

    /// Newest pair (rightmost)
    pub fn newest(&self) -> Option<&ObstaclePair> {
        self.pairs.back()
    }

    /// Append a pair at the spawn line with a random gap.
    ///
    /// The gap start is drawn uniformly from `[margin, height - gap - margin]`,
    /// so the gap never touches the top or the floor.
    pub fn spawn<R: Rng + ?Sized>(&mut self, config: &GameConfig, rng: &mut R) -> u32 {
        let (lo, hi) = config.gap_start_range();
        let gap_start = rng.random_range(lo..=hi).clamp(lo, hi);

        let id = self.next_id;
        self.next_id += 1;
        self.pairs.push_back(ObstaclePair::new(
            id,
            config.spawn_x,
            gap_start,
            config.gap_height,
            config.pipe_width,
        ));
        log::debug!("Spawned pair {} with gap at {:.1}", id, gap_start);
        id
    }

    /// Move every pair left
    pub fn scroll(&mut self, speed: f32) {
        for pair in &mut self.pairs {
            pair.x -= speed;
        }
    }

    /// Remove pairs that have left the screen, returning their ids.
    ///
    /// Only the front can be off screen, so this pops from the front and
    /// leaves the rest in order.
    pub fn evict(&mut self) -> Vec<u32> {
        let mut evicted = Vec::new();
        while self.pairs.front().is_some_and(ObstaclePair::is_off_screen) {
            if let Some(pair) = self.pairs.pop_front() {
                log::debug!("Evicted pair {}", pair.id);
                evicted.push(pair.id);
            }
        }
        debug_assert!(self.pairs.iter().all(|p| !p.is_off_screen()));
        evicted
    }

    /// Spawn decision for this frame; updates the policy's timers
    fn should_spawn(&mut self, config: &GameConfig, now_ms: u64) -> bool {
        match config.spawn_policy {
            SpawnPolicy::Spacing { spacing } => match self.newest() {
                None => true,
                Some(newest) => newest.x <= config.spawn_x - spacing,
            },
            SpawnPolicy::Frames { interval } => {
                self.frames_since_spawn += 1;
                if self.frames_since_spawn > interval {
                    self.frames_since_spawn = 0;
                    true
                } else {
                    false
                }
            }
            SpawnPolicy::Elapsed { period_ms } => match self.last_spawn_ms {
                // The first frame counts as a spawn instant
                None => {
                    self.last_spawn_ms = Some(now_ms);
                    false
                }
                Some(last) if now_ms.saturating_sub(last) > period_ms => {
                    self.last_spawn_ms = Some(now_ms);
                    true
                }
                Some(_) => false,
            },
        }
    }

    /// Advance one frame: scroll, evict, then maybe spawn
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        config: &GameConfig,
        rng: &mut R,
        now_ms: u64,
    ) -> StreamStep {
        self.scroll(config.pipe_speed);
        let evicted = self.evict();
        let spawned = if self.should_spawn(config, now_ms) {
            Some(self.spawn(config, rng))
        } else {
            None
        };
        StreamStep { spawned, evicted }
    }

    /// Score pairs whose midpoint has passed `entity_x`.
    ///
    /// Each pair carries its own marker, so a pair is counted once no matter
    /// how many frames it stays on screen or how many pairs are in flight.
    pub fn award(&mut self, entity_x: f32) -> u32 {
        let mut newly_scored = 0;
        for pair in &mut self.pairs {
            if pair.midpoint_x() >= entity_x {
                // Everything further back is to the right as well
                break;
            }
            if !pair.scored {
                pair.scored = true;
                newly_scored += 1;
            }
        }
        newly_scored
    }

    /// Every pipe rectangle, upper then lower per pair
    pub fn rects(&self, world_top: f32, world_floor: f32) -> impl Iterator<Item = ObstacleRect> + '_ {
        self.pairs.iter().flat_map(move |pair| {
            [
                ObstacleRect {
                    id: pair.id,
                    kind: ObstacleSide::Upper,
                    rect: pair.upper_rect(world_top),
                },
                ObstacleRect {
                    id: pair.id,
                    kind: ObstacleSide::Lower,
                    rect: pair.lower_rect(world_floor),
                },
            ]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    /// World 500 tall, gap 160, margin 150, pipes 80 wide at 2.5/frame from x 610
    fn narrow_config() -> GameConfig {
        GameConfig {
            world_width: 600.0,
            world_height: 500.0,
            gap_height: 160.0,
            gap_margin: 150.0,
            pipe_width: 80.0,
            pipe_speed: 2.5,
            spawn_x: 610.0,
            spawn_policy: SpawnPolicy::Spacing { spacing: 250.0 },
            ..Default::default()
        }
    }

    #[test]
    fn test_gap_start_within_margins() {
        let config = narrow_config();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut stream = ObstacleStream::new();
        for _ in 0..500 {
            stream.spawn(&config, &mut rng);
        }
        for pair in stream.iter() {
            assert!((150.0..=190.0).contains(&pair.gap_start), "{}", pair.gap_start);
            assert_eq!(pair.gap_height, 160.0);
            assert_eq!(pair.x, 610.0);
        }
    }

    #[test]
    fn test_pair_evicted_after_leaving_screen() {
        let config = narrow_config();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut stream = ObstacleStream::new();
        let id = stream.spawn(&config, &mut rng);

        let mut last_x = 610.0;
        let mut gone_at = None;
        for frame in 1..=301u32 {
            let step = stream.advance(&config, &mut rng, 0);
            match stream.get(id) {
                Some(pair) => {
                    assert!(gone_at.is_none(), "pair came back after eviction");
                    assert!(pair.x < last_x);
                    assert_eq!(pair.x, 610.0 - 2.5 * frame as f32);
                    assert!(pair.right_edge() >= 0.0);
                    last_x = pair.x;
                }
                None => {
                    if gone_at.is_none() {
                        assert_eq!(step.evicted, vec![id]);
                        gone_at = Some(frame);
                    }
                }
            }
        }

        // 610 - 2.5 * 301 = -142.5, well past -width
        assert!(610.0 - 2.5 * 301.0 < -config.pipe_width);
        // First frame with x + 80 < 0 is x = -82.5, i.e. frame 277
        assert_eq!(gone_at, Some(277));
        assert!(stream.get(id).is_none());
    }

    #[test]
    fn test_eviction_keeps_order() {
        let config = narrow_config();
        let mut stream = ObstacleStream::new();
        stream.pairs.push_back(ObstaclePair::new(1, -100.0, 150.0, 160.0, 80.0));
        stream.pairs.push_back(ObstaclePair::new(2, -80.0, 150.0, 160.0, 80.0));
        stream.pairs.push_back(ObstaclePair::new(3, 100.0, 150.0, 160.0, 80.0));
        stream.pairs.push_back(ObstaclePair::new(4, 350.0, 150.0, 160.0, 80.0));

        let evicted = stream.evict();
        // x = -80 has right edge exactly at 0 and stays
        assert_eq!(evicted, vec![1]);
        let ids: Vec<u32> = stream.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);

        stream.scroll(config.pipe_speed);
        assert_eq!(stream.evict(), vec![2]);
        let ids: Vec<u32> = stream.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[test]
    fn test_spacing_policy_keeps_constant_distance() {
        let config = narrow_config();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut stream = ObstacleStream::new();

        // Empty stream spawns straight away
        let step = stream.advance(&config, &mut rng, 0);
        assert_eq!(step.spawned, Some(1));

        // 250 units at 2.5/frame is 100 frames
        let mut spawn_frames = Vec::new();
        for frame in 2..=400u32 {
            if stream.advance(&config, &mut rng, 0).spawned.is_some() {
                spawn_frames.push(frame);
            }
        }
        assert_eq!(spawn_frames, vec![101, 201, 301]);

        let xs: Vec<f32> = stream.iter().map(|p| p.x).collect();
        for w in xs.windows(2) {
            assert_eq!(w[1] - w[0], 250.0);
        }
    }

    #[test]
    fn test_frame_policy_matches_timer() {
        let config = GameConfig {
            spawn_policy: SpawnPolicy::Frames { interval: 150 },
            ..narrow_config()
        };
        let mut rng = Pcg32::seed_from_u64(3);
        let mut stream = ObstacleStream::new();

        let mut spawn_frames = Vec::new();
        for frame in 1..=400u32 {
            if stream.advance(&config, &mut rng, 0).spawned.is_some() {
                spawn_frames.push(frame);
            }
        }
        assert_eq!(spawn_frames, vec![151, 302]);
    }

    #[test]
    fn test_elapsed_policy_uses_clock() {
        let config = GameConfig {
            spawn_policy: SpawnPolicy::Elapsed { period_ms: 1000 },
            ..narrow_config()
        };
        let mut rng = Pcg32::seed_from_u64(3);
        let mut stream = ObstacleStream::new();

        assert_eq!(stream.advance(&config, &mut rng, 5_000).spawned, None);
        assert_eq!(stream.advance(&config, &mut rng, 5_500).spawned, None);
        assert_eq!(stream.advance(&config, &mut rng, 6_000).spawned, None);
        assert!(stream.advance(&config, &mut rng, 6_017).spawned.is_some());
        assert_eq!(stream.advance(&config, &mut rng, 7_000).spawned, None);
        assert!(stream.advance(&config, &mut rng, 7_034).spawned.is_some());
        assert_eq!(stream.len(), 2);
    }

    #[test]
    fn test_award_counts_each_pair_once() {
        let mut stream = ObstacleStream::new();
        // Two pairs close together so both are near the bird at once
        stream.pairs.push_back(ObstaclePair::new(1, 40.0, 150.0, 160.0, 80.0));
        stream.pairs.push_back(ObstaclePair::new(2, 70.0, 150.0, 160.0, 80.0));
        stream.pairs.push_back(ObstaclePair::new(3, 400.0, 150.0, 160.0, 80.0));

        // Midpoints are 80, 110, 440; bird at 120 has passed the first two
        assert_eq!(stream.award(120.0), 2);
        assert_eq!(stream.award(120.0), 0);

        for _ in 0..200 {
            stream.scroll(2.5);
            stream.evict();
            stream.award(120.0);
        }
        assert!(stream.get(3).is_none_or(|p| p.scored));
    }

    #[test]
    fn test_award_ignores_pairs_ahead() {
        let mut stream = ObstacleStream::new();
        stream.pairs.push_back(ObstaclePair::new(1, 81.0, 150.0, 160.0, 80.0));
        // Midpoint 121 is still ahead of 120
        assert_eq!(stream.award(120.0), 0);
        stream.scroll(1.0);
        // Midpoint 120 is level, not past
        assert_eq!(stream.award(120.0), 0);
        stream.scroll(0.5);
        assert_eq!(stream.award(120.0), 1);
    }

    #[test]
    fn test_rects_cover_everything_but_the_gap() {
        let mut stream = ObstacleStream::new();
        stream.pairs.push_back(ObstaclePair::new(9, 200.0, 150.0, 160.0, 80.0));

        let rects: Vec<ObstacleRect> = stream.rects(0.0, 500.0).collect();
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0].kind, ObstacleSide::Upper);
        assert_eq!(rects[0].rect, Aabb::new(200.0, 0.0, 80.0, 150.0));
        assert_eq!(rects[1].kind, ObstacleSide::Lower);
        assert_eq!(rects[1].rect, Aabb::new(200.0, 310.0, 80.0, 190.0));
    }

    #[test]
    fn test_clear_resets_ids_and_timers() {
        let config = narrow_config();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut stream = ObstacleStream::new();
        stream.advance(&config, &mut rng, 0);
        stream.advance(&config, &mut rng, 0);
        assert!(!stream.is_empty());

        stream.clear();
        assert!(stream.is_empty());
        assert_eq!(stream.spawn(&config, &mut rng), 1);
    }

    proptest! {
        #[test]
        fn prop_gaps_stay_inside_margins(
            seed in any::<u64>(),
            height in 200u16..1200,
            gap in 20u16..400,
            margin in 0u16..300,
        ) {
            let (height, gap, margin) = (height as f32, gap as f32, margin as f32);
            prop_assume!(gap + 2.0 * margin < height);
            let config = GameConfig {
                world_height: height,
                gap_height: gap,
                gap_margin: margin,
                bird_height: 10.0,
                ..Default::default()
            };
            prop_assert!(config.validate().is_ok());

            let mut rng = Pcg32::seed_from_u64(seed);
            let mut stream = ObstacleStream::new();
            for _ in 0..32 {
                stream.spawn(&config, &mut rng);
            }
            for pair in stream.iter() {
                prop_assert!(pair.gap_start >= margin);
                prop_assert!(pair.gap_start + pair.gap_height <= height - margin);
            }
        }

        #[test]
        fn prop_pairs_scroll_monotonically_until_evicted(
            seed in any::<u64>(),
            speed in 0.5f32..8.0,
            frames in 1usize..600,
        ) {
            let config = GameConfig { pipe_speed: speed, ..Default::default() };
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut stream = ObstacleStream::new();
            let mut seen: std::collections::HashMap<u32, f32> = Default::default();
            let mut evicted: std::collections::HashSet<u32> = Default::default();

            for _ in 0..frames {
                let step = stream.advance(&config, &mut rng, 0);
                evicted.extend(step.evicted);
                for pair in stream.iter() {
                    prop_assert!(!evicted.contains(&pair.id));
                    prop_assert!(pair.right_edge() >= 0.0);
                    if let Some(prev) = seen.insert(pair.id, pair.x) {
                        prop_assert!(pair.x < prev);
                    }
                }
                let xs: Vec<f32> = stream.iter().map(|p| p.x).collect();
                prop_assert!(xs.windows(2).all(|w| w[0] < w[1]));
            }
        }

        #[test]
        fn prop_score_once_per_pair(seed in any::<u64>(), frames in 1usize..2000) {
            let config = GameConfig::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut stream = ObstacleStream::new();
            let mut total = 0u32;
            let mut passed: std::collections::HashSet<u32> = Default::default();

            for _ in 0..frames {
                stream.advance(&config, &mut rng, 0);
                total += stream.award(config.bird_x);
                for pair in stream.iter().filter(|p| p.midpoint_x() < config.bird_x) {
                    passed.insert(pair.id);
                }
            }
            prop_assert_eq!(total as usize, passed.len());
        }
    }
}
