//! Collision detection for the bird against pipes and world bounds
//!
//! Everything is an axis-aligned box in world space (origin top-left, +y down).
//! Touching counts as a hit: two boxes sharing an edge collide, any positive
//! gap between them does not.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::obstacles::{ObstaclePair, ObstacleSide};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Top-left corner
    pub min: Vec2,
    /// Bottom-right corner
    pub max: Vec2,
}

impl Aabb {
    /// Box from top-left corner and size
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + width, y + height),
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.min.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.max.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.min.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.max.y
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// True if the box has no area
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }

    /// Inclusive overlap test (shared edges overlap)
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

/// What the bird hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contact {
    /// Flew above the top of the world
    Ceiling,
    /// Dropped below the floor line
    Floor,
    /// Hit one half of a pipe pair
    Obstacle { id: u32, side: ObstacleSide },
}

/// Find the first thing the bird is touching, if any.
///
/// Pipes are checked before the world bounds, in stream order.
pub fn first_contact<'a, I>(
    entity: &Aabb,
    pairs: I,
    world_top: f32,
    world_floor: f32,
) -> Option<Contact>
where
    I: IntoIterator<Item = &'a ObstaclePair>,
{
    for pair in pairs {
        // Cheap horizontal reject before building both rects
        if entity.right() < pair.x || entity.left() > pair.right_edge() {
            continue;
        }
        let upper = pair.upper_rect(world_top);
        if !upper.is_empty() && entity.overlaps(&upper) {
            return Some(Contact::Obstacle {
                id: pair.id,
                side: ObstacleSide::Upper,
            });
        }
        let lower = pair.lower_rect(world_floor);
        if !lower.is_empty() && entity.overlaps(&lower) {
            return Some(Contact::Obstacle {
                id: pair.id,
                side: ObstacleSide::Lower,
            });
        }
    }

    if entity.top() < world_top {
        return Some(Contact::Ceiling);
    }
    if entity.bottom() > world_floor {
        return Some(Contact::Floor);
    }

    None
}

/// Pass/fail collision oracle: true ends the session
pub fn collides<'a, I>(entity: &Aabb, pairs: I, world_top: f32, world_floor: f32) -> bool
where
    I: IntoIterator<Item = &'a ObstaclePair>,
{
    first_contact(entity, pairs, world_top, world_floor).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOP: f32 = 0.0;
    const FLOOR: f32 = 500.0;

    fn pair(x: f32, gap_start: f32) -> ObstaclePair {
        ObstaclePair::new(7, x, gap_start, 160.0, 80.0)
    }

    #[test]
    fn test_overlap_touching_edges() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let touching_right = Aabb::new(10.0, 0.0, 10.0, 10.0);
        let touching_corner = Aabb::new(10.0, 10.0, 5.0, 5.0);
        let separated = Aabb::new(10.001, 0.0, 10.0, 10.0);

        assert!(a.overlaps(&touching_right));
        assert!(a.overlaps(&touching_corner));
        assert!(!a.overlaps(&separated));
    }

    #[test]
    fn test_bird_inside_gap_is_safe() {
        let pairs = [pair(100.0, 150.0)];
        // Gap spans y 150..310, bird 24 tall at y 200
        let bird = Aabb::new(120.0, 200.0, 34.0, 24.0);
        assert!(!collides(&bird, &pairs, TOP, FLOOR));
    }

    #[test]
    fn test_bird_touching_upper_pipe_collides() {
        let pairs = [pair(100.0, 150.0)];
        let bird = Aabb::new(120.0, 150.0, 34.0, 24.0);
        assert_eq!(
            first_contact(&bird, &pairs, TOP, FLOOR),
            Some(Contact::Obstacle {
                id: 7,
                side: ObstacleSide::Upper
            })
        );

        let clear = Aabb::new(120.0, 150.5, 34.0, 24.0);
        assert!(!collides(&clear, &pairs, TOP, FLOOR));
    }

    #[test]
    fn test_bird_touching_lower_pipe_collides() {
        let pairs = [pair(100.0, 150.0)];
        // Gap ends at 310; bird bottom exactly on it
        let bird = Aabb::new(120.0, 286.0, 34.0, 24.0);
        assert_eq!(
            first_contact(&bird, &pairs, TOP, FLOOR),
            Some(Contact::Obstacle {
                id: 7,
                side: ObstacleSide::Lower
            })
        );
    }

    #[test]
    fn test_horizontal_touch_and_separation() {
        // Bird right edge at 154, pipe starts at 154: touching
        let bird = Aabb::new(120.0, 20.0, 34.0, 24.0);
        assert!(collides(&bird, &[pair(154.0, 150.0)], TOP, FLOOR));
        // Any positive gap is a miss
        assert!(!collides(&bird, &[pair(154.5, 150.0)], TOP, FLOOR));
        // Pipe fully behind the bird
        assert!(!collides(&bird, &[pair(30.0, 150.0)], TOP, FLOOR));
        assert!(collides(&bird, &[pair(40.0, 150.0)], TOP, FLOOR));
    }

    #[test]
    fn test_ceiling_and_floor() {
        let none: [ObstaclePair; 0] = [];
        let height = 24.0;
        let above = Aabb::new(120.0, -1.0, 34.0, height);
        assert_eq!(first_contact(&above, &none, TOP, FLOOR), Some(Contact::Ceiling));

        let at_top = Aabb::new(120.0, 0.0, 34.0, height);
        assert!(!collides(&at_top, &none, TOP, FLOOR));

        let below = Aabb::new(120.0, FLOOR - height + 1.0, 34.0, height);
        assert_eq!(first_contact(&below, &none, TOP, FLOOR), Some(Contact::Floor));

        let resting = Aabb::new(120.0, FLOOR - height, 34.0, height);
        assert!(!collides(&resting, &none, TOP, FLOOR));
    }

    #[test]
    fn test_pipes_reported_before_bounds() {
        let pairs = [pair(100.0, 150.0)];
        let bird = Aabb::new(120.0, -5.0, 34.0, 24.0);
        assert!(matches!(
            first_contact(&bird, &pairs, TOP, FLOOR),
            Some(Contact::Obstacle { .. })
        ));
    }

    #[test]
    fn test_any_pair_in_stream_can_hit() {
        let pairs = [pair(400.0, 150.0), pair(110.0, 300.0), pair(700.0, 150.0)];
        let bird = Aabb::new(120.0, 200.0, 34.0, 24.0);
        assert_eq!(
            first_contact(&bird, &pairs, TOP, FLOOR),
            Some(Contact::Obstacle {
                id: 7,
                side: ObstacleSide::Upper
            })
        );
    }
}
