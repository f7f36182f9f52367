//! Fixed timestep simulation tick
//!
//! One call is one frame. The frame order while playing is fixed:
//! flap, integrate, scroll/evict/spawn, score, then collide.

use super::collision::first_contact;
use super::state::{GameEvent, GamePhase, GameState};
use crate::consts::GAME_OVER_COOLDOWN_FRAMES;

/// Input commands for a single tick (edge-triggered)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Flap / start / restart (space, click, tap)
    pub flap: bool,
    /// Pause toggle
    pub pause: bool,
    /// Leave the game
    pub quit: bool,
    /// Clock reading in milliseconds, used by the elapsed spawn policy
    pub now_ms: u64,
}

/// Advance the game state by one frame
pub fn tick(state: &mut GameState, input: &TickInput) {
    state.events.clear();

    if input.quit {
        state.quit_requested = true;
        return;
    }

    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                state.events.push(GameEvent::Paused);
                return;
            }
            GamePhase::Paused => {
                state.phase = GamePhase::Playing;
                state.events.push(GameEvent::Resumed);
            }
            _ => {}
        }
    }

    match state.phase {
        GamePhase::Ready => {
            // Bird hangs in place until the first flap
            if !input.flap {
                return;
            }
            state.phase = GamePhase::Playing;
            state.events.push(GameEvent::Started);
            log::info!("Run started (seed {})", state.seed);
        }
        GamePhase::Paused => return,
        GamePhase::GameOver => {
            if state.cooldown > 0 {
                state.cooldown -= 1;
            } else if input.flap {
                state.restart();
                state.events.push(GameEvent::Restarted);
                log::info!("Restarted with seed {}", state.seed);
            }
            return;
        }
        GamePhase::Playing => {}
    }

    step_playing(state, input);
}

fn step_playing(state: &mut GameState, input: &TickInput) {
    let GameState {
        config,
        rng,
        bird,
        stream,
        score,
        frame,
        phase,
        cooldown,
        last_contact,
        events,
        ..
    } = state;

    *frame += 1;

    if input.flap {
        bird.flap(config.flap_power);
        events.push(GameEvent::Flapped);
    }
    bird.step(config.gravity);

    let step = stream.advance(config, rng, input.now_ms);
    events.extend(step.evicted.into_iter().map(|id| GameEvent::Evicted { id }));
    if let Some(id) = step.spawned {
        events.push(GameEvent::Spawned { id });
    }

    let gained = stream.award(bird.x);
    if gained > 0 {
        *score += gained;
        events.push(GameEvent::Scored { score: *score });
    }

    if let Some(contact) = first_contact(
        &bird.aabb(),
        stream.iter(),
        config.world_top(),
        config.world_floor(),
    ) {
        *phase = GamePhase::GameOver;
        *cooldown = GAME_OVER_COOLDOWN_FRAMES;
        *last_contact = Some(contact);
        events.push(GameEvent::Crashed(contact));
        log::info!(
            "Crashed into {:?} at frame {} with score {}",
            contact,
            frame,
            score
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::collision::Contact;
    use crate::sim::obstacles::ObstacleSide;

    fn flap() -> TickInput {
        TickInput {
            flap: true,
            ..Default::default()
        }
    }

    fn pause() -> TickInput {
        TickInput {
            pause: true,
            ..Default::default()
        }
    }

    /// No gravity and a gap pinned to y 170..329, so a resting bird at the
    /// centre flies through every pair.
    fn corridor_config() -> GameConfig {
        GameConfig {
            gravity: 0.0,
            gap_height: 159.0,
            gap_margin: 170.0,
            ..Default::default()
        }
    }

    fn playing(config: GameConfig) -> GameState {
        let mut state = GameState::new(config, 2024).unwrap();
        state.phase = GamePhase::Playing;
        state
    }

    #[test]
    fn test_tick_ready_to_playing() {
        let mut state = GameState::new(GameConfig::default(), 12345).unwrap();
        let start_y = state.bird.y;

        // Tick without flap - should stay in Ready and not move
        for _ in 0..10 {
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.phase, GamePhase::Ready);
        assert_eq!(state.bird.y, start_y);
        assert!(state.stream.is_empty());

        tick(&mut state, &flap());
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.events[..2], [GameEvent::Started, GameEvent::Flapped]);
        assert_eq!(state.bird.velocity, -5.5 + 0.25);
        assert_eq!(state.bird.y, start_y - 5.25);
        assert_eq!(state.frame, 1);
        // First pair appears straight away
        assert_eq!(state.stream.len(), 1);
    }

    #[test]
    fn test_tick_falls_to_floor() {
        let mut state = GameState::new(GameConfig::default(), 1).unwrap();
        tick(&mut state, &flap());
        for _ in 0..200 {
            tick(&mut state, &TickInput::default());
            if state.is_game_over() {
                break;
            }
        }
        assert!(state.is_game_over());
        assert_eq!(state.last_contact, Some(Contact::Floor));
        assert!(state.events.contains(&GameEvent::Crashed(Contact::Floor)));
        assert_eq!(state.score, 0);
        // Floor is checked without clamping
        assert!(state.bird.aabb().bottom() > state.config.world_floor());
    }

    #[test]
    fn test_tick_flapping_into_ceiling() {
        let mut state = GameState::new(GameConfig::default(), 1).unwrap();
        for _ in 0..100 {
            tick(&mut state, &flap());
            if state.is_game_over() {
                break;
            }
        }
        assert_eq!(state.last_contact, Some(Contact::Ceiling));
        assert!(state.bird.y < 0.0);
    }

    #[test]
    fn test_tick_scores_each_pair_once() {
        let mut state = playing(corridor_config());
        let mut scored = Vec::new();
        for _ in 0..600 {
            tick(&mut state, &TickInput::default());
            for event in &state.events {
                if let GameEvent::Scored { score } = event {
                    scored.push(*score);
                }
            }
        }
        assert_eq!(state.phase, GamePhase::Playing);
        // Pairs spawn every 100 frames from frame 1; the first midpoint
        // passes x 120 on frame 214
        assert_eq!(scored, vec![1, 2, 3, 4]);
        assert_eq!(state.score, 4);
    }

    #[test]
    fn test_tick_hits_upper_pipe() {
        let mut state = playing(corridor_config());
        state.bird.y = 50.0;
        let mut crash_frame = None;
        for _ in 0..300 {
            tick(&mut state, &TickInput::default());
            if state.is_game_over() {
                crash_frame = Some(state.frame);
                break;
            }
        }
        // Pipe left edge reaches the bird's right edge (154) on frame 184
        assert_eq!(crash_frame, Some(184));
        assert_eq!(
            state.last_contact,
            Some(Contact::Obstacle {
                id: 1,
                side: ObstacleSide::Upper
            })
        );
    }

    #[test]
    fn test_tick_pause() {
        let mut state = GameState::new(GameConfig::default(), 12345).unwrap();
        tick(&mut state, &flap());
        assert_eq!(state.phase, GamePhase::Playing);

        tick(&mut state, &pause());
        assert_eq!(state.phase, GamePhase::Paused);
        assert_eq!(state.events, vec![GameEvent::Paused]);

        let y = state.bird.y;
        let frame = state.frame;
        for _ in 0..20 {
            tick(&mut state, &flap());
        }
        assert_eq!(state.bird.y, y);
        assert_eq!(state.frame, frame);

        // Unpausing resumes on the same tick
        tick(&mut state, &pause());
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.events[0], GameEvent::Resumed);
        assert_eq!(state.frame, frame + 1);
    }

    #[test]
    fn test_pause_ignored_on_start_screen() {
        let mut state = GameState::new(GameConfig::default(), 3).unwrap();
        tick(&mut state, &pause());
        assert_eq!(state.phase, GamePhase::Ready);
    }

    #[test]
    fn test_game_over_cooldown_then_restart() {
        let mut state = GameState::new(GameConfig::default(), 8).unwrap();
        tick(&mut state, &flap());
        while !state.is_game_over() {
            tick(&mut state, &TickInput::default());
        }
        let old_seed = state.seed;

        // Mashing flap during the cooldown does nothing
        for _ in 0..GAME_OVER_COOLDOWN_FRAMES {
            tick(&mut state, &flap());
            assert!(state.is_game_over());
        }

        tick(&mut state, &flap());
        assert_eq!(state.phase, GamePhase::Ready);
        assert_eq!(state.events, vec![GameEvent::Restarted]);
        assert_eq!(state.score, 0);
        assert!(state.stream.is_empty());
        assert_eq!(state.bird.y, state.config.bird_start_y());
        assert_eq!(state.bird.velocity, 0.0);
        assert_ne!(state.seed, old_seed);
    }

    #[test]
    fn test_quit_sets_flag() {
        let mut state = GameState::new(GameConfig::default(), 3).unwrap();
        tick(
            &mut state,
            &TickInput {
                quit: true,
                ..Default::default()
            },
        );
        assert!(state.quit_requested);
        assert_eq!(state.phase, GamePhase::Ready);
    }

    #[test]
    fn test_events_cleared_each_tick() {
        let mut state = GameState::new(GameConfig::default(), 3).unwrap();
        tick(&mut state, &flap());
        assert!(!state.events.is_empty());
        tick(&mut state, &TickInput::default());
        assert!(!state.events.contains(&GameEvent::Started));
        assert!(!state.events.contains(&GameEvent::Flapped));
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            let mut state = GameState::new(GameConfig::default(), 777).unwrap();
            tick(&mut state, &flap());
            for i in 0..400u32 {
                let input = TickInput {
                    flap: i % 19 == 0,
                    ..Default::default()
                };
                tick(&mut state, &input);
            }
            let pipes: Vec<(u32, u32, u32)> = state
                .stream
                .iter()
                .map(|p| (p.id, p.x.to_bits(), p.gap_start.to_bits()))
                .collect();
            (
                state.bird.y.to_bits(),
                state.score,
                state.frame,
                state.phase,
                pipes,
            )
        };
        assert_eq!(run(), run());
    }
}
