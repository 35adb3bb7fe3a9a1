//! Spawn/wave director: decides what to spawn and when

use glam::Vec2;

use super::enemy::{Boss, Enemy, EnemyVariant};
use super::state::{GameEvent, GameState};
use crate::consts::*;
use rand::Rng;

/// Counters for the wave currently in progress. Exactly one wave is in
/// progress at a time; `spawned <= total` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wave {
    pub number: u32,
    /// Enemies this wave will spawn in total (0 for boss waves)
    pub total: u32,
    pub spawned: u32,
    pub boss_wave: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DirectorState {
    /// Normal wave, spawning enemies at the cadence
    Spawning,
    /// Boss alive; normal spawning suppressed
    BossActive,
    /// Wave cleared; next wave starts at `until`
    Clearing { until: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Director {
    pub wave: Wave,
    pub state: DirectorState,
    pub last_spawn: f32,
    /// Wave number of the last periodic boss wave (no immediate repeats)
    pub last_boss_wave: u32,
    /// Score at the last boss encounter (score-trigger baseline)
    pub last_boss_score: u64,
}

impl Director {
    pub fn new() -> Self {
        Self {
            wave: Wave {
                number: 0,
                total: 0,
                spawned: 0,
                boss_wave: false,
            },
            state: DirectorState::Spawning,
            last_spawn: 0.0,
            last_boss_wave: 0,
            last_boss_score: 0,
        }
    }

    /// Seconds between enemy spawns; shortens with wave number to a floor
    pub fn spawn_interval(&self) -> f32 {
        (SPAWN_INTERVAL - SPAWN_INTERVAL_STEP * (self.wave.number.saturating_sub(1)) as f32)
            .max(MIN_SPAWN_INTERVAL)
    }
}

impl Default for Director {
    fn default() -> Self {
        Self::new()
    }
}

/// Begin wave `number`: either a periodic boss wave or a normal wave whose
/// enemy total grows linearly with the wave number.
pub fn start_wave(state: &mut GameState, number: u32) {
    let boss_wave = number % BOSS_WAVE_INTERVAL == 0
        && number != state.director.last_boss_wave
        && number > 0;

    state.director.wave = Wave {
        number,
        total: if boss_wave {
            0
        } else {
            WAVE_BASE_ENEMIES + WAVE_ENEMIES_STEP * (number - 1)
        },
        spawned: 0,
        boss_wave,
    };
    state.director.last_spawn = state.time;
    state.events.push(GameEvent::WaveStarted {
        wave: number,
        boss: boss_wave,
    });
    log::info!(
        "wave {number} started (boss={boss_wave}, total={})",
        state.director.wave.total
    );

    if boss_wave {
        state.director.last_boss_wave = number;
        spawn_boss(state);
    } else {
        state.director.state = DirectorState::Spawning;
    }
}

/// Bring in the boss. A trigger while one is already active is a no-op.
/// Any normal enemies still alive are cleared without reward.
pub fn spawn_boss(state: &mut GameState) {
    if state.boss.is_some() {
        return;
    }
    for enemy in state.enemies.iter_mut() {
        enemy.body.active = false;
    }
    state.enemies.clear();

    let wave = state.director.wave.number.max(1);
    let id = state.next_entity_id();
    state.boss = Some(Boss::new(id, wave));
    state.director.state = DirectorState::BossActive;
    state.director.last_boss_score = state.score;
    state.events.push(GameEvent::BossSpawned { wave });
    log::info!("boss spawned on wave {wave}");
}

fn spawn_enemy(state: &mut GameState) {
    let wave = state.director.wave.number;
    let pool = EnemyVariant::pool_for_wave(wave);
    let variant = pool[state.rng.random_range(0..pool.len())];
    let x = state.rng.random_range(0.0..PLAY_WIDTH - ENEMY_SIZE);
    let amp = state.rng.random_range(20.0..60.0);
    let freq = state.rng.random_range(1.0..3.0);
    let phase = state.rng.random_range(0.0..std::f32::consts::TAU);

    let id = state.next_entity_id();
    state.enemies.push(Enemy::new(
        id,
        variant,
        Vec2::new(x, -ENEMY_SIZE),
        wave,
        amp,
        freq,
        phase,
    ));
    state.director.wave.spawned += 1;
    state.director.last_spawn = state.time;
}

/// Spawn step of the tick: score-triggered boss, then cadenced enemies
pub fn spawn_phase(state: &mut GameState) {
    if !matches!(state.director.state, DirectorState::Spawning) {
        return;
    }
    if state.score >= state.director.last_boss_score + BOSS_SCORE_TRIGGER {
        spawn_boss(state);
        return;
    }
    if state.director.wave.spawned < state.director.wave.total
        && state.time - state.director.last_spawn > state.director.spawn_interval()
    {
        spawn_enemy(state);
    }
}

/// Completion step of the tick, after collision resolution
pub fn progress_phase(state: &mut GameState) {
    match state.director.state {
        DirectorState::Spawning => {
            let wave = state.director.wave;
            let alive = state.enemies.iter().any(|e| e.body.active);
            if wave.spawned == wave.total && !alive {
                state.events.push(GameEvent::WaveCleared { wave: wave.number });
                state.director.state = DirectorState::Clearing {
                    until: state.time + WAVE_CLEAR_DELAY,
                };
                log::info!("wave {} cleared", wave.number);
            }
        }
        DirectorState::BossActive => {}
        DirectorState::Clearing { until } => {
            if state.time >= until {
                let next = state.director.wave.number + 1;
                start_wave(state, next);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    #[test]
    fn test_normal_wave_totals_grow_linearly() {
        let mut state = GameState::new(5);
        assert_eq!(state.director.wave.total, WAVE_BASE_ENEMIES);
        start_wave(&mut state, 3);
        assert_eq!(state.director.wave.total, WAVE_BASE_ENEMIES + 2 * WAVE_ENEMIES_STEP);
    }

    #[test]
    fn test_wave_five_is_a_boss_wave() {
        let mut state = GameState::new(5);
        start_wave(&mut state, 5);
        assert!(state.director.wave.boss_wave);
        assert!(state.boss.is_some());
        assert_eq!(state.director.state, DirectorState::BossActive);
    }

    #[test]
    fn test_boss_wave_does_not_immediately_repeat() {
        let mut state = GameState::new(5);
        state.director.last_boss_wave = 5;
        start_wave(&mut state, 5);
        assert!(!state.director.wave.boss_wave);
        assert!(state.boss.is_none());
    }

    #[test]
    fn test_spawn_interval_has_a_floor() {
        let mut d = Director::new();
        d.wave.number = 1;
        assert_eq!(d.spawn_interval(), SPAWN_INTERVAL);
        d.wave.number = 100;
        assert_eq!(d.spawn_interval(), MIN_SPAWN_INTERVAL);
    }

    #[test]
    fn test_spawned_never_exceeds_total() {
        let mut state = GameState::new(5);
        // Drive far past the point where the wave is fully spawned
        for _ in 0..60 * 60 {
            state.time += SIM_DT;
            spawn_phase(&mut state);
            let wave = state.director.wave;
            assert!(wave.spawned <= wave.total);
        }
        assert_eq!(state.director.wave.spawned, state.director.wave.total);
    }

    #[test]
    fn test_score_trigger_spawns_boss_and_clears_enemies() {
        let mut state = GameState::new(5);
        state.time = 10.0;
        spawn_phase(&mut state);
        assert!(!state.enemies.is_empty());

        state.score = BOSS_SCORE_TRIGGER;
        spawn_phase(&mut state);
        assert!(state.boss.is_some());
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_boss_trigger_while_active_is_noop() {
        let mut state = GameState::new(5);
        spawn_boss(&mut state);
        let id = state.boss.as_ref().unwrap().id;
        spawn_boss(&mut state);
        assert_eq!(state.boss.as_ref().unwrap().id, id);
    }

    #[test]
    fn test_cleared_wave_starts_next_after_delay() {
        let mut state = GameState::new(5);
        // Pretend the wave fully spawned and died out
        state.director.wave.spawned = state.director.wave.total;
        state.enemies.clear();
        state.time = 30.0;
        progress_phase(&mut state);
        assert!(matches!(state.director.state, DirectorState::Clearing { .. }));

        state.time = 30.0 + WAVE_CLEAR_DELAY;
        progress_phase(&mut state);
        assert_eq!(state.director.wave.number, 2);
    }
}
