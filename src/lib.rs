//! Veggie Blitz - combat-simulation core for a wave-based arcade shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collisions, waves, rewards)
//! - `tuning`: Run-owned game balance, mutated only by reward effects
//!
//! The crate contains no rendering or platform code. An outer layer feeds
//! movement intent in via [`sim::TickInput`], drives [`sim::tick`] at a fixed
//! timestep, and reads entity state, drained [`sim::GameEvent`]s and the
//! per-tick [`sim::HudSnapshot`] back out.

pub mod sim;
pub mod tuning;

pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
///
/// Speeds are px/second, intervals are seconds (original balance expressed
/// per-frame at 60 Hz).
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Play-area dimensions
    pub const PLAY_WIDTH: f32 = 900.0;
    pub const PLAY_HEIGHT: f32 = 700.0;
    /// Margin beyond the play area before a projectile despawns
    pub const DESPAWN_MARGIN: f32 = 50.0;

    /// Player defaults
    pub const PLAYER_SIZE: f32 = 50.0;
    pub const PLAYER_SPEED: f32 = 234.0;
    pub const PLAYER_MAX_HEALTH: f32 = 100.0;
    pub const PLAYER_FIRE_COOLDOWN: f32 = 0.97;
    /// Floor for fire cooldown after stacked fire-rate upgrades
    pub const MIN_FIRE_COOLDOWN: f32 = 0.1;

    /// Enemy defaults
    pub const ENEMY_SIZE: f32 = 90.0;
    pub const ENEMY_BASE_SPEED: f32 = 46.8;
    pub const ENEMY_SPEED_PER_WAVE: f32 = 1.2;
    pub const ENEMY_BASE_HEALTH: f32 = 25.0;
    pub const ENEMY_HEALTH_PER_WAVE: f32 = 10.0;
    pub const ENEMY_CONTACT_DAMAGE: f32 = 20.0;
    pub const ENEMY_POINTS: u64 = 10;

    /// Wave pacing
    pub const SPAWN_INTERVAL: f32 = 1.5;
    pub const MIN_SPAWN_INTERVAL: f32 = 0.6;
    pub const SPAWN_INTERVAL_STEP: f32 = 0.1;
    pub const WAVE_BASE_ENEMIES: u32 = 10;
    pub const WAVE_ENEMIES_STEP: u32 = 5;
    pub const WAVE_CLEAR_DELAY: f32 = 2.0;
    pub const BOSS_WAVE_INTERVAL: u32 = 5;

    /// Boss defaults
    pub const BOSS_SIZE: f32 = 100.0;
    pub const BOSS_SPEED: f32 = 39.0;
    pub const BOSS_BASE_HEALTH: f32 = 500.0;
    pub const BOSS_HEALTH_PER_WAVE: f32 = 200.0;
    pub const BOSS_SCORE_TRIGGER: u64 = 2000;
    pub const BOSS_POINTS: u64 = 100;
    pub const BOSS_ENTRY_Y: f32 = 100.0;
    pub const BOSS_FIRE_INTERVAL: f32 = 1.0;

    /// Projectile defaults
    pub const BULLET_WIDTH: f32 = 6.0;
    pub const BULLET_HEIGHT: f32 = 15.0;
    pub const BULLET_SPEED: f32 = 210.0;
    pub const BULLET_DAMAGE: f32 = 25.0;
    pub const ENEMY_BULLET_WIDTH: f32 = 5.0;
    pub const ENEMY_BULLET_HEIGHT: f32 = 12.0;
    pub const ENEMY_BULLET_SPEED: f32 = 195.0;
    pub const ENEMY_BULLET_DAMAGE: f32 = 10.0;

    /// Progression
    pub const SCORE_MULTIPLIER: f32 = 1.2;
    pub const KILL_XP: u32 = 10;
    pub const BOSS_XP: u32 = 100;
    pub const FIRST_LEVEL_XP: u32 = 100;
    pub const LEVEL_XP_GROWTH: f32 = 1.15;

    /// Modifier parameters
    pub const CRIT_CHANCE: f32 = 0.25;
    pub const CRIT_MULTIPLIER: f32 = 2.5;
    pub const EXPLOSION_RADIUS: f32 = 80.0;
    pub const EXPLOSION_DAMAGE: f32 = 30.0;
    pub const CHAIN_JUMPS: u32 = 3;
    pub const CHAIN_RADIUS: f32 = 200.0;
    pub const CHAIN_DAMAGE: f32 = 20.0;
    pub const CHAIN_JUMP_DELAY: f32 = 0.1;
    pub const PIERCE_HITS: u32 = 3;
    pub const HOMING_STRENGTH: f32 = 0.15;
    pub const HOMING_SPEED_CAP: f32 = 1.5;
    pub const SPIRAL_RADIUS: f32 = 30.0;
    pub const SPIRAL_SPEED: f32 = 5.0;
    pub const BOOMERANG_OUT_TIME: f32 = 0.75;
    pub const BOOMERANG_RETURN_SPEED: f32 = 480.0;
    pub const BOOMERANG_ARRIVE_RADIUS: f32 = 20.0;
    pub const WELL_DURATION: f32 = 3.0;
    pub const WELL_PULL_RADIUS: f32 = 150.0;
    pub const WELL_PULL_SPEED: f32 = 120.0;
    pub const WELL_CORE_RADIUS: f32 = 30.0;
    pub const WELL_DAMAGE: f32 = 5.0;
    pub const WELL_DAMAGE_INTERVAL: f32 = 0.1;
    pub const WELL_SHOT_COOLDOWN: f32 = 8.0;
    pub const BEAM_DURATION: f32 = 0.5;
    pub const BEAM_WIDTH: f32 = 8.0;
    pub const BEAM_DAMAGE: f32 = 2.0;
    pub const BEAM_HIT_INTERVAL: f32 = 0.1;
    pub const FREEZE_FACTOR: f32 = 0.6;
    pub const FREEZE_DURATION: f32 = 2.0;
    pub const LIFESTEAL_FRACTION: f32 = 0.1;

    /// Periodic area abilities
    pub const NOVA_INTERVAL: f32 = 4.0;
    pub const NOVA_SHOTS: u32 = 16;
    pub const NOVA_SPEED: f32 = 360.0;
    pub const SHOCKWAVE_INTERVAL: f32 = 3.0;
    pub const SHOCKWAVE_RADIUS: f32 = 450.0;
    pub const SHOCKWAVE_DAMAGE: f32 = 30.0;
    pub const SHOCKWAVE_PUSH: f32 = 30.0;
    pub const TOXIC_INTERVAL: f32 = 2.0;
    pub const TOXIC_RADIUS: f32 = 120.0;
    pub const TOXIC_DAMAGE: f32 = 10.0;

    /// Satellites
    pub const DRONE_ORBIT_RADIUS: f32 = 80.0;
    pub const DRONE_FIRE_INTERVAL: f32 = 0.8;
    pub const ORBITAL_ORBIT_RADIUS: f32 = 60.0;
    pub const ORBITAL_FIRE_INTERVAL: f32 = 1.0;
    pub const ORBITAL_CONTACT_DAMAGE: f32 = 30.0;
    pub const ORBITAL_CONTACT_RADIUS: f32 = 20.0;
    pub const BLADE_DAMAGE: f32 = 40.0;
    pub const BLADE_HIT_RADIUS: f32 = 25.0;

    /// Fire-action extras
    pub const VOLLEY_DELAY: f32 = 0.15;
    pub const VOLLEY_SPACING: f32 = 15.0;

    /// Defensive capabilities
    pub const PHOENIX_COOLDOWN: f32 = 90.0;
    pub const PHOENIX_HEALTH_BONUS: f32 = 50.0;
    pub const PHOENIX_DAMAGE_BONUS: f32 = 20.0;
    pub const GODMODE_DURATION: f32 = 5.0;
    pub const GODMODE_COOLDOWN: f32 = 60.0;
    pub const TIME_SLOW_FACTOR: f32 = 0.3;
}

/// Unit direction from `from` toward `to`, zero if coincident
#[inline]
pub fn dir_toward(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Unit vector for an angle (radians, y-down screen coordinates)
#[inline]
pub fn angle_to_dir(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}
