//! Enemy variants, movement/shot patterns, and the boss
//!
//! Each visual variant is permanently bound to one movement function and one
//! shooting profile. The boss derives its phase purely from remaining-health
//! fraction; each attack pattern is a pure function from boss state to a
//! list of projectile-spawn descriptors.

use glam::Vec2;

use super::body::Body;
use crate::consts::*;
use crate::{angle_to_dir, dir_toward};

/// A projectile-spawn descriptor emitted by an attack pattern
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotSpec {
    /// Origin offset from the shooter's center
    pub offset: Vec2,
    /// Unit firing direction
    pub dir: Vec2,
    pub speed: f32,
}

impl ShotSpec {
    fn down(offset_x: f32) -> Self {
        Self {
            offset: Vec2::new(offset_x, 0.0),
            dir: Vec2::new(0.0, 1.0),
            speed: ENEMY_BULLET_SPEED,
        }
    }

    fn angled(angle: f32, speed: f32) -> Self {
        Self {
            offset: Vec2::ZERO,
            dir: angle_to_dir(angle),
            speed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementPattern {
    /// Straight descent
    Descend,
    /// Sine drift around the spawn column
    Sine,
    /// Hard left/right direction flips while descending
    Zigzag,
    /// Circular orbit around a descending drift line
    Orbit,
    /// Diagonal swoop steering toward the player's column
    Swoop,
    /// Stop, then dash downward in bursts
    DashPause,
    /// Horizontal wave whose amplitude decays as it descends
    DampedWave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotKind {
    None,
    Single,
    Double,
    Spread3,
    RapidSingle,
    /// Aimed at the player's current position
    Aimed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyVariant {
    Raider,
    Phantom,
    Virion,
    Reaper,
    Grub,
    Stinger,
    Weaver,
    Hopper,
}

impl EnemyVariant {
    pub const ALL: [EnemyVariant; 8] = [
        EnemyVariant::Raider,
        EnemyVariant::Phantom,
        EnemyVariant::Virion,
        EnemyVariant::Reaper,
        EnemyVariant::Grub,
        EnemyVariant::Stinger,
        EnemyVariant::Weaver,
        EnemyVariant::Hopper,
    ];

    /// Variants eligible for a wave; the pool widens as waves progress
    pub fn pool_for_wave(wave: u32) -> &'static [EnemyVariant] {
        let n = match wave {
            1 => 1,
            2..=3 => 2,
            4..=5 => 3,
            6..=7 => 4,
            _ => Self::ALL.len(),
        };
        &Self::ALL[..n]
    }

    pub fn movement(&self) -> MovementPattern {
        match self {
            EnemyVariant::Raider => MovementPattern::Descend,
            EnemyVariant::Phantom => MovementPattern::Sine,
            EnemyVariant::Virion => MovementPattern::Zigzag,
            EnemyVariant::Reaper => MovementPattern::Swoop,
            EnemyVariant::Grub => MovementPattern::DampedWave,
            EnemyVariant::Stinger => MovementPattern::DashPause,
            EnemyVariant::Weaver => MovementPattern::Orbit,
            EnemyVariant::Hopper => MovementPattern::Zigzag,
        }
    }

    pub fn shots(&self) -> ShotKind {
        match self {
            EnemyVariant::Raider => ShotKind::Single,
            EnemyVariant::Phantom => ShotKind::None,
            EnemyVariant::Virion => ShotKind::Double,
            EnemyVariant::Reaper => ShotKind::Aimed,
            EnemyVariant::Grub => ShotKind::None,
            EnemyVariant::Stinger => ShotKind::RapidSingle,
            EnemyVariant::Weaver => ShotKind::Spread3,
            EnemyVariant::Hopper => ShotKind::Single,
        }
    }

    /// Seconds between shots; `None` for non-shooting variants
    pub fn fire_interval(&self) -> Option<f32> {
        match self.shots() {
            ShotKind::None => None,
            ShotKind::RapidSingle => Some(1.2),
            ShotKind::Single => Some(2.4),
            ShotKind::Double => Some(2.8),
            ShotKind::Spread3 => Some(3.2),
            ShotKind::Aimed => Some(2.5),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub id: u32,
    pub body: Body,
    pub variant: EnemyVariant,
    pub health: f32,
    pub max_health: f32,
    /// Descent speed for this spawn (wave-scaled)
    pub speed: f32,
    /// Drift column the movement pattern oscillates around
    pub base_x: f32,
    /// Per-spawn randomized oscillation parameters
    pub amp: f32,
    pub freq: f32,
    pub phase: f32,
    /// Dash state for the stop-and-dash pattern
    pub dash_timer: f32,
    /// Slowed until this sim time (freezing hits)
    pub slow_until: f32,
    pub last_shot: f32,
}

impl Enemy {
    pub fn new(
        id: u32,
        variant: EnemyVariant,
        pos: Vec2,
        wave: u32,
        amp: f32,
        freq: f32,
        phase: f32,
    ) -> Self {
        let max_health = ENEMY_BASE_HEALTH + ENEMY_HEALTH_PER_WAVE * (wave - 1) as f32;
        Self {
            id,
            body: Body::new(pos, Vec2::splat(ENEMY_SIZE)),
            variant,
            health: max_health,
            max_health,
            speed: ENEMY_BASE_SPEED + ENEMY_SPEED_PER_WAVE * (wave - 1) as f32,
            base_x: pos.x,
            amp,
            freq,
            phase,
            dash_timer: 0.0,
            slow_until: 0.0,
            last_shot: 0.0,
        }
    }

    /// Movement speed factor from freeze/time-slow debuffs
    fn speed_factor(&self, now: f32, time_slow: bool) -> f32 {
        let mut factor = 1.0;
        if now < self.slow_until {
            factor *= FREEZE_FACTOR;
        }
        if time_slow {
            factor *= TIME_SLOW_FACTOR;
        }
        factor
    }

    /// Advance one tick. Reaching the bottom boundary relocates the enemy
    /// back above the top edge without penalty.
    pub fn update(&mut self, now: f32, dt: f32, time_slow: bool, player_center: Vec2) {
        let factor = self.speed_factor(now, time_slow);
        let speed = self.speed * factor;
        let t = now + self.phase;

        match self.variant.movement() {
            MovementPattern::Descend => {
                self.body.vel = Vec2::new(0.0, speed);
            }
            MovementPattern::Sine => {
                self.body.vel = Vec2::new((t * self.freq).sin() * self.amp, speed);
            }
            MovementPattern::Zigzag => {
                // Square wave on the sine gives hard direction flips
                let side = if (t * self.freq).sin() >= 0.0 { 1.0 } else { -1.0 };
                self.body.vel = Vec2::new(side * self.amp, speed);
            }
            MovementPattern::Orbit => {
                // Orbit a drift line that itself descends at half speed
                let angle = t * self.freq;
                self.body.vel = Vec2::new(
                    angle.cos() * self.amp,
                    speed * 0.5 + angle.sin() * self.amp * 0.5,
                );
            }
            MovementPattern::Swoop => {
                let toward = dir_toward(self.body.center(), player_center);
                self.body.vel = Vec2::new(toward.x * self.amp, speed * 1.2);
            }
            MovementPattern::DashPause => {
                self.dash_timer += dt;
                let cycle = self.dash_timer % 1.6;
                self.body.vel = if cycle < 1.0 {
                    Vec2::new(0.0, speed * 0.2)
                } else {
                    Vec2::new(0.0, speed * 3.0)
                };
            }
            MovementPattern::DampedWave => {
                let depth = (self.body.pos.y / PLAY_HEIGHT).clamp(0.0, 1.0);
                let damp = 1.0 - depth;
                self.body.vel = Vec2::new((t * self.freq).sin() * self.amp * damp, speed);
            }
        }

        self.body.integrate(dt);
        self.body.pos.x = self.body.pos.x.clamp(0.0, PLAY_WIDTH - self.body.size.x);

        if self.body.pos.y > PLAY_HEIGHT {
            self.body.pos.y = -self.body.size.y;
        }
    }

    /// Shots for this tick, if the cadence has elapsed
    pub fn try_fire(&mut self, now: f32, player_center: Vec2) -> Vec<ShotSpec> {
        let Some(interval) = self.variant.fire_interval() else {
            return Vec::new();
        };
        if now - self.last_shot < interval {
            return Vec::new();
        }
        self.last_shot = now;

        let down = std::f32::consts::FRAC_PI_2;
        match self.variant.shots() {
            ShotKind::None => Vec::new(),
            ShotKind::Single | ShotKind::RapidSingle => vec![ShotSpec::down(0.0)],
            ShotKind::Double => vec![ShotSpec::down(-15.0), ShotSpec::down(15.0)],
            ShotKind::Spread3 => vec![
                ShotSpec::angled(down - 0.3, ENEMY_BULLET_SPEED),
                ShotSpec::down(0.0),
                ShotSpec::angled(down + 0.3, ENEMY_BULLET_SPEED),
            ],
            ShotKind::Aimed => {
                let dir = dir_toward(self.body.center(), player_center);
                vec![ShotSpec {
                    offset: Vec2::ZERO,
                    dir,
                    speed: ENEMY_BULLET_SPEED,
                }]
            }
        }
    }
}

/// Boss attack patterns; the pool widens as the phase advances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossPattern {
    Triple,
    Burst,
    Wave,
    Spiral,
    Circular,
    Spray,
    Laser,
}

const PHASE0_POOL: [BossPattern; 3] = [BossPattern::Triple, BossPattern::Burst, BossPattern::Wave];
const PHASE1_POOL: [BossPattern; 4] = [
    BossPattern::Burst,
    BossPattern::Wave,
    BossPattern::Spiral,
    BossPattern::Circular,
];
const PHASE2_POOL: [BossPattern; 5] = [
    BossPattern::Spray,
    BossPattern::Circular,
    BossPattern::Spiral,
    BossPattern::Laser,
    BossPattern::Burst,
];

#[derive(Debug, Clone, PartialEq)]
pub struct Boss {
    pub id: u32,
    pub body: Body,
    pub health: f32,
    pub max_health: f32,
    /// Easing into position; inactive for collision/fire until done
    pub entering: bool,
    /// Horizontal drift direction (+1 / -1)
    pub dir: f32,
    pub last_fired: f32,
    /// Running angle for the spiral pattern
    pub spiral_angle: f32,
    /// Wave the boss spawned on (points scaling)
    pub wave: u32,
}

impl Boss {
    pub fn new(id: u32, wave: u32) -> Self {
        let max_health = BOSS_BASE_HEALTH + BOSS_HEALTH_PER_WAVE * (wave - 1) as f32;
        let pos = Vec2::new(PLAY_WIDTH / 2.0 - BOSS_SIZE / 2.0, -BOSS_SIZE);
        Self {
            id,
            body: Body::new(pos, Vec2::splat(BOSS_SIZE)),
            health: max_health,
            max_health,
            entering: true,
            dir: 1.0,
            last_fired: 0.0,
            spiral_angle: 0.0,
            wave,
        }
    }

    /// Phase derived purely from remaining-health fraction
    pub fn phase(&self) -> u32 {
        let frac = self.health / self.max_health;
        if frac >= 0.6 {
            0
        } else if frac >= 0.3 {
            1
        } else {
            2
        }
    }

    pub fn fire_interval(&self) -> f32 {
        match self.phase() {
            0 => BOSS_FIRE_INTERVAL,
            1 => BOSS_FIRE_INTERVAL * 0.75,
            _ => BOSS_FIRE_INTERVAL * 0.5,
        }
    }

    pub fn pattern_pool(&self) -> &'static [BossPattern] {
        match self.phase() {
            0 => &PHASE0_POOL,
            1 => &PHASE1_POOL,
            _ => &PHASE2_POOL,
        }
    }

    pub fn update(&mut self, dt: f32) {
        if self.entering {
            // Ease toward the entry line, then start drifting
            self.body.vel = Vec2::new(0.0, BOSS_SPEED * 2.0);
            self.body.integrate(dt);
            if self.body.pos.y >= BOSS_ENTRY_Y {
                self.body.pos.y = BOSS_ENTRY_Y;
                self.entering = false;
            }
            return;
        }
        self.body.vel = Vec2::new(self.dir * BOSS_SPEED, 0.0);
        self.body.integrate(dt);
        if self.body.pos.x <= 0.0 {
            self.body.pos.x = 0.0;
            self.dir = 1.0;
        } else if self.body.pos.x >= PLAY_WIDTH - self.body.size.x {
            self.body.pos.x = PLAY_WIDTH - self.body.size.x;
            self.dir = -1.0;
        }
    }
}

/// Evaluate an attack pattern into spawn descriptors.
///
/// Pure: the same boss state and player position always produce the same
/// list. The spiral's running angle is advanced by the caller.
pub fn boss_pattern_shots(pattern: BossPattern, boss: &Boss, player_center: Vec2) -> Vec<ShotSpec> {
    let down = std::f32::consts::FRAC_PI_2;
    let tau = std::f32::consts::TAU;
    match pattern {
        BossPattern::Triple => vec![
            ShotSpec::down(-30.0),
            ShotSpec::down(0.0),
            ShotSpec::down(30.0),
        ],
        BossPattern::Burst => {
            let aim = dir_toward(boss.body.center(), player_center);
            let base = aim.y.atan2(aim.x);
            (-2..=2)
                .map(|i| ShotSpec::angled(base + i as f32 * 0.15, ENEMY_BULLET_SPEED))
                .collect()
        }
        BossPattern::Wave => (-3..=3)
            .map(|i| ShotSpec::angled(down + i as f32 * 0.25, ENEMY_BULLET_SPEED))
            .collect(),
        BossPattern::Spiral => (0..6)
            .map(|i| {
                ShotSpec::angled(
                    boss.spiral_angle + i as f32 * tau / 6.0,
                    ENEMY_BULLET_SPEED,
                )
            })
            .collect(),
        BossPattern::Circular => (0..12)
            .map(|i| ShotSpec::angled(i as f32 * tau / 12.0, ENEMY_BULLET_SPEED))
            .collect(),
        BossPattern::Spray => (-4..=4)
            .map(|i| {
                let speed = if i % 2 == 0 {
                    ENEMY_BULLET_SPEED
                } else {
                    ENEMY_BULLET_SPEED * 1.4
                };
                ShotSpec::angled(down + i as f32 * 0.2, speed)
            })
            .collect(),
        BossPattern::Laser => (0..3)
            .map(|i| ShotSpec {
                offset: Vec2::new(0.0, i as f32 * 20.0),
                dir: Vec2::new(0.0, 1.0),
                speed: ENEMY_BULLET_SPEED * 2.0,
            })
            .collect(),
    }
}
