//! Player controller: movement, fire gating, capabilities, satellites

use glam::Vec2;

use super::body::Body;
use super::projectile::{Modifier, Projectile, Side};
use super::state::{DeferredAction, EffectKind, GameEvent, GameState, RunPhase};
use crate::consts::*;
use rand::Rng;

/// Rise speed of a thrown blade during its outbound phase
const BLADE_RISE_SPEED: f32 = 300.0;

/// Everything a player can have granted by rewards or pickups.
///
/// Capabilities are non-exclusive and fully stack; firing applies every
/// active projectile modifier to every emitted projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    RapidFire,
    Shield,
    DoubleShot,
    TripleShot,
    QuadShot,
    PentaShot,
    Piercing,
    Explosive,
    MegaExplosion,
    CriticalHit,
    Freezing,
    LaserBeam,
    Homing,
    ChainLightning,
    Nova,
    SpiralShot,
    Shockwave,
    ToxicCloud,
    Boomerang,
    GravityWellShot,
    PhoenixReborn,
    GodMode,
    TimeSlow,
    LifeSteal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CapEntry {
    cap: Capability,
    /// `None` means permanent
    expires_at: Option<f32>,
}

/// Enum-keyed capability set; expiring entries are swept once per tick
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CapabilitySet {
    entries: Vec<CapEntry>,
}

impl CapabilitySet {
    pub fn grant(&mut self, cap: Capability) {
        match self.entries.iter_mut().find(|e| e.cap == cap) {
            // Re-granting makes a timed capability permanent
            Some(entry) => entry.expires_at = None,
            None => self.entries.push(CapEntry {
                cap,
                expires_at: None,
            }),
        }
    }

    pub fn grant_until(&mut self, cap: Capability, expires_at: f32) {
        match self.entries.iter_mut().find(|e| e.cap == cap) {
            Some(entry) => {
                if let Some(t) = entry.expires_at {
                    entry.expires_at = Some(t.max(expires_at));
                }
            }
            None => self.entries.push(CapEntry {
                cap,
                expires_at: Some(expires_at),
            }),
        }
    }

    pub fn has(&self, cap: Capability) -> bool {
        self.entries.iter().any(|e| e.cap == cap)
    }

    /// Drop expired entries; called once per tick
    pub fn sweep(&mut self, now: f32) {
        self.entries
            .retain(|e| e.expires_at.is_none_or(|t| now < t));
    }
}

/// Orbiting helper that fires enhanced bullets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drone {
    pub last_shot: f32,
}

/// Orbiting helper that fires and deals contact damage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbital {
    pub last_shot: f32,
}

/// Thrown sweeper: rises with a sideways drift, then returns to the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blade {
    pub pos: Vec2,
    pub drift_x: f32,
    pub age: f32,
}

/// Time-limited pulling field left behind by a gravity-well shot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityWell {
    pub pos: Vec2,
    pub age: f32,
    pub last_damage: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub body: Body,
    pub health: f32,
    pub max_health: f32,
    /// Base seconds between shots (halved while RapidFire is active)
    pub fire_cooldown: f32,
    pub last_fired: f32,
    pub caps: CapabilitySet,

    pub pierce_hits: u32,
    pub crit_chance: f32,
    pub crit_mult: f32,
    pub chain_jumps: u32,
    /// Multiplier on explosion radius, raised by upgrades
    pub explosion_boost: f32,
    /// Extra volleys re-fired after each shot
    pub extra_volleys: u32,
    pub spiral_phase: f32,

    pub drones: Vec<Drone>,
    pub orbitals: Vec<Orbital>,
    pub blades: Vec<Blade>,
    pub wells: Vec<GravityWell>,

    pub last_nova: f32,
    pub last_shockwave: f32,
    pub last_toxic: f32,
    pub last_well_shot: f32,
    pub last_phoenix: f32,
    pub last_godmode: f32,
}

impl Player {
    pub fn new() -> Self {
        Self {
            body: Body::new(
                Vec2::new(
                    PLAY_WIDTH / 2.0 - PLAYER_SIZE / 2.0,
                    PLAY_HEIGHT - PLAYER_SIZE - 30.0,
                ),
                Vec2::splat(PLAYER_SIZE),
            ),
            health: PLAYER_MAX_HEALTH,
            max_health: PLAYER_MAX_HEALTH,
            fire_cooldown: PLAYER_FIRE_COOLDOWN,
            last_fired: -f32::INFINITY,
            caps: CapabilitySet::default(),
            pierce_hits: PIERCE_HITS,
            crit_chance: CRIT_CHANCE,
            crit_mult: CRIT_MULTIPLIER,
            chain_jumps: CHAIN_JUMPS,
            explosion_boost: 1.0,
            extra_volleys: 0,
            spiral_phase: 0.0,
            drones: Vec::new(),
            orbitals: Vec::new(),
            blades: Vec::new(),
            wells: Vec::new(),
            last_nova: -f32::INFINITY,
            last_shockwave: -f32::INFINITY,
            last_toxic: -f32::INFINITY,
            last_well_shot: -f32::INFINITY,
            last_phoenix: -f32::INFINITY,
            last_godmode: -f32::INFINITY,
        }
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    /// Effective cooldown for this tick
    pub fn effective_cooldown(&self) -> f32 {
        if self.caps.has(Capability::RapidFire) {
            self.fire_cooldown * 0.5
        } else {
            self.fire_cooldown
        }
    }

    /// Bullet count per volley: 1 base plus additive multi-shot bonuses
    pub fn volley_size(&self) -> u32 {
        let mut count = 1;
        if self.caps.has(Capability::PentaShot) {
            count += 5;
        }
        if self.caps.has(Capability::QuadShot) {
            count += 4;
        }
        if self.caps.has(Capability::TripleShot) {
            count += 3;
        }
        if self.caps.has(Capability::DoubleShot) {
            count += 1;
        }
        count
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

/// Position of drone `i` of `count`, orbiting the player
pub fn drone_pos(player_center: Vec2, i: usize, count: usize, t: f32) -> Vec2 {
    let angle = i as f32 / count as f32 * std::f32::consts::TAU + t * 2.0;
    player_center + Vec2::new(angle.cos(), angle.sin()) * DRONE_ORBIT_RADIUS
}

/// Position of orbital `i` of `count`; orbitals spin faster than drones
pub fn orbital_pos(player_center: Vec2, i: usize, count: usize, t: f32) -> Vec2 {
    let angle = i as f32 / count as f32 * std::f32::consts::TAU + t * 4.0;
    player_center + Vec2::new(angle.cos(), angle.sin()) * ORBITAL_ORBIT_RADIUS
}

/// Per-tick player update: movement, capability sweep, blades, wells
pub fn update_player(state: &mut GameState, move_dir: Vec2, dt: f32) {
    let now = state.time;
    let player = &mut state.player;

    player.body.vel = move_dir.normalize_or_zero() * PLAYER_SPEED;
    player.body.integrate(dt);
    player.body.clamp_to_play_area();
    player.caps.sweep(now);

    let center = player.body.center();
    for blade in player.blades.iter_mut() {
        blade.age += dt;
        if blade.age < 1.0 {
            blade.pos += Vec2::new(blade.drift_x, -BLADE_RISE_SPEED) * dt;
        } else {
            let to_player = center - blade.pos;
            let dist = to_player.length();
            if dist < BOOMERANG_ARRIVE_RADIUS {
                // Marks the blade for removal below
                blade.age = f32::INFINITY;
            } else {
                blade.pos += to_player / dist * BOOMERANG_RETURN_SPEED * dt;
            }
        }
    }
    player.blades.retain(|b| b.age.is_finite());

    for well in player.wells.iter_mut() {
        well.age += dt;
    }
    player.wells.retain(|w| w.age < WELL_DURATION);
}

/// Fire if the cooldown has elapsed; schedules any extra volleys
pub fn try_fire(state: &mut GameState) {
    if state.time - state.player.last_fired < state.player.effective_cooldown() {
        return;
    }
    state.player.last_fired = state.time;
    fire_volley(state);
    for i in 1..=state.player.extra_volleys {
        state.defer(VOLLEY_DELAY * i as f32, DeferredAction::ExtraVolley);
    }
}

/// Stamp every active projectile modifier onto an emitted bullet.
///
/// Shared by the main volley and satellite fire, so drone and orbital
/// bullets carry the same enhancements as the player's own. Beam and
/// gravity-well attachment are volley-specific and stay with the caller.
pub fn enhance_bullet(
    player: &Player,
    bullet_speed: f32,
    p: &mut Projectile,
    spawn: Vec2,
    spiral_phase: f32,
) {
    let caps = &player.caps;
    if caps.has(Capability::Homing) {
        p.mods.push(Modifier::Homing {
            strength: HOMING_STRENGTH,
            max_speed: bullet_speed * HOMING_SPEED_CAP,
        });
    }
    if caps.has(Capability::SpiralShot) {
        p.mods.push(Modifier::Spiral {
            phase: spiral_phase,
            center: spawn,
            center_vel: p.body.vel,
        });
    }
    if caps.has(Capability::Piercing) {
        p.mods.push(Modifier::Piercing {
            remaining: player.pierce_hits,
        });
    }
    if caps.has(Capability::Explosive) {
        p.mods.push(Modifier::Explosive {
            mega: caps.has(Capability::MegaExplosion),
        });
    }
    if caps.has(Capability::CriticalHit) {
        p.mods.push(Modifier::Critical {
            chance: player.crit_chance,
            multiplier: player.crit_mult,
        });
    }
    if caps.has(Capability::Freezing) {
        p.mods.push(Modifier::Freezing);
    }
    if caps.has(Capability::Boomerang) {
        p.mods.push(Modifier::Boomerang {
            origin: spawn,
            returning: false,
        });
    }
}

/// Emit one volley from the player's current position.
///
/// Every currently active projectile modifier is applied to every emitted
/// projectile; modifiers are non-exclusive and fully stack.
pub fn fire_volley(state: &mut GameState) {
    let count = state.player.volley_size();
    let center = state.player.body.center();
    let top = state.player.body.pos.y;
    let (bw, bh) = state.tuning.bullet_size_px();
    let speed = state.tuning.bullet_speed;
    let damage = state.tuning.bullet_damage;
    let now = state.time;
    let caps = state.player.caps.clone();

    let well_ready = caps.has(Capability::GravityWellShot)
        && now - state.player.last_well_shot > WELL_SHOT_COOLDOWN;
    if well_ready {
        state.player.last_well_shot = now;
    }

    let start = -((count - 1) as f32) * VOLLEY_SPACING / 2.0;
    for i in 0..count {
        let offset_x = start + i as f32 * VOLLEY_SPACING;
        let spawn = Vec2::new(center.x + offset_x, top);
        let id = state.next_entity_id();
        let mut body = Body::new(spawn - Vec2::new(bw / 2.0, bh), Vec2::new(bw, bh));
        body.vel = Vec2::new(0.0, -speed);
        let mut p = Projectile::new(id, body, Side::Player, damage);
        enhance_bullet(
            &state.player,
            speed,
            &mut p,
            spawn,
            state.player.spiral_phase + i as f32 * 0.5,
        );

        if caps.has(Capability::LaserBeam) {
            p.mods.push(Modifier::Beam {
                offset_x,
                last_hit: now,
            });
            p.lifespan = Some(BEAM_DURATION);
            p.body.vel = Vec2::ZERO;
        }
        if well_ready && i == 0 {
            p.mods.push(Modifier::GravityWell);
        }
        state.projectiles.push(p);
    }
    state.player.spiral_phase += 0.5;

    if caps.has(Capability::Boomerang) {
        let drift_x = state.rng.random_range(-120.0..120.0);
        state.player.blades.push(Blade {
            pos: center,
            drift_x,
            age: 0.0,
        });
    }
}

/// Apply incoming damage, honoring invulnerability and the phoenix revive
pub fn damage_player(state: &mut GameState, amount: f32) {
    let now = state.time;
    if state.player.caps.has(Capability::GodMode) || state.player.caps.has(Capability::Shield) {
        return;
    }
    state.player.health -= amount;
    state.events.push(GameEvent::PlayerDamaged {
        amount: amount as u32,
    });
    if state.player.health > 0.0 {
        return;
    }

    let phoenix_ready = state.player.caps.has(Capability::PhoenixReborn)
        && now - state.player.last_phoenix > PHOENIX_COOLDOWN;
    if phoenix_ready {
        state.player.last_phoenix = now;
        state.player.max_health += PHOENIX_HEALTH_BONUS;
        state.player.health = state.player.max_health;
        state.tuning.bullet_damage += PHOENIX_DAMAGE_BONUS;
        let pos = state.player.body.center();
        state.push_effect(pos, EffectKind::Revive);
        state.events.push(GameEvent::PlayerRevived);
        log::info!("phoenix revive at t={now:.2}");
    } else {
        state.player.health = 0.0;
        state.phase = RunPhase::GameOver;
        state.events.push(GameEvent::PlayerDied);
    }
}
