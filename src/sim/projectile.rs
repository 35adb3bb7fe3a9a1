//! Projectiles and their stacking movement/damage modifiers
//!
//! A projectile is base kinematics plus an open list of [`Modifier`]s. Every
//! modifier is independent and evaluated in its own step, so any combination
//! can be active on the same projectile at once.

use glam::Vec2;

use super::body::Body;
use super::state::GameState;
use crate::consts::*;
use crate::dir_toward;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Player,
    Enemy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Modifier {
    /// Steers toward the nearest opposing entity each tick
    Homing { strength: f32, max_speed: f32 },
    /// Rotating offset overlaid on a fixed forward-drifting center
    Spiral {
        phase: f32,
        center: Vec2,
        center_vel: Vec2,
    },
    /// Survives `remaining` collisions instead of destructing on the first
    Piercing { remaining: u32 },
    /// Area-damage pulse on hit; `mega` doubles radius and damage
    Explosive { mega: bool },
    /// Per-hit probability roll multiplying damage
    Critical { chance: f32, multiplier: f32 },
    /// Slows the struck target for a fixed duration
    Freezing,
    /// Outbound for a fixed time, then homes back to its origin point
    Boomerang { origin: Vec2, returning: bool },
    /// On first hit, spawns a pulling field instead of dealing direct damage
    GravityWell,
    /// Stationary column tracking the player's x, damaging on an interval
    Beam { offset_x: f32, last_hit: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: u32,
    pub body: Body,
    pub side: Side,
    pub damage: f32,
    pub age: f32,
    pub lifespan: Option<f32>,
    pub mods: Vec<Modifier>,
}

impl Projectile {
    pub fn new(id: u32, body: Body, side: Side, damage: f32) -> Self {
        Self {
            id,
            body,
            side,
            damage,
            age: 0.0,
            lifespan: None,
            mods: Vec::new(),
        }
    }

    pub fn is_beam(&self) -> bool {
        self.mods.iter().any(|m| matches!(m, Modifier::Beam { .. }))
    }

    /// `Some(mega)` when an explosive modifier is attached
    pub fn explosive(&self) -> Option<bool> {
        self.mods.iter().find_map(|m| match m {
            Modifier::Explosive { mega } => Some(*mega),
            _ => None,
        })
    }

    pub fn has_freezing(&self) -> bool {
        self.mods.iter().any(|m| matches!(m, Modifier::Freezing))
    }

    pub fn has_gravity_well(&self) -> bool {
        self.mods.iter().any(|m| matches!(m, Modifier::GravityWell))
    }

    pub fn crit_params(&self) -> Option<(f32, f32)> {
        self.mods.iter().find_map(|m| match m {
            Modifier::Critical { chance, multiplier } => Some((*chance, *multiplier)),
            _ => None,
        })
    }

    /// Consume one hit. Returns true when the projectile is spent: a
    /// piercing projectile survives until its counter reaches zero, any
    /// other projectile is spent on its first hit.
    pub fn register_hit(&mut self) -> bool {
        for m in &mut self.mods {
            if let Modifier::Piercing { remaining } = m {
                *remaining = remaining.saturating_sub(1);
                return *remaining == 0;
            }
        }
        true
    }
}

/// Advance all projectiles: modifier steps, integration, despawn
pub fn update_projectiles(state: &mut GameState, dt: f32) {
    let mut hostile_centers: Vec<Vec2> = state
        .enemies
        .iter()
        .filter(|e| e.body.active)
        .map(|e| e.body.center())
        .collect();
    if let Some(boss) = &state.boss {
        if boss.body.active {
            hostile_centers.push(boss.body.center());
        }
    }
    let player_center = state.player.body.center();
    let player_targets = [player_center];
    let player_top = state.player.body.pos.y;

    for p in state.projectiles.iter_mut() {
        if !p.body.active {
            continue;
        }
        p.age += dt;
        if let Some(ttl) = p.lifespan {
            if p.age >= ttl {
                p.body.active = false;
                continue;
            }
        }

        let targets: &[Vec2] = match p.side {
            Side::Player => &hostile_centers,
            Side::Enemy => &player_targets,
        };
        let center = p.body.center();
        let age = p.age;
        let size = p.body.size;
        let mut overridden_pos: Option<Vec2> = None;
        let mut integrate = true;

        for m in p.mods.iter_mut() {
            match m {
                Modifier::Homing { strength, max_speed } => {
                    let nearest = targets
                        .iter()
                        .copied()
                        .min_by(|a, b| {
                            a.distance_squared(center)
                                .total_cmp(&b.distance_squared(center))
                        });
                    if let Some(target) = nearest {
                        let desired = dir_toward(center, target) * *max_speed;
                        let vel = p.body.vel + (desired - p.body.vel) * *strength;
                        p.body.vel = vel.clamp_length_max(*max_speed);
                    }
                }
                Modifier::Spiral {
                    phase,
                    center: spiral_center,
                    center_vel,
                } => {
                    *phase += SPIRAL_SPEED * dt;
                    *spiral_center += *center_vel * dt;
                    let offset = Vec2::new(phase.cos(), phase.sin()) * SPIRAL_RADIUS * age.min(1.5);
                    overridden_pos = Some(*spiral_center + offset - size / 2.0);
                    integrate = false;
                }
                Modifier::Boomerang { origin, returning } => {
                    if !*returning && age >= BOOMERANG_OUT_TIME {
                        *returning = true;
                    }
                    if *returning {
                        if center.distance(*origin) < BOOMERANG_ARRIVE_RADIUS {
                            p.body.active = false;
                        } else {
                            p.body.vel = dir_toward(center, *origin) * BOOMERANG_RETURN_SPEED;
                        }
                    }
                }
                Modifier::Beam { offset_x, .. } => {
                    overridden_pos =
                        Some(Vec2::new(player_center.x + *offset_x - BEAM_WIDTH / 2.0, 0.0));
                    p.body.size = Vec2::new(BEAM_WIDTH, player_top.max(0.0));
                    integrate = false;
                }
                Modifier::Piercing { .. }
                | Modifier::Explosive { .. }
                | Modifier::Critical { .. }
                | Modifier::Freezing
                | Modifier::GravityWell => {}
            }
        }

        if let Some(pos) = overridden_pos {
            p.body.pos = pos;
        }
        if integrate && p.body.active {
            p.body.integrate(dt);
        }
        if p.body.active && !p.is_beam() && p.body.outside_play_area() {
            p.body.active = false;
        }
    }

    state.projectiles.retain(|p| p.body.active);
}
