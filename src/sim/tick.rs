//! Fixed-step frame loop. One `tick` call advances the run by `dt`.
//!
//! Phase order within a tick: player movement and firing, satellite and
//! area attacks, deferred actions, boss and enemy updates, projectile
//! integration, spawning, collision, effect aging, wave progression.
//! Ticks are pure with respect to the seeded generator, so two runs with
//! the same seed and input stream stay bit-identical.

use glam::Vec2;
use rand::Rng;

use super::body::Body;
use super::collision;
use super::director;
use super::enemy::{BossPattern, ShotSpec, boss_pattern_shots};
use super::player::{self, drone_pos, orbital_pos};
use super::projectile::{Projectile, Side, update_projectiles};
use super::state::{DeferredAction, EffectKind, GameState, RunPhase};
use crate::consts::*;
use crate::dir_toward;

/// Player intent for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Movement direction, expected normalized or zero
    pub move_dir: Vec2,
    /// Edge-triggered pause toggle
    pub pause: bool,
}

pub fn tick(state: &mut GameState, input: TickInput, dt: f32) {
    if input.pause {
        match state.phase {
            RunPhase::Playing => {
                state.phase = RunPhase::Paused;
                return;
            }
            RunPhase::Paused => state.phase = RunPhase::Playing,
            _ => {}
        }
    }
    if state.phase != RunPhase::Playing {
        return;
    }

    state.time += dt;
    state.ticks += 1;

    player::update_player(state, input.move_dir, dt);
    player::try_fire(state);
    fire_satellites(state);
    area_attacks(state);
    satellite_contact(state);
    well_fields(state, dt);
    process_deferred(state);

    boss_act(state, dt);
    enemies_act(state, dt);

    update_projectiles(state, dt);
    director::spawn_phase(state);
    collision::resolve(state);

    for effect in &mut state.effects {
        effect.age += dt;
    }
    state.effects.retain(|e| e.age < e.ttl);

    director::progress_phase(state);
}

/// Run every scheduled action whose due time has passed.
///
/// Actions fired here may schedule followups (chain hops do); those run on a
/// later pass, never recursively within this one.
pub fn process_deferred(state: &mut GameState) {
    let now = state.time;
    let mut due = Vec::new();
    let mut i = 0;
    while i < state.deferred.len() {
        if state.deferred[i].due <= now {
            due.push(state.deferred.swap_remove(i).action);
        } else {
            i += 1;
        }
    }
    for action in due {
        match action {
            DeferredAction::ChainJump {
                from,
                jumps_left,
                visited,
            } => collision::perform_chain_jump(state, from, jumps_left, visited),
            DeferredAction::ExtraVolley => {
                if state.player.health > 0.0 {
                    player::fire_volley(state);
                }
            }
            DeferredAction::EffectBurst { pos } => {
                state.push_effect(
                    pos,
                    EffectKind::Explosion {
                        radius: EXPLOSION_RADIUS,
                    },
                );
            }
        }
    }
}

/// Satellite bullets carry the player's active modifiers, exactly like
/// the main volley
fn spawn_player_bullet(state: &mut GameState, center: Vec2, dir: Vec2) {
    let (w, h) = state.tuning.bullet_size_px();
    let id = state.next_entity_id();
    let mut body = Body::centered_at(center, Vec2::new(w, h));
    body.vel = dir * state.tuning.bullet_speed;
    let mut p = Projectile::new(id, body, Side::Player, state.tuning.bullet_damage);
    player::enhance_bullet(
        &state.player,
        state.tuning.bullet_speed,
        &mut p,
        center,
        state.player.spiral_phase,
    );
    state.projectiles.push(p);
}

fn spawn_enemy_bullet(state: &mut GameState, center: Vec2, dir: Vec2, speed: f32) {
    let id = state.next_entity_id();
    let mut body = Body::centered_at(
        center,
        Vec2::new(ENEMY_BULLET_WIDTH, ENEMY_BULLET_HEIGHT),
    );
    body.vel = dir * speed;
    state
        .projectiles
        .push(Projectile::new(id, body, Side::Enemy, ENEMY_BULLET_DAMAGE));
}

/// Nearest shootable target for auto-aiming satellites
fn nearest_target(state: &GameState, from: Vec2) -> Option<Vec2> {
    state
        .enemies
        .iter()
        .filter(|e| e.body.active)
        .map(|e| e.body.center())
        .min_by(|a, b| {
            a.distance_squared(from)
                .total_cmp(&b.distance_squared(from))
        })
        .or_else(|| {
            state
                .boss
                .as_ref()
                .filter(|b| b.body.active && !b.entering)
                .map(|b| b.body.center())
        })
}

/// Drones and orbitals fire plain bullets at the nearest target on their
/// own cadence
fn fire_satellites(state: &mut GameState) {
    if state.player.drones.is_empty() && state.player.orbitals.is_empty() {
        return;
    }
    let now = state.time;
    let center = state.player.body.center();
    let Some(target) = nearest_target(state, center) else {
        return;
    };

    let mut origins = Vec::new();
    let count = state.player.drones.len();
    for i in 0..count {
        if now - state.player.drones[i].last_shot >= DRONE_FIRE_INTERVAL {
            state.player.drones[i].last_shot = now;
            origins.push(drone_pos(center, i, count, now));
        }
    }
    let count = state.player.orbitals.len();
    for i in 0..count {
        if now - state.player.orbitals[i].last_shot >= ORBITAL_FIRE_INTERVAL {
            state.player.orbitals[i].last_shot = now;
            origins.push(orbital_pos(center, i, count, now));
        }
    }
    for origin in origins {
        let dir = dir_toward(origin, target);
        spawn_player_bullet(state, origin, dir);
    }
}

/// Periodic capability-driven pulses centered on the player
fn area_attacks(state: &mut GameState) {
    use super::player::Capability;

    let now = state.time;
    let center = state.player.body.center();

    if state.player.caps.has(Capability::Nova) && now - state.player.last_nova >= NOVA_INTERVAL {
        state.player.last_nova = now;
        state.push_effect(center, EffectKind::Nova);
        for i in 0..NOVA_SHOTS {
            let angle = i as f32 / NOVA_SHOTS as f32 * std::f32::consts::TAU;
            let dir = crate::angle_to_dir(angle);
            let (w, h) = state.tuning.bullet_size_px();
            let id = state.next_entity_id();
            let mut body = Body::centered_at(center, Vec2::new(w, h));
            body.vel = dir * NOVA_SPEED;
            state
                .projectiles
                .push(Projectile::new(id, body, Side::Player, state.tuning.bullet_damage));
        }
    }

    if state.player.caps.has(Capability::Shockwave)
        && now - state.player.last_shockwave >= SHOCKWAVE_INTERVAL
    {
        state.player.last_shockwave = now;
        state.push_effect(
            center,
            EffectKind::Shockwave {
                radius: SHOCKWAVE_RADIUS,
            },
        );
        let mut hit = Vec::new();
        for enemy in &mut state.enemies {
            if !enemy.body.active {
                continue;
            }
            let epos = enemy.body.center();
            if epos.distance(center) < SHOCKWAVE_RADIUS {
                enemy.body.pos += dir_toward(center, epos) * SHOCKWAVE_PUSH;
                hit.push(enemy.id);
            }
        }
        for id in hit {
            collision::damage_enemy(state, id, SHOCKWAVE_DAMAGE, false);
        }
    }

    if state.player.caps.has(Capability::ToxicCloud)
        && now - state.player.last_toxic >= TOXIC_INTERVAL
    {
        state.player.last_toxic = now;
        state.push_effect(
            center,
            EffectKind::ToxicCloud {
                radius: TOXIC_RADIUS,
            },
        );
        let hit: Vec<u32> = state
            .enemies
            .iter()
            .filter(|e| e.body.active && e.body.center().distance(center) < TOXIC_RADIUS)
            .map(|e| e.id)
            .collect();
        for id in hit {
            collision::damage_enemy(state, id, TOXIC_DAMAGE, false);
        }
    }
}

/// Contact damage from orbitals and sweeping blades
fn satellite_contact(state: &mut GameState) {
    let now = state.time;
    let center = state.player.body.center();

    let mut hits: Vec<(u32, f32)> = Vec::new();
    let count = state.player.orbitals.len();
    for i in 0..count {
        let opos = orbital_pos(center, i, count, now);
        for enemy in &state.enemies {
            if enemy.body.active && enemy.body.center().distance(opos) < ORBITAL_CONTACT_RADIUS {
                hits.push((enemy.id, ORBITAL_CONTACT_DAMAGE));
            }
        }
    }
    for blade in &state.player.blades {
        for enemy in &state.enemies {
            if enemy.body.active && enemy.body.center().distance(blade.pos) < BLADE_HIT_RADIUS {
                hits.push((enemy.id, BLADE_DAMAGE));
            }
        }
    }
    for (id, damage) in hits {
        collision::damage_enemy(state, id, damage, false);
    }
}

/// Gravity wells pull nearby enemies inward and grind the ones at the core
fn well_fields(state: &mut GameState, dt: f32) {
    if state.player.wells.is_empty() {
        return;
    }
    let now = state.time;

    let mut core_hits: Vec<u32> = Vec::new();
    for wi in 0..state.player.wells.len() {
        let wpos = state.player.wells[wi].pos;
        for enemy in &mut state.enemies {
            if !enemy.body.active {
                continue;
            }
            let epos = enemy.body.center();
            let dist = epos.distance(wpos);
            if dist < WELL_PULL_RADIUS && dist > 1.0 {
                enemy.body.pos += dir_toward(epos, wpos) * WELL_PULL_SPEED * dt;
            }
        }
        if now - state.player.wells[wi].last_damage >= WELL_DAMAGE_INTERVAL {
            state.player.wells[wi].last_damage = now;
            core_hits.extend(
                state
                    .enemies
                    .iter()
                    .filter(|e| e.body.active && e.body.center().distance(wpos) < WELL_CORE_RADIUS)
                    .map(|e| e.id),
            );
        }
    }
    for id in core_hits {
        collision::damage_enemy(state, id, WELL_DAMAGE, false);
    }
}

fn boss_act(state: &mut GameState, dt: f32) {
    let Some(mut boss) = state.boss.take() else {
        return;
    };
    boss.update(dt);
    if !boss.entering && state.time - boss.last_fired >= boss.fire_interval() {
        boss.last_fired = state.time;
        let pool = boss.pattern_pool();
        let pattern = pool[state.rng.random_range(0..pool.len())];
        if pattern == BossPattern::Spiral {
            boss.spiral_angle += 0.3;
        }
        let player_center = state.player.body.center();
        let origin = boss.body.center();
        for shot in boss_pattern_shots(pattern, &boss, player_center) {
            spawn_enemy_bullet(state, origin + shot.offset, shot.dir, shot.speed);
        }
    }
    state.boss = Some(boss);
}

fn enemies_act(state: &mut GameState, dt: f32) {
    use super::player::Capability;

    let now = state.time;
    let player_center = state.player.body.center();
    let time_slow = state.player.caps.has(Capability::TimeSlow);

    let mut shots: Vec<(Vec2, ShotSpec)> = Vec::new();
    for enemy in &mut state.enemies {
        if !enemy.body.active {
            continue;
        }
        enemy.update(now, dt, time_slow, player_center);
        let origin = enemy.body.center();
        for shot in enemy.try_fire(now, player_center) {
            shots.push((origin, shot));
        }
    }
    for (origin, shot) in shots {
        spawn_enemy_bullet(state, origin + shot.offset, shot.dir, shot.speed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::player::Capability;

    fn run_ticks(state: &mut GameState, n: u32) {
        for _ in 0..n {
            tick(state, TickInput::default(), SIM_DT);
        }
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = GameState::new(42);
        let mut b = GameState::new(42);
        run_ticks(&mut a, 600);
        run_ticks(&mut b, 600);
        assert_eq!(format!("{a:?}"), format!("{b:?}"));
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = GameState::new(1);
        let mut b = GameState::new(2);
        run_ticks(&mut a, 600);
        run_ticks(&mut b, 600);
        assert_ne!(format!("{a:?}"), format!("{b:?}"));
    }

    #[test]
    fn test_pause_freezes_time() {
        let mut state = GameState::new(7);
        run_ticks(&mut state, 10);
        let frozen_at = state.time;
        tick(
            &mut state,
            TickInput {
                pause: true,
                ..Default::default()
            },
            SIM_DT,
        );
        assert_eq!(state.phase, RunPhase::Paused);
        run_ticks(&mut state, 10);
        assert_eq!(state.time, frozen_at);
        tick(
            &mut state,
            TickInput {
                pause: true,
                ..Default::default()
            },
            SIM_DT,
        );
        run_ticks(&mut state, 1);
        assert!(state.time > frozen_at);
    }

    #[test]
    fn test_choosing_blocks_the_clock() {
        let mut state = GameState::new(7);
        state.phase = RunPhase::Choosing;
        let frozen_at = state.time;
        run_ticks(&mut state, 10);
        assert_eq!(state.time, frozen_at);
    }

    #[test]
    fn test_ticks_and_time_advance_together() {
        let mut state = GameState::new(7);
        run_ticks(&mut state, 120);
        assert_eq!(state.ticks, 120);
        assert!((state.time - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_movement_input_moves_the_player() {
        let mut state = GameState::new(7);
        let x0 = state.player.body.pos.x;
        for _ in 0..30 {
            tick(
                &mut state,
                TickInput {
                    move_dir: Vec2::new(1.0, 0.0),
                    ..Default::default()
                },
                SIM_DT,
            );
        }
        assert!(state.player.body.pos.x > x0);
    }

    #[test]
    fn test_nova_fires_radial_burst() {
        let mut state = GameState::new(7);
        state.player.caps.grant(Capability::Nova);
        state.player.last_nova = -f32::INFINITY;
        // Suppress the regular volley so only the burst spawns
        state.player.last_fired = state.time + 100.0;
        state.enemies.clear();
        state.director.wave.total = 0;
        tick(&mut state, TickInput::default(), SIM_DT);
        let player_shots = state
            .projectiles
            .iter()
            .filter(|p| p.side == Side::Player)
            .count();
        assert_eq!(player_shots as u32, NOVA_SHOTS);
    }

    #[test]
    fn test_drone_fires_at_enemy_on_cadence() {
        use super::super::enemy::{Enemy, EnemyVariant};
        use super::super::player::Drone;

        let mut state = GameState::new(7);
        state.enemies.clear();
        state.director.wave.total = 0;
        let id = state.next_entity_id();
        state.enemies.push(Enemy::new(
            id,
            EnemyVariant::Phantom,
            Vec2::new(400.0, 100.0),
            1,
            0.0,
            1.0,
            0.0,
        ));
        state.player.drones.push(Drone { last_shot: 0.0 });
        state.player.last_fired = state.time + 100.0;

        let before = state.projectiles.len();
        run_ticks(&mut state, (DRONE_FIRE_INTERVAL / SIM_DT) as u32 + 2);
        assert!(state.projectiles.len() > before);
    }

    #[test]
    fn test_drone_bullets_carry_player_modifiers() {
        use super::super::enemy::{Enemy, EnemyVariant};
        use super::super::player::Drone;
        use super::super::projectile::Modifier;

        let mut state = GameState::new(7);
        state.enemies.clear();
        state.director.wave.total = 0;
        let id = state.next_entity_id();
        state.enemies.push(Enemy::new(
            id,
            EnemyVariant::Phantom,
            Vec2::new(400.0, 100.0),
            1,
            0.0,
            1.0,
            0.0,
        ));
        state.player.caps.grant(Capability::Piercing);
        state.player.caps.grant(Capability::Homing);
        state.player.drones.push(Drone { last_shot: 0.0 });
        state.player.last_fired = state.time + 100.0;

        run_ticks(&mut state, (DRONE_FIRE_INTERVAL / SIM_DT) as u32 + 2);
        let bullet = state
            .projectiles
            .iter()
            .find(|p| p.side == Side::Player)
            .expect("drone should have fired");
        assert!(
            bullet
                .mods
                .iter()
                .any(|m| matches!(m, Modifier::Piercing { .. }))
        );
        assert!(
            bullet
                .mods
                .iter()
                .any(|m| matches!(m, Modifier::Homing { .. }))
        );
    }

    #[test]
    fn test_extra_volley_skipped_after_death() {
        let mut state = GameState::new(7);
        state.player.health = 0.0;
        state.defer(0.0, DeferredAction::ExtraVolley);
        state.time += 1.0;
        let before = state.projectiles.len();
        process_deferred(&mut state);
        assert_eq!(state.projectiles.len(), before);
        assert!(state.deferred.is_empty());
    }

    #[test]
    fn test_lethal_enemy_contact_ends_the_run() {
        use super::super::enemy::{Enemy, EnemyVariant};

        let mut state = GameState::new(7);
        state.player.health = 10.0;
        let pos = state.player.body.pos;
        for _ in 0..3 {
            let id = state.next_entity_id();
            state.enemies.push(Enemy::new(
                id,
                EnemyVariant::Phantom,
                pos,
                1,
                0.0,
                1.0,
                0.0,
            ));
        }
        tick(&mut state, TickInput::default(), SIM_DT);
        assert_eq!(state.phase, RunPhase::GameOver);
    }

    #[test]
    fn test_shockwave_pushes_and_damages() {
        use super::super::enemy::{Enemy, EnemyVariant};

        let mut state = GameState::new(7);
        state.enemies.clear();
        state.director.wave.total = 0;
        state.player.caps.grant(Capability::Shockwave);
        state.player.last_shockwave = -f32::INFINITY;
        state.player.last_fired = state.time + 100.0;

        let center = state.player.body.center();
        let id = state.next_entity_id();
        let mut enemy = Enemy::new(
            id,
            EnemyVariant::Phantom,
            center + Vec2::new(100.0, -100.0),
            1,
            0.0,
            1.0,
            0.0,
        );
        // Enough health to survive the pulse
        enemy.health = 100.0;
        enemy.max_health = 100.0;
        let start = enemy.body.center().distance(center);
        state.enemies.push(enemy);

        tick(&mut state, TickInput::default(), SIM_DT);
        let enemy = &state.enemies[0];
        assert_eq!(enemy.health, 100.0 - SHOCKWAVE_DAMAGE);
        assert!(enemy.body.center().distance(center) > start - 1.0);
    }

    #[test]
    fn test_well_pulls_enemies_inward() {
        use super::super::enemy::{Enemy, EnemyVariant};
        use super::super::player::GravityWell;

        let mut state = GameState::new(7);
        state.enemies.clear();
        state.director.wave.total = 0;
        state.player.last_fired = state.time + 100.0;

        let wpos = Vec2::new(450.0, 200.0);
        state.player.wells.push(GravityWell {
            pos: wpos,
            age: 0.0,
            last_damage: 0.0,
        });
        let id = state.next_entity_id();
        let enemy = Enemy::new(
            id,
            EnemyVariant::Phantom,
            wpos + Vec2::new(100.0, 0.0),
            1,
            0.0,
            1.0,
            0.0,
        );
        let start = enemy.body.center().distance(wpos);
        state.enemies.push(enemy);

        well_fields(&mut state, SIM_DT);
        assert!(state.enemies[0].body.center().distance(wpos) < start);
    }
}
