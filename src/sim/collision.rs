//! Collision and damage resolution
//!
//! All damage funnels through [`damage_enemy`] / [`damage_boss`], which own
//! the health clamp, the damage-number events, and kill rewards. Side
//! effects on a hit run in a fixed order: life-steal, explosive pulse,
//! chain trigger, then pierce/destroy.

use glam::Vec2;

use super::enemy::Boss;
use super::player::{self, Capability};
use super::progression;
use super::projectile::{Modifier, Side};
use super::state::{DeferredAction, EffectKind, GameEvent, GameState};
use crate::consts::*;
use rand::Rng;

/// Resolve all pairwise hits for this tick, then sweep destroyed entities
pub fn resolve(state: &mut GameState) {
    player_projectiles(state);
    enemy_projectiles(state);
    player_contact(state);

    state.projectiles.retain(|p| p.body.active);
    state.enemies.retain(|e| e.body.active);
}

fn roll_damage(state: &mut GameState, pi: usize) -> (f32, bool) {
    let base = state.projectiles[pi].damage;
    if let Some((chance, multiplier)) = state.projectiles[pi].crit_params() {
        if state.rng.random::<f32>() < chance {
            return ((base * multiplier).floor(), true);
        }
    }
    (base, false)
}

fn boss_hittable(boss: &Boss) -> bool {
    boss.body.active && !boss.entering
}

fn player_projectiles(state: &mut GameState) {
    let now = state.time;
    for pi in 0..state.projectiles.len() {
        let (body, live) = {
            let p = &state.projectiles[pi];
            (p.body, p.body.active && p.side == Side::Player)
        };
        if !live {
            continue;
        }

        if state.projectiles[pi].is_beam() {
            beam_hits(state, pi, now);
            continue;
        }

        // Boss first if present, else the enemy list
        let boss_hit = state
            .boss
            .as_ref()
            .is_some_and(|b| boss_hittable(b) && b.body.overlaps(&body));
        if boss_hit {
            let (amount, crit) = roll_damage(state, pi);
            if consume_gravity_well(state, pi) {
                let pos = state.boss.as_ref().map(|b| b.body.center()).unwrap_or_default();
                spawn_well(state, pos);
            } else {
                life_steal(state, amount);
                damage_boss(state, amount, crit);
                if let Some(mega) = state.projectiles[pi].explosive() {
                    explode(state, body.center(), mega);
                }
            }
            finish_hit(state, pi);
            continue;
        }

        // A piercing bullet strikes every enemy it overlaps this tick,
        // stopping only when its pierce budget runs out.
        let targets: Vec<(u32, Vec2)> = state
            .enemies
            .iter()
            .filter(|e| e.body.active && e.body.overlaps(&body))
            .map(|e| (e.id, e.body.center()))
            .collect();
        for (eid, epos) in targets {
            if !state.projectiles[pi].body.active {
                break;
            }
            // An earlier hit's explosion may have already killed this one
            if state.enemy_by_id(eid).is_none() {
                continue;
            }

            let (amount, crit) = roll_damage(state, pi);
            if consume_gravity_well(state, pi) {
                spawn_well(state, epos);
            } else {
                if state.projectiles[pi].has_freezing() {
                    if let Some(e) = state.enemy_by_id_mut(eid) {
                        e.slow_until = now + FREEZE_DURATION;
                    }
                }
                life_steal(state, amount);
                damage_enemy(state, eid, amount, crit);
                if let Some(mega) = state.projectiles[pi].explosive() {
                    explode(state, epos, mega);
                }
                if state.player.caps.has(Capability::ChainLightning) {
                    chain_from(state, epos, state.player.chain_jumps, vec![eid]);
                }
            }
            finish_hit(state, pi);
        }
    }
}

/// Beams damage every overlapping target on a fixed re-trigger interval
/// instead of on discrete collision; they are never destroyed by hits.
fn beam_hits(state: &mut GameState, pi: usize, now: f32) {
    let due = {
        let p = &mut state.projectiles[pi];
        let mut due = false;
        for m in &mut p.mods {
            if let Modifier::Beam { last_hit, .. } = m {
                if now - *last_hit >= BEAM_HIT_INTERVAL {
                    *last_hit = now;
                    due = true;
                }
            }
        }
        due
    };
    if !due {
        return;
    }
    let body = state.projectiles[pi].body;
    if state
        .boss
        .as_ref()
        .is_some_and(|b| boss_hittable(b) && b.body.overlaps(&body))
    {
        damage_boss(state, BEAM_DAMAGE, false);
    }
    let hit_ids: Vec<u32> = state
        .enemies
        .iter()
        .filter(|e| e.body.active && e.body.overlaps(&body))
        .map(|e| e.id)
        .collect();
    for id in hit_ids {
        damage_enemy(state, id, BEAM_DAMAGE, false);
    }
}

/// Remove the well modifier on its first hit. Returns true when this hit
/// should spawn a well instead of dealing direct damage.
fn consume_gravity_well(state: &mut GameState, pi: usize) -> bool {
    let mods = &mut state.projectiles[pi].mods;
    if let Some(idx) = mods.iter().position(|m| matches!(m, Modifier::GravityWell)) {
        mods.swap_remove(idx);
        true
    } else {
        false
    }
}

fn spawn_well(state: &mut GameState, pos: Vec2) {
    state.player.wells.push(player::GravityWell {
        pos,
        age: 0.0,
        last_damage: 0.0,
    });
}

fn life_steal(state: &mut GameState, damage: f32) {
    if state.player.caps.has(Capability::LifeSteal) {
        state.player.heal((damage * LIFESTEAL_FRACTION).floor());
    }
}

fn finish_hit(state: &mut GameState, pi: usize) {
    if state.projectiles[pi].register_hit() {
        state.projectiles[pi].body.active = false;
    }
}

fn enemy_projectiles(state: &mut GameState) {
    for pi in 0..state.projectiles.len() {
        let (body, damage, live) = {
            let p = &state.projectiles[pi];
            (p.body, p.damage, p.body.active && p.side == Side::Enemy)
        };
        if !live || !body.overlaps(&state.player.body) {
            continue;
        }
        player::damage_player(state, damage);
        finish_hit(state, pi);
    }
}

/// Direct player/enemy body overlap: contact damage, enemy destroyed
/// without score or experience.
fn player_contact(state: &mut GameState) {
    let player_body = state.player.body;
    let mut contact = 0;
    for e in state.enemies.iter_mut() {
        if e.body.active && e.body.overlaps(&player_body) {
            e.body.active = false;
            contact += 1;
        }
    }
    for _ in 0..contact {
        player::damage_player(state, ENEMY_CONTACT_DAMAGE);
    }
}

/// Apply damage to one enemy; handles the health clamp, the damage-number
/// event, and the kill reward exactly once.
pub fn damage_enemy(state: &mut GameState, id: u32, amount: f32, crit: bool) {
    let Some(e) = state.enemy_by_id_mut(id) else {
        return;
    };
    e.health = (e.health - amount).max(0.0);
    let pos = e.body.center();
    let dead = e.health <= 0.0;
    if dead {
        e.body.active = false;
    }
    state.events.push(GameEvent::Damage {
        amount: amount as u32,
        crit,
        pos,
    });
    if dead {
        let points = (ENEMY_POINTS as f32
            * state.director.wave.number.max(1) as f32
            * state.tuning.score_multiplier)
            .floor() as u64;
        state.score += points;
        state.events.push(GameEvent::EnemyKilled { id, pos, points });
        state.push_effect(pos, EffectKind::Explosion { radius: ENEMY_SIZE / 2.0 });
        progression::award_xp(state, KILL_XP);
    }
}

/// Apply damage to the boss. Defeat awards score and experience, schedules
/// the celebration bursts, and opens the boss reward offer.
pub fn damage_boss(state: &mut GameState, amount: f32, crit: bool) {
    let Some(b) = state.boss.as_mut() else {
        return;
    };
    if b.entering {
        return;
    }
    b.health = (b.health - amount).max(0.0);
    let pos = b.body.center();
    let dead = b.health <= 0.0;
    let wave = b.wave;
    state.events.push(GameEvent::Damage {
        amount: amount as u32,
        crit,
        pos,
    });
    if !dead {
        return;
    }

    state.boss = None;
    let points = (BOSS_POINTS as f32 * wave as f32 * state.tuning.score_multiplier).floor() as u64;
    state.score += points;
    state.events.push(GameEvent::BossDefeated { points });
    log::info!("boss defeated on wave {wave} for {points} points");
    for i in 0..5 {
        state.defer(0.05 * i as f32, DeferredAction::EffectBurst { pos });
    }
    progression::award_xp(state, BOSS_XP);
    // The boss reward offer supersedes any level-up offer from the XP award
    progression::offer_boss_rewards(state);
}

/// Area-damage pulse. Mega doubles both radius and damage.
pub fn explode(state: &mut GameState, center: Vec2, mega: bool) {
    let (mut radius, damage) = if mega {
        (EXPLOSION_RADIUS * 2.0, EXPLOSION_DAMAGE * 2.0)
    } else {
        (EXPLOSION_RADIUS, EXPLOSION_DAMAGE)
    };
    radius *= state.player.explosion_boost;
    state.push_effect(center, EffectKind::Explosion { radius });
    let hit_ids: Vec<u32> = state
        .enemies
        .iter()
        .filter(|e| e.body.active && e.body.center().distance(center) < radius)
        .map(|e| e.id)
        .collect();
    for id in hit_ids {
        damage_enemy(state, id, damage, false);
    }
}

/// Deferred chain hop: re-validate the source enemy by id, then jump from
/// its current position. A source that died in the meantime ends the chain.
pub fn perform_chain_jump(state: &mut GameState, from: u32, jumps_left: u32, visited: Vec<u32>) {
    let Some(src) = state.enemy_by_id(from) else {
        return;
    };
    let src_center = src.body.center();
    chain_from(state, src_center, jumps_left, visited);
}

/// One hop of a chain-lightning trigger: damage the single nearest active,
/// unvisited enemy within range of `src_center`, then schedule the next hop.
/// Taking a position rather than an id lets the first hop fire from an enemy
/// the triggering bullet just killed.
pub fn chain_from(state: &mut GameState, src_center: Vec2, jumps_left: u32, mut visited: Vec<u32>) {
    if jumps_left == 0 {
        return;
    }

    let target = state
        .enemies
        .iter()
        .filter(|e| e.body.active && !visited.contains(&e.id))
        .map(|e| (e.id, e.body.center()))
        .filter(|(_, c)| c.distance(src_center) < CHAIN_RADIUS)
        .min_by(|a, b| {
            a.1.distance_squared(src_center)
                .total_cmp(&b.1.distance_squared(src_center))
        });
    let Some((tid, tpos)) = target else {
        return;
    };

    visited.push(tid);
    state.push_effect(src_center, EffectKind::ChainArc { to: tpos });
    damage_enemy(state, tid, CHAIN_DAMAGE, false);
    state.defer(
        CHAIN_JUMP_DELAY,
        DeferredAction::ChainJump {
            from: tid,
            jumps_left: jumps_left - 1,
            visited,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::body::Body;
    use super::super::enemy::{Enemy, EnemyVariant};
    use super::super::projectile::Projectile;
    use super::super::tick::process_deferred;

    fn add_enemy(state: &mut GameState, pos: Vec2) -> u32 {
        let id = state.next_entity_id();
        state
            .enemies
            .push(Enemy::new(id, EnemyVariant::Raider, pos, 1, 0.0, 1.0, 0.0));
        id
    }

    fn player_bullet_at(state: &mut GameState, pos: Vec2) -> usize {
        let id = state.next_entity_id();
        let body = Body::new(pos, Vec2::new(BULLET_WIDTH, BULLET_HEIGHT));
        state
            .projectiles
            .push(Projectile::new(id, body, Side::Player, BULLET_DAMAGE));
        state.projectiles.len() - 1
    }

    #[test]
    fn test_base_bullet_kills_base_enemy_in_one_pass() {
        let mut state = GameState::new(11);
        let id = add_enemy(&mut state, Vec2::new(200.0, 200.0));
        player_bullet_at(&mut state, Vec2::new(210.0, 210.0));
        let xp_before = state.experience;

        resolve(&mut state);

        assert!(state.enemy_by_id(id).is_none());
        assert!(state.projectiles.is_empty());
        let expected = (ENEMY_POINTS as f32 * 1.0 * SCORE_MULTIPLIER).floor() as u64;
        assert_eq!(state.score, expected);
        assert_eq!(state.experience, xp_before + KILL_XP);
        let events = state.drain_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::EnemyKilled { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_health_clamped_at_zero() {
        let mut state = GameState::new(11);
        let id = add_enemy(&mut state, Vec2::new(200.0, 200.0));
        damage_enemy(&mut state, id, 10_000.0, false);
        // Entity is destroyed, never negative
        assert!(state.enemies.iter().all(|e| e.health >= 0.0));
        assert!(state.enemy_by_id(id).is_none());
    }

    #[test]
    fn test_crit_damage_is_floored() {
        let mut state = GameState::new(11);
        add_enemy(&mut state, Vec2::new(200.0, 200.0));
        let pi = player_bullet_at(&mut state, Vec2::new(210.0, 210.0));
        state.projectiles[pi].mods.push(Modifier::Critical {
            chance: 1.0,
            multiplier: CRIT_MULTIPLIER,
        });

        resolve(&mut state);

        let events = state.drain_events();
        let hit = events
            .iter()
            .find_map(|e| match e {
                GameEvent::Damage { amount, crit: true, .. } => Some(*amount),
                _ => None,
            })
            .expect("no critical damage event");
        assert_eq!(hit, 62);
    }

    #[test]
    fn test_piercing_survives_and_non_piercing_does_not() {
        let mut state = GameState::new(11);
        add_enemy(&mut state, Vec2::new(200.0, 200.0));
        let pi = player_bullet_at(&mut state, Vec2::new(210.0, 210.0));
        state.projectiles[pi].mods.push(Modifier::Piercing { remaining: 3 });

        resolve(&mut state);
        assert_eq!(state.projectiles.len(), 1, "piercing bullet was destroyed");

        add_enemy(&mut state, Vec2::new(200.0, 200.0));
        resolve(&mut state);
        add_enemy(&mut state, Vec2::new(200.0, 200.0));
        resolve(&mut state);
        assert!(state.projectiles.is_empty(), "bullet outlived its hit counter");
    }

    #[test]
    fn test_mega_explosion_doubles_radius_and_damage() {
        // Baseline: enemy 100 px out is beyond the 80 px radius
        let mut state = GameState::new(11);
        let center = Vec2::new(400.0, 300.0);
        let far = add_enemy(&mut state, Vec2::new(400.0 + 100.0 - ENEMY_SIZE / 2.0, 300.0 - ENEMY_SIZE / 2.0));
        explode(&mut state, center, false);
        assert_eq!(state.enemy_by_id(far).unwrap().health, ENEMY_BASE_HEALTH);

        // Mega: radius 160 reaches it, damage 60 kills the 25-health enemy
        explode(&mut state, center, true);
        assert!(state.enemy_by_id(far).is_none());
        let events = state.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::Damage { amount: 60, .. }
        )));
    }

    #[test]
    fn test_chain_damages_at_most_k_distinct_enemies() {
        let mut state = GameState::new(11);
        let k = 3;
        // A line of enemies 100 px apart, all within chain radius of the next
        let origin = add_enemy(&mut state, Vec2::new(100.0, 100.0));
        for i in 1..6 {
            add_enemy(&mut state, Vec2::new(100.0 + 100.0 * i as f32, 100.0));
        }

        perform_chain_jump(&mut state, origin, k, vec![origin]);
        for _ in 0..10 {
            state.time += CHAIN_JUMP_DELAY;
            process_deferred(&mut state);
        }

        let events = state.drain_events();
        let chain_hits = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Damage { amount: 20, .. }))
            .count();
        assert_eq!(chain_hits, k as usize);
    }

    #[test]
    fn test_chain_fires_when_the_bullet_kills_its_target() {
        let mut state = GameState::new(11);
        state.player.caps.grant(Capability::ChainLightning);
        let struck = add_enemy(&mut state, Vec2::new(200.0, 200.0));
        let neighbor = add_enemy(&mut state, Vec2::new(300.0, 200.0));
        state.enemy_by_id_mut(neighbor).unwrap().health = 100.0;
        state.enemy_by_id_mut(neighbor).unwrap().max_health = 100.0;
        player_bullet_at(&mut state, Vec2::new(210.0, 210.0));

        resolve(&mut state);

        // The 25-damage bullet kills the 25-health target; the chain still
        // jumps from where it died.
        assert!(state.enemy_by_id(struck).is_none());
        assert_eq!(
            state.enemy_by_id(neighbor).unwrap().health,
            100.0 - CHAIN_DAMAGE
        );
    }

    #[test]
    fn test_piercing_bullet_hits_every_overlapping_enemy_in_one_pass() {
        let mut state = GameState::new(11);
        for _ in 0..3 {
            add_enemy(&mut state, Vec2::new(200.0, 200.0));
        }
        let pi = player_bullet_at(&mut state, Vec2::new(210.0, 210.0));
        state.projectiles[pi].mods.push(Modifier::Piercing { remaining: 3 });

        resolve(&mut state);

        assert!(state.enemies.is_empty());
        assert!(state.projectiles.is_empty());
        let events = state.drain_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::EnemyKilled { .. }))
                .count(),
            3
        );
    }

    #[test]
    fn test_plain_bullet_stops_at_the_first_overlapping_enemy() {
        let mut state = GameState::new(11);
        add_enemy(&mut state, Vec2::new(200.0, 200.0));
        add_enemy(&mut state, Vec2::new(200.0, 200.0));
        player_bullet_at(&mut state, Vec2::new(210.0, 210.0));

        resolve(&mut state);

        assert_eq!(state.enemies.len(), 1);
    }

    #[test]
    fn test_chain_missing_source_is_silent_noop() {
        let mut state = GameState::new(11);
        perform_chain_jump(&mut state, 9999, 3, vec![9999]);
        assert!(state.drain_events().is_empty());
        assert!(state.deferred.is_empty());
    }

    #[test]
    fn test_enemy_bullet_damages_player() {
        let mut state = GameState::new(11);
        let id = state.next_entity_id();
        let body = Body::new(
            state.player.body.center(),
            Vec2::new(ENEMY_BULLET_WIDTH, ENEMY_BULLET_HEIGHT),
        );
        state
            .projectiles
            .push(Projectile::new(id, body, Side::Enemy, ENEMY_BULLET_DAMAGE));

        resolve(&mut state);

        assert_eq!(state.player.health, PLAYER_MAX_HEALTH - ENEMY_BULLET_DAMAGE);
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_contact_kills_enemy_without_reward() {
        let mut state = GameState::new(11);
        let player_pos = state.player.body.pos;
        add_enemy(&mut state, player_pos);
        resolve(&mut state);
        assert!(state.enemies.is_empty());
        assert_eq!(state.score, 0);
        assert_eq!(state.player.health, PLAYER_MAX_HEALTH - ENEMY_CONTACT_DAMAGE);
    }

    #[test]
    fn test_life_steal_heals_on_hit() {
        let mut state = GameState::new(11);
        state.player.caps.grant(Capability::LifeSteal);
        state.player.health = 50.0;
        let id = add_enemy(&mut state, Vec2::new(200.0, 200.0));
        // Beef the enemy up so the hit does not also kill it
        state.enemy_by_id_mut(id).unwrap().health = 1000.0;
        player_bullet_at(&mut state, Vec2::new(210.0, 210.0));

        resolve(&mut state);
        assert_eq!(state.player.health, 50.0 + (BULLET_DAMAGE * LIFESTEAL_FRACTION).floor());
    }

    #[test]
    fn test_gravity_well_hit_spawns_field_instead_of_damage() {
        let mut state = GameState::new(11);
        let id = add_enemy(&mut state, Vec2::new(200.0, 200.0));
        let pi = player_bullet_at(&mut state, Vec2::new(210.0, 210.0));
        state.projectiles[pi].mods.push(Modifier::GravityWell);

        resolve(&mut state);

        assert_eq!(state.player.wells.len(), 1);
        assert_eq!(state.enemy_by_id(id).unwrap().health, ENEMY_BASE_HEALTH);
    }

    #[test]
    fn test_boss_defeat_opens_reward_offer() {
        let mut state = GameState::new(11);
        super::super::director::spawn_boss(&mut state);
        state.boss.as_mut().unwrap().entering = false;
        state.boss.as_mut().unwrap().health = 1.0;

        damage_boss(&mut state, 5.0, false);

        assert!(state.boss.is_none());
        assert!(state.pending_offer.is_some());
        assert_eq!(state.phase, super::super::state::RunPhase::Choosing);
        let items = state.offer_items().unwrap();
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_freezing_hit_slows_target() {
        let mut state = GameState::new(11);
        let id = add_enemy(&mut state, Vec2::new(200.0, 200.0));
        state.enemy_by_id_mut(id).unwrap().health = 1000.0;
        let pi = player_bullet_at(&mut state, Vec2::new(210.0, 210.0));
        state.projectiles[pi].mods.push(Modifier::Freezing);

        resolve(&mut state);
        assert!(state.enemy_by_id(id).unwrap().slow_until > state.time);
    }
}
