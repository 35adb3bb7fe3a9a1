//! Run state, events, and the HUD/reward boundary types
//!
//! All state that must be persisted for determinism lives here. Two runs
//! built from the same seed and fed the same inputs stay identical.

use std::error::Error;
use std::fmt;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::director::{self, Director};
use super::enemy::{Boss, Enemy};
use super::player::Player;
use super::progression::{self, AbilityId, BossRewardId, Tier};
use super::projectile::Projectile;
use crate::Tuning;
use crate::consts::*;

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunPhase {
    /// Active gameplay
    Playing,
    /// Paused by input; no gameplay mutation
    Paused,
    /// Paused waiting for a reward choice
    Choosing,
    /// Run ended
    GameOver,
}

/// One entry of a pending reward offer, as shown to the choice collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OfferItem {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// `None` for boss rewards (non-tiered pool)
    pub tier: Option<Tier>,
}

/// Gameplay events drained by the outer layer after each tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    WaveStarted { wave: u32, boss: bool },
    WaveCleared { wave: u32 },
    BossSpawned { wave: u32 },
    BossDefeated { points: u64 },
    /// Damage number for a hit that landed (amount already floored)
    Damage { amount: u32, crit: bool, pos: Vec2 },
    EnemyKilled { id: u32, pos: Vec2, points: u64 },
    PlayerDamaged { amount: u32 },
    PlayerDied,
    PlayerRevived,
    LevelUp { level: u32 },
    /// A reward offer is pending; the run stays in `Choosing` until answered
    OfferReady { items: Vec<OfferItem> },
    AbilityApplied { id: &'static str },
}

/// Per-tick HUD values for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub score: u64,
    pub wave: u32,
    pub level: u32,
    pub enemies_remaining: u32,
    /// Health fraction in 0..=1
    pub health: f32,
    /// Progress toward the next level threshold in 0..=1
    pub experience: f32,
    pub boss_health: Option<f32>,
}

/// Short-lived visual marker (explosions, chain arcs, area pulses)
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    pub pos: Vec2,
    pub kind: EffectKind,
    pub age: f32,
    pub ttl: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectKind {
    Explosion { radius: f32 },
    ChainArc { to: Vec2 },
    Nova,
    Shockwave { radius: f32 },
    ToxicCloud { radius: f32 },
    Revive,
}

impl Effect {
    pub fn new(pos: Vec2, kind: EffectKind) -> Self {
        Self {
            pos,
            kind,
            age: 0.0,
            ttl: 0.5,
        }
    }
}

/// A one-shot action scheduled to run at a later sim time.
///
/// Actions carry entity ids (never references); they re-validate liveness by
/// lookup when they fire, and a missing target is a silent no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct Deferred {
    pub due: f32,
    pub action: DeferredAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeferredAction {
    /// Next hop of a chain-lightning trigger
    ChainJump {
        from: u32,
        jumps_left: u32,
        visited: Vec<u32>,
    },
    /// Re-invoke the fire action (re-checks the player is alive)
    ExtraVolley,
    /// Staggered ring of a celebration/shockwave burst
    EffectBurst { pos: Vec2 },
}

/// The reward choice currently blocking the run, if any
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOffer {
    Abilities(Vec<AbilityId>),
    BossRewards(Vec<BossRewardId>),
}

/// Answering a reward offer when none is pending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceError {
    NoOffer,
}

impl fmt::Display for ChoiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoiceError::NoOffer => write!(f, "no reward offer is pending"),
        }
    }
}

impl Error for ChoiceError {}

/// Complete simulation state for one run
#[derive(Debug, Clone)]
pub struct GameState {
    pub seed: u64,
    pub rng: Pcg32,
    /// Sim time in seconds since run start
    pub time: f32,
    pub ticks: u64,
    pub phase: RunPhase,

    pub score: u64,
    pub level: u32,
    pub experience: u32,
    pub xp_threshold: u32,
    /// Run-owned balance block, mutated only by reward effects
    pub tuning: Tuning,

    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub boss: Option<Boss>,
    pub projectiles: Vec<Projectile>,
    pub effects: Vec<Effect>,

    pub director: Director,
    pub deferred: Vec<Deferred>,
    pub pending_offer: Option<PendingOffer>,
    pub events: Vec<GameEvent>,

    /// Monotonically increasing entity id source; ids are never reused
    next_id: u32,
}

impl GameState {
    pub fn new(seed: u64) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time: 0.0,
            ticks: 0,
            phase: RunPhase::Playing,
            score: 0,
            level: 1,
            experience: 0,
            xp_threshold: FIRST_LEVEL_XP,
            tuning: Tuning::default(),
            player: Player::new(),
            enemies: Vec::new(),
            boss: None,
            projectiles: Vec::new(),
            effects: Vec::new(),
            director: Director::new(),
            deferred: Vec::new(),
            pending_offer: None,
            events: Vec::new(),
            next_id: 0,
        };
        director::start_wave(&mut state, 1);
        state
    }

    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn enemy_by_id(&self, id: u32) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id && e.body.active)
    }

    pub fn enemy_by_id_mut(&mut self, id: u32) -> Option<&mut Enemy> {
        self.enemies
            .iter_mut()
            .find(|e| e.id == id && e.body.active)
    }

    /// Schedule a one-shot action at `delay` seconds from now
    pub fn defer(&mut self, delay: f32, action: DeferredAction) {
        self.deferred.push(Deferred {
            due: self.time + delay,
            action,
        });
    }

    pub fn push_effect(&mut self, pos: Vec2, kind: EffectKind) {
        self.effects.push(Effect::new(pos, kind));
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot {
            score: self.score,
            wave: self.director.wave.number,
            level: self.level,
            enemies_remaining: self.enemies.iter().filter(|e| e.body.active).count() as u32,
            health: (self.player.health / self.player.max_health).clamp(0.0, 1.0),
            experience: (self.experience as f32 / self.xp_threshold as f32).clamp(0.0, 1.0),
            boss_health: self
                .boss
                .as_ref()
                .map(|b| (b.health / b.max_health).clamp(0.0, 1.0)),
        }
    }

    /// Answer the pending reward offer with the chosen id.
    ///
    /// An id not present in the offer is logged and treated exactly like a
    /// successful choice for control flow, so the run can never stay stuck
    /// in `Choosing`.
    pub fn choose(&mut self, id: &str) -> Result<(), ChoiceError> {
        let offer = self.pending_offer.take().ok_or(ChoiceError::NoOffer)?;
        match offer {
            PendingOffer::Abilities(ids) => {
                match ids.iter().copied().find(|a| a.key() == id) {
                    Some(ability) => {
                        progression::apply_ability(self, ability);
                        self.events.push(GameEvent::AbilityApplied { id: ability.key() });
                    }
                    None => log::warn!("unknown ability choice {id:?}; dismissing offer"),
                }
                self.phase = RunPhase::Playing;
            }
            PendingOffer::BossRewards(ids) => {
                match ids.iter().copied().find(|r| r.key() == id) {
                    Some(reward) => {
                        progression::apply_boss_reward(self, reward);
                        self.events.push(GameEvent::AbilityApplied { id: reward.key() });
                    }
                    None => log::warn!("unknown boss reward choice {id:?}; dismissing offer"),
                }
                self.phase = RunPhase::Playing;
                // Next wave starts after the post-reward delay
                self.director.state = director::DirectorState::Clearing {
                    until: self.time + WAVE_CLEAR_DELAY,
                };
            }
        }
        Ok(())
    }

    /// Items of the pending offer in presentation form, if one is pending
    pub fn offer_items(&self) -> Option<Vec<OfferItem>> {
        self.pending_offer.as_ref().map(|offer| match offer {
            PendingOffer::Abilities(ids) => ids.iter().map(|a| a.item()).collect(),
            PendingOffer::BossRewards(ids) => ids.iter().map(|r| r.item()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_starts_wave_one() {
        let mut state = GameState::new(7);
        assert_eq!(state.phase, RunPhase::Playing);
        assert_eq!(state.director.wave.number, 1);
        let events = state.drain_events();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::WaveStarted { wave: 1, boss: false }))
        );
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_entity_ids_never_reused() {
        let mut state = GameState::new(0);
        let a = state.next_entity_id();
        let b = state.next_entity_id();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_choose_without_offer_is_an_error() {
        let mut state = GameState::new(0);
        assert_eq!(state.choose("damageUp"), Err(ChoiceError::NoOffer));
    }

    #[test]
    fn test_unknown_choice_dismisses_offer_and_resumes() {
        let mut state = GameState::new(0);
        state.phase = RunPhase::Choosing;
        state.pending_offer = Some(PendingOffer::Abilities(vec![
            AbilityId::DamageUp,
            AbilityId::FireRateUp,
        ]));
        state.choose("not-a-real-id").unwrap();
        assert_eq!(state.phase, RunPhase::Playing);
        assert!(state.pending_offer.is_none());
    }

    #[test]
    fn test_hud_fractions_clamped() {
        let mut state = GameState::new(0);
        state.player.health = -5.0;
        let hud = state.hud();
        assert_eq!(hud.health, 0.0);
        assert!(hud.boss_health.is_none());
    }
}
