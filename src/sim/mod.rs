//! Deterministic combat simulation
//!
//! Everything in this module is pure state + math: fixed timestep inputs and
//! a seeded RNG in, state mutation and drained events out. No rendering or
//! platform code. The orchestration order per tick lives in [`tick`].

pub mod body;
pub mod collision;
pub mod director;
pub mod enemy;
pub mod player;
pub mod progression;
pub mod projectile;
pub mod state;
pub mod tick;

pub use body::Body;
pub use director::{Director, DirectorState, Wave};
pub use enemy::{Boss, BossPattern, Enemy, EnemyVariant, ShotSpec};
pub use player::{Capability, CapabilitySet, Player};
pub use progression::{AbilityId, BossRewardId, Tier};
pub use projectile::{Modifier, Projectile, Side};
pub use state::{
    ChoiceError, EffectKind, GameEvent, GameState, HudSnapshot, OfferItem, RunPhase,
};
pub use tick::{TickInput, tick};
