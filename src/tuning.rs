//! Run-owned game balance
//!
//! One `Tuning` value is created per run and lives on the game state. Reward
//! effects are the only writers; everything else reads. Keeping it on the
//! state (instead of a process-wide block) means concurrent runs in tests
//! never interfere.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Numeric balance block for a single run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    /// Player bullet base damage (additive upgrades)
    pub bullet_damage: f32,
    /// Player bullet speed
    pub bullet_speed: f32,
    /// Player bullet size scale (multiplicative upgrades)
    pub bullet_size: f32,
    /// Score multiplier applied per kill on top of wave scaling
    pub score_multiplier: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            bullet_damage: BULLET_DAMAGE,
            bullet_speed: BULLET_SPEED,
            bullet_size: 1.0,
            score_multiplier: SCORE_MULTIPLIER,
        }
    }
}

impl Tuning {
    /// Parse a tuning override from JSON (demo/testing hook)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Player bullet dimensions after size upgrades
    pub fn bullet_size_px(&self) -> (f32, f32) {
        (BULLET_WIDTH * self.bullet_size, BULLET_HEIGHT * self.bullet_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_base_constants() {
        let t = Tuning::default();
        assert_eq!(t.bullet_damage, BULLET_DAMAGE);
        assert_eq!(t.bullet_size_px(), (BULLET_WIDTH, BULLET_HEIGHT));
    }

    #[test]
    fn test_json_round_trip() {
        let mut t = Tuning::default();
        t.bullet_damage += 20.0;
        t.bullet_size *= 1.4;
        let parsed = Tuning::from_json(&t.to_json()).unwrap();
        assert_eq!(parsed, t);
    }

    #[test]
    fn test_runs_do_not_share_balance() {
        let mut a = Tuning::default();
        let b = Tuning::default();
        a.bullet_damage += 30.0;
        assert_eq!(b.bullet_damage, BULLET_DAMAGE);
    }
}
