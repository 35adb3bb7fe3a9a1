//! Headless autopilot runner.
//!
//! Drives the simulation at the fixed timestep with a simple chase policy
//! and auto-answered reward offers, then prints a JSON run summary. Useful
//! for balance sweeps and soak-testing determinism:
//!
//! ```text
//! veggie-blitz [seed] [max-ticks]
//! ```

use glam::Vec2;
use serde::Serialize;

use veggie_blitz::consts::SIM_DT;
use veggie_blitz::sim::{GameEvent, GameState, RunPhase, TickInput, tick};

#[derive(Serialize)]
struct RunSummary {
    seed: u64,
    ticks: u64,
    survived_secs: f32,
    score: u64,
    wave: u32,
    level: u32,
    game_over: bool,
}

/// Steer under the nearest attacker so the volley connects
fn autopilot(state: &GameState) -> Vec2 {
    let player_x = state.player.body.center().x;
    let target_x = state
        .enemies
        .iter()
        .filter(|e| e.body.active)
        .map(|e| e.body.center())
        .min_by(|a, b| a.y.total_cmp(&b.y))
        .map(|c| c.x)
        .or_else(|| state.boss.as_ref().map(|b| b.body.center().x));

    match target_x {
        Some(x) if (x - player_x).abs() > 4.0 => Vec2::new((x - player_x).signum(), 0.0),
        _ => Vec2::ZERO,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args
        .next()
        .and_then(|a| a.parse().ok())
        .unwrap_or(0xB1_1721);
    let max_ticks: u64 = args.next().and_then(|a| a.parse().ok()).unwrap_or(36_000);

    let mut state = GameState::new(seed);
    log::info!("run start, seed {seed}, max {max_ticks} ticks");

    while state.ticks < max_ticks && state.phase != RunPhase::GameOver {
        // Offers block the clock until answered
        if state.phase == RunPhase::Choosing {
            let Some(items) = state.offer_items() else {
                log::warn!("choosing phase with no pending offer");
                break;
            };
            let pick = items[0].id;
            log::info!("choosing '{pick}' from {} offers", items.len());
            if let Err(err) = state.choose(pick) {
                log::warn!("choice failed: {err}");
                break;
            }
            continue;
        }

        let input = TickInput {
            move_dir: autopilot(&state),
            pause: false,
        };
        tick(&mut state, input, SIM_DT);

        for event in state.drain_events() {
            match event {
                GameEvent::WaveStarted { wave, boss } => {
                    log::info!("wave {wave} started (boss: {boss})");
                }
                GameEvent::BossDefeated { points } => {
                    log::info!("boss defeated, +{points} points");
                }
                GameEvent::PlayerDied => log::info!("player died"),
                other => log::debug!("{other:?}"),
            }
        }

        if state.ticks % 60 == 0 {
            let hud = state.hud();
            log::debug!(
                "t={:.0}s score={} wave={} level={} hp={:.0}%",
                state.time,
                hud.score,
                hud.wave,
                hud.level,
                hud.health * 100.0
            );
        }
    }

    let summary = RunSummary {
        seed,
        ticks: state.ticks,
        survived_secs: state.time,
        score: state.score,
        wave: state.director.wave.number,
        level: state.level,
        game_over: state.phase == RunPhase::GameOver,
    };
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(err) => log::error!("summary serialization failed: {err}"),
    }
}
