//! Seeded auto-aim shooter standing in for player input.

use std::time::Duration;

use rail_shooter_core::{Command, Event};
use rail_shooter_world::{query::EnemyView, EnemyPhase};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Tuning of the scripted marksman.
#[derive(Clone, Copy, Debug)]
pub(crate) struct MarksmanConfig {
    pub(crate) shot_interval: Duration,
    pub(crate) accuracy: f64,
    pub(crate) damage: u32,
    pub(crate) seed: u64,
}

/// Fires at a random visible enemy on a fixed cadence.
#[derive(Debug)]
pub(crate) struct Marksman {
    shot_interval: Duration,
    accuracy: f64,
    damage: u32,
    accumulator: Duration,
    rng: ChaCha8Rng,
    shots: u64,
    hits: u64,
}

impl Marksman {
    pub(crate) fn new(config: MarksmanConfig) -> Self {
        Self {
            shot_interval: config.shot_interval,
            accuracy: config.accuracy.clamp(0.0, 1.0),
            damage: config.damage.max(1),
            accumulator: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            shots: 0,
            hits: 0,
        }
    }

    pub(crate) fn shots(&self) -> u64 {
        self.shots
    }

    pub(crate) fn hits(&self) -> u64 {
        self.hits
    }

    /// Accumulates elapsed time and shoots once per elapsed interval.
    ///
    /// Enemies still approaching their anchor are not targeted. Time only
    /// accumulates while something is in sight.
    pub(crate) fn handle(&mut self, events: &[Event], enemies: &EnemyView, out: &mut Vec<Command>) {
        let elapsed = events
            .iter()
            .filter_map(|event| match event {
                Event::TimeAdvanced { dt } => Some(*dt),
                _ => None,
            })
            .fold(Duration::ZERO, Duration::saturating_add);
        if elapsed.is_zero() || self.shot_interval.is_zero() {
            return;
        }

        let targets: Vec<_> = enemies
            .iter()
            .filter(|enemy| enemy.phase != EnemyPhase::Approaching)
            .map(|enemy| enemy.id)
            .collect();
        if targets.is_empty() {
            self.accumulator = Duration::ZERO;
            return;
        }

        self.accumulator = self.accumulator.saturating_add(elapsed);
        while self.accumulator >= self.shot_interval {
            self.accumulator -= self.shot_interval;
            self.shots += 1;

            let target = targets[self.rng.gen_range(0..targets.len())];
            if self.rng.gen_bool(self.accuracy) {
                self.hits += 1;
                log::debug!("hit {target}");
                out.push(Command::DamageEnemy {
                    enemy: target,
                    amount: self.damage,
                });
            } else {
                log::debug!("missed {target}");
            }
        }
    }
}
