#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Encounter spawners that run authored enemy waves.
//!
//! The system owns every spawner of a level. It consumes `StartEncounter` and
//! `ForceStopEncounter` commands together with the world's event stream, and
//! answers with `SpawnEnemy`/`DestroyEnemy` commands plus the encounter
//! lifecycle events (`EncounterStarted`, `WaveStarted`, `WaveCleared`,
//! `EncounterCompleted`) that other systems subscribe to.

mod spawner;

use std::collections::BTreeMap;

use glam::Vec3;
use rail_shooter_core::{
    ArchetypeTableView, Command, Event, SpawnerConfig, SpawnerId, StartRejection,
};

pub use spawner::EncounterSpawner;

/// Configuration parameters required to construct the encounter system.
#[derive(Clone, Debug, Default)]
pub struct Config {
    spawners: Vec<SpawnerConfig>,
}

impl Config {
    /// Creates a configuration from the level's authored spawners.
    #[must_use]
    pub fn new(spawners: Vec<SpawnerConfig>) -> Self {
        Self { spawners }
    }
}

/// Pure system hosting every encounter spawner of a level.
#[derive(Debug, Default)]
pub struct Encounters {
    spawners: BTreeMap<SpawnerId, EncounterSpawner>,
}

impl Encounters {
    /// Creates the system, keeping the first spawner configured for each id.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut spawners = BTreeMap::new();
        for spawner in config.spawners {
            let id = spawner.id;
            if spawners.contains_key(&id) {
                log::warn!("{id} is configured more than once; keeping the first definition");
                continue;
            }
            let _ = spawners.insert(id, EncounterSpawner::new(spawner));
        }

        Self { spawners }
    }

    /// Looks up a spawner by identifier.
    #[must_use]
    pub fn spawner(&self, id: SpawnerId) -> Option<&EncounterSpawner> {
        self.spawners.get(&id)
    }

    /// Looks up a spawner by identifier for mutation.
    pub fn spawner_mut(&mut self, id: SpawnerId) -> Option<&mut EncounterSpawner> {
        self.spawners.get_mut(&id)
    }

    /// Iterator over every spawner in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &EncounterSpawner> {
        self.spawners.values()
    }

    /// Identifiers of the spawners currently running a sequence.
    pub fn running(&self) -> impl Iterator<Item = SpawnerId> + '_ {
        self.spawners
            .values()
            .filter(|spawner| spawner.is_running())
            .map(EncounterSpawner::id)
    }

    /// Starts every spawner flagged to start when the simulation boots.
    pub fn awaken(&mut self, out_events: &mut Vec<Event>) {
        for spawner in self.spawners.values_mut() {
            if spawner.start_on_awake() {
                let _ = spawner.start_sequence(out_events);
            }
        }
    }

    /// Releases every spawner's subscriptions without raising completion.
    ///
    /// Returns the total number of enemy subscriptions released.
    pub fn shutdown(&mut self) -> usize {
        self.spawners
            .values_mut()
            .map(EncounterSpawner::release_subscriptions)
            .sum()
    }

    /// Consumes encounter commands and world events, emitting spawns and lifecycle events.
    ///
    /// Control commands are applied before the events so that a start issued in
    /// the same step is visible to the tick it accompanies.
    pub fn handle(
        &mut self,
        commands: &[Command],
        events: &[Event],
        viewpoint: Vec3,
        archetypes: ArchetypeTableView<'_>,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        for command in commands {
            match command {
                Command::StartEncounter { spawner } => match self.spawners.get_mut(spawner) {
                    Some(target) => {
                        let _ = target.start_sequence(out_events);
                    }
                    None => {
                        log::error!("cannot start {spawner}: no such spawner");
                        out_events.push(Event::EncounterStartIgnored {
                            spawner: *spawner,
                            reason: StartRejection::UnknownSpawner,
                        });
                    }
                },
                Command::ForceStopEncounter {
                    spawner,
                    run,
                    destroy_remaining,
                } => match self.spawners.get_mut(spawner) {
                    Some(target) if run.is_some() && target.current_run() != *run => {
                        log::debug!(
                            "{spawner} ignored force stop of run {run:?}: no longer in progress"
                        );
                    }
                    Some(target) => {
                        target.force_stop_and_complete(*destroy_remaining, out_commands, out_events);
                    }
                    None => log::error!("cannot force stop {spawner}: no such spawner"),
                },
                _ => {}
            }
        }

        for event in events {
            match event {
                Event::TimeAdvanced { dt } => {
                    for spawner in self.spawners.values_mut() {
                        spawner.step(*dt, viewpoint, archetypes, out_commands, out_events);
                    }
                }
                Event::EnemyDied { enemy, .. } => {
                    if let Some(spawner) = self.spawners.get_mut(&enemy.spawner()) {
                        let _ = spawner.on_enemy_died(*enemy);
                    }
                }
                Event::EnemySpawnRejected { enemy, reason } => {
                    if let Some(spawner) = self.spawners.get_mut(&enemy.spawner()) {
                        let _ = spawner.on_spawn_rejected(*enemy, *reason);
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rail_shooter_core::{
        ArchetypeDefinition, ArchetypeId, EncounterOutcome, EnemySpawnInfo, RunId, SpawnAnchor,
        SpawnTrigger, Wave,
    };

    fn wave() -> Wave {
        Wave::new(
            0.0,
            vec![EnemySpawnInfo::new(
                SpawnTrigger::OnDelay { delay_secs: 0.0 },
                ArchetypeId::new(1),
                SpawnAnchor::at(Vec3::new(0.0, 0.0, 5.0)),
            )],
        )
    }

    #[test]
    fn unknown_spawner_start_is_reported() {
        let mut encounters = Encounters::new(Config::default());
        let mut commands = Vec::new();
        let mut events = Vec::new();
        encounters.handle(
            &[Command::StartEncounter {
                spawner: SpawnerId::new(9),
            }],
            &[],
            Vec3::ZERO,
            ArchetypeTableView::new(&[]),
            &mut commands,
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::EncounterStartIgnored {
                spawner: SpawnerId::new(9),
                reason: StartRejection::UnknownSpawner,
            }]
        );
    }

    #[test]
    fn duplicate_spawner_ids_keep_first_definition() {
        let encounters = Encounters::new(Config::new(vec![
            SpawnerConfig::new(SpawnerId::new(1), vec![wave()]),
            SpawnerConfig::new(SpawnerId::new(1), Vec::new()),
        ]));

        assert_eq!(encounters.iter().count(), 1);
        assert_eq!(
            encounters
                .spawner(SpawnerId::new(1))
                .map(EncounterSpawner::wave_count),
            Some(1)
        );
    }

    #[test]
    fn awaken_starts_flagged_spawners_only() {
        let mut flagged = SpawnerConfig::new(SpawnerId::new(1), vec![wave()]);
        flagged.start_on_awake = true;
        let mut encounters = Encounters::new(Config::new(vec![
            flagged,
            SpawnerConfig::new(SpawnerId::new(2), vec![wave()]),
        ]));

        let mut events = Vec::new();
        encounters.awaken(&mut events);

        assert_eq!(
            events,
            vec![Event::EncounterStarted {
                spawner: SpawnerId::new(1),
                run: RunId::new(0),
            }]
        );
        assert_eq!(encounters.running().collect::<Vec<_>>(), vec![SpawnerId::new(1)]);
    }

    #[test]
    fn stop_before_start_in_same_batch_completes_then_restarts() {
        let mut encounters = Encounters::new(Config::new(vec![SpawnerConfig::new(
            SpawnerId::new(1),
            vec![wave()],
        )]));
        let table = vec![ArchetypeDefinition::new(ArchetypeId::new(1), "grunt")];
        let mut commands = Vec::new();
        let mut events = Vec::new();
        let _ = encounters
            .spawner_mut(SpawnerId::new(1))
            .map(|spawner| spawner.start_sequence(&mut events));
        events.clear();

        encounters.handle(
            &[
                Command::ForceStopEncounter {
                    spawner: SpawnerId::new(1),
                    run: None,
                    destroy_remaining: true,
                },
                Command::StartEncounter {
                    spawner: SpawnerId::new(1),
                },
            ],
            &[],
            Vec3::ZERO,
            ArchetypeTableView::new(&table),
            &mut commands,
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::EncounterCompleted {
                    spawner: SpawnerId::new(1),
                    run: Some(RunId::new(0)),
                    outcome: EncounterOutcome::Forced,
                },
                Event::EncounterStarted {
                    spawner: SpawnerId::new(1),
                    run: RunId::new(1),
                },
            ]
        );
    }

    #[test]
    fn force_stop_of_finished_run_is_dropped() {
        let mut encounters = Encounters::new(Config::new(vec![SpawnerConfig::new(
            SpawnerId::new(1),
            vec![wave()],
        )]));
        let table = vec![ArchetypeDefinition::new(ArchetypeId::new(1), "grunt")];
        let mut commands = Vec::new();
        let mut events = Vec::new();
        let stop = |run| Command::ForceStopEncounter {
            spawner: SpawnerId::new(1),
            run,
            destroy_remaining: true,
        };

        encounters.handle(
            &[stop(Some(RunId::new(0)))],
            &[],
            Vec3::ZERO,
            ArchetypeTableView::new(&table),
            &mut commands,
            &mut events,
        );
        assert!(events.is_empty());

        let _ = encounters
            .spawner_mut(SpawnerId::new(1))
            .map(|spawner| spawner.start_sequence(&mut events));
        events.clear();
        encounters.handle(
            &[stop(Some(RunId::new(7))), stop(Some(RunId::new(0)))],
            &[],
            Vec3::ZERO,
            ArchetypeTableView::new(&table),
            &mut commands,
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::EncounterCompleted {
                spawner: SpawnerId::new(1),
                run: Some(RunId::new(0)),
                outcome: EncounterOutcome::Forced,
            }]
        );

        events.clear();
        encounters.handle(
            &[stop(None)],
            &[],
            Vec3::ZERO,
            ArchetypeTableView::new(&table),
            &mut commands,
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::EncounterCompleted {
                spawner: SpawnerId::new(1),
                run: None,
                outcome: EncounterOutcome::Forced,
            }]
        );
    }

    #[test]
    fn shutdown_releases_tracked_enemies() {
        let mut encounters = Encounters::new(Config::new(vec![SpawnerConfig::new(
            SpawnerId::new(1),
            vec![wave()],
        )]));
        let table = vec![ArchetypeDefinition::new(ArchetypeId::new(1), "grunt")];
        let mut commands = Vec::new();
        let mut events = Vec::new();
        encounters.handle(
            &[Command::StartEncounter {
                spawner: SpawnerId::new(1),
            }],
            &[Event::TimeAdvanced {
                dt: std::time::Duration::from_millis(16),
            }],
            Vec3::ZERO,
            ArchetypeTableView::new(&table),
            &mut commands,
            &mut events,
        );
        assert_eq!(commands.len(), 1);

        assert_eq!(encounters.shutdown(), 1);
        assert_eq!(encounters.running().count(), 0);
    }
}
