//! Wave sequence state machine for a single encounter spawner.

use std::{collections::BTreeSet, mem, time::Duration};

use glam::Vec3;
use rail_shooter_core::{
    seconds, ArchetypeTableView, Command, EncounterOutcome, EnemyId, EnemySpawnInfo, Event, RunId,
    SpawnRejection, SpawnTrigger, SpawnerConfig, SpawnerId, StartRejection, Wave,
};

/// Runs an ordered list of waves and reports completion exactly once per start.
///
/// The sequence is an explicit state machine advanced by [`EncounterSpawner::step`]
/// once per tick. Cancelling it with [`EncounterSpawner::force_stop_and_complete`]
/// clears the task and raises completion within the same call, so a natural
/// completion can never also be reported for that run.
#[derive(Debug)]
pub struct EncounterSpawner {
    id: SpawnerId,
    waves: Vec<Wave>,
    start_on_awake: bool,
    task: Option<WaveTask>,
    pending: Vec<usize>,
    alive: BTreeSet<EnemyId>,
    remaining: usize,
    runs_started: u32,
    next_serial: u32,
}

#[derive(Clone, Copy, Debug)]
struct WaveTask {
    run: RunId,
    wave: usize,
    stage: Stage,
}

#[derive(Clone, Copy, Debug)]
enum Stage {
    Delaying { waited: Duration },
    Active { elapsed: Duration },
}

impl EncounterSpawner {
    /// Creates an idle spawner from its authored configuration.
    #[must_use]
    pub fn new(config: SpawnerConfig) -> Self {
        Self {
            id: config.id,
            waves: config.waves,
            start_on_awake: config.start_on_awake,
            task: None,
            pending: Vec::new(),
            alive: BTreeSet::new(),
            remaining: 0,
            runs_started: 0,
            next_serial: 0,
        }
    }

    /// Identifier of the spawner.
    #[must_use]
    pub const fn id(&self) -> SpawnerId {
        self.id
    }

    /// Whether the spawner should start as soon as the simulation boots.
    #[must_use]
    pub const fn start_on_awake(&self) -> bool {
        self.start_on_awake
    }

    /// Number of configured waves.
    #[must_use]
    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }

    /// Reports whether a wave sequence is in progress.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Run currently in progress, if any.
    #[must_use]
    pub fn current_run(&self) -> Option<RunId> {
        self.task.map(|task| task.run)
    }

    /// Index of the wave currently delaying or active.
    #[must_use]
    pub fn current_wave(&self) -> Option<usize> {
        self.task.map(|task| task.wave)
    }

    /// Enemies of the active wave that have not been resolved yet.
    #[must_use]
    pub const fn remaining_in_wave(&self) -> usize {
        self.remaining
    }

    /// Entries of the active wave whose trigger has not fired yet.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Enemies whose death notification the spawner is subscribed to.
    pub fn tracked_enemies(&self) -> impl Iterator<Item = EnemyId> + '_ {
        self.alive.iter().copied()
    }

    /// Begins wave processing unless already running or no waves are configured.
    ///
    /// Ignored requests are reported through [`Event::EncounterStartIgnored`]
    /// and otherwise leave the spawner untouched.
    pub fn start_sequence(&mut self, out_events: &mut Vec<Event>) -> Result<RunId, StartRejection> {
        if let Some(task) = self.task {
            let reason = StartRejection::AlreadyRunning { run: task.run };
            log::debug!("{} ignored start: run {} in progress", self.id, task.run.get());
            out_events.push(Event::EncounterStartIgnored {
                spawner: self.id,
                reason,
            });
            return Err(reason);
        }

        if self.waves.is_empty() {
            log::warn!("{} ignored start: no waves configured", self.id);
            out_events.push(Event::EncounterStartIgnored {
                spawner: self.id,
                reason: StartRejection::NoWaves,
            });
            return Err(StartRejection::NoWaves);
        }

        let run = RunId::new(self.runs_started);
        self.runs_started = self.runs_started.wrapping_add(1);
        self.pending.clear();
        self.alive.clear();
        self.remaining = 0;
        self.task = Some(WaveTask {
            run,
            wave: 0,
            stage: Stage::Delaying {
                waited: Duration::ZERO,
            },
        });

        log::info!("{} starting wave sequence (run {})", self.id, run.get());
        out_events.push(Event::EncounterStarted {
            spawner: self.id,
            run,
        });
        Ok(run)
    }

    /// Cancels the sequence, drops all tracking and raises completion.
    ///
    /// Calling this on an idle spawner still raises completion once, with no
    /// run attached.
    pub fn force_stop_and_complete(
        &mut self,
        destroy_remaining: bool,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        let run = self.task.take().map(|task| task.run);
        self.pending.clear();
        self.remaining = 0;

        let tracked = mem::take(&mut self.alive);
        log::info!(
            "{} force stopped; releasing {} live enemies (destroy: {destroy_remaining})",
            self.id,
            tracked.len()
        );
        if destroy_remaining {
            out_commands.extend(
                tracked
                    .into_iter()
                    .map(|enemy| Command::DestroyEnemy { enemy }),
            );
        }

        out_events.push(Event::EncounterCompleted {
            spawner: self.id,
            run,
            outcome: EncounterOutcome::Forced,
        });
    }

    /// Drops every subscription and cancels the task without raising completion.
    ///
    /// Returns the number of enemy subscriptions released.
    pub fn release_subscriptions(&mut self) -> usize {
        self.task = None;
        self.pending.clear();
        self.remaining = 0;
        let released = self.alive.len();
        self.alive.clear();
        released
    }

    /// Death callback. Returns `true` when the enemy belonged to this spawner.
    pub fn on_enemy_died(&mut self, enemy: EnemyId) -> bool {
        if !self.alive.remove(&enemy) {
            return false;
        }

        self.remaining = self.remaining.saturating_sub(1);
        log::debug!("{enemy} died; {} left in wave", self.remaining);
        true
    }

    /// Treats an enemy the world refused to instantiate as already resolved.
    pub fn on_spawn_rejected(&mut self, enemy: EnemyId, reason: SpawnRejection) -> bool {
        if !self.alive.remove(&enemy) {
            return false;
        }

        log::error!("{enemy} could not be spawned ({reason:?}); counting it as resolved");
        self.resolve_without_actor();
        true
    }

    /// Advances the wave sequence by one tick.
    pub fn step(
        &mut self,
        dt: Duration,
        viewpoint: Vec3,
        archetypes: ArchetypeTableView<'_>,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        let Some(mut task) = self.task else {
            return;
        };

        let elapsed = match task.stage {
            Stage::Delaying { waited } => {
                let waited = waited.saturating_add(dt);
                let delay = self
                    .waves
                    .get(task.wave)
                    .map_or(Duration::ZERO, Wave::delay_before);
                if waited < delay {
                    task.stage = Stage::Delaying { waited };
                    self.task = Some(task);
                    return;
                }

                self.begin_wave(task, out_events);
                Duration::ZERO
            }
            Stage::Active { elapsed } => elapsed.saturating_add(dt),
        };

        task.stage = Stage::Active { elapsed };
        self.task = Some(task);

        if self.remaining == 0 {
            self.finish_wave(task, out_events);
            return;
        }

        self.scan_pending(task.wave, elapsed, viewpoint, archetypes, out_commands);
    }

    fn begin_wave(&mut self, task: WaveTask, out_events: &mut Vec<Event>) {
        let entries = self
            .waves
            .get(task.wave)
            .map_or(0, |wave| wave.enemies.len());
        self.pending.clear();
        self.pending.extend(0..entries);
        self.remaining = entries;

        log::info!(
            "{} wave {} started with {entries} enemies",
            self.id,
            task.wave
        );
        out_events.push(Event::WaveStarted {
            spawner: self.id,
            run: task.run,
            wave: task.wave,
        });
    }

    fn finish_wave(&mut self, task: WaveTask, out_events: &mut Vec<Event>) {
        log::info!("{} wave {} cleared", self.id, task.wave);
        out_events.push(Event::WaveCleared {
            spawner: self.id,
            run: task.run,
            wave: task.wave,
        });

        let next = task.wave + 1;
        if next < self.waves.len() {
            self.task = Some(WaveTask {
                run: task.run,
                wave: next,
                stage: Stage::Delaying {
                    waited: Duration::ZERO,
                },
            });
            return;
        }

        self.task = None;
        self.pending.clear();
        log::info!("{} cleared every wave (run {})", self.id, task.run.get());
        out_events.push(Event::EncounterCompleted {
            spawner: self.id,
            run: Some(task.run),
            outcome: EncounterOutcome::Cleared,
        });
    }

    fn scan_pending(
        &mut self,
        wave: usize,
        elapsed: Duration,
        viewpoint: Vec3,
        archetypes: ArchetypeTableView<'_>,
        out_commands: &mut Vec<Command>,
    ) {
        // Reverse order keeps the remaining slots valid while entries are removed.
        for slot in (0..self.pending.len()).rev() {
            let index = self.pending[slot];
            let Some(info) = self
                .waves
                .get(wave)
                .and_then(|wave| wave.enemies.get(index))
            else {
                let _ = self.pending.remove(slot);
                self.resolve_without_actor();
                continue;
            };

            if !trigger_fires(info, elapsed, viewpoint) {
                continue;
            }

            let info = info.clone();
            let _ = self.pending.remove(slot);
            self.spawn(&info, viewpoint, archetypes, out_commands);
        }
    }

    fn spawn(
        &mut self,
        info: &EnemySpawnInfo,
        viewpoint: Vec3,
        archetypes: ArchetypeTableView<'_>,
        out_commands: &mut Vec<Command>,
    ) {
        let (Some(archetype), Some(anchor)) = (info.archetype, info.anchor) else {
            log::error!(
                "{}: spawn entry is missing its archetype or anchor; counting it as resolved",
                self.id
            );
            self.resolve_without_actor();
            return;
        };

        let Some(definition) = archetypes.get(archetype) else {
            log::error!(
                "{}: archetype {} is not registered; counting the entry as resolved",
                self.id,
                archetype.get()
            );
            self.resolve_without_actor();
            return;
        };

        let direction = (anchor.position - viewpoint).normalize_or_zero();
        let position = anchor.position + direction * info.offset;
        let enemy = EnemyId::new(self.id, self.next_serial);
        self.next_serial = self.next_serial.wrapping_add(1);

        if !definition.has_ai {
            log::warn!(
                "archetype '{}' has no AI; {enemy} will not approach its anchor",
                definition.name
            );
        }

        out_commands.push(Command::SpawnEnemy {
            enemy,
            archetype,
            position,
            facing: anchor.facing,
            target: anchor.position,
        });

        if definition.reports_death {
            let _ = self.alive.insert(enemy);
            log::debug!("{} spawned {enemy} at {position}", self.id);
        } else {
            log::error!(
                "archetype '{}' does not report deaths; {enemy} is counted as resolved",
                definition.name
            );
            self.resolve_without_actor();
        }
    }

    fn resolve_without_actor(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}

fn trigger_fires(info: &EnemySpawnInfo, elapsed: Duration, viewpoint: Vec3) -> bool {
    match info.trigger {
        SpawnTrigger::OnDelay { delay_secs } => elapsed >= seconds(delay_secs),
        // A missing anchor fires at once so the entry is resolved as misconfigured.
        SpawnTrigger::OnDistance { distance } => info
            .anchor
            .map_or(true, |anchor| viewpoint.distance(anchor.position) <= distance),
    }
}
