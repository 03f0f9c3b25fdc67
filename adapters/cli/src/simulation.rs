//! Headless tick loop wiring the world, the encounter systems and the scripted actors.

use std::{fmt, time::Duration};

use rail_shooter_core::{Command, EncounterOutcome, Event};
use rail_shooter_system_encounter_spawner::{Config as EncounterConfig, Encounters};
use rail_shooter_system_route_sequencer::{Config as SequencerConfig, RouteSequencer, SequencerState};
use rail_shooter_world::{self as world, query, World};

use crate::{
    cutscene::CutscenePlayer,
    level::Level,
    marksman::{Marksman, MarksmanConfig},
};

/// Upper bound on command batches processed for a single tick.
const MAX_PUMP_ROUNDS: usize = 64;

/// Run parameters supplied on the command line.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Settings {
    pub(crate) tick: Duration,
    pub(crate) max_time: Duration,
    pub(crate) marksman: MarksmanConfig,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Stats {
    nodes_reached: u32,
    enemies_spawned: u32,
    enemies_killed: u32,
    enemies_destroyed: u32,
    waves_cleared: u32,
    encounters_cleared: u32,
    encounters_forced: u32,
}

impl Stats {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::RouteEndReached { .. } => self.nodes_reached += 1,
                Event::EnemySpawned { .. } => self.enemies_spawned += 1,
                Event::EnemyDied { .. } => self.enemies_killed += 1,
                Event::EnemyDestroyed { .. } => self.enemies_destroyed += 1,
                Event::WaveCleared { .. } => self.waves_cleared += 1,
                Event::EncounterCompleted { outcome, .. } => match outcome {
                    EncounterOutcome::Cleared => self.encounters_cleared += 1,
                    EncounterOutcome::Forced => self.encounters_forced += 1,
                },
                _ => {}
            }
        }
    }
}

/// Outcome of a headless run.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Summary {
    level: String,
    route_completed: bool,
    final_state: SequencerState,
    elapsed: Duration,
    ticks: u64,
    score: u64,
    shots: u64,
    hits: u64,
    cues_played: usize,
    subscriptions_released: usize,
    stats: Stats,
}

impl Summary {
    pub(crate) fn route_completed(&self) -> bool {
        self.route_completed
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.route_completed {
            "route completed"
        } else {
            "route not completed"
        };
        writeln!(f, "{}: {outcome}", self.level)?;
        writeln!(
            f,
            "  time {:.2}s over {} ticks, final state {:?}",
            self.elapsed.as_secs_f32(),
            self.ticks,
            self.final_state
        )?;
        writeln!(f, "  arrivals {}, cues played {}", self.stats.nodes_reached, self.cues_played)?;
        writeln!(
            f,
            "  enemies spawned {}, killed {}, destroyed {}",
            self.stats.enemies_spawned, self.stats.enemies_killed, self.stats.enemies_destroyed
        )?;
        writeln!(
            f,
            "  waves cleared {}, encounters cleared {}, forced {}",
            self.stats.waves_cleared, self.stats.encounters_cleared, self.stats.encounters_forced
        )?;
        writeln!(f, "  shots {}, hits {}", self.shots, self.hits)?;
        writeln!(f, "  subscriptions released at shutdown {}", self.subscriptions_released)?;
        write!(f, "  score {}", self.score)
    }
}

/// Owns every participant of a headless run.
#[derive(Debug)]
pub(crate) struct Simulation {
    name: String,
    world: World,
    encounters: Encounters,
    sequencer: RouteSequencer,
    marksman: Marksman,
    cutscenes: CutscenePlayer,
    settings: Settings,
    stats: Stats,
}

impl Simulation {
    /// Loads the level into a fresh world and wires the systems to it.
    pub(crate) fn new(level: Level, settings: Settings) -> Self {
        let mut world = World::new();
        let mut events = Vec::new();
        for command in level.setup_commands() {
            world::apply(&mut world, command, &mut events);
        }

        let mut sequencer_config = SequencerConfig::new(level.nodes, query::route_bounds(&world))
            .with_destroy_enemies_on_arrival(level.destroy_enemies_on_arrival);
        if let Some(speed) = level.initial_follow_speed {
            sequencer_config = sequencer_config.with_initial_follow_speed(speed);
        }

        let mut simulation = Self {
            name: level.name,
            world,
            encounters: Encounters::new(EncounterConfig::new(level.spawners)),
            sequencer: RouteSequencer::new(sequencer_config),
            marksman: Marksman::new(settings.marksman),
            cutscenes: CutscenePlayer::new(&level.cues, level.default_cue_seconds),
            settings,
            stats: Stats::default(),
        };
        simulation.stats.record(&events);
        simulation
    }

    /// Runs until the route completes or the time budget is exhausted.
    pub(crate) fn run(mut self) -> Summary {
        log::info!("starting level '{}'", self.name);
        let mut awakened = Vec::new();
        self.encounters.awaken(&mut awakened);
        let mut commands = Vec::new();
        self.sequencer.handle(&awakened, &mut commands);
        self.stats.record(&awakened);
        self.sequencer.start(&mut commands);
        self.pump(commands);

        while !self.sequencer.is_finished() && query::clock(&self.world) < self.settings.max_time {
            self.pump(vec![Command::Tick {
                dt: self.settings.tick,
            }]);
        }

        let route_completed = query::route_completed(&self.world);
        if !route_completed {
            log::warn!(
                "time budget of {:.1}s exhausted in state {:?}",
                self.settings.max_time.as_secs_f32(),
                self.sequencer.state()
            );
        }

        let teardown = self.sequencer.teardown();
        let subscriptions_released = teardown.released.len()
            + usize::from(teardown.arrival_released)
            + self.encounters.shutdown();

        Summary {
            level: self.name,
            route_completed,
            final_state: self.sequencer.state(),
            elapsed: query::clock(&self.world),
            ticks: query::tick_index(&self.world),
            score: query::score(&self.world),
            shots: self.marksman.shots(),
            hits: self.marksman.hits(),
            cues_played: self.cutscenes.played(),
            subscriptions_released,
            stats: self.stats,
        }
    }

    fn pump(&mut self, mut commands: Vec<Command>) {
        for _ in 0..MAX_PUMP_ROUNDS {
            if commands.is_empty() {
                return;
            }

            let mut events = Vec::new();
            for command in &commands {
                world::apply(&mut self.world, command.clone(), &mut events);
            }

            let mut next = Vec::new();
            let mut lifecycle = Vec::new();
            self.encounters.handle(
                &commands,
                &events,
                query::viewpoint(&self.world),
                query::archetype_table(&self.world),
                &mut next,
                &mut lifecycle,
            );
            events.extend(lifecycle);

            self.sequencer.handle(&events, &mut next);
            self.cutscenes.handle(&events, &mut next);
            self.marksman
                .handle(&events, &query::enemy_view(&self.world), &mut next);

            self.stats.record(&events);
            commands = next;
        }

        log::error!(
            "dropping {} commands after {MAX_PUMP_ROUNDS} rounds in one tick",
            commands.len()
        );
    }
}
