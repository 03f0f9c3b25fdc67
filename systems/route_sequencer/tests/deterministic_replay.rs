use std::time::Duration;

use glam::Vec3;
use rail_shooter_core::{
    ArchetypeDefinition, ArchetypeId, ArrivalAction, Command, EncounterKind, EnemySpawnInfo, Event,
    RouteNode, SpawnAnchor, SpawnTrigger, SpawnerConfig, SpawnerId, Wave,
};
use rail_shooter_system_encounter_spawner::{Config as EncounterConfig, Encounters};
use rail_shooter_system_route_sequencer::{Config, RouteSequencer, SequencerState};
use rail_shooter_world::{self as world, query, EnemyPhase, World};

const GRUNT: ArchetypeId = ArchetypeId::new(1);
const BRUTE: ArchetypeId = ArchetypeId::new(2);
const TICK: Duration = Duration::from_millis(100);
const MAX_TICKS: usize = 2_000;

#[test]
fn deterministic_replay_produces_identical_runs() {
    let first = replay();
    let second = replay();

    assert_eq!(first, second, "replay diverged between runs");
    assert!(first.finished, "route should be completed");
    assert_eq!(first.state, SequencerState::Idle);
    assert!(first.score > 0);
    assert_eq!(
        first
            .events
            .iter()
            .filter(|event| matches!(event, Event::RouteCompleted))
            .count(),
        1
    );
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    events: Vec<Event>,
    score: u64,
    ticks: u64,
    state: SequencerState,
    finished: bool,
}

fn replay() -> ReplayOutcome {
    let mut world = World::new();
    let mut setup = Vec::new();
    for command in level_commands() {
        world::apply(&mut world, command, &mut setup);
    }

    let mut encounters = Encounters::new(EncounterConfig::new(spawners()));
    let mut sequencer = RouteSequencer::new(
        Config::new(nodes(), query::route_bounds(&world)).with_initial_follow_speed(8.0),
    );
    let mut log = Vec::new();

    let mut awakened = Vec::new();
    encounters.awaken(&mut awakened);
    sequencer.handle(&awakened, &mut Vec::new());
    log.extend(awakened);

    let mut commands = Vec::new();
    sequencer.start(&mut commands);
    pump(&mut world, &mut encounters, &mut sequencer, commands, &mut log);

    for _ in 0..MAX_TICKS {
        if sequencer.is_finished() {
            break;
        }

        pump(
            &mut world,
            &mut encounters,
            &mut sequencer,
            vec![Command::Tick { dt: TICK }],
            &mut log,
        );

        let shots = scripted_shots(&world);
        pump(&mut world, &mut encounters, &mut sequencer, shots, &mut log);

        if sequencer.state() == SequencerState::WaitingOnEvent {
            pump(
                &mut world,
                &mut encounters,
                &mut sequencer,
                vec![Command::SignalEventComplete],
                &mut log,
            );
        }
    }

    ReplayOutcome {
        events: log,
        score: query::score(&world),
        ticks: query::tick_index(&world),
        state: sequencer.state(),
        finished: sequencer.is_finished(),
    }
}

fn pump(
    world: &mut World,
    encounters: &mut Encounters,
    sequencer: &mut RouteSequencer,
    mut commands: Vec<Command>,
    log: &mut Vec<Event>,
) {
    while !commands.is_empty() {
        let mut events = Vec::new();
        for command in &commands {
            world::apply(world, command.clone(), &mut events);
        }

        let mut next = Vec::new();
        let mut lifecycle = Vec::new();
        encounters.handle(
            &commands,
            &events,
            query::viewpoint(world),
            query::archetype_table(world),
            &mut next,
            &mut lifecycle,
        );
        events.extend(lifecycle);
        sequencer.handle(&events, &mut next);

        log.extend(events);
        commands = next;
    }
}

/// One point of damage to every enemy that finished its approach.
fn scripted_shots(world: &World) -> Vec<Command> {
    query::enemy_view(world)
        .iter()
        .filter(|enemy| enemy.phase == EnemyPhase::Active)
        .map(|enemy| Command::DamageEnemy {
            enemy: enemy.id,
            amount: 1,
        })
        .collect()
}

fn level_commands() -> Vec<Command> {
    let mut brute = ArchetypeDefinition::new(BRUTE, "brute");
    brute.hit_points = 3;
    brute.score_value = 250;
    brute.approach_speed = 6.0;

    let mut grunt = ArchetypeDefinition::new(GRUNT, "grunt");
    grunt.score_value = 100;

    vec![
        Command::ConfigureRoute {
            waypoints: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 20.0),
                Vec3::new(10.0, 0.0, 30.0),
                Vec3::new(10.0, 0.0, 60.0),
                Vec3::new(0.0, 0.0, 80.0),
            ],
        },
        Command::RegisterArchetype { definition: grunt },
        Command::RegisterArchetype { definition: brute },
    ]
}

fn nodes() -> Vec<RouteNode> {
    vec![
        RouteNode::new(EncounterKind::StopAndClear, 1.0, 12.0).with_spawner(SpawnerId::new(1)),
        RouteNode::new(EncounterKind::None, 1.5, 6.0)
            .with_arrival_action(ArrivalAction::new("radio_chatter")),
        RouteNode::new(EncounterKind::MoveAndSurvive, 2.0, 10.0).with_spawner(SpawnerId::new(2)),
        RouteNode::new(EncounterKind::StopAndClear, 3.0, 10.0).with_spawner(SpawnerId::new(3)),
    ]
}

fn spawners() -> Vec<SpawnerConfig> {
    let ambush = SpawnerConfig::new(
        SpawnerId::new(1),
        vec![
            Wave::new(
                0.5,
                vec![
                    EnemySpawnInfo::new(
                        SpawnTrigger::OnDelay { delay_secs: 0.0 },
                        GRUNT,
                        SpawnAnchor::at(Vec3::new(-3.0, 0.0, 28.0)),
                    ),
                    EnemySpawnInfo::new(
                        SpawnTrigger::OnDelay { delay_secs: 1.2 },
                        GRUNT,
                        SpawnAnchor::at(Vec3::new(3.0, 0.0, 28.0)),
                    ),
                ],
            ),
            Wave::new(
                1.0,
                vec![EnemySpawnInfo::new(
                    SpawnTrigger::OnDelay { delay_secs: 0.3 },
                    BRUTE,
                    SpawnAnchor::at(Vec3::new(0.0, 0.0, 32.0)),
                )
                .with_offset(8.0)],
            ),
        ],
    );

    let chase = SpawnerConfig::new(
        SpawnerId::new(2),
        vec![Wave::new(
            0.0,
            vec![
                EnemySpawnInfo::new(
                    SpawnTrigger::OnDistance { distance: 15.0 },
                    GRUNT,
                    SpawnAnchor::at(Vec3::new(12.0, 0.0, 45.0)),
                ),
                EnemySpawnInfo::new(
                    SpawnTrigger::OnDelay { delay_secs: 2.0 },
                    GRUNT,
                    SpawnAnchor::at(Vec3::new(8.0, 0.0, 50.0)),
                ),
            ],
        )],
    );

    let mut sniper_nest = SpawnerConfig::new(
        SpawnerId::new(3),
        vec![Wave::new(
            0.0,
            vec![EnemySpawnInfo::new(
                SpawnTrigger::OnDelay { delay_secs: 0.5 },
                BRUTE,
                SpawnAnchor::at(Vec3::new(6.0, 2.0, 70.0)),
            )],
        )],
    );
    sniper_nest.start_on_awake = true;

    vec![ambush, chase, sniper_nest]
}
