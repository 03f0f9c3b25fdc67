#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the rail shooter engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and the encounter systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. The encounter spawner and the
//! route sequencer consume event streams, query immutable views, and respond
//! exclusively with new command batches (plus the encounter lifecycle events
//! the spawner owns).
//!
//! Authored level data ([`RouteNode`], [`Wave`], [`EnemySpawnInfo`],
//! [`SpawnerConfig`], [`ArchetypeDefinition`]) lives here as well so that
//! adapters can deserialise it once and hand read-only copies to every system.

use std::{fmt, time::Duration};

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands that express all permissible mutations of the simulation.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the route polyline travelled by the viewpoint.
    ConfigureRoute {
        /// Ordered control points of the route. Route positions index into it.
        waypoints: Vec<Vec3>,
    },
    /// Registers (or replaces) an enemy archetype the world may instantiate.
    RegisterArchetype {
        /// Authored definition of the archetype.
        definition: ArchetypeDefinition,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Restarts the path follower on a new segment of the route.
    FollowRoute {
        /// Route position the traversal starts from.
        from: RoutePosition,
        /// Route position at which the arrival notification fires.
        to: RoutePosition,
        /// Traversal speed in world units per second.
        speed: f32,
    },
    /// Invokes one subscriber of a node's arrival action.
    TriggerArrivalAction {
        /// Index of the node that was reached.
        node: usize,
        /// Subscriber being notified.
        action: ArrivalAction,
    },
    /// External signal that the event a node was waiting on has finished.
    SignalEventComplete,
    /// Declares that the viewpoint reached the end of the route.
    CompleteRoute,
    /// Requests that an encounter spawner begin its wave sequence.
    StartEncounter {
        /// Spawner that should start.
        spawner: SpawnerId,
    },
    /// Requests that an encounter spawner stop immediately and report completion.
    ForceStopEncounter {
        /// Spawner that should stop.
        spawner: SpawnerId,
        /// Run the stop is aimed at. A stop for a run that is no longer in
        /// progress is dropped; `None` stops whatever is running.
        run: Option<RunId>,
        /// Whether enemies still alive should be destroyed outright.
        destroy_remaining: bool,
    },
    /// Requests that the world instantiate an enemy actor.
    SpawnEnemy {
        /// Identifier pre-allocated by the owning spawner.
        enemy: EnemyId,
        /// Archetype to instantiate.
        archetype: ArchetypeId,
        /// Position the actor appears at.
        position: Vec3,
        /// Orientation the actor faces when it appears.
        facing: Quat,
        /// Anchor the actor approaches after spawning.
        target: Vec3,
    },
    /// Applies damage to an enemy actor.
    DamageEnemy {
        /// Enemy receiving the damage.
        enemy: EnemyId,
        /// Hit points removed from the enemy.
        amount: u32,
    },
    /// Removes an enemy outright, bypassing its death handling.
    DestroyEnemy {
        /// Enemy being removed.
        enemy: EnemyId,
    },
}

/// Events broadcast after commands have been processed.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a new route polyline is active.
    RouteConfigured {
        /// Bounds of the newly configured route.
        bounds: RouteBounds,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the path follower started a new traversal.
    FollowStarted {
        /// Route position the traversal starts from.
        from: RoutePosition,
        /// Route position the traversal ends at.
        to: RoutePosition,
        /// Traversal speed in world units per second.
        speed: f32,
    },
    /// Raised exactly once per traversal when the follower reaches its end.
    RouteEndReached {
        /// Route position that was reached.
        position: RoutePosition,
    },
    /// Announces that an arrival-action subscriber was invoked.
    ArrivalActionTriggered {
        /// Index of the node that was reached.
        node: usize,
        /// Subscriber that was notified.
        action: ArrivalAction,
    },
    /// Announces the external "event complete" signal.
    EventCompleteSignaled,
    /// Announces that the viewpoint finished the route.
    RouteCompleted,
    /// Confirms that an enemy actor entered the world.
    EnemySpawned {
        /// Identifier of the spawned enemy.
        enemy: EnemyId,
        /// Archetype that was instantiated.
        archetype: ArchetypeId,
        /// Position the actor appeared at.
        position: Vec3,
    },
    /// Reports that the world refused to instantiate an enemy.
    EnemySpawnRejected {
        /// Identifier that was requested.
        enemy: EnemyId,
        /// Specific reason the spawn failed.
        reason: SpawnRejection,
    },
    /// Reports that an enemy finished its approach and is now fully active.
    EnemyActivated {
        /// Enemy that reached its anchor.
        enemy: EnemyId,
    },
    /// Confirms that damage was applied to an enemy that survived it.
    EnemyDamaged {
        /// Enemy that was damaged.
        enemy: EnemyId,
        /// Hit points left after the damage.
        remaining: u32,
    },
    /// Death notification raised exactly once per death-reporting actor.
    EnemyDied {
        /// Enemy that died.
        enemy: EnemyId,
        /// Score credited for the kill.
        score: u32,
    },
    /// Confirms that an enemy was removed without death handling.
    EnemyDestroyed {
        /// Enemy that was removed.
        enemy: EnemyId,
    },
    /// Announces that a spawner accepted a start request.
    EncounterStarted {
        /// Spawner that started.
        spawner: SpawnerId,
        /// Run allocated for this start.
        run: RunId,
    },
    /// Reports that a spawner ignored a start request.
    EncounterStartIgnored {
        /// Spawner that ignored the request.
        spawner: SpawnerId,
        /// Reason the request was ignored.
        reason: StartRejection,
    },
    /// Announces that a wave began spawning.
    WaveStarted {
        /// Spawner running the wave.
        spawner: SpawnerId,
        /// Run the wave belongs to.
        run: RunId,
        /// Zero-based wave index.
        wave: usize,
    },
    /// Announces that every enemy of a wave has been resolved.
    WaveCleared {
        /// Spawner running the wave.
        spawner: SpawnerId,
        /// Run the wave belongs to.
        run: RunId,
        /// Zero-based wave index.
        wave: usize,
    },
    /// Completion notification, raised exactly once per start or forced stop.
    EncounterCompleted {
        /// Spawner that completed.
        spawner: SpawnerId,
        /// Run that completed, `None` when an idle spawner was forced to complete.
        run: Option<RunId>,
        /// Whether the waves were exhausted or the run was cut short.
        outcome: EncounterOutcome,
    },
}

/// Converts authored seconds into a [`Duration`], treating invalid input as zero.
#[must_use]
pub fn seconds(value: f32) -> Duration {
    if value.is_nan() || value <= 0.0 {
        return Duration::ZERO;
    }

    Duration::try_from_secs_f32(value).unwrap_or(Duration::MAX)
}

/// Fractional index of a control point along the route.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutePosition(f32);

impl RoutePosition {
    /// Position of the first control point.
    pub const START: Self = Self(0.0);

    /// Creates a new route position from a fractional control-point index.
    #[must_use]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Retrieves the fractional control-point index.
    #[must_use]
    pub const fn get(&self) -> f32 {
        self.0
    }
}

impl fmt::Display for RoutePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Addressable range of a route, derived from its control-point count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteBounds {
    point_count: u32,
}

impl RouteBounds {
    /// Creates bounds for a route with the provided number of control points.
    #[must_use]
    pub const fn new(point_count: u32) -> Self {
        Self { point_count }
    }

    /// Number of control points on the route.
    #[must_use]
    pub const fn point_count(&self) -> u32 {
        self.point_count
    }

    /// Position of the final control point, where the route ends.
    #[must_use]
    pub fn terminal(&self) -> RoutePosition {
        RoutePosition::new(self.point_count.saturating_sub(1) as f32)
    }

    /// Validates that a position lies within `[0, point_count - 1]`.
    pub fn check(&self, position: RoutePosition) -> Result<RoutePosition, RoutePositionError> {
        let value = position.get();
        let valid = self.point_count > 0
            && value.is_finite()
            && value >= 0.0
            && value <= self.terminal().get();

        if valid {
            Ok(position)
        } else {
            Err(RoutePositionError {
                position,
                point_count: self.point_count,
            })
        }
    }
}

/// Raised when an authored route position lies outside the route.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
#[error(
    "route position {position} is outside the route; it has {point_count} points (valid range 0..={})",
    .point_count.saturating_sub(1)
)]
pub struct RoutePositionError {
    /// Position that failed validation.
    pub position: RoutePosition,
    /// Control-point count of the route it was checked against.
    pub point_count: u32,
}

/// Unique identifier assigned to an encounter spawner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpawnerId(u32);

impl SpawnerId {
    /// Creates a new spawner identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SpawnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spawner#{}", self.0)
    }
}

/// Identifies one `StartSequence` lifetime of a spawner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(u32);

impl RunId {
    /// Creates a new run identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier of an enemy actor, allocated by the spawner that owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId {
    spawner: SpawnerId,
    serial: u32,
}

impl EnemyId {
    /// Creates an enemy identifier scoped to the owning spawner.
    #[must_use]
    pub const fn new(spawner: SpawnerId, serial: u32) -> Self {
        Self { spawner, serial }
    }

    /// Spawner that owns the enemy.
    #[must_use]
    pub const fn spawner(&self) -> SpawnerId {
        self.spawner
    }

    /// Spawner-local serial number.
    #[must_use]
    pub const fn serial(&self) -> u32 {
        self.serial
    }
}

impl fmt::Display for EnemyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "enemy#{}.{}", self.spawner.get(), self.serial)
    }
}

/// Identifier of an authored enemy archetype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchetypeId(u32);

impl ArchetypeId {
    /// Creates a new archetype identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Named subscriber of a node's arrival action, e.g. a cutscene script.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArrivalAction(String);

impl ArrivalAction {
    /// Creates a subscriber with the provided name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Name of the subscriber.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Kind of encounter bound to a route node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterKind {
    /// No combat; optionally wait for an external event.
    #[default]
    None,
    /// Stop at the node until its spawner reports completion.
    StopAndClear,
    /// Keep moving while the node's spawner runs in the background.
    MoveAndSurvive,
}

/// Authored stopping or triggering point on the route.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteNode {
    /// Encounter dispatched when the node is reached.
    #[serde(default)]
    pub encounter_kind: EncounterKind,
    /// Point on the route at which the node sits.
    pub route_position: RoutePosition,
    /// Spawner run by `StopAndClear` and `MoveAndSurvive` encounters.
    #[serde(default)]
    pub spawner: Option<SpawnerId>,
    /// Traversal speed for the segment leading to this node.
    pub follow_speed: f32,
    /// Subscribers notified when the node is reached.
    #[serde(default)]
    pub on_arrival: Vec<ArrivalAction>,
}

impl RouteNode {
    /// Creates a node without spawner or arrival subscribers.
    #[must_use]
    pub fn new(encounter_kind: EncounterKind, route_position: f32, follow_speed: f32) -> Self {
        Self {
            encounter_kind,
            route_position: RoutePosition::new(route_position),
            spawner: None,
            follow_speed,
            on_arrival: Vec::new(),
        }
    }

    /// Binds the node to the provided spawner.
    #[must_use]
    pub fn with_spawner(mut self, spawner: SpawnerId) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Adds an arrival-action subscriber.
    #[must_use]
    pub fn with_arrival_action(mut self, action: ArrivalAction) -> Self {
        self.on_arrival.push(action);
        self
    }

    /// Number of subscribers attached to the arrival action.
    #[must_use]
    pub fn arrival_subscribers(&self) -> usize {
        self.on_arrival.len()
    }
}

/// Condition that makes a pending enemy appear.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnTrigger {
    /// Appears once the wave has been active for `delay_secs`.
    OnDelay {
        /// Seconds after the wave start.
        #[serde(default)]
        delay_secs: f32,
    },
    /// Appears once the viewpoint is within `distance` of the anchor.
    OnDistance {
        /// Trigger radius in world units.
        #[serde(default = "default_spawn_distance")]
        distance: f32,
    },
}

impl Default for SpawnTrigger {
    fn default() -> Self {
        Self::OnDelay { delay_secs: 0.0 }
    }
}

fn default_spawn_distance() -> f32 {
    20.0
}

fn default_spawn_offset() -> f32 {
    15.0
}

/// Authored spawn-reference point for an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnAnchor {
    /// Position the enemy approaches after it appears.
    pub position: Vec3,
    /// Orientation the enemy faces when it appears.
    #[serde(default = "identity_rotation")]
    pub facing: Quat,
}

impl SpawnAnchor {
    /// Creates an anchor facing along the identity orientation.
    #[must_use]
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            facing: Quat::IDENTITY,
        }
    }
}

fn identity_rotation() -> Quat {
    Quat::IDENTITY
}

/// Authored entry describing one enemy of a wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawnInfo {
    /// Condition that makes the enemy appear.
    #[serde(default)]
    pub trigger: SpawnTrigger,
    /// Archetype to instantiate. Missing references are skipped at runtime.
    #[serde(default)]
    pub archetype: Option<ArchetypeId>,
    /// Anchor the enemy is placed behind. Missing references are skipped at runtime.
    #[serde(default)]
    pub anchor: Option<SpawnAnchor>,
    /// Distance behind the anchor, as seen from the viewpoint, where the enemy appears.
    #[serde(default = "default_spawn_offset")]
    pub offset: f32,
}

impl EnemySpawnInfo {
    /// Creates an entry for the provided archetype, anchor and trigger.
    #[must_use]
    pub fn new(trigger: SpawnTrigger, archetype: ArchetypeId, anchor: SpawnAnchor) -> Self {
        Self {
            trigger,
            archetype: Some(archetype),
            anchor: Some(anchor),
            offset: default_spawn_offset(),
        }
    }

    /// Overrides the spawn offset.
    #[must_use]
    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }
}

/// Ordered batch of enemies within a spawner's sequence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    /// Seconds to wait before the wave begins.
    #[serde(default)]
    pub delay_before_secs: f32,
    /// Enemies that make up the wave.
    #[serde(default)]
    pub enemies: Vec<EnemySpawnInfo>,
}

impl Wave {
    /// Creates a wave from its pre-wave delay and entries.
    #[must_use]
    pub fn new(delay_before_secs: f32, enemies: Vec<EnemySpawnInfo>) -> Self {
        Self {
            delay_before_secs,
            enemies,
        }
    }

    /// Pre-wave delay as a duration. Negative or invalid delays collapse to zero.
    #[must_use]
    pub fn delay_before(&self) -> Duration {
        seconds(self.delay_before_secs)
    }
}

/// Authored configuration of one encounter spawner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnerConfig {
    /// Identifier nodes use to reference the spawner.
    pub id: SpawnerId,
    /// Waves run in order.
    #[serde(default)]
    pub waves: Vec<Wave>,
    /// Starts the sequence when the simulation boots, independent of the route.
    #[serde(default)]
    pub start_on_awake: bool,
}

impl SpawnerConfig {
    /// Creates a configuration that waits for an explicit start.
    #[must_use]
    pub fn new(id: SpawnerId, waves: Vec<Wave>) -> Self {
        Self {
            id,
            waves,
            start_on_awake: false,
        }
    }
}

/// Authored definition of an enemy archetype and its capabilities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeDefinition {
    /// Identifier spawn entries use to reference the archetype.
    pub id: ArchetypeId,
    /// Human readable name used in diagnostics.
    pub name: String,
    /// Hit points a fresh actor starts with.
    #[serde(default = "default_hit_points")]
    pub hit_points: u32,
    /// Score credited when the actor dies.
    #[serde(default)]
    pub score_value: u32,
    /// Speed of the post-spawn approach toward the anchor.
    #[serde(default = "default_approach_speed")]
    pub approach_speed: f32,
    /// Whether the actor raises a death notification.
    #[serde(default = "enabled")]
    pub reports_death: bool,
    /// Whether the actor runs the approach behaviour.
    #[serde(default = "enabled")]
    pub has_ai: bool,
}

impl ArchetypeDefinition {
    /// Creates a fully capable archetype with default tuning.
    #[must_use]
    pub fn new(id: ArchetypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            hit_points: default_hit_points(),
            score_value: 0,
            approach_speed: default_approach_speed(),
            reports_death: true,
            has_ai: true,
        }
    }
}

fn default_hit_points() -> u32 {
    1
}

fn default_approach_speed() -> f32 {
    10.0
}

fn enabled() -> bool {
    true
}

/// Read-only view over the registered enemy archetypes.
#[derive(Clone, Copy, Debug)]
pub struct ArchetypeTableView<'a> {
    definitions: &'a [ArchetypeDefinition],
}

impl<'a> ArchetypeTableView<'a> {
    /// Wraps the provided definitions.
    #[must_use]
    pub const fn new(definitions: &'a [ArchetypeDefinition]) -> Self {
        Self { definitions }
    }

    /// Looks up the definition registered for an archetype.
    #[must_use]
    pub fn get(&self, id: ArchetypeId) -> Option<&'a ArchetypeDefinition> {
        self.definitions.iter().find(|definition| definition.id == id)
    }

    /// Iterator over all registered definitions.
    pub fn iter(&self) -> impl Iterator<Item = &'a ArchetypeDefinition> {
        self.definitions.iter()
    }
}

/// How an encounter run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EncounterOutcome {
    /// Every wave was exhausted.
    Cleared,
    /// The run was cut short by a forced stop.
    Forced,
}

/// Reasons a spawner ignores a start request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StartRejection {
    /// No spawner with the requested identifier exists.
    UnknownSpawner,
    /// The spawner has no waves configured.
    NoWaves,
    /// The spawner is already running the provided run.
    AlreadyRunning {
        /// Run that is in progress.
        run: RunId,
    },
}

/// Reasons the world refuses to instantiate an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpawnRejection {
    /// No archetype with the requested identifier is registered.
    UnknownArchetype,
    /// An enemy with the requested identifier already exists.
    DuplicateId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_accept_positions_on_the_route() {
        let bounds = RouteBounds::new(5);
        assert!(bounds.check(RoutePosition::new(0.0)).is_ok());
        assert!(bounds.check(RoutePosition::new(2.5)).is_ok());
        assert!(bounds.check(RoutePosition::new(4.0)).is_ok());
    }

    #[test]
    fn bounds_reject_positions_off_the_route() {
        let bounds = RouteBounds::new(5);
        for value in [-0.5, 4.01, 7.0, f32::NAN, f32::INFINITY] {
            let error = bounds
                .check(RoutePosition::new(value))
                .expect_err("position should be rejected");
            assert_eq!(error.point_count, 5);
        }
    }

    #[test]
    fn empty_route_has_no_valid_positions() {
        let bounds = RouteBounds::new(0);
        assert!(bounds.check(RoutePosition::START).is_err());
        assert_eq!(bounds.terminal(), RoutePosition::START);
    }

    #[test]
    fn terminal_is_last_control_point() {
        assert_eq!(RouteBounds::new(8).terminal(), RoutePosition::new(7.0));
    }

    #[test]
    fn invalid_seconds_collapse_to_zero() {
        assert_eq!(seconds(-3.0), Duration::ZERO);
        assert_eq!(seconds(f32::NAN), Duration::ZERO);
        assert_eq!(seconds(1.5), Duration::from_millis(1500));
        assert_eq!(seconds(f32::INFINITY), Duration::MAX);
    }

    #[test]
    fn enemy_ids_order_by_spawner_then_serial() {
        let first = EnemyId::new(SpawnerId::new(1), 9);
        let second = EnemyId::new(SpawnerId::new(2), 0);
        assert!(first < second);
        assert_eq!(second.spawner(), SpawnerId::new(2));
    }

    #[test]
    fn arrival_subscribers_count_actions() {
        let node = RouteNode::new(EncounterKind::None, 1.0, 4.0)
            .with_arrival_action(ArrivalAction::new("open_door"))
            .with_arrival_action(ArrivalAction::new("play_cutscene"));
        assert_eq!(node.arrival_subscribers(), 2);
    }

    #[test]
    fn authored_spawner_round_trips_through_bincode() {
        let config = SpawnerConfig::new(
            SpawnerId::new(3),
            vec![Wave::new(
                2.0,
                vec![EnemySpawnInfo::new(
                    SpawnTrigger::OnDistance { distance: 12.0 },
                    ArchetypeId::new(1),
                    SpawnAnchor::at(Vec3::new(1.0, 2.0, 3.0)),
                )],
            )],
        );

        let bytes = bincode::serialize(&config).expect("serialize");
        let restored: SpawnerConfig = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, config);
    }
}
