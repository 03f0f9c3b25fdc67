#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the rail shooter.
//!
//! The world owns the route the viewpoint travels along, the path follower
//! that moves it, and every enemy actor. Systems never touch this state
//! directly: they submit [`Command`] values through [`apply`] and observe the
//! resulting [`Event`] stream or the read-only [`query`] functions.

mod enemies;
mod route;

use std::time::Duration;

use rail_shooter_core::{ArchetypeDefinition, Command, Event, SpawnRejection};

use crate::{
    enemies::{Enemy, EnemyRegistry},
    route::PathFollower,
};

pub use crate::{enemies::EnemyPhase, route::Route};

/// Represents the authoritative rail shooter world state.
#[derive(Debug, Default)]
pub struct World {
    route: Route,
    follower: PathFollower,
    archetypes: Vec<ArchetypeDefinition>,
    enemies: EnemyRegistry,
    score: u64,
    clock: Duration,
    tick_index: u64,
    route_completed: bool,
}

impl World {
    /// Creates an empty world with no route and no archetypes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn register_archetype(&mut self, definition: ArchetypeDefinition) {
        if let Some(existing) = self
            .archetypes
            .iter_mut()
            .find(|existing| existing.id == definition.id)
        {
            *existing = definition;
        } else {
            self.archetypes.push(definition);
            self.archetypes.sort_by_key(|definition| definition.id);
        }
    }

    fn advance_enemies(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        for enemy in self.enemies.iter_mut() {
            if enemy.approach(dt) {
                out_events.push(Event::EnemyActivated { enemy: enemy.id });
            }
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureRoute { waypoints } => {
            world.route = Route::new(waypoints);
            world.follower.reset();
            world.enemies.clear();
            world.route_completed = false;
            out_events.push(Event::RouteConfigured {
                bounds: world.route.bounds(),
            });
        }
        Command::RegisterArchetype { definition } => {
            world.register_archetype(definition);
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.clock = world.clock.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });

            world.advance_enemies(dt, out_events);

            if let Some(position) = world.follower.advance(&world.route, dt) {
                out_events.push(Event::RouteEndReached { position });
            }
        }
        Command::FollowRoute { from, to, speed } => {
            let (from, to) = world.follower.restart(&world.route, from, to, speed);
            out_events.push(Event::FollowStarted { from, to, speed });
        }
        Command::TriggerArrivalAction { node, action } => {
            out_events.push(Event::ArrivalActionTriggered { node, action });
        }
        Command::SignalEventComplete => {
            out_events.push(Event::EventCompleteSignaled);
        }
        Command::CompleteRoute => {
            if !world.route_completed {
                world.route_completed = true;
                out_events.push(Event::RouteCompleted);
            }
        }
        Command::SpawnEnemy {
            enemy,
            archetype,
            position,
            facing,
            target,
        } => {
            if world.enemies.contains(enemy) {
                log::warn!("refusing to spawn {enemy}: identifier already in use");
                out_events.push(Event::EnemySpawnRejected {
                    enemy,
                    reason: SpawnRejection::DuplicateId,
                });
                return;
            }

            let Some(definition) = world.archetypes.iter().find(|d| d.id == archetype) else {
                log::warn!(
                    "refusing to spawn {enemy}: archetype {} is not registered",
                    archetype.get()
                );
                out_events.push(Event::EnemySpawnRejected {
                    enemy,
                    reason: SpawnRejection::UnknownArchetype,
                });
                return;
            };

            world
                .enemies
                .insert(Enemy::spawn(enemy, definition, position, facing, target));
            out_events.push(Event::EnemySpawned {
                enemy,
                archetype,
                position,
            });
        }
        Command::DamageEnemy { enemy, amount } => {
            let Some(actor) = world.enemies.get_mut(enemy) else {
                return;
            };

            actor.hit_points = actor.hit_points.saturating_sub(amount);
            if actor.hit_points > 0 {
                out_events.push(Event::EnemyDamaged {
                    enemy,
                    remaining: actor.hit_points,
                });
                return;
            }

            if let Some(dead) = world.enemies.remove(enemy) {
                world.score = world.score.saturating_add(u64::from(dead.score_value));
                if dead.reports_death {
                    out_events.push(Event::EnemyDied {
                        enemy,
                        score: dead.score_value,
                    });
                } else {
                    log::debug!("{enemy} died without a death notification");
                }
            }
        }
        Command::DestroyEnemy { enemy } => {
            if world.enemies.remove(enemy).is_some() {
                out_events.push(Event::EnemyDestroyed { enemy });
            }
        }
        Command::StartEncounter { .. } | Command::ForceStopEncounter { .. } => {
            // Encounter control is consumed by the encounter systems.
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use glam::{Quat, Vec3};
    use rail_shooter_core::{ArchetypeId, ArchetypeTableView, EnemyId, RouteBounds, RoutePosition};

    use super::{Enemy, EnemyPhase, Route, World};

    /// Provides read-only access to the route polyline.
    #[must_use]
    pub fn route(world: &World) -> &Route {
        &world.route
    }

    /// Addressable range of the configured route.
    #[must_use]
    pub fn route_bounds(world: &World) -> RouteBounds {
        world.route.bounds()
    }

    /// Route position the path follower currently occupies.
    #[must_use]
    pub fn follower_position(world: &World) -> RoutePosition {
        world.follower.position()
    }

    /// Reports whether the path follower is mid-traversal.
    #[must_use]
    pub fn is_following(world: &World) -> bool {
        world.follower.is_following()
    }

    /// World-space position of the tracked viewpoint.
    #[must_use]
    pub fn viewpoint(world: &World) -> Vec3 {
        world.route.sample(world.follower.position())
    }

    /// Read-only view over the registered archetypes.
    #[must_use]
    pub fn archetype_table(world: &World) -> ArchetypeTableView<'_> {
        ArchetypeTableView::new(&world.archetypes)
    }

    /// Total score credited for kills so far.
    #[must_use]
    pub fn score(world: &World) -> u64 {
        world.score
    }

    /// Simulated time accumulated across all ticks.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Reports whether the route has been completed.
    #[must_use]
    pub fn route_completed(world: &World) -> bool {
        world.route_completed
    }

    /// Captures a snapshot of a single enemy, if it is alive.
    #[must_use]
    pub fn enemy(world: &World, id: EnemyId) -> Option<EnemySnapshot> {
        world.enemies.get(id).map(snapshot)
    }

    /// Captures a read-only view of every live enemy.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView {
            snapshots: world.enemies.iter().map(snapshot).collect(),
        }
    }

    /// Read-only snapshot describing all live enemies, ordered by identifier.
    #[derive(Clone, Debug, Default)]
    pub struct EnemyView {
        snapshots: Vec<EnemySnapshot>,
    }

    impl EnemyView {
        /// Iterator over the captured snapshots in deterministic order.
        pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
            self.snapshots.iter()
        }

        /// Number of live enemies.
        #[must_use]
        pub fn len(&self) -> usize {
            self.snapshots.len()
        }

        /// Reports whether no enemies are alive.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.snapshots.is_empty()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<EnemySnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single enemy used for queries.
    #[derive(Clone, Debug, PartialEq)]
    pub struct EnemySnapshot {
        /// Identifier of the enemy.
        pub id: EnemyId,
        /// Archetype the enemy was instantiated from.
        pub archetype: ArchetypeId,
        /// Current world-space position.
        pub position: Vec3,
        /// Orientation the enemy faces.
        pub facing: Quat,
        /// Anchor the enemy approaches.
        pub target: Vec3,
        /// Hit points left.
        pub hit_points: u32,
        /// Behaviour phase.
        pub phase: EnemyPhase,
    }

    fn snapshot(enemy: &Enemy) -> EnemySnapshot {
        EnemySnapshot {
            id: enemy.id,
            archetype: enemy.archetype,
            position: enemy.position,
            facing: enemy.facing,
            target: enemy.target,
            hit_points: enemy.hit_points,
            phase: enemy.phase,
        }
    }
}
