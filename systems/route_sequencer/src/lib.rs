#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Route sequencer that walks the viewpoint from node to node.
//!
//! The sequencer departs for each authored [`RouteNode`] in order, waits for
//! the path follower's arrival notification, and dispatches the node's
//! encounter. It never suspends: every transition happens synchronously while
//! handling the event that triggered it, and its only outputs are commands.

use std::mem;

use rail_shooter_core::{
    Command, EncounterKind, Event, RouteBounds, RouteNode, RoutePosition, RunId, SpawnerId,
    StartRejection,
};

const DEFAULT_INITIAL_FOLLOW_SPEED: f32 = 10.0;

/// Configuration parameters required to construct the route sequencer.
#[derive(Clone, Debug)]
pub struct Config {
    nodes: Vec<RouteNode>,
    bounds: RouteBounds,
    initial_follow_speed: f32,
    destroy_enemies_on_arrival: bool,
}

impl Config {
    /// Creates a configuration for the provided nodes on a route with the given bounds.
    #[must_use]
    pub fn new(nodes: Vec<RouteNode>, bounds: RouteBounds) -> Self {
        Self {
            nodes,
            bounds,
            initial_follow_speed: DEFAULT_INITIAL_FOLLOW_SPEED,
            destroy_enemies_on_arrival: true,
        }
    }

    /// Overrides the speed used before any node has set one.
    #[must_use]
    pub fn with_initial_follow_speed(mut self, speed: f32) -> Self {
        self.initial_follow_speed = speed;
        self
    }

    /// Controls whether a background spawner's enemies are destroyed when the
    /// next node is reached.
    #[must_use]
    pub fn with_destroy_enemies_on_arrival(mut self, destroy: bool) -> Self {
        self.destroy_enemies_on_arrival = destroy;
        self
    }
}

/// Lifecycle state of the sequencer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SequencerState {
    /// Not traversing; ready to depart for the next node.
    Idle,
    /// The path follower is travelling toward a node.
    Moving,
    /// Stopped at a node until its spawner completes.
    InCombat,
    /// Stopped at a node until the external event-complete signal arrives.
    WaitingOnEvent,
}

/// Run a spawner subscription is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Binding {
    /// The start request has been issued but no run was announced yet.
    AwaitingStart,
    /// Only completions of this run are honoured.
    Bound(RunId),
}

/// Completion subscription the sequencer holds on a spawner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription {
    spawner: SpawnerId,
    binding: Binding,
}

impl Subscription {
    const fn awaiting(spawner: SpawnerId) -> Self {
        Self {
            spawner,
            binding: Binding::AwaitingStart,
        }
    }

    /// Spawner the subscription listens to.
    #[must_use]
    pub const fn spawner(&self) -> SpawnerId {
        self.spawner
    }

    /// Run the subscription is attached to.
    #[must_use]
    pub const fn binding(&self) -> Binding {
        self.binding
    }

    fn bind(&mut self, spawner: SpawnerId, run: RunId) -> bool {
        if self.spawner != spawner || self.binding != Binding::AwaitingStart {
            return false;
        }
        self.binding = Binding::Bound(run);
        true
    }

    fn bound_run(&self) -> Option<RunId> {
        match self.binding {
            Binding::AwaitingStart => None,
            Binding::Bound(run) => Some(run),
        }
    }

    fn awaits_start_of(&self, spawner: SpawnerId) -> bool {
        self.spawner == spawner && self.binding == Binding::AwaitingStart
    }

    fn honours(&self, spawner: SpawnerId, run: Option<RunId>) -> bool {
        self.spawner == spawner
            && matches!((self.binding, run), (Binding::Bound(bound), Some(run)) if bound == run)
    }
}

/// Subscriptions released by [`RouteSequencer::teardown`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Teardown {
    /// Whether an armed arrival subscription was dropped.
    pub arrival_released: bool,
    /// Spawners whose completion subscriptions were dropped.
    pub released: Vec<SpawnerId>,
}

/// Pure system that moves the viewpoint through the authored route nodes.
#[derive(Debug)]
pub struct RouteSequencer {
    nodes: Vec<RouteNode>,
    bounds: RouteBounds,
    destroy_on_arrival: bool,
    state: SequencerState,
    cursor: Option<usize>,
    last_position: RoutePosition,
    last_speed: f32,
    arrival_armed: bool,
    blocking: Option<Subscription>,
    concurrent: Option<Subscription>,
    finished: bool,
}

impl RouteSequencer {
    /// Creates an idle sequencer positioned at the start of the route.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            nodes: config.nodes,
            bounds: config.bounds,
            destroy_on_arrival: config.destroy_enemies_on_arrival,
            state: SequencerState::Idle,
            cursor: None,
            last_position: RoutePosition::START,
            last_speed: config.initial_follow_speed,
            arrival_armed: false,
            blocking: None,
            concurrent: None,
            finished: false,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SequencerState {
        self.state
    }

    /// Index of the node most recently departed for, if it exists.
    #[must_use]
    pub fn current_node(&self) -> Option<usize> {
        self.cursor.filter(|index| *index < self.nodes.len())
    }

    /// Spawner currently running in the background, if any.
    #[must_use]
    pub fn concurrent_spawner(&self) -> Option<SpawnerId> {
        self.concurrent.map(|subscription| subscription.spawner)
    }

    /// Subscription the sequencer is blocked on, if any.
    #[must_use]
    pub const fn blocking_subscription(&self) -> Option<Subscription> {
        self.blocking
    }

    /// Reports whether an arrival notification would currently be honoured.
    #[must_use]
    pub const fn is_arrival_armed(&self) -> bool {
        self.arrival_armed
    }

    /// Reports whether the terminal of the route has been reached.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Departs for the first node. Called once when the level starts.
    pub fn start(&mut self, out: &mut Vec<Command>) {
        if self.cursor.is_some() {
            log::warn!("route sequencer already started; ignoring start");
            return;
        }
        self.advance_to_next_node(out);
    }

    /// Departs for the next node, or for the route terminal after the last node.
    ///
    /// Only valid while idle. A node whose position lies outside the route is
    /// logged and leaves the sequencer in `Moving` without departing.
    pub fn advance_to_next_node(&mut self, out: &mut Vec<Command>) {
        if self.finished {
            log::debug!("route already finished; nothing to advance to");
            return;
        }
        if self.state != SequencerState::Idle {
            log::warn!("cannot advance while {:?}", self.state);
            return;
        }

        let index = self.cursor.map_or(0, |index| index + 1);
        self.cursor = Some(index);
        self.state = SequencerState::Moving;

        let Some(node) = self.nodes.get(index) else {
            let terminal = self.bounds.terminal();
            log::info!("all nodes visited; travelling to route end at {terminal}");
            self.depart(terminal, self.last_speed, out);
            return;
        };

        let position = match self.bounds.check(node.route_position) {
            Ok(position) => position,
            Err(error) => {
                log::error!("cannot depart for node {index}: {error}");
                return;
            }
        };

        let speed = node.follow_speed;
        log::info!("departing for node {index} at {position} (speed {speed})");
        self.depart(position, speed, out);
    }

    /// External continue signal for a node waiting on an event.
    pub fn signal_event_complete(&mut self, out: &mut Vec<Command>) {
        if self.state != SequencerState::WaitingOnEvent {
            log::warn!("event complete signalled while {:?}; ignoring", self.state);
            return;
        }

        log::info!("event complete; resuming route");
        self.state = SequencerState::Idle;
        self.advance_to_next_node(out);
    }

    /// Releases every outstanding subscription without stopping any spawner.
    pub fn teardown(&mut self) -> Teardown {
        let arrival_released = mem::take(&mut self.arrival_armed);
        let released: Vec<SpawnerId> = [self.blocking.take(), self.concurrent.take()]
            .into_iter()
            .flatten()
            .map(|subscription| subscription.spawner)
            .collect();

        log::info!(
            "route sequencer torn down (arrival released: {arrival_released}, spawner subscriptions released: {})",
            released.len()
        );
        Teardown {
            arrival_released,
            released,
        }
    }

    /// Consumes world and encounter events, emitting follow and encounter commands.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::RouteEndReached { position } => self.on_arrival(*position, out),
                Event::EncounterStarted { spawner, run } => self.on_encounter_started(*spawner, *run),
                Event::EncounterStartIgnored { spawner, reason } => {
                    self.on_start_ignored(*spawner, *reason, out);
                }
                Event::EncounterCompleted { spawner, run, .. } => {
                    self.on_encounter_completed(*spawner, *run, out);
                }
                Event::EventCompleteSignaled => self.signal_event_complete(out),
                _ => {}
            }
        }
    }

    fn depart(&mut self, to: RoutePosition, speed: f32, out: &mut Vec<Command>) {
        out.push(Command::FollowRoute {
            from: self.last_position,
            to,
            speed,
        });
        self.last_position = to;
        self.last_speed = speed;
        self.arrival_armed = true;
    }

    fn on_arrival(&mut self, position: RoutePosition, out: &mut Vec<Command>) {
        if self.state != SequencerState::Moving {
            log::warn!("arrival at {position} while {:?}; ignoring", self.state);
            return;
        }
        if !self.arrival_armed {
            log::debug!("arrival at {position} without an armed traversal; ignoring");
            return;
        }
        self.arrival_armed = false;
        self.release_concurrent(out);

        let Some(index) = self.current_node() else {
            log::info!("route end reached at {position}");
            self.state = SequencerState::Idle;
            self.finished = true;
            out.push(Command::CompleteRoute);
            return;
        };

        let node = &self.nodes[index];
        let kind = node.encounter_kind;
        let spawner = node.spawner;
        let subscribers = node.arrival_subscribers();
        out.extend(
            node.on_arrival
                .iter()
                .cloned()
                .map(|action| Command::TriggerArrivalAction {
                    node: index,
                    action,
                }),
        );

        log::info!("arrived at node {index} ({kind:?})");
        match kind {
            EncounterKind::None => {
                if subscribers > 0 {
                    self.state = SequencerState::WaitingOnEvent;
                } else {
                    self.state = SequencerState::Idle;
                    self.advance_to_next_node(out);
                }
            }
            EncounterKind::StopAndClear => match spawner {
                Some(spawner) => {
                    self.state = SequencerState::InCombat;
                    self.blocking = Some(Subscription::awaiting(spawner));
                    out.push(Command::StartEncounter { spawner });
                }
                None => {
                    log::warn!("node {index} is StopAndClear but has no spawner; moving on");
                    self.state = SequencerState::Idle;
                    self.advance_to_next_node(out);
                }
            },
            EncounterKind::MoveAndSurvive => {
                // The slot is empty here: every arrival releases it before dispatch.
                match spawner {
                    Some(spawner) => {
                        self.concurrent = Some(Subscription::awaiting(spawner));
                        out.push(Command::StartEncounter { spawner });
                    }
                    None => {
                        log::warn!("node {index} is MoveAndSurvive but has no spawner; moving on");
                    }
                }
                self.state = SequencerState::Idle;
                self.advance_to_next_node(out);
            }
        }
    }

    /// Stops the background spawner, aimed at its bound run so that a run
    /// which already completed on its own is not completed a second time.
    fn release_concurrent(&mut self, out: &mut Vec<Command>) {
        let Some(subscription) = self.concurrent.take() else {
            return;
        };

        log::info!(
            "force stopping background {} (destroy remaining: {})",
            subscription.spawner,
            self.destroy_on_arrival
        );
        out.push(Command::ForceStopEncounter {
            spawner: subscription.spawner,
            run: subscription.bound_run(),
            destroy_remaining: self.destroy_on_arrival,
        });
    }

    fn on_encounter_started(&mut self, spawner: SpawnerId, run: RunId) {
        for subscription in [&mut self.blocking, &mut self.concurrent]
            .into_iter()
            .flatten()
        {
            if subscription.bind(spawner, run) {
                log::debug!("bound {spawner} subscription to run {}", run.get());
            }
        }
    }

    fn on_start_ignored(
        &mut self,
        spawner: SpawnerId,
        reason: StartRejection,
        out: &mut Vec<Command>,
    ) {
        if let StartRejection::AlreadyRunning { run } = reason {
            self.on_encounter_started(spawner, run);
            return;
        }

        if self
            .concurrent
            .is_some_and(|subscription| subscription.awaits_start_of(spawner))
        {
            log::warn!("background {spawner} did not start ({reason:?}); dropping subscription");
            self.concurrent = None;
        }

        let blocked_on_it = self
            .blocking
            .is_some_and(|subscription| subscription.awaits_start_of(spawner));
        if blocked_on_it {
            log::warn!("{spawner} did not start ({reason:?}); treating the node as clear");
            self.blocking = None;
            if self.state == SequencerState::InCombat {
                self.state = SequencerState::Idle;
                self.advance_to_next_node(out);
            }
        }
    }

    fn on_encounter_completed(
        &mut self,
        spawner: SpawnerId,
        run: Option<RunId>,
        out: &mut Vec<Command>,
    ) {
        if self
            .blocking
            .is_some_and(|subscription| subscription.honours(spawner, run))
        {
            self.blocking = None;
            let expected = self
                .current_node()
                .and_then(|index| self.nodes[index].spawner);
            if self.state != SequencerState::InCombat || expected != Some(spawner) {
                log::warn!(
                    "completion of {spawner} does not match the current node ({:?}); ignoring",
                    self.state
                );
                return;
            }

            log::info!("{spawner} cleared; resuming route");
            self.state = SequencerState::Idle;
            self.advance_to_next_node(out);
            return;
        }

        if self
            .concurrent
            .is_some_and(|subscription| subscription.honours(spawner, run))
        {
            log::info!("background {spawner} finished before the next node");
            self.concurrent = None;
            return;
        }

        log::debug!("ignoring completion of {spawner} (run {run:?}): no matching subscription");
    }
}
