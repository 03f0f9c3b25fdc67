//! Authored level files: TOML parsing and validation.

use std::{
    collections::BTreeSet,
    fs, io,
    path::{Path, PathBuf},
};

use glam::Vec3;
use rail_shooter_core::{
    ArchetypeDefinition, ArrivalAction, Command, EncounterKind, RouteBounds, RouteNode,
    RoutePositionError, SpawnerConfig, SpawnerId,
};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CUE_SECONDS: f32 = 2.0;

/// Errors raised while loading a level file.
#[derive(Debug, Error)]
pub(crate) enum LevelError {
    /// The level file could not be read.
    #[error("could not read level file {}", .path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The level file is not valid TOML for the level schema.
    #[error("could not parse level file")]
    Parse(#[from] toml::de::Error),
    /// The route cannot be travelled.
    #[error("route needs at least two points, found {0}")]
    RouteTooShort(usize),
    /// A node sits outside the route.
    #[error("node {node} is misplaced")]
    NodePosition {
        /// Index of the offending node.
        node: usize,
        /// Validation failure reported by the route bounds.
        #[source]
        source: RoutePositionError,
    },
    /// A node would leave the viewpoint standing still.
    #[error("node {node} has follow speed {speed}; it must be positive")]
    NodeSpeed {
        /// Index of the offending node.
        node: usize,
        /// Speed that was authored.
        speed: f32,
    },
    /// A node references a spawner the level does not define.
    #[error("node {node} references {spawner}, which is not defined")]
    UnknownSpawner {
        /// Index of the offending node.
        node: usize,
        /// Spawner that was referenced.
        spawner: SpawnerId,
    },
    /// Two spawners share an identifier.
    #[error("{0} is defined more than once")]
    DuplicateSpawner(SpawnerId),
    /// Two archetypes share an identifier.
    #[error("archetype {0} is defined more than once")]
    DuplicateArchetype(u32),
}

/// Duration of the scripted cue played for a named arrival action.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct Cue {
    pub(crate) action: ArrivalAction,
    pub(crate) seconds: f32,
}

/// Level as authored on disk.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Level {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) initial_follow_speed: Option<f32>,
    #[serde(default = "enabled")]
    pub(crate) destroy_enemies_on_arrival: bool,
    #[serde(default = "default_cue_seconds")]
    pub(crate) default_cue_seconds: f32,
    pub(crate) route: Vec<Vec3>,
    #[serde(default)]
    pub(crate) archetypes: Vec<ArchetypeDefinition>,
    #[serde(default)]
    pub(crate) spawners: Vec<SpawnerConfig>,
    #[serde(default)]
    pub(crate) nodes: Vec<RouteNode>,
    #[serde(default)]
    pub(crate) cues: Vec<Cue>,
}

fn enabled() -> bool {
    true
}

fn default_cue_seconds() -> f32 {
    DEFAULT_CUE_SECONDS
}

impl Level {
    /// Reads, parses and validates the level stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self, LevelError> {
        let contents = fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Parses and validates a level from TOML text.
    pub(crate) fn from_toml(contents: &str) -> Result<Self, LevelError> {
        let level: Self = toml::from_str(contents)?;
        level.validate()?;
        Ok(level)
    }

    /// Bounds of the authored route.
    pub(crate) fn bounds(&self) -> RouteBounds {
        RouteBounds::new(u32::try_from(self.route.len()).unwrap_or(u32::MAX))
    }

    /// Commands that load the route and archetypes into a fresh world.
    pub(crate) fn setup_commands(&self) -> Vec<Command> {
        let mut commands = Vec::with_capacity(self.archetypes.len() + 1);
        commands.push(Command::ConfigureRoute {
            waypoints: self.route.clone(),
        });
        commands.extend(
            self.archetypes
                .iter()
                .cloned()
                .map(|definition| Command::RegisterArchetype { definition }),
        );
        commands
    }

    fn validate(&self) -> Result<(), LevelError> {
        if self.route.len() < 2 {
            return Err(LevelError::RouteTooShort(self.route.len()));
        }

        let mut archetypes = BTreeSet::new();
        for definition in &self.archetypes {
            if !archetypes.insert(definition.id) {
                return Err(LevelError::DuplicateArchetype(definition.id.get()));
            }
        }

        let mut spawners = BTreeSet::new();
        for spawner in &self.spawners {
            if !spawners.insert(spawner.id) {
                return Err(LevelError::DuplicateSpawner(spawner.id));
            }
        }

        let bounds = self.bounds();
        for (index, node) in self.nodes.iter().enumerate() {
            let _ = bounds
                .check(node.route_position)
                .map_err(|source| LevelError::NodePosition {
                    node: index,
                    source,
                })?;
            if !(node.follow_speed.is_finite() && node.follow_speed > 0.0) {
                return Err(LevelError::NodeSpeed {
                    node: index,
                    speed: node.follow_speed,
                });
            }

            match (node.encounter_kind, node.spawner) {
                (_, Some(spawner)) if !spawners.contains(&spawner) => {
                    return Err(LevelError::UnknownSpawner {
                        node: index,
                        spawner,
                    });
                }
                (EncounterKind::StopAndClear | EncounterKind::MoveAndSurvive, None) => {
                    log::warn!(
                        "node {index} is {:?} without a spawner; it will be skipped",
                        node.encounter_kind
                    );
                }
                _ => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rail_shooter_core::{EncounterKind, SpawnTrigger};

    const METRO_LINE: &str = include_str!("../../../levels/metro_line.toml");

    const MINIMAL: &str = r#"
        name = "test"
        route = [[0.0, 0.0, 0.0], [0.0, 0.0, 10.0]]

        [[archetypes]]
        id = 1
        name = "grunt"

        [[spawners]]
        id = 1

        [[spawners.waves]]
        delay_before_secs = 1.0

        [[spawners.waves.enemies]]
        trigger = { on_distance = { distance = 12.0 } }
        archetype = 1
        anchor = { position = [1.0, 0.0, 5.0] }

        [[nodes]]
        encounter_kind = "stop_and_clear"
        route_position = 1.0
        spawner = 1
        follow_speed = 4.0
    "#;

    #[test]
    fn parses_minimal_level_with_defaults() {
        let level = Level::from_toml(MINIMAL).expect("level parses");

        assert!(level.destroy_enemies_on_arrival);
        assert_eq!(level.initial_follow_speed, None);
        assert_eq!(level.default_cue_seconds, DEFAULT_CUE_SECONDS);
        assert_eq!(level.nodes[0].encounter_kind, EncounterKind::StopAndClear);
        assert_eq!(level.archetypes[0].hit_points, 1);

        let entry = &level.spawners[0].waves[0].enemies[0];
        assert_eq!(entry.trigger, SpawnTrigger::OnDistance { distance: 12.0 });
        assert_eq!(entry.offset, 15.0);
        assert_eq!(level.setup_commands().len(), 2);
    }

    #[test]
    fn sample_level_is_valid() {
        let level = Level::from_toml(METRO_LINE).expect("sample level parses");
        assert!(!level.nodes.is_empty());
        assert!(!level.cues.is_empty());
    }

    #[test]
    fn rejects_nodes_outside_the_route() {
        let broken = MINIMAL.replace("route_position = 1.0", "route_position = 3.0");
        let error = Level::from_toml(&broken).expect_err("node is off the route");
        assert!(matches!(error, LevelError::NodePosition { node: 0, .. }));
    }

    #[test]
    fn rejects_nodes_that_do_not_move() {
        for speed in ["0.0", "-2.0", "nan"] {
            let broken = MINIMAL.replace("follow_speed = 4.0", &format!("follow_speed = {speed}"));
            let error = Level::from_toml(&broken).expect_err("node cannot be reached");
            assert!(matches!(error, LevelError::NodeSpeed { node: 0, .. }));
        }
    }

    #[test]
    fn rejects_unknown_spawner_references() {
        let broken = MINIMAL.replace("spawner = 1", "spawner = 9");
        let error = Level::from_toml(&broken).expect_err("spawner is undefined");
        assert!(matches!(error, LevelError::UnknownSpawner { node: 0, .. }));
    }

    #[test]
    fn rejects_routes_that_cannot_be_travelled() {
        let broken = MINIMAL.replace(", [0.0, 0.0, 10.0]]", "]");
        let error = Level::from_toml(&broken).expect_err("route is too short");
        assert!(matches!(error, LevelError::RouteTooShort(1)));
    }

    #[test]
    fn rejects_unknown_fields() {
        let broken = MINIMAL.replace("name = \"test\"", "name = \"test\"\nspeed = 3");
        assert!(matches!(
            Level::from_toml(&broken),
            Err(LevelError::Parse(_))
        ));
    }
}
