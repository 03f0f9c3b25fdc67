//! Authoritative enemy actor state.

use std::{collections::BTreeMap, time::Duration};

use glam::{Quat, Vec3};
use rail_shooter_core::{ArchetypeDefinition, ArchetypeId, EnemyId};

const ARRIVAL_EPSILON: f32 = 1e-3;

/// Behaviour phase of an enemy actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyPhase {
    /// Moving from the spawn position toward the anchor.
    Approaching,
    /// Reached the anchor; fully engaged.
    Active,
    /// Has no AI and stays where it appeared.
    Dormant,
}

/// Authoritative state of a single enemy actor.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) archetype: ArchetypeId,
    pub(crate) position: Vec3,
    pub(crate) facing: Quat,
    pub(crate) target: Vec3,
    pub(crate) hit_points: u32,
    pub(crate) score_value: u32,
    pub(crate) approach_speed: f32,
    pub(crate) reports_death: bool,
    pub(crate) phase: EnemyPhase,
}

impl Enemy {
    pub(crate) fn spawn(
        id: EnemyId,
        definition: &ArchetypeDefinition,
        position: Vec3,
        facing: Quat,
        target: Vec3,
    ) -> Self {
        let phase = if definition.has_ai {
            EnemyPhase::Approaching
        } else {
            EnemyPhase::Dormant
        };

        Self {
            id,
            archetype: definition.id,
            position,
            facing,
            target,
            hit_points: definition.hit_points.max(1),
            score_value: definition.score_value,
            approach_speed: definition.approach_speed.max(0.0),
            reports_death: definition.reports_death,
            phase,
        }
    }

    /// Moves the enemy toward its anchor. Returns `true` on the tick it arrives.
    pub(crate) fn approach(&mut self, dt: Duration) -> bool {
        if self.phase != EnemyPhase::Approaching {
            return false;
        }

        let offset = self.target - self.position;
        let remaining = offset.length();
        let step = self.approach_speed * dt.as_secs_f32();
        if remaining <= ARRIVAL_EPSILON || step >= remaining {
            self.position = self.target;
            self.phase = EnemyPhase::Active;
            return true;
        }

        self.position += offset / remaining * step;
        false
    }
}

/// Registry of live enemies keyed by identifier for deterministic iteration.
#[derive(Debug, Default)]
pub(crate) struct EnemyRegistry {
    entries: BTreeMap<EnemyId, Enemy>,
}

impl EnemyRegistry {
    pub(crate) fn contains(&self, id: EnemyId) -> bool {
        self.entries.contains_key(&id)
    }

    pub(crate) fn insert(&mut self, enemy: Enemy) {
        let _ = self.entries.insert(enemy.id, enemy);
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: EnemyId) -> Option<Enemy> {
        self.entries.remove(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.entries.values_mut()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rail_shooter_core::SpawnerId;

    fn definition(has_ai: bool) -> ArchetypeDefinition {
        let mut definition = ArchetypeDefinition::new(ArchetypeId::new(1), "grunt");
        definition.approach_speed = 5.0;
        definition.has_ai = has_ai;
        definition
    }

    #[test]
    fn approach_reaches_anchor_and_activates() {
        let id = EnemyId::new(SpawnerId::new(0), 0);
        let mut enemy = Enemy::spawn(
            id,
            &definition(true),
            Vec3::new(0.0, 0.0, 10.0),
            Quat::IDENTITY,
            Vec3::ZERO,
        );

        assert!(!enemy.approach(Duration::from_secs(1)));
        assert!((enemy.position.z - 5.0).abs() < 1e-4);
        assert!(enemy.approach(Duration::from_secs(1)));
        assert_eq!(enemy.position, Vec3::ZERO);
        assert_eq!(enemy.phase, EnemyPhase::Active);
        assert!(!enemy.approach(Duration::from_secs(1)));
    }

    #[test]
    fn enemies_without_ai_stay_in_place() {
        let id = EnemyId::new(SpawnerId::new(0), 0);
        let start = Vec3::new(3.0, 0.0, 0.0);
        let mut enemy = Enemy::spawn(id, &definition(false), start, Quat::IDENTITY, Vec3::ZERO);

        assert!(!enemy.approach(Duration::from_secs(5)));
        assert_eq!(enemy.position, start);
        assert_eq!(enemy.phase, EnemyPhase::Dormant);
    }
}
