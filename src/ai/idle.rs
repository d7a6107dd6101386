//! Idle roaming for code-driven creatures

use glam::Vec2;
use hecs::Entity;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::machine::MachineState;
use crate::ecs::{Creature, Mover, Transform2D, World};

/// States of a code-driven creature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreatureMode {
    Idle,
}

/// Drifts around the spot where the creature first went idle.
///
/// While the creature's [`Mover`] is idle, poll time accumulates; once it
/// reaches [`Creature::time_between_movement`] a new trip starts towards a
/// random point within half of [`Creature::movement_limit`] of the start.
#[derive(Debug, Clone)]
pub struct IdleState {
    entity: Option<Entity>,
    start_position: Option<Vec2>,
    destination_change_time: f32,
    since_last_change: f32,
    rng: ChaCha8Rng,
}

impl IdleState {
    /// Idle behavior with its own seeded random source
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            entity: None,
            start_position: None,
            destination_change_time: 4.0,
            since_last_change: 0.0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Anchor the roaming box was recorded at
    #[must_use]
    pub fn start_position(&self) -> Option<Vec2> {
        self.start_position
    }

    fn random_destination(&mut self, start: Vec2, limit: Vec2) -> Vec2 {
        let half = limit.abs() / 2.0;
        self.since_last_change = 0.0;
        start
            + Vec2::new(
                self.rng.gen_range(-half.x..=half.x),
                self.rng.gen_range(-half.y..=half.y),
            )
    }
}

impl MachineState<CreatureMode, World> for IdleState {
    fn id(&self) -> CreatureMode {
        CreatureMode::Idle
    }

    fn bind(&mut self, entity: Entity) {
        self.entity = Some(entity);
    }

    fn enter(&mut self, world: &mut World) {
        let Some(entity) = self.entity else {
            return;
        };

        if self.start_position.is_none()
            && let Ok(transform) = world.get::<Transform2D>(entity)
        {
            self.start_position = Some(transform.position);
        }
        if let Ok(creature) = world.get::<Creature>(entity) {
            self.destination_change_time = creature.time_between_movement;
        }
    }

    fn update(&mut self, world: &mut World, elapsed: f32) -> CreatureMode {
        let Some(entity) = self.entity else {
            return CreatureMode::Idle;
        };
        let Ok((transform, creature, mover)) = world
            .inner
            .query_one_mut::<(&mut Transform2D, &Creature, &mut Mover)>(entity)
        else {
            log::warn!("{entity:?}: idle creature is missing its movement components");
            return CreatureMode::Idle;
        };

        if !mover.is_moving() {
            if self.since_last_change >= self.destination_change_time {
                let start = self.start_position.unwrap_or(transform.position);
                let limit = creature.movement_limit;
                let destination = self.random_destination(start, limit);
                mover.start(transform, destination);
            } else {
                self.since_last_change += elapsed;
            }
        }
        CreatureMode::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::StateMachine;
    use crate::ecs::movement_system;

    fn spawn_creature(world: &mut World, position: Vec2) -> Entity {
        let creature = Creature {
            time_between_movement: 1.0,
            movement_limit: Vec2::new(4.0, 2.0),
            ..Creature::default()
        };
        world.spawn((Transform2D::from_position(position), creature, Mover::default()))
    }

    #[test]
    fn test_enter_records_start_once() {
        let mut world = World::new();
        let entity = spawn_creature(&mut world, Vec2::new(3.0, 1.0));
        let mut idle = IdleState::new(1);
        idle.bind(entity);

        idle.enter(&mut world);
        world.get_mut::<Transform2D>(entity).unwrap().position = Vec2::new(9.0, 9.0);
        idle.enter(&mut world);

        assert_eq!(idle.start_position(), Some(Vec2::new(3.0, 1.0)));
        assert_eq!(idle.destination_change_time, 1.0);
    }

    #[test]
    fn test_waits_then_starts_a_trip_inside_the_box() {
        let mut world = World::new();
        let start = Vec2::new(-2.0, 5.0);
        let entity = spawn_creature(&mut world, start);
        let mut idle = IdleState::new(3);
        idle.bind(entity);
        idle.enter(&mut world);

        // 0.5 + 0.5 reaches the wait, the third poll departs
        assert_eq!(idle.update(&mut world, 0.5), CreatureMode::Idle);
        idle.update(&mut world, 0.5);
        assert!(!world.get::<Mover>(entity).unwrap().is_moving());

        idle.update(&mut world, 0.5);
        let mover = world.get::<Mover>(entity).unwrap();
        assert!(mover.is_moving());
        let offset = mover.destination() - start;
        assert!(offset.x.abs() <= 2.0);
        assert!(offset.y.abs() <= 1.0);
        assert_eq!(idle.since_last_change, 0.0);
    }

    #[test]
    fn test_does_not_count_while_moving() {
        let mut world = World::new();
        let entity = spawn_creature(&mut world, Vec2::ZERO);
        {
            let (transform, mover) = world
                .inner
                .query_one_mut::<(&mut Transform2D, &mut Mover)>(entity)
                .unwrap();
            mover.start(transform, Vec2::new(3.0, 0.0));
        }

        let mut idle = IdleState::new(5);
        idle.bind(entity);
        idle.enter(&mut world);
        idle.update(&mut world, 2.0);

        assert_eq!(idle.since_last_change, 0.0);
    }

    #[test]
    fn test_missing_components_is_harmless() {
        let mut world = World::new();
        let entity = world.spawn((Transform2D::new(),));
        let mut idle = IdleState::new(2);
        idle.bind(entity);
        idle.enter(&mut world);

        assert_eq!(idle.update(&mut world, 1.0), CreatureMode::Idle);
        assert_eq!(idle.start_position(), Some(Vec2::ZERO));
    }

    #[test]
    fn test_machine_drives_idle_roaming() {
        let mut world = World::new();
        let entity = spawn_creature(&mut world, Vec2::ZERO);
        let mut machine = StateMachine::new(entity);
        machine
            .add_state(IdleState::new(11), true, &mut world)
            .unwrap();
        machine.start_machine(0.25, &mut world).unwrap();

        let mut departed = false;
        for _ in 0..200 {
            machine.advance(0.05, &mut world);
            movement_system(&mut world, 0.05);
            if world.get::<Transform2D>(entity).unwrap().position != Vec2::ZERO {
                departed = true;
                break;
            }
        }

        assert!(departed);
        assert_eq!(machine.current_state(), Some(CreatureMode::Idle));
    }
}
