//! World wrapper around hecs

use hecs::Entity;

use super::body::EntityBody;
use super::components::{Creature, Mover, Transform2D};

/// Game world containing all entities and components
pub struct World {
    /// The underlying hecs world
    pub inner: hecs::World,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
        }
    }

    /// Spawn an entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Get a reference to a component
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Get a mutable reference to a component
    pub fn get_mut<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    /// Borrow the movable body of a creature.
    ///
    /// Returns `None` when the entity is gone or lacks a `Transform2D` or
    /// `Creature`.
    pub fn body(&mut self, entity: Entity) -> Option<EntityBody<'_>> {
        self.inner
            .query_one_mut::<(&mut Transform2D, &Creature)>(entity)
            .ok()
            .map(|(transform, creature)| EntityBody::new(transform, creature))
    }

    /// Get the number of entities
    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    /// Query for entities with specific components
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.inner.query::<Q>()
    }

    /// Query for entities with specific components (mutable)
    pub fn query_mut<Q: hecs::Query>(&mut self) -> hecs::QueryMut<'_, Q> {
        self.inner.query_mut::<Q>()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Step every in-flight `Mover` by one frame
pub fn movement_system(world: &mut World, delta: f32) {
    for (_, (transform, creature, mover)) in
        world.query_mut::<(&mut Transform2D, &Creature, &mut Mover)>()
    {
        mover.step(transform, creature.speed, delta);
    }
}
