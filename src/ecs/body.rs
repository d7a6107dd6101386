//! Entity binding for AI code

use glam::Vec2;

use super::components::{Creature, Transform2D};
use crate::ai::Body;

/// Borrowed view of one creature's transform and stats
#[derive(Debug)]
pub struct EntityBody<'a> {
    transform: &'a mut Transform2D,
    creature: &'a Creature,
}

impl<'a> EntityBody<'a> {
    /// Wrap borrowed components
    pub fn new(transform: &'a mut Transform2D, creature: &'a Creature) -> Self {
        Self {
            transform,
            creature,
        }
    }
}

impl Body for EntityBody<'_> {
    fn local_position(&self) -> Vec2 {
        self.transform.position
    }

    fn set_local_position(&mut self, position: Vec2) {
        self.transform.position = position;
    }

    fn speed(&self) -> f32 {
        self.creature.speed
    }

    fn face_towards(&mut self, target: Vec2) {
        self.transform.face_towards(target);
    }
}
