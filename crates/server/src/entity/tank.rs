//! Base tank behaviour shared by player and enemy tanks.

use glam::Vec2;
use tank_protocol::Direction;

/// Common surface of every tank on the field.
pub trait Tank {
    fn position(&self) -> Vec2;

    fn direction(&self) -> Direction;

    /// Distance covered by one movement step.
    fn speed(&self) -> f32;

    /// Where a fired bullet appears: one tile ahead of the barrel.
    fn muzzle(&self) -> Vec2 {
        self.position() + self.direction().vector()
    }

    /// Position after one step in `direction`.
    fn step_towards(&self, direction: Direction) -> Vec2 {
        self.position() + direction.vector() * self.speed()
    }
}
